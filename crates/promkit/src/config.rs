use std::path::PathBuf;

use serde::Deserialize;

use crate::describe::DescriptionMappings;

/// Facade settings that usually come from application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prefix for every metric name; normalized like metric names.
    pub prefix: String,
    /// Inline descriptions; override entries loaded from `descriptions_file`.
    pub descriptions: DescriptionMappings,
    /// Properties file with `name = description` lines.
    pub descriptions_file: Option<PathBuf>,
}
