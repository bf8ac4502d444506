use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

/// Name → help-text table consulted when a metric is requested without an explicit description.
///
/// Keys are the raw names passed by callers (before prefixing and normalization).
/// The error counter is the exception: it is looked up by its adjusted name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptionMappings(HashMap<String, String>);

impl DescriptionMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties-style text.
    ///
    /// Each non-blank line is `key=value`, `key:value` or `key value`.
    /// Lines starting with `#` or `!` are comments; a key without separator maps to `""`.
    pub fn from_properties(text: &str) -> Self {
        let mut out = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = match line.find(['=', ':', ' ', '\t']) {
                Some(at) => {
                    let (key, rest) = line.split_at(at);
                    let rest = rest.trim_start();
                    let rest = rest
                        .strip_prefix('=')
                        .or_else(|| rest.strip_prefix(':'))
                        .unwrap_or(rest);
                    (key, rest.trim())
                }
                None => (line, ""),
            };
            out.insert(key.trim(), value);
        }
        out
    }

    /// Read a UTF-8 properties file, see [`DescriptionMappings::from_properties`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MetricsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| MetricsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_properties(&text))
    }

    pub fn insert(&mut self, name: impl Into<String>, description: impl Into<String>) {
        self.0.insert(name.into(), description.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay `other` on top of `self`; entries of `other` win.
    pub fn extend(&mut self, other: DescriptionMappings) {
        self.0.extend(other.0);
    }
}

impl<K, V> FromIterator<(K, V)> for DescriptionMappings
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Pick the help text for a metric.
///
/// Explicit description, then the mapping entry for `lookup_key`, then the adjusted name.
pub(crate) fn resolve(
    lookup_key: &str,
    adjusted_name: &str,
    explicit: Option<&str>,
    mappings: &DescriptionMappings,
) -> String {
    explicit
        .or_else(|| mappings.get(lookup_key))
        .unwrap_or(adjusted_name)
        .to_string()
}
