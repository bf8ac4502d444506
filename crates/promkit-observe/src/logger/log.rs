use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, fmt::time::OffsetTime, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the output layer for `cfg` and install it with its filter as the global default.
pub(crate) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = mk_filter(&cfg.level)?;

    tracing_subscriber::registry()
        .with(mk_layer(cfg))
        .with(filter)
        .try_init()
        .map_err(|e| {
            let msg = e.to_string();
            // Both the global dispatcher and the `log` bridge report a second install this way.
            if msg.contains("already") {
                LoggerError::AlreadyInitialized
            } else {
                LoggerError::InitializationFailed(msg)
            }
        })
}

fn mk_layer(cfg: &LoggerConfig) -> BoxedLayer {
    let base = fmt::layer()
        .with_target(cfg.with_targets)
        .with_timer(mk_timer());

    match cfg.format {
        LoggerFormat::Text => base.with_ansi(cfg.use_color).boxed(),
        LoggerFormat::Json => base.json().with_ansi(false).boxed(),
    }
}

fn mk_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(level).map_err(|_| LoggerError::InvalidLogLevel(level.to_string()))
}

fn mk_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}
