use thiserror::Error;

pub type MetricsResult<T> = Result<T, MetricsError>;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("{0} is already used for a different type of metric")]
    TypeConflict(String),

    #[error("invalid metric {name}: {source}")]
    InvalidMetric {
        name: String,
        #[source]
        source: prometheus::Error,
    },

    #[error("failed to register {name}: {source}")]
    Registration {
        name: String,
        #[source]
        source: prometheus::Error,
    },

    #[error("failed to encode metrics: {0}")]
    Encode(#[source] prometheus::Error),

    #[error("failed to read description mappings from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
