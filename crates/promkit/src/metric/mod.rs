//! Typed metric handles and the per-kind construction strategies.

mod scalar;
pub use scalar::{Counter, Gauge};

mod errors;
pub(crate) use errors::ErrorCounters;
pub use errors::ErrorCounter;

mod kind;
pub(crate) use kind::{Metric, TimedSummary, Typed};
pub use kind::MetricKind;

mod timed;
pub use timed::{Histogram, Summary};
