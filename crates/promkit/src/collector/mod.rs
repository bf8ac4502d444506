//! Collectors the `prometheus` crate does not ship.

mod summary;
pub use summary::{SummaryCollector, SummaryOpts};
