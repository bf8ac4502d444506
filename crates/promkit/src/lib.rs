//! Typed convenience facade over a Prometheus registry.
//!
//! This crate provides [`PrometheusMetrics`], which hands out counters, gauges, histograms, summaries and one-shot timers by name.
//! Names are normalized, metrics are registered lazily on first use and a name can never be reused for a different kind of metric.
//!
//! ## Example
//! ```rust
//! use promkit::{PrometheusMetrics, Registry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new();
//! let metrics = PrometheusMetrics::with_registry(registry.clone(), "MyApp");
//!
//! metrics.gauge("Sessions.open")?.inc();
//! metrics.counter_with_desc("logins", "Successful logins")?.inc();
//! metrics.error("stripe_transaction")?;
//!
//! let greeting = metrics.timed("Sessions.handleLogin")?.scoped(|| "Login handled!");
//! assert_eq!(greeting, "Login handled!");
//!
//! // Expose /metrics endpoint (example with custom HTTP server)
//! // let body = metrics.render()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Metric names
//! - `.`, `-`, `#` and spaces become `_`, and the result is lowercased.
//! - A facade built with a prefix registers `<prefix>_<name>`.
//! - Errors go to a single counter `<prefix>_errors{error_type}`.
//!
//! ## HTTP Server
//! This crate does NOT provide HTTP server for `/metrics` endpoint.
//! Use [`PrometheusMetrics::render`] or [`PrometheusMetrics::gather`] from your application's HTTP framework.

mod collector;
pub use collector::{SummaryCollector, SummaryOpts};

mod config;
pub use config::MetricsConfig;

mod describe;
pub use describe::DescriptionMappings;

mod error;
pub use error::{MetricsError, MetricsResult};

mod facade;
pub use facade::{MetricsBuilder, PrometheusMetrics};

pub mod inspect;

mod metric;
pub use metric::{Counter, ErrorCounter, Gauge, Histogram, MetricKind, Summary};

mod name;
pub use name::normalize;

mod registry;

mod store;

mod timer;
pub use timer::{Clock, MonotonicClock, Observe, OneShotTimer, StepClock, TimerContext};

pub use prometheus::{Encoder, Registry, TextEncoder};
