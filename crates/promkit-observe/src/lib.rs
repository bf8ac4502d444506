//! Process-wide `tracing` setup for services exposing promkit metrics.
mod logger;
pub use logger::*;
