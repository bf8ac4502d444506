use std::{
    fmt,
    sync::{Mutex, PoisonError},
};

use prometheus::{CounterVec, Opts};
use tracing::trace;

use crate::{
    error::{MetricsError, MetricsResult},
    registry::register,
};

const ERROR_TYPE_LABEL: &str = "error_type";

/// The series of the shared error counter selected by one `error_type`.
#[derive(Clone)]
pub struct ErrorCounter {
    child: prometheus::Counter,
}

impl ErrorCounter {
    /// Cumulative count for this `error_type`.
    pub fn count(&self) -> f64 {
        self.child.get()
    }
}

impl fmt::Debug for ErrorCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorCounter")
            .field("count", &self.count())
            .finish()
    }
}

/// Lazily created, label-partitioned counter shared by every error a facade records.
pub(crate) struct ErrorCounters {
    slot: Mutex<Option<ErrorFamily>>,
}

#[derive(Clone)]
pub(crate) struct ErrorFamily {
    pub family: CounterVec,
    pub owned: bool,
}

impl ErrorCounters {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Increment the `error_type` series, creating the counter on first use.
    ///
    /// `help` is only consulted when the counter is created.
    pub(crate) fn record(
        &self,
        name: &str,
        error_type: &str,
        help: impl FnOnce() -> String,
        registry: &prometheus::Registry,
    ) -> MetricsResult<ErrorCounter> {
        let family = self.family(name, help, registry)?;
        let child = family.with_label_values(&[error_type]);
        child.inc();
        trace!(metric = name, error_type, "error recorded");
        Ok(ErrorCounter { child })
    }

    /// Forget the cached counter and hand it back for unregistration.
    pub(crate) fn reset(&self) -> Option<ErrorFamily> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn family(
        &self,
        name: &str,
        help: impl FnOnce() -> String,
        registry: &prometheus::Registry,
    ) -> MetricsResult<CounterVec> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = slot.as_ref() {
            return Ok(existing.family.clone());
        }

        let family = CounterVec::new(Opts::new(name, help()), &[ERROR_TYPE_LABEL]).map_err(
            |source| MetricsError::InvalidMetric {
                name: name.to_string(),
                source,
            },
        )?;
        let owned = register(registry, name, Box::new(family.clone()))?;
        *slot = Some(ErrorFamily {
            family: family.clone(),
            owned,
        });
        Ok(family)
    }
}
