use std::{fmt, sync::Arc};

use crate::{
    collector::SummaryCollector,
    timer::{Clock, TimerContext},
};

/// Bucketed distribution using the backend's default buckets.
#[derive(Clone)]
pub struct Histogram {
    inner: prometheus::Histogram,
    clock: Arc<dyn Clock>,
}

impl Histogram {
    pub(crate) fn new(inner: prometheus::Histogram, clock: Arc<dyn Clock>) -> Self {
        Self { inner, clock }
    }

    pub fn observe(&self, value: f64) -> &Self {
        self.inner.observe(value);
        self
    }

    /// Same as [`Histogram::observe`].
    pub fn update(&self, value: f64) -> &Self {
        self.observe(value)
    }

    /// Start a timer that records into this histogram when stopped or dropped.
    pub fn time(&self) -> TimerContext<prometheus::Histogram> {
        TimerContext::start(self.inner.clone(), self.clock.clone())
    }

    pub fn observe_closure_duration<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.time().scoped(f)
    }

    pub fn sample_count(&self) -> u64 {
        self.inner.get_sample_count()
    }

    pub fn sample_sum(&self) -> f64 {
        self.inner.get_sample_sum()
    }

    pub(crate) fn backend(&self) -> &prometheus::Histogram {
        &self.inner
    }
}

impl fmt::Debug for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Histogram")
            .field("count", &self.sample_count())
            .field("sum", &self.sample_sum())
            .finish()
    }
}

/// Streaming quantile summary; also the backing store of timers.
#[derive(Clone)]
pub struct Summary {
    inner: SummaryCollector,
    clock: Arc<dyn Clock>,
}

impl Summary {
    pub(crate) fn new(inner: SummaryCollector, clock: Arc<dyn Clock>) -> Self {
        Self { inner, clock }
    }

    pub fn observe(&self, value: f64) -> &Self {
        self.inner.observe(value);
        self
    }

    /// Same as [`Summary::observe`].
    pub fn update(&self, value: f64) -> &Self {
        self.observe(value)
    }

    /// Start a timer that records into this summary when stopped or dropped.
    pub fn time(&self) -> TimerContext<SummaryCollector> {
        TimerContext::start(self.inner.clone(), self.clock.clone())
    }

    pub fn observe_closure_duration<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.time().scoped(f)
    }

    pub fn sample_count(&self) -> u64 {
        self.inner.sample_count()
    }

    pub fn sample_sum(&self) -> f64 {
        self.inner.sample_sum()
    }

    pub fn quantile(&self, q: f64) -> f64 {
        self.inner.quantile(q)
    }

    pub(crate) fn backend(&self) -> &SummaryCollector {
        &self.inner
    }

    pub(crate) fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }
}

impl fmt::Debug for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Summary")
            .field("count", &self.sample_count())
            .field("sum", &self.sample_sum())
            .finish()
    }
}
