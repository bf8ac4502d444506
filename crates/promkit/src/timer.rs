use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

use crate::collector::SummaryCollector;

const NANOS_PER_SECOND: f64 = 1e9;

/// Source of monotonic timestamps for timers.
pub trait Clock: Send + Sync {
    /// Nanoseconds since an arbitrary, fixed origin.
    fn now_nanos(&self) -> u64;
}

/// Wall-independent clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Deterministic clock: every read returns the current value and then advances it by `step` nanoseconds.
///
/// A timer reads the clock once when it starts and once when it stops,
/// so a scope with no other reads in between measures exactly `step`.
#[derive(Debug)]
pub struct StepClock {
    next: AtomicU64,
    step: u64,
}

impl StepClock {
    pub fn new(step: u64) -> Self {
        Self {
            next: AtomicU64::new(0),
            step,
        }
    }
}

impl Clock for StepClock {
    fn now_nanos(&self) -> u64 {
        self.next.fetch_add(self.step, Ordering::Relaxed)
    }
}

/// Anything a timer can record an elapsed duration into.
pub trait Observe {
    fn observe(&self, value: f64);
}

impl Observe for prometheus::Histogram {
    fn observe(&self, value: f64) {
        prometheus::Histogram::observe(self, value)
    }
}

impl Observe for SummaryCollector {
    fn observe(&self, value: f64) {
        SummaryCollector::observe(self, value)
    }
}

/// A running timer bound to one histogram or summary.
///
/// The scope begins when the context is created and ends on [`TimerContext::stop`] or when the context is dropped.
/// Either way exactly one observation, in seconds, is recorded.
#[must_use = "a timer records when it is stopped or dropped"]
pub struct TimerContext<O: Observe> {
    target: O,
    clock: Arc<dyn Clock>,
    start: u64,
    done: bool,
}

impl<O: Observe> TimerContext<O> {
    pub(crate) fn start(target: O, clock: Arc<dyn Clock>) -> Self {
        let start = clock.now_nanos();
        Self {
            target,
            clock,
            start,
            done: false,
        }
    }

    /// End the scope, record the observation and return it.
    pub fn stop(mut self) -> f64 {
        self.record()
    }

    /// End the scope without recording anything.
    pub fn discard(mut self) {
        self.done = true;
    }

    /// Run `f` inside the scope and end the scope when it returns.
    pub fn scoped<F, R>(self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let out = f();
        self.stop();
        out
    }

    fn record(&mut self) -> f64 {
        let elapsed = self.clock.now_nanos().saturating_sub(self.start);
        let seconds = elapsed as f64 / NANOS_PER_SECOND;
        self.target.observe(seconds);
        self.done = true;
        seconds
    }
}

impl<O: Observe> Drop for TimerContext<O> {
    fn drop(&mut self) {
        if !self.done {
            self.record();
        }
    }
}

impl<O: Observe> fmt::Debug for TimerContext<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerContext")
            .field("start", &self.start)
            .field("done", &self.done)
            .finish()
    }
}

/// Single-use timer handed out by [`crate::PrometheusMetrics::timed`].
///
/// The clock is already running when the caller receives it.
#[derive(Debug)]
#[must_use = "a one-shot timer records when it is stopped or dropped"]
pub struct OneShotTimer {
    inner: TimerContext<SummaryCollector>,
}

impl OneShotTimer {
    pub(crate) fn start(summary: SummaryCollector, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: TimerContext::start(summary, clock),
        }
    }

    pub fn stop(self) -> f64 {
        self.inner.stop()
    }

    /// Stop without recording.
    pub fn discard(self) {
        self.inner.discard()
    }

    pub fn scoped<F, R>(self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.inner.scoped(f)
    }
}
