use std::fmt;

/// Monotonic counter.
#[derive(Clone)]
pub struct Counter {
    inner: prometheus::Counter,
}

impl Counter {
    pub(crate) fn new(inner: prometheus::Counter) -> Self {
        Self { inner }
    }

    pub fn inc(&self) {
        self.inner.inc();
    }

    /// Add `amount`; must not be negative.
    pub fn inc_by(&self, amount: f64) {
        self.inner.inc_by(amount);
    }

    pub fn get(&self) -> f64 {
        self.inner.get()
    }

    pub(crate) fn backend(&self) -> &prometheus::Counter {
        &self.inner
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counter").field("value", &self.get()).finish()
    }
}

/// Value that can go up and down.
#[derive(Clone)]
pub struct Gauge {
    inner: prometheus::Gauge,
}

impl Gauge {
    pub(crate) fn new(inner: prometheus::Gauge) -> Self {
        Self { inner }
    }

    pub fn inc(&self) {
        self.inner.inc();
    }

    pub fn inc_by(&self, amount: f64) {
        self.inner.add(amount);
    }

    pub fn dec(&self) {
        self.inner.dec();
    }

    pub fn dec_by(&self, amount: f64) {
        self.inner.sub(amount);
    }

    pub fn set(&self, value: f64) {
        self.inner.set(value);
    }

    pub fn get(&self) -> f64 {
        self.inner.get()
    }

    pub(crate) fn backend(&self) -> &prometheus::Gauge {
        &self.inner
    }
}

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gauge").field("value", &self.get()).finish()
    }
}
