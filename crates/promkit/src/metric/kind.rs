use std::fmt;

use prometheus::{HistogramOpts, Opts, core::Collector};

use crate::{
    collector::{SummaryCollector, SummaryOpts},
    error::{MetricsError, MetricsResult},
    metric::{Counter, Gauge, Histogram, Summary},
    registry::{Backend, register},
};

/// Quantiles tracked by every summary and timer, each with 1% tolerated rank error.
const SUMMARY_OBJECTIVES: [(f64, f64); 6] = [
    (0.5, 0.01),
    (0.75, 0.01),
    (0.9, 0.01),
    (0.95, 0.01),
    (0.99, 0.01),
    (0.999, 0.01),
];

/// The kinds of metric a facade hands out by name.
///
/// A name, once bound to a kind, cannot be requested as another kind.
/// Summaries and one-shot timers share a construction path but are distinct kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Summary,
    OneShotTimer,
}

impl MetricKind {
    /// Short symbolic name, for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
            MetricKind::OneShotTimer => "timer",
        }
    }

    pub(crate) fn matches(&self, metric: &Metric) -> bool {
        metric.kind() == *self
    }

    /// Construct the backend collector and register it.
    ///
    /// The flag is `false` when the registry already held an identical collector.
    pub(crate) fn build(
        &self,
        name: &str,
        help: &str,
        backend: &Backend,
    ) -> MetricsResult<(Metric, bool)> {
        let invalid = |source| MetricsError::InvalidMetric {
            name: name.to_string(),
            source,
        };

        match self {
            MetricKind::Counter => {
                let c = prometheus::Counter::with_opts(Opts::new(name, help)).map_err(invalid)?;
                let owned = register(&backend.registry, name, Box::new(c.clone()))?;
                Ok((Metric::Counter(Counter::new(c)), owned))
            }
            MetricKind::Gauge => {
                let g = prometheus::Gauge::with_opts(Opts::new(name, help)).map_err(invalid)?;
                let owned = register(&backend.registry, name, Box::new(g.clone()))?;
                Ok((Metric::Gauge(Gauge::new(g)), owned))
            }
            MetricKind::Histogram => {
                let h = prometheus::Histogram::with_opts(HistogramOpts::new(name, help))
                    .map_err(invalid)?;
                let owned = register(&backend.registry, name, Box::new(h.clone()))?;
                Ok((
                    Metric::Histogram(Histogram::new(h, backend.clock.clone())),
                    owned,
                ))
            }
            MetricKind::Summary => {
                let (s, owned) = build_summary(name, help, backend)?;
                Ok((Metric::Summary(s), owned))
            }
            MetricKind::OneShotTimer => {
                let (s, owned) = build_summary(name, help, backend)?;
                Ok((Metric::OneShotTimer(s), owned))
            }
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn build_summary(name: &str, help: &str, backend: &Backend) -> MetricsResult<(Summary, bool)> {
    let opts = SUMMARY_OBJECTIVES
        .iter()
        .fold(SummaryOpts::new(name, help), |opts, &(q, err)| {
            opts.quantile(q, err)
        });
    let s = SummaryCollector::with_opts(opts).map_err(|source| MetricsError::InvalidMetric {
        name: name.to_string(),
        source,
    })?;
    let owned = register(&backend.registry, name, Box::new(s.clone()))?;
    Ok((Summary::new(s, backend.clock.clone()), owned))
}

/// A handle held by the metric store.
#[derive(Clone)]
pub(crate) enum Metric {
    Counter(Counter),
    Gauge(Gauge),
    Histogram(Histogram),
    Summary(Summary),
    OneShotTimer(Summary),
}

impl Metric {
    pub(crate) fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::Histogram(_) => MetricKind::Histogram,
            Metric::Summary(_) => MetricKind::Summary,
            Metric::OneShotTimer(_) => MetricKind::OneShotTimer,
        }
    }

    /// A second handle on the backend collector, for unregistration.
    pub(crate) fn collector(&self) -> Box<dyn Collector> {
        match self {
            Metric::Counter(c) => Box::new(c.backend().clone()),
            Metric::Gauge(g) => Box::new(g.backend().clone()),
            Metric::Histogram(h) => Box::new(h.backend().clone()),
            Metric::Summary(s) | Metric::OneShotTimer(s) => Box::new(s.backend().clone()),
        }
    }
}

/// Typed view of a stored [`Metric`].
pub(crate) trait Typed: Sized {
    const KIND: MetricKind;

    fn from_metric(metric: &Metric) -> Option<Self>;
}

impl Typed for Counter {
    const KIND: MetricKind = MetricKind::Counter;

    fn from_metric(metric: &Metric) -> Option<Self> {
        match metric {
            Metric::Counter(c) => Some(c.clone()),
            _ => None,
        }
    }
}

impl Typed for Gauge {
    const KIND: MetricKind = MetricKind::Gauge;

    fn from_metric(metric: &Metric) -> Option<Self> {
        match metric {
            Metric::Gauge(g) => Some(g.clone()),
            _ => None,
        }
    }
}

impl Typed for Histogram {
    const KIND: MetricKind = MetricKind::Histogram;

    fn from_metric(metric: &Metric) -> Option<Self> {
        match metric {
            Metric::Histogram(h) => Some(h.clone()),
            _ => None,
        }
    }
}

impl Typed for Summary {
    const KIND: MetricKind = MetricKind::Summary;

    fn from_metric(metric: &Metric) -> Option<Self> {
        match metric {
            Metric::Summary(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// The summary behind a one-shot timer name.
pub(crate) struct TimedSummary(pub Summary);

impl Typed for TimedSummary {
    const KIND: MetricKind = MetricKind::OneShotTimer;

    fn from_metric(metric: &Metric) -> Option<Self> {
        match metric {
            Metric::OneShotTimer(s) => Some(TimedSummary(s.clone())),
            _ => None,
        }
    }
}
