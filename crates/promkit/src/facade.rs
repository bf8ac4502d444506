use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use prometheus::{Encoder, Registry, TextEncoder, core::Collector, proto::MetricFamily};
use tracing::debug;

use crate::{
    config::MetricsConfig,
    describe::{DescriptionMappings, resolve},
    error::{MetricsError, MetricsResult},
    metric::{
        Counter, ErrorCounter, ErrorCounters, Gauge, Histogram, Summary, TimedSummary, Typed,
    },
    name::{normalize, prefix_for},
    registry::{Backend, unregister},
    store::MetricStore,
    timer::{Clock, MonotonicClock, OneShotTimer},
};

const ERRORS_NAME: &str = "errors";

/// Named-metric facade over a Prometheus [`Registry`].
///
/// Cloning is cheap; clones share the registry, the registered metrics and the error counter.
#[derive(Clone)]
pub struct PrometheusMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Backend,
    prefix: String,
    descriptions: RwLock<DescriptionMappings>,
    store: MetricStore,
    errors: ErrorCounters,
    custom: Mutex<Vec<Box<dyn Collector>>>,
}

/// Builder for [`PrometheusMetrics`].
pub struct MetricsBuilder {
    registry: Option<Registry>,
    prefix: String,
    clock: Option<Arc<dyn Clock>>,
    descriptions: DescriptionMappings,
}

impl MetricsBuilder {
    /// Share `registry` instead of creating a private one.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_descriptions(mut self, descriptions: DescriptionMappings) -> Self {
        self.descriptions = descriptions;
        self
    }

    pub fn build(self) -> PrometheusMetrics {
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        PrometheusMetrics {
            inner: Arc::new(Inner {
                backend: Backend {
                    registry: self.registry.unwrap_or_else(Registry::new),
                    clock,
                },
                prefix: prefix_for(&self.prefix),
                descriptions: RwLock::new(self.descriptions),
                store: MetricStore::new(),
                errors: ErrorCounters::new(),
                custom: Mutex::new(Vec::new()),
            }),
        }
    }
}

impl PrometheusMetrics {
    /// Facade over a fresh private registry, without prefix.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Facade over a shared registry; every name gets `<prefix>_` prepended.
    pub fn with_registry(registry: Registry, prefix: &str) -> Self {
        Self::builder()
            .with_registry(registry)
            .with_prefix(prefix)
            .build()
    }

    pub fn builder() -> MetricsBuilder {
        MetricsBuilder {
            registry: None,
            prefix: String::new(),
            clock: None,
            descriptions: DescriptionMappings::new(),
        }
    }

    /// Facade configured from [`MetricsConfig`].
    ///
    /// The descriptions file is read first; inline descriptions override it.
    pub fn from_config(registry: Registry, cfg: &MetricsConfig) -> MetricsResult<Self> {
        let mut descriptions = match &cfg.descriptions_file {
            Some(path) => DescriptionMappings::load(path)?,
            None => DescriptionMappings::new(),
        };
        descriptions.extend(cfg.descriptions.clone());

        Ok(Self::builder()
            .with_registry(registry)
            .with_prefix(cfg.prefix.clone())
            .with_descriptions(descriptions)
            .build())
    }

    pub fn counter(&self, name: &str) -> MetricsResult<Counter> {
        self.get_or_add(name, None)
    }

    pub fn counter_with_desc(&self, name: &str, desc: &str) -> MetricsResult<Counter> {
        self.get_or_add(name, Some(desc))
    }

    pub fn gauge(&self, name: &str) -> MetricsResult<Gauge> {
        self.get_or_add(name, None)
    }

    pub fn gauge_with_desc(&self, name: &str, desc: &str) -> MetricsResult<Gauge> {
        self.get_or_add(name, Some(desc))
    }

    pub fn histogram(&self, name: &str) -> MetricsResult<Histogram> {
        self.get_or_add(name, None)
    }

    pub fn histogram_with_desc(&self, name: &str, desc: &str) -> MetricsResult<Histogram> {
        self.get_or_add(name, Some(desc))
    }

    pub fn summary(&self, name: &str) -> MetricsResult<Summary> {
        self.get_or_add(name, None)
    }

    pub fn summary_with_desc(&self, name: &str, desc: &str) -> MetricsResult<Summary> {
        self.get_or_add(name, Some(desc))
    }

    /// Alias for [`PrometheusMetrics::summary`].
    pub fn timer(&self, name: &str) -> MetricsResult<Summary> {
        self.summary(name)
    }

    /// Alias for [`PrometheusMetrics::summary_with_desc`].
    pub fn timer_with_desc(&self, name: &str, desc: &str) -> MetricsResult<Summary> {
        self.summary_with_desc(name, desc)
    }

    /// Start a one-shot timer recording into the summary registered under `name`.
    pub fn timed(&self, name: &str) -> MetricsResult<OneShotTimer> {
        self.start_timed(name, None)
    }

    pub fn timed_with_desc(&self, name: &str, desc: &str) -> MetricsResult<OneShotTimer> {
        self.start_timed(name, Some(desc))
    }

    /// Count one occurrence of `error_type` in the shared `<prefix>errors` counter.
    ///
    /// The `errors` name is reserved: requesting it as any other kind fails with
    /// [`MetricsError::TypeConflict`].
    pub fn error(&self, error_type: &str) -> MetricsResult<ErrorCounter> {
        self.record_error(error_type, None)
    }

    /// Like [`PrometheusMetrics::error`]; `desc` only matters if this call creates the counter.
    pub fn error_with_desc(&self, error_type: &str, desc: &str) -> MetricsResult<ErrorCounter> {
        self.record_error(error_type, Some(desc))
    }

    /// Replace the description table used for metrics created from now on.
    pub fn set_description_mappings(&self, mappings: DescriptionMappings) {
        *self
            .inner
            .descriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner) = mappings;
    }

    pub fn description_mappings(&self) -> DescriptionMappings {
        self.inner
            .descriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register a collector this facade does not build itself.
    ///
    /// Unlike named metrics, a duplicate registration is reported as an error.
    pub fn register_custom_collector<C>(&self, collector: C) -> MetricsResult<()>
    where
        C: Collector + Clone + 'static,
    {
        let name = collector_name(&collector);
        self.inner
            .backend
            .registry
            .register(Box::new(collector.clone()))
            .map_err(|source| MetricsError::Registration {
                name: name.clone(),
                source,
            })?;
        debug!(collector = %name, "custom collector registered");

        self.inner
            .custom
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(collector));
        Ok(())
    }

    /// Forget every metric and unregister everything this facade registered.
    ///
    /// The facade stays usable; names created afterwards start from zero.
    pub fn clear(&self) {
        let registry = &self.inner.backend.registry;

        let entries = self.inner.store.drain();
        let dropped = entries.len();
        for (name, entry) in entries {
            if entry.owned {
                unregister(registry, &name, entry.metric.collector());
            }
        }

        if let Some(errors) = self.inner.errors.reset()
            && errors.owned
        {
            let name = self.errors_name();
            unregister(registry, &name, Box::new(errors.family));
        }

        let custom: Vec<_> = self
            .inner
            .custom
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for collector in custom {
            let name = collector_name(collector.as_ref());
            unregister(registry, &name, collector);
        }

        debug!(prefix = %self.inner.prefix, dropped, "metrics cleared");
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.backend.registry
    }

    /// Normalized prefix including the trailing `_`, or empty.
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.inner.backend.registry.gather()
    }

    /// Registry contents in the Prometheus text exposition format.
    pub fn render(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.gather(), &mut buffer)
            .map_err(MetricsError::Encode)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    fn adjusted_name(&self, name: &str) -> String {
        format!("{}{}", self.inner.prefix, normalize(name))
    }

    fn errors_name(&self) -> String {
        format!("{}{}", self.inner.prefix, ERRORS_NAME)
    }

    fn get_or_add<K: Typed>(&self, name: &str, desc: Option<&str>) -> MetricsResult<K> {
        let adjusted = self.adjusted_name(name);
        // Reserved for the error counter, which lives outside the store.
        if adjusted == self.errors_name() {
            return Err(MetricsError::TypeConflict(adjusted));
        }
        let metric = self.inner.store.get_or_create(&adjusted, K::KIND, || {
            let help = {
                let mappings = self
                    .inner
                    .descriptions
                    .read()
                    .unwrap_or_else(PoisonError::into_inner);
                resolve(name, &adjusted, desc, &mappings)
            };
            K::KIND.build(&adjusted, &help, &self.inner.backend)
        })?;
        K::from_metric(&metric).ok_or(MetricsError::TypeConflict(adjusted))
    }

    fn start_timed(&self, name: &str, desc: Option<&str>) -> MetricsResult<OneShotTimer> {
        let TimedSummary(summary) = self.get_or_add(name, desc)?;
        Ok(OneShotTimer::start(
            summary.backend().clone(),
            summary.clock(),
        ))
    }

    fn record_error(&self, error_type: &str, desc: Option<&str>) -> MetricsResult<ErrorCounter> {
        let name = self.errors_name();
        let help = || {
            let mappings = self
                .inner
                .descriptions
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            resolve(&name, &name, desc, &mappings)
        };
        self.inner
            .errors
            .record(&name, error_type, help, &self.inner.backend.registry)
    }
}

impl Default for PrometheusMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrometheusMetrics")
            .field("prefix", &self.inner.prefix)
            .field("metrics", &self.inner.store.len())
            .finish()
    }
}

fn collector_name(collector: &dyn Collector) -> String {
    collector
        .desc()
        .iter()
        .map(|d| d.fq_name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
