use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use tracing::debug;

use crate::{
    error::{MetricsError, MetricsResult},
    metric::{Metric, MetricKind},
};

/// Adjusted name → metric handle, at most one per name.
pub(crate) struct MetricStore {
    entries: RwLock<HashMap<String, Entry>>,
}

pub(crate) struct Entry {
    pub metric: Metric,
    /// Whether registering this metric added it to the registry.
    pub owned: bool,
}

impl MetricStore {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the metric stored under `name`, building it if absent.
    ///
    /// A stored metric of another kind is a [`MetricsError::TypeConflict`]. `build` runs under
    /// the write lock after a second lookup, so a name is built and registered at most once.
    /// Nothing is stored when `build` fails.
    pub(crate) fn get_or_create<F>(
        &self,
        name: &str,
        kind: MetricKind,
        build: F,
    ) -> MetricsResult<Metric>
    where
        F: FnOnce() -> MetricsResult<(Metric, bool)>,
    {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(name) {
                return checked(name, kind, &entry.metric);
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get(name) {
            return checked(name, kind, &entry.metric);
        }

        let (metric, owned) = build()?;
        debug!(metric = name, kind = %kind, owned, "metric created");
        entries.insert(
            name.to_string(),
            Entry {
                metric: metric.clone(),
                owned,
            },
        );
        Ok(metric)
    }

    /// Remove every entry.
    pub(crate) fn drain(&self) -> Vec<(String, Entry)> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.drain().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn checked(name: &str, kind: MetricKind, metric: &Metric) -> MetricsResult<Metric> {
    if kind.matches(metric) {
        Ok(metric.clone())
    } else {
        Err(MetricsError::TypeConflict(name.to_string()))
    }
}
