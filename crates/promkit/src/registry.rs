use std::sync::Arc;

use prometheus::{Registry, core::Collector};
use tracing::{debug, warn};

use crate::{
    error::{MetricsError, MetricsResult},
    timer::Clock,
};

/// What a metric needs from its facade to be built.
pub(crate) struct Backend {
    pub registry: Registry,
    pub clock: Arc<dyn Clock>,
}

/// Register `collector`, treating "already registered" as success.
///
/// Returns `true` when this call added the collector to the registry, `false` when an identical
/// descriptor was already present. Every other backend error propagates.
pub(crate) fn register(
    registry: &Registry,
    name: &str,
    collector: Box<dyn Collector>,
) -> MetricsResult<bool> {
    match registry.register(collector) {
        Ok(()) => {
            debug!(metric = name, "collector registered");
            Ok(true)
        }
        Err(prometheus::Error::AlreadyReg) => {
            debug!(metric = name, "collector already registered; keeping existing registration");
            Ok(false)
        }
        Err(source) => Err(MetricsError::Registration {
            name: name.to_string(),
            source,
        }),
    }
}

/// Remove `collector` from `registry`; failures are logged, not returned.
pub(crate) fn unregister(registry: &Registry, name: &str, collector: Box<dyn Collector>) {
    if let Err(e) = registry.unregister(collector) {
        warn!(metric = name, error = %e, "failed to unregister collector");
    }
}
