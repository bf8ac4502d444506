use std::sync::Arc;

use tracing::{info, warn};

use promkit::{MetricsResult, PrometheusMetrics, Registry, StepClock};
use promkit_observe::{LoggerConfig, logger_init};

/// Login bookkeeping instrumented through a shared facade.
struct Sessions {
    metrics: PrometheusMetrics,
}

impl Sessions {
    fn new(metrics: PrometheusMetrics) -> Self {
        Self { metrics }
    }

    fn on_user_login(&self) -> MetricsResult<()> {
        self.metrics.gauge("Sessions.open")?.inc();
        Ok(())
    }

    fn on_user_logout(&self) -> MetricsResult<()> {
        self.metrics.gauge("Sessions.open")?.dec();
        Ok(())
    }

    fn on_error(&self) -> MetricsResult<()> {
        self.metrics.error_with_desc("generic", "Generic errors")?;
        Ok(())
    }

    fn handle_login(&self) -> MetricsResult<&'static str> {
        let out = self
            .metrics
            .timed_with_desc("Sessions.handleLogin", "Login times")?
            .scoped(|| "Login handled!");
        Ok(out)
    }
}

fn main() -> anyhow::Result<()> {
    logger_init(&LoggerConfig {
        level: "debug".to_string(),
        ..Default::default()
    })?;
    info!("logger initialized");

    let registry = Registry::new();
    let metrics = PrometheusMetrics::builder()
        .with_registry(registry.clone())
        .with_prefix("Example")
        .with_clock(Arc::new(StepClock::new(1979)))
        .build();
    let sessions = Sessions::new(metrics.clone());

    info!(response = sessions.handle_login()?, "login handled");
    sessions.on_user_login()?;
    sessions.on_user_login()?;
    sessions.on_user_logout()?;
    sessions.on_error()?;

    if let Err(e) = metrics.counter("Sessions.open") {
        warn!(error = %e, "expected type conflict");
    }

    print!("{}", metrics.render()?);
    Ok(())
}
