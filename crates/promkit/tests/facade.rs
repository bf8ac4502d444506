use std::sync::Arc;

use prometheus::IntGauge;
use promkit::{
    DescriptionMappings, MetricsConfig, MetricsError, PrometheusMetrics, Registry, StepClock,
    inspect::{sample_value, samples},
};

const DESCRIPTIONS: &str = "\
# descriptions keyed by raw metric name
sizes-with-desc = Response Sizes なお知らせ (bytes)
myapp_errors = Application errors
";

fn setup() -> (Registry, PrometheusMetrics) {
    let registry = Registry::new();
    let metrics = PrometheusMetrics::builder()
        .with_registry(registry.clone())
        .with_prefix("MyApp")
        .with_clock(Arc::new(StepClock::new(1979)))
        .build();
    metrics.set_description_mappings(DescriptionMappings::from_properties(DESCRIPTIONS));
    (registry, metrics)
}

fn value(registry: &Registry, name: &str) -> Option<f64> {
    sample_value(registry, name, &[])
}

fn help_of(registry: &Registry, name: &str) -> Option<String> {
    registry
        .gather()
        .iter()
        .find(|f| f.name() == name)
        .map(|f| f.help().to_string())
}

fn approx(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-6
}

#[test]
fn default_constructor_uses_private_registry() {
    let (registry, _) = setup();
    let pm = PrometheusMetrics::new();

    pm.counter("counter_1").unwrap().inc_by(1701.0);

    assert_eq!(value(pm.registry(), "counter_1"), Some(1701.0));
    assert_eq!(value(&registry, "counter_1"), None);
    assert_eq!(pm.prefix(), "");
}

#[test]
fn shared_registry_does_not_leak_into_private_ones() {
    let (registry, metrics) = setup();
    let private = PrometheusMetrics::new();

    metrics.counter("counter_1").unwrap().inc_by(1701.0);

    assert_eq!(value(&registry, "myapp_counter_1"), Some(1701.0));
    assert_eq!(value(private.registry(), "myapp_counter_1"), None);
    assert!(samples(private.registry()).is_empty());
}

#[test]
fn timer_records_one_observation_per_scope() {
    let (registry, metrics) = setup();

    let out = metrics
        .timer("Test.timer#a")
        .unwrap()
        .time()
        .scoped(|| "Hi");
    assert_eq!(out, "Hi");

    assert_eq!(
        help_of(&registry, "myapp_test_timer_a").as_deref(),
        Some("myapp_test_timer_a")
    );
    assert_eq!(value(&registry, "myapp_test_timer_a_count"), Some(1.0));
    let sum = value(&registry, "myapp_test_timer_a_sum").unwrap();
    assert_eq!(sum * 1e9, 1979.0);
}

#[test]
fn timer_with_description() {
    let (registry, metrics) = setup();

    metrics
        .timer_with_desc("Test.timer#a", "blah")
        .unwrap()
        .time()
        .stop();

    assert_eq!(help_of(&registry, "myapp_test_timer_a").as_deref(), Some("blah"));
    assert_eq!(value(&registry, "myapp_test_timer_a_count"), Some(1.0));
}

#[test]
fn timed_reuses_the_same_summary() {
    let (registry, metrics) = setup();

    metrics.timed("Test.timer#42").unwrap().scoped(|| "Hi");
    metrics.timed("Test.timer#42").unwrap().scoped(|| "Bye");

    assert_eq!(
        help_of(&registry, "myapp_test_timer_42").as_deref(),
        Some("myapp_test_timer_42")
    );
    assert_eq!(value(&registry, "myapp_test_timer_42_count"), Some(2.0));
    let sum = value(&registry, "myapp_test_timer_42_sum").unwrap();
    assert!(approx(sum * 1e9, 3958.0), "sum was {sum}");
}

#[test]
fn timed_with_description_records_on_drop() {
    let (registry, metrics) = setup();

    {
        let _timer = metrics.timed_with_desc("Test.timer#7", "Desc").unwrap();
    }

    assert_eq!(help_of(&registry, "myapp_test_timer_7").as_deref(), Some("Desc"));
    assert_eq!(value(&registry, "myapp_test_timer_7_count"), Some(1.0));
    let sum = value(&registry, "myapp_test_timer_7_sum").unwrap();
    assert_eq!(sum * 1e9, 1979.0);
}

#[test]
fn histogram_accumulates_observations() {
    let (registry, metrics) = setup();

    metrics
        .histogram("response-sizes")
        .unwrap()
        .update(30000.0)
        .update(4535.0);

    assert_eq!(
        help_of(&registry, "myapp_response_sizes").as_deref(),
        Some("myapp_response_sizes")
    );
    assert_eq!(value(&registry, "myapp_response_sizes_sum"), Some(34535.0));
    assert_eq!(value(&registry, "myapp_response_sizes_count"), Some(2.0));
    assert_eq!(
        sample_value(&registry, "myapp_response_sizes_bucket", &[("le", "+Inf")]),
        Some(2.0)
    );
    assert_eq!(
        sample_value(&registry, "myapp_response_sizes_bucket", &[("le", "10")]),
        Some(0.0)
    );
}

#[test]
fn pluggable_descriptions() {
    let (registry, metrics) = setup();

    metrics.gauge("sizes-with-desc").unwrap().inc_by(198.0);

    assert_eq!(
        help_of(&registry, "myapp_sizes_with_desc").as_deref(),
        Some("Response Sizes なお知らせ (bytes)")
    );
}

#[test]
fn description_mappings_snapshot_and_replace() {
    let (registry, metrics) = setup();
    let current = metrics.description_mappings();
    assert_eq!(
        current.get("sizes-with-desc"),
        Some("Response Sizes なお知らせ (bytes)")
    );

    metrics.set_description_mappings([("queue", "Queued jobs")].into_iter().collect());
    assert_eq!(metrics.description_mappings().len(), 1);
    assert_eq!(current.len(), 2);

    metrics.gauge("queue").unwrap().inc();
    assert_eq!(help_of(&registry, "myapp_queue").as_deref(), Some("Queued jobs"));
}

#[test]
fn description_priority() {
    let mappings: DescriptionMappings = [("latency", "From mapping")].into_iter().collect();
    let facade = |registry: &Registry| {
        PrometheusMetrics::builder()
            .with_registry(registry.clone())
            .with_prefix("MyApp")
            .with_descriptions(mappings.clone())
            .build()
    };

    let explicit = Registry::new();
    facade(&explicit)
        .gauge_with_desc("latency", "Explicit")
        .unwrap()
        .inc();
    assert_eq!(help_of(&explicit, "myapp_latency").as_deref(), Some("Explicit"));

    let mapped = Registry::new();
    facade(&mapped).gauge("latency").unwrap().inc();
    assert_eq!(help_of(&mapped, "myapp_latency").as_deref(), Some("From mapping"));

    let fallback = Registry::new();
    let plain = PrometheusMetrics::with_registry(fallback.clone(), "MyApp");
    plain.gauge("latency").unwrap().inc();
    assert_eq!(help_of(&fallback, "myapp_latency").as_deref(), Some("myapp_latency"));
}

#[test]
fn histogram_timer_then_update() {
    let (registry, metrics) = setup();

    let out = metrics
        .histogram("Test_calc1")
        .unwrap()
        .observe_closure_duration(|| "Hi");
    assert_eq!(out, "Hi");
    assert_eq!(value(&registry, "myapp_test_calc1_count"), Some(1.0));
    let sum = value(&registry, "myapp_test_calc1_sum").unwrap();
    assert_eq!(sum * 1e9, 1979.0);

    metrics.histogram("Test_calc1").unwrap().update(0.00000032);
    let sum = value(&registry, "myapp_test_calc1_sum").unwrap();
    assert!(approx(sum * 1e9, 2299.0), "sum was {sum}");
}

#[test]
fn histogram_with_explicit_description() {
    let (registry, metrics) = setup();

    drop(metrics.histogram_with_desc("MyName", "MyDesc").unwrap().time());

    assert_eq!(help_of(&registry, "myapp_myname").as_deref(), Some("MyDesc"));
    assert_eq!(
        sample_value(&registry, "myapp_myname_bucket", &[("le", "0.005")]),
        Some(1.0)
    );
}

#[test]
fn summary_timers() {
    let (registry, metrics) = setup();

    metrics.summary("Test_calc1").unwrap().time().scoped(|| "First");
    metrics.summary("Test_calc1").unwrap().time().scoped(|| "Second");

    let one = 1979.0 / 1e9;
    for q in ["0.5", "0.75", "0.9", "0.95", "0.99", "0.999"] {
        assert_eq!(
            sample_value(&registry, "myapp_test_calc1", &[("quantile", q)]),
            Some(one),
            "quantile {q}"
        );
    }
    assert_eq!(value(&registry, "myapp_test_calc1_count"), Some(2.0));
    let sum = value(&registry, "myapp_test_calc1_sum").unwrap();
    assert!(approx(sum * 1e9, 3958.0), "sum was {sum}");
    assert_eq!(metrics.summary("Test_calc1").unwrap().quantile(0.99), one);
}

#[test]
fn summary_observations() {
    let (registry, metrics) = setup();

    metrics
        .summary("Vals")
        .unwrap()
        .update(1212.213412)
        .observe(3434.34234)
        .observe(3.1415926535875);

    assert_eq!(value(&registry, "myapp_vals_count"), Some(3.0));
    let sum = value(&registry, "myapp_vals_sum").unwrap();
    assert!(approx(sum, 4649.697344653588), "sum was {sum}");
}

#[test]
fn counter() {
    let (registry, metrics) = setup();
    let expected = 123_456_789.0;

    metrics
        .counter_with_desc("counter_1", "My first counter")
        .unwrap()
        .inc_by(expected);
    assert_eq!(value(&registry, "myapp_counter_1"), Some(expected));
    assert_eq!(
        help_of(&registry, "myapp_counter_1").as_deref(),
        Some("My first counter")
    );

    metrics.counter("counter_1").unwrap().inc();
    assert_eq!(value(&registry, "myapp_counter_1"), Some(expected + 1.0));
}

#[test]
fn equivalent_names_share_a_series() {
    let (registry, metrics) = setup();

    metrics.counter("Foo.Bar").unwrap().inc();
    metrics.counter("foo-bar").unwrap().inc();

    assert_eq!(value(&registry, "myapp_foo_bar"), Some(2.0));
}

#[test]
fn errors() {
    let (registry, metrics) = setup();
    let errors = |kind: &str| sample_value(&registry, "myapp_errors", &[("error_type", kind)]);

    metrics.error("salesforce").unwrap();
    assert_eq!(errors("salesforce"), Some(1.0));

    metrics
        .error_with_desc("stripe_transaction", "Stripe transaction error")
        .unwrap();
    assert_eq!(errors("stripe_transaction"), Some(1.0));

    let st_err = metrics.error("stripe_transaction").unwrap();
    assert_eq!(st_err.count(), 2.0);
    assert_eq!(errors("stripe_transaction"), Some(2.0));
    assert_eq!(errors("unknown"), None);

    let count = metrics
        .error_with_desc("stripe_transaction", "with desc this time")
        .unwrap()
        .count();
    assert_eq!(count, 3.0);

    assert_eq!(
        help_of(&registry, "myapp_errors").as_deref(),
        Some("Application errors")
    );
}

#[test]
fn gauge() {
    let (registry, metrics) = setup();
    let expected = 987_654_321.0;
    assert_eq!(value(&registry, "g_1"), None);

    metrics.gauge("g_1").unwrap().inc_by(expected);
    assert_eq!(value(&registry, "myapp_g_1"), Some(expected));

    metrics.gauge("g_1").unwrap().inc();
    assert_eq!(value(&registry, "myapp_g_1"), Some(expected + 1.0));

    metrics.gauge("g_1").unwrap().dec();
    assert_eq!(value(&registry, "myapp_g_1"), Some(expected));

    metrics.gauge_with_desc("g_1", "desc").unwrap().dec_by(1981.0);
    assert_eq!(value(&registry, "myapp_g_1"), Some(expected - 1981.0));
}

#[test]
fn clear_resets_everything() {
    let (registry, metrics) = setup();
    assert!(samples(&registry).is_empty());

    metrics.counter("counter_1").unwrap().inc_by(1.0);
    metrics.error("boom").unwrap();
    assert_eq!(value(&registry, "myapp_counter_1"), Some(1.0));

    metrics.clear();
    assert!(samples(&registry).is_empty());

    metrics.counter("counter_1").unwrap().inc_by(21.0);
    metrics.error("boom").unwrap();
    assert_eq!(value(&registry, "myapp_counter_1"), Some(21.0));
    assert_eq!(
        sample_value(&registry, "myapp_errors", &[("error_type", "boom")]),
        Some(1.0)
    );

    metrics.clear();
    assert!(samples(&registry).is_empty());
}

#[test]
fn clear_allows_a_new_kind_for_an_old_name() {
    let (_, metrics) = setup();

    metrics.counter("reused").unwrap();
    metrics.clear();

    assert!(metrics.gauge("reused").is_ok());
}

#[test]
fn custom_collectors() {
    let (registry, metrics) = setup();
    let open_fds = IntGauge::new("process_open_fds", "Number of open file descriptors").unwrap();
    open_fds.set(12);

    metrics.register_custom_collector(open_fds.clone()).unwrap();
    assert_eq!(value(&registry, "process_open_fds"), Some(12.0));

    let err = metrics.register_custom_collector(open_fds).unwrap_err();
    assert!(matches!(err, MetricsError::Registration { .. }));

    metrics.clear();
    assert_eq!(value(&registry, "process_open_fds"), None);
}

#[test]
fn cannot_reuse_metric_name() {
    let (_, metrics) = setup();

    metrics.counter_with_desc("xxx", "My first counter").unwrap();
    let err = metrics.gauge("xxx").unwrap_err();

    assert_eq!(
        err.to_string(),
        "myapp_xxx is already used for a different type of metric"
    );
}

#[test]
fn errors_name_is_reserved_for_the_error_counter() {
    let (registry, metrics) = setup();

    let err = metrics.counter("errors").unwrap_err();
    assert!(matches!(err, MetricsError::TypeConflict(ref n) if n == "myapp_errors"));
    assert!(metrics.gauge("Errors").is_err());
    assert!(metrics.timed("errors").is_err());

    metrics.error("stripe").unwrap();
    assert_eq!(
        sample_value(&registry, "myapp_errors", &[("error_type", "stripe")]),
        Some(1.0)
    );
    assert_eq!(value(&registry, "myapp_errors"), None);
}

#[test]
fn summary_and_timed_names_do_not_mix() {
    let (_, metrics) = setup();

    metrics.summary("latency").unwrap();
    let err = metrics.timed("latency").unwrap_err();
    assert!(matches!(err, MetricsError::TypeConflict(ref n) if n == "myapp_latency"));

    metrics.timed("handled").unwrap().stop();
    assert!(metrics.timer("handled").is_err());
}

#[test]
fn type_conflict_leaves_existing_metric_intact() {
    let (registry, metrics) = setup();

    metrics.counter("xxx").unwrap().inc();
    assert!(metrics.histogram("xxx").is_err());
    metrics.counter("xxx").unwrap().inc();

    assert_eq!(value(&registry, "myapp_xxx"), Some(2.0));
}

#[test]
fn invalid_names_are_rejected() {
    let (registry, metrics) = setup();

    let err = metrics.counter("requests/sec").unwrap_err();
    assert!(matches!(err, MetricsError::InvalidMetric { .. }));
    assert!(samples(&registry).is_empty());
}

#[test]
fn concurrent_callers_share_one_counter() {
    let (registry, metrics) = setup();

    std::thread::scope(|s| {
        for _ in 0..8 {
            let metrics = metrics.clone();
            s.spawn(move || {
                for _ in 0..250 {
                    metrics.counter("hits").unwrap().inc();
                    metrics.error("contended").unwrap();
                }
            });
        }
    });

    assert_eq!(value(&registry, "myapp_hits"), Some(2000.0));
    assert_eq!(
        sample_value(&registry, "myapp_errors", &[("error_type", "contended")]),
        Some(2000.0)
    );
}

#[test]
fn from_config_layers_descriptions() {
    let path = std::env::temp_dir().join(format!("promkit-{}.properties", std::process::id()));
    std::fs::write(&path, "logins = Logins from file\nlogouts = Logouts from file\n").unwrap();

    let cfg = MetricsConfig {
        prefix: "Cfg".to_string(),
        descriptions: [("logouts", "Logouts inline")].into_iter().collect(),
        descriptions_file: Some(path.clone()),
    };
    let registry = Registry::new();
    let metrics = PrometheusMetrics::from_config(registry.clone(), &cfg).unwrap();
    std::fs::remove_file(&path).unwrap();

    metrics.counter("logins").unwrap().inc();
    metrics.counter("logouts").unwrap().inc();

    assert_eq!(
        help_of(&registry, "cfg_logins").as_deref(),
        Some("Logins from file")
    );
    assert_eq!(
        help_of(&registry, "cfg_logouts").as_deref(),
        Some("Logouts inline")
    );
}

#[test]
fn from_config_reports_missing_file() {
    let cfg = MetricsConfig {
        descriptions_file: Some("/no/such/metrics.properties".into()),
        ..MetricsConfig::default()
    };

    let err = PrometheusMetrics::from_config(Registry::new(), &cfg).unwrap_err();
    assert!(matches!(err, MetricsError::Io { .. }));
}

#[test]
fn render_uses_text_exposition() {
    let (_, metrics) = setup();

    metrics
        .counter_with_desc("counter_1", "My first counter")
        .unwrap()
        .inc();
    let text = metrics.render().unwrap();

    assert!(text.contains("# HELP myapp_counter_1 My first counter"));
    assert!(text.contains("# TYPE myapp_counter_1 counter"));
}
