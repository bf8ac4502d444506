//! Read current values back out of a registry.
//!
//! Families are flattened into individual samples the way they appear in the text exposition:
//! counters and gauges as `name`, summaries as `name{quantile}`, `name_count` and `name_sum`,
//! histograms as `name_bucket{le}` (including `+Inf`), `name_count` and `name_sum`.

use prometheus::{Registry, proto::MetricFamily};

/// One exposed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl Sample {
    fn new(name: impl Into<String>, labels: Vec<(String, String)>, value: f64) -> Self {
        Self {
            name: name.into(),
            labels,
            value,
        }
    }

    fn has_labels(&self, expected: &[(&str, &str)]) -> bool {
        self.labels.len() == expected.len()
            && expected
                .iter()
                .all(|(k, v)| self.labels.iter().any(|(lk, lv)| lk == k && lv == v))
    }
}

/// Every sample currently exposed by `registry`.
pub fn samples(registry: &Registry) -> Vec<Sample> {
    registry.gather().iter().flat_map(family_samples).collect()
}

/// Value of the sample called `name` whose labels are exactly `labels`.
pub fn sample_value(registry: &Registry, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    samples(registry)
        .into_iter()
        .find(|s| s.name == name && s.has_labels(labels))
        .map(|s| s.value)
}

fn family_samples(family: &MetricFamily) -> Vec<Sample> {
    let name = family.name();
    let mut out = Vec::new();

    for metric in &family.metric {
        let labels: Vec<(String, String)> = metric
            .label
            .iter()
            .map(|l| (l.name().to_string(), l.value().to_string()))
            .collect();

        if metric.counter.is_some() {
            out.push(Sample::new(name, labels, metric.counter.value()));
        } else if metric.gauge.is_some() {
            out.push(Sample::new(name, labels, metric.gauge.value()));
        } else if metric.summary.is_some() {
            let summary = &metric.summary;
            for q in &summary.quantile {
                out.push(Sample::new(
                    name,
                    with_label(&labels, "quantile", fmt_float(q.quantile())),
                    q.value(),
                ));
            }
            out.push(Sample::new(
                format!("{name}_count"),
                labels.clone(),
                summary.sample_count() as f64,
            ));
            out.push(Sample::new(format!("{name}_sum"), labels, summary.sample_sum()));
        } else if metric.histogram.is_some() {
            let histogram = &metric.histogram;
            let bucket_name = format!("{name}_bucket");
            for b in &histogram.bucket {
                out.push(Sample::new(
                    bucket_name.as_str(),
                    with_label(&labels, "le", fmt_float(b.upper_bound())),
                    b.cumulative_count() as f64,
                ));
            }
            let has_inf = histogram
                .bucket
                .last()
                .is_some_and(|b| b.upper_bound().is_infinite());
            if !has_inf {
                out.push(Sample::new(
                    bucket_name.as_str(),
                    with_label(&labels, "le", "+Inf".to_string()),
                    histogram.sample_count() as f64,
                ));
            }
            out.push(Sample::new(
                format!("{name}_count"),
                labels.clone(),
                histogram.sample_count() as f64,
            ));
            out.push(Sample::new(format!("{name}_sum"), labels, histogram.sample_sum()));
        } else if metric.untyped.is_some() {
            out.push(Sample::new(name, labels, metric.untyped.value()));
        }
    }
    out
}

fn with_label(labels: &[(String, String)], name: &str, value: String) -> Vec<(String, String)> {
    let mut out = labels.to_vec();
    out.push((name.to_string(), value));
    out
}

fn fmt_float(v: f64) -> String {
    if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{v}")
    }
}
