use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use prometheus::{
    core::{Collector, Desc},
    proto,
};
use quantiles::ckms::CKMS;

/// Options for a [`SummaryCollector`].
#[derive(Debug, Clone)]
pub struct SummaryOpts {
    pub name: String,
    pub help: String,
    /// `(quantile, tolerated rank error)` pairs.
    pub objectives: Vec<(f64, f64)>,
}

impl SummaryOpts {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            objectives: Vec::new(),
        }
    }

    pub fn quantile(mut self, quantile: f64, error: f64) -> Self {
        self.objectives.push((quantile, error));
        self
    }
}

/// Streaming summary exposed as a Prometheus SUMMARY family.
///
/// Quantiles are estimated with a CKMS stream whose error bound is the tightest
/// tolerance among the configured objectives. Clones share state, so one clone can
/// live in a registry while another records observations.
///
/// The stream is cumulative: quantiles cover every observation since creation, with no
/// sliding age window, until the collector is dropped (for instance by `clear`).
#[derive(Clone)]
pub struct SummaryCollector {
    desc: Desc,
    objectives: Arc<[f64]>,
    core: Arc<Mutex<SummaryCore>>,
}

struct SummaryCore {
    stream: CKMS<f64>,
    count: u64,
    sum: f64,
}

impl SummaryCollector {
    pub fn with_opts(opts: SummaryOpts) -> prometheus::Result<Self> {
        let desc = Desc::new(opts.name, opts.help, vec![], HashMap::new())?;
        let error = opts
            .objectives
            .iter()
            .map(|&(_, err)| err)
            .fold(f64::INFINITY, f64::min);
        let error = if error.is_finite() { error } else { 0.01 };

        Ok(Self {
            desc,
            objectives: opts.objectives.iter().map(|&(q, _)| q).collect(),
            core: Arc::new(Mutex::new(SummaryCore {
                stream: CKMS::new(error),
                count: 0,
                sum: 0.0,
            })),
        })
    }

    pub fn observe(&self, value: f64) {
        let mut core = self.core.lock().unwrap_or_else(PoisonError::into_inner);
        core.count += 1;
        core.sum += value;
        if !value.is_nan() {
            core.stream.insert(value);
        }
    }

    pub fn sample_count(&self) -> u64 {
        self.core
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .count
    }

    pub fn sample_sum(&self) -> f64 {
        self.core.lock().unwrap_or_else(PoisonError::into_inner).sum
    }

    /// Current estimate for `q`; NaN while nothing has been observed.
    pub fn quantile(&self, q: f64) -> f64 {
        let core = self.core.lock().unwrap_or_else(PoisonError::into_inner);
        core.stream.query(q).map(|(_, v)| v).unwrap_or(f64::NAN)
    }

    pub fn name(&self) -> &str {
        &self.desc.fq_name
    }
}

impl fmt::Debug for SummaryCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryCollector")
            .field("name", &self.desc.fq_name)
            .field("objectives", &self.objectives)
            .finish()
    }
}

impl Collector for SummaryCollector {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.desc]
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        let core = self.core.lock().unwrap_or_else(PoisonError::into_inner);

        let mut summary = proto::Summary::default();
        summary.set_sample_count(core.count);
        summary.set_sample_sum(core.sum);
        for &q in self.objectives.iter() {
            let mut quantile = proto::Quantile::default();
            quantile.set_quantile(q);
            quantile.set_value(core.stream.query(q).map(|(_, v)| v).unwrap_or(f64::NAN));
            summary.quantile.push(quantile);
        }

        let mut metric = proto::Metric::default();
        metric.set_summary(summary);

        let mut family = proto::MetricFamily::default();
        family.set_name(self.desc.fq_name.clone());
        family.set_help(self.desc.help.clone());
        family.set_type(proto::MetricType::SUMMARY);
        family.metric.push(metric);

        vec![family]
    }
}
