//! Source side of the bridge: snapshots of named, multi-valued metrics.
//!
//! The exporter never looks at metric kinds. It only sees the uniform
//! two-level [`Snapshot`] shape: metric name → sub-value name → raw value.
//! [`MetricSummary`] exists for producers that hold typed, pre-computed
//! readings and want them flattened under the conventional sub-value names.

use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};

use crate::{
    definitions::{COUNT, ERROR, VALUE, distribution, rates},
    value::RawValue,
};

/// Sub-value name → raw value for one metric.
pub type MetricValues = BTreeMap<String, RawValue>;

/// Metric name → sub-values. Ordered, so a pull is iterated deterministically.
pub type Snapshot = BTreeMap<String, MetricValues>;

/// Anything that can hand out the current state of a metrics registry.
pub trait SnapshotSource {
    /// Return a fresh snapshot. Called once per export tick.
    fn snapshot(&self) -> Snapshot;
}

impl<T: SnapshotSource + ?Sized> SnapshotSource for &T {
    fn snapshot(&self) -> Snapshot {
        (**self).snapshot()
    }
}

impl<T: SnapshotSource + ?Sized> SnapshotSource for Arc<T> {
    fn snapshot(&self) -> Snapshot {
        (**self).snapshot()
    }
}

/// A fixed snapshot is its own source.
impl SnapshotSource for Snapshot {
    fn snapshot(&self) -> Snapshot {
        self.clone()
    }
}

/// Moving-average rates, in events per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    pub one_minute: f64,
    pub five_minute: f64,
    pub fifteen_minute: f64,
    pub mean: f64,
}

/// Pre-computed distribution statistics of a histogram or timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub count: i64,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub stddev: f64,
    pub median: f64,
    pub p75: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
}

/// Typed reading of one source metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MetricSummary {
    Counter { count: i64 },
    Gauge { value: i64 },
    GaugeFloat64 { value: f64 },
    Meter { count: i64, rates: Rates },
    Histogram(Distribution),
    Timer { distribution: Distribution, rates: Rates },
    HealthCheck { error: Option<String> },
}

impl MetricSummary {
    /// Flatten into sub-values.
    ///
    /// Produces 1 value for counters, gauges and health checks, 5 for meters,
    /// 10 for histograms and 14 for timers.
    #[must_use]
    pub fn values(&self) -> MetricValues {
        let mut out = MetricValues::new();
        match self {
            Self::Counter { count } => {
                put(&mut out, COUNT, *count);
            },
            Self::Gauge { value } => {
                put(&mut out, VALUE, *value);
            },
            Self::GaugeFloat64 { value } => {
                put(&mut out, VALUE, *value);
            },
            Self::Meter { count, rates } => {
                put(&mut out, COUNT, *count);
                put_rates(&mut out, rates);
            },
            Self::Histogram(dist) => {
                put_distribution(&mut out, dist);
            },
            Self::Timer {
                distribution,
                rates,
            } => {
                put_distribution(&mut out, distribution);
                put_rates(&mut out, rates);
            },
            Self::HealthCheck { error } => {
                put(&mut out, ERROR, error.clone());
            },
        }
        out
    }
}

fn put(out: &mut MetricValues, name: &str, value: impl Into<RawValue>) {
    out.insert(name.to_string(), value.into());
}

fn put_rates(out: &mut MetricValues, r: &Rates) {
    put(out, rates::RATE_1M, r.one_minute);
    put(out, rates::RATE_5M, r.five_minute);
    put(out, rates::RATE_15M, r.fifteen_minute);
    put(out, rates::MEAN_RATE, r.mean);
}

fn put_distribution(out: &mut MetricValues, d: &Distribution) {
    put(out, COUNT, d.count);
    put(out, distribution::MIN, d.min);
    put(out, distribution::MAX, d.max);
    put(out, distribution::MEAN, d.mean);
    put(out, distribution::STDDEV, d.stddev);
    put(out, distribution::MEDIAN, d.median);
    put(out, distribution::P75, d.p75);
    put(out, distribution::P95, d.p95);
    put(out, distribution::P99, d.p99);
    put(out, distribution::P999, d.p999);
}

/// In-memory source registry.
///
/// Producers push already computed values with [`update`](Self::update) or
/// [`update_metric`](Self::update_metric); the exporter pulls a copy on each
/// tick. Share it behind an `Arc` between producers and the exporter.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    metrics: RwLock<Snapshot>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all sub-values of `name`.
    pub fn update<K, V, I>(&self, name: &str, values: I)
    where
        K: Into<String>,
        V: Into<RawValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let values: MetricValues = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.write().insert(name.to_string(), values);
    }

    /// Replace `name` with the flattened form of a typed summary.
    pub fn update_metric(&self, name: &str, summary: &MetricSummary) {
        self.write().insert(name.to_string(), summary.values());
    }

    /// Drop a metric. Returns whether it was present.
    pub fn remove(&self, name: &str) -> bool {
        self.write().remove(name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Snapshot> {
        self.metrics.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Snapshot> {
        self.metrics.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotSource for SourceRegistry {
    fn snapshot(&self) -> Snapshot {
        self.read().clone()
    }
}
