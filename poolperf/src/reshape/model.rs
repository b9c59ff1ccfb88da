use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use linked_hash_map::LinkedHashMap;
use serde::{Deserialize, Serialize};

use crate::catalog::MetricKey;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub const fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

/// Samples in bucket (chronological) order.
pub type PerformanceSeries = Vec<Sample>;

/// Series per device ordinal, in the order devices were first seen.
pub type PerDeviceSeries = LinkedHashMap<String, PerformanceSeries>;

#[inline]
pub fn bucket_midpoint(start: DateTime<Utc>, end: DateTime<Utc>) -> DateTime<Utc> {
    start + (end - start) / 2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricSeries {
    Flat(PerformanceSeries),
    PerDevice(PerDeviceSeries),
}

impl MetricSeries {
    pub const fn as_flat(&self) -> Option<&PerformanceSeries> {
        match self {
            Self::Flat(series) => Some(series),
            Self::PerDevice(_) => None,
        }
    }

    pub const fn as_per_device(&self) -> Option<&PerDeviceSeries> {
        match self {
            Self::PerDevice(series) => Some(series),
            Self::Flat(_) => None,
        }
    }

    pub fn nr_samples(&self) -> usize {
        match self {
            Self::Flat(series) => series.len(),
            Self::PerDevice(devices) => devices.values().map(Vec::len).sum(),
        }
    }
}

/// Uniform reshaped telemetry covering exactly the metric keys present in a raw response.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerformanceReport(BTreeMap<MetricKey, MetricSeries>);

impl PerformanceReport {
    pub fn get(&self, key: MetricKey) -> Option<&MetricSeries> {
        self.0.get(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = MetricKey> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetricKey, &MetricSeries)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert(&mut self, key: MetricKey, series: MetricSeries) {
        self.0.insert(key, series);
    }
}

impl IntoIterator for PerformanceReport {
    type IntoIter = std::collections::btree_map::IntoIter<MetricKey, MetricSeries>;
    type Item = (MetricKey, MetricSeries);

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
