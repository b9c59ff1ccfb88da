use std::collections::HashMap;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::bucket_midpoint;
use crate::error::{PayloadDefect, PerformanceError};
use crate::query::Aggregation;

pub const SEGMENTS: &str = "segments";
const START: &str = "start";
const END: &str = "end";

/// One nested aggregate within a bucket: dimension values plus aggregates keyed by upstream
/// metric id, e.g. `{"cloud/roleInstance": "tvm-1", "customMetrics/Cpu usage": {"avg": 12.5}}`.
pub type Segment = Map<String, Value>;

/// Raw results of a query batch, keyed by the descriptor key each result answers.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawMetricResults(pub HashMap<String, RawMetricResult>);

impl RawMetricResults {
    /// Accepts either the upstream batch response array or an object keyed by metric key.
    pub fn from_json(payload: Value) -> Result<Self, PerformanceError> {
        match payload {
            Value::Array(_) => Self::from_batch_response(payload),
            keyed => Ok(serde_json::from_value(keyed)?),
        }
    }

    /// Unpacks a batch response of the form `[{"id", "status", "body": {"value": {..}}}]`.
    #[tracing::instrument(level = "trace", skip(response))]
    pub fn from_batch_response(response: Value) -> Result<Self, PerformanceError> {
        let entries: Vec<BatchEntry> = serde_json::from_value(response)?;

        let mut results = HashMap::with_capacity(entries.len());
        for entry in entries {
            if let Some(status) = entry.status {
                if !(200..300).contains(&status) {
                    tracing::warn!(id=%entry.id, %status, body=?entry.body, "failed query in batch response");
                    return Err(PerformanceError::Executor(anyhow!(
                        "query {} failed with status {}",
                        entry.id,
                        status
                    )));
                }
            }

            let value = entry
                .body
                .get("value")
                .cloned()
                .ok_or_else(|| PerformanceError::Executor(anyhow!("batch response for {} carries no value", entry.id)))?;
            results.insert(entry.id, serde_json::from_value(value)?);
        }

        Ok(Self(results))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for RawMetricResults {
    type IntoIter = std::collections::hash_map::IntoIter<String, RawMetricResult>;
    type Item = (String, RawMetricResult);

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, RawMetricResult)> for RawMetricResults {
    fn from_iter<T: IntoIterator<Item = (String, RawMetricResult)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Deserialize)]
struct BatchEntry {
    id: String,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    body: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetricResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    /// Raw time buckets, validated one at a time during reshaping so a defect can be traced to
    /// its bucket index. `None` when the result carries no `segments` array at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Value>>,
}

/// Single time-windowed aggregate, bounded by `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricBucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub segments: Option<Vec<Segment>>,
    pub aggregates: Map<String, Value>,
}

impl MetricBucket {
    pub fn from_value(bucket: &Value) -> Result<Self, PayloadDefect> {
        let fields = bucket.as_object().ok_or(PayloadDefect::InvalidBucket)?;
        let start = bucket_bound(fields, START)?;
        let end = bucket_bound(fields, END)?;

        let segments = match fields.get(SEGMENTS) {
            None | Some(Value::Null) => None,
            Some(Value::Array(segments)) => Some(
                segments
                    .iter()
                    .enumerate()
                    .map(|(position, s)| s.as_object().cloned().ok_or(PayloadDefect::InvalidSegment(position)))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(_) => return Err(PayloadDefect::MissingSegments),
        };

        let aggregates = fields
            .iter()
            .filter(|(name, _)| ![START, END, SEGMENTS].contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self { start, end, segments, aggregates })
    }

    pub fn midpoint(&self) -> DateTime<Utc> {
        bucket_midpoint(self.start, self.end)
    }
}

fn bucket_bound(fields: &Map<String, Value>, bound: &'static str) -> Result<DateTime<Utc>, PayloadDefect> {
    let rep = fields
        .get(bound)
        .and_then(Value::as_str)
        .ok_or(PayloadDefect::MissingBucketBound(bound))?;

    rep.parse().map_err(|_| PayloadDefect::InvalidBucketBound { bound, value: rep.to_string() })
}

pub(crate) fn aggregate_value(fields: &Map<String, Value>, metric_field: &str) -> Result<f64, PayloadDefect> {
    let aggregation = Aggregation::Avg.to_string();
    fields
        .get(metric_field)
        .ok_or_else(|| PayloadDefect::MissingAggregate(metric_field.to_string()))?
        .get(aggregation.as_str())
        .and_then(Value::as_f64)
        .ok_or_else(|| PayloadDefect::MissingAggregateValue {
            field: metric_field.to_string(),
            aggregation,
        })
}

pub(crate) fn device_ordinal(segment: &Segment, dimension: &str) -> Result<String, PayloadDefect> {
    match segment.get(dimension) {
        None | Some(Value::Null) => Err(PayloadDefect::MissingDeviceDimension(dimension.to_string())),
        Some(Value::String(ordinal)) => Ok(ordinal.clone()),
        Some(Value::Number(ordinal)) => Ok(ordinal.to_string()),
        Some(_) => Err(PayloadDefect::InvalidDeviceDimension(dimension.to_string())),
    }
}

pub(crate) fn nested_segments(segment: &Segment) -> Result<Vec<&Segment>, PayloadDefect> {
    segment
        .get(SEGMENTS)
        .and_then(Value::as_array)
        .ok_or(PayloadDefect::MissingSegments)?
        .iter()
        .map(|s| s.as_object().ok_or(PayloadDefect::MissingSegments))
        .collect()
}
