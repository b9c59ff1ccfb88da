use thiserror::Error;

use crate::catalog::MetricKey;

#[derive(Debug, Error)]
pub enum PerformanceError {
    /// The catalog and the reshaper dispatch have drifted apart, e.g. a response carries a key
    /// the catalog does not know. Not recoverable at run time.
    #[error("metric catalog configuration error: {0}")]
    Configuration(String),

    #[error("malformed payload for metric {metric} at bucket {bucket}: {reason}")]
    MalformedPayload {
        metric: MetricKey,
        bucket: usize,
        reason: PayloadDefect,
    },

    #[error("window length must be greater than zero minutes but was {0}")]
    InvalidWindow(i64),

    #[error("query executor failed: {0}")]
    Executor(#[source] anyhow::Error),

    #[error("failed processing JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl PerformanceError {
    pub fn malformed(metric: MetricKey, bucket: usize, reason: PayloadDefect) -> Self {
        Self::MalformedPayload { metric, bucket, reason }
    }

    /// Slug identifying the kind of error, used to label error counts.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::MalformedPayload { .. } => "payload::malformed",
            Self::InvalidWindow(_) => "window::invalid",
            Self::Executor(_) => "executor",
            Self::Json(_) => "payload::json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadDefect {
    #[error("missing aggregate field `{0}`")]
    MissingAggregate(String),

    #[error("aggregate field `{field}` lacks a numeric `{aggregation}` value")]
    MissingAggregateValue { field: String, aggregation: String },

    #[error("missing device dimension `{0}`")]
    MissingDeviceDimension(String),

    #[error("device dimension `{0}` is neither a string nor a number")]
    InvalidDeviceDimension(String),

    #[error("missing or non-array nested `segments`")]
    MissingSegments,

    #[error("result carries no `segments` array of time buckets")]
    MissingBuckets,

    #[error("time bucket is not a JSON object")]
    InvalidBucket,

    #[error("time bucket lacks its `{0}` bound")]
    MissingBucketBound(&'static str),

    #[error("time bucket `{bound}` bound is not a timestamp: {value}")]
    InvalidBucketBound { bound: &'static str, value: String },

    #[error("nested segment {0} is not a JSON object")]
    InvalidSegment(usize),
}
