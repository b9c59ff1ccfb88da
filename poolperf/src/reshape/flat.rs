use serde_json::Value;

use super::api_model::{self, MetricBucket, Segment};
use super::model::{PerformanceSeries, Sample};
use crate::catalog::MetricDefinition;
use crate::error::{PayloadDefect, PerformanceError};

/// Pulls one averaged value per bucket out of a metric's segmentation.
///
/// A bucket may already carry the metric's aggregate, in which case it is used as-is. Otherwise
/// the leaf aggregates found through the definition's segmentation depth are averaged; for a
/// host-and-disk segmentation that merges each host's disk dimension, singleton or not.
#[derive(Debug, Clone, Copy)]
pub struct FlatExtractor<'d> {
    definition: &'d MetricDefinition,
}

impl<'d> FlatExtractor<'d> {
    pub const fn for_definition(definition: &'d MetricDefinition) -> Self {
        Self { definition }
    }

    #[tracing::instrument(level = "trace", skip(self, buckets), fields(metric=%self.definition.key))]
    pub fn series(&self, buckets: &[Value]) -> Result<PerformanceSeries, PerformanceError> {
        buckets
            .iter()
            .enumerate()
            .map(|(index, bucket)| {
                MetricBucket::from_value(bucket)
                    .and_then(|bucket| self.extract(&bucket))
                    .map_err(|reason| PerformanceError::malformed(self.definition.key, index, reason))
            })
            .collect()
    }

    pub fn extract(&self, bucket: &MetricBucket) -> Result<Sample, PayloadDefect> {
        let field = self.definition.upstream_metric_id.as_str();
        let time = bucket.midpoint();

        if bucket.aggregates.contains_key(field) {
            let value = api_model::aggregate_value(&bucket.aggregates, field)?;
            return Ok(Sample::new(time, value));
        }

        let segments: Vec<&Segment> = bucket
            .segments
            .as_ref()
            .ok_or_else(|| PayloadDefect::MissingAggregate(field.to_string()))?
            .iter()
            .collect();

        let mut leaves = Vec::with_capacity(segments.len());
        collect_leaf_values(&segments, field, self.definition.segmentation.depth(), &mut leaves)?;
        if leaves.is_empty() {
            return Err(PayloadDefect::MissingAggregate(field.to_string()));
        }

        let value = leaves.iter().sum::<f64>() / leaves.len() as f64;
        Ok(Sample::new(time, value))
    }
}

fn collect_leaf_values(
    segments: &[&Segment], field: &str, depth: usize, leaves: &mut Vec<f64>,
) -> Result<(), PayloadDefect> {
    for segment in segments {
        if depth <= 1 || segment.contains_key(field) {
            leaves.push(api_model::aggregate_value(segment, field)?);
        } else {
            let nested = api_model::nested_segments(segment)?;
            collect_leaf_values(&nested, field, depth - 1, leaves)?;
        }
    }

    Ok(())
}
