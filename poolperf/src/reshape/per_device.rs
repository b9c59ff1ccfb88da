use serde_json::Value;

use super::api_model::{self, MetricBucket};
use super::model::{PerDeviceSeries, Sample};
use crate::catalog::{DeviceClass, MetricDefinition};
use crate::error::{PayloadDefect, PerformanceError};

/// Fans each bucket out into one series per device ordinal. Devices absent from a bucket
/// contribute no sample for it.
#[tracing::instrument(level = "trace", skip(definition, buckets), fields(metric=%definition.key))]
pub fn fan_out(
    definition: &MetricDefinition, device: DeviceClass, buckets: &[Value],
) -> Result<PerDeviceSeries, PerformanceError> {
    let field = definition.upstream_metric_id.as_str();
    let dimension = device.dimension();
    let mut result = PerDeviceSeries::new();

    for (index, bucket) in buckets.iter().enumerate() {
        let malformed = |reason: PayloadDefect| PerformanceError::malformed(definition.key, index, reason);

        let bucket = MetricBucket::from_value(bucket).map_err(malformed)?;
        let time = bucket.midpoint();
        let segments = bucket.segments.as_ref().ok_or_else(|| malformed(PayloadDefect::MissingSegments))?;
        for segment in segments {
            let ordinal = api_model::device_ordinal(segment, dimension).map_err(malformed)?;
            let value = api_model::aggregate_value(segment, field).map_err(malformed)?;
            result.entry(ordinal).or_insert_with(Vec::new).push(Sample::new(time, value));
        }
    }

    tracing::trace!(nr_devices=%result.len(), %device, "fanned out device telemetry");
    Ok(result)
}
