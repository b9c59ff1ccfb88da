use claims::*;
use poolperf::catalog::MetricKey;
use poolperf::reshape::{MetricSeries, RawMetricResults, Sample};
use poolperf::{reshape, PayloadDefect, PerformanceError};
use pretty_assertions::assert_eq;
use serde_json::json;

use super::fixtures::*;

#[test]
fn test_flat_series_uses_bucket_midpoints() {
    once_cell::sync::Lazy::force(&poolperf::logging::TEST_TRACING);
    let main_span = tracing::info_span!("test_flat_series_uses_bucket_midpoints");
    let _ = main_span.enter();

    let raw = assert_ok!(RawMetricResults::from_json(json!({
        "cpuUsage": metric_result(vec![
            flat_bucket(0, 60, CPU_USAGE, 5.0),
            flat_bucket(60, 120, CPU_USAGE, 7.0),
        ]),
    })));

    let report = assert_ok!(reshape(raw));
    assert_eq!(report.len(), 1);
    let series = assert_some!(assert_some!(report.get(MetricKey::CpuUsage)).as_flat());
    assert_eq!(series, &vec![Sample::new(at(30), 5.0), Sample::new(at(90), 7.0)]);
}

#[test]
fn test_individual_device_fan_out() {
    once_cell::sync::Lazy::force(&poolperf::logging::TEST_TRACING);

    let raw = assert_ok!(RawMetricResults::from_json(json!({
        "individualCpuUsage": metric_result(vec![
            device_bucket(0, 60, CPU_DEVICE, CPU_USAGE, &[("0", 10.0), ("1", 20.0)]),
        ]),
    })));

    let report = assert_ok!(reshape(raw));
    let devices = assert_some!(assert_some!(report.get(MetricKey::IndividualCpuUsage)).as_per_device());
    let ordinals: Vec<&str> = devices.keys().map(String::as_str).collect();
    assert_eq!(ordinals, vec!["0", "1"]);
    assert_eq!(assert_some!(devices.get("0")), &vec![Sample::new(at(30), 10.0)]);
    assert_eq!(assert_some!(devices.get("1")), &vec![Sample::new(at(30), 20.0)]);
}

#[test]
fn test_absent_device_is_sparse() {
    let raw = assert_ok!(RawMetricResults::from_json(json!({
        "individualGpuUsage": metric_result(vec![
            device_bucket(0, 60, GPU_DEVICE, GPU_USAGE, &[("0", 80.0), ("1", 40.0)]),
            device_bucket(60, 120, GPU_DEVICE, GPU_USAGE, &[("0", 90.0)]),
        ]),
    })));

    let report = assert_ok!(reshape(raw));
    let devices = assert_some!(assert_some!(report.get(MetricKey::IndividualGpuUsage)).as_per_device());
    assert_eq!(assert_some!(devices.get("0")).len(), 2);
    assert_eq!(assert_some!(devices.get("1")), &vec![Sample::new(at(30), 40.0)]);
}

#[test]
fn test_mixed_batch_response() {
    let response = batch_response(vec![
        (
            "memoryUsed",
            metric_result(vec![
                flat_bucket(0, 10, MEMORY_USED, 1024.0),
                flat_bucket(10, 20, MEMORY_USED, 2048.0),
            ]),
        ),
        (
            "individualGpuUsage",
            metric_result(vec![device_bucket(0, 10, GPU_DEVICE, GPU_USAGE, &[("0", 12.5)])]),
        ),
        ("gpuUsage", metric_result(vec![flat_bucket(0, 10, GPU_USAGE, 12.5)])),
    ]);

    let raw = assert_ok!(RawMetricResults::from_batch_response(response));
    let report = assert_ok!(reshape(raw));

    let keys: Vec<MetricKey> = report.keys().collect();
    assert_eq!(keys, vec![MetricKey::MemoryUsed, MetricKey::GpuUsage, MetricKey::IndividualGpuUsage]);
    assert_matches!(report.get(MetricKey::MemoryUsed), Some(MetricSeries::Flat(s)) if s.len() == 2);
    assert_matches!(report.get(MetricKey::GpuUsage), Some(MetricSeries::Flat(s)) if s[0].time == at(5));
    assert_matches!(report.get(MetricKey::IndividualGpuUsage), Some(MetricSeries::PerDevice(d)) if d.len() == 1);
}

#[test]
fn test_malformed_bucket_surfaces_metric_and_index() {
    let raw = assert_ok!(RawMetricResults::from_json(json!({
        "memoryUsed": metric_result(vec![
            flat_bucket(0, 60, MEMORY_USED, 5.0),
            flat_bucket(60, 120, MEMORY_USED, 6.0),
            flat_bucket(120, 180, CPU_USAGE, 7.0),
        ]),
    })));

    let actual = assert_err!(reshape(raw));
    assert_matches!(
        actual,
        PerformanceError::MalformedPayload {
            metric: MetricKey::MemoryUsed,
            bucket: 2,
            reason: PayloadDefect::MissingAggregate(_),
        }
    );
}

#[test]
fn test_device_bucket_missing_dimension_is_malformed() {
    let raw = assert_ok!(RawMetricResults::from_json(json!({
        "individualCpuUsage": metric_result(vec![
            json!({
                "start": at(0).to_rfc3339(),
                "end": at(60).to_rfc3339(),
                "segments": [ { CPU_USAGE: { "avg": 10.0 } } ],
            }),
        ]),
    })));

    let actual = assert_err!(reshape(raw));
    assert_matches!(
        actual,
        PerformanceError::MalformedPayload {
            metric: MetricKey::IndividualCpuUsage,
            bucket: 0,
            reason: PayloadDefect::MissingDeviceDimension(_),
        }
    );
}

#[test]
fn test_bucket_missing_bound_surfaces_metric_and_index() {
    let raw = assert_ok!(RawMetricResults::from_json(json!({
        "cpuUsage": metric_result(vec![
            flat_bucket(0, 60, CPU_USAGE, 1.0),
            json!({ "end": at(120).to_rfc3339(), CPU_USAGE: { "avg": 2.0 } }),
        ]),
    })));

    let actual = assert_err!(reshape(raw));
    assert_matches!(
        actual,
        PerformanceError::MalformedPayload {
            metric: MetricKey::CpuUsage,
            bucket: 1,
            reason: PayloadDefect::MissingBucketBound("start"),
        }
    );
}

#[test]
fn test_non_object_device_segment_surfaces_metric_and_index() {
    let raw = assert_ok!(RawMetricResults::from_json(json!({
        "individualGpuUsage": metric_result(vec![
            device_bucket(0, 60, GPU_DEVICE, GPU_USAGE, &[("0", 80.0)]),
            json!({ "start": at(60).to_rfc3339(), "end": at(120).to_rfc3339(), "segments": [ null ] }),
        ]),
    })));

    let actual = assert_err!(reshape(raw));
    assert_matches!(
        actual,
        PerformanceError::MalformedPayload {
            metric: MetricKey::IndividualGpuUsage,
            bucket: 1,
            reason: PayloadDefect::InvalidSegment(0),
        }
    );
}

#[test]
fn test_result_without_bucket_array_is_malformed() {
    let raw = assert_ok!(RawMetricResults::from_json(json!({ "memoryUsed": { "interval": "PT10S" } })));
    let actual = assert_err!(reshape(raw));
    assert_matches!(
        actual,
        PerformanceError::MalformedPayload {
            metric: MetricKey::MemoryUsed,
            bucket: 0,
            reason: PayloadDefect::MissingBuckets,
        }
    );
}
