use std::str::FromStr;

use serde_json::Value;

use crate::catalog::{MetricCatalog, MetricDefinition, MetricKey, ReshapeStrategy};
use crate::error::{PayloadDefect, PerformanceError};

mod api_model;
mod flat;
mod model;
mod per_device;

pub use api_model::{MetricBucket, RawMetricResult, RawMetricResults, Segment};
pub use flat::FlatExtractor;
pub use model::{bucket_midpoint, MetricSeries, PerDeviceSeries, PerformanceReport, PerformanceSeries, Sample};
pub use per_device::fan_out;

/// Reshapes raw query batch results into a [`PerformanceReport`], dispatching each metric by
/// its catalog key.
#[derive(Debug, Clone, Copy)]
pub struct Reshaper<'c> {
    catalog: &'c MetricCatalog,
}

impl Default for Reshaper<'static> {
    fn default() -> Self {
        Self::new(MetricCatalog::standard())
    }
}

impl<'c> Reshaper<'c> {
    pub const fn new(catalog: &'c MetricCatalog) -> Self {
        Self { catalog }
    }

    #[tracing::instrument(level = "debug", skip(self, raw), fields(nr_metrics=%raw.len()))]
    pub fn reshape(&self, raw: RawMetricResults) -> Result<PerformanceReport, PerformanceError> {
        let _timer = crate::metrics::start_reshape_timer("report");
        crate::metrics::track_errors("reshape", self.do_reshape(raw))
    }

    fn do_reshape(&self, raw: RawMetricResults) -> Result<PerformanceReport, PerformanceError> {
        let mut report = PerformanceReport::default();

        for (key_rep, result) in raw {
            let key = MetricKey::from_str(key_rep.as_str()).map_err(|_| {
                PerformanceError::Configuration(format!("unknown metric key in query results: {key_rep}"))
            })?;
            let definition = self.catalog.definition(key)?;
            let buckets = result
                .segments
                .as_deref()
                .ok_or_else(|| PerformanceError::malformed(key, 0, PayloadDefect::MissingBuckets))?;
            let series = reshape_metric(definition, buckets)?;
            tracing::debug!(metric=%key, nr_buckets=%buckets.len(), nr_samples=%series.nr_samples(), "reshaped metric");
            report.insert(key, series);
        }

        Ok(report)
    }
}

fn reshape_metric(definition: &MetricDefinition, buckets: &[Value]) -> Result<MetricSeries, PerformanceError> {
    match definition.key.strategy() {
        ReshapeStrategy::Flat => FlatExtractor::for_definition(definition)
            .series(buckets)
            .map(MetricSeries::Flat),
        ReshapeStrategy::PerDevice(device) => fan_out(definition, device, buckets).map(MetricSeries::PerDevice),
    }
}

/// Reshapes raw results against the standard metric catalog.
pub fn reshape(raw: RawMetricResults) -> Result<PerformanceReport, PerformanceError> {
    Reshaper::default().reshape(raw)
}
