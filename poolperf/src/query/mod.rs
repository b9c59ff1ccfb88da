use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::catalog::{MetricCatalog, MetricDefinition, MetricKey};
use crate::error::PerformanceError;

mod filter;
mod interval;

pub use filter::{compose_identity_filter, FilterEncoder, FilterExpr};
pub use interval::{TimeWindow, POINT_BUDGET};

/// Cap on buckets returned per metric, matching the point budget.
pub const TOP: u32 = POINT_BUDGET;

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Avg,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    #[serde(rename = "id")]
    pub key: MetricKey,
    pub parameters: QueryParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameters {
    #[serde(rename = "metricId")]
    pub upstream_metric_id: String,
    pub aggregation: Aggregation,
    pub filter: FilterExpr,
    pub interval: String,
    pub timespan: String,
    pub segment: String,
    pub top: u32,
}

/// Builds one query descriptor per catalog entry, in catalog order.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'c> {
    catalog: &'c MetricCatalog,
}

impl Default for QueryBuilder<'static> {
    fn default() -> Self {
        Self::new(MetricCatalog::standard())
    }
}

impl<'c> QueryBuilder<'c> {
    pub const fn new(catalog: &'c MetricCatalog) -> Self {
        Self { catalog }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn pool_query(&self, pool_id: &str, window_minutes: i64) -> Result<Vec<QueryDescriptor>, PerformanceError> {
        self.build(pool_id, None, window_minutes)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn node_query(
        &self, pool_id: &str, node_id: &str, window_minutes: i64,
    ) -> Result<Vec<QueryDescriptor>, PerformanceError> {
        self.build(pool_id, Some(node_id), window_minutes)
    }

    fn build(
        &self, pool_id: &str, node_id: Option<&str>, window_minutes: i64,
    ) -> Result<Vec<QueryDescriptor>, PerformanceError> {
        let _timer = crate::metrics::start_build_timer(if node_id.is_some() { "node" } else { "pool" });

        let window = crate::metrics::track_errors("build_query", TimeWindow::minutes(window_minutes))?;
        let filter = compose_identity_filter(pool_id, node_id);
        let interval = window.interval();
        let timespan = window.timespan();

        let descriptors: Vec<QueryDescriptor> = self
            .catalog
            .iter()
            .map(|definition| descriptor_for(definition, &filter, &interval, &timespan))
            .collect();

        tracing::debug!(
            %window, %interval, nr_descriptors=%descriptors.len(), catalog=%self.catalog,
            "built performance query batch"
        );
        Ok(descriptors)
    }
}

fn descriptor_for(definition: &MetricDefinition, filter: &FilterExpr, interval: &str, timespan: &str) -> QueryDescriptor {
    QueryDescriptor {
        key: definition.key,
        parameters: QueryParameters {
            upstream_metric_id: definition.upstream_metric_id.clone(),
            aggregation: Aggregation::Avg,
            filter: filter.clone(),
            interval: interval.to_string(),
            timespan: timespan.to_string(),
            segment: definition.segment_path(),
            top: TOP,
        },
    }
}

/// Query batch covering the whole pool against the standard metric catalog.
pub fn build_pool_query(pool_id: &str, window_minutes: i64) -> Result<Vec<QueryDescriptor>, PerformanceError> {
    QueryBuilder::default().pool_query(pool_id, window_minutes)
}

/// Query batch narrowed to one node of the pool against the standard metric catalog.
pub fn build_node_query(
    pool_id: &str, node_id: &str, window_minutes: i64,
) -> Result<Vec<QueryDescriptor>, PerformanceError> {
    QueryBuilder::default().node_query(pool_id, node_id, window_minutes)
}
