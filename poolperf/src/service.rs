use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::catalog::MetricCatalog;
use crate::error::PerformanceError;
use crate::query::{QueryBuilder, QueryDescriptor};
use crate::reshape::{PerformanceReport, RawMetricResults, Reshaper};

/// Identifier of the telemetry application the pool reports into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Transport executing a query batch against the telemetry service. Network, authentication and
/// throttling failures are its concern.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute_batch(&self, app_id: &AppId, queries: &[QueryDescriptor]) -> anyhow::Result<RawMetricResults>;
}

/// Builds the query batch for a pool or node, runs it through the executor and reshapes the
/// results.
pub struct PerformanceService<E> {
    executor: E,
    catalog: MetricCatalog,
}

impl<E> fmt::Debug for PerformanceService<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformanceService")
            .field("catalog", &self.catalog.to_string())
            .finish()
    }
}

impl<E: QueryExecutor> PerformanceService<E> {
    pub fn new(executor: E) -> Self {
        Self::with_catalog(executor, MetricCatalog::standard().clone())
    }

    pub fn with_catalog(executor: E, catalog: MetricCatalog) -> Self {
        Self { executor, catalog }
    }

    pub const fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    #[tracing::instrument(level = "info", skip(self))]
    pub async fn pool_performance(
        &self, app_id: &AppId, pool_id: &str, window_minutes: i64,
    ) -> Result<PerformanceReport, PerformanceError> {
        let queries = QueryBuilder::new(&self.catalog).pool_query(pool_id, window_minutes)?;
        self.execute_and_reshape(app_id, queries).await
    }

    #[tracing::instrument(level = "info", skip(self))]
    pub async fn node_performance(
        &self, app_id: &AppId, pool_id: &str, node_id: &str, window_minutes: i64,
    ) -> Result<PerformanceReport, PerformanceError> {
        let queries = QueryBuilder::new(&self.catalog).node_query(pool_id, node_id, window_minutes)?;
        self.execute_and_reshape(app_id, queries).await
    }

    async fn execute_and_reshape(
        &self, app_id: &AppId, queries: Vec<QueryDescriptor>,
    ) -> Result<PerformanceReport, PerformanceError> {
        let raw = self
            .executor
            .execute_batch(app_id, &queries)
            .instrument(tracing::info_span!("execute performance query batch", %app_id, nr_queries=%queries.len()))
            .await
            .map_err(PerformanceError::Executor);
        let raw = crate::metrics::track_errors("execute_batch", raw)?;

        Reshaper::new(&self.catalog).reshape(raw)
    }
}
