use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use claims::*;
use poolperf::catalog::MetricKey;
use poolperf::query::{FilterExpr, QueryDescriptor};
use poolperf::reshape::RawMetricResults;
use poolperf::{AppId, PerformanceError, PerformanceService, QueryExecutor};
use pretty_assertions::assert_eq;
use serde_json::Value;

use super::fixtures::*;

/// Answers every batch with the same canned response and records what was asked.
#[derive(Debug, Clone)]
struct CannedExecutor {
    response: Value,
    requests: Arc<Mutex<Vec<(AppId, Vec<QueryDescriptor>)>>>,
}

impl CannedExecutor {
    fn new(response: Value) -> Self {
        Self { response, requests: Arc::new(Mutex::new(Vec::new())) }
    }

    fn requests(&self) -> Vec<(AppId, Vec<QueryDescriptor>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for CannedExecutor {
    async fn execute_batch(&self, app_id: &AppId, queries: &[QueryDescriptor]) -> anyhow::Result<RawMetricResults> {
        self.requests.lock().unwrap().push((app_id.clone(), queries.to_vec()));
        Ok(RawMetricResults::from_batch_response(self.response.clone())?)
    }
}

fn canned_response() -> Value {
    batch_response(vec![
        ("cpuUsage", metric_result(vec![flat_bucket(0, 60, CPU_USAGE, 25.0)])),
        (
            "individualCpuUsage",
            metric_result(vec![device_bucket(0, 60, CPU_DEVICE, CPU_USAGE, &[("0", 20.0), ("1", 30.0)])]),
        ),
    ])
}

#[tokio::test]
async fn test_pool_performance() {
    once_cell::sync::Lazy::force(&poolperf::logging::TEST_TRACING);
    let main_span = tracing::info_span!("test_pool_performance");
    let _ = main_span.enter();

    let executor = CannedExecutor::new(canned_response());
    let service = PerformanceService::new(executor.clone());
    let app_id = AppId::new("insights-app");

    let report = assert_ok!(service.pool_performance(&app_id, "pool1", 60).await);
    assert_eq!(report.keys().collect::<Vec<_>>(), vec![MetricKey::CpuUsage, MetricKey::IndividualCpuUsage]);

    let requests = executor.requests();
    assert_eq!(requests.len(), 1);
    let (requested_app, queries) = &requests[0];
    assert_eq!(requested_app, &app_id);
    assert_eq!(queries.len(), service.catalog().len());
    assert!(queries
        .iter()
        .all(|q| q.parameters.filter == FilterExpr::equals("cloud/roleName", "pool1")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_pool_and_node_performance() {
    once_cell::sync::Lazy::force(&poolperf::logging::TEST_TRACING);

    let executor = CannedExecutor::new(canned_response());
    let service = Arc::new(PerformanceService::new(executor.clone()));
    let app_id = AppId::new("insights-app");

    let pool_service = service.clone();
    let pool_app = app_id.clone();
    let pool = tokio::spawn(async move { pool_service.pool_performance(&pool_app, "pool1", 60).await });

    let node_service = service.clone();
    let node_app = app_id.clone();
    let node = tokio::spawn(async move { node_service.node_performance(&node_app, "pool1", "tvm-3", 60).await });

    let pool_report = assert_ok!(assert_ok!(pool.await));
    let node_report = assert_ok!(assert_ok!(node.await));
    assert_eq!(pool_report, node_report);

    let requests = executor.requests();
    assert_eq!(requests.len(), 2);
    let narrowed = requests
        .iter()
        .filter(|(_, queries)| matches!(queries[0].parameters.filter, FilterExpr::And(_, _)))
        .count();
    assert_eq!(narrowed, 1);
}

#[tokio::test]
async fn test_invalid_window_before_execution() {
    let executor = CannedExecutor::new(canned_response());
    let service = PerformanceService::new(executor.clone());

    let actual = service.node_performance(&AppId::new("insights-app"), "pool1", "tvm-1", 0).await;
    assert_matches!(actual, Err(PerformanceError::InvalidWindow(0)));
    assert!(executor.requests().is_empty());
}
