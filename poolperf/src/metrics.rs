use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramTimer, HistogramVec, IntCounterVec, Opts, Registry};

use crate::error::PerformanceError;

pub static POOLPERF_BUILD_TIME: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "poolperf_build_time",
            "Time spent building performance query batches in seconds",
        )
        .buckets(vec![0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05]),
        &["scope"],
    )
    .expect("failed creating poolperf_build_time metric")
});

#[inline]
pub(crate) fn start_build_timer(scope: &str) -> HistogramTimer {
    POOLPERF_BUILD_TIME.with_label_values(&[scope]).start_timer()
}

pub static POOLPERF_RESHAPE_TIME: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "poolperf_reshape_time",
            "Time spent reshaping raw performance telemetry in seconds",
        )
        .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5]),
        &["scope"],
    )
    .expect("failed creating poolperf_reshape_time metric")
});

#[inline]
pub(crate) fn start_reshape_timer(scope: &str) -> HistogramTimer {
    POOLPERF_RESHAPE_TIME.with_label_values(&[scope]).start_timer()
}

pub static POOLPERF_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("poolperf_errors", "Number of errors building or reshaping performance telemetry"),
        &["action", "error_type"],
    )
    .expect("failed creating poolperf_errors metric")
});

#[inline]
pub(crate) fn track_errors<T>(action: &str, result: Result<T, PerformanceError>) -> Result<T, PerformanceError> {
    if let Err(ref error) = result {
        tracing::error!(?error, %action, "performance telemetry failure");
        POOLPERF_ERRORS.with_label_values(&[action, error.label()]).inc();
    }

    result
}

#[tracing::instrument(level = "trace")]
pub fn register_metrics(registry: &Registry) -> anyhow::Result<()> {
    registry.register(Box::new(POOLPERF_BUILD_TIME.clone()))?;
    registry.register(Box::new(POOLPERF_RESHAPE_TIME.clone()))?;
    registry.register(Box::new(POOLPERF_ERRORS.clone()))?;
    Ok(())
}
