use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PerformanceError;

/// Maximum number of time buckets requested for a single metric.
pub const POINT_BUDGET: u32 = 1000;

const INTERVAL_GRANULARITY_SECS: u64 = 10;

/// Requested window of telemetry, in whole minutes. Always positive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeWindow(u64);

impl TimeWindow {
    pub fn minutes(minutes: i64) -> Result<Self, PerformanceError> {
        if minutes <= 0 {
            return Err(PerformanceError::InvalidWindow(minutes));
        }

        Ok(Self(minutes as u64))
    }

    pub const fn as_minutes(&self) -> u64 {
        self.0
    }

    /// Sampling interval keeping the number of buckets within [`POINT_BUDGET`], rounded up to
    /// the next multiple of ten seconds.
    ///
    /// Computed in `u128` so any positive `i64` window is accepted; the result never exceeds
    /// `i64::MAX * 60 / 1000` rounded up, which fits in `u64`.
    pub const fn interval_seconds(&self) -> u64 {
        let budget = POINT_BUDGET as u128;
        let granularity = INTERVAL_GRANULARITY_SECS as u128;
        let raw_secs = (self.0 as u128 * 60 + budget - 1) / budget;
        let steps = (raw_secs + granularity - 1) / granularity;
        (steps * granularity) as u64
    }

    /// Window as the upstream timespan duration, e.g. `PT100M`.
    pub fn timespan(&self) -> String {
        format!("PT{}M", self.0)
    }

    /// Sampling interval as the upstream interval duration, e.g. `PT10S`.
    pub fn interval(&self) -> String {
        format!("PT{}S", self.interval_seconds())
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}
