use std::collections::HashSet;
use std::fmt;

use itertools::Itertools;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::PerformanceError;

pub const ROLE_NAME_DIMENSION: &str = "cloud/roleName";
pub const ROLE_INSTANCE_DIMENSION: &str = "cloud/roleInstance";
pub const DISK_NAME_DIMENSION: &str = "customDimensions/[Disk name]";
pub const CPU_DEVICE_DIMENSION: &str = "customDimensions/[CPU #]";
pub const GPU_DEVICE_DIMENSION: &str = "customDimensions/[GPU #]";

/// Catalog identifier of a performance metric. Distinct from the upstream telemetry service's
/// own metric identifier, which lives in the corresponding [`MetricDefinition`].
#[derive(
    Debug, Display, EnumString, EnumIter, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    CpuUsage,
    IndividualCpuUsage,
    MemoryAvailable,
    MemoryUsed,
    DiskRead,
    DiskWrite,
    DiskUsed,
    DiskFree,
    NetworkRead,
    NetworkWrite,
    GpuUsage,
    IndividualGpuUsage,
    GpuMemory,
    IndividualGpuMemory,
}

impl MetricKey {
    /// How the raw response for this metric is reshaped. Adding a key requires deciding here.
    pub const fn strategy(&self) -> ReshapeStrategy {
        match self {
            Self::IndividualCpuUsage => ReshapeStrategy::PerDevice(DeviceClass::Cpu),
            Self::IndividualGpuUsage | Self::IndividualGpuMemory => ReshapeStrategy::PerDevice(DeviceClass::Gpu),
            Self::CpuUsage
            | Self::MemoryAvailable
            | Self::MemoryUsed
            | Self::DiskRead
            | Self::DiskWrite
            | Self::DiskUsed
            | Self::DiskFree
            | Self::NetworkRead
            | Self::NetworkWrite
            | Self::GpuUsage
            | Self::GpuMemory => ReshapeStrategy::Flat,
        }
    }

    pub const fn is_individual_device(&self) -> bool {
        matches!(self.strategy(), ReshapeStrategy::PerDevice(_))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReshapeStrategy {
    Flat,
    PerDevice(DeviceClass),
}

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    Cpu,
    Gpu,
}

impl DeviceClass {
    pub const fn dimension(&self) -> &'static str {
        match self {
            Self::Cpu => CPU_DEVICE_DIMENSION,
            Self::Gpu => GPU_DEVICE_DIMENSION,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segmentation {
    Host,
    HostAndDisk,
    Device(DeviceClass),
}

impl Segmentation {
    pub fn path(&self) -> String {
        match self {
            Self::Host => ROLE_INSTANCE_DIMENSION.to_string(),
            Self::HostAndDisk => format!("{ROLE_INSTANCE_DIMENSION},{DISK_NAME_DIMENSION}"),
            Self::Device(device) => device.dimension().to_string(),
        }
    }

    /// Number of nested segment levels below each time bucket.
    pub const fn depth(&self) -> usize {
        match self {
            Self::Host | Self::Device(_) => 1,
            Self::HostAndDisk => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub key: MetricKey,
    pub upstream_metric_id: String,
    pub segmentation: Segmentation,
}

impl MetricDefinition {
    pub fn new(key: MetricKey, upstream_metric_id: impl Into<String>, segmentation: Segmentation) -> Self {
        Self {
            key,
            upstream_metric_id: upstream_metric_id.into(),
            segmentation,
        }
    }

    pub fn segment_path(&self) -> String {
        self.segmentation.path()
    }
}

pub static STD_METRIC_CATALOG: Lazy<MetricCatalog> = Lazy::new(|| {
    use self::DeviceClass::*;
    use self::MetricKey::*;
    use self::Segmentation::*;

    let definitions = [
        (CpuUsage, "customMetrics/Cpu usage", Host),
        (IndividualCpuUsage, "customMetrics/Cpu usage", Device(Cpu)),
        (MemoryAvailable, "customMetrics/Memory available", Host),
        (MemoryUsed, "customMetrics/Memory used", Host),
        (DiskRead, "customMetrics/Disk read", Host),
        (DiskWrite, "customMetrics/Disk write", Host),
        (DiskUsed, "customMetrics/Disk usage", HostAndDisk),
        (DiskFree, "customMetrics/Disk free", HostAndDisk),
        (NetworkRead, "customMetrics/Network read", Host),
        (NetworkWrite, "customMetrics/Network write", Host),
        (GpuUsage, "customMetrics/Gpu usage", Host),
        (IndividualGpuUsage, "customMetrics/Gpu usage", Device(Gpu)),
        (GpuMemory, "customMetrics/Gpu memory used", Host),
        (IndividualGpuMemory, "customMetrics/Gpu memory used", Device(Gpu)),
    ]
    .into_iter()
    .map(|(key, upstream, segmentation)| MetricDefinition::new(key, upstream, segmentation))
    .collect();

    MetricCatalog { definitions }
});

/// Read-only, key-unique table of metric definitions, iterated in definition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricCatalog {
    definitions: Vec<MetricDefinition>,
}

impl MetricCatalog {
    pub fn new(definitions: Vec<MetricDefinition>) -> Result<Self, PerformanceError> {
        let mut seen = HashSet::with_capacity(definitions.len());
        for d in &definitions {
            if !seen.insert(d.key) {
                return Err(PerformanceError::Configuration(format!(
                    "duplicate metric catalog key: {}",
                    d.key
                )));
            }
        }

        Ok(Self { definitions })
    }

    pub fn standard() -> &'static Self {
        &STD_METRIC_CATALOG
    }

    /// Derives a catalog holding only the selected keys, in this catalog's order.
    pub fn restricted_to(&self, keys: &[MetricKey]) -> Self {
        let definitions = self.definitions.iter().filter(|d| keys.contains(&d.key)).cloned().collect();
        Self { definitions }
    }

    pub fn definition(&self, key: MetricKey) -> Result<&MetricDefinition, PerformanceError> {
        self.definitions.iter().find(|d| d.key == key).ok_or_else(|| {
            PerformanceError::Configuration(format!("metric key {key} is not in the metric catalog"))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl fmt::Display for MetricCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.definitions.iter().map(|d| d.key).join(", "))
    }
}
