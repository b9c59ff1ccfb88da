#![forbid(unsafe_code)]
#![warn(
    clippy::cargo,
    clippy::suspicious,
    // missing_docs,
    clippy::nursery,
    rust_2018_idioms
)]

pub mod catalog;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod query;
pub mod reshape;
pub mod service;
pub mod settings;

pub use catalog::{MetricCatalog, MetricDefinition, MetricKey};
pub use error::{PayloadDefect, PerformanceError};
pub use query::{build_node_query, build_pool_query, QueryDescriptor};
pub use reshape::{reshape, PerformanceReport};
pub use service::{AppId, PerformanceService, QueryExecutor};

pub type Result<T> = anyhow::Result<T>;
