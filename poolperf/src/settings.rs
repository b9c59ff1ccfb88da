use std::path::PathBuf;

use clap::{Parser, Subcommand};
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::catalog::{MetricCatalog, MetricKey};

const APP_ENV_PREFIX: &str = "POOLPERF";
const DEFAULT_RESOURCES_DIR: &str = "resources";
const APPLICATION_CONFIG: &str = "application";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_directives: String,
    pub output: OutputSettings,
    pub catalog: CatalogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_directives: Self::DEFAULT_LOG_DIRECTIVES.to_string(),
            output: OutputSettings::default(),
            catalog: CatalogSettings::default(),
        }
    }
}

impl Settings {
    const DEFAULT_LOG_DIRECTIVES: &'static str = "warn";

    /// Loads the configuration file named by the options, or `application.*` from the resources
    /// directory when present, overlaid with `POOLPERF__*` environment variables.
    #[tracing::instrument(level = "debug")]
    pub fn load(options: &CliOptions) -> Result<Self, ConfigError> {
        let builder = config::Config::builder();
        let builder = match &options.config {
            Some(path) => builder.add_source(File::from(path.as_path()).required(true)),
            None => {
                let resources = options
                    .resources
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCES_DIR));
                builder.add_source(File::from(resources.join(APPLICATION_CONFIG)).required(false))
            },
        };

        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .add_source(Environment::with_prefix(APP_ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub format: OutputFormat,
    pub pretty: bool,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Ron,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Metrics to query and reshape; empty selects the whole standard catalog.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<MetricKey>,
}

impl CatalogSettings {
    pub fn catalog(&self) -> MetricCatalog {
        let standard = MetricCatalog::standard();
        if self.metrics.is_empty() {
            standard.clone()
        } else {
            standard.restricted_to(&self.metrics)
        }
    }
}

#[derive(Parser, Clone, Debug, PartialEq, Eq)]
#[clap(author, version, about)]
pub struct CliOptions {
    /// override the configuration file to load.
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Override default location from which to load configuration files. Default directory is
    /// ./resources.
    #[clap(short, long)]
    pub resources: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the performance query batch for a pool, or one node of it.
    Query {
        #[clap(short, long)]
        pool: String,

        #[clap(short, long)]
        node: Option<String>,

        /// window of telemetry to query, in minutes.
        #[clap(short, long, allow_negative_numbers = true)]
        window: i64,
    },

    /// Reshape a raw query batch payload into a performance report.
    Reshape {
        /// JSON payload to read; standard input when omitted.
        #[clap(short, long)]
        input: Option<PathBuf>,
    },
}
