use std::io::Read;
use std::path::Path;

use clap::Parser;
use poolperf::query::QueryBuilder;
use poolperf::reshape::{RawMetricResults, Reshaper};
use poolperf::settings::{CliOptions, Command, OutputFormat, OutputSettings, Settings};
use poolperf::Result;
use serde::Serialize;

fn main() -> Result<()> {
    let options = CliOptions::parse();
    let settings = Settings::load(&options)?;

    let subscriber = poolperf::logging::get_subscriber("poolperf", &settings.log_directives, std::io::stderr);
    poolperf::logging::init_subscriber(subscriber)?;

    let main_span = tracing::trace_span!("main");
    let _main_span_guard = main_span.enter();

    let catalog = settings.catalog.catalog();
    tracing::info!(%catalog, command=?options.command, "poolperf starting");

    let output = match &options.command {
        Command::Query { pool, node, window } => {
            let builder = QueryBuilder::new(&catalog);
            let queries = match node {
                Some(node) => builder.node_query(pool, node, *window)?,
                None => builder.pool_query(pool, *window)?,
            };
            render(&queries, &settings.output)?
        },

        Command::Reshape { input } => {
            let payload = read_payload(input.as_deref())?;
            let raw = RawMetricResults::from_json(serde_json::from_str(payload.as_str())?)?;
            let report = Reshaper::new(&catalog).reshape(raw)?;
            render(&report, &settings.output)?
        },
    };

    println!("{output}");
    Ok(())
}

fn read_payload(input: Option<&Path>) -> Result<String> {
    let payload = match input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        },
    };

    tracing::debug!(payload_len=%payload.len(), ?input, "read raw performance payload");
    Ok(payload)
}

fn render<T: Serialize>(data: &T, settings: &OutputSettings) -> Result<String> {
    let rep = match (settings.format, settings.pretty) {
        (OutputFormat::Json, false) => serde_json::to_string(data)?,
        (OutputFormat::Json, true) => serde_json::to_string_pretty(data)?,
        (OutputFormat::Ron, false) => ron::to_string(data)?,
        (OutputFormat::Ron, true) => ron::ser::to_string_pretty(data, ron::ser::PrettyConfig::default())?,
    };

    Ok(rep)
}
