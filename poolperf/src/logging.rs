use once_cell::sync::Lazy;
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Bunyan-formatted JSON subscriber. `RUST_LOG` takes precedence over `log_directives`.
pub fn get_subscriber<S>(name: impl Into<String>, log_directives: impl AsRef<str>, sink: S) -> impl Subscriber + Send + Sync
where
    S: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_directives.as_ref()));
    let bunyan_formatting = BunyanFormattingLayer::new(name.into(), sink);

    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(bunyan_formatting)
}

pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> anyhow::Result<()> {
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Forced once by tests; logs to stdout only when `TEST_LOG` is set.
pub static TEST_TRACING: Lazy<()> = Lazy::new(|| {
    let name = "test";
    let directives = "debug";
    let installed = if std::env::var("TEST_LOG").is_ok() {
        init_subscriber(get_subscriber(name, directives, std::io::stdout))
    } else {
        init_subscriber(get_subscriber(name, directives, std::io::sink))
    };

    if let Err(error) = installed {
        eprintln!("test tracing subscriber not installed: {error}");
    }
});
