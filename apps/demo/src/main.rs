mod listeners;

use anyhow::Context;
use clap::Parser;
use listeners::Metrics;
use pubsubhub::logger::Logger;
use pubsubhub::runtime::build_runtime_with_config;
use pubsubhub::{Args, HubConfig, TokioDispatcher, load_config};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::info;

/// Triggers one event on a hub wired from a configuration file.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (extension optional).
    #[arg(short, long, default_value = "apps/demo/pubsubhub")]
    config: PathBuf,

    /// Event to trigger.
    #[arg(short, long, default_value = "user_created")]
    event: String,

    /// Positional string arguments passed to every handler.
    #[arg(default_values_t = [String::from("ada@example.com")])]
    args: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config: HubConfig =
        load_config(Some(&cli.config)).context("Critical: Configuration is malformed")?;
    let _log = Logger::from_settings(env!("CARGO_PKG_NAME"), &config.logging)?;

    // Dropping the runtime waits for deliveries still running on the blocking pool.
    let runtime = build_runtime_with_config(&config.runtime)?;
    let metrics = Arc::new(Metrics::default());
    let hub = pubsubhub::init(&config, &listeners::directory(&metrics))?;
    hub.set_async_dispatcher(Arc::new(TokioDispatcher::with_handle(runtime.handle().clone())));

    let args: Args = cli.args.iter().cloned().fold(Args::new(), Args::with);
    let report = hub.trigger(&cli.event, args);

    info!(
        event = %cli.event,
        invoked = report.invoked,
        dispatched = report.dispatched,
        failed = report.failed,
        counted = metrics.deliveries.load(Ordering::Relaxed),
        "Event triggered"
    );
    Ok(())
}
