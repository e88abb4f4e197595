//! # Motion Sim
//!
//! Command-line scenario replay for the motion engine.

use clap::Parser;
use motion_sim::{CliArgs, SimConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing with optional JSON format.
///
/// Logs go to stderr so stdout carries only the replay log.
/// Set `RUST_LOG` to control log levels (default: warn,motion_sim=info).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,motion_sim=info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = SimConfig::from(args);
    tracing::debug!(scenario = %config.scenario.display(), format = ?config.format, "Starting motion-sim");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = motion_sim::run(&config, &mut out)?;

    tracing::info!(
        tier = %summary.tier,
        animated = summary.animated,
        mutations = summary.mutations,
        "Replay finished"
    );
    Ok(())
}
