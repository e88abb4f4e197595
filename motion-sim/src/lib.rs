//! # Motion Sim
//!
//! Headless host for the motion engine. Replays a scripted page scenario
//! and prints every mutation and tier change the engine produces.
//!
//! ## Usage
//!
//! ```bash
//! motion-sim scenarios/landing.json
//! motion-sim scenarios/landing.json --format json --config tuned.json
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `SimConfig` - Resolved run configuration
//! - [`scenario`] - Scenario format and frame-by-frame replay

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod scenario;

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use motion_core::{EngineConfig, MotionError};

pub use scenario::{replay, LogEvent, Replay, Scenario, ScenarioNode, Step, Summary};

/// Errors that can occur while loading or replaying a scenario.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A scenario file is not valid JSON or does not match the format.
    #[error("Invalid scenario {path}: {source}")]
    Scenario {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// The engine configuration was rejected.
    #[error("Invalid engine configuration: {0}")]
    Config(#[from] MotionError),

    /// Writing the log failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// A log event could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for simulator operations.
pub type SimResult<T> = Result<T, SimError>;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line per event.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Command-line arguments for motion-sim.
#[derive(Debug, Clone, Parser)]
#[command(name = "motion-sim")]
#[command(about = "Replay a scroll-animation scenario headlessly")]
#[command(version)]
pub struct CliArgs {
    /// Scenario file (JSON)
    pub scenario: PathBuf,

    /// Engine configuration file, overriding the scenario's own
    #[arg(long, env = "MOTION_SIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, env = "MOTION_SIM_FORMAT")]
    pub format: OutputFormat,

    /// Print only the final summary
    #[arg(long)]
    pub summary_only: bool,
}

/// Resolved run configuration.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Scenario file.
    pub scenario: PathBuf,
    /// Optional engine configuration file.
    pub config: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
    /// Suppress everything but the summary.
    pub summary_only: bool,
}

impl From<CliArgs> for SimConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            scenario: args.scenario,
            config: args.config,
            format: args.format,
            summary_only: args.summary_only,
        }
    }
}

fn read(path: &Path) -> SimResult<String> {
    std::fs::read_to_string(path).map_err(|source| SimError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate a scenario file.
///
/// # Errors
///
/// Returns an error if the file is unreadable, malformed, or embeds an
/// invalid engine configuration.
pub fn load_scenario(path: &Path) -> SimResult<Scenario> {
    let text = read(path)?;
    let scenario: Scenario = serde_json::from_str(&text).map_err(|source| SimError::Scenario {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(config) = &scenario.config {
        config.validate()?;
    }
    tracing::debug!(
        path = %path.display(),
        nodes = scenario.nodes.len(),
        steps = scenario.steps.len(),
        "Loaded scenario"
    );
    Ok(scenario)
}

/// Load and validate an engine configuration file.
///
/// # Errors
///
/// Returns an error if the file is unreadable or the configuration invalid.
pub fn load_engine_config(path: &Path) -> SimResult<EngineConfig> {
    Ok(EngineConfig::from_json(&read(path)?)?)
}

/// Write events in the chosen format.
///
/// # Errors
///
/// Returns an error if writing or serialization fails.
pub fn write_log(events: &[LogEvent], format: OutputFormat, out: &mut impl Write) -> SimResult<()> {
    for event in events {
        match format {
            OutputFormat::Text => writeln!(out, "{event}")?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, event)?;
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

/// Load, replay and print a scenario. Returns the final summary.
///
/// # Errors
///
/// Returns an error if loading or writing fails.
pub fn run(config: &SimConfig, out: &mut impl Write) -> SimResult<Summary> {
    let scenario = load_scenario(&config.scenario)?;
    let engine_config = config
        .config
        .as_deref()
        .map(load_engine_config)
        .transpose()?;

    tracing::info!(
        scenario = scenario.name.as_deref().unwrap_or("unnamed"),
        steps = scenario.steps.len(),
        "Replaying scenario"
    );
    let mut replay = Replay::start(&scenario, engine_config);
    for (index, step) in scenario.steps.iter().enumerate() {
        replay.step(index, step);
    }
    let summary = replay.summary();
    let mut events = replay.finish();
    if config.summary_only {
        events.retain(|e| matches!(e, LogEvent::Summary(_)));
    }
    write_log(&events, config.format, out)?;
    out.flush()?;
    Ok(summary)
}
