//! Stage Cycle - demo runner
//!
//! CLI entry point that drives the demo counting cycle for a fixed time.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stage_cycle::cli::StageDisplay;
use stage_cycle::cycle::engine::CycleEngine;
use stage_cycle::cycle::settings::{CycleSection, CycleSettings, RecordState};
use stage_cycle::demo::{register_demo_transforms, DEMO_STAGES};
use stage_cycle::log::JsonlLogger;

/// Cyclical stage-transition demo
///
/// Runs a cycle of named stages on a timer, printing every committed
/// transition. Stages with a built-in demo transform (Mapping, Iteration,
/// Checking, Transformation) get that transform; other stages pass through.
#[derive(Parser, Debug)]
#[command(name = "stage-cycle", version, about)]
struct Cli {
    /// Path to a cycle.toml settings file (defaults to the built-in demo)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the interval between stages, in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// How long to run before stopping, in seconds
    #[arg(long, default_value_t = 10)]
    duration_secs: u64,

    /// Directory for a JSONL transition log (disabled when omitted)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

/// Built-in settings reproducing the four-stage demo at one second per stage.
fn default_settings() -> CycleSettings {
    let mut initial_state = RecordState::new();
    initial_state.insert("count".to_string(), 0.into());
    CycleSettings {
        cycle: CycleSection {
            stages: DEMO_STAGES.iter().map(ToString::to_string).collect(),
            interval_ms: 1000,
        },
        initial_state,
    }
}

fn load_settings(path: Option<&Path>) -> Result<CycleSettings> {
    path.map_or_else(
        || Ok(default_settings()),
        |path| {
            CycleSettings::from_path(path).with_context(|| {
                format!("Failed to load settings from '{}'", path.display())
            })
        },
    )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_engine(
    settings: &CycleSettings,
    logger: Option<JsonlLogger>,
) -> Result<CycleEngine<RecordState>> {
    let display = Arc::new(StageDisplay::new(settings.cycle.stages.len()));
    let stall_display = Arc::clone(&display);

    let observer = move |state: &RecordState, stage: &str| {
        display.render_transition(state, stage);
        if let Some(logger) = &logger {
            if let Err(err) = logger.record(state, stage) {
                tracing::warn!(error = %err, "failed to write transition log");
            }
        }
    };

    let config = register_demo_transforms(settings.builder(), &settings.cycle.stages)
        .observer(observer)
        .error_handler(move |err: &anyhow::Error, stage: &str, _: &RecordState| {
            stall_display.render_stall(err, stage);
        })
        .build()
        .context("Invalid cycle configuration")?;

    Ok(CycleEngine::new(config))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = load_settings(cli.config.as_deref())?;
    let logger = cli
        .log_dir
        .as_ref()
        .map(JsonlLogger::new)
        .transpose()
        .context("Failed to initialize JSONL logger")?;

    let engine = build_engine(&settings, logger)?;
    let interval_ms = cli.interval_ms.unwrap_or(settings.cycle.interval_ms);
    StageDisplay::new(settings.cycle.stages.len())
        .print_header(&settings.cycle.stages, interval_ms);

    let Some(driver) = engine.start(Some(Duration::from_millis(interval_ms))) else {
        // Manual mode: step once per stage so the run still shows a full cycle.
        for _ in 0..settings.cycle.stages.len() {
            engine.advance();
        }
        return Ok(());
    };

    tokio::select! {
        () = tokio::time::sleep(Duration::from_secs(cli.duration_secs)) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
        }
    }

    engine.stop();
    driver.await.context("Cycle driver panicked")?;
    Ok(())
}
