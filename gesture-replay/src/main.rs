// Gesture Replay - Offline replay of recorded IMU sessions
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Gesture Replay
//!
//! Feeds a recorded IMU session through the gesture feature engine and
//! writes the emitted records, e.g. to build a labeled training set.
//!
//! ## Usage
//!
//! ```bash
//! # One record per "left" gesture, CSV on stdout
//! gesture-replay --input session.csv --label left --mode one-shot
//!
//! # Custom engine settings, JSON lines to a file
//! gesture-replay --input session.csv --config engine.json --format json --output records.jsonl
//! ```

mod output;
mod replay;

use clap::{Parser, ValueEnum};
use gesture_features::{CollectionMode, EngineConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use output::{OutputFormat, RecordWriter};
use replay::{log_summary, ReplayConfig, ReplayEngine, ReplayError};

/// Collection mode flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    OneShot,
    Periodic,
    Both,
}

impl From<ModeArg> for CollectionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::OneShot => CollectionMode::OneShot,
            ModeArg::Periodic => CollectionMode::Periodic,
            ModeArg::Both => CollectionMode::Both,
        }
    }
}

/// Gesture feature replay
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV session to replay (t_ms,ax,ay,az[,gx,gy,gz])
    #[arg(short, long)]
    input: String,

    /// JSON engine configuration; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gesture label, overrides the configuration
    #[arg(short, long)]
    label: Option<String>,

    /// Collection mode, overrides the configuration
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Device or session identifier written into every record
    #[arg(short, long)]
    device_id: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Engine configuration with command-line overrides applied.
    fn engine_config(&self) -> Result<EngineConfig, ReplayError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load_from_file(path)?,
            None => EngineConfig::default(),
        };
        if let Some(label) = &self.label {
            config.gesture_label = label.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if self.device_id.is_some() {
            config.device_id = self.device_id.clone();
        }
        Ok(config)
    }
}

fn main() {
    let args = Args::parse();

    // Initialize tracing; also captures the engine's `log` records
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    info!("Gesture Replay v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("Replay failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), ReplayError> {
    let config = ReplayConfig {
        csv_path: args.input.clone(),
        engine: args.engine_config()?,
    };
    let mut replay = ReplayEngine::from_csv(config)?;
    let info = replay.dataset_info();
    info!(
        "Dataset loaded: {} samples, {}ms, gyro: {}",
        info.sample_count, info.duration_ms, info.has_gyro
    );

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let channels: Vec<_> = replay.engine().channels().kinds().collect();
    let mut writer = RecordWriter::new(out, args.format, channels)?;

    let summary = replay.run(&mut writer);
    let written = writer.finish()?;
    log_summary(&summary);
    info!("{} records written", written);
    Ok(())
}
