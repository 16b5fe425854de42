// Gesture Replay - Dataset replay engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Replays a recorded IMU session through the gesture engine.
//!
//! Each CSV row is latched into a single-slot source at its own timestamp,
//! then the engine ticks. The engine's sample cadence decides whether the
//! row is consumed; rows arriving faster than the cadence overwrite each
//! other the way an unread sensor register would.

use gesture_features::{
    ConfigError, EmissionSink, EngineConfig, EngineMetrics, GestureEngine, GestureError,
    ImuReading, LatchedSource, ManualClock,
};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Configuration for dataset replay.
#[derive(Debug, Clone, Default)]
pub struct ReplayConfig {
    /// Path to CSV dataset file.
    pub csv_path: String,
    /// Engine settings used for the replay.
    pub engine: EngineConfig,
}

/// One CSV row: `t_ms,ax,ay,az[,gx,gy,gz]`.
#[derive(Debug, Clone, Deserialize)]
struct CsvRow {
    t_ms: u64,
    ax: f64,
    ay: f64,
    az: f64,
    #[serde(default)]
    gx: Option<f64>,
    #[serde(default)]
    gy: Option<f64>,
    #[serde(default)]
    gz: Option<f64>,
}

/// Dataset row for replay.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    pub timestamp_ms: u64,
    pub reading: ImuReading,
}

impl From<CsvRow> for DataRow {
    fn from(row: CsvRow) -> Self {
        let accel = [row.ax, row.ay, row.az];
        let reading = match (row.gx, row.gy, row.gz) {
            (Some(gx), Some(gy), Some(gz)) => ImuReading::six_axis(accel, [gx, gy, gz]),
            _ => ImuReading {
                accel,
                gyro: None,
            },
        };
        Self {
            timestamp_ms: row.t_ms,
            reading,
        }
    }
}

/// Summary of a loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    pub sample_count: usize,
    pub duration_ms: u64,
    /// Every row carries gyroscope values.
    pub has_gyro: bool,
}

/// What a replay run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub rows: usize,
    pub records: usize,
    /// Rows overwritten before the engine sampled them.
    pub dropped_rows: u64,
    pub metrics: EngineMetrics,
}

/// Feeds a dataset through a [`GestureEngine`].
pub struct ReplayEngine {
    engine: GestureEngine,
    rows: Vec<DataRow>,
}

impl ReplayEngine {
    /// Create a new replay engine from a CSV file.
    pub fn from_csv(config: ReplayConfig) -> Result<Self, ReplayError> {
        let path = Path::new(&config.csv_path);
        if !path.exists() {
            return Err(ReplayError::FileNotFound(config.csv_path.clone()));
        }

        let rows = Self::parse_csv(path)?;
        if rows.is_empty() {
            return Err(ReplayError::EmptyDataset);
        }

        let engine = GestureEngine::new(config.engine)?;
        if engine.config().uses_gyro() && rows.iter().any(|r| r.reading.gyro.is_none()) {
            info!("dataset has rows without gyroscope values; those rows will be skipped");
        }

        info!(
            "Loaded dataset: {} samples over {}ms",
            rows.len(),
            rows[rows.len() - 1].timestamp_ms - rows[0].timestamp_ms
        );

        Ok(Self { engine, rows })
    }

    /// Parse a CSV file into data rows.
    fn parse_csv(path: &Path) -> Result<Vec<DataRow>, ReplayError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let columns: Vec<&str> = headers.iter().collect();
        if columns.len() < 4 || columns[..4] != ["t_ms", "ax", "ay", "az"] {
            return Err(ReplayError::InvalidFormat(
                "header must start with 't_ms,ax,ay,az'".to_string(),
            ));
        }

        let mut rows: Vec<DataRow> = Vec::new();
        for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
            let row = DataRow::from(result?);
            if let Some(prev) = rows.last() {
                if row.timestamp_ms < prev.timestamp_ms {
                    return Err(ReplayError::InvalidFormat(format!(
                        "timestamp goes backwards at row {}",
                        index + 1
                    )));
                }
            }
            rows.push(row);
        }

        Ok(rows)
    }

    /// Replay every row, handing records to `sink`.
    pub fn run<K: EmissionSink + ?Sized>(&mut self, sink: &mut K) -> ReplaySummary {
        let start = self.rows.first().map_or(0, |r| r.timestamp_ms);
        let clock = ManualClock::new(start);
        let mut source = LatchedSource::new();
        let mut records = 0;

        info!("Starting replay of {} rows", self.rows.len());
        for row in &self.rows {
            clock.set(row.timestamp_ms);
            source.latch(row.reading);
            let outcome = self.engine.poll(&clock, &mut source, sink);
            records += outcome.emitted;
            if let Some(transition) = outcome.transition {
                debug!("t={}ms: {:?}", row.timestamp_ms, transition);
            }
        }

        let mut dropped_rows = source.overwritten();
        if source.has_pending() {
            dropped_rows += 1;
        }

        ReplaySummary {
            rows: self.rows.len(),
            records,
            dropped_rows,
            metrics: self.engine.metrics().clone(),
        }
    }

    /// Get dataset information.
    pub fn dataset_info(&self) -> DatasetInfo {
        let duration_ms = match (self.rows.first(), self.rows.last()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0,
        };
        DatasetInfo {
            sample_count: self.rows.len(),
            duration_ms,
            has_gyro: self.rows.iter().all(|r| r.reading.gyro.is_some()),
        }
    }

    pub fn engine(&self) -> &GestureEngine {
        &self.engine
    }
}

/// Log the engine counters at the end of a run.
pub fn log_summary(summary: &ReplaySummary) {
    let m = &summary.metrics;
    info!(
        rows = summary.rows,
        records = summary.records,
        dropped_rows = summary.dropped_rows,
        "Replay complete"
    );
    info!(
        samples = m.samples_processed,
        sensor_unavailable = m.sensor_unavailable,
        reports = m.reports,
        cycles_started = m.cycles_started,
        cycles_completed = m.cycles_completed,
        cycles_aborted = m.cycles_aborted,
        one_shot = m.one_shot_records,
        periodic = m.periodic_records,
        "Engine metrics"
    );
}

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] GestureError),
}
