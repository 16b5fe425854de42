// Gesture Replay - Record output
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Record writers.
//!
//! CSV output keeps the classic training-set layout: three feature columns
//! per channel (`meanAx, sdAx, rangeAx, …`) followed by `armed,label,deviceId`.
//! JSON output writes one serialized record per line.

use clap::ValueEnum;
use gesture_features::{ChannelKind, EmissionSink, FeatureRecord};
use std::io::Write;

use crate::replay::ReplayError;

/// Trailing CSV columns after the feature fields.
const TRAILER_COLUMNS: [&str; 3] = ["armed", "label", "deviceId"];

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

enum Target<W: Write> {
    Csv(csv::Writer<W>),
    Json(W),
}

/// Sink that writes each record as it is emitted.
///
/// Write errors cannot be returned through [`EmissionSink::emit`], so the
/// first one is kept and later records are discarded. Call
/// [`RecordWriter::finish`] to flush and surface it.
pub struct RecordWriter<W: Write> {
    target: Target<W>,
    written: usize,
    error: Option<ReplayError>,
}

impl<W: Write> RecordWriter<W> {
    /// CSV writer; the header is written immediately.
    pub fn csv<I>(writer: W, channels: I) -> Result<Self, ReplayError>
    where
        I: IntoIterator<Item = ChannelKind>,
    {
        let mut csv = csv::Writer::from_writer(writer);
        let mut header = FeatureRecord::field_names(channels);
        header.extend(TRAILER_COLUMNS.iter().map(|c| c.to_string()));
        csv.write_record(&header)?;

        Ok(Self {
            target: Target::Csv(csv),
            written: 0,
            error: None,
        })
    }

    /// JSON-lines writer.
    pub fn json(writer: W) -> Self {
        Self {
            target: Target::Json(writer),
            written: 0,
            error: None,
        }
    }

    pub fn new<I>(writer: W, format: OutputFormat, channels: I) -> Result<Self, ReplayError>
    where
        I: IntoIterator<Item = ChannelKind>,
    {
        match format {
            OutputFormat::Csv => Self::csv(writer, channels),
            OutputFormat::Json => Ok(Self::json(writer)),
        }
    }

    fn write(&mut self, record: &FeatureRecord) -> Result<(), ReplayError> {
        match &mut self.target {
            Target::Csv(csv) => {
                let mut row: Vec<String> = record.fields().iter().map(|v| v.to_string()).collect();
                row.push(u8::from(record.armed).to_string());
                row.push(record.label.clone());
                row.push(record.device_id.clone().unwrap_or_default());
                csv.write_record(&row)?;
            }
            Target::Json(out) => {
                serde_json::to_writer(&mut *out, record)?;
                out.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    /// Records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and return the first write error, if any.
    pub fn finish(self) -> Result<usize, ReplayError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        match self.target {
            Target::Csv(mut csv) => csv.flush()?,
            Target::Json(mut out) => out.flush()?,
        }
        Ok(self.written)
    }
}

impl<W: Write> EmissionSink for RecordWriter<W> {
    fn emit(&mut self, record: FeatureRecord) {
        if self.error.is_some() {
            return;
        }
        match self.write(&record) {
            Ok(()) => self.written += 1,
            Err(e) => {
                tracing::error!("Failed to write record: {}", e);
                self.error = Some(e);
            }
        }
    }
}
