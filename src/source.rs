// Gesture Features - Streaming IMU feature extraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Boundaries of the engine
//!
//! The engine reads samples from a [`SensorSource`], reads time from a
//! [`Clock`], and hands records to an [`EmissionSink`]. These are the only
//! crossings between the core and the outside world.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::VecDeque;

use crate::channel::ChannelKind;
use crate::record::FeatureRecord;

/// One raw reading in configured physical units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImuReading {
    pub accel: [f64; 3],
    pub gyro: Option<[f64; 3]>,
}

impl ImuReading {
    /// Accelerometer-only reading
    pub fn accel(x: f64, y: f64, z: f64) -> Self {
        Self {
            accel: [x, y, z],
            gyro: None,
        }
    }

    /// Accelerometer plus gyroscope reading
    pub fn six_axis(accel: [f64; 3], gyro: [f64; 3]) -> Self {
        Self {
            accel,
            gyro: Some(gyro),
        }
    }

    /// Value of one channel, `None` if the reading has no gyro part.
    pub fn value(&self, kind: ChannelKind) -> Option<f64> {
        match kind {
            ChannelKind::AccelX => Some(self.accel[0]),
            ChannelKind::AccelY => Some(self.accel[1]),
            ChannelKind::AccelZ => Some(self.accel[2]),
            ChannelKind::GyroX => self.gyro.map(|g| g[0]),
            ChannelKind::GyroY => self.gyro.map(|g| g[1]),
            ChannelKind::GyroZ => self.gyro.map(|g| g[2]),
        }
    }
}

/// Polled, non-blocking sensor.
pub trait SensorSource {
    /// A new reading, or `None` if nothing new is available.
    fn poll(&mut self) -> Option<ImuReading>;
}

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Receiver of emitted records.
pub trait EmissionSink {
    fn emit(&mut self, record: FeatureRecord);
}

impl EmissionSink for Vec<FeatureRecord> {
    fn emit(&mut self, record: FeatureRecord) {
        self.push(record);
    }
}

/// Manually advanced clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    /// Move to `now_ms`; earlier times are ignored to stay monotonic.
    pub fn set(&self, now_ms: u64) {
        if now_ms > self.now.get() {
            self.now.set(now_ms);
        }
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Source that replays a fixed script; `None` entries simulate "no data".
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    script: VecDeque<Option<ImuReading>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reading: ImuReading) {
        self.script.push_back(Some(reading));
    }

    /// Queue a poll that reports no data.
    pub fn push_gap(&mut self) {
        self.script.push_back(None);
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

impl FromIterator<ImuReading> for ScriptedSource {
    fn from_iter<T: IntoIterator<Item = ImuReading>>(iter: T) -> Self {
        Self {
            script: iter.into_iter().map(Some).collect(),
        }
    }
}

impl SensorSource for ScriptedSource {
    fn poll(&mut self) -> Option<ImuReading> {
        self.script.pop_front().flatten()
    }
}

/// Single-slot source behaving like a sensor data-ready register.
///
/// A latched reading is handed out once; latching again before it was
/// polled overwrites it.
#[derive(Debug, Clone, Default)]
pub struct LatchedSource {
    pending: Option<ImuReading>,
    overwritten: u64,
}

impl LatchedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latch(&mut self, reading: ImuReading) {
        if self.pending.replace(reading).is_some() {
            self.overwritten += 1;
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Readings dropped because a newer one arrived first.
    pub fn overwritten(&self) -> u64 {
        self.overwritten
    }
}

impl SensorSource for LatchedSource {
    fn poll(&mut self) -> Option<ImuReading> {
        self.pending.take()
    }
}

/// In-memory sink collecting every record.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Vec<FeatureRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn drain(&mut self) -> Vec<FeatureRecord> {
        std::mem::take(&mut self.records)
    }
}

impl EmissionSink for MemorySink {
    fn emit(&mut self, record: FeatureRecord) {
        self.records.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_values() {
        let accel = ImuReading::accel(1.0, 2.0, 3.0);
        assert_eq!(accel.value(ChannelKind::AccelZ), Some(3.0));
        assert_eq!(accel.value(ChannelKind::GyroX), None);

        let full = ImuReading::six_axis([0.0; 3], [4.0, 5.0, 6.0]);
        assert_eq!(full.value(ChannelKind::GyroY), Some(5.0));
    }

    #[test]
    fn test_manual_clock_monotonic() {
        let clock = ManualClock::new(100);
        clock.advance(20);
        assert_eq!(clock.now_ms(), 120);
        clock.set(50);
        assert_eq!(clock.now_ms(), 120);
        clock.set(200);
        assert_eq!(clock.now_ms(), 200);
    }

    #[test]
    fn test_scripted_source_gaps() {
        let mut source = ScriptedSource::new();
        source.push(ImuReading::accel(1.0, 0.0, 0.0));
        source.push_gap();
        assert_eq!(source.remaining(), 2);

        assert!(source.poll().is_some());
        assert!(source.poll().is_none());
        assert!(source.poll().is_none());
        assert!(source.is_empty());
    }

    #[test]
    fn test_latched_source_overwrites() {
        let mut source = LatchedSource::new();
        source.latch(ImuReading::accel(1.0, 0.0, 0.0));
        source.latch(ImuReading::accel(2.0, 0.0, 0.0));
        assert_eq!(source.overwritten(), 1);

        let reading = source.poll().unwrap();
        assert_eq!(reading.accel[0], 2.0);
        assert!(source.poll().is_none());
    }
}
