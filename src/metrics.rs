// Gesture Features - Streaming IMU feature extraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Engine counters
//!
//! Plain counters updated by the engine as it runs. They never influence
//! what gets emitted.

use serde::{Deserialize, Serialize};

/// What the engine has done since it was created (or last reset).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMetrics {
    /// Readings smoothed and pushed
    pub samples_processed: u64,
    /// Sampling ticks skipped because the sensor had nothing new
    pub sensor_unavailable: u64,
    /// Report ticks fired
    pub reports: u64,
    /// Report ticks skipped because a window was empty
    pub reports_not_ready: u64,
    /// Report ticks skipped because a one-shot collection was running
    pub reports_yielded: u64,
    /// Arm transitions
    pub cycles_started: u64,
    /// Cycles that emitted their one-shot record
    pub cycles_completed: u64,
    /// Cycles that ended without a record
    pub cycles_aborted: u64,
    /// One-shot records emitted
    pub one_shot_records: u64,
    /// Periodic records emitted
    pub periodic_records: u64,
    /// Periodic motion-start edges
    pub motion_starts: u64,
    /// Periodic motion-end edges
    pub motion_ends: u64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records emitted by either policy
    pub fn records_emitted(&self) -> u64 {
        self.one_shot_records + self.periodic_records
    }

    /// Fraction of finished cycles that produced a record (0.0 - 1.0)
    pub fn completion_rate(&self) -> f64 {
        let finished = self.cycles_completed + self.cycles_aborted;
        if finished == 0 {
            return 0.0;
        }
        self.cycles_completed as f64 / finished as f64
    }

    /// Fraction of sampling ticks that found a reading (0.0 - 1.0)
    pub fn sensor_availability(&self) -> f64 {
        let polls = self.samples_processed + self.sensor_unavailable;
        if polls == 0 {
            return 1.0;
        }
        self.samples_processed as f64 / polls as f64
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = EngineMetrics::new();
        assert_eq!(metrics.records_emitted(), 0);
        assert_eq!(metrics.completion_rate(), 0.0);
        assert_eq!(metrics.sensor_availability(), 1.0);
    }

    #[test]
    fn test_completion_rate() {
        let metrics = EngineMetrics {
            cycles_completed: 3,
            cycles_aborted: 1,
            ..Default::default()
        };
        assert!((metrics.completion_rate() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_sensor_availability() {
        let metrics = EngineMetrics {
            samples_processed: 9,
            sensor_unavailable: 1,
            ..Default::default()
        };
        assert!((metrics.sensor_availability() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_records_emitted_and_reset() {
        let mut metrics = EngineMetrics {
            one_shot_records: 2,
            periodic_records: 5,
            ..Default::default()
        };
        assert_eq!(metrics.records_emitted(), 7);
        metrics.reset();
        assert_eq!(metrics, EngineMetrics::default());
    }
}
