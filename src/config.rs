// Gesture Features - Streaming IMU feature extraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Engine configuration
//!
//! Configuration is supplied once at startup, validated, and never mutated
//! by the engine afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::channel::{ChannelKind, ChannelSpec};
use crate::error::{ConfigError, Result};
use crate::smoother::Smoothing;

/// Label used when no gesture is in progress.
pub const STILL_LABEL: &str = "still";

/// Which emission policies are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionMode {
    /// One record per arm → disarm cycle.
    OneShot,
    /// Records on every report tick with movement.
    Periodic,
    /// Both; periodic yields while a one-shot collection is running.
    #[default]
    Both,
}

impl CollectionMode {
    pub fn one_shot(&self) -> bool {
        matches!(self, Self::OneShot | Self::Both)
    }

    pub fn periodic(&self) -> bool {
        matches!(self, Self::Periodic | Self::Both)
    }
}

/// Accelerometer unit. Informational: values are never converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccelUnit {
    #[default]
    G,
    MetersPerSecondSquared,
}

/// Gyroscope unit. Informational: values are never converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GyroUnit {
    #[default]
    DegreesPerSecond,
    RadiansPerSecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SensorUnits {
    pub accel: AccelUnit,
    pub gyro: GyroUnit,
}

/// Orientation gate thresholds and settle timers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Orientation above this arms the gate.
    pub arm_threshold: f64,
    /// Between disarm and this, motion is suppressed while collecting.
    pub disarming_zone_threshold: f64,
    /// Orientation below this disarms the gate.
    pub disarm_threshold: f64,
    /// Dead time after arming before collection starts.
    pub arm_settle_ms: u64,
    /// Dead time after disarming before the gate can arm again.
    pub disarm_settle_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            arm_threshold: 0.4,
            disarming_zone_threshold: 0.25,
            disarm_threshold: 0.15,
            arm_settle_ms: 600,
            disarm_settle_ms: 400,
        }
    }
}

impl GateConfig {
    /// Check `arm > zone > disarm >= 0`.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (field, value) in [
            ("arm_threshold", self.arm_threshold),
            ("disarming_zone_threshold", self.disarming_zone_threshold),
            ("disarm_threshold", self.disarm_threshold),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
        }

        let ordered = self.arm_threshold > self.disarming_zone_threshold
            && self.disarming_zone_threshold > self.disarm_threshold
            && self.disarm_threshold >= 0.0;
        if !ordered {
            return Err(ConfigError::ThresholdOrdering {
                arm: self.arm_threshold,
                zone: self.disarming_zone_threshold,
                disarm: self.disarm_threshold,
            });
        }
        Ok(())
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sampling cadence.
    pub sample_interval_ms: u64,
    /// Reporting cadence, at least the sampling cadence.
    pub report_interval_ms: u64,
    /// Default smoothing for channels without an override.
    pub smoothing: Smoothing,
    /// Tracked channels, in output order.
    pub channels: Vec<ChannelSpec>,
    /// Channel whose smoothed value drives the orientation gate.
    pub orientation_channel: ChannelKind,
    /// Capacity of each one-shot capture window.
    pub capture_capacity: usize,
    /// Capacity of each trailing window used by periodic telemetry.
    pub periodic_window: usize,
    /// Per-channel sd above which periodic telemetry reports movement.
    pub movement_threshold: f64,
    /// Orientation gate settings.
    pub gate: GateConfig,
    /// A one-shot cycle with fewer captured samples is aborted.
    pub min_capture_samples: usize,
    /// Label attached to gesture records.
    pub gesture_label: String,
    /// Optional device or session identifier copied into records.
    pub device_id: Option<String>,
    /// Active emission policies.
    pub mode: CollectionMode,
    /// Units of the incoming samples.
    pub units: SensorUnits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 20,
            report_interval_ms: 100,
            smoothing: Smoothing::default(),
            channels: ChannelKind::ACCEL.iter().copied().map(ChannelSpec::new).collect(),
            orientation_channel: ChannelKind::AccelX,
            capture_capacity: 100,
            periodic_window: 10,
            movement_threshold: 0.10,
            gate: GateConfig::default(),
            min_capture_samples: 1,
            gesture_label: "gesture".to_string(),
            device_id: None,
            mode: CollectionMode::default(),
            units: SensorUnits::default(),
        }
    }
}

impl EngineConfig {
    /// Accelerometer-only preset (same as `default`).
    pub fn accel_only() -> Self {
        Self::default()
    }

    /// Accelerometer plus gyroscope preset.
    pub fn six_axis() -> Self {
        Self {
            channels: ChannelKind::ALL.iter().copied().map(ChannelSpec::new).collect(),
            ..Default::default()
        }
    }

    /// Create a configuration with a specific gesture label
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            gesture_label: label.into(),
            ..Default::default()
        }
    }

    /// Create a configuration with a specific collection mode
    pub fn with_mode(mode: CollectionMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// True if any tracked channel needs the gyroscope.
    pub fn uses_gyro(&self) -> bool {
        self.channels.iter().any(|c| c.kind.is_gyro())
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.gate.validate()?;

        if self.sample_interval_ms == 0 {
            return Err(ConfigError::Zero {
                field: "sample_interval_ms",
            });
        }
        if self.report_interval_ms < self.sample_interval_ms {
            return Err(ConfigError::ReportFasterThanSample {
                report_ms: self.report_interval_ms,
                sample_ms: self.sample_interval_ms,
            });
        }
        if self.capture_capacity == 0 {
            return Err(ConfigError::Zero {
                field: "capture_capacity",
            });
        }
        if self.periodic_window == 0 {
            return Err(ConfigError::Zero {
                field: "periodic_window",
            });
        }
        if self.min_capture_samples == 0 {
            return Err(ConfigError::Zero {
                field: "min_capture_samples",
            });
        }
        if self.min_capture_samples > self.capture_capacity {
            return Err(ConfigError::MinCaptureTooLarge {
                min: self.min_capture_samples,
                capacity: self.capture_capacity,
            });
        }
        if !self.movement_threshold.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "movement_threshold",
            });
        }

        if self.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        let mut seen = HashSet::new();
        for spec in &self.channels {
            if !seen.insert(spec.kind) {
                return Err(ConfigError::DuplicateChannel(spec.kind.to_string()));
            }
            self.validate_smoothing(spec.smoothing.unwrap_or(self.smoothing))?;
        }
        if !seen.contains(&self.orientation_channel) {
            return Err(ConfigError::OrientationNotTracked(
                self.orientation_channel.to_string(),
            ));
        }

        let label = self.gesture_label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case(STILL_LABEL) {
            return Err(ConfigError::InvalidLabel(self.gesture_label.clone()));
        }
        Ok(())
    }

    fn validate_smoothing(&self, smoothing: Smoothing) -> std::result::Result<(), ConfigError> {
        match smoothing {
            Smoothing::MovingAverage { length } => {
                if length == 0 {
                    return Err(ConfigError::Zero {
                        field: "smoothing.length",
                    });
                }
                let capacity = self.periodic_window.min(self.capture_capacity);
                if length > capacity {
                    return Err(ConfigError::SmoothingTooLong { length, capacity });
                }
            }
            Smoothing::Exponential { time_constant_ms } => {
                if !time_constant_ms.is_finite() || time_constant_ms < 0.0 {
                    return Err(ConfigError::NonFinite {
                        field: "smoothing.time_constant_ms",
                    });
                }
            }
            Smoothing::None => {}
        }
        Ok(())
    }

    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GestureError;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.channels.len(), 3);
        assert_eq!(config.mode, CollectionMode::Both);
        assert!(!config.uses_gyro());
    }

    #[test]
    fn test_six_axis_preset() {
        let config = EngineConfig::six_axis();
        assert!(config.validate().is_ok());
        assert_eq!(config.channels.len(), 6);
        assert!(config.uses_gyro());
    }

    #[test]
    fn test_threshold_ordering_rejected() {
        let config = EngineConfig {
            gate: GateConfig {
                disarming_zone_threshold: 0.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOrdering { .. })
        ));
    }

    #[test]
    fn test_negative_disarm_rejected() {
        let gate = GateConfig {
            disarm_threshold: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            gate.validate(),
            Err(ConfigError::ThresholdOrdering { .. })
        ));
    }

    #[test]
    fn test_equal_thresholds_rejected() {
        let gate = GateConfig {
            arm_threshold: 0.3,
            disarming_zone_threshold: 0.3,
            ..Default::default()
        };
        assert!(gate.validate().is_err());
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let gate = GateConfig {
            arm_threshold: f64::NAN,
            ..Default::default()
        };
        assert_eq!(
            gate.validate(),
            Err(ConfigError::NonFinite {
                field: "arm_threshold"
            })
        );
    }

    #[test]
    fn test_report_faster_than_sample_rejected() {
        let config = EngineConfig {
            sample_interval_ms: 50,
            report_interval_ms: 20,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ReportFasterThanSample { .. })
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = EngineConfig {
            sample_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero {
                field: "sample_interval_ms"
            })
        );
    }

    #[test]
    fn test_smoothing_longer_than_window_rejected() {
        let config = EngineConfig {
            smoothing: Smoothing::MovingAverage { length: 11 },
            periodic_window: 10,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::SmoothingTooLong {
                length: 11,
                capacity: 10
            })
        );
    }

    #[test]
    fn test_channel_errors() {
        let empty = EngineConfig {
            channels: vec![],
            ..Default::default()
        };
        assert_eq!(empty.validate(), Err(ConfigError::NoChannels));

        let duplicate = EngineConfig {
            channels: vec![
                ChannelSpec::new(ChannelKind::AccelX),
                ChannelSpec::new(ChannelKind::AccelX),
            ],
            ..Default::default()
        };
        assert_eq!(
            duplicate.validate(),
            Err(ConfigError::DuplicateChannel("Ax".to_string()))
        );

        let untracked = EngineConfig {
            orientation_channel: ChannelKind::GyroZ,
            ..Default::default()
        };
        assert_eq!(
            untracked.validate(),
            Err(ConfigError::OrientationNotTracked("Gz".to_string()))
        );
    }

    #[test]
    fn test_label_errors() {
        assert!(EngineConfig::with_label("").validate().is_err());
        assert!(EngineConfig::with_label("Still").validate().is_err());
        assert!(EngineConfig::with_label("left").validate().is_ok());
    }

    #[test]
    fn test_min_capture_too_large() {
        let config = EngineConfig {
            capture_capacity: 5,
            min_capture_samples: 6,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MinCaptureTooLarge { .. })
        ));
    }

    #[test]
    fn test_collection_mode_flags() {
        assert!(CollectionMode::OneShot.one_shot());
        assert!(!CollectionMode::OneShot.periodic());
        assert!(CollectionMode::Periodic.periodic());
        assert!(CollectionMode::Both.one_shot() && CollectionMode::Both.periodic());
    }

    #[test]
    fn test_config_serialization() {
        let config = EngineConfig::six_axis();
        let json = config.to_json().unwrap();
        let parsed = EngineConfig::from_json(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed =
            EngineConfig::from_json(r#"{ "gesture_label": "up", "mode": "one_shot" }"#).unwrap();
        assert_eq!(parsed.gesture_label, "up");
        assert_eq!(parsed.mode, CollectionMode::OneShot);
        assert_eq!(parsed.sample_interval_ms, 20);
    }

    #[test]
    fn test_invalid_json_config_rejected() {
        let result = EngineConfig::from_json(
            r#"{ "gate": { "arm_threshold": 0.1, "disarming_zone_threshold": 0.2,
                 "disarm_threshold": 0.3, "arm_settle_ms": 0, "disarm_settle_ms": 0 } }"#,
        );
        assert!(matches!(result, Err(GestureError::Config(_))));

        let garbage = EngineConfig::from_json("{ not json");
        assert!(matches!(garbage, Err(GestureError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, EngineConfig::with_label("wave").to_json().unwrap()).unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.gesture_label, "wave");

        let missing = EngineConfig::load_from_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(GestureError::Io(_))));
    }
}
