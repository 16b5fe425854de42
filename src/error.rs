// Gesture Features - Streaming IMU feature extraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for gesture feature extraction
//!
//! Only [`ConfigError`] is fatal: it is raised once, before the control loop
//! starts. Everything else degrades to "skip this tick".

use thiserror::Error;

/// Result type alias for gesture feature operations
pub type Result<T> = std::result::Result<T, GestureError>;

/// Main error type
#[derive(Error, Debug)]
pub enum GestureError {
    /// Configuration rejected at startup
    #[error("Configuration invalid: {0}")]
    Config(#[from] ConfigError),

    /// Feature computation failed
    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),

    /// The sensor had no new reading for this tick
    #[error("Sensor unavailable")]
    SensorUnavailable,

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors while reducing a window to features
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    /// The window holds no samples yet
    #[error("Window not ready: channel {channel} has no samples")]
    NotReady { channel: String },
}

/// Configuration errors (ConfigurationInvalid)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Hysteresis ordering ARM > ZONE > DISARM >= 0 violated
    #[error(
        "Threshold ordering violated: need arm ({arm}) > disarming zone ({zone}) > disarm ({disarm}) >= 0"
    )]
    ThresholdOrdering { arm: f64, zone: f64, disarm: f64 },

    /// A numeric field is NaN or infinite
    #[error("Non-finite value for {field}")]
    NonFinite { field: &'static str },

    /// A field that must be strictly positive is zero
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    /// Report cadence faster than sample cadence
    #[error("Report interval {report_ms}ms is shorter than sample interval {sample_ms}ms")]
    ReportFasterThanSample { report_ms: u64, sample_ms: u64 },

    /// Smoothing ring longer than the window it feeds
    #[error("Smoothing length {length} exceeds window capacity {capacity}")]
    SmoothingTooLong { length: usize, capacity: usize },

    /// Minimum capture larger than the capture window can ever hold
    #[error("Minimum capture of {min} samples exceeds capture capacity {capacity}")]
    MinCaptureTooLarge { min: usize, capacity: usize },

    /// No channels tracked
    #[error("No channels configured")]
    NoChannels,

    /// Same channel listed twice
    #[error("Duplicate channel: {0}")]
    DuplicateChannel(String),

    /// Orientation channel is not among the tracked channels
    #[error("Orientation channel {0} is not tracked")]
    OrientationNotTracked(String),

    /// Gesture label empty or equal to the still sentinel
    #[error("Invalid gesture label: {0:?}")]
    InvalidLabel(String),
}
