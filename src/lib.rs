// Gesture Features - Streaming IMU feature extraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Gesture Features
//!
//! Streaming feature extraction for wrist-worn motion sensors.
//!
//! Raw accelerometer (and optionally gyroscope) readings are smoothed per
//! channel, kept in fixed-capacity windows, and summarised as
//! `[mean, sd, range]` per channel. An orientation gate decides when the
//! wearer holds the capture pose, so each gesture yields exactly one labeled
//! record, while periodic telemetry reports movement between gestures.
//!
//! ## Key Features
//!
//! - **Per-channel smoothing**: moving average, exponential, or none
//! - **Hysteresis gating**: arm, disarming-zone and disarm thresholds with settle timers
//! - **Two policies**: one-shot records per gesture, periodic movement telemetry
//! - **Deterministic**: time is injected, no sleeping, no threads
//!
//! ## Quick Start
//!
//! ```rust
//! use gesture_features::{
//!     CollectionMode, EngineConfig, GestureEngine, ImuReading, ManualClock, MemorySink,
//!     ScriptedSource, Smoothing,
//! };
//!
//! let config = EngineConfig {
//!     smoothing: Smoothing::None,
//!     mode: CollectionMode::OneShot,
//!     gesture_label: "left".to_string(),
//!     ..Default::default()
//! };
//! let mut engine = GestureEngine::new(config).unwrap();
//!
//! // Wrist raised for one second, then lowered.
//! let mut source = ScriptedSource::new();
//! for _ in 0..50 {
//!     source.push(ImuReading::accel(0.6, 0.1, 0.8));
//! }
//! source.push(ImuReading::accel(0.0, 0.0, 1.0));
//!
//! let clock = ManualClock::new(0);
//! let mut sink = MemorySink::new();
//! engine.run(&clock, 20, 51, &mut source, &mut sink);
//!
//! assert_eq!(sink.len(), 1);
//! assert_eq!(sink.records()[0].label, "left");
//! ```
//!
//! ## Architecture
//!
//! ```text
//!  SensorSource ──▶ Smoother ──▶ trailing RingWindow ──▶ periodic report ──┐
//!                      │                                                  │
//!                      ├──▶ OrientationGate ──▶ CollectionController      ├──▶ EmissionSink
//!                      │                              │                   │
//!                      └──▶ capture RingWindow ◀──────┘ ──▶ one-shot ─────┘
//! ```
//!
//! ## Modules
//!
//! - [`engine`]: Top-level tick loop
//! - [`gate`]: Orientation hysteresis state machine
//! - [`collector`]: One-shot and periodic emission policies
//! - [`channel`]: Per-channel smoother and windows
//! - [`smoother`], [`window`], [`features`]: Signal building blocks
//! - [`source`]: Sensor, clock and sink boundaries
//! - [`config`]: Engine configuration
//! - [`metrics`]: Engine counters

pub mod channel;
pub mod collector;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod gate;
pub mod metrics;
pub mod record;
pub mod smoother;
pub mod source;
pub mod window;

// Re-exports for convenient access
pub use channel::{Channel, ChannelKind, ChannelSet, ChannelSpec};
pub use collector::{CollectionController, CycleOutcome, MotionEdge, PeriodicOutcome};
pub use config::{
    AccelUnit, CollectionMode, EngineConfig, GateConfig, GyroUnit, SensorUnits, STILL_LABEL,
};
pub use engine::{GestureEngine, SampleOutcome, TickOutcome};
pub use error::{ConfigError, FeatureError, GestureError, Result};
pub use features::{ChannelFeatures, FeatureVector};
pub use gate::{GateTransition, GestureState, OrientationGate};
pub use metrics::EngineMetrics;
pub use record::{FeatureRecord, RecordOrigin};
pub use smoother::{Smoother, Smoothing};
pub use source::{
    Clock, EmissionSink, ImuReading, LatchedSource, ManualClock, MemorySink, ScriptedSource,
    SensorSource,
};
pub use window::RingWindow;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
