// Gesture Features - Streaming IMU feature extraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Collection controller
//!
//! Applies the side effects of gate transitions to the channel windows and
//! decides when records are emitted. Two policies are supported:
//!
//! - **One-shot**: one record per arm → disarm cycle, built from the capture
//!   windows filled while the gate was collecting.
//! - **Periodic**: on every report tick, a record whenever any trailing
//!   window's standard deviation exceeds the movement threshold.
//!
//! Periodic telemetry yields while a one-shot collection is running.

use log::{debug, info, warn};

use crate::channel::ChannelSet;
use crate::config::{CollectionMode, EngineConfig, STILL_LABEL};
use crate::features::FeatureVector;
use crate::gate::{GateTransition, GestureState, OrientationGate};
use crate::record::{FeatureRecord, RecordOrigin};

/// Periodic motion edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEdge {
    Start,
    End,
}

/// How a one-shot cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The cycle's record.
    Emitted(FeatureRecord),
    /// Disarmed before collecting, or fewer samples than required.
    Aborted { captured: usize },
}

/// Result of one periodic report tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodicOutcome {
    pub record: Option<FeatureRecord>,
    pub edge: Option<MotionEdge>,
    /// Skipped because a one-shot collection is running.
    pub yielded: bool,
    /// Skipped because a trailing window is still empty.
    pub not_ready: bool,
}

/// Decides what each sample and report tick does with the windows.
#[derive(Debug, Clone)]
pub struct CollectionController {
    mode: CollectionMode,
    movement_threshold: f64,
    min_capture_samples: usize,
    gesture_label: String,
    device_id: Option<String>,
    in_motion: bool,
}

impl CollectionController {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            mode: config.mode,
            movement_threshold: config.movement_threshold,
            min_capture_samples: config.min_capture_samples,
            gesture_label: config.gesture_label.clone(),
            device_id: config.device_id.clone(),
            in_motion: false,
        }
    }

    /// Apply the side effects of a gate transition.
    ///
    /// Returns the cycle outcome when the transition ended a cycle.
    pub fn on_transition(
        &mut self,
        transition: GateTransition,
        now_ms: u64,
        channels: &mut ChannelSet,
        gate: &mut OrientationGate,
    ) -> Option<CycleOutcome> {
        match transition {
            GateTransition::Armed => {
                debug!("armed at {}ms", now_ms);
                channels.clear_captures();
                None
            }
            GateTransition::CollectionStarted => {
                debug!("collection started at {}ms", now_ms);
                None
            }
            GateTransition::Disarmed { from } => {
                debug!("disarmed at {}ms (from {:?})", now_ms, from);
                let outcome = self.finish_cycle(from, now_ms, channels, gate);
                channels.clear_captures();
                outcome
            }
            GateTransition::Settled => {
                debug!("disarm settled at {}ms", now_ms);
                None
            }
        }
    }

    fn finish_cycle(
        &mut self,
        from: GestureState,
        now_ms: u64,
        channels: &ChannelSet,
        gate: &mut OrientationGate,
    ) -> Option<CycleOutcome> {
        if !self.mode.one_shot() {
            return None;
        }
        let captured = channels.captured();
        if from != GestureState::Collecting {
            info!("cycle aborted during arm settle");
            return Some(CycleOutcome::Aborted { captured });
        }
        if gate.emitted_this_cycle() {
            return None;
        }
        if captured < self.min_capture_samples {
            info!(
                "cycle aborted: {} samples captured, {} required",
                captured, self.min_capture_samples
            );
            return Some(CycleOutcome::Aborted { captured });
        }

        match channels.capture_features() {
            Ok(features) => {
                gate.mark_emitted();
                let record = self.record(features, self.gesture_label.clone(), true, now_ms, RecordOrigin::OneShot);
                info!(
                    "one-shot record '{}' from {} samples at {}ms",
                    record.label, captured, now_ms
                );
                Some(CycleOutcome::Emitted(record))
            }
            Err(e) => {
                warn!("cycle produced no features: {}", e);
                Some(CycleOutcome::Aborted { captured })
            }
        }
    }

    /// Whether the latest sample belongs in the capture windows.
    pub fn should_capture(&self, gate: &OrientationGate) -> bool {
        self.mode.one_shot() && gate.accepts_motion()
    }

    /// One periodic report tick over the trailing windows.
    pub fn report(&mut self, now_ms: u64, channels: &ChannelSet, gate: &OrientationGate) -> PeriodicOutcome {
        if !self.mode.periodic() {
            return PeriodicOutcome::default();
        }
        if self.mode.one_shot() && gate.state().is_collecting() {
            return PeriodicOutcome {
                yielded: true,
                ..Default::default()
            };
        }

        let features = match channels.trailing_features() {
            Ok(features) => features,
            Err(_) => {
                return PeriodicOutcome {
                    not_ready: true,
                    ..Default::default()
                }
            }
        };

        let moving = features.any_sd_above(self.movement_threshold);
        let edge = match (self.in_motion, moving) {
            (false, true) => Some(MotionEdge::Start),
            (true, false) => Some(MotionEdge::End),
            _ => None,
        };
        self.in_motion = moving;
        if let Some(edge) = edge {
            debug!("motion {:?} at {}ms (max sd {:.4})", edge, now_ms, features.max_sd());
        }

        let record = if moving || edge == Some(MotionEdge::End) {
            let label = if moving && gate.accepts_motion() {
                self.gesture_label.clone()
            } else {
                STILL_LABEL.to_string()
            };
            let armed = gate.state().is_collecting();
            Some(self.record(features, label, armed, now_ms, RecordOrigin::Periodic))
        } else {
            None
        };

        PeriodicOutcome {
            record,
            edge,
            yielded: false,
            not_ready: false,
        }
    }

    /// Label for what is happening right now.
    pub fn motion_label(&self, gate: &OrientationGate) -> &str {
        let gesture = gate.accepts_motion() && (self.mode.one_shot() || self.in_motion);
        if gesture {
            &self.gesture_label
        } else {
            STILL_LABEL
        }
    }

    pub fn in_motion(&self) -> bool {
        self.in_motion
    }

    pub fn mode(&self) -> CollectionMode {
        self.mode
    }

    fn record(
        &self,
        features: FeatureVector,
        label: String,
        armed: bool,
        now_ms: u64,
        origin: RecordOrigin,
    ) -> FeatureRecord {
        FeatureRecord {
            timestamp_ms: now_ms,
            features,
            label,
            device_id: self.device_id.clone(),
            armed,
            origin,
        }
    }
}
