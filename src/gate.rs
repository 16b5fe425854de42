// Gesture Features - Streaming IMU feature extraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Orientation gate
//!
//! Hysteresis state machine over the smoothed orientation channel. It decides
//! when the device is held in the gesture-capture orientation and applies
//! settle timers after every arm and disarm.
//!
//! ```text
//!              orientation > ARM
//!  Disarmed ─────────────────────────▶ ArmSettling
//!     ▲                                 │       │ now - armed_at ≥ ARM_SETTLE
//!     │ now - disarmed_at               │       ▼
//!     │   ≥ DISARM_SETTLE               │    Collecting
//!     │                                 │       │
//!  DisarmSettling ◀─────────────────────┴───────┘
//!                     orientation < DISARM
//! ```
//!
//! The gate only reports transitions; clearing windows and emitting records
//! is done by the [`CollectionController`](crate::collector::CollectionController).

use serde::{Deserialize, Serialize};

use crate::config::GateConfig;

/// Gesture-capture state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GestureState {
    /// Not in capture orientation
    #[default]
    Disarmed,
    /// Armed, waiting out the arm settle time
    ArmSettling,
    /// Capture windows are accepting samples
    Collecting,
    /// Disarmed, waiting out the disarm settle time
    DisarmSettling,
}

impl GestureState {
    /// ArmSettling or Collecting
    pub fn is_armed(&self) -> bool {
        matches!(self, Self::ArmSettling | Self::Collecting)
    }

    pub fn is_collecting(&self) -> bool {
        matches!(self, Self::Collecting)
    }
}

/// A state change reported by [`OrientationGate::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTransition {
    /// Disarmed → ArmSettling
    Armed,
    /// ArmSettling → Collecting
    CollectionStarted,
    /// ArmSettling or Collecting → DisarmSettling
    Disarmed { from: GestureState },
    /// DisarmSettling → Disarmed
    Settled,
}

/// Orientation hysteresis state machine.
#[derive(Debug, Clone)]
pub struct OrientationGate {
    config: GateConfig,
    state: GestureState,
    last_arm_ms: Option<u64>,
    last_disarm_ms: Option<u64>,
    emitted_this_cycle: bool,
    last_orientation: Option<f64>,
}

impl OrientationGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            state: GestureState::Disarmed,
            last_arm_ms: None,
            last_disarm_ms: None,
            emitted_this_cycle: false,
            last_orientation: None,
        }
    }

    /// Evaluate the guards for one smoothed orientation sample.
    ///
    /// At most one transition happens per call. While settling after an arm,
    /// the disarm guard is checked before the settle timer. Arm guards are
    /// ignored during DisarmSettling.
    pub fn update(&mut self, orientation: f64, now_ms: u64) -> Option<GateTransition> {
        self.last_orientation = Some(orientation);

        match self.state {
            GestureState::Disarmed => {
                if orientation > self.config.arm_threshold {
                    self.state = GestureState::ArmSettling;
                    self.last_arm_ms = Some(now_ms);
                    self.emitted_this_cycle = false;
                    return Some(GateTransition::Armed);
                }
                None
            }
            GestureState::ArmSettling => {
                if orientation < self.config.disarm_threshold {
                    return Some(self.disarm(now_ms));
                }
                if elapsed(self.last_arm_ms, now_ms) >= self.config.arm_settle_ms {
                    self.state = GestureState::Collecting;
                    return Some(GateTransition::CollectionStarted);
                }
                None
            }
            GestureState::Collecting => {
                if orientation < self.config.disarm_threshold {
                    return Some(self.disarm(now_ms));
                }
                None
            }
            GestureState::DisarmSettling => {
                if elapsed(self.last_disarm_ms, now_ms) >= self.config.disarm_settle_ms {
                    self.state = GestureState::Disarmed;
                    return Some(GateTransition::Settled);
                }
                None
            }
        }
    }

    fn disarm(&mut self, now_ms: u64) -> GateTransition {
        let from = self.state;
        self.state = GestureState::DisarmSettling;
        self.last_disarm_ms = Some(now_ms);
        GateTransition::Disarmed { from }
    }

    /// Collecting, but the orientation sits in the disarming zone.
    ///
    /// Motion seen here is the hand recentering, not a gesture.
    pub fn in_disarming_zone(&self) -> bool {
        self.state == GestureState::Collecting
            && self
                .last_orientation
                .is_some_and(|o| o < self.config.disarming_zone_threshold)
    }

    /// Collecting and outside the disarming zone.
    pub fn accepts_motion(&self) -> bool {
        self.state == GestureState::Collecting && !self.in_disarming_zone()
    }

    pub fn mark_emitted(&mut self) {
        self.emitted_this_cycle = true;
    }

    pub fn emitted_this_cycle(&self) -> bool {
        self.emitted_this_cycle
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn last_arm_ms(&self) -> Option<u64> {
        self.last_arm_ms
    }

    pub fn last_disarm_ms(&self) -> Option<u64> {
        self.last_disarm_ms
    }

    pub fn last_orientation(&self) -> Option<f64> {
        self.last_orientation
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

fn elapsed(since: Option<u64>, now_ms: u64) -> u64 {
    since.map_or(0, |t| now_ms.saturating_sub(t))
}
