// Gesture Features - Streaming IMU feature extraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Per-channel low-pass smoothing
//!
//! Two first-order filters are available: a bounded simple moving average
//! and a single-pole exponential filter. Both are O(1) per sample and never
//! allocate after construction; the moving average keeps a running total and
//! rebuilds it from the ring once every `length` samples.

use serde::{Deserialize, Serialize};

/// Smoothing mode for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Smoothing {
    /// Mean of the last `length` raw samples.
    MovingAverage { length: usize },
    /// `y ← α·x + (1-α)·y` with `α = dt/(τ+dt)`, `dt` being the sample interval.
    Exponential { time_constant_ms: f64 },
    /// Raw samples pass through untouched.
    None,
}

impl Default for Smoothing {
    fn default() -> Self {
        Self::MovingAverage { length: 5 }
    }
}

/// Running filter state for one channel.
#[derive(Debug, Clone)]
pub enum Smoother {
    MovingAverage(MovingAverage),
    Exponential(Exponential),
    PassThrough,
}

impl Smoother {
    /// Build the filter for `mode` at the given sample interval.
    pub fn new(mode: Smoothing, sample_interval_ms: u64) -> Self {
        match mode {
            Smoothing::MovingAverage { length } => Self::MovingAverage(MovingAverage::new(length)),
            Smoothing::Exponential { time_constant_ms } => Self::Exponential(
                Exponential::from_time_constant(time_constant_ms, sample_interval_ms as f64),
            ),
            Smoothing::None => Self::PassThrough,
        }
    }

    /// Feed one raw sample, get the smoothed value back.
    pub fn update(&mut self, raw: f64) -> f64 {
        match self {
            Self::MovingAverage(sma) => sma.update(raw),
            Self::Exponential(iir) => iir.update(raw),
            Self::PassThrough => raw,
        }
    }

    /// Return to the unseeded state.
    pub fn reset(&mut self) {
        match self {
            Self::MovingAverage(sma) => sma.reset(),
            Self::Exponential(iir) => iir.reset(),
            Self::PassThrough => {}
        }
    }
}

/// Bounded simple moving average.
///
/// Output is the mean of the last `min(length, seen)` samples, so it is
/// defined from the very first sample.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    buffer: Vec<f64>,
    index: usize,
    count: usize,
    /// Running total of the valid samples.
    sum: f64,
    /// Updates since the total was last recomputed from the ring.
    since_resum: usize,
}

impl MovingAverage {
    pub fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)],
            index: 0,
            count: 0,
            sum: 0.0,
            since_resum: 0,
        }
    }

    pub fn update(&mut self, value: f64) -> f64 {
        let len = self.buffer.len();
        let evicted = if self.count == len {
            self.buffer[self.index]
        } else {
            0.0
        };
        self.buffer[self.index] = value;
        self.index = (self.index + 1) % len;
        if self.count < len {
            self.count += 1;
        }

        // Re-sum once per window length so rounding error cannot pile up.
        self.since_resum += 1;
        if self.since_resum >= len {
            self.sum = self.buffer[..self.count].iter().sum();
            self.since_resum = 0;
        } else {
            self.sum += value - evicted;
        }
        self.average()
    }

    /// Current average, or 0.0 before the first sample.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }

    pub fn length(&self) -> usize {
        self.buffer.len()
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.count = 0;
        self.sum = 0.0;
        self.since_resum = 0;
    }
}

/// Single-pole exponential low-pass filter, seeded from the first reading.
#[derive(Debug, Clone)]
pub struct Exponential {
    alpha: f64,
    state: Option<f64>,
}

impl Exponential {
    /// Create with an explicit coefficient, clamped to [0, 1].
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            state: None,
        }
    }

    /// `α = dt/(τ+dt)`.
    pub fn from_time_constant(time_constant_ms: f64, dt_ms: f64) -> Self {
        let denom = time_constant_ms + dt_ms;
        let alpha = if denom > 0.0 { dt_ms / denom } else { 1.0 };
        Self::new(alpha)
    }

    pub fn update(&mut self, value: f64) -> f64 {
        let y = match self.state {
            None => value,
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
        };
        self.state = Some(y);
        y
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn value(&self) -> Option<f64> {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}
