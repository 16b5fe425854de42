// Gesture Features - Streaming IMU feature extraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Channel management
//!
//! A [`Channel`] bundles everything one scalar signal needs: its smoother,
//! a trailing window that always sees the latest samples, and a capture
//! window that only fills during a one-shot collection. [`ChannelSet`] keeps
//! the channels in configured order so features come out in a fixed layout.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::EngineConfig;
use crate::error::FeatureError;
use crate::features::{self, FeatureVector};
use crate::smoother::{Smoother, Smoothing};
use crate::window::RingWindow;

/// One scalar stream of the motion sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
}

impl ChannelKind {
    /// Accelerometer axes.
    pub const ACCEL: [ChannelKind; 3] = [Self::AccelX, Self::AccelY, Self::AccelZ];

    /// All six axes, accelerometer first.
    pub const ALL: [ChannelKind; 6] = [
        Self::AccelX,
        Self::AccelY,
        Self::AccelZ,
        Self::GyroX,
        Self::GyroY,
        Self::GyroZ,
    ];

    /// Short column name (`Ax` … `Gz`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::AccelX => "Ax",
            Self::AccelY => "Ay",
            Self::AccelZ => "Az",
            Self::GyroX => "Gx",
            Self::GyroY => "Gy",
            Self::GyroZ => "Gz",
        }
    }

    pub fn is_gyro(&self) -> bool {
        matches!(self, Self::GyroX | Self::GyroY | Self::GyroZ)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-channel configuration entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub kind: ChannelKind,
    /// Overrides the engine-wide smoothing mode for this channel.
    #[serde(default)]
    pub smoothing: Option<Smoothing>,
}

impl ChannelSpec {
    pub fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            smoothing: None,
        }
    }

    /// Create a spec with its own smoothing mode
    pub fn with_smoothing(kind: ChannelKind, smoothing: Smoothing) -> Self {
        Self {
            kind,
            smoothing: Some(smoothing),
        }
    }
}

/// One tracked signal: smoother plus windows.
#[derive(Debug, Clone)]
pub struct Channel {
    kind: ChannelKind,
    smoother: Smoother,
    /// Continuously maintained, feeds periodic telemetry.
    trailing: RingWindow,
    /// Filled only while collecting, feeds one-shot records.
    capture: RingWindow,
    /// Last smoothed value.
    last: Option<f64>,
}

impl Channel {
    pub fn new(
        kind: ChannelKind,
        smoothing: Smoothing,
        sample_interval_ms: u64,
        trailing_capacity: usize,
        capture_capacity: usize,
    ) -> Self {
        Self {
            kind,
            smoother: Smoother::new(smoothing, sample_interval_ms),
            trailing: RingWindow::new(trailing_capacity),
            capture: RingWindow::new(capture_capacity),
            last: None,
        }
    }

    /// Smooth a raw sample and record it in the trailing window.
    pub fn ingest(&mut self, raw: f64) -> f64 {
        let smoothed = self.smoother.update(raw);
        self.trailing.push(smoothed);
        self.last = Some(smoothed);
        smoothed
    }

    /// Record the last smoothed sample in the capture window.
    pub fn capture_latest(&mut self) {
        if let Some(value) = self.last {
            self.capture.push(value);
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn last_smoothed(&self) -> Option<f64> {
        self.last
    }

    pub fn trailing(&self) -> &RingWindow {
        &self.trailing
    }

    pub fn capture(&self) -> &RingWindow {
        &self.capture
    }

    pub fn clear_capture(&mut self) {
        self.capture.reset();
    }
}

/// Tracked channels in configured order.
#[derive(Debug, Clone)]
pub struct ChannelSet {
    channels: Vec<Channel>,
    /// Index of the channel driving the orientation gate.
    orientation: usize,
}

impl ChannelSet {
    /// Allocate every channel described by a validated configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        let channels = config
            .channels
            .iter()
            .map(|spec| {
                Channel::new(
                    spec.kind,
                    spec.smoothing.unwrap_or(config.smoothing),
                    config.sample_interval_ms,
                    config.periodic_window,
                    config.capture_capacity,
                )
            })
            .collect::<Vec<_>>();
        let orientation = channels
            .iter()
            .position(|c| c.kind == config.orientation_channel)
            .unwrap_or(0);
        Self {
            channels,
            orientation,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Channel> {
        self.channels.get_mut(index)
    }

    pub fn by_kind(&self, kind: ChannelKind) -> Option<&Channel> {
        self.channels.iter().find(|c| c.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Channel> {
        self.channels.iter_mut()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ChannelKind> + '_ {
        self.channels.iter().map(|c| c.kind)
    }

    pub fn orientation_index(&self) -> usize {
        self.orientation
    }

    /// Last smoothed value of the orientation channel.
    pub fn orientation(&self) -> Option<f64> {
        self.channels.get(self.orientation)?.last_smoothed()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Push every channel's latest smoothed sample into its capture window.
    pub fn capture_all(&mut self) {
        for channel in &mut self.channels {
            channel.capture_latest();
        }
    }

    pub fn clear_captures(&mut self) {
        for channel in &mut self.channels {
            channel.clear_capture();
        }
    }

    /// Smallest capture fill across channels.
    pub fn captured(&self) -> usize {
        self.channels
            .iter()
            .map(|c| c.capture.len())
            .min()
            .unwrap_or(0)
    }

    pub fn trailing_features(&self) -> Result<FeatureVector, FeatureError> {
        features::compute_all(self.channels.iter().map(|c| (c.kind, &c.trailing)))
    }

    pub fn capture_features(&self) -> Result<FeatureVector, FeatureError> {
        features::compute_all(self.channels.iter().map(|c| (c.kind, &c.capture)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig {
            smoothing: Smoothing::None,
            periodic_window: 3,
            capture_capacity: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_channel_kind_names() {
        let names: Vec<_> = ChannelKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, vec!["Ax", "Ay", "Az", "Gx", "Gy", "Gz"]);
        assert!(ChannelKind::GyroY.is_gyro());
        assert!(!ChannelKind::AccelZ.is_gyro());
    }

    #[test]
    fn test_channel_ingest_feeds_trailing_only() {
        let mut channel = Channel::new(ChannelKind::AccelX, Smoothing::None, 20, 3, 4);
        channel.ingest(1.0);
        channel.ingest(2.0);

        assert_eq!(channel.trailing().len(), 2);
        assert!(channel.capture().is_empty());
        assert_eq!(channel.last_smoothed(), Some(2.0));
    }

    #[test]
    fn test_channel_capture_latest() {
        let mut channel = Channel::new(ChannelKind::AccelX, Smoothing::None, 20, 3, 4);
        channel.capture_latest(); // nothing seen yet
        assert!(channel.capture().is_empty());

        channel.ingest(5.0);
        channel.capture_latest();
        assert_eq!(channel.capture().latest(), Some(5.0));

        channel.clear_capture();
        assert!(channel.capture().is_empty());
        assert_eq!(channel.capture().capacity(), 4);
    }

    #[test]
    fn test_channel_set_from_config() {
        let set = ChannelSet::from_config(&config());
        assert_eq!(set.len(), 3);
        assert_eq!(set.orientation_index(), 0);
        let kinds: Vec<_> = set.kinds().collect();
        assert_eq!(kinds, ChannelKind::ACCEL.to_vec());
    }

    #[test]
    fn test_channel_set_orientation_not_first() {
        let cfg = EngineConfig {
            orientation_channel: ChannelKind::AccelZ,
            ..config()
        };
        let mut set = ChannelSet::from_config(&cfg);
        assert_eq!(set.orientation_index(), 2);

        for (i, channel) in set.iter_mut().enumerate() {
            channel.ingest(i as f64);
        }
        assert_eq!(set.orientation(), Some(2.0));
    }

    #[test]
    fn test_channel_set_smoothing_override() {
        let cfg = EngineConfig {
            smoothing: Smoothing::MovingAverage { length: 2 },
            channels: vec![
                ChannelSpec::new(ChannelKind::AccelX),
                ChannelSpec::with_smoothing(ChannelKind::AccelY, Smoothing::None),
            ],
            ..config()
        };
        let mut set = ChannelSet::from_config(&cfg);
        for channel in set.iter_mut() {
            channel.ingest(0.0);
            channel.ingest(4.0);
        }
        assert_eq!(set.by_kind(ChannelKind::AccelX).unwrap().last_smoothed(), Some(2.0));
        assert_eq!(set.by_kind(ChannelKind::AccelY).unwrap().last_smoothed(), Some(4.0));
    }

    #[test]
    fn test_channel_set_capture_features() {
        let mut set = ChannelSet::from_config(&config());
        assert!(set.capture_features().is_err());

        for v in [1.0, 3.0] {
            for channel in set.iter_mut() {
                channel.ingest(v);
            }
            set.capture_all();
        }
        assert_eq!(set.captured(), 2);
        let fv = set.capture_features().unwrap();
        assert_eq!(fv.len(), 3);
        assert_eq!(fv.channels[0].mean, 2.0);

        set.clear_captures();
        assert_eq!(set.captured(), 0);
    }
}
