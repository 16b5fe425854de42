// Gesture Features - Streaming IMU feature extraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Window reduction to (mean, standard deviation, range).
//!
//! Statistics are population moments: the variance divides by `n`, not
//! `n - 1`. The mean is taken first and the squared deviations are summed in
//! a second pass. A window of identical values reports exactly zero spread.
//!
//! Sums run over the values in ascending order, so two windows holding the
//! same multiset produce bit-identical features whatever the order the
//! samples arrived in.

use serde::{Deserialize, Serialize};

use crate::channel::ChannelKind;
use crate::error::FeatureError;
use crate::window::RingWindow;

/// Features of one channel's window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelFeatures {
    pub channel: ChannelKind,
    pub mean: f64,
    pub sd: f64,
    pub range: f64,
}

/// Features of every tracked channel, in configured channel order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    pub channels: Vec<ChannelFeatures>,
}

impl FeatureVector {
    /// Flatten to `[mean, sd, range]` per channel.
    pub fn fields(&self) -> Vec<f64> {
        self.channels
            .iter()
            .flat_map(|c| [c.mean, c.sd, c.range])
            .collect()
    }

    /// Largest per-channel standard deviation.
    pub fn max_sd(&self) -> f64 {
        self.channels.iter().map(|c| c.sd).fold(0.0, f64::max)
    }

    /// True if any channel's standard deviation is strictly above `threshold`.
    pub fn any_sd_above(&self, threshold: f64) -> bool {
        self.channels.iter().any(|c| c.sd > threshold)
    }

    pub fn get(&self, channel: ChannelKind) -> Option<&ChannelFeatures> {
        self.channels.iter().find(|c| c.channel == channel)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Reduce one channel's window.
///
/// # Errors
///
/// [`FeatureError::NotReady`] when the window holds no samples.
pub fn compute(channel: ChannelKind, window: &RingWindow) -> Result<ChannelFeatures, FeatureError> {
    let (mean, sd, range) = window
        .with_sorted(sorted_moments)
        .ok_or_else(|| FeatureError::NotReady {
            channel: channel.name().to_string(),
        })?;
    Ok(ChannelFeatures {
        channel,
        mean,
        sd,
        range,
    })
}

/// Reduce every window; fails on the first empty one.
pub fn compute_all<'a, I>(windows: I) -> Result<FeatureVector, FeatureError>
where
    I: IntoIterator<Item = (ChannelKind, &'a RingWindow)>,
{
    let channels = windows
        .into_iter()
        .map(|(kind, window)| compute(kind, window))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FeatureVector { channels })
}

/// (mean, population sd, range) of `values`, or `None` when empty.
///
/// Sorts a copy first; [`compute`] reuses the window's own buffer instead.
pub fn moments(values: &[f64]) -> Option<(f64, f64, f64)> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    sorted_moments(&sorted)
}

/// Moments of a slice already sorted ascending.
fn sorted_moments(sorted: &[f64]) -> Option<(f64, f64, f64)> {
    let (&min, _) = sorted.split_first()?;
    let (&max, _) = sorted.split_last()?;
    if max == min {
        return Some((min, 0.0, 0.0));
    }
    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;

    let sum_sq: f64 = sorted.iter().map(|v| (v - mean) * (v - mean)).sum();
    let sd = (sum_sq / n).sqrt();

    Some((mean, sd, max - min))
}
