// Gesture Features - Streaming IMU feature extraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Labeled feature records handed to the emission sink.

use serde::{Deserialize, Serialize};

use crate::channel::ChannelKind;
use crate::config::STILL_LABEL;
use crate::features::FeatureVector;

/// Which policy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    /// End of an arm → disarm cycle
    OneShot,
    /// Periodic movement telemetry
    Periodic,
}

/// One emitted feature record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Clock time at which the record was produced.
    pub timestamp_ms: u64,
    /// Per-channel features in configured channel order.
    pub features: FeatureVector,
    /// Gesture label or [`STILL_LABEL`].
    pub label: String,
    pub device_id: Option<String>,
    /// Gate was collecting when the record was produced.
    pub armed: bool,
    pub origin: RecordOrigin,
}

impl FeatureRecord {
    /// `[mean, sd, range]` per channel, in channel order.
    pub fn fields(&self) -> Vec<f64> {
        self.features.fields()
    }

    /// Column names matching [`FeatureRecord::fields`]: `meanAx, sdAx, rangeAx, …`.
    pub fn field_names<I>(channels: I) -> Vec<String>
    where
        I: IntoIterator<Item = ChannelKind>,
    {
        channels
            .into_iter()
            .flat_map(|kind| {
                let name = kind.name();
                [
                    format!("mean{}", name),
                    format!("sd{}", name),
                    format!("range{}", name),
                ]
            })
            .collect()
    }

    pub fn channels(&self) -> impl Iterator<Item = ChannelKind> + '_ {
        self.features.channels.iter().map(|c| c.channel)
    }

    pub fn is_still(&self) -> bool {
        self.label == STILL_LABEL
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
