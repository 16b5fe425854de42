// Gesture Features - Streaming IMU feature extraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! High-level engine API
//!
//! [`GestureEngine`] owns every piece of state: the channels with their
//! smoothers and windows, the orientation gate, the collection controller
//! and the counters. A driver calls [`GestureEngine::tick`] with the current
//! time; the engine decides on its own whether sampling and reporting are
//! due.
//!
//! # Example
//!
//! ```rust
//! use gesture_features::{EngineConfig, GestureEngine, ImuReading, MemorySink, ScriptedSource};
//!
//! let mut engine = GestureEngine::new(EngineConfig::with_label("wave")).unwrap();
//! let mut source: ScriptedSource = (0..10).map(|_| ImuReading::accel(0.0, 0.0, 1.0)).collect();
//! let mut sink = MemorySink::new();
//!
//! for i in 0..10 {
//!     engine.tick(i * 20, &mut source, &mut sink);
//! }
//! assert_eq!(engine.metrics().samples_processed, 10);
//! assert!(sink.is_empty());
//! ```

use log::{debug, info, trace};

use crate::channel::ChannelSet;
use crate::collector::{CollectionController, CycleOutcome, MotionEdge, PeriodicOutcome};
use crate::config::EngineConfig;
use crate::error::{ConfigError, GestureError, Result};
use crate::gate::{GateTransition, GestureState, OrientationGate};
use crate::metrics::EngineMetrics;
use crate::record::FeatureRecord;
use crate::source::{Clock, EmissionSink, ImuReading, ManualClock, SensorSource};

/// What one accepted reading did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleOutcome {
    pub transition: Option<GateTransition>,
    /// Set when the reading ended a one-shot cycle.
    pub cycle: Option<CycleOutcome>,
    /// The reading went into the capture windows.
    pub captured: bool,
}

impl SampleOutcome {
    /// The one-shot record, if this reading completed a cycle.
    pub fn record(&self) -> Option<&FeatureRecord> {
        match &self.cycle {
            Some(CycleOutcome::Emitted(record)) => Some(record),
            _ => None,
        }
    }
}

/// What one call to [`GestureEngine::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// A reading was consumed.
    pub sampled: bool,
    /// Sampling was due but the sensor had nothing usable.
    pub sensor_unavailable: bool,
    /// The periodic report ran.
    pub reported: bool,
    pub transition: Option<GateTransition>,
    pub edge: Option<MotionEdge>,
    /// Records handed to the sink.
    pub emitted: usize,
}

/// Streaming feature extraction engine
#[derive(Debug, Clone)]
pub struct GestureEngine {
    config: EngineConfig,
    channels: ChannelSet,
    gate: OrientationGate,
    controller: CollectionController,
    metrics: EngineMetrics,
    last_sample_ms: Option<u64>,
    last_report_ms: Option<u64>,
}

impl GestureEngine {
    /// Create an engine from a configuration
    ///
    /// # Errors
    ///
    /// Returns the first problem found by [`EngineConfig::validate`].
    pub fn new(config: EngineConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        info!(
            "gesture engine: {} channels, orientation {}, mode {:?}, units {:?}/{:?}",
            config.channels.len(),
            config.orientation_channel,
            config.mode,
            config.units.accel,
            config.units.gyro
        );

        Ok(Self {
            channels: ChannelSet::from_config(&config),
            gate: OrientationGate::new(config.gate),
            controller: CollectionController::new(&config),
            metrics: EngineMetrics::new(),
            last_sample_ms: None,
            last_report_ms: None,
            config,
        })
    }

    /// Run both cadences once at time `now_ms`
    ///
    /// # Arguments
    ///
    /// * `now_ms` - Current time from a monotonic clock
    /// * `source` - Polled only when sampling is due
    /// * `sink` - Receives every record produced, in order
    ///
    /// A missing or unusable reading does not advance the sampling
    /// timestamp, so the next tick polls again.
    pub fn tick<S, K>(&mut self, now_ms: u64, source: &mut S, sink: &mut K) -> TickOutcome
    where
        S: SensorSource + ?Sized,
        K: EmissionSink + ?Sized,
    {
        let mut outcome = TickOutcome::default();

        if self.sample_due(now_ms) {
            match source.poll() {
                Some(reading) => {
                    if let Ok(sample) = self.process_reading(now_ms, &reading) {
                        self.last_sample_ms = Some(now_ms);
                        outcome.sampled = true;
                        outcome.transition = sample.transition;
                        if let Some(CycleOutcome::Emitted(record)) = sample.cycle {
                            sink.emit(record);
                            outcome.emitted += 1;
                        }
                    } else {
                        outcome.sensor_unavailable = true;
                    }
                }
                None => {
                    self.mark_unavailable(now_ms);
                    outcome.sensor_unavailable = true;
                }
            }
        }

        match self.last_report_ms {
            None => self.last_report_ms = Some(now_ms),
            Some(last) if now_ms.saturating_sub(last) >= self.config.report_interval_ms => {
                self.last_report_ms = Some(now_ms);
                let periodic = self.report(now_ms);
                outcome.reported = true;
                outcome.edge = periodic.edge;
                if let Some(record) = periodic.record {
                    sink.emit(record);
                    outcome.emitted += 1;
                }
            }
            Some(_) => {}
        }

        outcome
    }

    fn sample_due(&self, now_ms: u64) -> bool {
        self.last_sample_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= self.config.sample_interval_ms)
    }

    fn mark_unavailable(&mut self, now_ms: u64) {
        self.metrics.sensor_unavailable += 1;
        trace!("no usable reading at {}ms", now_ms);
    }

    /// Feed one reading through smoothing, the gate and the capture windows
    ///
    /// # Errors
    ///
    /// Returns [`GestureError::SensorUnavailable`] if the reading lacks a
    /// tracked channel or holds a non-finite value. Nothing is modified in
    /// that case.
    pub fn process_reading(&mut self, now_ms: u64, reading: &ImuReading) -> Result<SampleOutcome> {
        let usable = self
            .channels
            .kinds()
            .all(|kind| reading.value(kind).is_some_and(f64::is_finite));
        if !usable {
            self.mark_unavailable(now_ms);
            return Err(GestureError::SensorUnavailable);
        }

        for channel in self.channels.iter_mut() {
            if let Some(raw) = reading.value(channel.kind()) {
                channel.ingest(raw);
            }
        }
        self.metrics.samples_processed += 1;

        let mut outcome = SampleOutcome::default();
        if let Some(orientation) = self.channels.orientation() {
            outcome.transition = self.gate.update(orientation, now_ms);
        }

        if let Some(transition) = outcome.transition {
            if transition == GateTransition::Armed {
                self.metrics.cycles_started += 1;
            }
            outcome.cycle =
                self.controller
                    .on_transition(transition, now_ms, &mut self.channels, &mut self.gate);
            match &outcome.cycle {
                Some(CycleOutcome::Emitted(_)) => {
                    self.metrics.cycles_completed += 1;
                    self.metrics.one_shot_records += 1;
                }
                Some(CycleOutcome::Aborted { .. }) => self.metrics.cycles_aborted += 1,
                None => {}
            }
        }

        if self.controller.should_capture(&self.gate) {
            self.channels.capture_all();
            outcome.captured = true;
        }

        Ok(outcome)
    }

    /// Run the periodic path now, ignoring the report cadence
    pub fn report(&mut self, now_ms: u64) -> PeriodicOutcome {
        let outcome = self.controller.report(now_ms, &self.channels, &self.gate);

        self.metrics.reports += 1;
        if outcome.yielded {
            self.metrics.reports_yielded += 1;
        }
        if outcome.not_ready {
            self.metrics.reports_not_ready += 1;
        }
        match outcome.edge {
            Some(MotionEdge::Start) => self.metrics.motion_starts += 1,
            Some(MotionEdge::End) => self.metrics.motion_ends += 1,
            None => {}
        }
        if let Some(record) = &outcome.record {
            self.metrics.periodic_records += 1;
            debug!("periodic record '{}' at {}ms", record.label, now_ms);
        }

        outcome
    }

    /// Tick once at the clock's current time
    pub fn poll<C, S, K>(&mut self, clock: &C, source: &mut S, sink: &mut K) -> TickOutcome
    where
        C: Clock + ?Sized,
        S: SensorSource + ?Sized,
        K: EmissionSink + ?Sized,
    {
        self.tick(clock.now_ms(), source, sink)
    }

    /// Tick `ticks` times, advancing `clock` by `step_ms` after each tick.
    ///
    /// Returns the number of records handed to the sink.
    pub fn run<S, K>(
        &mut self,
        clock: &ManualClock,
        step_ms: u64,
        ticks: usize,
        source: &mut S,
        sink: &mut K,
    ) -> usize
    where
        S: SensorSource + ?Sized,
        K: EmissionSink + ?Sized,
    {
        let mut emitted = 0;
        for _ in 0..ticks {
            emitted += self.poll(clock, source, sink).emitted;
            clock.advance(step_ms);
        }
        emitted
    }

    pub fn state(&self) -> GestureState {
        self.gate.state()
    }

    /// Gesture label while a gesture is in progress, `"still"` otherwise
    pub fn motion_label(&self) -> &str {
        self.controller.motion_label(&self.gate)
    }

    /// Periodic telemetry currently sees movement
    pub fn in_motion(&self) -> bool {
        self.controller.in_motion()
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    pub fn gate(&self) -> &OrientationGate {
        &self.gate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelKind;
    use crate::config::{CollectionMode, GateConfig, STILL_LABEL};
    use crate::smoother::Smoothing;
    use crate::source::{MemorySink, ScriptedSource};

    fn config() -> EngineConfig {
        EngineConfig {
            smoothing: Smoothing::None,
            gate: GateConfig {
                arm_settle_ms: 100,
                disarm_settle_ms: 100,
                ..Default::default()
            },
            gesture_label: "wave".to_string(),
            ..Default::default()
        }
    }

    fn at(x: f64) -> ImuReading {
        ImuReading::accel(x, 0.0, 1.0)
    }

    #[test]
    fn test_engine_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<GestureEngine>();
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = GestureEngine::new(EngineConfig::with_label("still"));
        assert!(matches!(result, Err(ConfigError::InvalidLabel(_))));
    }

    #[test]
    fn test_sampling_cadence() {
        let mut engine = GestureEngine::new(config()).unwrap();
        let mut source: ScriptedSource = (0..5).map(|_| at(0.0)).collect();
        let mut sink = MemorySink::new();

        assert!(engine.tick(0, &mut source, &mut sink).sampled);
        assert!(!engine.tick(10, &mut source, &mut sink).sampled);
        assert!(engine.tick(20, &mut source, &mut sink).sampled);
        assert!(!engine.tick(39, &mut source, &mut sink).sampled);
        assert!(engine.tick(45, &mut source, &mut sink).sampled);
        assert_eq!(engine.metrics().samples_processed, 3);
        assert_eq!(source.remaining(), 2);
    }

    #[test]
    fn test_sensor_unavailable_retries_next_tick() {
        let mut engine = GestureEngine::new(config()).unwrap();
        let mut source = ScriptedSource::new();
        source.push(at(0.0));
        source.push_gap();
        source.push(at(0.0));
        let mut sink = MemorySink::new();

        engine.tick(0, &mut source, &mut sink);
        let outcome = engine.tick(20, &mut source, &mut sink);
        assert!(outcome.sensor_unavailable);
        assert!(!outcome.sampled);
        assert_eq!(engine.channels().get(0).unwrap().trailing().len(), 1);

        // Sampling timestamp was not advanced: polled again immediately.
        assert!(engine.tick(21, &mut source, &mut sink).sampled);
        assert_eq!(engine.metrics().sensor_unavailable, 1);
        assert_eq!(engine.metrics().samples_processed, 2);
    }

    #[test]
    fn test_missing_gyro_is_unavailable() {
        let mut engine = GestureEngine::new(EngineConfig {
            gesture_label: "wave".to_string(),
            ..EngineConfig::six_axis()
        })
        .unwrap();

        let result = engine.process_reading(0, &at(0.0));
        assert!(matches!(result, Err(GestureError::SensorUnavailable)));
        assert!(engine.channels().iter().all(|c| c.trailing().is_empty()));

        let full = ImuReading::six_axis([0.0, 0.0, 1.0], [1.0, 2.0, 3.0]);
        assert!(engine.process_reading(20, &full).is_ok());
        let gz = engine.channels().by_kind(ChannelKind::GyroZ).unwrap();
        assert_eq!(gz.last_smoothed(), Some(3.0));
    }

    #[test]
    fn test_non_finite_reading_is_unavailable() {
        let mut engine = GestureEngine::new(config()).unwrap();
        let result = engine.process_reading(0, &ImuReading::accel(f64::NAN, 0.0, 0.0));
        assert!(result.is_err());
        assert_eq!(engine.metrics().sensor_unavailable, 1);
        assert_eq!(engine.metrics().samples_processed, 0);
    }

    #[test]
    fn test_report_cadence() {
        let mut engine = GestureEngine::new(config()).unwrap();
        let mut source: ScriptedSource = (0..20).map(|_| at(0.0)).collect();
        let mut sink = MemorySink::new();

        assert!(!engine.tick(0, &mut source, &mut sink).reported);
        assert!(!engine.tick(80, &mut source, &mut sink).reported);
        assert!(engine.tick(100, &mut source, &mut sink).reported);
        assert!(!engine.tick(180, &mut source, &mut sink).reported);
        assert!(engine.tick(200, &mut source, &mut sink).reported);
        assert_eq!(engine.metrics().reports, 2);
    }

    #[test]
    fn test_one_shot_cycle_through_ticks() {
        let mut engine = GestureEngine::new(EngineConfig {
            mode: CollectionMode::OneShot,
            ..config()
        })
        .unwrap();
        let mut source = ScriptedSource::new();
        let mut sink = MemorySink::new();

        // 0..=100: armed and settling, 120..=200: collecting, 220: disarm.
        for _ in 0..11 {
            source.push(at(0.5));
        }
        source.push(at(0.1));
        let clock = ManualClock::new(0);
        let emitted = engine.run(&clock, 20, 12, &mut source, &mut sink);

        assert_eq!(emitted, 1);
        let record = &sink.records()[0];
        assert_eq!(record.label, "wave");
        assert_eq!(record.timestamp_ms, 220);
        assert_eq!(record.features.channels[0].mean, 0.5);
        assert_eq!(engine.state(), GestureState::DisarmSettling);
        assert_eq!(engine.metrics().cycles_started, 1);
        assert_eq!(engine.metrics().cycles_completed, 1);
        assert_eq!(engine.metrics().one_shot_records, 1);
    }

    #[test]
    fn test_capture_only_while_collecting() {
        let mut engine = GestureEngine::new(config()).unwrap();

        let armed = engine.process_reading(0, &at(0.5)).unwrap();
        assert_eq!(armed.transition, Some(GateTransition::Armed));
        assert!(!armed.captured);

        let started = engine.process_reading(100, &at(0.5)).unwrap();
        assert_eq!(started.transition, Some(GateTransition::CollectionStarted));
        assert!(started.captured);

        // Disarming zone: not captured, no transition.
        let zone = engine.process_reading(120, &at(0.2)).unwrap();
        assert!(zone.transition.is_none());
        assert!(!zone.captured);
        assert_eq!(engine.motion_label(), STILL_LABEL);
        assert_eq!(engine.channels().captured(), 1);
    }

    #[test]
    fn test_poll_uses_clock() {
        let mut engine = GestureEngine::new(config()).unwrap();
        let mut source: ScriptedSource = std::iter::once(at(0.0)).collect();
        let mut sink: Vec<FeatureRecord> = Vec::new();
        let clock = ManualClock::new(500);

        let outcome = engine.poll(&clock, &mut source, &mut sink);
        assert!(outcome.sampled);
        assert_eq!(engine.gate().last_orientation(), Some(0.0));
    }
}
