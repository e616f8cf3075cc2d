//! # Sampling Controller
//!
//! Owns the sample buffer, the battery filter and the acquisition engine, and
//! exposes the channel accessors used by the radio encoder, UI and telemetry.
//!
//! ## Control Flow
//!
//! 1. [`SamplingController::init`] binds the engine to a zeroed buffer and
//!    arms the first round.
//! 2. The caller's loop invokes [`SamplingController::process`] periodically.
//!    A completed round feeds the battery filter and re-arms the engine.
//! 3. If no round completed since the last call, the controller counts an
//!    anomaly and does *not* re-arm. The engine stays idle so the caller
//!    notices and escalates (typically a watchdog reset).
//!
//! Reads never block and may observe a round mid-update.
//!
//! ## Usage
//!
//! ```
//! use tx_analog::adc::controller::{ProcessOutcome, SamplingController};
//! use tx_analog::adc::engine::SimulatedEngine;
//! use tx_analog::calibration::StaticCalibrationStore;
//!
//! let mut adc = SamplingController::init(SimulatedEngine::constant(2048), 11, 10);
//! assert_eq!(adc.process(), ProcessOutcome::RoundCompleted);
//!
//! let store = StaticCalibrationStore::default();
//! assert_eq!(adc.get_channel(4usize), 2048);
//! assert_eq!(adc.get_channel_rescaled(4, &store), 0);
//! assert_eq!(adc.get_channel_packetdata(4, &store), 2250);
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::battery::BatteryFilter;
use super::buffer::{RoundSignal, SampleBuffer};
use super::channel::{ChannelIndex, ChannelSelector, ADC_MAX_CODE, MAX_CHANNELS};
use super::engine::AcquisitionEngine;
use super::rescale::{packet_units, rescale};
use crate::calibration::CalibrationStore;

/// Result of one [`SamplingController::process`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// A round completed, the battery filter ran and the engine was re-armed.
    RoundCompleted,
    /// No round completed since the last call. Nothing was changed.
    Anomaly,
}

/// Point-in-time view of every channel, for UI and telemetry consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputSnapshot {
    /// Raw 12-bit codes in channel order.
    pub raw: Vec<u16>,
    /// Normalized values (-3200..=3200) in channel order.
    pub normalized: Vec<i32>,
    /// Filtered battery voltage, 1230 = 12.30 V.
    pub battery_voltage: u32,
    /// Rounds completed since init.
    pub rounds: u64,
    /// Synchronization anomalies since init.
    pub anomalies: u64,
}

/// Continuous round-robin sampling of all analog channels.
pub struct SamplingController<E: AcquisitionEngine> {
    engine: E,
    buffer: Arc<SampleBuffer>,
    complete: Arc<RoundSignal>,
    battery_channel: ChannelIndex,
    battery: BatteryFilter,
    rounds: u64,
    anomalies: u64,
}

impl<E: AcquisitionEngine> std::fmt::Debug for SamplingController<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplingController")
            .field("channels", &self.buffer.len())
            .field("battery_channel", &self.battery_channel)
            .field("battery", &self.battery)
            .field("rounds", &self.rounds)
            .field("anomalies", &self.anomalies)
            .finish_non_exhaustive()
    }
}

impl<E: AcquisitionEngine> SamplingController<E> {
    /// Configures `channel_count` channels and arms perpetual acquisition.
    ///
    /// `channel_count` is clamped to `1..=MAX_CHANNELS` and `battery_channel`
    /// to the last configured channel. All slots start at zero.
    pub fn init(mut engine: E, channel_count: usize, battery_channel: usize) -> Self {
        let count = channel_count.clamp(1, MAX_CHANNELS);
        if count != channel_count {
            warn!("adc: channel count {} clamped to {}", channel_count, count);
        }
        let battery_channel = ChannelIndex::clamped(battery_channel, count);

        info!(
            "adc: init ({} channels, battery on channel {})",
            count,
            battery_channel.get()
        );

        let buffer = Arc::new(SampleBuffer::new(count));
        let complete = Arc::new(RoundSignal::new());

        engine.configure(Arc::clone(&buffer), Arc::clone(&complete));
        debug!("adc: engine configured, arming first round");
        engine.arm();

        Self {
            engine,
            buffer,
            complete,
            battery_channel,
            battery: BatteryFilter::new(),
            rounds: 0,
            anomalies: 0,
        }
    }

    /// Services the acquisition pipeline, once per control loop iteration.
    pub fn process(&mut self) -> ProcessOutcome {
        if !self.complete.take() {
            self.anomalies += 1;
            warn!(
                "adc: no completed round since last process() (anomaly #{})",
                self.anomalies
            );
            return ProcessOutcome::Anomaly;
        }

        self.battery.update(self.buffer.load(self.battery_channel.get()));
        self.rounds += 1;

        self.engine.arm();
        ProcessOutcome::RoundCompleted
    }

    /// Raw code of a channel, `4095 - raw` if the id carries the inverted flag.
    ///
    /// Out-of-range indices read the last configured channel.
    pub fn get_channel(&self, id: impl Into<ChannelSelector>) -> u16 {
        let selector = id.into();
        let raw = self.buffer.load(self.resolve(usize::from(selector.index)).get());

        if selector.inverted {
            ADC_MAX_CODE - raw
        } else {
            raw
        }
    }

    /// Normalized value (-3200..=3200) of channel `idx`.
    ///
    /// The sample comes from the clamped slot, but calibration and stick scale
    /// follow the requested `idx`.
    pub fn get_channel_rescaled<S>(&self, idx: usize, store: &S) -> i32
    where
        S: CalibrationStore + ?Sized,
    {
        let raw = self.buffer.load(self.resolve(idx).get());
        rescale(raw, ChannelIndex::clamped(idx, MAX_CHANNELS), store)
    }

    /// Packet units (1500..=3000) of channel `idx`.
    pub fn get_channel_packetdata<S>(&self, idx: usize, store: &S) -> u16
    where
        S: CalibrationStore + ?Sized,
    {
        packet_units(self.get_channel_rescaled(idx, store))
    }

    /// Packet units of channels `0..N`, in order, for one radio frame.
    pub fn packet_channels<const N: usize, S>(&self, store: &S) -> [u16; N]
    where
        S: CalibrationStore + ?Sized,
    {
        std::array::from_fn(|idx| self.get_channel_packetdata(idx, store))
    }

    /// Filtered battery voltage, 1230 = 12.30 V.
    pub fn get_battery_voltage(&self) -> u32 {
        self.battery.voltage()
    }

    /// Filtered battery code.
    pub fn battery_raw_filtered(&self) -> u16 {
        self.battery.raw()
    }

    /// Captures every channel at once.
    pub fn snapshot<S>(&self, store: &S) -> InputSnapshot
    where
        S: CalibrationStore + ?Sized,
    {
        let raw = self.buffer.snapshot();
        let normalized = raw
            .iter()
            .enumerate()
            .map(|(idx, &code)| rescale(code, self.resolve(idx), store))
            .collect();

        InputSnapshot {
            raw,
            normalized,
            battery_voltage: self.get_battery_voltage(),
            rounds: self.rounds,
            anomalies: self.anomalies,
        }
    }

    /// Number of configured channels.
    pub fn channel_count(&self) -> usize {
        self.buffer.len()
    }

    /// Slot holding the battery sense reading.
    pub fn battery_channel(&self) -> usize {
        self.battery_channel.get()
    }

    /// Rounds consumed by `process()` since init.
    pub fn rounds_completed(&self) -> u64 {
        self.rounds
    }

    /// `process()` calls that found no completed round.
    pub fn anomaly_count(&self) -> u64 {
        self.anomalies
    }

    /// The acquisition engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the acquisition engine.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    fn resolve(&self, idx: usize) -> ChannelIndex {
        ChannelIndex::clamped(idx, self.buffer.len())
    }
}
