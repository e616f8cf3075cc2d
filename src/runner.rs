//! # Control Loop
//!
//! Drives a [`SamplingController`] the way the transmitter main loop does:
//! `process()` on a fixed cadence, periodic status output, optional telemetry
//! snapshots, until a shutdown future resolves.
//!
//! A synchronization anomaly ends the loop with
//! [`TxAnalogError::AcquisitionStalled`]. The controller never recovers on its
//! own, so the process exits and its supervisor restarts it, the host
//! equivalent of a watchdog reset.

use std::fmt::Write as _;
use std::future::Future;

use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use crate::adc::channel::channels;
use crate::adc::controller::{ProcessOutcome, SamplingController};
use crate::adc::engine::AcquisitionEngine;
use crate::calibration::CalibrationStore;
use crate::config::Config;
use crate::error::{Result, TxAnalogError};
use crate::telemetry::TelemetryLogger;

/// Shortest tick period the loop will schedule
const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Cadence of the control loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSettings {
    /// Period between `process()` calls
    pub process_interval: Duration,
    /// Completed rounds between status log lines
    pub status_interval_rounds: u64,
    /// Period between telemetry snapshots
    pub telemetry_interval: Duration,
    /// Dump every raw channel with each status line
    pub diagnostics: bool,
}

impl LoopSettings {
    /// Settings from the `[adc]` and `[telemetry]` sections
    ///
    /// Periods are at least 1 ms even if the config was never validated.
    #[must_use]
    pub fn from_config(config: &Config, diagnostics: bool) -> Self {
        Self {
            process_interval: Duration::from_millis(config.adc.process_interval_ms).max(MIN_TICK_PERIOD),
            status_interval_rounds: config.adc.status_interval_rounds.max(1),
            telemetry_interval: Duration::from_millis(config.telemetry.log_interval_ms).max(MIN_TICK_PERIOD),
            diagnostics,
        }
    }
}

/// Counters reported when the loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// `process()` calls made
    pub iterations: u64,
    /// Rounds completed by the controller
    pub rounds: u64,
    /// Anomalies counted by the controller
    pub anomalies: u64,
    /// Snapshots written to telemetry
    pub telemetry_records: u64,
}

/// Runs the control loop until `shutdown` resolves
///
/// Zero periods in `settings` are raised to 1 ms.
///
/// # Errors
///
/// Returns [`TxAnalogError::AcquisitionStalled`] on the first anomaly, or any
/// telemetry write error.
pub async fn run_control_loop<E, S, F>(
    adc: &mut SamplingController<E>,
    store: &S,
    settings: &LoopSettings,
    mut telemetry: Option<TelemetryLogger>,
    shutdown: F,
) -> Result<LoopStats>
where
    E: AcquisitionEngine,
    S: CalibrationStore + ?Sized,
    F: Future<Output = ()>,
{
    let mut process_tick = interval(settings.process_interval.max(MIN_TICK_PERIOD));
    process_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut telemetry_tick = interval(settings.telemetry_interval.max(MIN_TICK_PERIOD));
    telemetry_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut stats = LoopStats::default();
    let mut last_status_round = 0u64;

    loop {
        tokio::select! {
            _ = process_tick.tick() => {
                stats.iterations += 1;

                if adc.process() == ProcessOutcome::Anomaly {
                    error!(
                        "ADC round missed after {} rounds, stopping for restart",
                        adc.rounds_completed()
                    );
                    if let Some(logger) = telemetry.as_mut() {
                        logger.flush()?;
                    }
                    return Err(TxAnalogError::AcquisitionStalled {
                        anomalies: adc.anomaly_count(),
                    });
                }

                if adc.rounds_completed() - last_status_round >= settings.status_interval_rounds {
                    last_status_round = adc.rounds_completed();
                    log_status(adc, store);
                    if settings.diagnostics {
                        info!("\n{}", diagnostics_report(adc));
                    }
                }
            }

            _ = telemetry_tick.tick(), if telemetry.is_some() => {
                if let Some(logger) = telemetry.as_mut() {
                    logger.log(&adc.snapshot(store))?;
                    stats.telemetry_records += 1;
                }
            }

            _ = &mut shutdown => {
                info!("Shutdown requested after {} rounds", adc.rounds_completed());
                break;
            }
        }
    }

    if let Some(logger) = telemetry.as_mut() {
        logger.flush()?;
    }

    stats.rounds = adc.rounds_completed();
    stats.anomalies = adc.anomaly_count();
    Ok(stats)
}

fn log_status<E, S>(adc: &SamplingController<E>, store: &S)
where
    E: AcquisitionEngine,
    S: CalibrationStore + ?Sized,
{
    let voltage = adc.get_battery_voltage();
    info!(
        "{} rounds, battery {}.{:02} V, AIL {} ELE {} THR {} RUD {}",
        adc.rounds_completed(),
        voltage / 100,
        voltage % 100,
        adc.get_channel_packetdata(channels::AILERON, store),
        adc.get_channel_packetdata(channels::ELEVATION, store),
        adc.get_channel_packetdata(channels::THROTTLE, store),
        adc.get_channel_packetdata(channels::RUDDER, store),
    );
}

/// Battery voltage and every raw channel in hex, two channels per line
pub fn diagnostics_report<E: AcquisitionEngine>(adc: &SamplingController<E>) -> String {
    let voltage = adc.get_battery_voltage();
    let mut report = format!("ADC TEST  BAT: {}.{:02} V\n", voltage / 100, voltage % 100);

    for idx in 0..adc.channel_count() {
        let _ = write!(report, "{:02}={:04X}", idx, adc.get_channel(idx));
        report.push(if idx % 2 == 1 { '\n' } else { ' ' });
    }

    report
}
