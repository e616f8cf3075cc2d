//! # TX Analog
//!
//! Host-side runner for the transmitter analog core.
//!
//! Samples a simulated converter through the same controller, calibration and
//! rescale path the transmitter uses, logging battery voltage and packet units
//! until Ctrl+C.
//!
//! ```bash
//! tx-analog --config config/default.toml
//! tx-analog --diagnostics
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tx_analog::adc::channel::{channels, ADC_MAX_CODE};
use tx_analog::adc::controller::SamplingController;
use tx_analog::adc::engine::SimulatedEngine;
use tx_analog::config::{Config, LoggingConfig};
use tx_analog::runner::{run_control_loop, LoopSettings};
use tx_analog::telemetry::TelemetryLogger;

/// Battery code fed by the simulated converter (about 8.39 V)
const DEMO_BATTERY_CODE: u16 = 3520;

/// Rounds for a simulated stick to sweep from one end to the other
const DEMO_SWEEP_ROUNDS: u64 = 1000;

/// Command line options
#[derive(Parser, Debug)]
#[command(name = "tx-analog")]
#[command(about = "Transmitter analog input core on a simulated converter", long_about = None)]
#[command(version)]
struct CliArgs {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dump battery voltage and raw channels with each status line
    #[arg(short, long)]
    diagnostics: bool,
}

/// Console logging, plus a daily rolling file when a directory is configured
///
/// The returned guard must live until exit so buffered lines reach the file.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer());

    if config.directory.is_empty() {
        registry.init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&config.directory, "tx-analog.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    registry
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();

    Some(guard)
}

/// Triangle sweep across the full code range, `period` rounds per cycle
fn sweep(phase: u64, period: u64) -> u16 {
    let half = period / 2;
    let position = phase % period;
    let ramp = if position < half { position } else { period - position };
    (ramp * u64::from(ADC_MAX_CODE) / half) as u16
}

/// Simulated converter input: sweeping sticks, toggling switches, steady battery
fn demo_sample(channel: usize, round: u64, battery_channel: usize) -> u16 {
    if channel == battery_channel {
        return DEMO_BATTERY_CODE;
    }

    match channel {
        channels::AILERON..=channels::RUDDER => {
            sweep(round + channel as u64 * DEMO_SWEEP_ROUNDS / 4, DEMO_SWEEP_ROUNDS * 2)
        }
        _ if (round / DEMO_SWEEP_ROUNDS + channel as u64) % 2 == 0 => 0,
        _ => ADC_MAX_CODE,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let _log_guard = init_logging(&config.logging);

    info!("TX Analog v{} starting...", env!("CARGO_PKG_VERSION"));
    match &cli.config {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No config file given, using defaults"),
    }

    let store = config.calibration_store()?;

    let battery_channel = config.adc.battery_channel;
    let engine = SimulatedEngine::new(move |channel, round| demo_sample(channel, round, battery_channel));
    let mut adc = SamplingController::init(engine, config.adc.channel_count, battery_channel);

    let telemetry = if config.telemetry.enabled {
        Some(TelemetryLogger::from_config(&config.telemetry)?)
    } else {
        None
    };

    let settings = LoopSettings::from_config(&config, cli.diagnostics);
    info!(
        "Processing every {} ms, press Ctrl+C to exit",
        settings.process_interval.as_millis()
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let stats = run_control_loop(&mut adc, &store, &settings, telemetry, shutdown).await?;
    info!(
        "Stopped after {} rounds ({} telemetry records)",
        stats.rounds, stats.telemetry_records
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(list: &[&str]) -> std::result::Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("tx-analog").chain(list.iter().copied()))
    }

    #[test]
    fn test_parse_no_args() {
        let cli = parse(&[]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.diagnostics);
    }

    #[test]
    fn test_parse_config_and_diagnostics() {
        let cli = parse(&["--config", "tx.toml", "-d"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("tx.toml")));
        assert!(cli.diagnostics);
    }

    #[test]
    fn test_parse_short_config() {
        let cli = parse(&["-c", "bench.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("bench.toml")));
        assert!(!cli.diagnostics);
    }

    #[test]
    fn test_parse_config_without_path() {
        assert!(parse(&["--config"]).is_err());
    }

    #[test]
    fn test_parse_unknown_argument() {
        assert!(parse(&["--verbose"]).is_err());
    }

    #[test]
    fn test_sweep_endpoints() {
        assert_eq!(sweep(0, 2000), 0);
        assert_eq!(sweep(500, 2000), 2047);
        assert_eq!(sweep(1000, 2000), ADC_MAX_CODE);
        assert_eq!(sweep(1500, 2000), 2047);
        assert_eq!(sweep(2000, 2000), 0);
    }

    #[test]
    fn test_demo_sample_stays_in_range() {
        for round in (0..5000).step_by(37) {
            for channel in 0..11 {
                assert!(demo_sample(channel, round, channels::BATTERY) <= ADC_MAX_CODE);
            }
        }
    }

    #[test]
    fn test_demo_battery_is_steady() {
        assert_eq!(demo_sample(channels::BATTERY, 0, channels::BATTERY), DEMO_BATTERY_CODE);
        assert_eq!(demo_sample(channels::BATTERY, 12345, channels::BATTERY), DEMO_BATTERY_CODE);
        assert_eq!(demo_sample(3, 7, 3), DEMO_BATTERY_CODE);
    }

    #[test]
    fn test_demo_switches_toggle() {
        let first = demo_sample(channels::AUX1, 0, channels::BATTERY);
        let later = demo_sample(channels::AUX1, DEMO_SWEEP_ROUNDS, channels::BATTERY);
        assert_ne!(first, later);
        assert!(first == 0 || first == ADC_MAX_CODE);
    }
}
