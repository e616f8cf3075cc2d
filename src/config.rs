//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every key has a default, so an empty file (or no file at all) yields the
//! standard 11-channel layout with full-range stick calibration.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::adc::channel::{DEFAULT_BATTERY_CHANNEL, DEFAULT_CHANNEL_COUNT, MAX_CHANNELS};
use crate::calibration::{
    CalibrationPoints, StaticCalibrationStore, StickCalibration, CALIBRATED_AXES, DEFAULT_STICK_SCALE,
};
use crate::error::{Result, TxAnalogError};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub adc: AdcConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sampling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AdcConfig {
    #[serde(default = "default_channel_count")]
    pub channel_count: usize,

    #[serde(default = "default_battery_channel")]
    pub battery_channel: usize,

    #[serde(default = "default_process_interval_ms")]
    pub process_interval_ms: u64,

    #[serde(default = "default_status_interval_rounds")]
    pub status_interval_rounds: u64,
}

/// Stick calibration table
#[derive(Debug, Deserialize, Clone)]
pub struct CalibrationConfig {
    #[serde(default = "default_sticks")]
    pub sticks: Vec<CalibrationPoints>,
}

/// Active model profile
#[derive(Debug, Deserialize, Clone)]
pub struct ProfileConfig {
    #[serde(default = "default_stick_scale")]
    pub stick_scale: u16,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_interval_ms")]
    pub log_interval_ms: u64,
}

/// Log output configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for daily rolling log files. Empty logs to the console only.
    #[serde(default)]
    pub directory: String,
}

// Default value functions
fn default_channel_count() -> usize { DEFAULT_CHANNEL_COUNT }
fn default_battery_channel() -> usize { DEFAULT_BATTERY_CHANNEL }
fn default_process_interval_ms() -> u64 { 10 }
fn default_status_interval_rounds() -> u64 { 500 }

fn default_sticks() -> Vec<CalibrationPoints> { vec![CalibrationPoints::default(); CALIBRATED_AXES] }

fn default_stick_scale() -> u16 { DEFAULT_STICK_SCALE }

fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_interval_ms() -> u64 { 100 }

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            channel_count: default_channel_count(),
            battery_channel: default_battery_channel(),
            process_interval_ms: default_process_interval_ms(),
            status_interval_rounds: default_status_interval_rounds(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self { sticks: default_sticks() }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self { stick_scale: default_stick_scale() }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            log_interval_ms: default_log_interval_ms(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> TxAnalogError {
    TxAnalogError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tx_analog::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the calibration store described by `[calibration]` and `[profile]`
    ///
    /// # Errors
    ///
    /// Returns [`TxAnalogError::Calibration`] for a degenerate triple
    pub fn calibration_store(&self) -> Result<StaticCalibrationStore> {
        let sticks = self.stick_calibration()?;
        Ok(StaticCalibrationStore::new(sticks, self.profile.stick_scale))
    }

    fn stick_calibration(&self) -> Result<StickCalibration> {
        let axes: [CalibrationPoints; CALIBRATED_AXES] = self
            .calibration
            .sticks
            .as_slice()
            .try_into()
            .map_err(|_| {
                invalid(format!(
                    "calibration.sticks must list exactly {} axes (got {})",
                    CALIBRATED_AXES,
                    self.calibration.sticks.len()
                ))
            })?;

        Ok(StickCalibration::new(axes)?)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        // Validate channel layout
        if self.adc.channel_count == 0 || self.adc.channel_count > MAX_CHANNELS {
            return Err(invalid(format!("channel_count must be between 1 and {}", MAX_CHANNELS)));
        }

        if self.adc.battery_channel >= self.adc.channel_count {
            return Err(invalid(format!(
                "battery_channel {} is out of bounds (must be below channel_count {})",
                self.adc.battery_channel, self.adc.channel_count
            )));
        }

        // Validate timing fields
        if self.adc.process_interval_ms == 0 || self.adc.process_interval_ms > 1000 {
            return Err(invalid("process_interval_ms must be between 1 and 1000"));
        }

        if self.adc.status_interval_rounds == 0 {
            return Err(invalid("status_interval_rounds must be greater than 0"));
        }

        // Validate calibration table
        self.stick_calibration()?;

        if self.profile.stick_scale == 0 || self.profile.stick_scale > 200 {
            return Err(invalid("stick_scale must be between 1 and 200"));
        }

        // Validate telemetry configuration
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.log_interval_ms == 0 || self.telemetry.log_interval_ms > 60000 {
            return Err(invalid("log_interval_ms must be between 1 and 60000"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        Ok(())
    }
}
