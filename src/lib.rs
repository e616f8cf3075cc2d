//! # TX Analog Library
//!
//! Analog input core for handheld RC transmitters.
//!
//! This library samples stick axes, auxiliary switches and the battery sense
//! line, calibrates them into a common normalized range and converts them to
//! the pulse width units expected by the radio packet encoder.

pub mod config;
pub mod error;
pub mod calibration;
pub mod adc;
pub mod telemetry;
pub mod runner;
