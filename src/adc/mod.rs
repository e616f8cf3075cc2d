//! # ADC Module
//!
//! Continuous sampling of the transmitter's analog inputs.
//!
//! This module handles:
//! - Round-robin acquisition of all channels into a shared sample buffer
//! - Round completion detection, re-arming and anomaly counting
//! - Three point stick calibration and rescaling to ±3200
//! - Packet unit conversion for the radio encoder
//! - Battery voltage smoothing

pub mod channel;
pub mod buffer;
pub mod engine;
pub mod rescale;
pub mod battery;
pub mod controller;
