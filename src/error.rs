//! # Error Types
//!
//! Custom error types for TX Analog using `thiserror`.
//!
//! The sampling and rescale paths never fail at runtime; everything here is
//! raised while loading configuration, validating calibration or writing
//! telemetry.

use thiserror::Error;

use crate::calibration::CalibrationError;

/// Main error type for TX Analog
#[derive(Debug, Error)]
pub enum TxAnalogError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Calibration table rejected at load time
    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    /// Acquisition lost synchronization with the sampling loop
    #[error("Acquisition stalled: no completed round after {anomalies} anomaly(s)")]
    AcquisitionStalled { anomalies: u64 },

    /// Telemetry logger errors
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for TX Analog
pub type Result<T> = std::result::Result<T, TxAnalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_error_converts() {
        let err: TxAnalogError = CalibrationError::NotIncreasing {
            axis: 2,
            low: 10,
            center: 10,
            high: 20,
        }
        .into();

        assert!(matches!(err, TxAnalogError::Calibration(_)));
        assert!(err.to_string().contains("axis 2"));
    }

    #[test]
    fn test_stalled_message() {
        let err = TxAnalogError::AcquisitionStalled { anomalies: 1 };
        assert!(err.to_string().starts_with("Acquisition stalled"));
    }

    #[test]
    fn test_io_error_message() {
        let err: TxAnalogError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.to_string(), "I/O error: missing");
    }
}
