//! # Calibration Module
//!
//! Stick calibration data consumed by the rescale engine.
//!
//! Each of the four stick axes carries a three point calibration: the raw
//! code at full negative deflection (`low`), at rest (`center`) and at full
//! positive deflection (`high`). The two halves of an axis are rescaled
//! independently around `center`, so an asymmetric gimbal still reaches the
//! full normalized range on both sides.
//!
//! Calibration is owned and persisted outside this crate. The rescale engine
//! reads it through [`CalibrationStore`] on every call and never caches it.
//!
//! ## Usage
//!
//! ```
//! use tx_analog::calibration::{CalibrationPoints, CalibrationStore, StaticCalibrationStore, StickCalibration};
//!
//! let sticks = StickCalibration::new([CalibrationPoints::new(1000, 2048, 3000); 4])?;
//! let store = StaticCalibrationStore::new(sticks, 100);
//!
//! assert_eq!(store.stick_calibration(0).center, 2048);
//! assert_eq!(store.stick_scale_percent(), 100);
//! # Ok::<(), tx_analog::calibration::CalibrationError>(())
//! ```

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::adc::channel::ADC_MAX_CODE;

/// Number of stick axes carrying a calibration triple (channels 0..=3).
pub const CALIBRATED_AXES: usize = 4;

/// Default per-profile stick scale in percent.
pub const DEFAULT_STICK_SCALE: u16 = 100;

/// Calibration table rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CalibrationError {
    /// Points are not strictly increasing, one half of the axis would have a
    /// zero or negative width.
    #[error("axis {axis}: calibration points must satisfy low < center < high (got {low}/{center}/{high})")]
    NotIncreasing {
        axis: usize,
        low: u16,
        center: u16,
        high: u16,
    },

    /// A point lies outside the 12-bit code range.
    #[error("axis {axis}: calibration point {value} exceeds 12-bit range")]
    OutOfRange { axis: usize, value: u16 },
}

/// Low / center / high raw codes of one stick axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "[u16; 3]")]
pub struct CalibrationPoints {
    /// Raw code at full negative deflection.
    pub low: u16,
    /// Raw code with the stick at rest.
    pub center: u16,
    /// Raw code at full positive deflection.
    pub high: u16,
}

impl Default for CalibrationPoints {
    fn default() -> Self {
        Self::new(0, 2048, ADC_MAX_CODE)
    }
}

impl From<[u16; 3]> for CalibrationPoints {
    fn from(points: [u16; 3]) -> Self {
        Self::new(points[0], points[1], points[2])
    }
}

impl CalibrationPoints {
    /// Creates a calibration triple without validating it.
    #[must_use]
    pub const fn new(low: u16, center: u16, high: u16) -> Self {
        Self { low, center, high }
    }

    /// Width of the negative half (`center - low`).
    #[inline]
    #[must_use]
    pub fn negative_span(&self) -> i32 {
        i32::from(self.center) - i32::from(self.low)
    }

    /// Width of the positive half (`high - center`).
    #[inline]
    #[must_use]
    pub fn positive_span(&self) -> i32 {
        i32::from(self.high) - i32::from(self.center)
    }

    /// Checks the triple for `axis`.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::OutOfRange`] if a point exceeds 4095 and
    /// [`CalibrationError::NotIncreasing`] unless `low < center < high`.
    pub fn validate(&self, axis: usize) -> Result<(), CalibrationError> {
        for value in [self.low, self.center, self.high] {
            if value > ADC_MAX_CODE {
                return Err(CalibrationError::OutOfRange { axis, value });
            }
        }

        if self.low >= self.center || self.center >= self.high {
            return Err(CalibrationError::NotIncreasing {
                axis,
                low: self.low,
                center: self.center,
                high: self.high,
            });
        }

        Ok(())
    }
}

/// Validated calibration for all four stick axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StickCalibration {
    axes: [CalibrationPoints; CALIBRATED_AXES],
}

impl StickCalibration {
    /// Builds a stick calibration, rejecting degenerate triples.
    ///
    /// # Errors
    ///
    /// Returns the first [`CalibrationError`] found, scanning axes in order.
    pub fn new(axes: [CalibrationPoints; CALIBRATED_AXES]) -> Result<Self, CalibrationError> {
        for (axis, points) in axes.iter().enumerate() {
            if let Err(e) = points.validate(axis) {
                warn!("Rejecting stick calibration: {}", e);
                return Err(e);
            }
        }
        Ok(Self { axes })
    }

    /// Returns the triple of `axis`. Panics if `axis >= CALIBRATED_AXES`.
    #[must_use]
    pub fn axis(&self, axis: usize) -> CalibrationPoints {
        self.axes[axis]
    }

    /// All four triples in channel order.
    #[must_use]
    pub fn axes(&self) -> &[CalibrationPoints; CALIBRATED_AXES] {
        &self.axes
    }
}

/// Read access to externally owned calibration data.
///
/// Implementations are queried on every rescale call.
#[cfg_attr(test, mockall::automock)]
pub trait CalibrationStore {
    /// Calibration triple of stick `axis` (0..=3).
    fn stick_calibration(&self, axis: usize) -> CalibrationPoints;

    /// Percentage scale applied to aileron and elevation for the active model.
    fn stick_scale_percent(&self) -> i32;
}

/// In-memory calibration store, typically built from the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticCalibrationStore {
    sticks: StickCalibration,
    stick_scale: u16,
}

impl Default for StaticCalibrationStore {
    fn default() -> Self {
        Self::new(StickCalibration::default(), DEFAULT_STICK_SCALE)
    }
}

impl StaticCalibrationStore {
    /// Creates a store from validated stick calibration and a scale in percent.
    #[must_use]
    pub fn new(sticks: StickCalibration, stick_scale: u16) -> Self {
        Self { sticks, stick_scale }
    }

    /// Replaces the active model's stick scale.
    pub fn set_stick_scale(&mut self, stick_scale: u16) {
        self.stick_scale = stick_scale;
    }

    /// Stick calibration held by this store.
    #[must_use]
    pub fn sticks(&self) -> &StickCalibration {
        &self.sticks
    }
}

impl CalibrationStore for StaticCalibrationStore {
    fn stick_calibration(&self, axis: usize) -> CalibrationPoints {
        self.sticks.axis(axis)
    }

    fn stick_scale_percent(&self) -> i32 {
        i32::from(self.stick_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== CalibrationPoints Tests ====================

    #[test]
    fn test_points_default_covers_full_range() {
        let points = CalibrationPoints::default();
        assert_eq!(points.low, 0);
        assert_eq!(points.center, 2048);
        assert_eq!(points.high, 4095);
        assert!(points.validate(0).is_ok());
    }

    #[test]
    fn test_points_from_array() {
        let points = CalibrationPoints::from([1000, 2048, 3000]);
        assert_eq!(points, CalibrationPoints::new(1000, 2048, 3000));
    }

    #[test]
    fn test_points_spans() {
        let points = CalibrationPoints::new(1000, 2048, 3000);
        assert_eq!(points.negative_span(), 1048);
        assert_eq!(points.positive_span(), 952);
    }

    #[test]
    fn test_points_zero_width_rejected() {
        let err = CalibrationPoints::new(2048, 2048, 3000).validate(1).unwrap_err();
        assert_eq!(
            err,
            CalibrationError::NotIncreasing {
                axis: 1,
                low: 2048,
                center: 2048,
                high: 3000
            }
        );

        assert!(CalibrationPoints::new(1000, 3000, 3000).validate(1).is_err());
    }

    #[test]
    fn test_points_inverted_rejected() {
        assert!(CalibrationPoints::new(3000, 2048, 1000).validate(0).is_err());
    }

    #[test]
    fn test_points_out_of_range_rejected() {
        let err = CalibrationPoints::new(0, 2048, 5000).validate(3).unwrap_err();
        assert_eq!(err, CalibrationError::OutOfRange { axis: 3, value: 5000 });
    }

    // ==================== StickCalibration Tests ====================

    #[test]
    fn test_stick_calibration_accepts_valid_axes() {
        let sticks = StickCalibration::new([CalibrationPoints::new(1000, 2048, 3000); 4]).unwrap();
        assert_eq!(sticks.axis(3).high, 3000);
        assert_eq!(sticks.axes().len(), CALIBRATED_AXES);
    }

    #[test]
    fn test_stick_calibration_reports_failing_axis() {
        let mut axes = [CalibrationPoints::default(); 4];
        axes[2] = CalibrationPoints::new(100, 100, 200);

        match StickCalibration::new(axes) {
            Err(CalibrationError::NotIncreasing { axis, .. }) => assert_eq!(axis, 2),
            other => panic!("Expected NotIncreasing on axis 2, got: {:?}", other),
        }
    }

    // ==================== Store Tests ====================

    #[test]
    fn test_static_store_default() {
        let store = StaticCalibrationStore::default();
        assert_eq!(store.stick_scale_percent(), 100);
        assert_eq!(store.stick_calibration(0), CalibrationPoints::default());
    }

    #[test]
    fn test_static_store_set_scale() {
        let mut store = StaticCalibrationStore::default();
        store.set_stick_scale(75);
        assert_eq!(store.stick_scale_percent(), 75);
    }

    #[test]
    fn test_points_deserialize_from_toml_array() {
        #[derive(Deserialize)]
        struct Wrapper {
            axis: CalibrationPoints,
        }

        let parsed: Wrapper = toml::from_str("axis = [10, 20, 30]").unwrap();
        assert_eq!(parsed.axis, CalibrationPoints::new(10, 20, 30));
    }
}
