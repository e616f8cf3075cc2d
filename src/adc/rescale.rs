//! # Rescale Engine
//!
//! Converts raw 12-bit codes into the normalized range shared by all
//! channels, and normalized values into packet units for the radio encoder.
//!
//! ## Normalized Range
//!
//! Every channel maps into `-3200..=3200`:
//!
//! - Stick axes (0-3) use their calibration triple. The offset from `center`
//!   is divided by the width of the half it falls in, so both halves reach
//!   ±3200 even when the gimbal is asymmetric.
//! - Aileron and elevation are then multiplied by the model's stick scale
//!   (percent).
//! - Other channels map linearly, 0 → -3200 and 4095 → 3198.
//!
//! The result is always clamped, which also contains bad scale factors.
//!
//! ## Packet Units
//!
//! The radio encoder expects pulse widths × 1.5: 1000 µs (1500) to 2000 µs
//! (3000), centered at 2250. `packet = 15 * v / 64 + 2250` with truncating
//! division, and it has to match the encoder bit for bit.
//!
//! ```
//! use tx_analog::adc::rescale::packet_units;
//!
//! assert_eq!(packet_units(-3200), 1500);
//! assert_eq!(packet_units(0), 2250);
//! assert_eq!(packet_units(3200), 3000);
//! ```

use super::channel::ChannelIndex;
use crate::calibration::{CalibrationPoints, CalibrationStore};

/// Half width of the normalized range.
pub const RESCALE_TARGET_RANGE: i32 = 3200;

/// Packet value for a centered channel.
pub const PACKET_CENTER: i32 = 2250;

/// Packet value at -3200.
pub const PACKET_MIN: u16 = 1500;

/// Packet value at +3200.
pub const PACKET_MAX: u16 = 3000;

/// Rescales `raw` from `channel` into `-3200..=3200`.
///
/// The calibration store is read on every call.
pub fn rescale<S>(raw: u16, channel: ChannelIndex, store: &S) -> i32
where
    S: CalibrationStore + ?Sized,
{
    let raw = i32::from(raw);

    let mut value = if channel.is_calibrated_axis() {
        rescale_calibrated(raw, store.stick_calibration(channel.get()))
    } else {
        rescale_linear(raw)
    };

    if channel.is_scaled_axis() {
        value = value.saturating_mul(store.stick_scale_percent()) / 100;
    }

    value.clamp(-RESCALE_TARGET_RANGE, RESCALE_TARGET_RANGE)
}

/// Piecewise-linear map around the calibrated center (unclamped).
///
/// A half with zero or negative width cannot be divided by; such a half
/// saturates to the edge the deviation points at. Validated calibration never
/// takes that path.
#[must_use]
pub fn rescale_calibrated(raw: i32, points: CalibrationPoints) -> i32 {
    let value = raw - i32::from(points.center);

    let divider = if value < 0 {
        points.negative_span()
    } else {
        points.positive_span()
    };

    if divider <= 0 {
        return value.signum() * RESCALE_TARGET_RANGE;
    }

    (value * RESCALE_TARGET_RANGE) / divider
}

/// Uncalibrated map of `0..=4095` onto `-3200..=3198`.
#[inline]
#[must_use]
pub fn rescale_linear(raw: i32) -> i32 {
    (RESCALE_TARGET_RANGE * 2 * raw) / 4096 - RESCALE_TARGET_RANGE
}

/// Converts a normalized value into packet units.
///
/// Input outside `-3200..=3200` is clamped first.
#[inline]
#[must_use]
pub fn packet_units(value: i32) -> u16 {
    let value = value.clamp(-RESCALE_TARGET_RANGE, RESCALE_TARGET_RANGE);
    ((15 * value) / 64 + PACKET_CENTER) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adc::channel::{channels, DEFAULT_CHANNEL_COUNT};
    use crate::calibration::{MockCalibrationStore, StaticCalibrationStore, StickCalibration};

    fn ch(index: usize) -> ChannelIndex {
        ChannelIndex::clamped(index, DEFAULT_CHANNEL_COUNT)
    }

    fn store_with(points: CalibrationPoints, scale: u16) -> StaticCalibrationStore {
        StaticCalibrationStore::new(StickCalibration::new([points; 4]).unwrap(), scale)
    }

    fn reference_store() -> StaticCalibrationStore {
        store_with(CalibrationPoints::new(1000, 2048, 3000), 100)
    }

    // ==================== Calibrated Axis Tests ====================

    #[test]
    fn test_reference_calibration_scenario() {
        let store = reference_store();
        let throttle = ch(channels::THROTTLE);

        assert_eq!(rescale(2048, throttle, &store), 0);
        assert_eq!(rescale(1000, throttle, &store), -3200);
        assert_eq!(rescale(3000, throttle, &store), 3200);
        assert_eq!(rescale(1524, throttle, &store), -1600);
    }

    #[test]
    fn test_center_is_zero_on_every_axis() {
        let store = store_with(CalibrationPoints::new(300, 1900, 3900), 100);
        for axis in 0..4 {
            assert_eq!(rescale(1900, ch(axis), &store), 0, "axis {}", axis);
        }
    }

    #[test]
    fn test_asymmetric_halves_scale_independently() {
        let store = store_with(CalibrationPoints::new(1000, 2000, 2500), 100);
        let rudder = ch(channels::RUDDER);

        // 500 codes is the full positive half but only half of the negative one
        assert_eq!(rescale(2500, rudder, &store), 3200);
        assert_eq!(rescale(1500, rudder, &store), -1600);
    }

    #[test]
    fn test_calibrated_truncates_toward_zero() {
        let points = CalibrationPoints::new(0, 2048, 4095);
        // -1 * 3200 / 2048 = -1.56 -> -1
        assert_eq!(rescale_calibrated(2047, points), -1);
        // 1 * 3200 / 2047 = 1.56 -> 1
        assert_eq!(rescale_calibrated(2049, points), 1);
    }

    #[test]
    fn test_calibrated_axis_output_always_in_range() {
        let stores = [
            reference_store(),
            store_with(CalibrationPoints::new(1, 2, 3), 100),
            store_with(CalibrationPoints::new(2000, 2048, 2100), 100),
            store_with(CalibrationPoints::new(0, 2048, 4095), 200),
        ];

        for store in &stores {
            for axis in 0..4 {
                for raw in 0..=4095u16 {
                    let value = rescale(raw, ch(axis), store);
                    assert!(
                        (-RESCALE_TARGET_RANGE..=RESCALE_TARGET_RANGE).contains(&value),
                        "raw {} axis {} -> {}",
                        raw,
                        axis,
                        value
                    );
                }
            }
        }
    }

    #[test]
    fn test_beyond_calibrated_endpoints_clamps() {
        let store = reference_store();
        assert_eq!(rescale(0, ch(channels::THROTTLE), &store), -3200);
        assert_eq!(rescale(4095, ch(channels::THROTTLE), &store), 3200);
    }

    // ==================== Degenerate Calibration Tests ====================

    #[test]
    fn test_zero_width_negative_half_saturates() {
        let points = CalibrationPoints::new(2048, 2048, 3000);
        assert_eq!(rescale_calibrated(1000, points), -3200);
        assert_eq!(rescale_calibrated(2048, points), 0);
        assert_eq!(rescale_calibrated(2524, points), 1600);
    }

    #[test]
    fn test_zero_width_positive_half_saturates() {
        let points = CalibrationPoints::new(1000, 3000, 3000);
        assert_eq!(rescale_calibrated(3000, points), 0);
        assert_eq!(rescale_calibrated(3500, points), 3200);
    }

    #[test]
    fn test_inverted_half_saturates() {
        let points = CalibrationPoints::new(3000, 2048, 1000);
        assert_eq!(rescale_calibrated(1500, points), -3200);
        assert_eq!(rescale_calibrated(2500, points), 3200);
    }

    // ==================== Stick Scale Tests ====================

    #[test]
    fn test_scale_applies_to_aileron_and_elevation_only() {
        let store = store_with(CalibrationPoints::new(1000, 2048, 3000), 50);

        assert_eq!(rescale(3000, ch(channels::AILERON), &store), 1600);
        assert_eq!(rescale(3000, ch(channels::ELEVATION), &store), 1600);
        assert_eq!(rescale(3000, ch(channels::THROTTLE), &store), 3200);
        assert_eq!(rescale(3000, ch(channels::RUDDER), &store), 3200);
    }

    #[test]
    fn test_scale_truncates() {
        let store = store_with(CalibrationPoints::new(1000, 2048, 3000), 33);
        // -1600 * 33 / 100 = -528
        assert_eq!(rescale(1524, ch(channels::AILERON), &store), -528);
        // 1 * 3200 / 952 = 3, 3 * 33 / 100 = 0
        assert_eq!(rescale(2049, ch(channels::AILERON), &store), 0);
    }

    #[test]
    fn test_oversized_scale_is_clamped() {
        let store = store_with(CalibrationPoints::new(1000, 2048, 3000), 150);
        assert_eq!(rescale(3000, ch(channels::AILERON), &store), 3200);
        assert_eq!(rescale(1000, ch(channels::ELEVATION), &store), -3200);
        assert_eq!(rescale(2524, ch(channels::AILERON), &store), 2400);
    }

    #[test]
    fn test_store_read_on_every_call() {
        let mut store = MockCalibrationStore::new();
        store
            .expect_stick_calibration()
            .withf(|axis| *axis == 1)
            .times(2)
            .return_const(CalibrationPoints::new(1000, 2048, 3000));
        store.expect_stick_scale_percent().times(2).return_const(100);

        assert_eq!(rescale(3000, ch(channels::ELEVATION), &store), 3200);
        assert_eq!(rescale(1000, ch(channels::ELEVATION), &store), -3200);
    }

    #[test]
    fn test_aux_channel_never_reads_store() {
        let store = MockCalibrationStore::new();
        // No expectations: any call would panic
        assert_eq!(rescale(0, ch(channels::AUX1), &store), -3200);
    }

    // ==================== Linear Map Tests ====================

    #[test]
    fn test_linear_endpoints() {
        assert_eq!(rescale_linear(0), -3200);
        assert_eq!(rescale_linear(1), -3199);
        assert_eq!(rescale_linear(2048), 0);
        assert_eq!(rescale_linear(4095), 3198);
    }

    #[test]
    fn test_linear_monotonic() {
        let mut previous = rescale_linear(0);
        for raw in 1..=4095 {
            let value = rescale_linear(raw);
            assert!(value >= previous, "not monotonic at {}", raw);
            previous = value;
        }
    }

    #[test]
    fn test_aux_and_battery_use_linear_map() {
        let store = reference_store();
        assert_eq!(rescale(4095, ch(channels::AUX6), &store), 3198);
        assert_eq!(rescale(2048, ch(channels::BATTERY), &store), 0);
    }

    // ==================== Packet Unit Tests ====================

    #[test]
    fn test_packet_endpoints() {
        assert_eq!(packet_units(-RESCALE_TARGET_RANGE), PACKET_MIN);
        assert_eq!(packet_units(0), 2250);
        assert_eq!(packet_units(RESCALE_TARGET_RANGE), PACKET_MAX);
    }

    #[test]
    fn test_packet_truncates_toward_zero() {
        assert_eq!(packet_units(1), 2250);
        assert_eq!(packet_units(-1), 2250);
        assert_eq!(packet_units(5), 2251);
        assert_eq!(packet_units(-5), 2249);
        assert_eq!(packet_units(64), 2265);
        assert_eq!(packet_units(-64), 2235);
        assert_eq!(packet_units(1600), 2625);
        assert_eq!(packet_units(-1600), 1875);
    }

    #[test]
    fn test_packet_matches_affine_formula() {
        for value in -RESCALE_TARGET_RANGE..=RESCALE_TARGET_RANGE {
            let expected = ((15 * value) / 64 + 2250) as u16;
            assert_eq!(packet_units(value), expected, "v = {}", value);
        }
    }

    #[test]
    fn test_packet_clamps_out_of_range_input() {
        assert_eq!(packet_units(-10_000), PACKET_MIN);
        assert_eq!(packet_units(10_000), PACKET_MAX);
    }
}
