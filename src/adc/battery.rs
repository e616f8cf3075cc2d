//! # Battery Filter
//!
//! Integer exponential moving average over the battery sense channel, plus
//! conversion to pack voltage.
//!
//! ## Filter
//!
//! `state += 4 * (raw - state) / 128`, i.e. a 1/32 step with truncating
//! division. The first sample seeds the state directly so there is no ramp
//! from zero at power-up. A state of zero means "not seeded yet".
//!
//! Truncation stalls the filter once `|raw - state| < 32`, leaving the
//! state biased toward its previous value by up to 31 codes.
//!
//! ## Voltage
//!
//! The ADC spans 0..3300 mV over 0..4095 and the pack is sensed through a
//! 10k / 5.1k divider (`Vbat = Vadc * 151 / 51`):
//!
//! ```text
//! mv = raw * (3300 * 151) / (4095 * 51)
//! ```
//!
//! The accessor returns `mv / 10`, so 1230 means 12.30 V.
//!
//! ```
//! use tx_analog::adc::battery::BatteryFilter;
//!
//! let mut filter = BatteryFilter::new();
//! filter.update(4095);
//! assert_eq!(filter.voltage(), 977);
//! ```

/// Filter step numerator (`4 / 128 = 1 / 32`).
const FILTER_STEP_NUM: i32 = 4;

/// Filter step denominator.
const FILTER_STEP_DEN: i32 = 128;

/// ADC reference voltage in millivolts.
pub const ADC_REFERENCE_MV: u32 = 3300;

/// Full scale ADC code.
pub const ADC_FULL_SCALE: u32 = 4095;

/// Divider numerator, `R1 + R2` in units of 100 Ω.
pub const DIVIDER_TOTAL: u32 = 151;

/// Divider denominator, `R2` in units of 100 Ω.
pub const DIVIDER_LOW: u32 = 51;

/// Smoothed battery sense reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatteryFilter {
    state: u16,
}

impl BatteryFilter {
    /// Creates an unseeded filter.
    #[must_use]
    pub const fn new() -> Self {
        Self { state: 0 }
    }

    /// Feeds one sample, called once per completed acquisition round.
    pub fn update(&mut self, raw: u16) {
        if self.state == 0 {
            self.state = raw;
            return;
        }

        let state = i32::from(self.state);
        let step = (FILTER_STEP_NUM * (i32::from(raw) - state)) / FILTER_STEP_DEN;
        self.state = (state + step) as u16;
    }

    /// Whether a sample has been seen since the last zero state.
    #[must_use]
    pub const fn is_seeded(&self) -> bool {
        self.state != 0
    }

    /// Filtered raw code.
    #[must_use]
    pub const fn raw(&self) -> u16 {
        self.state
    }

    /// Pack voltage in 10 mV units (1230 = 12.30 V).
    #[must_use]
    pub fn voltage(&self) -> u32 {
        raw_to_voltage(self.state)
    }
}

/// Converts a raw battery code to 10 mV units (1230 = 12.30 V).
#[must_use]
pub fn raw_to_voltage(raw: u16) -> u32 {
    let numerator = u64::from(ADC_REFERENCE_MV * DIVIDER_TOTAL);
    let denominator = u64::from(ADC_FULL_SCALE * DIVIDER_LOW);
    let mv = (u64::from(raw) * numerator) / denominator;
    (mv / 10) as u32
}
