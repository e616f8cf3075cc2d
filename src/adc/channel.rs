//! # ADC Channel Layout
//!
//! Channel numbering and the legacy channel id encoding.
//!
//! ## Channel Assignments
//!
//! | Channel | Input | Calibrated |
//! |---------|-------|------------|
//! | 0 | Aileron stick | yes (+ stick scale) |
//! | 1 | Elevation stick | yes (+ stick scale) |
//! | 2 | Throttle stick | yes |
//! | 3 | Rudder stick | yes |
//! | 4-9 | Auxiliary switches / pots | no |
//! | 10 | Battery sense | no |
//!
//! ## Channel Ids
//!
//! Raw accessors take a packed id: the low seven bits select the channel and
//! bit 7 ([`ADC_CHANNEL_INVERTED_FLAG`]) requests `4095 - raw`. This lets a
//! mechanically reversed switch be corrected without calibration.
//!
//! ```
//! use tx_analog::adc::channel::{ChannelSelector, ADC_CHANNEL_INVERTED_FLAG};
//!
//! let sel = ChannelSelector::decode(5 | ADC_CHANNEL_INVERTED_FLAG);
//! assert_eq!(sel.index, 5);
//! assert!(sel.inverted);
//! ```

/// Largest 12-bit conversion result.
pub const ADC_MAX_CODE: u16 = 4095;

/// Flag bit in a channel id requesting an inverted reading.
pub const ADC_CHANNEL_INVERTED_FLAG: u32 = 0x80;

/// Mask selecting the channel index bits of a channel id.
pub const ADC_CHANNEL_INDEX_MASK: u32 = 0x7F;

/// Upper bound on configured channels.
pub const MAX_CHANNELS: usize = 16;

/// Channels sampled on the standard transmitter layout.
pub const DEFAULT_CHANNEL_COUNT: usize = 11;

/// Battery sense slot on the standard transmitter layout.
pub const DEFAULT_BATTERY_CHANNEL: usize = channels::BATTERY;

/// Channel indices for semantic access.
pub mod channels {
    /// Aileron stick (calibrated, scaled)
    pub const AILERON: usize = 0;
    /// Elevation stick (calibrated, scaled)
    pub const ELEVATION: usize = 1;
    /// Throttle stick (calibrated)
    pub const THROTTLE: usize = 2;
    /// Rudder stick (calibrated)
    pub const RUDDER: usize = 3;
    /// First auxiliary input
    pub const AUX1: usize = 4;
    /// Second auxiliary input
    pub const AUX2: usize = 5;
    /// Third auxiliary input
    pub const AUX3: usize = 6;
    /// Fourth auxiliary input
    pub const AUX4: usize = 7;
    /// Fifth auxiliary input
    pub const AUX5: usize = 8;
    /// Sixth auxiliary input
    pub const AUX6: usize = 9;
    /// Battery voltage divider
    pub const BATTERY: usize = 10;
}

/// A channel index known to be inside the configured channel range.
///
/// Only [`SamplingController`](super::controller::SamplingController) hands
/// these out, after clamping a caller supplied index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelIndex(u8);

impl ChannelIndex {
    /// Clamps `index` to the last of `count` channels.
    ///
    /// `count` must be in `1..=MAX_CHANNELS`.
    #[must_use]
    pub fn clamped(index: usize, count: usize) -> Self {
        let last = count.clamp(1, MAX_CHANNELS) - 1;
        Self(index.min(last) as u8)
    }

    /// Raw slot number.
    #[inline]
    #[must_use]
    pub const fn get(self) -> usize {
        self.0 as usize
    }

    /// Whether this is one of the four calibrated stick axes.
    #[inline]
    #[must_use]
    pub const fn is_calibrated_axis(self) -> bool {
        self.get() <= channels::RUDDER
    }

    /// Whether the per-profile stick scale applies.
    #[inline]
    #[must_use]
    pub const fn is_scaled_axis(self) -> bool {
        matches!(self.get(), channels::AILERON | channels::ELEVATION)
    }
}

/// Decoded channel id: slot plus inversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelSelector {
    /// Requested slot, not yet clamped to the configured count.
    pub index: u8,
    /// Return `4095 - raw` instead of `raw`.
    pub inverted: bool,
}

impl ChannelSelector {
    /// Plain reading of `index`.
    #[must_use]
    pub const fn normal(index: u8) -> Self {
        Self {
            index: index & ADC_CHANNEL_INDEX_MASK as u8,
            inverted: false,
        }
    }

    /// Inverted reading of `index`.
    #[must_use]
    pub const fn inverted(index: u8) -> Self {
        Self {
            index: index & ADC_CHANNEL_INDEX_MASK as u8,
            inverted: true,
        }
    }

    /// Decodes a packed channel id.
    #[must_use]
    pub const fn decode(id: u32) -> Self {
        Self {
            index: (id & ADC_CHANNEL_INDEX_MASK) as u8,
            inverted: id & ADC_CHANNEL_INVERTED_FLAG != 0,
        }
    }

    /// Packs back into the id encoding.
    #[must_use]
    pub const fn encode(self) -> u32 {
        let flag = if self.inverted { ADC_CHANNEL_INVERTED_FLAG } else { 0 };
        self.index as u32 | flag
    }
}

impl From<u32> for ChannelSelector {
    fn from(id: u32) -> Self {
        Self::decode(id)
    }
}

impl From<usize> for ChannelSelector {
    fn from(id: usize) -> Self {
        Self::decode((id & 0xFF) as u32)
    }
}

impl From<ChannelIndex> for ChannelSelector {
    fn from(index: ChannelIndex) -> Self {
        Self::normal(index.0)
    }
}
