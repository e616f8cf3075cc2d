//! # Sample Buffer and Round Signal
//!
//! Shared state between the acquisition engine (producer) and the sampling
//! controller (consumer).
//!
//! The buffer holds exactly one generation of samples and is overwritten in
//! place each round. Slots are independent atomics, so a reader racing the
//! producer may see some channels from the previous round and some from the
//! current one. Every slot is rewritten each round, so such a torn read only
//! affects freshness.

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use super::channel::{ADC_MAX_CODE, MAX_CHANNELS};

/// Raw 12-bit codes for all configured channels.
#[derive(Debug)]
pub struct SampleBuffer {
    slots: [AtomicU16; MAX_CHANNELS],
    len: usize,
}

impl SampleBuffer {
    /// Creates a zeroed buffer for `len` channels (clamped to `1..=MAX_CHANNELS`).
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            slots: std::array::from_fn(|_| AtomicU16::new(0)),
            len: len.clamp(1, MAX_CHANNELS),
        }
    }

    /// Number of configured channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false, a buffer has at least one slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads slot `idx`. Panics if `idx >= len()`.
    #[inline]
    #[must_use]
    pub fn load(&self, idx: usize) -> u16 {
        assert!(idx < self.len, "sample slot {} out of range", idx);
        self.slots[idx].load(Ordering::Relaxed)
    }

    /// Writes slot `idx`, keeping only the 12 conversion bits.
    #[inline]
    pub fn store(&self, idx: usize, code: u16) {
        assert!(idx < self.len, "sample slot {} out of range", idx);
        self.slots[idx].store(code & ADC_MAX_CODE, Ordering::Relaxed);
    }

    /// Copies every configured slot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u16> {
        self.slots[..self.len]
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed))
            .collect()
    }
}

/// Single-slot "round complete" notification.
///
/// The producer raises it after writing the last channel of a round; the
/// consumer drains it once per `process()` call. Raising it twice before it is
/// drained collapses into one notification.
#[derive(Debug, Default)]
pub struct RoundSignal {
    complete: AtomicBool,
}

impl RoundSignal {
    /// Creates a drained signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a round as complete.
    pub fn signal(&self) {
        self.complete.store(true, Ordering::Release);
    }

    /// Drains the signal, returning whether a round had completed.
    pub fn take(&self) -> bool {
        self.complete.swap(false, Ordering::AcqRel)
    }

    /// Peeks without draining.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }
}
