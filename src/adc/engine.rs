//! Acquisition engine abstraction.
//!
//! The engine is the hardware side of the pipeline: once configured it scans
//! every channel into the shared [`SampleBuffer`] on its own and raises the
//! [`RoundSignal`] after the last slot. The controller only re-arms it.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::buffer::{RoundSignal, SampleBuffer};

/// Trait for round-robin acquisition hardware
#[cfg_attr(test, mockall::automock)]
pub trait AcquisitionEngine: Send {
    /// Bind the engine to its destination buffer and completion signal
    fn configure(&mut self, buffer: Arc<SampleBuffer>, complete: Arc<RoundSignal>);

    /// Start the next acquisition round
    fn arm(&mut self);
}

/// Produces the raw code of `channel` for acquisition round `round`.
pub type SampleSource = Box<dyn FnMut(usize, u64) -> u16 + Send>;

/// Host-side engine that completes a round as soon as it is armed.
///
/// Used by the binary and by tests in place of converter hardware.
pub struct SimulatedEngine {
    source: SampleSource,
    target: Option<(Arc<SampleBuffer>, Arc<RoundSignal>)>,
    rounds: u64,
    stalled: bool,
}

impl fmt::Debug for SimulatedEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedEngine")
            .field("rounds", &self.rounds)
            .field("stalled", &self.stalled)
            .finish_non_exhaustive()
    }
}

impl SimulatedEngine {
    /// Creates an engine fed by `source`.
    pub fn new<F>(source: F) -> Self
    where
        F: FnMut(usize, u64) -> u16 + Send + 'static,
    {
        Self {
            source: Box::new(source),
            target: None,
            rounds: 0,
            stalled: false,
        }
    }

    /// Engine returning the same code on every channel.
    #[must_use]
    pub fn constant(code: u16) -> Self {
        Self::new(move |_, _| code)
    }

    /// Stops completing rounds, as if the converter lost sync.
    pub fn set_stalled(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    /// Rounds written so far.
    #[must_use]
    pub fn rounds(&self) -> u64 {
        self.rounds
    }
}

impl AcquisitionEngine for SimulatedEngine {
    fn configure(&mut self, buffer: Arc<SampleBuffer>, complete: Arc<RoundSignal>) {
        debug!("Simulated engine bound to {} channels", buffer.len());
        self.target = Some((buffer, complete));
    }

    fn arm(&mut self) {
        if self.stalled {
            return;
        }
        let Some((buffer, complete)) = &self.target else {
            return;
        };

        for channel in 0..buffer.len() {
            buffer.store(channel, (self.source)(channel, self.rounds));
        }
        self.rounds += 1;
        complete.signal();
    }
}
