use crate::monitor::constants::{DEFAULT_DELAY_SECS, MAX_DELAY_SECS, MIN_DELAY_SECS};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Shared inter-probe delay in seconds.
///
/// The value lives in a single atomic word (the bits of an `f64`), so a
/// worker reading it while the control loop adjusts it sees either the old
/// or the new value, never a mix.
#[derive(Debug)]
pub struct DelayController {
    bits: AtomicU64,
}

impl Default for DelayController {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY_SECS)
    }
}

impl DelayController {
    /// Create a controller starting at `initial`, clamped into bounds
    pub fn new(initial: f64) -> Self {
        Self {
            bits: AtomicU64::new(clamp_delay(initial).to_bits()),
        }
    }

    pub fn current(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub fn current_duration(&self) -> Duration {
        Duration::from_secs_f64(self.current())
    }

    /// Move the delay by `delta` seconds, saturating at the bounds.
    ///
    /// Returns the new value. Intended for a single writer.
    pub fn adjust(&self, delta: f64) -> f64 {
        let next = clamp_delay(self.current() + delta);
        self.bits.store(next.to_bits(), Ordering::Release);
        debug!(delta_secs = delta, delay_secs = next, "Delay adjusted");
        next
    }
}

fn clamp_delay(value: f64) -> f64 {
    if value.is_nan() {
        return DEFAULT_DELAY_SECS;
    }
    value.clamp(MIN_DELAY_SECS, MAX_DELAY_SECS)
}
