//! Lock-free parameter cells shared between the control thread and the
//! audio callback.
//!
//! [`ParamCell`] stores a single `f32` in an [`AtomicU32`] bit-cast, the
//! same trick used for per-parameter storage in the GUI-facing atomic
//! bridge this crate's sibling code is modeled on: the control thread
//! calls `set`, the audio thread calls `get`, and both are wait-free.
//! [`FlagCell`] is the boolean equivalent for bypass/enable switches.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// A single `f32` parameter, readable and writable without locking.
///
/// Reads and writes use `Relaxed` ordering: the value itself carries no
/// invariant with other memory, so there is nothing to synchronize-with.
/// Audible smoothing of step changes is the caller's responsibility
/// (see [`crate::smoothed_gain::SmoothedGain`] or [`crate::param::SmoothedParam`]).
pub struct ParamCell {
    bits: AtomicU32,
}

impl ParamCell {
    /// Creates a cell initialized to `value`.
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    /// Wait-free read of the current value.
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Wait-free write of a new value.
    pub fn set(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for ParamCell {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// A single boolean flag, readable and writable without locking.
pub struct FlagCell {
    value: AtomicBool,
}

impl FlagCell {
    /// Creates a cell initialized to `value`.
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    /// Wait-free read of the current value.
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Relaxed)
    }

    /// Wait-free write of a new value.
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Relaxed);
    }
}

impl Default for FlagCell {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_cell_round_trips() {
        let cell = ParamCell::new(1.5);
        assert_eq!(cell.get(), 1.5);
        cell.set(-3.25);
        assert_eq!(cell.get(), -3.25);
    }

    #[test]
    fn param_cell_default_is_zero() {
        assert_eq!(ParamCell::default().get(), 0.0);
    }

    #[test]
    fn flag_cell_round_trips() {
        let cell = FlagCell::new(false);
        assert!(!cell.get());
        cell.set(true);
        assert!(cell.get());
    }

    #[test]
    fn flag_cell_default_is_false() {
        assert!(!FlagCell::default().get());
    }
}
