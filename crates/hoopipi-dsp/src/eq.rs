//! Three-band parametric equalizer with fixed corner frequencies.
//!
//! Unlike a general-purpose parametric EQ, HoopiPi's `ThreeBandEq` exposes
//! only gain per band — the corner frequencies and Q are fixed (low shelf @
//! 120 Hz, mid peak @ 750 Hz, high shelf @ 3000 Hz). Coefficient recompute
//! is deferred: a setter only flips a dirty
//! flag, and the RT-side `process` call recomputes the three biquads once,
//! at the top of the block, if the flag is set. Gains are additionally
//! smoothed at the fixed 0.999 coefficient to avoid zipper noise on rapid
//! automation.

use hoopipi_core::{Biquad, SmoothedGain, high_shelf_coefficients, low_shelf_coefficients, peaking_eq_coefficients};

const LOW_SHELF_HZ: f32 = 120.0;
const LOW_SHELF_Q: f32 = 0.707;
const MID_PEAK_HZ: f32 = 750.0;
const MID_PEAK_Q: f32 = 1.0;
const HIGH_SHELF_HZ: f32 = 3000.0;
const HIGH_SHELF_Q: f32 = 0.707;
const MAX_GAIN_DB: f32 = 20.0;

/// Three fixed-frequency bands in series: low shelf, mid peak, high shelf.
pub struct ThreeBandEq {
    low: Biquad,
    mid: Biquad,
    high: Biquad,

    bass_gain: SmoothedGain,
    mid_gain: SmoothedGain,
    treble_gain: SmoothedGain,

    sample_rate: f32,
    dirty: bool,
    enabled: bool,
}

impl ThreeBandEq {
    /// Creates a disabled EQ with all bands at 0 dB.
    pub fn new(sample_rate: f32) -> Self {
        let mut eq = Self {
            low: Biquad::new(),
            mid: Biquad::new(),
            high: Biquad::new(),
            bass_gain: SmoothedGain::new(0.0),
            mid_gain: SmoothedGain::new(0.0),
            treble_gain: SmoothedGain::new(0.0),
            sample_rate,
            dirty: true,
            enabled: false,
        };
        eq.recompute();
        eq
    }

    /// Enables or disables the EQ. Disabled is a hard passthrough (no
    /// biquad evaluation at all, not just unity gain).
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the low-shelf gain target, clamped to ±20 dB. Marks coefficients
    /// dirty; the actual biquad recompute happens lazily in `process`.
    pub fn set_bass_db(&mut self, gain_db: f32) {
        self.bass_gain.set_target(gain_db.clamp(-MAX_GAIN_DB, MAX_GAIN_DB));
        self.dirty = true;
    }

    pub fn bass_db(&self) -> f32 {
        self.bass_gain.target()
    }

    /// Sets the mid-peak gain target, clamped to ±20 dB.
    pub fn set_mid_db(&mut self, gain_db: f32) {
        self.mid_gain.set_target(gain_db.clamp(-MAX_GAIN_DB, MAX_GAIN_DB));
        self.dirty = true;
    }

    pub fn mid_db(&self) -> f32 {
        self.mid_gain.target()
    }

    /// Sets the high-shelf gain target, clamped to ±20 dB.
    pub fn set_treble_db(&mut self, gain_db: f32) {
        self.treble_gain.set_target(gain_db.clamp(-MAX_GAIN_DB, MAX_GAIN_DB));
        self.dirty = true;
    }

    pub fn treble_db(&self) -> f32 {
        self.treble_gain.target()
    }

    fn recompute(&mut self) {
        let bass = self.bass_gain.advance();
        let mid = self.mid_gain.advance();
        let treble = self.treble_gain.advance();

        let (b0, b1, b2, a0, a1, a2) =
            low_shelf_coefficients(LOW_SHELF_HZ, LOW_SHELF_Q, bass, self.sample_rate);
        self.low.set_coefficients(b0, b1, b2, a0, a1, a2);

        let (b0, b1, b2, a0, a1, a2) =
            peaking_eq_coefficients(MID_PEAK_HZ, MID_PEAK_Q, mid, self.sample_rate);
        self.mid.set_coefficients(b0, b1, b2, a0, a1, a2);

        let (b0, b1, b2, a0, a1, a2) =
            high_shelf_coefficients(HIGH_SHELF_HZ, HIGH_SHELF_Q, treble, self.sample_rate);
        self.high.set_coefficients(b0, b1, b2, a0, a1, a2);

        self.dirty = !self.bass_gain.is_settled()
            || !self.mid_gain.is_settled()
            || !self.treble_gain.is_settled();
    }

    /// Processes `buf` in place. A no-op when disabled. Recomputes
    /// coefficients once at the top of the block whenever any band's gain
    /// hasn't settled to its target yet (covers both a fresh setter call
    /// and the tail of a gain ramp).
    pub fn process(&mut self, buf: &mut [f32]) {
        if !self.enabled {
            return;
        }
        if self.dirty {
            self.recompute();
        }
        for sample in buf.iter_mut() {
            let s = self.low.process(*sample);
            let s = self.mid.process(s);
            let s = self.high.process(s);
            *sample = s;
        }
    }
}
