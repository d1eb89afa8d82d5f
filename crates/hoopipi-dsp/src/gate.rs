//! Hard noise gate for silencing the signal below a threshold.
//!
//! Unlike a conventional gate with smoothed open/close gain, HoopiPi's gate
//! is a hard binary switch driven by a peak-follower envelope: once the
//! envelope crosses the threshold the signal passes unmodified, and once it
//! falls back below, the signal is zeroed outright. The only "smoothing" is
//! in the envelope follower itself (fast attack, slower release), which
//! keeps the gate from chattering on transients without softening its edge.

use hoopipi_core::{EnvelopeFollower, db_to_linear};

/// Hard-switching noise gate.
///
/// `threshold_db` is in dBFS, clamped to `[-60.0, 0.0]` per the parameter
/// plane's documented range. Attack and release are fixed at 1 ms and
/// 100 ms respectively and are not exposed as controls.
pub struct NoiseGate {
    envelope: EnvelopeFollower,
    threshold_db: f32,
    enabled: bool,
}

impl NoiseGate {
    /// Attack time for the envelope follower.
    const ATTACK_MS: f32 = 1.0;
    /// Release time for the envelope follower.
    const RELEASE_MS: f32 = 100.0;

    /// Creates a gate at the given sample rate, disabled, with the default
    /// threshold of -40 dB (matching the runtime configuration default).
    pub fn new(sample_rate: f32) -> Self {
        Self {
            envelope: EnvelopeFollower::with_times(sample_rate, Self::ATTACK_MS, Self::RELEASE_MS),
            threshold_db: -40.0,
            enabled: false,
        }
    }

    /// Enables or disables the gate. Disabling does not reset the envelope:
    /// re-enabling resumes from wherever the envelope last settled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// True if the gate is currently enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the threshold in dB, clamped to `[-60.0, 0.0]`. Takes effect
    /// immediately on the next sample; the envelope itself is never reset.
    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        self.threshold_db = threshold_db.clamp(-60.0, 0.0);
    }

    /// Current threshold in dB.
    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    /// Updates the sample rate in place, recalculating the envelope's
    /// attack/release coefficients.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.envelope = EnvelopeFollower::with_times(sample_rate, Self::ATTACK_MS, Self::RELEASE_MS);
    }

    /// Processes `buf` in place. A no-op when disabled.
    pub fn process(&mut self, buf: &mut [f32]) {
        if !self.enabled {
            return;
        }
        let threshold_linear = db_to_linear(self.threshold_db);
        for sample in buf.iter_mut() {
            let level = self.envelope.process(*sample);
            if level <= threshold_linear {
                *sample = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_is_passthrough() {
        let mut gate = NoiseGate::new(48000.0);
        let mut buf = vec![0.5, -0.3, 0.01];
        let original = buf.clone();
        gate.process(&mut buf);
        assert_eq!(buf, original);
    }

    #[test]
    fn silences_below_threshold() {
        let mut gate = NoiseGate::new(48000.0);
        gate.set_enabled(true);
        gate.set_threshold_db(-20.0);
        let mut buf = vec![0.0001f32; 10000];
        gate.process(&mut buf);
        assert_eq!(*buf.last().unwrap(), 0.0);
    }

    #[test]
    fn passes_above_threshold() {
        let mut gate = NoiseGate::new(48000.0);
        gate.set_enabled(true);
        gate.set_threshold_db(-40.0);
        let mut buf = vec![0.9f32; 10000];
        gate.process(&mut buf);
        assert_eq!(*buf.last().unwrap(), 0.9);
    }

    #[test]
    fn threshold_clamps_to_documented_range() {
        let mut gate = NoiseGate::new(48000.0);
        gate.set_threshold_db(10.0);
        assert_eq!(gate.threshold_db(), 0.0);
        gate.set_threshold_db(-100.0);
        assert_eq!(gate.threshold_db(), -60.0);
    }
}
