//! Cross-cutting property tests for the effect units.

use hoopipi_dsp::{NoiseGate, Reverb, ThreeBandEq};
use proptest::prelude::*;

proptest! {
    #[test]
    fn gate_output_never_exceeds_input_magnitude(threshold_db in -60.0f32..=0.0, sample in -1.0f32..=1.0) {
        let mut gate = NoiseGate::new(48000.0);
        gate.set_enabled(true);
        gate.set_threshold_db(threshold_db);
        let mut buf = [sample];
        gate.process(&mut buf);
        prop_assert!(buf[0].abs() <= sample.abs() + 1e-6);
    }

    #[test]
    fn eq_gains_stay_within_clamped_range(bass in -100.0f32..=100.0, mid in -100.0f32..=100.0, treble in -100.0f32..=100.0) {
        let mut eq = ThreeBandEq::new(48000.0);
        eq.set_bass_db(bass);
        eq.set_mid_db(mid);
        eq.set_treble_db(treble);
        prop_assert!((-20.0..=20.0).contains(&eq.bass_db()));
        prop_assert!((-20.0..=20.0).contains(&eq.mid_db()));
        prop_assert!((-20.0..=20.0).contains(&eq.treble_db()));
    }

    #[test]
    fn eq_processing_stays_finite(bass in -20.0f32..=20.0, mid in -20.0f32..=20.0, treble in -20.0f32..=20.0, sample in -1.0f32..=1.0) {
        let mut eq = ThreeBandEq::new(48000.0);
        eq.set_enabled(true);
        eq.set_bass_db(bass);
        eq.set_mid_db(mid);
        eq.set_treble_db(treble);
        let mut buf = [sample; 64];
        eq.process(&mut buf);
        for s in buf {
            prop_assert!(s.is_finite());
        }
    }

    #[test]
    fn reverb_processing_stays_finite(room in 0.0f32..=1.0, rt60 in 0.1f32..=10.0, sample in -1.0f32..=1.0) {
        let mut reverb = Reverb::new(48000.0);
        reverb.set_enabled(true);
        reverb.set_room_size(room);
        reverb.set_rt60(rt60);
        let mut l = [sample; 256];
        let mut r = [sample; 256];
        reverb.process(&mut l, &mut r);
        for s in l.iter().chain(r.iter()) {
            prop_assert!(s.is_finite());
        }
    }
}
