//! The HoopiPi real-time engine: composes the DSP primitives, the two
//! independently-loadable model slots, the shared reverb, the recorder, and
//! the backing track into the single per-period entry point a host audio
//! callback drives — [`Engine::process_stereo`].
//!
//! Everything reachable from `process_stereo` is real-time safe: no
//! allocation, no locking, no blocking I/O. Every other method on this
//! crate's public types is a non-RT control-thread call.

pub mod backing_track;
pub mod error;
pub mod model;
pub mod model_slot;
pub mod param_plane;
pub mod recorder;
pub mod stereo_mode;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hoopipi_core::{DcBlocker, SmoothedGain};
use hoopipi_dsp::{NoiseGate, Reverb, ThreeBandEq};

use backing_track::BackingTrack;
use error::EngineError;
use model::ModelLoader;
use model_slot::ModelSlot;
use param_plane::ParameterPlane;
use recorder::Recorder;
use stereo_mode::StereoMode;

/// Snapshot of engine-wide counters surfaced on `getStatus` (§7: RT-path
/// anomalies are observable only through counters).
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineMetrics {
    pub xrun_count: u64,
}

/// One per-channel DSP chain: gate, EQ, and DC blocker. The model slot and
/// smoothed gains live directly on [`Engine`] since the model slot is
/// shared with the control façade via `Arc` and the gain pairs are grouped
/// together for `smooth_gains`.
struct ChannelChain {
    gate: NoiseGate,
    eq: ThreeBandEq,
    dc_blocker: DcBlocker,
}

impl ChannelChain {
    fn new(sample_rate: f32) -> Self {
        Self {
            gate: NoiseGate::new(sample_rate),
            eq: ThreeBandEq::new(sample_rate),
            dc_blocker: DcBlocker::new(sample_rate),
        }
    }
}

/// Composes the full per-channel → shared-reverb → backing-track → recorder
/// signal path described in §4.1. One `Engine` instance owns the entire RT
/// state for a stereo pair; constructing a second instance gets you a fully
/// independent engine (no process-wide singletons, per §9's design note on
/// global state).
pub struct Engine {
    sample_rate: f32,
    max_period: usize,

    params: Arc<ParameterPlane>,

    /// Two independently hot-swappable model slots; [`ParameterPlane::active_slot_index`]
    /// selects which one feeds the L-channel chain's model step for the
    /// current period (§4.1 step 6c, §4.2 "two slots per engine"). The
    /// other slot can load or prewarm a model in the background — e.g. to
    /// preview a swap — without touching the live signal path.
    slots: [Arc<ModelSlot>; 2],

    left: ChannelChain,
    right: ChannelChain,
    reverb: Reverb,

    in_gain_l: SmoothedGain,
    in_gain_r: SmoothedGain,
    out_gain_l: SmoothedGain,
    out_gain_r: SmoothedGain,

    recorder: Recorder,
    backing_track: BackingTrack,

    work_l: Vec<f32>,
    work_r: Vec<f32>,
    /// Pre-backing-track copy of the chain output, kept so the recorder can
    /// capture a "dry of backing track" signal when
    /// `backing_track_enabled_for_recording` is false while the monitored
    /// output still includes it (§4.1 step 9).
    rec_l: Vec<f32>,
    rec_r: Vec<f32>,

    xrun_count: AtomicU64,
}

impl Engine {
    /// Creates an engine fixed to `sample_rate` and `max_period` frames per
    /// call. Both model slots start `Empty`; all parameters start at the
    /// defaults in [`ParameterPlane::new`].
    pub fn new(sample_rate: f32, max_period: usize, loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            sample_rate,
            max_period,
            params: Arc::new(ParameterPlane::new()),
            slots: [
                Arc::new(ModelSlot::new(Arc::clone(&loader), max_period)),
                Arc::new(ModelSlot::new(loader, max_period)),
            ],
            left: ChannelChain::new(sample_rate),
            right: ChannelChain::new(sample_rate),
            reverb: Reverb::new(sample_rate),
            in_gain_l: SmoothedGain::new(1.0),
            in_gain_r: SmoothedGain::new(1.0),
            out_gain_l: SmoothedGain::new(1.0),
            out_gain_r: SmoothedGain::new(1.0),
            recorder: Recorder::new(),
            backing_track: BackingTrack::new(),
            work_l: vec![0.0; max_period],
            work_r: vec![0.0; max_period],
            rec_l: vec![0.0; max_period],
            rec_r: vec![0.0; max_period],
            xrun_count: AtomicU64::new(0),
        }
    }

    /// The shared parameter plane, for the control façade and config loader
    /// to read/write from their own threads.
    pub fn params(&self) -> &Arc<ParameterPlane> {
        &self.params
    }

    /// The model slot at `index` (0 or 1), for inspection or to register a
    /// load-complete callback.
    pub fn model_slot(&self, index: u8) -> Result<&Arc<ModelSlot>, EngineError> {
        self.slot_for_index(index)
    }

    /// The slot currently feeding the L-channel chain's model step.
    pub fn active_model_slot(&self) -> &Arc<ModelSlot> {
        &self.slots[self.params.active_slot_index() as usize]
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn backing_track(&self) -> &BackingTrack {
        &self.backing_track
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_period(&self) -> usize {
        self.max_period
    }

    pub fn metrics(&self) -> EngineMetrics {
        EngineMetrics {
            xrun_count: self.xrun_count.load(Ordering::Relaxed),
        }
    }

    /// Hot-swaps the model in slot `slot_index` (0 or 1). Non-RT; queues the
    /// load on that slot's own worker thread.
    pub fn load_model_async(&self, slot_index: u8, path: PathBuf) -> Result<(), EngineError> {
        let slot = Arc::clone(self.slot_for_index(slot_index)?);
        slot.load_async(path);
        Ok(())
    }

    pub fn unload_model(&self, slot_index: u8) -> Result<(), EngineError> {
        self.slot_for_index(slot_index)?.unload();
        Ok(())
    }

    /// Selects which of the two slots feeds the L-channel chain.
    pub fn set_active_slot(&self, slot_index: u8) -> Result<(), EngineError> {
        self.slot_for_index(slot_index)?;
        self.params.set_active_slot(slot_index);
        Ok(())
    }

    fn slot_for_index(&self, slot_index: u8) -> Result<&Arc<ModelSlot>, EngineError> {
        self.slots
            .get(slot_index as usize)
            .ok_or(EngineError::InvalidSlotIndex(slot_index))
    }

    /// Pulls the RT-owned chain objects' enabled/threshold/gain state in
    /// sync with the atomic parameter plane. Cheap relaxed loads; called
    /// once per period, matching the rest of the engine's "read atomics at
    /// the top of the block" convention (the EQ's own dirty-flag recompute
    /// works the same way, one layer down).
    fn sync_from_params(&mut self) {
        let p = &self.params;

        self.left.gate.set_enabled(p.left.gate_enabled.get());
        self.left.gate.set_threshold_db(p.left.gate_threshold_db.get());
        self.right.gate.set_enabled(p.right.gate_enabled.get());
        self.right.gate.set_threshold_db(p.right.gate_threshold_db.get());

        self.left.eq.set_enabled(p.left.eq_enabled.get());
        self.left.eq.set_bass_db(p.left.eq_bass_db.get());
        self.left.eq.set_mid_db(p.left.eq_mid_db.get());
        self.left.eq.set_treble_db(p.left.eq_treble_db.get());
        self.right.eq.set_enabled(p.right.eq_enabled.get());
        self.right.eq.set_bass_db(p.right.eq_bass_db.get());
        self.right.eq.set_mid_db(p.right.eq_mid_db.get());
        self.right.eq.set_treble_db(p.right.eq_treble_db.get());

        self.in_gain_l.set_target(hoopipi_core::db_to_linear(p.left.input_gain_db.get()));
        self.in_gain_r.set_target(hoopipi_core::db_to_linear(p.right.input_gain_db.get()));
        self.out_gain_l.set_target(hoopipi_core::db_to_linear(p.left.output_gain_db.get()));
        self.out_gain_r.set_target(hoopipi_core::db_to_linear(p.right.output_gain_db.get()));

        self.reverb.set_enabled(p.reverb.enabled.get());
        self.reverb.set_room_size(p.reverb.room_size.get());
        self.reverb.set_rt60(p.reverb.rt60_seconds.get());
        self.reverb.set_dry(p.reverb.dry.get());
        self.reverb.set_wet(p.reverb.wet.get());
    }

    /// Advances every smoothed gain one period-step toward its atomic
    /// target (§4.1 step 3, §3's `SmoothedGain` invariant).
    fn smooth_gains(&mut self) {
        self.in_gain_l.advance();
        self.in_gain_r.advance();
        self.out_gain_l.advance();
        self.out_gain_r.advance();
    }

    /// Runs one channel's gain→gate→model→EQ→DC-block→gain chain in place
    /// (§4.1 step 6). `model` is `Some` only for the L channel, and only its
    /// `process` is skipped when `bypass_model` is set — the R channel never
    /// receives a model at all (step 7 always skips 6c for R, independent of
    /// `bypassModelR`; that flag is a persisted/settable parameter kept for
    /// control-protocol symmetry but has no audible effect under this
    /// engine's routing).
    fn run_channel_chain(
        chain: &mut ChannelChain,
        model: Option<&ModelSlot>,
        bypass_model: bool,
        buf: &mut [f32],
        in_gain: f32,
        out_gain: f32,
        dc_blocker_enabled: bool,
    ) {
        if (in_gain - 1.0).abs() > f32::EPSILON {
            for sample in buf.iter_mut() {
                *sample *= in_gain;
            }
        }
        chain.gate.process(buf);
        if let Some(slot) = model {
            if !bypass_model {
                slot.process(buf);
            }
        }
        chain.eq.process(buf);
        if dc_blocker_enabled {
            for sample in buf.iter_mut() {
                *sample = chain.dc_blocker.process(*sample);
            }
        }
        if (out_gain - 1.0).abs() > f32::EPSILON {
            for sample in buf.iter_mut() {
                *sample *= out_gain;
            }
        }
    }

    /// The engine's single real-time entry point. `in_l` is mandatory;
    /// `in_r` is `None` when the host only supplies one input channel (it
    /// is then aliased to `in_l` per §4.1). `out_l`/`out_r` must each be at
    /// least `n` frames long. Never allocates, locks, or blocks; never
    /// panics on a well-formed call. Returns within the host deadline even
    /// when `n` exceeds the configured max period (counted as an xrun,
    /// falling back to passthrough — §4.1 step 1, §7 kind 1).
    pub fn process_stereo(&mut self, in_l: &[f32], in_r: Option<&[f32]>, out_l: &mut [f32], out_r: &mut [f32], n: usize) {
        if n == 0 {
            return;
        }
        if n > self.max_period {
            self.xrun_count.fetch_add(1, Ordering::Relaxed);
            let count = n.min(out_l.len()).min(in_l.len());
            out_l[..count].copy_from_slice(&in_l[..count]);
            let right_source = in_r.unwrap_or(in_l);
            let r_count = n.min(out_r.len()).min(right_source.len());
            out_r[..r_count].copy_from_slice(&right_source[..r_count]);
            return;
        }

        if self.params.global_bypass.get() {
            out_l[..n].copy_from_slice(&in_l[..n]);
            let right_source = in_r.unwrap_or(in_l);
            out_r[..n].copy_from_slice(&right_source[..n]);
            return;
        }

        self.sync_from_params();
        self.smooth_gains();

        let mode = self.params.stereo_mode.get();
        let right_source = in_r.unwrap_or(in_l);
        // Cloning the `Arc` up front (rather than reading `self.slots` later)
        // avoids holding an immutable borrow of `self` across the mutable
        // per-field borrows the channel chains below need.
        let active_slot = Arc::clone(self.active_model_slot());

        let work_l = &mut self.work_l[..n];

        match mode {
            StereoMode::LeftMonoToStereo => {
                work_l.copy_from_slice(&in_l[..n]);
            }
            StereoMode::RightMonoToStereo => {
                work_l.copy_from_slice(&right_source[..n]);
            }
            StereoMode::StereoToMono => {
                let mix_l = self.params.stereo_to_mono_mix.mix_l.get();
                let mix_r = self.params.stereo_to_mono_mix.mix_r.get();
                for i in 0..n {
                    work_l[i] = mix_l * in_l[i] + mix_r * right_source[i];
                }
            }
            StereoMode::TrueStereo => {
                work_l.copy_from_slice(&in_l[..n]);
            }
        }

        let in_gain_l = self.in_gain_l.get();
        let out_gain_l = self.out_gain_l.get();
        let dc_l = self.params.left.dc_blocker_enabled.get();
        let bypass_model_l = self.params.left.bypass_model.get();

        Self::run_channel_chain(
            &mut self.left,
            Some(&active_slot),
            bypass_model_l,
            work_l,
            in_gain_l,
            out_gain_l,
            dc_l,
        );

        if mode == StereoMode::TrueStereo {
            let work_r = &mut self.work_r[..n];
            work_r.copy_from_slice(&right_source[..n]);
            let in_gain_r = self.in_gain_r.get();
            let out_gain_r = self.out_gain_r.get();
            let dc_r = self.params.right.dc_blocker_enabled.get();
            Self::run_channel_chain(
                &mut self.right,
                None,
                true,
                work_r,
                in_gain_r,
                out_gain_r,
                dc_r,
            );
        } else {
            let (l, r) = (&self.work_l[..n], &mut self.work_r[..n]);
            r.copy_from_slice(l);
        }

        if self.reverb.enabled() {
            self.reverb.process(&mut self.work_l[..n], &mut self.work_r[..n]);
        }

        self.rec_l[..n].copy_from_slice(&self.work_l[..n]);
        self.rec_r[..n].copy_from_slice(&self.work_r[..n]);

        let backing_playing = self.backing_track.is_playing();
        if backing_playing {
            self.backing_track.fill(&mut self.work_l[..n], &mut self.work_r[..n]);
        }

        if self.params.backing_track_enabled_for_recording.get() && backing_playing {
            self.recorder.push(&self.work_l[..n], &self.work_r[..n], n);
        } else {
            self.recorder.push(&self.rec_l[..n], &self.rec_r[..n], n);
        }

        out_l[..n].copy_from_slice(&self.work_l[..n]);
        out_r[..n].copy_from_slice(&self.work_r[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NullModelLoader;

    fn test_engine(max_period: usize) -> Engine {
        Engine::new(48_000.0, max_period, Arc::new(NullModelLoader))
    }

    #[test]
    fn identity_when_bypassed() {
        let mut engine = test_engine(128);
        engine.params().global_bypass.set(true);
        let input: Vec<f32> = (0..128).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let mut out_l = vec![0.0f32; 128];
        let mut out_r = vec![0.0f32; 128];
        engine.process_stereo(&input, None, &mut out_l, &mut out_r, 128);
        assert_eq!(out_l, input);
        assert_eq!(out_r, input);
    }

    #[test]
    fn zero_length_period_is_a_no_op() {
        let mut engine = test_engine(128);
        let input = vec![0.5f32; 128];
        let mut out_l = vec![9.0f32; 128];
        let mut out_r = vec![9.0f32; 128];
        engine.process_stereo(&input, None, &mut out_l, &mut out_r, 0);
        assert!(out_l.iter().all(|&s| s == 9.0));
    }

    #[test]
    fn oversize_period_counts_xrun_and_passes_through() {
        let mut engine = test_engine(128);
        let input = vec![0.25f32; 256];
        let mut out_l = vec![0.0f32; 256];
        let mut out_r = vec![0.0f32; 256];
        engine.process_stereo(&input, None, &mut out_l, &mut out_r, 256);
        assert_eq!(engine.metrics().xrun_count, 1);
        assert_eq!(out_l, input);
    }

    #[test]
    fn stereo_to_mono_mix_is_exact_with_everything_else_disabled() {
        let mut engine = test_engine(4);
        engine.params().stereo_mode.set(StereoMode::StereoToMono);
        engine.params().stereo_to_mono_mix.mix_l.set(0.25);
        engine.params().stereo_to_mono_mix.mix_r.set(0.75);
        engine.params().left.bypass_model.set(true);
        engine.params().right.bypass_model.set(true);

        let in_l = vec![1.0f32; 4];
        let in_r = vec![-1.0f32; 4];
        let mut out_l = vec![0.0f32; 4];
        let mut out_r = vec![0.0f32; 4];
        engine.process_stereo(&in_l, Some(&in_r), &mut out_l, &mut out_r, 4);

        for &s in &out_l {
            assert!((s - (-0.5)).abs() < 1e-6, "got {s}");
        }
        assert_eq!(out_l, out_r);
    }

    #[test]
    fn true_stereo_skips_model_on_right_channel_only() {
        let mut engine = test_engine(16);
        engine.params().stereo_mode.set(StereoMode::TrueStereo);
        // bypass_model_l is false by default; bypass_model_r defaults true.
        // With the null model loaded on both slots the distinction isn't
        // audible, but true-stereo routing itself must keep L and R
        // independent rather than duplicating L into R.
        let in_l = vec![1.0f32; 16];
        let in_r = vec![0.5f32; 16];
        let mut out_l = vec![0.0f32; 16];
        let mut out_r = vec![0.0f32; 16];
        engine.process_stereo(&in_l, Some(&in_r), &mut out_l, &mut out_r, 16);
        assert_ne!(out_l, out_r);
    }

    #[test]
    fn recorder_sees_no_backing_track_bleed_when_recording_flag_is_off() {
        let mut engine = test_engine(8);
        let dir = tempfile::tempdir().unwrap();
        engine.params().backing_track_enabled_for_recording.set(false);
        engine.recorder().start(dir.path(), "take", 48000, "2026-01-01-000000").unwrap();

        let in_l = vec![0.0f32; 8];
        let mut out_l = vec![0.0f32; 8];
        let mut out_r = vec![0.0f32; 8];
        engine.process_stereo(&in_l, None, &mut out_l, &mut out_r, 8);
        engine.recorder().stop();
        assert_eq!(engine.recorder().dropped_frames(), 0);
    }

    #[test]
    fn gain_setters_clamp_and_smooth_toward_target() {
        let mut engine = test_engine(480);
        engine.params().left.set_input_gain_db(6.0);
        engine.params().left.bypass_model.set(true);

        let in_l = vec![0.1f32; 480];
        let mut out_l = vec![0.0f32; 480];
        let mut out_r = vec![0.0f32; 480];
        for _ in 0..200 {
            engine.process_stereo(&in_l, None, &mut out_l, &mut out_r, 480);
        }
        let expected = 0.1 * hoopipi_core::db_to_linear(6.0);
        assert!((out_l[479] - expected).abs() < 0.01, "got {}", out_l[479]);
    }
}
