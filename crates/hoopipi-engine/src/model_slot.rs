//! A hot-swappable model slot: state machine, fade envelope, and the
//! worker thread that performs the load/prewarm/publish protocol off the
//! RT path.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use parking_lot::{Condvar, Mutex};

use crate::error::ModelLoadError;
use crate::model::{Model, ModelLoader};

/// Linear fade length in samples (~5 ms at 48 kHz), fixed per §4.2.
pub const FADE_SAMPLES: u32 = 256;

/// Observable lifecycle state of a [`ModelSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Loading,
    Ready,
    FadingOut,
    FadingIn,
}

impl SlotState {
    const EMPTY: u8 = 0;
    const LOADING: u8 = 1;
    const READY: u8 = 2;
    const FADING_OUT: u8 = 3;
    const FADING_IN: u8 = 4;

    const fn to_tag(self) -> u8 {
        match self {
            SlotState::Empty => Self::EMPTY,
            SlotState::Loading => Self::LOADING,
            SlotState::Ready => Self::READY,
            SlotState::FadingOut => Self::FADING_OUT,
            SlotState::FadingIn => Self::FADING_IN,
        }
    }

    const fn from_tag(tag: u8) -> Self {
        match tag {
            Self::LOADING => SlotState::Loading,
            Self::READY => SlotState::Ready,
            Self::FADING_OUT => SlotState::FadingOut,
            Self::FADING_IN => SlotState::FadingIn,
            _ => SlotState::Empty,
        }
    }
}

/// Linear fade applied around a hot-swap, owned and advanced exclusively by
/// the RT thread.
struct FadeEnvelope {
    gain: f32,
    step: f32,
    samples_remaining: u32,
}

impl FadeEnvelope {
    fn idle_at(gain: f32) -> Self {
        Self {
            gain,
            step: 0.0,
            samples_remaining: 0,
        }
    }

    fn start_fade_out(&mut self) {
        self.step = -(self.gain.max(1e-9)) / FADE_SAMPLES as f32;
        self.samples_remaining = FADE_SAMPLES;
    }

    fn start_fade_in(&mut self) {
        self.gain = 0.0;
        self.step = 1.0 / FADE_SAMPLES as f32;
        self.samples_remaining = FADE_SAMPLES;
    }

    /// Advances by one sample, returning the gain to apply for that sample.
    #[inline]
    fn advance(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.gain = (self.gain + self.step).clamp(0.0, 1.0);
            self.samples_remaining -= 1;
        }
        self.gain
    }

    fn is_settled(&self) -> bool {
        self.samples_remaining == 0
    }
}

/// A fade-completion rendezvous: the worker thread signals this once the RT
/// thread has driven the fade envelope to zero, so the hot-swap protocol can
/// wait (with a bounded timeout) before tearing down the old model.
#[derive(Default)]
struct FadeOutComplete {
    lock: Mutex<bool>,
    condvar: Condvar,
}

impl FadeOutComplete {
    fn reset(&self) {
        *self.lock.lock() = false;
    }

    fn signal(&self) {
        *self.lock.lock() = true;
        self.condvar.notify_all();
    }

    /// Waits up to `timeout` for the signal; returns whether it fired.
    fn wait(&self, timeout: Duration) -> bool {
        let mut guard = self.lock.lock();
        if *guard {
            return true;
        }
        self.condvar.wait_for(&mut guard, timeout);
        *guard
    }
}

/// Pending fade transition, set by the non-RT worker thread and consumed
/// (and cleared) by the RT thread at the top of the next `process` call.
/// The worker never touches the fade envelope itself — only the RT thread
/// ever mutates `fade_gain_bits`/`fade_step_bits`/`fade_samples_remaining`,
/// which keeps the hand-off lock-free instead of a cross-thread `Mutex`.
const FADE_TRIGGER_NONE: u8 = 0;
const FADE_TRIGGER_FADE_OUT: u8 = 1;
const FADE_TRIGGER_FADE_IN: u8 = 2;

/// One of the engine's two independently-loadable model slots; only the
/// slot selected by `ParameterPlane::active_slot_index` feeds the live
/// signal path at any moment (see `Engine::active_model_slot`).
pub struct ModelSlot {
    state: AtomicU8,
    model: ArcSwapOption<dyn Model + Send + Sync>,
    normalization_gain_bits: AtomicU32,
    current_path: Mutex<Option<PathBuf>>,
    fade_gain_bits: AtomicU32,
    fade_step_bits: AtomicU32,
    fade_samples_remaining: AtomicU32,
    fade_trigger: AtomicU8,
    fade_out_complete: FadeOutComplete,
    worker_running: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
    loader: Arc<dyn ModelLoader>,
    max_block_size: usize,
    on_load_complete: Mutex<Option<Box<dyn Fn(Result<(), ModelLoadError>) + Send + Sync>>>,
}

/// Fixed headroom folded into every loaded model's normalisation gain
/// (§4.2 step 4).
const HEADROOM_DB: f32 = -6.0;

impl ModelSlot {
    /// `max_block_size` is the engine's configured max period, passed to
    /// [`ModelLoader::load`] on every hot-swap so the model can size its
    /// internal scratch space once (§4.2 step 4).
    pub fn new(loader: Arc<dyn ModelLoader>, max_block_size: usize) -> Self {
        Self {
            state: AtomicU8::new(SlotState::Empty.to_tag()),
            model: ArcSwapOption::from(None),
            normalization_gain_bits: AtomicU32::new(1.0f32.to_bits()),
            current_path: Mutex::new(None),
            fade_gain_bits: AtomicU32::new(0.0f32.to_bits()),
            fade_step_bits: AtomicU32::new(0.0f32.to_bits()),
            fade_samples_remaining: AtomicU32::new(0),
            fade_trigger: AtomicU8::new(FADE_TRIGGER_NONE),
            fade_out_complete: FadeOutComplete::default(),
            worker_running: AtomicBool::new(true),
            worker: Mutex::new(None),
            loader,
            max_block_size,
            on_load_complete: Mutex::new(None),
        }
    }

    /// Loads the RT-owned fade envelope from its atomic fields.
    #[inline]
    fn load_fade(&self) -> FadeEnvelope {
        FadeEnvelope {
            gain: f32::from_bits(self.fade_gain_bits.load(Ordering::Relaxed)),
            step: f32::from_bits(self.fade_step_bits.load(Ordering::Relaxed)),
            samples_remaining: self.fade_samples_remaining.load(Ordering::Relaxed),
        }
    }

    /// Publishes the RT-owned fade envelope back to its atomic fields.
    #[inline]
    fn store_fade(&self, fade: FadeEnvelope) {
        self.fade_gain_bits.store(fade.gain.to_bits(), Ordering::Relaxed);
        self.fade_step_bits.store(fade.step.to_bits(), Ordering::Relaxed);
        self.fade_samples_remaining
            .store(fade.samples_remaining, Ordering::Relaxed);
    }

    pub fn state(&self) -> SlotState {
        SlotState::from_tag(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SlotState) {
        self.state.store(state.to_tag(), Ordering::Release);
    }

    /// RT-safe snapshot of readiness.
    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(
            self.state(),
            SlotState::Ready | SlotState::FadingOut | SlotState::FadingIn
        )
    }

    pub fn current_path(&self) -> Option<PathBuf> {
        self.current_path.lock().clone()
    }

    /// Registers a callback invoked from the worker thread once a load
    /// attempt (success or failure) completes.
    pub fn set_load_complete_callback(
        &self,
        callback: Box<dyn Fn(Result<(), ModelLoadError>) + Send + Sync>,
    ) {
        *self.on_load_complete.lock() = Some(callback);
    }

    /// Non-RT: queues a hot-swap on a fresh worker thread. Any in-flight
    /// load from a previous call is not cancelled — callers are expected to
    /// serialize calls to `load_async` per slot (the engine does, via its
    /// own control-thread dispatch). Takes the slot by `Arc` (clone your
    /// handle before calling) since the worker thread needs its own owned
    /// reference to outlive this call.
    pub fn load_async(self: Arc<Self>, path: PathBuf) {
        let worker_slot = Arc::clone(&self);
        let handle = std::thread::spawn(move || worker_slot.hot_swap(&path));
        *self.worker.lock() = Some(handle);
    }

    /// The hot-swap protocol from §4.2, run entirely off the RT thread.
    fn hot_swap(&self, path: &Path) {
        if self.state() != SlotState::Empty {
            self.fade_out_complete.reset();
            // Arm the trigger before publishing the state change: the RT
            // thread's `state()` load is an Acquire, so once it observes
            // `FadingOut` it is guaranteed to also observe this store.
            self.fade_trigger.store(FADE_TRIGGER_FADE_OUT, Ordering::Relaxed);
            self.set_state(SlotState::FadingOut);
            self.fade_out_complete.wait(Duration::from_millis(60));
        }

        self.set_state(SlotState::Loading);

        if !self.worker_running.load(Ordering::Acquire) {
            return;
        }

        let load_result = self.loader.load(path, self.max_block_size);
        let new_model = match load_result {
            Ok(model) => model,
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "model load failed");
                *self.current_path.lock() = None;
                self.set_state(SlotState::Empty);
                if let Some(callback) = self.on_load_complete.lock().as_ref() {
                    callback(Err(err));
                }
                return;
            }
        };

        let trim_db = new_model.recommended_trim_db();
        let norm_gain = hoopipi_core::db_to_linear(HEADROOM_DB + trim_db);

        // Prewarm: run 256 zeros through the model to settle internal state.
        let mut scratch = vec![0.0f32; FADE_SAMPLES as usize];
        new_model.process(&mut scratch);

        self.normalization_gain_bits.store(norm_gain.to_bits(), Ordering::Relaxed);
        self.model.store(Some(new_model));
        *self.current_path.lock() = Some(path.to_path_buf());

        self.set_state(SlotState::Ready);
        self.fade_trigger.store(FADE_TRIGGER_FADE_IN, Ordering::Relaxed);
        self.set_state(SlotState::FadingIn);

        if let Some(callback) = self.on_load_complete.lock().as_ref() {
            callback(Ok(()));
        }
    }

    /// Unloads the slot back to `Empty` without a replacement model.
    pub fn unload(&self) {
        self.model.store(None);
        *self.current_path.lock() = None;
        self.set_state(SlotState::Empty);
        self.fade_trigger.store(FADE_TRIGGER_NONE, Ordering::Relaxed);
        self.store_fade(FadeEnvelope::idle_at(0.0));
    }

    /// RT-safe: processes `buf` through the currently loaded model (if
    /// ready), applying normalisation gain and the fade envelope. A no-op
    /// passthrough when the slot isn't ready.
    ///
    /// The fade envelope and normalisation gain live in atomics rather than
    /// a lock: this is the only place either is mutated from the RT path,
    /// and the worker thread only ever flips `fade_trigger`/`state`, so
    /// there is no unbounded lock on the audio thread.
    #[inline]
    pub fn process(&self, buf: &mut [f32]) {
        match self.fade_trigger.swap(FADE_TRIGGER_NONE, Ordering::Acquire) {
            FADE_TRIGGER_FADE_OUT => {
                let mut fade = self.load_fade();
                fade.start_fade_out();
                self.store_fade(fade);
            }
            FADE_TRIGGER_FADE_IN => {
                let mut fade = self.load_fade();
                fade.start_fade_in();
                self.store_fade(fade);
            }
            _ => {}
        }

        if !self.is_ready() {
            return;
        }
        let guard = self.model.load();
        if let Some(model) = guard.as_ref() {
            model.process(buf);
            let norm_gain = f32::from_bits(self.normalization_gain_bits.load(Ordering::Relaxed));
            if (norm_gain - 1.0).abs() > f32::EPSILON {
                for sample in buf.iter_mut() {
                    *sample *= norm_gain;
                }
            }
        }

        let mut fade = self.load_fade();
        for sample in buf.iter_mut() {
            *sample *= fade.advance();
        }
        let settled = fade.is_settled();
        self.store_fade(fade);

        if settled {
            match self.state() {
                SlotState::FadingOut => {
                    self.fade_out_complete.signal();
                }
                SlotState::FadingIn => {
                    self.set_state(SlotState::Ready);
                }
                _ => {}
            }
        }
    }

    /// Signals the worker thread (if any in-flight load is polling this
    /// flag between steps) to bail out cleanly at the next checkpoint.
    pub fn shutdown(&self) {
        self.worker_running.store(false, Ordering::Release);
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NullModelLoader;

    fn new_slot() -> Arc<ModelSlot> {
        Arc::new(ModelSlot::new(Arc::new(NullModelLoader), 256))
    }

    #[test]
    fn starts_empty_and_passthrough() {
        let slot = new_slot();
        assert_eq!(slot.state(), SlotState::Empty);
        let mut buf = vec![1.0, 0.5];
        slot.process(&mut buf);
        assert_eq!(buf, vec![1.0, 0.5]);
    }

    #[test]
    fn load_async_reaches_ready_and_fades_in() {
        let slot = new_slot();
        Arc::clone(&slot).load_async(PathBuf::from("/tmp/fake-model.bin"));
        // Wait for the worker thread to complete the hot-swap protocol.
        for _ in 0..1000 {
            if slot.is_ready() {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(slot.is_ready());

        // Drive the fade-in to completion: output magnitude should climb
        // from 0 toward the normalised (identity) model's output over
        // <= FADE_SAMPLES. NullModel reports 0 dB trim, so the slot's fixed
        // -6 dB headroom is the only gain applied once the fade settles.
        let target = hoopipi_core::db_to_linear(HEADROOM_DB);
        let mut buf = vec![1.0f32; FADE_SAMPLES as usize];
        slot.process(&mut buf);
        assert!((buf[0] - 0.0).abs() < 0.1, "first sample near zero, got {}", buf[0]);
        assert!(
            (buf[FADE_SAMPLES as usize - 1] - target).abs() < 0.05,
            "last sample near {target}, got {}",
            buf[FADE_SAMPLES as usize - 1]
        );
        assert_eq!(slot.state(), SlotState::Ready);
    }

    #[test]
    fn second_load_async_ramps_output_down_before_loading_new_model() {
        let slot = new_slot();
        Arc::clone(&slot).load_async(PathBuf::from("/tmp/fake-model-a.bin"));
        for _ in 0..1000 {
            if slot.is_ready() {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(slot.is_ready());

        // Drive the first fade-in to completion so the envelope is settled
        // at gain 1.0 before the second hot-swap starts its fade-out.
        let mut warm = vec![1.0f32; FADE_SAMPLES as usize];
        slot.process(&mut warm);
        assert_eq!(slot.state(), SlotState::Ready);

        // A second load on an already-Ready slot should drive a real
        // fade-out: the worker blocks in `fade_out_complete.wait` until this
        // thread's `process` calls carry the envelope down to zero.
        Arc::clone(&slot).load_async(PathBuf::from("/tmp/fake-model-b.bin"));
        for _ in 0..1000 {
            if slot.state() == SlotState::FadingOut {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(slot.state(), SlotState::FadingOut);

        const PERIOD: usize = 32;
        let mut magnitudes = Vec::new();
        for _ in 0..(FADE_SAMPLES as usize / PERIOD + 2) {
            if slot.state() != SlotState::FadingOut {
                break;
            }
            let mut buf = vec![1.0f32; PERIOD];
            slot.process(&mut buf);
            magnitudes.push(buf[0].abs());
        }

        assert!(
            magnitudes.len() >= 2,
            "expected multiple RT periods during the fade-out, got {magnitudes:?}"
        );
        assert!(
            magnitudes.first().unwrap() > magnitudes.last().unwrap(),
            "output should ramp down across periods, got {magnitudes:?}"
        );
        assert!(
            *magnitudes.last().unwrap() < 0.2,
            "output should approach zero by the end of the ramp, got {magnitudes:?}"
        );

        for _ in 0..1000 {
            if slot.is_ready() {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(slot.is_ready());
    }

    #[test]
    fn unload_returns_to_empty() {
        let slot = new_slot();
        Arc::clone(&slot).load_async(PathBuf::from("/tmp/fake-model.bin"));
        for _ in 0..1000 {
            if slot.is_ready() {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        slot.unload();
        assert_eq!(slot.state(), SlotState::Empty);
    }
}
