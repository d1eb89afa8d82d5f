//! Eight-channel feedback-delay-network reverb.
//!
//! Topology: an input frame is spread across 8 internal channels, run
//! through a 4-stage diffuser (per-channel short delays with seeded random
//! lengths and polarity flips, each stage followed by an 8-point Hadamard
//! mix), then into a late feedback network (8 delay lines with
//! exponentially spaced lengths, Householder-mixed feedback, decay gain
//! derived from room size and RT60). All delay buffers are sized once, at
//! construction, to the room-size=1.0 worst case; `set_room_size`/
//! `set_rt60` only mutate read-length counters and the feedback gain, never
//! reallocate — this is what keeps reconfiguration safe to call from a
//! control thread while the RT thread is mid-`process`.

use libm::powf;

const CHANNELS: usize = 8;
const DIFFUSER_STAGES: usize = 4;
/// Nominal center delay per diffuser stage, in ms, before per-channel
/// randomization. Stages grow geometrically so each stage decorrelates at
/// a different time scale.
const DIFFUSER_STAGE_BASE_MS: [f32; DIFFUSER_STAGES] = [3.0, 6.5, 13.0, 27.0];
/// Per-channel delay length is `base_ms * (0.5 + rand_frac)`, i.e. spread
/// across [0.5x, 1.5x] of the stage's nominal center.
const DIFFUSER_SPREAD_LOW: f32 = 0.5;
const DIFFUSER_SPREAD_RANGE: f32 = 1.0;

const ROOM_SIZE_MIN: f32 = 0.0;
const ROOM_SIZE_MAX: f32 = 1.0;
const RT60_MIN: f32 = 0.1;
const RT60_MAX: f32 = 10.0;
const BASE_MS_AT_MIN_ROOM: f32 = 20.0;
const BASE_MS_SPAN: f32 = 180.0;

/// A small deterministic xorshift32 PRNG, seeded with the stable per-stage
/// formula `12345 + stage * 6789`, so the impulse response is reproducible
/// build-to-build (no external RNG crate needed for this).
struct Xorshift32(u32);

impl Xorshift32 {
    fn new(seed: u32) -> Self {
        Self(if seed == 0 { 1 } else { seed })
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Uniform float in [0, 1).
    fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// +1.0 or -1.0, each with probability 1/2.
    fn next_sign(&mut self) -> f32 {
        if self.next_u32() & 1 == 0 { 1.0 } else { -1.0 }
    }
}

/// A single delay line backed by a fixed-capacity ring buffer. The buffer
/// is sized to `max_len` once and never reallocated; `active_len` (always
/// `<= max_len`) controls how many samples back the read pointer trails
/// the write pointer, and can be changed freely at any time.
struct RingDelay {
    buf: Vec<f32>,
    write_pos: usize,
    active_len: usize,
}

impl RingDelay {
    fn new(max_len: usize) -> Self {
        Self {
            buf: vec![0.0; max_len.max(1)],
            write_pos: 0,
            active_len: max_len.max(1),
        }
    }

    fn set_active_len(&mut self, len: usize) {
        self.active_len = len.clamp(1, self.buf.len());
    }

    /// Reads the delayed sample without advancing the line.
    #[inline]
    fn peek(&self) -> f32 {
        let cap = self.buf.len();
        let read_pos = (self.write_pos + cap - self.active_len) % cap;
        self.buf[read_pos]
    }

    /// Writes a new input sample and advances the write pointer.
    #[inline]
    fn push(&mut self, input: f32) {
        self.buf[self.write_pos] = input;
        self.write_pos = (self.write_pos + 1) % self.buf.len();
    }

    /// Convenience for the diffuser stages, which have no separate feedback
    /// path: read-then-write in one step.
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let out = self.peek();
        self.push(input);
        out
    }
}

/// 8-point fast Walsh-Hadamard transform, normalized by 1/sqrt(8) so the
/// matrix is orthogonal (energy-preserving) — used as the diffuser's
/// inter-channel mix after each delay stage.
fn hadamard8(x: &mut [f32; CHANNELS]) {
    const SCALE: f32 = core::f32::consts::FRAC_1_SQRT_2 * 0.5; // 1/sqrt(8)
    let mut h = 1;
    while h < CHANNELS {
        let mut i = 0;
        while i < CHANNELS {
            for j in i..i + h {
                let a = x[j];
                let b = x[j + h];
                x[j] = a + b;
                x[j + h] = a - b;
            }
            i += h * 2;
        }
        h *= 2;
    }
    for v in x.iter_mut() {
        *v *= SCALE;
    }
}

/// Householder reflection of the all-ones vector: `Hx = x - (2/C) * sum(x)`.
/// Cheap (one reduction, one broadcast subtract) and, like the Hadamard
/// mix, orthogonal — used as the feedback network's inter-channel mix.
fn householder8(x: &mut [f32; CHANNELS]) {
    let sum: f32 = x.iter().sum();
    let scaled = sum * (2.0 / CHANNELS as f32);
    for v in x.iter_mut() {
        *v -= scaled;
    }
}

struct DiffuserStage {
    delays: [RingDelay; CHANNELS],
    signs: [f32; CHANNELS],
}

impl DiffuserStage {
    fn new(stage_index: usize, sample_rate: f32) -> Self {
        let mut rng = Xorshift32::new(12345u32.wrapping_add(stage_index as u32 * 6789));
        let base_ms = DIFFUSER_STAGE_BASE_MS[stage_index];
        let mut signs = [0.0f32; CHANNELS];
        let delays = core::array::from_fn(|_| {
            let frac = DIFFUSER_SPREAD_LOW + rng.next_f32() * DIFFUSER_SPREAD_RANGE;
            let ms = base_ms * frac;
            let len = ((ms * 0.001 * sample_rate).round() as usize).max(1);
            RingDelay::new(len)
        });
        for s in signs.iter_mut() {
            *s = rng.next_sign();
        }
        Self { delays, signs }
    }

    fn process(&mut self, channels: &mut [f32; CHANNELS]) {
        for c in 0..CHANNELS {
            let delayed = self.delays[c].process(channels[c]);
            channels[c] = delayed * self.signs[c];
        }
        hadamard8(channels);
    }
}

/// Eight-channel FDN reverb with pre-allocated worst-case delay buffers.
pub struct Reverb {
    sample_rate: f32,
    enabled: bool,

    diffuser: [DiffuserStage; DIFFUSER_STAGES],
    feedback_lines: [RingDelay; CHANNELS],

    room_size: f32,
    rt60: f32,
    decay_gain: f32,

    dry: f32,
    wet: f32,
}

impl Reverb {
    /// Creates a reverb pre-allocated for the worst case (room size 1.0) at
    /// `sample_rate`. `sample_rate` is fixed for the engine's lifetime, per
    /// the engine's own construction-time contract.
    pub fn new(sample_rate: f32) -> Self {
        let diffuser = core::array::from_fn(|i| DiffuserStage::new(i, sample_rate));

        let worst_base_ms = BASE_MS_AT_MIN_ROOM + BASE_MS_SPAN * ROOM_SIZE_MAX;
        let worst_base_samples = (worst_base_ms * 0.001 * sample_rate).round() as usize;
        let feedback_lines = core::array::from_fn(|c| {
            let len = Self::feedback_len(worst_base_samples, c);
            RingDelay::new(len)
        });

        let mut reverb = Self {
            sample_rate,
            enabled: false,
            diffuser,
            feedback_lines,
            room_size: 0.3,
            rt60: 2.0,
            decay_gain: 0.0,
            dry: 1.0,
            wet: 0.3,
        };
        reverb.recalculate();
        reverb
    }

    fn feedback_len(base_samples: usize, channel: usize) -> usize {
        let spacing = powf(2.0, channel as f32 / CHANNELS as f32);
        ((base_samples as f32 * spacing).round() as usize).max(1)
    }

    fn recalculate(&mut self) {
        let base_ms = BASE_MS_AT_MIN_ROOM + BASE_MS_SPAN * self.room_size;
        let base_samples = (base_ms * 0.001 * self.sample_rate).round() as usize;
        for (c, line) in self.feedback_lines.iter_mut().enumerate() {
            line.set_active_len(Self::feedback_len(base_samples, c));
        }
        let loop_time_s = 1.5 * base_ms * 1e-3;
        self.decay_gain = powf(10.0, (-60.0 * loop_time_s) / (20.0 * self.rt60));
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets room size in `[0, 1]`, remapping the feedback network's active
    /// delay lengths (not reallocating) and recomputing decay gain.
    pub fn set_room_size(&mut self, size: f32) {
        self.room_size = size.clamp(ROOM_SIZE_MIN, ROOM_SIZE_MAX);
        self.recalculate();
    }

    pub fn room_size(&self) -> f32 {
        self.room_size
    }

    /// Sets the target RT60 in seconds, clamped to `[0.1, 10]`.
    pub fn set_rt60(&mut self, rt60_seconds: f32) {
        self.rt60 = rt60_seconds.clamp(RT60_MIN, RT60_MAX);
        self.recalculate();
    }

    pub fn rt60(&self) -> f32 {
        self.rt60
    }

    /// Sets dry level, clamped to `[0, 1]`.
    pub fn set_dry(&mut self, dry: f32) {
        self.dry = dry.clamp(0.0, 1.0);
    }

    pub fn dry(&self) -> f32 {
        self.dry
    }

    /// Sets wet level, clamped to `[0, 1]`.
    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    pub fn wet(&self) -> f32 {
        self.wet
    }

    /// Processes `left`/`right` in place. A no-op (hard bypass, sample-exact
    /// passthrough) when disabled. `left.len()` must equal `right.len()`.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        if !self.enabled {
            return;
        }
        debug_assert_eq!(left.len(), right.len());
        let half = CHANNELS / 2;
        for i in 0..left.len() {
            let in_l = left[i];
            let in_r = right[i];

            let mut channels = [0.0f32; CHANNELS];
            for (c, slot) in channels.iter_mut().enumerate() {
                *slot = if c % 2 == 0 { in_l } else { in_r };
            }

            for stage in self.diffuser.iter_mut() {
                stage.process(&mut channels);
            }

            // Read each line's current output (the tap used for this
            // sample's wet signal), then separately mix+gain those taps to
            // form the feedback that gets written back for next time.
            let mut tapped = [0.0f32; CHANNELS];
            for c in 0..CHANNELS {
                tapped[c] = self.feedback_lines[c].peek();
            }
            let mut feedback = tapped;
            for v in feedback.iter_mut() {
                *v *= self.decay_gain;
            }
            householder8(&mut feedback);
            for c in 0..CHANNELS {
                self.feedback_lines[c].push(channels[c] + feedback[c]);
            }

            let mut sum_l = 0.0;
            let mut sum_r = 0.0;
            for c in 0..CHANNELS {
                if c % 2 == 0 {
                    sum_l += tapped[c];
                } else {
                    sum_r += tapped[c];
                }
            }
            let wet_l = sum_l / half as f32;
            let wet_r = sum_r / half as f32;

            left[i] = self.dry * in_l + self.wet * wet_l;
            right[i] = self.dry * in_r + self.wet * wet_r;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_is_sample_exact_passthrough() {
        let mut reverb = Reverb::new(48000.0);
        let mut l = vec![0.5, -0.3, 0.1, 0.0];
        let mut r = vec![-0.2, 0.4, 0.0, 0.1];
        let (ol, or_) = (l.clone(), r.clone());
        reverb.process(&mut l, &mut r);
        assert_eq!(l, ol);
        assert_eq!(r, or_);
    }

    #[test]
    fn enabled_produces_finite_output() {
        let mut reverb = Reverb::new(48000.0);
        reverb.set_enabled(true);
        reverb.set_room_size(0.5);
        reverb.set_rt60(1.5);
        let mut l = vec![0.0f32; 4800];
        let mut r = vec![0.0f32; 4800];
        l[0] = 1.0;
        r[0] = 1.0;
        reverb.process(&mut l, &mut r);
        for (a, b) in l.iter().zip(r.iter()) {
            assert!(a.is_finite());
            assert!(b.is_finite());
        }
    }

    #[test]
    fn room_size_and_rt60_clamp() {
        let mut reverb = Reverb::new(48000.0);
        reverb.set_room_size(5.0);
        assert_eq!(reverb.room_size(), 1.0);
        reverb.set_rt60(100.0);
        assert_eq!(reverb.rt60(), 10.0);
    }

    #[test]
    fn reconfigure_while_logically_running_does_not_reallocate() {
        let mut reverb = Reverb::new(48000.0);
        let caps: Vec<usize> = reverb.feedback_lines.iter().map(|l| l.buf.len()).collect();
        reverb.set_room_size(0.1);
        reverb.set_room_size(0.9);
        let caps_after: Vec<usize> = reverb.feedback_lines.iter().map(|l| l.buf.len()).collect();
        assert_eq!(caps, caps_after);
    }
}
