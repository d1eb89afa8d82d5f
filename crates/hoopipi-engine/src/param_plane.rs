//! Every mutable control the engine exposes, as a flat set of lock-free
//! atomic cells. Non-RT threads (the control façade, config loader) write;
//! the RT thread reads. Setters clamp to the ranges documented per-field
//! below, matching §4.7 and the control protocol's option table.

use hoopipi_core::{FlagCell, ParamCell, ParamDescriptor, ParamId, ParamUnit};

use crate::stereo_mode::{StereoModeCell, StereoToMonoMix};

const INPUT_OUTPUT_GAIN_RANGE: (f32, f32) = (-40.0, 40.0);
const EQ_GAIN_RANGE: (f32, f32) = (-20.0, 20.0);
const GATE_THRESHOLD_RANGE: (f32, f32) = (-60.0, 0.0);
const REVERB_ROOM_RANGE: (f32, f32) = (0.0, 1.0);
const REVERB_RT60_RANGE: (f32, f32) = (0.1, 10.0);
const MIX_RANGE: (f32, f32) = (0.0, 1.0);

#[inline]
fn clamp(value: f32, range: (f32, f32)) -> f32 {
    value.clamp(range.0, range.1)
}

/// Per-channel gain, gate, and EQ controls — one instance each for L and R.
pub struct ChannelParams {
    pub input_gain_db: ParamCell,
    pub output_gain_db: ParamCell,

    pub gate_enabled: FlagCell,
    pub gate_threshold_db: ParamCell,

    pub eq_enabled: FlagCell,
    pub eq_bass_db: ParamCell,
    pub eq_mid_db: ParamCell,
    pub eq_treble_db: ParamCell,

    pub dc_blocker_enabled: FlagCell,

    pub bypass_model: FlagCell,
}

impl ChannelParams {
    /// `bypass_model_default` matches §6's documented per-slot bypass
    /// default: R defaults to bypassed, L does not.
    fn new(bypass_model_default: bool) -> Self {
        Self {
            input_gain_db: ParamCell::new(0.0),
            output_gain_db: ParamCell::new(0.0),
            gate_enabled: FlagCell::new(false),
            gate_threshold_db: ParamCell::new(-40.0),
            eq_enabled: FlagCell::new(false),
            eq_bass_db: ParamCell::new(0.0),
            eq_mid_db: ParamCell::new(0.0),
            eq_treble_db: ParamCell::new(0.0),
            dc_blocker_enabled: FlagCell::new(true),
            bypass_model: FlagCell::new(bypass_model_default),
        }
    }

    pub fn set_input_gain_db(&self, value: f32) {
        self.input_gain_db.set(clamp(value, INPUT_OUTPUT_GAIN_RANGE));
    }

    pub fn set_output_gain_db(&self, value: f32) {
        self.output_gain_db.set(clamp(value, INPUT_OUTPUT_GAIN_RANGE));
    }

    pub fn set_gate_threshold_db(&self, value: f32) {
        self.gate_threshold_db.set(clamp(value, GATE_THRESHOLD_RANGE));
    }

    pub fn set_eq_bass_db(&self, value: f32) {
        self.eq_bass_db.set(clamp(value, EQ_GAIN_RANGE));
    }

    pub fn set_eq_mid_db(&self, value: f32) {
        self.eq_mid_db.set(clamp(value, EQ_GAIN_RANGE));
    }

    pub fn set_eq_treble_db(&self, value: f32) {
        self.eq_treble_db.set(clamp(value, EQ_GAIN_RANGE));
    }
}

/// Reverb controls. Shared across both channels — the reverb processes the
/// L/R pair together (§4.4).
pub struct ReverbParams {
    pub enabled: FlagCell,
    pub room_size: ParamCell,
    pub rt60_seconds: ParamCell,
    pub dry: ParamCell,
    pub wet: ParamCell,
}

impl ReverbParams {
    fn new() -> Self {
        Self {
            enabled: FlagCell::new(false),
            room_size: ParamCell::new(0.3),
            rt60_seconds: ParamCell::new(2.0),
            dry: ParamCell::new(1.0),
            wet: ParamCell::new(0.3),
        }
    }

    pub fn set_room_size(&self, value: f32) {
        self.room_size.set(clamp(value, REVERB_ROOM_RANGE));
    }

    pub fn set_rt60(&self, value: f32) {
        self.rt60_seconds.set(clamp(value, REVERB_RT60_RANGE));
    }

    pub fn set_dry(&self, value: f32) {
        self.dry.set(clamp(value, MIX_RANGE));
    }

    pub fn set_wet(&self, value: f32) {
        self.wet.set(clamp(value, MIX_RANGE));
    }
}

/// The full set of mutable engine controls. One instance is shared (via
/// `Arc`) between the RT thread, the control façade, and the config loader.
pub struct ParameterPlane {
    pub global_bypass: FlagCell,
    pub active_slot: ParamCell,

    pub stereo_mode: StereoModeCell,
    pub stereo_to_mono_mix: StereoToMonoMix,

    pub left: ChannelParams,
    pub right: ChannelParams,

    pub reverb: ReverbParams,

    /// Whether a playing backing track is folded into what the recorder
    /// writes, independent of whether it's folded into the monitored
    /// output (§4.1 step 9). Defaults to included, matching "record what
    /// you hear".
    pub backing_track_enabled_for_recording: FlagCell,
}

impl ParameterPlane {
    /// The engine currently has exactly two loadable model slots (0, 1).
    pub const SLOT_COUNT: u8 = 2;

    pub fn new() -> Self {
        Self {
            global_bypass: FlagCell::new(false),
            active_slot: ParamCell::new(0.0),
            stereo_mode: StereoModeCell::default(),
            stereo_to_mono_mix: StereoToMonoMix::new(),
            left: ChannelParams::new(false),
            right: ChannelParams::new(true),
            reverb: ReverbParams::new(),
            backing_track_enabled_for_recording: FlagCell::new(true),
        }
    }

    /// The active model slot index (0 or 1) feeding the L-channel chain's
    /// model step (§4.1 step 6c): only one of the two loaded slots is "live"
    /// at a time.
    pub fn active_slot_index(&self) -> u8 {
        (self.active_slot.get() as u8).min(Self::SLOT_COUNT - 1)
    }

    /// Selects which of the two model slots is live. Out-of-range indices
    /// clamp to the last valid slot rather than panicking.
    pub fn set_active_slot(&self, index: u8) {
        self.active_slot.set(index.min(Self::SLOT_COUNT - 1) as f32);
    }

    /// Sets the noise gate enabled flag on both channels at once, matching
    /// the façade-level `setNoiseGateEnabled` (no `L`/`R` suffix) forwarding
    /// described in §9 open question 3.
    pub fn set_gate_enabled_both(&self, enabled: bool) {
        self.left.gate_enabled.set(enabled);
        self.right.gate_enabled.set(enabled);
    }

    /// Sets the EQ enabled flag on both channels at once.
    pub fn set_eq_enabled_both(&self, enabled: bool) {
        self.left.eq_enabled.set(enabled);
        self.right.eq_enabled.set(enabled);
    }

    /// Static introspection metadata for every named parameter, built on
    /// `hoopipi-core`'s [`ParamDescriptor`]/[`ParamUnit`] types so a future
    /// GUI or automation consumer gets the same self-describing surface
    /// a plugin host would (§4.7 "Enumeration").
    pub fn descriptors() -> &'static [(&'static str, ParamDescriptor)] {
        &[
            (
                "inputGainL",
                ParamDescriptor {
                    name: "Input Gain L",
                    short_name: "InGainL",
                    unit: ParamUnit::Decibels,
                    min: -40.0,
                    max: 40.0,
                    default: 0.0,
                    step: 0.5,
                    id: ParamId(1),
                    string_id: "input_gain_l",
                    scale: hoopipi_core::ParamScale::Linear,
                    flags: hoopipi_core::ParamFlags::AUTOMATABLE,
                    group: "gain",
                    modulation_id: None,
                },
            ),
            (
                "gateThresholdL",
                ParamDescriptor::gain_db("Gate Threshold L", "GateL", -60.0, 0.0, -40.0)
                    .with_id(ParamId(10), "gate_threshold_l")
                    .with_group("gate"),
            ),
            (
                "eqBassL",
                ParamDescriptor::gain_db("EQ Bass L", "BassL", -20.0, 20.0, 0.0)
                    .with_id(ParamId(20), "eq_bass_l")
                    .with_group("eq"),
            ),
            (
                "eqMidL",
                ParamDescriptor::gain_db("EQ Mid L", "MidL", -20.0, 20.0, 0.0)
                    .with_id(ParamId(21), "eq_mid_l")
                    .with_group("eq"),
            ),
            (
                "eqTrebleL",
                ParamDescriptor::gain_db("EQ Treble L", "TrebL", -20.0, 20.0, 0.0)
                    .with_id(ParamId(22), "eq_treble_l")
                    .with_group("eq"),
            ),
            (
                "reverbRoomSize",
                ParamDescriptor {
                    name: "Reverb Room Size",
                    short_name: "RevRoom",
                    unit: ParamUnit::None,
                    min: 0.0,
                    max: 1.0,
                    default: 0.3,
                    step: 0.01,
                    id: ParamId(30),
                    string_id: "reverb_room_size",
                    scale: hoopipi_core::ParamScale::Linear,
                    flags: hoopipi_core::ParamFlags::AUTOMATABLE,
                    group: "reverb",
                    modulation_id: None,
                },
            ),
            (
                "reverbRt60",
                ParamDescriptor::time_ms("Reverb RT60", "RevRT60", 100.0, 10_000.0, 2000.0)
                    .with_id(ParamId(31), "reverb_rt60")
                    .with_group("reverb"),
            ),
        ]
    }
}

impl Default for ParameterPlane {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_setters_clamp_to_documented_range() {
        let plane = ParameterPlane::new();
        plane.left.set_input_gain_db(1000.0);
        assert_eq!(plane.left.input_gain_db.get(), 40.0);
        plane.left.set_input_gain_db(-1000.0);
        assert_eq!(plane.left.input_gain_db.get(), -40.0);
    }

    #[test]
    fn eq_setters_clamp_to_documented_range() {
        let plane = ParameterPlane::new();
        plane.left.set_eq_bass_db(100.0);
        assert_eq!(plane.left.eq_bass_db.get(), 20.0);
    }

    #[test]
    fn gate_threshold_clamps() {
        let plane = ParameterPlane::new();
        plane.right.set_gate_threshold_db(10.0);
        assert_eq!(plane.right.gate_threshold_db.get(), 0.0);
    }

    #[test]
    fn reverb_setters_clamp() {
        let plane = ParameterPlane::new();
        plane.reverb.set_room_size(5.0);
        assert_eq!(plane.reverb.room_size.get(), 1.0);
        plane.reverb.set_rt60(0.0);
        assert_eq!(plane.reverb.rt60_seconds.get(), 0.1);
    }

    #[test]
    fn right_channel_model_bypass_defaults_true() {
        let plane = ParameterPlane::new();
        assert!(!plane.left.bypass_model.get());
        assert!(plane.right.bypass_model.get());
    }

    #[test]
    fn set_gate_enabled_both_forwards_to_both_channels() {
        let plane = ParameterPlane::new();
        plane.set_gate_enabled_both(true);
        assert!(plane.left.gate_enabled.get());
        assert!(plane.right.gate_enabled.get());
    }

    #[test]
    fn active_slot_clamps_to_valid_range() {
        let plane = ParameterPlane::new();
        assert_eq!(plane.active_slot_index(), 0);
        plane.set_active_slot(1);
        assert_eq!(plane.active_slot_index(), 1);
        plane.set_active_slot(200);
        assert_eq!(plane.active_slot_index(), 1);
    }

    #[test]
    fn descriptors_are_non_empty_and_named() {
        let descriptors = ParameterPlane::descriptors();
        assert!(!descriptors.is_empty());
        assert!(descriptors.iter().any(|(name, _)| *name == "reverbRoomSize"));
    }
}
