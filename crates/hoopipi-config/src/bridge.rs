//! Applies a loaded [`RuntimeConfig`] onto a running [`Engine`], and takes a
//! snapshot back out for persistence. Kept separate from [`crate::runtime`]
//! so that module stays a pure serde/JSON concern.

use std::path::PathBuf;

use hoopipi_engine::stereo_mode::StereoMode;
use hoopipi_engine::Engine;

use crate::runtime::RuntimeConfig;

/// Applies every recognised option onto `engine`'s parameter plane and
/// (if present) starts loading the configured models into their slots.
/// Called once at startup after the engine is constructed (§11).
pub fn apply_to_engine(config: &RuntimeConfig, engine: &Engine) {
    let params = engine.params();

    params.left.bypass_model.set(config.bypass_model_l);
    params.right.bypass_model.set(config.bypass_model_r);

    if let Some(mode) = StereoMode::from_str_loose(&config.stereo_mode) {
        params.stereo_mode.set(mode);
    } else {
        tracing::warn!(mode = %config.stereo_mode, "unrecognised stereoMode in runtime.json; leaving default");
    }

    params.left.set_input_gain_db(config.input_gain_l);
    params.right.set_input_gain_db(config.input_gain_r);
    params.left.set_output_gain_db(config.output_gain_l);
    params.right.set_output_gain_db(config.output_gain_r);

    params.left.gate_enabled.set(config.gate_enabled_l);
    params.right.gate_enabled.set(config.gate_enabled_r);
    params.left.set_gate_threshold_db(config.gate_threshold_l);
    params.right.set_gate_threshold_db(config.gate_threshold_r);

    params.left.eq_enabled.set(config.eq_enabled_l);
    params.right.eq_enabled.set(config.eq_enabled_r);
    params.left.set_eq_bass_db(config.eq_bass_l);
    params.right.set_eq_bass_db(config.eq_bass_r);
    params.left.set_eq_mid_db(config.eq_mid_l);
    params.right.set_eq_mid_db(config.eq_mid_r);
    params.left.set_eq_treble_db(config.eq_treble_l);
    params.right.set_eq_treble_db(config.eq_treble_r);

    params.reverb.enabled.set(config.reverb_enabled);
    params.reverb.set_room_size(config.reverb_room_size);
    params.reverb.set_rt60(config.reverb_decay_time);
    params.reverb.set_dry(config.reverb_dry);
    params.reverb.set_wet(config.reverb_wet);

    params.stereo_to_mono_mix.mix_l.set(config.stereo_2_mono_mix_l.clamp(0.0, 1.0));
    params.stereo_to_mono_mix.mix_r.set(config.stereo_2_mono_mix_r.clamp(0.0, 1.0));

    params
        .backing_track_enabled_for_recording
        .set(config.backing_track_enabled_for_recording);

    if let Err(err) = engine.set_active_slot(config.active_slot) {
        tracing::warn!(error = %err, slot = config.active_slot, "invalid activeSlot in runtime.json; leaving default");
    }

    if let Some(path) = &config.slot_0_model {
        if let Err(err) = engine.load_model_async(0, PathBuf::from(path)) {
            tracing::warn!(error = %err, path, "failed to queue slot 0 model load from runtime.json");
        }
    }
    if let Some(path) = &config.slot_1_model {
        if let Err(err) = engine.load_model_async(1, PathBuf::from(path)) {
            tracing::warn!(error = %err, path, "failed to queue slot 1 model load from runtime.json");
        }
    }
}

/// Takes a snapshot of `engine`'s current parameters, preserving any
/// `extra` keys carried over from the previously loaded document.
pub fn snapshot_from_engine(engine: &Engine, extra: serde_json::Map<String, serde_json::Value>) -> RuntimeConfig {
    let params = engine.params();

    RuntimeConfig {
        active_slot: params.active_slot_index(),
        slot_0_model: engine.model_slot(0).ok().and_then(|s| s.current_path()).map(|p| p.display().to_string()),
        slot_1_model: engine.model_slot(1).ok().and_then(|s| s.current_path()).map(|p| p.display().to_string()),
        bypass_model_l: params.left.bypass_model.get(),
        bypass_model_r: params.right.bypass_model.get(),
        stereo_mode: params.stereo_mode.get().as_str().to_string(),
        input_gain_l: params.left.input_gain_db.get(),
        input_gain_r: params.right.input_gain_db.get(),
        output_gain_l: params.left.output_gain_db.get(),
        output_gain_r: params.right.output_gain_db.get(),
        gate_enabled_l: params.left.gate_enabled.get(),
        gate_enabled_r: params.right.gate_enabled.get(),
        gate_threshold_l: params.left.gate_threshold_db.get(),
        gate_threshold_r: params.right.gate_threshold_db.get(),
        eq_enabled_l: params.left.eq_enabled.get(),
        eq_enabled_r: params.right.eq_enabled.get(),
        eq_bass_l: params.left.eq_bass_db.get(),
        eq_bass_r: params.right.eq_bass_db.get(),
        eq_mid_l: params.left.eq_mid_db.get(),
        eq_mid_r: params.right.eq_mid_db.get(),
        eq_treble_l: params.left.eq_treble_db.get(),
        eq_treble_r: params.right.eq_treble_db.get(),
        reverb_enabled: params.reverb.enabled.get(),
        reverb_room_size: params.reverb.room_size.get(),
        reverb_decay_time: params.reverb.rt60_seconds.get(),
        reverb_dry: params.reverb.dry.get(),
        reverb_wet: params.reverb.wet.get(),
        stereo_2_mono_mix_l: params.stereo_to_mono_mix.mix_l.get(),
        stereo_2_mono_mix_r: params.stereo_to_mono_mix.mix_r.get(),
        backing_track_enabled_for_recording: params.backing_track_enabled_for_recording.get(),
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoopipi_engine::model::NullModelLoader;
    use std::sync::Arc;

    #[test]
    fn apply_then_snapshot_round_trips_reverb_settings() {
        let engine = Engine::new(48_000.0, 512, Arc::new(NullModelLoader));
        let mut config = RuntimeConfig::default();
        config.reverb_wet = 0.77;
        config.reverb_enabled = true;
        apply_to_engine(&config, &engine);

        let snapshot = snapshot_from_engine(&engine, Default::default());
        assert_eq!(snapshot.reverb_wet, 0.77);
        assert!(snapshot.reverb_enabled);
    }

    #[test]
    fn unrecognised_stereo_mode_does_not_panic() {
        let engine = Engine::new(48_000.0, 512, Arc::new(NullModelLoader));
        let mut config = RuntimeConfig::default();
        config.stereo_mode = "Sideways".to_string();
        apply_to_engine(&config, &engine);
    }
}
