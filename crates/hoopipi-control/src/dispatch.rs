//! Translates one decoded request into at most one call into the engine,
//! backing track, or recorder (§4.8), always from a non-RT thread.

use std::path::PathBuf;

use serde_json::{json, Value};

use hoopipi_engine::stereo_mode::StereoMode;
use hoopipi_engine::Engine;

use crate::error::ControlError;
use crate::request::{bool_field, f32_field, opt_str_field, str_field, u8_field};
use crate::{status, request};

/// Parses `body` as a JSON object and dispatches its `action`, returning the
/// response object to serialise back to the client. Never panics: every
/// failure mode becomes `{success: false, error: "..."}` (§7 kinds 5/6).
pub fn handle(engine: &Engine, body: &str) -> Value {
    match dispatch(engine, body) {
        Ok(response) => response,
        Err(err) => json!({ "success": false, "error": err.to_string() }),
    }
}

fn dispatch(engine: &Engine, body: &str) -> Result<Value, ControlError> {
    let parsed: Value = serde_json::from_str(body)?;
    let Value::Object(mut fields) = parsed else {
        return Err(ControlError::WrongFieldType { field: "<request>", expected: "object" });
    };
    let Some(Value::String(action)) = fields.remove("action") else {
        return Err(ControlError::MissingField("action"));
    };

    let params = engine.params();
    let ok = || Ok(json!({ "success": true }));

    match action.as_str() {
        "loadModel" => {
            let slot = u8_field(&fields, "slot")?;
            let model_path = str_field(&fields, "modelPath")?;
            engine.load_model_async(slot, PathBuf::from(model_path))?;
            ok()
        }
        "unloadModel" => {
            let slot = u8_field(&fields, "slot")?;
            engine.unload_model(slot)?;
            ok()
        }
        "setActiveModel" | "setActiveModelL" => {
            let slot = u8_field(&fields, "slot")?;
            engine.set_active_slot(slot)?;
            ok()
        }
        // The R channel never runs a model (§4.1 step 7); accepted for
        // control-protocol symmetry with the L/R-suffixed action set but
        // has no audible effect, matching `bypassModelR`'s existing role.
        "setActiveModelR" => ok(),

        "setBypassModel" => {
            let enabled = bool_field(&fields, "bypass")?;
            params.left.bypass_model.set(enabled);
            params.right.bypass_model.set(enabled);
            ok()
        }
        "setBypassModelL" => {
            params.left.bypass_model.set(bool_field(&fields, "bypass")?);
            ok()
        }
        "setBypassModelR" => {
            params.right.bypass_model.set(bool_field(&fields, "bypass")?);
            ok()
        }

        "setInputGain" => {
            let gain = f32_field(&fields, "gain")?;
            params.left.set_input_gain_db(gain);
            params.right.set_input_gain_db(gain);
            ok()
        }
        "setInputGainL" => {
            params.left.set_input_gain_db(f32_field(&fields, "gain")?);
            ok()
        }
        "setInputGainR" => {
            params.right.set_input_gain_db(f32_field(&fields, "gain")?);
            ok()
        }
        "setOutputGain" => {
            let gain = f32_field(&fields, "gain")?;
            params.left.set_output_gain_db(gain);
            params.right.set_output_gain_db(gain);
            ok()
        }
        "setOutputGainL" => {
            params.left.set_output_gain_db(f32_field(&fields, "gain")?);
            ok()
        }
        "setOutputGainR" => {
            params.right.set_output_gain_db(f32_field(&fields, "gain")?);
            ok()
        }

        "setNoiseGateEnabled" => {
            params.set_gate_enabled_both(bool_field(&fields, "enabled")?);
            ok()
        }
        "setNoiseGateEnabledL" => {
            params.left.gate_enabled.set(bool_field(&fields, "enabled")?);
            ok()
        }
        "setNoiseGateEnabledR" => {
            params.right.gate_enabled.set(bool_field(&fields, "enabled")?);
            ok()
        }
        "setNoiseGateThreshold" => {
            let threshold = f32_field(&fields, "threshold")?;
            params.left.set_gate_threshold_db(threshold);
            params.right.set_gate_threshold_db(threshold);
            ok()
        }
        "setNoiseGateThresholdL" => {
            params.left.set_gate_threshold_db(f32_field(&fields, "threshold")?);
            ok()
        }
        "setNoiseGateThresholdR" => {
            params.right.set_gate_threshold_db(f32_field(&fields, "threshold")?);
            ok()
        }

        "setEQEnabled" => {
            params.set_eq_enabled_both(bool_field(&fields, "enabled")?);
            ok()
        }
        "setEQEnabledL" => {
            params.left.eq_enabled.set(bool_field(&fields, "enabled")?);
            ok()
        }
        "setEQEnabledR" => {
            params.right.eq_enabled.set(bool_field(&fields, "enabled")?);
            ok()
        }
        "setEQBass" => {
            let gain = f32_field(&fields, "gain")?;
            params.left.set_eq_bass_db(gain);
            params.right.set_eq_bass_db(gain);
            ok()
        }
        "setEQBassL" => {
            params.left.set_eq_bass_db(f32_field(&fields, "gain")?);
            ok()
        }
        "setEQBassR" => {
            params.right.set_eq_bass_db(f32_field(&fields, "gain")?);
            ok()
        }
        "setEQMid" => {
            let gain = f32_field(&fields, "gain")?;
            params.left.set_eq_mid_db(gain);
            params.right.set_eq_mid_db(gain);
            ok()
        }
        "setEQMidL" => {
            params.left.set_eq_mid_db(f32_field(&fields, "gain")?);
            ok()
        }
        "setEQMidR" => {
            params.right.set_eq_mid_db(f32_field(&fields, "gain")?);
            ok()
        }
        "setEQTreble" => {
            let gain = f32_field(&fields, "gain")?;
            params.left.set_eq_treble_db(gain);
            params.right.set_eq_treble_db(gain);
            ok()
        }
        "setEQTrebleL" => {
            params.left.set_eq_treble_db(f32_field(&fields, "gain")?);
            ok()
        }
        "setEQTrebleR" => {
            params.right.set_eq_treble_db(f32_field(&fields, "gain")?);
            ok()
        }

        "setStereoMode" => {
            let mode_str = str_field(&fields, "mode")?;
            let mode = StereoMode::from_str_loose(mode_str)
                .ok_or(ControlError::WrongFieldType { field: "mode", expected: "a known stereo mode" })?;
            params.stereo_mode.set(mode);
            ok()
        }
        "setStereo2MonoMixL" => {
            params.stereo_to_mono_mix.mix_l.set(f32_field(&fields, "mix")?.clamp(0.0, 1.0));
            ok()
        }
        "setStereo2MonoMixR" => {
            params.stereo_to_mono_mix.mix_r.set(f32_field(&fields, "mix")?.clamp(0.0, 1.0));
            ok()
        }

        "setReverbEnabled" => {
            params.reverb.enabled.set(bool_field(&fields, "enabled")?);
            ok()
        }
        "setReverbRoomSize" => {
            params.reverb.set_room_size(f32_field(&fields, "roomSize")?);
            ok()
        }
        "setReverbDecayTime" => {
            params.reverb.set_rt60(f32_field(&fields, "decayTime")?);
            ok()
        }
        "setReverbMix" => {
            params.reverb.set_wet(f32_field(&fields, "mix")?.clamp(0.0, 1.0));
            ok()
        }

        "setBackingTrackEnabledForRecording" => {
            params.backing_track_enabled_for_recording.set(bool_field(&fields, "enabled")?);
            ok()
        }

        "startRecording" => {
            let directory = opt_str_field(&fields, "directory")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir);
            let filename = opt_str_field(&fields, "filename").unwrap_or("");
            let now = request::now_timestamp_utc();
            let path = engine
                .recorder()
                .start(&directory, filename, engine.sample_rate() as u32, &now)
                .map_err(hoopipi_engine::error::EngineError::from)?;
            Ok(json!({ "success": true, "path": path.display().to_string() }))
        }
        "stopRecording" => {
            engine.recorder().stop();
            ok()
        }

        "loadBackingTrack" => {
            let path = str_field(&fields, "path")?;
            engine
                .backing_track()
                .load(std::path::Path::new(path))
                .map_err(hoopipi_engine::error::EngineError::from)?;
            ok()
        }
        "playBackingTrack" => {
            engine.backing_track().play();
            ok()
        }
        "stopBackingTrack" => {
            engine.backing_track().stop();
            ok()
        }
        "pauseBackingTrack" => {
            engine.backing_track().pause();
            ok()
        }
        "setBackingTrackLoop" => {
            engine.backing_track().set_loop(bool_field(&fields, "loop")?);
            ok()
        }
        "setBackingTrackVolume" => {
            engine.backing_track().set_volume(f32_field(&fields, "volume")?);
            ok()
        }
        "setBackingTrackStartPosition" => {
            let frames = request::u64_field(&fields, "positionFrames")?;
            engine.backing_track().set_start_position_frames(frames);
            ok()
        }
        "setBackingTrackStopPosition" => {
            let frames = request::u64_field(&fields, "positionFrames")?;
            engine.backing_track().set_stop_position_frames(frames);
            ok()
        }

        "getStatus" => Ok(status::engine_status(engine)),
        "getBackingTrackStatus" => Ok(status::backing_track_status(engine)),

        other => Err(ControlError::UnknownAction(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoopipi_engine::model::NullModelLoader;
    use std::sync::Arc;

    fn test_engine() -> Engine {
        Engine::new(48_000.0, 512, Arc::new(NullModelLoader))
    }

    #[test]
    fn unknown_action_reports_the_name() {
        let engine = test_engine();
        let response = handle(&engine, r#"{"action":"doSomethingWeird"}"#);
        assert_eq!(response["success"], false);
        assert!(response["error"].as_str().unwrap().contains("doSomethingWeird"));
    }

    #[test]
    fn malformed_json_reports_a_parse_error() {
        let engine = test_engine();
        let response = handle(&engine, "{not json");
        assert_eq!(response["success"], false);
        assert!(response["error"].as_str().unwrap().starts_with("JSON parse error"));
    }

    #[test]
    fn set_eq_bass_then_get_status_round_trips() {
        let engine = test_engine();
        let set = handle(&engine, r#"{"action":"setEQBass","gain":6.0}"#);
        assert_eq!(set["success"], true);
        let status = handle(&engine, r#"{"action":"getStatus"}"#);
        assert_eq!(status["success"], true);
        assert_eq!(status["eqBass"], 6.0);
        assert_eq!(status["left"]["eqBass"], 6.0);
        assert_eq!(status["right"]["eqBass"], 6.0);
    }

    #[test]
    fn set_active_slot_clamps_via_engine_validation() {
        let engine = test_engine();
        let response = handle(&engine, r#"{"action":"setActiveModel","slot":1}"#);
        assert_eq!(response["success"], true);
        let response = handle(&engine, r#"{"action":"setActiveModel","slot":7}"#);
        assert_eq!(response["success"], false);
    }

    #[test]
    fn set_active_model_r_is_accepted_but_inert() {
        let engine = test_engine();
        let before = handle(&engine, r#"{"action":"getStatus"}"#)["activeSlot"].clone();
        let response = handle(&engine, r#"{"action":"setActiveModelR","slot":1}"#);
        assert_eq!(response["success"], true);
        let after = handle(&engine, r#"{"action":"getStatus"}"#)["activeSlot"].clone();
        assert_eq!(before, after);
    }

    #[test]
    fn stereo_mode_rejects_unknown_spelling() {
        let engine = test_engine();
        let response = handle(&engine, r#"{"action":"setStereoMode","mode":"Sideways"}"#);
        assert_eq!(response["success"], false);
    }
}
