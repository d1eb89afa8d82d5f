//! `getStatus` / `getBackingTrackStatus` snapshot serialisation.

use hoopipi_engine::model_slot::SlotState;
use hoopipi_engine::recorder::RecorderState;
use hoopipi_engine::Engine;
use serde_json::{json, Value};

fn slot_state_str(state: SlotState) -> &'static str {
    match state {
        SlotState::Empty => "empty",
        SlotState::Loading => "loading",
        SlotState::Ready => "ready",
        SlotState::FadingOut => "fadingOut",
        SlotState::FadingIn => "fadingIn",
    }
}

/// Builds the full parameter + metrics snapshot `getStatus` returns (§6,
/// §7 "`xrunCount`, `droppedFrames` surfaced on the next `getStatus`").
pub fn engine_status(engine: &Engine) -> Value {
    let params = engine.params();
    let metrics = engine.metrics();
    let recorder_state = engine.recorder().state();
    let (recording, recorder_path, dropped_frames) = match recorder_state {
        RecorderState::Capturing { path, dropped_frames, .. } => {
            (true, Some(path.display().to_string()), dropped_frames)
        }
        RecorderState::Idle => (false, None, engine.recorder().dropped_frames()),
    };

    let slot_status = |index: u8| -> Value {
        let Ok(slot) = engine.model_slot(index) else {
            return json!({ "state": "empty", "path": Value::Null });
        };
        json!({
            "state": slot_state_str(slot.state()),
            "path": slot.current_path().map(|p| p.display().to_string()),
        })
    };

    json!({
        "success": true,
        "globalBypass": params.global_bypass.get(),
        "activeSlot": params.active_slot_index(),
        "slots": [slot_status(0), slot_status(1)],
        "stereoMode": params.stereo_mode.get().as_str(),
        "stereo2MonoMixL": params.stereo_to_mono_mix.mix_l.get(),
        "stereo2MonoMixR": params.stereo_to_mono_mix.mix_r.get(),
        // Mirrors `params.left.eq_bass_db` at the top level: `setEQBass`
        // (no L/R suffix) writes both channels together, so callers that
        // never touch `setEQBassL`/`setEQBassR` can read it back here
        // without reaching into `left`/`right`.
        "eqBass": params.left.eq_bass_db.get(),
        "left": channel_status(&params.left),
        "right": channel_status(&params.right),
        "reverbEnabled": params.reverb.enabled.get(),
        "reverbRoomSize": params.reverb.room_size.get(),
        "reverbDecayTime": params.reverb.rt60_seconds.get(),
        "reverbDry": params.reverb.dry.get(),
        "reverbWet": params.reverb.wet.get(),
        "backingTrackEnabledForRecording": params.backing_track_enabled_for_recording.get(),
        "recording": recording,
        "recordingPath": recorder_path,
        "xrunCount": metrics.xrun_count,
        "droppedFrames": dropped_frames,
    })
}

fn channel_status(channel: &hoopipi_engine::param_plane::ChannelParams) -> Value {
    json!({
        "inputGain": channel.input_gain_db.get(),
        "outputGain": channel.output_gain_db.get(),
        "bypassModel": channel.bypass_model.get(),
        "gateEnabled": channel.gate_enabled.get(),
        "gateThreshold": channel.gate_threshold_db.get(),
        "eqEnabled": channel.eq_enabled.get(),
        "eqBass": channel.eq_bass_db.get(),
        "eqMid": channel.eq_mid_db.get(),
        "eqTreble": channel.eq_treble_db.get(),
    })
}

/// Builds the `getBackingTrackStatus` response (§6).
pub fn backing_track_status(engine: &Engine) -> Value {
    let status = engine.backing_track().status();
    json!({
        "success": true,
        "loaded": status.loaded,
        "path": status.path.map(|p| p.display().to_string()),
        "playing": status.playing,
        "paused": status.paused,
        "looping": status.looping,
        "volume": status.volume,
        "positionFrames": status.position_frames,
        "totalFrames": status.total_frames,
    })
}
