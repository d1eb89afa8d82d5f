//! The typed view over `runtime.json` (§6, §11): every recognised option
//! with its documented default, plus an `extra` bucket so unrecognised
//! top-level keys survive a read-modify-write cycle untouched.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_true() -> bool {
    true
}

fn default_stereo_mode() -> String {
    "LeftMono2Stereo".to_string()
}

fn default_gate_threshold() -> f32 {
    -40.0
}

fn default_room_size() -> f32 {
    0.3
}

fn default_rt60() -> f32 {
    2.0
}

fn default_one() -> f32 {
    1.0
}

fn default_wet() -> f32 {
    0.3
}

fn default_half() -> f32 {
    0.5
}

/// Every key the control façade and the engine's parameter plane recognise,
/// with the default each field takes when `runtime.json` is missing or
/// omits it. Deserialising into this struct plus a flattened
/// `serde_json::Map` (see [`RuntimeConfig::extra`]) is how "unknown keys are
/// preserved on write" (§6) is implemented — a plain `#[derive(Deserialize)]`
/// struct alone would silently drop anything it doesn't name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    #[serde(default)]
    pub active_slot: u8,
    #[serde(default, rename = "slot0Model", skip_serializing_if = "Option::is_none")]
    pub slot_0_model: Option<String>,
    #[serde(default, rename = "slot1Model", skip_serializing_if = "Option::is_none")]
    pub slot_1_model: Option<String>,

    #[serde(default)]
    pub bypass_model_l: bool,
    #[serde(default = "default_true")]
    pub bypass_model_r: bool,

    #[serde(default = "default_stereo_mode")]
    pub stereo_mode: String,

    #[serde(default)]
    pub input_gain_l: f32,
    #[serde(default)]
    pub input_gain_r: f32,
    #[serde(default)]
    pub output_gain_l: f32,
    #[serde(default)]
    pub output_gain_r: f32,

    #[serde(default)]
    pub gate_enabled_l: bool,
    #[serde(default)]
    pub gate_enabled_r: bool,
    #[serde(default = "default_gate_threshold")]
    pub gate_threshold_l: f32,
    #[serde(default = "default_gate_threshold")]
    pub gate_threshold_r: f32,

    #[serde(default)]
    pub eq_enabled_l: bool,
    #[serde(default)]
    pub eq_enabled_r: bool,
    #[serde(default)]
    pub eq_bass_l: f32,
    #[serde(default)]
    pub eq_bass_r: f32,
    #[serde(default)]
    pub eq_mid_l: f32,
    #[serde(default)]
    pub eq_mid_r: f32,
    #[serde(default)]
    pub eq_treble_l: f32,
    #[serde(default)]
    pub eq_treble_r: f32,

    #[serde(default)]
    pub reverb_enabled: bool,
    #[serde(default = "default_room_size")]
    pub reverb_room_size: f32,
    #[serde(default = "default_rt60")]
    pub reverb_decay_time: f32,
    #[serde(default = "default_one")]
    pub reverb_dry: f32,
    #[serde(default = "default_wet")]
    pub reverb_wet: f32,

    #[serde(default = "default_half")]
    pub stereo_2_mono_mix_l: f32,
    #[serde(default = "default_half")]
    pub stereo_2_mono_mix_r: f32,

    /// Supplemental option (not in the distilled option table): whether a
    /// playing backing track is folded into what the recorder writes,
    /// independent of whether it's folded into the monitored output.
    #[serde(default = "default_true")]
    pub backing_track_enabled_for_recording: bool,

    /// Any top-level key this struct doesn't name. Round-tripped verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        // Deserialize an empty object so every `#[serde(default...)]`
        // annotation above is the single source of truth for defaults,
        // rather than duplicating them here by hand.
        serde_json::from_str("{}").expect("RuntimeConfig defaults must deserialize from {}")
    }
}

impl RuntimeConfig {
    /// Reads `path`; a missing file yields [`RuntimeConfig::default`] rather
    /// than an error, matching §6 ("missing file ⇒ defaults").
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Writes `self` to `path` as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|e| ConfigError::write_file(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_option_table() {
        let config = RuntimeConfig::default();
        assert_eq!(config.active_slot, 0);
        assert!(!config.bypass_model_l);
        assert!(config.bypass_model_r);
        assert_eq!(config.stereo_mode, "LeftMono2Stereo");
        assert_eq!(config.gate_threshold_l, -40.0);
        assert_eq!(config.reverb_room_size, 0.3);
        assert_eq!(config.reverb_decay_time, 2.0);
        assert_eq!(config.reverb_dry, 1.0);
        assert_eq!(config.reverb_wet, 0.3);
        assert_eq!(config.stereo_2_mono_mix_l, 0.5);
        assert_eq!(config.stereo_2_mono_mix_r, 0.5);
        assert!(config.backing_track_enabled_for_recording);
    }

    #[test]
    fn unknown_top_level_keys_round_trip() {
        let text = r#"{"activeSlot": 1, "someFutureKey": {"nested": true}}"#;
        let config: RuntimeConfig = serde_json::from_str(text).unwrap();
        assert_eq!(config.active_slot, 1);
        assert!(config.extra.contains_key("someFutureKey"));

        let round_tripped = serde_json::to_string(&config).unwrap();
        let reparsed: serde_json::Value = serde_json::from_str(&round_tripped).unwrap();
        assert_eq!(reparsed["someFutureKey"]["nested"], true);
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.json");
        let config = RuntimeConfig::load(&path).unwrap();
        assert_eq!(config.active_slot, 0);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("runtime.json");
        let mut config = RuntimeConfig::default();
        config.reverb_wet = 0.8;
        config.save(&path).unwrap();

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded.reverb_wet, 0.8);
    }
}
