//! The engine's stereo routing mode.

use hoopipi_core::ParamCell;
use std::sync::atomic::{AtomicU8, Ordering};

/// How the engine derives its L/R work buffers from the host's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereoMode {
    /// Left input drives both outputs.
    LeftMonoToStereo,
    /// Right input drives both outputs.
    RightMonoToStereo,
    /// `mixL*inL + mixR*inR` drives both outputs.
    StereoToMono,
    /// L and R processed independently; the model runs only on L.
    TrueStereo,
}

impl StereoMode {
    const LEFT_MONO: u8 = 0;
    const RIGHT_MONO: u8 = 1;
    const STEREO_TO_MONO: u8 = 2;
    const TRUE_STEREO: u8 = 3;

    const fn to_tag(self) -> u8 {
        match self {
            StereoMode::LeftMonoToStereo => Self::LEFT_MONO,
            StereoMode::RightMonoToStereo => Self::RIGHT_MONO,
            StereoMode::StereoToMono => Self::STEREO_TO_MONO,
            StereoMode::TrueStereo => Self::TRUE_STEREO,
        }
    }

    const fn from_tag(tag: u8) -> Self {
        match tag {
            Self::RIGHT_MONO => StereoMode::RightMonoToStereo,
            Self::STEREO_TO_MONO => StereoMode::StereoToMono,
            Self::TRUE_STEREO => StereoMode::TrueStereo,
            _ => StereoMode::LeftMonoToStereo,
        }
    }

    /// The wire/config spelling used by the control protocol and
    /// `runtime.json` (§6), e.g. `"LeftMono2Stereo"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            StereoMode::LeftMonoToStereo => "LeftMono2Stereo",
            StereoMode::RightMonoToStereo => "RightMono2Stereo",
            StereoMode::StereoToMono => "Stereo2Mono",
            StereoMode::TrueStereo => "TrueStereo",
        }
    }

    /// Parses the wire spelling back into a [`StereoMode`]; `None` for any
    /// unrecognised string (callers should treat that as a validation error,
    /// not silently fall back to a default).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s {
            "LeftMono2Stereo" => Some(StereoMode::LeftMonoToStereo),
            "RightMono2Stereo" => Some(StereoMode::RightMonoToStereo),
            "Stereo2Mono" => Some(StereoMode::StereoToMono),
            "TrueStereo" => Some(StereoMode::TrueStereo),
            _ => None,
        }
    }
}

/// Lock-free cell for [`StereoMode`], following the same non-RT-writes /
/// RT-reads contract as [`ParamCell`], just backed by an `AtomicU8` instead
/// of an `AtomicU32`-bit-cast float.
#[derive(Debug)]
pub struct StereoModeCell(AtomicU8);

impl StereoModeCell {
    pub fn new(mode: StereoMode) -> Self {
        Self(AtomicU8::new(mode.to_tag()))
    }

    #[inline]
    pub fn get(&self) -> StereoMode {
        StereoMode::from_tag(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set(&self, mode: StereoMode) {
        self.0.store(mode.to_tag(), Ordering::Relaxed);
    }
}

impl Default for StereoModeCell {
    fn default() -> Self {
        Self::new(StereoMode::LeftMonoToStereo)
    }
}

/// Stereo-to-mono mix coefficients, clamped to `[0, 1]`.
pub struct StereoToMonoMix {
    pub mix_l: ParamCell,
    pub mix_r: ParamCell,
}

impl StereoToMonoMix {
    pub fn new() -> Self {
        Self {
            mix_l: ParamCell::new(0.5),
            mix_r: ParamCell::new(0.5),
        }
    }
}

impl Default for StereoToMonoMix {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_tag() {
        for mode in [
            StereoMode::LeftMonoToStereo,
            StereoMode::RightMonoToStereo,
            StereoMode::StereoToMono,
            StereoMode::TrueStereo,
        ] {
            let cell = StereoModeCell::new(mode);
            assert_eq!(cell.get(), mode);
        }
    }

    #[test]
    fn default_is_left_mono() {
        assert_eq!(StereoModeCell::default().get(), StereoMode::LeftMonoToStereo);
    }

    #[test]
    fn wire_spelling_round_trips() {
        for mode in [
            StereoMode::LeftMonoToStereo,
            StereoMode::RightMonoToStereo,
            StereoMode::StereoToMono,
            StereoMode::TrueStereo,
        ] {
            assert_eq!(StereoMode::from_str_loose(mode.as_str()), Some(mode));
        }
        assert_eq!(StereoMode::from_str_loose("nonsense"), None);
    }
}
