//! Per-concern error enums for the engine crate, following the
//! `thiserror`-derived `Error`/`Result` convention used throughout
//! `hoopipi-io`.

use std::path::PathBuf;

/// Failure loading a model into a [`crate::model_slot::ModelSlot`].
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model file is malformed: {0}")]
    Malformed(String),
}

/// Failure starting or operating the recorder.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("already recording")]
    AlreadyRecording,
    #[error("recording directory is not writable: {0}")]
    DirectoryNotWritable(PathBuf),
    #[error("failed to open output file {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}

/// Failure loading or controlling the backing track.
#[derive(Debug, thiserror::Error)]
pub enum BackingTrackError {
    #[error("cannot load a new backing track while one is playing; stop it first")]
    StillPlaying,
    #[error("failed to decode backing track {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: hoopipi_io::Error,
    },
    #[error("unsupported backing track format: {0}")]
    UnsupportedFormat(String),
}

/// Top-level engine construction/operation failure.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("requested period size {requested} exceeds configured max period {max}")]
    PeriodTooLarge { requested: usize, max: usize },
    #[error("no such model slot: {0} (valid slots are 0 or 1)")]
    InvalidSlotIndex(u8),
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),
    #[error(transparent)]
    Recorder(#[from] RecorderError),
    #[error(transparent)]
    BackingTrack(#[from] BackingTrackError),
}
