//! Audio I/O layer for the HoopiPi engine.
//!
//! This crate provides:
//!
//! - **WAV file I/O**: [`read_wav`] and [`write_wav`] for loading/saving audio files
//! - **Pluggable audio backend**: [`backend::AudioBackend`] abstracts the platform
//!   audio API; [`cpal_backend::CpalBackend`] is the default desktop implementation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hoopipi_io::{read_wav, write_wav};
//! use hoopipi_io::cpal_backend::CpalBackend;
//! use hoopipi_io::backend::AudioBackend;
//!
//! // Load a backing track
//! let (samples, spec) = read_wav("backing.wav")?;
//!
//! // Enumerate devices
//! let backend = CpalBackend::new();
//! let devices = backend.list_devices()?;
//! ```

pub mod backend;
pub mod cpal_backend;
pub mod priority;
mod wav;

pub use backend::{AudioDevice, BackendStreamConfig};
pub use wav::{
    StereoSamples, WavFormat, WavInfo, WavSpec, read_wav, read_wav_info, read_wav_stereo,
    write_wav, write_wav_stereo,
};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
