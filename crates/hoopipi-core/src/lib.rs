//! Core DSP primitives for the HoopiPi engine.
//!
//! This crate provides the foundational building blocks for real-time
//! guitar audio processing, with zero allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Parameter Smoothing
//!
//! Zipper-free parameter changes for click-free automation:
//!
//! - [`SmoothedParam`] - Exponential smoothing with a configurable time constant
//! - [`LinearSmoothedParam`] - Linear ramps (constant rate)
//! - [`SmoothedGain`] - Fixed-coefficient smoothing for model-slot gain/mix
//!
//! ## Lock-free parameter storage
//!
//! - [`ParamCell`] / [`FlagCell`] - Atomic value cells shared between the
//!   control thread and the audio callback
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR filter with RBJ cookbook coefficients
//!   (lowpass, highpass, bandpass, notch, peaking EQ, and shelving)
//! - [`DcBlocker`] - First-order DC-blocking highpass
//! - [`OnePole`] - One-pole lowpass, used for damping and tone controls
//!
//! ## Delay Lines
//!
//! - [`InterpolatedDelay`] - Variable-length delay with interpolation
//! - [`FixedDelayLine`] - Fixed-length delay (compile-time size)
//!
//! ## Dynamics
//!
//! - [`EnvelopeFollower`] - Amplitude envelope detection
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`fast_tanh`], etc.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded audio applications.
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! hoopipi-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use hoopipi_core::{Biquad, SmoothedParam, lowpass_coefficients};
//!
//! let mut filter = Biquad::new();
//! let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(1000.0, 0.707, 48000.0);
//! filter.set_coefficients(b0, b1, b2, a0, a1, a2);
//!
//! for sample in audio_buffer.iter_mut() {
//!     *sample = filter.process(*sample);
//! }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in audio processing paths
//! - **No dependencies on std**: Pure `no_std` with `libm` for math

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod dc_blocker;
pub mod delay;
pub mod envelope;
pub mod math;
pub mod one_pole;
pub mod param;
pub mod param_cell;
pub mod param_info;
pub mod smoothed_gain;

// Re-export main types at crate root
pub use biquad::{
    Biquad, bandpass_coefficients, high_shelf_coefficients, highpass_coefficients,
    low_shelf_coefficients, lowpass_coefficients, notch_coefficients, peaking_eq_coefficients,
};
pub use dc_blocker::DcBlocker;
pub use delay::{FixedDelayLine, InterpolatedDelay, Interpolation};
pub use envelope::EnvelopeFollower;
pub use math::{
    asymmetric_clip, db_to_linear, fast_tanh, flush_denormal, foldback, hard_clip, linear_to_db,
    mono_sum, soft_clip, wet_dry_mix, wet_dry_mix_stereo,
};
pub use one_pole::OnePole;
pub use param::{LinearSmoothedParam, SmoothedParam};
pub use param_cell::{FlagCell, ParamCell};
pub use param_info::{ParamDescriptor, ParamFlags, ParamId, ParamScale, ParamUnit, ParameterInfo};
pub use smoothed_gain::SmoothedGain;
