//! HoopiPi DSP - concrete audio effect units.
//!
//! Built on the generic primitives in `hoopipi-core`, this crate provides
//! the three effect units the engine's signal chain is made of:
//!
//! - [`NoiseGate`] - hard gate driven by a peak-follower envelope
//! - [`ThreeBandEq`] - fixed-frequency low shelf / mid peak / high shelf
//! - [`Reverb`] - eight-channel feedback delay network

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod eq;
pub mod gate;
pub mod reverb;

pub use eq::ThreeBandEq;
pub use gate::NoiseGate;
pub use reverb::Reverb;
