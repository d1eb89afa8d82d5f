//! Configuration persistence for the HoopiPi real-time engine (§6, §11).
//!
//! `runtime.json` is a single JSON object under [`paths::user_config_dir`]
//! holding every control-plane option the engine and control façade
//! recognise, plus whatever unrecognised keys a newer build wrote (§6:
//! "Unknown keys are preserved on write"). This crate is split three ways:
//!
//! - [`runtime`] is the pure serde model: [`runtime::RuntimeConfig`], its
//!   documented defaults, and `load`/`save`.
//! - [`bridge`] applies a loaded config onto a running [`hoopipi_engine::Engine`]
//!   and takes a snapshot back out of one.
//! - [`writer`] debounces snapshots onto a background thread so a control
//!   request never blocks on disk I/O.

pub mod bridge;
pub mod error;
pub mod paths;
pub mod runtime;
pub mod writer;

pub use bridge::{apply_to_engine, snapshot_from_engine};
pub use error::ConfigError;
pub use runtime::RuntimeConfig;
pub use writer::ConfigWriter;
