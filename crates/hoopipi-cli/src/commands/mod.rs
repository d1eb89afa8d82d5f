//! Subcommand implementations.

pub mod devices;
pub mod run;
pub mod status;
