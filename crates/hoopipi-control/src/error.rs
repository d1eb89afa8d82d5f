//! Control-façade error type, following the workspace's per-crate
//! `thiserror`-derived `Error`/`Result` convention.

use hoopipi_engine::error::EngineError;

/// Every way a single request can fail to produce a useful response.
///
/// The dispatcher never lets one of these escape as a panic: each variant's
/// `Display` implementation is exactly the text that lands in a response's
/// `error` field (§7 kind 5/6).
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {field} has the wrong type (expected {expected})")]
    WrongFieldType { field: &'static str, expected: &'static str },

    #[error(transparent)]
    Engine(#[from] EngineError),
}
