//! Field extraction helpers for untyped JSON requests, and the timestamp
//! formatter `startRecording` uses to name an auto-generated file.
//!
//! Requests aren't modelled as one `#[derive(Deserialize)]` enum per action:
//! the action set is wide and mostly shares a handful of field shapes
//! (`slot`, `gain`, `enabled`, ...), so the dispatcher pulls an untyped
//! `serde_json::Value` map apart field-by-field instead, treating each
//! value as loosely-typed JSON rather than binding to a fixed struct per
//! action.

use serde_json::Value;

use crate::error::ControlError;

pub fn str_field<'a>(fields: &'a serde_json::Map<String, Value>, name: &'static str) -> Result<&'a str, ControlError> {
    fields
        .get(name)
        .ok_or(ControlError::MissingField(name))?
        .as_str()
        .ok_or(ControlError::WrongFieldType { field: name, expected: "string" })
}

pub fn f32_field(fields: &serde_json::Map<String, Value>, name: &'static str) -> Result<f32, ControlError> {
    fields
        .get(name)
        .ok_or(ControlError::MissingField(name))?
        .as_f64()
        .map(|v| v as f32)
        .ok_or(ControlError::WrongFieldType { field: name, expected: "number" })
}

pub fn bool_field(fields: &serde_json::Map<String, Value>, name: &'static str) -> Result<bool, ControlError> {
    fields
        .get(name)
        .ok_or(ControlError::MissingField(name))?
        .as_bool()
        .ok_or(ControlError::WrongFieldType { field: name, expected: "boolean" })
}

pub fn u8_field(fields: &serde_json::Map<String, Value>, name: &'static str) -> Result<u8, ControlError> {
    fields
        .get(name)
        .ok_or(ControlError::MissingField(name))?
        .as_u64()
        .map(|v| v as u8)
        .ok_or(ControlError::WrongFieldType { field: name, expected: "integer" })
}

pub fn u64_field(fields: &serde_json::Map<String, Value>, name: &'static str) -> Result<u64, ControlError> {
    fields
        .get(name)
        .ok_or(ControlError::MissingField(name))?
        .as_u64()
        .ok_or(ControlError::WrongFieldType { field: name, expected: "integer" })
}

pub fn opt_str_field<'a>(fields: &'a serde_json::Map<String, Value>, name: &str) -> Option<&'a str> {
    fields.get(name).and_then(Value::as_str)
}

/// Formats a Unix timestamp as `YYYY-MM-DD-HHMMSS` (UTC), the stem the
/// recorder's auto-generated filenames use (§6). No calendar crate is
/// pulled in for this — civil-from-days is a well-known closed-form
/// conversion and the only caller is this one formatting site.
pub fn format_timestamp_utc(unix_seconds: u64) -> String {
    let days = unix_seconds / 86_400;
    let secs_of_day = unix_seconds % 86_400;
    let (hour, minute, second) = (secs_of_day / 3600, (secs_of_day / 60) % 60, secs_of_day % 60);

    // Howard Hinnant's civil_from_days algorithm.
    let z = days as i64 + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { y + 1 } else { y };

    format!("{year:04}-{month:02}-{day:02}-{hour:02}{minute:02}{second:02}")
}

/// Wraps [`format_timestamp_utc`] around the current wall clock.
pub fn now_timestamp_utc() -> String {
    let unix_seconds = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format_timestamp_utc(unix_seconds)
}
