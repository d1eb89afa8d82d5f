//! Platform-specific paths for HoopiPi's configuration file.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/hoopipi/` (Linux), `~/Library/Application
//!   Support/hoopipi/` (macOS), `%APPDATA%\hoopipi\` (Windows)
//!
//! # Example
//!
//! ```rust,no_run
//! use hoopipi_config::paths;
//!
//! let config_dir = paths::user_config_dir();
//! println!("Config dir: {:?}", config_dir);
//! ```

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "hoopipi";

/// Filename of the persisted runtime configuration (§6, §11).
pub const RUNTIME_FILE_NAME: &str = "runtime.json";

/// Returns the user-specific configuration directory.
///
/// # Platform Paths
///
/// - Linux: `~/.config/hoopipi/`
/// - macOS: `~/Library/Application Support/hoopipi/`
/// - Windows: `%APPDATA%\hoopipi\`
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_NAME)
}

/// Returns the path to `runtime.json` under [`user_config_dir`].
pub fn runtime_file_path() -> PathBuf {
    user_config_dir().join(RUNTIME_FILE_NAME)
}

/// Ensure the user config directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_config_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_config_dir() {
        let dir = user_config_dir();
        let dir_str = dir.to_string_lossy();
        assert!(dir_str.contains("hoopipi"));
    }

    #[test]
    fn test_runtime_file_path_ends_in_runtime_json() {
        let path = runtime_file_path();
        assert_eq!(path.file_name().unwrap(), "runtime.json");
    }

    #[test]
    fn test_ensure_user_config_dir() {
        // This test just ensures the function doesn't panic; directory
        // creation success depends on system permissions.
        let result = ensure_user_config_dir();
        let _ = result;
    }
}
