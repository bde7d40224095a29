//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk and parsing
//! it into validated, type-safe structures.
//!
//! # Configuration Sources
//!
//! Settings are resolved in the following order:
//!
//! 1. Path given as the positional CLI argument (must exist)
//! 2. Default location, if the file exists:
//!    - **Linux/macOS:** `~/.mcp-server-chart/config.json`
//!    - **Windows:** `%USERPROFILE%\.mcp-server-chart\config.json`
//! 3. Built-in defaults
//!
//! Environment variables (`VIS_REQUEST_SERVER`, `SERVICE_ID`,
//! `DISABLED_TOOLS`) are applied on top of whichever source was used.

mod settings;

pub use settings::{
    parse_tool_list, Config, LoggingConfig, RenderConfig, DEFAULT_RENDER_ENDPOINT,
    ENV_DISABLED_TOOLS, ENV_RENDER_ENDPOINT, ENV_SERVICE_ID,
};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.mcp-server-chart/`
/// - **Windows:** `%USERPROFILE%\.mcp-server-chart\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".mcp-server-chart"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads and parses a configuration file.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
/// - Required fields are missing or invalid
pub fn load_config_file(config_path: &Path) -> Result<Config, ConfigError> {
    if !config_path.exists() {
        return Err(ConfigError::NotFound {
            path: config_path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    config.validate()?;

    Ok(config)
}

/// Resolves the effective configuration.
///
/// An explicit `path` must exist. Without one, the default location is used
/// when present, otherwise built-in defaults. Environment overrides from the
/// process environment are applied last.
///
/// # Errors
///
/// Returns an error if the chosen file cannot be loaded or the final
/// configuration fails validation.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => load_config_file(p)?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(p) => load_config_file(&p)?,
            None => Config::default(),
        },
    };

    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_dir_exists() {
        assert!(default_config_dir().is_some());
    }

    #[test]
    fn default_config_path_exists() {
        let path = default_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("config.json"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");

        let err = load_config_file(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn load_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "disabled_tools": ["generate_line_chart"], "render": { "timeout_secs": 3 } }"#,
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert!(config.disabled_tools.contains("generate_line_chart"));
        assert_eq!(config.render.timeout_secs, 3);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
