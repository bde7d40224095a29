//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.
//! Environment overrides are applied on top by [`Config::apply_env`].

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default render service endpoint.
pub const DEFAULT_RENDER_ENDPOINT: &str = "https://antv-studio.alipay.com/api/gpt-vis";

/// Environment variable overriding the render endpoint.
pub const ENV_RENDER_ENDPOINT: &str = "VIS_REQUEST_SERVER";

/// Environment variable carrying the service identifier.
pub const ENV_SERVICE_ID: &str = "SERVICE_ID";

/// Environment variable listing disabled tools (comma-separated).
pub const ENV_DISABLED_TOOLS: &str = "DISABLED_TOOLS";

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Render collaborator settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Tool names removed from the advertised catalog.
    #[serde(default)]
    pub disabled_tools: BTreeSet<String>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            _schema: None,
            _comment: None,
            render: RenderConfig::default(),
            disabled_tools: BTreeSet::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.render.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid render endpoint '{endpoint}'. Must be an http:// or https:// URL"
                ),
            });
        }
        if self.render.timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "render timeout_secs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Applies environment overrides using the given lookup function.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = non_empty(ENV_RENDER_ENDPOINT) {
            self.render.endpoint = endpoint;
        }
        if let Some(service_id) = non_empty(ENV_SERVICE_ID) {
            self.render.service_id = Some(service_id);
        }
        if let Some(disabled) = non_empty(ENV_DISABLED_TOOLS) {
            self.disabled_tools.extend(parse_tool_list(&disabled));
        }
    }
}

/// Splits a comma-separated tool list, dropping blanks.
#[must_use]
pub fn parse_tool_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render collaborator configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// URL the render requests are POSTed to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Identifier forwarded to the render service.
    #[serde(default)]
    pub service_id: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RenderConfig {
    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            service_id: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_RENDER_ENDPOINT.to_string()
}

const fn default_timeout_secs() -> u64 {
    15
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
