//! Configuration types for the BalancEED client.
//!
//! The client reads `balanceed.json` from the working directory (or an
//! explicit path). Every field has a default so a missing file is valid.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BalanceedError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "balanceed.json";

/// Default REST API base URL.
fn default_api_base_url() -> String {
    "http://localhost:8001/api".to_string()
}

/// Default directory holding the persisted session.
fn default_session_dir() -> String {
    ".balanceed".to_string()
}

/// Default per-request timeout in seconds.
const fn default_request_timeout() -> u64 {
    10
}

/// Default budget for the optional survey-question fetch, in milliseconds.
const fn default_survey_timeout() -> u64 {
    3000
}

fn default_demo_email() -> String {
    "student@demo.com".to_string()
}

fn default_demo_password() -> String {
    "demo123".to_string()
}

/// Main configuration for the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the REST API, including the `/api` prefix.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL for realtime connections. Derived from `api_base_url` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_base_url: Option<String>,

    /// Directory where the session credential and profile are persisted.
    #[serde(default = "default_session_dir")]
    pub session_dir: String,

    /// Timeout for every REST request in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for the survey-question fetch in milliseconds.
    #[serde(default = "default_survey_timeout")]
    pub survey_timeout_ms: u64,

    /// Credentials used by demo setup.
    #[serde(default)]
    pub demo: DemoCredentials,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            ws_base_url: None,
            session_dir: default_session_dir(),
            request_timeout_secs: default_request_timeout(),
            survey_timeout_ms: default_survey_timeout(),
            demo: DemoCredentials::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `balanceed.json`; returns defaults if it does not exist.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            BalanceedError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `balanceed.json` in a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `BalanceedError::ConfigParseError` if the file exists but is not
    /// valid JSON, and `BalanceedError::ConfigValidationError` if the values are
    /// unusable.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(BalanceedError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| BalanceedError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<()> {
        let api = self.api_base_url.trim();
        if api.is_empty() {
            return Err(BalanceedError::config_validation(
                "apiBaseUrl must not be empty",
                "Set apiBaseUrl to the platform API, e.g. http://localhost:8001/api",
            ));
        }

        if !(api.starts_with("http://") || api.starts_with("https://")) {
            return Err(BalanceedError::config_validation(
                format!("apiBaseUrl '{api}' must start with http:// or https://"),
                "Use a full URL including the scheme in your balanceed.json",
            ));
        }

        if let Some(ws) = &self.ws_base_url {
            if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
                return Err(BalanceedError::config_validation(
                    format!("wsBaseUrl '{ws}' must start with ws:// or wss://"),
                    "Remove wsBaseUrl to derive it from apiBaseUrl",
                ));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(BalanceedError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Set requestTimeoutSecs to at least 1 second in your balanceed.json",
            ));
        }

        if self.session_dir.trim().is_empty() {
            return Err(BalanceedError::config_validation(
                "sessionDir must not be empty",
                "Provide a directory for the persisted session (default '.balanceed')",
            ));
        }

        if self.demo.email.trim().is_empty() || self.demo.password.is_empty() {
            return Err(BalanceedError::config_validation(
                "demo credentials must not be empty",
                "Set demo.email and demo.password, or remove the demo section to use defaults",
            ));
        }

        Ok(())
    }

    /// Returns the API base URL without a trailing slash.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }

    /// Returns the realtime base URL, deriving it from the API URL when unset.
    ///
    /// `http://host/api` becomes `ws://host/api`; `https` becomes `wss`.
    #[must_use]
    pub fn ws_base(&self) -> String {
        if let Some(ws) = &self.ws_base_url {
            return ws.trim_end_matches('/').to_string();
        }
        let api = self.api_base();
        api.strip_prefix("https://").map_or_else(
            || {
                api.strip_prefix("http://")
                    .map_or_else(|| api.to_string(), |rest| format!("ws://{rest}"))
            },
            |rest| format!("wss://{rest}"),
        )
    }

    /// Returns the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the survey fetch timeout as a `Duration`.
    #[must_use]
    pub const fn survey_timeout(&self) -> Duration {
        Duration::from_millis(self.survey_timeout_ms)
    }
}

/// Fixed credentials of the provisioned demo student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoCredentials {
    /// Demo account email.
    #[serde(default = "default_demo_email")]
    pub email: String,

    /// Demo account password.
    #[serde(default = "default_demo_password")]
    pub password: String,
}

impl Default for DemoCredentials {
    fn default() -> Self {
        Self {
            email: default_demo_email(),
            password: default_demo_password(),
        }
    }
}
