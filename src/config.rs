//! Client configuration.
//!
//! Use the builder methods to customize, or [`ClientConfig::from_env`] to pick
//! up overrides from the environment.
//!
//! ```ignore
//! use std::time::Duration;
//! use kaiwa::config::ClientConfig;
//!
//! let config = ClientConfig::default()
//!     .with_base_url("https://chat.example.com/api")
//!     .with_timeout(Duration::from_secs(10));
//! ```

use std::time::Duration;

/// Base URL of the backend during local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5001/api";

/// Uniform request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "KAIWA_API_BASE_URL";

/// Environment variable overriding the request timeout, in milliseconds.
pub const TIMEOUT_ENV: &str = "KAIWA_API_TIMEOUT_MS";

/// Settings for reaching the chat backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every resource path is appended to (no trailing slash)
    pub base_url: String,
    /// Timeout applied to every request
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    /// Create a new ClientConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL. A trailing slash is dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(url.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a config from `KAIWA_API_BASE_URL` and `KAIWA_API_TIMEOUT_MS`,
    /// falling back to defaults for anything unset or unusable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config = config.with_base_url(url.trim());
            }
        }

        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config = config.with_timeout(Duration::from_millis(ms)),
                _ => tracing::warn!(
                    "Ignoring {}={:?}: expected a positive number of milliseconds",
                    TIMEOUT_ENV,
                    raw
                ),
            }
        }

        config
    }
}

fn normalize_base_url(url: String) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.len() == url.len() {
        url
    } else {
        trimmed.to_string()
    }
}
