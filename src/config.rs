//! Provider configuration.
//!
//! The host tool hands the provider its configuration block as JSON once, at
//! provider-configuration time. It is turned into an immutable [`ProviderConfig`]
//! that the [`GitHubClient`](crate::client::GitHubClient) keeps for its lifetime.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

/// Environment variable consulted when no token is configured.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Default GitHub REST API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Default wall-clock bound for one HTTP round-trip.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Static configuration for the GitHub API client.
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    /// Bearer credential sent with every request.
    #[serde(default)]
    pub token: String,
    /// Base URL of the REST API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// `User-Agent` header value. GitHub rejects requests without one.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Sub-second timeout set programmatically; wins over `timeout_secs`.
    #[serde(skip)]
    timeout_override: Option<Duration>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    concat!("hemmer-provider-github/", env!("CARGO_PKG_VERSION")).to_string()
}

impl ProviderConfig {
    /// Create a configuration with the given token and default settings.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            timeout_override: None,
        }
    }

    /// Parse the host tool's configuration block.
    ///
    /// A `null` block is treated as empty. When no token is configured the
    /// [`TOKEN_ENV_VAR`] environment variable is used instead.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ProviderError> {
        let value = if value.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            value
        };
        let mut config: Self = serde_json::from_value(value)
            .map_err(|e| ProviderError::Configuration(format!("invalid provider config: {}", e)))?;

        if config.token.is_empty() {
            if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
                config.token = token;
            }
        }
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Override the base URL (used to point the client at a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self.timeout_override = Some(timeout);
        self
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout_override
            .unwrap_or_else(|| Duration::from_secs(self.timeout_secs))
    }

    /// Check the configuration, returning diagnostics for every problem found.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if self.token.trim().is_empty() {
            diagnostics.push(
                Diagnostic::error("Missing GitHub token")
                    .with_detail(format!(
                        "Set `token` in the provider block or the {} environment variable",
                        TOKEN_ENV_VAR
                    ))
                    .with_attribute("token"),
            );
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            diagnostics.push(
                Diagnostic::error("Invalid base URL")
                    .with_detail(format!("'{}' is not an http(s) URL", self.base_url))
                    .with_attribute("base_url"),
            );
        }
        if self.timeout_secs == 0 {
            diagnostics.push(
                Diagnostic::error("Invalid timeout")
                    .with_detail("timeout_secs must be at least 1")
                    .with_attribute("timeout_secs"),
            );
        }
        diagnostics
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Schema of the provider configuration block.
pub fn provider_config_schema() -> Schema {
    Schema::v0()
        .with_description("GitHub provider configuration")
        .with_attribute(
            "token",
            Attribute::optional_string()
                .sensitive()
                .with_description("Personal access token; defaults to $GITHUB_TOKEN"),
        )
        .with_attribute(
            "base_url",
            Attribute::optional_string()
                .with_description("GitHub REST API endpoint")
                .with_default(serde_json::json!(DEFAULT_BASE_URL)),
        )
        .with_attribute(
            "timeout_secs",
            Attribute::optional_int64()
                .with_description("Timeout for a single API request, in seconds")
                .with_default(serde_json::json!(DEFAULT_TIMEOUT_SECS)),
        )
}
