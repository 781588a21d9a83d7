//! Configuration module for loading environment variables and settings.

use std::fmt;

use crate::error::ConfigError;

/// Default Gemini REST API base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default HTTP port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8080;

/// Application configuration loaded from environment variables.
///
/// Parsed once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct Config {
    /// Gemini API key (required)
    pub gemini_api_key: String,
    /// Shared secret callers present as a bearer token (required)
    pub secret_token: String,
    /// HTTP server port
    pub port: u16,
    /// Base URL of the Gemini REST API
    pub gemini_base_url: String,
}

impl Config {
    /// Load configuration from environment variables and .env file.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingEnvVar` if `GEMINI_API_KEY` or
    /// `MCP_SECRET_TOKEN` is not set, and `ConfigError::InvalidValue` if
    /// `PORT` is not a valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::missing_env_var(name))
        };

        let gemini_api_key = required("GEMINI_API_KEY")?;
        let secret_token = required("MCP_SECRET_TOKEN")?;

        let port = match lookup("PORT").map(|p| p.trim().to_string()) {
            None => DEFAULT_PORT,
            Some(p) if p.is_empty() => DEFAULT_PORT,
            Some(p) => p
                .parse()
                .map_err(|e| ConfigError::invalid_value("PORT", format!("'{}': {}", p, e)))?,
        };

        let gemini_base_url = lookup("GEMINI_API_BASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            gemini_api_key,
            secret_token,
            port,
            gemini_base_url,
        })
    }

    /// Get the generate-content endpoint URL for a given model.
    pub fn generate_content_endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.gemini_base_url, model)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &"<redacted>")
            .field("secret_token", &"<redacted>")
            .field("port", &self.port)
            .field("gemini_base_url", &self.gemini_base_url)
            .finish()
    }
}
