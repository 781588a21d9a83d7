//! Error types for the converter.
//!
//! A single tagged hierarchy built with `thiserror`. Each variant maps to
//! exactly one response shape at the MCP boundary, so callers match on the
//! kind instead of inspecting messages.
//!
//! # Error Categories
//!
//! - `ConfigError`: missing or malformed environment, fatal at startup
//! - `AuthError`: missing or mismatched bearer token, surfaced as HTTP 401
//! - `Error::InvalidInput`: tool arguments that fail schema validation
//! - `Error::Decode`: image data that is not valid base64
//! - `Error::NoImageGenerated`: the model answered without an image part
//! - `Error::Upstream`: network or API failure talking to the model

use std::fmt;

use thiserror::Error;

/// Message returned to callers whose bearer token is rejected.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized - Invalid bearer token";

/// Unified error type for the converter.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (missing env vars, invalid values)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Bearer token rejected
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Tool arguments failed validation. Every failing field is listed.
    #[error("Invalid input: {}", join_field_errors(.0))]
    InvalidInput(Vec<FieldError>),

    /// Image payload could not be decoded
    #[error("Failed to decode image data: {0}")]
    Decode(String),

    /// The model responded but produced no image part
    #[error("No image was generated: {0}")]
    NoImageGenerated(String),

    /// Upstream API errors with endpoint and HTTP status context.
    ///
    /// A status code of 0 means the request never got a response.
    #[error("API error for {endpoint} (HTTP {status_code}): {message}")]
    Upstream {
        /// The API endpoint that was called
        endpoint: String,
        /// HTTP status code returned by the API
        status_code: u16,
        /// Error message from the API or describing the failure
        message: String,
    },
}

impl Error {
    /// Create a new upstream error with endpoint, status code, and message.
    ///
    /// # Example
    ///
    /// ```
    /// use familyguy_mcp_common::error::Error;
    ///
    /// let err = Error::upstream(
    ///     "https://api.example.com/v1/generate",
    ///     429,
    ///     "Quota exceeded"
    /// );
    /// assert!(err.to_string().contains("api.example.com"));
    /// assert!(err.to_string().contains("429"));
    /// ```
    pub fn upstream(
        endpoint: impl Into<String>,
        status_code: u16,
        message: impl Into<String>,
    ) -> Self {
        Error::Upstream {
            endpoint: endpoint.into(),
            status_code,
            message: message.into(),
        }
    }

    /// Create a new decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode(message.into())
    }

    /// Create a new no-image error.
    pub fn no_image(message: impl Into<String>) -> Self {
        Error::NoImageGenerated(message.into())
    }

    /// Whether this error was caused by the caller's input rather than by
    /// the server or the upstream model.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

/// A single failing field in a validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `numberOfImages`.
    pub path: String,
    /// Why the field was rejected.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Configuration errors.
///
/// These errors occur when loading configuration from environment
/// variables and abort process startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("Required environment variable {0} is not set")]
    MissingEnvVar(String),

    /// An environment variable has an invalid value
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl ConfigError {
    /// Create a new missing environment variable error.
    pub fn missing_env_var(name: impl Into<String>) -> Self {
        ConfigError::MissingEnvVar(name.into())
    }

    /// Create a new invalid value error.
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue(name.into(), reason.into())
    }
}

/// Authentication errors.
///
/// Both variants render the same message so a caller cannot tell a missing
/// header from a wrong token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `authorization` header, or one that is not valid UTF-8
    #[error("Unauthorized - Invalid bearer token")]
    MissingToken,

    /// A token was presented but does not match the shared secret
    #[error("Unauthorized - Invalid bearer token")]
    InvalidToken,
}
