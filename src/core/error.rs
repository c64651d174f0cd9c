//! Custom error types for the application.
//!
//! Provides structured error handling with meaningful error messages
//! and proper error categorization for each domain:
//!
//! - [`FetchError`] - Transport-level failures of a single HTTP exchange
//! - [`ApiError`] - Failures of a REST call (auth, status, envelope, decode)
//! - [`ValidationError`] - Client-side form and path checks
//! - [`CsvError`] - Tabular import parsing failures
//! - [`ConfigError`] - Bundled configuration problems

use thiserror::Error;

/// Network/fetch-related errors for HTTP requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Browser window not available
    #[error("Browser window not available")]
    NoWindow,
    /// Failed to create HTTP request
    #[error("Failed to create request")]
    RequestCreationFailed,
    /// Network request failed (CORS, DNS, connection reset, ...)
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Failed to read response body
    #[error("Failed to read response")]
    ResponseReadFailed,
    /// Invalid response content (not text)
    #[error("Invalid response content")]
    InvalidContent,
    /// Request timed out
    #[error("Request timed out")]
    Timeout,
}

/// Errors produced by the endpoint client.
///
/// Only [`ApiError::AuthenticationRequired`] triggers the re-authentication
/// flow; every other variant is returned to the caller as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered with a redirect to the login page.
    #[error("Authentication required")]
    AuthenticationRequired {
        /// URL of the call that was redirected.
        url: String,
    },
    /// Non-2xx status or an envelope with status `ERROR`.
    #[error("{message}")]
    ApiCall {
        /// HTTP status, `None` when the envelope itself reported the error.
        status: Option<u16>,
        /// Server-provided message.
        message: String,
    },
    /// The request never produced a response.
    #[error(transparent)]
    Network(#[from] FetchError),
    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),
    /// Rejected before anything was sent.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl ApiError {
    /// Build an application-level error from an envelope message.
    pub fn envelope(message: impl Into<String>) -> Self {
        Self::ApiCall {
            status: None,
            message: message.into(),
        }
    }

    /// Build an HTTP-level error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::ApiCall {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn is_authentication_required(&self) -> bool {
        matches!(self, Self::AuthenticationRequired { .. })
    }
}

/// Client-side validation errors, displayed next to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name is required")]
    EmptyName,
    #[error("Name must not contain '{0}'")]
    ForbiddenCharacter(char),
    #[error("'{0}' is a reserved name")]
    ReservedName(String),
    #[error("Name must not start or end with a space")]
    SurroundingWhitespace,
    #[error("An item named '{0}' already exists")]
    NameAlreadyExists(String),
    #[error("Value must be a positive number of days")]
    InvalidDuration,
    #[error("Nothing is selected")]
    EmptySelection,
    #[error("Tag name is required")]
    EmptyTagKey,
    #[error("Tag '{0}' is defined twice")]
    DuplicateTagKey(String),
}

/// CSV parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsvError {
    #[error("CSV input is empty")]
    Empty,
    #[error("Unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },
    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("Row {row} has {found} fields, expected at most {expected}")]
    TooManyFields {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Configuration loading errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(String),
    #[error("Invalid log level filter '{0}'")]
    LogLevel(String),
}
