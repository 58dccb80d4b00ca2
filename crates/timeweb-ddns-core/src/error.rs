//! Error types for the DDNS updater
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS updater
#[derive(Error, Debug)]
pub enum Error {
    /// Every IP-echo endpoint failed
    #[error("No public IP available: {0}")]
    NoIpAvailable(String),

    /// Cookie replay and credential login both failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A record operation was attempted without an authenticated session
    #[error("Authentication required before record operations")]
    AuthenticationRequired,

    /// A-record row was not present on the DNS page
    #[error("A-record not found: {0}")]
    RecordNotFound(String),

    /// The edit modal did not reach the expected state in time
    #[error("Timed out updating A-record: {0}")]
    RecordUpdateTimeout(String),

    /// Required credentials are absent
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// Browser automation errors
    #[error("Browser error: {0}")]
    Browser(String),

    /// HTTP client errors (from IP-echo services)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an IP resolution error
    pub fn no_ip(msg: impl Into<String>) -> Self {
        Self::NoIpAvailable(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a "record not found" error
    pub fn record_not_found(fqdn: impl Into<String>) -> Self {
        Self::RecordNotFound(fqdn.into())
    }

    /// Create a record update timeout error
    pub fn record_timeout(msg: impl Into<String>) -> Self {
        Self::RecordUpdateTimeout(msg.into())
    }

    /// Create a missing configuration error
    pub fn config_missing(msg: impl Into<String>) -> Self {
        Self::ConfigurationMissing(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a browser automation error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
