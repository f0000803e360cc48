//! Error types for the BigQuery MCP Server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Startup failures (credentials, configuration) and per-call warehouse failures share
//! one enum so the warehouse client has a single result type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BqError {
    #[error("Invalid credentials: {message}")]
    Credentials { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Error reported by the BigQuery REST API.
    #[error("BigQuery API error ({status}): {message}")]
    Api {
        status: u16,
        /// e.g., "notFound", "invalidQuery"
        reason: Option<String>,
        message: String,
    },

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response from BigQuery: {message}")]
    InvalidResponse { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BqError {
    /// Create a credentials error.
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an API error from an HTTP status and the decoded error body.
    pub fn api(status: u16, reason: Option<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            reason,
            message: message.into(),
        }
    }

    /// Create an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Best-available human-readable message for this error.
    ///
    /// API errors yield the server's `message` field verbatim. Every other
    /// variant (and an API error with an empty message) falls back to the
    /// `Display` form.
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => self.to_string(),
        }
    }

    /// Check if this error happened before any tool could be served.
    pub fn is_startup_error(&self) -> bool {
        matches!(self, Self::Credentials { .. } | Self::Config { .. })
    }
}

/// Convert token-exchange failures into authentication errors.
impl From<gcp_auth::Error> for BqError {
    fn from(err: gcp_auth::Error) -> Self {
        BqError::auth(err.to_string())
    }
}

/// Result type alias for BigQuery operations.
pub type BqResult<T> = Result<T, BqError>;
