//! Unified error type for the client crate.
//!
//! Expected runtime conditions (auth failure, transport failure, malformed
//! payloads) are reported through the publisher/subscriber callbacks rather
//! than panics. Configuration problems surface synchronously at construction.

use thiserror::Error;

/// Unified error type for client operations.
#[derive(Debug, Error, Clone)]
pub enum ClientError {
    /// Missing or invalid configuration. Fatal; never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Token derivation or signing failed. Fatal per attempt.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Network or HTTP failure. The attempt is abandoned; no auto-retry.
    #[error("Transport error{}: {message}", fmt_status(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Malformed or unreadable content. Permanently unprocessable; callers
    /// must not retry the same payload.
    #[error("Decode error: {0}")]
    Decode(String),
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

impl ClientError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an authentication error.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a transport error without an HTTP status (connection-level).
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: msg.into(),
        }
    }

    /// Create a transport error carrying the HTTP status of the response.
    pub fn http(status: u16, msg: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: msg.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}
