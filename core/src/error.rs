//! Error types for the dispatch pipeline.
//!
//! # Design
//! `ApiError` is the closed taxonomy every caller sees. Raw failures from a
//! transport (`TransportFailure`) and raw error statuses are turned into an
//! `ApiError` by the classifier exactly once; nothing above the dispatcher
//! ever handles an unclassified failure.

use thiserror::Error;

/// A classified failure of a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Credentials were rejected: a 401 anywhere, or a 401/403 on login or
    /// register.
    #[error("authentication failed ({status:?}): {message}")]
    Authentication { status: Option<u16>, message: String },

    /// The server rejected the request with a 4xx other than an auth failure.
    #[error("request rejected with HTTP {status}: {body}")]
    Validation { status: u16, body: String },

    /// The server failed (5xx) or answered with a malformed body.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The request was sent but no response arrived.
    #[error("network unavailable: {message}")]
    NetworkUnavailable { message: String, timed_out: bool },

    /// The request could not be constructed or sent.
    #[error("request configuration error: {0}")]
    Configuration(String),

    /// The caller cancelled the request before it settled.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// The HTTP status behind this error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Authentication { status, .. } => *status,
            ApiError::Validation { status, .. } | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Re-express any failure of a login/register exchange as an
    /// authentication failure, keeping the status and cause.
    pub fn into_authentication(self) -> ApiError {
        match self {
            ApiError::Authentication { .. } => self,
            other => ApiError::Authentication {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

/// A transport-level failure before classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    /// The request left the client but no response was received.
    #[error("no response: {message}")]
    NoResponse { message: String, timed_out: bool },

    /// The request could not be built or handed to the network.
    #[error("request not sent: {0}")]
    Local(String),
}

/// Persisted storage failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed for key `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode value for key `{key}`: {message}")]
    Encode { key: String, message: String },

    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
}

/// Invalid values in environment-supplied configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}
