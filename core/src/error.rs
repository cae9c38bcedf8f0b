//! Error types for the access layer.
//!
//! # Design
//! Every failure a caller can observe is an `ApiError`. Variants fall into
//! two groups: failures that carry an HTTP status (`Http`, `Unauthorized`)
//! and failures where no usable response exists (`Transport`, `Decode`).
//! `Unauthorized` is split out from `Http` because it is the one status the
//! layer reacts to, by clearing the stored session token.

use thiserror::Error;

/// Errors raised by a [`crate::TokenStore`] backend.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("token store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("token store is corrupt: {0}")]
    Corrupt(String),

    #[error("token store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by a [`crate::Transport`] when no response was received.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("transport error: {0}")]
    Other(String),
}

/// Errors returned by the access layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (DNS, connection refused, broken body).
    #[error("network error: {message}")]
    Transport { message: String },

    /// The server answered with a non-2xx status other than 401.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },

    /// The server answered 401. The stored session has been cleared.
    #[error("{message}")]
    Unauthorized { message: String, body: String },

    /// The response claimed JSON but could not be parsed.
    #[error("invalid JSON response: {message}")]
    Decode { message: String, body: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The resource identifier is empty after normalization.
    #[error("invalid resource identifier: {0:?}")]
    InvalidResource(String),

    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),
}

impl ApiError {
    /// HTTP status carried by the failure, absent for network-level errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }

    /// Raw response body, when a response was received.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            ApiError::Http { body, .. }
            | ApiError::Unauthorized { body, .. }
            | ApiError::Decode { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Transport {
            message: err.to_string(),
        }
    }
}
