//! Error types for request execution.
//!
//! Every failure of the request pipeline is returned to the caller as an
//! [`ApiError`] value. The variants map one-to-one onto the stages of
//! [`execute`](crate::executor::execute):
//!
//! ```text
//! validate ──▶ token ──▶ send ──▶ decode envelope ──▶ ok? ──▶ decode result
//!    │           │         │            │               │           │
//! Validation MissingToken Transport MalformedResponse Remote  ResultDecode
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed error returned by update handlers and middleware.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Validation Errors
// =============================================================================

/// A request body failed its own parameter checks.
///
/// The message is carried verbatim; the executor never rewrites it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    /// Creates a validation error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type for request-body validation.
pub type ValidationResult = Result<(), ValidationError>;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors raised below the protocol layer.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection could not be established or was reset.
    #[error("connection failed: {url} - {reason}")]
    ConnectionFailed {
        /// The URL that failed.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The request timed out on the client side.
    #[error("request to {url} timed out")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The request could not be built (bad URL, bad header value...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Structured hints attached to a failed response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseParameters {
    /// The group has been migrated to a supergroup with this identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<i64>,
    /// Seconds to wait before the request can be repeated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Error type for API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body rejected its own parameters; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No bot token was configured.
    #[error("bot token is empty")]
    MissingToken,

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(String),

    /// Network or connection-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body is not a valid envelope.
    #[error("malformed response (HTTP {status}): {reason}")]
    MalformedResponse {
        /// HTTP status code of the response.
        status: u16,
        /// Decoder message.
        reason: String,
    },

    /// The remote side reported a failure.
    #[error("API error ({code}): {description}")]
    Remote {
        /// Numeric error code.
        code: i64,
        /// Human-readable description.
        description: String,
        /// Optional structured hints.
        parameters: Option<ResponseParameters>,
    },

    /// The call succeeded but its result did not decode into the requested type.
    #[error("failed to decode result: {0}")]
    ResultDecode(String),

    /// The execution context was cancelled while the call was in flight.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Returns the `retry_after` hint of a remote error, if any.
    pub fn retry_after(&self) -> Option<u64> {
        self.parameters().and_then(|p| p.retry_after)
    }

    /// Returns the chat a group was migrated to, if any.
    pub fn migrate_to_chat_id(&self) -> Option<i64> {
        self.parameters().and_then(|p| p.migrate_to_chat_id)
    }

    /// Returns the remote error code, if this is a remote error.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns `true` for errors produced by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    fn parameters(&self) -> Option<&ResponseParameters> {
        match self {
            Self::Remote { parameters, .. } => parameters.as_ref(),
            _ => None,
        }
    }
}

/// Generic failure surfaced by a handler chain.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// The handler panicked; the payload message is kept when it is a string.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "internal error".to_string()
        };
        Self::Panicked(msg)
    }
}

/// Wrapper that gives a `Display` to optional remote parameters in logs.
pub struct DisplayParameters<'a>(pub &'a Option<ResponseParameters>);

impl fmt::Display for DisplayParameters<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ResponseParameters {
                retry_after: Some(secs),
                ..
            }) => write!(f, "retry after {secs}s"),
            Some(ResponseParameters {
                migrate_to_chat_id: Some(id),
                ..
            }) => write!(f, "migrated to {id}"),
            _ => f.write_str("-"),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
