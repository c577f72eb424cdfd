//! Runtime error types.

use std::path::PathBuf;

use thiserror::Error;
use tgbot_core::{ApiError, BoxError};

use crate::config::ConfigError;

/// Errors that stop an engine from starting or running.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The engine configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `start` was called on an engine that is not idle.
    #[error("Engine cannot start from state {0}")]
    NotIdle(&'static str),

    /// The platform did not acknowledge the webhook URL.
    #[error("Webhook registration failed: {0}")]
    Registration(#[source] ApiError),

    /// The webhook certificate could not be read.
    #[error("Failed to read certificate {path}: {source}")]
    Certificate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The listener could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server failed while serving.
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Failures reported to a poller's error hook. None of them stop the poller.
#[derive(Error, Debug)]
pub enum PollError {
    /// A `getUpdates` call failed; the fetch loop retries immediately.
    #[error("Failed to fetch updates: {0}")]
    Fetch(#[source] ApiError),

    /// The handler chain returned an error for one update.
    #[error("Handler failed for update {update_id}: {source}")]
    Handler {
        update_id: i64,
        #[source]
        source: BoxError,
    },
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
