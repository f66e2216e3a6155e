//! Error types for the JMAP layer.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while talking to a JMAP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The retry budget was exhausted on transient failures.
    #[error("max retries exceeded: received status {status}")]
    RetriesExhausted {
        /// The last transient status received.
        status: StatusCode,
    },

    /// The request body is a one-shot stream and cannot be resent.
    #[error("cannot retry request with non-replayable body")]
    NonReplayableBody,

    /// The operation was cancelled while waiting to retry.
    #[error("operation cancelled")]
    Cancelled,

    /// The server answered with a non-success status outside the
    /// transient-retry set.
    #[error("server returned status {status}: {detail}")]
    Api {
        /// HTTP status of the failed exchange.
        status: StatusCode,
        /// Response body excerpt, when available.
        detail: String,
    },

    /// JSON encoding or decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The session object is missing something we need.
    #[error("session error: {0}")]
    Session(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
