//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// JMAP transport or protocol failure.
    #[error("JMAP error: {0}")]
    Jmap(#[from] mailsweep_jmap::Error),

    /// The server rejected one whole method invocation.
    #[error("{method} failed: {source}")]
    Method {
        /// Wire method name of the failed invocation.
        method: String,
        /// Call id of the failed invocation.
        call_id: String,
        /// The server's error object.
        #[source]
        source: mailsweep_jmap::MethodError,
    },

    /// The server answered a call with a result of the wrong type.
    #[error("expected a {expected} result, got {got}")]
    UnexpectedResponse {
        /// The method result we asked for.
        expected: &'static str,
        /// The method name the server answered with.
        got: String,
    },

    /// The session exposes no primary mail account.
    #[error("session has no primary mail account")]
    NoMailAccount,

    /// A guarded operation was refused before reaching the server.
    #[error("refusing to {operation}: {reason}")]
    Forbidden {
        /// What was attempted.
        operation: String,
        /// Why it was refused.
        reason: String,
    },

    /// A mailbox, email, or script lookup found nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// An unrecognized flag color name.
    #[error("unknown flag color: {0:?}")]
    InvalidColor(String),

    /// An unrecognized sort field name.
    #[error("unknown sort field: {0:?} (expected date, sent, from, subject, or size)")]
    InvalidSort(String),

    /// The server does not advertise the sieve capability.
    #[error("server does not support sieve script management")]
    SieveUnsupported,

    /// The server rejected a sieve script as invalid.
    #[error("invalid sieve script: {0}")]
    SieveInvalid(String),

    /// The server refused to create a draft.
    #[error("draft not created: {0}")]
    DraftRejected(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
