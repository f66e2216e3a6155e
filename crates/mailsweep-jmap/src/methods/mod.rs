//! Typed arguments and results for the JMAP methods mailsweep uses.

pub mod email;
pub mod mailbox;
pub mod sieve;
pub mod snippet;
pub mod thread;

use serde::Deserialize;

/// A per-object rejection inside an otherwise-successful `/set` call
/// (RFC 8620, Section 5.3).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetError {
    /// Machine-readable error type, e.g. `invalidProperties`.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable description, when the server supplies one.
    pub description: Option<String>,
    /// Offending property paths, when applicable.
    pub properties: Option<Vec<String>>,
}

impl SetError {
    /// Returns the description, falling back to the error type, then
    /// to a fixed placeholder.
    #[must_use]
    pub fn reason(&self) -> String {
        if let Some(description) = &self.description {
            return description.clone();
        }
        if !self.error_type.is_empty() {
            return self.error_type.clone();
        }
        "unknown error".to_string()
    }
}
