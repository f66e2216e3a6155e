//! JMAP object identifiers.

use serde::{Deserialize, Serialize};

/// An opaque JMAP id (account, email, mailbox, blob, ...).
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// Creates an id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the id is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Id {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_bare_string() {
        let id = Id::new("Mabc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"Mabc123\"");
    }

    #[test]
    fn deserializes_from_bare_string() {
        let id: Id = serde_json::from_str("\"Mabc123\"").unwrap();
        assert_eq!(id.as_str(), "Mabc123");
    }

    #[test]
    fn display_matches_inner() {
        assert_eq!(Id::new("x").to_string(), "x");
    }
}
