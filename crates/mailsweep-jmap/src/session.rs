//! JMAP session object (RFC 8620, Section 2).

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::id::Id;
use crate::{CORE_URI, MAIL_URI};

/// A JMAP session, fetched once from the session endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    /// The account-holder identity string (usually an address).
    pub username: String,
    /// Endpoint for API requests.
    pub api_url: String,
    /// URL template for blob uploads.
    pub upload_url: String,
    /// URL template for blob downloads.
    pub download_url: String,
    /// Accounts this session can access.
    pub accounts: BTreeMap<Id, Account>,
    /// Primary account id per capability URI.
    pub primary_accounts: BTreeMap<String, Id>,
    /// Server capability objects keyed by URI.
    pub capabilities: Capabilities,
    /// Opaque session state string.
    pub state: String,
}

impl Session {
    /// Returns the primary account for the mail capability, if any.
    #[must_use]
    pub fn primary_mail_account(&self) -> Option<&Id> {
        self.primary_accounts.get(MAIL_URI)
    }

    /// Returns the negotiated `maxObjectsInSet`, treating an absent
    /// core capability or a reported zero as unknown.
    #[must_use]
    pub fn max_objects_in_set(&self) -> Option<u64> {
        self.capabilities
            .core
            .as_ref()
            .map(|core| core.max_objects_in_set)
            .filter(|&n| n > 0)
    }

    /// Returns true if the server advertises the given capability URI.
    #[must_use]
    pub fn has_capability(&self, uri: &str) -> bool {
        if uri == CORE_URI {
            return self.capabilities.core.is_some();
        }
        self.capabilities.raw.contains_key(uri)
    }

    /// Returns all advertised capability URIs, sorted.
    #[must_use]
    pub fn capability_uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.capabilities.raw.keys().cloned().collect();
        if self.capabilities.core.is_some() {
            uris.push(CORE_URI.to_string());
        }
        uris.sort();
        uris
    }
}

/// One account visible to the session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    /// Human-readable account name.
    pub name: String,
    /// Whether this account belongs to the session user.
    pub is_personal: bool,
    /// Whether the account is read-only.
    pub is_read_only: bool,
}

/// The session's capability map. The core capability is decoded into a
/// typed struct; everything else is kept raw so extensions (such as
/// sieve) can be detected by URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Capabilities {
    /// The core capability object, when advertised.
    #[serde(rename = "urn:ietf:params:jmap:core")]
    pub core: Option<CoreCapability>,
    /// All other capability objects, keyed by URI.
    #[serde(flatten)]
    pub raw: BTreeMap<String, serde_json::Value>,
}

/// The core capability object (RFC 8620, Section 2).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreCapability {
    /// Maximum upload size in bytes.
    pub max_size_upload: u64,
    /// Maximum number of method calls in one request.
    pub max_calls_in_request: u64,
    /// Maximum number of objects one `/get` may fetch.
    pub max_objects_in_get: u64,
    /// Maximum number of objects one `/set` may target.
    pub max_objects_in_set: u64,
}
