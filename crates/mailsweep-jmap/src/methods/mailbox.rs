//! `Mailbox/get` (RFC 8621, Section 2).

use serde::{Deserialize, Serialize};

use crate::id::Id;
use crate::request::Method;
use crate::MAIL_URI;

/// One mailbox (folder).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Mailbox {
    /// Server-assigned id.
    pub id: Id,
    /// Display name.
    pub name: String,
    /// Standard role, e.g. `inbox` or `trash`, when assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Parent mailbox, for nested folders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Id>,
    /// Number of emails in the mailbox.
    pub total_emails: u64,
    /// Number of unread emails in the mailbox.
    pub unread_emails: u64,
}

/// `Mailbox/get` arguments.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Get {
    /// Target account.
    pub account_id: Id,
    /// Explicit ids to fetch, or `None` for all mailboxes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<Id>>,
}

impl Method for Get {
    const NAME: &'static str = "Mailbox/get";
    const USING: &'static [&'static str] = &[MAIL_URI];
}

/// `Mailbox/get` result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetResponse {
    /// Account the call operated on.
    pub account_id: Id,
    /// Found mailboxes.
    pub list: Vec<Mailbox>,
    /// Requested ids the server does not know.
    pub not_found: Vec<Id>,
}
