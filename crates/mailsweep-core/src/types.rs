//! Plain output records produced by the core operations.
//!
//! These are what the CLI renders, either as aligned text or as JSON;
//! they deliberately carry strings rather than wire types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mailsweep_jmap::methods::email::Address;

/// One line in an email listing.
#[derive(Debug, Clone, Serialize)]
pub struct EmailSummary {
    /// Email id.
    pub id: String,
    /// Thread id, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    /// Subject line, empty when absent.
    pub subject: String,
    /// Formatted From address.
    pub from: String,
    /// Server receive time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    /// Short plaintext preview.
    pub preview: String,
    /// True when `$seen` is not set.
    pub is_unread: bool,
    /// True when `$flagged` is set.
    pub is_flagged: bool,
    /// Highlighted search snippet, for search results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// A fully fetched email, for reading.
#[derive(Debug, Clone, Serialize)]
pub struct EmailDetail {
    /// Email id.
    pub id: String,
    /// Subject line, empty when absent.
    pub subject: String,
    /// Formatted From addresses.
    pub from: Vec<String>,
    /// Formatted To addresses.
    pub to: Vec<String>,
    /// Formatted CC addresses.
    pub cc: Vec<String>,
    /// Server receive time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    /// Extracted body text.
    pub body: String,
    /// Keywords currently set.
    pub keywords: Vec<String>,
    /// List-Unsubscribe header value, when the email carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_unsubscribe: Option<String>,
    /// Raw header fields, only when requested.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
}

/// One raw header field of a read email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Header field name as sent.
    pub name: String,
    /// Header field value, trimmed.
    pub value: String,
}

/// What a stored draft ended up containing.
#[derive(Debug, Clone, Serialize)]
pub struct DraftSummary {
    /// Server-assigned id of the new draft.
    pub id: String,
    /// Resolved To addresses.
    pub to: Vec<String>,
    /// Resolved CC addresses.
    pub cc: Vec<String>,
    /// Resolved BCC addresses.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    /// Resolved subject.
    pub subject: String,
    /// Message id this draft answers, when threading applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
}

/// One mailbox in a listing.
#[derive(Debug, Clone, Serialize)]
pub struct MailboxInfo {
    /// Mailbox id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Standard role, when assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Total email count.
    pub total_emails: u64,
    /// Unread email count.
    pub unread_emails: u64,
}

/// Email count for one sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderCount {
    /// Sender address.
    pub sender: String,
    /// Number of emails from this sender.
    pub count: u64,
    /// Distinct subject lines seen, alphabetical; only collected on
    /// request.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
}

/// A displayable description of the JMAP session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    /// Session username.
    pub username: String,
    /// API endpoint in use.
    pub api_url: String,
    /// Primary mail account id.
    pub account_id: String,
    /// Advertised capability URIs.
    pub capabilities: Vec<String>,
    /// Advertised `maxObjectsInSet`, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_objects_in_set: Option<u64>,
}

/// A single-pass triage overview of one mailbox: sender and domain
/// aggregation plus unread counts.
#[derive(Debug, Clone, Serialize)]
pub struct TriageSummary {
    /// The mailbox that was summarized.
    pub mailbox: String,
    /// Number of emails that matched.
    pub total: u64,
    /// How many of them are unread.
    pub unread: u64,
    /// Top senders, most prolific first.
    pub senders: Vec<SenderBreakdown>,
    /// Top sender domains, most prolific first.
    pub domains: Vec<DomainBreakdown>,
}

/// Per-sender slice of a [`TriageSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderBreakdown {
    /// Sender address.
    pub sender: String,
    /// Emails from this sender.
    pub count: u64,
    /// Unread emails from this sender.
    pub unread: u64,
    /// Whether the sender looks like a mailing list, when detection
    /// ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newsletter: Option<bool>,
    /// Sample subject lines, alphabetical; only collected on request.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
}

/// Per-domain slice of a [`TriageSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainBreakdown {
    /// Sender domain, lowercased.
    pub domain: String,
    /// Emails from this domain.
    pub count: u64,
    /// Unread emails from this domain.
    pub unread: u64,
}

/// Formats an address as `Name <addr>` when a display name exists.
#[must_use]
pub fn format_address(address: &Address) -> String {
    match address.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => format!("{name} <{}>", address.email),
        _ => address.email.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_with_name() {
        let addr = Address {
            name: Some("Ada".to_string()),
            email: "ada@example.com".to_string(),
        };
        assert_eq!(format_address(&addr), "Ada <ada@example.com>");
    }

    #[test]
    fn address_without_name() {
        assert_eq!(
            format_address(&Address::new("ada@example.com")),
            "ada@example.com"
        );
    }

    #[test]
    fn blank_name_is_ignored() {
        let addr = Address {
            name: Some("  ".to_string()),
            email: "ada@example.com".to_string(),
        };
        assert_eq!(format_address(&addr), "ada@example.com");
    }
}
