//! `Email/*` methods and the Email object (RFC 8621, Section 4).

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::SetError;
use crate::id::Id;
use crate::request::{Method, ResultReference};
use crate::MAIL_URI;

/// An address as it appears in email header fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Display name, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The address itself.
    #[serde(default)]
    pub email: String,
}

impl Address {
    /// Creates a bare address without a display name.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }
}

/// One body part descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BodyPart {
    /// Identifier linking this part to a value in `bodyValues`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,
    /// Blob holding the raw part content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_id: Option<Id>,
    /// Part size in bytes.
    pub size: u64,
    /// Filename, for attachments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// MIME type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Character set, when textual.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    /// Content disposition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disposition: Option<String>,
}

/// Decoded content for one body part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BodyValue {
    /// The decoded text.
    pub value: String,
    /// True when the server truncated the value.
    pub is_truncated: bool,
}

/// A raw header field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailHeader {
    /// Header field name.
    pub name: String,
    /// Raw header field value.
    pub value: String,
}

/// The Email object, used both in `/get` results and `/set` creates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Email {
    /// Server-assigned id (absent on creation).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    /// Thread this email belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<Id>,
    /// Mailbox membership set (id -> true).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub mailbox_ids: BTreeMap<Id, bool>,
    /// Keyword set (keyword -> true).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub keywords: BTreeMap<String, bool>,
    /// From header addresses.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<Address>,
    /// To header addresses.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<Address>,
    /// CC header addresses.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<Address>,
    /// BCC header addresses.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<Address>,
    /// Reply-To header addresses.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reply_to: Vec<Address>,
    /// Subject line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Message-ID header values.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub message_id: Vec<String>,
    /// In-Reply-To header values.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub in_reply_to: Vec<String>,
    /// References header values.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    /// Date header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<FixedOffset>>,
    /// Server receive time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    /// Total size in bytes.
    #[serde(skip_serializing_if = "is_zero")]
    pub size: u64,
    /// Server-generated plaintext preview.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub preview: String,
    /// Decoded body part contents keyed by part id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub body_values: BTreeMap<String, BodyValue>,
    /// Parts making up the plaintext body.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text_body: Vec<BodyPart>,
    /// Parts making up the HTML body.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub html_body: Vec<BodyPart>,
    /// Attachment parts.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<BodyPart>,
    /// Raw header fields, when requested.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<EmailHeader>,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // signature dictated by serde
fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl Email {
    /// Returns true when the given keyword is set.
    #[must_use]
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.get(keyword).copied().unwrap_or(false)
    }
}

/// A sparse set of property-level mutations applied to one email.
///
/// Values set a property path; `null` clears it (JMAP patch deletion).
/// This is the only mutation shape the client ever sends for existing
/// emails; whole-object destroys are structurally unrepresentable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(BTreeMap<String, serde_json::Value>);

impl Patch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property path to a value.
    #[must_use]
    pub fn set(mut self, path: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(path.into(), value.into());
        self
    }

    /// Clears a property path (patch deletion).
    #[must_use]
    pub fn clear(mut self, path: impl Into<String>) -> Self {
        self.0.insert(path.into(), serde_json::Value::Null);
        self
    }

    /// Merges another patch into this one, later entries winning.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.0.extend(other.0);
        self
    }

    /// Looks up the value for a property path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&serde_json::Value> {
        self.0.get(path)
    }

    /// Returns the number of property mutations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the patch mutates nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `Email/set` arguments. The client only ever populates `create`
/// (draft creation) or `update` (bulk patches); `destroy` has no
/// constructor on purpose and always serializes as absent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Set {
    /// Target account.
    pub account_id: Id,
    /// Emails to create, keyed by client-chosen creation id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub create: BTreeMap<Id, Email>,
    /// Patches to apply, keyed by email id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub update: BTreeMap<Id, Patch>,
}

impl Method for Set {
    const NAME: &'static str = "Email/set";
    const USING: &'static [&'static str] = &[MAIL_URI];
}

/// `Email/set` result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetResponse {
    /// Account the call operated on.
    pub account_id: Id,
    /// Created emails with their server-set properties, keyed by
    /// creation id.
    pub created: BTreeMap<Id, Email>,
    /// Creations the server rejected.
    pub not_created: BTreeMap<Id, SetError>,
    /// Successfully updated ids (values carry any server-set changes).
    pub updated: BTreeMap<Id, Option<serde_json::Value>>,
    /// Updates the server rejected.
    pub not_updated: BTreeMap<Id, SetError>,
    /// State strings before and after the call.
    pub old_state: Option<String>,
    /// State string after the call.
    pub new_state: Option<String>,
}

/// `Email/get` arguments.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Get {
    /// Target account.
    pub account_id: Id,
    /// Explicit ids to fetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<Id>>,
    /// Back-reference producing the ids from an earlier call.
    #[serde(rename = "#ids", skip_serializing_if = "Option::is_none")]
    pub ids_ref: Option<ResultReference>,
    /// Properties to return (server default when absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,
    /// Properties to return for each body part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_properties: Option<Vec<String>>,
    /// Fetch decoded values for text body parts.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fetch_text_body_values: bool,
    /// Fetch decoded values for HTML body parts.
    #[serde(rename = "fetchHTMLBodyValues", skip_serializing_if = "std::ops::Not::not")]
    pub fetch_html_body_values: bool,
}

impl Method for Get {
    const NAME: &'static str = "Email/get";
    const USING: &'static [&'static str] = &[MAIL_URI];
}

/// `Email/get` result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetResponse {
    /// Account the call operated on.
    pub account_id: Id,
    /// Found emails.
    pub list: Vec<Email>,
    /// Requested ids the server does not know.
    pub not_found: Vec<Id>,
}

/// `Email/query` sort comparator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparator {
    /// Property to sort on.
    pub property: String,
    /// Ascending when true.
    pub is_ascending: bool,
}

/// Boolean combinator for filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    /// All conditions must match.
    #[serde(rename = "AND")]
    And,
    /// Any condition may match.
    #[serde(rename = "OR")]
    Or,
    /// No condition may match.
    #[serde(rename = "NOT")]
    Not,
}

/// An email filter: either a single condition or a boolean combination.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Filter {
    /// A leaf condition.
    Condition(FilterCondition),
    /// A boolean combination of sub-filters.
    Operator(FilterOperator),
}

/// A boolean combination of filters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOperator {
    /// The combinator.
    pub operator: Operator,
    /// Sub-filters.
    pub conditions: Vec<Filter>,
}

/// A single filter condition. One condition object can carry at most
/// one `notKeyword`; expressing two independent not-keyword
/// constraints requires an AND [`FilterOperator`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    /// Restrict to one mailbox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_mailbox: Option<Id>,
    /// Full-text search across subject, addresses, and body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Match the From header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Match the To header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Match the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Received before this instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<DateTime<Utc>>,
    /// Received after this instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<DateTime<Utc>>,
    /// Require at least one attachment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_attachment: Option<bool>,
    /// Require a keyword to be set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_keyword: Option<String>,
    /// Require a keyword to be absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_keyword: Option<String>,
}

/// `Email/query` arguments.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Target account.
    pub account_id: Id,
    /// Filter to apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    /// Sort order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<Comparator>,
    /// Zero-based offset into the result list.
    pub position: i64,
    /// Maximum number of ids to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Ask the server to compute the total match count.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub calculate_total: bool,
}

impl Method for Query {
    const NAME: &'static str = "Email/query";
    const USING: &'static [&'static str] = &[MAIL_URI];
}

/// `Email/query` result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryResponse {
    /// Account the call operated on.
    pub account_id: Id,
    /// Matching ids, in sort order.
    pub ids: Vec<Id>,
    /// Offset the ids start at.
    pub position: i64,
    /// Total match count, when calculated.
    pub total: Option<u64>,
}
