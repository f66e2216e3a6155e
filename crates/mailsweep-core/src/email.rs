//! Email operations: bulk mutations, listing, search, and reading.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use mailsweep_jmap::methods::email::{
    self, Comparator, Email, Filter, FilterCondition, FilterOperator, Operator, Patch,
};
use mailsweep_jmap::methods::{snippet, thread};
use mailsweep_jmap::{Id, Request, ResultReference};

use crate::batch::BatchOutcome;
use crate::client::{
    expect_email_get, expect_email_query, expect_snippet_get, expect_thread_get, split_response,
    Client, Exchange,
};
use crate::color::{flag_patch, unflag_patch, FlagColor};
use crate::error::{Error, Result};
use crate::mailbox::Role;
use crate::safety;
use crate::types::{format_address, EmailDetail, EmailSummary, Header};

const SUMMARY_PROPERTIES: &[&str] = &[
    "id",
    "threadId",
    "subject",
    "from",
    "receivedAt",
    "preview",
    "keywords",
];

const DETAIL_PROPERTIES: &[&str] = &[
    "id",
    "subject",
    "from",
    "to",
    "cc",
    "receivedAt",
    "keywords",
    "headers",
    "bodyValues",
    "textBody",
    "htmlBody",
];

/// Sort key for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// Server receive time.
    Date,
    /// Sent time from the Date header.
    Sent,
    /// From header.
    From,
    /// Subject line.
    Subject,
    /// Message size.
    Size,
}

impl SortField {
    const fn property(self) -> &'static str {
        match self {
            Self::Date => "receivedAt",
            Self::Sent => "sentAt",
            Self::From => "from",
            Self::Subject => "subject",
            Self::Size => "size",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "date" | "receivedat" => Ok(Self::Date),
            "sent" | "sentat" => Ok(Self::Sent),
            "from" => Ok(Self::From),
            "subject" => Ok(Self::Subject),
            "size" => Ok(Self::Size),
            _ => Err(Error::InvalidSort(value.to_string())),
        }
    }
}

/// Sort direction for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest or smallest first.
    Ascending,
    /// Newest or largest first.
    Descending,
}

/// Options for [`Client::list_emails`].
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Mailbox reference (role, name, or id); `None` searches all
    /// mail.
    pub mailbox: Option<String>,
    /// Maximum number of results.
    pub limit: u64,
    /// Sort key.
    pub sort: SortField,
    /// Sort direction.
    pub order: SortOrder,
    /// Only emails without `$seen`.
    pub unread_only: bool,
    /// Only emails with `$flagged`.
    pub flagged_only: bool,
    /// Only emails without `$flagged`.
    pub unflagged_only: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            mailbox: None,
            limit: 50,
            sort: SortField::Date,
            order: SortOrder::Descending,
            unread_only: false,
            flagged_only: false,
            unflagged_only: false,
        }
    }
}

/// Options for [`Client::search_emails`].
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Full-text query; snippets are only produced when set.
    pub text: Option<String>,
    /// Restrict to one mailbox (role, name, or id).
    pub mailbox: Option<String>,
    /// Match against the From header.
    pub from: Option<String>,
    /// Match against the To header.
    pub to: Option<String>,
    /// Match against the subject.
    pub subject: Option<String>,
    /// Only emails received before this instant.
    pub before: Option<DateTime<Utc>>,
    /// Only emails received after this instant.
    pub after: Option<DateTime<Utc>>,
    /// Only emails with attachments.
    pub has_attachment: bool,
    /// Maximum number of hits.
    pub limit: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            text: None,
            mailbox: None,
            from: None,
            to: None,
            subject: None,
            before: None,
            after: None,
            has_attachment: false,
            limit: 20,
        }
    }
}

/// Options for [`Client::read_email`] and [`Client::read_thread`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Prefer the HTML body over the text body.
    pub prefer_html: bool,
    /// Include every raw header field in the detail.
    pub raw_headers: bool,
}

/// Builds the listing filter.
///
/// A condition object holds at most one `notKeyword`, so requesting
/// both unread and unflagged forces an AND operator; everything else
/// fits in one flat condition.
pub(crate) fn build_filter(
    mailbox_id: Option<Id>,
    unread_only: bool,
    flagged_only: bool,
    unflagged_only: bool,
) -> Option<Filter> {
    if mailbox_id.is_none() && !unread_only && !flagged_only && !unflagged_only {
        return None;
    }
    let mut condition = FilterCondition {
        in_mailbox: mailbox_id,
        has_keyword: flagged_only.then(|| "$flagged".to_string()),
        not_keyword: unread_only.then(|| "$seen".to_string()),
        ..FilterCondition::default()
    };
    if unflagged_only {
        if unread_only {
            return Some(Filter::Operator(FilterOperator {
                operator: Operator::And,
                conditions: vec![
                    Filter::Condition(condition),
                    Filter::Condition(FilterCondition {
                        not_keyword: Some("$flagged".to_string()),
                        ..FilterCondition::default()
                    }),
                ],
            }));
        }
        condition.not_keyword = Some("$flagged".to_string());
    }
    Some(Filter::Condition(condition))
}

fn summarize(email: &Email) -> EmailSummary {
    EmailSummary {
        id: email.id.as_ref().map(ToString::to_string).unwrap_or_default(),
        thread_id: email.thread_id.as_ref().map(ToString::to_string),
        subject: email.subject.clone().unwrap_or_default(),
        from: email.from.first().map(format_address).unwrap_or_default(),
        received_at: email.received_at,
        preview: email.preview.clone(),
        is_unread: !email.has_keyword("$seen"),
        is_flagged: email.has_keyword("$flagged"),
        snippet: None,
    }
}

/// Extracts a readable body: decoded parts of the preferred kind
/// joined in order, the other kind when none decoded, or the preview
/// as a last resort.
#[must_use]
pub fn extract_body(email: &Email, prefer_html: bool) -> String {
    let collect = |parts: &[email::BodyPart]| -> Vec<String> {
        parts
            .iter()
            .filter_map(|part| part.part_id.as_deref())
            .filter_map(|part_id| email.body_values.get(part_id))
            .map(|value| value.value.clone())
            .collect()
    };

    let (primary, fallback) = if prefer_html {
        (collect(&email.html_body), collect(&email.text_body))
    } else {
        (collect(&email.text_body), collect(&email.html_body))
    };
    if !primary.is_empty() {
        return primary.join("\n");
    }
    if !fallback.is_empty() {
        return fallback.join("\n");
    }
    email.preview.clone()
}

/// Finds a raw header field by name, case-insensitively.
pub(crate) fn header_value(email: &Email, name: &str) -> Option<String> {
    email
        .headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case(name))
        .map(|header| header.value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn detail(email: &Email, options: ReadOptions) -> EmailDetail {
    EmailDetail {
        id: email.id.as_ref().map(ToString::to_string).unwrap_or_default(),
        subject: email.subject.clone().unwrap_or_default(),
        from: email.from.iter().map(format_address).collect(),
        to: email.to.iter().map(format_address).collect(),
        cc: email.cc.iter().map(format_address).collect(),
        received_at: email.received_at,
        body: extract_body(email, options.prefer_html),
        keywords: email
            .keywords
            .iter()
            .filter(|&(_, &set)| set)
            .map(|(keyword, _)| keyword.clone())
            .collect(),
        list_unsubscribe: header_value(email, "List-Unsubscribe"),
        headers: if options.raw_headers {
            email
                .headers
                .iter()
                .map(|header| Header {
                    name: header.name.clone(),
                    value: header.value.trim().to_string(),
                })
                .collect()
        } else {
            Vec::new()
        },
    }
}

impl<X: Exchange> Client<X> {
    /// Moves emails into a mailbox, replacing all current memberships.
    /// Trash-like destinations are refused.
    ///
    /// # Errors
    ///
    /// Fails on an unresolvable or forbidden destination; per-email
    /// failures are reported in the outcome.
    pub async fn move_emails(&self, ids: &[Id], destination: &str) -> Result<BatchOutcome> {
        let mailbox = self.resolve_mailbox(destination).await?;
        safety::check_move_destination(&mailbox)?;
        debug!(mailbox = %mailbox.name, count = ids.len(), "moving emails");
        let membership = serde_json::json!({ mailbox.id.as_str(): true });
        let patch = Patch::new().set("mailboxIds", membership);
        self.batch_update_emails(ids, &patch).await
    }

    /// Moves emails to the archive mailbox.
    ///
    /// # Errors
    ///
    /// Fails when the account has no archive mailbox.
    pub async fn archive_emails(&self, ids: &[Id]) -> Result<BatchOutcome> {
        let mailbox = self.mailbox_by_role(Role::Archive).await?;
        self.move_emails(ids, mailbox.id.as_str()).await
    }

    /// Moves emails to the junk mailbox.
    ///
    /// # Errors
    ///
    /// Fails when the account has no junk mailbox.
    pub async fn mark_spam(&self, ids: &[Id]) -> Result<BatchOutcome> {
        let mailbox = self.mailbox_by_role(Role::Junk).await?;
        self.move_emails(ids, mailbox.id.as_str()).await
    }

    /// Sets `$seen` on every given email.
    ///
    /// # Errors
    ///
    /// Only request serialization can fail.
    pub async fn mark_read(&self, ids: &[Id]) -> Result<BatchOutcome> {
        let patch = Patch::new().set("keywords/$seen", true);
        self.batch_update_emails(ids, &patch).await
    }

    /// Clears `$seen` on every given email.
    ///
    /// # Errors
    ///
    /// Only request serialization can fail.
    pub async fn mark_unread(&self, ids: &[Id]) -> Result<BatchOutcome> {
        let patch = Patch::new().clear("keywords/$seen");
        self.batch_update_emails(ids, &patch).await
    }

    /// Flags every given email, optionally with a color.
    ///
    /// # Errors
    ///
    /// Only request serialization can fail.
    pub async fn flag_emails(&self, ids: &[Id], color: Option<FlagColor>) -> Result<BatchOutcome> {
        self.batch_update_emails(ids, &flag_patch(color)).await
    }

    /// Removes the flag and color bits from every given email.
    ///
    /// # Errors
    ///
    /// Only request serialization can fail.
    pub async fn unflag_emails(&self, ids: &[Id]) -> Result<BatchOutcome> {
        self.batch_update_emails(ids, &unflag_patch()).await
    }

    /// Lists emails, newest first by default.
    ///
    /// # Errors
    ///
    /// Fails on an unresolvable mailbox reference or a failed
    /// exchange.
    pub async fn list_emails(&self, options: &ListOptions) -> Result<Vec<EmailSummary>> {
        let mailbox_id = match &options.mailbox {
            Some(reference) => Some(self.resolve_mailbox(reference).await?.id),
            None => None,
        };
        let filter = build_filter(
            mailbox_id,
            options.unread_only,
            options.flagged_only,
            options.unflagged_only,
        );

        let mut req = Request::new();
        let query_id = req.invoke(&email::Query {
            account_id: self.account_id().clone(),
            filter,
            sort: vec![Comparator {
                property: options.sort.property().to_string(),
                is_ascending: options.order == SortOrder::Ascending,
            }],
            position: 0,
            limit: Some(options.limit),
            calculate_total: false,
        })?;
        let get_id = req.invoke(&email::Get {
            account_id: self.account_id().clone(),
            ids_ref: Some(ResultReference {
                result_of: query_id.clone(),
                name: "Email/query".to_string(),
                path: "/ids".to_string(),
            }),
            properties: Some(SUMMARY_PROPERTIES.iter().map(ToString::to_string).collect()),
            ..email::Get::default()
        })?;

        let response = self.send(&req).await?;
        let (_, get_response) = split_response(response, &query_id, &get_id);
        let get = expect_email_get(get_response, &get_id)?;
        Ok(get.list.iter().map(summarize).collect())
    }

    /// Searches emails by text and header criteria, newest first.
    /// Full-text queries also fetch highlighted snippets; when the
    /// server refuses the snippet call, the hits come back without
    /// them.
    ///
    /// # Errors
    ///
    /// Fails on an unresolvable mailbox reference or when the query or
    /// fetch fails.
    pub async fn search_emails(&self, options: &SearchOptions) -> Result<Vec<EmailSummary>> {
        let mailbox_id = match &options.mailbox {
            Some(reference) => Some(self.resolve_mailbox(reference).await?.id),
            None => None,
        };
        let filter = Filter::Condition(FilterCondition {
            in_mailbox: mailbox_id,
            text: options.text.clone(),
            from: options.from.clone(),
            to: options.to.clone(),
            subject: options.subject.clone(),
            before: options.before,
            after: options.after,
            has_attachment: options.has_attachment.then_some(true),
            ..FilterCondition::default()
        });

        let mut req = Request::new();
        let query_id = req.invoke(&email::Query {
            account_id: self.account_id().clone(),
            filter: Some(filter.clone()),
            sort: vec![Comparator {
                property: "receivedAt".to_string(),
                is_ascending: false,
            }],
            position: 0,
            limit: Some(options.limit),
            calculate_total: false,
        })?;
        let ids_ref = ResultReference {
            result_of: query_id.clone(),
            name: "Email/query".to_string(),
            path: "/ids".to_string(),
        };
        let get_id = req.invoke(&email::Get {
            account_id: self.account_id().clone(),
            ids_ref: Some(ids_ref.clone()),
            properties: Some(SUMMARY_PROPERTIES.iter().map(ToString::to_string).collect()),
            ..email::Get::default()
        })?;
        let snippet_id = if options.text.is_some() {
            Some(req.invoke(&snippet::Get {
                account_id: self.account_id().clone(),
                filter: Some(filter),
                email_ids: None,
                email_ids_ref: Some(ids_ref),
            })?)
        } else {
            None
        };

        let response = self.send(&req).await?;
        let Some(snippet_id) = snippet_id else {
            let get = expect_email_get(response, &get_id)?;
            return Ok(get.list.iter().map(summarize).collect());
        };

        let (get_response, snippet_response) = split_response(response, &get_id, &snippet_id);
        let get = expect_email_get(get_response, &get_id)?;
        let mut summaries: Vec<EmailSummary> = get.list.iter().map(summarize).collect();
        match expect_snippet_get(snippet_response, &snippet_id) {
            Ok(snippets) => {
                for summary in &mut summaries {
                    summary.snippet = snippets
                        .list
                        .iter()
                        .find(|s| s.email_id.as_str() == summary.id)
                        .and_then(|s| s.preview.clone());
                }
            }
            // Some servers cannot highlight every filter shape; the
            // hits are still good without snippets.
            Err(Error::Method { source, .. }) => {
                warn!(error = %source.error_type, "snippets unavailable, returning hits without them");
            }
            Err(err) => return Err(err),
        }
        Ok(summaries)
    }

    /// Fetches one email with its body extracted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the server does not know the
    /// id.
    pub async fn read_email(&self, id: &Id, options: ReadOptions) -> Result<EmailDetail> {
        let mut req = Request::new();
        let get_id = req.invoke(&email::Get {
            account_id: self.account_id().clone(),
            ids: Some(vec![id.clone()]),
            properties: Some(DETAIL_PROPERTIES.iter().map(ToString::to_string).collect()),
            fetch_text_body_values: true,
            fetch_html_body_values: true,
            ..email::Get::default()
        })?;
        let response = self.send(&req).await?;
        let get = expect_email_get(response, &get_id)?;
        get.list
            .first()
            .map(|email| detail(email, options))
            .ok_or_else(|| Error::NotFound(format!("no email with id {id}")))
    }

    /// Fetches every email in the thread the given email belongs to,
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the email or its thread is
    /// unknown.
    pub async fn read_thread(&self, id: &Id, options: ReadOptions) -> Result<Vec<EmailDetail>> {
        let mut req = Request::new();
        let get_id = req.invoke(&email::Get {
            account_id: self.account_id().clone(),
            ids: Some(vec![id.clone()]),
            properties: Some(vec!["id".to_string(), "threadId".to_string()]),
            ..email::Get::default()
        })?;
        let response = self.send(&req).await?;
        let get = expect_email_get(response, &get_id)?;
        let thread_id = get
            .list
            .first()
            .and_then(|email| email.thread_id.clone())
            .ok_or_else(|| Error::NotFound(format!("no email with id {id}")))?;

        let mut req = Request::new();
        let thread_call = req.invoke(&thread::Get {
            account_id: self.account_id().clone(),
            ids: vec![thread_id],
        })?;
        let emails_call = req.invoke(&email::Get {
            account_id: self.account_id().clone(),
            ids_ref: Some(ResultReference {
                result_of: thread_call.clone(),
                name: "Thread/get".to_string(),
                path: "/list/*/emailIds".to_string(),
            }),
            properties: Some(DETAIL_PROPERTIES.iter().map(ToString::to_string).collect()),
            fetch_text_body_values: true,
            fetch_html_body_values: true,
            ..email::Get::default()
        })?;

        let response = self.send(&req).await?;
        let (thread_response, emails_response) = split_response(response, &thread_call, &emails_call);
        expect_thread_get(thread_response, &thread_call)?;
        let emails = expect_email_get(emails_response, &emails_call)?;
        Ok(emails
            .list
            .iter()
            .map(|email| detail(email, options))
            .collect())
    }

    /// Fetches summaries for explicit ids, e.g. to preview a mutation.
    /// Ids the server does not know come back separately so previews
    /// can show them.
    ///
    /// # Errors
    ///
    /// Fails when the exchange fails.
    pub async fn email_summaries(&self, ids: &[Id]) -> Result<(Vec<EmailSummary>, Vec<Id>)> {
        if ids.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }
        let mut req = Request::new();
        let get_id = req.invoke(&email::Get {
            account_id: self.account_id().clone(),
            ids: Some(ids.to_vec()),
            properties: Some(SUMMARY_PROPERTIES.iter().map(ToString::to_string).collect()),
            ..email::Get::default()
        })?;
        let response = self.send(&req).await?;
        let get = expect_email_get(response, &get_id)?;
        Ok((get.list.iter().map(summarize).collect(), get.not_found))
    }

    /// Resolves a listing to bare ids, for commands that mutate query
    /// results.
    ///
    /// # Errors
    ///
    /// Fails on an unresolvable mailbox reference or a failed
    /// exchange.
    pub async fn query_ids(&self, options: &ListOptions) -> Result<Vec<Id>> {
        let mailbox_id = match &options.mailbox {
            Some(reference) => Some(self.resolve_mailbox(reference).await?.id),
            None => None,
        };
        let filter = build_filter(
            mailbox_id,
            options.unread_only,
            options.flagged_only,
            options.unflagged_only,
        );

        let mut req = Request::new();
        let query_id = req.invoke(&email::Query {
            account_id: self.account_id().clone(),
            filter,
            sort: vec![Comparator {
                property: options.sort.property().to_string(),
                is_ascending: options.order == SortOrder::Ascending,
            }],
            position: 0,
            limit: Some(options.limit),
            calculate_total: false,
        })?;
        let response = self.send(&req).await?;
        Ok(expect_email_query(response, &query_id)?.ids)
    }
}
