//! Draft composition: new messages, replies, and forwards.
//!
//! Drafts are created with `Email/set`, never sent. Every composed
//! draft passes the draft-shape safety check before it leaves the
//! process.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use mailsweep_jmap::methods::email::{self, Address, Email};
use mailsweep_jmap::{Id, Request};

use crate::client::{expect_email_get, expect_email_set, Client, Exchange};
use crate::email::extract_body;
use crate::error::{Error, Result};
use crate::mailbox::Role;
use crate::safety;
use crate::types::{format_address, DraftSummary};

const FORWARD_SEPARATOR: &str = "\n\n---------- Forwarded message ----------\n";

const SOURCE_PROPERTIES: &[&str] = &[
    "id",
    "subject",
    "from",
    "to",
    "cc",
    "replyTo",
    "messageId",
    "references",
    "bodyValues",
    "textBody",
    "htmlBody",
];

/// How a draft relates to an existing email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftMode {
    /// A fresh message.
    New,
    /// Reply to the sender only.
    Reply,
    /// Reply to the sender and all other recipients.
    ReplyAll,
    /// Forward to new recipients.
    Forward,
}

/// Inputs for [`Client::create_draft`].
#[derive(Debug, Clone)]
pub struct DraftOptions {
    /// Composition mode.
    pub mode: DraftMode,
    /// The email being answered or forwarded; required for every mode
    /// but [`DraftMode::New`].
    pub source: Option<Id>,
    /// Extra To recipients.
    pub to: Vec<String>,
    /// Extra CC recipients.
    pub cc: Vec<String>,
    /// BCC recipients; never derived from the source email.
    pub bcc: Vec<String>,
    /// Explicit subject; overrides the derived one.
    pub subject: Option<String>,
    /// Body text.
    pub body: String,
    /// Store the body as `text/html` instead of `text/plain`.
    pub html: bool,
}

/// Prefixes a subject with `Re: ` unless it already carries one.
#[must_use]
pub fn reply_subject(subject: &str) -> String {
    let trimmed = subject.trim();
    if trimmed.to_ascii_lowercase().starts_with("re:") {
        return trimmed.to_string();
    }
    format!("Re: {trimmed}")
}

/// Prefixes a subject with `Fwd: ` unless it already carries a
/// forward marker.
#[must_use]
pub fn forward_subject(subject: &str) -> String {
    let trimmed = subject.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("fwd:") || lower.starts_with("fw:") {
        return trimmed.to_string();
    }
    format!("Fwd: {trimmed}")
}

/// True for strings plausible enough to use as a From address: one
/// `@` with something on both sides and no whitespace.
fn plausible_address(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !value.contains(char::is_whitespace)
        }
        _ => false,
    }
}

fn push_dedup(list: &mut Vec<Address>, seen: &mut BTreeSet<String>, address: Address) {
    let key = address.email.to_ascii_lowercase();
    if !key.is_empty() && seen.insert(key) {
        list.push(address);
    }
}

fn dedup_strings(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .into_iter()
        .filter(|value| !value.is_empty() && seen.insert(value.clone()))
        .collect()
}

struct Composition {
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    subject: String,
    body: String,
    in_reply_to: Vec<String>,
    references: Vec<String>,
}

fn compose(options: &DraftOptions, source: Option<&Email>, own_address: &str) -> Composition {
    let own_key = own_address.to_ascii_lowercase();
    let caller_to = options.to.iter().map(|a| Address::new(a.clone()));
    let caller_cc = options.cc.iter().map(|a| Address::new(a.clone()));

    let mut to = Vec::new();
    let mut to_seen = BTreeSet::new();
    let mut cc = Vec::new();
    let mut cc_seen = BTreeSet::new();
    // BCC comes only from caller input in every mode.
    let mut bcc = Vec::new();
    let mut bcc_seen = BTreeSet::new();
    for address in options.bcc.iter().map(|a| Address::new(a.clone())) {
        push_dedup(&mut bcc, &mut bcc_seen, address);
    }
    let mut subject = String::new();
    let mut body = options.body.clone();
    let mut in_reply_to = Vec::new();
    let mut references = Vec::new();

    match (options.mode, source) {
        (DraftMode::New, _) | (_, None) => {
            for address in caller_to {
                push_dedup(&mut to, &mut to_seen, address);
            }
            for address in caller_cc {
                push_dedup(&mut cc, &mut cc_seen, address);
            }
        }
        (DraftMode::Reply | DraftMode::ReplyAll, Some(orig)) => {
            // Reply-To wins over From when present.
            let base = if orig.reply_to.is_empty() {
                &orig.from
            } else {
                &orig.reply_to
            };
            for address in base.iter().cloned().chain(caller_to) {
                push_dedup(&mut to, &mut to_seen, address);
            }

            if options.mode == DraftMode::ReplyAll {
                // Everyone else on the original thread, minus
                // ourselves and anyone already addressed directly.
                for address in orig.to.iter().chain(orig.cc.iter()).cloned() {
                    let key = address.email.to_ascii_lowercase();
                    if key == own_key || to_seen.contains(&key) {
                        continue;
                    }
                    push_dedup(&mut cc, &mut cc_seen, address);
                }
            }
            for address in caller_cc {
                push_dedup(&mut cc, &mut cc_seen, address);
            }

            subject = reply_subject(orig.subject.as_deref().unwrap_or_default());
            if !orig.message_id.is_empty() {
                in_reply_to.clone_from(&orig.message_id);
                references = dedup_strings(
                    orig.references
                        .iter()
                        .chain(orig.message_id.iter())
                        .cloned(),
                );
            }
        }
        (DraftMode::Forward, Some(orig)) => {
            for address in caller_to {
                push_dedup(&mut to, &mut to_seen, address);
            }
            for address in caller_cc {
                push_dedup(&mut cc, &mut cc_seen, address);
            }
            subject = forward_subject(orig.subject.as_deref().unwrap_or_default());
            body.push_str(FORWARD_SEPARATOR);
            body.push_str(&extract_body(orig, false));
        }
    }

    if let Some(explicit) = options.subject.as_deref() {
        subject = explicit.to_string();
    }

    Composition {
        to,
        cc,
        bcc,
        subject,
        body,
        in_reply_to,
        references,
    }
}

impl<X: Exchange> Client<X> {
    /// Composes and stores a draft, returning what was stored.
    ///
    /// # Errors
    ///
    /// Fails when a reply or forward names no source email, the
    /// drafts mailbox or the source email is missing, the composed
    /// set is malformed, or the server rejects the create.
    pub async fn create_draft(&self, options: &DraftOptions) -> Result<DraftSummary> {
        if options.mode != DraftMode::New && options.source.is_none() {
            return Err(Error::DraftRejected(
                "replies and forwards need a source email id".to_string(),
            ));
        }

        let drafts = self.mailbox_by_role(Role::Drafts).await?;

        let source = match &options.source {
            Some(id) if options.mode != DraftMode::New => Some(self.fetch_source(id).await?),
            _ => None,
        };

        let composition = compose(options, source.as_ref(), &self.session().username);
        let mut summary = DraftSummary {
            id: String::new(),
            to: composition.to.iter().map(format_address).collect(),
            cc: composition.cc.iter().map(format_address).collect(),
            bcc: composition.bcc.iter().map(format_address).collect(),
            subject: composition.subject.clone(),
            in_reply_to: composition.in_reply_to.first().cloned(),
        };

        let mut mailbox_ids = BTreeMap::new();
        mailbox_ids.insert(drafts.id.clone(), true);
        let mut keywords = BTreeMap::new();
        keywords.insert("$draft".to_string(), true);
        keywords.insert("$seen".to_string(), true);

        let username = self.session().username.clone();
        let from = if plausible_address(&username) {
            vec![Address::new(username)]
        } else {
            Vec::new()
        };

        let mut body_values = BTreeMap::new();
        body_values.insert(
            "body".to_string(),
            email::BodyValue {
                value: composition.body,
                is_truncated: false,
            },
        );
        let body_part = email::BodyPart {
            part_id: Some("body".to_string()),
            content_type: Some(
                if options.html {
                    "text/html"
                } else {
                    "text/plain"
                }
                .to_string(),
            ),
            ..email::BodyPart::default()
        };
        let mut draft = Email {
            mailbox_ids,
            keywords,
            from,
            to: composition.to,
            cc: composition.cc,
            bcc: composition.bcc,
            subject: Some(composition.subject),
            in_reply_to: composition.in_reply_to,
            references: composition.references,
            body_values,
            ..Email::default()
        };
        if options.html {
            draft.html_body = vec![body_part];
        } else {
            draft.text_body = vec![body_part];
        }

        let mut create = BTreeMap::new();
        let creation_id = Id::new("draft");
        create.insert(creation_id.clone(), draft);
        let set = email::Set {
            account_id: self.account_id().clone(),
            create,
            ..email::Set::default()
        };
        safety::check_draft_set(&set, &drafts.id)?;

        debug!(mode = ?options.mode, "creating draft");
        let mut req = Request::new();
        let call_id = req.invoke(&set)?;
        let response = self.send(&req).await?;
        let mut result = expect_email_set(response, &call_id)?;

        if let Some(created) = result.created.remove(&creation_id) {
            let id = created
                .id
                .ok_or_else(|| Error::DraftRejected("server returned no draft id".to_string()))?;
            summary.id = id.to_string();
            return Ok(summary);
        }
        let reason = result
            .not_created
            .get(&creation_id)
            .map_or_else(|| "server did not acknowledge the create".to_string(), |e| e.reason());
        Err(Error::DraftRejected(reason))
    }

    async fn fetch_source(&self, id: &Id) -> Result<Email> {
        let mut req = Request::new();
        let call_id = req.invoke(&email::Get {
            account_id: self.account_id().clone(),
            ids: Some(vec![id.clone()]),
            properties: Some(SOURCE_PROPERTIES.iter().map(ToString::to_string).collect()),
            fetch_text_body_values: true,
            fetch_html_body_values: true,
            ..email::Get::default()
        })?;
        let response = self.send(&req).await?;
        let get = expect_email_get(response, &call_id)?;
        get.list
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("no email with id {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{session_with_batch_limit, MockExchange};
    use serde_json::json;

    fn options(mode: DraftMode) -> DraftOptions {
        DraftOptions {
            mode,
            source: Some(Id::new("m1")),
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: None,
            body: String::new(),
            html: false,
        }
    }

    mod subject_tests {
        use super::*;

        #[test]
        fn reply_prefix_is_idempotent() {
            assert_eq!(reply_subject("hello"), "Re: hello");
            assert_eq!(reply_subject("Re: hello"), "Re: hello");
            assert_eq!(reply_subject("RE: hello"), "RE: hello");
            assert_eq!(reply_subject("  re: hello  "), "re: hello");
        }

        #[test]
        fn forward_prefix_is_idempotent() {
            assert_eq!(forward_subject("hello"), "Fwd: hello");
            assert_eq!(forward_subject("Fwd: hello"), "Fwd: hello");
            assert_eq!(forward_subject("FW: hello"), "FW: hello");
        }
    }

    mod address_tests {
        use super::*;

        #[test]
        fn plausible_addresses() {
            assert!(plausible_address("user@example.com"));
            assert!(!plausible_address("user"));
            assert!(!plausible_address("@example.com"));
            assert!(!plausible_address("user@"));
            assert!(!plausible_address("us er@example.com"));
            assert!(!plausible_address("a@b@c"));
        }

        #[test]
        fn dedup_is_case_insensitive() {
            let mut list = Vec::new();
            let mut seen = BTreeSet::new();
            push_dedup(&mut list, &mut seen, Address::new("Ada@Example.com"));
            push_dedup(&mut list, &mut seen, Address::new("ada@example.com"));
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].email, "Ada@Example.com");
        }
    }

    mod compose_tests {
        use super::*;

        fn original() -> Email {
            serde_json::from_value(json!({
                "id": "m1",
                "subject": "budget",
                "from": [{"email": "sender@example.com"}],
                "to": [
                    {"email": "user@example.com"},
                    {"email": "peer@example.com"}
                ],
                "cc": [{"email": "watcher@example.com"}],
                "messageId": ["<orig@example.com>"],
                "references": ["<root@example.com>"]
            }))
            .unwrap()
        }

        #[test]
        fn reply_targets_sender_only() {
            let comp = compose(
                &options(DraftMode::Reply),
                Some(&original()),
                "user@example.com",
            );
            assert_eq!(comp.to.len(), 1);
            assert_eq!(comp.to[0].email, "sender@example.com");
            assert!(comp.cc.is_empty());
            assert_eq!(comp.subject, "Re: budget");
        }

        #[test]
        fn reply_prefers_reply_to_header() {
            let mut orig = original();
            orig.reply_to = vec![Address::new("list@example.com")];
            let comp = compose(&options(DraftMode::Reply), Some(&orig), "user@example.com");
            assert_eq!(comp.to[0].email, "list@example.com");
            assert_eq!(comp.to.len(), 1);
        }

        #[test]
        fn reply_all_ccs_everyone_but_self_and_direct_recipients() {
            let comp = compose(
                &options(DraftMode::ReplyAll),
                Some(&original()),
                "user@example.com",
            );
            assert_eq!(comp.to[0].email, "sender@example.com");
            let cc: Vec<&str> = comp.cc.iter().map(|a| a.email.as_str()).collect();
            assert_eq!(cc, vec!["peer@example.com", "watcher@example.com"]);
        }

        #[test]
        fn reply_all_excludes_self_case_insensitively() {
            let comp = compose(
                &options(DraftMode::ReplyAll),
                Some(&original()),
                "User@Example.COM",
            );
            assert!(comp.cc.iter().all(|a| a.email != "user@example.com"));
        }

        #[test]
        fn caller_recipients_are_appended_and_deduped() {
            let mut opts = options(DraftMode::Reply);
            opts.to = vec!["SENDER@example.com".to_string(), "extra@example.com".to_string()];
            let comp = compose(&opts, Some(&original()), "user@example.com");
            let to: Vec<&str> = comp.to.iter().map(|a| a.email.as_str()).collect();
            assert_eq!(to, vec!["sender@example.com", "extra@example.com"]);
        }

        #[test]
        fn threading_headers_reference_the_original() {
            let comp = compose(
                &options(DraftMode::Reply),
                Some(&original()),
                "user@example.com",
            );
            assert_eq!(comp.in_reply_to, vec!["<orig@example.com>"]);
            assert_eq!(
                comp.references,
                vec!["<root@example.com>", "<orig@example.com>"]
            );
        }

        #[test]
        fn no_message_id_means_no_threading() {
            let mut orig = original();
            orig.message_id.clear();
            let comp = compose(&options(DraftMode::Reply), Some(&orig), "user@example.com");
            assert!(comp.in_reply_to.is_empty());
            assert!(comp.references.is_empty());
        }

        #[test]
        fn references_are_deduped() {
            let mut orig = original();
            orig.references = vec![
                "<root@example.com>".to_string(),
                "<orig@example.com>".to_string(),
            ];
            let comp = compose(&options(DraftMode::Reply), Some(&orig), "user@example.com");
            assert_eq!(
                comp.references,
                vec!["<root@example.com>", "<orig@example.com>"]
            );
        }

        #[test]
        fn forward_appends_original_body() {
            let mut orig = original();
            orig.body_values.insert(
                "p1".to_string(),
                email::BodyValue {
                    value: "original text".to_string(),
                    is_truncated: false,
                },
            );
            orig.text_body = vec![email::BodyPart {
                part_id: Some("p1".to_string()),
                ..email::BodyPart::default()
            }];
            let mut opts = options(DraftMode::Forward);
            opts.to = vec!["other@example.com".to_string()];
            opts.body = "see below".to_string();
            let comp = compose(&opts, Some(&orig), "user@example.com");
            assert_eq!(comp.subject, "Fwd: budget");
            assert_eq!(
                comp.body,
                format!("see below{FORWARD_SEPARATOR}original text")
            );
            assert!(comp.in_reply_to.is_empty());
        }

        #[test]
        fn bcc_comes_only_from_caller_input() {
            let mut opts = options(DraftMode::ReplyAll);
            opts.bcc = vec![
                "audit@example.com".to_string(),
                "AUDIT@example.com".to_string(),
            ];
            let comp = compose(&opts, Some(&original()), "user@example.com");
            let bcc: Vec<&str> = comp.bcc.iter().map(|a| a.email.as_str()).collect();
            assert_eq!(bcc, vec!["audit@example.com"]);
            assert!(comp.to.iter().all(|a| a.email != "audit@example.com"));
        }

        #[test]
        fn explicit_subject_wins() {
            let mut opts = options(DraftMode::Reply);
            opts.subject = Some("override".to_string());
            let comp = compose(&opts, Some(&original()), "user@example.com");
            assert_eq!(comp.subject, "override");
        }
    }

    mod create_tests {
        use super::*;
        use crate::client::Client;

        fn drafts_mailbox_response() -> serde_json::Value {
            json!({
                "methodResponses": [["Mailbox/get", {
                    "accountId": "a1",
                    "list": [
                        {"id": "dr1", "name": "Drafts", "role": "drafts"}
                    ]
                }, "c0"]]
            })
        }

        #[tokio::test]
        async fn new_draft_lands_in_drafts_with_keywords() {
            let mock = MockExchange::new(session_with_batch_limit(Some(50)));
            mock.respond(drafts_mailbox_response());
            mock.respond(json!({
                "methodResponses": [["Email/set", {
                    "accountId": "a1",
                    "created": {"draft": {"id": "d9"}}
                }, "c0"]]
            }));
            let client = Client::new(mock).unwrap();

            let summary = client
                .create_draft(&DraftOptions {
                    mode: DraftMode::New,
                    source: None,
                    to: vec!["other@example.com".to_string()],
                    cc: Vec::new(),
                    bcc: vec!["archive@example.com".to_string()],
                    subject: Some("hi".to_string()),
                    body: "hello".to_string(),
                    html: false,
                })
                .await
                .unwrap();
            assert_eq!(summary.id, "d9");
            assert_eq!(summary.to, vec!["other@example.com"]);
            assert_eq!(summary.bcc, vec!["archive@example.com"]);
            assert_eq!(summary.subject, "hi");
            assert_eq!(summary.in_reply_to, None);

            let sent = client.exchange_ref().sent();
            let create = &sent[1]["methodCalls"][0][1]["create"]["draft"];
            assert_eq!(create["mailboxIds"], json!({"dr1": true}));
            assert_eq!(create["keywords"]["$draft"], true);
            assert_eq!(create["keywords"]["$seen"], true);
            assert_eq!(create["from"][0]["email"], "user@example.com");
            assert_eq!(create["bcc"][0]["email"], "archive@example.com");
            assert_eq!(create["textBody"][0]["type"], "text/plain");
            assert!(create.get("htmlBody").is_none());
            assert!(sent[1]["methodCalls"][0][1].get("update").is_none());
        }

        #[tokio::test]
        async fn html_draft_stores_an_html_body_part() {
            let mock = MockExchange::new(session_with_batch_limit(Some(50)));
            mock.respond(drafts_mailbox_response());
            mock.respond(json!({
                "methodResponses": [["Email/set", {
                    "accountId": "a1",
                    "created": {"draft": {"id": "d10"}}
                }, "c0"]]
            }));
            let client = Client::new(mock).unwrap();

            client
                .create_draft(&DraftOptions {
                    mode: DraftMode::New,
                    source: None,
                    to: vec!["other@example.com".to_string()],
                    cc: Vec::new(),
                    bcc: Vec::new(),
                    subject: Some("hi".to_string()),
                    body: "<p>hello</p>".to_string(),
                    html: true,
                })
                .await
                .unwrap();

            let sent = client.exchange_ref().sent();
            let create = &sent[1]["methodCalls"][0][1]["create"]["draft"];
            assert_eq!(create["htmlBody"][0]["type"], "text/html");
            assert_eq!(create["htmlBody"][0]["partId"], "body");
            assert!(create.get("textBody").is_none());
            assert_eq!(create["bodyValues"]["body"]["value"], "<p>hello</p>");
        }

        #[tokio::test]
        async fn reply_without_a_source_id_is_rejected_locally() {
            let mock = MockExchange::new(session_with_batch_limit(Some(50)));
            let client = Client::new(mock).unwrap();

            let mut opts = options(DraftMode::Reply);
            opts.source = None;
            let err = client.create_draft(&opts).await.unwrap_err();
            match err {
                Error::DraftRejected(reason) => {
                    assert!(reason.contains("source email"), "got {reason:?}");
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert!(client.exchange_ref().sent().is_empty());
        }

        #[tokio::test]
        async fn rejected_create_surfaces_the_reason() {
            let mock = MockExchange::new(session_with_batch_limit(Some(50)));
            mock.respond(drafts_mailbox_response());
            mock.respond(json!({
                "methodResponses": [["Email/set", {
                    "accountId": "a1",
                    "notCreated": {"draft": {"type": "overQuota", "description": "mailbox full"}}
                }, "c0"]]
            }));
            let client = Client::new(mock).unwrap();

            let err = client
                .create_draft(&DraftOptions {
                    mode: DraftMode::New,
                    source: None,
                    to: Vec::new(),
                    cc: Vec::new(),
                    bcc: Vec::new(),
                    subject: None,
                    body: String::new(),
                    html: false,
                })
                .await
                .unwrap_err();
            match err {
                Error::DraftRejected(reason) => assert_eq!(reason, "mailbox full"),
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn missing_drafts_mailbox_fails_before_any_set() {
            let mock = MockExchange::new(session_with_batch_limit(Some(50)));
            mock.respond(json!({
                "methodResponses": [["Mailbox/get", {
                    "accountId": "a1",
                    "list": [{"id": "in1", "name": "Inbox", "role": "inbox"}]
                }, "c0"]]
            }));
            let client = Client::new(mock).unwrap();

            let err = client
                .create_draft(&options(DraftMode::Reply))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::NotFound(_)));
            assert_eq!(client.exchange_ref().sent().len(), 1);
        }
    }
}
