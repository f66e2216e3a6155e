//! Human-readable text rendering.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use mailsweep_core::{EmailDetail, EmailSummary};

use super::Report;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(String::new, |t| t.format(TIME_FORMAT).to_string())
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

fn email_lines(emails: &[EmailSummary]) -> String {
    let mut out = String::new();
    let id_width = emails
        .iter()
        .map(|email| email.id.chars().count())
        .max()
        .unwrap_or(0);
    for email in emails {
        let marker = match (email.is_unread, email.is_flagged) {
            (true, true) => "*!",
            (true, false) => "* ",
            (false, true) => " !",
            (false, false) => "  ",
        };
        let _ = writeln!(
            out,
            "{:id_width$}  {marker}  {:16}  {:30}  {}",
            email.id,
            format_time(email.received_at),
            clip(&email.from, 30),
            clip(&email.subject, 60),
        );
        if let Some(snippet) = &email.snippet {
            let _ = writeln!(out, "{:id_width$}      {}", "", clip(snippet, 100));
        }
    }
    out
}

fn email_detail(email: &EmailDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Id:      {}", email.id);
    let _ = writeln!(out, "From:    {}", email.from.join(", "));
    if !email.to.is_empty() {
        let _ = writeln!(out, "To:      {}", email.to.join(", "));
    }
    if !email.cc.is_empty() {
        let _ = writeln!(out, "Cc:      {}", email.cc.join(", "));
    }
    if let Some(received) = email.received_at {
        let _ = writeln!(out, "Date:    {}", received.format(TIME_FORMAT));
    }
    let _ = writeln!(out, "Subject: {}", email.subject);
    if !email.keywords.is_empty() {
        let _ = writeln!(out, "Keywords: {}", email.keywords.join(" "));
    }
    if let Some(unsubscribe) = &email.list_unsubscribe {
        let _ = writeln!(out, "Unsubscribe: {unsubscribe}");
    }
    if !email.headers.is_empty() {
        let _ = writeln!(out);
        for header in &email.headers {
            let _ = writeln!(out, "{}: {}", header.name, header.value);
        }
    }
    let _ = writeln!(out);
    out.push_str(&email.body);
    if !email.body.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Renders a report as aligned, human-readable text.
#[must_use]
pub fn render(report: &Report) -> String {
    match report {
        Report::Emails(emails) => {
            if emails.is_empty() {
                "no emails\n".to_string()
            } else {
                email_lines(emails)
            }
        }
        Report::DryRun {
            action,
            emails,
            missing,
        } => {
            let mut out = format!("would {action} {} email(s):\n", emails.len());
            out.push_str(&email_lines(emails));
            for id in missing {
                let _ = writeln!(out, "  {id}: not found");
            }
            out
        }
        Report::Outcome { action, outcome } => {
            let mut out = format!(
                "{action}: {} updated, {} failed\n",
                outcome.updated.len(),
                outcome.failed.len()
            );
            for failure in &outcome.failed {
                let _ = writeln!(out, "  {}: {}", failure.id, failure.reason);
            }
            out
        }
        Report::Email(email) => email_detail(email),
        Report::Thread(emails) => {
            let mut out = String::new();
            for (n, email) in emails.iter().enumerate() {
                if n > 0 {
                    out.push_str("\n========================================\n\n");
                }
                out.push_str(&email_detail(email));
            }
            out
        }
        Report::Mailboxes(mailboxes) => {
            let name_width = mailboxes
                .iter()
                .map(|m| m.name.chars().count())
                .max()
                .unwrap_or(0);
            let mut out = String::new();
            for mailbox in mailboxes {
                let _ = writeln!(
                    out,
                    "{:name_width$}  {:>6} total  {:>6} unread  {}{}",
                    mailbox.name,
                    mailbox.total_emails,
                    mailbox.unread_emails,
                    mailbox.id,
                    mailbox
                        .role
                        .as_deref()
                        .map_or_else(String::new, |role| format!("  ({role})")),
                );
            }
            out
        }
        Report::Session(session) => {
            let mut out = String::new();
            let _ = writeln!(out, "username:   {}", session.username);
            let _ = writeln!(out, "api url:    {}", session.api_url);
            let _ = writeln!(out, "account id: {}", session.account_id);
            if let Some(max) = session.max_objects_in_set {
                let _ = writeln!(out, "batch size: {max}");
            }
            let _ = writeln!(out, "capabilities:");
            for uri in &session.capabilities {
                let _ = writeln!(out, "  {uri}");
            }
            out
        }
        Report::Senders(senders) => {
            let count_width = senders
                .iter()
                .map(|s| s.count.to_string().len())
                .max()
                .unwrap_or(0);
            let mut out = String::new();
            for sender in senders {
                let _ = writeln!(out, "{:>count_width$}  {}", sender.count, sender.sender);
                for subject in &sender.subjects {
                    let _ = writeln!(out, "{:>count_width$}    {}", "", clip(subject, 80));
                }
            }
            out
        }
        Report::Summary(summary) => {
            let mut out = format!(
                "{}: {} emails, {} unread\n",
                summary.mailbox, summary.total, summary.unread
            );
            if !summary.senders.is_empty() {
                let count_width = summary
                    .senders
                    .iter()
                    .map(|s| s.count.to_string().len())
                    .max()
                    .unwrap_or(0);
                let _ = writeln!(out, "\ntop senders:");
                for sender in &summary.senders {
                    let marker = match sender.newsletter {
                        Some(true) => "  [newsletter]",
                        _ => "",
                    };
                    let _ = writeln!(
                        out,
                        "{:>count_width$}  {}  ({} unread){marker}",
                        sender.count, sender.sender, sender.unread,
                    );
                    for subject in &sender.subjects {
                        let _ = writeln!(out, "{:>count_width$}    {}", "", clip(subject, 80));
                    }
                }
            }
            if !summary.domains.is_empty() {
                let count_width = summary
                    .domains
                    .iter()
                    .map(|d| d.count.to_string().len())
                    .max()
                    .unwrap_or(0);
                let _ = writeln!(out, "\ntop domains:");
                for domain in &summary.domains {
                    let _ = writeln!(
                        out,
                        "{:>count_width$}  {}  ({} unread)",
                        domain.count, domain.domain, domain.unread,
                    );
                }
            }
            out
        }
        Report::Scripts(scripts) => {
            if scripts.is_empty() {
                return "no scripts\n".to_string();
            }
            let mut out = String::new();
            for script in scripts {
                let marker = if script.is_active { "*" } else { " " };
                let _ = writeln!(out, "{marker} {}  {}", script.name, script.id);
            }
            out
        }
        Report::Draft(draft) => {
            let mut out = format!("draft created: {}\n", draft.id);
            if !draft.to.is_empty() {
                let _ = writeln!(out, "To:      {}", draft.to.join(", "));
            }
            if !draft.cc.is_empty() {
                let _ = writeln!(out, "Cc:      {}", draft.cc.join(", "));
            }
            if !draft.bcc.is_empty() {
                let _ = writeln!(out, "Bcc:     {}", draft.bcc.join(", "));
            }
            let _ = writeln!(out, "Subject: {}", draft.subject);
            out
        }
        Report::Raw(output) => {
            if output.ends_with('\n') || output.is_empty() {
                output.clone()
            } else {
                format!("{output}\n")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailsweep_core::{BatchOutcome, Failure, MailboxInfo};
    use mailsweep_jmap::Id;

    fn summary(id: &str, subject: &str) -> EmailSummary {
        EmailSummary {
            id: id.to_string(),
            thread_id: None,
            subject: subject.to_string(),
            from: "Ada <ada@example.com>".to_string(),
            received_at: None,
            preview: String::new(),
            is_unread: true,
            is_flagged: false,
            snippet: None,
        }
    }

    #[test]
    fn empty_listing_says_so() {
        assert_eq!(render(&Report::Emails(Vec::new())), "no emails\n");
    }

    #[test]
    fn listing_marks_unread() {
        let rendered = render(&Report::Emails(vec![summary("m1", "hello")]));
        assert!(rendered.contains("m1"));
        assert!(rendered.contains("* "));
        assert!(rendered.contains("hello"));
    }

    #[test]
    fn snippet_gets_its_own_line() {
        let mut email = summary("m1", "hello");
        email.snippet = Some("…matched text…".to_string());
        let rendered = render(&Report::Emails(vec![email]));
        assert_eq!(rendered.lines().count(), 2);
        assert!(rendered.contains("…matched text…"));
    }

    #[test]
    fn outcome_lists_failures() {
        let rendered = render(&Report::Outcome {
            action: "archive".to_string(),
            outcome: BatchOutcome {
                updated: vec![Id::new("m1")],
                failed: vec![Failure {
                    id: Id::new("m2"),
                    reason: "notFound".to_string(),
                }],
            },
        });
        assert!(rendered.starts_with("archive: 1 updated, 1 failed\n"));
        assert!(rendered.contains("m2: notFound"));
    }

    #[test]
    fn dry_run_counts_emails_and_lists_missing_ids() {
        let rendered = render(&Report::DryRun {
            action: "archive".to_string(),
            emails: vec![summary("m1", "hello")],
            missing: vec!["m9".to_string()],
        });
        assert!(rendered.starts_with("would archive 1 email(s):\n"));
        assert!(rendered.contains("m9: not found"));
    }

    #[test]
    fn mailboxes_show_role() {
        let rendered = render(&Report::Mailboxes(vec![MailboxInfo {
            id: "mb1".to_string(),
            name: "Inbox".to_string(),
            role: Some("inbox".to_string()),
            total_emails: 12,
            unread_emails: 3,
        }]));
        assert!(rendered.contains("Inbox"));
        assert!(rendered.contains("(inbox)"));
    }

    #[test]
    fn raw_output_gains_trailing_newline() {
        assert_eq!(render(&Report::Raw("keep;".to_string())), "keep;\n");
    }

    #[test]
    fn senders_list_subjects_beneath_counts() {
        let rendered = render(&Report::Senders(vec![mailsweep_core::SenderCount {
            sender: "news@example.com".to_string(),
            count: 12,
            subjects: vec!["daily digest".to_string()],
        }]));
        assert!(rendered.contains("12  news@example.com"));
        assert!(rendered.contains("daily digest"));
    }

    #[test]
    fn summary_shows_senders_domains_and_newsletters() {
        let rendered = render(&Report::Summary(mailsweep_core::TriageSummary {
            mailbox: "inbox".to_string(),
            total: 3,
            unread: 2,
            senders: vec![mailsweep_core::SenderBreakdown {
                sender: "news@letters.example".to_string(),
                count: 2,
                unread: 1,
                newsletter: Some(true),
                subjects: Vec::new(),
            }],
            domains: vec![mailsweep_core::DomainBreakdown {
                domain: "letters.example".to_string(),
                count: 2,
                unread: 1,
            }],
        }));
        assert!(rendered.starts_with("inbox: 3 emails, 2 unread\n"));
        assert!(rendered.contains("top senders:"));
        assert!(rendered.contains("[newsletter]"));
        assert!(rendered.contains("top domains:"));
        assert!(rendered.contains("letters.example"));
    }

    #[test]
    fn detail_shows_unsubscribe_and_raw_headers() {
        let rendered = render(&Report::Email(mailsweep_core::EmailDetail {
            id: "m1".to_string(),
            subject: "weekly".to_string(),
            from: vec!["news@example.com".to_string()],
            to: Vec::new(),
            cc: Vec::new(),
            received_at: None,
            body: "hello".to_string(),
            keywords: Vec::new(),
            list_unsubscribe: Some("<mailto:leave@example.com>".to_string()),
            headers: vec![mailsweep_core::Header {
                name: "Received".to_string(),
                value: "from mx.example.com".to_string(),
            }],
        }));
        assert!(rendered.contains("Unsubscribe: <mailto:leave@example.com>"));
        assert!(rendered.contains("Received: from mx.example.com"));
    }

    #[test]
    fn clip_keeps_short_text() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("exactly-ten", 11), "exactly-ten");
    }

    #[test]
    fn clip_marks_truncation() {
        assert_eq!(clip("abcdefghij", 5), "abcd…");
    }
}
