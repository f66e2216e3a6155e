//! JSON rendering.

use serde_json::json;

use super::Report;

/// Renders a report as pretty-printed JSON.
///
/// # Errors
///
/// Fails when serialization fails.
pub fn render(report: &Report) -> anyhow::Result<String> {
    let value = match report {
        Report::Emails(emails) => json!({ "emails": emails }),
        Report::DryRun {
            action,
            emails,
            missing,
        } => json!({
            "dry_run": true,
            "action": action,
            "emails": emails,
            "missing": missing,
        }),
        Report::Outcome { action, outcome } => json!({
            "action": action,
            "updated": outcome.updated,
            "failed": outcome.failed,
            "complete": outcome.is_complete(),
        }),
        Report::Email(email) => serde_json::to_value(email)?,
        Report::Thread(emails) => json!({ "thread": emails }),
        Report::Mailboxes(mailboxes) => json!({ "mailboxes": mailboxes }),
        Report::Session(session) => serde_json::to_value(session)?,
        Report::Senders(senders) => json!({ "senders": senders }),
        Report::Summary(summary) => serde_json::to_value(summary)?,
        Report::Scripts(scripts) => json!({ "scripts": scripts }),
        Report::Draft(draft) => json!({ "draft": draft }),
        Report::Raw(output) => json!({ "output": output }),
    };
    Ok(serde_json::to_string_pretty(&value)?)
}
