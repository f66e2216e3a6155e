//! Rendering of command results as text or JSON.

pub mod json;
pub mod text;

use mailsweep_core::{
    BatchOutcome, DraftSummary, EmailDetail, EmailSummary, MailboxInfo, ScriptInfo, SenderCount,
    SessionInfo, TriageSummary,
};

use crate::cli::Format;

/// Everything a command can produce.
#[derive(Debug)]
pub enum Report {
    /// An email listing.
    Emails(Vec<EmailSummary>),
    /// What a mutation would have touched.
    DryRun {
        /// The mutation that was previewed.
        action: String,
        /// The emails it would touch.
        emails: Vec<EmailSummary>,
        /// Requested ids the server does not know.
        missing: Vec<String>,
    },
    /// The per-id outcome of a mutation.
    Outcome {
        /// The mutation that ran.
        action: String,
        /// Per-id results.
        outcome: BatchOutcome,
    },
    /// One full email.
    Email(EmailDetail),
    /// A whole thread, oldest first.
    Thread(Vec<EmailDetail>),
    /// The mailbox list.
    Mailboxes(Vec<MailboxInfo>),
    /// Session details.
    Session(SessionInfo),
    /// Per-sender counts.
    Senders(Vec<SenderCount>),
    /// Mailbox triage overview.
    Summary(TriageSummary),
    /// Stored sieve scripts.
    Scripts(Vec<ScriptInfo>),
    /// A created draft.
    Draft(DraftSummary),
    /// Raw preformatted output (script sources and the like).
    Raw(String),
}

impl Report {
    /// True when the report records at least one per-id failure.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        match self {
            Self::Outcome { outcome, .. } => !outcome.is_complete(),
            _ => false,
        }
    }

    /// Renders the report in the requested format.
    ///
    /// # Errors
    ///
    /// Fails only when JSON serialization fails.
    pub fn render(&self, format: Format) -> anyhow::Result<String> {
        match format {
            Format::Text => Ok(text::render(self)),
            Format::Json => json::render(self),
        }
    }
}
