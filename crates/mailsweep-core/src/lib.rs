//! # mailsweep-core
//!
//! Mailbox operations for the mailsweep CLI, built on the
//! `mailsweep-jmap` client layer.
//!
//! This crate provides:
//! - Bulk email mutation split into capability-sized batches, with
//!   per-id success/failure accounting
//! - Destination and draft-shape safety checks that refuse dangerous
//!   mutations before they reach the server
//! - Draft composition (new, reply, reply-all, forward) with
//!   recipient deduplication and threading headers
//! - Listing, search, thread reading, per-sender statistics, and
//!   mailbox triage summaries
//! - Sieve script management (RFC 9661)

pub mod batch;
pub mod client;
pub mod color;
pub mod draft;
pub mod email;
mod error;
pub mod mailbox;
pub mod safety;
pub mod sieve;
pub mod sieve_template;
pub mod stats;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use batch::{BatchOutcome, Failure};
pub use client::{Client, Exchange, DEFAULT_BATCH_SIZE};
pub use color::FlagColor;
pub use draft::{DraftMode, DraftOptions};
pub use email::{ListOptions, ReadOptions, SearchOptions, SortField, SortOrder};
pub use error::{Error, Result};
pub use mailbox::Role;
pub use sieve::ScriptInfo;
pub use sieve_template::{generate_script, ScriptAction, SenderMatch};
pub use stats::{StatsOptions, SummaryOptions};
pub use types::{
    DomainBreakdown, DraftSummary, EmailDetail, EmailSummary, Header, MailboxInfo,
    SenderBreakdown, SenderCount, SessionInfo, TriageSummary,
};
