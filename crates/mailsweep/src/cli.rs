//! Command-line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Aligned human-readable columns.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Manage a JMAP mailbox from the command line.
#[derive(Debug, Parser)]
#[command(name = "mailsweep", version, about)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: Format,

    /// JMAP session endpoint.
    #[arg(long, global = true, env = "MAILSWEEP_SESSION_URL")]
    pub session_url: Option<String>,

    /// API bearer token.
    #[arg(long, global = true, env = "MAILSWEEP_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Command that prints the API token to stdout.
    #[arg(long, global = true, env = "MAILSWEEP_CREDENTIAL_COMMAND")]
    pub credential_command: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Move emails to the archive mailbox.
    Archive(MutateArgs),
    /// Move emails to a mailbox (never the trash).
    #[command(name = "move")]
    MoveTo {
        /// Destination mailbox: a role, name, or id.
        mailbox: String,
        #[command(flatten)]
        args: MutateArgs,
    },
    /// Move emails to the junk mailbox.
    Spam(MutateArgs),
    /// Mark emails as read.
    MarkRead(MutateArgs),
    /// Mark emails as unread.
    MarkUnread(MutateArgs),
    /// Flag emails, optionally with a color.
    Flag {
        /// Flag color: red, orange, yellow, green, blue, purple, or
        /// gray.
        #[arg(long)]
        color: Option<String>,
        #[command(flatten)]
        args: MutateArgs,
    },
    /// Remove the flag and color from emails.
    Unflag(MutateArgs),
    /// List emails.
    List(ListArgs),
    /// Search emails by text and header criteria.
    Search {
        /// Full-text query; optional when filter flags are given.
        query: Option<String>,
        /// Restrict to one mailbox: a role, name, or id.
        #[arg(long)]
        mailbox: Option<String>,
        /// Filter by sender address or name.
        #[arg(long)]
        from: Option<String>,
        /// Filter by recipient address or name.
        #[arg(long)]
        to: Option<String>,
        /// Filter by subject text.
        #[arg(long)]
        subject: Option<String>,
        /// Only emails received before this RFC 3339 instant or date.
        #[arg(long)]
        before: Option<String>,
        /// Only emails received after this RFC 3339 instant or date.
        #[arg(long)]
        after: Option<String>,
        /// Only emails with attachments.
        #[arg(long)]
        has_attachment: bool,
        /// Maximum number of hits.
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
    /// Read one email, or its whole thread.
    Read {
        /// Email id.
        id: String,
        /// Show every email in the thread.
        #[arg(long)]
        thread: bool,
        /// Prefer the HTML body over the text body.
        #[arg(long)]
        html: bool,
        /// Include every raw header field.
        #[arg(long)]
        raw_headers: bool,
    },
    /// List mailboxes with counts.
    Mailboxes {
        /// Only mailboxes carrying a standard role.
        #[arg(long)]
        roles_only: bool,
    },
    /// Show session and capability details.
    Session,
    /// Compose a draft (drafts are stored, never sent).
    Draft {
        #[command(subcommand)]
        command: DraftCommand,
    },
    /// Count emails per sender.
    Stats {
        /// Mailbox to aggregate: a role, name, or id.
        #[arg(long, default_value = "inbox")]
        mailbox: String,
        /// Number of senders to show.
        #[arg(long, default_value_t = 20)]
        top: usize,
        /// Only count unread emails.
        #[arg(long)]
        unread: bool,
        /// Only count flagged emails.
        #[arg(long, conflicts_with = "unflagged")]
        flagged: bool,
        /// Only count unflagged emails.
        #[arg(long)]
        unflagged: bool,
        /// Include subject lines per sender.
        #[arg(long)]
        subjects: bool,
    },
    /// Triage overview of a mailbox: senders, domains, unread counts.
    Summary {
        /// Mailbox to summarize: a role, name, or id.
        #[arg(long, default_value = "inbox")]
        mailbox: String,
        /// Only count unread emails.
        #[arg(long)]
        unread: bool,
        /// Only count flagged emails.
        #[arg(long, conflicts_with = "unflagged")]
        flagged: bool,
        /// Only count unflagged emails.
        #[arg(long)]
        unflagged: bool,
        /// Number of top senders and domains to show.
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
        limit: u64,
        /// Include sample subjects per sender.
        #[arg(long)]
        subjects: bool,
        /// Detect newsletters via List-Id and List-Unsubscribe
        /// headers.
        #[arg(long)]
        newsletters: bool,
    },
    /// Manage sieve filtering scripts.
    Sieve {
        #[command(subcommand)]
        command: SieveCommand,
    },
}

/// Shared arguments for bulk mutations.
#[derive(Debug, Args)]
pub struct MutateArgs {
    /// Email ids to operate on.
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Show the affected emails without changing anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for `list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Mailbox to list: a role, name, or id. All mail when omitted.
    #[arg(long)]
    pub mailbox: Option<String>,

    /// Maximum number of results.
    #[arg(long, default_value_t = 50)]
    pub limit: u64,

    /// Sort spec: a field (date, sent, from, subject, size)
    /// optionally followed by asc or desc, e.g. "date desc" or
    /// "from:asc".
    #[arg(long, default_value = "date desc")]
    pub sort: String,

    /// Only unread emails.
    #[arg(long)]
    pub unread: bool,

    /// Only flagged emails.
    #[arg(long, conflicts_with = "unflagged")]
    pub flagged: bool,

    /// Only unflagged emails.
    #[arg(long)]
    pub unflagged: bool,
}

/// Draft composition modes.
#[derive(Debug, Subcommand)]
pub enum DraftCommand {
    /// A fresh message.
    New(ComposeArgs),
    /// Reply to the sender of an email.
    Reply {
        /// The email being answered.
        id: String,
        #[command(flatten)]
        compose: ComposeArgs,
    },
    /// Reply to the sender and all other recipients.
    ReplyAll {
        /// The email being answered.
        id: String,
        #[command(flatten)]
        compose: ComposeArgs,
    },
    /// Forward an email to new recipients.
    Forward {
        /// The email being forwarded.
        id: String,
        #[command(flatten)]
        compose: ComposeArgs,
    },
}

/// Shared draft composition arguments.
#[derive(Debug, Args)]
pub struct ComposeArgs {
    /// To recipient, repeatable.
    #[arg(long)]
    pub to: Vec<String>,

    /// CC recipient, repeatable.
    #[arg(long)]
    pub cc: Vec<String>,

    /// BCC recipient, repeatable.
    #[arg(long)]
    pub bcc: Vec<String>,

    /// Subject; replies and forwards derive one when omitted.
    #[arg(long)]
    pub subject: Option<String>,

    /// Body text.
    #[arg(long, default_value = "")]
    pub body: String,

    /// Store the body as HTML.
    #[arg(long)]
    pub html: bool,
}

/// Sieve script subcommands.
#[derive(Debug, Subcommand)]
pub enum SieveCommand {
    /// List stored scripts.
    List,
    /// Print a script's source.
    Get {
        /// Script name.
        name: String,
    },
    /// Upload a script from a file.
    Put {
        /// Script name.
        name: String,
        /// Path to the script source.
        file: PathBuf,
        /// Activate the script once stored.
        #[arg(long)]
        activate: bool,
    },
    /// Check a script file against the server without storing it.
    Validate {
        /// Path to the script source.
        file: PathBuf,
    },
    /// Make a stored script the active one.
    Activate {
        /// Script name.
        name: String,
    },
    /// Deactivate the active script.
    Deactivate,
    /// Destroy a stored script.
    Delete {
        /// Script name.
        name: String,
    },
    /// Print a generated sender-rule script.
    Generate {
        /// Match this exact sender address.
        #[arg(long, conflicts_with = "from_domain")]
        from: Option<String>,
        /// Match this sender domain.
        #[arg(long)]
        from_domain: Option<String>,
        /// Action: junk, discard, keep, or fileinto.
        #[arg(long)]
        action: String,
        /// Target mailbox when the action is fileinto.
        #[arg(long)]
        fileinto: Option<String>,
    },
}
