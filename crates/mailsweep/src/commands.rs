//! Dispatch from parsed command-line arguments to core operations.

use anyhow::Context as _;
use chrono::{DateTime, NaiveDate, Utc};

use mailsweep_core::{
    generate_script, Client, DraftMode, DraftOptions, FlagColor, ListOptions, ReadOptions,
    ScriptAction, SearchOptions, SenderMatch, SortField, SortOrder, StatsOptions, SummaryOptions,
};
use mailsweep_jmap::{Id, JmapClient};

use crate::cli::{Command, ComposeArgs, DraftCommand, ListArgs, MutateArgs, SieveCommand};
use crate::output::Report;

fn to_ids(raw: &[String]) -> Vec<Id> {
    raw.iter().map(Id::new).collect()
}

/// Runs a bulk mutation, or previews it when `--dry-run` was given.
async fn mutate<F, Fut>(
    client: &Client<JmapClient>,
    action: &str,
    args: &MutateArgs,
    run: F,
) -> anyhow::Result<Report>
where
    F: FnOnce(Vec<Id>) -> Fut,
    Fut: Future<Output = mailsweep_core::Result<mailsweep_core::BatchOutcome>>,
{
    let ids = to_ids(&args.ids);
    if args.dry_run {
        let (emails, missing) = client.email_summaries(&ids).await?;
        return Ok(Report::DryRun {
            action: action.to_string(),
            emails,
            missing: missing.iter().map(ToString::to_string).collect(),
        });
    }
    let outcome = run(ids).await?;
    Ok(Report::Outcome {
        action: action.to_string(),
        outcome,
    })
}

/// Parses a sort spec: a field name optionally followed by `asc` or
/// `desc`, separated by a space or a colon.
fn parse_sort(spec: &str) -> anyhow::Result<(SortField, SortOrder)> {
    let normalized = spec.replace(':', " ");
    let mut parts = normalized.split_whitespace();
    let field = match parts.next() {
        Some(field) => field.parse::<SortField>()?,
        None => SortField::Date,
    };
    let order = match parts.next() {
        None => SortOrder::Descending,
        Some(direction) if direction.eq_ignore_ascii_case("asc") => SortOrder::Ascending,
        Some(direction) if direction.eq_ignore_ascii_case("desc") => SortOrder::Descending,
        Some(direction) => {
            anyhow::bail!("unsupported sort direction {direction:?} (use asc or desc)")
        }
    };
    if parts.next().is_some() {
        anyhow::bail!("sort takes a field and an optional direction");
    }
    Ok((field, order))
}

fn list_options(args: &ListArgs) -> anyhow::Result<ListOptions> {
    let (sort, order) = parse_sort(&args.sort)?;
    Ok(ListOptions {
        mailbox: args.mailbox.clone(),
        limit: args.limit,
        sort,
        order,
        unread_only: args.unread,
        flagged_only: args.flagged,
        unflagged_only: args.unflagged,
    })
}

#[allow(clippy::too_many_arguments)]
fn search_options(
    query: Option<String>,
    mailbox: Option<String>,
    from: Option<String>,
    to: Option<String>,
    subject: Option<String>,
    before: Option<&str>,
    after: Option<&str>,
    has_attachment: bool,
    limit: u64,
) -> anyhow::Result<SearchOptions> {
    let options = SearchOptions {
        text: query.filter(|q| !q.is_empty()),
        mailbox,
        from,
        to,
        subject,
        before: before.map(parse_time).transpose()?,
        after: after.map(parse_time).transpose()?,
        has_attachment,
        limit,
    };
    if options.text.is_none()
        && options.mailbox.is_none()
        && options.from.is_none()
        && options.to.is_none()
        && options.subject.is_none()
        && options.before.is_none()
        && options.after.is_none()
        && !options.has_attachment
    {
        anyhow::bail!("search needs a query or at least one filter flag");
    }
    Ok(options)
}

/// Parses an RFC 3339 instant, or a bare date taken as midnight UTC.
fn parse_time(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("cannot parse {value:?} as RFC 3339 or YYYY-MM-DD"))?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

fn draft_options(command: &DraftCommand) -> DraftOptions {
    let (mode, source, compose) = match command {
        DraftCommand::New(compose) => (DraftMode::New, None, compose),
        DraftCommand::Reply { id, compose } => (DraftMode::Reply, Some(Id::new(id)), compose),
        DraftCommand::ReplyAll { id, compose } => {
            (DraftMode::ReplyAll, Some(Id::new(id)), compose)
        }
        DraftCommand::Forward { id, compose } => (DraftMode::Forward, Some(Id::new(id)), compose),
    };
    let ComposeArgs {
        to,
        cc,
        bcc,
        subject,
        body,
        html,
    } = compose;
    DraftOptions {
        mode,
        source,
        to: to.clone(),
        cc: cc.clone(),
        bcc: bcc.clone(),
        subject: subject.clone(),
        body: body.clone(),
        html: *html,
    }
}

fn parse_action(action: &str, fileinto: Option<&str>) -> anyhow::Result<ScriptAction> {
    match action.to_ascii_lowercase().as_str() {
        "junk" => Ok(ScriptAction::Junk),
        "discard" => Ok(ScriptAction::Discard),
        "keep" => Ok(ScriptAction::Keep),
        "fileinto" => {
            let mailbox = fileinto
                .ok_or_else(|| anyhow::anyhow!("--fileinto is required with the fileinto action"))?;
            Ok(ScriptAction::FileInto(mailbox.to_string()))
        }
        other => anyhow::bail!("unknown action {other:?}: expected junk, discard, keep, or fileinto"),
    }
}

async fn run_sieve(client: &Client<JmapClient>, command: SieveCommand) -> anyhow::Result<Report> {
    match command {
        SieveCommand::List => Ok(Report::Scripts(client.list_scripts().await?)),
        SieveCommand::Get { name } => Ok(Report::Raw(client.get_script(&name).await?)),
        SieveCommand::Put {
            name,
            file,
            activate,
        } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            client.put_script(&name, &content, activate).await?;
            Ok(Report::Raw(format!("stored script {name:?}")))
        }
        SieveCommand::Validate { file } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            client.validate_script(&content).await?;
            Ok(Report::Raw("script is valid".to_string()))
        }
        SieveCommand::Activate { name } => {
            client.activate_script(&name).await?;
            Ok(Report::Raw(format!("activated script {name:?}")))
        }
        SieveCommand::Deactivate => {
            client.deactivate_scripts().await?;
            Ok(Report::Raw("no script is active now".to_string()))
        }
        SieveCommand::Delete { name } => {
            client.delete_script(&name).await?;
            Ok(Report::Raw(format!("deleted script {name:?}")))
        }
        SieveCommand::Generate {
            from,
            from_domain,
            action,
            fileinto,
        } => generate_report(
            from.as_deref(),
            from_domain.as_deref(),
            &action,
            fileinto.as_deref(),
        ),
    }
}

fn generate_report(
    from: Option<&str>,
    from_domain: Option<&str>,
    action: &str,
    fileinto: Option<&str>,
) -> anyhow::Result<Report> {
    let matcher = match (from, from_domain) {
        (Some(address), None) => SenderMatch::Address(address.to_string()),
        (None, Some(domain)) => SenderMatch::Domain(domain.to_string()),
        _ => anyhow::bail!("exactly one of --from or --from-domain is required"),
    };
    let action = parse_action(action, fileinto)?;
    Ok(Report::Raw(generate_script(&matcher, &action)))
}

/// Runs a command that needs no server, when the parsed command is
/// one. Script generation is pure templating.
pub fn run_local(command: &Command) -> Option<anyhow::Result<Report>> {
    let Command::Sieve {
        command:
            SieveCommand::Generate {
                from,
                from_domain,
                action,
                fileinto,
            },
    } = command
    else {
        return None;
    };
    Some(generate_report(
        from.as_deref(),
        from_domain.as_deref(),
        action,
        fileinto.as_deref(),
    ))
}

/// Runs one parsed command against the server.
pub async fn run(client: &Client<JmapClient>, command: Command) -> anyhow::Result<Report> {
    match command {
        Command::Archive(args) => {
            mutate(client, "archive", &args, |ids| async move {
                client.archive_emails(&ids).await
            })
            .await
        }
        Command::MoveTo { mailbox, args } => {
            mutate(client, &format!("move to {mailbox}"), &args, |ids| {
                let mailbox = mailbox.clone();
                async move { client.move_emails(&ids, &mailbox).await }
            })
            .await
        }
        Command::Spam(args) => {
            mutate(client, "mark as spam", &args, |ids| async move {
                client.mark_spam(&ids).await
            })
            .await
        }
        Command::MarkRead(args) => {
            mutate(client, "mark read", &args, |ids| async move {
                client.mark_read(&ids).await
            })
            .await
        }
        Command::MarkUnread(args) => {
            mutate(client, "mark unread", &args, |ids| async move {
                client.mark_unread(&ids).await
            })
            .await
        }
        Command::Flag { color, args } => {
            let color = color.as_deref().map(str::parse::<FlagColor>).transpose()?;
            mutate(client, "flag", &args, |ids| async move {
                client.flag_emails(&ids, color).await
            })
            .await
        }
        Command::Unflag(args) => {
            mutate(client, "unflag", &args, |ids| async move {
                client.unflag_emails(&ids).await
            })
            .await
        }
        Command::List(args) => {
            let options = list_options(&args)?;
            Ok(Report::Emails(client.list_emails(&options).await?))
        }
        Command::Search {
            query,
            mailbox,
            from,
            to,
            subject,
            before,
            after,
            has_attachment,
            limit,
        } => {
            let options = search_options(
                query,
                mailbox,
                from,
                to,
                subject,
                before.as_deref(),
                after.as_deref(),
                has_attachment,
                limit,
            )?;
            Ok(Report::Emails(client.search_emails(&options).await?))
        }
        Command::Read {
            id,
            thread,
            html,
            raw_headers,
        } => {
            let id = Id::new(&id);
            let options = ReadOptions {
                prefer_html: html,
                raw_headers,
            };
            if thread {
                Ok(Report::Thread(client.read_thread(&id, options).await?))
            } else {
                Ok(Report::Email(client.read_email(&id, options).await?))
            }
        }
        Command::Mailboxes { roles_only } => {
            Ok(Report::Mailboxes(client.list_mailboxes(roles_only).await?))
        }
        Command::Session => Ok(Report::Session(client.session_info())),
        Command::Draft { command } => {
            let options = draft_options(&command);
            Ok(Report::Draft(client.create_draft(&options).await?))
        }
        Command::Stats {
            mailbox,
            top,
            unread,
            flagged,
            unflagged,
            subjects,
        } => {
            let options = StatsOptions {
                mailbox: Some(mailbox),
                unread_only: unread,
                flagged_only: flagged,
                unflagged_only: unflagged,
                subjects,
                top,
            };
            Ok(Report::Senders(client.aggregate_by_sender(&options).await?))
        }
        Command::Summary {
            mailbox,
            unread,
            flagged,
            unflagged,
            limit,
            subjects,
            newsletters,
        } => {
            let options = SummaryOptions {
                mailbox: Some(mailbox),
                unread_only: unread,
                flagged_only: flagged,
                unflagged_only: unflagged,
                limit: usize::try_from(limit).unwrap_or(usize::MAX),
                subjects,
                newsletters,
            };
            Ok(Report::Summary(client.summary(&options).await?))
        }
        Command::Sieve { command } => run_sieve(client, command).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parsing_accepts_every_verb() {
        assert_eq!(parse_action("junk", None).unwrap(), ScriptAction::Junk);
        assert_eq!(
            parse_action("Discard", None).unwrap(),
            ScriptAction::Discard
        );
        assert_eq!(parse_action("keep", None).unwrap(), ScriptAction::Keep);
        assert_eq!(
            parse_action("fileinto", Some("Lists")).unwrap(),
            ScriptAction::FileInto("Lists".to_string())
        );
    }

    #[test]
    fn fileinto_without_target_is_rejected() {
        assert!(parse_action("fileinto", None).is_err());
        assert!(parse_action("shred", None).is_err());
    }

    #[test]
    fn draft_reply_carries_source() {
        let options = draft_options(&DraftCommand::Reply {
            id: "m1".to_string(),
            compose: ComposeArgs {
                to: Vec::new(),
                cc: Vec::new(),
                bcc: vec!["audit@example.com".to_string()],
                subject: None,
                body: "thanks".to_string(),
                html: false,
            },
        });
        assert_eq!(options.mode, DraftMode::Reply);
        assert_eq!(options.source, Some(Id::new("m1")));
        assert_eq!(options.bcc, vec!["audit@example.com"]);
        assert_eq!(options.body, "thanks");
    }

    #[test]
    fn list_options_parse_sort_and_order() {
        let options = list_options(&ListArgs {
            mailbox: Some("inbox".to_string()),
            limit: 10,
            sort: "from asc".to_string(),
            unread: true,
            flagged: false,
            unflagged: false,
        })
        .unwrap();
        assert_eq!(options.sort, SortField::From);
        assert_eq!(options.order, SortOrder::Ascending);
        assert!(options.unread_only);
    }

    #[test]
    fn sort_spec_accepts_colon_and_space_forms() {
        assert_eq!(
            parse_sort("subject:asc").unwrap(),
            (SortField::Subject, SortOrder::Ascending)
        );
        assert_eq!(
            parse_sort("date DESC").unwrap(),
            (SortField::Date, SortOrder::Descending)
        );
        assert_eq!(
            parse_sort("size").unwrap(),
            (SortField::Size, SortOrder::Descending)
        );
        assert_eq!(
            parse_sort("sent:asc").unwrap(),
            (SortField::Sent, SortOrder::Ascending)
        );
        assert!(parse_sort("date sideways").is_err());
        assert!(parse_sort("date desc extra").is_err());
    }

    #[test]
    fn bad_sort_field_is_an_error() {
        let result = list_options(&ListArgs {
            mailbox: None,
            limit: 10,
            sort: "priority".to_string(),
            unread: false,
            flagged: false,
            unflagged: false,
        });
        assert!(result.is_err());
    }

    #[test]
    fn parse_time_accepts_rfc3339_and_bare_dates() {
        let instant = parse_time("2026-08-24T10:30:00+02:00").unwrap();
        assert_eq!(instant.to_rfc3339(), "2026-08-24T08:30:00+00:00");
        let midnight = parse_time("2026-08-24").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2026-08-24T00:00:00+00:00");
        assert!(parse_time("yesterday").is_err());
    }

    #[test]
    fn search_needs_some_criterion() {
        let err = search_options(None, None, None, None, None, None, None, false, 20).unwrap_err();
        assert!(err.to_string().contains("filter flag"));

        let options = search_options(
            Some(String::new()),
            None,
            Some("boss@example.com".to_string()),
            None,
            None,
            Some("2026-01-01"),
            None,
            false,
            20,
        )
        .unwrap();
        assert_eq!(options.text, None);
        assert!(options.before.is_some());
    }
}
