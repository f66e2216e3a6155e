//! mailsweep - JMAP mail management from the command line
//!
//! Connects to a JMAP server (Fastmail by default), and provides bulk
//! email mutation, listing, search, draft composition, per-sender
//! statistics, and sieve script management.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod config;
mod output;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailsweep_core::Client;
use mailsweep_jmap::{JmapClient, StatusCode};

use cli::Cli;
use output::Report;

// Exit codes, so scripts can tell failure modes apart.
const EXIT_GENERAL: i32 = 1;
const EXIT_CONFIG: i32 = 2;
const EXIT_AUTH: i32 = 3;
const EXIT_NOT_FOUND: i32 = 4;
const EXIT_FORBIDDEN: i32 = 5;
const EXIT_JMAP: i32 = 6;
const EXIT_PARTIAL: i32 = 7;

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsweep=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let code = run(cli);
    std::process::exit(code);
}

#[tokio::main]
async fn run(cli: Cli) -> i32 {
    let format = cli.format;

    if let Some(result) = commands::run_local(&cli.command) {
        return finish(result, format);
    }

    let config = match config::load(&cli) {
        Ok(config) => config,
        Err(err) => return report_error(&anyhow::Error::from(err), format),
    };

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            ctrl_c_cancel.cancel();
        }
    });

    let result = connect_and_run(cli, config, cancel).await;
    finish(result, format)
}

async fn connect_and_run(
    cli: Cli,
    config: config::Config,
    cancel: CancellationToken,
) -> anyhow::Result<Report> {
    debug!(url = %config.session_url, "connecting");
    let jmap = JmapClient::connect(&config.session_url, &config.token, cancel).await?;
    let client = Client::new(jmap)?;
    commands::run(&client, cli.command).await
}

fn finish(result: anyhow::Result<Report>, format: cli::Format) -> i32 {
    match result {
        Ok(report) => match report.render(format) {
            Ok(rendered) => {
                if rendered.ends_with('\n') {
                    print!("{rendered}");
                } else {
                    println!("{rendered}");
                }
                if report.has_failures() {
                    EXIT_PARTIAL
                } else {
                    0
                }
            }
            Err(err) => report_error(&err, format),
        },
        Err(err) => report_error(&err, format),
    }
}

/// Writes a structured error to stderr: a stable code, the message,
/// and a hint when one helps. JSON mode emits one object so scripts
/// can parse failures too.
fn report_error(err: &anyhow::Error, format: cli::Format) -> i32 {
    let code = exit_code(err);
    let name = code_name(code);
    let hint = hint_for(code);
    match format {
        cli::Format::Json => {
            let mut payload = serde_json::json!({
                "error": name,
                "message": format!("{err:#}"),
            });
            if let Some(hint) = hint {
                payload["hint"] = serde_json::Value::String(hint.to_string());
            }
            eprintln!("{payload}");
        }
        cli::Format::Text => {
            eprintln!("error [{name}]: {err:#}");
            if let Some(hint) = hint {
                eprintln!("hint: {hint}");
            }
        }
    }
    code
}

const fn code_name(code: i32) -> &'static str {
    match code {
        EXIT_CONFIG => "config_error",
        EXIT_AUTH => "authentication_failed",
        EXIT_NOT_FOUND => "not_found",
        EXIT_FORBIDDEN => "forbidden_operation",
        EXIT_JMAP => "jmap_error",
        EXIT_PARTIAL => "partial_failure",
        _ => "general_error",
    }
}

const fn hint_for(code: i32) -> Option<&'static str> {
    match code {
        EXIT_AUTH => Some("check the credential command or the token it returns"),
        EXIT_CONFIG => {
            Some("set MAILSWEEP_SESSION_URL and MAILSWEEP_TOKEN, or fill in the config file")
        }
        _ => None,
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<config::ConfigError>().is_some() {
        return EXIT_CONFIG;
    }
    if let Some(jmap) = err.downcast_ref::<mailsweep_jmap::Error>() {
        return jmap_exit_code(jmap);
    }
    if let Some(core) = err.downcast_ref::<mailsweep_core::Error>() {
        return match core {
            mailsweep_core::Error::Jmap(jmap) => jmap_exit_code(jmap),
            mailsweep_core::Error::InvalidColor(_) | mailsweep_core::Error::InvalidSort(_) => {
                EXIT_CONFIG
            }
            mailsweep_core::Error::NotFound(_) => EXIT_NOT_FOUND,
            mailsweep_core::Error::Forbidden { .. } => EXIT_FORBIDDEN,
            mailsweep_core::Error::Method { .. }
            | mailsweep_core::Error::UnexpectedResponse { .. }
            | mailsweep_core::Error::NoMailAccount
            | mailsweep_core::Error::SieveUnsupported
            | mailsweep_core::Error::SieveInvalid(_)
            | mailsweep_core::Error::DraftRejected(_) => EXIT_JMAP,
        };
    }
    EXIT_GENERAL
}

fn jmap_exit_code(err: &mailsweep_jmap::Error) -> i32 {
    match err {
        mailsweep_jmap::Error::Api { status, .. }
            if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN =>
        {
            EXIT_AUTH
        }
        _ => EXIT_JMAP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_get_their_own_code() {
        let err = anyhow::Error::from(mailsweep_core::Error::Jmap(mailsweep_jmap::Error::Api {
            status: StatusCode::UNAUTHORIZED,
            detail: "bad token".to_string(),
        }));
        assert_eq!(exit_code(&err), EXIT_AUTH);
    }

    #[test]
    fn forbidden_moves_get_their_own_code() {
        let err = anyhow::Error::from(mailsweep_core::Error::Forbidden {
            operation: "move to Trash".to_string(),
            reason: "destination is a trash mailbox".to_string(),
        });
        assert_eq!(exit_code(&err), EXIT_FORBIDDEN);
    }

    #[test]
    fn missing_things_get_their_own_code() {
        let err = anyhow::Error::from(mailsweep_core::Error::NotFound("mailbox x".to_string()));
        assert_eq!(exit_code(&err), EXIT_NOT_FOUND);
    }

    #[test]
    fn unknown_errors_fall_back_to_general() {
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), EXIT_GENERAL);
    }

    #[test]
    fn error_codes_have_stable_names() {
        assert_eq!(code_name(EXIT_AUTH), "authentication_failed");
        assert_eq!(code_name(EXIT_CONFIG), "config_error");
        assert_eq!(code_name(EXIT_FORBIDDEN), "forbidden_operation");
        assert_eq!(code_name(EXIT_GENERAL), "general_error");
    }

    #[test]
    fn only_auth_and_config_carry_hints() {
        assert!(hint_for(EXIT_AUTH).is_some());
        assert!(hint_for(EXIT_CONFIG).is_some());
        assert!(hint_for(EXIT_JMAP).is_none());
        assert!(hint_for(EXIT_GENERAL).is_none());
    }
}
