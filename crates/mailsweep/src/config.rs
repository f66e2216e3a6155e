//! Configuration loading.
//!
//! Precedence, highest first: command-line flags, environment
//! (`MAILSWEEP_*`, applied by clap), the config file at
//! `<config dir>/mailsweep/config.toml`, built-in defaults. The token
//! may come from a credential command instead of being stored
//! anywhere.

use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::cli::Cli;

/// Default JMAP session endpoint (Fastmail).
pub const DEFAULT_SESSION_URL: &str = "https://api.fastmail.com/jmap/session";

#[cfg(target_os = "macos")]
const DEFAULT_CREDENTIAL_COMMAND: &str = "security find-generic-password -s mailsweep -w";
#[cfg(not(target_os = "macos"))]
const DEFAULT_CREDENTIAL_COMMAND: &str = "secret-tool lookup service mailsweep";

/// A configuration problem the user has to fix.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConfigError(String);

/// Resolved configuration.
#[derive(Debug)]
pub struct Config {
    /// Session endpoint to connect to.
    pub session_url: String,
    /// Bearer token for the session endpoint.
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    session_url: Option<String>,
    token: Option<String>,
    credential_command: Option<String>,
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mailsweep").join("config.toml"))
}

fn read_file_config() -> Result<FileConfig, ConfigError> {
    let Some(path) = config_path() else {
        return Ok(FileConfig::default());
    };
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    debug!(path = %path.display(), "reading config file");
    let contents = std::fs::read_to_string(&path)
        .map_err(|err| ConfigError(format!("cannot read {}: {err}", path.display())))?;
    toml::from_str(&contents)
        .map_err(|err| ConfigError(format!("cannot parse {}: {err}", path.display())))
}

/// Runs a credential command and returns its trimmed stdout.
fn run_credential_command(command_line: &str) -> Result<String, ConfigError> {
    let mut parts = command_line.split_whitespace();
    let Some(program) = parts.next() else {
        return Err(ConfigError("credential command is empty".to_string()));
    };
    debug!(command = command_line, "running credential command");
    let output = Command::new(program)
        .args(parts)
        .output()
        .map_err(|err| ConfigError(format!("credential command {program:?} failed: {err}")))?;
    if !output.status.success() {
        return Err(ConfigError(format!(
            "credential command {command_line:?} exited with {}",
            output.status
        )));
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(ConfigError(format!(
            "credential command {command_line:?} printed no token"
        )));
    }
    Ok(token)
}

/// Resolves the effective configuration for this invocation.
///
/// # Errors
///
/// Returns [`ConfigError`] when the config file is unreadable or no
/// token can be obtained from any source.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    let file = read_file_config()?;

    let session_url = cli
        .session_url
        .clone()
        .or(file.session_url)
        .unwrap_or_else(|| DEFAULT_SESSION_URL.to_string());

    let token = match cli.token.clone().or(file.token) {
        Some(token) => token,
        None => {
            let command_line = cli
                .credential_command
                .clone()
                .or(file.credential_command)
                .unwrap_or_else(|| DEFAULT_CREDENTIAL_COMMAND.to_string());
            run_credential_command(&command_line).map_err(|err| {
                ConfigError(format!(
                    "no API token configured (set MAILSWEEP_TOKEN, --token, \
                     or a working credential command): {err}"
                ))
            })?
        }
    };

    Ok(Config { session_url, token })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_command_returns_trimmed_stdout() {
        let token = run_credential_command("echo  secret-token ").unwrap();
        assert_eq!(token, "secret-token");
    }

    #[test]
    fn failing_credential_command_is_an_error() {
        assert!(run_credential_command("false").is_err());
    }

    #[test]
    fn missing_program_is_an_error() {
        assert!(run_credential_command("definitely-not-a-real-program-xyz").is_err());
    }

    #[test]
    fn empty_credential_command_is_an_error() {
        assert!(run_credential_command("   ").is_err());
    }

    #[test]
    fn file_config_parses_all_fields() {
        let parsed: FileConfig = toml::from_str(
            r#"
            session_url = "https://example.com/jmap/session"
            credential_command = "pass show mail/token"
            "#,
        )
        .unwrap();
        assert_eq!(
            parsed.session_url.as_deref(),
            Some("https://example.com/jmap/session")
        );
        assert_eq!(parsed.token, None);
        assert_eq!(
            parsed.credential_command.as_deref(),
            Some("pass show mail/token")
        );
    }
}
