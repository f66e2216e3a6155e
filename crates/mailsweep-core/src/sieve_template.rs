//! Generation of simple sender-based sieve scripts.

use std::fmt::Write as _;

/// What to match a script rule against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderMatch {
    /// Exact sender address.
    Address(String),
    /// Sender domain.
    Domain(String),
}

/// What a matched message should have done to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptAction {
    /// File into the junk mailbox.
    Junk,
    /// Silently drop.
    Discard,
    /// Deliver normally.
    Keep,
    /// File into a named mailbox.
    FileInto(String),
}

impl ScriptAction {
    fn render(&self) -> String {
        match self {
            Self::Junk => "fileinto \"Junk\";".to_string(),
            Self::Discard => "discard;".to_string(),
            Self::Keep => "keep;".to_string(),
            Self::FileInto(mailbox) => format!("fileinto {};", quote(mailbox)),
        }
    }

    const fn needs_fileinto(&self) -> bool {
        matches!(self, Self::Junk | Self::FileInto(_))
    }
}

/// Produces a complete sieve script matching one sender rule.
#[must_use]
pub fn generate_script(matcher: &SenderMatch, action: &ScriptAction) -> String {
    let condition = match matcher {
        SenderMatch::Address(address) => {
            format!("address :is \"from\" {}", quote(address))
        }
        SenderMatch::Domain(domain) => {
            format!("address :domain :is \"from\" {}", quote(domain))
        }
    };

    let mut script = String::new();
    if action.needs_fileinto() {
        script.push_str("require [\"fileinto\"];\n\n");
    }
    let _ = write!(
        script,
        "if {condition} {{\n    {}\n    stop;\n}}\n",
        action.render()
    );
    script
}

/// Quotes a sieve string literal, escaping backslashes and quotes.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
