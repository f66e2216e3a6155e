//! Guard rails that refuse dangerous mutations before they are sent.
//!
//! Two checks exist: bulk moves must never target a trash-like
//! mailbox (that is deletion by another name), and a draft creation
//! set must contain exactly one create into the drafts mailbox and
//! nothing else.

use mailsweep_jmap::methods::email::Set;
use mailsweep_jmap::methods::mailbox::Mailbox;
use mailsweep_jmap::Id;

use crate::error::{Error, Result};

/// Mailbox names treated as trash regardless of role, compared
/// case-insensitively and in full.
const TRASH_NAMES: &[&str] = &["trash", "deleted items", "deleted messages"];

/// Rejects trash-like destinations for bulk moves.
///
/// A mailbox is trash-like when its role is `trash` or its name
/// matches one of the well-known trash names exactly (ignoring case).
/// Substring matches do not count: "Trashcan" is a fine destination.
///
/// # Errors
///
/// Returns [`Error::Forbidden`] for a trash-like destination.
pub fn check_move_destination(destination: &Mailbox) -> Result<()> {
    let trash_like = destination
        .role
        .as_deref()
        .is_some_and(|role| role.eq_ignore_ascii_case("trash"))
        || TRASH_NAMES
            .iter()
            .any(|name| destination.name.eq_ignore_ascii_case(name));
    if trash_like {
        return Err(Error::Forbidden {
            operation: format!("move emails to {:?}", destination.name),
            reason: "moving to trash deletes email; mailsweep never deletes email".to_string(),
        });
    }
    Ok(())
}

/// Verifies that a set call has the exact shape of a draft creation:
/// no updates, one create, membership in exactly the drafts mailbox,
/// and the `$draft` keyword present.
///
/// Destroys cannot be expressed by [`Set`] at all, so they need no
/// check here.
///
/// # Errors
///
/// Returns [`Error::Forbidden`] describing the first violated rule.
pub fn check_draft_set(set: &Set, drafts_id: &Id) -> Result<()> {
    let forbidden = |reason: &str| Error::Forbidden {
        operation: "create draft".to_string(),
        reason: reason.to_string(),
    };

    if !set.update.is_empty() {
        return Err(forbidden("draft creation must not update existing emails"));
    }
    if set.create.len() != 1 {
        return Err(forbidden("draft creation must create exactly one email"));
    }
    let Some(draft) = set.create.values().next() else {
        return Err(forbidden("draft creation must create exactly one email"));
    };

    let targets_drafts_only = draft.mailbox_ids.len() == 1
        && draft.mailbox_ids.get(drafts_id).copied().unwrap_or(false);
    if !targets_drafts_only {
        return Err(forbidden("draft must be created in the drafts mailbox only"));
    }
    if !draft.has_keyword("$draft") {
        return Err(forbidden("draft must carry the $draft keyword"));
    }
    Ok(())
}
