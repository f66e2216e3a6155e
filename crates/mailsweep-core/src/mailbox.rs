//! Mailbox lookup and role handling.

use mailsweep_jmap::methods::mailbox::{self, Mailbox};
use mailsweep_jmap::Request;

use crate::client::{expect_mailbox_get, Client, Exchange};
use crate::error::{Error, Result};
use crate::types::MailboxInfo;

/// Standard mailbox roles (RFC 8621, Section 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The inbox.
    Inbox,
    /// The archive.
    Archive,
    /// Draft storage.
    Drafts,
    /// Sent mail.
    Sent,
    /// The trash.
    Trash,
    /// Spam.
    Junk,
}

impl Role {
    /// The wire value of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Archive => "archive",
            Self::Drafts => "drafts",
            Self::Sent => "sent",
            Self::Trash => "trash",
            Self::Junk => "junk",
        }
    }

    /// Parses a wire role value, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "inbox" => Some(Self::Inbox),
            "archive" => Some(Self::Archive),
            "drafts" => Some(Self::Drafts),
            "sent" => Some(Self::Sent),
            "trash" => Some(Self::Trash),
            "junk" | "spam" => Some(Self::Junk),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<X: Exchange> Client<X> {
    /// All mailboxes in the account, fetched once and cached for the
    /// life of the client.
    pub(crate) async fn mailboxes(&self) -> Result<&[Mailbox]> {
        let list = self
            .mailboxes
            .get_or_try_init(|| async {
                let mut req = Request::new();
                let call_id = req.invoke(&mailbox::Get {
                    account_id: self.account_id().clone(),
                    ids: None,
                })?;
                let response = self.send(&req).await?;
                Ok::<_, Error>(expect_mailbox_get(response, &call_id)?.list)
            })
            .await?;
        Ok(list)
    }

    /// Finds the mailbox carrying a standard role.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no mailbox has the role.
    pub async fn mailbox_by_role(&self, role: Role) -> Result<Mailbox> {
        self.mailboxes()
            .await?
            .iter()
            .find(|mb| {
                mb.role
                    .as_deref()
                    .is_some_and(|r| r.eq_ignore_ascii_case(role.as_str()))
            })
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no mailbox with role {role}")))
    }

    /// Resolves a mailbox reference: a role name, then a display name
    /// (case-insensitive), then a raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when nothing matches.
    pub async fn resolve_mailbox(&self, reference: &str) -> Result<Mailbox> {
        if let Some(role) = Role::parse(reference) {
            if let Ok(found) = self.mailbox_by_role(role).await {
                return Ok(found);
            }
        }
        let mailboxes = self.mailboxes().await?;
        if let Some(found) = mailboxes
            .iter()
            .find(|mb| mb.name.eq_ignore_ascii_case(reference))
        {
            return Ok(found.clone());
        }
        if let Some(found) = mailboxes.iter().find(|mb| mb.id.as_str() == reference) {
            return Ok(found.clone());
        }
        Err(Error::NotFound(format!("no mailbox named {reference:?}")))
    }

    /// Lists mailboxes, sorted by name; `roles_only` keeps just the
    /// ones carrying a standard role.
    ///
    /// # Errors
    ///
    /// Returns an error when the mailbox fetch fails.
    pub async fn list_mailboxes(&self, roles_only: bool) -> Result<Vec<MailboxInfo>> {
        let mut list: Vec<MailboxInfo> = self
            .mailboxes()
            .await?
            .iter()
            .filter(|mb| !roles_only || mb.role.is_some())
            .map(|mb| MailboxInfo {
                id: mb.id.to_string(),
                name: mb.name.clone(),
                role: mb.role.clone(),
                total_emails: mb.total_emails,
                unread_emails: mb.unread_emails,
            })
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }
}
