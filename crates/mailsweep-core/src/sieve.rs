//! Sieve script management (RFC 9661).
//!
//! Script content lives in blobs; these operations pair the
//! `SieveScript/*` methods with blob upload and download. Destroying
//! a script is a script operation, not an email operation, so it is
//! not subject to the no-deletion guard.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use mailsweep_jmap::methods::sieve;
use mailsweep_jmap::{Id, Request, SIEVE_URI};

use crate::client::{expect_sieve_get, expect_sieve_set, expect_sieve_validate, Client, Exchange};
use crate::error::{Error, Result};

const SIEVE_MIME: &str = "application/sieve";

/// One stored script in a listing.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptInfo {
    /// Script id.
    pub id: String,
    /// Script name.
    pub name: String,
    /// Whether this is the active script.
    pub is_active: bool,
}

impl<X: Exchange> Client<X> {
    fn ensure_sieve(&self) -> Result<()> {
        if self.session().has_capability(SIEVE_URI) {
            return Ok(());
        }
        Err(Error::SieveUnsupported)
    }

    async fn fetch_scripts(&self) -> Result<Vec<sieve::SieveScript>> {
        self.ensure_sieve()?;
        let mut req = Request::new();
        let call_id = req.invoke(&sieve::Get {
            account_id: self.account_id().clone(),
            ids: None,
        })?;
        let response = self.send(&req).await?;
        Ok(expect_sieve_get(response, &call_id)?.list)
    }

    async fn script_by_name(&self, name: &str) -> Result<sieve::SieveScript> {
        self.fetch_scripts()
            .await?
            .into_iter()
            .find(|script| script.name == name)
            .ok_or_else(|| Error::NotFound(format!("no sieve script named {name:?}")))
    }

    /// Lists all stored scripts.
    ///
    /// # Errors
    ///
    /// Fails when sieve is unsupported or the exchange fails.
    pub async fn list_scripts(&self) -> Result<Vec<ScriptInfo>> {
        let mut scripts: Vec<ScriptInfo> = self
            .fetch_scripts()
            .await?
            .into_iter()
            .map(|script| ScriptInfo {
                id: script.id.map(|id| id.to_string()).unwrap_or_default(),
                name: script.name,
                is_active: script.is_active,
            })
            .collect();
        scripts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(scripts)
    }

    /// Fetches a script's source by name.
    ///
    /// # Errors
    ///
    /// Fails when the script does not exist or its blob cannot be
    /// fetched.
    pub async fn get_script(&self, name: &str) -> Result<String> {
        let script = self.script_by_name(name).await?;
        let blob_id = script
            .blob_id
            .ok_or_else(|| Error::NotFound(format!("script {name:?} has no content blob")))?;
        let bytes = self.download_blob(&blob_id, &script.name).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Uploads script source and creates or replaces the named
    /// script, optionally activating it.
    ///
    /// # Errors
    ///
    /// Fails when sieve is unsupported, the upload fails, or the
    /// server rejects the set.
    pub async fn put_script(&self, name: &str, content: &str, activate: bool) -> Result<()> {
        self.ensure_sieve()?;
        let upload = self
            .upload_blob(SIEVE_MIME, content.as_bytes().to_vec())
            .await?;
        debug!(name, blob = %upload.blob_id, "storing sieve script");

        let existing = self
            .fetch_scripts()
            .await?
            .into_iter()
            .find(|script| script.name == name)
            .and_then(|script| script.id);

        let mut set = sieve::Set {
            account_id: self.account_id().clone(),
            ..sieve::Set::default()
        };
        let target = match existing {
            Some(id) => {
                set.update.insert(
                    id.clone(),
                    serde_json::json!({"blobId": upload.blob_id.as_str()}),
                );
                id
            }
            None => {
                set.create.insert(
                    Id::new("script"),
                    sieve::SieveScript {
                        name: name.to_string(),
                        blob_id: Some(upload.blob_id.clone()),
                        ..sieve::SieveScript::default()
                    },
                );
                Id::new("#script")
            }
        };
        if activate {
            set.on_success_activate_script = Some(target);
        }

        let mut req = Request::new();
        let call_id = req.invoke(&set)?;
        let response = self.send(&req).await?;
        let result = expect_sieve_set(response, &call_id)?;
        if let Some(err) = first_set_error(&result) {
            return Err(Error::SieveInvalid(err));
        }
        Ok(())
    }

    /// Checks script source against the server without storing it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SieveInvalid`] with the server's reason when
    /// the script is rejected.
    pub async fn validate_script(&self, content: &str) -> Result<()> {
        self.ensure_sieve()?;
        let upload = self
            .upload_blob(SIEVE_MIME, content.as_bytes().to_vec())
            .await?;
        let mut req = Request::new();
        let call_id = req.invoke(&sieve::Validate {
            account_id: self.account_id().clone(),
            blob_id: upload.blob_id,
        })?;
        let response = self.send(&req).await?;
        let result = expect_sieve_validate(response, &call_id)?;
        match result.error {
            Some(err) => Err(Error::SieveInvalid(err.reason())),
            None => Ok(()),
        }
    }

    /// Makes the named script the active one.
    ///
    /// # Errors
    ///
    /// Fails when the script does not exist or the set fails.
    pub async fn activate_script(&self, name: &str) -> Result<()> {
        let script = self.script_by_name(name).await?;
        let id = script
            .id
            .ok_or_else(|| Error::NotFound(format!("script {name:?} has no id")))?;
        let set = sieve::Set {
            account_id: self.account_id().clone(),
            on_success_activate_script: Some(id),
            ..sieve::Set::default()
        };
        let mut req = Request::new();
        let call_id = req.invoke(&set)?;
        let response = self.send(&req).await?;
        expect_sieve_set(response, &call_id)?;
        Ok(())
    }

    /// Deactivates whichever script is active.
    ///
    /// # Errors
    ///
    /// Fails when sieve is unsupported or the set fails.
    pub async fn deactivate_scripts(&self) -> Result<()> {
        self.ensure_sieve()?;
        let set = sieve::Set {
            account_id: self.account_id().clone(),
            on_success_deactivate_script: true,
            ..sieve::Set::default()
        };
        let mut req = Request::new();
        let call_id = req.invoke(&set)?;
        let response = self.send(&req).await?;
        expect_sieve_set(response, &call_id)?;
        Ok(())
    }

    /// Destroys the named script.
    ///
    /// # Errors
    ///
    /// Fails when the script does not exist or the server refuses the
    /// destroy (an active script cannot be destroyed).
    pub async fn delete_script(&self, name: &str) -> Result<()> {
        let script = self.script_by_name(name).await?;
        let id = script
            .id
            .ok_or_else(|| Error::NotFound(format!("script {name:?} has no id")))?;
        let set = sieve::Set {
            account_id: self.account_id().clone(),
            destroy: vec![id.clone()],
            ..sieve::Set::default()
        };
        let mut req = Request::new();
        let call_id = req.invoke(&set)?;
        let response = self.send(&req).await?;
        let result = expect_sieve_set(response, &call_id)?;
        if let Some(err) = result.not_destroyed.get(&id) {
            return Err(Error::SieveInvalid(err.reason()));
        }
        Ok(())
    }
}

fn first_set_error(result: &sieve::SetResponse) -> Option<String> {
    let pick = |map: &BTreeMap<Id, mailsweep_jmap::methods::SetError>| {
        map.values().next().map(mailsweep_jmap::methods::SetError::reason)
    };
    pick(&result.not_created).or_else(|| pick(&result.not_updated))
}
