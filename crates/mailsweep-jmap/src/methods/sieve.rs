//! `SieveScript/*` methods (RFC 9661).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::SetError;
use crate::id::Id;
use crate::request::Method;
use crate::SIEVE_URI;

/// A stored sieve script. Script content lives in a blob; only
/// metadata travels through `/get` and `/set`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SieveScript {
    /// Server-assigned id (absent on creation).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    /// Script name.
    pub name: String,
    /// Blob holding the script source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_id: Option<Id>,
    /// Whether this is the active script.
    pub is_active: bool,
}

/// `SieveScript/get` arguments.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Get {
    /// Target account.
    pub account_id: Id,
    /// Explicit ids to fetch, or `None` for all scripts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<Id>>,
}

impl Method for Get {
    const NAME: &'static str = "SieveScript/get";
    const USING: &'static [&'static str] = &[SIEVE_URI];
}

/// `SieveScript/get` result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetResponse {
    /// Account the call operated on.
    pub account_id: Id,
    /// Found scripts.
    pub list: Vec<SieveScript>,
    /// Requested ids the server does not know.
    pub not_found: Vec<Id>,
}

/// `SieveScript/set` arguments.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Set {
    /// Target account.
    pub account_id: Id,
    /// Scripts to create, keyed by client-chosen creation id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub create: BTreeMap<Id, SieveScript>,
    /// Property patches keyed by script id.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub update: BTreeMap<Id, serde_json::Value>,
    /// Scripts to destroy.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub destroy: Vec<Id>,
    /// Script to activate if the rest of the call succeeds. May be a
    /// creation-id reference (`#draft`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_success_activate_script: Option<Id>,
    /// Deactivate the active script if the rest of the call succeeds.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub on_success_deactivate_script: bool,
}

impl Method for Set {
    const NAME: &'static str = "SieveScript/set";
    const USING: &'static [&'static str] = &[SIEVE_URI];
}

/// `SieveScript/set` result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetResponse {
    /// Account the call operated on.
    pub account_id: Id,
    /// Created scripts with their server-set properties.
    pub created: BTreeMap<Id, SieveScript>,
    /// Creations the server rejected.
    pub not_created: BTreeMap<Id, SetError>,
    /// Successfully updated ids.
    pub updated: BTreeMap<Id, Option<serde_json::Value>>,
    /// Updates the server rejected.
    pub not_updated: BTreeMap<Id, SetError>,
    /// Successfully destroyed ids.
    pub destroyed: Vec<Id>,
    /// Destroys the server rejected.
    pub not_destroyed: BTreeMap<Id, SetError>,
}

/// `SieveScript/validate` arguments.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validate {
    /// Target account.
    pub account_id: Id,
    /// Blob holding the script to validate.
    pub blob_id: Id,
}

impl Method for Validate {
    const NAME: &'static str = "SieveScript/validate";
    const USING: &'static [&'static str] = &[SIEVE_URI];
}

/// `SieveScript/validate` result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidateResponse {
    /// Account the call operated on.
    pub account_id: Id,
    /// The validation error, or `None` when the script is valid.
    pub error: Option<SetError>,
}
