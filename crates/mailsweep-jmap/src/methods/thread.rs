//! `Thread/get` (RFC 8621, Section 3).

use serde::{Deserialize, Serialize};

use crate::id::Id;
use crate::request::Method;
use crate::MAIL_URI;

/// One thread: an ordered list of email ids.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Thread {
    /// Server-assigned id.
    pub id: Id,
    /// Member emails, oldest first.
    pub email_ids: Vec<Id>,
}

/// `Thread/get` arguments.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Get {
    /// Target account.
    pub account_id: Id,
    /// Thread ids to fetch.
    pub ids: Vec<Id>,
}

impl Method for Get {
    const NAME: &'static str = "Thread/get";
    const USING: &'static [&'static str] = &[MAIL_URI];
}

/// `Thread/get` result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetResponse {
    /// Account the call operated on.
    pub account_id: Id,
    /// Found threads.
    pub list: Vec<Thread>,
    /// Requested ids the server does not know.
    pub not_found: Vec<Id>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_thread() {
        let resp: GetResponse = serde_json::from_str(
            r#"{"accountId": "a1", "list": [{"id": "t1", "emailIds": ["m1", "m2"]}]}"#,
        )
        .unwrap();
        assert_eq!(resp.list[0].email_ids, vec![Id::new("m1"), Id::new("m2")]);
    }
}
