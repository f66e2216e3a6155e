//! `SearchSnippet/get` (RFC 8621, Section 5).

use serde::{Deserialize, Serialize};

use super::email::Filter;
use crate::id::Id;
use crate::request::{Method, ResultReference};
use crate::MAIL_URI;

/// A search snippet: highlighted subject and preview for one match.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSnippet {
    /// The email this snippet belongs to.
    pub email_id: Id,
    /// Subject with match highlighting, when the subject matched.
    pub subject: Option<String>,
    /// Body excerpt with match highlighting, when the body matched.
    pub preview: Option<String>,
}

/// `SearchSnippet/get` arguments.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Get {
    /// Target account.
    pub account_id: Id,
    /// The filter the snippets are computed against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    /// Explicit email ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_ids: Option<Vec<Id>>,
    /// Back-reference producing the email ids from an earlier call.
    #[serde(rename = "#emailIds", skip_serializing_if = "Option::is_none")]
    pub email_ids_ref: Option<ResultReference>,
}

impl Method for Get {
    const NAME: &'static str = "SearchSnippet/get";
    const USING: &'static [&'static str] = &[MAIL_URI];
}

/// `SearchSnippet/get` result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetResponse {
    /// Account the call operated on.
    pub account_id: Id,
    /// One snippet per found email.
    pub list: Vec<SearchSnippet>,
    /// Requested ids the server does not know.
    pub not_found: Vec<Id>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::email::FilterCondition;

    #[test]
    fn back_reference_uses_hash_key() {
        let get = Get {
            account_id: Id::new("a1"),
            filter: Some(Filter::Condition(FilterCondition {
                text: Some("invoice".to_string()),
                ..FilterCondition::default()
            })),
            email_ids_ref: Some(ResultReference {
                result_of: "c0".to_string(),
                name: "Email/query".to_string(),
                path: "/ids".to_string(),
            }),
            ..Get::default()
        };
        let json = serde_json::to_value(&get).unwrap();
        assert_eq!(json["filter"]["text"], "invoice");
        assert_eq!(json["#emailIds"]["path"], "/ids");
        assert!(json.get("emailIds").is_none());
    }

    #[test]
    fn parses_snippets_with_null_fields() {
        let resp: GetResponse = serde_json::from_str(
            r#"{
                "accountId": "a1",
                "list": [{"emailId": "m1", "subject": null, "preview": "found <mark>it</mark>"}]
            }"#,
        )
        .unwrap();
        assert_eq!(resp.list[0].subject, None);
        assert!(resp.list[0].preview.as_deref().unwrap().contains("mark"));
    }
}
