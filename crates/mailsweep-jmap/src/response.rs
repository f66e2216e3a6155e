//! JMAP response envelope (RFC 8620, Section 3.4).

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;

use crate::methods::{email, mailbox, sieve, snippet, thread};

/// A parsed JMAP response: one [`CallResponse`] per invocation, in
/// server order.
#[derive(Debug, Default)]
pub struct Response {
    /// The per-call results.
    pub calls: Vec<CallResponse>,
    /// Opaque session state string.
    pub session_state: String,
}

impl Response {
    /// Finds the result for a given call id.
    #[must_use]
    pub fn find(&self, call_id: &str) -> Option<&MethodResult> {
        self.calls
            .iter()
            .find(|call| call.call_id == call_id)
            .map(|call| &call.result)
    }
}

/// One method response, correlated to its invocation by call id.
#[derive(Debug)]
pub struct CallResponse {
    /// Wire method name the server responded with.
    pub name: String,
    /// Call id echoed from the request.
    pub call_id: String,
    /// The decoded result.
    pub result: MethodResult,
}

/// A method-level error response (RFC 8620, Section 3.6.2).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MethodError {
    /// Machine-readable error type, e.g. `unknownMethod`.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable description, when supplied.
    pub description: Option<String>,
}

impl std::fmt::Display for MethodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{}: {description}", self.error_type),
            None => f.write_str(&self.error_type),
        }
    }
}

impl std::error::Error for MethodError {}

/// A decoded method result, tagged by the response's method name.
///
/// Method names this crate does not model decode to
/// [`MethodResult::Unknown`] with the raw arguments preserved.
#[derive(Debug)]
pub enum MethodResult {
    /// `Email/set`.
    EmailSet(email::SetResponse),
    /// `Email/get`.
    EmailGet(email::GetResponse),
    /// `Email/query`.
    EmailQuery(email::QueryResponse),
    /// `Mailbox/get`.
    MailboxGet(mailbox::GetResponse),
    /// `Thread/get`.
    ThreadGet(thread::GetResponse),
    /// `SearchSnippet/get`.
    SnippetGet(snippet::GetResponse),
    /// `SieveScript/get`.
    SieveGet(sieve::GetResponse),
    /// `SieveScript/set`.
    SieveSet(sieve::SetResponse),
    /// `SieveScript/validate`.
    SieveValidate(sieve::ValidateResponse),
    /// `error`: the whole invocation failed.
    Error(MethodError),
    /// Any method name this crate does not model.
    Unknown(serde_json::Value),
}

impl MethodResult {
    fn decode(name: &str, args: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match name {
            "Email/set" => Self::EmailSet(serde_json::from_value(args)?),
            "Email/get" => Self::EmailGet(serde_json::from_value(args)?),
            "Email/query" => Self::EmailQuery(serde_json::from_value(args)?),
            "Mailbox/get" => Self::MailboxGet(serde_json::from_value(args)?),
            "Thread/get" => Self::ThreadGet(serde_json::from_value(args)?),
            "SearchSnippet/get" => Self::SnippetGet(serde_json::from_value(args)?),
            "SieveScript/get" => Self::SieveGet(serde_json::from_value(args)?),
            "SieveScript/set" => Self::SieveSet(serde_json::from_value(args)?),
            "SieveScript/validate" => Self::SieveValidate(serde_json::from_value(args)?),
            "error" => Self::Error(serde_json::from_value(args)?),
            _ => Self::Unknown(args),
        })
    }

    /// Returns the method error when this result is one.
    #[must_use]
    pub fn as_error(&self) -> Option<&MethodError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Response {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Envelope {
            method_responses: Vec<RawCall>,
            #[serde(default)]
            session_state: String,
        }

        struct RawCall(CallResponse);

        impl<'de> Deserialize<'de> for RawCall {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct TripleVisitor;

                impl<'de> Visitor<'de> for TripleVisitor {
                    type Value = RawCall;

                    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                        f.write_str("a [name, arguments, callId] triple")
                    }

                    fn visit_seq<A: SeqAccess<'de>>(
                        self,
                        mut seq: A,
                    ) -> Result<Self::Value, A::Error> {
                        let name: String = seq
                            .next_element()?
                            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                        let args: serde_json::Value = seq
                            .next_element()?
                            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                        let call_id: String = seq
                            .next_element()?
                            .ok_or_else(|| de::Error::invalid_length(2, &self))?;
                        let result =
                            MethodResult::decode(&name, args).map_err(de::Error::custom)?;
                        Ok(RawCall(CallResponse {
                            name,
                            call_id,
                            result,
                        }))
                    }
                }

                deserializer.deserialize_seq(TripleVisitor)
            }
        }

        let envelope = Envelope::deserialize(deserializer)?;
        Ok(Self {
            calls: envelope
                .method_responses
                .into_iter()
                .map(|raw| raw.0)
                .collect(),
            session_state: envelope.session_state,
        })
    }
}
