//! The core client: an account-bound handle over a JMAP exchange.

use tokio::sync::OnceCell;

use mailsweep_jmap::blob::Upload;
use mailsweep_jmap::methods::{email, mailbox, sieve, snippet, thread};
use mailsweep_jmap::{Id, JmapClient, MethodResult, Request, Response, Session};

use crate::error::{Error, Result};
use crate::types::SessionInfo;

/// Batch size used when the server does not advertise
/// `maxObjectsInSet`.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// One JMAP exchange: a request in, a response out, plus blobs.
///
/// [`JmapClient`] is the production implementation; tests substitute a
/// scripted one.
pub trait Exchange: Send + Sync {
    /// The session this exchange is authenticated against.
    fn session(&self) -> &Session;

    /// Sends one batch of method calls.
    fn exchange(
        &self,
        request: &Request,
    ) -> impl Future<Output = mailsweep_jmap::Result<Response>> + Send;

    /// Uploads a blob.
    fn upload(
        &self,
        account_id: &Id,
        content_type: &str,
        body: Vec<u8>,
    ) -> impl Future<Output = mailsweep_jmap::Result<Upload>> + Send;

    /// Downloads a blob's raw bytes.
    fn download(
        &self,
        account_id: &Id,
        blob_id: &Id,
        name: &str,
    ) -> impl Future<Output = mailsweep_jmap::Result<Vec<u8>>> + Send;
}

impl Exchange for JmapClient {
    fn session(&self) -> &Session {
        self.session()
    }

    async fn exchange(&self, request: &Request) -> mailsweep_jmap::Result<Response> {
        self.request(request).await
    }

    async fn upload(
        &self,
        account_id: &Id,
        content_type: &str,
        body: Vec<u8>,
    ) -> mailsweep_jmap::Result<Upload> {
        self.upload(account_id, content_type, body).await
    }

    async fn download(
        &self,
        account_id: &Id,
        blob_id: &Id,
        name: &str,
    ) -> mailsweep_jmap::Result<Vec<u8>> {
        self.download(account_id, blob_id, name).await
    }
}

/// A client bound to the session's primary mail account.
#[derive(Debug)]
pub struct Client<X> {
    exchange: X,
    account_id: Id,
    pub(crate) mailboxes: OnceCell<Vec<mailbox::Mailbox>>,
}

impl<X: Exchange> Client<X> {
    /// Binds a client to the exchange's primary mail account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMailAccount`] when the session does not
    /// expose one.
    pub fn new(exchange: X) -> Result<Self> {
        let account_id = exchange
            .session()
            .primary_mail_account()
            .cloned()
            .ok_or(Error::NoMailAccount)?;
        Ok(Self {
            exchange,
            account_id,
            mailboxes: OnceCell::new(),
        })
    }

    /// The account all operations target.
    #[must_use]
    pub fn account_id(&self) -> &Id {
        &self.account_id
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &Session {
        self.exchange.session()
    }

    /// The largest number of objects one `/set` call may target,
    /// falling back to [`DEFAULT_BATCH_SIZE`] when the server does not
    /// say.
    #[must_use]
    pub fn max_batch_size(&self) -> usize {
        self.session()
            .max_objects_in_set()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(DEFAULT_BATCH_SIZE)
    }

    /// A displayable description of the session.
    #[must_use]
    pub fn session_info(&self) -> SessionInfo {
        let session = self.session();
        SessionInfo {
            username: session.username.clone(),
            api_url: session.api_url.clone(),
            account_id: self.account_id.to_string(),
            capabilities: session.capability_uris(),
            max_objects_in_set: session.max_objects_in_set(),
        }
    }

    #[cfg(test)]
    pub(crate) fn exchange_ref(&self) -> &X {
        &self.exchange
    }

    pub(crate) async fn send(&self, request: &Request) -> Result<Response> {
        Ok(self.exchange.exchange(request).await?)
    }

    pub(crate) async fn upload_blob(
        &self,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<Upload> {
        Ok(self
            .exchange
            .upload(&self.account_id, content_type, body)
            .await?)
    }

    pub(crate) async fn download_blob(&self, blob_id: &Id, name: &str) -> Result<Vec<u8>> {
        Ok(self
            .exchange
            .download(&self.account_id, blob_id, name)
            .await?)
    }
}

fn take_result(response: Response, call_id: &str) -> Result<(String, MethodResult)> {
    for call in response.calls {
        if call.call_id != call_id {
            continue;
        }
        if let MethodResult::Error(err) = call.result {
            return Err(Error::Method {
                method: call.name,
                call_id: call.call_id,
                source: err,
            });
        }
        return Ok((call.name, call.result));
    }
    Err(Error::UnexpectedResponse {
        expected: "any",
        got: format!("no response for call {call_id}"),
    })
}

macro_rules! expect_result {
    ($fn_name:ident, $variant:ident, $ty:ty, $name:literal) => {
        pub(crate) fn $fn_name(response: Response, call_id: &str) -> Result<$ty> {
            match take_result(response, call_id)? {
                (_, MethodResult::$variant(result)) => Ok(result),
                (name, _) => Err(Error::UnexpectedResponse {
                    expected: $name,
                    got: name,
                }),
            }
        }
    };
}

expect_result!(expect_email_set, EmailSet, email::SetResponse, "Email/set");
expect_result!(expect_email_get, EmailGet, email::GetResponse, "Email/get");
expect_result!(
    expect_email_query,
    EmailQuery,
    email::QueryResponse,
    "Email/query"
);
expect_result!(
    expect_mailbox_get,
    MailboxGet,
    mailbox::GetResponse,
    "Mailbox/get"
);
expect_result!(
    expect_thread_get,
    ThreadGet,
    thread::GetResponse,
    "Thread/get"
);
expect_result!(
    expect_snippet_get,
    SnippetGet,
    snippet::GetResponse,
    "SearchSnippet/get"
);
expect_result!(expect_sieve_get, SieveGet, sieve::GetResponse, "SieveScript/get");
expect_result!(expect_sieve_set, SieveSet, sieve::SetResponse, "SieveScript/set");
expect_result!(
    expect_sieve_validate,
    SieveValidate,
    sieve::ValidateResponse,
    "SieveScript/validate"
);

/// Extracts two results from one multiplexed response, consuming it.
pub(crate) fn split_response(
    response: Response,
    first_id: &str,
    second_id: &str,
) -> (Response, Response) {
    let mut first = Response {
        calls: Vec::new(),
        session_state: response.session_state.clone(),
    };
    let mut second = Response {
        calls: Vec::new(),
        session_state: response.session_state,
    };
    for call in response.calls {
        if call.call_id == first_id {
            first.calls.push(call);
        } else if call.call_id == second_id {
            second.calls.push(call);
        }
    }
    (first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{session_with_batch_limit, MockExchange};

    #[test]
    fn binds_to_primary_mail_account() {
        let client = Client::new(MockExchange::new(session_with_batch_limit(Some(10)))).unwrap();
        assert_eq!(client.account_id(), &Id::new("a1"));
    }

    #[test]
    fn missing_mail_account_is_an_error() {
        let err = Client::new(MockExchange::new(Session::default())).unwrap_err();
        assert!(matches!(err, Error::NoMailAccount));
    }

    #[test]
    fn batch_size_from_capability() {
        let client = Client::new(MockExchange::new(session_with_batch_limit(Some(10)))).unwrap();
        assert_eq!(client.max_batch_size(), 10);
    }

    #[test]
    fn batch_size_defaults_when_unadvertised() {
        let client = Client::new(MockExchange::new(session_with_batch_limit(None))).unwrap();
        assert_eq!(client.max_batch_size(), DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn method_error_carries_call_context() {
        let response: Response = serde_json::from_value(serde_json::json!({
            "methodResponses": [["error", {"type": "serverFail"}, "c0"]]
        }))
        .unwrap();
        let err = expect_email_set(response, "c0").unwrap_err();
        match err {
            Error::Method { method, call_id, source } => {
                assert_eq!(method, "error");
                assert_eq!(call_id, "c0");
                assert_eq!(source.error_type, "serverFail");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wrong_result_type_is_rejected() {
        let response: Response = serde_json::from_value(serde_json::json!({
            "methodResponses": [["Email/query", {"accountId": "a1", "ids": []}, "c0"]]
        }))
        .unwrap();
        let err = expect_email_set(response, "c0").unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse { expected: "Email/set", .. }));
    }
}
