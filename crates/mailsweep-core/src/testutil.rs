//! Scripted [`Exchange`] implementation for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use mailsweep_jmap::blob::Upload;
use mailsweep_jmap::{Id, Request, Response, Session};

use crate::client::Exchange;

/// Builds a session with one primary mail account and an optional
/// `maxObjectsInSet` limit.
pub(crate) fn session_with_batch_limit(limit: Option<u64>) -> Session {
    let core = limit.map_or_else(
        || serde_json::json!({}),
        |n| serde_json::json!({"maxObjectsInSet": n}),
    );
    serde_json::from_value(serde_json::json!({
        "username": "user@example.com",
        "apiUrl": "https://api.example.com/jmap/api/",
        "uploadUrl": "https://api.example.com/upload/{accountId}/",
        "downloadUrl": "https://api.example.com/download/{accountId}/{blobId}/{name}",
        "accounts": {"a1": {"name": "user@example.com", "isPersonal": true}},
        "primaryAccounts": {"urn:ietf:params:jmap:mail": "a1"},
        "capabilities": {
            "urn:ietf:params:jmap:core": core,
            "urn:ietf:params:jmap:mail": {},
            "urn:ietf:params:jmap:sieve": {}
        },
        "state": "s0"
    }))
    .unwrap()
}

/// Builds a session whose server advertises no sieve capability.
pub(crate) fn session_without_sieve() -> Session {
    serde_json::from_value(serde_json::json!({
        "username": "user@example.com",
        "apiUrl": "https://api.example.com/jmap/api/",
        "accounts": {"a1": {"name": "user@example.com", "isPersonal": true}},
        "primaryAccounts": {"urn:ietf:params:jmap:mail": "a1"},
        "capabilities": {
            "urn:ietf:params:jmap:core": {"maxObjectsInSet": 50},
            "urn:ietf:params:jmap:mail": {}
        },
        "state": "s0"
    }))
    .unwrap()
}

/// An exchange that replays scripted responses and records every
/// request it sees as serialized JSON.
#[derive(Debug)]
pub(crate) struct MockExchange {
    session: Session,
    responses: Mutex<VecDeque<mailsweep_jmap::Result<Response>>>,
    uploads: Mutex<VecDeque<mailsweep_jmap::Result<Upload>>>,
    downloads: Mutex<VecDeque<mailsweep_jmap::Result<Vec<u8>>>>,
    requests: Mutex<Vec<serde_json::Value>>,
}

impl MockExchange {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            session,
            responses: Mutex::new(VecDeque::new()),
            uploads: Mutex::new(VecDeque::new()),
            downloads: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues a response parsed from a JSON envelope.
    pub(crate) fn respond(&self, body: serde_json::Value) {
        let response: Response = serde_json::from_value(body).unwrap();
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queues a transport-level failure.
    pub(crate) fn respond_err(&self, err: mailsweep_jmap::Error) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    /// Queues a successful blob upload.
    pub(crate) fn upload_ok(&self, blob_id: &str, content_type: &str, size: u64) {
        let upload: Upload = serde_json::from_value(serde_json::json!({
            "accountId": "a1",
            "blobId": blob_id,
            "type": content_type,
            "size": size,
        }))
        .unwrap();
        self.uploads.lock().unwrap().push_back(Ok(upload));
    }

    /// Queues a successful blob download.
    pub(crate) fn download_ok(&self, body: &[u8]) {
        self.downloads.lock().unwrap().push_back(Ok(body.to_vec()));
    }

    /// Every request envelope sent so far, in order.
    pub(crate) fn sent(&self) -> Vec<serde_json::Value> {
        self.requests.lock().unwrap().clone()
    }
}

impl Exchange for MockExchange {
    fn session(&self) -> &Session {
        &self.session
    }

    async fn exchange(&self, request: &Request) -> mailsweep_jmap::Result<Response> {
        self.requests
            .lock()
            .unwrap()
            .push(serde_json::to_value(request).unwrap());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left")
    }

    async fn upload(
        &self,
        _account_id: &Id,
        _content_type: &str,
        _body: Vec<u8>,
    ) -> mailsweep_jmap::Result<Upload> {
        self.uploads
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted upload left")
    }

    async fn download(
        &self,
        _account_id: &Id,
        _blob_id: &Id,
        _name: &str,
    ) -> mailsweep_jmap::Result<Vec<u8>> {
        self.downloads
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted download left")
    }
}
