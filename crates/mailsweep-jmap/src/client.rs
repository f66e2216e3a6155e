//! The JMAP client: session discovery, API exchanges, and blobs.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::blob::Upload;
use crate::error::{Error, Result};
use crate::id::Id;
use crate::request::Request;
use crate::response::Response;
use crate::session::Session;
use crate::transport;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// An authenticated JMAP client bound to one session.
#[derive(Debug)]
pub struct JmapClient {
    http: reqwest::Client,
    session: Session,
    cancel: CancellationToken,
}

impl JmapClient {
    /// Fetches the session object and builds a client from it.
    ///
    /// # Errors
    ///
    /// Returns an error when the token is malformed, the session
    /// endpoint is unreachable, rejects the token, or returns a body
    /// that is not a session object.
    pub async fn connect(
        session_url: &str,
        token: &str,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::Session("bearer token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        debug!(url = session_url, "fetching JMAP session");
        let request = http.get(session_url).build()?;
        let response = transport::send_with_retry(&http, request, &cancel).await?;
        let response = check_status(response).await?;
        let session: Session = response.json().await?;
        if session.api_url.is_empty() {
            return Err(Error::Session(
                "session object has no apiUrl".to_string(),
            ));
        }

        Ok(Self {
            http,
            session,
            cancel,
        })
    }

    /// Returns the session this client was built from.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Sends a batch of method calls to the API endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error on serialization failure, transport failure,
    /// a non-success HTTP status, or an unparseable response body.
    /// Method-level errors do not fail the exchange; they surface as
    /// [`crate::MethodResult::Error`] entries in the response.
    pub async fn request(&self, request: &Request) -> Result<Response> {
        let http_request = self
            .http
            .post(&self.session.api_url)
            .json(request)
            .build()?;
        let response = transport::send_with_retry(&self.http, http_request, &self.cancel).await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Uploads a blob and returns the server's record of it.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn upload(
        &self,
        account_id: &Id,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<Upload> {
        let url = self
            .session
            .upload_url
            .replace("{accountId}", account_id.as_str());
        let http_request = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .build()?;
        let response = transport::send_with_retry(&self.http, http_request, &self.cancel).await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Downloads a blob's raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn download(&self, account_id: &Id, blob_id: &Id, name: &str) -> Result<Vec<u8>> {
        let url = self
            .session
            .download_url
            .replace("{accountId}", account_id.as_str())
            .replace("{blobId}", blob_id.as_str())
            .replace("{name}", name)
            .replace("{type}", "application/octet-stream");
        let http_request = self.http.get(url).build()?;
        let response = transport::send_with_retry(&self.http, http_request, &self.cancel).await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail: String = body.trim().chars().take(512).collect();
    Err(Error::Api { status, detail })
}
