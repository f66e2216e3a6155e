//! # mailsweep-jmap
//!
//! A minimal JMAP client layer: session discovery (RFC 8620), the
//! request/response envelope with typed method results, a retrying HTTP
//! transport, and blob upload/download. Only the method families the
//! mailsweep CLI uses are modeled: `Email/*`, `Mailbox/get`,
//! `Thread/get`, `SearchSnippet/get`, and `SieveScript/*` (RFC 9661).
//!
//! One [`Request`] multiplexes several named method invocations; the
//! matching [`Response`] carries one tagged [`MethodResult`] per call,
//! correlated by call id. Results for method names this crate does not
//! recognize are preserved as [`MethodResult::Unknown`] rather than
//! silently dropped.
//!
//! ```ignore
//! use mailsweep_jmap::{JmapClient, Request};
//! use mailsweep_jmap::methods::mailbox;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> mailsweep_jmap::Result<()> {
//! let client = JmapClient::connect(
//!     "https://api.example.com/jmap/session",
//!     "token",
//!     CancellationToken::new(),
//! )
//! .await?;
//!
//! let account = client
//!     .session()
//!     .primary_mail_account()
//!     .cloned()
//!     .ok_or_else(|| mailsweep_jmap::Error::Session("no mail account".into()))?;
//!
//! let mut req = Request::new();
//! req.invoke(&mailbox::Get { account_id: account, ids: None })?;
//! let resp = client.request(&req).await?;
//! # Ok(())
//! # }
//! ```

pub mod blob;
mod client;
mod error;
mod id;
pub mod methods;
mod request;
mod response;
mod session;
pub mod transport;

pub use client::JmapClient;
pub use reqwest::StatusCode;
pub use error::{Error, Result};
pub use id::Id;
pub use request::{Method, Request, ResultReference};
pub use response::{CallResponse, MethodError, MethodResult, Response};
pub use session::{Account, Capabilities, CoreCapability, Session};

/// Capability URI for the JMAP core protocol (RFC 8620).
pub const CORE_URI: &str = "urn:ietf:params:jmap:core";

/// Capability URI for JMAP mail (RFC 8621).
pub const MAIL_URI: &str = "urn:ietf:params:jmap:mail";

/// Capability URI for JMAP sieve script management (RFC 9661).
pub const SIEVE_URI: &str = "urn:ietf:params:jmap:sieve";
