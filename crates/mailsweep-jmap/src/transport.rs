//! Retrying HTTP transport.
//!
//! Wraps one outbound exchange with bounded retry on transient server
//! failure (429 and 503). Every retry resends an exact copy of the
//! original request body; requests whose body cannot be replayed fail
//! with a distinct error instead of retrying with a corrupted body.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Request, Response, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};

/// Number of retries after the initial attempt (4 attempts total).
pub const MAX_RETRIES: u32 = 3;

/// Executes a request, retrying transient failures.
///
/// Retries up to [`MAX_RETRIES`] times on 429 and 503 responses,
/// waiting per [`retry_delay`] between attempts. Network-level errors
/// are not retried. The cancellation token aborts an in-progress
/// backoff wait immediately with [`Error::Cancelled`]; no further
/// attempt is issued after cancellation.
pub async fn send_with_retry(
    client: &Client,
    request: Request,
    cancel: &CancellationToken,
) -> Result<Response> {
    let mut current = request;

    for attempt in 0..=MAX_RETRIES {
        // Clone up front so the original body can be resent verbatim.
        // Streaming bodies cannot be cloned; `replay` stays None and a
        // transient response below becomes a hard error.
        let replay = current.try_clone();

        debug!(attempt, url = %current.url(), "sending HTTP request");
        let response = client.execute(current).await?;
        let status = response.status();

        if !is_transient(status) {
            return Ok(response);
        }

        if attempt == MAX_RETRIES {
            drain(response).await;
            return Err(Error::RetriesExhausted { status });
        }

        let Some(next) = replay else {
            drain(response).await;
            return Err(Error::NonReplayableBody);
        };

        let delay = retry_delay(response.headers(), attempt);
        debug!(attempt, %status, ?delay, "transient failure, retrying");
        drain(response).await;
        wait_or_cancelled(delay, cancel).await?;
        current = next;
    }

    unreachable!("retry loop returns on every path");
}

/// Returns true for statuses that warrant an automatic retry.
#[must_use]
pub fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE
}

/// Computes the delay before the next attempt.
///
/// Honors `Retry-After` as integer seconds, then as an HTTP date when
/// it resolves to a future instant. Zero, a past date, or anything
/// unparseable falls through to exponential backoff: 1s, 2s, 4s for
/// attempts 0, 1, 2.
#[must_use]
pub fn retry_delay(headers: &HeaderMap, attempt: u32) -> Duration {
    if let Some(value) = headers.get(RETRY_AFTER).and_then(|v| v.to_str().ok()) {
        let value = value.trim();
        if let Ok(seconds) = value.parse::<u64>() {
            if seconds > 0 {
                return Duration::from_secs(seconds);
            }
        } else if let Ok(when) = DateTime::parse_from_rfc2822(value) {
            let until = when.signed_duration_since(Utc::now());
            if let Ok(delay) = until.to_std() {
                if delay > Duration::ZERO {
                    return delay;
                }
            }
        }
    }
    Duration::from_secs(1u64 << attempt.min(16))
}

/// Fully consumes a discarded response body so the connection can be
/// reused.
async fn drain(response: Response) {
    let _ = response.bytes().await;
}

async fn wait_or_cancelled(delay: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        () = cancel.cancelled() => Err(Error::Cancelled),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}
