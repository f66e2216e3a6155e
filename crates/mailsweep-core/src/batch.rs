//! Capability-sized batching for bulk email updates.
//!
//! One logical operation over N emails becomes ceil(N / batch)
//! sequential `Email/set` calls, where batch is the server's
//! `maxObjectsInSet`. Every input id is accounted for exactly once in
//! the outcome, and a failed batch never prevents later batches from
//! running.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use mailsweep_jmap::methods::email::{Patch, Set};
use mailsweep_jmap::{Id, Request};

use crate::client::{expect_email_set, Client, Exchange};
use crate::error::Result;

/// Reason recorded for ids the server left out of both the updated
/// and not-updated maps.
const UNACCOUNTED: &str = "no status returned by server";

/// One failed id with the server's (or transport's) reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// The email that was not updated.
    pub id: Id,
    /// Why.
    pub reason: String,
}

/// The per-id outcome of a batched update.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    /// Ids the server confirmed as updated, in input order.
    pub updated: Vec<Id>,
    /// Ids that were not updated, with reasons, in input order.
    pub failed: Vec<Failure>,
}

impl BatchOutcome {
    /// True when every id succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of ids accounted for.
    #[must_use]
    pub fn total(&self) -> usize {
        self.updated.len() + self.failed.len()
    }
}

impl<X: Exchange> Client<X> {
    /// Applies one patch to every given email, in server-sized
    /// batches.
    ///
    /// # Errors
    ///
    /// Only request serialization can fail here; server rejections and
    /// transport failures are folded into the outcome per id.
    pub async fn batch_update_emails(&self, ids: &[Id], patch: &Patch) -> Result<BatchOutcome> {
        let batch_size = self.max_batch_size().max(1);
        let mut outcome = BatchOutcome::default();

        for chunk in ids.chunks(batch_size) {
            debug!(size = chunk.len(), "sending Email/set batch");
            let mut update = BTreeMap::new();
            for id in chunk {
                update.insert(id.clone(), patch.clone());
            }
            let mut req = Request::new();
            let call_id = req.invoke(&Set {
                account_id: self.account_id().clone(),
                update,
                ..Set::default()
            })?;

            let result = match self.send(&req).await {
                Ok(response) => expect_email_set(response, &call_id),
                Err(err) => Err(err),
            };
            let set = match result {
                Ok(set) => set,
                Err(err) => {
                    // The whole batch failed; record it and move on to
                    // the next one.
                    warn!(error = %err, size = chunk.len(), "batch failed");
                    let reason = err.to_string();
                    outcome.failed.extend(chunk.iter().map(|id| Failure {
                        id: id.clone(),
                        reason: reason.clone(),
                    }));
                    continue;
                }
            };

            for id in chunk {
                if set.updated.contains_key(id) {
                    outcome.updated.push(id.clone());
                } else if let Some(set_error) = set.not_updated.get(id) {
                    outcome.failed.push(Failure {
                        id: id.clone(),
                        reason: set_error.reason(),
                    });
                } else {
                    outcome.failed.push(Failure {
                        id: id.clone(),
                        reason: UNACCOUNTED.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{session_with_batch_limit, MockExchange};
    use serde_json::json;

    fn ids(n: usize) -> Vec<Id> {
        (0..n).map(|i| Id::new(format!("m{i}"))).collect()
    }

    fn set_response(updated: &[&str], not_updated: &[(&str, &str)]) -> serde_json::Value {
        let updated: serde_json::Map<String, serde_json::Value> = updated
            .iter()
            .map(|id| ((*id).to_string(), serde_json::Value::Null))
            .collect();
        let not_updated: serde_json::Map<String, serde_json::Value> = not_updated
            .iter()
            .map(|(id, reason)| ((*id).to_string(), json!({"type": "serverFail", "description": reason})))
            .collect();
        json!({
            "methodResponses": [["Email/set", {
                "accountId": "a1",
                "updated": updated,
                "notUpdated": not_updated
            }, "c0"]]
        })
    }

    #[tokio::test]
    async fn splits_into_capability_sized_batches() {
        let mock = MockExchange::new(session_with_batch_limit(Some(2)));
        mock.respond(set_response(&["m0", "m1"], &[]));
        mock.respond(set_response(&["m2", "m3"], &[]));
        mock.respond(set_response(&["m4"], &[]));
        let client = Client::new(mock).unwrap();

        let patch = Patch::new().set("keywords/$seen", true);
        let outcome = client.batch_update_emails(&ids(5), &patch).await.unwrap();

        assert_eq!(outcome.updated.len(), 5);
        assert!(outcome.is_complete());
        let sent = client.exchange_ref().sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(
            sent[0]["methodCalls"][0][1]["update"]
                .as_object()
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            sent[2]["methodCalls"][0][1]["update"]
                .as_object()
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn every_id_is_accounted_for_exactly_once() {
        let mock = MockExchange::new(session_with_batch_limit(Some(10)));
        // m0 updated, m1 rejected, m2 silently dropped by the server.
        mock.respond(set_response(&["m0"], &[("m1", "not yours")]));
        let client = Client::new(mock).unwrap();

        let patch = Patch::new().set("keywords/$seen", true);
        let outcome = client.batch_update_emails(&ids(3), &patch).await.unwrap();

        assert_eq!(outcome.total(), 3);
        assert_eq!(outcome.updated, vec![Id::new("m0")]);
        assert_eq!(outcome.failed[0].reason, "not yours");
        assert_eq!(outcome.failed[1].id, Id::new("m2"));
        assert_eq!(outcome.failed[1].reason, UNACCOUNTED);
    }

    #[tokio::test]
    async fn failed_batch_does_not_stop_later_batches() {
        let mock = MockExchange::new(session_with_batch_limit(Some(2)));
        mock.respond(json!({
            "methodResponses": [["error", {"type": "serverFail"}, "c0"]]
        }));
        mock.respond(set_response(&["m2"], &[]));
        let client = Client::new(mock).unwrap();

        let patch = Patch::new().set("keywords/$seen", true);
        let outcome = client.batch_update_emails(&ids(3), &patch).await.unwrap();

        assert_eq!(outcome.updated, vec![Id::new("m2")]);
        assert_eq!(outcome.failed.len(), 2);
        assert!(outcome.failed[0].reason.contains("serverFail"));
    }

    #[tokio::test]
    async fn transport_failure_fails_only_its_own_batch() {
        let mock = MockExchange::new(session_with_batch_limit(Some(2)));
        mock.respond_err(mailsweep_jmap::Error::RetriesExhausted {
            status: mailsweep_jmap::StatusCode::SERVICE_UNAVAILABLE,
        });
        mock.respond(set_response(&["m2"], &[]));
        let client = Client::new(mock).unwrap();

        let patch = Patch::new().set("keywords/$seen", true);
        let outcome = client.batch_update_emails(&ids(3), &patch).await.unwrap();

        assert_eq!(outcome.updated, vec![Id::new("m2")]);
        assert_eq!(outcome.failed.len(), 2);
        assert!(outcome.failed[0].reason.contains("max retries exceeded"));
        assert_eq!(client.exchange_ref().sent().len(), 2);
    }

    #[tokio::test]
    async fn empty_input_sends_nothing() {
        let mock = MockExchange::new(session_with_batch_limit(Some(2)));
        let client = Client::new(mock).unwrap();
        let patch = Patch::new().set("keywords/$seen", true);
        let outcome = client.batch_update_emails(&[], &patch).await.unwrap();
        assert_eq!(outcome.total(), 0);
        assert!(client.exchange_ref().sent().is_empty());
    }
}
