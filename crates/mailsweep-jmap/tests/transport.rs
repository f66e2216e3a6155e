//! Integration tests for the retrying transport against a mock server.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mailsweep_jmap::transport::{send_with_retry, MAX_RETRIES};
use mailsweep_jmap::Error;

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn transient_failure_retries_with_identical_body() {
    let server = MockServer::start().await;

    // Two rate-limit responses, then success. Retry-After: 0 keeps the
    // test fast while still exercising the header path.
    Mock::given(method("POST"))
        .and(path("/api"))
        .and(body_string("payload"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api"))
        .and(body_string("payload"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let http = client();
    let request = http
        .post(format!("{}/api", server.uri()))
        .body("payload")
        .build()
        .unwrap();

    let response = send_with_retry(&http, request, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn exhausted_budget_reports_last_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(503).insert_header("Retry-After", "0"))
        .expect(u64::from(MAX_RETRIES) + 1)
        .mount(&server)
        .await;

    let http = client();
    let request = http.get(format!("{}/api", server.uri())).build().unwrap();

    let err = send_with_retry(&http, request, &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        Error::RetriesExhausted { status } => assert_eq!(status, 503),
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn streaming_body_is_sent_once_and_never_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(503).insert_header("Retry-After", "0"))
        .expect(1)
        .mount(&server)
        .await;

    let http = client();
    let stream =
        futures_util::stream::once(async { Ok::<_, std::io::Error>("one-shot") });
    let request = http
        .post(format!("{}/api", server.uri()))
        .body(reqwest::Body::wrap_stream(stream))
        .build()
        .unwrap();

    let err = send_with_retry(&http, request, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NonReplayableBody), "got {err:?}");
}

#[tokio::test]
async fn non_transient_error_is_returned_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let http = client();
    let request = http.get(format!("{}/api", server.uri())).build().unwrap();

    let response = send_with_retry(&http, request, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn cancellation_during_backoff_stops_retrying() {
    let server = MockServer::start().await;

    // A long Retry-After so the backoff wait is clearly in progress
    // when the token fires.
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(503).insert_header("Retry-After", "30"))
        .expect(1)
        .mount(&server)
        .await;

    let http = client();
    let request = http.get(format!("{}/api", server.uri())).build().unwrap();

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = send_with_retry(&http, request, &cancel).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled), "got {err:?}");
}
