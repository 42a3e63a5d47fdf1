//! Publish lifecycle and retry behavior
//!
//! Startup failure modes, the two transient retry conditions, terminal
//! failures (logged and dropped, never surfaced), and retry exhaustion,
//! all driven through the public lifecycle against a scripted transport.

mod common;

use common::FakeTransport;
use pubsub_output::{
    LogEvent, PubsubConfig, PubsubOutput, PubsubOutputError, TransportError,
};
use serde_json::json;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

fn test_event() -> LogEvent {
    json!({"message": "hi", "@version": "1"})
        .as_object()
        .unwrap()
        .clone()
}

fn fast_config() -> PubsubConfig {
    let mut config = PubsubConfig::new("premium-poc", "logs");
    config.retry_backoff = Duration::from_millis(1);
    config
}

fn started(config: PubsubConfig, fake: &Arc<FakeTransport>) -> PubsubOutput {
    common::init_tracing();
    let mut output = PubsubOutput::new(config).unwrap();
    output.start_with_transport(fake.clone());
    output
}

#[tokio::test]
async fn auth_expiry_refreshes_once_and_retries() {
    let fake = Arc::new(FakeTransport::new(vec![
        Err(TransportError::AuthExpired("token expired".to_string())),
        FakeTransport::accepted(&["19916711285"]),
    ]));
    let output = started(fast_config(), &fake);

    output.send(&test_event()).await.unwrap();

    assert_eq!(fake.publish_calls(), 2, "one failed attempt plus one retry");
    assert_eq!(fake.refresh_calls(), 1, "exactly one token refresh");

    let publisher = output.publisher().unwrap();
    assert_eq!(publisher.messages_published(), 1);
    assert_eq!(publisher.token_refreshes(), 1);
    assert_eq!(publisher.publish_failures(), 0);
}

#[tokio::test]
async fn timeout_retries_until_success() {
    let fake = Arc::new(FakeTransport::new(vec![
        Err(TransportError::Timeout),
        Err(TransportError::Timeout),
        FakeTransport::accepted(&["1"]),
    ]));
    let output = started(fast_config(), &fake);

    output.send(&test_event()).await.unwrap();

    assert_eq!(fake.publish_calls(), 3);
    assert_eq!(fake.refresh_calls(), 0, "timeouts must not touch the token");
    assert_eq!(output.publisher().unwrap().messages_published(), 1);
}

#[tokio::test]
async fn server_rejection_is_dropped_after_one_attempt() {
    let fake = Arc::new(FakeTransport::new(vec![Err(TransportError::Status {
        code: 404,
        message: "Topic not found".to_string(),
    })]));
    let output = started(fast_config(), &fake);

    // Logged and dropped: send still returns Ok
    output.send(&test_event()).await.unwrap();

    assert_eq!(fake.publish_calls(), 1, "status errors are never retried");
    assert_eq!(fake.refresh_calls(), 0);

    let publisher = output.publisher().unwrap();
    assert_eq!(publisher.publish_failures(), 1);
    assert_eq!(publisher.messages_published(), 0);
}

#[tokio::test]
async fn retries_are_bounded() {
    let mut config = fast_config();
    config.max_retries = 2;

    let fake = Arc::new(FakeTransport::new(vec![
        Err(TransportError::Timeout),
        Err(TransportError::Timeout),
        Err(TransportError::Timeout),
        Err(TransportError::Timeout),
    ]));
    let output = started(config, &fake);

    output.send(&test_event()).await.unwrap();

    assert_eq!(fake.publish_calls(), 3, "first attempt plus max_retries");
    assert_eq!(output.publisher().unwrap().publish_failures(), 1);
}

#[tokio::test]
async fn failed_token_refresh_drops_the_event() {
    let fake = Arc::new(FakeTransport::with_failing_refresh(vec![Err(
        TransportError::AuthExpired("token expired".to_string()),
    )]));
    let output = started(fast_config(), &fake);

    output.send(&test_event()).await.unwrap();

    assert_eq!(fake.publish_calls(), 1);
    assert_eq!(fake.refresh_calls(), 1);

    let publisher = output.publisher().unwrap();
    assert_eq!(publisher.publish_failures(), 1);
    assert_eq!(publisher.token_refreshes(), 0);
}

#[tokio::test]
async fn payload_errors_propagate_without_publishing() {
    let mut config = fast_config();
    config.include_field = Some("absent".to_string());

    let fake = Arc::new(FakeTransport::new(vec![]));
    let output = started(config, &fake);

    let err = output.send(&test_event()).await.unwrap_err();
    assert!(matches!(
        err,
        PubsubOutputError::MissingField { ref field } if field == "absent"
    ));
    assert_eq!(fake.publish_calls(), 0, "no publish for an unbuildable payload");
}

#[tokio::test]
async fn malformed_key_file_aborts_startup() {
    common::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("key.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(
        br#"{"type":"service_account","client_email":"svc@example.iam.gserviceaccount.com"}"#,
    )
    .unwrap();

    let mut config = fast_config();
    config.json_key_file = Some(path);

    let mut output = PubsubOutput::new(config).unwrap();
    let err = output.start().await.unwrap_err();

    assert!(matches!(err, PubsubOutputError::CredentialFormat { .. }));
    assert!(!output.is_started(), "adapter must not become ready");
}

#[tokio::test]
async fn stop_tears_down_the_publisher() {
    let fake = Arc::new(FakeTransport::new(vec![FakeTransport::accepted(&["1"])]));
    let mut output = started(fast_config(), &fake);

    output.send(&test_event()).await.unwrap();
    output.stop().await;

    assert!(!output.is_started());
    assert!(matches!(
        output.send(&test_event()).await,
        Err(PubsubOutputError::NotStarted)
    ));
}
