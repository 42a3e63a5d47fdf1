//! Shared test support: a scripted fake transport.

// Each integration test binary uses a different subset of the fake.
#![allow(dead_code)]

use async_trait::async_trait;
use pubsub_output::{PublishRequest, PublishResponse, PublishTransport, TransportError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Route adapter logs through the test writer. Safe to call from every
/// test; only the first call installs the subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Scripted transport: pops one outcome per publish call and records
/// every request it sees. Once the script runs out, publishes succeed
/// with an empty response.
pub struct FakeTransport {
    outcomes: Mutex<VecDeque<Result<PublishResponse, TransportError>>>,
    requests: Mutex<Vec<(String, String)>>,
    publish_calls: AtomicU64,
    refresh_calls: AtomicU64,
    fail_refresh: bool,
}

impl FakeTransport {
    pub fn new(outcomes: Vec<Result<PublishResponse, TransportError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
            publish_calls: AtomicU64::new(0),
            refresh_calls: AtomicU64::new(0),
            fail_refresh: false,
        }
    }

    /// A fake whose token refresh itself fails
    pub fn with_failing_refresh(outcomes: Vec<Result<PublishResponse, TransportError>>) -> Self {
        Self {
            fail_refresh: true,
            ..Self::new(outcomes)
        }
    }

    pub fn publish_calls(&self) -> u64 {
        self.publish_calls.load(Ordering::Relaxed)
    }

    pub fn refresh_calls(&self) -> u64 {
        self.refresh_calls.load(Ordering::Relaxed)
    }

    /// Recorded (topic, data) pairs, one per publish call
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn accepted(ids: &[&str]) -> Result<PublishResponse, TransportError> {
        Ok(PublishResponse {
            message_ids: ids.iter().map(|id| id.to_string()).collect(),
        })
    }
}

#[async_trait]
impl PublishTransport for FakeTransport {
    async fn publish(
        &self,
        topic: &str,
        request: &PublishRequest,
    ) -> Result<PublishResponse, TransportError> {
        self.publish_calls.fetch_add(1, Ordering::Relaxed);
        assert_eq!(
            request.messages.len(),
            1,
            "adapter must publish exactly one message per call"
        );
        self.requests
            .lock()
            .unwrap()
            .push((topic.to_string(), request.messages[0].data.clone()));
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(PublishResponse::default()))
    }

    async fn refresh_token(&self) -> Result<(), TransportError> {
        self.refresh_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_refresh {
            Err(TransportError::AuthExpired(
                "refresh rejected by fake".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}
