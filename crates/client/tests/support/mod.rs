//! Shared fixtures for integration tests.

// not every test binary uses every fixture
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use gamebus_client::{BusConfig, ClientError, EncryptionMode, MessageTransport, SerializationMode};

pub fn test_config() -> BusConfig {
    BusConfig {
        service_namespace: "contoso".to_string(),
        key_name: "owner".to_string(),
        key_secret: "super-secret".to_string(),
        game_id: 7,
        player_id: "player-1".to_string(),
        serialization: SerializationMode::Tagged,
        encryption: EncryptionMode::Off,
    }
}

/// A transport fake that records calls, detects overlapping requests, and
/// serves scripted pop responses.
#[derive(Default)]
pub struct RecordingTransport {
    /// (url, body) per post, in arrival order.
    pub posts: Mutex<Vec<(String, String)>>,
    pub pop_count: AtomicUsize,
    in_call: AtomicBool,
    /// Set when two requests were ever in flight at once.
    pub overlap_detected: AtomicBool,
    pub fail_posts: AtomicBool,
    pop_script: Mutex<VecDeque<Result<Option<String>, ClientError>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_pop(&self, response: Result<Option<String>, ClientError>) {
        self.pop_script
            .lock()
            .expect("script lock")
            .push_back(response);
    }

    /// Whether a request is in flight right now.
    pub fn busy(&self) -> bool {
        self.in_call.load(Ordering::SeqCst)
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().expect("posts lock").len()
    }

    pub fn posted_bodies(&self) -> Vec<String> {
        self.posts
            .lock()
            .expect("posts lock")
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }

    async fn guarded<T>(&self, work: impl std::future::Future<Output = T>) -> T {
        if self.in_call.swap(true, Ordering::SeqCst) {
            self.overlap_detected.store(true, Ordering::SeqCst);
        }
        // hold the request open long enough for overlaps to be observable
        tokio::time::sleep(Duration::from_millis(10)).await;
        let result = work.await;
        self.in_call.store(false, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn post_message(
        &self,
        url: &str,
        _token: &str,
        body: String,
    ) -> Result<String, ClientError> {
        self.guarded(async {
            self.posts
                .lock()
                .expect("posts lock")
                .push((url.to_string(), body));
            if self.fail_posts.load(Ordering::SeqCst) {
                Err(ClientError::http(500, "internal server error"))
            } else {
                Ok("accepted".to_string())
            }
        })
        .await
    }

    async fn pop_message(&self, _url: &str, _token: &str) -> Result<Option<String>, ClientError> {
        self.guarded(async {
            self.pop_count.fetch_add(1, Ordering::SeqCst);
            self.pop_script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or(Ok(None))
        })
        .await
    }
}

/// Poll until `condition` holds or the timeout elapses.
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within timeout"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
