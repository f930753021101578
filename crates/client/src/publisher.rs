//! Ordered, single-flight outbound publishing.
//!
//! `submit` only enqueues; transmission happens on spawned continuations
//! with at most one HTTP call in flight per publisher. Completion of one
//! send re-triggers the drain, so envelopes leave in submission order
//! without a dedicated worker thread.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use gamebus_domain::{Envelope, GameEvent, SCHEMA_NAMESPACE, VERSION_PROPERTY};

use crate::codec::EnvelopeCodec;
use crate::config::BusConfig;
use crate::error::ClientError;
use crate::sas::SasTokenProvider;
use crate::sync::lock;
use crate::transport::MessageTransport;

type SuccessCallback = Box<dyn Fn(String) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(ClientError) + Send + Sync>;

/// Publishes game events to bus topics through an ordered FIFO queue.
///
/// Cloning is cheap and shares the queue, counters, and callbacks; all
/// clones drain the same queue under the same single-flight discipline.
/// `submit` must be called from within a tokio runtime.
pub struct Publisher {
    config: Arc<BusConfig>,
    tokens: Arc<SasTokenProvider>,
    codec: Arc<EnvelopeCodec>,
    transport: Arc<dyn MessageTransport>,
    /// Process-lifetime random id shared by every envelope this publisher
    /// sends; receivers use it to group related events.
    correlation_id: String,
    packet_counter: Arc<AtomicU64>,
    queue: Arc<Mutex<VecDeque<Envelope>>>,
    in_flight: Arc<AtomicBool>,
    on_success: Arc<Mutex<Option<SuccessCallback>>>,
    on_error: Arc<Mutex<Option<ErrorCallback>>>,
}

impl Publisher {
    pub fn new(
        config: Arc<BusConfig>,
        tokens: Arc<SasTokenProvider>,
        codec: Arc<EnvelopeCodec>,
        transport: Arc<dyn MessageTransport>,
    ) -> Self {
        Self {
            config,
            tokens,
            codec,
            transport,
            correlation_id: Uuid::new_v4().simple().to_string(),
            packet_counter: Arc::new(AtomicU64::new(0)),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            in_flight: Arc::new(AtomicBool::new(false)),
            on_success: Arc::new(Mutex::new(None)),
            on_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Called with the raw response body after each acknowledged publish.
    pub fn set_on_publish_succeeded<F>(&self, callback: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        *lock(&self.on_success) = Some(Box::new(callback));
    }

    /// Called when construction, signing, or transmission of an envelope
    /// fails. Failed envelopes are dropped, not retried.
    pub fn set_on_publish_failed<F>(&self, callback: F)
    where
        F: Fn(ClientError) + Send + Sync + 'static,
    {
        *lock(&self.on_error) = Some(Box::new(callback));
    }

    /// Queue one event for publication to `topic`.
    ///
    /// Returns `true` when the envelope was accepted into the local queue.
    /// This is NOT a delivery acknowledgment: the outcome of the actual
    /// HTTP call arrives later through the success/error callbacks.
    pub fn submit(
        &self,
        topic: &str,
        event_id: i32,
        event: &GameEvent,
        extra_properties: Option<&[(String, String)]>,
    ) -> bool {
        if topic.is_empty() {
            self.report_error(ClientError::configuration("topic must not be empty"));
            return false;
        }

        let content = match self.codec.encode(event) {
            Ok(content) => content,
            Err(e) => {
                self.report_error(e);
                return false;
            }
        };

        let mut properties: HashMap<String, String> = extra_properties
            .map(|pairs| pairs.iter().cloned().collect())
            .unwrap_or_default();
        properties.insert(VERSION_PROPERTY.to_string(), SCHEMA_NAMESPACE.to_string());

        {
            let mut queue = lock(&self.queue);
            let envelope = Envelope {
                queue: topic.to_string(),
                game_id: self.config.game_id,
                player_id: self.config.player_id.clone(),
                correlation_id: self.correlation_id.clone(),
                packet_number: self.packet_counter.fetch_add(1, Ordering::SeqCst),
                event_id,
                created_at_utc: Utc::now(),
                content,
                properties,
            };
            queue.push_back(envelope);
        }

        self.process_queue();
        true
    }

    /// Number of envelopes waiting to be sent (excludes the one in flight).
    pub fn pending_count(&self) -> usize {
        lock(&self.queue).len()
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Kick the drain. Re-entrant-safe: when a send is already in flight
    /// this is a no-op, and the completing send re-triggers the drain.
    fn process_queue(&self) {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let next = lock(&self.queue).pop_front();
        let Some(envelope) = next else {
            self.in_flight.store(false, Ordering::SeqCst);
            // a submit may have slipped in between the pop and the reset
            if !lock(&self.queue).is_empty() {
                self.process_queue();
            }
            return;
        };

        let this = self.clone();
        tokio::spawn(async move {
            this.send_envelope(envelope).await;
            this.in_flight.store(false, Ordering::SeqCst);
            if !lock(&this.queue).is_empty() {
                this.process_queue();
            }
        });
    }

    /// One delivery attempt. Failures are reported and the envelope is
    /// dropped: at most one attempt per envelope.
    async fn send_envelope(&self, envelope: Envelope) {
        let packet_number = envelope.packet_number;

        let token = match self.tokens.token() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(packet_number, error = %e, "token derivation failed");
                self.report_error(e);
                return;
            }
        };

        let body = match self.codec.encode_envelope(&envelope) {
            Ok(body) => body,
            Err(e) => {
                self.report_error(e);
                return;
            }
        };

        let url = self.config.messages_url(&envelope.queue);
        match self.transport.post_message(&url, token.value(), body).await {
            Ok(response) => {
                tracing::debug!(packet_number, topic = %envelope.queue, "publish acknowledged");
                self.report_success(response);
            }
            Err(e) => {
                tracing::warn!(packet_number, error = %e, "publish failed, envelope dropped");
                self.report_error(e);
            }
        }
    }

    fn report_success(&self, response: String) {
        if let Some(callback) = lock(&self.on_success).as_ref() {
            callback(response);
        }
    }

    fn report_error(&self, error: ClientError) {
        if let Some(callback) = lock(&self.on_error).as_ref() {
            callback(error);
        }
    }
}

impl Clone for Publisher {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            tokens: Arc::clone(&self.tokens),
            codec: Arc::clone(&self.codec),
            transport: Arc::clone(&self.transport),
            correlation_id: self.correlation_id.clone(),
            packet_counter: Arc::clone(&self.packet_counter),
            queue: Arc::clone(&self.queue),
            in_flight: Arc::clone(&self.in_flight),
            on_success: Arc::clone(&self.on_success),
            on_error: Arc::clone(&self.on_error),
        }
    }
}
