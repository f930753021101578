//! Long-poll retrieval of events addressed to one player.
//!
//! A background task repeatedly pops the player's subscription head
//! endpoint; each response body is decoded as an envelope and raised
//! through the received callback. Stopping is cooperative via a
//! cancellation token honored at the top of each iteration, with the
//! transport timeout bounding how long an in-flight poll can linger.

use std::sync::{Arc, Mutex, RwLock};

use tokio_util::sync::CancellationToken;

use gamebus_domain::Envelope;

use crate::codec::EnvelopeCodec;
use crate::config::BusConfig;
use crate::error::ClientError;
use crate::sas::SasTokenProvider;
use crate::sync::lock;
use crate::transport::MessageTransport;

/// Topic the relay republishes per-player events onto; the default
/// subscription target.
pub const PLAYER_EVENTS_TOPIC: &str = "PlayerEvents";

type ReceivedCallback = Box<dyn Fn(Envelope) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(ClientError) + Send + Sync>;

/// Observable listener lifecycle.
///
/// `Idle` between polls, `Polling` while a pop call is outstanding,
/// `Stopped` once the loop has observed cancellation and exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenerState {
    #[default]
    Idle,
    Polling,
    Stopped,
}

/// Pops a player's subscription in a cancellable background loop.
///
/// Cloning shares the loop state and callbacks.
pub struct Subscriber {
    config: Arc<BusConfig>,
    tokens: Arc<SasTokenProvider>,
    codec: Arc<EnvelopeCodec>,
    transport: Arc<dyn MessageTransport>,
    topic: String,
    state: Arc<RwLock<ListenerState>>,
    cancel: Arc<Mutex<Option<CancellationToken>>>,
    on_received: Arc<Mutex<Option<ReceivedCallback>>>,
    on_error: Arc<Mutex<Option<ErrorCallback>>>,
}

impl Subscriber {
    pub fn new(
        config: Arc<BusConfig>,
        tokens: Arc<SasTokenProvider>,
        codec: Arc<EnvelopeCodec>,
        transport: Arc<dyn MessageTransport>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            config,
            tokens,
            codec,
            transport,
            topic: topic.into(),
            state: Arc::new(RwLock::new(ListenerState::Idle)),
            cancel: Arc::new(Mutex::new(None)),
            on_received: Arc::new(Mutex::new(None)),
            on_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Called with each envelope popped from the subscription.
    pub fn set_on_envelope_received<F>(&self, callback: F)
    where
        F: Fn(Envelope) + Send + Sync + 'static,
    {
        *lock(&self.on_received) = Some(Box::new(callback));
    }

    /// Called on poll failures other than "not provisioned yet". The loop
    /// keeps running afterwards; it is expected to recover on a later
    /// iteration.
    pub fn set_on_listen_error<F>(&self, callback: F)
    where
        F: Fn(ClientError) + Send + Sync + 'static,
    {
        *lock(&self.on_error) = Some(Box::new(callback));
    }

    /// Start the background poll loop. A no-op when already listening.
    ///
    /// Requires a configured player id, since that names the subscription
    /// being popped.
    pub fn start_listening(&self) -> Result<(), ClientError> {
        if self.config.player_id.is_empty() {
            return Err(ClientError::configuration(
                "player id must be set before listening for events",
            ));
        }

        let cancel = {
            let mut slot = lock(&self.cancel);
            if slot.as_ref().is_some_and(|token| !token.is_cancelled()) {
                tracing::debug!(topic = %self.topic, "listener already running");
                return Ok(());
            }
            let token = CancellationToken::new();
            *slot = Some(token.clone());
            token
        };

        self.set_state(ListenerState::Idle);

        let this = self.clone();
        tokio::spawn(async move {
            tracing::info!(topic = %this.topic, player_id = %this.config.player_id, "listener started");
            loop {
                if cancel.is_cancelled() {
                    break;
                }
                this.set_state(ListenerState::Polling);
                // the pop consumes a message server-side, so an in-flight
                // call must run to completion; the transport timeout bounds
                // how long this can defer the cancellation check
                this.poll_once().await;
                this.set_state(ListenerState::Idle);
            }
            this.set_state(ListenerState::Stopped);
            tracing::info!(topic = %this.topic, "listener stopped");
        });

        Ok(())
    }

    /// Request the loop to stop. Cooperative: the loop exits at the next
    /// cancellation check, bounded by the transport timeout of any
    /// outstanding poll. Observe completion through [`state`](Self::state).
    pub fn stop_listening(&self) {
        if let Some(token) = lock(&self.cancel).as_ref() {
            token.cancel();
        }
    }

    pub fn state(&self) -> ListenerState {
        *self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    fn set_state(&self, state: ListenerState) {
        *self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = state;
    }

    /// One pop call against the subscription head endpoint.
    async fn poll_once(&self) {
        let token = match self.tokens.token() {
            Ok(token) => token,
            Err(e) => {
                self.report_error(e);
                return;
            }
        };

        let url = self.config.subscription_url(&self.topic);
        match self.transport.pop_message(&url, token.value()).await {
            Ok(Some(body)) => match self.codec.decode_envelope(&body) {
                Ok(envelope) => {
                    tracing::debug!(
                        packet_number = envelope.packet_number,
                        event_id = envelope.event_id,
                        "envelope received"
                    );
                    self.report_received(envelope);
                }
                Err(e) => self.report_error(e),
            },
            // nothing available, or the subscription is not provisioned yet
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "poll failed");
                self.report_error(e);
            }
        }
    }

    fn report_received(&self, envelope: Envelope) {
        if let Some(callback) = lock(&self.on_received).as_ref() {
            callback(envelope);
        }
    }

    fn report_error(&self, error: ClientError) {
        if let Some(callback) = lock(&self.on_error).as_ref() {
            callback(error);
        }
    }
}

impl Clone for Subscriber {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            tokens: Arc::clone(&self.tokens),
            codec: Arc::clone(&self.codec),
            transport: Arc::clone(&self.transport),
            topic: self.topic.clone(),
            state: Arc::clone(&self.state),
            cancel: Arc::clone(&self.cancel),
            on_received: Arc::clone(&self.on_received),
            on_error: Arc::clone(&self.on_error),
        }
    }
}
