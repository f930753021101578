//! The client facade: one explicitly constructed object owning the
//! configuration, token cache, codec, and transport.
//!
//! Multiple independent clients (distinct games, players, or namespaces)
//! can coexist in one process; nothing here is global.

use std::sync::Arc;

use crate::codec::EnvelopeCodec;
use crate::config::BusConfig;
use crate::error::ClientError;
use crate::publisher::Publisher;
use crate::sas::SasTokenProvider;
use crate::subscriber::{Subscriber, PLAYER_EVENTS_TOPIC};
use crate::transport::{HttpTransport, MessageTransport};

/// Entry point to the SDK.
pub struct GameBusClient {
    config: Arc<BusConfig>,
    tokens: Arc<SasTokenProvider>,
    codec: Arc<EnvelopeCodec>,
    transport: Arc<dyn MessageTransport>,
}

impl GameBusClient {
    /// Build a client over the production HTTP transport.
    ///
    /// Configuration is validated synchronously; violations are fatal and
    /// reported here rather than at first use.
    pub fn new(config: BusConfig) -> Result<Self, ClientError> {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    /// Build a client over a caller-supplied transport (tests, recording
    /// fakes).
    pub fn with_transport(
        config: BusConfig,
        transport: Arc<dyn MessageTransport>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let tokens = Arc::new(SasTokenProvider::new(
            config.realm(),
            config.key_name.clone(),
            config.key_secret.clone(),
        )?);
        let codec = Arc::new(EnvelopeCodec::from_config(&config));
        Ok(Self {
            config: Arc::new(config),
            tokens,
            codec,
            transport,
        })
    }

    /// A publisher sharing this client's credentials and queue discipline.
    ///
    /// Each call returns a fresh publisher with its own queue, packet
    /// counter, and correlation id; clone the returned value to share one
    /// queue across callers.
    pub fn publisher(&self) -> Publisher {
        Publisher::new(
            Arc::clone(&self.config),
            Arc::clone(&self.tokens),
            Arc::clone(&self.codec),
            Arc::clone(&self.transport),
        )
    }

    /// A subscriber on the default per-player events topic.
    pub fn subscriber(&self) -> Subscriber {
        self.subscriber_on(PLAYER_EVENTS_TOPIC)
    }

    /// A subscriber on a specific topic.
    pub fn subscriber_on(&self, topic: &str) -> Subscriber {
        Subscriber::new(
            Arc::clone(&self.config),
            Arc::clone(&self.tokens),
            Arc::clone(&self.codec),
            Arc::clone(&self.transport),
            topic,
        )
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EncryptionMode, SerializationMode};

    fn config() -> BusConfig {
        BusConfig {
            service_namespace: "contoso".to_string(),
            key_name: "owner".to_string(),
            key_secret: "secret".to_string(),
            game_id: 1,
            player_id: "player-1".to_string(),
            serialization: SerializationMode::Tagged,
            encryption: EncryptionMode::Off,
        }
    }

    #[test]
    fn test_invalid_configuration_is_rejected_at_construction() {
        let mut bad = config();
        bad.key_secret = String::new();
        assert!(matches!(
            GameBusClient::new(bad),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn test_independent_clients_coexist() {
        let first = GameBusClient::new(config()).expect("client");
        let mut other_config = config();
        other_config.player_id = "player-2".to_string();
        let second = GameBusClient::new(other_config).expect("client");

        assert_eq!(first.config().player_id, "player-1");
        assert_eq!(second.config().player_id, "player-2");
    }

    #[test]
    fn test_publishers_get_distinct_correlation_ids() {
        let client = GameBusClient::new(config()).expect("client");
        let a = client.publisher();
        let b = client.publisher();
        assert_ne!(a.correlation_id(), b.correlation_id());
    }

    #[test]
    fn test_default_subscriber_topic() {
        let client = GameBusClient::new(config()).expect("client");
        assert_eq!(client.subscriber().topic(), "PlayerEvents");
        assert_eq!(client.subscriber_on("Echo").topic(), "Echo");
    }
}
