//! Envelope and event content codec.
//!
//! Two orthogonal axes, both fixed at construction from the process-wide
//! configuration: how an event is serialized into text ([`SerializationMode`])
//! and whether that text is encrypted ([`EncryptionMode`]). The envelope
//! itself always travels as camelCase JSON.

mod cipher;
mod tagged;

use gamebus_domain::{Envelope, GameEvent};

use crate::config::{BusConfig, EncryptionMode, SerializationMode};
use crate::error::ClientError;
use cipher::ContentCipher;

/// Encodes and decodes event content and wire envelopes.
pub struct EnvelopeCodec {
    serialization: SerializationMode,
    cipher: Option<ContentCipher>,
}

impl EnvelopeCodec {
    pub fn new(serialization: SerializationMode, encryption: &EncryptionMode) -> Self {
        let cipher = match encryption {
            EncryptionMode::Off => None,
            EncryptionMode::Aes { salt } => Some(ContentCipher::new(salt)),
        };
        Self {
            serialization,
            cipher,
        }
    }

    pub fn from_config(config: &BusConfig) -> Self {
        Self::new(config.serialization, &config.encryption)
    }

    /// Encode an event into the envelope's text content field.
    pub fn encode(&self, event: &GameEvent) -> Result<String, ClientError> {
        let plain = match self.serialization {
            SerializationMode::Tagged => tagged::serialize(event),
            SerializationMode::Json => serde_json::to_string(event)
                .map_err(|e| ClientError::decode(format!("event serialization failed: {e}")))?,
        };
        match &self.cipher {
            Some(cipher) => cipher.encrypt(&plain),
            None => Ok(plain),
        }
    }

    /// Decode event content produced by [`encode`](Self::encode) under the
    /// same mode configuration.
    pub fn decode(&self, content: &str) -> Result<GameEvent, ClientError> {
        let plain = match &self.cipher {
            Some(cipher) => cipher.decrypt(content)?,
            None => content.to_string(),
        };
        match self.serialization {
            SerializationMode::Tagged => tagged::deserialize(&plain),
            SerializationMode::Json => serde_json::from_str(&plain)
                .map_err(|e| ClientError::decode(format!("event deserialization failed: {e}"))),
        }
    }

    /// Decode the event carried by an envelope.
    ///
    /// Empty content means "no event" and is not an error; malformed content
    /// is permanently unreadable and should go to an error path, not be
    /// resent.
    pub fn decode_event(&self, envelope: &Envelope) -> Result<Option<GameEvent>, ClientError> {
        if envelope.content.is_empty() {
            return Ok(None);
        }
        self.decode(&envelope.content).map(Some)
    }

    /// Serialize an envelope into the HTTP message body.
    pub fn encode_envelope(&self, envelope: &Envelope) -> Result<String, ClientError> {
        serde_json::to_string(envelope)
            .map_err(|e| ClientError::decode(format!("envelope serialization failed: {e}")))
    }

    /// Parse an HTTP message body into an envelope.
    pub fn decode_envelope(&self, body: &str) -> Result<Envelope, ClientError> {
        serde_json::from_str(body)
            .map_err(|e| ClientError::decode(format!("envelope deserialization failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use gamebus_domain::{SCHEMA_NAMESPACE, VERSION_PROPERTY};

    use super::*;

    fn sample_event() -> GameEvent {
        GameEvent::new()
            .with_property("PlayerName", "Joe Smith")
            .with_property("Level", "3")
    }

    fn all_modes() -> Vec<EnvelopeCodec> {
        let encryptions = [
            EncryptionMode::Off,
            EncryptionMode::Aes {
                salt: "abc".to_string(),
            },
        ];
        let mut codecs = Vec::new();
        for serialization in [SerializationMode::Tagged, SerializationMode::Json] {
            for encryption in &encryptions {
                codecs.push(EnvelopeCodec::new(serialization, encryption));
            }
        }
        codecs
    }

    #[test]
    fn test_round_trip_law_under_every_mode_combination() {
        let event = sample_event();
        for codec in all_modes() {
            let content = codec.encode(&event).expect("encode");
            assert_eq!(codec.decode(&content).expect("decode"), event);
        }
    }

    #[test]
    fn test_json_mode_produces_a_json_object() {
        let codec = EnvelopeCodec::new(SerializationMode::Json, &EncryptionMode::Off);
        let content = codec.encode(&sample_event()).expect("encode");
        let value: serde_json::Value = serde_json::from_str(&content).expect("json");
        assert_eq!(value["PlayerName"], "Joe Smith");
    }

    #[test]
    fn test_empty_content_decodes_to_no_event() {
        let codec = EnvelopeCodec::new(SerializationMode::Tagged, &EncryptionMode::Off);
        let envelope = Envelope {
            queue: String::new(),
            game_id: 1,
            player_id: "p".to_string(),
            correlation_id: "c".to_string(),
            packet_number: 0,
            event_id: 1,
            created_at_utc: Utc::now(),
            content: String::new(),
            properties: Default::default(),
        };
        assert_eq!(codec.decode_event(&envelope).expect("decode"), None);
    }

    #[test]
    fn test_malformed_content_is_a_decode_error() {
        for codec in all_modes() {
            assert!(matches!(
                codec.decode("definitely not valid"),
                Err(ClientError::Decode(_))
            ));
        }
    }

    #[test]
    fn test_envelope_body_round_trip() {
        let codec = EnvelopeCodec::new(SerializationMode::Tagged, &EncryptionMode::Off);
        let event = sample_event();
        let envelope = Envelope {
            queue: "Echo".to_string(),
            game_id: 42,
            player_id: "player-1".to_string(),
            correlation_id: "corr".to_string(),
            packet_number: 7,
            event_id: 100,
            created_at_utc: Utc::now(),
            content: codec.encode(&event).expect("encode"),
            properties: [(VERSION_PROPERTY.to_string(), SCHEMA_NAMESPACE.to_string())]
                .into_iter()
                .collect(),
        };

        let body = codec.encode_envelope(&envelope).expect("encode envelope");
        let decoded = codec.decode_envelope(&body).expect("decode envelope");

        assert_eq!(decoded.event_id, 100);
        assert!(decoded.has_current_schema());
        assert_eq!(codec.decode_event(&decoded).expect("decode"), Some(event));
    }
}
