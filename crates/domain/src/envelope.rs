//! The versioned wire record wrapping one game event.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Property key under which every envelope carries its schema version.
///
/// Server-side relays validate this property and dead-letter messages
/// that lack it.
pub const VERSION_PROPERTY: &str = "IGL.V1.Version";

/// Identifier of the current envelope schema. Doubles as the password fed
/// to content-encryption key derivation, so all participants must agree on
/// it out of band.
pub const SCHEMA_NAMESPACE: &str = "uri:igl:v1";

/// The unit sent over the wire: one encoded [`GameEvent`](crate::GameEvent)
/// plus routing and diagnostic metadata.
///
/// Serialized as camelCase JSON. The `queue` field is routing-only (it
/// selects the HTTP endpoint) and never appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Destination topic. Not serialized; receivers learn the topic from
    /// the subscription they popped the message from.
    #[serde(skip)]
    pub queue: String,

    /// Tenant (game title) identifier.
    pub game_id: i32,

    /// Player the envelope concerns or is addressed to.
    pub player_id: String,

    /// Process-lifetime random string shared by all envelopes sent by one
    /// client instance. Used by receivers to group related events, not for
    /// deduplication.
    pub correlation_id: String,

    /// Per-client monotonic counter assigned at enqueue time. Unique within
    /// one client instance only; diagnostics and latency measurement.
    pub packet_number: u64,

    /// Caller-supplied application event-type code.
    pub event_id: i32,

    /// Capture timestamp.
    pub created_at_utc: DateTime<Utc>,

    /// The encoded (and optionally encrypted) event. Only interpretable
    /// together with the serialization/encryption modes active at encode
    /// time.
    #[serde(default)]
    pub content: String,

    /// String metadata. Always contains [`VERSION_PROPERTY`].
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl Envelope {
    /// The schema version stamped on this envelope, if any.
    pub fn schema_version(&self) -> Option<&str> {
        self.properties.get(VERSION_PROPERTY).map(String::as_str)
    }

    /// Whether this envelope declares the schema version this SDK speaks.
    pub fn has_current_schema(&self) -> bool {
        self.schema_version() == Some(SCHEMA_NAMESPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope {
            queue: "Echo".to_string(),
            game_id: 7,
            player_id: "player-1".to_string(),
            correlation_id: "abc123".to_string(),
            packet_number: 3,
            event_id: 100,
            created_at_utc: Utc::now(),
            content: "00000000".to_string(),
            properties: [(VERSION_PROPERTY.to_string(), SCHEMA_NAMESPACE.to_string())]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn test_queue_is_not_serialized() {
        let json = serde_json::to_value(sample()).expect("serialize");
        assert!(json.get("queue").is_none());
        assert_eq!(json["gameId"], 7);
        assert_eq!(json["playerId"], "player-1");
        assert_eq!(json["packetNumber"], 3);
        assert_eq!(json["eventId"], 100);
    }

    #[test]
    fn test_round_trip_preserves_wire_fields() {
        let original = sample();
        let json = serde_json::to_string(&original).expect("serialize");
        let decoded: Envelope = serde_json::from_str(&json).expect("deserialize");

        // queue is routing-only and comes back empty
        assert_eq!(decoded.queue, "");
        assert_eq!(decoded.game_id, original.game_id);
        assert_eq!(decoded.correlation_id, original.correlation_id);
        assert_eq!(decoded.content, original.content);
        assert_eq!(decoded.created_at_utc, original.created_at_utc);
    }

    #[test]
    fn test_version_property_uses_the_relay_wire_key() {
        // relays key their schema validation on this exact property name
        let json = serde_json::to_value(sample()).expect("serialize");
        assert_eq!(json["properties"]["IGL.V1.Version"], SCHEMA_NAMESPACE);
    }

    #[test]
    fn test_schema_version_lookup() {
        let envelope = sample();
        assert!(envelope.has_current_schema());
        assert_eq!(envelope.schema_version(), Some(SCHEMA_NAMESPACE));

        let mut unversioned = sample();
        unversioned.properties.clear();
        assert!(!unversioned.has_current_schema());
    }

    #[test]
    fn test_missing_content_defaults_to_empty() {
        let json = r#"{
            "gameId": 1,
            "playerId": "p",
            "correlationId": "c",
            "packetNumber": 0,
            "eventId": 5,
            "createdAtUtc": "2024-01-01T00:00:00Z"
        }"#;
        let decoded: Envelope = serde_json::from_str(json).expect("deserialize");
        assert!(decoded.content.is_empty());
        assert!(decoded.properties.is_empty());
    }
}
