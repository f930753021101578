//! Client configuration: bus identity, credentials, and content modes.

use crate::error::ClientError;

/// Hostname suffix of the service bus REST endpoints.
const BUS_HOST: &str = "servicebus.windows.net";

/// Upper bound on key name and key secret lengths accepted by the bus.
pub const MAX_CREDENTIAL_LEN: usize = 256;

/// How a [`GameEvent`](gamebus_domain::GameEvent) is rendered into the
/// envelope's text content field.
///
/// Process-wide: every participant must use the same mode; it is not
/// negotiated per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializationMode {
    /// Count-prefixed, length-prefixed key/value entries, hex-encoded.
    #[default]
    Tagged,
    /// A JSON object of the property map.
    Json,
}

/// Whether event content is encrypted before transmission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EncryptionMode {
    #[default]
    Off,
    /// AES-256-CBC with a key derived from the schema namespace and this salt.
    Aes { salt: String },
}

/// Configuration for one bus client, supplied once before use.
#[derive(Debug, Clone, Default)]
pub struct BusConfig {
    /// Service bus namespace, the `{ns}` in `{ns}.servicebus.windows.net`.
    pub service_namespace: String,
    /// Name of the shared access key authorization rule.
    pub key_name: String,
    /// Shared access key secret.
    pub key_secret: String,
    /// Default game identifier stamped on every envelope.
    pub game_id: i32,
    /// Default player identifier stamped on every envelope; also names the
    /// subscription the subscriber pops from.
    pub player_id: String,
    /// Content serialization mode.
    pub serialization: SerializationMode,
    /// Content encryption mode.
    pub encryption: EncryptionMode,
}

impl BusConfig {
    /// Validate the configuration. Violations are fatal and never retried.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.service_namespace.is_empty() {
            return Err(ClientError::configuration("service namespace must be set"));
        }
        if self.key_name.is_empty() {
            return Err(ClientError::configuration("key name must be set"));
        }
        if self.key_name.len() > MAX_CREDENTIAL_LEN {
            return Err(ClientError::configuration(format!(
                "key name exceeds {MAX_CREDENTIAL_LEN} characters"
            )));
        }
        if self.key_secret.is_empty() {
            return Err(ClientError::configuration("key secret must be set"));
        }
        if self.key_secret.len() > MAX_CREDENTIAL_LEN {
            return Err(ClientError::configuration(format!(
                "key secret exceeds {MAX_CREDENTIAL_LEN} characters"
            )));
        }
        if let EncryptionMode::Aes { salt } = &self.encryption {
            if salt.is_empty() {
                return Err(ClientError::configuration(
                    "encryption salt must be set when encryption is enabled",
                ));
            }
        }
        Ok(())
    }

    /// `POST` endpoint for publishing to `topic`.
    pub fn messages_url(&self, topic: &str) -> String {
        format!(
            "https://{}.{}/{}/messages",
            self.service_namespace, BUS_HOST, topic
        )
    }

    /// `DELETE` endpoint for popping this player's subscription on `topic`.
    ///
    /// The `timeout=60` query asks the bus to hold the request server-side
    /// for up to 60 seconds before answering "no message".
    pub fn subscription_url(&self, topic: &str) -> String {
        format!(
            "https://{}.{}/{}/subscriptions/{}/messages/head?timeout=60",
            self.service_namespace, BUS_HOST, topic, self.player_id
        )
    }

    /// The audience realm signed into access tokens.
    ///
    /// Uses the HTTP scheme even though calls are issued over HTTPS; the bus
    /// normalizes token audiences that way.
    pub fn realm(&self) -> String {
        format!("http://{}.{}/", self.service_namespace, BUS_HOST)
    }
}
