//! GameBus client SDK.
//!
//! Publishes structured game events to a multi-tenant service bus over its
//! plain HTTPS endpoints and long-polls events addressed to one player,
//! without the bus vendor's managed client library. Requests are signed
//! with locally derived shared-access-signature tokens; event content is
//! carried in a versioned envelope with configurable serialization and
//! optional AES encryption.
//!
//! ```no_run
//! use gamebus_client::{BusConfig, GameBusClient};
//! use gamebus_domain::GameEvent;
//!
//! # fn main() -> Result<(), gamebus_client::ClientError> {
//! let client = GameBusClient::new(BusConfig {
//!     service_namespace: "contoso".into(),
//!     key_name: "owner".into(),
//!     key_secret: "...".into(),
//!     game_id: 1,
//!     player_id: "player-1".into(),
//!     ..BusConfig::default()
//! })?;
//!
//! let publisher = client.publisher();
//! let event = GameEvent::new().with_property("PlayerName", "Joe Smith");
//! publisher.submit("Echo", 100, &event, None);
//!
//! let subscriber = client.subscriber();
//! subscriber.set_on_envelope_received(|envelope| {
//!     println!("received packet {}", envelope.packet_number);
//! });
//! subscriber.start_listening()?;
//! # Ok(())
//! # }
//! ```
//!
//! Delivery is at-most-once per envelope: transport failures are reported
//! through the callbacks and never retried by the SDK.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod publisher;
pub mod sas;
pub mod subscriber;
pub mod transport;

mod sync;

pub use client::GameBusClient;
pub use codec::EnvelopeCodec;
pub use config::{BusConfig, EncryptionMode, SerializationMode};
pub use error::ClientError;
pub use publisher::Publisher;
pub use sas::{SasToken, SasTokenProvider};
pub use subscriber::{ListenerState, Subscriber, PLAYER_EVENTS_TOPIC};
pub use transport::{HttpTransport, MessageTransport};
