//! Round-trip demo: publish an event to the Echo topic and listen for the
//! relay's per-player response.
//!
//! ```sh
//! GAMEBUS_NAMESPACE=contoso GAMEBUS_KEY_NAME=owner GAMEBUS_KEY_SECRET=... \
//!     cargo run -p gamebus-client --example echo
//! ```

use std::env;
use std::time::Duration;

use gamebus_client::{BusConfig, GameBusClient};
use gamebus_domain::GameEvent;

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("{name} must be set"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gamebus_client=debug".into()),
        )
        .init();

    let client = GameBusClient::new(BusConfig {
        service_namespace: required("GAMEBUS_NAMESPACE")?,
        key_name: required("GAMEBUS_KEY_NAME")?,
        key_secret: required("GAMEBUS_KEY_SECRET")?,
        game_id: 1,
        player_id: env::var("GAMEBUS_PLAYER_ID").unwrap_or_else(|_| "demo-player".into()),
        ..BusConfig::default()
    })?;

    let subscriber = client.subscriber();
    subscriber.set_on_envelope_received(|envelope| {
        tracing::info!(
            packet_number = envelope.packet_number,
            event_id = envelope.event_id,
            "response received"
        );
    });
    subscriber.set_on_listen_error(|error| {
        tracing::warn!(%error, "listen error");
    });
    subscriber.start_listening()?;

    let publisher = client.publisher();
    publisher.set_on_publish_succeeded(|_| tracing::info!("publish acknowledged"));
    publisher.set_on_publish_failed(|error| tracing::error!(%error, "publish failed"));

    let event = GameEvent::new().with_property("PlayerName", "Joe Smith");
    publisher.submit("Echo", 100, &event, None);

    tokio::time::sleep(Duration::from_secs(90)).await;
    subscriber.stop_listening();
    Ok(())
}
