//! # farmhubd — farmhub daemon
//!
//! Composition root that wires all adapters together and runs the bridge.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize logging
//! - Connect the MQTT bus adapter
//! - Construct the in-process host framework and mirror its events into
//!   the log
//! - Run the discovery listener until shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use farmhub_adapter_mqtt::MqttBus;
use farmhub_app::host::InProcessHost;
use farmhub_app::listener::DiscoveryListener;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    let (bus, connection) = MqttBus::connect(&config.mqtt);
    info!(
        host = %config.mqtt.broker_host,
        port = config.mqtt.broker_port,
        "connecting to MQTT broker"
    );

    let host = InProcessHost::new(config.host.event_capacity);
    let events = host.subscribe();
    tokio::spawn(log_host_events(events));

    let listener = DiscoveryListener::new(bus, host, config.mqtt.discovery_topic.clone());

    tokio::select! {
        result = listener.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }

    connection.abort();
    Ok(())
}

/// Mirror host events into the log so operators can follow entity
/// lifecycles without a dashboard.
async fn log_host_events(mut events: broadcast::Receiver<farmhub_domain::event::HostEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let snapshot = event.snapshot();
                info!(
                    unique_id = snapshot.unique_id(),
                    name = snapshot.name(),
                    ?event,
                    "entity event"
                );
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "fell behind on entity events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
