//! # farmhub-adapter-mqtt
//!
//! MQTT adapter — implements the [`MessageBus`](farmhub_app::ports::MessageBus)
//! port on top of a rumqttc [`AsyncClient`].
//!
//! ## Responsibilities
//! - Connect to the broker and drive the rumqttc event loop in a background
//!   task (reconnects are left to rumqttc's polling)
//! - Route inbound publishes to per-topic subscriber channels
//! - Unsubscribe topics once their last subscriber is gone
//! - Re-subscribe everything after a reconnect
//!
//! ## Dependency rule
//! Depends on `farmhub-app` (port traits) and `farmhub-domain` only.

mod config;
mod error;

pub use config::MqttConfig;
pub use error::MqttError;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use farmhub_app::ports::{BusMessage, MessageBus, Subscription};
use farmhub_domain::error::FarmHubError;

/// Per-subscriber channel capacity.
const CHANNEL_CAPACITY: usize = 64;

/// Delay before polling again after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

type Routes = Arc<Mutex<HashMap<String, Vec<mpsc::Sender<BusMessage>>>>>;

/// rumqttc-backed message bus.
///
/// Cheaply cloneable; clones share the client and the subscriber table.
/// The connection is process-wide shared state — components borrow the bus
/// to subscribe and publish, they never close or reconfigure it.
#[derive(Debug, Clone)]
pub struct MqttBus {
    client: AsyncClient,
    routes: Routes,
}

impl MqttBus {
    /// Create the client and spawn the event-loop task.
    ///
    /// The actual TCP connection is established lazily by the event loop;
    /// connection errors are logged and retried, never fatal.
    #[must_use]
    pub fn connect(config: &MqttConfig) -> (Self, JoinHandle<()>) {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));

        let (client, eventloop) = AsyncClient::new(options, CHANNEL_CAPACITY);
        let routes: Routes = Arc::default();
        let task = tokio::spawn(run_event_loop(eventloop, client.clone(), Arc::clone(&routes)));
        (Self { client, routes }, task)
    }
}

impl MessageBus for MqttBus {
    async fn subscribe(&self, topic: &str) -> Result<Subscription, FarmHubError> {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        self.routes
            .lock()
            .await
            .entry(topic.to_string())
            .or_default()
            .push(sender);

        match self.client.subscribe(topic, QoS::AtLeastOnce).await {
            Ok(()) => Ok(Subscription::new(topic, receiver)),
            Err(err) => {
                // Take the dangling sender back out before surfacing the
                // error.
                drop(receiver);
                let mut routes = self.routes.lock().await;
                if let Some(senders) = routes.get_mut(topic) {
                    senders.retain(|sender| !sender.is_closed());
                    if senders.is_empty() {
                        routes.remove(topic);
                    }
                }
                Err(MqttError::Client(err).into())
            }
        }
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), FarmHubError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload.as_bytes().to_vec())
            .await
            .map_err(|err| MqttError::Client(err).into())
    }
}

async fn run_event_loop(mut eventloop: EventLoop, client: AsyncClient, routes: Routes) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("connected to MQTT broker");
                resubscribe(&client, &routes).await;
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                deliver(&client, &routes, &publish.topic, payload).await;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "MQTT connection error, retrying");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

/// Fan one inbound publish out to the topic's subscribers, pruning closed
/// channels and releasing the topic once the last one is gone.
async fn deliver(client: &AsyncClient, routes: &Routes, topic: &str, payload: String) {
    let mut routes = routes.lock().await;
    let Some(senders) = routes.get_mut(topic) else {
        debug!(topic, "publish on topic without subscribers");
        return;
    };
    senders.retain(|sender| !sender.is_closed());
    for sender in senders.iter() {
        let message = BusMessage {
            topic: topic.to_string(),
            payload: payload.clone(),
        };
        // A subscriber going away mid-delivery is pruned on the next pass.
        let _ = sender.send(message).await;
    }
    if senders.is_empty() {
        routes.remove(topic);
        if let Err(err) = client.unsubscribe(topic).await {
            warn!(topic, error = %err, "failed to unsubscribe released topic");
        }
    }
}

/// Renew every active subscription after a (re)connect.
async fn resubscribe(client: &AsyncClient, routes: &Routes) {
    let topics: Vec<String> = {
        let mut routes = routes.lock().await;
        routes.retain(|_, senders| {
            senders.retain(|sender| !sender.is_closed());
            !senders.is_empty()
        });
        routes.keys().cloned().collect()
    };
    for topic in topics {
        if let Err(err) = client.subscribe(&topic, QoS::AtLeastOnce).await {
            warn!(topic, error = %err, "failed to renew subscription");
        }
    }
}
