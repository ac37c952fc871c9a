//! Discovery listener — subscribes to the discovery topic and dispatches
//! registrations.
//!
//! The listener never awaits entity initialization before moving on to the
//! next discovery message: each message's registration work is spawned as
//! its own task. Within one message, components register sequentially in
//! declared order.

use std::sync::Arc;

use tracing::{debug, info, warn};

use farmhub_domain::discovery::DiscoveryMessage;
use farmhub_domain::error::FarmHubError;

use crate::factory::EntityFactory;
use crate::ports::{HostFramework, MessageBus};

/// Listens on a single well-known discovery topic and feeds the factory.
pub struct DiscoveryListener<B, H> {
    factory: Arc<EntityFactory<B, H>>,
    bus: B,
    topic: String,
}

impl<B, H> DiscoveryListener<B, H>
where
    B: MessageBus + Clone + 'static,
    H: HostFramework + Clone + 'static,
{
    /// Create a listener for `topic`, wiring a fresh factory to the given
    /// bus and host.
    pub fn new(bus: B, host: H, topic: impl Into<String>) -> Self {
        Self {
            factory: Arc::new(EntityFactory::new(bus.clone(), host)),
            bus,
            topic: topic.into(),
        }
    }

    /// The factory holding all proxies registered through this listener.
    #[must_use]
    pub fn factory(&self) -> Arc<EntityFactory<B, H>> {
        Arc::clone(&self.factory)
    }

    /// Subscribe once and process discovery messages until the bus goes
    /// away.
    ///
    /// # Errors
    ///
    /// Propagates the bus error when the initial subscribe fails. Bad
    /// payloads after that are dropped, never fatal.
    pub async fn run(&self) -> Result<(), FarmHubError> {
        let mut subscription = self.bus.subscribe(&self.topic).await?;
        info!(topic = %self.topic, "listening for discovery announcements");
        while let Some(message) = subscription.recv().await {
            self.dispatch(&message.payload);
        }
        Ok(())
    }

    /// Parse one discovery payload and spawn its registration work.
    pub fn dispatch(&self, payload: &str) {
        let message = match DiscoveryMessage::from_json(payload) {
            Ok(message) => message,
            Err(err) => {
                warn!(error = %err, "dropping malformed discovery payload");
                return;
            }
        };
        if message.components.is_empty() {
            debug!(
                device_id = message.device_id.as_deref(),
                "discovery message without components"
            );
            return;
        }

        // Fire and forget: the listener moves on to the next message while
        // this one's components register in order.
        let factory = Arc::clone(&self.factory);
        tokio::spawn(async move {
            factory
                .register_all(message.device_id.as_deref(), message.components)
                .await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeBus, RecordingHost, wait_until_async};
    use farmhub_domain::discovery::DEFAULT_DISCOVERY_TOPIC;

    fn make_listener(bus: &FakeBus) -> DiscoveryListener<FakeBus, RecordingHost> {
        DiscoveryListener::new(bus.clone(), RecordingHost::new(), DEFAULT_DISCOVERY_TOPIC)
    }

    async fn wait_for_len(factory: &Arc<EntityFactory<FakeBus, RecordingHost>>, expected: usize) {
        wait_until_async(|| {
            let factory = Arc::clone(factory);
            async move { factory.len().await == expected }
        })
        .await;
    }

    #[tokio::test]
    async fn should_register_sensor_and_switch_proxies_from_one_message() {
        let bus = FakeBus::new();
        let listener = make_listener(&bus);
        let factory = listener.factory();

        listener.dispatch(
            r#"{
                "device_id": "cf-esp-01",
                "components": [
                    {"type": "sensor", "name": "Temp", "state_topic": "cf/cf-esp-01/temp"},
                    {"type": "sensor", "name": "Humidity", "state_topic": "cf/cf-esp-01/humidity"},
                    {"type": "switch", "name": "Pump", "state_topic": "cf/cf-esp-01/pump", "command_topic": "cf/cf-esp-01/pump/set"}
                ]
            }"#,
        );

        wait_for_len(&factory, 3).await;
        assert!(factory.snapshot("cf/cf-esp-01/temp").await.is_some());
        assert!(factory.snapshot("cf/cf-esp-01/humidity").await.is_some());
        assert!(factory.snapshot("cf/cf-esp-01/pump/set").await.is_some());
    }

    #[tokio::test]
    async fn should_drop_malformed_payload_and_keep_processing() {
        let bus = FakeBus::new();
        let listener = make_listener(&bus);
        let factory = listener.factory();

        listener.dispatch("{not json at all");
        listener.dispatch(
            r#"{"components": [{"type": "sensor", "state_topic": "cf/dev/temp"}]}"#,
        );

        wait_for_len(&factory, 1).await;
    }

    #[tokio::test]
    async fn should_ignore_message_without_components() {
        let bus = FakeBus::new();
        let listener = make_listener(&bus);
        let factory = listener.factory();

        listener.dispatch(r#"{"device_id": "cf-esp-01"}"#);
        listener.dispatch(r#"{"device_id": "cf-esp-02", "components": []}"#);
        listener.dispatch(
            r#"{"components": [{"type": "sensor", "state_topic": "cf/dev/temp"}]}"#,
        );

        wait_for_len(&factory, 1).await;
    }

    #[tokio::test]
    async fn should_skip_unknown_kind_without_affecting_siblings() {
        let bus = FakeBus::new();
        let listener = make_listener(&bus);
        let factory = listener.factory();

        listener.dispatch(
            r#"{
                "components": [
                    {"type": "thermostat", "state_topic": "cf/dev/thermo"},
                    {"type": "sensor", "state_topic": "cf/dev/temp"}
                ]
            }"#,
        );

        wait_for_len(&factory, 1).await;
        assert!(factory.snapshot("cf/dev/temp").await.is_some());
        assert!(factory.snapshot("cf/dev/thermo").await.is_none());
    }

    #[tokio::test]
    async fn should_not_duplicate_proxies_on_redelivery() {
        let bus = FakeBus::new();
        let listener = make_listener(&bus);
        let factory = listener.factory();

        let payload = r#"{
            "device_id": "cf-esp-01",
            "components": [
                {"type": "sensor", "state_topic": "cf/cf-esp-01/temp"},
                {"type": "switch", "state_topic": "cf/cf-esp-01/pump", "command_topic": "cf/cf-esp-01/pump/set"}
            ]
        }"#;
        listener.dispatch(payload);
        wait_for_len(&factory, 2).await;

        // At-least-once delivery: the same announcement arrives again.
        listener.dispatch(payload);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(factory.len().await, 2);
        assert_eq!(bus.subscriber_count("cf/cf-esp-01/temp"), 1);
        assert_eq!(bus.subscriber_count("cf/cf-esp-01/pump"), 1);
    }

    #[tokio::test]
    async fn should_process_messages_delivered_through_the_bus() {
        let bus = FakeBus::new();
        let listener = Arc::new(make_listener(&bus));
        let factory = listener.factory();

        let runner = Arc::clone(&listener);
        tokio::spawn(async move { runner.run().await });

        wait_until_async(|| {
            let bus = bus.clone();
            async move { bus.subscriber_count(DEFAULT_DISCOVERY_TOPIC) == 1 }
        })
        .await;

        bus.emit(
            DEFAULT_DISCOVERY_TOPIC,
            r#"{"components": [{"type": "sensor", "state_topic": "cf/dev/temp"}]}"#,
        )
        .await;

        wait_for_len(&factory, 1).await;
    }
}
