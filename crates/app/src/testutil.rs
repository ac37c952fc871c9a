//! Test support — a loopback message bus and a recording host framework.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use farmhub_domain::entity::EntitySnapshot;
use farmhub_domain::error::FarmHubError;
use farmhub_domain::event::HostEvent;

use crate::ports::{BusMessage, HostFramework, MessageBus, Subscription};

/// In-memory bus: `publish` is recorded and looped back to subscribers,
/// `emit` simulates a device-originated message.
#[derive(Debug, Clone, Default)]
pub struct FakeBus {
    topics: Arc<Mutex<HashMap<String, Vec<mpsc::Sender<BusMessage>>>>>,
    published: Arc<Mutex<Vec<BusMessage>>>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a message to subscribers without recording it as published.
    pub async fn emit(&self, topic: &str, payload: &str) {
        let senders: Vec<_> = {
            let topics = self.topics.lock().unwrap();
            topics.get(topic).cloned().unwrap_or_default()
        };
        for sender in senders {
            let _ = sender
                .send(BusMessage {
                    topic: topic.to_string(),
                    payload: payload.to_string(),
                })
                .await;
        }
    }

    /// Everything published through the bus, in order.
    pub fn published(&self) -> Vec<BusMessage> {
        self.published.lock().unwrap().clone()
    }

    /// Number of live subscriptions on a topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        let mut topics = self.topics.lock().unwrap();
        match topics.get_mut(topic) {
            Some(senders) => {
                senders.retain(|sender| !sender.is_closed());
                senders.len()
            }
            None => 0,
        }
    }
}

impl MessageBus for FakeBus {
    fn subscribe(
        &self,
        topic: &str,
    ) -> impl Future<Output = Result<Subscription, FarmHubError>> + Send {
        let (sender, receiver) = mpsc::channel(16);
        self.topics
            .lock()
            .unwrap()
            .entry(topic.to_string())
            .or_default()
            .push(sender);
        let subscription = Subscription::new(topic, receiver);
        async move { Ok(subscription) }
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), FarmHubError> {
        self.published.lock().unwrap().push(BusMessage {
            topic: topic.to_string(),
            payload: payload.to_string(),
        });
        self.emit(topic, payload).await;
        Ok(())
    }
}

/// Host framework that records every call for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    events: Arc<Mutex<Vec<HostEvent>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn state_changes(&self) -> Vec<EntitySnapshot> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HostEvent::StateChanged(snapshot) => Some(snapshot),
                HostEvent::EntityRegistered(_) => None,
            })
            .collect()
    }

    pub fn registered(&self) -> Vec<EntitySnapshot> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HostEvent::EntityRegistered(snapshot) => Some(snapshot),
                HostEvent::StateChanged(_) => None,
            })
            .collect()
    }
}

impl HostFramework for RecordingHost {
    fn register_entity(
        &self,
        snapshot: EntitySnapshot,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
        self.events
            .lock()
            .unwrap()
            .push(HostEvent::EntityRegistered(snapshot));
        async { Ok(()) }
    }

    fn notify_state_changed(
        &self,
        snapshot: EntitySnapshot,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
        self.events
            .lock()
            .unwrap()
            .push(HostEvent::StateChanged(snapshot));
        async { Ok(()) }
    }
}

/// Poll `predicate` until it holds, panicking after two seconds.
pub async fn wait_until(mut predicate: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !predicate() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

/// Like [`wait_until`], for predicates that need to await.
pub async fn wait_until_async<F, Fut>(mut predicate: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        while !predicate().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}
