//! # farmhub-adapter-memory
//!
//! In-process loopback implementation of the
//! [`MessageBus`](farmhub_app::ports::MessageBus) port: every publish is
//! delivered straight back to the topic's subscribers, no broker involved.
//!
//! Plays the role of a simulated integration — the end-to-end tests in
//! `farmhubd` drive the whole discovery protocol through it, and it doubles
//! as a demo transport when no broker is around.
//!
//! ## Dependency rule
//! Depends on `farmhub-app` (port traits) and `farmhub-domain` only.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use farmhub_app::ports::{BusMessage, MessageBus, Subscription};
use farmhub_domain::error::FarmHubError;

/// Per-subscriber channel capacity.
const CHANNEL_CAPACITY: usize = 64;

/// Loopback message bus.
///
/// Cheaply cloneable; clones share the same topic table, so a publish on
/// one clone reaches subscribers registered through another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBus {
    topics: Arc<Mutex<HashMap<String, Vec<mpsc::Sender<BusMessage>>>>>,
}

impl InMemoryBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on a topic. Closed subscriptions are
    /// pruned on the way.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        let mut topics = self.lock_topics();
        match topics.get_mut(topic) {
            Some(senders) => {
                senders.retain(|sender| !sender.is_closed());
                senders.len()
            }
            None => 0,
        }
    }

    fn lock_topics(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, Vec<mpsc::Sender<BusMessage>>>> {
        self.topics
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl MessageBus for InMemoryBus {
    fn subscribe(
        &self,
        topic: &str,
    ) -> impl Future<Output = Result<Subscription, FarmHubError>> + Send {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        self.lock_topics()
            .entry(topic.to_string())
            .or_default()
            .push(sender);
        let subscription = Subscription::new(topic, receiver);
        async move { Ok(subscription) }
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), FarmHubError> {
        // Collect senders first; the lock is never held across an await.
        let senders: Vec<_> = {
            let mut topics = self.lock_topics();
            match topics.get_mut(topic) {
                Some(senders) => {
                    senders.retain(|sender| !sender.is_closed());
                    senders.clone()
                }
                None => Vec::new(),
            }
        };
        for sender in senders {
            let _ = sender
                .send(BusMessage {
                    topic: topic.to_string(),
                    payload: payload.to_string(),
                })
                .await;
        }
        Ok(())
    }
}

use std::future::Future;
