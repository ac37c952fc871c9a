//! Message bus port — topic-based publish/subscribe.
//!
//! The bus connection is process-wide shared state: components only ever
//! borrow it to subscribe or publish, never close or reconfigure it.
//! Implementations hand each subscriber its own channel; dropping the
//! [`Subscription`] is how a proxy cancels its interest in a topic.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use farmhub_domain::error::FarmHubError;

/// One message delivered on a subscribed topic.
///
/// Payloads on this bus are UTF-8 text (JSON discovery documents, bare
/// decimal numbers, `ON`/`OFF` literals); adapters decode bytes lossily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: String,
}

/// A live subscription to a single topic.
///
/// Messages arrive in per-topic order (whatever the bus provides; ordering
/// across different topics is not guaranteed). Dropping the subscription
/// releases the topic on the bus side.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    receiver: mpsc::Receiver<BusMessage>,
}

impl Subscription {
    /// Wrap a receiver registered with the bus for `topic`.
    #[must_use]
    pub fn new(topic: impl Into<String>, receiver: mpsc::Receiver<BusMessage>) -> Self {
        Self {
            topic: topic.into(),
            receiver,
        }
    }

    /// The subscribed topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Receive the next message, or `None` once the bus has gone away.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        self.receiver.recv().await
    }
}

/// Topic-based publish/subscribe with at-least-once delivery semantics.
///
/// The broker itself is an external collaborator; implementations are thin
/// clients (`MqttBus`) or in-process loopbacks (`InMemoryBus`).
pub trait MessageBus: Send + Sync {
    /// Register interest in a topic.
    fn subscribe(
        &self,
        topic: &str,
    ) -> impl Future<Output = Result<Subscription, FarmHubError>> + Send;

    /// Publish a payload to a topic.
    fn publish(
        &self,
        topic: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send;
}

impl<T: MessageBus> MessageBus for Arc<T> {
    fn subscribe(
        &self,
        topic: &str,
    ) -> impl Future<Output = Result<Subscription, FarmHubError>> + Send {
        (**self).subscribe(topic)
    }

    fn publish(
        &self,
        topic: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
        (**self).publish(topic, payload)
    }
}
