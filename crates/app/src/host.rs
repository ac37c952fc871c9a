//! In-process host framework backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use farmhub_domain::entity::EntitySnapshot;
use farmhub_domain::error::FarmHubError;
use farmhub_domain::event::HostEvent;

use crate::ports::HostFramework;

/// [`HostFramework`] implementation that fans entity events out over a
/// tokio [`broadcast`] channel.
///
/// Notifying succeeds even when there are no active subscribers
/// (the event is simply dropped).
#[derive(Debug, Clone)]
pub struct InProcessHost {
    sender: broadcast::Sender<HostEvent>,
}

impl InProcessHost {
    /// Create a new host with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to entity events.
    ///
    /// Returns a receiver that will get all events emitted *after* the
    /// subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.sender.subscribe()
    }
}

impl HostFramework for InProcessHost {
    fn register_entity(
        &self,
        snapshot: EntitySnapshot,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
        // broadcast::send fails only when there are zero receivers,
        // which is fine — we simply ignore the error.
        let _ = self.sender.send(HostEvent::EntityRegistered(snapshot));
        async { Ok(()) }
    }

    fn notify_state_changed(
        &self,
        snapshot: EntitySnapshot,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
        let _ = self.sender.send(HostEvent::StateChanged(snapshot));
        async { Ok(()) }
    }
}

use std::future::Future;
