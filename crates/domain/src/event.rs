//! Host events — records of entity registrations and state changes.
//!
//! Emitted by the in-process host framework so that observers (the
//! daemon's log task, tests, a future UI) can watch entity activity
//! without holding the proxies themselves.

use serde::Serialize;

use crate::entity::EntitySnapshot;

/// Something the host framework was told about an entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    /// A new proxy entity was registered.
    EntityRegistered(EntitySnapshot),
    /// An existing proxy entity changed state.
    StateChanged(EntitySnapshot),
}

impl HostEvent {
    /// The snapshot carried by this event.
    #[must_use]
    pub fn snapshot(&self) -> &EntitySnapshot {
        match self {
            Self::EntityRegistered(snapshot) | Self::StateChanged(snapshot) => snapshot,
        }
    }
}
