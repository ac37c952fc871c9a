//! Proxy entities — live stand-ins for one physical device capability.
//!
//! Each proxy owns its mutable state inside a spawned tokio task fed by a
//! per-topic [`Subscription`](crate::ports::Subscription); the handle left
//! behind exposes the current state through a `watch` channel and, for
//! switches, a command channel. Dropping a handle aborts the task, which
//! drops the subscription and thereby cancels it on the bus.

pub mod sensor;
pub mod switch;

pub use sensor::{SensorHandle, SensorProxy};
pub use switch::{SwitchHandle, SwitchProxy};

use farmhub_domain::entity::EntitySnapshot;

/// Handle to a bound proxy of either kind, as stored in the factory
/// registry.
#[derive(Debug)]
pub enum ProxyHandle {
    Sensor(SensorHandle),
    Switch(SwitchHandle),
}

impl ProxyHandle {
    /// Unique id the proxy is registered under.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        match self {
            Self::Sensor(handle) => handle.unique_id(),
            Self::Switch(handle) => handle.unique_id(),
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Sensor(handle) => handle.name(),
            Self::Switch(handle) => handle.name(),
        }
    }

    /// Current state as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        match self {
            Self::Sensor(handle) => handle.snapshot(),
            Self::Switch(handle) => handle.snapshot(),
        }
    }

    /// Borrow the switch handle, if this proxy is a switch.
    #[must_use]
    pub fn as_switch(&self) -> Option<&SwitchHandle> {
        match self {
            Self::Switch(handle) => Some(handle),
            Self::Sensor(_) => None,
        }
    }
}
