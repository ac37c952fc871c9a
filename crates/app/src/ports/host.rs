//! Host framework port — entity registration and state notifications.
//!
//! The home-automation host consumes two calls from this core:
//! `register_entity` when a proxy is created, and `notify_state_changed`
//! on every subsequent update. The in-process implementation lives in
//! [`crate::host`]; a real hub embedding this crate would provide its own.

use std::future::Future;
use std::sync::Arc;

use farmhub_domain::entity::EntitySnapshot;
use farmhub_domain::error::FarmHubError;

/// Consumes entity lifecycle notifications from the proxies.
pub trait HostFramework: Send + Sync {
    /// Announce a newly created proxy entity.
    fn register_entity(
        &self,
        snapshot: EntitySnapshot,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send;

    /// Report a state change on an already registered entity.
    fn notify_state_changed(
        &self,
        snapshot: EntitySnapshot,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send;
}

impl<T: HostFramework> HostFramework for Arc<T> {
    fn register_entity(
        &self,
        snapshot: EntitySnapshot,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
        (**self).register_entity(snapshot)
    }

    fn notify_state_changed(
        &self,
        snapshot: EntitySnapshot,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
        (**self).notify_state_changed(snapshot)
    }
}
