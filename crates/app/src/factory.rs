//! Entity factory — turns validated components into live, registered
//! proxies.
//!
//! The factory owns the registry of bound proxies, keyed by unique id
//! (state topic for sensors, command topic for switches). Registration is
//! idempotent on that key: re-delivery of an identical descriptor never
//! creates a second proxy or a second subscription.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use farmhub_domain::discovery::{Component, ComponentDescriptor};
use farmhub_domain::entity::EntitySnapshot;
use farmhub_domain::error::{FarmHubError, NotFoundError};

use crate::ports::{HostFramework, MessageBus};
use crate::proxy::{ProxyHandle, SensorProxy, SwitchProxy};

/// Outcome of a registration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new proxy was created and bound.
    Created,
    /// A proxy with this unique id already exists; nothing was done.
    Existing,
    /// The descriptor declared an unsupported kind and was skipped.
    Skipped,
}

/// Factory and registry for proxy entities.
///
/// Holds clones of the bus and host handles; both are borrowed shared
/// state, the factory never closes or reconfigures them.
pub struct EntityFactory<B, H> {
    bus: B,
    host: H,
    // Async mutex, held across binding: concurrent registrations of the
    // same unique id stay idempotent.
    registry: Mutex<HashMap<String, ProxyHandle>>,
}

impl<B, H> EntityFactory<B, H>
where
    B: MessageBus + Clone + 'static,
    H: HostFramework + Clone + 'static,
{
    /// Create a factory publishing through `bus` and announcing to `host`.
    pub fn new(bus: B, host: H) -> Self {
        Self {
            bus,
            host,
            registry: Mutex::new(HashMap::new()),
        }
    }

    /// Register a validated component, binding a new proxy unless one
    /// already exists for its unique id.
    ///
    /// # Errors
    ///
    /// Propagates bus errors from the subscribe call; those are surfaced
    /// to the caller, not retried here.
    pub async fn register(&self, component: Component) -> Result<Registration, FarmHubError> {
        let unique_id = component.unique_id().to_string();
        let mut registry = self.registry.lock().await;
        if registry.contains_key(&unique_id) {
            debug!(unique_id, "entity already registered, skipping");
            return Ok(Registration::Existing);
        }

        let handle = match component {
            Component::Sensor(config) => {
                let proxy = SensorProxy::new(config, self.bus.clone(), self.host.clone());
                self.host.register_entity(proxy.snapshot()).await?;
                ProxyHandle::Sensor(proxy.bind().await?)
            }
            Component::Switch(config) => {
                let proxy = SwitchProxy::new(config, self.bus.clone(), self.host.clone());
                self.host.register_entity(proxy.snapshot()).await?;
                ProxyHandle::Switch(proxy.bind().await?)
            }
        };

        info!(unique_id, name = handle.name(), "registered entity");
        registry.insert(unique_id, handle);
        Ok(Registration::Created)
    }

    /// Resolve a raw descriptor and register it.
    ///
    /// Unknown kinds are skipped silently.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the descriptor is missing a
    /// required topic, or a bus error from binding.
    pub async fn register_descriptor(
        &self,
        descriptor: ComponentDescriptor,
    ) -> Result<Registration, FarmHubError> {
        match descriptor.resolve()? {
            Some(component) => self.register(component).await,
            None => Ok(Registration::Skipped),
        }
    }

    /// Register every descriptor of one discovery message, in declared
    /// order. A descriptor failing validation or binding is logged and
    /// skipped without affecting its siblings.
    ///
    /// Returns the number of newly created proxies.
    pub async fn register_all(
        &self,
        device_id: Option<&str>,
        descriptors: Vec<ComponentDescriptor>,
    ) -> usize {
        let device_id = device_id.unwrap_or("<unknown>");
        let mut created = 0;
        for descriptor in descriptors {
            match self.register_descriptor(descriptor).await {
                Ok(Registration::Created) => created += 1,
                Ok(Registration::Existing | Registration::Skipped) => {}
                Err(err) => warn!(
                    device_id,
                    error = %err,
                    "skipping invalid component descriptor"
                ),
            }
        }
        created
    }

    /// Drop the proxy registered under `unique_id`, aborting its task and
    /// cancelling its bus subscription.
    ///
    /// # Errors
    ///
    /// Returns [`FarmHubError::NotFound`] when no such entity exists.
    pub async fn unregister(&self, unique_id: &str) -> Result<(), FarmHubError> {
        let mut registry = self.registry.lock().await;
        match registry.remove(unique_id) {
            Some(_handle) => {
                info!(unique_id, "unregistered entity");
                Ok(())
            }
            None => Err(NotFoundError {
                entity: "Entity",
                id: unique_id.to_string(),
            }
            .into()),
        }
    }

    /// Route a service call to the owning proxy.
    ///
    /// `turn_on` and `turn_off` act on switches; anything else — including
    /// any service on a sensor — is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FarmHubError::NotFound`] for an unknown unique id, or
    /// [`FarmHubError::ProxyStopped`] when the proxy task is gone.
    pub async fn handle_service_call(
        &self,
        unique_id: &str,
        service: &str,
    ) -> Result<(), FarmHubError> {
        let registry = self.registry.lock().await;
        let handle = registry.get(unique_id).ok_or_else(|| NotFoundError {
            entity: "Entity",
            id: unique_id.to_string(),
        })?;

        match (handle.as_switch(), service) {
            (Some(switch), "turn_on") => switch.turn_on().await,
            (Some(switch), "turn_off") => switch.turn_off().await,
            _ => {
                debug!(unique_id, service, "ignoring unsupported service call");
                Ok(())
            }
        }
    }

    /// Number of registered proxies.
    pub async fn len(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Whether no proxy is registered.
    pub async fn is_empty(&self) -> bool {
        self.registry.lock().await.is_empty()
    }

    /// Snapshot of one registered entity.
    pub async fn snapshot(&self, unique_id: &str) -> Option<EntitySnapshot> {
        self.registry
            .lock()
            .await
            .get(unique_id)
            .map(ProxyHandle::snapshot)
    }

    /// Snapshots of every registered entity, in no particular order.
    pub async fn snapshots(&self) -> Vec<EntitySnapshot> {
        self.registry
            .lock()
            .await
            .values()
            .map(ProxyHandle::snapshot)
            .collect()
    }
}
