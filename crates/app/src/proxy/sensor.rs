//! Sensor proxy — read-only numeric entity bound to a state topic.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use farmhub_domain::discovery::SensorConfig;
use farmhub_domain::entity::EntitySnapshot;
use farmhub_domain::error::FarmHubError;

use crate::ports::{HostFramework, MessageBus, Subscription};

/// An unbound sensor proxy.
///
/// Starts with no known value. [`bind`](Self::bind) subscribes to the
/// state topic and spawns the update task; the proxy never publishes.
pub struct SensorProxy<B, H> {
    config: SensorConfig,
    value: Option<f64>,
    bus: B,
    host: H,
}

impl<B, H> SensorProxy<B, H>
where
    B: MessageBus + 'static,
    H: HostFramework + 'static,
{
    /// Create a proxy for the given declaration.
    pub fn new(config: SensorConfig, bus: B, host: H) -> Self {
        Self {
            config,
            value: None,
            bus,
            host,
        }
    }

    /// Current state as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot::Sensor {
            unique_id: self.config.state_topic.clone(),
            name: self.config.name.clone(),
            unit: self.config.unit.clone(),
            value: self.value,
        }
    }

    /// Subscribe to the state topic and spawn the update task.
    ///
    /// # Errors
    ///
    /// Propagates the bus error when the subscribe call fails; the error
    /// is surfaced to the caller rather than retried here.
    pub async fn bind(self) -> Result<SensorHandle, FarmHubError> {
        let subscription = self.bus.subscribe(&self.config.state_topic).await?;
        let (value_tx, value_rx) = watch::channel(self.value);
        let name = self.config.name.clone();
        let unique_id = self.config.state_topic.clone();
        let unit = self.config.unit.clone();
        let task = tokio::spawn(self.run(subscription, value_tx));
        Ok(SensorHandle {
            name,
            unique_id,
            unit,
            value: value_rx,
            task,
        })
    }

    async fn run(mut self, mut subscription: Subscription, value_tx: watch::Sender<Option<f64>>) {
        while let Some(message) = subscription.recv().await {
            match message.payload.trim().parse::<f64>() {
                Ok(value) => {
                    self.value = Some(value);
                    let _ = value_tx.send(self.value);
                    if let Err(err) = self.host.notify_state_changed(self.snapshot()).await {
                        warn!(
                            topic = %self.config.state_topic,
                            error = %err,
                            "failed to notify host of sensor update"
                        );
                    }
                }
                // Previous value is retained; the bad payload is dropped.
                Err(_) => warn!(
                    topic = %self.config.state_topic,
                    payload = %message.payload,
                    "ignoring unparseable sensor payload"
                ),
            }
        }
    }
}

/// Handle to a bound sensor proxy.
///
/// Dropping the handle aborts the update task, which drops the bus
/// subscription.
#[derive(Debug)]
pub struct SensorHandle {
    name: String,
    unique_id: String,
    unit: String,
    value: watch::Receiver<Option<f64>>,
    task: JoinHandle<()>,
}

impl SensorHandle {
    /// Unique id — the bound state topic.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Human-readable label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit of measurement, empty when the device declared none.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Last known reading, `None` until the first parseable payload.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        *self.value.borrow()
    }

    /// Current state as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot::Sensor {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            unit: self.unit.clone(),
            value: self.value(),
        }
    }
}

impl Drop for SensorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
