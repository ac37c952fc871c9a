//! Switch proxy — controllable on/off entity bound to a state topic and a
//! command topic.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use farmhub_domain::discovery::SwitchConfig;
use farmhub_domain::entity::{EntitySnapshot, SwitchState};
use farmhub_domain::error::FarmHubError;

use crate::ports::{HostFramework, MessageBus, Subscription};

/// Command accepted by a bound switch proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchCommand {
    TurnOn,
    TurnOff,
}

impl SwitchCommand {
    fn target_state(self) -> SwitchState {
        match self {
            Self::TurnOn => SwitchState::On,
            Self::TurnOff => SwitchState::Off,
        }
    }
}

/// An unbound switch proxy.
///
/// Starts [`Off`](SwitchState::Off) pending the first state-topic
/// message. [`bind`](Self::bind) subscribes to the state topic and spawns
/// the task that serializes inbound state messages and outbound commands.
pub struct SwitchProxy<B, H> {
    config: SwitchConfig,
    state: SwitchState,
    bus: B,
    host: H,
}

impl<B, H> SwitchProxy<B, H>
where
    B: MessageBus + 'static,
    H: HostFramework + 'static,
{
    /// Create a proxy for the given declaration.
    pub fn new(config: SwitchConfig, bus: B, host: H) -> Self {
        Self {
            config,
            state: SwitchState::Off,
            bus,
            host,
        }
    }

    /// Current state as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot::Switch {
            unique_id: self.config.command_topic.clone(),
            name: self.config.name.clone(),
            state: self.state,
        }
    }

    /// Subscribe to the state topic and spawn the proxy task.
    ///
    /// # Errors
    ///
    /// Propagates the bus error when the subscribe call fails.
    pub async fn bind(self) -> Result<SwitchHandle, FarmHubError> {
        let subscription = self.bus.subscribe(&self.config.state_topic).await?;
        let (command_tx, command_rx) = mpsc::channel(8);
        let (state_tx, state_rx) = watch::channel(self.state);
        let name = self.config.name.clone();
        let unique_id = self.config.command_topic.clone();
        let task = tokio::spawn(self.run(subscription, command_rx, state_tx));
        Ok(SwitchHandle {
            name,
            unique_id,
            state: state_rx,
            commands: command_tx,
            task,
        })
    }

    async fn run(
        mut self,
        mut subscription: Subscription,
        mut commands: mpsc::Receiver<SwitchCommand>,
        state_tx: watch::Sender<SwitchState>,
    ) {
        loop {
            tokio::select! {
                message = subscription.recv() => {
                    let Some(message) = message else { break };
                    match SwitchState::from_wire(message.payload.trim()) {
                        Some(state) => self.apply(state, &state_tx).await,
                        // Tolerant parse: anything but ON/OFF is ignored.
                        None => debug!(
                            topic = %self.config.state_topic,
                            payload = %message.payload,
                            "ignoring unrecognized switch payload"
                        ),
                    }
                }
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    // Optimistic: reflect intent locally before the device
                    // confirms; a later state-topic message wins.
                    let state = command.target_state();
                    self.apply(state, &state_tx).await;
                    if let Err(err) = self
                        .bus
                        .publish(&self.config.command_topic, state.to_wire())
                        .await
                    {
                        warn!(
                            topic = %self.config.command_topic,
                            error = %err,
                            "failed to publish switch command"
                        );
                    }
                }
            }
        }
    }

    async fn apply(&mut self, state: SwitchState, state_tx: &watch::Sender<SwitchState>) {
        self.state = state;
        if let Err(err) = self.host.notify_state_changed(self.snapshot()).await {
            warn!(
                topic = %self.config.command_topic,
                error = %err,
                "failed to notify host of switch update"
            );
        }
        // The watch send comes last: command callers wake on it and must
        // already see the host notified.
        let _ = state_tx.send(state);
    }
}

/// Handle to a bound switch proxy.
///
/// Dropping the handle aborts the proxy task, which drops the bus
/// subscription.
#[derive(Debug)]
pub struct SwitchHandle {
    name: String,
    unique_id: String,
    state: watch::Receiver<SwitchState>,
    commands: mpsc::Sender<SwitchCommand>,
    task: JoinHandle<()>,
}

impl SwitchHandle {
    /// Unique id — the bound command topic.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Human-readable label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current displayed state.
    #[must_use]
    pub fn state(&self) -> SwitchState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state().is_on()
    }

    /// Current state as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot::Switch {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            state: self.state(),
        }
    }

    /// Turn the switch on: optimistic local state change, then `"ON"`
    /// published to the command topic.
    ///
    /// # Errors
    ///
    /// Returns [`FarmHubError::ProxyStopped`] when the proxy task is gone.
    pub async fn turn_on(&self) -> Result<(), FarmHubError> {
        self.command(SwitchCommand::TurnOn).await
    }

    /// Turn the switch off: optimistic local state change, then `"OFF"`
    /// published to the command topic.
    ///
    /// # Errors
    ///
    /// Returns [`FarmHubError::ProxyStopped`] when the proxy task is gone.
    pub async fn turn_off(&self) -> Result<(), FarmHubError> {
        self.command(SwitchCommand::TurnOff).await
    }

    /// Send a command and wait for the proxy task to apply the optimistic
    /// state change, so callers observe it immediately on return.
    async fn command(&self, command: SwitchCommand) -> Result<(), FarmHubError> {
        let mut state = self.state.clone();
        state.borrow_and_update();
        self.commands
            .send(command)
            .await
            .map_err(|_| self.stopped())?;
        state.changed().await.map_err(|_| self.stopped())?;
        Ok(())
    }

    fn stopped(&self) -> FarmHubError {
        FarmHubError::ProxyStopped {
            unique_id: self.unique_id.clone(),
        }
    }
}

impl Drop for SwitchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::BusMessage;
    use crate::testutil::{FakeBus, RecordingHost, wait_until};

    fn config() -> SwitchConfig {
        SwitchConfig {
            name: "Pump".to_string(),
            state_topic: "cf/dev/pump".to_string(),
            command_topic: "cf/dev/pump/set".to_string(),
        }
    }

    async fn bound_switch(bus: &FakeBus, host: &RecordingHost) -> SwitchHandle {
        SwitchProxy::new(config(), bus.clone(), host.clone())
            .bind()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn should_start_off() {
        let bus = FakeBus::new();
        let host = RecordingHost::new();
        let handle = bound_switch(&bus, &host).await;
        assert_eq!(handle.state(), SwitchState::Off);
        assert_eq!(handle.unique_id(), "cf/dev/pump/set");
    }

    #[tokio::test]
    async fn should_reflect_on_state_immediately_after_turn_on() {
        let bus = FakeBus::new();
        let host = RecordingHost::new();
        let handle = bound_switch(&bus, &host).await;

        handle.turn_on().await.unwrap();
        assert!(handle.is_on());

        wait_until(|| !bus.published().is_empty()).await;
        assert_eq!(
            bus.published(),
            vec![BusMessage {
                topic: "cf/dev/pump/set".to_string(),
                payload: "ON".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn should_publish_off_command_on_turn_off() {
        let bus = FakeBus::new();
        let host = RecordingHost::new();
        let handle = bound_switch(&bus, &host).await;

        handle.turn_on().await.unwrap();
        handle.turn_off().await.unwrap();
        assert_eq!(handle.state(), SwitchState::Off);

        wait_until(|| bus.published().len() == 2).await;
        assert_eq!(bus.published()[1].payload, "OFF");
    }

    #[tokio::test]
    async fn should_let_device_state_correct_optimistic_state() {
        let bus = FakeBus::new();
        let host = RecordingHost::new();
        let handle = bound_switch(&bus, &host).await;

        handle.turn_on().await.unwrap();
        assert!(handle.is_on());

        // Device reports it is actually off: last write wins.
        bus.emit("cf/dev/pump", "OFF").await;
        wait_until(|| handle.state() == SwitchState::Off).await;
    }

    #[tokio::test]
    async fn should_apply_on_and_off_state_messages() {
        let bus = FakeBus::new();
        let host = RecordingHost::new();
        let handle = bound_switch(&bus, &host).await;

        bus.emit("cf/dev/pump", "ON").await;
        wait_until(|| handle.state() == SwitchState::On).await;

        bus.emit("cf/dev/pump", "OFF").await;
        wait_until(|| handle.state() == SwitchState::Off).await;
    }

    #[tokio::test]
    async fn should_ignore_unrecognized_state_payload() {
        let bus = FakeBus::new();
        let host = RecordingHost::new();
        let handle = bound_switch(&bus, &host).await;

        bus.emit("cf/dev/pump", "ON").await;
        wait_until(|| handle.state() == SwitchState::On).await;

        bus.emit("cf/dev/pump", "UNKNOWN").await;
        bus.emit("cf/dev/pump", "OFF").await;
        wait_until(|| handle.state() == SwitchState::Off).await;

        // UNKNOWN produced neither a state change nor a notification.
        assert_eq!(host.state_changes().len(), 2);
    }

    #[tokio::test]
    async fn should_notify_host_before_publishing_command() {
        let bus = FakeBus::new();
        let host = RecordingHost::new();
        let handle = bound_switch(&bus, &host).await;

        handle.turn_on().await.unwrap();

        // The optimistic notification is already visible when turn_on
        // returns, even if the publish is still in flight.
        let changes = host.state_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0],
            EntitySnapshot::Switch {
                unique_id: "cf/dev/pump/set".to_string(),
                name: "Pump".to_string(),
                state: SwitchState::On,
            }
        );
    }

    #[tokio::test]
    async fn should_cancel_subscription_when_handle_dropped() {
        let bus = FakeBus::new();
        let host = RecordingHost::new();
        let handle = bound_switch(&bus, &host).await;

        drop(handle);
        wait_until(|| bus.subscriber_count("cf/dev/pump") == 0).await;
    }
}
