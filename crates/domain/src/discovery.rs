//! Discovery wire format — the JSON payload a device publishes to
//! announce its components.
//!
//! A device sends one [`DiscoveryMessage`] to the discovery topic. Each
//! entry in `components` is a loosely-typed [`ComponentDescriptor`] that
//! resolves into a validated [`Component`] (or is skipped). Parsing is
//! deliberately tolerant: unknown component kinds and a missing
//! `device_id` are not errors, and a descriptor missing a required field
//! only fails that descriptor, never its siblings.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Topic devices announce themselves on unless configured otherwise.
pub const DEFAULT_DISCOVERY_TOPIC: &str = "cf/discovery";

/// One discovery announcement from a device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryMessage {
    /// Opaque identifier of the physical device. Only used for logging;
    /// announcements without one are still processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Declared components, in the order the device listed them.
    #[serde(default)]
    pub components: Vec<ComponentDescriptor>,
}

impl DiscoveryMessage {
    /// Parse a discovery payload.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error when the payload is not valid
    /// JSON of the expected shape. Callers drop such messages.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// Raw, unvalidated component entry as it appears on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Declared component kind.
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    /// Human-readable label. Defaults to the unique id when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Topic the device publishes live values/state to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_topic: Option<String>,
    /// Topic commands are published to (switches only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<String>,
    /// Unit of measurement (sensors only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl ComponentDescriptor {
    /// Resolve this descriptor into a validated [`Component`].
    ///
    /// Unknown kinds resolve to `None` (skipped silently, per protocol).
    /// Empty-string topics are treated the same as missing ones.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when a required topic is missing for
    /// the declared kind.
    pub fn resolve(self) -> Result<Option<Component>, ValidationError> {
        match self.kind {
            ComponentKind::Other => Ok(None),
            ComponentKind::Sensor => {
                let state_topic =
                    non_empty(self.state_topic).ok_or(ValidationError::MissingStateTopic)?;
                let name = self.name.unwrap_or_else(|| state_topic.clone());
                Ok(Some(Component::Sensor(SensorConfig {
                    name,
                    state_topic,
                    unit: self.unit.unwrap_or_default(),
                })))
            }
            ComponentKind::Switch => {
                let state_topic =
                    non_empty(self.state_topic).ok_or(ValidationError::MissingStateTopic)?;
                let command_topic =
                    non_empty(self.command_topic).ok_or(ValidationError::MissingCommandTopic)?;
                let name = self.name.unwrap_or_else(|| command_topic.clone());
                Ok(Some(Component::Switch(SwitchConfig {
                    name,
                    state_topic,
                    command_topic,
                })))
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Declared component kind. Anything the bridge does not understand maps
/// to [`Other`](Self::Other) so a single exotic entry never poisons the
/// rest of the message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentKind {
    Sensor,
    Switch,
    #[default]
    Other,
}

impl From<String> for ComponentKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "sensor" => Self::Sensor,
            "switch" => Self::Switch,
            _ => Self::Other,
        }
    }
}

impl From<ComponentKind> for String {
    fn from(value: ComponentKind) -> Self {
        match value {
            ComponentKind::Sensor => "sensor".to_string(),
            ComponentKind::Switch => "switch".to_string(),
            ComponentKind::Other => "other".to_string(),
        }
    }
}

/// A validated component, ready for registration.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Sensor(SensorConfig),
    Switch(SwitchConfig),
}

impl Component {
    /// Unique id of the proxy this component binds to: the state topic
    /// for sensors, the command topic for switches. Registration is
    /// de-duplicated on this key.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        match self {
            Self::Sensor(config) => &config.state_topic,
            Self::Switch(config) => &config.command_topic,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Sensor(config) => &config.name,
            Self::Switch(config) => &config.name,
        }
    }
}

/// Validated sensor declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    pub name: String,
    pub state_topic: String,
    pub unit: String,
}

/// Validated switch declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchConfig {
    pub name: String,
    pub state_topic: String,
    pub command_topic: String,
}
