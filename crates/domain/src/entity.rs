//! Entity snapshots and switch state.
//!
//! A snapshot is the read-only view of a proxy entity handed to the host
//! framework on registration and on every state change. The live state
//! itself is owned by the proxy's task in the `app` crate.

use serde::Serialize;

/// On/off state of a switch proxy.
///
/// Switches start [`Off`](Self::Off) as an optimistic default until the
/// first state-topic message arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    On,
    #[default]
    Off,
}

impl SwitchState {
    /// Tolerant wire parse: `"ON"` and `"OFF"` are recognized, anything
    /// else yields `None` and leaves the previous state untouched.
    #[must_use]
    pub fn from_wire(payload: &str) -> Option<Self> {
        match payload {
            "ON" => Some(Self::On),
            "OFF" => Some(Self::Off),
            _ => None,
        }
    }

    /// The literal command payload for this state.
    #[must_use]
    pub fn to_wire(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }

    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl std::fmt::Display for SwitchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// Point-in-time view of one proxy entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntitySnapshot {
    Sensor {
        /// Unique id — the bound state topic.
        unique_id: String,
        name: String,
        unit: String,
        /// Last known reading; `None` until the first parseable payload.
        value: Option<f64>,
    },
    Switch {
        /// Unique id — the bound command topic.
        unique_id: String,
        name: String,
        state: SwitchState,
    },
}

impl EntitySnapshot {
    /// Unique id of the underlying proxy.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        match self {
            Self::Sensor { unique_id, .. } | Self::Switch { unique_id, .. } => unique_id,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Sensor { name, .. } | Self::Switch { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_off() {
        assert_eq!(SwitchState::default(), SwitchState::Off);
    }

    #[test]
    fn should_parse_on_and_off_payloads() {
        assert_eq!(SwitchState::from_wire("ON"), Some(SwitchState::On));
        assert_eq!(SwitchState::from_wire("OFF"), Some(SwitchState::Off));
    }

    #[test]
    fn should_ignore_unrecognized_payloads() {
        assert_eq!(SwitchState::from_wire("UNKNOWN"), None);
        assert_eq!(SwitchState::from_wire("on"), None);
        assert_eq!(SwitchState::from_wire(""), None);
    }

    #[test]
    fn should_roundtrip_through_wire_format() {
        assert_eq!(SwitchState::from_wire(SwitchState::On.to_wire()), Some(SwitchState::On));
        assert_eq!(SwitchState::from_wire(SwitchState::Off.to_wire()), Some(SwitchState::Off));
    }

    #[test]
    fn should_display_lowercase_state() {
        assert_eq!(SwitchState::On.to_string(), "on");
        assert_eq!(SwitchState::Off.to_string(), "off");
    }

    #[test]
    fn should_expose_unique_id_for_both_kinds() {
        let sensor = EntitySnapshot::Sensor {
            unique_id: "cf/dev/temp".to_string(),
            name: "Temp".to_string(),
            unit: "C".to_string(),
            value: Some(21.0),
        };
        let switch = EntitySnapshot::Switch {
            unique_id: "cf/dev/pump/set".to_string(),
            name: "Pump".to_string(),
            state: SwitchState::Off,
        };
        assert_eq!(sensor.unique_id(), "cf/dev/temp");
        assert_eq!(switch.unique_id(), "cf/dev/pump/set");
        assert_eq!(sensor.name(), "Temp");
        assert_eq!(switch.name(), "Pump");
    }

    #[test]
    fn should_serialize_snapshot_with_kind_tag() {
        let snapshot = EntitySnapshot::Switch {
            unique_id: "cf/dev/pump/set".to_string(),
            name: "Pump".to_string(),
            state: SwitchState::On,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["kind"], "switch");
        assert_eq!(json["state"], "on");
    }
}
