//! ESPHome-style YAML rendering.
//!
//! The output is plain string templating, mirroring what a firmware
//! engineer would write by hand. The one structured part is the MQTT
//! birth message: its payload is the device's discovery announcement,
//! serialized from the real wire types so the generated firmware and the
//! bridge can never disagree on the format.

use std::fmt::Write;

use farmhub_domain::discovery::{
    ComponentDescriptor, ComponentKind, DEFAULT_DISCOVERY_TOPIC, DiscoveryMessage,
};

use crate::catalog::Catalog;

/// State topic for an item of the device.
fn state_topic(device: &str, id: &str) -> String {
    format!("cf/{device}/{id}")
}

/// Command topic for a switch of the device.
fn command_topic(device: &str, id: &str) -> String {
    format!("cf/{device}/{id}/set")
}

/// Build the discovery announcement for every enabled item.
fn discovery_message(catalog: &Catalog) -> DiscoveryMessage {
    let device = &catalog.device_info.name;
    let mut components = Vec::new();
    for sensor in catalog.sensors.iter().filter(|sensor| sensor.enabled) {
        components.push(ComponentDescriptor {
            kind: ComponentKind::Sensor,
            name: Some(sensor.name.clone()),
            state_topic: Some(state_topic(device, &sensor.id)),
            command_topic: None,
            unit: sensor.unit.clone(),
        });
    }
    for switch in catalog.switches.iter().filter(|switch| switch.enabled) {
        components.push(ComponentDescriptor {
            kind: ComponentKind::Switch,
            name: Some(switch.name.clone()),
            state_topic: Some(state_topic(device, &switch.id)),
            command_topic: Some(command_topic(device, &switch.id)),
            unit: None,
        });
    }
    DiscoveryMessage {
        device_id: Some(device.clone()),
        components,
    }
}

/// Render the full configuration file for the catalog's enabled items.
pub fn render(catalog: &Catalog) -> anyhow::Result<String> {
    let device = &catalog.device_info.name;
    let announcement = serde_json::to_string(&discovery_message(catalog))?;

    let mut out = String::new();
    write!(
        out,
        "\
esphome:
  name: {device}
  friendly_name: {friendly}
  platform: {platform}
  board: {board}

logger:
  level: INFO

wifi:
  ssid: !secret wifi_ssid
  password: !secret wifi_password

mqtt:
  broker: !secret mqtt_broker
  username: !secret mqtt_username
  password: !secret mqtt_password
  discovery: false
  birth_message:
    topic: {discovery_topic}
    payload: '{announcement}'
",
        friendly = catalog.device_info.friendly_name,
        platform = catalog.device_info.platform,
        board = catalog.device_info.board,
        discovery_topic = DEFAULT_DISCOVERY_TOPIC,
    )?;

    let sensors: Vec<_> = catalog
        .sensors
        .iter()
        .filter(|sensor| sensor.enabled)
        .collect();
    if !sensors.is_empty() {
        out.push_str("\nsensor:\n");
        for sensor in sensors {
            writeln!(out, "  # {}", sensor.description)?;
            writeln!(out, "  - platform: template")?;
            writeln!(out, "    name: \"{}\"", sensor.name)?;
            writeln!(out, "    id: {}", sensor.id)?;
            if let Some(pin) = &sensor.pin {
                writeln!(out, "    pin: {pin}")?;
            }
            if let Some(unit) = &sensor.unit {
                writeln!(out, "    unit_of_measurement: \"{unit}\"")?;
            }
            writeln!(out, "    update_interval: {}", sensor.update_interval)?;
            writeln!(out, "    state_topic: {}", state_topic(device, &sensor.id))?;
        }
    }

    let switches: Vec<_> = catalog
        .switches
        .iter()
        .filter(|switch| switch.enabled)
        .collect();
    if !switches.is_empty() {
        out.push_str("\nswitch:\n");
        for switch in switches {
            writeln!(out, "  # {}", switch.description)?;
            writeln!(out, "  - platform: gpio")?;
            if let Some(pin) = &switch.pin {
                writeln!(out, "    pin: {pin}")?;
            }
            writeln!(out, "    name: \"{}\"", switch.name)?;
            writeln!(out, "    id: {}", switch.id)?;
            writeln!(out, "    restore_mode: {}", switch.restore_mode)?;
            writeln!(out, "    state_topic: {}", state_topic(device, &switch.id))?;
            writeln!(
                out,
                "    command_topic: {}",
                command_topic(device, &switch.id)
            )?;
        }
    }

    Ok(out)
}
