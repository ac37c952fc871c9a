//! Setup catalog — the YAML file describing a device and the sensors and
//! switches it can carry.
//!
//! Entries are ordered; the menu and `--select` refer to them by their
//! 1-based position, sensors first, then switches.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// The whole `setup_config.yaml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub device_info: DeviceInfo,
    #[serde(default)]
    pub sensors: Vec<SensorEntry>,
    #[serde(default)]
    pub switches: Vec<SwitchEntry>,
}

/// Identity of the device being configured.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceInfo {
    /// Short machine name, used in topic paths and the output file name.
    pub name: String,
    /// Human-readable label.
    pub friendly_name: String,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_board")]
    pub board: String,
}

/// One selectable sensor.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default = "default_update_interval")]
    pub update_interval: String,
    #[serde(default)]
    pub unit: Option<String>,
}

/// One selectable switch.
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default = "default_restore_mode")]
    pub restore_mode: String,
}

fn default_platform() -> String {
    "ESP32".to_string()
}

fn default_board() -> String {
    "esp32dev".to_string()
}

fn default_update_interval() -> String {
    "30s".to_string()
}

fn default_restore_mode() -> String {
    "ALWAYS_OFF".to_string()
}

impl Catalog {
    /// Load a catalog from a YAML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Parse a catalog from YAML text.
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(content).map_err(Into::into)
    }

    /// Total number of selectable items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.sensors.len() + self.switches.len()
    }

    /// Replace the enabled set with the given 1-based item numbers.
    ///
    /// Everything is disabled first; numbers out of range are returned so
    /// the caller can report them.
    pub fn apply_selection(&mut self, selections: &[usize]) -> Vec<usize> {
        for sensor in &mut self.sensors {
            sensor.enabled = false;
        }
        for switch in &mut self.switches {
            switch.enabled = false;
        }

        let sensor_count = self.sensors.len();
        let mut invalid = Vec::new();
        for &selection in selections {
            if (1..=sensor_count).contains(&selection) {
                self.sensors[selection - 1].enabled = true;
            } else if selection > sensor_count && selection <= self.item_count() {
                self.switches[selection - sensor_count - 1].enabled = true;
            } else {
                invalid.push(selection);
            }
        }
        invalid
    }

    /// Names of currently enabled sensors, in catalog order.
    #[must_use]
    pub fn enabled_sensor_names(&self) -> Vec<&str> {
        self.sensors
            .iter()
            .filter(|sensor| sensor.enabled)
            .map(|sensor| sensor.name.as_str())
            .collect()
    }

    /// Names of currently enabled switches, in catalog order.
    #[must_use]
    pub fn enabled_switch_names(&self) -> Vec<&str> {
        self.switches
            .iter()
            .filter(|switch| switch.enabled)
            .map(|switch| switch.name.as_str())
            .collect()
    }
}

/// Parse a comma-separated selection string such as `1,3,5`.
pub fn parse_selection(input: &str) -> anyhow::Result<Vec<usize>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .with_context(|| format!("invalid selection: {part}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
device_info:
  name: cf-esp-01
  friendly_name: Greenhouse Node 1

sensors:
  - id: temp
    name: Temperature
    description: DHT22 temperature probe
    enabled: true
    pin: GPIO4
    unit: C
  - id: humidity
    name: Humidity
    description: DHT22 humidity probe
    unit: "%"

switches:
  - id: pump
    name: Water Pump
    description: Relay on the irrigation pump
    pin: GPIO5
"#;

    #[test]
    fn should_parse_sample_catalog() {
        let catalog = Catalog::from_yaml(SAMPLE).unwrap();
        assert_eq!(catalog.device_info.name, "cf-esp-01");
        assert_eq!(catalog.device_info.platform, "ESP32");
        assert_eq!(catalog.sensors.len(), 2);
        assert_eq!(catalog.switches.len(), 1);
        assert!(catalog.sensors[0].enabled);
        assert!(!catalog.sensors[1].enabled);
        assert_eq!(catalog.sensors[0].update_interval, "30s");
        assert_eq!(catalog.switches[0].restore_mode, "ALWAYS_OFF");
    }

    #[test]
    fn should_reject_catalog_without_device_info() {
        assert!(Catalog::from_yaml("sensors: []").is_err());
    }

    #[test]
    fn should_parse_selection_with_whitespace() {
        assert_eq!(parse_selection("1, 3 ,5").unwrap(), vec![1, 3, 5]);
    }

    #[test]
    fn should_reject_non_numeric_selection() {
        assert!(parse_selection("1,two").is_err());
    }

    #[test]
    fn should_apply_selection_across_sensors_and_switches() {
        let mut catalog = Catalog::from_yaml(SAMPLE).unwrap();
        let invalid = catalog.apply_selection(&[2, 3]);

        assert!(invalid.is_empty());
        assert!(!catalog.sensors[0].enabled);
        assert!(catalog.sensors[1].enabled);
        assert!(catalog.switches[0].enabled);
    }

    #[test]
    fn should_report_out_of_range_selection() {
        let mut catalog = Catalog::from_yaml(SAMPLE).unwrap();
        let invalid = catalog.apply_selection(&[1, 0, 9]);

        assert_eq!(invalid, vec![0, 9]);
        assert!(catalog.sensors[0].enabled);
    }

    #[test]
    fn should_reset_previous_selection() {
        let mut catalog = Catalog::from_yaml(SAMPLE).unwrap();
        catalog.apply_selection(&[3]);

        assert!(!catalog.sensors[0].enabled);
        assert_eq!(catalog.enabled_switch_names(), vec!["Water Pump"]);
    }
}
