//! MQTT adapter configuration.

use serde::Deserialize;

use farmhub_domain::discovery::DEFAULT_DISCOVERY_TOPIC;

/// Configuration for the MQTT bus adapter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Topic devices publish discovery announcements on.
    pub discovery_topic: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "farmhub".to_string(),
            keep_alive_secs: 30,
            discovery_topic: DEFAULT_DISCOVERY_TOPIC.to_string(),
        }
    }
}
