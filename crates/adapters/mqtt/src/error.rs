//! MQTT adapter error types.

use farmhub_domain::error::FarmHubError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),
}

impl MqttError {
    /// Convert into a [`FarmHubError::Bus`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> FarmHubError {
        FarmHubError::bus(self)
    }
}

impl From<MqttError> for FarmHubError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
