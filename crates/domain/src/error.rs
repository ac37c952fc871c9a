//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`FarmHubError`] via `#[from]` or [`FarmHubError::bus`]. No error in
//! this workspace is fatal to the hosting process: the worst-case effect
//! of a single bad message is that one proxy fails to update.

/// Top-level error for the farmhub workspace.
#[derive(Debug, thiserror::Error)]
pub enum FarmHubError {
    /// A component descriptor failed validation.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced entity does not exist.
    #[error("entity not found")]
    NotFound(#[from] NotFoundError),

    /// The proxy task backing an entity has stopped.
    #[error("proxy for {unique_id} has stopped")]
    ProxyStopped {
        /// Unique id of the entity whose task is gone.
        unique_id: String,
    },

    /// The message bus rejected a subscribe or publish call.
    #[error("message bus error")]
    Bus(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FarmHubError {
    /// Wrap a bus-client error for propagation across port boundaries.
    pub fn bus(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Bus(Box::new(err))
    }
}

/// Per-component validation failures.
///
/// These are recovered locally: an invalid descriptor is skipped without
/// affecting its siblings in the same discovery message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Both sensors and switches require a state topic.
    #[error("component is missing its state topic")]
    MissingStateTopic,

    /// Switches require a command topic.
    #[error("switch component is missing its command topic")]
    MissingCommandTopic,
}

/// A lookup by id found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    /// Kind of thing looked up (e.g. `"Entity"`).
    pub entity: &'static str,
    /// The id that was requested.
    pub id: String,
}
