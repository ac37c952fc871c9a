//! # farmhub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - [`MessageBus`](ports::MessageBus) — topic-based subscribe/publish
//!   - [`HostFramework`](ports::HostFramework) — entity registration and
//!     state-change notification
//! - Provide the **in-process host framework** ([`host::InProcessHost`])
//!   backed by a tokio broadcast channel
//! - Implement the discovery-to-entity binding protocol:
//!   - [`listener::DiscoveryListener`] — parses announcements, dispatches
//!     registration work
//!   - [`factory::EntityFactory`] — idempotent, topic-keyed registry of
//!     live proxies
//!   - [`proxy`] — sensor and switch proxy tasks
//!
//! ## Dependency rule
//! Depends on `farmhub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the
//! reverse — the bus handle is always passed in explicitly so the whole
//! protocol runs against a fake bus in tests.

pub mod factory;
pub mod host;
pub mod listener;
pub mod ports;
pub mod proxy;

#[cfg(test)]
pub(crate) mod testutil;
