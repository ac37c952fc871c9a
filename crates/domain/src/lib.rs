//! # farmhub-domain
//!
//! Pure domain model for the farmhub device bridge.
//!
//! ## Responsibilities
//! - Define the **discovery wire format**: the JSON payload a device
//!   publishes to announce its components, and the validated
//!   [`Component`](discovery::Component) it resolves into
//! - Define **entity snapshots** — the read-only view of a proxy entity
//!   handed to the host framework on registration and state change
//! - Define **switch state** and its tolerant `ON`/`OFF` wire parsing
//! - Define **host events** emitted by the in-process host framework
//! - Define the error taxonomy shared across the workspace
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO
//! crates. All IO boundaries are expressed as traits in the `app` crate
//! (ports).

pub mod discovery;
pub mod entity;
pub mod error;
pub mod event;
