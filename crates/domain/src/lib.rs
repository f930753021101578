//! Domain types for the GameBus messaging SDK.
//!
//! This crate holds the pure data model shared by publishers, subscribers,
//! and server-side relays: the application-facing [`GameEvent`] and the
//! versioned wire [`Envelope`] that carries it. No I/O lives here.

pub mod envelope;
pub mod event;

pub use envelope::{Envelope, SCHEMA_NAMESPACE, VERSION_PROPERTY};
pub use event::GameEvent;
