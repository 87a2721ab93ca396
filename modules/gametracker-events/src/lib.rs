//! Game event stream: the inbound envelope and the Postgres-backed log it
//! travels through.
//!
//! Envelopes carry their mode-specific content as opaque `TypedPayload`s.
//! Nothing in this crate knows what those payloads mean.

pub mod envelope;
pub mod store;
pub mod types;

pub use envelope::{
    CommonGameData, GameEvent, GameFinishMessage, GameStartMessage, GameUpdateMessage, PlayerData,
    TypedPayload,
};
pub use store::EventStore;
pub use types::{AppendEvent, StoredEvent};
