//! Game tracker service: consumes game envelopes from the event log and keeps
//! the live and historic game documents up to date.

pub mod consumer;
pub mod handler;
pub mod migrate;
pub mod source;

pub use consumer::GameEventConsumer;
pub use handler::{GameTracker, HandleError};
pub use source::{EventSource, MemoryEventSource, PgEventSource};
