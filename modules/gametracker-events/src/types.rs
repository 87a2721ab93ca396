//! Row types for the event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::GameEvent;

/// An event as stored in Postgres. Returned by all read methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub seq: i64,
    pub ts: DateTime<Utc>,
    pub event_type: String,
    pub game_id: Option<String>,
    pub payload: serde_json::Value,
}

impl StoredEvent {
    /// Decode the payload as a game envelope.
    pub fn game_event(&self) -> Result<GameEvent, serde_json::Error> {
        GameEvent::from_payload(&self.payload)
    }
}

/// An event to be appended. The caller builds this; the store assigns seq/ts.
#[derive(Debug, Clone)]
pub struct AppendEvent {
    pub event_type: String,
    pub game_id: Option<String>,
    pub payload: serde_json::Value,
}

impl AppendEvent {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            game_id: None,
            payload,
        }
    }

    /// Partition key. The consumer assumes one game id never spans two workers.
    pub fn with_game_id(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }
}

impl TryFrom<&GameEvent> for AppendEvent {
    type Error = serde_json::Error;

    fn try_from(event: &GameEvent) -> Result<Self, Self::Error> {
        Ok(AppendEvent::new(event.event_type(), event.to_payload()?)
            .with_game_id(event.common_data().game_id.clone()))
    }
}
