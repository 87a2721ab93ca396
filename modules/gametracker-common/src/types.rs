//! Live and historic game aggregates.
//!
//! These are the in-memory shapes the dispatcher mutates. How they are laid
//! out in the document store (and how `ModeData` is tagged there) is the
//! codec's business, not theirs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::GameTrackerError;
use crate::mode::ModeData;

// ---------------------------------------------------------------------------
// GameId
// ---------------------------------------------------------------------------

/// 12-byte game identifier, written as 24 hex characters on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameId([u8; 12]);

impl GameId {
    /// Lowercase hex form, the canonical key in every store.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for GameId {
    type Err = GameTrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| GameTrackerError::MalformedIdentifier(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for GameId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for GameId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Players and teams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicPlayer {
    pub id: Uuid,
    pub username: String,
}

impl BasicPlayer {
    /// Build a player from an unvalidated id string.
    pub fn parse(id: &str, username: impl Into<String>) -> Result<Self, GameTrackerError> {
        let id = Uuid::parse_str(id)
            .map_err(|_| GameTrackerError::MalformedPlayerId(id.to_string()))?;
        Ok(Self {
            id,
            username: username.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub friendly_name: String,
    /// RGB packed into the low 24 bits.
    pub color: i32,
    pub player_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStage {
    PreGame,
    InProgress,
}

// ---------------------------------------------------------------------------
// GameProjection
// ---------------------------------------------------------------------------

/// The live, mutable view of a running game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameProjection {
    pub id: GameId,
    pub game_mode_id: String,
    pub stage: GameStage,
    pub server_id: String,
    pub start_time: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub players: Vec<BasicPlayer>,
    /// Only present once a team payload has been seen.
    pub teams: Option<Vec<Team>>,
    /// Only present once a mode-specific payload has been seen.
    pub mode_data: Option<ModeData>,
}

impl GameProjection {
    /// A freshly started game. Mode data and teams arrive through dispatch.
    pub fn started(
        id: GameId,
        game_mode_id: impl Into<String>,
        server_id: impl Into<String>,
        start_time: DateTime<Utc>,
        players: Vec<BasicPlayer>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            game_mode_id: game_mode_id.into(),
            stage: GameStage::InProgress,
            server_id: server_id.into(),
            start_time,
            last_updated: now,
            players,
            teams: None,
            mode_data: None,
        }
    }

    /// Refresh the fields every update carries: the full player list and the
    /// last-updated stamp.
    pub fn refresh_common(&mut self, players: Vec<BasicPlayer>, now: DateTime<Utc>) {
        self.players = players;
        self.last_updated = now;
    }
}

// ---------------------------------------------------------------------------
// HistoricGame
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerData {
    pub winners: Vec<BasicPlayer>,
    pub losers: Vec<BasicPlayer>,
}

/// Immutable record of a finished game.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricGame {
    pub id: GameId,
    pub game_mode_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub mode_data: Option<ModeData>,
    pub winner_data: Option<WinnerData>,
}

impl HistoricGame {
    /// Seed a historic record from the live projection it supersedes.
    /// Finish payloads are dispatched into it afterwards.
    pub fn from_live(live: &GameProjection, end_time: DateTime<Utc>) -> Self {
        Self {
            id: live.id,
            game_mode_id: live.game_mode_id.clone(),
            start_time: live.start_time,
            end_time,
            mode_data: live.mode_data.clone(),
            winner_data: None,
        }
    }
}
