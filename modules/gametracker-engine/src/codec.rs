//! Document codec for the schema-less game store.
//!
//! The store only keeps generic JSON, so `ModeData` is written as
//! `{"discriminant": <int>, "payload": {...}}`. Reading it back is two-phase:
//! the document is first loaded generically, then the discriminant picks the
//! concrete type the payload is decoded into. This module is the only place
//! that knows the discriminant of each mode.
//!
//! Discriminant 0 is reserved for "no mode data" and is never assigned.

use chrono::{DateTime, Utc};
use gametracker_common::{
    BasicPlayer, GameId, GameProjection, GameStage, HistoricGame, ModeData, ModeKind, Team,
    WinnerData,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub const NO_MODE_DATA: i64 = 0;
const TOWER_DEFENCE: i64 = 1;
const BLOCK_SUMO: i64 = 2;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Unknown mode data type: discriminant {0}")]
    UnknownModeDataType(i64),

    #[error("Mode data discriminant is not an integer: {0}")]
    MalformedDiscriminant(Value),

    #[error("Malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Discriminant written for each mode.
pub fn discriminant_of(kind: ModeKind) -> i64 {
    match kind {
        ModeKind::TowerDefence => TOWER_DEFENCE,
        ModeKind::BlockSumo => BLOCK_SUMO,
    }
}

// ---------------------------------------------------------------------------
// Mode data
// ---------------------------------------------------------------------------

/// Stored form of `ModeData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeDataDocument {
    pub discriminant: i64,
    pub payload: Value,
}

impl ModeDataDocument {
    pub fn encode(data: &ModeData) -> Result<Self, CodecError> {
        let payload = match data {
            ModeData::TowerDefence(d) => serde_json::to_value(d)?,
            ModeData::BlockSumo(d) => serde_json::to_value(d)?,
        };

        Ok(Self {
            discriminant: discriminant_of(data.kind()),
            payload,
        })
    }

    /// Second phase: decode the payload into the type the discriminant names.
    pub fn decode(self) -> Result<Option<ModeData>, CodecError> {
        match self.discriminant {
            NO_MODE_DATA => {
                if !self.payload.is_null() {
                    warn!("Mode data payload present without a discriminant, ignoring it");
                }
                Ok(None)
            }
            TOWER_DEFENCE => Ok(Some(ModeData::TowerDefence(serde_json::from_value(self.payload)?))),
            BLOCK_SUMO => Ok(Some(ModeData::BlockSumo(serde_json::from_value(self.payload)?))),
            other => Err(CodecError::UnknownModeDataType(other)),
        }
    }
}

/// `None` → absent field; `Some` → tagged document.
pub fn encode_mode_data(data: Option<&ModeData>) -> Result<Option<Value>, CodecError> {
    match data {
        Some(d) => Ok(Some(serde_json::to_value(ModeDataDocument::encode(d)?)?)),
        None => Ok(None),
    }
}

/// Decode a generically-loaded mode data value. A missing value, a missing
/// discriminant and discriminant 0 all mean "no mode data".
pub fn decode_mode_data(generic: Option<Value>) -> Result<Option<ModeData>, CodecError> {
    let Some(mut generic) = generic.filter(|v| !v.is_null()) else {
        return Ok(None);
    };

    let discriminant = match generic.get("discriminant") {
        None | Some(Value::Null) => NO_MODE_DATA,
        Some(raw) => raw
            .as_i64()
            .ok_or_else(|| CodecError::MalformedDiscriminant(raw.clone()))?,
    };
    let payload = generic
        .get_mut("payload")
        .map(Value::take)
        .unwrap_or(Value::Null);

    ModeDataDocument { discriminant, payload }.decode()
}

// ---------------------------------------------------------------------------
// Live games
// ---------------------------------------------------------------------------

/// Stored form of a `GameProjection`. `mode_data` stays generic until
/// `decode` resolves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveGameDocument {
    #[serde(rename = "_id")]
    pub id: GameId,
    pub game_mode_id: String,
    pub stage: GameStage,
    pub server_id: String,
    pub start_time: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub players: Vec<BasicPlayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<Team>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_data: Option<Value>,
}

impl LiveGameDocument {
    pub fn encode(game: &GameProjection) -> Result<Self, CodecError> {
        Ok(Self {
            id: game.id,
            game_mode_id: game.game_mode_id.clone(),
            stage: game.stage,
            server_id: game.server_id.clone(),
            start_time: game.start_time,
            last_updated: game.last_updated,
            players: game.players.clone(),
            teams: game.teams.clone(),
            mode_data: encode_mode_data(game.mode_data.as_ref())?,
        })
    }

    pub fn decode(self) -> Result<GameProjection, CodecError> {
        Ok(GameProjection {
            id: self.id,
            game_mode_id: self.game_mode_id,
            stage: self.stage,
            server_id: self.server_id,
            start_time: self.start_time,
            last_updated: self.last_updated,
            players: self.players,
            teams: self.teams,
            mode_data: decode_mode_data(self.mode_data)?,
        })
    }
}

/// Projection → store-writable JSON.
pub fn encode_live_game(game: &GameProjection) -> Result<Value, CodecError> {
    Ok(serde_json::to_value(LiveGameDocument::encode(game)?)?)
}

/// Store JSON → projection, resolving the mode data tag.
pub fn decode_live_game(document: Value) -> Result<GameProjection, CodecError> {
    serde_json::from_value::<LiveGameDocument>(document)?.decode()
}

// ---------------------------------------------------------------------------
// Historic games
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricGameDocument {
    #[serde(rename = "_id")]
    pub id: GameId,
    pub game_mode_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_data: Option<WinnerData>,
}

impl HistoricGameDocument {
    pub fn encode(game: &HistoricGame) -> Result<Self, CodecError> {
        Ok(Self {
            id: game.id,
            game_mode_id: game.game_mode_id.clone(),
            start_time: game.start_time,
            end_time: game.end_time,
            mode_data: encode_mode_data(game.mode_data.as_ref())?,
            winner_data: game.winner_data.clone(),
        })
    }

    pub fn decode(self) -> Result<HistoricGame, CodecError> {
        Ok(HistoricGame {
            id: self.id,
            game_mode_id: self.game_mode_id,
            start_time: self.start_time,
            end_time: self.end_time,
            mode_data: decode_mode_data(self.mode_data)?,
            winner_data: self.winner_data,
        })
    }
}

pub fn encode_historic_game(game: &HistoricGame) -> Result<Value, CodecError> {
    Ok(serde_json::to_value(HistoricGameDocument::encode(game)?)?)
}

pub fn decode_historic_game(document: Value) -> Result<HistoricGame, CodecError> {
    serde_json::from_value::<HistoricGameDocument>(document)?.decode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gametracker_common::{
        BlockSumoData, BlockSumoScoreboard, BlockSumoScoreboardEntry, TowerDefenceData,
    };
    use serde_json::json;
    use uuid::Uuid;

    fn tower_defence() -> ModeData {
        ModeData::TowerDefence(TowerDefenceData { max_health: 1000, red_health: 500, blue_health: 750 })
    }

    fn block_sumo() -> ModeData {
        ModeData::BlockSumo(BlockSumoData {
            scoreboard: BlockSumoScoreboard {
                entries: vec![BlockSumoScoreboardEntry {
                    player_id: Uuid::new_v4(),
                    remaining_lives: 2,
                    kills: 3,
                    final_kills: 1,
                }],
            },
        })
    }

    #[test]
    fn every_mode_round_trips() {
        for data in [tower_defence(), block_sumo()] {
            let encoded = encode_mode_data(Some(&data)).unwrap();
            assert_eq!(decode_mode_data(encoded).unwrap(), Some(data));
        }
    }

    #[test]
    fn discriminants_are_distinct_and_never_zero() {
        let td = discriminant_of(ModeKind::TowerDefence);
        let bs = discriminant_of(ModeKind::BlockSumo);
        assert_ne!(td, NO_MODE_DATA);
        assert_ne!(bs, NO_MODE_DATA);
        assert_ne!(td, bs);
    }

    #[test]
    fn encoded_shape_carries_discriminant_and_payload() {
        let encoded = encode_mode_data(Some(&tower_defence())).unwrap().unwrap();
        assert_eq!(
            encoded,
            json!({
                "discriminant": 1,
                "payload": {"maxHealth": 1000, "redHealth": 500, "blueHealth": 750}
            })
        );
    }

    #[test]
    fn absent_null_and_zero_mean_no_mode_data() {
        assert_eq!(decode_mode_data(None).unwrap(), None);
        assert_eq!(decode_mode_data(Some(Value::Null)).unwrap(), None);
        assert_eq!(decode_mode_data(Some(json!({"payload": {"x": 1}}))).unwrap(), None);
        assert_eq!(decode_mode_data(Some(json!({"discriminant": 0, "payload": {"x": 1}}))).unwrap(), None);
        assert_eq!(encode_mode_data(None).unwrap(), None);
    }

    #[test]
    fn unregistered_discriminant_is_an_error() {
        let err = decode_mode_data(Some(json!({"discriminant": 99, "payload": {}}))).unwrap_err();
        assert!(matches!(err, CodecError::UnknownModeDataType(99)));
    }

    #[test]
    fn non_integer_discriminant_is_an_error() {
        let err = decode_mode_data(Some(json!({"discriminant": "one", "payload": {}}))).unwrap_err();
        assert!(matches!(err, CodecError::MalformedDiscriminant(_)));
    }

    #[test]
    fn payload_not_matching_its_discriminant_is_malformed() {
        let err = decode_mode_data(Some(json!({"discriminant": 1, "payload": {"scoreboard": {"entries": []}}})))
            .unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn historic_document_round_trips() {
        let game = HistoricGame {
            id: "65a1b2c3d4e5f60718293a4b".parse().unwrap(),
            game_mode_id: "block-sumo".into(),
            start_time: Utc::now(),
            end_time: Utc::now(),
            mode_data: Some(block_sumo()),
            winner_data: Some(WinnerData {
                winners: vec![BasicPlayer { id: Uuid::new_v4(), username: "winner".into() }],
                losers: vec![],
            }),
        };

        let document = encode_historic_game(&game).unwrap();
        assert_eq!(document["_id"], "65a1b2c3d4e5f60718293a4b");
        assert_eq!(document["modeData"]["discriminant"], 2);
        assert_eq!(decode_historic_game(document).unwrap(), game);
    }
}
