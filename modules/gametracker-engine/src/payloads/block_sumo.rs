//! Block sumo payloads. Every scoreboard carries absolute values, so each one
//! replaces the previous scoreboard outright.

use gametracker_common::{
    BasicPlayer, BlockSumoData, BlockSumoScoreboard, BlockSumoScoreboardEntry, GameProjection,
    GameTrackerError, HistoricGame, ModeData, ModeKind,
};
use serde::{Deserialize, Serialize};

pub const UPDATE_DATA: &str = "gametracker.BlockSumoUpdateData";
pub const FINISH_DATA: &str = "gametracker.BlockSumoFinishData";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardMessage {
    #[serde(default)]
    pub entries: Vec<ScoreboardEntryMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardEntryMessage {
    pub player: BasicPlayer,
    #[serde(default)]
    pub remaining_lives: i32,
    #[serde(default)]
    pub kills: i32,
    #[serde(default)]
    pub final_kills: i32,
}

impl From<ScoreboardMessage> for BlockSumoScoreboard {
    fn from(msg: ScoreboardMessage) -> Self {
        BlockSumoScoreboard {
            entries: msg
                .entries
                .into_iter()
                .map(|e| BlockSumoScoreboardEntry {
                    player_id: e.player.id,
                    remaining_lives: e.remaining_lives,
                    kills: e.kills,
                    final_kills: e.final_kills,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateData {
    pub scoreboard: ScoreboardMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishData {
    pub scoreboard: ScoreboardMessage,
}

/// First update creates the block sumo state; later ones replace the scoreboard.
pub fn apply_update(data: UpdateData, game: &mut GameProjection) -> Result<(), GameTrackerError> {
    let scoreboard = data.scoreboard.into();
    match game.mode_data.as_mut() {
        None => {
            game.mode_data = Some(ModeData::BlockSumo(BlockSumoData { scoreboard }));
            Ok(())
        }
        Some(ModeData::BlockSumo(current)) => {
            current.scoreboard = scoreboard;
            Ok(())
        }
        Some(other) => Err(GameTrackerError::ModeDataMismatch {
            expected: ModeKind::BlockSumo,
            found: Some(other.kind()),
        }),
    }
}

pub fn apply_finish(data: FinishData, game: &mut HistoricGame) -> Result<(), GameTrackerError> {
    game.mode_data = Some(ModeData::BlockSumo(BlockSumoData {
        scoreboard: data.scoreboard.into(),
    }));
    Ok(())
}
