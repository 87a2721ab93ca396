//! Mode-specific game data.
//!
//! `ModeData` is a closed set: every game mode the tracker understands gets a
//! variant here. The numeric tag used in the document store is assigned by the
//! codec and never appears in this module.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeData {
    TowerDefence(TowerDefenceData),
    BlockSumo(BlockSumoData),
}

impl ModeData {
    pub fn kind(&self) -> ModeKind {
        match self {
            ModeData::TowerDefence(_) => ModeKind::TowerDefence,
            ModeData::BlockSumo(_) => ModeKind::BlockSumo,
        }
    }
}

/// The variant of a `ModeData`, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    TowerDefence,
    BlockSumo,
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeKind::TowerDefence => f.write_str("tower_defence"),
            ModeKind::BlockSumo => f.write_str("block_sumo"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tower defence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerDefenceData {
    /// Baseline fixed at game start. Updates never touch it.
    pub max_health: i32,
    pub red_health: i32,
    pub blue_health: i32,
}

impl TowerDefenceData {
    /// Overwrite whichever team healths the update reports.
    pub fn apply_health(&mut self, red_health: Option<i32>, blue_health: Option<i32>) {
        if let Some(red) = red_health {
            self.red_health = red;
        }
        if let Some(blue) = blue_health {
            self.blue_health = blue;
        }
    }
}

// ---------------------------------------------------------------------------
// Block sumo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSumoData {
    pub scoreboard: BlockSumoScoreboard,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSumoScoreboard {
    pub entries: Vec<BlockSumoScoreboardEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSumoScoreboardEntry {
    pub player_id: Uuid,
    pub remaining_lives: i32,
    pub kills: i32,
    pub final_kills: i32,
}
