//! Tower defence payloads.
//!
//! Start sets the full health picture including `maxHealth`. Updates only move
//! the team healths they carry; the max is a start-time baseline.

use gametracker_common::{GameProjection, GameTrackerError, HistoricGame, ModeData, ModeKind, TowerDefenceData};
use serde::{Deserialize, Serialize};

pub const START_DATA: &str = "gametracker.TowerDefenceStartData";
pub const UPDATE_DATA: &str = "gametracker.TowerDefenceUpdateData";
pub const FINISH_DATA: &str = "gametracker.TowerDefenceFinishData";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub max_health: i32,
    pub blue_health: i32,
    pub red_health: i32,
}

impl From<HealthData> for TowerDefenceData {
    fn from(h: HealthData) -> Self {
        TowerDefenceData {
            max_health: h.max_health,
            red_health: h.red_health,
            blue_health: h.blue_health,
        }
    }
}

/// Health as reported mid-game. A `maxHealth` in the body is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blue_health: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_health: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartData {
    pub health_data: HealthData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateData {
    pub health_data: HealthUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishData {
    pub health_data: HealthData,
}

pub fn apply_start(data: StartData, game: &mut GameProjection) -> Result<(), GameTrackerError> {
    game.mode_data = Some(ModeData::TowerDefence(data.health_data.into()));
    Ok(())
}

/// Partial overwrite of an existing tower defence state.
pub fn apply_update(data: UpdateData, game: &mut GameProjection) -> Result<(), GameTrackerError> {
    match game.mode_data.as_mut() {
        Some(ModeData::TowerDefence(current)) => {
            current.apply_health(data.health_data.red_health, data.health_data.blue_health);
            Ok(())
        }
        other => Err(GameTrackerError::ModeDataMismatch {
            expected: ModeKind::TowerDefence,
            found: other.map(|d| d.kind()),
        }),
    }
}

pub fn apply_finish(data: FinishData, game: &mut HistoricGame) -> Result<(), GameTrackerError> {
    game.mode_data = Some(ModeData::TowerDefence(data.health_data.into()));
    Ok(())
}
