//! Mode-agnostic payloads: teams and winners.

use gametracker_common::{BasicPlayer, GameProjection, GameTrackerError, HistoricGame, Team, WinnerData};
use serde::{Deserialize, Serialize};

pub const START_TEAM_DATA: &str = "gametracker.CommonGameStartTeamData";
pub const TEAM_DATA: &str = "gametracker.CommonGameTeamData";
pub const FINISH_WINNER_DATA: &str = "gametracker.CommonGameFinishWinnerData";

/// Body of both team payloads. Player ids must be UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamData {
    #[serde(default)]
    pub teams: Vec<Team>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishWinnerData {
    #[serde(default)]
    pub winners: Vec<BasicPlayer>,
    #[serde(default)]
    pub losers: Vec<BasicPlayer>,
}

/// Full replace: the latest team payload is the team list.
pub fn apply_team_data(data: TeamData, game: &mut GameProjection) -> Result<(), GameTrackerError> {
    game.teams = Some(data.teams);
    Ok(())
}

pub fn apply_winner_data(data: FinishWinnerData, game: &mut HistoricGame) -> Result<(), GameTrackerError> {
    game.winner_data = Some(WinnerData {
        winners: data.winners,
        losers: data.losers,
    });
    Ok(())
}
