//! Payload catalogue: message bodies, their apply functions, and the
//! registries the tracker runs with.

pub mod block_sumo;
pub mod common;
pub mod tower_defence;

use gametracker_common::{GameProjection, HistoricGame};

use crate::registry::TypeRegistry;

/// Handlers for start and update envelopes.
pub fn live_registry() -> TypeRegistry<GameProjection> {
    TypeRegistry::builder()
        // Common
        .register_json(common::START_TEAM_DATA, common::apply_team_data)
        .register_json(common::TEAM_DATA, common::apply_team_data)
        // Tower defence
        .register_json(tower_defence::START_DATA, tower_defence::apply_start)
        .register_json(tower_defence::UPDATE_DATA, tower_defence::apply_update)
        // Block sumo
        .register_json(block_sumo::UPDATE_DATA, block_sumo::apply_update)
        .build()
}

/// Handlers for finish envelopes.
pub fn historic_registry() -> TypeRegistry<HistoricGame> {
    TypeRegistry::builder()
        // Common
        .register_json(common::FINISH_WINNER_DATA, common::apply_winner_data)
        // Tower defence
        .register_json(tower_defence::FINISH_DATA, tower_defence::apply_finish)
        // Block sumo
        .register_json(block_sumo::FINISH_DATA, block_sumo::apply_finish)
        .build()
}
