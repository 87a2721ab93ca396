//! Storage seam for game documents.

use std::sync::Arc;

use async_trait::async_trait;
use gametracker_common::{GameId, GameProjection, HistoricGame};
use thiserror::Error;

use crate::codec::CodecError;

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A stored document could not be turned back into a game. Retrying will
    /// not help.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The backend is unreachable or rejected the operation.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Loads and saves game documents.
///
/// Implemented by `PgGameRepository` (postgres) and `MemoryGameRepository`
/// (tests). Also implemented for `Arc<R>` so tests can keep a handle for
/// assertions.
#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn get_live_game(&self, id: GameId) -> Result<Option<GameProjection>, RepositoryError>;

    /// Upsert by id.
    async fn save_live_game(&self, game: &GameProjection) -> Result<(), RepositoryError>;

    /// No-op if the game does not exist.
    async fn delete_live_game(&self, id: GameId) -> Result<(), RepositoryError>;

    async fn get_historic_game(&self, id: GameId) -> Result<Option<HistoricGame>, RepositoryError>;

    /// Upsert by id.
    async fn save_historic_game(&self, game: &HistoricGame) -> Result<(), RepositoryError>;
}

#[async_trait]
impl<R: GameRepository + ?Sized> GameRepository for Arc<R> {
    async fn get_live_game(&self, id: GameId) -> Result<Option<GameProjection>, RepositoryError> {
        (**self).get_live_game(id).await
    }

    async fn save_live_game(&self, game: &GameProjection) -> Result<(), RepositoryError> {
        (**self).save_live_game(game).await
    }

    async fn delete_live_game(&self, id: GameId) -> Result<(), RepositoryError> {
        (**self).delete_live_game(id).await
    }

    async fn get_historic_game(&self, id: GameId) -> Result<Option<HistoricGame>, RepositoryError> {
        (**self).get_historic_game(id).await
    }

    async fn save_historic_game(&self, game: &HistoricGame) -> Result<(), RepositoryError> {
        (**self).save_historic_game(game).await
    }
}
