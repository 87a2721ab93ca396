//! GameRepository implementations.
//!
//! Both implementations store the codec's JSON documents, never the Rust
//! types directly, so a load always goes through the two-phase mode data decode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use gametracker_common::{GameId, GameProjection, HistoricGame};
use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::codec::{decode_historic_game, decode_live_game, encode_historic_game, encode_live_game};
use crate::traits::{GameRepository, RepositoryError};

// ---------------------------------------------------------------------------
// PgGameRepository (production, postgres JSONB documents)
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgGameRepository {
    pool: PgPool,
}

impl PgGameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameRepository for PgGameRepository {
    async fn get_live_game(&self, id: GameId) -> Result<Option<GameProjection>, RepositoryError> {
        let row = sqlx::query_as::<_, (Value,)>("SELECT document FROM live_games WHERE id = $1")
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to load live game {id}"))?;

        match row {
            Some((document,)) => Ok(Some(decode_live_game(document)?)),
            None => Ok(None),
        }
    }

    async fn save_live_game(&self, game: &GameProjection) -> Result<(), RepositoryError> {
        let document = encode_live_game(game)?;

        sqlx::query(
            r#"
            INSERT INTO live_games (id, document, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (id)
            DO UPDATE SET document = EXCLUDED.document, updated_at = now()
            "#,
        )
        .bind(game.id.to_hex())
        .bind(&document)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save live game {}", game.id))?;

        Ok(())
    }

    async fn delete_live_game(&self, id: GameId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM live_games WHERE id = $1")
            .bind(id.to_hex())
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete live game {id}"))?;

        Ok(())
    }

    async fn get_historic_game(&self, id: GameId) -> Result<Option<HistoricGame>, RepositoryError> {
        let row = sqlx::query_as::<_, (Value,)>("SELECT document FROM historic_games WHERE id = $1")
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to load historic game {id}"))?;

        match row {
            Some((document,)) => Ok(Some(decode_historic_game(document)?)),
            None => Ok(None),
        }
    }

    async fn save_historic_game(&self, game: &HistoricGame) -> Result<(), RepositoryError> {
        let document = encode_historic_game(game)?;

        sqlx::query(
            r#"
            INSERT INTO historic_games (id, document)
            VALUES ($1, $2)
            ON CONFLICT (id)
            DO UPDATE SET document = EXCLUDED.document
            "#,
        )
        .bind(game.id.to_hex())
        .bind(&document)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save historic game {}", game.id))?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryGameRepository (tests, no database required)
// ---------------------------------------------------------------------------

/// In-memory repository for testing. Keeps encoded JSON documents and counts
/// store calls so tests can assert on access patterns.
#[derive(Default)]
pub struct MemoryGameRepository {
    live: Mutex<HashMap<GameId, Value>>,
    historic: Mutex<HashMap<GameId, Value>>,
    calls: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of repository calls made so far, of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail as if the store were unreachable.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The raw stored document for a live game.
    pub async fn live_document(&self, id: GameId) -> Option<Value> {
        self.live.lock().await.get(&id).cloned()
    }

    /// Store a raw document, bypassing the codec.
    pub async fn insert_live_document(&self, id: GameId, document: Value) {
        self.live.lock().await.insert(id, document);
    }

    pub async fn live_count(&self) -> usize {
        self.live.lock().await.len()
    }

    pub async fn historic_count(&self) -> usize {
        self.historic.lock().await.len()
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("memory store is rejecting writes").into());
        }
        Ok(())
    }
}

#[async_trait]
impl GameRepository for MemoryGameRepository {
    async fn get_live_game(&self, id: GameId) -> Result<Option<GameProjection>, RepositoryError> {
        self.record_call();
        let document = self.live.lock().await.get(&id).cloned();
        match document {
            Some(document) => Ok(Some(decode_live_game(document)?)),
            None => Ok(None),
        }
    }

    async fn save_live_game(&self, game: &GameProjection) -> Result<(), RepositoryError> {
        self.record_call();
        self.check_writable()?;
        let document = encode_live_game(game)?;
        self.live.lock().await.insert(game.id, document);
        Ok(())
    }

    async fn delete_live_game(&self, id: GameId) -> Result<(), RepositoryError> {
        self.record_call();
        self.check_writable()?;
        self.live.lock().await.remove(&id);
        Ok(())
    }

    async fn get_historic_game(&self, id: GameId) -> Result<Option<HistoricGame>, RepositoryError> {
        self.record_call();
        let document = self.historic.lock().await.get(&id).cloned();
        match document {
            Some(document) => Ok(Some(decode_historic_game(document)?)),
            None => Ok(None),
        }
    }

    async fn save_historic_game(&self, game: &HistoricGame) -> Result<(), RepositoryError> {
        self.record_call();
        self.check_writable()?;
        let document = encode_historic_game(game)?;
        self.historic.lock().await.insert(game.id, document);
        Ok(())
    }
}
