//! Integration tests for PgGameRepository.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use chrono::{Duration, Utc};
use gametracker_common::{
    BasicPlayer, GameId, GameProjection, HistoricGame, ModeData, TowerDefenceData, WinnerData,
};
use gametracker_engine::{CodecError, GameRepository, PgGameRepository, RepositoryError};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS live_games (
            id          TEXT         PRIMARY KEY,
            document    JSONB        NOT NULL,
            updated_at  TIMESTAMPTZ  NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(&pool)
    .await
    .ok()?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS historic_games (
            id          TEXT         PRIMARY KEY,
            document    JSONB        NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await
    .ok()?;

    Some(pool)
}

/// Each test uses its own id so tests can share the tables.
async fn fresh_id(pool: &PgPool, hex: &str) -> GameId {
    sqlx::query("DELETE FROM live_games WHERE id = $1").bind(hex).execute(pool).await.unwrap();
    sqlx::query("DELETE FROM historic_games WHERE id = $1").bind(hex).execute(pool).await.unwrap();
    hex.parse().unwrap()
}

fn game(id: GameId) -> GameProjection {
    let now = Utc::now();
    let mut game = GameProjection::started(
        id,
        "tower-defence",
        "srv-1",
        now,
        vec![BasicPlayer { id: Uuid::new_v4(), username: "p1".into() }],
        now,
    );
    game.mode_data = Some(ModeData::TowerDefence(TowerDefenceData { max_health: 1000, red_health: 500, blue_health: 750 }));
    game
}

#[tokio::test]
async fn live_game_round_trips_and_upserts() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let id = fresh_id(&pool, "aaaaaaaaaaaaaaaaaaaa0001").await;
    let repo = PgGameRepository::new(pool.clone());

    let mut live = game(id);
    repo.save_live_game(&live).await.unwrap();
    assert_eq!(repo.get_live_game(id).await.unwrap(), Some(live.clone()));

    live.mode_data = Some(ModeData::TowerDefence(TowerDefenceData { max_health: 1000, red_health: 10, blue_health: 750 }));
    repo.save_live_game(&live).await.unwrap();
    assert_eq!(repo.get_live_game(id).await.unwrap(), Some(live));

    let (discriminant,) = sqlx::query_as::<_, (i64,)>(
        "SELECT (document->'modeData'->>'discriminant')::BIGINT FROM live_games WHERE id = $1",
    )
    .bind(id.to_hex())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(discriminant, 1);

    repo.delete_live_game(id).await.unwrap();
    assert!(repo.get_live_game(id).await.unwrap().is_none());
    repo.delete_live_game(id).await.unwrap();
}

#[tokio::test]
async fn unknown_discriminant_fails_the_load() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let id = fresh_id(&pool, "aaaaaaaaaaaaaaaaaaaa0002").await;
    let repo = PgGameRepository::new(pool.clone());
    repo.save_live_game(&game(id)).await.unwrap();

    sqlx::query("UPDATE live_games SET document = jsonb_set(document, '{modeData,discriminant}', $2) WHERE id = $1")
        .bind(id.to_hex())
        .bind(json!(99))
        .execute(&pool)
        .await
        .unwrap();

    let err = repo.get_live_game(id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Codec(CodecError::UnknownModeDataType(99))));
}

#[tokio::test]
async fn historic_game_round_trips() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let id = fresh_id(&pool, "aaaaaaaaaaaaaaaaaaaa0003").await;
    let repo = PgGameRepository::new(pool);

    let live = game(id);
    let mut historic = HistoricGame::from_live(&live, live.start_time + Duration::minutes(20));
    historic.winner_data = Some(WinnerData { winners: live.players.clone(), losers: vec![] });

    repo.save_historic_game(&historic).await.unwrap();

    assert_eq!(repo.get_historic_game(id).await.unwrap(), Some(historic));
    assert!(repo.get_live_game(id).await.unwrap().is_none());
}
