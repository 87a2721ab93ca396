use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

const STATEMENTS: &[&str] = &[
    // Event log
    r#"
    CREATE TABLE IF NOT EXISTS game_events (
        seq         BIGSERIAL PRIMARY KEY,
        ts          TIMESTAMPTZ NOT NULL DEFAULT now(),
        event_type  TEXT NOT NULL,
        game_id     TEXT,
        payload     JSONB NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS game_events_game_id_idx ON game_events (game_id)",
    r#"
    CREATE TABLE IF NOT EXISTS consumer_offsets (
        consumer_group  TEXT PRIMARY KEY,
        next_seq        BIGINT NOT NULL,
        updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    // Game documents
    r#"
    CREATE TABLE IF NOT EXISTS live_games (
        id          TEXT PRIMARY KEY,
        document    JSONB NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS historic_games (
        id          TEXT PRIMARY KEY,
        document    JSONB NOT NULL
    )
    "#,
];

/// Run idempotent schema migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    info!("Running schema migrations...");

    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Migration failed: {}", statement.trim()))?;
    }

    info!("Schema migrations complete");
    Ok(())
}
