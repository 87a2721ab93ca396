//! EventStore: the game event log, backed by Postgres.
//!
//! Gap-free reads are guaranteed internally. Consumers never see BIGSERIAL gaps
//! from rolled-back or in-flight transactions, so a committed offset can never
//! skip an event that commits late.

use anyhow::Result;
use sqlx::PgPool;
use tracing::debug;

use crate::types::{AppendEvent, StoredEvent};

/// Append-only log of game envelopes plus per-group consumer offsets.
#[derive(Clone)]
pub struct EventStore {
    pool: PgPool,
}

impl EventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an event. Returns its sequence number.
    pub async fn append(&self, event: AppendEvent) -> Result<i64> {
        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO game_events (event_type, game_id, payload)
            VALUES ($1, $2, $3)
            RETURNING seq
            "#,
        )
        .bind(&event.event_type)
        .bind(&event.game_id)
        .bind(&event.payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Read events in sequence order starting from `seq_start` (inclusive).
    ///
    /// **Gap-free guarantee:** if concurrent transactions left a momentary gap,
    /// this returns events only up to the gap boundary. The next call picks up
    /// where it left off once the gap closes.
    pub async fn read_from(&self, seq_start: i64, limit: usize) -> Result<Vec<StoredEvent>> {
        let rows = sqlx::query_as::<_, StoredEvent>(
            r#"
            SELECT seq, ts, event_type, game_id, payload
            FROM game_events
            WHERE seq >= $1
            ORDER BY seq ASC
            LIMIT $2
            "#,
        )
        .bind(seq_start)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(take_contiguous(seq_start, rows))
    }

    /// The latest committed sequence number, or 0 if the log is empty.
    pub async fn latest_seq(&self) -> Result<i64> {
        let row = sqlx::query_as::<_, (Option<i64>,)>("SELECT MAX(seq) FROM game_events")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0.unwrap_or(0))
    }

    /// The smallest committed seq at or after `seq`, if any. Used to step over
    /// a gap left by a rolled-back insert once it is clearly not going to fill.
    pub async fn first_seq_from(&self, seq: i64) -> Result<Option<i64>> {
        let row = sqlx::query_as::<_, (Option<i64>,)>(
            "SELECT MIN(seq) FROM game_events WHERE seq >= $1",
        )
        .bind(seq)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Next sequence number a consumer group should read. 1 for a new group.
    pub async fn load_offset(&self, consumer_group: &str) -> Result<i64> {
        let row = sqlx::query_as::<_, (i64,)>(
            "SELECT next_seq FROM consumer_offsets WHERE consumer_group = $1",
        )
        .bind(consumer_group)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0).unwrap_or(1))
    }

    /// Record that everything below `next_seq` has been handled.
    pub async fn commit_offset(&self, consumer_group: &str, next_seq: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO consumer_offsets (consumer_group, next_seq, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (consumer_group)
            DO UPDATE SET next_seq = EXCLUDED.next_seq, updated_at = now()
            "#,
        )
        .bind(consumer_group)
        .bind(next_seq)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Keep the leading run of rows whose seqs are contiguous from `seq_start`.
fn take_contiguous(seq_start: i64, rows: Vec<StoredEvent>) -> Vec<StoredEvent> {
    let mut result = Vec::with_capacity(rows.len());
    let mut expected_seq = seq_start;

    for row in rows {
        if row.seq != expected_seq {
            // An in-flight transaction hasn't committed yet.
            debug!(expected_seq, found_seq = row.seq, "Gap in event log, stopping read");
            break;
        }
        expected_seq = row.seq + 1;
        result.push(row);
    }

    result
}

// ---------------------------------------------------------------------------
// sqlx::FromRow for StoredEvent
// ---------------------------------------------------------------------------

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredEvent {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(StoredEvent {
            seq: row.try_get("seq")?,
            ts: row.try_get("ts")?,
            event_type: row.try_get("event_type")?,
            game_id: row.try_get("game_id")?,
            payload: row.try_get("payload")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Test utilities
// ---------------------------------------------------------------------------

#[cfg(feature = "test-utils")]
impl EventStore {
    /// Read all events (for tests). No gap-free enforcement.
    pub async fn read_all(&self) -> Result<Vec<StoredEvent>> {
        let rows = sqlx::query_as::<_, StoredEvent>(
            r#"
            SELECT seq, ts, event_type, game_id, payload
            FROM game_events
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
