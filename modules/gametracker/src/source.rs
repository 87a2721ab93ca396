//! Where the consumer reads game envelopes from.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use gametracker_events::{EventStore, GameEvent, StoredEvent};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// An ordered, at-least-once source of stored events.
///
/// `next_batch` keeps returning the same events until they are acked.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn next_batch(&self, limit: usize) -> Result<Vec<StoredEvent>>;

    /// Mark `seq` and everything before it as handled.
    async fn ack(&self, seq: i64) -> Result<()>;
}

#[async_trait]
impl<S: EventSource + ?Sized> EventSource for Arc<S> {
    async fn next_batch(&self, limit: usize) -> Result<Vec<StoredEvent>> {
        (**self).next_batch(limit).await
    }

    async fn ack(&self, seq: i64) -> Result<()> {
        (**self).ack(seq).await
    }
}

// ---------------------------------------------------------------------------
// PgEventSource (production, game_events table + consumer_offsets)
// ---------------------------------------------------------------------------

/// Reads `game_events` gap-free from the consumer group's committed offset.
///
/// A gap that stays open for `gap_stall_polls` consecutive empty polls is
/// treated as a rolled-back insert and skipped. An insert that commits into
/// a skipped gap is never delivered: skipping trades at-least-once delivery
/// for liveness. A limit of 0 never skips and waits for the gap to close.
pub struct PgEventSource {
    store: EventStore,
    consumer_group: String,
    /// Next seq to read. Loaded lazily from the committed offset.
    cursor: Mutex<Option<i64>>,
    gap: Mutex<GapWatch>,
}

impl PgEventSource {
    pub fn new(store: EventStore, consumer_group: impl Into<String>, gap_stall_polls: u32) -> Self {
        Self {
            store,
            consumer_group: consumer_group.into(),
            cursor: Mutex::new(None),
            gap: Mutex::new(GapWatch::new(gap_stall_polls)),
        }
    }

    async fn cursor(&self) -> Result<i64> {
        let mut cursor = self.cursor.lock().await;
        if let Some(seq) = *cursor {
            return Ok(seq);
        }

        let seq = self
            .store
            .load_offset(&self.consumer_group)
            .await
            .with_context(|| format!("Failed to load offset for {}", self.consumer_group))?;
        info!(consumer_group = self.consumer_group.as_str(), next_seq = seq, "Resuming from offset");
        *cursor = Some(seq);
        Ok(seq)
    }
}

#[async_trait]
impl EventSource for PgEventSource {
    async fn next_batch(&self, limit: usize) -> Result<Vec<StoredEvent>> {
        let from = self.cursor().await?;
        let events = self.store.read_from(from, limit).await?;
        if !events.is_empty() {
            self.gap.lock().await.reset();
            return Ok(events);
        }

        // Nothing contiguous. Either the log is drained or a gap is open.
        let Some(next) = self.store.first_seq_from(from).await? else {
            self.gap.lock().await.reset();
            return Ok(events);
        };

        if !self.gap.lock().await.stalled() {
            return Ok(events);
        }

        warn!(
            consumer_group = self.consumer_group.as_str(),
            from,
            to = next,
            "Sequence gap never filled, skipping it"
        );
        *self.cursor.lock().await = Some(next);
        self.store.read_from(next, limit).await
    }

    async fn ack(&self, seq: i64) -> Result<()> {
        self.store
            .commit_offset(&self.consumer_group, seq + 1)
            .await
            .with_context(|| format!("Failed to commit offset {} for {}", seq + 1, self.consumer_group))?;
        *self.cursor.lock().await = Some(seq + 1);
        Ok(())
    }
}

/// Counts consecutive empty polls in front of an open gap.
#[derive(Debug)]
struct GapWatch {
    limit: u32,
    stalled_polls: u32,
}

impl GapWatch {
    fn new(limit: u32) -> Self {
        Self { limit, stalled_polls: 0 }
    }

    fn reset(&mut self) {
        self.stalled_polls = 0;
    }

    /// Record an empty poll with events waiting past the gap. True once the
    /// gap should be skipped; the count restarts for the next gap.
    fn stalled(&mut self) -> bool {
        if self.limit == 0 {
            return false;
        }
        self.stalled_polls += 1;
        if self.stalled_polls < self.limit {
            return false;
        }
        self.stalled_polls = 0;
        true
    }
}

// ---------------------------------------------------------------------------
// MemoryEventSource (tests, no database required)
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryLog {
    events: Vec<StoredEvent>,
    next_seq: i64,
    acked: Vec<i64>,
}

/// In-memory event log. Seqs start at 1 and have no gaps.
#[derive(Default)]
pub struct MemoryEventSource {
    log: Mutex<MemoryLog>,
}

impl MemoryEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a game envelope. Returns its seq.
    pub async fn push(&self, event: &GameEvent) -> Result<i64> {
        let payload = event.to_payload().context("Failed to serialize game event")?;
        Ok(self
            .push_raw(event.event_type(), Some(event.common_data().game_id.clone()), payload)
            .await)
    }

    /// Append an arbitrary row, bypassing envelope serialization.
    pub async fn push_raw(&self, event_type: &str, game_id: Option<String>, payload: Value) -> i64 {
        let mut log = self.log.lock().await;
        let seq = log.events.len() as i64 + 1;
        log.events.push(StoredEvent {
            seq,
            ts: Utc::now(),
            event_type: event_type.to_string(),
            game_id,
            payload,
        });
        seq
    }

    /// Every acked seq, in ack order.
    pub async fn acked(&self) -> Vec<i64> {
        self.log.lock().await.acked.clone()
    }

    /// Events not yet acked.
    pub async fn pending(&self) -> usize {
        let log = self.log.lock().await;
        log.events.iter().filter(|e| e.seq >= log.next_seq.max(1)).count()
    }
}

#[async_trait]
impl EventSource for MemoryEventSource {
    async fn next_batch(&self, limit: usize) -> Result<Vec<StoredEvent>> {
        let log = self.log.lock().await;
        let from = log.next_seq.max(1);
        Ok(log
            .events
            .iter()
            .filter(|e| e.seq >= from)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn ack(&self, seq: i64) -> Result<()> {
        let mut log = self.log.lock().await;
        log.acked.push(seq);
        log.next_seq = log.next_seq.max(seq + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_source_redelivers_until_acked() {
        let source = MemoryEventSource::new();
        source.push_raw("game_update", None, json!({})).await;
        source.push_raw("game_update", None, json!({})).await;

        let first: Vec<i64> = source.next_batch(10).await.unwrap().iter().map(|e| e.seq).collect();
        let again: Vec<i64> = source.next_batch(10).await.unwrap().iter().map(|e| e.seq).collect();
        assert_eq!(first, vec![1, 2]);
        assert_eq!(again, first);

        source.ack(1).await.unwrap();
        let rest: Vec<i64> = source.next_batch(10).await.unwrap().iter().map(|e| e.seq).collect();
        assert_eq!(rest, vec![2]);
        assert_eq!(source.pending().await, 1);
    }

    #[test]
    fn gap_is_skipped_after_the_configured_number_of_empty_polls() {
        let mut gap = GapWatch::new(3);
        assert!(!gap.stalled());
        assert!(!gap.stalled());
        assert!(gap.stalled());

        // Counting restarts for the next gap.
        assert!(!gap.stalled());
    }

    #[test]
    fn progress_resets_the_stall_count() {
        let mut gap = GapWatch::new(2);
        assert!(!gap.stalled());
        gap.reset();
        assert!(!gap.stalled());
        assert!(gap.stalled());
    }

    #[test]
    fn zero_limit_never_skips() {
        let mut gap = GapWatch::new(0);
        assert!((0..1_000).all(|_| !gap.stalled()));
    }

    #[tokio::test]
    async fn memory_source_respects_limit() {
        let source = MemoryEventSource::new();
        for _ in 0..5 {
            source.push_raw("game_update", None, json!({})).await;
        }
        assert_eq!(source.next_batch(2).await.unwrap().len(), 2);
    }
}
