//! The poll loop.
//!
//! One event is in flight at a time. Events are acked once handled or once
//! they are known to fail the same way on every attempt. A persistence
//! failure stops the batch without acking, so the event comes back on the
//! next poll. Cancellation is checked between events, never mid-event.

use std::time::Duration;

use anyhow::Result;
use gametracker_common::Config;
use gametracker_engine::GameRepository;
use gametracker_events::{GameEvent, StoredEvent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::handler::{GameTracker, HandleError};
use crate::source::EventSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Ack,
    Retry,
}

pub struct GameEventConsumer<S, R> {
    source: S,
    tracker: GameTracker<R>,
    batch_size: usize,
    poll_interval: Duration,
}

impl<S: EventSource, R: GameRepository> GameEventConsumer<S, R> {
    pub fn new(source: S, tracker: GameTracker<R>, batch_size: usize, poll_interval: Duration) -> Self {
        Self {
            source,
            tracker,
            batch_size,
            poll_interval,
        }
    }

    pub fn from_config(source: S, tracker: GameTracker<R>, config: &Config) -> Self {
        Self::new(source, tracker, config.batch_size, config.poll_interval)
    }

    /// Poll until `cancel` fires. The event being handled when it fires is
    /// finished and acked before returning.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        info!(batch_size = self.batch_size, "Game event consumer started");

        while !cancel.is_cancelled() {
            let handled = match self.poll_once(&cancel).await {
                Ok(n) => n,
                Err(e) => {
                    warn!(error = %e, "Failed to poll game events");
                    0
                }
            };

            if handled == 0 {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        }

        info!("Game event consumer stopped");
        Ok(())
    }

    /// Handle one batch. Returns how many events were acked.
    pub async fn poll_once(&self, cancel: &CancellationToken) -> Result<usize> {
        let batch = self.source.next_batch(self.batch_size).await?;
        let mut acked = 0;

        for event in &batch {
            if cancel.is_cancelled() {
                break;
            }

            match self.process(event).await {
                Disposition::Ack => {
                    self.source.ack(event.seq).await?;
                    acked += 1;
                }
                Disposition::Retry => break,
            }
        }

        Ok(acked)
    }

    async fn process(&self, stored: &StoredEvent) -> Disposition {
        let seq = stored.seq;
        let event_type = stored.event_type.as_str();

        if !matches!(event_type, GameEvent::START | GameEvent::UPDATE | GameEvent::FINISH) {
            warn!(seq, event_type, "Unknown event type, skipping");
            return Disposition::Ack;
        }

        let event = match stored.game_event() {
            Ok(event) => event,
            Err(e) => {
                error!(seq, event_type, error = %e, payload = %stored.payload, "Malformed game envelope, dropping");
                return Disposition::Ack;
            }
        };
        let game_id = event.common_data().game_id.as_str();

        match self.tracker.handle(&event).await {
            Ok(()) => {
                debug!(seq, event_type, game_id, "Handled game event");
                Disposition::Ack
            }
            Err(e) if e.is_retryable() => {
                warn!(seq, event_type, game_id, error = %e, "Failed to persist game, will redeliver");
                Disposition::Retry
            }
            Err(HandleError::NotLive(_)) => {
                warn!(seq, event_type, game_id, "Event for a game that is not live, dropping");
                Disposition::Ack
            }
            Err(e) => {
                error!(
                    seq,
                    event_type,
                    game_id,
                    error = %e,
                    content = ?event.content(),
                    "Dropping game event"
                );
                Disposition::Ack
            }
        }
    }
}
