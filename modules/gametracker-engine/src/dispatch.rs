//! Dispatcher: runs an envelope's typed payloads through a registry.
//!
//! Payloads are applied in list order; when two kinds touch the same field the
//! later one wins. A decode or apply failure aborts the rest of the list, but
//! anything applied before it stays applied: there is no rollback across the
//! list.

use gametracker_common::GameTrackerError;
use gametracker_events::TypedPayload;
use thiserror::Error;
use tracing::debug;

use crate::registry::{HandlerError, TypeRegistry};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to decode payload {index} as {type_id}: {source}")]
    DecodeFailure {
        index: usize,
        type_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to apply payload {index} ({type_id}): {source}")]
    ApplyFailure {
        index: usize,
        type_id: String,
        #[source]
        source: GameTrackerError,
    },
}

impl DispatchError {
    /// Index of the payload that stopped dispatch.
    pub fn index(&self) -> usize {
        match self {
            DispatchError::DecodeFailure { index, .. } | DispatchError::ApplyFailure { index, .. } => *index,
        }
    }
}

/// Per-payload record of whether a handler was found and applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coverage(Vec<bool>);

impl Coverage {
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// True when every payload had a handler.
    pub fn is_complete(&self) -> bool {
        self.0.iter().all(|covered| *covered)
    }

    /// Indices with no registered handler.
    pub fn uncovered(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, covered)| !**covered)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn applied_count(&self) -> usize {
        self.0.iter().filter(|covered| **covered).count()
    }
}

/// Applies typed payloads to a target using a borrowed registry.
pub struct Dispatcher<'r, T> {
    registry: &'r TypeRegistry<T>,
}

impl<'r, T> Dispatcher<'r, T> {
    pub fn new(registry: &'r TypeRegistry<T>) -> Self {
        Self { registry }
    }

    /// Apply every recognised payload in order. Unrecognised payloads are
    /// skipped and reported as uncovered; they are never an error.
    pub fn dispatch(&self, payloads: &[TypedPayload], target: &mut T) -> Result<Coverage, DispatchError> {
        let mut covered = vec![false; payloads.len()];

        for (index, payload) in payloads.iter().enumerate() {
            let type_id = payload.type_id();
            let Some(handler) = self.registry.lookup(type_id) else {
                debug!(index, type_id, "No handler registered for payload");
                continue;
            };

            handler(payload.value.as_slice(), &mut *target).map_err(|e| match e {
                HandlerError::Decode(source) => DispatchError::DecodeFailure {
                    index,
                    type_id: type_id.to_string(),
                    source,
                },
                HandlerError::Apply(source) => DispatchError::ApplyFailure {
                    index,
                    type_id: type_id.to_string(),
                    source,
                },
            })?;

            covered[index] = true;
        }

        Ok(Coverage(covered))
    }
}
