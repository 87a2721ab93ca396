use thiserror::Error;

use crate::mode::ModeKind;

#[derive(Error, Debug)]
pub enum GameTrackerError {
    #[error("Malformed game id: {0:?}")]
    MalformedIdentifier(String),

    #[error("Malformed player id: {0:?}")]
    MalformedPlayerId(String),

    #[error("Mode data mismatch: expected {expected}, found {}", describe_found(.found))]
    ModeDataMismatch {
        expected: ModeKind,
        found: Option<ModeKind>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

fn describe_found(found: &Option<ModeKind>) -> String {
    match found {
        Some(kind) => kind.to_string(),
        None => "no mode data".to_string(),
    }
}
