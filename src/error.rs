//! Error types for catalog, storage and session operations

use thiserror::Error;

/// Program catalog problems. All of these are fatal: the program definition
/// is corrupt or incompatible and no schedule can be resolved from it.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to fetch program: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("failed to read program file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse program: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("program has no phases")]
    NoPhases,

    #[error("phase id '{0}' is defined more than once")]
    DuplicatePhase(String),

    #[error("unknown phase '{0}'")]
    UnknownPhase(String),

    #[error("phase '{phase}' schedules unknown workout '{key}'")]
    UnknownWorkoutKey { phase: String, key: String },

    #[error("phase '{phase}' schedule pattern has {len} slots, expected 7")]
    MalformedSchedule { phase: String, len: usize },

    #[error("phase '{0}' must last at least one week")]
    InvalidDuration(String),

    #[error("exercise '{exercise}' in workout '{workout}' must have at least one set")]
    InvalidSets { workout: String, exercise: String },
}

/// Persistence failures from the blob store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode blob '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by [`crate::session::Session`] operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("progress not saved: {0}")]
    Storage(#[from] StorageError),

    #[error("today is a rest day")]
    RestDay,

    #[error("no exercise #{index} today ({count} scheduled)")]
    NoSuchExercise { index: usize, count: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl SessionError {
    /// True when the in-memory state changed but the write behind it failed
    pub fn is_unsaved(&self) -> bool {
        matches!(self, SessionError::Storage(_))
    }
}
