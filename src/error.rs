//! Error types shared across the crate.

use std::io;

/// Failures of the persistence collaborator. The game logs and swallows these.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Reasons a spawn request is refused by the session
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    #[error("session is not running")]
    NotRunning,

    #[error("already {0} active targets")]
    CapReached(usize),

    #[error("cell {0} is already active")]
    Occupied(usize),

    #[error("cell {0} is outside the grid")]
    OutOfRange(usize),
}
