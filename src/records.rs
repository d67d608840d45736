use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;
use crate::session::SessionEnd;
use crate::store::KeyValueStore;

pub const HIGH_SCORE_KEY: &str = "reflex.high_score";
pub const HISTORY_KEY: &str = "reflex.history";
pub const MUTED_KEY: &str = "reflex.muted";

pub const HISTORY_CAPACITY: usize = 15;

/// One finished game, as kept in the history list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub score: u64,
    /// Reaction time that ended the game
    pub reaction_time_ms: u64,
    pub click_count: u64,
    pub avg_reaction_ms: f64,
    pub played_at: DateTime<Local>,
}

impl GameResult {
    pub fn from_end(end: &SessionEnd, played_at: DateTime<Local>) -> Self {
        Self {
            score: end.final_score,
            reaction_time_ms: end.terminal_reaction_ms,
            click_count: end.click_count,
            avg_reaction_ms: end.avg_reaction_ms,
            played_at,
        }
    }
}

/// Newest-first list of recent results, bounded to [`HISTORY_CAPACITY`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<GameResult>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: GameResult) {
        self.entries.insert(0, result);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn entries(&self) -> &[GameResult] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&GameResult> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clamp(mut self) -> Self {
        self.entries.truncate(HISTORY_CAPACITY);
        self
    }
}

/// Typed access to the persisted records on top of a [`KeyValueStore`].
///
/// Reads never fail: a missing or unreadable value falls back to its default.
pub struct Records {
    store: Box<dyn KeyValueStore>,
}

impl Records {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "failed to read record");
                None
            }
        }
    }

    pub fn high_score(&self) -> u64 {
        self.read(HIGH_SCORE_KEY)
            .and_then(|raw| match raw.trim().parse::<u64>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(raw = %raw, error = %e, "ignoring unreadable high score");
                    None
                }
            })
            .unwrap_or(0)
    }

    pub fn save_high_score(&mut self, score: u64) -> Result<(), StoreError> {
        self.store.set(HIGH_SCORE_KEY, &score.to_string())
    }

    pub fn history(&self) -> History {
        self.read(HISTORY_KEY)
            .and_then(|raw| match serde_json::from_str::<History>(&raw) {
                Ok(h) => Some(h.clamp()),
                Err(e) => {
                    warn!(error = %e, "ignoring unreadable history");
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn save_history(&mut self, history: &History) -> Result<(), StoreError> {
        let raw = serde_json::to_string(history)?;
        self.store.set(HISTORY_KEY, &raw)
    }

    pub fn muted(&self) -> bool {
        self.read(MUTED_KEY)
            .and_then(|raw| serde_json::from_str::<bool>(&raw).ok())
            .unwrap_or(false)
    }

    pub fn save_muted(&mut self, muted: bool) -> Result<(), StoreError> {
        self.store.set(MUTED_KEY, &serde_json::to_string(&muted)?)
    }
}

impl std::fmt::Debug for Records {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Records").finish_non_exhaustive()
    }
}
