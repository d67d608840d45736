use std::sync::{Arc, Mutex};

use crate::difficulty::DifficultyLabel;
use crate::records::GameResult;
use crate::session::{SessionEnd, SessionState};
use crate::stats::ReactionSummary;

/// Everything a front end needs to draw one frame of the game
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub state: SessionState,
    pub active_cells: Vec<usize>,
    pub score: u64,
    pub click_count: u64,
    pub reactions: ReactionSummary,
    pub reaction_samples: Vec<u64>,
    pub last_reaction_ms: Option<u64>,
    pub difficulty: DifficultyLabel,
    pub high_score: u64,
    /// Set when the session that just ended beat the stored high score
    pub new_high_score: bool,
    pub end: Option<SessionEnd>,
    pub history: Vec<GameResult>,
    pub muted: bool,
}

/// Receives a snapshot whenever the game state changes. Fire-and-forget.
pub trait PresentationSink {
    fn present(&mut self, snapshot: &Snapshot);
}

/// Keeps the latest snapshot for a render loop to pick up
#[derive(Debug, Clone, Default)]
pub struct SharedSnapshot {
    slot: Arc<Mutex<Option<Snapshot>>>,
}

impl SharedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the pending snapshot, if one arrived since the last call
    pub fn take(&self) -> Option<Snapshot> {
        self.slot.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl PresentationSink for SharedSnapshot {
    fn present(&mut self, snapshot: &Snapshot) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(snapshot.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn present(&mut self, _snapshot: &Snapshot) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(score: u64) -> Snapshot {
        Snapshot {
            state: SessionState::Running,
            active_cells: vec![1, 4],
            score,
            click_count: 0,
            reactions: ReactionSummary::default(),
            reaction_samples: vec![],
            last_reaction_ms: None,
            difficulty: DifficultyLabel::for_progress(score),
            high_score: 0,
            new_high_score: false,
            end: None,
            history: vec![],
            muted: false,
        }
    }

    #[test]
    fn shared_snapshot_keeps_latest_only() {
        let shared = SharedSnapshot::new();
        let mut sink = shared.clone();

        assert!(shared.take().is_none());
        sink.present(&snapshot(10));
        sink.present(&snapshot(20));

        assert_eq!(shared.take().map(|s| s.score), Some(20));
        assert!(shared.take().is_none());
    }
}
