use crate::error::SpawnError;
use crate::stats::SessionStats;

pub const GRID_SIZE: usize = 3;
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;
pub const MAX_ACTIVE_CELLS: usize = 3;
/// A target older than this (strictly) ends the session
pub const MAX_REACTION_TIME_MS: u64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionState {
    Idle,
    Running,
    Ended,
}

/// A lit cell waiting to be clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTarget {
    pub cell: usize,
    pub spawned_at: u64,
}

impl ActiveTarget {
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.spawned_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCause {
    /// The player hit the target, but too late
    SlowClick { cell: usize },
    /// A target stayed lit past the limit
    Expired { cell: usize },
}

/// Final figures of a session, produced on the transition to Ended
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEnd {
    pub cause: EndCause,
    pub final_score: u64,
    pub terminal_reaction_ms: u64,
    pub click_count: u64,
    /// Mean of the session's samples, or the terminal reaction time if there were none
    pub avg_reaction_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Session not running; nothing happens
    Ignored,
    /// Cell index outside the grid
    Rejected { cell: usize },
    /// Cell in range but not lit
    Miss { cell: usize },
    Hit {
        cell: usize,
        reaction_ms: u64,
        points: u64,
        ended: Option<SessionEnd>,
    },
}

/// Session state machine: Idle -> Running -> Ended, restartable via `start`.
///
/// All timestamps are passed in by the caller so the machine stays pure.
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    targets: Vec<ActiveTarget>,
    stats: SessionStats,
    generation: u64,
    end: Option<SessionEnd>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            targets: Vec::new(),
            stats: SessionStats::default(),
            generation: 0,
            end: None,
        }
    }

    /// Begin a fresh session from any state and return its generation token.
    /// Anything tagged with an older token belongs to a previous session.
    pub fn start(&mut self) -> u64 {
        self.generation += 1;
        self.state = SessionState::Running;
        self.targets.clear();
        self.stats = SessionStats::default();
        self.end = None;
        self.generation
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn targets(&self) -> &[ActiveTarget] {
        &self.targets
    }

    pub fn active_cells(&self) -> Vec<usize> {
        self.targets.iter().map(|t| t.cell).collect()
    }

    pub fn is_active(&self, cell: usize) -> bool {
        self.targets.iter().any(|t| t.cell == cell)
    }

    pub fn has_room(&self) -> bool {
        self.targets.len() < MAX_ACTIVE_CELLS
    }

    pub fn progress(&self) -> u64 {
        self.stats.progress()
    }

    /// How the last session ended, kept until the next `start`
    pub fn end(&self) -> Option<&SessionEnd> {
        self.end.as_ref()
    }

    pub fn spawn(&mut self, cell: usize, now_ms: u64) -> Result<(), SpawnError> {
        if !self.is_running() {
            return Err(SpawnError::NotRunning);
        }
        if cell >= CELL_COUNT {
            return Err(SpawnError::OutOfRange(cell));
        }
        if !self.has_room() {
            return Err(SpawnError::CapReached(MAX_ACTIVE_CELLS));
        }
        if self.is_active(cell) {
            return Err(SpawnError::Occupied(cell));
        }
        self.targets.push(ActiveTarget {
            cell,
            spawned_at: now_ms,
        });
        Ok(())
    }

    pub fn click(&mut self, cell: usize, now_ms: u64) -> ClickOutcome {
        if !self.is_running() {
            return ClickOutcome::Ignored;
        }
        if cell >= CELL_COUNT {
            return ClickOutcome::Rejected { cell };
        }
        let Some(pos) = self.targets.iter().position(|t| t.cell == cell) else {
            return ClickOutcome::Miss { cell };
        };

        let target = self.targets.remove(pos);
        let reaction_ms = target.age_ms(now_ms);
        let points = self.stats.record_hit(reaction_ms);

        let ended = if reaction_ms > MAX_REACTION_TIME_MS {
            Some(self.finish(EndCause::SlowClick { cell }, reaction_ms))
        } else {
            None
        };

        ClickOutcome::Hit {
            cell,
            reaction_ms,
            points,
            ended,
        }
    }

    /// End the session on the first target (in spawn order) older than the limit.
    pub fn check_expiry(&mut self, now_ms: u64) -> Option<SessionEnd> {
        if !self.is_running() {
            return None;
        }
        let overdue = self
            .targets
            .iter()
            .find(|t| t.age_ms(now_ms) > MAX_REACTION_TIME_MS)
            .copied()?;
        let age = overdue.age_ms(now_ms);
        self.stats.last_reaction_ms = Some(age);
        Some(self.finish(EndCause::Expired { cell: overdue.cell }, age))
    }

    fn finish(&mut self, cause: EndCause, terminal_reaction_ms: u64) -> SessionEnd {
        self.state = SessionState::Ended;
        let end = SessionEnd {
            cause,
            final_score: self.stats.score,
            terminal_reaction_ms,
            click_count: self.stats.click_count,
            avg_reaction_ms: self
                .stats
                .average_reaction_ms()
                .unwrap_or(terminal_reaction_ms as f64),
        };
        self.end = Some(end.clone());
        end
    }
}
