use std::time::Duration;

use chrono::Local;
use tracing::{debug, info, trace, warn};

use crate::audio::{AudioNotifier, Silent, SoundEvent};
use crate::clock::Clock;
use crate::difficulty::DifficultyLabel;
use crate::presentation::{NullSink, PresentationSink, Snapshot};
use crate::records::{GameResult, History, Records};
use crate::scheduler::{RandomSource, SpawnScheduler};
use crate::session::{ClickOutcome, Session, SessionEnd, SessionState, CELL_COUNT};
use crate::store::KeyValueStore;
use crate::timer::{TimerHandle, Timers};

/// How often active targets are checked for expiry while running
pub const EXPIRY_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Spawn,
    ExpiryPoll,
}

/// Timer payload. The generation ties it to the session that armed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub kind: TimerKind,
    pub generation: u64,
}

/// Owns a session plus everything around it: timers, the spawn scheduler and the
/// clock, audio, presentation and persistence collaborators.
pub struct Game {
    session: Session,
    scheduler: SpawnScheduler,
    timers: Timers<TimerEvent>,
    clock: Box<dyn Clock>,
    audio: Box<dyn AudioNotifier>,
    sink: Box<dyn PresentationSink>,
    records: Records,
    spawn_timer: Option<TimerHandle>,
    poll_timer: Option<TimerHandle>,
    high_score: u64,
    history: History,
    muted: bool,
    new_high_score: bool,
}

impl Game {
    /// Build an idle game, loading high score, history and the mute flag from `store`.
    pub fn new(
        clock: Box<dyn Clock>,
        rng: Box<dyn RandomSource>,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        let records = Records::new(store);
        let high_score = records.high_score();
        let history = records.history();
        let muted = records.muted();
        debug!(high_score, history = history.len(), muted, "records loaded");

        Self {
            session: Session::new(),
            scheduler: SpawnScheduler::new(rng, CELL_COUNT),
            timers: Timers::new(),
            clock,
            audio: Box::new(Silent),
            sink: Box::new(NullSink),
            records,
            spawn_timer: None,
            poll_timer: None,
            high_score,
            history,
            muted,
            new_high_score: false,
        }
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioNotifier>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn PresentationSink>) -> Self {
        self.sink = sink;
        self.publish();
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_spawn_armed(&self) -> bool {
        self.spawn_timer.is_some_and(|h| self.timers.is_armed(h))
    }

    pub fn is_polling(&self) -> bool {
        self.poll_timer.is_some_and(|h| self.timers.is_armed(h))
    }

    /// Start (or restart) a session. Timers from the previous one are dropped.
    pub fn start(&mut self) {
        self.cancel_timers();
        let generation = self.session.start();
        self.new_high_score = false;

        let now = self.clock.now_ms();
        self.poll_timer = Some(self.timers.every(
            now,
            EXPIRY_POLL_INTERVAL,
            TimerEvent {
                kind: TimerKind::ExpiryPoll,
                generation,
            },
        ));
        self.arm_spawn(now);

        info!(generation, "session started");
        self.publish();
    }

    /// Fire every timer due by now. Returns true if the state changed.
    pub fn advance(&mut self) -> bool {
        let now = self.clock.now_ms();
        let mut changed = false;
        while let Some((due, event)) = self.timers.pop_due(now) {
            changed |= self.handle_timer(due, event);
        }
        if changed {
            self.publish();
        }
        changed
    }

    /// Deliver a timer event fired at `due_ms`. Events from an older session, or
    /// arriving when no session is running, are discarded.
    pub fn fire(&mut self, due_ms: u64, event: TimerEvent) -> bool {
        let changed = self.handle_timer(due_ms, event);
        if changed {
            self.publish();
        }
        changed
    }

    fn handle_timer(&mut self, due_ms: u64, event: TimerEvent) -> bool {
        if event.generation != self.session.generation() || !self.session.is_running() {
            trace!(?event, current = self.session.generation(), "discarding stale timer");
            return false;
        }
        match event.kind {
            TimerKind::Spawn => self.on_spawn_timer(due_ms),
            TimerKind::ExpiryPoll => self.on_expiry_poll(due_ms),
        }
    }

    fn on_spawn_timer(&mut self, due_ms: u64) -> bool {
        self.spawn_timer = None;
        if !self.session.has_room() {
            // the next hit re-arms
            return false;
        }
        let occupied = self.session.active_cells();
        let Some(cell) = self.scheduler.pick_cell(&occupied) else {
            return false;
        };
        match self.session.spawn(cell, due_ms) {
            Ok(()) => {
                debug!(cell, at = due_ms, "target spawned");
                self.arm_spawn(due_ms);
                true
            }
            Err(e) => {
                warn!(cell, error = %e, "spawn refused");
                false
            }
        }
    }

    fn on_expiry_poll(&mut self, due_ms: u64) -> bool {
        match self.session.check_expiry(due_ms) {
            Some(end) => {
                self.finish(end);
                true
            }
            None => false,
        }
    }

    /// Route a player click on `cell` through the session.
    pub fn click(&mut self, cell: usize) -> ClickOutcome {
        // anything that should have happened before the click happens first
        self.advance();

        let now = self.clock.now_ms();
        let outcome = self.session.click(cell, now);
        match &outcome {
            ClickOutcome::Ignored => {}
            ClickOutcome::Rejected { cell } => warn!(cell, "click outside the grid ignored"),
            ClickOutcome::Miss { cell } => {
                debug!(cell, "miss");
                self.play(SoundEvent::Fail);
            }
            ClickOutcome::Hit {
                cell,
                reaction_ms,
                points,
                ended,
            } => {
                debug!(cell, reaction_ms, points, "hit");
                self.play(SoundEvent::Hit);
                match ended {
                    Some(end) => self.finish(end.clone()),
                    None => {
                        if self.spawn_timer.is_none() {
                            self.arm_spawn(now);
                        }
                    }
                }
            }
        }
        if !matches!(outcome, ClickOutcome::Ignored | ClickOutcome::Rejected { .. }) {
            self.publish();
        }
        outcome
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.set_muted(!self.muted);
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Err(e) = self.records.save_muted(muted) {
            warn!(error = %e, "failed to persist mute flag");
        }
        self.publish();
    }

    /// Time until the next armed timer is due, if any
    pub fn next_wakeup(&self) -> Option<Duration> {
        let now = self.clock.now_ms();
        self.timers
            .next_due()
            .map(|due| Duration::from_millis(due.saturating_sub(now)))
    }

    pub fn snapshot(&self) -> Snapshot {
        let stats = self.session.stats();
        Snapshot {
            state: self.session.state(),
            active_cells: self.session.active_cells(),
            score: stats.score,
            click_count: stats.click_count,
            reactions: stats.summary(),
            reaction_samples: stats.reaction_samples.clone(),
            last_reaction_ms: stats.last_reaction_ms,
            difficulty: DifficultyLabel::for_progress(stats.progress()),
            high_score: self.high_score,
            new_high_score: self.new_high_score,
            end: self.session.end().cloned(),
            history: self.history.entries().to_vec(),
            muted: self.muted,
        }
    }

    fn arm_spawn(&mut self, now_ms: u64) {
        if let Some(handle) = self.spawn_timer.take() {
            self.timers.cancel(handle);
        }
        if !self.session.is_running() || !self.session.has_room() {
            return;
        }
        let progress = self.session.progress();
        let delay = self.scheduler.next_delay(progress);
        trace!(progress, delay_ms = delay.as_millis() as u64, "spawn armed");
        self.spawn_timer = Some(self.timers.after(
            now_ms,
            delay,
            TimerEvent {
                kind: TimerKind::Spawn,
                generation: self.session.generation(),
            },
        ));
    }

    fn cancel_timers(&mut self) {
        for handle in [self.spawn_timer.take(), self.poll_timer.take()]
            .into_iter()
            .flatten()
        {
            self.timers.cancel(handle);
        }
    }

    fn finish(&mut self, end: SessionEnd) {
        self.cancel_timers();
        info!(
            score = end.final_score,
            clicks = end.click_count,
            reaction_ms = end.terminal_reaction_ms,
            cause = ?end.cause,
            "game over"
        );

        if end.final_score > self.high_score {
            self.high_score = end.final_score;
            self.new_high_score = true;
            if let Err(e) = self.records.save_high_score(self.high_score) {
                warn!(error = %e, "failed to persist high score");
            }
        }

        self.history.push(GameResult::from_end(&end, Local::now()));
        if let Err(e) = self.records.save_history(&self.history) {
            warn!(error = %e, "failed to persist history");
        }

        self.play(SoundEvent::GameOver);
        if self.new_high_score {
            self.play(SoundEvent::Win);
        }
    }

    fn play(&mut self, event: SoundEvent) {
        if self.muted {
            return;
        }
        if let Err(e) = self.audio.notify(event) {
            warn!(%event, error = %e, "audio cue failed");
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.sink.present(&snapshot);
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("session", &self.session)
            .field("high_score", &self.high_score)
            .field("muted", &self.muted)
            .finish_non_exhaustive()
    }
}
