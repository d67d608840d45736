use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseButton, MouseEventKind};

/// Input and timing events consumed by the app loop
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    /// Left mouse button pressed at a terminal position
    Click { column: u16, row: u16 },
    Resize,
    Tick,
}

/// Map a raw crossterm event onto a game event. Anything the game doesn't use
/// (focus, paste, mouse moves and releases) maps to `None`.
pub fn translate(event: CtEvent) -> Option<GameEvent> {
    match event {
        CtEvent::Key(key) => Some(GameEvent::Key(key)),
        CtEvent::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(GameEvent::Click {
                column: mouse.column,
                row: mouse.row,
            }),
            _ => None,
        },
        CtEvent::Resize(_, _) => Some(GameEvent::Resize),
        _ => None,
    }
}

pub trait GameEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Event source fed through a channel: by a terminal reader thread in the
/// binary, or directly by tests.
pub struct ChannelEventSource {
    rx: Receiver<GameEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }

    /// Spawn a thread that reads the terminal and forwards translated events.
    /// The thread exits when the receiver is dropped or the terminal read fails.
    pub fn crossterm() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || loop {
            let raw = match event::read() {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(error = %e, "terminal read failed; input stopped");
                    break;
                }
            };
            if let Some(ev) = translate(raw) {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });
        Self { rx }
    }
}

impl GameEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Hands out one event per step, or `Tick` once the wait runs out
pub struct Runner<E: GameEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: GameEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn step(&self) -> GameEvent {
        self.wait(self.ticker.interval())
    }

    /// Like `step`, but wakes early when a game timer is due sooner than the
    /// next regular tick.
    pub fn step_until(&self, next_timer: Option<Duration>) -> GameEvent {
        let interval = self.ticker.interval();
        self.wait(next_timer.map_or(interval, |due| due.min(interval)))
    }

    fn wait(&self, timeout: Duration) -> GameEvent {
        match self.event_source.recv_timeout(timeout) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => GameEvent::Tick,
        }
    }
}
