//! Sound cues. The game only emits symbolic events; what they sound like (if
//! anything) is up to the notifier.
use std::io::{self, Write};

/// Symbolic sound cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum SoundEvent {
    Hit,
    Fail,
    Win,
    GameOver,
}

pub trait AudioNotifier {
    /// Errors are advisory; callers log and carry on.
    fn notify(&mut self, event: SoundEvent) -> io::Result<()>;
}

/// Rings the terminal bell for the cues that deserve attention
#[derive(Debug)]
pub struct TerminalBell<W: Write> {
    out: W,
}

impl TerminalBell<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> AudioNotifier for TerminalBell<W> {
    fn notify(&mut self, event: SoundEvent) -> io::Result<()> {
        let rings = match event {
            SoundEvent::Hit => 0,
            SoundEvent::Fail | SoundEvent::GameOver => 1,
            SoundEvent::Win => 2,
        };
        for _ in 0..rings {
            self.out.write_all(b"\x07")?;
        }
        self.out.flush()
    }
}

/// Discards every cue
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl AudioNotifier for Silent {
    fn notify(&mut self, _event: SoundEvent) -> io::Result<()> {
        Ok(())
    }
}
