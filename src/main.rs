mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Frame, Terminal,
};
use reflex::{
    app_dirs::AppDirs,
    audio::TerminalBell,
    clock::SystemClock,
    config::{ConfigStore, FileConfigStore, KeyLayout},
    game::Game,
    logging,
    presentation::{SharedSnapshot, Snapshot},
    runtime::{ChannelEventSource, FixedTicker, GameEvent, Runner},
    scheduler::{RandomSource, RngSource},
    store::{KeyValueStore, MemoryStore, SqliteStore},
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use tracing::{info, warn};

const TICK_RATE_MS: u64 = 10;

/// reaction-time grid game for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Hit the lit cells of a 3x3 grid before they expire. Targets arrive faster the better you do; one slow reaction ends the game."
)]
pub struct Cli {
    /// keys that map to the grid (remembered for next time)
    #[clap(short = 'l', long, value_enum)]
    layout: Option<KeyLayout>,

    /// seed for the spawn randomness, for a reproducible sequence
    #[clap(long)]
    seed: Option<u64>,

    /// records database to use instead of the default location
    #[clap(long)]
    db: Option<PathBuf>,

    /// mute sound cues (remembered, toggle in game with m)
    #[clap(short = 'm', long)]
    muted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub game: Game,
    pub shared: SharedSnapshot,
    pub snapshot: Snapshot,
    pub layout: KeyLayout,
}

impl App {
    pub fn new(game: Game, shared: SharedSnapshot, layout: KeyLayout) -> Self {
        let snapshot = game.snapshot();
        Self {
            game,
            shared,
            snapshot,
            layout,
        }
    }

    /// Pick up the latest published snapshot. Returns true if there was one.
    pub fn refresh(&mut self) -> bool {
        match self.shared.take() {
            Some(snapshot) => {
                self.snapshot = snapshot;
                true
            }
            None => false,
        }
    }

    fn handle(&mut self, event: GameEvent, frame: Rect) -> Flow {
        match event {
            GameEvent::Tick => {
                self.game.advance();
            }
            GameEvent::Resize => {}
            GameEvent::Click { column, row } => {
                if let Some(cell) = ui::grid_geometry(frame).cell_at(column, row) {
                    self.game.click(cell);
                }
            }
            GameEvent::Key(key) => return self.handle_key(key),
        }
        Flow::Continue
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.kind == KeyEventKind::Release {
            return Flow::Continue;
        }
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Flow::Quit
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.game.start(),
            KeyCode::Char('m') => {
                let muted = self.game.toggle_mute();
                info!(muted, "mute toggled");
            }
            KeyCode::Char(c) => {
                if let Some(cell) = self.layout.cell_for(c) {
                    self.game.click(cell);
                }
            }
            _ => {}
        }
        Flow::Continue
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(log_path) = AppDirs::log_path() {
        if let Err(e) = logging::setup_logging(&log_path) {
            eprintln!("reflex: logging disabled: {e}");
        }
    }

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    if let Some(layout) = cli.layout {
        config.key_layout = layout;
        if let Err(e) = config_store.save(&config) {
            warn!(error = %e, "failed to save config");
        }
    }

    let rng: Box<dyn RandomSource> = match cli.seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource::from_entropy()),
    };
    let shared = SharedSnapshot::new();
    let mut game = Game::new(Box::new(SystemClock::new()), rng, open_store(cli.db.clone()))
        .with_audio(Box::new(TerminalBell::stdout()))
        .with_sink(Box::new(shared.clone()));
    if cli.muted {
        game.set_muted(true);
    }
    info!(layout = %config.key_layout, seed = ?cli.seed, "reflex started");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(game, shared, config.key_layout);
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// The records database, or an in-memory store if it can't be opened
fn open_store(path: Option<PathBuf>) -> Box<dyn KeyValueStore> {
    let Some(path) = path.or_else(AppDirs::db_path) else {
        warn!("no state directory; records will not be kept");
        return Box::new(MemoryStore::new());
    };
    match SqliteStore::open(&path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to open records; keeping them in memory");
            Box::new(MemoryStore::new())
        }
    }
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        ChannelEventSource::crossterm(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    app.refresh();
    terminal.draw(|f| ui(app, f))?;

    loop {
        let event = runner.step_until(app.game.next_wakeup());
        let resized = matches!(event, GameEvent::Resize);
        let size = terminal.size()?;
        let frame = Rect::new(0, 0, size.width, size.height);

        if app.handle(event, frame) == Flow::Quit {
            break;
        }
        if app.refresh() || resized {
            terminal.draw(|f| ui(app, f))?;
        }
    }

    info!("reflex exiting");
    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

#[cfg(test)]
impl App {
    /// App showing a fixed snapshot, for rendering tests
    pub fn headless(snapshot: Snapshot, layout: KeyLayout) -> Self {
        use reflex::{clock::ManualClock, scheduler::SequenceSource};

        let game = Game::new(
            Box::new(ManualClock::new(0)),
            Box::new(SequenceSource::constant(0.0)),
            Box::new(MemoryStore::new()),
        );
        Self {
            game,
            shared: SharedSnapshot::new(),
            snapshot,
            layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use ratatui::backend::TestBackend;
    use reflex::{
        clock::ManualClock,
        scheduler::SequenceSource,
        session::{SessionState, MAX_ACTIVE_CELLS},
    };

    const FRAME: Rect = Rect {
        x: 0,
        y: 0,
        width: 100,
        height: 30,
    };

    fn test_app(layout: KeyLayout) -> (App, ManualClock) {
        let clock = ManualClock::new(0);
        let shared = SharedSnapshot::new();
        let game = Game::new(
            Box::new(clock.clone()),
            Box::new(SequenceSource::constant(0.0)),
            Box::new(MemoryStore::new()),
        )
        .with_sink(Box::new(shared.clone()));
        (App::new(game, shared, layout), clock)
    }

    fn key(code: KeyCode) -> GameEvent {
        GameEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["reflex"]);
        assert_eq!(cli.layout, None);
        assert_eq!(cli.seed, None);
        assert_eq!(cli.db, None);
        assert!(!cli.muted);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "reflex", "--layout", "qwerty", "--seed", "42", "--db", "/tmp/r.db", "--muted",
        ]);
        assert_eq!(cli.layout, Some(KeyLayout::Qwerty));
        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/r.db")));
        assert!(cli.muted);
    }

    #[test]
    fn test_cli_rejects_unknown_layout() {
        assert!(Cli::try_parse_from(["reflex", "--layout", "dvorak"]).is_err());
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn space_and_enter_start() {
        let (mut app, _) = test_app(KeyLayout::Numpad);
        assert_eq!(app.handle(key(KeyCode::Char(' ')), FRAME), Flow::Continue);
        assert!(app.refresh());
        assert_eq!(app.snapshot.state, SessionState::Running);

        let generation = app.game.session().generation();
        app.handle(key(KeyCode::Enter), FRAME);
        assert_eq!(app.game.session().generation(), generation + 1);
    }

    #[test]
    fn esc_and_ctrl_c_quit() {
        let (mut app, _) = test_app(KeyLayout::Numpad);
        assert_eq!(app.handle(key(KeyCode::Esc), FRAME), Flow::Quit);
        let ctrl_c = GameEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(app.handle(ctrl_c, FRAME), Flow::Quit);
    }

    #[test]
    fn plain_c_is_a_cell_on_qwerty() {
        let (mut app, _) = test_app(KeyLayout::Qwerty);
        app.handle(key(KeyCode::Char(' ')), FRAME);
        assert_eq!(app.handle(key(KeyCode::Char('c')), FRAME), Flow::Continue);
    }

    #[test]
    fn m_toggles_mute() {
        let (mut app, _) = test_app(KeyLayout::Numpad);
        app.handle(key(KeyCode::Char('m')), FRAME);
        assert!(app.game.is_muted());
        app.refresh();
        assert!(app.snapshot.muted);
        app.handle(key(KeyCode::Char('m')), FRAME);
        assert!(!app.game.is_muted());
    }

    #[test]
    fn ticks_spawn_and_layout_keys_hit() {
        let (mut app, clock) = test_app(KeyLayout::Numpad);
        app.handle(key(KeyCode::Char(' ')), FRAME);
        clock.set_ms(480);
        app.handle(GameEvent::Tick, FRAME);
        app.refresh();
        assert_eq!(app.snapshot.active_cells, vec![0]);

        // '7' is the top-left cell on the numpad layout
        clock.set_ms(600);
        app.handle(key(KeyCode::Char('7')), FRAME);
        app.refresh();
        assert_eq!(app.snapshot.score, 880);
        assert!(app.snapshot.active_cells.is_empty());
    }

    #[test]
    fn key_release_is_ignored() {
        let (mut app, clock) = test_app(KeyLayout::Numpad);
        app.handle(key(KeyCode::Char(' ')), FRAME);
        clock.set_ms(480);
        app.handle(GameEvent::Tick, FRAME);

        let release = GameEvent::Key(KeyEvent {
            code: KeyCode::Char('7'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        app.handle(release, FRAME);
        assert_eq!(app.game.session().active_cells(), vec![0]);
    }

    #[test]
    fn mouse_click_on_cell_hits() {
        let (mut app, clock) = test_app(KeyLayout::Numpad);
        app.handle(key(KeyCode::Char(' ')), FRAME);
        clock.set_ms(480);
        app.handle(GameEvent::Tick, FRAME);

        let target = ui::grid_geometry(FRAME).cell_rect(0);
        clock.set_ms(500);
        app.handle(
            GameEvent::Click {
                column: target.x + 1,
                row: target.y + 1,
            },
            FRAME,
        );
        assert_eq!(app.game.session().stats().score, 980);
    }

    #[test]
    fn mouse_click_outside_grid_does_nothing() {
        let (mut app, clock) = test_app(KeyLayout::Numpad);
        app.handle(key(KeyCode::Char(' ')), FRAME);
        clock.set_ms(480);
        app.handle(GameEvent::Tick, FRAME);
        app.handle(GameEvent::Click { column: 0, row: 0 }, FRAME);
        assert_eq!(app.game.session().stats().click_count, 0);
        assert_eq!(app.game.session().active_cells(), vec![0]);
    }

    #[test]
    fn idle_ticks_publish_nothing() {
        let (mut app, clock) = test_app(KeyLayout::Numpad);
        app.refresh();
        clock.set_ms(5_000);
        app.handle(GameEvent::Tick, FRAME);
        assert!(!app.refresh());
    }

    #[test]
    fn cap_holds_through_the_app() {
        let (mut app, clock) = test_app(KeyLayout::Numpad);
        app.handle(key(KeyCode::Char(' ')), FRAME);
        for ms in (0..1500).step_by(TICK_RATE_MS as usize) {
            clock.set_ms(ms);
            app.handle(GameEvent::Tick, FRAME);
            assert!(app.game.session().targets().len() <= MAX_ACTIVE_CELLS);
        }
    }

    #[test]
    fn test_ui_draws_with_test_backend() {
        let (mut app, _) = test_app(KeyLayout::Numpad);
        app.refresh();

        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(&app, f)).unwrap();

        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("score 0"));
        assert!(content.contains("press space to start"));
    }

    #[test]
    fn test_tick_rate_constant() {
        assert_eq!(TICK_RATE_MS, 10);
    }
}
