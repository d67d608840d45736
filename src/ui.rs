pub mod charting;
pub mod grid;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use reflex::{
    difficulty::Phase,
    presentation::Snapshot,
    session::{EndCause, SessionState, CELL_COUNT},
    time_series::reaction_series,
};

use crate::App;
use grid::GridGeometry;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const SIDE_PANEL_WIDTH: u16 = 34;

/// Screen regions, derived from the frame size alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panels {
    pub header: Rect,
    pub grid: Rect,
    pub stats: Rect,
    pub legend: Rect,
    pub side: Option<Rect>,
}

pub fn panels(area: Rect) -> Panels {
    let with_side = area.width >= SIDE_PANEL_WIDTH * 2;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(if with_side {
            vec![Constraint::Min(1), Constraint::Length(SIDE_PANEL_WIDTH)]
        } else {
            vec![Constraint::Min(1)]
        })
        .split(area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header
            Constraint::Min(3),    // grid
            Constraint::Length(2), // stats
            Constraint::Length(1), // legend
        ])
        .split(columns[0]);

    Panels {
        header: rows[0],
        grid: rows[1],
        stats: rows[2],
        legend: rows[3],
        side: with_side.then(|| columns[1]),
    }
}

/// Grid placement for a frame of the given size
pub fn grid_geometry(area: Rect) -> GridGeometry {
    GridGeometry::fit(panels(area).grid)
}

pub fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Easy => Color::Green,
        Phase::Medium => Color::Yellow,
        Phase::Hard => Color::LightRed,
        Phase::Extreme => Color::Red,
        Phase::Insane => Color::Magenta,
        Phase::Brutal => Color::LightMagenta,
        Phase::Impossible => Color::White,
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snap = &self.snapshot;
        let layout = panels(area);

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let level_style = Style::default()
            .patch(bold_style)
            .fg(phase_color(snap.difficulty.phase));

        let header = Paragraph::new(vec![
            Line::from(vec![
                Span::styled(format!("score {}", snap.score), bold_style),
                Span::raw("   "),
                Span::styled(
                    format!("{} {}", snap.difficulty.name(), snap.difficulty.level),
                    level_style,
                ),
                Span::raw("   "),
                Span::styled(format!("best {}", snap.high_score), dim_style),
            ]),
            Line::from(Span::styled(
                if snap.muted { "muted" } else { "" },
                dim_style,
            )),
        ])
        .alignment(Alignment::Center);
        header.render(layout.header, buf);

        render_grid(self, snap, layout.grid, buf);

        let stats = Paragraph::new(vec![
            Line::from(Span::styled(
                format!(
                    "clicks {}   last {}   avg {}",
                    snap.click_count,
                    fmt_ms(snap.last_reaction_ms.map(|ms| ms as f64)),
                    fmt_ms(snap.reactions.average_ms),
                ),
                bold_style,
            )),
            Line::from(Span::styled(
                format!(
                    "fastest {}   slowest {}   sd {}",
                    fmt_ms(snap.reactions.fastest_ms.map(|ms| ms as f64)),
                    fmt_ms(snap.reactions.slowest_ms.map(|ms| ms as f64)),
                    fmt_ms(snap.reactions.std_dev_ms),
                ),
                dim_style,
            )),
        ])
        .alignment(Alignment::Center);
        stats.render(layout.stats, buf);

        let legend = Paragraph::new(Span::styled(
            match snap.state {
                SessionState::Running => "(space) restart / (m)ute / (esc)ape",
                SessionState::Idle | SessionState::Ended => "(space) start / (m)ute / (esc)ape",
            },
            italic_style,
        ))
        .alignment(Alignment::Center);
        legend.render(layout.legend, buf);

        if let Some(side) = layout.side {
            render_side_panel(snap, side, buf);
        }
    }
}

fn render_grid(app: &App, snap: &Snapshot, area: Rect, buf: &mut Buffer) {
    let geometry = GridGeometry::fit(area);
    let keys = app.layout.keys();
    let lit = Style::default()
        .bg(phase_color(snap.difficulty.phase))
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD);
    let unlit = Style::default().add_modifier(Modifier::DIM);

    for (cell, key) in keys.iter().enumerate().take(CELL_COUNT) {
        let rect = geometry.cell_rect(cell).intersection(area);
        if rect.is_empty() {
            continue;
        }
        let active = snap.active_cells.contains(&cell);
        let style = if active { lit } else { unlit };

        let block = Block::default().borders(Borders::ALL).style(style);
        let inner = block.inner(rect);
        block.render(rect, buf);
        Paragraph::new(Span::styled(key.to_string(), style))
            .alignment(Alignment::Center)
            .render(inner, buf);
    }

    match snap.state {
        SessionState::Idle => overlay(
            geometry.origin,
            buf,
            vec![Line::from(Span::styled(
                "press space to start",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            ))],
        ),
        SessionState::Ended => overlay(geometry.origin, buf, game_over_lines(snap)),
        SessionState::Running => {}
    }
}

fn game_over_lines(snap: &Snapshot) -> Vec<Line<'static>> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(Span::styled(
        "GAME OVER",
        Style::default().patch(bold_style).fg(Color::Red),
    ))];
    if let Some(end) = &snap.end {
        let why = match end.cause {
            EndCause::SlowClick { .. } => "too slow",
            EndCause::Expired { .. } => "missed a target",
        };
        lines.push(Line::from(format!(
            "{} ({}ms)",
            why, end.terminal_reaction_ms
        )));
        lines.push(Line::from(Span::styled(
            format!("final score {}", end.final_score),
            bold_style,
        )));
    }
    if snap.new_high_score {
        lines.push(Line::from(Span::styled(
            "NEW HIGH SCORE!",
            Style::default().patch(bold_style).fg(Color::Yellow),
        )));
    }
    lines
}

fn overlay(area: Rect, buf: &mut Buffer, lines: Vec<Line<'static>>) {
    let height = (lines.len() as u16 + 2).min(area.height);
    let width = area.width.min(30).max(area.width / 2);
    let rect = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );
    Clear.render(rect, buf);
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(rect, buf);
}

fn render_side_panel(snap: &Snapshot, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let points: Vec<(f64, f64)> = reaction_series(&snap.reaction_samples)
        .into_iter()
        .map(Into::into)
        .collect();
    let (clicks, ceiling) = charting::compute_chart_params(&points);
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&points)];

    Chart::new(datasets)
        .block(Block::default().title("reaction").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title("click")
                .bounds([0.0, clicks])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(clicks), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("ms")
                .bounds([0.0, ceiling])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(ceiling), bold_style),
                ]),
        )
        .render(chunks[0], buf);

    let history: Vec<Line> = if snap.history.is_empty() {
        vec![Line::from(Span::styled(
            "no games yet",
            Style::default().add_modifier(Modifier::ITALIC),
        ))]
    } else {
        snap.history
            .iter()
            .map(|r| {
                Line::from(format!(
                    "{}  {:>6}  {:>3} clicks  {:>4.0}ms",
                    r.played_at.format("%m-%d %H:%M"),
                    r.score,
                    r.click_count,
                    r.avg_reaction_ms
                ))
            })
            .collect()
    };
    Paragraph::new(history)
        .block(Block::default().title("history").borders(Borders::ALL))
        .render(chunks[1], buf);
}

fn fmt_ms(ms: Option<f64>) -> String {
    match ms {
        Some(ms) => format!("{ms:.0}ms"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflex::config::KeyLayout;
    use reflex::difficulty::DifficultyLabel;
    use reflex::records::GameResult;
    use reflex::session::SessionEnd;
    use reflex::stats::ReactionSummary;

    fn snapshot(state: SessionState) -> Snapshot {
        Snapshot {
            state,
            active_cells: vec![],
            score: 0,
            click_count: 0,
            reactions: ReactionSummary::default(),
            reaction_samples: vec![],
            last_reaction_ms: None,
            difficulty: DifficultyLabel::for_progress(0),
            high_score: 0,
            new_high_score: false,
            end: None,
            history: vec![],
            muted: false,
        }
    }

    fn render(app: &App, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn idle_screen_prompts_to_start() {
        let app = App::headless(snapshot(SessionState::Idle), KeyLayout::Numpad);
        let rendered = render(&app, 100, 30);
        assert!(rendered.contains("press space to start"));
        assert!(rendered.contains("Easy 1"));
        assert!(rendered.contains("no games yet"));
    }

    #[test]
    fn running_screen_shows_keys_and_score() {
        let mut snap = snapshot(SessionState::Running);
        snap.active_cells = vec![4];
        snap.score = 750;
        snap.click_count = 1;
        snap.reaction_samples = vec![250];
        snap.last_reaction_ms = Some(250);
        let app = App::headless(snap, KeyLayout::Qwerty);
        let rendered = render(&app, 100, 30);
        assert!(rendered.contains("score 750"));
        assert!(rendered.contains("last 250ms"));
        for key in KeyLayout::Qwerty.keys() {
            assert!(rendered.contains(key), "missing key {key}");
        }
    }

    #[test]
    fn ended_screen_shows_result_and_high_score() {
        let mut snap = snapshot(SessionState::Ended);
        snap.score = 1800;
        snap.high_score = 1800;
        snap.new_high_score = true;
        snap.end = Some(SessionEnd {
            cause: EndCause::Expired { cell: 2 },
            final_score: 1800,
            terminal_reaction_ms: 1520,
            click_count: 2,
            avg_reaction_ms: 100.0,
        });
        snap.history = vec![GameResult::from_end(
            snap.end.as_ref().unwrap(),
            chrono::Local::now(),
        )];
        let app = App::headless(snap, KeyLayout::Numpad);
        let rendered = render(&app, 100, 30);
        assert!(rendered.contains("GAME OVER"));
        assert!(rendered.contains("final score 1800"));
        assert!(rendered.contains("NEW HIGH SCORE!"));
        assert!(!rendered.contains("no games yet"));
    }

    #[test]
    fn renders_in_odd_sizes() {
        let app = App::headless(snapshot(SessionState::Ended), KeyLayout::Numpad);
        for (w, h) in [(20, 10), (200, 5), (40, 60), (68, 24)] {
            let _ = render(&app, w, h);
        }
    }

    #[test]
    fn grid_geometry_matches_rendered_cells() {
        let mut snap = snapshot(SessionState::Running);
        snap.active_cells = vec![0];
        let app = App::headless(snap, KeyLayout::Numpad);
        let area = Rect::new(0, 0, 100, 30);
        let mut buffer = Buffer::empty(area);
        (&app).render(area, &mut buffer);

        let geometry = grid_geometry(area);
        let first = geometry.cell_rect(0);
        let cell = buffer.cell((first.x + 1, first.y + 1)).unwrap();
        assert_eq!(cell.bg, phase_color(Phase::Easy));
        assert_eq!(geometry.cell_at(first.x + 1, first.y + 1), Some(0));
    }

    #[test]
    fn side_panel_only_on_wide_terminals() {
        assert!(panels(Rect::new(0, 0, 100, 30)).side.is_some());
        assert!(panels(Rect::new(0, 0, 50, 30)).side.is_none());
    }
}
