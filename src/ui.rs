//! Terminal UI rendering with ratatui.
//!
//! Pure read-only view of the game state: board, next-piece preview,
//! score panel, and the phase overlays. Hidden-buffer rows are never
//! drawn.

use crate::board::{Cell, PLAY_WIDTH, VISIBLE_HEIGHT};
use crate::game::{Game, Phase};
use crate::tetromino::PieceKind;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

const BLOCK: &str = "██";
const EMPTY: &str = "  ";

/// Board interior is 10 cells of 2 chars; +2 for borders.
const BOARD_WIDTH_CHARS: u16 = PLAY_WIDTH as u16 * 2 + 2;
const BOARD_HEIGHT_CHARS: u16 = VISIBLE_HEIGHT as u16 + 2;
/// Side panel: next-piece box + score panel.
const PANEL_WIDTH: u16 = 16;
const GAME_WIDTH: u16 = BOARD_WIDTH_CHARS + PANEL_WIDTH;

/// Render the whole frame for the current phase.
pub fn render(frame: &mut Frame, game: &Game) {
    match game.phase {
        Phase::MainMenu => render_menu(frame),
        _ => render_game(frame, game),
    }
}

/// The main menu: title and start hint.
fn render_menu(frame: &mut Frame) {
    let area = center_rect(frame.area(), 46, 12);

    let lines = vec![
        Line::styled("██████  ██       ██████   ██████ ██   ██", Style::default().fg(Color::Cyan)),
        Line::styled("██   ██ ██      ██    ██ ██      ██  ██ ", Style::default().fg(Color::Cyan)),
        Line::styled("██████  ██      ██    ██ ██      █████  ", Style::default().fg(Color::Cyan)),
        Line::styled("██   ██ ██      ██    ██ ██      ██  ██ ", Style::default().fg(Color::Cyan)),
        Line::styled("██████  ███████  ██████   ██████ ██   ██", Style::default().fg(Color::Cyan)),
        Line::styled("              F A L L                   ", Style::default().fg(Color::Gray)),
        Line::raw(""),
        Line::styled("Press Enter or Space to start", Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled("←/→ move   ↑ rotate   ↓ soft drop", Style::default().fg(Color::DarkGray)),
        Line::styled("Space hard drop   Esc/P pause   Ctrl-C quit", Style::default().fg(Color::DarkGray)),
    ];

    let menu = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(menu, area);
}

/// Board, preview, and stats, plus the pause/game-over overlays.
fn render_game(frame: &mut Frame, game: &Game) {
    let area = frame.area();
    let game_area = center_rect(area, GAME_WIDTH, BOARD_HEIGHT_CHARS);

    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_WIDTH_CHARS),
            Constraint::Length(PANEL_WIDTH),
        ])
        .split(game_area);

    render_board(frame, layout[0], game);

    let panel = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(10)])
        .split(layout[1]);

    render_next(frame, panel[0], game.preview());
    render_stats(frame, panel[1], game);

    match game.phase {
        Phase::Paused => render_overlay(frame, area, "PAUSED", "Esc, Enter, Space or P to resume"),
        Phase::GameOver => {
            let subtitle = format!("Score {} - Enter to restart", game.score.points);
            render_overlay(frame, area, "GAME OVER", &subtitle);
        }
        _ => {}
    }
}

/// The visible 20 rows, top to bottom. Flashing rows override their cells
/// with the on/off phase while Animating.
fn render_board(frame: &mut Frame, area: Rect, game: &Game) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let flash = game.flash_state();
    let active: Vec<(i32, i32, Color)> = game
        .current
        .as_ref()
        .map(|piece| {
            let color = piece.kind.color();
            piece
                .block_positions()
                .iter()
                .map(|&(x, y)| (x, y, color))
                .collect()
        })
        .unwrap_or_default();

    let mut lines: Vec<Line> = Vec::with_capacity(VISIBLE_HEIGHT);
    for row in (0..VISIBLE_HEIGHT).rev() {
        if let Some((rows, on)) = flash {
            if rows.contains(&row) {
                let style = if on {
                    Style::default().fg(Color::White).bold()
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                lines.push(Line::from(Span::styled(BLOCK.repeat(PLAY_WIDTH), style)));
                continue;
            }
        }

        let mut spans = Vec::with_capacity(PLAY_WIDTH);
        for col in 0..PLAY_WIDTH {
            let over = active
                .iter()
                .find(|&&(x, y, _)| x == col as i32 && y == row as i32);
            let (text, style) = if let Some(&(_, _, color)) = over {
                (BLOCK, Style::default().fg(color))
            } else {
                match game.board.get(col as i32, row as i32) {
                    Some(Cell::Filled(kind)) => (BLOCK, Style::default().fg(kind.color())),
                    _ => (EMPTY, Style::default()),
                }
            };
            spans.push(Span::styled(text, style));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Next-piece preview, drawn from the rotation-0 mask.
fn render_next(frame: &mut Frame, area: Rect, next: Option<PieceKind>) {
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(kind) = next else {
        return;
    };
    let color = kind.color();
    let offsets = kind.block_offsets(0);

    // All kinds fit in box rows 1..3 at rotation 0; draw the higher row
    // first.
    let mut lines: Vec<Line> = Vec::new();
    for y in (1..3).rev() {
        let mut spans = Vec::new();
        for x in 0..4 {
            if offsets.contains(&(x, y)) {
                spans.push(Span::styled(BLOCK, Style::default().fg(color)));
            } else {
                spans.push(Span::raw(EMPTY));
            }
        }
        lines.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Score, level, lines, combo, back-to-back, and the last clear's name.
fn render_stats(frame: &mut Frame, area: Rect, game: &Game) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let score = &game.score;
    let mut lines = vec![
        Line::from(Span::styled("SCORE", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", score.points),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::styled("Level ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{}", score.level), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::styled("Lines ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{}", score.lines), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::styled("Combo ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{}", score.combo), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::styled("B2B   ", Style::default().fg(Color::Gray)),
            if score.back_to_back {
                Span::styled("on", Style::default().fg(Color::Green))
            } else {
                Span::styled("off", Style::default().fg(Color::DarkGray))
            },
        ]),
    ];

    if let Some(action) = &game.last_action {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            action.clone(),
            Style::default().fg(Color::Magenta),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Centered overlay box for Paused/GameOver.
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let width = (subtitle.len().max(title.len()) as u16 + 6).min(area.width);
    let overlay = center_rect(area, width, 5);
    frame.render_widget(Clear, overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);

    let lines = vec![
        Line::styled(title.to_string(), Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(subtitle.to_string(), Style::default().fg(Color::White)),
    ];
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        inner,
    );
}

/// Center a rect within another rect.
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
