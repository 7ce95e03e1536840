//! Core game state: phase machine, gravity, locking, line clears.
//!
//! All state lives in one `Game` owned by the engine loop; gravity, input
//! and the line-clear flash are folded into that single sequential flow.
//! Time is always passed in, never read here, so every transition can be
//! driven by a synthetic clock in tests.

use crate::bag::Bag;
use crate::board::{Board, TOTAL_HEIGHT, VISIBLE_HEIGHT};
use crate::piece::Piece;
use crate::score::Score;
use crate::tetromino::PieceKind;
use std::time::{Duration, Instant};

/// Line-clear flash: 6 frames at 80ms, alternating on/off.
pub const FLASH_FRAMES: u32 = 6;
pub const FLASH_INTERVAL: Duration = Duration::from_millis(80);

/// Top-level game phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    MainMenu,
    Playing,
    Paused,
    GameOver,
    /// Line-clear flash in progress; entered and exited only by the lock
    /// engine. Movement and gravity are gated on Playing, so input during
    /// the flash has no effect.
    Animating,
}

/// Input actions the game can process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    HardDrop,
    Confirm,
    Pause,
    Quit,
}

/// A pending line clear being flashed before removal.
#[derive(Debug, Clone)]
struct Flash {
    /// Qualifying rows, ascending.
    rows: Vec<usize>,
    /// T-spin status, evaluated at lock time (piece painted, rows not yet
    /// removed).
    is_tspin: bool,
    started: Instant,
    on: bool,
}

/// The complete game state.
pub struct Game {
    pub board: Board,
    pub current: Option<Piece>,
    bag: Bag,
    pub score: Score,
    pub phase: Phase,
    /// Last gravity step.
    last_fall: Instant,
    flash: Option<Flash>,
    /// Name of the last scoring clear, for the status panel.
    pub last_action: Option<String>,
}

impl Game {
    pub fn new(now: Instant) -> Self {
        Self::with_seed(rand::random(), now)
    }

    /// Seeded constructor for deterministic piece sequences in tests.
    pub fn with_seed(seed: u64, now: Instant) -> Self {
        Self {
            board: Board::new(),
            current: None,
            bag: Bag::with_seed(seed),
            score: Score::new(),
            phase: Phase::MainMenu,
            last_fall: now,
            flash: None,
            last_action: None,
        }
    }

    /// The upcoming piece kind, for the preview box.
    pub fn preview(&self) -> Option<PieceKind> {
        self.bag.peek()
    }

    /// Flashing rows and the current on/off phase, while Animating.
    pub fn flash_state(&self) -> Option<(&[usize], bool)> {
        self.flash.as_ref().map(|f| (f.rows.as_slice(), f.on))
    }

    /// Reset everything and start a fresh session (MainMenu/GameOver ->
    /// Playing).
    pub fn start(&mut self, now: Instant) {
        self.board = Board::new();
        self.score = Score::new();
        self.current = None;
        self.flash = None;
        self.last_action = None;
        self.bag.reset();
        self.phase = Phase::Playing;
        self.last_fall = now;
        self.spawn_next();
        tracing::info!("new game started");
    }

    /// Process one input action. Returns true if anything may have changed.
    pub fn apply(&mut self, action: Action, now: Instant) -> bool {
        match self.phase {
            Phase::MainMenu | Phase::GameOver => match action {
                Action::Confirm | Action::HardDrop => {
                    self.start(now);
                    true
                }
                _ => false,
            },
            Phase::Playing => match action {
                Action::Pause => {
                    self.phase = Phase::Paused;
                    true
                }
                Action::MoveLeft => self.with_piece(|piece, board| {
                    piece.move_left(board);
                }),
                Action::MoveRight => self.with_piece(|piece, board| {
                    piece.move_right(board);
                }),
                Action::Rotate => self.with_piece(|piece, board| {
                    piece.rotate(board);
                }),
                Action::SoftDrop => {
                    self.soft_drop(now);
                    true
                }
                Action::HardDrop => {
                    self.hard_drop(now);
                    true
                }
                _ => false,
            },
            Phase::Paused => match action {
                Action::Pause | Action::Confirm | Action::HardDrop => {
                    self.phase = Phase::Playing;
                    self.last_fall = now;
                    true
                }
                _ => false,
            },
            // No input reaches the flash; it resumes Playing on its own.
            Phase::Animating => false,
        }
    }

    /// Advance time-driven state: the flash animation and gravity.
    /// Returns true if anything changed (drives the redraw flag).
    pub fn update(&mut self, now: Instant) -> bool {
        match self.phase {
            Phase::Animating => self.update_flash(now),
            Phase::Playing => {
                let Some(piece) = &self.current else {
                    return false;
                };
                // Gravity only acts on a piece at a sane row.
                if piece.y < 0 || piece.y >= TOTAL_HEIGHT as i32 {
                    return false;
                }
                if now.duration_since(self.last_fall) >= self.score.gravity_interval() {
                    self.apply_gravity(now);
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    fn with_piece(&mut self, op: impl FnOnce(&mut Piece, &Board)) -> bool {
        if let Some(piece) = &mut self.current {
            op(piece, &self.board);
            true
        } else {
            false
        }
    }

    /// One gravity step: same collision-checked descent as a soft drop.
    fn apply_gravity(&mut self, now: Instant) {
        self.last_fall = now;
        let Some(piece) = &mut self.current else {
            return;
        };
        if !piece.step_down(&self.board) {
            if piece.y >= 0 && piece.y < TOTAL_HEIGHT as i32 {
                self.lock_piece(now);
            } else {
                // A forced lock at an invalid row means the geometry is
                // beyond saving.
                self.phase = Phase::GameOver;
            }
        }
    }

    fn soft_drop(&mut self, now: Instant) {
        self.last_fall = now;
        let Some(piece) = &mut self.current else {
            return;
        };
        // Soft-drop failure is the lock trigger.
        if !piece.step_down(&self.board) {
            self.lock_piece(now);
        }
    }

    fn hard_drop(&mut self, now: Instant) {
        let Some(piece) = &mut self.current else {
            return;
        };
        piece.rotated_last = false;
        let distance = piece.drop_distance(&self.board);
        // A drop that moves zero rows does not lock.
        if distance > 0 {
            piece.y -= distance;
            self.lock_piece(now);
        }
    }

    /// Lock the active piece into the grid and start clear detection.
    fn lock_piece(&mut self, now: Instant) {
        let Some(piece) = self.current.take() else {
            return;
        };

        // Out-of-range blocks are skipped by Board::set; the collision
        // checks should make that impossible.
        for (x, y) in piece.block_positions() {
            self.board.set(x, y, piece.kind);
        }

        // Full rows among those the piece touched, visible range only.
        let mut rows: Vec<usize> = piece
            .block_positions()
            .iter()
            .filter(|&&(_, y)| y >= 0 && (y as usize) < VISIBLE_HEIGHT)
            .map(|&(_, y)| y as usize)
            .filter(|&row| self.board.row_is_full(row))
            .collect();
        rows.sort_unstable();
        rows.dedup();

        if rows.is_empty() {
            self.score.add_clear(0, false);
            self.last_action = None;
            self.spawn_next();
            return;
        }

        let is_tspin = self.detect_tspin(&piece);
        tracing::debug!(rows = rows.len(), is_tspin, "lines cleared");
        self.phase = Phase::Animating;
        self.flash = Some(Flash {
            rows,
            is_tspin,
            started: now,
            on: true,
        });
    }

    /// Advance the flash; on the final frame remove the rows, score, and
    /// resume play.
    fn update_flash(&mut self, now: Instant) -> bool {
        let Some(flash) = &mut self.flash else {
            self.phase = Phase::Playing;
            return true;
        };
        let elapsed = now.duration_since(flash.started);
        let frame = (elapsed.as_millis() / FLASH_INTERVAL.as_millis()) as u32;
        if frame >= FLASH_FRAMES {
            self.finish_clear(now);
            return true;
        }
        let on = frame % 2 == 0;
        if on != flash.on {
            flash.on = on;
            return true;
        }
        false
    }

    /// Remove the flashed rows (lowest first, adjusting for prior
    /// removals), update lines/score/level, spawn the next piece.
    fn finish_clear(&mut self, now: Instant) {
        let Some(flash) = self.flash.take() else {
            return;
        };
        for (i, &row) in flash.rows.iter().enumerate() {
            self.board.remove_row_and_compact(row - i);
        }

        let cleared = flash.rows.len() as u32;
        self.score.lines += cleared;

        let was_b2b = self.score.back_to_back;
        self.score.add_clear(cleared, flash.is_tspin);
        self.last_action = Some(clear_label(
            cleared,
            flash.is_tspin,
            was_b2b && (cleared == 4 || flash.is_tspin),
            self.score.combo,
        ));

        if self.score.maybe_level_up() {
            tracing::info!(level = self.score.level, "level up");
        }

        self.phase = Phase::Playing;
        self.last_fall = now;
        self.spawn_next();
    }

    /// Pop the next kind from the bag and place it at the spawn position.
    /// On collision, retry up to 3 times shifting one row up; if it still
    /// collides the session is over. The grid is never touched here.
    fn spawn_next(&mut self) {
        let kind = self.bag.next();
        let mut piece = Piece::spawn(kind);
        if !self.board.positions_free(&piece.block_positions()) {
            let mut placed = false;
            for _ in 0..3 {
                piece.y += 1;
                if self.board.positions_free(&piece.block_positions()) {
                    placed = true;
                    break;
                }
            }
            if !placed {
                tracing::info!(score = self.score.points, "spawn blocked, game over");
                self.current = None;
                self.phase = Phase::GameOver;
                return;
            }
        }
        self.current = Some(piece);
    }

    /// T-spin test: T piece, last successful move was a rotation, and at
    /// least 3 of the 4 diagonal corners around the pivot (position +
    /// (1,1)) are occupied, out-of-bounds counting as occupied.
    fn detect_tspin(&self, piece: &Piece) -> bool {
        if piece.kind != PieceKind::T || !piece.rotated_last {
            return false;
        }
        let (cx, cy) = (piece.x + 1, piece.y + 1);
        let corners = [
            (cx - 1, cy - 1),
            (cx + 1, cy - 1),
            (cx - 1, cy + 1),
            (cx + 1, cy + 1),
        ];
        corners
            .iter()
            .filter(|&&(x, y)| self.board.is_occupied(x, y))
            .count()
            >= 3
    }
}

/// Display name for a scoring clear, in the style of the status panel.
fn clear_label(cleared: u32, is_tspin: bool, b2b: bool, combo: u32) -> String {
    let name = if is_tspin {
        match cleared {
            1 => "T-Spin Single",
            2 => "T-Spin Double",
            3 => "T-Spin Triple",
            _ => "Tetris",
        }
    } else {
        match cleared {
            1 => "Single",
            2 => "Double",
            3 => "Triple",
            _ => "Tetris",
        }
    };
    let mut label = String::new();
    if b2b {
        label.push_str("B2B ");
    }
    label.push_str(name);
    if combo > 1 {
        label.push_str(&format!(" Combo x{}", combo - 1));
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PLAY_WIDTH;

    fn t0() -> Instant {
        Instant::now()
    }

    fn playing_game(now: Instant) -> Game {
        let mut game = Game::with_seed(1, now);
        game.start(now);
        game
    }

    /// A full bottom row except for the given columns.
    fn fill_row_except(board: &mut Board, row: i32, gaps: &[i32]) {
        for x in 0..PLAY_WIDTH as i32 {
            if !gaps.contains(&x) {
                board.set(x, row, PieceKind::J);
            }
        }
    }

    #[test]
    fn confirm_starts_from_main_menu() {
        let now = t0();
        let mut game = Game::with_seed(1, now);
        assert_eq!(game.phase, Phase::MainMenu);
        assert!(game.apply(Action::Confirm, now));
        assert_eq!(game.phase, Phase::Playing);
        assert!(game.current.is_some());
        assert!(game.preview().is_some());
    }

    #[test]
    fn pause_and_resume() {
        let now = t0();
        let mut game = playing_game(now);
        game.apply(Action::Pause, now);
        assert_eq!(game.phase, Phase::Paused);
        // Movement has no effect while paused.
        let before = game.current.clone();
        game.apply(Action::MoveLeft, now);
        assert_eq!(game.current, before);
        game.apply(Action::Confirm, now);
        assert_eq!(game.phase, Phase::Playing);
    }

    #[test]
    fn gravity_moves_the_piece_down_one_row() {
        let now = t0();
        let mut game = playing_game(now);
        let y0 = game.current.as_ref().unwrap().y;
        let interval = game.score.gravity_interval();
        assert!(!game.update(now + interval / 2));
        assert_eq!(game.current.as_ref().unwrap().y, y0);
        assert!(game.update(now + interval));
        assert_eq!(game.current.as_ref().unwrap().y, y0 - 1);
    }

    #[test]
    fn lock_without_full_rows_resets_combo_and_keeps_grid() {
        let now = t0();
        let mut game = playing_game(now);
        game.score.combo = 2;
        let mut piece = Piece::spawn(PieceKind::O);
        piece.y = -1; // resting on the floor
        game.current = Some(piece);

        let points = game.score.points;
        game.apply(Action::SoftDrop, now);

        assert_eq!(game.phase, Phase::Playing);
        assert_eq!(game.score.points, points);
        assert_eq!(game.score.combo, 0);
        // The O locked at columns 4..6, rows 0..2.
        assert!(game.board.is_occupied(4, 0));
        assert!(game.board.is_occupied(5, 1));
        assert!(!game.board.is_occupied(0, 0));
        // A fresh piece spawned immediately.
        assert!(game.current.is_some());
    }

    #[test]
    fn completing_a_row_enters_animating_and_scores_after_the_flash() {
        let now = t0();
        let mut game = playing_game(now);
        fill_row_except(&mut game.board, 0, &[4, 5]);
        let mut piece = Piece::spawn(PieceKind::O);
        piece.x = 3; // O blocks at columns 4..6
        game.current = Some(piece);

        game.apply(Action::HardDrop, now);
        assert_eq!(game.phase, Phase::Animating);
        let (rows, on) = game.flash_state().expect("flash in progress");
        assert_eq!(rows, &[0]);
        assert!(on);
        // Mid-flash: no scoring yet, inputs ignored.
        assert_eq!(game.score.points, 0);
        assert!(!game.apply(Action::MoveLeft, now));

        // Flash alternates, then completes after 6 frames of 80ms.
        assert!(game.update(now + FLASH_INTERVAL));
        assert_eq!(game.flash_state().map(|(_, on)| on), Some(false));
        assert!(game.update(now + FLASH_INTERVAL * FLASH_FRAMES));

        assert_eq!(game.phase, Phase::Playing);
        assert_eq!(game.score.points, 100);
        assert_eq!(game.score.lines, 1);
        assert_eq!(game.score.combo, 1);
        // Row 0 now holds what was row 1 (the leftover O blocks).
        assert!(game.board.is_occupied(4, 0));
        assert!(!game.board.is_occupied(0, 0));
        assert_eq!(game.last_action.as_deref(), Some("Single"));
    }

    #[test]
    fn non_contiguous_rows_compact_correctly() {
        let now = t0();
        let mut game = playing_game(now);
        // Rows 0 and 2 will complete; row 1 keeps a gap at x=9.
        fill_row_except(&mut game.board, 0, &[4]);
        fill_row_except(&mut game.board, 1, &[4, 9]);
        fill_row_except(&mut game.board, 2, &[4]);
        // Marker above the cleared region.
        game.board.set(0, 3, PieceKind::S);

        // Build a vertical I in column 4: rotate at the spawn altitude,
        // then position it.
        let mut piece = Piece::spawn(PieceKind::I);
        assert!(piece.rotate(&game.board));
        piece.x = 2; // vertical bar occupies column 4
        game.current = Some(piece);

        game.apply(Action::HardDrop, now);
        assert_eq!(game.phase, Phase::Animating);
        assert_eq!(game.flash_state().unwrap().0, &[0, 2]);

        game.update(now + FLASH_INTERVAL * FLASH_FRAMES);
        // Former row 1 (with its gap) is now row 0, with the I block
        // filling column 4; the marker dropped from row 3 to row 1.
        assert!(game.board.is_occupied(4, 0));
        assert!(!game.board.is_occupied(9, 0));
        assert!(game.board.is_occupied(0, 1));
        assert_eq!(game.score.lines, 2);
    }

    #[test]
    fn blocked_spawn_after_retries_is_game_over_with_grid_intact() {
        let now = t0();
        let mut game = playing_game(now);
        // Wall off the whole spawn region, including the 3 upward retries.
        for y in 20..30 {
            fill_row_except(&mut game.board, y, &[]);
        }
        let snapshot = game.board.clone();

        game.current = None;
        game.spawn_next();

        assert_eq!(game.phase, Phase::GameOver);
        assert!(game.current.is_none());
        assert_eq!(game.board, snapshot);
    }

    #[test]
    fn tspin_requires_rotation_as_last_move() {
        let now = t0();

        let detect = |rotated: bool| {
            let mut game = playing_game(now);
            // T state 2 has its stem pointing down; rest it so the pivot
            // sits at (3, 1).
            let mut piece = Piece::spawn(PieceKind::T);
            assert!(piece.rotate(&game.board));
            assert!(piece.rotate(&game.board));
            piece.x = 2;
            piece.y = 0;
            piece.rotated_last = rotated;
            // Occupy 3 diagonal corners of the pivot neighborhood.
            game.board.set(2, 0, PieceKind::J);
            game.board.set(4, 0, PieceKind::J);
            game.board.set(2, 2, PieceKind::J);
            game.detect_tspin(&piece)
        };

        assert!(detect(true));
        // Same corners, but the piece last moved by translation.
        assert!(!detect(false));
    }

    #[test]
    fn tspin_counts_boundary_as_occupied() {
        let now = t0();
        let mut game = playing_game(now);
        // Pivot at (0, 0): the two left corners are out of bounds, one
        // in-bounds corner is filled -> 3 occupied corners.
        let mut piece = Piece::spawn(PieceKind::T);
        piece.x = -1;
        piece.y = -1;
        piece.rotated_last = true;
        game.board.set(1, 1, PieceKind::L);
        assert!(game.detect_tspin(&piece));
    }

    #[test]
    fn gravity_lock_at_invalid_row_is_game_over() {
        let now = t0();
        let mut game = playing_game(now);
        let mut piece = Piece::spawn(PieceKind::O);
        // Force an impossible geometry: piece below the floor and unable
        // to descend.
        piece.y = -5;
        game.current = Some(piece);
        game.apply_gravity(now);
        assert_eq!(game.phase, Phase::GameOver);
    }

    #[test]
    fn hard_drop_with_zero_distance_does_not_lock() {
        let now = t0();
        let mut game = playing_game(now);
        let mut piece = Piece::spawn(PieceKind::O);
        piece.y = -1; // already resting on the floor
        game.current = Some(piece.clone());
        game.apply(Action::HardDrop, now);
        // Still falling: nothing locked, same piece in play.
        assert_eq!(game.phase, Phase::Playing);
        assert!(!game.board.is_occupied(4, 0));
        assert_eq!(game.current.as_ref().map(|p| p.y), Some(-1));
    }

    #[test]
    fn update_is_inert_without_an_active_piece() {
        let now = t0();
        let mut game = Game::with_seed(1, now);
        assert!(!game.update(now + Duration::from_secs(5)));
        assert_eq!(game.phase, Phase::MainMenu);
    }
}
