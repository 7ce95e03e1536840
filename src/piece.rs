//! The active falling piece: movement and rotation against the board.
//!
//! Every operation mutates a candidate position or rotation, checks all 4
//! blocks against the board, and reverts atomically on collision - a failed
//! move is never observable.

use crate::board::{Board, PLAY_WIDTH, VISIBLE_HEIGHT};
use crate::tetromino::PieceKind;

/// Spawn column: the 4x4 box is horizontally centered.
const SPAWN_X: i32 = {
    let x = PLAY_WIDTH as i32 / 2 - 2;
    if x < 0 { 0 } else { x }
};
/// Spawn row: 2 rows above the visible/hidden boundary, inside the buffer.
const SPAWN_Y: i32 = VISIBLE_HEIGHT as i32 + 2;

/// An active falling piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    /// Rotation state, 0..4.
    pub rotation: u8,
    /// Position of the 4x4 bounding box origin. y=0 is the bottom row.
    pub x: i32,
    pub y: i32,
    /// Occupied offsets within the box for the current rotation state.
    blocks: [(i32, i32); 4],
    /// True iff the last successful move was a rotation (T-spin tracking).
    /// Reset on every spawn; cleared by every translation attempt.
    pub rotated_last: bool,
}

impl Piece {
    /// Build a piece at the spawn position, rotation state 0.
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: 0,
            x: SPAWN_X,
            y: SPAWN_Y,
            blocks: kind.block_offsets(0),
            rotated_last: false,
        }
    }

    /// Absolute grid positions of all 4 blocks.
    pub fn block_positions(&self) -> [(i32, i32); 4] {
        self.blocks.map(|(dx, dy)| (self.x + dx, self.y + dy))
    }

    /// Try to move one column left.
    pub fn move_left(&mut self, board: &Board) -> bool {
        self.rotated_last = false;
        self.x -= 1;
        if board.positions_free(&self.block_positions()) {
            true
        } else {
            self.x += 1;
            false
        }
    }

    /// Try to move one column right.
    pub fn move_right(&mut self, board: &Board) -> bool {
        self.rotated_last = false;
        self.x += 1;
        if board.positions_free(&self.block_positions()) {
            true
        } else {
            self.x -= 1;
            false
        }
    }

    /// Try to move one row down. A failure here is the lock trigger for
    /// soft drops and gravity.
    pub fn step_down(&mut self, board: &Board) -> bool {
        self.rotated_last = false;
        self.y -= 1;
        if board.positions_free(&self.block_positions()) {
            true
        } else {
            self.y += 1;
            false
        }
    }

    /// Try to advance the rotation state. There are no wall kicks: the
    /// rotation succeeds in place or fails entirely. Success is the only
    /// thing that sets the rotation flag; failure leaves it untouched.
    pub fn rotate(&mut self, board: &Board) -> bool {
        let old_rotation = self.rotation;
        let old_blocks = self.blocks;

        self.rotation = (self.rotation + 1) % 4;
        self.blocks = self.kind.block_offsets(self.rotation);

        if board.positions_free(&self.block_positions()) {
            self.rotated_last = true;
            true
        } else {
            self.rotation = old_rotation;
            self.blocks = old_blocks;
            false
        }
    }

    /// How far the piece can fall, derived per column: for the lowest block
    /// in each occupied column, count the free cells directly beneath it and
    /// take the minimum. The floor bounds every scan, so no iteration cap
    /// is needed.
    pub fn drop_distance(&self, board: &Board) -> i32 {
        let positions = self.block_positions();
        let mut distance = i32::MAX;
        for &(x, y) in &positions {
            // Only the lowest block per column constrains the fall.
            if positions.iter().any(|&(ox, oy)| ox == x && oy < y) {
                continue;
            }
            let mut free = 0;
            while !board.is_occupied(x, y - free - 1) {
                free += 1;
            }
            distance = distance.min(free);
        }
        if distance == i32::MAX { 0 } else { distance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::TOTAL_HEIGHT;

    #[test]
    fn spawn_position_is_centered_in_the_buffer() {
        let piece = Piece::spawn(PieceKind::T);
        assert_eq!(piece.x, 3);
        assert_eq!(piece.y, 22);
        assert_eq!(piece.rotation, 0);
        assert!(!piece.rotated_last);
    }

    #[test]
    fn move_into_wall_fails_and_leaves_piece_unchanged() {
        let board = Board::new();
        let mut piece = Piece::spawn(PieceKind::O);
        piece.x = -1; // O blocks occupy columns 0 and 1
        let before = piece.clone();
        assert!(!piece.move_left(&board));
        assert_eq!(piece.x, before.x);
        assert_eq!(piece.y, before.y);
        assert_eq!(piece.rotation, before.rotation);
    }

    #[test]
    fn step_down_fails_at_the_floor() {
        let board = Board::new();
        let mut piece = Piece::spawn(PieceKind::O);
        piece.y = -1; // O occupies box rows 1..3, so its blocks sit at y 0..2
        assert!(!piece.step_down(&board));
        assert_eq!(piece.y, -1);
    }

    #[test]
    fn translations_clear_the_rotation_flag_even_on_failure() {
        let board = Board::new();
        let mut piece = Piece::spawn(PieceKind::T);
        assert!(piece.rotate(&board));
        assert!(piece.rotated_last);
        piece.x = -1; // pressed against the left wall
        assert!(!piece.move_left(&board));
        assert!(!piece.rotated_last);
    }

    #[test]
    fn blocked_rotation_reverts_state_and_offsets() {
        let mut board = Board::new();
        let mut piece = Piece::spawn(PieceKind::I);
        piece.x = 3;
        piece.y = 0;
        // The vertical I would need (5, 0); block it.
        board.set(5, 0, PieceKind::O);
        let before = piece.clone();
        assert!(!piece.rotate(&board));
        assert_eq!(piece, before);
    }

    #[test]
    fn drop_distance_reaches_the_floor_on_an_empty_board() {
        let board = Board::new();
        let piece = Piece::spawn(PieceKind::I);
        // Horizontal I at spawn has blocks at y = 23.
        assert_eq!(piece.drop_distance(&board), 23);
    }

    #[test]
    fn drop_distance_stops_on_locked_cells() {
        let mut board = Board::new();
        for x in 0..PLAY_WIDTH as i32 {
            board.set(x, 10, PieceKind::J);
        }
        let piece = Piece::spawn(PieceKind::I);
        // Blocks at y = 23 fall until resting on the filled row 10.
        assert_eq!(piece.drop_distance(&board), 12);
    }

    #[test]
    fn drop_distance_matches_repeated_step_down() {
        let mut board = Board::new();
        board.set(4, 7, PieceKind::Z);
        board.set(6, 3, PieceKind::Z);
        for kind in PieceKind::all() {
            for rotation in 0..4u8 {
                let mut piece = Piece::spawn(kind);
                for _ in 0..rotation {
                    piece.rotate(&board);
                }
                let analytic = piece.drop_distance(&board);
                let mut stepped = piece.clone();
                let mut count = 0;
                while stepped.step_down(&board) {
                    count += 1;
                    assert!(count <= TOTAL_HEIGHT as i32);
                }
                assert_eq!(analytic, count, "{:?} rotation {}", kind, rotation);
            }
        }
    }
}
