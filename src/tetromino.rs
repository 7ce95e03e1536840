//! The seven piece kinds and their rotation masks.
//!
//! Each kind has 4 rotation states, each a 4x4 mask with exactly 4 occupied
//! cells. Block offsets are re-derived from the mask on every rotation so
//! the rotation state and the offsets can never drift apart.

use ratatui::style::Color;

/// The 7 piece kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I, // Cyan - long bar
    O, // Yellow - square
    T, // Magenta - T-shape
    J, // Blue - J-shape
    L, // Orange - L-shape
    S, // Green - S-shape
    Z, // Red - Z-shape
}

impl PieceKind {
    /// Display color for this kind, used for both the falling piece and
    /// its locked cells.
    pub fn color(self) -> Color {
        match self {
            PieceKind::I => Color::Cyan,
            PieceKind::O => Color::Yellow,
            PieceKind::T => Color::Magenta,
            PieceKind::J => Color::Blue,
            PieceKind::L => Color::Rgb(255, 165, 0), // Orange
            PieceKind::S => Color::Green,
            PieceKind::Z => Color::Red,
        }
    }

    /// All kinds, in a fixed order, for bag shuffling.
    pub fn all() -> [PieceKind; 7] {
        [
            PieceKind::I,
            PieceKind::O,
            PieceKind::T,
            PieceKind::J,
            PieceKind::L,
            PieceKind::S,
            PieceKind::Z,
        ]
    }

    /// The 4x4 mask for a rotation state, as 4 rows of `.`/`#`.
    /// Row index 0 is the BOTTOM of the bounding box (y increases upward).
    fn mask(self, rotation: u8) -> [&'static str; 4] {
        match self {
            PieceKind::I => match rotation % 4 {
                0 => ["....", "####", "....", "...."],
                1 => ["..#.", "..#.", "..#.", "..#."],
                2 => ["....", "....", "####", "...."],
                _ => [".#..", ".#..", ".#..", ".#.."],
            },
            // O occupies the same cells in every state
            PieceKind::O => ["....", ".##.", ".##.", "...."],
            PieceKind::T => match rotation % 4 {
                0 => ["....", ".###", "..#.", "...."],
                1 => ["....", "..#.", ".##.", "..#."],
                2 => ["....", "..#.", ".###", "...."],
                _ => ["....", ".#..", ".##.", ".#.."],
            },
            PieceKind::J => match rotation % 4 {
                0 => ["....", ".###", "...#", "...."],
                1 => ["....", "..#.", "..#.", ".##."],
                2 => ["....", ".#..", ".###", "...."],
                _ => ["....", ".##.", ".#..", ".#.."],
            },
            PieceKind::L => match rotation % 4 {
                0 => ["....", ".###", ".#..", "...."],
                1 => ["....", ".##.", "..#.", "..#."],
                2 => ["....", "...#", ".###", "...."],
                _ => ["....", ".#..", ".#..", ".##."],
            },
            PieceKind::S => match rotation % 4 {
                0 | 2 => ["....", "..##", ".##.", "...."],
                _ => ["....", ".#..", ".##.", "..#."],
            },
            PieceKind::Z => match rotation % 4 {
                0 | 2 => ["....", ".##.", "..##", "...."],
                _ => ["....", "..#.", ".##.", ".#.."],
            },
        }
    }

    /// The 4 occupied (x, y) offsets within the 4x4 box for a rotation
    /// state. Pure function of (kind, rotation); scan order matches the
    /// mask layout (bottom row first).
    pub fn block_offsets(self, rotation: u8) -> [(i32, i32); 4] {
        let mut offsets = [(0, 0); 4];
        let mut n = 0;
        for (y, row) in self.mask(rotation).iter().enumerate() {
            for (x, cell) in row.bytes().enumerate() {
                if cell == b'#' && n < 4 {
                    offsets[n] = (x as i32, y as i32);
                    n += 1;
                }
            }
        }
        offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_mask_has_exactly_four_blocks() {
        for kind in PieceKind::all() {
            for rotation in 0..4u8 {
                let count: usize = kind
                    .mask(rotation)
                    .iter()
                    .map(|row| row.bytes().filter(|&b| b == b'#').count())
                    .sum();
                assert_eq!(count, 4, "{:?} rotation {}", kind, rotation);
            }
        }
    }

    #[test]
    fn offsets_are_distinct_and_in_box() {
        for kind in PieceKind::all() {
            for rotation in 0..4u8 {
                let offsets = kind.block_offsets(rotation);
                let unique: HashSet<_> = offsets.iter().collect();
                assert_eq!(unique.len(), 4);
                for (x, y) in offsets {
                    assert!((0..4).contains(&x) && (0..4).contains(&y));
                }
            }
        }
    }

    #[test]
    fn o_piece_never_changes() {
        let base = PieceKind::O.block_offsets(0);
        for rotation in 1..4u8 {
            assert_eq!(PieceKind::O.block_offsets(rotation), base);
        }
    }

    #[test]
    fn rotation_wraps_mod_4() {
        for kind in PieceKind::all() {
            assert_eq!(kind.block_offsets(0), kind.block_offsets(4));
        }
    }
}
