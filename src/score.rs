//! Scoring: line clears, T-spin bonuses, combo chains, back-to-back.

use std::time::Duration;

/// Per-session score state. Mutated only after a lock event; reset on
/// new-game start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    pub points: u64,
    pub level: u32,
    /// Total lines cleared this session.
    pub lines: u32,
    /// Consecutive clearing locks. 0 after any lock that cleared nothing.
    pub combo: u32,
    /// True if the previous scoring clear was a Tetris or T-spin.
    pub back_to_back: bool,
}

impl Score {
    pub fn new() -> Self {
        Self {
            points: 0,
            level: 1,
            lines: 0,
            combo: 0,
            back_to_back: false,
        }
    }

    /// Score a lock that cleared `cleared` lines. Returns the point delta,
    /// which is fully determined by (cleared, is_tspin, level, combo, B2B).
    ///
    /// A zero-line lock scores nothing and resets the combo; it never
    /// touches the back-to-back flag.
    pub fn add_clear(&mut self, cleared: u32, is_tspin: bool) -> u64 {
        if cleared == 0 {
            self.combo = 0;
            return 0;
        }

        // A 4-line T-spin is not a defined category; it scores as a plain
        // Tetris.
        let base: u64 = if is_tspin {
            match cleared {
                1 => 800,
                2 => 1200,
                3 => 1600,
                _ => 800,
            }
        } else {
            match cleared {
                1 => 100,
                2 => 300,
                3 => 500,
                _ => 800,
            }
        };

        let mut pts = base * self.level as u64;

        let difficult = cleared == 4 || is_tspin;
        if difficult && self.back_to_back {
            pts = pts * 3 / 2;
        }
        self.back_to_back = difficult;

        // Combo bonus kicks in from the 2nd consecutive clearing lock and
        // is added after the B2B multiplier, not scaled by it.
        self.combo += 1;
        if self.combo > 1 {
            pts += (self.combo as u64 - 1) * 50 * self.level as u64;
        }

        self.points += pts;
        pts
    }

    /// Level-up rule, applied after every lock: level is 1 + lines/10,
    /// never decreasing. Returns true when the level changed (the gravity
    /// interval changes with it).
    pub fn maybe_level_up(&mut self) -> bool {
        let target = self.lines / 10 + 1;
        if target > self.level {
            self.level = target;
            true
        } else {
            false
        }
    }

    /// Gravity interval for the current level, from a 60-frames-per-second
    /// base: levels 1-9 fall every (48 - 5*level) frames, 10-19 every
    /// (28 - 2*(level-10)), 20-29 every (8 - (level-20)), with a floor of
    /// one frame (which also covers levels 28-29, where the raw formula
    /// reaches zero).
    pub fn gravity_interval(&self) -> Duration {
        let frames: i64 = match self.level {
            l if l < 10 => 48 - 5 * l as i64,
            l if l < 20 => 28 - 2 * (l as i64 - 10),
            l if l < 30 => 8 - (l as i64 - 20),
            _ => 1,
        };
        Duration::from_micros(frames.max(1) as u64 * 1_000_000 / 60)
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::new()
    }
}
