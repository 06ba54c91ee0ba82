//! Scoring module - classic line-clear table and level/gravity progression
//!
//! Level starts at 1 and the line-clear points are multiplied by it directly.

use crate::types::{
    BASE_DROP_MS, DROP_INTERVAL_MIN_MS, DROP_STEP_MS, LINES_PER_LEVEL, LINE_SCORES, START_LEVEL,
};

/// Progress counters that change together after a clear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Progress {
    pub score: u32,
    pub lines: u32,
    pub level: u32,
    pub drop_interval_ms: u32,
}

impl Progress {
    /// Counters of a fresh session
    pub fn new() -> Self {
        Self {
            score: 0,
            lines: 0,
            level: START_LEVEL,
            drop_interval_ms: get_drop_interval_ms(START_LEVEL),
        }
    }

    /// Apply one lock's line clears.
    ///
    /// Score, lines, level and interval all move as one unit; a zero count changes nothing.
    /// The score uses the level in effect before the clear.
    pub fn apply_clear(&mut self, lines_cleared: usize) -> ScoreResult {
        if lines_cleared == 0 {
            return ScoreResult::default();
        }

        let points = calculate_line_score(lines_cleared, self.level);
        let lines = self.lines.saturating_add(lines_cleared as u32);
        let level = calculate_level(lines);

        *self = Self {
            score: self.score.saturating_add(points),
            lines,
            level,
            drop_interval_ms: get_drop_interval_ms(level),
        };

        ScoreResult {
            lines_cleared: lines_cleared as u32,
            points,
            level_up: level > calculate_level(lines - lines_cleared as u32),
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one [`Progress::apply_clear`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreResult {
    pub lines_cleared: u32,
    pub points: u32,
    pub level_up: bool,
}

/// Calculate line clear score (classic rules)
/// lines: number of lines cleared (1-4)
/// level: current level (1-based)
pub fn calculate_line_score(lines: usize, level: u32) -> u32 {
    if lines == 0 || lines > 4 {
        return 0;
    }
    LINE_SCORES[lines].saturating_mul(level)
}

/// Level management
/// Level increases every 10 lines cleared, starting at 1
pub fn calculate_level(total_lines: u32) -> u32 {
    total_lines / LINES_PER_LEVEL + START_LEVEL
}

/// Get drop interval for a level (in milliseconds)
/// 1000ms at level 1, 100ms faster per level, floored at 100ms
pub fn get_drop_interval_ms(level: u32) -> u32 {
    let speedup = level.saturating_sub(1).saturating_mul(DROP_STEP_MS);
    BASE_DROP_MS.saturating_sub(speedup).max(DROP_INTERVAL_MIN_MS)
}
