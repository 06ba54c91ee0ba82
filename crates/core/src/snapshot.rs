use crate::board::Grid;
use crate::piece::Piece;
use crate::types::{Cell, PieceKind, Rotation, Status, BOARD_HEIGHT, BOARD_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
}

impl From<Piece> for ActiveSnapshot {
    fn from(value: Piece) -> Self {
        Self {
            kind: value.kind,
            rotation: value.rotation,
            x: value.x,
            y: value.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimersSnapshot {
    /// Time accumulated toward the next gravity step
    pub drop_ms: u32,
    pub drop_interval_ms: u32,
}

/// Immutable copy of everything a host needs to render one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    pub board: Grid,
    pub active: ActiveSnapshot,
    pub next: PieceKind,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub status: Status,
    pub timers: TimersSnapshot,
}

impl GameSnapshot {
    pub fn playable(&self) -> bool {
        self.status == Status::Playing
    }

    /// Cell at (x, y); `None` outside the board
    pub fn cell(&self, x: i8, y: i8) -> Option<Cell> {
        if x < 0 || y < 0 || x >= BOARD_WIDTH as i8 || y >= BOARD_HEIGHT as i8 {
            return None;
        }
        Some(self.board[y as usize][x as usize])
    }

    /// Board as wire codes: 0 for empty, [`PieceKind::code`] otherwise
    pub fn board_codes(&self) -> [[u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize] {
        let mut out = [[0u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize];
        for (dst_row, src_row) in out.iter_mut().zip(self.board.iter()) {
            for (dst, src) in dst_row.iter_mut().zip(src_row.iter()) {
                *dst = src.map_or(0, |kind| kind.code());
            }
        }
        out
    }
}
