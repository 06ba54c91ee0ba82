//! Collision resolver
//!
//! The one place that decides whether a placement is legal. Every translation, rotation,
//! spawn and gravity step goes through [`collides`] before it is committed.

use crate::board::Board;
use crate::piece::Piece;
use crate::types::{BOARD_HEIGHT, BOARD_WIDTH};

/// Whether `piece` overlaps a wall, the floor, or a locked cell.
///
/// Cells above the board (y < 0) only collide with the side walls.
pub fn collides(board: &Board, piece: &Piece) -> bool {
    piece.cells().iter().any(|&(x, y)| {
        if x < 0 || x >= BOARD_WIDTH as i8 || y >= BOARD_HEIGHT as i8 {
            return true;
        }
        y >= 0 && board.is_occupied(x, y)
    })
}
