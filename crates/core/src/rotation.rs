//! Rotation resolver - clockwise turn with a horizontal wall-kick search
//!
//! The turned shape keeps its anchor. If it collides there, the anchor is walked
//! sideways by steps of +1, -2, +3, -4, ... so the net offsets run 0, +1, -1, +2, ...
//! The walk stops as soon as the next step would exceed the turned shape's column
//! count, which leaves {0, +1} for widths 1 and 2 and {0, +1, -1, +2} for widths 3
//! and 4. The first free spot wins. No vertical kicks and no per-orientation kick
//! tables.

use crate::board::Board;
use crate::collision::collides;
use crate::piece::Piece;

/// Net horizontal offsets to try for a turned shape `bound` columns wide
pub fn kick_offsets(bound: i8) -> impl Iterator<Item = i8> {
    std::iter::successors(Some((0i8, 1i8)), move |&(offset, step)| {
        let next = step.checked_add(step.signum())?.checked_neg()?;
        if next > bound {
            return None;
        }
        Some((offset.checked_add(step)?, next))
    })
    .map(|(offset, _)| offset)
}

/// Try to rotate `piece` one step clockwise.
///
/// Returns the placed piece and the horizontal kick that was applied, or `None` when
/// every offset collides. The input piece is never modified.
pub fn try_rotate(board: &Board, piece: &Piece) -> Option<(Piece, i8)> {
    let turned = piece.rotated_cw();
    let bound = turned.shape().cols() as i8;

    kick_offsets(bound)
        .map(|dx| (turned.translated(dx, 0), dx))
        .find(|(candidate, _)| !collides(board, candidate))
}
