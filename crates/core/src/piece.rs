//! Piece module - a shape reference placed on the grid
//!
//! Pieces are small `Copy` values. Moves and rotations build a new candidate piece;
//! the session only replaces the active piece once the candidate passed collision.

use crate::catalog::{shape_for, spawn_x, MinoOffsets, Shape};
use crate::types::{PieceKind, Rotation};

/// Active or upcoming piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub rotation: Rotation,
    /// Column of the bounding box's left edge
    pub x: i8,
    /// Row of the bounding box's top edge; negative while partly above the board
    pub y: i8,
}

impl Piece {
    /// Create a piece at its spawn placement: spawn rotation, centered, top row
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: Rotation::North,
            x: spawn_x(kind),
            y: 0,
        }
    }

    /// Shape for the current rotation
    pub fn shape(&self) -> &'static Shape {
        shape_for(self.kind, self.rotation)
    }

    /// Absolute board coordinates of the filled cells
    pub fn cells(&self) -> MinoOffsets {
        self.shape()
            .minos()
            .into_iter()
            .map(|(dx, dy)| (self.x + dx, self.y + dy))
            .collect()
    }

    /// Copy shifted by (dx, dy)
    pub fn translated(&self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Copy turned one step clockwise around the same anchor
    pub fn rotated_cw(&self) -> Self {
        Self {
            rotation: self.rotation.rotate_cw(),
            ..*self
        }
    }
}
