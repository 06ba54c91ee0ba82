//! Geometry catalog - piece shapes for every rotation
//!
//! Each kind has a minimal spawn matrix (row 0 on top). The other three rotations are
//! derived by turning the matrix 90° clockwise, so the bounding box swaps width and
//! height on every step. The full 7x4 table is built at compile time and never mutated.

use arrayvec::ArrayVec;

use crate::types::{PieceKind, Rotation, BOARD_WIDTH};

/// Largest bounding-box side of any shape
pub const MAX_SPAN: usize = 4;

/// Filled cells per piece
pub const MINOS: usize = 4;

/// Offset of a single mino relative to the piece's top-left anchor
pub type MinoOffset = (i8, i8);

/// Mino offsets of one shape
pub type MinoOffsets = ArrayVec<MinoOffset, MINOS>;

/// Immutable boolean matrix of one (kind, rotation) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    rows: u8,
    cols: u8,
    mask: [[bool; MAX_SPAN]; MAX_SPAN],
}

impl Shape {
    const fn parse(rows: &[&[u8]]) -> Shape {
        let mut mask = [[false; MAX_SPAN]; MAX_SPAN];
        let mut r = 0;
        while r < rows.len() {
            let mut c = 0;
            while c < rows[r].len() {
                mask[r][c] = rows[r][c] != 0;
                c += 1;
            }
            r += 1;
        }
        Shape {
            rows: rows.len() as u8,
            cols: rows[0].len() as u8,
            mask,
        }
    }

    /// Turn 90° clockwise: new row `i` is old column `i` read bottom to top.
    const fn rotated_cw(&self) -> Shape {
        let mut mask = [[false; MAX_SPAN]; MAX_SPAN];
        let old_rows = self.rows as usize;
        let old_cols = self.cols as usize;
        let mut i = 0;
        while i < old_cols {
            let mut j = 0;
            while j < old_rows {
                mask[i][j] = self.mask[old_rows - 1 - j][i];
                j += 1;
            }
            i += 1;
        }
        Shape {
            rows: self.cols,
            cols: self.rows,
            mask,
        }
    }

    /// Bounding-box height
    pub fn rows(&self) -> u8 {
        self.rows
    }

    /// Bounding-box width
    pub fn cols(&self) -> u8 {
        self.cols
    }

    /// Whether the matrix cell at (`row`, `col`) is filled; false outside the box
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        row < self.rows as usize && col < self.cols as usize && self.mask[row][col]
    }

    /// Filled cells as (dx, dy) offsets, row-major
    pub fn minos(&self) -> MinoOffsets {
        let mut out = MinoOffsets::new();
        for row in 0..self.rows as usize {
            for col in 0..self.cols as usize {
                if self.mask[row][col] {
                    out.push((col as i8, row as i8));
                }
            }
        }
        out
    }
}

const I_BASE: Shape = Shape::parse(&[&[1, 1, 1, 1]]);
const O_BASE: Shape = Shape::parse(&[&[1, 1], &[1, 1]]);
const T_BASE: Shape = Shape::parse(&[&[0, 1, 0], &[1, 1, 1]]);
const S_BASE: Shape = Shape::parse(&[&[0, 1, 1], &[1, 1, 0]]);
const Z_BASE: Shape = Shape::parse(&[&[1, 1, 0], &[0, 1, 1]]);
const J_BASE: Shape = Shape::parse(&[&[1, 0, 0], &[1, 1, 1]]);
const L_BASE: Shape = Shape::parse(&[&[0, 0, 1], &[1, 1, 1]]);

const fn rotations(base: Shape) -> [Shape; 4] {
    let east = base.rotated_cw();
    let south = east.rotated_cw();
    let west = south.rotated_cw();
    [base, east, south, west]
}

/// Indexed by [`PieceKind::index`], then [`Rotation::index`]
static CATALOG: [[Shape; 4]; 7] = [
    rotations(I_BASE),
    rotations(O_BASE),
    rotations(T_BASE),
    rotations(S_BASE),
    rotations(Z_BASE),
    rotations(J_BASE),
    rotations(L_BASE),
];

/// Shape of `kind` in `rotation`
pub fn shape_for(kind: PieceKind, rotation: Rotation) -> &'static Shape {
    &CATALOG[kind.index()][rotation.index() as usize]
}

/// Spawn column: the spawn shape centered on the board (integer division on both sides)
pub fn spawn_x(kind: PieceKind) -> i8 {
    let cols = shape_for(kind, Rotation::North).cols() as i8;
    (BOARD_WIDTH / 2) as i8 - cols / 2
}
