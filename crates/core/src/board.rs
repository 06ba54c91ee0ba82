//! Board module - the persistent grid of locked cells
//!
//! A 10x20 grid where each cell is empty or holds the kind of the piece that locked there.
//! Stored as a flat row-major array: zero allocation and cheap to copy into snapshots.
//! Coordinates: (x, y) with x in 0..10 (left to right) and y in 0..20 (top to bottom).
//!
//! Rows above the board (y < 0) are part of the spawn area. They are never stored here;
//! the collision resolver treats them as empty.

use arrayvec::ArrayVec;

use crate::types::{Cell, PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

const WIDTH: usize = BOARD_WIDTH as usize;
const HEIGHT: usize = BOARD_HEIGHT as usize;

/// Total number of cells on the board
const BOARD_SIZE: usize = WIDTH * HEIGHT;

/// Row indices removed by one [`Board::clear_full_rows`] pass, bottom to top
pub type ClearedRows = ArrayVec<usize, HEIGHT>;

/// Cell grid in snapshot layout
pub type Grid = [[Cell; WIDTH]; HEIGHT];

/// The game board - 10 columns x 20 rows using flat array storage
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    /// Flat array of cells, row-major order (y * WIDTH + x)
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_SIZE],
        }
    }

    /// Build a board from text rows, aligned to the bottom of the grid.
    ///
    /// `.` marks an empty cell, a kind letter (`I`, `O`, ...) an occupied one. Missing rows
    /// at the top are empty.
    ///
    /// # Panics
    ///
    /// Panics if more than 20 rows are given, a row is not 10 characters wide, or a
    /// character is neither `.` nor a kind letter.
    ///
    /// ```
    /// use arcade_blocks_core::Board;
    ///
    /// let board = Board::from_rows(&["IIII...OO."]);
    /// assert!(board.is_occupied(0, 19));
    /// assert!(!board.is_occupied(9, 19));
    /// ```
    pub fn from_rows(rows: &[&str]) -> Self {
        assert!(rows.len() <= HEIGHT, "board has at most {} rows", HEIGHT);
        let mut board = Self::new();
        let top = HEIGHT - rows.len();
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.chars().count(), WIDTH, "row {:?} must be {} wide", row, WIDTH);
            for (x, c) in row.chars().enumerate() {
                let cell = match c {
                    '.' => None,
                    other => Some(
                        PieceKind::from_char(other)
                            .unwrap_or_else(|| panic!("unknown board character {:?}", other)),
                    ),
                };
                board.cells[(top + i) * WIDTH + x] = cell;
            }
        }
        board
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if !Self::is_inside_bounds(x, y) {
            return None;
        }
        Some((y as usize) * WIDTH + (x as usize))
    }

    /// Get width of the board
    pub fn width(&self) -> u8 {
        BOARD_WIDTH
    }

    /// Get height of the board
    pub fn height(&self) -> u8 {
        BOARD_HEIGHT
    }

    /// Whether (x, y) is a stored cell: x in [0, 10) and y in [0, 20)
    pub fn is_inside_bounds(x: i8, y: i8) -> bool {
        x >= 0 && (x as usize) < WIDTH && y >= 0 && (y as usize) < HEIGHT
    }

    /// Get cell at position (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Whether the cell at (x, y) holds a locked piece.
    ///
    /// # Panics
    ///
    /// Panics when (x, y) is outside the board, including the spawn area above it.
    /// Callers must bounds-check first, which the collision resolver does.
    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        assert!(y >= 0, "is_occupied called above the board at ({}, {})", x, y);
        match Self::index(x, y) {
            Some(idx) => self.cells[idx].is_some(),
            None => panic!("is_occupied called outside the board at ({}, {})", x, y),
        }
    }

    /// Overwrite the cell at (x, y) with a locked cell of `kind`.
    ///
    /// # Panics
    ///
    /// Panics when (x, y) is outside the board.
    pub fn write_cell(&mut self, x: i8, y: i8, kind: PieceKind) {
        match Self::index(x, y) {
            Some(idx) => self.cells[idx] = Some(kind),
            None => panic!("write_cell outside the board at ({}, {})", x, y),
        }
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= HEIGHT {
            return false;
        }
        let start = y * WIDTH;
        self.cells[start..start + WIDTH].iter().all(|cell| cell.is_some())
    }

    /// Clear all full rows and return the row indices that were cleared (sorted bottom to top)
    ///
    /// Single pass with two pointers: non-full rows are copied down over the removed ones,
    /// keeping their relative order, then the freed rows at the top are emptied.
    pub fn clear_full_rows(&mut self) -> ClearedRows {
        let mut cleared_rows = ClearedRows::new();
        let mut write_y = HEIGHT;

        // Scan from bottom to top
        for read_y in (0..HEIGHT).rev() {
            if self.is_row_full(read_y) {
                cleared_rows.push(read_y);
            } else {
                write_y -= 1;
                if write_y != read_y {
                    let src_start = read_y * WIDTH;
                    let dst_start = write_y * WIDTH;
                    self.cells
                        .copy_within(src_start..src_start + WIDTH, dst_start);
                }
            }
        }

        // Clear the remaining rows at the top
        for cell in &mut self.cells[..write_y * WIDTH] {
            *cell = None;
        }

        cleared_rows
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterate rows from top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks_exact(WIDTH)
    }

    /// Copy into the 2D snapshot layout
    pub fn to_grid(&self) -> Grid {
        let mut grid = [[None; WIDTH]; HEIGHT];
        for (dst, src) in grid.iter_mut().zip(self.rows()) {
            dst.copy_from_slice(src);
        }
        grid
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        self.cells = [None; BOARD_SIZE];
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
