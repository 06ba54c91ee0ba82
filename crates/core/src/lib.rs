//! Core game logic - pure, synchronous, and testable
//!
//! This crate contains the falling-block rules: the grid, the pieces, collision, rotation,
//! scoring and the session state machine. It has **no dependencies** on rendering,
//! input or I/O, and no global state: every [`Session`] is an independent owned value.
//!
//! # Module Structure
//!
//! - [`catalog`]: piece shapes for every kind and rotation, built at compile time
//! - [`board`]: 10x20 grid of locked cells with full-row clearing
//! - [`piece`]: a shape placed on the grid, copied rather than mutated
//! - [`collision`]: the single legality check used before any commit
//! - [`rotation`]: clockwise turn with a horizontal wall-kick search
//! - [`scoring`]: classic line-clear table, level and gravity progression
//! - [`rng`]: piece sources (uniform random, scripted)
//! - [`session`]: the state machine driving tick, lock, clear and spawn
//! - [`snapshot`]: immutable read-back for hosts
//!
//! # Example
//!
//! ```
//! use arcade_blocks_core::Session;
//! use arcade_blocks_types::{Intent, Status};
//!
//! let mut session = Session::new(12345);
//! session.apply_intent(Intent::MoveLeft);
//! session.apply_intent(Intent::Rotate);
//! let snapshot = session.apply_intent(Intent::HardDrop);
//!
//! assert_eq!(snapshot.status, Status::Playing);
//! assert_eq!(snapshot.board.iter().flatten().filter(|c| c.is_some()).count(), 4);
//! ```
//!
//! # Timing
//!
//! The session has no clock of its own. The host calls
//! [`Session::tick`](session::Session::tick) with elapsed milliseconds; gravity fires
//! once the accumulated time exceeds the level's drop interval (1000ms at level 1,
//! 100ms faster per level, never below 100ms).

pub mod board;
pub mod catalog;
pub mod collision;
pub mod piece;
pub mod rng;
pub mod rotation;
pub mod scoring;
pub mod session;
pub mod snapshot;

pub use arcade_blocks_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use catalog::{shape_for, Shape};
pub use collision::collides;
pub use piece::Piece;
pub use rng::{PieceSource, RandomPieces, ScriptedPieces, SimpleRng};
pub use rotation::try_rotate;
pub use scoring::{calculate_line_score, Progress, ScoreResult};
pub use session::{LockEvent, Session};
pub use snapshot::{ActiveSnapshot, GameSnapshot, TimersSnapshot};
