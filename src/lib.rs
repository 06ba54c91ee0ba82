//! Arcade Blocks (workspace facade crate).
//!
//! Re-exports the workspace crates under one name: `arcade_blocks::{core,engine,adapter,types}`.
//! The implementation lives in dedicated crates under `crates/`.

pub use arcade_blocks_adapter as adapter;
pub use arcade_blocks_core as core;
pub use arcade_blocks_engine as engine;
pub use arcade_blocks_types as types;
