//! Adapter - remote play over a TCP socket with a JSON line protocol
//!
//! Every connection gets its own session, paced by its own [`Driver`](engine::Driver).
//! Clients never share state.
//!
//! # Protocol Overview
//!
//! 1. **Connection**: client connects (default 127.0.0.1:7878)
//! 2. **Handshake**: client sends `hello`, server answers `welcome` plus an observation
//! 3. **Commanding**: `command` with a list of intents, `reset`, or `snapshot`
//! 4. **Streaming**: with `"stream": true` the server pushes an observation whenever a
//!    tick changes the game
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"client":{"name":"bot","version":"0.1"},"stream":true}
//! Server -> Client: {"type":"welcome","seq":1,"protocol_version":"1.0.0","board":{"width":10,"height":20},"tick_ms":16}
//! Server -> Client: {"type":"observation","seq":1,"status":"playing",...}
//! Client -> Server: {"type":"command","seq":2,"intents":["moveLeft","rotate","hardDrop"]}
//! Server -> Client: {"type":"ack","seq":2,"status":"ok"}
//! Server -> Client: {"type":"observation","seq":2,...}
//! ```
//!
//! # Environment Variables
//!
//! - `ARCADE_BLOCKS_HOST`: bind address (default "127.0.0.1")
//! - `ARCADE_BLOCKS_PORT`: port (default 7878, 0 for ephemeral)
//! - `ARCADE_BLOCKS_TICK_MS`: fixed step (default 16)
//! - `ARCADE_BLOCKS_SEED`: base seed (default 1)
//! - `ARCADE_BLOCKS_MAX_LINE`: max inbound line in bytes (default 4096)
//!
//! # Testing
//!
//! ```bash
//! nc 127.0.0.1 7878
//! {"type":"hello","seq":1,"client":{"name":"nc","version":"0"}}
//! ```

pub mod config;
pub mod protocol;
pub mod server;

pub use arcade_blocks_core as core;
pub use arcade_blocks_engine as engine;
pub use arcade_blocks_types as types;

pub use config::ServerConfig;
pub use protocol::*;
pub use server::{run_server, Connection};
