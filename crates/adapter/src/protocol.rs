//! Protocol module - JSON line messages between remote clients and a session
//!
//! Every message is one JSON object per line with `type` and `seq`. Client `seq`
//! values must be strictly increasing per connection.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::GameSnapshot;
use crate::types::{Intent, BOARD_HEIGHT, BOARD_WIDTH};

pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Most intents accepted in one command message
pub const MAX_INTENTS_PER_COMMAND: usize = 64;

/// Intents of one command, in send order
pub type IntentList = ArrayVec<Intent, MAX_INTENTS_PER_COMMAND>;

// ============== Client -> Server Messages ==============

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// First message on a connection
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HelloMessage {
    pub seq: u64,
    #[serde(default)]
    pub client: ClientInfo,
    /// Push an observation whenever a tick changes the game
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct RawCommandMessage {
    seq: u64,
    intents: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
struct SeqOnly {
    seq: u64,
}

/// Decoded client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Hello(HelloMessage),
    Command { seq: u64, intents: IntentList },
    Reset { seq: u64 },
    Snapshot { seq: u64 },
}

impl ClientMessage {
    pub fn seq(&self) -> u64 {
        match self {
            ClientMessage::Hello(hello) => hello.seq,
            ClientMessage::Command { seq, .. }
            | ClientMessage::Reset { seq }
            | ClientMessage::Snapshot { seq } => *seq,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ClientMessage::Hello(_) => "hello",
            ClientMessage::Command { .. } => "command",
            ClientMessage::Reset { .. } => "reset",
            ClientMessage::Snapshot { .. } => "snapshot",
        }
    }
}

// ============== Errors ==============

/// Stable wire error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    UnknownType,
    NotHandshaken,
    StaleSeq,
    UnknownIntent,
    LineTooLong,
}

/// Rejected client input. Never fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("send hello before {0}")]
    NotHandshaken(&'static str),
    #[error("seq {seq} must be greater than {last}")]
    StaleSeq { seq: u64, last: u64 },
    #[error("unknown intent: {0}")]
    UnknownIntent(String),
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),
}

impl ProtocolError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ProtocolError::InvalidJson(_) => ErrorCode::InvalidJson,
            ProtocolError::UnknownType(_) => ErrorCode::UnknownType,
            ProtocolError::NotHandshaken(_) => ErrorCode::NotHandshaken,
            ProtocolError::StaleSeq { .. } => ErrorCode::StaleSeq,
            ProtocolError::UnknownIntent(_) => ErrorCode::UnknownIntent,
            ProtocolError::LineTooLong(_) => ErrorCode::LineTooLong,
        }
    }
}

// ============== Server -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSize {
    pub width: u8,
    pub height: u8,
}

/// Response to hello
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub protocol_version: String,
    pub board: BoardSize,
    pub tick_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub status: AckStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePieceMessage {
    pub kind: String,
    pub rotation: String,
    pub x: i8,
    pub y: i8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMessage {
    pub width: u8,
    pub height: u8,
    /// Row-major, top row first. 0 is empty, 1..=7 is I, O, T, S, Z, J, L.
    pub cells: [[u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
}

/// Full game state as seen by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub status: String,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub next: String,
    pub active: ActivePieceMessage,
    pub board: BoardMessage,
}

/// Anything the server writes to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Welcome(WelcomeMessage),
    Ack(AckMessage),
    Error(ErrorMessage),
    Observation(ObservationMessage),
}

impl ServerMessage {
    /// Serialize as one newline-terminated line
    pub fn to_line(&self) -> serde_json::Result<Vec<u8>> {
        let mut buf = match self {
            ServerMessage::Welcome(m) => serde_json::to_vec(m)?,
            ServerMessage::Ack(m) => serde_json::to_vec(m)?,
            ServerMessage::Error(m) => serde_json::to_vec(m)?,
            ServerMessage::Observation(m) => serde_json::to_vec(m)?,
        };
        buf.push(b'\n');
        Ok(buf)
    }
}

// ============== Parsing ==============

/// Parse one inbound line
pub fn parse_line(line: &str) -> Result<ClientMessage, ProtocolError> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(RawCommandMessage),
        #[serde(rename = "reset")]
        Reset(SeqOnly),
        #[serde(rename = "snapshot")]
        Snapshot(SeqOnly),
    }

    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

    match value.get("type").and_then(|v| v.as_str()) {
        Some("hello" | "command" | "reset" | "snapshot") => {}
        Some(other) => return Err(ProtocolError::UnknownType(other.to_string())),
        None => return Err(ProtocolError::UnknownType("<missing>".to_string())),
    }

    let inbound = serde_json::from_value::<InboundMessage>(value)
        .map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

    Ok(match inbound {
        InboundMessage::Hello(hello) => ClientMessage::Hello(hello),
        InboundMessage::Command(raw) => ClientMessage::Command {
            seq: raw.seq,
            intents: parse_intents(&raw.intents)?,
        },
        InboundMessage::Reset(m) => ClientMessage::Reset { seq: m.seq },
        InboundMessage::Snapshot(m) => ClientMessage::Snapshot { seq: m.seq },
    })
}

fn parse_intents(names: &[String]) -> Result<IntentList, ProtocolError> {
    let mut intents = IntentList::new();
    for name in names {
        let intent =
            Intent::from_str(name).ok_or_else(|| ProtocolError::UnknownIntent(name.clone()))?;
        if intents.try_push(intent).is_err() {
            return Err(ProtocolError::InvalidJson(format!(
                "at most {} intents per command",
                MAX_INTENTS_PER_COMMAND
            )));
        }
    }
    Ok(intents)
}

/// Best-effort `seq` from a line that failed to parse, 0 if absent
pub fn extract_seq(line: &str) -> u64 {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .and_then(|v| v.get("seq").and_then(|s| s.as_u64()))
        .unwrap_or(0)
}

// ============== Utility Functions ==============

pub fn create_welcome(seq: u64, tick_ms: u32) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        protocol_version: PROTOCOL_VERSION.to_string(),
        board: BoardSize {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
        },
        tick_ms,
    }
}

pub fn create_ack(seq: u64) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        status: AckStatus::Ok,
    }
}

pub fn create_error(seq: u64, error: &ProtocolError) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        code: error.code(),
        message: error.to_string(),
    }
}

/// Build an observation from a session snapshot
pub fn build_observation(seq: u64, snapshot: &GameSnapshot) -> ObservationMessage {
    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        status: snapshot.status.as_str().to_string(),
        score: snapshot.score,
        level: snapshot.level,
        lines: snapshot.lines,
        next: snapshot.next.as_str().to_string(),
        active: ActivePieceMessage {
            kind: snapshot.active.kind.as_str().to_string(),
            rotation: snapshot.active.rotation.as_str().to_string(),
            x: snapshot.active.x,
            y: snapshot.active.y,
        },
        board: BoardMessage {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            cells: snapshot.board_codes(),
        },
    }
}
