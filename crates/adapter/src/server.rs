//! TCP server for remote clients
//!
//! Each connection gets its own task, and that task owns a [`Connection`]: one driver,
//! one session, and the per-client protocol state. Nothing is shared between
//! connections.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::core::{GameSnapshot, PieceSource, RandomPieces, Session};
use crate::engine::{Driver, DriverConfig};
use crate::protocol::*;

/// Protocol state for one client, independent of any socket
#[derive(Debug)]
pub struct Connection<S = RandomPieces> {
    client_id: u32,
    driver: Driver<S>,
    handshaken: bool,
    stream: bool,
    last_seq: Option<u64>,
    observation_seq: u64,
}

impl Connection<RandomPieces> {
    pub fn new(client_id: u32, config: &ServerConfig) -> Self {
        Self::with_session(
            client_id,
            Session::new(config.seed_for(client_id)),
            config.tick_ms,
        )
    }
}

impl<S: PieceSource> Connection<S> {
    pub fn with_session(client_id: u32, session: Session<S>, tick_ms: u32) -> Self {
        Self {
            client_id,
            driver: Driver::new(
                session,
                DriverConfig {
                    tick_ms,
                    ..DriverConfig::default()
                },
            ),
            handshaken: false,
            stream: false,
            last_seq: None,
            observation_seq: 0,
        }
    }

    pub fn handshaken(&self) -> bool {
        self.handshaken
    }

    pub fn streaming(&self) -> bool {
        self.stream
    }

    pub fn driver(&self) -> &Driver<S> {
        &self.driver
    }

    /// Handle one inbound line and return the replies in send order
    pub fn handle_line(&mut self, line: &str) -> Vec<ServerMessage> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let message = match parse_line(trimmed) {
            Ok(message) => message,
            Err(e) => return vec![self.reject(extract_seq(trimmed), e)],
        };
        let seq = message.seq();

        if !self.handshaken && !matches!(message, ClientMessage::Hello(_)) {
            return vec![self.reject(seq, ProtocolError::NotHandshaken(message.type_name()))];
        }
        if let Some(last) = self.last_seq {
            if seq <= last {
                return vec![self.reject(seq, ProtocolError::StaleSeq { seq, last })];
            }
        }
        self.last_seq = Some(seq);

        match message {
            ClientMessage::Hello(hello) => {
                info!(
                    client_id = self.client_id,
                    name = %hello.client.name,
                    version = %hello.client.version,
                    stream = hello.stream,
                    "client_hello"
                );
                self.handshaken = true;
                self.stream = hello.stream;
                vec![
                    ServerMessage::Welcome(create_welcome(seq, self.driver.config().tick_ms)),
                    self.observe(),
                ]
            }
            ClientMessage::Command { intents, .. } => {
                for intent in intents {
                    self.driver.send_intent(intent);
                }
                self.driver.execute_pending();
                vec![ServerMessage::Ack(create_ack(seq)), self.observe()]
            }
            ClientMessage::Reset { .. } => {
                self.driver.request_reset();
                self.driver.execute_pending();
                vec![ServerMessage::Ack(create_ack(seq)), self.observe()]
            }
            ClientMessage::Snapshot { .. } => vec![self.observe()],
        }
    }

    /// Run the driver for `elapsed_ms`. Returns pushed observations for streaming
    /// clients; the game advances either way once the client said hello.
    ///
    /// The drop timer is part of the snapshot, so a playing session pushes once per
    /// driver step. Paused and finished sessions go quiet.
    pub fn advance(&mut self, elapsed_ms: u32) -> Vec<ServerMessage> {
        if !self.handshaken {
            return Vec::new();
        }

        let mut changed: Option<GameSnapshot> = None;
        self.driver
            .advance(elapsed_ms, &mut |snapshot: &GameSnapshot| changed = Some(*snapshot));

        match changed {
            Some(snapshot) if self.stream => vec![self.observation(&snapshot)],
            _ => Vec::new(),
        }
    }

    /// Error reply for an input that could not be processed
    pub fn reject(&self, seq: u64, error: ProtocolError) -> ServerMessage {
        debug!(
            client_id = self.client_id,
            seq,
            code = ?error.code(),
            error = %error,
            "protocol_error"
        );
        ServerMessage::Error(create_error(seq, &error))
    }

    fn observe(&mut self) -> ServerMessage {
        let mut published: Option<GameSnapshot> = None;
        self.driver
            .publish(&mut |snapshot: &GameSnapshot| published = Some(*snapshot));
        let snapshot = published.unwrap_or_else(|| self.driver.snapshot());
        self.observation(&snapshot)
    }

    fn observation(&mut self, snapshot: &GameSnapshot) -> ServerMessage {
        self.observation_seq += 1;
        ServerMessage::Observation(build_observation(self.observation_seq, snapshot))
    }
}

/// Start the TCP server.
///
/// `ready_tx` receives the bound address once the listener is up.
pub async fn run_server(
    config: ServerConfig,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    let bound = listener.local_addr()?;
    info!(addr = %bound, tick_ms = config.tick_ms, "adapter_listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let config = Arc::new(config);
    let mut client_id_counter = 0u32;

    loop {
        let (socket, peer) = listener.accept().await?;
        client_id_counter = client_id_counter.wrapping_add(1);
        let client_id = client_id_counter;
        info!(client_id, peer = %peer, "client_connected");

        let config = Arc::clone(&config);
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, client_id, &config).await {
                warn!(client_id, error = %e, "client_error");
            }
            info!(client_id, "client_disconnected");
        });
    }
}

#[derive(Debug)]
enum Inbound {
    Line(String),
    TooLong,
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    client_id: u32,
    config: &ServerConfig,
) -> anyhow::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let max_line_bytes = config.max_line_bytes;

    let (line_tx, mut line_rx) = mpsc::channel::<Inbound>(32);
    let read_task = tokio::spawn(async move {
        read_lines(BufReader::new(reader), max_line_bytes, line_tx).await
    });

    let mut conn = Connection::new(client_id, config);
    let mut ticker = interval(Duration::from_millis(u64::from(config.tick_ms)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();

    loop {
        let replies = tokio::select! {
            inbound = line_rx.recv() => match inbound {
                Some(Inbound::Line(line)) => conn.handle_line(&line),
                Some(Inbound::TooLong) => {
                    let error = conn.reject(0, ProtocolError::LineTooLong(max_line_bytes));
                    write_messages(&mut writer, &[error]).await?;
                    break;
                }
                None => break,
            },
            now = ticker.tick() => {
                let elapsed = now.saturating_duration_since(last_tick);
                last_tick = now;
                let elapsed_ms = u32::try_from(elapsed.as_millis()).unwrap_or(u32::MAX);
                conn.advance(elapsed_ms)
            }
        };
        write_messages(&mut writer, &replies).await?;
    }

    read_task.abort();
    Ok(())
}

async fn write_messages<W>(writer: &mut W, messages: &[ServerMessage]) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if messages.is_empty() {
        return Ok(());
    }
    for message in messages {
        writer.write_all(&message.to_line()?).await?;
    }
    writer.flush().await?;
    Ok(())
}

/// Forward newline-delimited lines, stopping after a line longer than `max_bytes`
async fn read_lines<R>(
    mut reader: R,
    max_bytes: usize,
    tx: mpsc::Sender<Inbound>,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(256);
    loop {
        buf.clear();
        let limit = max_bytes as u64 + 1;
        let read = (&mut reader).take(limit).read_until(b'\n', &mut buf).await?;
        if read == 0 {
            return Ok(());
        }

        if buf.last() != Some(&b'\n') && buf.len() > max_bytes {
            let _ = tx.send(Inbound::TooLong).await;
            return Ok(());
        }

        let line = String::from_utf8_lossy(&buf).into_owned();
        if tx.send(Inbound::Line(line)).await.is_err() {
            return Ok(());
        }
    }
}
