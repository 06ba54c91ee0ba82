use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use arcade_blocks::adapter::{run_server, ServerConfig};

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect failed");
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn recv(&mut self) -> Option<serde_json::Value> {
        let line = tokio::time::timeout(Duration::from_secs(2), self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .expect("read failed")?;
        Some(serde_json::from_str(&line).expect("server sent invalid JSON"))
    }

    async fn expect(&mut self, msg_type: &str) -> serde_json::Value {
        let v = self.recv().await.expect("connection closed");
        assert_eq!(v["type"], msg_type, "unexpected message {}", v);
        v
    }
}

async fn start_server(config: ServerConfig) -> (SocketAddr, JoinHandle<()>) {
    let (ready_tx, ready_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let _ = run_server(config, Some(ready_tx)).await;
    });
    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("server did not signal ready")
        .expect("ready channel dropped");
    (addr, handle)
}

fn test_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        // Long step keeps gravity out of the way.
        tick_ms: 60_000,
        ..ServerConfig::default()
    }
}

#[tokio::test]
async fn adapter_hello_command_ack_and_observation() {
    let (addr, server) = start_server(test_config()).await;
    let mut client = Client::connect(addr).await;

    client
        .send(r#"{"type":"hello","seq":1,"client":{"name":"e2e","version":"0.1"}}"#)
        .await;
    let welcome = client.expect("welcome").await;
    assert_eq!(welcome["seq"], 1);
    assert_eq!(welcome["board"]["width"], 10);
    assert_eq!(welcome["board"]["height"], 20);
    assert_eq!(welcome["tick_ms"], 60_000);

    let first = client.expect("observation").await;
    assert_eq!(first["status"], "playing");
    assert_eq!(first["score"], 0);
    assert_eq!(first["level"], 1);
    let x0 = first["active"]["x"].as_i64().unwrap();

    client
        .send(r#"{"type":"command","seq":2,"intents":["moveLeft"]}"#)
        .await;
    let ack = client.expect("ack").await;
    assert_eq!(ack["seq"], 2);
    assert_eq!(ack["status"], "ok");
    let moved = client.expect("observation").await;
    assert_eq!(moved["active"]["x"].as_i64().unwrap(), x0 - 1);

    client
        .send(r#"{"type":"command","seq":3,"intents":["hardDrop"]}"#)
        .await;
    client.expect("ack").await;
    let dropped = client.expect("observation").await;
    let occupied: usize = dropped["board"]["cells"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|row| row.as_array().unwrap().iter())
        .filter(|c| c.as_u64().unwrap() != 0)
        .count();
    assert_eq!(occupied, 4);

    server.abort();
}

#[tokio::test]
async fn adapter_rejects_bad_input_without_closing() {
    let (addr, server) = start_server(test_config()).await;
    let mut client = Client::connect(addr).await;

    client
        .send(r#"{"type":"command","seq":1,"intents":["moveLeft"]}"#)
        .await;
    let err = client.expect("error").await;
    assert_eq!(err["code"], "not_handshaken");

    client.send(r#"{"type":"hello","seq":2}"#).await;
    client.expect("welcome").await;
    client.expect("observation").await;

    client.send("this is not json").await;
    assert_eq!(client.expect("error").await["code"], "invalid_json");

    client.send(r#"{"type":"fly","seq":3}"#).await;
    let err = client.expect("error").await;
    assert_eq!(err["code"], "unknown_type");
    assert_eq!(err["seq"], 3);

    client
        .send(r#"{"type":"command","seq":4,"intents":["hold"]}"#)
        .await;
    assert_eq!(client.expect("error").await["code"], "unknown_intent");

    client
        .send(r#"{"type":"command","seq":2,"intents":["moveLeft"]}"#)
        .await;
    assert_eq!(client.expect("error").await["code"], "stale_seq");

    client.send(r#"{"type":"snapshot","seq":5}"#).await;
    let obs = client.expect("observation").await;
    assert_eq!(obs["status"], "playing");

    server.abort();
}

#[tokio::test]
async fn adapter_sessions_are_independent() {
    let (addr, server) = start_server(test_config()).await;
    let mut a = Client::connect(addr).await;
    let mut b = Client::connect(addr).await;

    a.send(r#"{"type":"hello","seq":1}"#).await;
    a.expect("welcome").await;
    a.expect("observation").await;
    b.send(r#"{"type":"hello","seq":1}"#).await;
    b.expect("welcome").await;
    b.expect("observation").await;

    a.send(r#"{"type":"command","seq":2,"intents":["togglePause"]}"#)
        .await;
    a.expect("ack").await;
    assert_eq!(a.expect("observation").await["status"], "paused");

    b.send(r#"{"type":"snapshot","seq":2}"#).await;
    assert_eq!(b.expect("observation").await["status"], "playing");

    a.send(r#"{"type":"reset","seq":3}"#).await;
    a.expect("ack").await;
    assert_eq!(a.expect("observation").await["status"], "playing");

    server.abort();
}

#[tokio::test]
async fn adapter_streams_observations_on_tick() {
    let config = ServerConfig {
        port: 0,
        tick_ms: 10,
        ..ServerConfig::default()
    };
    let (addr, server) = start_server(config).await;
    let mut client = Client::connect(addr).await;

    client.send(r#"{"type":"hello","seq":1,"stream":true}"#).await;
    client.expect("welcome").await;
    let first = client.expect("observation").await;

    let pushed = client.expect("observation").await;
    assert!(pushed["seq"].as_u64().unwrap() > first["seq"].as_u64().unwrap());

    server.abort();
}

#[tokio::test]
async fn adapter_closes_on_overlong_line() {
    let config = ServerConfig {
        port: 0,
        tick_ms: 60_000,
        max_line_bytes: 64,
        ..ServerConfig::default()
    };
    let (addr, server) = start_server(config).await;
    let mut client = Client::connect(addr).await;

    client.send(&"x".repeat(200)).await;
    let err = client.expect("error").await;
    assert_eq!(err["code"], "line_too_long");

    // The server hangs up; unread input may turn the close into a reset.
    let tail = tokio::time::timeout(Duration::from_secs(2), client.lines.next_line())
        .await
        .expect("connection stayed open");
    assert!(!matches!(tail, Ok(Some(_))));

    server.abort();
}
