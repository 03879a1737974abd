use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use math_tiles::adapter::protocol::{create_command, create_hello};
use math_tiles::adapter::{
    apply_actions, build_observation, create_ack, run_server, InboundCommand, InboundPayload,
    OutboundMessage, ServerConfig,
};
use math_tiles::core::GameState;
use math_tiles::types::{GameAction, Operator, Tile};

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn send_line(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn send<T: serde::Serialize>(&mut self, msg: &T) {
        let line = serde_json::to_string(msg).unwrap();
        self.send_line(&line).await;
    }

    async fn hello(&mut self, seq: u64, name: &str, stream: bool) -> serde_json::Value {
        let mut hello = create_hello(seq, name, "1.0.0");
        hello.requested.stream_observations = stream;
        self.send(&hello).await;
        let welcome = self.recv().await;
        assert_eq!(welcome["type"], "welcome", "got {welcome}");
        welcome
    }

    async fn recv(&mut self) -> serde_json::Value {
        let line = tokio::time::timeout(Duration::from_secs(2), self.lines.next_line())
            .await
            .expect("timeout waiting for line")
            .expect("io error")
            .expect("expected line");
        serde_json::from_str(&line).unwrap()
    }
}

/// Server on an ephemeral port plus a game loop that owns a fixed board.
async fn start(cells: &'static [u64]) -> (SocketAddr, JoinHandle<()>, JoinHandle<()>) {
    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<InboundCommand>(16);
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let _ = run_server(config, cmd_tx, out_rx, Some(ready_tx)).await;
    });

    let engine = tokio::spawn(async move {
        let mut game = GameState::from_cells(cells);
        let mut obs_seq = 0;
        while let Some(inbound) = cmd_rx.recv().await {
            obs_seq += 1;
            match inbound.payload {
                InboundPayload::Command(actions) => {
                    let applied = apply_actions(&mut game, &actions);
                    let _ = out_tx.send(OutboundMessage::ToClientAck {
                        client_id: inbound.client_id,
                        ack: create_ack(inbound.seq, applied),
                    });
                    let obs = build_observation(&game.snapshot(), obs_seq);
                    let _ = out_tx.send(OutboundMessage::BroadcastObservation { obs });
                }
                InboundPayload::SnapshotRequest => {
                    let obs = build_observation(&game.snapshot(), obs_seq);
                    let _ = out_tx.send(OutboundMessage::ToClientObservation {
                        client_id: inbound.client_id,
                        obs,
                    });
                }
            }
        }
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .unwrap()
        .unwrap();
    (addr, server, engine)
}

#[tokio::test]
async fn hello_command_ack_observation() {
    let (addr, server, engine) = start(&[2, 3]).await;
    let mut client = Client::connect(addr).await;

    let welcome = client.hello(1, "bot", true).await;
    assert_eq!(welcome["role"], "controller");
    assert_eq!(welcome["protocol_version"], "1.0.0");
    assert_eq!(welcome["game_id"], "math-tiles");

    let first = client.recv().await;
    assert_eq!(first["type"], "observation");
    assert_eq!(first["cells"], serde_json::json!([2, 3]));
    assert_eq!(first["playable"], true);
    assert_eq!(first["time_remaining"], 60);

    let cmd = create_command(
        2,
        &[
            GameAction::SelectTile(Tile::Op(Operator::Mul)),
            GameAction::PlaceTile(0),
            GameAction::Validate,
        ],
    );
    client.send(&cmd).await;

    let ack = client.recv().await;
    assert_eq!(ack["type"], "ack", "got {ack}");
    assert_eq!(ack["seq"], 2);
    assert_eq!(ack["applied"], 3);

    let obs = client.recv().await;
    assert_eq!(obs["type"], "observation");
    assert_eq!(obs["status"], "solved");
    assert_eq!(obs["expression"], "2*3");
    // Weight 2 plus 60 / 5.
    assert_eq!(obs["score"], 14);
    assert_eq!(obs["last_outcome"]["accepted"], true);
    assert_eq!(obs["playable"], false);

    server.abort();
    engine.abort();
}

#[tokio::test]
async fn raw_json_actions_are_accepted() {
    let (addr, server, engine) = start(&[1, 2, 3, 4]).await;
    let mut client = Client::connect(addr).await;
    client.hello(1, "raw", false).await;

    client
        .send_line(r#"{"type":"command","seq":2,"ts":0,"actions":[{"merge":0},{"select":"^"},{"place":0},"validate"]}"#)
        .await;
    let ack = client.recv().await;
    assert_eq!(ack["type"], "ack", "got {ack}");
    assert_eq!(ack["applied"], 4);

    server.abort();
    engine.abort();
}

#[tokio::test]
async fn command_before_hello_requires_handshake() {
    let (addr, server, engine) = start(&[1, 2, 3, 4]).await;
    let mut client = Client::connect(addr).await;

    client.send(&create_command(1, &[GameAction::Validate])).await;
    let resp = client.recv().await;
    assert_eq!(resp["type"], "error");
    assert_eq!(resp["code"], "handshake_required");

    server.abort();
    engine.abort();
}

#[tokio::test]
async fn protocol_mismatch_closes_connection() {
    let (addr, server, engine) = start(&[1, 2, 3, 4]).await;
    let mut client = Client::connect(addr).await;

    client.send(&create_hello(1, "old", "0.9.0")).await;
    let resp = client.recv().await;
    assert_eq!(resp["type"], "error");
    assert_eq!(resp["code"], "protocol_mismatch");

    let next = tokio::time::timeout(Duration::from_secs(2), client.lines.next_line())
        .await
        .expect("timeout waiting for close")
        .unwrap();
    assert!(next.is_none());

    server.abort();
    engine.abort();
}

#[tokio::test]
async fn observer_cannot_command() {
    let (addr, server, engine) = start(&[1, 2, 3, 4]).await;
    let mut controller = Client::connect(addr).await;
    let ctrl_welcome = controller.hello(1, "ctrl", false).await;

    let mut observer = Client::connect(addr).await;
    let welcome = observer.hello(1, "obs", false).await;
    assert_eq!(welcome["role"], "observer");
    assert_eq!(welcome["controller_id"], ctrl_welcome["client_id"]);

    observer.send(&create_command(2, &[GameAction::NewRound])).await;
    let resp = observer.recv().await;
    assert_eq!(resp["code"], "not_controller");

    server.abort();
    engine.abort();
}

#[tokio::test]
async fn seq_must_increase() {
    let (addr, server, engine) = start(&[1, 2, 3, 4]).await;
    let mut client = Client::connect(addr).await;
    client.hello(5, "bot", false).await;

    client.send(&create_command(5, &[GameAction::Validate])).await;
    let resp = client.recv().await;
    assert_eq!(resp["type"], "error");
    assert_eq!(resp["code"], "invalid_command");
    assert_eq!(resp["seq"], 5);

    client.send(&create_command(6, &[GameAction::Validate])).await;
    let resp = client.recv().await;
    assert_eq!(resp["type"], "ack", "got {resp}");

    server.abort();
    engine.abort();
}

#[tokio::test]
async fn malformed_lines_are_reported() {
    let (addr, server, engine) = start(&[1, 2, 3, 4]).await;
    let mut client = Client::connect(addr).await;
    client.hello(1, "bot", false).await;

    client.send_line(r#"{"type":"command","seq":2,"ts":0,"actions":[{"select":"?"}]}"#).await;
    let resp = client.recv().await;
    assert_eq!(resp["code"], "invalid_command");
    assert_eq!(resp["seq"], 2);

    client.send_line(r#"{"type":"ping","seq":3}"#).await;
    let resp = client.recv().await;
    assert_eq!(resp["code"], "invalid_command");
    assert_eq!(resp["seq"], 3);

    client.send_line(r#"{"seq":4, not json"#).await;
    let resp = client.recv().await;
    assert_eq!(resp["code"], "invalid_command");
    assert_eq!(resp["seq"], 4);

    server.abort();
    engine.abort();
}
