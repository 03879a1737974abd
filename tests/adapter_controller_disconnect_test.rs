use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use math_tiles::adapter::protocol::{create_command, create_hello};
use math_tiles::adapter::{
    create_ack, run_server_with_stats, InboundCommand, InboundPayload, OutboundMessage,
    ServerConfig, ServerStats,
};
use math_tiles::types::GameAction;

async fn read_line(
    lines: &mut tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>,
) -> serde_json::Value {
    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timeout waiting for line")
        .expect("io error")
        .expect("expected line");
    serde_json::from_str(&line).unwrap()
}

async fn write_json<T: serde::Serialize>(w: &mut tokio::net::tcp::OwnedWriteHalf, msg: &T) {
    w.write_all(serde_json::to_string(msg).unwrap().as_bytes())
        .await
        .unwrap();
    w.write_all(b"\n").await.unwrap();
    w.flush().await.unwrap();
}

#[tokio::test]
async fn observer_is_promoted_when_controller_leaves() {
    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    let stats = std::sync::Arc::new(ServerStats::default());

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<InboundCommand>(16);
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();

    let server_stats = stats.clone();
    let server_handle = tokio::spawn(async move {
        let _ = run_server_with_stats(config, cmd_tx, out_rx, Some(ready_tx), server_stats).await;
    });

    // Ack every command without touching a game.
    let engine_handle = tokio::spawn(async move {
        while let Some(inbound) = cmd_rx.recv().await {
            if let InboundPayload::Command(actions) = inbound.payload {
                let ack = create_ack(inbound.seq, actions.len() as u32);
                let _ = out_tx.send(OutboundMessage::ToClientAck {
                    client_id: inbound.client_id,
                    ack,
                });
            }
        }
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .unwrap()
        .unwrap();

    let first = TcpStream::connect(addr).await.unwrap();
    let (first_read, mut first_write) = first.into_split();
    let mut first_lines = BufReader::new(first_read).lines();
    let mut hello = create_hello(1, "first", "1.0.0");
    hello.requested.stream_observations = false;
    write_json(&mut first_write, &hello).await;
    let welcome = read_line(&mut first_lines).await;
    assert_eq!(welcome["role"], "controller");
    let first_id = welcome["client_id"].as_u64().unwrap() as usize;

    let second = TcpStream::connect(addr).await.unwrap();
    let (second_read, mut second_write) = second.into_split();
    let mut second_lines = BufReader::new(second_read).lines();
    let mut hello = create_hello(1, "second", "1.0.0");
    hello.requested.stream_observations = false;
    write_json(&mut second_write, &hello).await;
    let welcome = read_line(&mut second_lines).await;
    assert_eq!(welcome["role"], "observer");
    let second_id = welcome["client_id"].as_u64().unwrap() as usize;

    assert_eq!(stats.client_count(), 2);
    assert_eq!(stats.controller_id(), Some(first_id));

    // Controller goes away.
    drop(first_write);
    drop(first_lines);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(stats.client_count(), 1);
    assert_eq!(stats.controller_id(), Some(second_id));

    write_json(&mut second_write, &create_command(2, &[GameAction::Validate])).await;
    let resp = read_line(&mut second_lines).await;
    assert_eq!(resp["type"], "ack", "expected ack, got {resp}");
    assert_eq!(resp["seq"], 2);

    // Last client leaving releases control.
    drop(second_write);
    drop(second_lines);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(stats.client_count(), 0);
    assert_eq!(stats.controller_id(), None);

    server_handle.abort();
    engine_handle.abort();
}
