//! TCP server for the AI adapter
//!
//! Accepts connections, performs the hello/welcome handshake, assigns the
//! controller role and forwards controller commands to the game loop. The
//! game loop answers through [`OutboundMessage`]s.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::core::{GameSnapshot, ValidationOutcome};
use crate::protocol::*;
use crate::runtime::{InboundCommand, InboundPayload, OutboundMessage};
use crate::types::{GameAction, Operator};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub max_pending_commands: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            protocol_version: PROTOCOL_VERSION.to_string(),
            max_pending_commands: 10,
        }
    }
}

impl ServerConfig {
    /// Read `MATH_TILES_AI_HOST`, `MATH_TILES_AI_PORT` and
    /// `MATH_TILES_AI_MAX_PENDING`; anything missing or unparsable keeps
    /// its default.
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("MATH_TILES_AI_HOST").unwrap_or(defaults.host);
        let port = env::var("MATH_TILES_AI_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let max_pending_commands = env::var("MATH_TILES_AI_MAX_PENDING")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.max_pending_commands);

        Self {
            host,
            port,
            protocol_version: defaults.protocol_version,
            max_pending_commands,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid adapter address {}:{}", self.host, self.port))
    }
}

/// Check if the adapter is disabled via `MATH_TILES_AI_DISABLED`.
pub fn is_disabled() -> bool {
    std::env::var("MATH_TILES_AI_DISABLED")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Connection counters readable from the game loop.
#[derive(Debug, Default)]
pub struct ServerStats {
    clients: AtomicUsize,
    /// Controller client id, 0 when there is none.
    controller: AtomicUsize,
}

impl ServerStats {
    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }

    pub fn controller_id(&self) -> Option<usize> {
        match self.controller.load(Ordering::Relaxed) {
            0 => None,
            id => Some(id),
        }
    }
}

/// Shared server state
struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<usize>>,
    stats: Arc<ServerStats>,
}

impl ServerState {
    async fn publish_stats(&self) {
        let count = self.clients.read().await.len();
        let controller = self.controller.read().await.unwrap_or(0);
        self.stats.clients.store(count, Ordering::Relaxed);
        self.stats.controller.store(controller, Ordering::Relaxed);
    }

    async fn is_handshaken(&self, client_id: usize) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.handshaken)
            .unwrap_or(false)
    }

    async fn is_controller(&self, client_id: usize) -> bool {
        *self.controller.read().await == Some(client_id)
    }

    /// Record `seq` if it is strictly greater than the last one seen.
    async fn check_and_update_seq(&self, client_id: usize, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return false;
        };
        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }
}

/// Handle to a connected client
struct ClientHandle {
    id: usize,
    addr: SocketAddr,
    stream_observations: bool,
    handshaken: bool,
    last_seq: Option<u64>,
    tx: mpsc::UnboundedSender<ClientOutbound>,
}

#[derive(Debug, Clone)]
enum ClientOutbound {
    Welcome(WelcomeMessage),
    Ack(AckMessage),
    Error(ErrorMessage),
    Observation(ObservationMessage),
}

/// Start the TCP server.
///
/// `ready_tx` receives the bound address once listening (useful with port 0).
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    run_server_with_stats(config, command_tx, out_rx, ready_tx, Arc::default()).await
}

pub async fn run_server_with_stats(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
    stats: Arc<ServerStats>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind adapter on {}", addr))?;
    let bound = listener.local_addr()?;
    info!("AI adapter listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState {
        config,
        clients: RwLock::new(Vec::new()),
        controller: RwLock::new(None),
        stats,
    });

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let clients = state.clients.read().await;
                match msg {
                    OutboundMessage::ToClientAck { client_id, ack } => {
                        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
                            let _ = c.tx.send(ClientOutbound::Ack(ack));
                        }
                    }
                    OutboundMessage::ToClientError { client_id, err } => {
                        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
                            let _ = c.tx.send(ClientOutbound::Error(err));
                        }
                    }
                    OutboundMessage::ToClientObservation { client_id, obs } => {
                        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
                            let _ = c.tx.send(ClientOutbound::Observation(obs));
                        }
                    }
                    OutboundMessage::BroadcastObservation { obs } => {
                        for c in clients.iter().filter(|c| c.handshaken && c.stream_observations) {
                            let _ = c.tx.send(ClientOutbound::Observation(obs.clone()));
                        }
                    }
                }
            }
        });
    }

    let mut client_id_counter = 0usize;
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;
        info!("client {} connected from {}", client_id, addr);

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, Arc::clone(&state), command_tx).await {
                warn!("client {} error: {:#}", client_id, e);
            }
            disconnect(&state, client_id).await;
            info!("client {} disconnected", client_id);
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<ClientOutbound>();

    state.clients.write().await.push(ClientHandle {
        id: client_id,
        addr,
        stream_observations: false,
        handshaken: false,
        last_seq: None,
        tx: tx.clone(),
    });
    state.publish_stats().await;

    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            let encoded = match &msg {
                ClientOutbound::Welcome(m) => serde_json::to_writer(&mut buf, m),
                ClientOutbound::Ack(m) => serde_json::to_writer(&mut buf, m),
                ClientOutbound::Error(m) => serde_json::to_writer(&mut buf, m),
                ClientOutbound::Observation(m) => serde_json::to_writer(&mut buf, m),
            };
            if encoded.is_err() {
                continue;
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() || writer.flush().await.is_err() {
                break;
            }
        }
    });

    let send_error = |seq: u64, code: ErrorCode, message: &str| {
        debug!("client {} error {:?}: {}", client_id, code, message);
        let _ = tx.send(ClientOutbound::Error(create_error(seq, code, message)));
    };

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, hello.seq).await
                {
                    send_error(hello.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }

                if !hello.protocol_version.starts_with("1.") {
                    send_error(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("Protocol version {} not supported", hello.protocol_version),
                    );
                    break;
                }

                let role = {
                    let mut controller = state.controller.write().await;
                    let mut clients = state.clients.write().await;
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.stream_observations = hello.requested.stream_observations;
                    }
                    if controller.is_none() {
                        *controller = Some(client_id);
                        info!("client {} ({}) is now controller", client_id, hello.client.name);
                    }
                    if *controller == Some(client_id) {
                        AssignedRole::Controller
                    } else {
                        AssignedRole::Observer
                    }
                };
                state.publish_stats().await;

                let controller_id = state.controller.read().await.map(|id| id as u64);
                let welcome = create_welcome(
                    hello.seq,
                    &state.config.protocol_version,
                    client_id as u64,
                    role,
                    controller_id,
                );
                let _ = tx.send(ClientOutbound::Welcome(welcome));

                if hello.requested.stream_observations {
                    let _ = command_tx.try_send(InboundCommand {
                        client_id,
                        seq: hello.seq,
                        payload: InboundPayload::SnapshotRequest,
                    });
                }
            }

            Ok(ParsedMessage::Command(cmd)) => {
                if !state.is_handshaken(client_id).await {
                    send_error(cmd.seq, ErrorCode::HandshakeRequired, "Send hello before command");
                    continue;
                }

                if !state.check_and_update_seq(client_id, cmd.seq).await {
                    send_error(cmd.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }

                if !state.is_controller(client_id).await {
                    send_error(cmd.seq, ErrorCode::NotController, "Only controller may send commands");
                    continue;
                }

                let actions = match map_command(&cmd) {
                    Ok(actions) => actions,
                    Err(message) => {
                        send_error(cmd.seq, ErrorCode::InvalidCommand, &message);
                        continue;
                    }
                };

                // Bounded queue; the game loop acks after applying.
                if command_tx
                    .try_send(InboundCommand {
                        client_id,
                        seq: cmd.seq,
                        payload: InboundPayload::Command(actions),
                    })
                    .is_err()
                {
                    send_error(cmd.seq, ErrorCode::Backpressure, "Command queue is full");
                }
            }

            Ok(ParsedMessage::Unknown(unknown)) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, unknown.seq).await
                {
                    send_error(unknown.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }
                send_error(unknown.seq, ErrorCode::InvalidCommand, "Unknown message type");
            }

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                send_error(seq, ErrorCode::InvalidCommand, &format!("JSON parse error: {}", e));
            }
        }
    }

    // The writer drains queued replies (e.g. protocol_mismatch) and stops
    // once every sender, including the one in the client list, is gone.
    drop(send_error);
    drop(tx);
    state.clients.write().await.retain(|c| c.id != client_id);
    let _ = write_task.await;
    Ok(())
}

/// Remove a client; promote the lowest-id handshaken client if it was the
/// controller.
async fn disconnect(state: &ServerState, client_id: usize) {
    {
        let mut controller = state.controller.write().await;
        let mut clients = state.clients.write().await;
        clients.retain(|c| c.id != client_id);

        if *controller == Some(client_id) {
            let next = clients
                .iter()
                .filter(|c| c.handshaken)
                .min_by_key(|c| c.id)
                .map(|c| (c.id, c.addr));
            *controller = next.map(|(id, _)| id);
            match next {
                Some((id, addr)) => info!("client {} ({}) promoted to controller", id, addr),
                None => info!("controller {} released", client_id),
            }
        }
    }
    state.publish_stats().await;
}

/// Map a protocol command into game actions.
fn map_command(cmd: &CommandMessage) -> Result<Vec<GameAction>, String> {
    if cmd.actions.is_empty() {
        return Err("Missing actions".to_string());
    }
    cmd.actions.iter().map(ActionSpec::to_action).collect()
}

/// Build an observation message from a snapshot.
pub fn build_observation(snap: &GameSnapshot, seq: u64) -> ObservationMessage {
    let last_outcome = snap.last_outcome.and_then(|outcome| match outcome {
        ValidationOutcome::Ignored => None,
        ValidationOutcome::Accepted { value, award } => Some(OutcomeObservation {
            accepted: true,
            value: Some(value),
            award: Some(award.total),
            reason: None,
        }),
        ValidationOutcome::Rejected(err) => Some(OutcomeObservation {
            accepted: false,
            value: None,
            award: None,
            reason: Some(err.code().to_string()),
        }),
    });

    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        playable: snap.playable(),
        round_id: snap.round_id,
        seed: snap.seed,
        cells: snap.cells.to_vec(),
        gaps: snap
            .gaps
            .iter()
            .map(|g| GapObservation {
                op: g.operator.symbol().to_string(),
                placed: g.placed,
            })
            .collect(),
        parens: snap
            .parens
            .iter()
            .map(|p| ParenObservation {
                open: p.open,
                close: p.close,
            })
            .collect(),
        pool: Operator::ALL
            .iter()
            .map(|&op| PoolEntry::new(op, snap.pool[op.index()]))
            .collect(),
        selection: snap.selection.iter().map(|t| t.symbol().to_string()).collect(),
        expression: snap.expression.clone(),
        score: snap.score,
        time_remaining: snap.time_remaining,
        timer: snap.timer.as_str().to_string(),
        status: snap.status.as_str().to_string(),
        last_outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GameState;
    use crate::types::{ParenKind, Tile};

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 7878);
        assert_eq!(config.max_pending_commands, 10);
        assert!(config.socket_addr().is_ok());
    }

    #[test]
    fn test_bad_host_is_error() {
        let config = ServerConfig {
            host: "not an address".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_map_command() {
        let cmd = create_command(1, &[GameAction::MergeCells(2), GameAction::Validate]);
        assert_eq!(
            map_command(&cmd),
            Ok(vec![GameAction::MergeCells(2), GameAction::Validate])
        );

        let empty = CommandMessage {
            msg_type: CommandType::Command,
            seq: 2,
            ts: 0,
            actions: vec![],
        };
        assert!(map_command(&empty).is_err());
    }

    #[test]
    fn test_build_observation() {
        let mut gs = GameState::from_cells(&[3, 7, 2]);
        gs.apply_action(GameAction::SelectTile(Tile::Op(Operator::Mul)));
        gs.apply_action(GameAction::PlaceTile(1));
        gs.apply_action(GameAction::SelectTile(Tile::Paren(ParenKind::Open)));

        let obs = build_observation(&gs.snapshot(), 5);
        assert_eq!(obs.seq, 5);
        assert_eq!(obs.cells, vec![3, 7, 2]);
        assert_eq!(obs.gaps[0], GapObservation { op: "+".into(), placed: false });
        assert_eq!(obs.gaps[1], GapObservation { op: "X".into(), placed: true });
        assert_eq!(obs.pool[Operator::Mul.index()].count, 2);
        assert_eq!(obs.selection, vec!["(".to_string()]);
        assert_eq!(obs.expression, "3+7*2");
        assert_eq!(obs.status, "in_progress");
        assert_eq!(obs.timer, "running");
        assert!(obs.playable);
        assert!(obs.last_outcome.is_none());
    }

    #[test]
    fn test_observation_outcomes() {
        let mut gs = GameState::from_cells(&[5, 5]);
        gs.apply_action(GameAction::SelectTile(Tile::Op(Operator::Sub)));
        gs.apply_action(GameAction::PlaceTile(0));
        gs.apply_action(GameAction::Validate);

        let obs = build_observation(&gs.snapshot(), 1);
        let outcome = obs.last_outcome.unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.reason.as_deref(), Some("zero"));

        gs.apply_action(GameAction::SelectTile(Tile::Op(Operator::Add)));
        gs.apply_action(GameAction::PlaceTile(0));
        gs.apply_action(GameAction::Validate);
        let obs = build_observation(&gs.snapshot(), 2);
        let outcome = obs.last_outcome.unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.value, Some(10.0));
        assert_eq!(outcome.award, Some(13));
        assert_eq!(obs.status, "solved");
        assert!(!obs.playable);
    }
}
