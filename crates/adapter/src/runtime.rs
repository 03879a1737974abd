//! Adapter runtime integration.
//!
//! Bridges the synchronous game loop with the async TCP server. The game
//! loop owns the [`GameState`]; the server only ever sees snapshots.

use std::sync::Arc;

use anyhow::Context;
use log::{debug, info, warn};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::core::{GameSnapshot, GameState};
use crate::protocol::{create_ack, ObservationMessage};
use crate::server::{build_observation, is_disabled, run_server_with_stats, ServerConfig, ServerStats};
use crate::types::GameAction;

/// Command delivered to the game loop.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    /// Controller actions, applied in order.
    Command(Vec<GameAction>),
    /// A client just said hello and wants the current state.
    SnapshotRequest,
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClientAck {
        client_id: usize,
        ack: crate::protocol::AckMessage,
    },
    ToClientError {
        client_id: usize,
        err: crate::protocol::ErrorMessage,
    },
    ToClientObservation {
        client_id: usize,
        obs: ObservationMessage,
    },
    BroadcastObservation {
        obs: ObservationMessage,
    },
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    stats: Arc<ServerStats>,
    obs_seq: u64,
    snapshot: GameSnapshot,
}

impl Adapter {
    /// Start the adapter from environment variables.
    ///
    /// Returns `Ok(None)` if `MATH_TILES_AI_DISABLED` is set.
    pub fn start_from_env() -> anyhow::Result<Option<Self>> {
        if is_disabled() {
            info!("AI adapter disabled via MATH_TILES_AI_DISABLED");
            return Ok(None);
        }
        Self::start(ServerConfig::from_env()).map(Some)
    }

    /// Start the server on a dedicated tokio runtime.
    pub fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        let stats = Arc::new(ServerStats::default());

        let rt = Runtime::new().context("failed to create tokio runtime")?;
        let server_stats = Arc::clone(&stats);
        rt.spawn(async move {
            if let Err(e) = run_server_with_stats(config, cmd_tx, out_rx, None, server_stats).await {
                warn!("AI adapter stopped: {:#}", e);
            }
        });

        Ok(Self {
            _rt: rt,
            cmd_rx,
            out_tx,
            stats,
            obs_seq: 0,
            snapshot: GameSnapshot::default(),
        })
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }

    pub fn client_count(&self) -> usize {
        self.stats.client_count()
    }

    pub fn controller_id(&self) -> Option<usize> {
        self.stats.controller_id()
    }

    /// Apply every queued command to `game`. Returns whether the game changed.
    ///
    /// Each command is acked with the number of actions that took effect.
    /// Changes are broadcast as one observation.
    pub fn pump(&mut self, game: &mut GameState) -> bool {
        let mut changed = false;
        while let Some(inbound) = self.try_recv() {
            match inbound.payload {
                InboundPayload::Command(actions) => {
                    let applied = apply_actions(game, &actions);
                    debug!(
                        "client {} seq {}: {}/{} actions applied",
                        inbound.client_id,
                        inbound.seq,
                        applied,
                        actions.len()
                    );
                    self.send(OutboundMessage::ToClientAck {
                        client_id: inbound.client_id,
                        ack: create_ack(inbound.seq, applied),
                    });
                    changed |= applied > 0;
                }
                InboundPayload::SnapshotRequest => {
                    let obs = self.observe(game);
                    self.send(OutboundMessage::ToClientObservation {
                        client_id: inbound.client_id,
                        obs,
                    });
                }
            }
        }

        if changed {
            self.broadcast(game);
        }
        changed
    }

    /// Send the current state to every streaming client.
    pub fn broadcast(&mut self, game: &GameState) {
        let obs = self.observe(game);
        self.send(OutboundMessage::BroadcastObservation { obs });
    }

    fn observe(&mut self, game: &GameState) -> ObservationMessage {
        self.obs_seq += 1;
        game.snapshot_into(&mut self.snapshot);
        build_observation(&self.snapshot, self.obs_seq)
    }
}

/// Apply `actions` in order; returns how many changed the game.
pub fn apply_actions(game: &mut GameState, actions: &[GameAction]) -> u32 {
    actions
        .iter()
        .filter(|&&action| game.apply_action(action))
        .count() as u32
}
