//! Adapter module - AI control via TCP socket with a JSON protocol
//!
//! Lets an external agent play through a TCP connection.
//!
//! # Protocol Overview
//!
//! **Line-delimited JSON** over TCP:
//!
//! 1. **Connection**: the client connects (default `127.0.0.1:7878`)
//! 2. **Handshake**: the client sends `hello`, the server answers `welcome`
//! 3. **Controller Assignment**: the first client to say hello controls the
//!    game; later clients observe. When the controller leaves, the oldest
//!    remaining client is promoted.
//! 4. **Commanding**: the controller sends `command` messages; each is
//!    acknowledged with `ack` once applied
//! 5. **Observations**: every state change is broadcast to streaming clients
//!
//! # Actions
//!
//! `"newRound"`, `"validate"`, `{"select":"X"}`, `{"place":2}`, `{"merge":0}`.
//! Tiles are written with their symbols (`+ - X % ^ ½ ( )`); `x`, `*`, `/`,
//! `half` are accepted too.
//!
//! # Errors
//!
//! `handshake_required`, `protocol_mismatch`, `not_controller`,
//! `invalid_command` (malformed input or a non-increasing `seq`) and
//! `backpressure` (command queue full).
//!
//! # Environment Variables
//!
//! - `MATH_TILES_AI_HOST`: bind address (default: "127.0.0.1")
//! - `MATH_TILES_AI_PORT`: port number (default: 7878)
//! - `MATH_TILES_AI_MAX_PENDING`: command queue depth (default: 10)
//! - `MATH_TILES_AI_DISABLED`: "1" or "true" disables the adapter
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":0,"client":{"name":"bot","version":"0.1"},"protocol_version":"1.0.0"}
//! Server -> Client: {"type":"welcome","seq":1,"ts":...,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Server -> Client: {"type":"observation","seq":1,"ts":...,"cells":[3,7,2,5],...}
//! Client -> Server: {"type":"command","seq":2,"ts":0,"actions":[{"select":"X"},{"place":0},"validate"]}
//! Server -> Client: {"type":"ack","seq":2,"ts":...,"status":"ok","applied":3}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use math_tiles_core as core;
pub use math_tiles_types as types;

pub use protocol::*;
pub use runtime::{apply_actions, Adapter, InboundCommand, InboundPayload, OutboundMessage};
pub use server::{build_observation, is_disabled, run_server, run_server_with_stats, ServerConfig, ServerStats};
