//! Math Tiles (workspace facade crate).
//!
//! Re-exports the member crates under `math_tiles::{core,adapter,term,input,types}`;
//! the implementation lives in dedicated crates under `crates/`.

pub mod logging;

pub use math_tiles_adapter as adapter;
pub use math_tiles_core as core;
pub use math_tiles_input as input;
pub use math_tiles_term as term;
pub use math_tiles_types as types;
