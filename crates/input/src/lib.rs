//! Terminal input module (engine-facing).
//!
//! Independent of any UI framework. Maps `crossterm` key events into
//! [`crate::types::GameAction`] and tracks the board cursor used to aim
//! placements and merges.

pub mod cursor;
pub mod map;

pub use math_tiles_types as types;

pub use cursor::{Cursor, CursorTarget};
pub use map::{handle_key_event, should_quit, tile_for_key};
