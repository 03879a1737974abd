//! Terminal "game renderer" module.
//!
//! A small rendering layer for terminal play. It avoids widget/layout
//! libraries and renders into a plain framebuffer that is diffed and
//! flushed to the terminal.
//!
//! - [`fb`]: styled character framebuffer
//! - [`game_view`]: snapshot to framebuffer (pure, testable)
//! - [`renderer`]: crossterm output with diff encoding

pub mod fb;
pub mod game_view;
pub mod renderer;

pub use math_tiles_core as core;
pub use math_tiles_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{AdapterStatusView, AnchorY, GameView, Viewport};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
