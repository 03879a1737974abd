//! Core puzzle logic - pure, deterministic, and testable
//!
//! Contains every rule of the game: the digit board, the operator pool,
//! tile placement, expression evaluation, scoring and the round timer.
//! It has no dependency on UI, networking, or I/O:
//!
//! - **Deterministic**: the same seed deals the same boards
//! - **Testable**: every rule is covered by unit tests
//! - **Portable**: drives the terminal frontend and the headless AI adapter alike
//!
//! # Module Structure
//!
//! - [`board`]: the row of 4-6 digit cells and cell merging
//! - [`pool`]: the operator tile pool and the selection queue
//! - [`placement`]: operators in gaps, parentheses on cells
//! - [`expr`]: serialization to tokens and a recursive-descent evaluator
//! - [`scoring`]: result acceptance and round awards
//! - [`timer`]: the 60 second round countdown
//! - [`game_state`]: the state machine tying it all together
//! - [`rng`]: seeded digit dealing
//!
//! # Rules
//!
//! - A round deals 4-6 digits (1-9). Every gap between two cells holds an
//!   operator; an unset gap counts as `+`.
//! - Each of `+ - X % ^ ½` starts with 3 copies. Selecting removes one copy;
//!   placing never refunds. Parentheses are unlimited.
//! - Merging two neighbours concatenates their digits (`3`,`7` -> `37`).
//! - An expression is accepted when its value is finite and
//!   `0 < |value| < 1000`. Accepting stops the clock and awards the sum of
//!   the gap operator weights plus one point per 5 seconds left.
//!
//! # Example
//!
//! ```
//! use math_tiles_core::GameState;
//! use math_tiles_types::{GameAction, Operator, RoundStatus, Tile};
//!
//! let mut game = GameState::from_cells(&[3, 4]);
//!
//! game.apply_action(GameAction::SelectTile(Tile::Op(Operator::Mul)));
//! game.apply_action(GameAction::PlaceTile(0));
//! game.apply_action(GameAction::Validate);
//!
//! assert_eq!(game.status(), RoundStatus::Solved);
//! assert_eq!(game.score(), 2 + 12);
//! ```
//!
//! # Timing
//!
//! Call [`GameState::advance`](game_state::GameState::advance) every frame
//! with the elapsed milliseconds, or [`GameState::tick`](game_state::GameState::tick)
//! once per second.

pub mod board;
pub mod expr;
pub mod game_state;
pub mod placement;
pub mod pool;
pub mod rng;
pub mod scoring;
pub mod snapshot;
pub mod timer;

pub use math_tiles_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use expr::{EvalError, Expression};
pub use game_state::{reduce, GameState, ValidationOutcome};
pub use placement::Placements;
pub use pool::{Selection, TilePool};
pub use rng::{DigitDealer, SimpleRng};
pub use scoring::{check_result, round_award, RoundAward};
pub use snapshot::{GameSnapshot, GapSnapshot, ParenSnapshot};
pub use timer::RoundTimer;
