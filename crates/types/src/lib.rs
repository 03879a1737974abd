//! Core types module - shared data structures and constants
//!
//! This module defines the vocabulary shared by the puzzle core, the terminal
//! frontend and the AI adapter. All types are plain data with no external
//! dependencies, so any layer can use them.
//!
//! # Tiles
//!
//! A tile is either an arithmetic operator or a structural parenthesis:
//!
//! | Symbol | Meaning | Score weight |
//! |--------|---------|--------------|
//! | `+` | addition | 1 |
//! | `-` | subtraction | 1 |
//! | `X` | multiplication | 2 |
//! | `%` | division | 2 |
//! | `^` | exponentiation | 3 |
//! | `½` | the digits `0.5` | 3 |
//! | `(` `)` | grouping | 0 |
//!
//! Operators come from a finite pool ([`TILE_COPIES`] of each per round);
//! parentheses are unlimited.
//!
//! # Round Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `ROUND_TIME_SECS` | 60 | Countdown per round |
//! | `TILE_COPIES` | 3 | Copies of each operator in a fresh pool |
//! | `MIN_CELLS` / `MAX_CELLS` | 4 / 6 | Digits dealt per round |
//! | `TIME_BONUS_DIVISOR` | 5 | One bonus point per 5 seconds left |
//! | `RESULT_LIMIT` | 1000 | Accepted results satisfy `0 < |r| < 1000` |
//! | `TICK_MS` | 16 | Frontend loop interval |
//!
//! # Examples
//!
//! ```
//! use math_tiles_types::{Operator, ParenKind, Tile};
//!
//! assert_eq!(Tile::from_symbol('X'), Some(Tile::Op(Operator::Mul)));
//! assert_eq!(Tile::from_symbol('('), Some(Tile::Paren(ParenKind::Open)));
//! assert_eq!(Operator::Pow.weight(), 3);
//! assert_eq!(Tile::Paren(ParenKind::Close).weight(), 0);
//! ```

/// Seconds on the clock at the start of every round.
pub const ROUND_TIME_SECS: u32 = 60;

/// Copies of each operator symbol in a fresh pool.
pub const TILE_COPIES: u8 = 3;

/// Fewest digits dealt at round start.
pub const MIN_CELLS: usize = 4;

/// Most digits dealt at round start (also the board capacity).
pub const MAX_CELLS: usize = 6;

/// Most gaps a board can have.
pub const MAX_GAPS: usize = MAX_CELLS - 1;

/// Time bonus divisor: `floor(time_remaining / TIME_BONUS_DIVISOR)`.
pub const TIME_BONUS_DIVISOR: u32 = 5;

/// Exclusive upper bound on the absolute value of an accepted result.
pub const RESULT_LIMIT: f64 = 1000.0;

/// Frontend loop interval in milliseconds (~60 FPS).
pub const TICK_MS: u32 = 16;

/// Milliseconds per timer unit.
pub const SECOND_MS: u32 = 1000;


/// The six operator symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `X`, multiplication
    Mul,
    /// `%`, real division
    Div,
    /// `^`, real exponentiation
    Pow,
    /// `½`, written into the expression as the digits `0.5`
    Half,
}

impl Operator {
    /// All operators in pool order.
    pub const ALL: [Operator; 6] = [
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Pow,
        Operator::Half,
    ];

    /// Dense index into pool-sized arrays.
    pub fn index(&self) -> usize {
        match self {
            Operator::Add => 0,
            Operator::Sub => 1,
            Operator::Mul => 2,
            Operator::Div => 3,
            Operator::Pow => 4,
            Operator::Half => 5,
        }
    }

    /// Tile face symbol.
    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => 'X',
            Operator::Div => '%',
            Operator::Pow => '^',
            Operator::Half => '½',
        }
    }

    /// Parse a tile face symbol.
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            'X' => Some(Operator::Mul),
            '%' => Some(Operator::Div),
            '^' => Some(Operator::Pow),
            '½' => Some(Operator::Half),
            _ => None,
        }
    }

    /// Score weight, by arithmetic complexity.
    pub fn weight(&self) -> u32 {
        match self {
            Operator::Add | Operator::Sub => 1,
            Operator::Mul | Operator::Div => 2,
            Operator::Pow | Operator::Half => 3,
        }
    }

    /// Arithmetic spelling used in rendered expressions.
    pub fn arithmetic(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Pow => "**",
            Operator::Half => "0.5",
        }
    }

    /// Lowercase protocol name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Add => "add",
            Operator::Sub => "sub",
            Operator::Mul => "mul",
            Operator::Div => "div",
            Operator::Pow => "pow",
            Operator::Half => "half",
        }
    }
}

/// Which side of a cell a parenthesis attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParenKind {
    /// `(` on the cell's left
    Open,
    /// `)` on the cell's right
    Close,
}

impl ParenKind {
    pub fn symbol(&self) -> char {
        match self {
            ParenKind::Open => '(',
            ParenKind::Close => ')',
        }
    }
}

/// A placeable symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tile {
    Op(Operator),
    Paren(ParenKind),
}

impl Tile {
    /// Parse a tile from its face symbol.
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '(' => Some(Tile::Paren(ParenKind::Open)),
            ')' => Some(Tile::Paren(ParenKind::Close)),
            _ => Operator::from_symbol(c).map(Tile::Op),
        }
    }

    /// Parse a tile from a string (for the AI protocol).
    ///
    /// Accepts face symbols plus the ASCII aliases `x`, `*`, `/`, `**`,
    /// `1/2` and `half`.
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "x" | "*" => return Some(Tile::Op(Operator::Mul)),
            "/" => return Some(Tile::Op(Operator::Div)),
            "**" => return Some(Tile::Op(Operator::Pow)),
            "1/2" | "0.5" | "half" => return Some(Tile::Op(Operator::Half)),
            _ => {}
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_symbol(c),
            _ => None,
        }
    }

    /// Tile face symbol.
    pub fn symbol(&self) -> char {
        match self {
            Tile::Op(op) => op.symbol(),
            Tile::Paren(kind) => kind.symbol(),
        }
    }

    pub fn is_paren(&self) -> bool {
        matches!(self, Tile::Paren(_))
    }

    /// Score weight (parentheses are not counted).
    pub fn weight(&self) -> u32 {
        match self {
            Tile::Op(op) => op.weight(),
            Tile::Paren(_) => 0,
        }
    }
}

/// Round outcome as seen by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundStatus {
    /// Clock running, no attempt yet
    InProgress,
    /// Last attempt accepted; round over
    Solved,
    /// Last attempt rejected; clock still running
    Invalid,
    /// Clock ran out
    TimedOut,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::InProgress => "in_progress",
            RoundStatus::Solved => "solved",
            RoundStatus::Invalid => "invalid",
            RoundStatus::TimedOut => "timed_out",
        }
    }
}

/// Round timer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerState {
    Inactive,
    Running,
    Expired,
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Inactive => "inactive",
            TimerState::Running => "running",
            TimerState::Expired => "expired",
        }
    }
}

/// Player intents that modify game state
///
/// These are produced by both the keyboard frontend and the AI adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Discard the round and deal a fresh one
    NewRound,
    /// Pick up a tile from the pool (or a parenthesis)
    SelectTile(Tile),
    /// Put the head of the selection at a gap (operator) or cell (parenthesis)
    PlaceTile(usize),
    /// Concatenate the cells on either side of a gap
    MergeCells(usize),
    /// Check the expression and score it
    Validate,
}

impl GameAction {
    /// camelCase name for logs and the AI protocol.
    pub fn name(&self) -> &'static str {
        match self {
            GameAction::NewRound => "newRound",
            GameAction::SelectTile(_) => "select",
            GameAction::PlaceTile(_) => "place",
            GameAction::MergeCells(_) => "merge",
            GameAction::Validate => "validate",
        }
    }
}
