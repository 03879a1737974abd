//! Scoring module - acceptance policy and round awards
//!
//! A result is accepted when it is finite and `0 < |r| < RESULT_LIMIT`.
//! An accepted round awards the equation score (sum of gap operator
//! weights) plus one point per `TIME_BONUS_DIVISOR` seconds left.

use crate::expr::EvalError;
use crate::types::{RESULT_LIMIT, TIME_BONUS_DIVISOR};

/// Score awarded for a solved round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundAward {
    pub equation_score: u32,
    pub time_bonus: u32,
    pub total: u32,
}

/// `floor(time_remaining / TIME_BONUS_DIVISOR)`
pub fn time_bonus(time_remaining: u32) -> u32 {
    time_remaining / TIME_BONUS_DIVISOR
}

pub fn round_award(equation_score: u32, time_remaining: u32) -> RoundAward {
    let bonus = time_bonus(time_remaining);
    RoundAward {
        equation_score,
        time_bonus: bonus,
        total: equation_score + bonus,
    }
}

/// Apply the acceptance policy to an evaluated result.
pub fn check_result(value: f64) -> Result<f64, EvalError> {
    if !value.is_finite() {
        return Err(EvalError::NonFinite);
    }
    let magnitude = value.abs();
    if magnitude == 0.0 {
        return Err(EvalError::Zero);
    }
    if magnitude >= RESULT_LIMIT {
        return Err(EvalError::OutOfRange(value));
    }
    Ok(value)
}
