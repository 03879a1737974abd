//! RNG module - deterministic digit dealing
//!
//! A round starts with 4-6 digits in `1..=9`. Dealing is driven by a small
//! LCG so that a seed reproduces the exact same sequence of rounds, which
//! keeps tests and adapter-driven sessions deterministic.

use arrayvec::ArrayVec;

use crate::types::{MAX_CELLS, MIN_CELLS};

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    ///
    /// Uses the high bits; the low bits of an LCG cycle with a short period.
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        (self.next_u32() >> 16) % max
    }

    /// Current internal state (usable as a seed to replay from here).
    pub fn state(&self) -> u32 {
        self.state
    }
}

/// Deals the digits of a fresh board.
#[derive(Debug, Clone)]
pub struct DigitDealer {
    rng: SimpleRng,
}

impl DigitDealer {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
        }
    }

    /// Deal one round: `MIN_CELLS..=MAX_CELLS` digits, each in `1..=9`.
    pub fn deal(&mut self) -> ArrayVec<u64, MAX_CELLS> {
        let span = (MAX_CELLS - MIN_CELLS + 1) as u32;
        let len = MIN_CELLS + self.rng.next_range(span) as usize;

        let mut out = ArrayVec::new();
        for _ in 0..len {
            out.push(1 + self.rng.next_range(9) as u64);
        }
        out
    }

    /// Current RNG state (for reporting / replay)
    pub fn seed(&self) -> u32 {
        self.rng.state()
    }
}

impl Default for DigitDealer {
    fn default() -> Self {
        Self::new(1)
    }
}
