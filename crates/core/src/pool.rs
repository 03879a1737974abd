//! Tile pool and selection queue
//!
//! The pool is a multiset of operator tiles, stored as one counter per
//! operator. Parentheses are never in the pool: they are always on offer.
//!
//! Selecting an operator removes one copy from the pool immediately, so a
//! picked-up tile is reserved before it is placed. That is the only point at
//! which the pool shrinks.

use std::collections::VecDeque;

use crate::types::{Operator, Tile, TILE_COPIES};

/// Remaining operator tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilePool {
    counts: [u8; 6],
}

impl TilePool {
    /// A full pool: `TILE_COPIES` of each operator.
    pub fn full() -> Self {
        Self {
            counts: [TILE_COPIES; 6],
        }
    }

    pub fn empty() -> Self {
        Self { counts: [0; 6] }
    }

    pub fn count(&self, op: Operator) -> u8 {
        self.counts[op.index()]
    }

    pub fn contains(&self, op: Operator) -> bool {
        self.count(op) > 0
    }

    /// Total operator tiles left.
    pub fn total(&self) -> u32 {
        self.counts.iter().map(|&c| c as u32).sum()
    }

    /// Counts in `Operator::ALL` order.
    pub fn counts(&self) -> [u8; 6] {
        self.counts
    }

    /// Remove one copy of `op`. Returns false if none is left.
    pub fn take(&mut self, op: Operator) -> bool {
        let slot = &mut self.counts[op.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    /// Iterate `(operator, count)` pairs in pool order.
    pub fn iter(&self) -> impl Iterator<Item = (Operator, u8)> + '_ {
        Operator::ALL.iter().map(move |&op| (op, self.count(op)))
    }
}

impl Default for TilePool {
    fn default() -> Self {
        Self::full()
    }
}

/// Picked-up tiles waiting to be placed, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Selection {
    queue: VecDeque<Tile>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(&self) -> Option<Tile> {
        self.queue.front().copied()
    }

    pub fn pop(&mut self) -> Option<Tile> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.queue.iter()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    fn push(&mut self, tile: Tile) {
        self.queue.push_back(tile);
    }
}

/// Pick up `tile`.
///
/// Parentheses are always granted. An operator is granted only if the pool
/// still holds a copy, which is removed. Returns whether the selection grew.
pub fn select_tile(pool: &mut TilePool, selection: &mut Selection, tile: Tile) -> bool {
    match tile {
        Tile::Paren(_) => {
            selection.push(tile);
            true
        }
        Tile::Op(op) => {
            if !pool.take(op) {
                return false;
            }
            selection.push(tile);
            true
        }
    }
}
