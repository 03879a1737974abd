//! Placement engine - operators in gaps, parentheses on cells
//!
//! The placed-operator map is sparse: a gap without an entry is "unset" and
//! only becomes `+` when the expression is built. Placing over an existing
//! operator discards it; nothing is ever refunded to the pool.
//!
//! Parentheses are a multiset of `(cell, kind)` entries. Any number may
//! stack on one side of a cell; balance is only checked at validation.

use crate::board::Board;
use crate::pool::Selection;
use crate::types::{Operator, ParenKind, Tile, MAX_GAPS};

/// A parenthesis attached to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlacedParen {
    pub cell: usize,
    pub kind: ParenKind,
}

/// Operators and parentheses placed on the current board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Placements {
    operators: [Option<Operator>; MAX_GAPS],
    parens: Vec<PlacedParen>,
}

impl Placements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.operators = [None; MAX_GAPS];
        self.parens.clear();
    }

    /// Explicitly placed operator at `gap`, if any.
    pub fn operator_at(&self, gap: usize) -> Option<Operator> {
        self.operators.get(gap).copied().flatten()
    }

    /// Operator applied at `gap` during evaluation (`+` when unset).
    pub fn effective_operator(&self, gap: usize) -> Operator {
        self.operator_at(gap).unwrap_or(Operator::Add)
    }

    /// Number of explicitly placed operators.
    pub fn operator_count(&self) -> usize {
        self.operators.iter().filter(|o| o.is_some()).count()
    }

    pub fn parens(&self) -> &[PlacedParen] {
        &self.parens
    }

    /// How many parentheses of `kind` are attached to `cell`.
    pub fn paren_count(&self, cell: usize, kind: ParenKind) -> usize {
        self.parens
            .iter()
            .filter(|p| p.cell == cell && p.kind == kind)
            .count()
    }

    /// Put `op` at `gap`, replacing any previous occupant.
    pub fn place_operator(&mut self, board: &Board, gap: usize, op: Operator) -> bool {
        if !board.is_valid_gap(gap) {
            return false;
        }
        self.operators[gap] = Some(op);
        true
    }

    /// Attach a parenthesis to `cell`. Always appends.
    pub fn place_paren(&mut self, board: &Board, cell: usize, kind: ParenKind) -> bool {
        if !board.is_valid_cell(cell) {
            return false;
        }
        self.parens.push(PlacedParen { cell, kind });
        true
    }

    /// Renumber after cells `gap` and `gap + 1` were merged.
    ///
    /// The operator at `gap` is discarded and later gaps shift down by one.
    /// Parentheses on the absorbed cell (`gap + 1`) are dropped; those on
    /// later cells shift down by one.
    pub fn on_merge(&mut self, gap: usize) {
        if gap >= MAX_GAPS {
            return;
        }
        self.operators.copy_within(gap + 1.., gap);
        self.operators[MAX_GAPS - 1] = None;

        let removed = gap + 1;
        self.parens.retain(|p| p.cell != removed);
        for p in self.parens.iter_mut() {
            if p.cell > removed {
                p.cell -= 1;
            }
        }
    }
}

/// Place the head of `selection` at `index`.
///
/// A parenthesis attaches to cell `index`; an operator goes into gap
/// `index`. The head is popped only when the placement lands. Returns
/// whether anything changed.
pub fn place_selected(
    placements: &mut Placements,
    selection: &mut Selection,
    board: &Board,
    index: usize,
) -> bool {
    let Some(tile) = selection.head() else {
        return false;
    };

    let placed = match tile {
        Tile::Paren(kind) => placements.place_paren(board, index, kind),
        Tile::Op(op) => placements.place_operator(board, index, op),
    };

    if placed {
        selection.pop();
    }
    placed
}
