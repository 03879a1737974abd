//! Board module - the ordered row of numeric cells
//!
//! The board holds 4-6 cells at round start and only ever shrinks, one cell
//! per merge. Storage is a fixed-capacity `ArrayVec`, so merging never
//! allocates. Gap `i` sits between cell `i` and cell `i + 1`.

use arrayvec::ArrayVec;

use crate::types::MAX_CELLS;

/// The row of numeric cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Board {
    cells: ArrayVec<u64, MAX_CELLS>,
}

impl Board {
    /// Create a board from cell values.
    ///
    /// At most `MAX_CELLS` values; extra values are a caller bug (checked
    /// in debug builds, dropped in release).
    pub fn new(values: &[u64]) -> Self {
        debug_assert!(
            values.len() <= MAX_CELLS,
            "board holds at most {} cells, got {}",
            MAX_CELLS,
            values.len()
        );
        Self {
            cells: values.iter().copied().take(MAX_CELLS).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of gaps (always `len - 1` for a non-empty board).
    pub fn gap_count(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    pub fn is_valid_cell(&self, index: usize) -> bool {
        index < self.cells.len()
    }

    pub fn is_valid_gap(&self, gap: usize) -> bool {
        gap < self.gap_count()
    }

    pub fn get(&self, index: usize) -> Option<u64> {
        self.cells.get(index).copied()
    }

    pub fn cells(&self) -> &[u64] {
        &self.cells
    }

    /// Concatenate the cells on either side of `gap` into one.
    ///
    /// `[3, 7, 2]` merged at gap 0 becomes `[37, 2]`. Returns false (and
    /// leaves the board untouched) when the gap is out of range or the
    /// concatenation would not fit in a `u64`.
    pub fn merge(&mut self, gap: usize) -> bool {
        if !self.is_valid_gap(gap) {
            return false;
        }
        let Some(joined) = concat_digits(self.cells[gap], self.cells[gap + 1]) else {
            return false;
        };
        self.cells[gap] = joined;
        self.cells.remove(gap + 1);
        true
    }
}

/// Concatenate the decimal digits of `left` and `right`.
pub fn concat_digits(left: u64, right: u64) -> Option<u64> {
    let mut shift: u64 = 10;
    let mut rest = right / 10;
    while rest > 0 {
        shift = shift.checked_mul(10)?;
        rest /= 10;
    }
    left.checked_mul(shift)?.checked_add(right)
}
