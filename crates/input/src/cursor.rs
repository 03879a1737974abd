//! Board cursor for the keyboard frontend.
//!
//! The cursor walks the interleaved row `cell gap cell gap ... cell`, so a
//! board of `n` cells has `2n - 1` positions. Even positions are cells, odd
//! positions are gaps. Placing or merging targets index `position / 2`:
//! the cell under the cursor, or the gap to its right.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cursor {
    position: usize,
}

/// What the cursor is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorTarget {
    Cell(usize),
    Gap(usize),
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn target(&self) -> CursorTarget {
        if self.position % 2 == 0 {
            CursorTarget::Cell(self.position / 2)
        } else {
            CursorTarget::Gap(self.position / 2)
        }
    }

    /// Index handed to `PlaceTile` / `MergeCells`.
    pub fn index(&self) -> usize {
        self.position / 2
    }

    pub fn move_left(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    pub fn move_right(&mut self, cell_count: usize) {
        if self.position + 1 < positions(cell_count) {
            self.position += 1;
        }
    }

    pub fn home(&mut self) {
        self.position = 0;
    }

    pub fn end(&mut self, cell_count: usize) {
        self.position = positions(cell_count).saturating_sub(1);
    }

    /// Pull the cursor back on the board after it shrank.
    pub fn clamp(&mut self, cell_count: usize) {
        let last = positions(cell_count).saturating_sub(1);
        if self.position > last {
            self.position = last;
        }
    }
}

fn positions(cell_count: usize) -> usize {
    (cell_count * 2).saturating_sub(1)
}
