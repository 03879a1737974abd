use arrayvec::ArrayVec;

use crate::game_state::ValidationOutcome;
use crate::types::{Operator, RoundStatus, Tile, TimerState, MAX_CELLS, MAX_GAPS};

/// Operator shown in a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GapSnapshot {
    /// Effective operator (`+` when nothing was placed).
    pub operator: Operator,
    /// Whether the operator was explicitly placed.
    pub placed: bool,
}

/// Parentheses attached to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ParenSnapshot {
    pub open: u16,
    pub close: u16,
}

/// Read-only view of a round, shared by the renderer and the AI adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub cells: ArrayVec<u64, MAX_CELLS>,
    pub gaps: ArrayVec<GapSnapshot, MAX_GAPS>,
    pub parens: ArrayVec<ParenSnapshot, MAX_CELLS>,
    /// Remaining copies per operator, indexed by [`Operator::index`].
    pub pool: [u8; 6],
    pub selection: Vec<Tile>,
    /// Arithmetic text of the current board.
    pub expression: String,
    pub score: u32,
    pub last_outcome: Option<ValidationOutcome>,
    pub time_remaining: u32,
    pub timer: TimerState,
    pub status: RoundStatus,
    pub round_id: u32,
    pub seed: u32,
}

impl GameSnapshot {
    pub fn clear(&mut self) {
        self.cells.clear();
        self.gaps.clear();
        self.parens.clear();
        self.pool = [0; 6];
        self.selection.clear();
        self.expression.clear();
        self.score = 0;
        self.last_outcome = None;
        self.time_remaining = 0;
        self.timer = TimerState::Inactive;
        self.status = RoundStatus::InProgress;
        self.round_id = 0;
        self.seed = 0;
    }

    /// Whether the round still accepts validation attempts.
    pub fn playable(&self) -> bool {
        self.timer == TimerState::Running
    }

    /// Tile at the head of the selection queue.
    pub fn selected(&self) -> Option<Tile> {
        self.selection.first().copied()
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            cells: ArrayVec::new(),
            gaps: ArrayVec::new(),
            parens: ArrayVec::new(),
            pool: [0; 6],
            selection: Vec::new(),
            expression: String::new(),
            score: 0,
            last_outcome: None,
            time_remaining: 0,
            timer: TimerState::Inactive,
            status: RoundStatus::InProgress,
            round_id: 0,
            seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameState;
    use crate::types::{GameAction, ParenKind};

    #[test]
    fn test_snapshot_into_reuses_buffer() {
        let mut state = GameState::from_cells(&[1, 2, 3, 4, 5, 6]);
        let mut snap = GameSnapshot::default();
        state.snapshot_into(&mut snap);
        assert_eq!(snap.cells.len(), 6);

        state.apply_action(GameAction::MergeCells(0));
        state.snapshot_into(&mut snap);
        assert_eq!(snap.cells.as_slice(), &[12, 3, 4, 5, 6]);
        assert_eq!(snap.gaps.len(), 4);
        assert_eq!(snap.parens.len(), 5);
    }

    #[test]
    fn test_clear() {
        let mut state = GameState::from_cells(&[1, 2]);
        state.apply_action(GameAction::SelectTile(Tile::Paren(ParenKind::Open)));
        let mut snap = state.snapshot();
        assert_eq!(snap.selected(), Some(Tile::Paren(ParenKind::Open)));

        snap.clear();
        assert_eq!(snap, GameSnapshot::default());
    }
}
