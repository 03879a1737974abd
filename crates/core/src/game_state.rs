//! Game state module - the puzzle state machine
//!
//! Ties together board, tile pool, placements, evaluator and timer. Every
//! intent is applied to completion through [`GameState::apply_action`];
//! the timer advances through [`GameState::tick`] (one second) or
//! [`GameState::advance`] (elapsed milliseconds). Nothing here blocks or
//! performs I/O.
//!
//! Invalid intents (unknown gap, operator not in the pool, empty selection)
//! are absorbed as no-ops and reported through the `bool` return value.

use log::{debug, info};

use crate::board::Board;
use crate::expr::{EvalError, Expression};
use crate::placement::{place_selected, Placements};
use crate::pool::{select_tile, Selection, TilePool};
use crate::rng::DigitDealer;
use crate::scoring::{check_result, round_award, RoundAward};
use crate::snapshot::{GameSnapshot, GapSnapshot, ParenSnapshot};
use crate::timer::RoundTimer;
use crate::types::{GameAction, ParenKind, RoundStatus, Tile};

/// Result of a `validate` intent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationOutcome {
    /// Timer not running; nothing happened.
    Ignored,
    /// Expression accepted and the award added to the score.
    Accepted { value: f64, award: RoundAward },
    /// Expression rejected; the round goes on.
    Rejected(EvalError),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted { .. })
    }
}

/// Complete puzzle state
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    pool: TilePool,
    selection: Selection,
    placements: Placements,
    timer: RoundTimer,
    status: RoundStatus,
    /// Cumulative score across rounds.
    score: u32,
    /// Outcome of the latest non-ignored validation this round.
    last_outcome: Option<ValidationOutcome>,
    /// Monotonic round id (increments on every new round).
    round_id: u32,
    dealer: DigitDealer,
    seed: u32,
    started: bool,
}

impl GameState {
    /// Create a game with the given RNG seed.
    ///
    /// The first round is dealt but its timer does not run until
    /// [`start`](Self::start).
    pub fn new(seed: u32) -> Self {
        let mut dealer = DigitDealer::new(seed);
        let board = Board::new(&dealer.deal());

        Self {
            board,
            pool: TilePool::full(),
            selection: Selection::new(),
            placements: Placements::new(),
            timer: RoundTimer::new(),
            status: RoundStatus::InProgress,
            score: 0,
            last_outcome: None,
            round_id: 0,
            dealer,
            seed,
            started: false,
        }
    }

    /// Create a started game on a fixed board.
    ///
    /// Later rounds are dealt from seed 1.
    pub fn from_cells(cells: &[u64]) -> Self {
        let mut state = Self::new(1);
        state.board = Board::new(cells);
        state.start();
        state
    }

    /// Start the clock on the first round.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.timer.start();
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn pool(&self) -> &TilePool {
        &self.pool
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn placements(&self) -> &Placements {
        &self.placements
    }

    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_remaining(&self) -> u32 {
        self.timer.remaining()
    }

    pub fn round_id(&self) -> u32 {
        self.round_id
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn last_outcome(&self) -> Option<ValidationOutcome> {
        self.last_outcome
    }

    /// Serialize the current board.
    pub fn expression(&self) -> Expression {
        Expression::build(&self.board, &self.placements)
    }

    /// Whether `validate` would currently be considered.
    pub fn can_validate(&self) -> bool {
        self.timer.is_running()
    }

    /// Discard all round state and deal a fresh round.
    ///
    /// The cumulative score carries over.
    pub fn new_round(&mut self) {
        self.board = Board::new(&self.dealer.deal());
        self.pool = TilePool::full();
        self.selection.clear();
        self.placements.clear();
        self.status = RoundStatus::InProgress;
        self.last_outcome = None;
        self.round_id = self.round_id.wrapping_add(1);
        self.started = true;
        self.timer.start();
        debug!("round {} dealt {:?}", self.round_id, self.board.cells());
    }

    /// Pick up a tile.
    pub fn select_tile(&mut self, tile: Tile) -> bool {
        let selected = select_tile(&mut self.pool, &mut self.selection, tile);
        if !selected {
            debug!("select {} ignored: none left", tile.symbol());
        }
        selected
    }

    /// Place the head of the selection at `index`.
    pub fn place_tile(&mut self, index: usize) -> bool {
        place_selected(
            &mut self.placements,
            &mut self.selection,
            &self.board,
            index,
        )
    }

    /// Merge the cells on either side of `gap`.
    pub fn merge_cells(&mut self, gap: usize) -> bool {
        if !self.board.merge(gap) {
            return false;
        }
        self.placements.on_merge(gap);
        true
    }

    /// Check the current expression and score it.
    pub fn validate(&mut self) -> ValidationOutcome {
        if !self.timer.is_running() {
            return ValidationOutcome::Ignored;
        }

        let expression = self.expression();
        let outcome = match expression.evaluate().and_then(check_result) {
            Ok(value) => {
                let award = round_award(expression.equation_score(), self.timer.remaining());
                self.score += award.total;
                self.status = RoundStatus::Solved;
                self.timer.stop();
                info!(
                    "round {} solved: {} = {} (+{}, total {})",
                    self.round_id,
                    expression.to_text(),
                    value,
                    award.total,
                    self.score
                );
                ValidationOutcome::Accepted { value, award }
            }
            Err(err) => {
                self.status = RoundStatus::Invalid;
                debug!("round {} rejected {}: {}", self.round_id, expression.to_text(), err);
                ValidationOutcome::Rejected(err)
            }
        };

        self.last_outcome = Some(outcome);
        outcome
    }

    /// One second elapsed.
    ///
    /// Returns true if the timer was running (the clock changed).
    pub fn tick(&mut self) -> bool {
        let was_running = self.timer.is_running();
        if self.timer.tick() {
            self.expire();
        }
        was_running
    }

    /// Feed elapsed wall time in milliseconds.
    ///
    /// Returns true if the visible clock changed.
    pub fn advance(&mut self, elapsed_ms: u32) -> bool {
        let before = self.timer.remaining();
        if self.timer.advance(elapsed_ms) {
            self.expire();
        }
        self.timer.remaining() != before
    }

    fn expire(&mut self) {
        self.status = RoundStatus::TimedOut;
        info!("round {} timed out (score {})", self.round_id, self.score);
    }

    /// Apply a player intent. Returns whether the state changed.
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        debug!("apply {:?}", action);
        match action {
            GameAction::NewRound => {
                self.new_round();
                true
            }
            GameAction::SelectTile(tile) => self.select_tile(tile),
            GameAction::PlaceTile(index) => self.place_tile(index),
            GameAction::MergeCells(gap) => self.merge_cells(gap),
            GameAction::Validate => self.validate() != ValidationOutcome::Ignored,
        }
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.cells.clear();
        out.cells.extend(self.board.cells().iter().copied());

        out.gaps.clear();
        for gap in 0..self.board.gap_count() {
            out.gaps.push(GapSnapshot {
                operator: self.placements.effective_operator(gap),
                placed: self.placements.operator_at(gap).is_some(),
            });
        }

        out.parens.clear();
        for cell in 0..self.board.len() {
            out.parens.push(ParenSnapshot {
                open: saturating_u16(self.placements.paren_count(cell, ParenKind::Open)),
                close: saturating_u16(self.placements.paren_count(cell, ParenKind::Close)),
            });
        }

        out.pool = self.pool.counts();
        out.selection.clear();
        out.selection.extend(self.selection.iter().copied());
        out.expression = self.expression().to_text();
        out.score = self.score;
        out.last_outcome = self.last_outcome;
        out.time_remaining = self.timer.remaining();
        out.timer = self.timer.state();
        out.status = self.status;
        out.round_id = self.round_id;
        out.seed = self.seed;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(1)
    }
}

fn saturating_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Reducer form of [`GameState::apply_action`].
pub fn reduce(mut state: GameState, action: GameAction) -> GameState {
    state.apply_action(action);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Operator, TimerState, ROUND_TIME_SECS, SECOND_MS};

    fn op(o: Operator) -> GameAction {
        GameAction::SelectTile(Tile::Op(o))
    }

    fn paren(kind: ParenKind) -> GameAction {
        GameAction::SelectTile(Tile::Paren(kind))
    }

    #[test]
    fn test_new_game_state() {
        let state = GameState::new(12345);
        assert!(!state.started());
        assert_eq!(state.status(), RoundStatus::InProgress);
        assert_eq!(state.score(), 0);
        assert_eq!(state.round_id(), 0);
        assert_eq!(state.timer().state(), TimerState::Inactive);
        assert!(state.board().len() >= 4 && state.board().len() <= 6);
        assert_eq!(state.pool().total(), 18);
    }

    #[test]
    fn test_validate_before_start_is_ignored() {
        let mut state = GameState::new(12345);
        assert_eq!(state.validate(), ValidationOutcome::Ignored);
        assert_eq!(state.status(), RoundStatus::InProgress);
    }

    #[test]
    fn test_start_runs_timer_once() {
        let mut state = GameState::new(12345);
        state.start();
        assert!(state.timer().is_running());
        state.tick();
        state.start();
        assert_eq!(state.time_remaining(), ROUND_TIME_SECS - 1);
    }

    #[test]
    fn test_same_seed_same_rounds() {
        let mut a = GameState::new(77);
        let mut b = GameState::new(77);
        assert_eq!(a.board(), b.board());
        a.new_round();
        b.new_round();
        assert_eq!(a.board(), b.board());
    }

    #[test]
    fn test_simple_sum_scores() {
        let mut state = GameState::from_cells(&[2, 3]);
        let outcome = state.validate();

        assert_eq!(
            outcome,
            ValidationOutcome::Accepted {
                value: 5.0,
                award: RoundAward {
                    equation_score: 1,
                    time_bonus: 12,
                    total: 13
                }
            }
        );
        assert_eq!(state.status(), RoundStatus::Solved);
        assert_eq!(state.score(), 13);
        assert_eq!(state.timer().state(), TimerState::Inactive);
    }

    #[test]
    fn test_solved_round_rejects_further_validation() {
        let mut state = GameState::from_cells(&[2, 3]);
        state.validate();
        assert_eq!(state.validate(), ValidationOutcome::Ignored);
        assert_eq!(state.score(), 13);
    }

    #[test]
    fn test_time_bonus_uses_remaining_time() {
        let mut state = GameState::from_cells(&[2, 3]);
        for _ in 0..13 {
            state.tick();
        }
        // 47s left -> bonus 9
        state.validate();
        assert_eq!(state.score(), 1 + 9);
    }

    #[test]
    fn test_zero_result_is_invalid() {
        let mut state = GameState::from_cells(&[5, 5]);
        assert!(state.apply_action(op(Operator::Sub)));
        assert!(state.apply_action(GameAction::PlaceTile(0)));

        assert_eq!(state.validate(), ValidationOutcome::Rejected(EvalError::Zero));
        assert_eq!(state.status(), RoundStatus::Invalid);
        assert!(state.timer().is_running());
    }

    #[test]
    fn test_invalid_then_fix_then_solve() {
        let mut state = GameState::from_cells(&[5, 5]);
        state.apply_action(op(Operator::Sub));
        state.apply_action(GameAction::PlaceTile(0));
        state.validate();
        assert_eq!(state.status(), RoundStatus::Invalid);

        state.apply_action(op(Operator::Mul));
        state.apply_action(GameAction::PlaceTile(0));
        assert!(state.validate().is_accepted());
        assert_eq!(state.status(), RoundStatus::Solved);
        // X weight 2 + 12 bonus
        assert_eq!(state.score(), 14);
    }

    #[test]
    fn test_repeated_invalid_validation_is_idempotent() {
        let mut state = GameState::from_cells(&[5, 5]);
        state.apply_action(op(Operator::Sub));
        state.apply_action(GameAction::PlaceTile(0));
        let pool = *state.pool();

        for _ in 0..5 {
            state.validate();
            assert_eq!(state.score(), 0);
            assert_eq!(*state.pool(), pool);
            assert_eq!(state.status(), RoundStatus::Invalid);
        }
    }

    #[test]
    fn test_unbalanced_is_invalid() {
        let mut state = GameState::from_cells(&[2, 3]);
        state.apply_action(paren(ParenKind::Open));
        state.apply_action(GameAction::PlaceTile(0));

        assert!(matches!(
            state.validate(),
            ValidationOutcome::Rejected(EvalError::UnbalancedParentheses { .. })
        ));
    }

    #[test]
    fn test_merge_renumbers_placements() {
        let mut state = GameState::from_cells(&[3, 7, 2]);
        state.apply_action(op(Operator::Mul));
        state.apply_action(GameAction::PlaceTile(0));
        state.apply_action(paren(ParenKind::Close));
        state.apply_action(GameAction::PlaceTile(1));

        assert!(state.apply_action(GameAction::MergeCells(0)));

        assert_eq!(state.board().cells(), &[37, 2]);
        assert_eq!(state.placements().operator_at(0), None);
        assert!(state.placements().parens().is_empty());
        // Discarded, not refunded.
        assert_eq!(state.pool().count(Operator::Mul), 2);
    }

    #[test]
    fn test_merge_out_of_range_is_noop() {
        let mut state = GameState::from_cells(&[3, 7, 2]);
        assert!(!state.apply_action(GameAction::MergeCells(2)));
        assert_eq!(state.board().cells(), &[3, 7, 2]);
    }

    #[test]
    fn test_select_absent_tile_is_noop() {
        let mut state = GameState::from_cells(&[1, 2, 3, 4]);
        for _ in 0..3 {
            assert!(state.apply_action(op(Operator::Pow)));
        }
        let before = state.selection().len();
        assert!(!state.apply_action(op(Operator::Pow)));
        assert_eq!(state.selection().len(), before);
        assert_eq!(state.pool().count(Operator::Pow), 0);
    }

    #[test]
    fn test_place_without_selection_is_noop() {
        let mut state = GameState::from_cells(&[1, 2]);
        assert!(!state.apply_action(GameAction::PlaceTile(0)));
    }

    #[test]
    fn test_timer_expiry_times_out() {
        let mut state = GameState::from_cells(&[2, 3]);
        for _ in 0..ROUND_TIME_SECS {
            state.tick();
        }
        assert_eq!(state.status(), RoundStatus::TimedOut);
        assert_eq!(state.timer().state(), TimerState::Expired);
        assert_eq!(state.validate(), ValidationOutcome::Ignored);
        assert_eq!(state.status(), RoundStatus::TimedOut);
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn test_timeout_overrides_invalid() {
        let mut state = GameState::from_cells(&[5, 5]);
        state.apply_action(op(Operator::Sub));
        state.apply_action(GameAction::PlaceTile(0));
        state.validate();
        state.advance(SECOND_MS * ROUND_TIME_SECS);
        assert_eq!(state.status(), RoundStatus::TimedOut);
    }

    #[test]
    fn test_new_round_resets_but_keeps_score() {
        let mut state = GameState::from_cells(&[2, 3]);
        state.apply_action(op(Operator::Half));
        state.validate();
        assert_eq!(state.score(), 13);

        assert!(state.apply_action(GameAction::NewRound));
        assert_eq!(state.score(), 13);
        assert_eq!(state.round_id(), 1);
        assert_eq!(state.status(), RoundStatus::InProgress);
        assert_eq!(state.pool().total(), 18);
        assert!(state.selection().is_empty());
        assert_eq!(state.placements().operator_count(), 0);
        assert_eq!(state.time_remaining(), ROUND_TIME_SECS);
        assert!(state.timer().is_running());
        assert!(state.last_outcome().is_none());
    }

    #[test]
    fn test_new_round_after_timeout_restarts_clock() {
        let mut state = GameState::from_cells(&[2, 3]);
        state.advance(SECOND_MS * ROUND_TIME_SECS);
        assert_eq!(state.status(), RoundStatus::TimedOut);

        state.apply_action(GameAction::NewRound);
        assert!(state.can_validate());
        assert_eq!(state.time_remaining(), ROUND_TIME_SECS);
    }

    #[test]
    fn test_advance_reports_clock_change() {
        let mut state = GameState::from_cells(&[2, 3]);
        assert!(!state.advance(500));
        assert!(state.advance(500));
    }

    #[test]
    fn test_reduce() {
        let state = GameState::from_cells(&[4, 4]);
        let state = reduce(state, op(Operator::Div));
        let state = reduce(state, GameAction::PlaceTile(0));
        let state = reduce(state, GameAction::Validate);
        assert_eq!(state.status(), RoundStatus::Solved);
        assert_eq!(state.score(), 2 + 12);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut state = GameState::from_cells(&[3, 7, 2]);
        state.apply_action(op(Operator::Pow));
        state.apply_action(GameAction::PlaceTile(1));
        state.apply_action(paren(ParenKind::Open));
        state.apply_action(GameAction::PlaceTile(0));
        state.apply_action(paren(ParenKind::Close));

        let snap = state.snapshot();
        assert_eq!(snap.cells.as_slice(), &[3, 7, 2]);
        assert_eq!(snap.gaps.len(), 2);
        assert_eq!(snap.gaps[0].operator, Operator::Add);
        assert!(!snap.gaps[0].placed);
        assert_eq!(snap.gaps[1].operator, Operator::Pow);
        assert!(snap.gaps[1].placed);
        assert_eq!(snap.parens[0].open, 1);
        assert_eq!(snap.pool[Operator::Pow.index()], 2);
        assert_eq!(snap.selection, vec![Tile::Paren(ParenKind::Close)]);
        assert_eq!(snap.expression, "(3+7**2");
        assert_eq!(snap.status, RoundStatus::InProgress);
        assert!(snap.playable());
    }

    #[test]
    fn test_snapshot_paren_counts_saturate() {
        let mut state = GameState::from_cells(&[1, 2]);
        for _ in 0..(u16::MAX as usize + 10) {
            state.apply_action(paren(ParenKind::Open));
            state.apply_action(GameAction::PlaceTile(0));
        }
        assert_eq!(state.placements().paren_count(0, ParenKind::Open), u16::MAX as usize + 10);

        let snap = state.snapshot();
        assert_eq!(snap.parens[0].open, u16::MAX);
        assert_eq!(snap.parens[1].open, 0);
    }
}
