//! Fail-soft negamax with alpha-beta pruning
//!
//! The searcher walks the game tree depth-first. Each call scores the
//! position for the side to move: a win for the player who just moved is
//! [`LOST`], a draw is 0, and at depth 0 the evaluator's White-oriented score
//! is negated for Black. Pruning is fail-soft: a beta cutoff returns the best
//! value found so far, not the bound, so parent windows stay as tight as the
//! information allows.
//!
//! Before expanding a node at depth > 1 the searcher scans the legal moves
//! once for killers: a move that wins on the spot, or the single move that
//! stops the opponent winning on the spot. Either prunes the node to one
//! child. This is a performance device only; leaving it out changes no
//! result.
//!
//! Results are cached per configuration while the cacheable phase is active
//! (see [`super::cache`]); caching is skipped at depth <= 1 where a fresh
//! evaluation is cheaper than the table round-trip.
//!
//! # Example
//!
//! ```
//! use connect4::board::{BoardGeometry, GameState};
//! use connect4::eval::LinesOfThree;
//! use connect4::search::Searcher;
//!
//! let geometry = BoardGeometry::new(6, 7).unwrap();
//! let evaluator = LinesOfThree;
//! let mut searcher = Searcher::new(&geometry, &evaluator);
//!
//! let (best, value) = searcher.search_root(GameState::EMPTY, 4);
//! assert!(best.is_some());
//! assert!(value.abs() < i32::MAX);
//! ```

use log::trace;

use crate::board::{BoardGeometry, GameState, Mask, Outcome, Player};
use crate::eval::Evaluator;

use super::cache::{CacheKey, CacheManager, TranspositionTable};
use super::observer::{NullObserver, SearchObserver};

/// Score of a position whose side to move cannot avoid losing.
pub const LOST: i32 = -i32::MAX;
/// Score of a position whose side to move can force a win.
pub const WON: i32 = i32::MAX;
/// Internal "no move evaluated yet" sentinel. Strictly below [`LOST`];
/// evaluators never produce it.
const NO_MOVE: i32 = i32::MIN;

/// Counters accumulated over one search. Returned with the result instead of
/// being kept in globals, so runs stay deterministic and comparable.
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    /// Nodes entered, terminal and interior.
    pub nodes: u64,
    /// Beta cutoffs (fail-high).
    pub beta_cutoffs: u64,
    /// Beta cutoffs on the first child tried (move-ordering quality).
    pub first_move_cutoffs: u64,
    /// Transposition-cache probes.
    pub cache_probes: u64,
    /// Probes answered from the cache.
    pub cache_hits: u64,
    /// Nodes pruned to a single immediately winning move.
    pub winning_shortcuts: u64,
    /// Nodes pruned to the single move blocking an opponent win.
    pub forced_blocks: u64,
}

impl SearchStats {
    /// First-move cutoff rate in percent (high means good move ordering).
    #[must_use]
    pub fn first_move_rate(&self) -> f64 {
        if self.beta_cutoffs == 0 {
            0.0
        } else {
            self.first_move_cutoffs as f64 / self.beta_cutoffs as f64 * 100.0
        }
    }

    /// Cache hit rate in percent.
    #[must_use]
    pub fn cache_hit_rate(&self) -> f64 {
        if self.cache_probes == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.cache_probes as f64 * 100.0
        }
    }

    /// Fold another run's counters into this one.
    pub fn merge(&mut self, other: &SearchStats) {
        self.nodes += other.nodes;
        self.beta_cutoffs += other.beta_cutoffs;
        self.first_move_cutoffs += other.first_move_cutoffs;
        self.cache_probes += other.cache_probes;
        self.cache_hits += other.cache_hits;
        self.winning_shortcuts += other.winning_shortcuts;
        self.forced_blocks += other.forced_blocks;
    }
}

/// One search invocation: geometry, evaluator, a fresh transposition table
/// and an observer hook.
///
/// The search is synchronous, single-threaded recursion; a call blocks until
/// the subtree is exhausted. The table belongs to this searcher alone.
pub struct Searcher<'a, O: SearchObserver = NullObserver> {
    geometry: &'a BoardGeometry,
    evaluator: &'a dyn Evaluator,
    observer: O,
    table: TranspositionTable,
    caching: bool,
    stats: SearchStats,
}

impl<'a> Searcher<'a, NullObserver> {
    /// Create a searcher with the no-op observer.
    #[must_use]
    pub fn new(geometry: &'a BoardGeometry, evaluator: &'a dyn Evaluator) -> Self {
        Self::with_observer(geometry, evaluator, NullObserver)
    }
}

impl<'a, O: SearchObserver> Searcher<'a, O> {
    /// Create a searcher that reports every evaluated child to `observer`.
    #[must_use]
    pub fn with_observer(
        geometry: &'a BoardGeometry,
        evaluator: &'a dyn Evaluator,
        observer: O,
    ) -> Self {
        Self {
            geometry,
            evaluator,
            observer,
            table: TranspositionTable::new(),
            caching: true,
            stats: SearchStats::default(),
        }
    }

    /// Switch transposition caching off (or back on).
    ///
    /// Caching never changes a returned value, only the work done to get it;
    /// this switch exists so that property can be verified.
    pub fn set_caching(&mut self, caching: bool) {
        self.caching = caching;
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Number of configurations in the transposition table.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.table.len()
    }

    /// Evaluate every root move of `state` to `depth - 1` plies and return
    /// the best move with its fail-soft value.
    ///
    /// The first move is searched with the full window, later moves with
    /// `[LOST, -alpha]`. The best move only changes on a strictly better
    /// value: under fail-soft pruning a later move with an equal score may
    /// owe it to a cut branch and cannot be trusted to be as good.
    ///
    /// Precondition: `state` is not already decided.
    pub fn search_root(&mut self, state: GameState, depth: i8) -> (Option<Mask>, i32) {
        let mut best_move = None;
        let mut alpha = LOST;
        let phase = CacheManager::for_state(self.geometry, state);
        let mover = state.to_move();

        for mov in state.next_moves(self.geometry) {
            let child = state.apply_move(mov);
            let child_phase = phase.advance(self.geometry, mov, mover);
            let value = -self.negamax(child, mov, child_phase, depth - 1, LOST, -alpha);
            self.observer.move_evaluated(state, mov, depth, alpha, WON, value);
            trace!(
                "root move col {} -> value {}",
                self.geometry.column_of(mov),
                value
            );

            if best_move.is_none() || value > alpha {
                alpha = value;
                best_move = Some(mov);
            }
            if alpha == WON {
                break;
            }
        }

        (best_move, alpha)
    }

    /// Score `state` for its side to move, `last_move` being the move that
    /// produced it.
    ///
    /// Precondition: the position was not already decided before `last_move`.
    /// The search does not re-check this.
    pub fn negamax(
        &mut self,
        state: GameState,
        last_move: Mask,
        phase: CacheManager,
        depth: i8,
        alpha: i32,
        beta: i32,
    ) -> i32 {
        self.stats.nodes += 1;

        match state.outcome_after(self.geometry, last_move) {
            // The player who just moved - this call's opponent - won.
            Outcome::Won { .. } => return LOST,
            Outcome::Drawn => return 0,
            Outcome::NotFinished => {}
        }

        if depth <= 0 {
            return self.leaf_value(state);
        }

        // At depth 1 a full evaluation is cheaper than the cache round-trip.
        let cacheable = self.caching && depth > 1 && phase.is_active();
        let key = CacheKey::from(state);
        if cacheable {
            self.stats.cache_probes += 1;
            if let Some(score) = self.table.lookup(key, alpha, beta) {
                self.stats.cache_hits += 1;
                return score;
            }
        }

        let moves = self.candidate_moves(state, depth);
        let mover = state.to_move();
        let mut best = NO_MOVE;
        let mut tight_alpha = alpha;

        for (index, &mov) in moves.iter().enumerate() {
            let child = state.apply_move(mov);
            let child_phase = phase.advance(self.geometry, mov, mover);
            let value = -self.negamax(child, mov, child_phase, depth - 1, -beta, -tight_alpha);
            self.observer
                .move_evaluated(state, mov, depth, tight_alpha, beta, value);

            if value > best {
                best = value;
            }
            if value >= beta {
                self.stats.beta_cutoffs += 1;
                if index == 0 {
                    self.stats.first_move_cutoffs += 1;
                }
                break;
            }
            if value > tight_alpha {
                tight_alpha = value;
            }
        }

        if cacheable {
            self.table.store(key, alpha, beta, best);
        }
        best
    }

    fn leaf_value(&mut self, state: GameState) -> i32 {
        let score = self.evaluator.evaluate(self.geometry, state);
        match state.to_move() {
            Player::White => score,
            Player::Black => -score,
        }
    }

    /// Killer-move identification.
    ///
    /// Scans the legal moves once: any immediately winning move prunes the
    /// list to itself; failing that, if exactly one move leaves the opponent
    /// without an immediate win, that forced block is the only move worth
    /// searching. Applied only at depth > 1 - at the final ply the scan
    /// costs as much as the evaluation it would save.
    fn candidate_moves(&mut self, state: GameState, depth: i8) -> Vec<Mask> {
        let geometry = self.geometry;
        let moves: Vec<Mask> = state.next_moves(geometry).collect();
        if depth <= 1 {
            return moves;
        }

        for &mov in &moves {
            let child = state.apply_move(mov);
            if matches!(child.outcome_after(geometry, mov), Outcome::Won { .. }) {
                self.stats.winning_shortcuts += 1;
                return vec![mov];
            }
        }

        let mut safe_moves = 0usize;
        let mut block = Mask::EMPTY;
        for &mov in &moves {
            let child = state.apply_move(mov);
            let opponent_wins = child.next_moves(geometry).any(|reply| {
                let grandchild = child.apply_move(reply);
                matches!(grandchild.outcome_after(geometry, reply), Outcome::Won { .. })
            });
            if !opponent_wins {
                safe_moves += 1;
                block = mov;
            }
        }
        if safe_moves == 1 {
            self.stats.forced_blocks += 1;
            return vec![block];
        }

        moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{Fixed, LinesOfThree};

    fn geometry() -> BoardGeometry {
        BoardGeometry::new(6, 7).unwrap()
    }

    fn drop_all(geometry: &BoardGeometry, cols: &[usize]) -> GameState {
        cols.iter().fold(GameState::EMPTY, |state, &col| {
            let square = state.lowest_free_square(geometry, col).unwrap();
            state.apply_move(Mask::single(square))
        })
    }

    #[test]
    fn test_negamax_detects_win_after_last_move() {
        let g = geometry();
        // White completes a vertical four in column 3.
        let state = drop_all(&g, &[3, 0, 3, 0, 3, 0, 3]);
        let mov = g.square_mask(3, 3);
        let phase = CacheManager::for_state(&g, state);

        let evaluator = Fixed;
        let mut searcher = Searcher::new(&g, &evaluator);
        // The side to move (Black) faces a completed four: LOST.
        assert_eq!(searcher.negamax(state, mov, phase, 5, LOST, WON), LOST);
    }

    #[test]
    fn test_negamax_drawn_position_is_zero() {
        let g = BoardGeometry::new(4, 4).unwrap();
        let cols = [0, 1, 0, 1, 2, 3, 2, 3, 1, 0, 1, 0, 3, 2, 3, 2];
        let state = drop_all(&g, &cols);
        // Last drop landed on top of column 2.
        let mov = g.square_mask(3, 2);
        let phase = CacheManager::for_state(&g, state);

        let evaluator = Fixed;
        let mut searcher = Searcher::new(&g, &evaluator);
        assert_eq!(searcher.negamax(state, mov, phase, 4, LOST, WON), 0);
    }

    #[test]
    fn test_negamax_win_in_one_at_any_depth() {
        let g = geometry();
        // White to move with three in column 3: winning move on the spot.
        let state = drop_all(&g, &[3, 0, 3, 1, 3, 2]);
        let last = g.square_mask(0, 2);
        let evaluator = LinesOfThree;

        for depth in 1..=5 {
            let mut searcher = Searcher::new(&g, &evaluator);
            let phase = CacheManager::for_state(&g, state);
            assert_eq!(
                searcher.negamax(state, last, phase, depth, LOST, WON),
                WON,
                "depth {depth}"
            );
        }
    }

    #[test]
    fn test_negamax_value_within_bounds() {
        let g = geometry();
        let state = drop_all(&g, &[3, 3, 2, 4]);
        let last = g.square_mask(0, 4);
        let evaluator = LinesOfThree;

        for depth in 0..=6 {
            let mut searcher = Searcher::new(&g, &evaluator);
            let phase = CacheManager::for_state(&g, state);
            let value = searcher.negamax(state, last, phase, depth, LOST, WON);
            assert!((LOST..=WON).contains(&value), "depth {depth}: {value}");
        }
    }

    #[test]
    fn test_killer_prunes_to_winning_move() {
        let g = geometry();
        // White to move with three in a column: expansion collapses to the
        // one winning move.
        let state = drop_all(&g, &[3, 0, 3, 1, 3, 2]);
        let evaluator = Fixed;
        let mut searcher = Searcher::new(&g, &evaluator);
        let moves = searcher.candidate_moves(state, 4);
        assert_eq!(moves, vec![g.square_mask(3, 3)]);
        assert_eq!(searcher.stats().winning_shortcuts, 1);
    }

    #[test]
    fn test_killer_finds_forced_block() {
        let g = geometry();
        // Black threatens (0,4) only; White's sole safe move is to take it.
        let state = drop_all(&g, &[0, 1, 5, 2, 5, 3]);
        assert_eq!(state.to_move(), Player::White);
        let evaluator = Fixed;
        let mut searcher = Searcher::new(&g, &evaluator);
        let moves = searcher.candidate_moves(state, 4);
        assert_eq!(moves, vec![g.square_mask(0, 4)]);
        assert_eq!(searcher.stats().forced_blocks, 1);
    }

    #[test]
    fn test_killer_leaves_quiet_position_alone() {
        let g = geometry();
        let state = drop_all(&g, &[3, 3]);
        let evaluator = Fixed;
        let mut searcher = Searcher::new(&g, &evaluator);
        let moves = searcher.candidate_moves(state, 4);
        assert_eq!(moves.len(), 7);
        assert_eq!(searcher.stats().winning_shortcuts, 0);
        assert_eq!(searcher.stats().forced_blocks, 0);
    }

    #[test]
    fn test_search_root_picks_immediate_win() {
        let g = geometry();
        // White has three in column 2 and wins by completing it.
        let state = drop_all(&g, &[2, 0, 2, 1, 2, 0]);
        let evaluator = LinesOfThree;
        let mut searcher = Searcher::new(&g, &evaluator);
        let (best, value) = searcher.search_root(state, 4);
        assert_eq!(best, Some(g.square_mask(3, 2)));
        assert_eq!(value, WON);
    }

    #[test]
    fn test_search_root_empty_board_prefers_center() {
        let g = geometry();
        let evaluator = LinesOfThree;
        let mut searcher = Searcher::new(&g, &evaluator);
        let (best, value) = searcher.search_root(GameState::EMPTY, 4);
        assert!(best.is_some());
        assert!(value > LOST && value < WON);
    }

    #[test]
    fn test_observer_sees_every_root_move() {
        #[derive(Default)]
        struct Recorder {
            moves: Vec<(Mask, i32)>,
        }
        impl SearchObserver for Recorder {
            fn move_evaluated(
                &mut self,
                _parent: GameState,
                mov: Mask,
                depth: i8,
                _alpha: i32,
                _beta: i32,
                value: i32,
            ) {
                if depth == 2 {
                    self.moves.push((mov, value));
                }
            }
        }

        let g = geometry();
        let evaluator = Fixed;
        let mut searcher = Searcher::with_observer(&g, &evaluator, Recorder::default());
        searcher.search_root(GameState::EMPTY, 2);
        assert_eq!(searcher.observer.moves.len(), 7);
    }

    #[test]
    fn test_stats_count_nodes() {
        let g = geometry();
        let evaluator = Fixed;
        let mut searcher = Searcher::new(&g, &evaluator);
        searcher.search_root(GameState::EMPTY, 3);
        assert!(searcher.stats().nodes > 7);
    }
}
