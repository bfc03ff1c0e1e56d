//! Move proposal: the root search driver
//!
//! The [`Engine`] owns a board geometry and an evaluation strategy and turns
//! "find me a move" into root searches. Strength is counted in rounds (one
//! move by each player), so strength `s` searches `2 * s` plies.
//!
//! When the search proves the position lost at high strength, playing the
//! "least bad" deep line is pointless against a fallible opponent: every
//! line loses against perfect play and the deep search gives no signal which
//! practical chances remain. The engine then retries at a reduced depth,
//! trading provable optimality for a move chosen by what can still be
//! reached within a shorter horizon.
//!
//! # Example
//!
//! ```
//! use connect4::{BoardGeometry, Engine, GameState};
//!
//! let geometry = BoardGeometry::new(6, 7).unwrap();
//! let mut engine = Engine::new(geometry);
//!
//! let state = GameState::EMPTY;
//! let result = engine.propose_move_with_stats(state, 2);
//! assert!(result.best_move.is_some());
//! ```

use std::time::Instant;

use log::debug;

use crate::board::{BoardGeometry, GameState, Mask};
use crate::eval::{Evaluator, LinesOfThree};
use crate::search::{SearchStats, Searcher, LOST};

/// Result of a move proposal with search diagnostics.
#[derive(Debug, Clone)]
pub struct MoveResult {
    /// Best move found; `None` only when the position has no legal moves.
    pub best_move: Option<Mask>,
    /// Fail-soft value of the best move for the side to move.
    pub value: i32,
    /// Plies actually searched, after any forced-loss depth reduction.
    pub depth: i8,
    /// Total nodes searched, fallback searches included.
    pub nodes: u64,
    /// Wall-clock time in milliseconds.
    pub time_ms: u64,
    /// Combined search counters.
    pub stats: SearchStats,
}

/// The move proposer: geometry plus an evaluation strategy.
pub struct Engine {
    geometry: BoardGeometry,
    evaluator: Box<dyn Evaluator>,
}

impl Engine {
    /// Create an engine with the default [`LinesOfThree`] evaluator.
    #[must_use]
    pub fn new(geometry: BoardGeometry) -> Self {
        Self::with_evaluator(geometry, Box::new(LinesOfThree))
    }

    /// Create an engine with a custom evaluation strategy.
    #[must_use]
    pub fn with_evaluator(geometry: BoardGeometry, evaluator: Box<dyn Evaluator>) -> Self {
        Self {
            geometry,
            evaluator,
        }
    }

    /// The board geometry this engine plays on.
    #[must_use]
    pub fn geometry(&self) -> &BoardGeometry {
        &self.geometry
    }

    /// Propose a move for the side to move in `state`.
    ///
    /// Returns `None` only when no legal move exists. Precondition: the game
    /// is not already decided.
    #[must_use]
    pub fn propose_move(&mut self, state: GameState, strength: u8) -> Option<Mask> {
        self.propose_move_with_stats(state, strength).best_move
    }

    /// Propose a move and report search diagnostics.
    #[must_use]
    pub fn propose_move_with_stats(&mut self, state: GameState, strength: u8) -> MoveResult {
        let start = Instant::now();
        let depth = plies_for(strength);
        let (best_move, value, depth, stats) = self.search_at(state, depth);
        let time_ms = start.elapsed().as_millis() as u64;
        debug!(
            "proposed col {:?} value {} at depth {} ({} nodes, {} ms, cache {:.0}%)",
            best_move.map(|m| self.geometry.column_of(m)),
            value,
            depth,
            stats.nodes,
            time_ms,
            stats.cache_hit_rate(),
        );
        MoveResult {
            best_move,
            value,
            depth,
            nodes: stats.nodes,
            time_ms,
            stats,
        }
    }

    /// Search at `depth` plies, retrying shallower on a forced loss.
    fn search_at(&mut self, state: GameState, depth: i8) -> (Option<Mask>, i32, i8, SearchStats) {
        let mut searcher = Searcher::new(&self.geometry, self.evaluator.as_ref());
        let (best_move, value) = searcher.search_root(state, depth);
        let stats = searcher.stats().clone();

        // A proven loss deeper than two rounds: fall back to a shorter
        // horizon and keep whatever practical play it finds.
        if best_move.is_some() && value == LOST && depth > 4 {
            let reduced = reduced_depth(depth);
            debug!("forced loss at depth {depth}, retrying at depth {reduced}");
            let (fallback_move, fallback_value, fallback_depth, mut fallback_stats) =
                self.search_at(state, reduced);
            fallback_stats.merge(&stats);
            return (fallback_move, fallback_value, fallback_depth, fallback_stats);
        }

        (best_move, value, depth, stats)
    }
}

/// Plies for a strength counted in rounds; at least one round.
fn plies_for(strength: u8) -> i8 {
    let rounds = strength.clamp(1, 28);
    (rounds * 2) as i8
}

/// Roughly halve the horizon, with one extra ply off a long one; never below
/// a single round.
fn reduced_depth(depth: i8) -> i8 {
    let halved = if depth > 8 { depth / 2 - 1 } else { depth / 2 };
    halved.max(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Outcome, Player};

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
    fn test_plies_for_strength() {
        assert_eq!(plies_for(1), 2);
        assert_eq!(plies_for(2), 4);
        assert_eq!(plies_for(5), 10);
        // Degenerate strengths clamp instead of overflowing.
        assert_eq!(plies_for(0), 2);
        assert_eq!(plies_for(255), 56);
    }

    #[test]
    fn test_reduced_depth() {
        assert_eq!(reduced_depth(6), 3);
        assert_eq!(reduced_depth(8), 4);
        assert_eq!(reduced_depth(10), 4);
        assert_eq!(reduced_depth(14), 6);
        assert_eq!(reduced_depth(5), 2);
    }

    #[test]
    fn test_engine_takes_immediate_win() {
        let g = geometry();
        let state = drop_all(&g, &[2, 0, 2, 1, 2, 0]);
        let mut engine = Engine::new(g);
        let mov = engine.propose_move(state, 2).unwrap();
        assert_eq!(mov, engine.geometry().square_mask(3, 2));
    }

    #[test]
    fn test_engine_blocks_immediate_threat() {
        let g = geometry();
        // Black threatens to complete (0,1)..(0,4); White must take (0,4).
        let state = drop_all(&g, &[0, 1, 5, 2, 5, 3]);
        assert_eq!(state.to_move(), Player::White);
        let mut engine = Engine::new(g);
        let mov = engine.propose_move(state, 2).unwrap();
        assert_eq!(mov, engine.geometry().square_mask(0, 4));
    }

    #[test]
    fn test_engine_forced_loss_falls_back_to_shallow_depth() {
        let g = geometry();
        // Black holds (0,2),(0,3),(0,4) with both ends open: a double threat
        // White cannot stop. At strength 3 the loss is within the horizon.
        let state = drop_all(&g, &[6, 2, 6, 3, 0, 4]);
        assert_eq!(state.to_move(), Player::White);
        let mut engine = Engine::new(g);
        let result = engine.propose_move_with_stats(state, 3);
        assert!(result.best_move.is_some());
        // 6 plies proved the loss; the proposal came from the reduced search.
        assert_eq!(result.depth, 3);
    }

    #[test]
    fn test_engine_plays_full_game_to_verdict() {
        let g = geometry();
        let mut engine = Engine::new(g);
        let mut state = GameState::EMPTY;
        let mut outcome = Outcome::NotFinished;

        for _ in 0..42 {
            let mov = engine.propose_move(state, 1).unwrap();
            state = state.apply_move(mov);
            outcome = state.outcome_after(engine.geometry(), mov);
            if outcome.is_final() {
                break;
            }
        }
        assert!(outcome.is_final());
    }

    #[test]
    fn test_engine_deterministic() {
        let g = geometry();
        let state = drop_all(&g, &[3, 3, 2]);
        let mut engine = Engine::new(g);
        let first = engine.propose_move(state, 2);
        let second = engine.propose_move(state, 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_engine_with_custom_evaluator() {
        let g = geometry();
        let mut engine = Engine::with_evaluator(g, Box::new(crate::eval::Fixed));
        let result = engine.propose_move_with_stats(GameState::EMPTY, 1);
        assert!(result.best_move.is_some());
        assert!(result.nodes > 0);
    }
}
