//! Position evaluation strategies
//!
//! An [`Evaluator`] maps a position to a heuristic score from White's point
//! of view: positive favors White, negative favors Black. The search negates
//! the score when Black is to move, so every strategy must be symmetric under
//! a color swap: `evaluate(state) == -evaluate(state.swap_colors())`.
//!
//! Scores stay well inside the search's win/loss sentinels; only the search
//! itself produces those extremes. Strategies are interchangeable:
//!
//! - [`Fixed`]: always 0, for tests.
//! - [`RandomEval`]: seeded noise in `[-10, 10]`, the baseline opponent.
//! - [`SquareWeights`]: static square-importance sums.
//! - [`LinesOfThree`]: completable-square and column-parity analysis, the
//!   default and strongest strategy.

pub mod heuristic;

pub use heuristic::{LinesOfThree, SquareWeights};

use std::cell::RefCell;

use crate::board::{BoardGeometry, GameState};

/// A heuristic scoring strategy, White-oriented.
pub trait Evaluator {
    /// Score `state` on the board described by `geometry`.
    fn evaluate(&self, geometry: &BoardGeometry, state: GameState) -> i32;
}

/// Scores every position 0. For testing only.
#[derive(Debug, Default, Clone, Copy)]
pub struct Fixed;

impl Evaluator for Fixed {
    #[inline]
    fn evaluate(&self, _geometry: &BoardGeometry, _state: GameState) -> i32 {
        0
    }
}

/// Seeded random scores in `[-10, 10]`. For testing only; a search driven by
/// this establishes a reproducible baseline opponent.
#[derive(Debug)]
pub struct RandomEval {
    rng: RefCell<fastrand::Rng>,
}

impl RandomEval {
    /// Create the evaluator with a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: RefCell::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Evaluator for RandomEval {
    fn evaluate(&self, _geometry: &BoardGeometry, _state: GameState) -> i32 {
        self.rng.borrow_mut().i32(-10..=10)
    }
}
