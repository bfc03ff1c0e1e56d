//! Per-node search hook
//!
//! External tooling (tree dumpers, tracing front-ends) wants to watch the
//! search without the search knowing about it. The searcher takes a
//! [`SearchObserver`] and calls it once per evaluated child; the default
//! [`NullObserver`] compiles away to nothing.

use crate::board::{GameState, Mask};

/// Hook invoked around each child evaluation inside the search.
pub trait SearchObserver {
    /// Called after the move `mov` out of `parent` has been evaluated.
    ///
    /// `alpha` and `beta` are the window at the time of the call and `value`
    /// is the negated child result, all from the perspective of the player to
    /// move in `parent`.
    #[allow(unused_variables)]
    #[inline]
    fn move_evaluated(
        &mut self,
        parent: GameState,
        mov: Mask,
        depth: i8,
        alpha: i32,
        beta: i32,
        value: i32,
    ) {
    }
}

/// The default observer: does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SearchObserver for NullObserver {}

impl<T: SearchObserver + ?Sized> SearchObserver for &mut T {
    #[inline]
    fn move_evaluated(
        &mut self,
        parent: GameState,
        mov: Mask,
        depth: i8,
        alpha: i32,
        beta: i32,
        value: i32,
    ) {
        (**self).move_evaluated(parent, mov, depth, alpha, beta, value);
    }
}
