//! Search: fail-soft negamax with killer moves and transposition caching
//!
//! Contains:
//! - [`negamax`]: the recursive searcher and its statistics
//! - [`cache`]: the transposition table and the cacheable-phase tracker
//! - [`observer`]: the per-node hook for tracing and tree export

pub mod cache;
pub mod negamax;
pub mod observer;

pub use cache::{CacheKey, CacheManager, TranspositionTable, CACHEABLE_RANK_MEN};
pub use negamax::{Searcher, SearchStats, LOST, WON};
pub use observer::{NullObserver, SearchObserver};
