//! Transposition cache and cacheable-phase tracking
//!
//! Two different move orders frequently reach the same configuration; the
//! [`TranspositionTable`] caches search results keyed on the packed
//! `(occupied, owner)` words so the second visit is a lookup. Entries record
//! the alpha-beta window a score was computed under, and a cached score is
//! reused only when the querying window is contained in the stored one;
//! scores from a fail-soft search are only bounds outside their window.
//!
//! Caching is worthless early in the game: positions a few plies from the
//! root are still unique by construction, so every node is visited at most
//! once. The [`CacheManager`] tracks, per root-to-node path, when the
//! position has enough men that transpositions become likely, and only then
//! does the searcher consult the shared table.

use std::collections::HashMap;

use crate::board::{BoardGeometry, GameState, Mask, Player, MAX_DIM};

use super::negamax::{LOST, WON};

/// Men a player must have in some single rank (both players independently)
/// before a path enters the cacheable phase. Empirically tuned; a proxy for
/// "this configuration is no longer unique to one move order".
pub const CACHEABLE_RANK_MEN: u8 = 2;

/// Cache key: the two packed words identifying a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    occupied: u64,
    owner: u64,
}

impl From<GameState> for CacheKey {
    #[inline]
    fn from(state: GameState) -> Self {
        let (occupied, owner) = state.words();
        CacheKey { occupied, owner }
    }
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    alpha: i32,
    beta: i32,
    score: i32,
}

/// Window-aware transposition table.
///
/// Owned by a single search invocation; never shared across concurrent
/// searches. Entries are read and conditionally rewritten non-atomically, so
/// parallel root splitting would need one table per worker.
#[derive(Debug, Default)]
pub struct TranspositionTable {
    entries: HashMap<CacheKey, CacheEntry>,
}

impl TranspositionTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a score usable under the `[alpha, beta]` window.
    ///
    /// A stored score is returned only when the querying window is contained
    /// in the window the score was computed under.
    #[must_use]
    pub fn lookup(&self, key: CacheKey, alpha: i32, beta: i32) -> Option<i32> {
        let entry = self.entries.get(&key)?;
        if alpha >= entry.alpha && beta <= entry.beta {
            Some(entry.score)
        } else {
            None
        }
    }

    /// Store a score computed under the `[alpha, beta]` window.
    ///
    /// A forced win or loss is window-independent and is stored with the
    /// widest possible bounds. When the same score was already cached under
    /// an overlapping window, the windows are merged (monotonic widening);
    /// otherwise the new result overwrites the old one.
    pub fn store(&mut self, key: CacheKey, alpha: i32, beta: i32, score: i32) {
        let entry = if score == WON || score == LOST {
            CacheEntry {
                alpha: LOST,
                beta: WON,
                score,
            }
        } else {
            match self.entries.get(&key) {
                Some(old) if old.score == score && old.alpha <= beta && alpha <= old.beta => {
                    CacheEntry {
                        alpha: old.alpha.min(alpha),
                        beta: old.beta.max(beta),
                        score,
                    }
                }
                _ => CacheEntry { alpha, beta, score },
            }
        };
        self.entries.insert(key, entry);
    }

    /// Number of cached configurations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-path cacheable-phase state machine.
///
/// `Accumulating` counts men per rank and player along the path from the
/// root; once both players have [`CACHEABLE_RANK_MEN`] men in some rank the
/// path switches to `Active` and stays there. The value is `Copy` and is
/// threaded through the recursion, so sibling subtrees track their phases
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheManager {
    /// Still counting; caching off.
    Accumulating {
        /// Men per rank, indexed `[player][row]`.
        rank_men: [[u8; MAX_DIM]; 2],
    },
    /// Threshold reached somewhere up the path; caching on.
    Active,
}

impl CacheManager {
    /// Phase for a search rooted at `state`, counting the men already on the
    /// board.
    #[must_use]
    pub fn for_state(geometry: &BoardGeometry, state: GameState) -> Self {
        let mut rank_men = [[0u8; MAX_DIM]; 2];
        for player in [Player::White, Player::Black] {
            for square in state.men(player).squares() {
                rank_men[player.index()][geometry.row_of(square)] += 1;
            }
        }
        Self::from_counts(rank_men)
    }

    /// Phase after `mover` drops a man at `mov`.
    #[must_use]
    pub fn advance(self, geometry: &BoardGeometry, mov: Mask, mover: Player) -> Self {
        match self {
            CacheManager::Active => CacheManager::Active,
            CacheManager::Accumulating { mut rank_men } => {
                rank_men[mover.index()][geometry.row_of(mov.square())] += 1;
                Self::from_counts(rank_men)
            }
        }
    }

    /// Check whether caching is on for this path.
    #[inline]
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, CacheManager::Active)
    }

    fn from_counts(rank_men: [[u8; MAX_DIM]; 2]) -> Self {
        let reached =
            |player: usize| rank_men[player].iter().any(|&men| men >= CACHEABLE_RANK_MEN);
        if reached(0) && reached(1) {
            CacheManager::Active
        } else {
            CacheManager::Accumulating { rank_men }
        }
    }
}
