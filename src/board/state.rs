//! Packed game state and move application
//!
//! A [`GameState`] is an immutable value: two 64-bit words. `occupied` holds
//! one bit per filled square; `owner` holds the owning player for each filled
//! square (bit set = Black) and carries the side-to-move flag in its most
//! significant bit, well clear of the 56-square range. Applying a move never
//! mutates a state, it returns a new one, so search code can keep cheap
//! copies of positions on the stack.
//!
//! Squares fill bottom-up per column. Move generation only ever produces the
//! lowest free square of a column, and [`GameState::apply_move`] relies on
//! that invariant instead of re-validating it.
//!
//! # Example
//!
//! ```
//! use connect4::board::{BoardGeometry, GameState, Outcome};
//!
//! let geometry = BoardGeometry::new(6, 7).unwrap();
//! let state = GameState::EMPTY;
//!
//! // One legal move per column, center column first.
//! let moves: Vec<_> = state.next_moves(&geometry).collect();
//! assert_eq!(moves.len(), 7);
//!
//! let state = state.apply_move(moves[0]);
//! assert_eq!(state.outcome_after(&geometry, moves[0]), Outcome::NotFinished);
//! ```

use super::geometry::BoardGeometry;
use super::mask::Mask;
use super::{Outcome, Player};

/// Side-to-move flag: most significant bit of the `owner` word, outside the
/// 0..56 square range. Must be masked off before board inspection.
const TURN_BIT: u64 = 1 << 63;

/// A Connect Four position packed into two words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GameState {
    occupied: Mask,
    owner: Mask,
}

impl GameState {
    /// The empty board with White to move; the unique root of every game.
    pub const EMPTY: GameState = GameState {
        occupied: Mask::EMPTY,
        owner: Mask::EMPTY,
    };

    /// The player to move.
    #[inline]
    #[must_use]
    pub fn to_move(self) -> Player {
        if self.owner.bits() & TURN_BIT != 0 {
            Player::Black
        } else {
            Player::White
        }
    }

    /// Mask of all occupied squares.
    #[inline]
    #[must_use]
    pub fn occupied(self) -> Mask {
        self.occupied
    }

    /// Mask of the squares occupied by one player.
    #[inline]
    #[must_use]
    pub fn men(self, player: Player) -> Mask {
        match player {
            Player::White => self.occupied & !self.owner,
            Player::Black => self.occupied & self.owner,
        }
    }

    /// Number of men one player has on the board.
    #[inline]
    #[must_use]
    pub fn man_count(self, player: Player) -> u32 {
        self.men(player).count()
    }

    /// The two raw words `(occupied, owner)` identifying this configuration.
    ///
    /// Equal words mean equal positions regardless of the move order that
    /// reached them; this is the transposition-cache key.
    #[inline]
    #[must_use]
    pub fn words(self) -> (u64, u64) {
        (self.occupied.bits(), self.owner.bits())
    }

    /// Owner of a square, `None` when empty.
    #[inline]
    #[must_use]
    pub fn square(self, geometry: &BoardGeometry, row: usize, col: usize) -> Option<Player> {
        let square = geometry.square_id(row, col);
        if !self.occupied.contains(square) {
            None
        } else if self.owner.contains(square) {
            Some(Player::Black)
        } else {
            Some(Player::White)
        }
    }

    /// Check whether every square is occupied.
    #[inline]
    #[must_use]
    pub fn is_full(self, geometry: &BoardGeometry) -> bool {
        self.occupied == geometry.full_mask()
    }

    /// Apply a move for the side to move and return the resulting state.
    ///
    /// Precondition, unchecked for performance: `mov` selects exactly one
    /// empty square whose column predecessor is filled (or which sits in the
    /// bottom row). Masks produced by [`GameState::next_moves`] satisfy this
    /// by construction.
    #[inline]
    #[must_use]
    pub fn apply_move(self, mov: Mask) -> GameState {
        let owner = match self.to_move() {
            Player::White => self.owner,
            Player::Black => self.owner | mov,
        };
        GameState {
            occupied: self.occupied | mov,
            owner: Mask::new(owner.bits() ^ TURN_BIT),
        }
    }

    /// Lowest free square of a column as a one-square mask.
    #[inline]
    fn drop_mask(self, geometry: &BoardGeometry, col: usize) -> Option<Mask> {
        let height = (self.occupied & geometry.column_mask(col)).count() as usize;
        if height < geometry.rows() {
            Some(Mask::single(geometry.square_id(height, col)))
        } else {
            None
        }
    }

    /// Enumerate one legal move per non-full column, center column first,
    /// then alternately one column right and one left of it.
    ///
    /// Returns a fresh iterator on every call; the ordering is a pruning
    /// heuristic for the alpha-beta search, central columns cut earliest.
    #[must_use]
    pub fn next_moves(self, geometry: &BoardGeometry) -> NextMoves<'_> {
        NextMoves {
            geometry,
            state: self,
            next: 0,
        }
    }

    /// Lowest free square of a column, as an index.
    ///
    /// Convenience lookup for column-oriented callers such as a console
    /// front-end; `None` when the column is full.
    #[must_use]
    pub fn lowest_free_square(self, geometry: &BoardGeometry, col: usize) -> Option<usize> {
        (0..geometry.rows())
            .map(|row| geometry.square_id(row, col))
            .find(|&square| !self.occupied.contains(square))
    }

    /// Inspect the position for the end of the game, checking every line.
    #[must_use]
    pub fn outcome(self, geometry: &BoardGeometry) -> Outcome {
        for player in [Player::White, Player::Black] {
            let men = self.men(player);
            for line in geometry.all_win_masks() {
                if men.contains_all(line) {
                    return Outcome::Won {
                        winner: player,
                        line,
                    };
                }
            }
        }
        if self.is_full(geometry) {
            Outcome::Drawn
        } else {
            Outcome::NotFinished
        }
    }

    /// Inspect the position right after `last_move`, checking only the lines
    /// through that square.
    ///
    /// Correct only when called on the state `apply_move(last_move)` produced
    /// and the game was not already decided beforehand; under that contract
    /// any new four-in-a-row must run through the last move's square.
    #[must_use]
    pub fn outcome_after(self, geometry: &BoardGeometry, last_move: Mask) -> Outcome {
        let mover = if self.owner.contains_all(last_move) {
            Player::Black
        } else {
            Player::White
        };
        let men = self.men(mover);
        for &line in geometry.win_masks_through(last_move.square()) {
            if men.contains_all(line) {
                return Outcome::Won {
                    winner: mover,
                    line,
                };
            }
        }
        if self.is_full(geometry) {
            Outcome::Drawn
        } else {
            Outcome::NotFinished
        }
    }

    /// The same position with every man's owner flipped and the turn passed
    /// to the other player.
    #[must_use]
    pub fn swap_colors(self) -> GameState {
        let swapped = (self.occupied & !self.owner).bits();
        let turn = (self.owner.bits() & TURN_BIT) ^ TURN_BIT;
        GameState {
            occupied: self.occupied,
            owner: Mask::new(swapped | turn),
        }
    }

    /// Render the board as text, top row first, with a column-index footer.
    ///
    /// One character per square: `.` empty, `O` White, `X` Black.
    #[must_use]
    pub fn render(self, geometry: &BoardGeometry) -> String {
        let mut out = String::with_capacity((geometry.rows() + 2) * (geometry.cols() + 1));
        for row in (0..geometry.rows()).rev() {
            for col in 0..geometry.cols() {
                out.push(match self.square(geometry, row, col) {
                    None => '.',
                    Some(player) => player.symbol(),
                });
            }
            out.push('\n');
        }
        for col in 0..geometry.cols() {
            out.push((b'0' + col as u8) as char);
        }
        out.push('\n');
        out
    }
}

/// Iterator over the legal moves of a state, in center-out column order.
pub struct NextMoves<'a> {
    geometry: &'a BoardGeometry,
    state: GameState,
    next: usize,
}

impl Iterator for NextMoves<'_> {
    type Item = Mask;

    fn next(&mut self) -> Option<Mask> {
        while let Some(&col) = self.geometry.column_order().get(self.next) {
            self.next += 1;
            if let Some(mov) = self.state.drop_mask(self.geometry, col) {
                return Some(mov);
            }
        }
        None
    }
}
