//! Heuristic evaluators built on the precomputed square weights
//!
//! Two strategies live here. [`SquareWeights`] is a purely static sum over
//! occupied squares. [`LinesOfThree`] looks one step further: it finds every
//! empty square that would complete a four for either player and scores those
//! "winning squares" per column, doubling a column where two of them are
//! stacked an odd number of rows apart: the drop parity then forces one of
//! them onto the opponent.

use crate::board::{BoardGeometry, GameState, Mask, Player};

use super::Evaluator;

/// Scoring weights for the heuristic evaluators.
///
/// These are tuned values, not semantic contracts; the hierarchy matters
/// (a winning square dwarfs any static-weight sum), the exact numbers do not.
pub struct Weights;

impl Weights {
    /// Value of an empty square that would complete a four.
    pub const WINNING_SQUARE: i32 = 1_000;
    /// Multiplier for a column holding two parity-compatible winning squares.
    pub const PARITY_FACTOR: i32 = 2;
    /// Per-man multiplier on the static square weight, the tie-breaker.
    pub const MAN_WEIGHT: i32 = 10;
}

/// Static evaluation: for each man, the product of the number of lines
/// through its square and the square's essential weight, summed per player;
/// White minus Black.
///
/// When the piece counts differ (they differ by at most one under strict
/// alternation) the player about to move gets credited with the best square
/// still open, which removes most of the extra-tempo bias.
#[derive(Debug, Default, Clone, Copy)]
pub struct SquareWeights;

impl SquareWeights {
    fn weighted_sum(geometry: &BoardGeometry, men: Mask) -> i32 {
        men.squares()
            .map(|s| geometry.square_weight(s) * geometry.essential_weight(s))
            .sum()
    }

    fn best_open_weight(geometry: &BoardGeometry, state: GameState) -> i32 {
        (0..geometry.squares())
            .filter(|&s| !state.occupied().contains(s))
            .map(|s| geometry.square_weight(s) * geometry.essential_weight(s))
            .max()
            .unwrap_or(0)
    }
}

impl Evaluator for SquareWeights {
    fn evaluate(&self, geometry: &BoardGeometry, state: GameState) -> i32 {
        let white = Self::weighted_sum(geometry, state.men(Player::White));
        let black = Self::weighted_sum(geometry, state.men(Player::Black));

        let white_men = state.man_count(Player::White);
        let black_men = state.man_count(Player::Black);
        let correction = match white_men.cmp(&black_men) {
            std::cmp::Ordering::Greater => -Self::best_open_weight(geometry, state),
            std::cmp::Ordering::Less => Self::best_open_weight(geometry, state),
            std::cmp::Ordering::Equal => 0,
        };

        white - black + correction
    }
}

/// The default strategy: winning-square tallies with column parity.
///
/// For every empty square, a man of each color is placed speculatively; a
/// square completing a four counts toward that color's tally in its column.
/// At most two winning squares per column per color are recorded; further
/// ones cannot change the parity-forcing argument. A flat weighted sum over
/// occupied squares breaks ties between positions with equal tallies.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinesOfThree;

impl LinesOfThree {
    /// Sum of per-column winning-square tallies for one player.
    fn winning_tally(geometry: &BoardGeometry, state: GameState, player: Player) -> i32 {
        let men = state.men(player);
        let occupied = state.occupied();
        let mut total = 0;

        for col in 0..geometry.cols() {
            let mut rows = [0usize; 2];
            let mut found = 0usize;
            for row in 0..geometry.rows() {
                let square = geometry.square_id(row, col);
                if occupied.contains(square) {
                    continue;
                }
                let placed = men | Mask::single(square);
                let completes = geometry
                    .win_masks_through(square)
                    .iter()
                    .any(|&line| placed.contains_all(line));
                if completes && found < 2 {
                    rows[found] = row;
                    found += 1;
                }
            }

            let mut tally = found as i32;
            // Two winning squares stacked an odd distance apart: alternating
            // drops cannot dodge both, so the column forces a win.
            if found == 2 && (rows[1] - rows[0]) % 2 == 1 {
                tally *= Weights::PARITY_FACTOR;
            }
            total += tally;
        }

        total
    }

    fn man_weights(geometry: &BoardGeometry, men: Mask) -> i32 {
        men.squares().map(|s| geometry.square_weight(s)).sum()
    }
}

impl Evaluator for LinesOfThree {
    fn evaluate(&self, geometry: &BoardGeometry, state: GameState) -> i32 {
        let tally = Self::winning_tally(geometry, state, Player::White)
            - Self::winning_tally(geometry, state, Player::Black);
        let tiebreak = Self::man_weights(geometry, state.men(Player::White))
            - Self::man_weights(geometry, state.men(Player::Black));

        tally * Weights::WINNING_SQUARE + tiebreak * Weights::MAN_WEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_square_weights_empty_board_zero() {
        let g = geometry();
        assert_eq!(SquareWeights.evaluate(&g, GameState::EMPTY), 0);
    }

    #[test]
    fn test_square_weights_symmetry() {
        let g = geometry();
        let state = drop_all(&g, &[3, 3, 4, 2, 0]);
        assert_eq!(
            SquareWeights.evaluate(&g, state),
            -SquareWeights.evaluate(&g, state.swap_colors())
        );
    }

    #[test]
    fn test_square_weights_correction_applies_when_counts_differ() {
        let g = geometry();
        // One White man in a corner: product weight 0, so the whole score is
        // the tempo correction for Black, the best open square product.
        let state = drop_all(&g, &[0]);
        let best_open = (0..g.squares())
            .map(|s| g.square_weight(s) * g.essential_weight(s))
            .max()
            .unwrap();
        assert_eq!(SquareWeights.evaluate(&g, state), -best_open);
    }

    #[test]
    fn test_lines_of_three_empty_board_zero() {
        let g = geometry();
        assert_eq!(LinesOfThree.evaluate(&g, GameState::EMPTY), 0);
    }

    #[test]
    fn test_lines_of_three_symmetry() {
        let g = geometry();
        for cols in [&[3, 3, 4, 4, 2][..], &[0, 1, 2, 3, 4, 5, 6][..]] {
            let state = drop_all(&g, cols);
            assert_eq!(
                LinesOfThree.evaluate(&g, state),
                -LinesOfThree.evaluate(&g, state.swap_colors())
            );
        }
    }

    #[test]
    fn test_lines_of_three_counts_winning_square() {
        let g = geometry();
        // White holds (0,1), (0,2), (0,3) with (0,0) taken by Black, so
        // only (0,4) would complete a White four. Black's scattered men
        // complete nothing.
        let state = drop_all(&g, &[1, 0, 2, 5, 3, 6]);
        assert_eq!(LinesOfThree::winning_tally(&g, state, Player::White), 1);
        assert_eq!(LinesOfThree::winning_tally(&g, state, Player::Black), 0);
        assert!(LinesOfThree.evaluate(&g, state) >= Weights::WINNING_SQUARE);
    }

    #[test]
    fn test_lines_of_three_parity_doubling() {
        let g = geometry();
        // White row 0 at columns 0,1,2,4,5: the single winning square (0,3)
        // completes fours on both sides but counts once, tally 1.
        let state = drop_all(&g, &[0, 0, 1, 1, 2, 2, 4, 4, 5, 5]);
        assert_eq!(LinesOfThree::winning_tally(&g, state, Player::White), 1);

        // Add White row 1 at columns 1,2,4,5: now (1,3) completes as well,
        // and (0,3)/(1,3) sit one row apart in column 3 -> doubled tally.
        let state = drop_all(
            &g,
            &[0, 0, 1, 6, 2, 6, 4, 6, 5, 0, 1, 1, 2, 2, 4, 4, 5, 5],
        );
        let white = state.men(Player::White);
        assert!(white.contains(g.square_id(1, 1)) && white.contains(g.square_id(1, 2)));
        assert_eq!(LinesOfThree::winning_tally(&g, state, Player::White), 4);
    }
}
