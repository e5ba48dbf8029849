//! Named parent-selection strategies for runner configurations.

use super::{
    DetTournamentSelect, ProportionalSelect, RandomSelect, Ranking, RankingSelect, SelectOne,
    StochTournamentSelect,
};
use crate::core::Individual;

/// Selection strategy for choosing parents.
///
/// A plain value that configurations can store and serialize;
/// [`build`](Selection::build) turns it into a [`SelectOne`].
///
/// # Examples
///
/// ```
/// use u_evolve::select::Selection;
///
/// // Tournament with size 3 (moderate selection pressure)
/// let sel = Selection::Tournament(3);
///
/// // Roulette wheel (fitness-proportionate)
/// let sel = Selection::Roulette;
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selection {
    /// Deterministic tournament of size `k` (see [`DetTournamentSelect`]).
    Tournament(usize),

    /// Binary tournament won by the better individual with the given
    /// probability (see [`StochTournamentSelect`]).
    StochTournament(f64),

    /// Fitness-proportionate (roulette wheel) selection.
    ///
    /// **Warning**: Susceptible to super-individual dominance when
    /// fitness variance is high.
    Roulette,

    /// Linear rank-based roulette with pressure 2.
    ///
    /// Selection probability depends on rank position, not raw fitness
    /// value, which avoids the scaling problems of roulette wheel
    /// selection.
    Rank,

    /// Uniform random choice (no selection pressure).
    Random,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(3)
    }
}

impl Selection {
    /// Builds the corresponding single-individual strategy.
    pub fn build<I: Individual + 'static>(&self) -> Box<dyn SelectOne<I>> {
        match *self {
            Selection::Tournament(k) => Box::new(DetTournamentSelect::new(k)),
            Selection::StochTournament(rate) => Box::new(StochTournamentSelect::new(rate)),
            Selection::Roulette => Box::new(ProportionalSelect::default()),
            Selection::Rank => Box::new(RankingSelect::new(Ranking::new(2.0, 1.0))),
            Selection::Random => Box::new(RandomSelect),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::min_pop;
    use crate::core::{Candidate, Minimizing};
    use crate::random::RandomSource;

    type Ind = Candidate<Vec<f64>, Minimizing>;

    #[test]
    fn test_every_strategy_selects_in_range() {
        let pop = min_pop(&[10.0, 5.0, 1.0, 8.0]);
        let mut rng = RandomSource::new(42);
        for s in [
            Selection::Tournament(2),
            Selection::StochTournament(0.8),
            Selection::Roulette,
            Selection::Rank,
            Selection::Random,
        ] {
            let mut sel = s.build::<Ind>();
            sel.setup(&pop).unwrap();
            for _ in 0..100 {
                assert!(sel.select(&pop, &mut rng) < pop.len());
            }
        }
    }

    #[test]
    fn test_single_individual() {
        let pop = min_pop(&[5.0]);
        let mut rng = RandomSource::new(42);
        for s in [Selection::Tournament(3), Selection::Roulette, Selection::Rank] {
            let mut sel = s.build::<Ind>();
            sel.setup(&pop).unwrap();
            assert_eq!(sel.select(&pop, &mut rng), 0);
        }
    }

    #[test]
    fn test_default_is_tournament_3() {
        assert_eq!(Selection::default(), Selection::Tournament(3));
    }
}
