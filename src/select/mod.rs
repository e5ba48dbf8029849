//! Selection strategies.
//!
//! Selection is split into two capabilities:
//!
//! - [`SelectOne`]: picks one individual (by index) from a population.
//!   [`setup`](SelectOne::setup) is called once per batch, so that wheels,
//!   sorted orders and cumulative worths are built once and each draw is
//!   cheap.
//! - [`Select`]: picks a whole batch of individuals. [`SelectMany`] and
//!   [`TruncSelect`] delegate to a `SelectOne` and a [`HowMany`] count
//!   policy; [`DetSelect`] keeps the best `m` deterministically.
//!
//! All strategies compare fitness with `>` (greater is better), so the same
//! code serves minimization and maximization.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"
//! - Baker (1985), "Adaptive Selection Methods for Genetic Algorithms"

mod many;
mod one;
mod selection;
mod worth;

pub use many::{DetSelect, SelectMany, TruncSelect};
pub use one::{
    BestSelect, DetTournamentSelect, RandomSelect, SequentialSelect, StochTournamentSelect,
    TruncatedSelectOne,
};
pub use selection::Selection;
pub use worth::{
    FitnessScalingSelect, LinearScaling, Perf2Worth, ProportionalSelect, RankingSelect, Ranking,
    RawWorth, RouletteWorthSelect, Sharing, SharingSelect,
};

use crate::core::{Individual, Population};
use crate::error::{EvoError, Result};
use crate::random::RandomSource;

/// Chooses one individual from a population.
pub trait SelectOne<I: Individual> {
    /// Prepares per-batch state (wheels, orderings).
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] on an empty population.
    fn setup(&mut self, pop: &[I]) -> Result<()> {
        ensure_not_empty(pop)
    }

    /// Returns the index of the chosen individual.
    ///
    /// # Panics
    /// May panic if `pop` is empty or differs from the population given to
    /// the last [`setup`](SelectOne::setup).
    fn select(&mut self, pop: &[I], rng: &mut RandomSource) -> usize;
}

impl<I: Individual, S: SelectOne<I> + ?Sized> SelectOne<I> for Box<S> {
    fn setup(&mut self, pop: &[I]) -> Result<()> {
        (**self).setup(pop)
    }

    fn select(&mut self, pop: &[I], rng: &mut RandomSource) -> usize {
        (**self).select(pop, rng)
    }
}

/// Chooses a batch of individuals from a population.
pub trait Select<I: Individual> {
    /// Returns the selected individuals (clones).
    fn select(&mut self, pop: &[I], rng: &mut RandomSource) -> Result<Population<I>>;
}

/// Number of individuals a batch operator should produce.
///
/// # Examples
///
/// ```
/// use u_evolve::select::HowMany;
///
/// assert_eq!(HowMany::Rate(0.5).count(10), 5);
/// assert_eq!(HowMany::Absolute(3).count(100), 3);
/// assert_eq!(HowMany::Absolute(30).clamped(10), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HowMany {
    /// A fraction of the source population size (floored).
    Rate(f64),
    /// A fixed count.
    Absolute(usize),
}

impl Default for HowMany {
    fn default() -> Self {
        HowMany::Rate(1.0)
    }
}

impl HowMany {
    /// Count for a source population of size `n`, not clamped.
    ///
    /// Negative or non-finite rates count as zero.
    pub fn count(&self, n: usize) -> usize {
        match *self {
            HowMany::Rate(r) if r.is_finite() && r > 0.0 => (r * n as f64).floor() as usize,
            HowMany::Rate(_) => 0,
            HowMany::Absolute(k) => k,
        }
    }

    /// Count for a source population of size `n`, at most `n`.
    pub fn clamped(&self, n: usize) -> usize {
        self.count(n).min(n)
    }
}

pub(crate) fn ensure_not_empty<I>(pop: &[I]) -> Result<()> {
    if pop.is_empty() {
        Err(EvoError::contract("cannot select from empty population"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_how_many_rate() {
        assert_eq!(HowMany::Rate(0.5).count(10), 5);
        assert_eq!(HowMany::Rate(0.55).count(10), 5);
        assert_eq!(HowMany::Rate(2.0).count(10), 20);
        assert_eq!(HowMany::Rate(2.0).clamped(10), 10);
        assert_eq!(HowMany::Rate(-1.0).count(10), 0);
        assert_eq!(HowMany::Rate(f64::NAN).count(10), 0);
    }

    #[test]
    fn test_how_many_absolute() {
        assert_eq!(HowMany::Absolute(3).count(10), 3);
        assert_eq!(HowMany::Absolute(3).clamped(2), 2);
    }

    proptest! {
        #[test]
        fn prop_clamped_never_exceeds_population(
            rate in 0.0f64..3.0,
            k in 0usize..200,
            n in 0usize..200,
        ) {
            prop_assert!(HowMany::Rate(rate).clamped(n) <= n);
            prop_assert_eq!(HowMany::Absolute(k).clamped(n), k.min(n));
        }
    }
}
