//! Survivor selection.
//!
//! A [`Replacement`] builds the next generation from the current parents
//! and their (evaluated) offspring, writing the result into `parents`.
//! Every individual handed to a replacement must be valid.
//!
//! | Strategy | Result |
//! |----------|--------|
//! | [`GenerationalReplacement`] | offspring, same size required |
//! | [`WeakElitistReplacement`] | inner strategy, old champion re-inserted if lost |
//! | [`PlusReplacement`] | best of parents + offspring |
//! | [`CommaReplacement`] | best of offspring |
//! | [`EpReplacement`] | EP tournament over parents + offspring |
//! | [`SsgaWorseReplacement`] | each offspring evicts the worst parent if better |

mod merge_reduce;

pub use merge_reduce::{
    CommaReplacement, Elitism, EpReduce, EpReplacement, Merge, MergeReduce, NoElitism, Plus,
    PlusReplacement, RandomReduce, Reduce, Truncate,
};

use crate::core::{Individual, Population};
use crate::error::{EvoError, Result};
use crate::random::RandomSource;

/// Builds the next generation in place.
pub trait Replacement<I: Individual> {
    /// Replaces `parents` with the survivors of `parents` and `offspring`.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] when the strategy cannot produce a
    /// population of the required size.
    fn replace(
        &mut self,
        parents: &mut Population<I>,
        offspring: Population<I>,
        rng: &mut RandomSource,
    ) -> Result<()>;
}

impl<I: Individual, R: Replacement<I> + ?Sized> Replacement<I> for Box<R> {
    fn replace(
        &mut self,
        parents: &mut Population<I>,
        offspring: Population<I>,
        rng: &mut RandomSource,
    ) -> Result<()> {
        (**self).replace(parents, offspring, rng)
    }
}

/// Offspring become the new parents.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationalReplacement;

impl<I: Individual> Replacement<I> for GenerationalReplacement {
    fn replace(
        &mut self,
        parents: &mut Population<I>,
        offspring: Population<I>,
        _rng: &mut RandomSource,
    ) -> Result<()> {
        if offspring.len() != parents.len() {
            return Err(EvoError::contract(format!(
                "generational replacement needs {} offspring, got {}",
                parents.len(),
                offspring.len()
            )));
        }
        *parents = offspring;
        Ok(())
    }
}

/// Adds weak elitism to another replacement.
///
/// If the best individual after the inner replacement is worse than the
/// previous champion, the champion overwrites the new worst individual.
#[derive(Debug, Clone)]
pub struct WeakElitistReplacement<R> {
    inner: R,
}

impl<R> WeakElitistReplacement<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// The wrapped replacement.
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<I: Individual, R: Replacement<I>> Replacement<I> for WeakElitistReplacement<R> {
    fn replace(
        &mut self,
        parents: &mut Population<I>,
        offspring: Population<I>,
        rng: &mut RandomSource,
    ) -> Result<()> {
        let champion = parents.best().cloned();
        self.inner.replace(parents, offspring, rng)?;

        let Some(champion) = champion else {
            return Ok(());
        };
        let lost = parents
            .best()
            .is_some_and(|best| best.fitness() < champion.fitness());
        if lost {
            if let Some(w) = parents.worst_index() {
                parents[w] = champion;
            }
        }
        Ok(())
    }
}

/// Steady-state replacement.
///
/// Offspring are inserted one at a time: each replaces the current worst
/// parent if it is strictly better, otherwise it is discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct SsgaWorseReplacement;

impl<I: Individual> Replacement<I> for SsgaWorseReplacement {
    fn replace(
        &mut self,
        parents: &mut Population<I>,
        offspring: Population<I>,
        _rng: &mut RandomSource,
    ) -> Result<()> {
        if parents.is_empty() {
            if offspring.is_empty() {
                return Ok(());
            }
            return Err(EvoError::contract(
                "steady-state replacement into an empty population",
            ));
        }
        for child in offspring {
            if let Some(w) = parents.worst_index() {
                if child.fitness() > parents[w].fitness() {
                    parents[w] = child;
                }
            }
        }
        Ok(())
    }
}
