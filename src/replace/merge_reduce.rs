//! Merge-then-reduce replacement and the ES/EP presets built from it.

use super::Replacement;
use crate::core::{Individual, Population};
use crate::error::{EvoError, Result};
use crate::random::RandomSource;
use crate::select::HowMany;

/// Moves parents into the offspring pool before reduction.
pub trait Merge<I: Individual> {
    /// Adds (some of) `parents` to `offspring`.
    fn merge(&self, parents: &Population<I>, offspring: &mut Population<I>);
}

/// Shrinks a population to a target size.
pub trait Reduce<I: Individual> {
    /// Reduces `pop` to exactly `size` individuals.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] if `pop` has fewer than `size`.
    fn reduce(&mut self, pop: &mut Population<I>, size: usize, rng: &mut RandomSource)
        -> Result<()>;
}

/// Every parent joins the offspring.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plus;

impl<I: Individual> Merge<I> for Plus {
    fn merge(&self, parents: &Population<I>, offspring: &mut Population<I>) {
        offspring.extend(parents.iter().cloned());
    }
}

/// The best parents join the offspring.
///
/// The count is clamped to the number of parents.
#[derive(Debug, Clone, Copy)]
pub struct Elitism(pub HowMany);

impl<I: Individual> Merge<I> for Elitism {
    fn merge(&self, parents: &Population<I>, offspring: &mut Population<I>) {
        let k = self.0.clamped(parents.len());
        offspring.extend(
            parents
                .top_indices(k)
                .into_iter()
                .map(|i| parents[i].clone()),
        );
    }
}

/// No parent survives.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoElitism;

impl<I: Individual> Merge<I> for NoElitism {
    fn merge(&self, _parents: &Population<I>, _offspring: &mut Population<I>) {}
}

fn check_shrink(from: usize, to: usize) -> Result<()> {
    if from < to {
        return Err(EvoError::contract(format!(
            "cannot reduce {from} individuals to {to}"
        )));
    }
    Ok(())
}

/// Keeps the `size` best.
#[derive(Debug, Clone, Copy, Default)]
pub struct Truncate;

impl<I: Individual> Reduce<I> for Truncate {
    fn reduce(
        &mut self,
        pop: &mut Population<I>,
        size: usize,
        _rng: &mut RandomSource,
    ) -> Result<()> {
        check_shrink(pop.len(), size)?;
        pop.sort();
        pop.truncate(size);
        Ok(())
    }
}

/// Keeps `size` individuals chosen uniformly at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomReduce;

impl<I: Individual> Reduce<I> for RandomReduce {
    fn reduce(
        &mut self,
        pop: &mut Population<I>,
        size: usize,
        rng: &mut RandomSource,
    ) -> Result<()> {
        check_shrink(pop.len(), size)?;
        pop.shuffle(rng);
        pop.truncate(size);
        Ok(())
    }
}

/// Evolutionary-programming tournament reduction.
///
/// Each individual meets `tournament` random opponents (drawn with
/// replacement from the whole pool) and scores 1 per win and 0.5 per tie.
/// The `size` highest scores survive; equal scores fall back to fitness.
#[derive(Debug, Clone, Copy)]
pub struct EpReduce {
    tournament: usize,
}

impl EpReduce {
    /// Creates the reduction. Tournament sizes below 2 are raised to 2.
    pub fn new(tournament: usize) -> Self {
        if tournament < 2 {
            tracing::warn!(tournament, "EP tournament size must be at least 2, using 2");
        }
        Self {
            tournament: tournament.max(2),
        }
    }

    /// Opponents per individual.
    pub fn tournament(&self) -> usize {
        self.tournament
    }
}

impl<I: Individual> Reduce<I> for EpReduce {
    fn reduce(
        &mut self,
        pop: &mut Population<I>,
        size: usize,
        rng: &mut RandomSource,
    ) -> Result<()> {
        let n = pop.len();
        check_shrink(n, size)?;
        if n == size {
            return Ok(());
        }

        let scores: Vec<f64> = pop
            .iter()
            .map(|ind| {
                let fit = ind.fitness();
                (0..self.tournament)
                    .map(|_| {
                        let other = pop[rng.integer(n)].fitness();
                        if fit > other {
                            1.0
                        } else if fit == other {
                            0.5
                        } else {
                            0.0
                        }
                    })
                    .sum::<f64>()
            })
            .collect();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .total_cmp(&scores[a])
                .then_with(|| pop[b].fitness().cmp(&pop[a].fitness()))
        });
        order.truncate(size);

        let survivors: Population<I> = order.into_iter().map(|i| pop[i].clone()).collect();
        *pop = survivors;
        Ok(())
    }
}

/// Merges parents into the offspring, then reduces back to the parent count.
#[derive(Debug, Clone)]
pub struct MergeReduce<M, R> {
    merge: M,
    reduce: R,
}

impl<M, R> MergeReduce<M, R> {
    /// Composes a merge and a reduction.
    pub fn new(merge: M, reduce: R) -> Self {
        Self { merge, reduce }
    }

    /// The merge step.
    pub fn merging(&self) -> &M {
        &self.merge
    }

    /// The reduction step.
    pub fn reduction(&self) -> &R {
        &self.reduce
    }
}

impl<I, M, R> Replacement<I> for MergeReduce<M, R>
where
    I: Individual,
    M: Merge<I>,
    R: Reduce<I>,
{
    fn replace(
        &mut self,
        parents: &mut Population<I>,
        mut offspring: Population<I>,
        rng: &mut RandomSource,
    ) -> Result<()> {
        self.merge.merge(parents, &mut offspring);
        self.reduce.reduce(&mut offspring, parents.len(), rng)?;
        *parents = offspring;
        Ok(())
    }
}

/// (mu + lambda): best of parents and offspring.
pub type PlusReplacement = MergeReduce<Plus, Truncate>;

/// (mu, lambda): best of the offspring only.
pub type CommaReplacement = MergeReduce<NoElitism, Truncate>;

/// Parents and offspring reduced by EP tournament.
pub type EpReplacement = MergeReduce<Plus, EpReduce>;

impl PlusReplacement {
    /// (mu + lambda) replacement.
    pub fn plus() -> Self {
        Self::new(Plus, Truncate)
    }
}

impl CommaReplacement {
    /// (mu, lambda) replacement.
    pub fn comma() -> Self {
        Self::new(NoElitism, Truncate)
    }
}

impl EpReplacement {
    /// EP replacement with the given tournament size.
    pub fn ep(tournament: usize) -> Self {
        Self::new(Plus, EpReduce::new(tournament))
    }
}
