//! Breeders that sample offspring from an estimated distribution.

use super::{CmaState, Distribution};
use crate::core::{Candidate, Fitness, Individual, Population};
use crate::error::{EvoError, Result};
use crate::random::RandomSource;
use crate::select::{ensure_not_empty, HowMany, Select};
use crate::variation::Breed;

/// EDA breeder: select, estimate, sample.
///
/// 1. Select parents with `S`
/// 2. Rank them best first and [`estimate`](Distribution::estimate) `D`
/// 3. Draw `lambda.count(parents.len())` new candidates (all invalid)
///
/// A degenerate estimate is logged and sampling goes on from the previous
/// parameters.
pub struct SamplerBreed<D, S> {
    distribution: D,
    select: S,
    lambda: HowMany,
}

impl<D, S> SamplerBreed<D, S> {
    /// Creates the breeder.
    pub fn new(distribution: D, select: S, lambda: HowMany) -> Self {
        Self {
            distribution,
            select,
            lambda,
        }
    }

    /// The current distribution.
    pub fn distribution(&self) -> &D {
        &self.distribution
    }
}

impl<F, D, S> Breed<Candidate<Vec<f64>, F>> for SamplerBreed<D, S>
where
    F: Fitness,
    D: Distribution,
    S: Select<Candidate<Vec<f64>, F>>,
{
    fn breed(
        &mut self,
        parents: &[Candidate<Vec<f64>, F>],
        rng: &mut RandomSource,
    ) -> Result<Population<Candidate<Vec<f64>, F>>> {
        let mut selected = self.select.select(parents, rng)?;
        selected.sort();
        let ranked: Vec<&[f64]> = selected.iter().map(|c| c.genes().as_slice()).collect();
        match self.distribution.estimate(&ranked) {
            Ok(()) => {}
            Err(EvoError::NumericDegenerate(msg)) => {
                tracing::warn!(%msg, "degenerate estimate, keeping previous distribution");
            }
            Err(e) => return Err(e),
        }

        let lambda = self.lambda.count(parents.len());
        (0..lambda)
            .map(|_| self.distribution.sample(rng).map(Candidate::new))
            .collect()
    }
}

/// CMA-ES breeder.
///
/// Ranks every parent, re-estimates the [`CmaState`], refreshes its
/// eigensystem when older than `eigen_max_age` generations and draws
/// `lambda` invalid offspring. A degenerate eigendecomposition is logged
/// and sampling continues with the previous one.
#[derive(Debug, Clone)]
pub struct CmaBreed {
    state: CmaState,
    lambda: usize,
    eigen_max_age: usize,
}

impl CmaBreed {
    /// Default number of generations between eigendecompositions.
    pub const DEFAULT_EIGEN_MAX_AGE: usize = 10;

    /// Creates the breeder.
    pub fn new(state: CmaState, lambda: usize) -> Self {
        Self {
            state,
            lambda,
            eigen_max_age: Self::DEFAULT_EIGEN_MAX_AGE,
        }
    }

    /// Sets the eigensystem refresh period (0 and 1 both mean "every
    /// generation").
    pub fn with_eigen_max_age(mut self, age: usize) -> Self {
        self.eigen_max_age = age;
        self
    }

    /// The adapted distribution.
    pub fn state(&self) -> &CmaState {
        &self.state
    }

    /// Offspring per generation.
    pub fn lambda(&self) -> usize {
        self.lambda
    }
}

impl<F: Fitness> Breed<Candidate<Vec<f64>, F>> for CmaBreed {
    fn breed(
        &mut self,
        parents: &[Candidate<Vec<f64>, F>],
        rng: &mut RandomSource,
    ) -> Result<Population<Candidate<Vec<f64>, F>>> {
        ensure_not_empty(parents)?;
        let mut order: Vec<usize> = (0..parents.len()).collect();
        order.sort_by(|&a, &b| parents[b].fitness().cmp(&parents[a].fitness()));
        let ranked: Vec<&[f64]> = order
            .iter()
            .map(|&i| parents[i].genes().as_slice())
            .collect();
        let best = parents[order[0]].fitness().value();
        let worst = parents[order[order.len() - 1]].fitness().value();

        match self.state.reestimate(&ranked, best, worst) {
            Ok(()) => {}
            Err(EvoError::NumericDegenerate(msg)) => {
                tracing::warn!(
                    generation = self.state.generation(),
                    %msg,
                    "degenerate update, keeping previous distribution"
                );
            }
            Err(e) => return Err(e),
        }
        match self.state.update_eigen_system(self.eigen_max_age) {
            Ok(_) => {}
            Err(EvoError::NumericDegenerate(msg)) => {
                tracing::warn!(
                    generation = self.state.generation(),
                    %msg,
                    "no good eigensystem found, keeping previous one"
                );
            }
            Err(e) => return Err(e),
        }

        Ok((0..self.lambda)
            .map(|_| Candidate::new(self.state.sample(rng)))
            .collect())
    }
}
