//! Population transforms and the select-then-transform breeder.

use super::{Breed, MonOp, QuadOp, Transform};
use crate::core::{Individual, Population};
use crate::error::Result;
use crate::random::RandomSource;
use crate::select::Select;

/// Simple-GA transform.
///
/// 1. Consecutive pairs `(0, 1), (2, 3), ...` are crossed with
///    probability `p_cross` (an odd last individual is left alone).
/// 2. Every individual is then mutated with probability `p_mut`.
///
/// Individuals reported as changed are invalidated.
#[derive(Debug, Clone)]
pub struct SgaTransform<Q, M> {
    cross: Q,
    p_cross: f64,
    mutate: M,
    p_mut: f64,
}

impl<Q, M> SgaTransform<Q, M> {
    /// Creates the transform. Probabilities are clamped to `[0, 1]`.
    pub fn new(cross: Q, p_cross: f64, mutate: M, p_mut: f64) -> Self {
        Self {
            cross,
            p_cross: p_cross.clamp(0.0, 1.0),
            mutate,
            p_mut: p_mut.clamp(0.0, 1.0),
        }
    }

    /// Crossover probability.
    pub fn crossover_rate(&self) -> f64 {
        self.p_cross
    }

    /// Mutation probability.
    pub fn mutation_rate(&self) -> f64 {
        self.p_mut
    }
}

impl<I, Q, M> Transform<I> for SgaTransform<Q, M>
where
    I: Individual,
    Q: QuadOp<I>,
    M: MonOp<I>,
{
    fn transform(&mut self, pop: &mut Population<I>, rng: &mut RandomSource) -> Result<()> {
        for i in 0..pop.len() / 2 {
            if rng.flip(self.p_cross) {
                let (left, right) = pop.split_at_mut(2 * i + 1);
                let a = &mut left[2 * i];
                let b = &mut right[0];
                if self.cross.apply(a, b, rng) {
                    a.invalidate();
                    b.invalidate();
                }
            }
        }

        for ind in pop.iter_mut() {
            if rng.flip(self.p_mut) && self.mutate.apply(ind, rng) {
                ind.invalidate();
            }
        }
        Ok(())
    }
}

/// Breeder made of exactly one selection pass and one transform pass.
#[derive(Debug, Clone)]
pub struct SelectTransform<S, T> {
    select: S,
    transform: T,
}

impl<S, T> SelectTransform<S, T> {
    /// Creates the breeder.
    pub fn new(select: S, transform: T) -> Self {
        Self { select, transform }
    }
}

impl<I, S, T> Breed<I> for SelectTransform<S, T>
where
    I: Individual,
    S: Select<I>,
    T: Transform<I>,
{
    fn breed(&mut self, parents: &[I], rng: &mut RandomSource) -> Result<Population<I>> {
        let mut offspring = self.select.select(parents, rng)?;
        self.transform.transform(&mut offspring, rng)?;
        Ok(offspring)
    }
}
