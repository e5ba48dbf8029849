//! Problem definition for the one-call runner.

use crate::core::{Candidate, Fitness};
use crate::random::RandomSource;

/// Defines an optimization problem for [`EaRunner`](super::EaRunner).
///
/// This is the main trait that users implement to plug their domain-specific
/// logic into the ready-made algorithm. It covers:
///
/// 1. **Initialization**: How to create random genomes
/// 2. **Evaluation**: How to compute the objective value
/// 3. **Crossover**: How to recombine two genomes
/// 4. **Mutation**: How to perturb a genome
///
/// The direction of optimization is carried by the `Fitness` type
/// ([`Minimizing`](crate::core::Minimizing) or
/// [`Maximizing`](crate::core::Maximizing)).
///
/// # Thread Safety
///
/// `EaProblem` must be `Send + Sync` because the runner may evaluate
/// genomes in parallel.
pub trait EaProblem: Send + Sync {
    /// The solution representation.
    type Genome: Clone + Send + Sync + 'static;

    /// The fitness type, which fixes the optimization direction.
    type Fitness: Fitness;

    /// Creates a random genome.
    fn create_genome(&self, rng: &mut RandomSource) -> Self::Genome;

    /// Objective value of a genome.
    ///
    /// This is typically the most expensive operation and may be called
    /// in parallel across the population.
    fn evaluate(&self, genome: &Self::Genome) -> f64;

    /// Recombines two genomes in place; returns `true` if either changed.
    ///
    /// The default implementation leaves both untouched.
    fn crossover(
        &self,
        _a: &mut Self::Genome,
        _b: &mut Self::Genome,
        _rng: &mut RandomSource,
    ) -> bool {
        false
    }

    /// Mutates a genome in place; returns `true` if it changed.
    ///
    /// The default implementation is a no-op.
    fn mutate(&self, _genome: &mut Self::Genome, _rng: &mut RandomSource) -> bool {
        false
    }

    /// Called at the end of each generation with the best fitness so far.
    ///
    /// The default implementation is a no-op.
    fn on_generation(&self, _generation: usize, _best_fitness: Self::Fitness) {}
}

/// The individual type the runner evolves for problem `P`.
pub type EaIndividual<P> = Candidate<<P as EaProblem>::Genome, <P as EaProblem>::Fitness>;
