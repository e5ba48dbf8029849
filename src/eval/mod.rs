//! Evaluation: the objective-function collaborator and budget bounding.
//!
//! The engine never computes fitness itself. It hands the genome of every
//! *invalid* individual to an [`Objective`] and stores the returned value.
//! [`PopEvaluator`] does this for a whole population, optionally in
//! parallel (cargo feature `parallel`), and can enforce an evaluation or
//! wall-clock budget by returning [`EvoError::BudgetExceeded`].
//!
//! [`EvoError::BudgetExceeded`]: crate::error::EvoError::BudgetExceeded

mod bounded;

pub use bounded::{EvalCounter, PopEvaluator};

/// [`PopEvaluator`] under the name used by the drivers' budget
/// documentation.
pub type BoundedEval<O> = PopEvaluator<O>;

use crate::core::Individual;
use crate::error::Result;

/// The user-supplied objective function.
///
/// Must be deterministic for a fixed genome: the engine relies on the
/// validity flag to skip re-evaluating unchanged individuals.
///
/// Any `Fn(&G) -> f64 + Send + Sync` closure is an objective.
pub trait Objective<G: ?Sized>: Send + Sync {
    /// Computes the raw objective value of `genome`.
    fn evaluate(&self, genome: &G) -> f64;
}

impl<G: ?Sized, T> Objective<G> for T
where
    T: Fn(&G) -> f64 + Send + Sync,
{
    fn evaluate(&self, genome: &G) -> f64 {
        self(genome)
    }
}

/// Per-individual apply contract over a population.
///
/// Implementations evaluate only invalid individuals. Each fitness write is
/// local to its individual, so an implementation is free to fan the calls
/// out to a thread pool.
pub trait PopEval<I: Individual> {
    /// Evaluates every invalid individual of `pop`.
    ///
    /// # Errors
    /// [`EvoError::BudgetExceeded`](crate::error::EvoError::BudgetExceeded)
    /// when a budget runs out. Individuals evaluated before the stop keep
    /// their fitness.
    fn eval(&mut self, pop: &mut [I]) -> Result<()>;

    /// Evaluates a single individual if it is invalid.
    fn eval_one(&mut self, individual: &mut I) -> Result<()> {
        self.eval(std::slice::from_mut(individual))
    }

    /// Number of objective calls performed so far.
    fn evaluations(&self) -> u64;
}
