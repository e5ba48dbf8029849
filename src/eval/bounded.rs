//! Population evaluator with evaluation and time budgets.

use super::{Objective, PopEval};
use crate::core::{Fitness, Individual};
use crate::error::{Budget, EvoError, Result};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared evaluation counter.
///
/// Cloning yields a handle on the same count, so a continuation criterion
/// can watch the number of evaluations performed by a [`PopEvaluator`].
#[derive(Debug, Clone, Default)]
pub struct EvalCounter(Arc<AtomicU64>);

impl EvalCounter {
    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of evaluations.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }
}

/// Evaluates invalid individuals, counting calls and enforcing budgets.
///
/// # Budgets
///
/// - `max_evaluations`: the objective is never called more than this many
///   times. When a batch would overshoot, the evaluator evaluates as many
///   individuals as the budget allows and returns
///   [`EvoError::BudgetExceeded`].
/// - `time_limit`: checked before each batch; the clock starts at the first
///   call to [`eval`](PopEval::eval).
///
/// # Examples
///
/// ```
/// use u_evolve::core::{Candidate, Individual, Minimizing, Population};
/// use u_evolve::eval::{PopEval, PopEvaluator};
///
/// let mut eval = PopEvaluator::new(|x: &Vec<f64>| x.iter().map(|v| v * v).sum::<f64>())
///     .with_max_evaluations(1000);
/// let mut pop: Population<Candidate<Vec<f64>, Minimizing>> =
///     vec![Candidate::new(vec![1.0, 2.0])].into();
/// eval.eval(&mut pop).unwrap();
/// assert_eq!(pop[0].fitness(), Minimizing(5.0));
/// ```
pub struct PopEvaluator<O> {
    objective: O,
    parallel: bool,
    counter: EvalCounter,
    max_evaluations: Option<u64>,
    time_limit: Option<Duration>,
    started: Option<Instant>,
}

impl<O> PopEvaluator<O> {
    /// Wraps an objective. Sequential, unbounded.
    pub fn new(objective: O) -> Self {
        Self {
            objective,
            parallel: false,
            counter: EvalCounter::new(),
            max_evaluations: None,
            time_limit: None,
            started: None,
        }
    }

    /// Enables or disables parallel evaluation.
    ///
    /// Has an effect only when the crate is built with the `parallel`
    /// feature; otherwise evaluation stays sequential.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Caps the number of objective calls.
    pub fn with_max_evaluations(mut self, n: u64) -> Self {
        self.max_evaluations = Some(n);
        self
    }

    /// Caps the wall-clock time spent evaluating.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Shares an existing counter (e.g. across restarts).
    pub fn with_counter(mut self, counter: EvalCounter) -> Self {
        self.counter = counter;
        self
    }

    /// A handle on this evaluator's counter.
    pub fn counter(&self) -> EvalCounter {
        self.counter.clone()
    }

    /// The wrapped objective.
    pub fn objective(&self) -> &O {
        &self.objective
    }
}

impl<I, O> PopEval<I> for PopEvaluator<O>
where
    I: Individual,
    O: Objective<I::Genome>,
{
    fn eval(&mut self, pop: &mut [I]) -> Result<()> {
        let started = *self.started.get_or_insert_with(Instant::now);
        if let Some(limit) = self.time_limit {
            if started.elapsed() >= limit {
                return Err(EvoError::BudgetExceeded(Budget::Time(limit)));
            }
        }

        let mut pending: Vec<&mut I> = pop.iter_mut().filter(|ind| !ind.is_valid()).collect();

        let mut exceeded = None;
        if let Some(max) = self.max_evaluations {
            let remaining = max.saturating_sub(self.counter.get());
            if pending.len() as u64 > remaining {
                pending.truncate(remaining as usize);
                exceeded = Some(Budget::Evaluations(max));
            }
        }

        evaluate_all(&self.objective, &mut pending, self.parallel);
        self.counter.add(pending.len() as u64);

        match exceeded {
            Some(budget) => Err(EvoError::BudgetExceeded(budget)),
            None => Ok(()),
        }
    }

    fn evaluations(&self) -> u64 {
        self.counter.get()
    }
}

fn evaluate_one<I, O>(objective: &O, ind: &mut I)
where
    I: Individual,
    O: Objective<I::Genome>,
{
    let value = objective.evaluate(ind.genome());
    ind.set_fitness(I::Fitness::from_value(value));
}

#[cfg(feature = "parallel")]
fn evaluate_all<I, O>(objective: &O, pending: &mut [&mut I], parallel: bool)
where
    I: Individual,
    O: Objective<I::Genome>,
{
    if parallel {
        pending
            .par_iter_mut()
            .for_each(|ind| evaluate_one(objective, &mut **ind));
    } else {
        for ind in pending.iter_mut() {
            evaluate_one(objective, &mut **ind);
        }
    }
}

#[cfg(not(feature = "parallel"))]
fn evaluate_all<I, O>(objective: &O, pending: &mut [&mut I], _parallel: bool)
where
    I: Individual,
    O: Objective<I::Genome>,
{
    for ind in pending.iter_mut() {
        evaluate_one(objective, &mut **ind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Candidate, Minimizing, Population};

    type Ind = Candidate<Vec<f64>, Minimizing>;

    fn sphere(x: &Vec<f64>) -> f64 {
        x.iter().map(|v| v * v).sum()
    }

    fn invalid_pop(n: usize) -> Population<Ind> {
        (0..n).map(|i| Candidate::new(vec![i as f64])).collect()
    }

    #[test]
    fn test_evaluates_only_invalid() {
        let mut eval = PopEvaluator::new(sphere);
        let mut pop = invalid_pop(3);
        pop.push(Candidate::with_fitness(vec![10.0], Minimizing(-1.0)));

        eval.eval(&mut pop).unwrap();

        assert_eq!(PopEval::<Ind>::evaluations(&eval), 3);
        assert_eq!(pop[2].fitness(), Minimizing(4.0));
        // Pre-valid fitness is untouched.
        assert_eq!(pop[3].fitness(), Minimizing(-1.0));

        eval.eval(&mut pop).unwrap();
        assert_eq!(PopEval::<Ind>::evaluations(&eval), 3);
    }

    #[test]
    fn test_evaluation_budget() {
        let mut eval = PopEvaluator::new(sphere).with_max_evaluations(5);
        let mut pop = invalid_pop(3);
        eval.eval(&mut pop).unwrap();

        let mut more = invalid_pop(3);
        let err = eval.eval(&mut more).unwrap_err();
        assert_eq!(err, EvoError::BudgetExceeded(Budget::Evaluations(5)));
        assert_eq!(eval.counter().get(), 5);
        assert_eq!(more.invalid_count(), 1);
    }

    #[test]
    fn test_time_budget() {
        let mut eval = PopEvaluator::new(sphere).with_time_limit(Duration::from_millis(0));
        let mut pop = invalid_pop(2);
        let err = eval.eval(&mut pop).unwrap_err();
        assert!(err.is_budget_exceeded());
    }

    #[test]
    fn test_shared_counter() {
        let counter = EvalCounter::new();
        let mut eval = PopEvaluator::new(sphere).with_counter(counter.clone());
        let mut pop = invalid_pop(4);
        eval.eval(&mut pop).unwrap();
        assert_eq!(counter.get(), 4);
    }

    #[test]
    fn test_parallel_flag_gives_same_fitness() {
        let mut seq = invalid_pop(50);
        let mut par = invalid_pop(50);
        PopEvaluator::new(sphere).eval(&mut seq).unwrap();
        PopEvaluator::new(sphere)
            .with_parallel(true)
            .eval(&mut par)
            .unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_eval_one() {
        let mut eval = PopEvaluator::new(sphere);
        let mut ind: Ind = Candidate::new(vec![3.0]);
        eval.eval_one(&mut ind).unwrap();
        assert_eq!(ind.fitness(), Minimizing(9.0));
    }
}
