//! Primitive stopping criteria.

use super::{CancellationToken, Continue};
use crate::core::{Fitness, Individual};
use crate::eval::EvalCounter;
use std::time::{Duration, Instant};

/// Stops after a fixed number of generations.
///
/// Each call counts one generation; the call that reaches `max` returns
/// `false`.
#[derive(Debug, Clone)]
pub struct GenContinue {
    max: u64,
    current: u64,
}

impl GenContinue {
    /// Creates a limit of `max` generations.
    pub fn new(max: u64) -> Self {
        Self { max, current: 0 }
    }

    /// Generations counted so far.
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Restarts the count.
    pub fn reset(&mut self) {
        self.current = 0;
    }
}

impl<I: Individual> Continue<I> for GenContinue {
    fn proceed(&mut self, _pop: &[I]) -> bool {
        self.current += 1;
        if self.current >= self.max {
            tracing::info!(
                criterion = "GenContinue",
                generations = self.current,
                "generation limit reached"
            );
            return false;
        }
        true
    }
}

/// Stops once the best fitness reaches `target` (or better).
#[derive(Debug, Clone, Copy)]
pub struct FitContinue<F> {
    target: F,
}

impl<F: Fitness> FitContinue<F> {
    /// Creates a target-fitness criterion.
    pub fn new(target: F) -> Self {
        Self { target }
    }
}

impl<I: Individual> Continue<I> for FitContinue<I::Fitness> {
    fn proceed(&mut self, pop: &[I]) -> bool {
        let Some(best) = pop.iter().map(|ind| ind.fitness()).max() else {
            return true;
        };
        if best >= self.target {
            tracing::info!(
                criterion = "FitContinue",
                best = ?best,
                target = ?self.target,
                "target fitness reached"
            );
            return false;
        }
        true
    }
}

/// Stops once a wall-clock budget has elapsed.
///
/// The clock starts at the first call.
#[derive(Debug, Clone)]
pub struct SecondsElapsed {
    limit: Duration,
    start: Option<Instant>,
}

impl SecondsElapsed {
    /// Creates a time budget.
    pub fn new(limit: Duration) -> Self {
        Self { limit, start: None }
    }

    /// Time budget in seconds.
    pub fn from_secs_f64(secs: f64) -> Self {
        Self::new(Duration::from_secs_f64(secs.max(0.0)))
    }
}

impl<I: Individual> Continue<I> for SecondsElapsed {
    fn proceed(&mut self, _pop: &[I]) -> bool {
        let start = *self.start.get_or_insert_with(Instant::now);
        let elapsed = start.elapsed();
        if elapsed >= self.limit {
            tracing::info!(
                criterion = "SecondsElapsed",
                elapsed_ms = elapsed.as_millis() as u64,
                "time limit reached"
            );
            return false;
        }
        true
    }
}

/// Stops after `limit` generations without significant improvement.
///
/// A new best fitness resets the counter only when the relative improvement
/// `|old - new| / |old|` is at least `threshold` (any improvement counts
/// when `threshold` is 0, or when the old value is 0). A `limit` of 0
/// disables the criterion.
#[derive(Debug, Clone)]
pub struct StagnationContinue<F> {
    limit: usize,
    threshold: f64,
    best: Option<F>,
    counter: usize,
}

impl<F: Fitness> StagnationContinue<F> {
    /// Creates a stagnation criterion counting any improvement.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            threshold: 0.0,
            best: None,
            counter: 0,
        }
    }

    /// Sets the minimum relative improvement (negative values become 0).
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.max(0.0);
        self
    }

    /// Generations since the last significant improvement.
    pub fn stagnant_generations(&self) -> usize {
        self.counter
    }

    /// Whether the criterion has fired.
    pub fn is_stagnated(&self) -> bool {
        self.limit > 0 && self.counter >= self.limit
    }

    fn significant(&self, old: F, new: F) -> bool {
        if self.threshold == 0.0 {
            return true;
        }
        let (o, n) = (old.value(), new.value());
        if o == 0.0 || !o.is_finite() {
            return true;
        }
        (o - n).abs() / o.abs() >= self.threshold
    }
}

impl<I: Individual> Continue<I> for StagnationContinue<I::Fitness> {
    fn proceed(&mut self, pop: &[I]) -> bool {
        let Some(current) = pop.iter().map(|ind| ind.fitness()).max() else {
            return true;
        };
        match self.best {
            None => self.best = Some(current),
            Some(old) if current > old => {
                if self.significant(old, current) {
                    self.counter = 0;
                } else {
                    self.counter += 1;
                }
                self.best = Some(current);
            }
            Some(_) => self.counter += 1,
        }

        if self.is_stagnated() {
            tracing::info!(
                criterion = "StagnationContinue",
                generations = self.counter,
                "no significant improvement"
            );
            return false;
        }
        true
    }
}

/// Stops once an evaluation counter reaches `max`.
#[derive(Debug, Clone)]
pub struct EvalContinue {
    counter: EvalCounter,
    max: u64,
}

impl EvalContinue {
    /// Watches `counter` (usually [`PopEvaluator::counter`]).
    ///
    /// [`PopEvaluator::counter`]: crate::eval::PopEvaluator::counter
    pub fn new(counter: EvalCounter, max: u64) -> Self {
        Self { counter, max }
    }
}

impl<I: Individual> Continue<I> for EvalContinue {
    fn proceed(&mut self, _pop: &[I]) -> bool {
        let used = self.counter.get();
        if used >= self.max {
            tracing::info!(
                criterion = "EvalContinue",
                evaluations = used,
                "evaluation budget reached"
            );
            return false;
        }
        true
    }
}

/// Stops when a [`CancellationToken`] is set.
#[derive(Debug, Clone)]
pub struct CancelContinue {
    token: CancellationToken,
}

impl CancelContinue {
    /// Polls `token` once per generation.
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl<I: Individual> Continue<I> for CancelContinue {
    fn proceed(&mut self, _pop: &[I]) -> bool {
        if self.token.is_cancelled() {
            tracing::info!(criterion = "CancelContinue", "run cancelled");
            return false;
        }
        true
    }
}
