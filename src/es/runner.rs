//! One-call CMA-ES runner.

use super::config::CmaConfig;
use crate::continuation::{
    CancelContinue, CancellationToken, CombinedContinue, FitContinue, GenContinue,
};
use crate::core::{Candidate, Fitness, Maximizing, Minimizing, Population};
use crate::distribution::{CmaBreed, CmaParams, CmaState};
use crate::ea::{EaResult, EasyEa, Termination};
use crate::eval::{Objective, PopEvaluator};
use crate::random::create_rng;
use crate::replace::GenerationalReplacement;
use std::time::Duration;
use tracing::instrument;

/// Result of a CMA-ES run.
pub type CmaResult<F> = EaResult<Candidate<Vec<f64>, F>>;

/// Executes CMA-ES from an initial mean.
///
/// The loop is an [`EasyEa`] whose breeder is a [`CmaBreed`]: every
/// generation the distribution is re-estimated from the `lambda` samples of
/// the previous one and `lambda` new samples replace them.
///
/// # Usage
///
/// ```
/// use u_evolve::core::Fitness;
/// use u_evolve::es::{CmaConfig, CmaRunner};
///
/// let sphere = |x: &Vec<f64>| x.iter().map(|v| v * v).sum::<f64>();
/// let config = CmaConfig::default().with_max_generations(100).with_seed(1);
/// let result = CmaRunner::minimize(sphere, &[2.0, -1.0, 0.5], &config);
/// assert!(result.best_fitness.value() < 1e-6);
/// ```
pub struct CmaRunner;

impl CmaRunner {
    /// Minimizes `objective`.
    ///
    /// # Panics
    /// Panics if the configuration is invalid or `initial_mean` is empty.
    pub fn minimize<O: Objective<Vec<f64>>>(
        objective: O,
        initial_mean: &[f64],
        config: &CmaConfig,
    ) -> CmaResult<Minimizing> {
        Self::run(objective, initial_mean, config, None)
    }

    /// Maximizes `objective`.
    ///
    /// # Panics
    /// Panics if the configuration is invalid or `initial_mean` is empty.
    pub fn maximize<O: Objective<Vec<f64>>>(
        objective: O,
        initial_mean: &[f64],
        config: &CmaConfig,
    ) -> CmaResult<Maximizing> {
        Self::run(objective, initial_mean, config, None)
    }

    /// Runs CMA-ES with the fitness direction `F` and an optional
    /// cancellation token.
    ///
    /// # Panics
    /// Panics if the configuration is invalid or `initial_mean` is empty.
    #[instrument(level = "debug", skip_all, fields(dimension = initial_mean.len()))]
    pub fn run<F: Fitness, O: Objective<Vec<f64>>>(
        objective: O,
        initial_mean: &[f64],
        config: &CmaConfig,
        cancel: Option<CancellationToken>,
    ) -> CmaResult<F> {
        config.validate().expect("invalid CmaConfig");

        let mut rng = match config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };

        let lambda = config.lambda_for(initial_mean.len());
        let params =
            CmaParams::new(initial_mean.len(), lambda).expect("initial mean must not be empty");
        let state = CmaState::new(params, initial_mean.to_vec(), config.sigma)
            .expect("sigma checked by validate");
        let population: Population<Candidate<Vec<f64>, F>> = (0..lambda)
            .map(|_| Candidate::new(state.sample(&mut rng)))
            .collect();
        let breed = CmaBreed::new(state, lambda).with_eigen_max_age(config.eigen_max_age);

        let mut evaluator = PopEvaluator::new(objective).with_parallel(config.parallel);
        if let Some(max) = config.max_evaluations {
            evaluator = evaluator.with_max_evaluations(max);
        }
        if let Some(ms) = config.time_limit_ms {
            evaluator = evaluator.with_time_limit(Duration::from_millis(ms));
        }

        let mut criteria: CombinedContinue<Candidate<Vec<f64>, F>> =
            CombinedContinue::new(GenContinue::new(config.max_generations as u64));
        if let Some(target) = config.target_fitness {
            criteria.add(FitContinue::new(F::from_value(target)));
        }
        if let Some(token) = cancel.clone() {
            criteria.add(CancelContinue::new(token));
        }

        let mut ea = EasyEa::new(evaluator, breed, GenerationalReplacement, criteria);
        let mut result = ea
            .run(population, &mut rng)
            .expect("validated budget admits at least one evaluation");

        tracing::debug!(
            sigma = ea.breeder().state().sigma(),
            generations = result.generations,
            "CMA-ES finished"
        );
        if result.termination == Termination::Criterion
            && cancel.as_ref().is_some_and(|t| t.is_cancelled())
        {
            result.termination = Termination::Cancelled;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Budget;

    fn sphere(x: &Vec<f64>) -> f64 {
        x.iter().map(|v| v * v).sum()
    }

    fn ellipsoid(x: &Vec<f64>) -> f64 {
        x.iter()
            .enumerate()
            .map(|(i, v)| 10f64.powi(i as i32) * v * v)
            .sum()
    }

    fn rosenbrock(x: &Vec<f64>) -> f64 {
        x.windows(2)
            .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (1.0 - w[0]).powi(2))
            .sum()
    }

    #[test]
    fn test_sphere() {
        let config = CmaConfig::default().with_max_generations(300).with_seed(42);
        let result = CmaRunner::minimize(sphere, &[3.0; 5], &config);
        assert!(result.best_fitness.value() < 1e-10, "best {}", result.best_fitness.value());
        assert_eq!(result.population.len(), config.lambda_for(5));
    }

    #[test]
    fn test_ill_conditioned() {
        let config = CmaConfig::default()
            .with_max_generations(600)
            .with_eigen_max_age(1)
            .with_seed(7);
        let result = CmaRunner::minimize(ellipsoid, &[1.0; 4], &config);
        assert!(result.best_fitness.value() < 1e-6, "best {}", result.best_fitness.value());
    }

    #[test]
    fn test_rosenbrock_progress() {
        let config = CmaConfig::default()
            .with_sigma(0.5)
            .with_max_generations(1000)
            .with_seed(3);
        let start = vec![0.0; 3];
        let result = CmaRunner::minimize(rosenbrock, &start, &config);
        assert!(result.best_fitness.value() < rosenbrock(&start));
    }

    #[test]
    fn test_maximize() {
        let bump = |x: &Vec<f64>| -(x[0] - 1.0).powi(2) - (x[1] + 2.0).powi(2);
        let config = CmaConfig::default().with_max_generations(200).with_seed(5);
        let result = CmaRunner::maximize(bump, &[0.0, 0.0], &config);
        assert!(result.best_fitness.value() > -1e-8);
        assert!((result.best.genes()[0] - 1.0).abs() < 1e-3);
        assert!((result.best.genes()[1] + 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_target_fitness_stops_early() {
        let config = CmaConfig::default()
            .with_max_generations(1000)
            .with_target_fitness(1e-3)
            .with_seed(1);
        let result = CmaRunner::minimize(sphere, &[1.0; 3], &config);
        assert_eq!(result.termination, Termination::Criterion);
        assert!(result.generations < 1000);
        assert!(result.best_fitness.value() <= 1e-3);
    }

    #[test]
    fn test_evaluation_budget() {
        let config = CmaConfig::default()
            .with_lambda(6)
            .with_max_evaluations(100)
            .with_seed(1);
        let result = CmaRunner::minimize(sphere, &[1.0; 3], &config);
        assert_eq!(result.termination, Termination::Budget(Budget::Evaluations(100)));
        assert_eq!(result.evaluations, 100);
        assert_eq!(result.population.invalid_count(), 0);
    }

    #[test]
    fn test_budget_below_lambda() {
        let config = CmaConfig::default().with_max_evaluations(3).with_seed(1);
        assert!(config.lambda_for(2) > 3);
        let result = CmaRunner::minimize(sphere, &[1.0, 2.0], &config);
        assert_eq!(result.termination, Termination::Budget(Budget::Evaluations(3)));
        assert_eq!(result.generations, 0);
        assert_eq!(result.evaluations, 3);
        assert_eq!(result.population.len(), 3);
        assert_eq!(result.best_fitness.value(), sphere(result.best.genes()));
    }

    #[test]
    fn test_small_populations_stay_finite() {
        for lambda in 2..=4 {
            let config = CmaConfig::default()
                .with_lambda(lambda)
                .with_max_generations(200)
                .with_eigen_max_age(1)
                .with_seed(lambda as u64);
            let result = CmaRunner::minimize(sphere, &[1.0, -1.0], &config);
            assert_eq!(result.population.len(), lambda);
            assert!(result.best_fitness.value().is_finite());
            assert!(result
                .population
                .iter()
                .all(|c| c.genes().iter().all(|v| v.is_finite())));
        }
    }

    #[test]
    fn test_flat_objective_survives() {
        let flat = |_: &Vec<f64>| 0.0;
        let config = CmaConfig::default().with_max_generations(30).with_seed(2);
        let result = CmaRunner::minimize(flat, &[0.0; 2], &config);
        assert_eq!(result.generations, 30);
        assert_eq!(result.termination, Termination::Criterion);
    }

    #[test]
    fn test_reproducible() {
        let config = CmaConfig::default().with_max_generations(50).with_seed(9);
        let a = CmaRunner::minimize(sphere, &[2.0; 3], &config);
        let b = CmaRunner::minimize(sphere, &[2.0; 3], &config);
        assert_eq!(a.fitness_history, b.fitness_history);
        assert_eq!(a.best, b.best);
    }

    #[test]
    fn test_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let config = CmaConfig::default().with_seed(1);
        let result = CmaRunner::run::<Minimizing, _>(sphere, &[1.0], &config, Some(token));
        assert_eq!(result.termination, Termination::Cancelled);
        assert_eq!(result.generations, 1);
    }

    #[test]
    #[should_panic(expected = "initial mean must not be empty")]
    fn test_empty_mean() {
        let _ = CmaRunner::minimize(sphere, &[], &CmaConfig::default());
    }
}
