//! One-call swarm runner over a box-bounded real domain.

use super::config::{PsoConfig, TopologyKind};
use super::driver::{EasyPso, PsoResult};
use super::topology::{RandomTopology, RingTopology, StarTopology, Topology};
use super::velocity::{InertiaSchedule, StandardFlight, StandardVelocity};
use super::Particle;
use crate::continuation::{
    CancelContinue, CancellationToken, CombinedContinue, Continue, GenContinue,
    StagnationContinue,
};
use crate::core::{Fitness, Maximizing, Minimizing, Population};
use crate::ea::Termination;
use crate::eval::{Objective, PopEvaluator};
use crate::random::create_rng;
use std::time::Duration;
use tracing::instrument;

/// Executes a particle swarm for an objective over `[low, high]` bounds.
///
/// # Usage
///
/// ```
/// use u_evolve::core::Fitness;
/// use u_evolve::pso::{PsoConfig, PsoRunner};
///
/// let sphere = |x: &Vec<f64>| x.iter().map(|v| v * v).sum::<f64>();
/// let config = PsoConfig::default().with_max_generations(50).with_seed(1);
/// let result = PsoRunner::minimize(sphere, &[(-5.0, 5.0); 3], &config);
/// assert!(result.best_fitness.value() < 1.0);
/// ```
pub struct PsoRunner;

impl PsoRunner {
    /// Minimizes `objective`.
    ///
    /// # Panics
    /// Panics if the configuration or the bounds are invalid.
    pub fn minimize<O: Objective<Vec<f64>>>(
        objective: O,
        bounds: &[(f64, f64)],
        config: &PsoConfig,
    ) -> PsoResult<Minimizing> {
        Self::run(objective, bounds, config, None)
    }

    /// Maximizes `objective`.
    ///
    /// # Panics
    /// Panics if the configuration or the bounds are invalid.
    pub fn maximize<O: Objective<Vec<f64>>>(
        objective: O,
        bounds: &[(f64, f64)],
        config: &PsoConfig,
    ) -> PsoResult<Maximizing> {
        Self::run(objective, bounds, config, None)
    }

    /// Runs the swarm with the fitness direction `F` and an optional
    /// cancellation token.
    ///
    /// Particles start uniformly inside the bounds, with velocities uniform
    /// in `[-vmax, vmax]` where `vmax = velocity_clamp * (high - low)`.
    ///
    /// # Panics
    /// Panics if the configuration is invalid, or if `bounds` is empty or
    /// holds a range with `low >= high` or a non-finite end.
    #[instrument(
        level = "debug",
        skip_all,
        fields(swarm = config.swarm_size, dimension = bounds.len())
    )]
    pub fn run<F: Fitness, O: Objective<Vec<f64>>>(
        objective: O,
        bounds: &[(f64, f64)],
        config: &PsoConfig,
        cancel: Option<CancellationToken>,
    ) -> PsoResult<F> {
        config.validate().expect("invalid PsoConfig");
        check_bounds(bounds).expect("invalid bounds");

        let mut rng = match config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };

        let vmax: Vec<f64> = bounds
            .iter()
            .map(|&(low, high)| config.velocity_clamp * (high - low))
            .collect();
        let swarm: Population<Particle<F>> = (0..config.swarm_size)
            .map(|_| {
                let position = bounds
                    .iter()
                    .map(|&(low, high)| low + rng.unit() * (high - low))
                    .collect();
                let velocity = vmax.iter().map(|&v| (2.0 * rng.unit() - 1.0) * v).collect();
                Particle::new(position).with_velocity(velocity)
            })
            .collect();

        let mut evaluator = PopEvaluator::new(objective);
        if let Some(max) = config.max_evaluations {
            evaluator = evaluator.with_max_evaluations(max);
        }
        if let Some(ms) = config.time_limit_ms {
            evaluator = evaluator.with_time_limit(Duration::from_millis(ms));
        }

        let mut velocity = StandardVelocity::new(config.inertia, config.cognitive, config.social);
        if config.velocity_clamp > 0.0 {
            velocity = velocity.with_max_speed(vmax);
        }
        if let Some(end) = config.inertia_end {
            velocity = velocity.with_schedule(InertiaSchedule::linear(
                config.inertia,
                end,
                config.max_generations,
            ));
        }

        let topology: Box<dyn Topology<F>> = match config.topology {
            TopologyKind::Star => Box::new(StarTopology::new()),
            TopologyKind::Ring(k) => Box::new(RingTopology::new(k)),
            TopologyKind::Random(k) => Box::new(RandomTopology::new(k)),
        };

        let mut criteria: CombinedContinue<Particle<F>> =
            CombinedContinue::new(GenContinue::new(config.max_generations as u64));
        if let Some(token) = cancel.clone() {
            criteria.add(CancelContinue::new(token));
        }
        let mut stagnation: Option<StagnationContinue<F>> = (config.stagnation_limit > 0).then(|| {
            StagnationContinue::new(config.stagnation_limit)
                .with_threshold(config.convergence_threshold)
        });
        let mut stagnated = false;

        let mut result = {
            let cont = |swarm: &[Particle<F>]| {
                if !criteria.proceed(swarm) {
                    return false;
                }
                if let Some(s) = stagnation.as_mut() {
                    if !s.proceed(swarm) {
                        stagnated = true;
                        return false;
                    }
                }
                true
            };
            let mut pso = EasyPso::new(evaluator, velocity, topology, cont)
                .with_flight(StandardFlight::bounded(bounds.to_vec()));
            pso.run(swarm, &mut rng)
                .expect("validated budget admits at least one evaluation")
        };

        if result.termination == Termination::Criterion {
            if cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                result.termination = Termination::Cancelled;
            } else if stagnated {
                result.termination = Termination::Stagnation;
            }
        }
        result
    }
}

fn check_bounds(bounds: &[(f64, f64)]) -> Result<(), String> {
    if bounds.is_empty() {
        return Err("bounds must have at least one dimension".into());
    }
    for (d, &(low, high)) in bounds.iter().enumerate() {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(format!("dimension {d}: range [{low}, {high}] is empty or unbounded"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Budget;

    fn sphere(x: &Vec<f64>) -> f64 {
        x.iter().map(|v| v * v).sum()
    }

    fn rastrigin(x: &Vec<f64>) -> f64 {
        10.0 * x.len() as f64
            + x.iter()
                .map(|v| v * v - 10.0 * (2.0 * std::f64::consts::PI * v).cos())
                .sum::<f64>()
    }

    fn base() -> PsoConfig {
        PsoConfig::default()
            .with_swarm_size(20)
            .with_max_generations(100)
            .with_stagnation_limit(0)
            .with_seed(42)
    }

    #[test]
    fn test_minimize_sphere() {
        let result = PsoRunner::minimize(sphere, &[(-5.0, 5.0); 5], &base());
        assert_eq!(result.termination, Termination::Criterion);
        assert_eq!(result.generations, 100);
        assert!(result.best_fitness.value() < 1e-3, "best {}", result.best_fitness.value());
        assert_eq!(result.fitness_history.len(), 101);
    }

    #[test]
    fn test_maximize() {
        let neg_sphere = |x: &Vec<f64>| -sphere(x);
        let result = PsoRunner::maximize(neg_sphere, &[(-5.0, 5.0); 2], &base());
        assert!(result.best_fitness.value() > -1e-3);
        for w in result.fitness_history.windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn test_all_topologies_stay_in_bounds() {
        for topology in [TopologyKind::Star, TopologyKind::Ring(3), TopologyKind::Random(3)] {
            let config = base().with_topology(topology).with_max_generations(30);
            let result = PsoRunner::minimize(rastrigin, &[(-5.12, 5.12); 4], &config);
            assert_eq!(result.swarm.len(), 20);
            for p in result.swarm.iter() {
                assert!(p.position().iter().all(|x| (-5.12..=5.12).contains(x)));
            }
            assert!(result.best_fitness.value() < rastrigin(&vec![5.0; 4]));
        }
    }

    #[test]
    fn test_reproducible() {
        let config = base().with_topology(TopologyKind::Random(2));
        let a = PsoRunner::minimize(rastrigin, &[(-5.12, 5.12); 3], &config);
        let b = PsoRunner::minimize(rastrigin, &[(-5.12, 5.12); 3], &config);
        assert_eq!(a.best_position, b.best_position);
        assert_eq!(a.fitness_history, b.fitness_history);
    }

    #[test]
    fn test_inertia_schedule_run() {
        let config = base().with_inertia_schedule(0.9, 0.4);
        let result = PsoRunner::minimize(sphere, &[(-5.0, 5.0); 3], &config);
        assert!(result.best_fitness.value() < 1e-2);
    }

    #[test]
    fn test_evaluation_budget() {
        let config = base().with_max_evaluations(150);
        let result = PsoRunner::minimize(sphere, &[(-5.0, 5.0); 2], &config);
        assert_eq!(result.termination, Termination::Budget(Budget::Evaluations(150)));
        assert_eq!(result.evaluations, 150);
        assert_eq!(result.swarm.invalid_count(), 0);
    }

    #[test]
    fn test_budget_below_swarm_size() {
        let config = base().with_max_evaluations(5);
        let result = PsoRunner::minimize(sphere, &[(-5.0, 5.0); 2], &config);
        assert_eq!(result.termination, Termination::Budget(Budget::Evaluations(5)));
        assert_eq!(result.generations, 0);
        assert_eq!(result.swarm.len(), 5);
    }

    #[test]
    fn test_stagnation() {
        let flat = |_: &Vec<f64>| 1.0;
        let config = base().with_stagnation_limit(5);
        let result = PsoRunner::minimize(flat, &[(-1.0, 1.0); 2], &config);
        assert!(result.generations <= 6);
        assert_eq!(result.termination, Termination::Stagnation);
    }

    #[test]
    fn test_cancel_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let result =
            PsoRunner::run::<Minimizing, _>(sphere, &[(-1.0, 1.0); 2], &base(), Some(token));
        assert_eq!(result.termination, Termination::Cancelled);
        assert_eq!(result.generations, 1);
    }

    #[test]
    #[should_panic(expected = "invalid bounds")]
    fn test_bad_bounds() {
        let _ = PsoRunner::minimize(sphere, &[(1.0, 1.0)], &base());
    }

    #[test]
    #[should_panic(expected = "invalid PsoConfig")]
    fn test_bad_config() {
        let _ = PsoRunner::minimize(sphere, &[(-1.0, 1.0)], &base().with_swarm_size(0));
    }
}
