//! The swarm loop.

use super::{Particle, StandardFlight, Topology, Velocity};
use crate::continuation::Continue;
use crate::core::{Fitness, Individual, Population};
use crate::ea::Termination;
use crate::error::{EvoError, Result};
use crate::eval::PopEval;
use crate::monitor::{GenerationStats, Monitor};
use crate::random::RandomSource;
use tracing::instrument;

/// Result of a swarm run.
#[derive(Debug, Clone)]
pub struct PsoResult<F> {
    /// Best position any particle has visited.
    pub best_position: Vec<f64>,

    /// Fitness at `best_position`.
    pub best_fitness: F,

    /// The final swarm.
    pub swarm: Population<Particle<F>>,

    /// Number of completed generations.
    pub generations: usize,

    /// Objective calls over the run.
    pub evaluations: u64,

    /// Why the run stopped.
    pub termination: Termination,

    /// Best-so-far objective value: initial swarm, then one entry per
    /// completed generation.
    pub fitness_history: Vec<f64>,
}

/// Easy particle swarm optimizer.
///
/// Each generation visits the particles in order. For each one:
///
/// 1. velocity update against its neighbourhood best (`V`, `T`)
/// 2. flight
/// 3. evaluation (`E`)
/// 4. best-known update, then neighbourhood update
///
/// Updates are asynchronous: particle `i + 1` already sees what particle
/// `i` found in the same generation. After the sweep the monitors run,
/// the velocity and topology advance a generation and the stopping
/// criterion (`C`) is asked.
pub struct EasyPso<E, V, T, C> {
    eval: E,
    velocity: V,
    topology: T,
    flight: StandardFlight,
    cont: C,
    monitors: Vec<Box<dyn Monitor>>,
    generation: usize,
}

impl<E, V, T, C> EasyPso<E, V, T, C> {
    /// Assembles the algorithm with unbounded flight.
    pub fn new(eval: E, velocity: V, topology: T, cont: C) -> Self {
        Self {
            eval,
            velocity,
            topology,
            flight: StandardFlight::new(),
            cont,
            monitors: Vec::new(),
            generation: 0,
        }
    }

    /// Replaces the flight.
    pub fn with_flight(mut self, flight: StandardFlight) -> Self {
        self.flight = flight;
        self
    }

    /// Adds a monitor called after every generation.
    pub fn with_monitor(mut self, monitor: impl Monitor + 'static) -> Self {
        self.monitors.push(Box::new(monitor));
        self
    }

    /// Generations completed so far.
    pub fn generation_count(&self) -> usize {
        self.generation
    }

    /// The topology.
    pub fn topology(&self) -> &T {
        &self.topology
    }

    /// Runs one generation over an evaluated, set-up swarm; returns whether
    /// the run should go on.
    ///
    /// Each particle moves on a copy that is committed only once evaluated,
    /// so on error every particle of `swarm` is still valid.
    ///
    /// # Errors
    /// - [`EvoError::BudgetExceeded`] from the evaluator
    /// - [`EvoError::ContractViolation`] from velocity, flight or topology
    pub fn generation<F>(
        &mut self,
        swarm: &mut Population<Particle<F>>,
        rng: &mut RandomSource,
    ) -> Result<bool>
    where
        F: Fitness,
        E: PopEval<Particle<F>>,
        V: Velocity<F>,
        T: Topology<F>,
        C: Continue<Particle<F>>,
    {
        for i in 0..swarm.len() {
            let mut p = swarm[i].clone();
            self.velocity.update(&mut p, self.topology.best(i), rng)?;
            self.flight.fly(&mut p)?;
            self.eval.eval_one(&mut p)?;
            p.update_best();
            self.topology.update(&p, i);
            swarm[i] = p;
        }
        self.generation += 1;

        let stats =
            GenerationStats::from_population(self.generation, swarm, self.eval.evaluations());
        tracing::debug!(
            generation = stats.generation,
            best = stats.best,
            mean = stats.mean,
            evaluations = stats.evaluations,
            "generation complete"
        );
        for monitor in &mut self.monitors {
            monitor.on_generation(&stats);
        }

        self.velocity.next_generation(self.generation);
        self.topology.next_generation(swarm, rng)?;
        Ok(self.cont.proceed(swarm))
    }

    /// Evaluates the swarm, sets up the topology, then loops
    /// [`generation`](Self::generation) until the criterion stops the run.
    ///
    /// Errors during the loop end the run normally and are reported in
    /// [`PsoResult::termination`]. When the budget runs out on the initial
    /// swarm, the run ends with [`Termination::Budget`] and the particles
    /// evaluated so far.
    ///
    /// # Errors
    /// - [`EvoError::ContractViolation`] if `swarm` is empty or the topology
    ///   rejects it
    /// - [`EvoError::BudgetExceeded`] if not a single initial particle could
    ///   be evaluated
    /// - any other error from evaluating the initial swarm
    #[instrument(level = "debug", skip_all, fields(swarm = swarm.len()))]
    pub fn run<F>(
        &mut self,
        mut swarm: Population<Particle<F>>,
        rng: &mut RandomSource,
    ) -> Result<PsoResult<F>>
    where
        F: Fitness,
        E: PopEval<Particle<F>>,
        V: Velocity<F>,
        T: Topology<F>,
        C: Continue<Particle<F>>,
    {
        if swarm.is_empty() {
            return Err(EvoError::contract("cannot run on an empty swarm"));
        }
        let initial_stop = match self.eval.eval(&mut swarm) {
            Ok(()) => None,
            Err(EvoError::BudgetExceeded(budget)) => {
                swarm.retain_valid();
                if swarm.is_empty() {
                    return Err(EvoError::BudgetExceeded(budget));
                }
                tracing::info!(
                    %budget,
                    evaluated = swarm.len(),
                    "budget exhausted on the initial swarm"
                );
                Some(Termination::Budget(budget))
            }
            Err(e) => return Err(e),
        };
        for p in swarm.iter_mut() {
            p.update_best();
        }

        let (mut best_position, mut best_fitness) = best_known(&swarm);
        let mut fitness_history = vec![best_fitness.value()];
        let stats =
            GenerationStats::from_population(self.generation, &swarm, self.eval.evaluations());
        for monitor in &mut self.monitors {
            monitor.on_generation(&stats);
        }

        let start_generation = self.generation;
        let termination = match initial_stop {
            Some(stop) => stop,
            None => {
                self.topology.setup(&swarm, rng)?;
                loop {
                    let outcome = self.generation(&mut swarm, rng);
                    // Particles committed before an error still count.
                    let (pos, fit) = best_known(&swarm);
                    if fit > best_fitness {
                        best_position = pos;
                        best_fitness = fit;
                    }
                    match outcome {
                        Ok(go_on) => {
                            fitness_history.push(best_fitness.value());
                            if !go_on {
                                break Termination::Criterion;
                            }
                        }
                        Err(e) => break Termination::from_error(e),
                    }
                }
            }
        };

        Ok(PsoResult {
            best_position,
            best_fitness,
            swarm,
            generations: self.generation - start_generation,
            evaluations: self.eval.evaluations(),
            termination,
            fitness_history,
        })
    }
}

/// Best personal best of an evaluated swarm. Ties go to the first particle.
fn best_known<F: Fitness>(swarm: &[Particle<F>]) -> (Vec<f64>, F) {
    let mut best = &swarm[0];
    for p in &swarm[1..] {
        if p.best_fitness() > best.best_fitness() {
            best = p;
        }
    }
    let fit = best.best_fitness().unwrap_or_else(|| best.fitness());
    (best.best_position().to_vec(), fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continuation::GenContinue;
    use crate::core::Minimizing;
    use crate::error::Budget;
    use crate::eval::PopEvaluator;
    use crate::pso::{RingTopology, StandardVelocity, StarTopology};

    fn sphere(x: &Vec<f64>) -> f64 {
        x.iter().map(|v| v * v).sum()
    }

    fn swarm(n: usize, rng: &mut RandomSource) -> Population<Particle<Minimizing>> {
        (0..n)
            .map(|_| {
                let x = vec![rng.uniform(-5.0, 5.0).unwrap(), rng.uniform(-5.0, 5.0).unwrap()];
                Particle::new(x)
            })
            .collect()
    }

    fn sphere_run(seed: u64) -> PsoResult<Minimizing> {
        let mut rng = RandomSource::new(seed);
        let s = swarm(20, &mut rng);
        let mut pso = EasyPso::new(
            PopEvaluator::new(sphere),
            StandardVelocity::new(0.7298, 1.49445, 1.49445).with_max_speed(vec![2.0, 2.0]),
            StarTopology::new(),
            GenContinue::new(50),
        )
        .with_flight(StandardFlight::bounded(vec![(-5.0, 5.0); 2]));
        pso.run(s, &mut rng).unwrap()
    }

    #[test]
    fn test_sphere_converges() {
        let result = sphere_run(42);
        assert_eq!(result.generations, 50);
        assert_eq!(result.termination, Termination::Criterion);
        assert_eq!(result.evaluations, 20 + 50 * 20);
        assert!(
            result.best_fitness.value() < 1e-2,
            "best {}",
            result.best_fitness.value()
        );
        assert!((sphere(&result.best_position) - result.best_fitness.value()).abs() < 1e-12);
        for p in result.swarm.iter() {
            assert!(p.position().iter().all(|x| (-5.0..=5.0).contains(x)));
        }
    }

    #[test]
    fn test_history_monotone_and_reproducible() {
        let a = sphere_run(5);
        let b = sphere_run(5);
        assert_eq!(a.fitness_history, b.fitness_history);
        assert_eq!(a.fitness_history.len(), 51);
        for w in a.fitness_history.windows(2) {
            assert!(w[1] <= w[0]);
        }
    }

    #[test]
    fn test_personal_best_never_worse_than_current() {
        let mut rng = RandomSource::new(11);
        let s = swarm(10, &mut rng);
        let mut pso = EasyPso::new(
            PopEvaluator::new(sphere),
            StandardVelocity::new(0.9, 2.0, 2.0),
            RingTopology::new(3),
            GenContinue::new(10),
        );
        let result = pso.run(s, &mut rng).unwrap();
        for p in result.swarm.iter() {
            assert!(p.best_fitness().unwrap() >= p.fitness());
            assert_eq!(sphere(&p.best_position().to_vec()), p.best_fitness().unwrap().value());
        }
    }

    #[test]
    fn test_budget_keeps_swarm_valid() {
        let mut rng = RandomSource::new(2);
        let s = swarm(10, &mut rng);
        let mut pso = EasyPso::new(
            PopEvaluator::new(sphere).with_max_evaluations(25),
            StandardVelocity::new(0.7, 1.5, 1.5),
            StarTopology::new(),
            GenContinue::new(100),
        );
        let result = pso.run(s, &mut rng).unwrap();
        assert_eq!(result.termination, Termination::Budget(Budget::Evaluations(25)));
        assert_eq!(result.evaluations, 25);
        assert_eq!(result.generations, 1);
        assert_eq!(result.swarm.invalid_count(), 0);
    }

    #[test]
    fn test_budget_on_initial_swarm_keeps_evaluated() {
        let mut rng = RandomSource::new(2);
        let s = swarm(10, &mut rng);
        let mut pso = EasyPso::new(
            PopEvaluator::new(sphere).with_max_evaluations(4),
            StandardVelocity::new(0.7, 1.5, 1.5),
            StarTopology::new(),
            GenContinue::new(100),
        );
        let result = pso.run(s, &mut rng).unwrap();
        assert_eq!(result.termination, Termination::Budget(Budget::Evaluations(4)));
        assert_eq!(result.generations, 0);
        assert_eq!(result.swarm.len(), 4);
        assert_eq!(result.swarm.invalid_count(), 0);
        assert_eq!(sphere(&result.best_position), result.best_fitness.value());
    }

    #[test]
    fn test_zero_budget_is_error() {
        let mut rng = RandomSource::new(2);
        let s = swarm(3, &mut rng);
        let mut pso = EasyPso::new(
            PopEvaluator::new(sphere).with_max_evaluations(0),
            StandardVelocity::new(0.7, 1.5, 1.5),
            StarTopology::new(),
            GenContinue::new(100),
        );
        assert!(pso.run(s, &mut rng).unwrap_err().is_budget_exceeded());
    }

    #[test]
    fn test_empty_swarm() {
        let mut pso = EasyPso::new(
            PopEvaluator::new(sphere),
            StandardVelocity::new(0.7, 1.5, 1.5),
            StarTopology::<Minimizing>::new(),
            GenContinue::new(1),
        );
        assert!(pso.run(Population::new(), &mut RandomSource::new(1)).is_err());
    }

    #[test]
    fn test_dimension_mismatch_is_violation() {
        let mut rng = RandomSource::new(1);
        let s = swarm(4, &mut rng);
        let mut pso = EasyPso::new(
            PopEvaluator::new(sphere),
            StandardVelocity::new(0.7, 1.5, 1.5),
            StarTopology::new(),
            GenContinue::new(5),
        )
        .with_flight(StandardFlight::bounded(vec![(-1.0, 1.0)]));
        let result = pso.run(s, &mut rng).unwrap();
        assert!(matches!(result.termination, Termination::ContractViolation(_)));
        assert_eq!(result.generations, 0);
        assert_eq!(result.swarm.invalid_count(), 0);
    }
}
