//! The generic generation loop.

use crate::continuation::Continue;
use crate::core::{Fitness, Individual, Population};
use crate::error::{Budget, EvoError, Result};
use crate::eval::PopEval;
use crate::monitor::{GenerationStats, Monitor};
use crate::random::RandomSource;
use crate::replace::Replacement;
use crate::variation::Breed;
use tracing::instrument;

/// Why a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// A stopping criterion said stop.
    Criterion,
    /// A stagnation criterion said stop.
    Stagnation,
    /// The run was cancelled through a token.
    Cancelled,
    /// The evaluation or time budget ran out.
    Budget(Budget),
    /// An operator broke its contract; the last complete population is kept.
    ContractViolation(String),
    /// Any other failure of a generation, e.g. an unrecoverable numeric
    /// error; the last complete population is kept.
    Error(EvoError),
}

impl Termination {
    /// Maps an error that ended a generation to the reason the run stopped.
    pub fn from_error(error: EvoError) -> Self {
        match error {
            EvoError::BudgetExceeded(budget) => {
                tracing::info!(%budget, "budget exhausted");
                Termination::Budget(budget)
            }
            EvoError::ContractViolation(msg) => {
                tracing::warn!(%msg, "operator contract violated, stopping");
                Termination::ContractViolation(msg)
            }
            other => {
                tracing::warn!(error = %other, "generation failed, stopping");
                Termination::Error(other)
            }
        }
    }
}

/// Result of a run.
///
/// `best` is the best individual seen over the whole run, which may no
/// longer be in `population` when the replacement is not elitist.
#[derive(Debug, Clone)]
pub struct EaResult<I: Individual> {
    /// The best individual found during the entire run.
    pub best: I,

    /// Fitness of `best`.
    pub best_fitness: I::Fitness,

    /// The final population.
    pub population: Population<I>,

    /// Number of completed generations.
    pub generations: usize,

    /// Objective calls over the run.
    pub evaluations: u64,

    /// Why the run stopped.
    pub termination: Termination,

    /// Best-so-far objective value: initial population, then one entry per
    /// completed generation.
    pub fitness_history: Vec<f64>,
}

impl<I: Individual> EaResult<I> {
    /// Whether the run stopped on stagnation.
    pub fn stagnated(&self) -> bool {
        self.termination == Termination::Stagnation
    }

    /// Whether the run was cancelled externally.
    pub fn cancelled(&self) -> bool {
        self.termination == Termination::Cancelled
    }
}

/// Easy evolutionary algorithm.
///
/// Each generation:
///
/// 1. breed offspring from the population (`B`)
/// 2. evaluate the invalid offspring (`E`)
/// 3. build the next population (`R`); its size must not change
/// 4. report to the monitors
/// 5. ask the stopping criterion (`C`)
///
/// The driver keeps no statistics of its own beyond the generation count.
///
/// # Examples
///
/// ```
/// use u_evolve::continuation::GenContinue;
/// use u_evolve::core::{Candidate, Minimizing};
/// use u_evolve::ea::EasyEa;
/// use u_evolve::eval::PopEvaluator;
/// use u_evolve::random::RandomSource;
/// use u_evolve::replace::GenerationalReplacement;
/// use u_evolve::select::{DetTournamentSelect, HowMany, SelectMany};
/// use u_evolve::variation::{
///     NormalMutation, RealInitBounded, SegmentCrossover, SelectTransform, SgaTransform,
/// };
///
/// let mut rng = RandomSource::new(7);
/// let init = RealInitBounded::new(vec![(-5.0, 5.0); 2]).unwrap();
/// let pop = init.population::<Minimizing>(20, &mut rng).unwrap();
///
/// let sphere = |x: &Vec<f64>| x.iter().map(|v| v * v).sum::<f64>();
/// let breed = SelectTransform::new(
///     SelectMany::new(DetTournamentSelect::new(2), HowMany::Rate(1.0)),
///     SgaTransform::new(
///         SegmentCrossover::default(),
///         0.5,
///         NormalMutation::new(0.1).unwrap(),
///         1.0,
///     ),
/// );
/// let mut ea = EasyEa::new(
///     PopEvaluator::new(sphere),
///     breed,
///     GenerationalReplacement,
///     GenContinue::new(10),
/// );
/// let result = ea.run(pop, &mut rng).unwrap();
/// assert_eq!(result.generations, 10);
/// ```
pub struct EasyEa<E, B, R, C> {
    eval: E,
    breed: B,
    replace: R,
    cont: C,
    monitors: Vec<Box<dyn Monitor>>,
    generation: usize,
}

impl<E, B, R, C> EasyEa<E, B, R, C> {
    /// Assembles the algorithm.
    pub fn new(eval: E, breed: B, replace: R, cont: C) -> Self {
        Self {
            eval,
            breed,
            replace,
            cont,
            monitors: Vec::new(),
            generation: 0,
        }
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

    /// The evaluator.
    pub fn evaluator(&self) -> &E {
        &self.eval
    }

    /// The breeder.
    pub fn breeder(&self) -> &B {
        &self.breed
    }

    /// The stopping criterion.
    pub fn continuator(&self) -> &C {
        &self.cont
    }

    /// Runs one generation; returns whether the run should go on.
    ///
    /// `pop` must be fully evaluated. On error `pop` is left as it was
    /// before the failing step.
    ///
    /// # Errors
    /// - [`EvoError::BudgetExceeded`] from the evaluator
    /// - [`EvoError::ContractViolation`] from an operator, or when the
    ///   replacement changed the population size
    pub fn generation<I>(
        &mut self,
        pop: &mut Population<I>,
        rng: &mut RandomSource,
    ) -> Result<bool>
    where
        I: Individual,
        E: PopEval<I>,
        B: Breed<I>,
        R: Replacement<I>,
        C: Continue<I>,
    {
        let size = pop.len();
        let mut offspring = self.breed.breed(pop, rng)?;
        self.eval.eval(&mut offspring)?;

        let mut next = pop.clone();
        self.replace.replace(&mut next, offspring, rng)?;
        if next.len() != size {
            return Err(EvoError::contract(format!(
                "replacement changed population size from {size} to {}",
                next.len()
            )));
        }
        *pop = next;
        self.generation += 1;

        let stats = GenerationStats::from_population(self.generation, pop, self.eval.evaluations());
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

        Ok(self.cont.proceed(pop))
    }

    /// Evaluates the initial population, then loops [`generation`](Self::generation)
    /// until the criterion stops the run.
    ///
    /// Errors during the loop end the run normally and are reported in
    /// [`EaResult::termination`], with the last complete population kept.
    /// When the budget runs out on the initial population, the run ends
    /// with [`Termination::Budget`] and the individuals evaluated so far.
    ///
    /// # Errors
    /// - [`EvoError::ContractViolation`] if `pop` is empty
    /// - [`EvoError::BudgetExceeded`] if not a single initial individual
    ///   could be evaluated
    /// - any other error from evaluating the initial population
    #[instrument(level = "debug", skip_all, fields(population = pop.len()))]
    pub fn run<I>(
        &mut self,
        mut pop: Population<I>,
        rng: &mut RandomSource,
    ) -> Result<EaResult<I>>
    where
        I: Individual,
        E: PopEval<I>,
        B: Breed<I>,
        R: Replacement<I>,
        C: Continue<I>,
    {
        if pop.is_empty() {
            return Err(EvoError::contract("cannot run on an empty population"));
        }
        let initial_stop = match self.eval.eval(&mut pop) {
            Ok(()) => None,
            Err(EvoError::BudgetExceeded(budget)) => {
                pop.retain_valid();
                if pop.is_empty() {
                    return Err(EvoError::BudgetExceeded(budget));
                }
                tracing::info!(
                    %budget,
                    evaluated = pop.len(),
                    "budget exhausted on the initial population"
                );
                Some(Termination::Budget(budget))
            }
            Err(e) => return Err(e),
        };

        let mut best = best_of(&pop).clone();
        let mut fitness_history = vec![best.fitness().value()];
        let stats =
            GenerationStats::from_population(self.generation, &pop, self.eval.evaluations());
        for monitor in &mut self.monitors {
            monitor.on_generation(&stats);
        }

        let start_generation = self.generation;
        let termination = match initial_stop {
            Some(stop) => stop,
            None => loop {
                match self.generation(&mut pop, rng) {
                    Ok(go_on) => {
                        let gen_best = best_of(&pop);
                        if gen_best.fitness() > best.fitness() {
                            best = gen_best.clone();
                        }
                        fitness_history.push(best.fitness().value());
                        if !go_on {
                            break Termination::Criterion;
                        }
                    }
                    Err(e) => break Termination::from_error(e),
                }
            },
        };

        Ok(EaResult {
            best_fitness: best.fitness(),
            best,
            population: pop,
            generations: self.generation - start_generation,
            evaluations: self.eval.evaluations(),
            termination,
            fitness_history,
        })
    }
}

fn best_of<I: Individual>(pop: &[I]) -> &I {
    let mut best = &pop[0];
    for ind in &pop[1..] {
        if ind.fitness() > best.fitness() {
            best = ind;
        }
    }
    best
}
