//! One-call evolutionary runner.
//!
//! [`EaRunner`] assembles an [`EasyEa`] from an [`EaProblem`] and an
//! [`EaConfig`]: initialization → evaluation → selection → crossover →
//! mutation → replacement → repeat.

use super::config::{EaConfig, ReplacementKind};
use super::driver::{EaResult, EasyEa, Termination};
use super::problem::{EaIndividual, EaProblem};
use crate::continuation::{
    CancelContinue, CancellationToken, CombinedContinue, Continue, GenContinue,
    StagnationContinue,
};
use crate::core::{Candidate, Individual, Population};
use crate::eval::PopEvaluator;
use crate::random::{create_rng, RandomSource};
use crate::replace::{
    CommaReplacement, Elitism, EpReplacement, MergeReduce, PlusReplacement, Replacement,
    SsgaWorseReplacement, Truncate,
};
use crate::select::{HowMany, SelectMany};
use crate::variation::{SelectTransform, SgaTransform};
use std::time::Duration;
use tracing::instrument;

/// Executes the evolutionary loop for an [`EaProblem`].
///
/// # Usage
///
/// ```ignore
/// let problem = MyProblem::new();
/// let config = EaConfig::default().with_seed(42);
/// let result = EaRunner::run(&problem, &config);
/// println!("Best fitness: {:?}", result.best_fitness);
/// ```
pub struct EaRunner;

impl EaRunner {
    /// Runs the optimization.
    ///
    /// # Panics
    /// Panics if the configuration is invalid (call [`EaConfig::validate`]
    /// first to get a descriptive error).
    pub fn run<P: EaProblem>(problem: &P, config: &EaConfig) -> EaResult<EaIndividual<P>> {
        Self::run_with_cancel(problem, config, None)
    }

    /// Runs the optimization with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and gets cancelled, the run stops at the end
    /// of the current generation and returns the best solution found so far.
    ///
    /// # Panics
    /// Panics if the configuration is invalid.
    #[instrument(level = "debug", skip_all, fields(population = config.population_size))]
    pub fn run_with_cancel<P: EaProblem>(
        problem: &P,
        config: &EaConfig,
        cancel: Option<CancellationToken>,
    ) -> EaResult<EaIndividual<P>> {
        config.validate().expect("invalid EaConfig");

        let mut rng = match config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };

        let population: Population<EaIndividual<P>> = (0..config.population_size)
            .map(|_| Candidate::new(problem.create_genome(&mut rng)))
            .collect();

        let mut evaluator =
            PopEvaluator::new(|g: &P::Genome| problem.evaluate(g)).with_parallel(config.parallel);
        if let Some(max) = config.max_evaluations {
            evaluator = evaluator.with_max_evaluations(max);
        }
        if let Some(ms) = config.time_limit_ms {
            evaluator = evaluator.with_time_limit(Duration::from_millis(ms));
        }

        let breed = SelectTransform::new(
            SelectMany::new(
                config.selection.build::<EaIndividual<P>>(),
                HowMany::Absolute(config.offspring_count()),
            ),
            SgaTransform::new(
                |a: &mut EaIndividual<P>, b: &mut EaIndividual<P>, rng: &mut RandomSource| {
                    let mut ga = a.genes().clone();
                    let mut gb = b.genes().clone();
                    if problem.crossover(&mut ga, &mut gb, rng) {
                        *a.genes_mut() = ga;
                        *b.genes_mut() = gb;
                        true
                    } else {
                        false
                    }
                },
                config.crossover_rate,
                |ind: &mut EaIndividual<P>, rng: &mut RandomSource| {
                    let mut g = ind.genes().clone();
                    if problem.mutate(&mut g, rng) {
                        *ind.genes_mut() = g;
                        true
                    } else {
                        false
                    }
                },
                config.mutation_rate,
            ),
        );

        let replacement: Box<dyn Replacement<EaIndividual<P>>> = match config.replacement {
            ReplacementKind::Generational => Box::new(MergeReduce::new(
                Elitism(HowMany::Absolute(config.elite_count())),
                Truncate,
            )),
            ReplacementKind::Plus => Box::new(PlusReplacement::plus()),
            ReplacementKind::Comma => Box::new(CommaReplacement::comma()),
            ReplacementKind::Ep(t) => Box::new(EpReplacement::ep(t)),
            ReplacementKind::SteadyState => Box::new(SsgaWorseReplacement),
        };

        let mut criteria = CombinedContinue::new(GenContinue::new(config.max_generations as u64));
        if let Some(token) = cancel.clone() {
            criteria.add(CancelContinue::new(token));
        }
        let mut stagnation = (config.stagnation_limit > 0).then(|| {
            StagnationContinue::new(config.stagnation_limit)
                .with_threshold(config.convergence_threshold)
        });
        let mut stagnated = false;
        let mut generation = 0usize;
        let mut best_so_far = None;

        let result = {
            let cont = |pop: &[EaIndividual<P>]| {
                generation += 1;
                if let Some(gen_best) = pop.iter().map(|ind| ind.fitness()).max() {
                    let best = best_so_far.map_or(gen_best, |b: P::Fitness| b.max(gen_best));
                    best_so_far = Some(best);
                    problem.on_generation(generation, best);
                }
                if !criteria.proceed(pop) {
                    return false;
                }
                if let Some(s) = stagnation.as_mut() {
                    if !s.proceed(pop) {
                        stagnated = true;
                        return false;
                    }
                }
                true
            };
            let mut ea = EasyEa::new(evaluator, breed, replacement, cont);
            ea.run(population, &mut rng)
                .expect("validated budget admits at least one evaluation")
        };

        let mut result = result;
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
