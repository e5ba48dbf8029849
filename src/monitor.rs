//! Per-generation observation hooks.

use crate::core::{Fitness, Individual};

/// Summary of one generation, in objective units.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationStats {
    /// Generation index (0 is the initial population).
    pub generation: usize,
    /// Objective value of the best individual.
    pub best: f64,
    /// Objective value of the worst individual.
    pub worst: f64,
    /// Mean objective value over finite values.
    pub mean: f64,
    /// Population standard deviation over finite values.
    pub std_dev: f64,
    /// Objective calls so far.
    pub evaluations: u64,
    /// Number of individuals.
    pub population_size: usize,
}

impl GenerationStats {
    /// Computes the summary of a fully evaluated population.
    ///
    /// An empty population yields NaN for every value field.
    ///
    /// # Panics
    /// Panics if an individual is invalid.
    pub fn from_population<I: Individual>(generation: usize, pop: &[I], evaluations: u64) -> Self {
        let best = pop.iter().map(|i| i.fitness()).max();
        let worst = pop.iter().map(|i| i.fitness()).min();

        let finite: Vec<f64> = pop
            .iter()
            .map(|i| i.fitness().value())
            .filter(|v| v.is_finite())
            .collect();
        let (mean, std_dev) = if finite.is_empty() {
            (f64::NAN, f64::NAN)
        } else {
            let n = finite.len() as f64;
            let mean = finite.iter().sum::<f64>() / n;
            let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            (mean, var.sqrt())
        };

        Self {
            generation,
            best: best.map_or(f64::NAN, |f| f.value()),
            worst: worst.map_or(f64::NAN, |f| f.value()),
            mean,
            std_dev,
            evaluations,
            population_size: pop.len(),
        }
    }
}

/// Receives a [`GenerationStats`] after every generation.
///
/// Closures taking `&GenerationStats` are monitors.
pub trait Monitor {
    /// Called once per generation, including generation 0.
    fn on_generation(&mut self, stats: &GenerationStats);
}

impl<T: FnMut(&GenerationStats)> Monitor for T {
    fn on_generation(&mut self, stats: &GenerationStats) {
        self(stats)
    }
}

/// Logs each generation at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMonitor;

impl Monitor for TracingMonitor {
    fn on_generation(&mut self, stats: &GenerationStats) {
        tracing::info!(
            generation = stats.generation,
            best = stats.best,
            mean = stats.mean,
            worst = stats.worst,
            std_dev = stats.std_dev,
            evaluations = stats.evaluations,
            "generation"
        );
    }
}
