//! Runner configuration.
//!
//! [`EaConfig`] holds all parameters that control the one-call
//! evolutionary loop of [`EaRunner`](super::EaRunner).

use crate::select::Selection;

/// Survivor strategy used by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReplacementKind {
    /// Offspring replace parents; the `elite_ratio` best parents survive.
    #[default]
    Generational,
    /// (mu + lambda): best of parents and offspring.
    Plus,
    /// (mu, lambda): best of offspring.
    Comma,
    /// EP tournament over parents and offspring (tournament size).
    Ep(usize),
    /// Two offspring per generation, each evicting the worst parent if better.
    SteadyState,
}

/// Parameters of the one-call genetic algorithm: sizes, operators,
/// survivor strategy, budgets and stopping rules.
///
/// # Defaults
///
/// ```
/// use u_evolve::ea::EaConfig;
///
/// let config = EaConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.max_generations, 500);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_evolve::ea::{EaConfig, ReplacementKind};
/// use u_evolve::select::Selection;
///
/// let config = EaConfig::default()
///     .with_population_size(200)
///     .with_selection(Selection::Tournament(5))
///     .with_replacement(ReplacementKind::Plus)
///     .with_mutation_rate(0.1);
/// ```
#[derive(Debug, Clone)]
pub struct EaConfig {
    /// Number of individuals kept between generations.
    pub population_size: usize,

    /// Maximum number of generations before termination.
    pub max_generations: usize,

    /// Selection strategy for choosing parents.
    pub selection: Selection,

    /// Fraction of the population preserved as elites (0.0–1.0).
    ///
    /// Only used by [`ReplacementKind::Generational`].
    pub elite_ratio: f64,

    /// Probability of applying crossover to a pair of parents (0.0–1.0).
    pub crossover_rate: f64,

    /// Probability of applying mutation to an offspring (0.0–1.0).
    pub mutation_rate: f64,

    /// Number of generations with no significant improvement before stopping.
    ///
    /// Set to 0 to disable stagnation-based termination.
    pub stagnation_limit: usize,

    /// Minimum relative improvement `|old - new| / |old|` that resets the
    /// stagnation counter; 0.0 counts any improvement.
    pub convergence_threshold: f64,

    /// Whether to evaluate individuals in parallel (needs the `parallel`
    /// cargo feature).
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,

    /// Optional wall-clock time limit in milliseconds.
    ///
    /// Checked before each evaluation batch, so the actual runtime may
    /// exceed it by one generation's worth of work.
    pub time_limit_ms: Option<u64>,

    /// Optional cap on objective evaluations, initial population included.
    ///
    /// A budget below `population_size` ends the run right after the
    /// initial evaluation, with the individuals evaluated so far.
    pub max_evaluations: Option<u64>,

    /// Survivor strategy.
    pub replacement: ReplacementKind,
}

impl Default for EaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 500,
            selection: Selection::default(),
            elite_ratio: 0.1,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            stagnation_limit: 50,
            convergence_threshold: 0.0,
            parallel: true,
            seed: None,
            time_limit_ms: None,
            max_evaluations: None,
            replacement: ReplacementKind::default(),
        }
    }
}

impl EaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the selection strategy.
    pub fn with_selection(mut self, sel: Selection) -> Self {
        self.selection = sel;
        self
    }

    /// Sets the elite ratio.
    pub fn with_elite_ratio(mut self, ratio: f64) -> Self {
        self.elite_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the stagnation limit (0 to disable).
    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    /// Sets the convergence threshold (negative values become 0).
    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold.max(0.0);
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Sets the evaluation budget.
    pub fn with_max_evaluations(mut self, n: u64) -> Self {
        self.max_evaluations = Some(n);
        self
    }

    /// Sets the survivor strategy.
    pub fn with_replacement(mut self, kind: ReplacementKind) -> Self {
        self.replacement = kind;
        self
    }

    /// Preset for fast optimization: small population, few generations.
    ///
    /// - Population: 50, Generations: 100, Time limit: 10s
    /// - Stagnation limit: 20, Convergence threshold: 0.001
    pub fn fast() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            stagnation_limit: 20,
            convergence_threshold: 0.001,
            time_limit_ms: Some(10_000),
            ..Self::default()
        }
    }

    /// Preset for balanced optimization: moderate population and generations.
    ///
    /// - Population: 100, Generations: 300, Time limit: 30s
    /// - Stagnation limit: 50, Convergence threshold: 0.001
    pub fn balanced() -> Self {
        Self {
            population_size: 100,
            max_generations: 300,
            stagnation_limit: 50,
            convergence_threshold: 0.001,
            time_limit_ms: Some(30_000),
            ..Self::default()
        }
    }

    /// Preset for quality optimization: large population, many generations.
    ///
    /// - Population: 150, Generations: 500, Time limit: 60s
    /// - Stagnation limit: 80, Convergence threshold: 0.0005
    pub fn quality() -> Self {
        Self {
            population_size: 150,
            max_generations: 500,
            stagnation_limit: 80,
            convergence_threshold: 0.0005,
            time_limit_ms: Some(60_000),
            ..Self::default()
        }
    }

    /// Automatically selects a preset based on problem size.
    ///
    /// - `dimension < 50` → [`fast()`](Self::fast)
    /// - `50 ≤ dimension < 200` → [`balanced()`](Self::balanced)
    /// - `dimension ≥ 200` → [`quality()`](Self::quality)
    pub fn auto_select(dimension: usize) -> Self {
        if dimension < 50 {
            Self::fast()
        } else if dimension < 200 {
            Self::balanced()
        } else {
            Self::quality()
        }
    }

    /// Convenience builder for setting tournament size.
    ///
    /// Equivalent to `.with_selection(Selection::Tournament(k))`.
    pub fn with_tournament_size(self, k: usize) -> Self {
        self.with_selection(Selection::Tournament(k))
    }

    /// Number of elites kept by generational replacement.
    pub fn elite_count(&self) -> usize {
        (self.population_size as f64 * self.elite_ratio) as usize
    }

    /// Offspring bred per generation for the configured replacement.
    pub fn offspring_count(&self) -> usize {
        match self.replacement {
            ReplacementKind::Generational => self.population_size - self.elite_count(),
            ReplacementKind::Plus | ReplacementKind::Comma | ReplacementKind::Ep(_) => {
                self.population_size
            }
            ReplacementKind::SteadyState => 2,
        }
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 2 {
            return Err("population_size must be at least 2".into());
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        if self.replacement == ReplacementKind::Generational
            && self.elite_count() >= self.population_size
        {
            return Err("elite_ratio too high: elites fill entire population".into());
        }
        if self.convergence_threshold < 0.0 {
            return Err("convergence_threshold must be non-negative".into());
        }
        if self.time_limit_ms == Some(0) {
            return Err("time_limit_ms must be positive or None".into());
        }
        if self.max_evaluations == Some(0) {
            return Err("max_evaluations must be positive or None".into());
        }
        if let ReplacementKind::Ep(t) = self.replacement {
            if t < 2 {
                return Err("EP tournament size must be at least 2".into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EaConfig::default();
        assert_eq!(config.population_size, 100);
        assert_eq!(config.max_generations, 500);
        assert_eq!(config.selection, Selection::Tournament(3));
        assert!((config.elite_ratio - 0.1).abs() < 1e-10);
        assert!((config.crossover_rate - 0.9).abs() < 1e-10);
        assert!((config.mutation_rate - 0.1).abs() < 1e-10);
        assert_eq!(config.stagnation_limit, 50);
        assert!(config.parallel);
        assert!(config.seed.is_none());
        assert!(config.time_limit_ms.is_none());
        assert!(config.max_evaluations.is_none());
        assert_eq!(config.replacement, ReplacementKind::Generational);
    }

    #[test]
    fn test_builder_pattern() {
        let config = EaConfig::default()
            .with_population_size(200)
            .with_max_generations(1000)
            .with_selection(Selection::Rank)
            .with_elite_ratio(0.2)
            .with_crossover_rate(0.8)
            .with_mutation_rate(0.05)
            .with_stagnation_limit(100)
            .with_parallel(false)
            .with_seed(42)
            .with_max_evaluations(10_000)
            .with_replacement(ReplacementKind::Ep(4));

        assert_eq!(config.population_size, 200);
        assert_eq!(config.max_generations, 1000);
        assert_eq!(config.selection, Selection::Rank);
        assert!((config.elite_ratio - 0.2).abs() < 1e-10);
        assert!((config.crossover_rate - 0.8).abs() < 1e-10);
        assert!((config.mutation_rate - 0.05).abs() < 1e-10);
        assert_eq!(config.stagnation_limit, 100);
        assert!(!config.parallel);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.max_evaluations, Some(10_000));
        assert_eq!(config.replacement, ReplacementKind::Ep(4));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_population_too_small() {
        assert!(EaConfig::default().with_population_size(1).validate().is_err());
    }

    #[test]
    fn test_validate_zero_generations() {
        assert!(EaConfig::default().with_max_generations(0).validate().is_err());
    }

    #[test]
    fn test_validate_elite_too_high() {
        let config = EaConfig::default()
            .with_population_size(10)
            .with_elite_ratio(1.0);
        assert!(config.validate().is_err());
        // Elites only matter for generational replacement.
        assert!(config.with_replacement(ReplacementKind::Plus).validate().is_ok());
    }

    #[test]
    fn test_validate_budget_and_time() {
        assert!(EaConfig::default().with_time_limit_ms(0).validate().is_err());
        assert!(EaConfig::default().with_time_limit_ms(1).validate().is_ok());
        assert!(EaConfig::default().with_max_evaluations(0).validate().is_err());
        assert!(EaConfig::default().with_max_evaluations(1).validate().is_ok());
        assert!(EaConfig::default()
            .with_replacement(ReplacementKind::Ep(1))
            .validate()
            .is_err());
    }

    #[test]
    fn test_clamp_rates() {
        let config = EaConfig::default()
            .with_elite_ratio(1.5)
            .with_crossover_rate(-0.5)
            .with_mutation_rate(2.0)
            .with_convergence_threshold(-0.5);

        assert!((config.elite_ratio - 1.0).abs() < 1e-10);
        assert!((config.crossover_rate - 0.0).abs() < 1e-10);
        assert!((config.mutation_rate - 1.0).abs() < 1e-10);
        assert!((config.convergence_threshold - 0.0).abs() < 1e-15);
    }

    #[test]
    fn test_offspring_count() {
        let config = EaConfig::default().with_population_size(20).with_elite_ratio(0.1);
        assert_eq!(config.elite_count(), 2);
        assert_eq!(config.offspring_count(), 18);
        assert_eq!(config.clone().with_replacement(ReplacementKind::Plus).offspring_count(), 20);
        assert_eq!(config.with_replacement(ReplacementKind::SteadyState).offspring_count(), 2);
    }

    #[test]
    fn test_presets_grow_with_problem_size() {
        let presets = [EaConfig::fast(), EaConfig::balanced(), EaConfig::quality()];
        for p in &presets {
            assert!(p.validate().is_ok());
            assert!(p.time_limit_ms.is_some());
        }
        assert!(presets.windows(2).all(|w| w[0].population_size < w[1].population_size));
        assert!(presets.windows(2).all(|w| w[0].max_generations < w[1].max_generations));

        assert_eq!(EaConfig::auto_select(49).population_size, presets[0].population_size);
        assert_eq!(EaConfig::auto_select(50).population_size, presets[1].population_size);
        assert_eq!(EaConfig::auto_select(199).population_size, presets[1].population_size);
        assert_eq!(EaConfig::auto_select(200).population_size, presets[2].population_size);
    }

    #[test]
    fn test_with_tournament_size_chainable() {
        let config = EaConfig::auto_select(100)
            .with_tournament_size(4)
            .with_seed(42);
        assert_eq!(config.selection, Selection::Tournament(4));
        assert_eq!(config.seed, Some(42));
    }
}
