//! CMA-ES runner configuration.

/// Configuration for [`CmaRunner`](super::CmaRunner).
///
/// The problem dimension comes from the initial mean passed to the runner.
///
/// # Builder Pattern
///
/// ```
/// use u_evolve::es::CmaConfig;
///
/// let config = CmaConfig::default()
///     .with_sigma(0.3)
///     .with_lambda(12)
///     .with_target_fitness(1e-8)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CmaConfig {
    /// Initial step size.
    ///
    /// A quarter to a third of the expected distance to the optimum is a
    /// good start.
    pub sigma: f64,

    /// Offspring per generation. `None` uses `4 + floor(3 ln n)`.
    pub lambda: Option<usize>,

    /// Maximum number of generations before termination.
    pub max_generations: usize,

    /// Optional cap on objective evaluations, initial population included.
    ///
    /// A budget below `lambda` ends the run right after the initial
    /// evaluation, with the samples evaluated so far.
    pub max_evaluations: Option<u64>,

    /// Stop as soon as the best objective value reaches this target
    /// (in the direction of the run).
    pub target_fitness: Option<f64>,

    /// Generations between eigendecompositions of the covariance.
    pub eigen_max_age: usize,

    /// Whether to evaluate offspring in parallel (needs the `parallel`
    /// cargo feature).
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,

    /// Optional wall-clock time limit in milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl Default for CmaConfig {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            lambda: None,
            max_generations: 1000,
            max_evaluations: None,
            target_fitness: None,
            eigen_max_age: 10,
            parallel: true,
            seed: None,
            time_limit_ms: None,
        }
    }
}

impl CmaConfig {
    /// Sets the initial step size.
    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Sets the number of offspring per generation.
    pub fn with_lambda(mut self, lambda: usize) -> Self {
        self.lambda = Some(lambda);
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the evaluation budget.
    pub fn with_max_evaluations(mut self, n: u64) -> Self {
        self.max_evaluations = Some(n);
        self
    }

    /// Sets the target objective value.
    pub fn with_target_fitness(mut self, target: f64) -> Self {
        self.target_fitness = Some(target);
        self
    }

    /// Sets the eigensystem refresh period (raised to at least 1).
    pub fn with_eigen_max_age(mut self, age: usize) -> Self {
        self.eigen_max_age = age.max(1);
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

    /// Preset for fast optimization.
    ///
    /// - Generations: 200, Time limit: 10s
    pub fn fast() -> Self {
        Self {
            max_generations: 200,
            time_limit_ms: Some(10_000),
            ..Self::default()
        }
    }

    /// Preset for balanced optimization.
    ///
    /// - Generations: 1000, Time limit: 30s
    pub fn balanced() -> Self {
        Self {
            max_generations: 1000,
            time_limit_ms: Some(30_000),
            ..Self::default()
        }
    }

    /// Preset for quality optimization: more generations and eigensystem
    /// refreshed every generation.
    ///
    /// - Generations: 5000, Time limit: 60s
    pub fn quality() -> Self {
        Self {
            max_generations: 5000,
            eigen_max_age: 1,
            time_limit_ms: Some(60_000),
            ..Self::default()
        }
    }

    /// Automatically selects a preset based on problem dimension.
    ///
    /// - `dimension < 10` → [`fast()`](Self::fast)
    /// - `10 ≤ dimension < 50` → [`balanced()`](Self::balanced)
    /// - `dimension ≥ 50` → [`quality()`](Self::quality)
    pub fn auto_select(dimension: usize) -> Self {
        if dimension < 10 {
            Self::fast()
        } else if dimension < 50 {
            Self::balanced()
        } else {
            Self::quality()
        }
    }

    /// Offspring per generation for a problem of `dimension`.
    pub fn lambda_for(&self, dimension: usize) -> usize {
        self.lambda
            .unwrap_or_else(|| crate::distribution::CmaParams::default_lambda(dimension))
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.sigma > 0.0) || !self.sigma.is_finite() {
            return Err("sigma must be finite and positive".into());
        }
        if let Some(lambda) = self.lambda {
            if lambda < 2 {
                return Err("lambda must be at least 2".into());
            }
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        if self.eigen_max_age == 0 {
            return Err("eigen_max_age must be at least 1".into());
        }
        if self.target_fitness.is_some_and(f64::is_nan) {
            return Err("target_fitness must not be NaN".into());
        }
        if self.time_limit_ms == Some(0) {
            return Err("time_limit_ms must be positive or None".into());
        }
        if self.max_evaluations == Some(0) {
            return Err("max_evaluations must be positive or None".into());
        }
        Ok(())
    }
}
