//! Swarm runner configuration.

/// Social structure built by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TopologyKind {
    /// Global best.
    #[default]
    Star,
    /// Ring neighbourhoods of the given size.
    Ring(usize),
    /// Random informants, rebuilt every generation.
    Random(usize),
}

/// Configuration for [`PsoRunner`](super::PsoRunner).
///
/// The default coefficients are the constriction-equivalent values of
/// Clerc and Kennedy (2002): `w = 0.7298`, `c1 = c2 = 1.49445`.
///
/// # Builder Pattern
///
/// ```
/// use u_evolve::pso::{PsoConfig, TopologyKind};
///
/// let config = PsoConfig::default()
///     .with_swarm_size(30)
///     .with_topology(TopologyKind::Ring(3))
///     .with_inertia_schedule(0.9, 0.4)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct PsoConfig {
    /// Number of particles.
    pub swarm_size: usize,

    /// Maximum number of generations before termination.
    pub max_generations: usize,

    /// Inertia weight (start value when `inertia_end` is set).
    pub inertia: f64,

    /// Final inertia of a linearly decreasing schedule over
    /// `max_generations`. `None` keeps the inertia constant.
    pub inertia_end: Option<f64>,

    /// Cognitive coefficient (attraction to the particle's own best).
    pub cognitive: f64,

    /// Social coefficient (attraction to the neighbourhood best).
    pub social: f64,

    /// Neighbourhood structure.
    pub topology: TopologyKind,

    /// Speed limit per dimension as a fraction of the search range width.
    ///
    /// Also bounds the random initial velocities. Set to 0.0 to disable
    /// clamping and start at rest.
    pub velocity_clamp: f64,

    /// Number of generations with no significant improvement before stopping.
    ///
    /// Set to 0 to disable stagnation-based termination.
    pub stagnation_limit: usize,

    /// Minimum relative improvement to reset the stagnation counter.
    pub convergence_threshold: f64,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,

    /// Optional wall-clock time limit in milliseconds.
    pub time_limit_ms: Option<u64>,

    /// Optional cap on objective evaluations, initial swarm included.
    ///
    /// A budget below `swarm_size` ends the run right after the initial
    /// evaluation, with the particles evaluated so far.
    pub max_evaluations: Option<u64>,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            swarm_size: 40,
            max_generations: 200,
            inertia: 0.7298,
            inertia_end: None,
            cognitive: 1.49445,
            social: 1.49445,
            topology: TopologyKind::default(),
            velocity_clamp: 0.5,
            stagnation_limit: 50,
            convergence_threshold: 0.0,
            seed: None,
            time_limit_ms: None,
            max_evaluations: None,
        }
    }
}

impl PsoConfig {
    /// Sets the swarm size.
    pub fn with_swarm_size(mut self, n: usize) -> Self {
        self.swarm_size = n;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets a constant inertia weight.
    pub fn with_inertia(mut self, w: f64) -> Self {
        self.inertia = w;
        self.inertia_end = None;
        self
    }

    /// Sets a linearly decreasing inertia from `start` to `end`.
    pub fn with_inertia_schedule(mut self, start: f64, end: f64) -> Self {
        self.inertia = start;
        self.inertia_end = Some(end);
        self
    }

    /// Sets the cognitive and social coefficients.
    pub fn with_coefficients(mut self, cognitive: f64, social: f64) -> Self {
        self.cognitive = cognitive;
        self.social = social;
        self
    }

    /// Sets the topology.
    pub fn with_topology(mut self, topology: TopologyKind) -> Self {
        self.topology = topology;
        self
    }

    /// Sets the velocity clamp ratio (clamped to 0.0–1.0).
    pub fn with_velocity_clamp(mut self, ratio: f64) -> Self {
        self.velocity_clamp = ratio.clamp(0.0, 1.0);
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

    /// Preset for fast optimization.
    ///
    /// - Swarm: 20, Generations: 100, Time limit: 10s
    /// - Stagnation limit: 20
    pub fn fast() -> Self {
        Self {
            swarm_size: 20,
            max_generations: 100,
            stagnation_limit: 20,
            convergence_threshold: 0.001,
            time_limit_ms: Some(10_000),
            ..Self::default()
        }
    }

    /// Preset for balanced optimization.
    ///
    /// - Swarm: 40, Generations: 300, Ring(3), Time limit: 30s
    /// - Stagnation limit: 50
    pub fn balanced() -> Self {
        Self {
            swarm_size: 40,
            max_generations: 300,
            topology: TopologyKind::Ring(3),
            stagnation_limit: 50,
            convergence_threshold: 0.001,
            time_limit_ms: Some(30_000),
            ..Self::default()
        }
    }

    /// Preset for quality optimization.
    ///
    /// - Swarm: 80, Generations: 1000, Ring(3), inertia 0.9 → 0.4, Time limit: 60s
    /// - Stagnation limit: 100
    pub fn quality() -> Self {
        Self {
            swarm_size: 80,
            max_generations: 1000,
            inertia: 0.9,
            inertia_end: Some(0.4),
            topology: TopologyKind::Ring(3),
            stagnation_limit: 100,
            convergence_threshold: 0.0005,
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

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.swarm_size < 2 {
            return Err("swarm_size must be at least 2".into());
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        let coefficients = [
            Some(self.inertia),
            self.inertia_end,
            Some(self.cognitive),
            Some(self.social),
        ];
        if coefficients.iter().flatten().any(|c| !c.is_finite() || *c < 0.0) {
            return Err("inertia and coefficients must be finite and non-negative".into());
        }
        if !(0.0..=1.0).contains(&self.velocity_clamp) {
            return Err("velocity_clamp must be in [0, 1]".into());
        }
        if let TopologyKind::Ring(0) = self.topology {
            return Err("ring neighbourhood size must be at least 1".into());
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
        Ok(())
    }
}
