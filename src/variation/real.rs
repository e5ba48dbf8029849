//! Operators for real-vector genomes (`Candidate<Vec<f64>, F>`).
//!
//! # Operators
//!
//! - [`NormalMutation`]: Gaussian perturbation `x_i += sigma * N(0, 1)`
//! - [`UniformMutation`]: uniform perturbation in `[x_i - eps, x_i + eps]`
//! - [`SegmentCrossover`]: BLX-alpha style blend of two parents
//! - [`RealInitBounded`]: uniform initializer inside a box
//!
//! Mutation and crossover accept optional per-dimension bounds. Values
//! leaving the box are folded back in by reflection on the bounds (see
//! [`fold_in_bounds`]).
//!
//! # References
//!
//! - Eshelman & Schaffer (1993), "Real-Coded Genetic Algorithms and
//!   Interval-Schemata"
//! - Bäck (1996), "Evolutionary Algorithms in Theory and Practice"

use super::{MonOp, QuadOp};
use crate::core::{Candidate, Fitness, Population};
use crate::error::{EvoError, Result};
use crate::random::RandomSource;

/// Reflects `x` into `[low, high]`.
///
/// Repeated reflection is applied for values more than one width outside
/// the interval. A zero-width interval returns `low`.
///
/// ```
/// use u_evolve::variation::fold_in_bounds;
///
/// assert_eq!(fold_in_bounds(1.5, 0.0, 1.0), 0.5);
/// assert_eq!(fold_in_bounds(-0.25, 0.0, 1.0), 0.25);
/// assert_eq!(fold_in_bounds(0.5, 0.0, 1.0), 0.5);
/// ```
pub fn fold_in_bounds(x: f64, low: f64, high: f64) -> f64 {
    let width = high - low;
    if !(width > 0.0) {
        return low;
    }
    if (low..=high).contains(&x) {
        return x;
    }
    let t = (x - low).rem_euclid(2.0 * width);
    if t > width {
        low + 2.0 * width - t
    } else {
        low + t
    }
}

fn check_bounds(bounds: &[(f64, f64)]) -> Result<()> {
    for &(low, high) in bounds {
        if !(low.is_finite() && high.is_finite()) || low > high {
            return Err(EvoError::InvalidRange { low, high });
        }
    }
    Ok(())
}

fn fold_gene(bounds: &Option<Vec<(f64, f64)>>, i: usize, x: f64) -> f64 {
    match bounds.as_ref().and_then(|b| b.get(i)) {
        Some(&(low, high)) => fold_in_bounds(x, low, high),
        None => x,
    }
}

/// Gaussian mutation.
///
/// Each gene is perturbed with probability `p_change` (default 1) by
/// `sigma * N(0, 1)`.
#[derive(Debug, Clone)]
pub struct NormalMutation {
    sigma: f64,
    p_change: f64,
    bounds: Option<Vec<(f64, f64)>>,
}

impl NormalMutation {
    /// Creates a mutation with step `sigma`.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] if `sigma` is negative or not finite.
    pub fn new(sigma: f64) -> Result<Self> {
        if !(sigma >= 0.0) || !sigma.is_finite() {
            return Err(EvoError::contract(format!(
                "mutation sigma must be finite and >= 0, got {sigma}"
            )));
        }
        Ok(Self {
            sigma,
            p_change: 1.0,
            bounds: None,
        })
    }

    /// Per-gene mutation probability, clamped to `[0, 1]`.
    pub fn with_gene_probability(mut self, p: f64) -> Self {
        self.p_change = p.clamp(0.0, 1.0);
        self
    }

    /// Folds mutated genes into `bounds` (one `(low, high)` per dimension).
    pub fn with_bounds(mut self, bounds: Vec<(f64, f64)>) -> Result<Self> {
        check_bounds(&bounds)?;
        self.bounds = Some(bounds);
        Ok(self)
    }

    /// The mutation step.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl<F: Fitness> MonOp<Candidate<Vec<f64>, F>> for NormalMutation {
    fn apply(&mut self, ind: &mut Candidate<Vec<f64>, F>, rng: &mut RandomSource) -> bool {
        let mut changed = false;
        for i in 0..ind.genes().len() {
            if rng.flip(self.p_change) {
                let x = ind.genes()[i] + self.sigma * rng.standard_normal();
                ind.genes_mut()[i] = fold_gene(&self.bounds, i, x);
                changed = true;
            }
        }
        changed
    }
}

/// Uniform mutation: each gene moves uniformly within `±epsilon` with
/// probability `p_change`.
#[derive(Debug, Clone)]
pub struct UniformMutation {
    epsilon: f64,
    p_change: f64,
    bounds: Option<Vec<(f64, f64)>>,
}

impl UniformMutation {
    /// Creates a mutation with half-width `epsilon`.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] if `epsilon` is negative or not
    /// finite.
    pub fn new(epsilon: f64) -> Result<Self> {
        if !(epsilon >= 0.0) || !epsilon.is_finite() {
            return Err(EvoError::contract(format!(
                "mutation epsilon must be finite and >= 0, got {epsilon}"
            )));
        }
        Ok(Self {
            epsilon,
            p_change: 1.0,
            bounds: None,
        })
    }

    /// Per-gene mutation probability, clamped to `[0, 1]`.
    pub fn with_gene_probability(mut self, p: f64) -> Self {
        self.p_change = p.clamp(0.0, 1.0);
        self
    }

    /// Folds mutated genes into `bounds`.
    pub fn with_bounds(mut self, bounds: Vec<(f64, f64)>) -> Result<Self> {
        check_bounds(&bounds)?;
        self.bounds = Some(bounds);
        Ok(self)
    }
}

impl<F: Fitness> MonOp<Candidate<Vec<f64>, F>> for UniformMutation {
    fn apply(&mut self, ind: &mut Candidate<Vec<f64>, F>, rng: &mut RandomSource) -> bool {
        let mut changed = false;
        for i in 0..ind.genes().len() {
            if rng.flip(self.p_change) {
                let x = ind.genes()[i] + self.epsilon * (2.0 * rng.unit() - 1.0);
                ind.genes_mut()[i] = fold_gene(&self.bounds, i, x);
                changed = true;
            }
        }
        changed
    }
}

/// Segment (BLX-alpha) crossover.
///
/// A single factor `r ~ U(-alpha, 1 + alpha)` is drawn per pair and both
/// children are placed on the line through the parents:
///
/// ```text
/// a' = r * a + (1 - r) * b
/// b' = (1 - r) * a + r * b
/// ```
///
/// `alpha = 0` keeps children inside the parents' segment.
#[derive(Debug, Clone)]
pub struct SegmentCrossover {
    alpha: f64,
    bounds: Option<Vec<(f64, f64)>>,
}

impl SegmentCrossover {
    /// Creates a crossover with extension `alpha` (negative values become 0).
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: if alpha.is_finite() { alpha.max(0.0) } else { 0.0 },
            bounds: None,
        }
    }

    /// Folds children into `bounds`.
    pub fn with_bounds(mut self, bounds: Vec<(f64, f64)>) -> Result<Self> {
        check_bounds(&bounds)?;
        self.bounds = Some(bounds);
        Ok(self)
    }
}

impl Default for SegmentCrossover {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl<F: Fitness> QuadOp<Candidate<Vec<f64>, F>> for SegmentCrossover {
    /// # Panics
    /// Panics if the parents have different lengths.
    fn apply(
        &mut self,
        a: &mut Candidate<Vec<f64>, F>,
        b: &mut Candidate<Vec<f64>, F>,
        rng: &mut RandomSource,
    ) -> bool {
        let n = a.genes().len();
        assert_eq!(n, b.genes().len(), "parents must have equal length");
        if n == 0 || a.genes() == b.genes() {
            return false;
        }

        let r = -self.alpha + (1.0 + 2.0 * self.alpha) * rng.unit();
        let (ga, gb) = (a.genes_mut(), b.genes_mut());
        for i in 0..n {
            let (x, y) = (ga[i], gb[i]);
            ga[i] = fold_gene(&self.bounds, i, r * x + (1.0 - r) * y);
            gb[i] = fold_gene(&self.bounds, i, (1.0 - r) * x + r * y);
        }
        true
    }
}

/// Uniform initializer for real vectors inside a box.
///
/// # Examples
///
/// ```
/// use u_evolve::core::{Candidate, Individual, Minimizing};
/// use u_evolve::random::RandomSource;
/// use u_evolve::variation::RealInitBounded;
///
/// let init = RealInitBounded::new(vec![(-5.0, 5.0); 2]).unwrap();
/// let mut rng = RandomSource::new(7);
/// let pop = init.population::<Minimizing>(20, &mut rng).unwrap();
/// assert_eq!(pop.len(), 20);
/// assert!(pop.iter().all(|c| !c.is_valid()));
/// ```
#[derive(Debug, Clone)]
pub struct RealInitBounded {
    bounds: Vec<(f64, f64)>,
}

impl RealInitBounded {
    /// Creates an initializer over `bounds` (one `(low, high)` per dimension).
    ///
    /// # Errors
    /// [`EvoError::InvalidRange`] if a bound has `low > high` or is not
    /// finite.
    pub fn new(bounds: Vec<(f64, f64)>) -> Result<Self> {
        check_bounds(&bounds)?;
        Ok(Self { bounds })
    }

    /// Number of dimensions.
    pub fn dimension(&self) -> usize {
        self.bounds.len()
    }

    /// The box.
    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    /// Draws one genome.
    pub fn genes(&self, rng: &mut RandomSource) -> Result<Vec<f64>> {
        self.bounds
            .iter()
            .map(|&(low, high)| rng.uniform(low, high))
            .collect()
    }

    /// Draws one invalid candidate.
    pub fn init<F: Fitness>(&self, rng: &mut RandomSource) -> Result<Candidate<Vec<f64>, F>> {
        Ok(Candidate::new(self.genes(rng)?))
    }

    /// Draws `n` invalid candidates.
    pub fn population<F: Fitness>(
        &self,
        n: usize,
        rng: &mut RandomSource,
    ) -> Result<Population<Candidate<Vec<f64>, F>>> {
        (0..n).map(|_| self.init(rng)).collect()
    }
}
