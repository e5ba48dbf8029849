//! Covariance matrix adaptation (CMA-ES state).
//!
//! # Algorithm (Hansen, 2016)
//!
//! Per generation, from the `mu` best of the last samples:
//!
//! 1. Weighted recombination of the steps `y_i = (x_i - m) / sigma`
//! 2. Conjugate evolution path `p_s` (uses `C^{-1/2}`) and step-size update
//!    by cumulative step-size adaptation
//! 3. Evolution path `p_c`, rank-one and rank-mu covariance update
//!
//! The eigendecomposition `C = B D^2 B^T` is refreshed lazily by
//! [`CmaState::update_eigen_system`]; sampling always uses the last valid
//! decomposition.
//!
//! # References
//!
//! - Hansen & Ostermeier (2001), "Completely Derandomized Self-Adaptation
//!   in Evolution Strategies"
//! - Hansen (2016), "The CMA Evolution Strategy: A Tutorial"

use super::{check_sample, Distribution};
use crate::error::{EvoError, Result};
use crate::random::RandomSource;
use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Strategy parameters, derived from the dimension and `lambda`.
#[derive(Debug, Clone, PartialEq)]
pub struct CmaParams {
    /// Problem dimension `n`.
    pub dimension: usize,
    /// Offspring per generation.
    pub lambda: usize,
    /// Number of parents used for recombination (`lambda / 2`).
    pub mu: usize,
    /// Recombination weights, decreasing, summing to 1.
    pub weights: Vec<f64>,
    /// Variance-effective selection mass.
    pub mu_eff: f64,
    /// Learning rate of the covariance evolution path.
    pub c_c: f64,
    /// Learning rate of the step-size evolution path.
    pub c_s: f64,
    /// Rank-one learning rate.
    pub c_1: f64,
    /// Rank-mu learning rate.
    pub c_mu: f64,
    /// Step-size damping.
    pub d_s: f64,
    /// Expected norm of an `n`-dimensional standard normal vector.
    pub chi_n: f64,
}

impl CmaParams {
    /// Default parameters for `dimension` and `lambda`.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] if `dimension == 0` or `lambda < 2`.
    pub fn new(dimension: usize, lambda: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(EvoError::contract("CMA dimension must be > 0"));
        }
        if lambda < 2 {
            return Err(EvoError::contract(format!(
                "CMA lambda must be >= 2, got {lambda}"
            )));
        }
        let n = dimension as f64;
        let mu = (lambda / 2).max(1);

        // w_i = ln(mu + 0.5) - ln(i + 1), normalized
        let raw: Vec<f64> = (0..mu)
            .map(|i| (mu as f64 + 0.5).ln() - ((i + 1) as f64).ln())
            .collect();
        let w_sum: f64 = raw.iter().sum();
        let weights: Vec<f64> = raw.iter().map(|w| w / w_sum).collect();
        let mu_eff = 1.0 / weights.iter().map(|w| w * w).sum::<f64>();

        let c_s = (mu_eff + 2.0) / (n + mu_eff + 5.0);
        let d_s = 1.0 + 2.0 * (((mu_eff - 1.0) / (n + 1.0)).sqrt() - 1.0).max(0.0) + c_s;
        let c_c = (4.0 + mu_eff / n) / (n + 4.0 + 2.0 * mu_eff / n);
        let c_1 = 2.0 / ((n + 1.3).powi(2) + mu_eff);
        let c_mu =
            (2.0 * (mu_eff - 2.0 + 1.0 / mu_eff) / ((n + 2.0).powi(2) + mu_eff)).min(1.0 - c_1);
        let chi_n = n.sqrt() * (1.0 - 1.0 / (4.0 * n) + 1.0 / (21.0 * n * n));

        Ok(Self {
            dimension,
            lambda,
            mu,
            weights,
            mu_eff,
            c_c,
            c_s,
            c_1,
            c_mu,
            d_s,
            chi_n,
        })
    }

    /// Hansen's default population size: `4 + floor(3 ln n)`.
    pub fn default_lambda(dimension: usize) -> usize {
        4 + (3.0 * (dimension.max(1) as f64).ln()).floor() as usize
    }
}

/// Mutable CMA-ES distribution state.
#[derive(Debug, Clone)]
pub struct CmaState {
    params: CmaParams,
    mean: DVector<f64>,
    sigma: f64,
    covariance: DMatrix<f64>,
    /// Eigenvectors of the covariance (columns).
    b: DMatrix<f64>,
    /// Square roots of the eigenvalues.
    d: DVector<f64>,
    p_c: DVector<f64>,
    p_s: DVector<f64>,
    generation: u64,
    eigen_age: usize,
}

impl CmaState {
    /// Creates a state centred on `initial_mean` with identity covariance.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] if the mean does not match the
    /// dimension or `initial_sigma` is not strictly positive.
    pub fn new(params: CmaParams, initial_mean: Vec<f64>, initial_sigma: f64) -> Result<Self> {
        let n = params.dimension;
        if initial_mean.len() != n {
            return Err(EvoError::contract(format!(
                "initial mean has {} dimensions, expected {n}",
                initial_mean.len()
            )));
        }
        if !(initial_sigma > 0.0) || !initial_sigma.is_finite() {
            return Err(EvoError::contract(format!(
                "initial sigma must be > 0, got {initial_sigma}"
            )));
        }
        Ok(Self {
            params,
            mean: DVector::from_vec(initial_mean),
            sigma: initial_sigma,
            covariance: DMatrix::identity(n, n),
            b: DMatrix::identity(n, n),
            d: DVector::from_element(n, 1.0),
            p_c: DVector::zeros(n),
            p_s: DVector::zeros(n),
            generation: 0,
            eigen_age: 0,
        })
    }

    /// Re-estimates the distribution from `ranked` (best first).
    ///
    /// Only the first `mu` points are used; with fewer points the weights
    /// are renormalized over what is available. When `best_fitness` equals
    /// `worst_fitness` the step size is increased by
    /// `exp(0.2 + c_s / d_s)` to escape the plateau.
    ///
    /// # Errors
    /// - [`EvoError::ContractViolation`] on an empty sample or a dimension
    ///   mismatch.
    /// - [`EvoError::NumericDegenerate`] if the update produced non-finite
    ///   values; the state is then left unchanged.
    pub fn reestimate(
        &mut self,
        ranked: &[&[f64]],
        best_fitness: f64,
        worst_fitness: f64,
    ) -> Result<()> {
        self.update(ranked)?;
        if best_fitness == worst_fitness {
            let p = &self.params;
            self.sigma *= (0.2 + p.c_s / p.d_s).exp();
            tracing::warn!(
                generation = self.generation,
                sigma = self.sigma,
                "flat fitness, increasing step size"
            );
        }
        Ok(())
    }

    fn update(&mut self, ranked: &[&[f64]]) -> Result<()> {
        let dim = self.params.dimension;
        check_sample(ranked, dim)?;
        let n = dim as f64;
        let CmaParams {
            c_c,
            c_s,
            c_1,
            c_mu,
            d_s,
            chi_n,
            ..
        } = self.params;

        let m = self.params.mu.min(ranked.len());
        let w_sum: f64 = self.params.weights[..m].iter().sum();
        let weights: Vec<f64> = self.params.weights[..m].iter().map(|w| w / w_sum).collect();
        let mu_eff = 1.0 / weights.iter().map(|w| w * w).sum::<f64>();

        let ys: Vec<DVector<f64>> = ranked[..m]
            .iter()
            .map(|x| (DVector::from_column_slice(x) - &self.mean) / self.sigma)
            .collect();
        let mut y_w: DVector<f64> = DVector::zeros(dim);
        for (w, y) in weights.iter().zip(&ys) {
            y_w += *w * y;
        }
        let new_mean = &self.mean + self.sigma * &y_w;

        // C^{-1/2} = B D^{-1} B^T from the cached decomposition.
        let inv_d = self.d.map(|v| 1.0 / v.max(1e-20));
        let c_inv_sqrt = &self.b * DMatrix::from_diagonal(&inv_d) * self.b.transpose();

        let p_s =
            (1.0 - c_s) * &self.p_s + (c_s * (2.0 - c_s) * mu_eff).sqrt() * (&c_inv_sqrt * &y_w);
        let p_s_norm = p_s.norm();

        let gen_factor = 1.0 - (1.0 - c_s).powf(2.0 * (self.generation as f64 + 1.0));
        let h_s = if p_s_norm / gen_factor.sqrt() < (1.4 + 2.0 / (n + 1.0)) * chi_n {
            1.0
        } else {
            0.0
        };

        let p_c = (1.0 - c_c) * &self.p_c + h_s * (c_c * (2.0 - c_c) * mu_eff).sqrt() * &y_w;

        let mut rank_mu: DMatrix<f64> = DMatrix::zeros(dim, dim);
        for (w, y) in weights.iter().zip(&ys) {
            rank_mu += *w * y * y.transpose();
        }

        let delta_h = (1.0 - h_s) * c_c * (2.0 - c_c);
        let base = 1.0 - c_1 - c_mu + c_1 * delta_h;
        let cov = base * &self.covariance + c_1 * &p_c * p_c.transpose() + c_mu * rank_mu;
        let cov = (&cov + cov.transpose()) * 0.5;

        let sigma = self.sigma * ((c_s / d_s) * (p_s_norm / chi_n - 1.0)).exp();

        let finite = sigma.is_finite()
            && sigma > 0.0
            && new_mean.iter().all(|v| v.is_finite())
            && cov.iter().all(|v| v.is_finite());
        if !finite {
            return Err(EvoError::NumericDegenerate(format!(
                "non-finite CMA update at generation {}",
                self.generation
            )));
        }

        self.mean = new_mean;
        self.p_s = p_s;
        self.p_c = p_c;
        self.covariance = cov;
        self.sigma = sigma;
        self.generation += 1;
        self.eigen_age += 1;
        Ok(())
    }

    /// Refreshes `B` and `D` from the covariance.
    ///
    /// Returns `Ok(false)` without doing anything while fewer than
    /// `max_age` re-estimations happened since the last decomposition.
    ///
    /// # Errors
    /// [`EvoError::NumericDegenerate`] if the decomposition fails or yields
    /// a non-positive eigenvalue. The previous `B` and `D` are kept and the
    /// decomposition is retried on the next call.
    pub fn update_eigen_system(&mut self, max_age: usize) -> Result<bool> {
        if self.eigen_age < max_age {
            return Ok(false);
        }
        let sym = (&self.covariance + self.covariance.transpose()) * 0.5;
        let eigen = SymmetricEigen::try_new(sym.clone(), f64::EPSILON, 0).ok_or_else(|| {
            EvoError::NumericDegenerate("eigendecomposition did not converge".into())
        })?;
        if let Some(v) = eigen.eigenvalues.iter().find(|v| !(**v > 0.0) || !v.is_finite()) {
            return Err(EvoError::NumericDegenerate(format!(
                "covariance eigenvalue {v} is not positive"
            )));
        }
        self.covariance = sym;
        self.d = eigen.eigenvalues.map(f64::sqrt);
        self.b = eigen.eigenvectors;
        self.eigen_age = 0;
        Ok(true)
    }

    /// Draws `mean + sigma * B (D ∘ z)` with `z ~ N(0, I)`.
    pub fn sample(&self, rng: &mut RandomSource) -> Vec<f64> {
        let z = DVector::from_fn(self.params.dimension, |_, _| rng.standard_normal());
        let x = &self.mean + self.sigma * (&self.b * self.d.component_mul(&z));
        x.iter().copied().collect()
    }

    /// Strategy parameters.
    pub fn params(&self) -> &CmaParams {
        &self.params
    }

    /// Current mean.
    pub fn mean(&self) -> &[f64] {
        self.mean.as_slice()
    }

    /// Current global step size.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Current covariance matrix.
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Eigenvalues of the last valid decomposition.
    pub fn eigenvalues(&self) -> Vec<f64> {
        self.d.iter().map(|d| d * d).collect()
    }

    /// Number of re-estimations so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Unranked use: the sample is taken as already ranked and the eigensystem
/// is refreshed after every estimate. A degenerate decomposition is logged
/// and the previous one kept.
impl Distribution for CmaState {
    fn dimension(&self) -> usize {
        self.params.dimension
    }

    fn estimate(&mut self, sample: &[&[f64]]) -> Result<()> {
        self.update(sample)?;
        match self.update_eigen_system(1) {
            Ok(_) => Ok(()),
            Err(EvoError::NumericDegenerate(msg)) => {
                tracing::warn!(%msg, "keeping previous eigensystem");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn sample(&self, rng: &mut RandomSource) -> Result<Vec<f64>> {
        Ok(CmaState::sample(self, rng))
    }
}
