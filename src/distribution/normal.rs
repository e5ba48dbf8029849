//! Normal distributions: diagonal and full covariance.

use super::{check_dimension, check_sample, Distribution};
use crate::error::{EvoError, Result};
use crate::random::RandomSource;
use nalgebra::{Cholesky, DMatrix, DVector};

/// Independent normal distribution per dimension.
///
/// Each coordinate is sampled as `x_i ~ N(mean_i, variance_i)`. The
/// estimate uses the population variance (divide by `n`), so a sample of
/// identical points yields zero variance and sampling then returns that
/// point exactly.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalMono {
    mean: Vec<f64>,
    variance: Vec<f64>,
    min_variance: f64,
}

impl NormalMono {
    /// Creates a distribution from explicit parameters.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] on length mismatch or a negative
    /// (or non-finite) variance.
    pub fn new(mean: Vec<f64>, variance: Vec<f64>) -> Result<Self> {
        if mean.len() != variance.len() {
            return Err(EvoError::contract(format!(
                "mean has {} dimensions, variance has {}",
                mean.len(),
                variance.len()
            )));
        }
        if let Some(v) = variance.iter().find(|v| !(**v >= 0.0) || !v.is_finite()) {
            return Err(EvoError::contract(format!(
                "variance must be finite and >= 0, got {v}"
            )));
        }
        Ok(Self {
            mean,
            variance,
            min_variance: 0.0,
        })
    }

    /// Standard normal in `dimension` dimensions.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            mean: vec![0.0; dimension],
            variance: vec![1.0; dimension],
            min_variance: 0.0,
        }
    }

    /// Floors every estimated variance at `v` (negative values become 0).
    pub fn with_min_variance(mut self, v: f64) -> Self {
        self.min_variance = if v.is_finite() { v.max(0.0) } else { 0.0 };
        self
    }

    /// Per-dimension mean.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Per-dimension variance.
    pub fn variance(&self) -> &[f64] {
        &self.variance
    }
}

impl Distribution for NormalMono {
    fn dimension(&self) -> usize {
        self.mean.len()
    }

    fn estimate(&mut self, sample: &[&[f64]]) -> Result<()> {
        let dim = self.dimension();
        check_sample(sample, dim)?;
        let n = sample.len() as f64;

        for i in 0..dim {
            let first = sample[0][i];
            if sample.iter().all(|p| p[i] == first) {
                // Summation rounding must not move a collapsed axis.
                self.mean[i] = first;
                self.variance[i] = self.min_variance;
                continue;
            }
            let mean = sample.iter().map(|p| p[i]).sum::<f64>() / n;
            let var = sample.iter().map(|p| (p[i] - mean).powi(2)).sum::<f64>() / n;
            self.mean[i] = mean;
            self.variance[i] = var.max(self.min_variance);
        }
        Ok(())
    }

    fn sample(&self, rng: &mut RandomSource) -> Result<Vec<f64>> {
        check_dimension(self.dimension())?;
        self.mean
            .iter()
            .zip(&self.variance)
            .map(|(&m, &v)| rng.normal(m, v))
            .collect()
    }
}

/// Multivariate normal with full covariance.
///
/// Sampling draws `z ~ N(0, I)` and returns `mean + L z` where `L` is the
/// lower Cholesky factor of the covariance. An estimate that is not
/// positive definite gets a small diagonal jitter and one retry; if that
/// still fails the previous parameters are kept and
/// [`EvoError::NumericDegenerate`] is returned. A zero covariance (all
/// points identical) is accepted as is and samples the mean exactly.
#[derive(Debug, Clone)]
pub struct NormalMulti {
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
    factor: DMatrix<f64>,
}

const JITTER: f64 = 1e-10;

impl NormalMulti {
    /// Creates a distribution from a mean and a covariance matrix.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] on shape mismatch or a negative
    /// diagonal entry, [`EvoError::NumericDegenerate`] if the covariance
    /// cannot be factored.
    pub fn new(mean: Vec<f64>, covariance: DMatrix<f64>) -> Result<Self> {
        let n = mean.len();
        if covariance.nrows() != n || covariance.ncols() != n {
            return Err(EvoError::contract(format!(
                "covariance is {}x{}, expected {n}x{n}",
                covariance.nrows(),
                covariance.ncols()
            )));
        }
        if let Some(d) = covariance.diagonal().iter().find(|d| !(**d >= 0.0)) {
            return Err(EvoError::contract(format!(
                "covariance diagonal must be >= 0, got {d}"
            )));
        }
        let factor = factorize(&covariance)?;
        Ok(Self {
            mean: DVector::from_vec(mean),
            covariance,
            factor,
        })
    }

    /// Standard normal in `dimension` dimensions.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            mean: DVector::zeros(dimension),
            covariance: DMatrix::identity(dimension, dimension),
            factor: DMatrix::identity(dimension, dimension),
        }
    }

    /// The mean vector.
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// The covariance matrix.
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }
}

/// Lower Cholesky factor, with one jittered retry.
fn factorize(cov: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    if cov.iter().any(|v| !v.is_finite()) {
        return Err(EvoError::NumericDegenerate("covariance is not finite".into()));
    }
    let n = cov.nrows();
    let max_diag = cov.diagonal().iter().copied().fold(0.0, f64::max);
    if max_diag == 0.0 {
        return Ok(DMatrix::zeros(n, n));
    }
    if let Some(chol) = Cholesky::new(cov.clone()) {
        return Ok(chol.l());
    }
    let mut jittered = cov.clone();
    for i in 0..n {
        jittered[(i, i)] += JITTER * max_diag;
    }
    Cholesky::new(jittered)
        .map(|chol| chol.l())
        .ok_or_else(|| EvoError::NumericDegenerate("covariance is not positive definite".into()))
}

impl Distribution for NormalMulti {
    fn dimension(&self) -> usize {
        self.mean.len()
    }

    fn estimate(&mut self, sample: &[&[f64]]) -> Result<()> {
        let dim = self.dimension();
        check_sample(sample, dim)?;
        let n = sample.len() as f64;

        let mut mean: DVector<f64> = DVector::zeros(dim);
        for p in sample {
            mean += DVector::from_column_slice(p);
        }
        mean /= n;

        let mut cov: DMatrix<f64> = DMatrix::zeros(dim, dim);
        for p in sample {
            let diff = DVector::from_column_slice(p) - &mean;
            cov += &diff * diff.transpose();
        }
        cov /= n;

        if mean.iter().any(|v| !v.is_finite()) {
            return Err(EvoError::NumericDegenerate("mean is not finite".into()));
        }
        let factor = factorize(&cov)?;
        self.mean = mean;
        self.covariance = cov;
        self.factor = factor;
        Ok(())
    }

    fn sample(&self, rng: &mut RandomSource) -> Result<Vec<f64>> {
        let dim = self.dimension();
        check_dimension(dim)?;
        let z = DVector::from_fn(dim, |_, _| rng.standard_normal());
        let x = &self.mean + &self.factor * z;
        Ok(x.iter().copied().collect())
    }
}
