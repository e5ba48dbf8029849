//! Estimation-of-distribution machinery.
//!
//! A [`Distribution`] is estimated from a ranked sample of real vectors
//! (best first) and then sampled to produce new candidates.
//!
//! # Implementations
//!
//! - [`NormalMono`]: independent normal per dimension (diagonal covariance)
//! - [`NormalMulti`]: full covariance, sampled through its Cholesky factor
//! - [`UniformBox`]: axis-aligned bounding box of the sample
//! - [`CmaState`]: covariance matrix adaptation (Hansen & Ostermeier 2001)
//!
//! # Breeders
//!
//! - [`SamplerBreed`]: select, estimate, sample `lambda` (a plain EDA step)
//! - [`CmaBreed`]: the CMA-ES generation step
//!
//! [`VarianceContinue`] stops a run once the population has collapsed.
//!
//! # References
//!
//! - Larrañaga & Lozano (2002), "Estimation of Distribution Algorithms"
//! - Hansen (2016), "The CMA Evolution Strategy: A Tutorial"

mod breed;
mod cma;
mod normal;
mod stop;
mod uniform;

pub use breed::{CmaBreed, SamplerBreed};
pub use cma::{CmaParams, CmaState};
pub use normal::{NormalMono, NormalMulti};
pub use stop::VarianceContinue;
pub use uniform::UniformBox;

use crate::error::{EvoError, Result};
use crate::random::RandomSource;

/// A parametric distribution over real vectors.
pub trait Distribution {
    /// Number of dimensions.
    fn dimension(&self) -> usize;

    /// Re-estimates the parameters from `sample`, ranked best first.
    ///
    /// Duplicated points count with their natural weight.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] if `sample` is empty or a point has
    /// the wrong dimension.
    fn estimate(&mut self, sample: &[&[f64]]) -> Result<()>;

    /// Draws one point.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] if the distribution has dimension 0.
    fn sample(&self, rng: &mut RandomSource) -> Result<Vec<f64>>;
}

/// Checks that `sample` is non-empty and every point has `dimension`
/// coordinates.
pub(crate) fn check_sample(sample: &[&[f64]], dimension: usize) -> Result<()> {
    if sample.is_empty() {
        return Err(EvoError::contract("cannot estimate from an empty sample"));
    }
    if let Some(p) = sample.iter().find(|p| p.len() != dimension) {
        return Err(EvoError::contract(format!(
            "sample point has dimension {}, expected {dimension}",
            p.len()
        )));
    }
    Ok(())
}

pub(crate) fn check_dimension(dimension: usize) -> Result<()> {
    if dimension == 0 {
        Err(EvoError::contract("cannot sample a 0-dimensional distribution"))
    } else {
        Ok(())
    }
}
