//! Uniform distribution over an axis-aligned box.

use super::{check_dimension, check_sample, Distribution};
use crate::error::{EvoError, Result};
use crate::random::RandomSource;

/// Uniform distribution inside `[min_i, max_i]` per dimension.
///
/// Estimation takes the bounding box of the sample. A degenerate axis
/// (`min_i == max_i`) always samples its bound.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UniformBox {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl UniformBox {
    /// Creates a box from explicit bounds.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] on length mismatch,
    /// [`EvoError::InvalidRange`] if some `min_i > max_i`.
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Result<Self> {
        if min.len() != max.len() {
            return Err(EvoError::contract(format!(
                "min has {} dimensions, max has {}",
                min.len(),
                max.len()
            )));
        }
        for (&low, &high) in min.iter().zip(&max) {
            if !(low.is_finite() && high.is_finite()) || low > high {
                return Err(EvoError::InvalidRange { low, high });
            }
        }
        Ok(Self { min, max })
    }

    /// Unit box `[0, 1]^dimension`.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            min: vec![0.0; dimension],
            max: vec![1.0; dimension],
        }
    }

    /// Lower bounds.
    pub fn min(&self) -> &[f64] {
        &self.min
    }

    /// Upper bounds.
    pub fn max(&self) -> &[f64] {
        &self.max
    }
}

impl Distribution for UniformBox {
    fn dimension(&self) -> usize {
        self.min.len()
    }

    fn estimate(&mut self, sample: &[&[f64]]) -> Result<()> {
        check_sample(sample, self.dimension())?;
        for i in 0..self.dimension() {
            let (lo, hi) = sample
                .iter()
                .map(|p| p[i])
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                    (lo.min(x), hi.max(x))
                });
            self.min[i] = lo;
            self.max[i] = hi;
        }
        Ok(())
    }

    fn sample(&self, rng: &mut RandomSource) -> Result<Vec<f64>> {
        check_dimension(self.dimension())?;
        self.min
            .iter()
            .zip(&self.max)
            .map(|(&low, &high)| rng.uniform(low, high))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_bounding_box() {
        let a = [0.0, 5.0];
        let b = [2.0, 5.0];
        let c = [1.0, 5.0];
        let mut d = UniformBox::with_dimension(2);
        d.estimate(&[&a, &b, &c]).unwrap();
        assert_eq!(d.min(), &[0.0, 5.0]);
        assert_eq!(d.max(), &[2.0, 5.0]);

        let mut rng = RandomSource::new(42);
        for _ in 0..500 {
            let x = d.sample(&mut rng).unwrap();
            assert!((0.0..2.0).contains(&x[0]));
            assert_eq!(x[1], 5.0);
        }
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(matches!(
            UniformBox::new(vec![1.0], vec![0.0]),
            Err(EvoError::InvalidRange { .. })
        ));
        assert!(UniformBox::new(vec![0.0], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_empty_sample() {
        let mut d = UniformBox::with_dimension(1);
        assert!(d.estimate(&[]).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let d = UniformBox::new(vec![-1.0, 0.0], vec![1.0, 0.5]).unwrap();
        let back: UniformBox = serde_json::from_str(&serde_json::to_string(&d).unwrap()).unwrap();
        assert_eq!(back, d);
    }
}
