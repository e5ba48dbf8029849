//! Seedable random source.
//!
//! Every stochastic operator in the crate receives an explicit
//! `&mut RandomSource`. A process-wide instance is available through
//! [`with_global`] for convenience, but nothing in the engine reaches for it
//! implicitly.
//!
//! The generator is PCG-64 (`rand_pcg::Pcg64`), a fully specified
//! algorithm: the same seed yields the same sequence on every platform.

use crate::error::{EvoError, Result};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use rand_pcg::Pcg64;
use std::sync::{Mutex, OnceLock};

/// Seedable uniform/normal variate generator.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: Pcg64,
    seed: u64,
}

impl RandomSource {
    /// Creates a source from a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
            seed,
        }
    }

    /// Creates a source seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// Restarts the sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Pcg64::seed_from_u64(seed);
        self.seed = seed;
    }

    /// The seed this source was last (re)started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform draw in `[low, high)`.
    ///
    /// Returns `low` when `low == high`.
    ///
    /// # Errors
    /// [`EvoError::InvalidRange`] if `low > high` or a bound is not finite.
    pub fn uniform(&mut self, low: f64, high: f64) -> Result<f64> {
        if !(low.is_finite() && high.is_finite()) || low > high {
            return Err(EvoError::InvalidRange { low, high });
        }
        let u: f64 = self.rng.random();
        let x = low + (high - low) * u;
        // Rounding can land exactly on `high` for very wide ranges.
        Ok(if x >= high && high > low { low } else { x })
    }

    /// Uniform draw in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.random()
    }

    /// Sample from N(mean, variance).
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] if `variance` is negative or not finite.
    pub fn normal(&mut self, mean: f64, variance: f64) -> Result<f64> {
        if !(variance >= 0.0) || !variance.is_finite() {
            return Err(EvoError::contract(format!(
                "normal variance must be finite and >= 0, got {variance}"
            )));
        }
        Ok(mean + variance.sqrt() * self.standard_normal())
    }

    /// Sample from N(0, 1).
    pub fn standard_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.rng)
    }

    /// Uniform integer in `[0, n)`.
    ///
    /// # Panics
    /// Panics if `n == 0`.
    pub fn integer(&mut self, n: usize) -> usize {
        assert!(n > 0, "integer(n) requires n > 0");
        self.rng.random_range(0..n)
    }

    /// Bernoulli trial with success probability `p` (clamped to `[0, 1]`).
    pub fn flip(&mut self, p: f64) -> bool {
        self.unit() < p.clamp(0.0, 1.0)
    }

    /// Shuffles `items` in place, driven by this source.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

impl RngCore for RandomSource {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.rng.fill_bytes(dst)
    }
}

/// Creates a seeded source.
pub fn create_rng(seed: u64) -> RandomSource {
    RandomSource::new(seed)
}

fn global() -> &'static Mutex<RandomSource> {
    static GLOBAL: OnceLock<Mutex<RandomSource>> = OnceLock::new();
    GLOBAL.get_or_init(|| Mutex::new(RandomSource::from_entropy()))
}

/// Runs `f` with exclusive access to the process-wide source.
///
/// Access is serialized by a mutex; workers that sample concurrently should
/// own their own [`RandomSource`] instead.
pub fn with_global<T>(f: impl FnOnce(&mut RandomSource) -> T) -> T {
    let mut guard = global().lock().unwrap_or_else(|e| e.into_inner());
    f(&mut guard)
}

/// Reseeds the process-wide source.
pub fn reseed_global(seed: u64) {
    with_global(|rng| rng.reseed(seed));
}
