//! Variation operators and breeders.
//!
//! # Operator traits
//!
//! - [`MonOp`]: modifies one individual (mutation)
//! - [`BinOp`]: modifies one individual using a second, read-only one
//! - [`QuadOp`]: modifies two individuals together (crossover)
//!
//! Every operator returns `true` when it changed its argument(s). The
//! operator itself need not touch the fitness; the wrappers in this module
//! ([`SgaTransform`]) invalidate whatever was reported as changed. Plain
//! closures implement the traits, so ad-hoc operators need no struct.
//!
//! # Population level
//!
//! - [`Transform`]: in-place transformation of a population
//! - [`Breed`]: parents in, offspring out
//! - [`SelectTransform`]: one selection pass followed by one transform pass
//!
//! Distribution-based breeders live in [`crate::distribution`].

mod real;
mod transform;

pub use real::{
    fold_in_bounds, NormalMutation, RealInitBounded, SegmentCrossover, UniformMutation,
};
pub use transform::{SelectTransform, SgaTransform};

use crate::core::{Individual, Population};
use crate::error::Result;
use crate::random::RandomSource;

/// Unary operator (typically a mutation).
pub trait MonOp<I> {
    /// Modifies `ind`; returns `true` if it changed.
    fn apply(&mut self, ind: &mut I, rng: &mut RandomSource) -> bool;
}

impl<I, T> MonOp<I> for T
where
    T: FnMut(&mut I, &mut RandomSource) -> bool,
{
    fn apply(&mut self, ind: &mut I, rng: &mut RandomSource) -> bool {
        self(ind, rng)
    }
}

/// Binary operator: modifies the first argument only.
pub trait BinOp<I> {
    /// Modifies `ind` using `other`; returns `true` if `ind` changed.
    fn apply(&mut self, ind: &mut I, other: &I, rng: &mut RandomSource) -> bool;
}

impl<I, T> BinOp<I> for T
where
    T: FnMut(&mut I, &I, &mut RandomSource) -> bool,
{
    fn apply(&mut self, ind: &mut I, other: &I, rng: &mut RandomSource) -> bool {
        self(ind, other, rng)
    }
}

/// Quadratic operator: modifies both arguments (typically a crossover).
pub trait QuadOp<I> {
    /// Modifies `a` and `b`; returns `true` if either changed.
    fn apply(&mut self, a: &mut I, b: &mut I, rng: &mut RandomSource) -> bool;
}

impl<I, T> QuadOp<I> for T
where
    T: FnMut(&mut I, &mut I, &mut RandomSource) -> bool,
{
    fn apply(&mut self, a: &mut I, b: &mut I, rng: &mut RandomSource) -> bool {
        self(a, b, rng)
    }
}

/// In-place transformation of a population.
pub trait Transform<I: Individual> {
    /// Transforms `pop`.
    fn transform(&mut self, pop: &mut Population<I>, rng: &mut RandomSource) -> Result<()>;
}

/// Produces offspring from a parent population.
pub trait Breed<I: Individual> {
    /// Returns the offspring. Offspring that differ from their source are
    /// invalid.
    fn breed(&mut self, parents: &[I], rng: &mut RandomSource) -> Result<Population<I>>;
}
