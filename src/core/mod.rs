//! Core data model: fitness, individuals, populations.
//!
//! # Core Traits
//!
//! - [`Fitness`]: totally ordered fitness, greater is better
//! - [`Individual`]: a genome plus a fitness that may be invalid
//!
//! # Key Types
//!
//! - [`Minimizing`] / [`Maximizing`]: scalar fitness with the direction in the type
//! - [`Candidate`]: the standard individual
//! - [`Population`]: ordered, duplicate-friendly collection of individuals

mod fitness;
mod individual;
mod population;

pub use fitness::{Direction, Fitness, Maximizing, Minimizing};
pub use individual::{Candidate, Individual};
pub use population::Population;

#[cfg(test)]
pub(crate) use population::test_support;
