//! Evolutionary algorithm drivers.
//!
//! Two levels of entry point:
//!
//! - [`EasyEa`]: the generic generation loop, assembled from an evaluator,
//!   a breeder, a replacement and a stopping criterion. Any combination of
//!   the operators in this crate fits.
//! - [`EaRunner`]: one call from an [`EaProblem`] and an [`EaConfig`], for
//!   the common "selection + crossover + mutation" genetic algorithm.
//!
//! # Key Types
//!
//! - [`EaConfig`]: Algorithm parameters (population size, selection, presets)
//! - [`EaResult`]: Best individual, final population and run statistics
//! - [`Termination`]: Why the run stopped
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - De Jong (2006), *Evolutionary Computation: A Unified Approach*

mod config;
mod driver;
mod problem;
mod runner;

pub use config::{EaConfig, ReplacementKind};
pub use driver::{EaResult, EasyEa, Termination};
pub use problem::{EaIndividual, EaProblem};
pub use runner::EaRunner;
