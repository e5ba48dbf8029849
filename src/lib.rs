//! Composable evolutionary computation engine.
//!
//! Provides the building blocks of population-based stochastic
//! optimization and a few ready-made drivers on top of them:
//!
//! - **Genetic algorithms**: selection, crossover and mutation assembled
//!   by [`ea::EasyEa`], or one call through [`ea::EaRunner`].
//! - **Evolution strategies**: CMA-ES through [`es::CmaRunner`].
//! - **Estimation of distribution**: normal and uniform models sampled by
//!   [`distribution::SamplerBreed`].
//! - **Particle swarm optimization**: [`pso::EasyPso`] with star, ring and
//!   random topologies, or one call through [`pso::PsoRunner`].
//!
//! # Architecture
//!
//! The engine is generic over the individual type ([`core::Individual`])
//! and never computes fitness itself: a user-supplied
//! [`eval::Objective`] is applied to invalid individuals only. Fitness is
//! totally ordered with "greater is better"; [`core::Minimizing`] and
//! [`core::Maximizing`] map raw objective values onto that order.
//!
//! Every stochastic operator takes an explicit
//! [`random::RandomSource`], so a run is reproducible from its seed.
//!
//! Operators report broken preconditions as
//! [`error::EvoError::ContractViolation`]; drivers turn budget exhaustion
//! and operator failures into a [`ea::Termination`] and keep the last
//! complete population.
//!
//! # Logging
//!
//! The crate emits [`tracing`] events (parameter corrections at `warn`,
//! stopping criteria at `info`, per-generation summaries at `debug`) and
//! installs no subscriber.

pub mod continuation;
pub mod core;
pub mod distribution;
pub mod ea;
pub mod error;
pub mod es;
pub mod eval;
pub mod monitor;
pub mod pso;
pub mod random;
pub mod replace;
pub mod select;
pub mod variation;
