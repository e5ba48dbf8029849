//! Particle swarm optimization.
//!
//! Same two levels as [`ea`](crate::ea):
//!
//! - [`EasyPso`]: the generic swarm loop, assembled from an evaluator, a
//!   [`Velocity`] rule, a [`Topology`] and a stopping criterion.
//! - [`PsoRunner`]: one call from an objective, box bounds and a
//!   [`PsoConfig`].
//!
//! # Key Types
//!
//! - [`Particle`]: position, velocity and best-known position/fitness
//! - [`StarTopology`], [`RingTopology`], [`RandomTopology`]: who informs whom
//! - [`StandardVelocity`]: inertia-weight update with optional clamping
//!
//! # References
//!
//! - Kennedy & Eberhart (1995), "Particle swarm optimization"
//! - Shi & Eberhart (1998), "A modified particle swarm optimizer"
//! - Clerc & Kennedy (2002), "The particle swarm: explosion, stability, and
//!   convergence in a multidimensional complex space"

mod config;
mod driver;
mod particle;
mod runner;
mod topology;
mod velocity;

pub use config::{PsoConfig, TopologyKind};
pub use driver::{EasyPso, PsoResult};
pub use particle::Particle;
pub use runner::PsoRunner;
pub use topology::{RandomTopology, RingTopology, StarTopology, Topology};
pub use velocity::{InertiaSchedule, StandardFlight, StandardVelocity, Velocity};
