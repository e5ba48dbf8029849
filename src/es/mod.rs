//! Evolution strategies.
//!
//! [`CmaRunner`] runs CMA-ES from an initial mean and a [`CmaConfig`]. The
//! building blocks ([`CmaState`](crate::distribution::CmaState),
//! [`CmaBreed`](crate::distribution::CmaBreed)) live in
//! [`distribution`](crate::distribution) and can be assembled by hand with
//! [`EasyEa`](crate::ea::EasyEa) for custom stopping rules or monitors.
//!
//! # References
//!
//! - Hansen & Ostermeier (2001), "Completely Derandomized Self-Adaptation
//!   in Evolution Strategies"
//! - Hansen (2016), "The CMA Evolution Strategy: A Tutorial"

mod config;
mod runner;

pub use config::CmaConfig;
pub use runner::{CmaResult, CmaRunner};
