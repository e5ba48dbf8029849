//! Fitness values with a type-level optimization direction.
//!
//! Every fitness type is totally ordered so that **greater means better**,
//! whatever the direction of the underlying objective. Minimization is
//! therefore a different type ([`Minimizing`]) rather than a runtime flag,
//! and operators can compare with `>` without knowing the direction.

use std::cmp::Ordering;

/// Optimization direction of a fitness type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Lower objective values are better.
    Minimize,
    /// Higher objective values are better.
    Maximize,
}

/// Marker trait for fitness values.
///
/// The `Ord` implementation must rank better fitness as greater.
/// `NaN` objective values rank as the worst possible fitness.
pub trait Fitness: Copy + Ord + Send + Sync + std::fmt::Debug + 'static {
    /// Direction of the objective wrapped by this type.
    const DIRECTION: Direction;

    /// Wraps a raw objective value.
    fn from_value(value: f64) -> Self;

    /// The raw objective value.
    fn value(self) -> f64;

    /// A fitness that every real fitness beats (or ties).
    ///
    /// Used to seed best-so-far comparisons.
    fn worst() -> Self;

    /// Direction-normalized objective: higher is always better.
    fn goodness(self) -> f64 {
        match Self::DIRECTION {
            Direction::Minimize => -self.value(),
            Direction::Maximize => self.value(),
        }
    }
}

/// Orders two goodness values, ranking `NaN` below everything.
fn cmp_goodness(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

macro_rules! scalar_fitness {
    ($(#[$doc:meta])* $name:ident, $dir:expr, $worst:expr, $goodness:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub f64);

        impl Fitness for $name {
            const DIRECTION: Direction = $dir;

            fn from_value(value: f64) -> Self {
                $name(value)
            }

            fn value(self) -> f64 {
                self.0
            }

            fn worst() -> Self {
                $name($worst)
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                let g: fn(f64) -> f64 = $goodness;
                cmp_goodness(g(self.0), g(other.0))
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.cmp(other) == Ordering::Equal
            }
        }

        impl Eq for $name {}

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

scalar_fitness!(
    /// Objective value to minimize: smaller raw values rank higher.
    Minimizing,
    Direction::Minimize,
    f64::INFINITY,
    |v| -v
);
scalar_fitness!(
    /// Objective value to maximize: larger raw values rank higher.
    Maximizing,
    Direction::Maximize,
    f64::NEG_INFINITY,
    |v| v
);
