//! Error types shared by every operator and driver.
//!
//! Three kinds of failure travel through the engine:
//!
//! - [`EvoError::ContractViolation`]: a precondition was broken (empty
//!   population, negative variance, offspring/parent size mismatch). It
//!   aborts the current operation and propagates to the driver.
//! - [`EvoError::BudgetExceeded`]: an evaluation or time budget ran out.
//!   This is a cooperative stop, caught once at the top of the driver,
//!   which then reports the best-so-far population.
//! - [`EvoError::NumericDegenerate`]: a decomposition failed. Samplers
//!   handle it locally by keeping their previous valid state.

use std::time::Duration;

/// Which budget was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Maximum number of objective evaluations.
    Evaluations(u64),
    /// Maximum wall-clock time.
    Time(Duration),
}

impl std::fmt::Display for Budget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Budget::Evaluations(n) => write!(f, "{n} evaluations"),
            Budget::Time(d) => write!(f, "{} ms", d.as_millis()),
        }
    }
}

/// Errors raised by the evolutionary engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvoError {
    #[error("contract violation: {0}")]
    ContractViolation(String),
    #[error("invalid range: low={low}, high={high}")]
    InvalidRange { low: f64, high: f64 },
    #[error("budget exceeded: {0}")]
    BudgetExceeded(Budget),
    #[error("numeric degenerate: {0}")]
    NumericDegenerate(String),
}

impl EvoError {
    /// Shorthand for building a [`EvoError::ContractViolation`].
    pub fn contract(msg: impl Into<String>) -> Self {
        EvoError::ContractViolation(msg.into())
    }

    /// Returns `true` for the cooperative budget stop.
    pub fn is_budget_exceeded(&self) -> bool {
        matches!(self, EvoError::BudgetExceeded(_))
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, EvoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = EvoError::contract("empty population");
        assert_eq!(e.to_string(), "contract violation: empty population");

        let e = EvoError::BudgetExceeded(Budget::Evaluations(100));
        assert_eq!(e.to_string(), "budget exceeded: 100 evaluations");
        assert!(e.is_budget_exceeded());

        let e = EvoError::InvalidRange { low: 2.0, high: 1.0 };
        assert!(e.to_string().contains("low=2"));
    }
}
