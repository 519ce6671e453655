//! Error types of the numeric domains and the fixpoint driver.

use thiserror::Error;

/// Failure of a single [`Rational`][crate::rational::Rational] operation.
///
/// Domains built on top of rationals never propagate these further:
/// they fall back to `Top` (or `Bottom`) at the call site.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("indeterminate form involving infinities")]
    IndeterminateForm,
}

/// Fatal failure of the fixpoint driver.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FixpointError {
    #[error("fixpoint did not converge within {limit} iterations")]
    IterationLimit { limit: usize },
}
