//! The arithmetic behind the calculator tools.
//!
//! Every function is pure. Inputs for which an operation is undefined, and
//! results that don't fit the result type, are reported as [`ArithError`].

use thiserror::Error;

/// Why an operation has no result.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArithError {
    /// The divisor was zero.
    #[error("Cannot divide by zero")]
    DivisionByZero,
    /// The named operation only takes non-negative input.
    #[error("{0} is not defined for negative numbers")]
    NegativeInput(&'static str),
    /// Square root of a negative number.
    #[error("Cannot take the square root of a negative number")]
    NegativeSquareRoot,
    /// The exact result doesn't fit in a `u64`.
    #[error("{0} result is too large")]
    Overflow(&'static str),
    /// The result is infinite or NaN.
    #[error("{0} result is not a finite number")]
    NonFinite(&'static str),
}

fn finite(op: &'static str, value: f64) -> Result<f64, ArithError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ArithError::NonFinite(op))
    }
}

/// Computes `a + b`.
pub fn add(a: f64, b: f64) -> Result<f64, ArithError> {
    finite("Addition", a + b)
}

/// Computes `a - b`.
pub fn subtract(a: f64, b: f64) -> Result<f64, ArithError> {
    finite("Subtraction", a - b)
}

/// Computes `a * b`.
pub fn multiply(a: f64, b: f64) -> Result<f64, ArithError> {
    finite("Multiplication", a * b)
}

/// Computes `a / b`. A zero divisor, of either sign, is rejected.
pub fn divide(a: f64, b: f64) -> Result<f64, ArithError> {
    if b == 0.0 {
        return Err(ArithError::DivisionByZero);
    }
    finite("Division", a / b)
}

/// Raises `a` to the power `b`. Fractional powers of negative numbers
/// have no real result.
pub fn power(a: f64, b: f64) -> Result<f64, ArithError> {
    finite("Power", a.powf(b))
}

/// Computes the square root of `a`.
pub fn square_root(a: f64) -> Result<f64, ArithError> {
    if a < 0.0 {
        return Err(ArithError::NegativeSquareRoot);
    }
    Ok(a.sqrt())
}

/// Computes `|a|`.
pub fn absolute_value(a: f64) -> f64 {
    a.abs()
}

/// Computes `n!`. The largest input that fits is 20.
pub fn factorial(n: i64) -> Result<u64, ArithError> {
    let n = u64::try_from(n)
        .map_err(|_| ArithError::NegativeInput("Factorial"))?;
    (2..=n).try_fold(1u64, |acc, k| {
        acc.checked_mul(k).ok_or(ArithError::Overflow("Factorial"))
    })
}

/// Computes the `n`-th Fibonacci number, with `F(0) = 0` and `F(1) = 1`.
/// The largest input that fits is 93.
pub fn fibonacci(n: i64) -> Result<u64, ArithError> {
    let n = u64::try_from(n)
        .map_err(|_| ArithError::NegativeInput("Fibonacci"))?;
    if n == 0 {
        return Ok(0);
    }
    // After `k` passes `curr` holds F(k + 1).
    let (mut prev, mut curr) = (0u64, 1u64);
    for _ in 1..n {
        let next = prev
            .checked_add(curr)
            .ok_or(ArithError::Overflow("Fibonacci"))?;
        (prev, curr) = (curr, next);
    }
    Ok(curr)
}
