//! Arithmetic operators for [`Store::math`](crate::Store::math).

use crate::error::CoreError;
use std::fmt;
use std::str::FromStr;

/// An arithmetic operator applied to a stored number.
///
/// Results follow IEEE-754: dividing by zero yields an infinity or NaN
/// rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%` (remainder, sign follows the dividend)
    Remainder,
}

impl MathOp {
    /// Returns the operator's symbol.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            MathOp::Add => "+",
            MathOp::Subtract => "-",
            MathOp::Multiply => "*",
            MathOp::Divide => "/",
            MathOp::Remainder => "%",
        }
    }

    /// Computes `lhs <op> rhs`.
    #[must_use]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            MathOp::Add => lhs + rhs,
            MathOp::Subtract => lhs - rhs,
            MathOp::Multiply => lhs * rhs,
            MathOp::Divide => lhs / rhs,
            MathOp::Remainder => lhs % rhs,
        }
    }
}

impl FromStr for MathOp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "+" => Ok(MathOp::Add),
            "-" => Ok(MathOp::Subtract),
            "*" => Ok(MathOp::Multiply),
            "/" => Ok(MathOp::Divide),
            "%" => Ok(MathOp::Remainder),
            other => Err(CoreError::invalid_operator(other)),
        }
    }
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
