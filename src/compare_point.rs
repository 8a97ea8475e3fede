//! `(operator, value)` predicates over sampled numbers.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The comparison operators a [`ComparePoint`] can use.
///
/// Construction normalizes `==` to `=` and `!`/`!=` to `<>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOperator {
    /// `=`
    Equal,
    /// `<>` (also spelled `!=` or `!`)
    NotEqual,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
}

impl CompareOperator {
    /// Parse an operator token, normalizing equivalent spellings.
    pub fn parse(op: &str) -> Result<Self> {
        match op {
            "=" | "==" => Ok(CompareOperator::Equal),
            "!" | "!=" | "<>" => Ok(CompareOperator::NotEqual),
            "<" => Ok(CompareOperator::LessThan),
            ">" => Ok(CompareOperator::GreaterThan),
            "<=" => Ok(CompareOperator::LessOrEqual),
            ">=" => Ok(CompareOperator::GreaterOrEqual),
            other => Err(Error::InvalidOperator(other.to_string())),
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOperator::Equal => lhs == rhs,
            CompareOperator::NotEqual => lhs != rhs,
            CompareOperator::LessThan => lhs < rhs,
            CompareOperator::GreaterThan => lhs > rhs,
            CompareOperator::LessOrEqual => lhs <= rhs,
            CompareOperator::GreaterOrEqual => lhs >= rhs,
        }
    }
}

impl Display for CompareOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompareOperator::Equal => "=",
            CompareOperator::NotEqual => "<>",
            CompareOperator::LessThan => "<",
            CompareOperator::GreaterThan => ">",
            CompareOperator::LessOrEqual => "<=",
            CompareOperator::GreaterOrEqual => ">=",
        };
        write!(f, "{}", s)
    }
}

/// A `(operator, value)` predicate over numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparePoint {
    operator: CompareOperator,
    value: f64,
}

impl ComparePoint {
    /// Construct a compare point. Fails with [`Error::InvalidArgument`] on a non-finite value.
    pub fn new(operator: CompareOperator, value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "compare point value {} is not finite",
                value
            )));
        }
        Ok(ComparePoint { operator, value })
    }

    /// Parse `"<op><value>"` (e.g. `">=4"`) into a compare point.
    pub fn parse(op: &str, value_str: &str) -> Result<Self> {
        if op.is_empty() {
            return Err(Error::MissingArgument("compare point operator".into()));
        }
        let value: f64 = value_str.parse().map_err(|_| {
            Error::InvalidArgument(format!("compare point value {:?} is not a number", value_str))
        })?;
        Self::new(CompareOperator::parse(op)?, value)
    }

    /// The configured operator.
    pub fn operator(&self) -> CompareOperator {
        self.operator
    }

    /// The configured value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// `true` when `x` matches this compare point. Always `false` if `x` is NaN.
    pub fn matches(&self, x: f64) -> bool {
        if x.is_nan() {
            return false;
        }
        self.operator.apply(x, self.value)
    }
}

impl Display for ComparePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.operator, crate::eval::format_number(self.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_equivalent_operators() {
        assert_eq!(CompareOperator::parse("==").unwrap(), CompareOperator::Equal);
        assert_eq!(CompareOperator::parse("!").unwrap(), CompareOperator::NotEqual);
        assert_eq!(CompareOperator::parse("!=").unwrap(), CompareOperator::NotEqual);
        assert_eq!(CompareOperator::parse("<>").unwrap(), CompareOperator::NotEqual);
    }

    #[test]
    fn rejects_unknown_operator() {
        assert!(matches!(CompareOperator::parse("~="), Err(Error::InvalidOperator(_))));
    }

    #[test]
    fn rejects_non_finite_value() {
        assert!(matches!(
            ComparePoint::new(CompareOperator::Equal, f64::NAN),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn nan_never_matches() {
        let cp = ComparePoint::new(CompareOperator::GreaterOrEqual, 4.0).unwrap();
        assert!(!cp.matches(f64::NAN));
        assert!(cp.matches(4.0));
        assert!(!cp.matches(3.0));
    }

    #[test]
    fn serializes_as_operator_plus_value() {
        let cp = ComparePoint::new(CompareOperator::GreaterOrEqual, 4.0).unwrap();
        assert_eq!(cp.to_string(), ">=4");
    }
}
