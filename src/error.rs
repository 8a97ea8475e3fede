use std::{error::Error as StdError, fmt::Display};

use crate::parser::Rule;

/// Result type used across the library.
pub type Result<T> = std::result::Result<T, Error>;

/// The error kinds the crate can report.
///
/// Every failure mode named in the notation-evaluation pipeline surfaces as one of these
/// variants; none are silently swallowed, and there is no partial-result recovery once a roll
/// fails.
#[derive(Debug)]
pub enum Error {
    /// A required input was absent (notation text, a compare point's operator or value, ...).
    MissingArgument(String),
    /// A value was provided but has the wrong shape or is otherwise unusable (e.g. non-finite).
    InvalidArgument(String),
    /// A numeric constraint was violated (dice quantity, sides, keep/drop end, fudge sides, ...).
    OutOfRange(String),
    /// A compare point operator string did not match a known operator.
    InvalidOperator(String),
    /// A modifier (explode/re-roll/unique) was attached to a die whose `min == max`, which would
    /// never terminate.
    InvalidDieAction(String),
    /// The notation failed to parse against the grammar.
    SyntaxError(Box<pest::error::Error<Rule>>),
    /// The notation itself was not a usable string (non-string input, empty string).
    NotationError(String),
    /// An `import` payload was not a recognizable shape.
    DataFormat(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingArgument(s) => write!(f, "missing argument: {}", s),
            Error::InvalidArgument(s) => write!(f, "invalid argument: {}", s),
            Error::OutOfRange(s) => write!(f, "out of range: {}", s),
            Error::InvalidOperator(s) => write!(f, "invalid operator: {}", s),
            Error::InvalidDieAction(s) => write!(f, "invalid die action: {}", s),
            Error::SyntaxError(e) => write!(f, "syntax error: {}", e),
            Error::NotationError(s) => write!(f, "notation error: {}", s),
            Error::DataFormat(s) => write!(f, "data format error: {}", s),
        }
    }
}

impl StdError for Error {}

impl From<pest::error::Error<Rule>> for Error {
    fn from(e: pest::error::Error<Rule>) -> Self {
        Error::SyntaxError(Box::new(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::DataFormat(e.to_string())
    }
}
