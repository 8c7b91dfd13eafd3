use std::error::Error;
use std::fmt;

/// Failure raised by any computation in this crate.
///
/// Each variant carries a complete, human-readable message. Tool layers add
/// their own `Error:` prefix; nothing here does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    /// The expression text could not be parsed.
    Parse(String),
    /// An argument was rejected before any computation ran.
    InvalidInput(String),
    /// The expression is outside what the engine can handle.
    Unsupported(String),
    /// Numeric evaluation failed (unbound symbol, non-finite value, ...).
    Evaluation(String),
    /// A numeric routine did not converge.
    Convergence(String),
    /// A unit could not be resolved or converted.
    Conversion(String),
}

impl MathError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    pub(crate) fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation(message.into())
    }
}

impl fmt::Display for MathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "Could not parse expression: {message}"),
            Self::InvalidInput(message)
            | Self::Unsupported(message)
            | Self::Evaluation(message)
            | Self::Convergence(message)
            | Self::Conversion(message) => write!(f, "{message}"),
        }
    }
}

impl Error for MathError {}

impl From<exmex::ExError> for MathError {
    fn from(err: exmex::ExError) -> Self {
        Self::Evaluation(err.to_string())
    }
}

pub type MathResult<T> = Result<T, MathError>;
