use std::error::Error;
use std::fmt;

use plotters::drawing::DrawingAreaErrorKind;

/// Failure raised while validating or rendering a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    /// A parameter was rejected before drawing started.
    Invalid(String),
    /// The drawing backend or the rasterizer failed.
    Render(String),
}

impl ChartError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub(crate) fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(message) | Self::Render(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ChartError {}

impl<E> From<DrawingAreaErrorKind<E>> for ChartError
where
    E: Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        Self::Render(err.to_string())
    }
}

pub type ChartResult<T> = Result<T, ChartError>;
