//! The nine chart kinds. Each request type validates its own parameters in a
//! fixed order and renders through [`ChartSpec::render`].

mod bar;
mod heatmap;
mod histogram;
mod lines;
mod ode;
mod pie;
mod scatter;
mod stackplot;
mod timeseries;

use std::fmt;

pub use bar::{BarChart, StackedBarChart};
pub use heatmap::HeatmapChart;
pub use histogram::HistogramChart;
pub use ode::OdeSolutionChart;
pub use pie::PieChart;
pub use scatter::ScatterChart;
pub use stackplot::{AxisValues, StackplotChart};
pub use timeseries::TimeseriesChart;

use crate::error::ChartResult;
use crate::render::RenderedChart;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Timeseries,
    Bar,
    Histogram,
    Scatter,
    Heatmap,
    StackedBar,
    Stackplot,
    OdeSolution,
    Pie,
}

impl ChartKind {
    /// Human-readable name used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Timeseries => "time series plot",
            Self::Bar => "bar chart",
            Self::Histogram => "histogram",
            Self::Scatter => "scatter plot",
            Self::Heatmap => "heatmap",
            Self::StackedBar => "stacked bar chart",
            Self::Stackplot => "stackplot",
            Self::OdeSolution => "ODE solution plot",
            Self::Pie => "pie chart",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A fully described chart request.
pub trait ChartSpec {
    const KIND: ChartKind;

    /// Validates the request and renders it.
    ///
    /// # Errors
    /// Returns [`crate::ChartError::Invalid`] for rejected parameters and
    /// [`crate::ChartError::Render`] when drawing or encoding fails.
    fn render(&self) -> ChartResult<RenderedChart>;
}

/// Whether tick labels are drawn rotated; only quarter turns are available,
/// so steep requested angles become vertical labels.
pub(crate) fn rotates_labels(rotation: f64) -> bool {
    rotation.abs() >= 45.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steep_angles_become_vertical_labels() {
        assert!(rotates_labels(45.0));
        assert!(rotates_labels(-90.0));
        assert!(!rotates_labels(30.0));
        assert!(!rotates_labels(0.0));
    }
}
