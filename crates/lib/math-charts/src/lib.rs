//! Chart rendering for the math MCP server.
//!
//! Every chart kind is a plain request struct implementing [`ChartSpec`].
//! Rendering validates the parameters, draws an SVG with `plotters`, and
//! rasterizes it with `resvg` when PNG output is requested.

pub mod charts;
pub mod colormap;
pub mod colors;
pub mod error;
pub mod format;
pub mod options;
mod render;

pub use charts::{
    AxisValues, BarChart, ChartKind, ChartSpec, HeatmapChart, HistogramChart, OdeSolutionChart,
    PieChart, ScatterChart, StackedBarChart, StackplotChart, TimeseriesChart,
};
pub use error::{ChartError, ChartResult};
pub use options::{GridSetting, OutputFormat};
pub use render::RenderedChart;
