//! Chart tools. Parameters mirror the chart request types in `math-charts`
//! and carry their defaults, so an omitted field renders exactly as the
//! chart's own default would.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use math_charts::{
    AxisValues, BarChart, GridSetting, HeatmapChart, HistogramChart, OdeSolutionChart, PieChart,
    ScatterChart, StackedBarChart, StackplotChart, TimeseriesChart,
};
use rmcp::{
    ErrorData,
    RoleServer,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    service::RequestContext,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::{MathMcp, helpers};

/// `true`/`false` or one of `"x"`, `"y"`, `"both"`, `"true"`, `"false"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum GridParam {
    Flag(bool),
    Axis(String),
}

impl Default for GridParam {
    fn default() -> Self {
        Self::Flag(true)
    }
}

impl From<GridParam> for GridSetting {
    fn from(grid: GridParam) -> Self {
        match grid {
            GridParam::Flag(flag) => Self::Flag(flag),
            GridParam::Axis(axis) => Self::Axis(axis),
        }
    }
}

/// Numeric x positions or category labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum XValues {
    Numbers(Vec<f64>),
    Labels(Vec<String>),
}

impl From<XValues> for AxisValues {
    fn from(values: XValues) -> Self {
        match values {
            XValues::Numbers(numbers) => Self::Numbers(numbers),
            XValues::Labels(labels) => Self::Labels(labels),
        }
    }
}

fn text(value: &str) -> String {
    value.to_string()
}

fn default_legend() -> Option<String> {
    Some(text("best"))
}

fn default_png() -> String {
    text("png")
}

fn default_time() -> String {
    text("Time")
}

fn default_value() -> String {
    text("Value")
}

fn default_category() -> String {
    text("Category")
}

fn default_x() -> String {
    text("X")
}

fn default_y() -> String {
    text("Y")
}

fn default_frequency() -> String {
    text("Frequency")
}

fn default_one_decimal() -> String {
    text(".1f")
}

fn default_two_decimals() -> String {
    text(".2f")
}

fn default_viridis() -> String {
    text("viridis")
}

fn default_zero() -> String {
    text("zero")
}

fn default_autopct() -> Option<String> {
    Some(text("%1.1f%%"))
}

const fn default_rotation() -> f64 {
    45.0
}

const fn default_bins() -> i64 {
    30
}

const fn default_alpha() -> f64 {
    0.7
}

const fn default_startangle() -> f64 {
    90.0
}

const fn enabled() -> bool {
    true
}

/// Parameters for a multi-series line plot over labelled time points.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TimeseriesParams {
    /// X-axis labels, e.g. ISO 8601 timestamps.
    pub timestamps: Vec<String>,
    /// Series name to values, one value per timestamp.
    #[schemars(with = "BTreeMap<String, Vec<f64>>")]
    pub series: IndexMap<String, Vec<f64>>,
    pub title: Option<String>,
    #[serde(default = "default_time")]
    pub xlabel: String,
    #[serde(default = "default_value")]
    pub ylabel: String,
    /// `[width, height]` in pixels.
    pub figsize: Option<Vec<u32>>,
    pub colors: Option<Vec<String>>,
    pub xlim: Option<Vec<f64>>,
    pub ylim: Option<Vec<f64>>,
    #[serde(default)]
    pub grid: GridParam,
    /// Location such as `best` or `upper left`, or null to hide the legend.
    #[serde(default = "default_legend")]
    pub legend_loc: Option<String>,
    /// `-`, `--`, `-.`, or `:` per series; cycles when shorter.
    pub linestyles: Option<Vec<String>>,
    /// Series plotted on a secondary axis, mapped to that axis label.
    #[schemars(with = "Option<BTreeMap<String, String>>")]
    pub secondary_y: Option<IndexMap<String, String>>,
    #[serde(default = "default_rotation")]
    pub xlabel_rotation: f64,
    #[serde(default)]
    pub show_values: bool,
    /// Format such as `d`, `.1f`, `$,.2f`, `.0%`.
    #[serde(default = "default_one_decimal")]
    pub value_format: String,
    /// `png` or `svg`.
    #[serde(default = "default_png")]
    pub output_format: String,
}

impl From<TimeseriesParams> for TimeseriesChart {
    fn from(params: TimeseriesParams) -> Self {
        Self {
            timestamps: params.timestamps,
            series: params.series,
            title: params.title,
            xlabel: params.xlabel,
            ylabel: params.ylabel,
            figsize: params.figsize,
            colors: params.colors,
            xlim: params.xlim,
            ylim: params.ylim,
            grid: params.grid.into(),
            legend_loc: params.legend_loc,
            linestyles: params.linestyles,
            secondary_y: params.secondary_y,
            xlabel_rotation: params.xlabel_rotation,
            show_values: params.show_values,
            value_format: params.value_format,
            output_format: params.output_format,
        }
    }
}

/// Parameters for a single-series bar chart.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BarChartParams {
    pub categories: Vec<String>,
    pub values: Vec<f64>,
    pub title: Option<String>,
    #[serde(default = "default_category")]
    pub xlabel: String,
    #[serde(default = "default_value")]
    pub ylabel: String,
    #[serde(default)]
    pub horizontal: bool,
    pub figsize: Option<Vec<u32>>,
    /// Named color or hex; defaults to steelblue.
    pub color: Option<String>,
    pub xlim: Option<Vec<f64>>,
    pub ylim: Option<Vec<f64>>,
    #[serde(default)]
    pub grid: GridParam,
    #[serde(default = "default_rotation")]
    pub xlabel_rotation: f64,
    #[serde(default = "enabled")]
    pub show_values: bool,
    #[serde(default = "default_one_decimal")]
    pub value_format: String,
    #[serde(default = "default_png")]
    pub output_format: String,
}

impl From<BarChartParams> for BarChart {
    fn from(params: BarChartParams) -> Self {
        Self {
            categories: params.categories,
            values: params.values,
            title: params.title,
            xlabel: params.xlabel,
            ylabel: params.ylabel,
            horizontal: params.horizontal,
            figsize: params.figsize,
            color: params.color,
            xlim: params.xlim,
            ylim: params.ylim,
            grid: params.grid.into(),
            xlabel_rotation: params.xlabel_rotation,
            show_values: params.show_values,
            value_format: params.value_format,
            output_format: params.output_format,
        }
    }
}

/// Parameters for a histogram with summary statistics.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HistogramParams {
    pub data: Vec<f64>,
    #[serde(default = "default_bins")]
    pub bins: i64,
    pub title: Option<String>,
    #[serde(default = "default_value")]
    pub xlabel: String,
    #[serde(default = "default_frequency")]
    pub ylabel: String,
    pub figsize: Option<Vec<u32>>,
    pub color: Option<String>,
    pub xlim: Option<Vec<f64>>,
    pub ylim: Option<Vec<f64>>,
    #[serde(default)]
    pub grid: GridParam,
    #[serde(default = "default_png")]
    pub output_format: String,
}

impl From<HistogramParams> for HistogramChart {
    fn from(params: HistogramParams) -> Self {
        Self {
            data: params.data,
            bins: params.bins,
            title: params.title,
            xlabel: params.xlabel,
            ylabel: params.ylabel,
            figsize: params.figsize,
            color: params.color,
            xlim: params.xlim,
            ylim: params.ylim,
            grid: params.grid.into(),
            output_format: params.output_format,
        }
    }
}

/// Parameters for a scatter plot with optional point labels.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ScatterParams {
    pub x_data: Vec<f64>,
    pub y_data: Vec<f64>,
    pub labels: Option<Vec<String>>,
    pub title: Option<String>,
    #[serde(default = "default_x")]
    pub xlabel: String,
    #[serde(default = "default_y")]
    pub ylabel: String,
    pub figsize: Option<Vec<u32>>,
    pub color: Option<String>,
    pub xlim: Option<Vec<f64>>,
    pub ylim: Option<Vec<f64>>,
    #[serde(default)]
    pub grid: GridParam,
    #[serde(default = "default_png")]
    pub output_format: String,
}

impl From<ScatterParams> for ScatterChart {
    fn from(params: ScatterParams) -> Self {
        Self {
            x_data: params.x_data,
            y_data: params.y_data,
            labels: params.labels,
            title: params.title,
            xlabel: params.xlabel,
            ylabel: params.ylabel,
            figsize: params.figsize,
            color: params.color,
            xlim: params.xlim,
            ylim: params.ylim,
            grid: params.grid.into(),
            output_format: params.output_format,
        }
    }
}

/// Parameters for a heatmap of a 2D matrix.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HeatmapParams {
    /// Rows of values, e.g. `[[1, 2, 3], [4, 5, 6]]`.
    pub data: Vec<Vec<f64>>,
    pub x_labels: Option<Vec<String>>,
    pub y_labels: Option<Vec<String>>,
    pub title: Option<String>,
    /// Colormap name such as `viridis`, `plasma`, `coolwarm`; `_r` reverses.
    #[serde(default = "default_viridis")]
    pub colormap: String,
    pub figsize: Option<Vec<u32>>,
    #[serde(default)]
    pub grid: GridParam,
    #[serde(default = "default_rotation")]
    pub xlabel_rotation: f64,
    #[serde(default = "default_png")]
    pub output_format: String,
}

impl From<HeatmapParams> for HeatmapChart {
    fn from(params: HeatmapParams) -> Self {
        Self {
            data: params.data,
            x_labels: params.x_labels,
            y_labels: params.y_labels,
            title: params.title,
            colormap: params.colormap,
            figsize: params.figsize,
            grid: params.grid.into(),
            xlabel_rotation: params.xlabel_rotation,
            output_format: params.output_format,
        }
    }
}

/// Parameters for a stacked bar chart.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StackedBarParams {
    pub categories: Vec<String>,
    /// Segment name to values, one value per category.
    #[schemars(with = "BTreeMap<String, Vec<f64>>")]
    pub series: IndexMap<String, Vec<f64>>,
    pub title: Option<String>,
    #[serde(default = "default_category")]
    pub xlabel: String,
    #[serde(default = "default_value")]
    pub ylabel: String,
    #[serde(default)]
    pub horizontal: bool,
    pub figsize: Option<Vec<u32>>,
    pub colors: Option<Vec<String>>,
    pub xlim: Option<Vec<f64>>,
    pub ylim: Option<Vec<f64>>,
    #[serde(default)]
    pub grid: GridParam,
    #[serde(default = "default_legend")]
    pub legend_loc: Option<String>,
    #[serde(default = "default_rotation")]
    pub xlabel_rotation: f64,
    #[serde(default = "enabled")]
    pub show_values: bool,
    #[serde(default)]
    pub show_segment_values: bool,
    #[serde(default = "enabled")]
    pub show_total: bool,
    #[serde(default = "default_two_decimals")]
    pub value_format: String,
    #[serde(default = "default_png")]
    pub output_format: String,
}

impl From<StackedBarParams> for StackedBarChart {
    fn from(params: StackedBarParams) -> Self {
        Self {
            categories: params.categories,
            series: params.series,
            title: params.title,
            xlabel: params.xlabel,
            ylabel: params.ylabel,
            horizontal: params.horizontal,
            figsize: params.figsize,
            colors: params.colors,
            xlim: params.xlim,
            ylim: params.ylim,
            grid: params.grid.into(),
            legend_loc: params.legend_loc,
            xlabel_rotation: params.xlabel_rotation,
            show_values: params.show_values,
            show_segment_values: params.show_segment_values,
            show_total: params.show_total,
            value_format: params.value_format,
            output_format: params.output_format,
        }
    }
}

/// Parameters for a stacked area plot.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StackplotParams {
    pub x_data: XValues,
    #[schemars(with = "BTreeMap<String, Vec<f64>>")]
    pub series: IndexMap<String, Vec<f64>>,
    pub title: Option<String>,
    #[serde(default = "default_x")]
    pub xlabel: String,
    #[serde(default = "default_value")]
    pub ylabel: String,
    pub figsize: Option<Vec<u32>>,
    pub colors: Option<Vec<String>>,
    pub xlim: Option<Vec<f64>>,
    pub ylim: Option<Vec<f64>>,
    #[serde(default)]
    pub grid: GridParam,
    #[serde(default = "default_legend")]
    pub legend_loc: Option<String>,
    /// `zero`, `sym`, `wiggle`, or `weighted_wiggle`.
    #[serde(default = "default_zero")]
    pub baseline: String,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_rotation")]
    pub xlabel_rotation: f64,
    #[serde(default = "default_png")]
    pub output_format: String,
}

impl From<StackplotParams> for StackplotChart {
    fn from(params: StackplotParams) -> Self {
        Self {
            x_data: params.x_data.into(),
            series: params.series,
            title: params.title,
            xlabel: params.xlabel,
            ylabel: params.ylabel,
            figsize: params.figsize,
            colors: params.colors,
            xlim: params.xlim,
            ylim: params.ylim,
            grid: params.grid.into(),
            legend_loc: params.legend_loc,
            baseline: params.baseline,
            alpha: params.alpha,
            xlabel_rotation: params.xlabel_rotation,
            output_format: params.output_format,
        }
    }
}

/// Parameters for plotting a `solve_ode` result.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct OdeSolutionParams {
    /// JSON text from `solve_ode`, or `{"t": [...], "x": [...]}`.
    pub ode_result: String,
    pub title: Option<String>,
    pub figsize: Option<Vec<u32>>,
    pub colors: Option<Vec<String>>,
    pub xlim: Option<Vec<f64>>,
    pub ylim: Option<Vec<f64>>,
    #[serde(default)]
    pub grid: GridParam,
    #[serde(default = "default_legend")]
    pub legend_loc: Option<String>,
    pub linestyles: Option<Vec<String>>,
    #[schemars(with = "Option<BTreeMap<String, String>>")]
    pub secondary_y: Option<IndexMap<String, String>>,
    #[serde(default = "default_png")]
    pub output_format: String,
}

impl From<OdeSolutionParams> for OdeSolutionChart {
    fn from(params: OdeSolutionParams) -> Self {
        Self {
            ode_result: params.ode_result,
            title: params.title,
            figsize: params.figsize,
            colors: params.colors,
            xlim: params.xlim,
            ylim: params.ylim,
            grid: params.grid.into(),
            legend_loc: params.legend_loc,
            linestyles: params.linestyles,
            secondary_y: params.secondary_y,
            output_format: params.output_format,
        }
    }
}

/// Parameters for a pie chart.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PieChartParams {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub title: Option<String>,
    pub figsize: Option<Vec<u32>>,
    pub colors: Option<Vec<String>>,
    /// printf-style percentage format, e.g. `%1.1f%%`; null hides percentages.
    #[serde(default = "default_autopct")]
    pub autopct: Option<String>,
    #[serde(default = "default_startangle")]
    pub startangle: f64,
    /// Radial offset per slice between 0 and 1.
    pub explode: Option<Vec<f64>>,
    #[serde(default = "default_legend")]
    pub legend_loc: Option<String>,
    #[serde(default)]
    pub shadow: bool,
    #[serde(default = "default_png")]
    pub output_format: String,
}

impl From<PieChartParams> for PieChart {
    fn from(params: PieChartParams) -> Self {
        Self {
            labels: params.labels,
            values: params.values,
            title: params.title,
            figsize: params.figsize,
            colors: params.colors,
            autopct: params.autopct,
            startangle: params.startangle,
            explode: params.explode,
            legend_loc: params.legend_loc,
            shadow: params.shadow,
            output_format: params.output_format,
        }
    }
}

#[tool_router(router = tool_router_plots, vis = "pub")]
impl MathMcp {
    #[tool(description = "Plot one or more series against labelled time points. Supports secondary y-axes, line styles, and value labels.")]
    async fn plot_timeseries(
        &self,
        Parameters(params): Parameters<TimeseriesParams>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.render_chart(TimeseriesChart::from(params), &helpers::request_snapshot(&ctx))
            .await
    }

    #[tool(description = "Plot a bar chart of values per category, vertical or horizontal.")]
    async fn plot_bar_chart(
        &self,
        Parameters(params): Parameters<BarChartParams>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.render_chart(BarChart::from(params), &helpers::request_snapshot(&ctx))
            .await
    }

    #[tool(description = "Plot a histogram of the data with mean, median, and standard deviation.")]
    async fn plot_histogram(
        &self,
        Parameters(params): Parameters<HistogramParams>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.render_chart(HistogramChart::from(params), &helpers::request_snapshot(&ctx))
            .await
    }

    #[tool(description = "Plot x/y points with optional labels and the Pearson correlation.")]
    async fn plot_scatter(
        &self,
        Parameters(params): Parameters<ScatterParams>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.render_chart(ScatterChart::from(params), &helpers::request_snapshot(&ctx))
            .await
    }

    #[tool(description = "Plot a 2D matrix as a heatmap with a colorbar. Cells are annotated for matrices up to 20x20.")]
    async fn plot_heatmap(
        &self,
        Parameters(params): Parameters<HeatmapParams>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.render_chart(HeatmapChart::from(params), &helpers::request_snapshot(&ctx))
            .await
    }

    #[tool(description = "Plot stacked bars, one segment per series, with optional segment values and totals.")]
    async fn plot_stacked_bar(
        &self,
        Parameters(params): Parameters<StackedBarParams>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.render_chart(StackedBarChart::from(params), &helpers::request_snapshot(&ctx))
            .await
    }

    #[tool(description = "Plot stacked filled areas over numeric or labelled x values, with zero, sym, wiggle, or weighted_wiggle baselines.")]
    async fn plot_stackplot(
        &self,
        Parameters(params): Parameters<StackplotParams>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.render_chart(StackplotChart::from(params), &helpers::request_snapshot(&ctx))
            .await
    }

    #[tool(description = "Plot the trajectories from a solve_ode result against time.")]
    async fn plot_ode_solution(
        &self,
        Parameters(params): Parameters<OdeSolutionParams>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.render_chart(OdeSolutionChart::from(params), &helpers::request_snapshot(&ctx))
            .await
    }

    #[tool(description = "Plot a pie chart with percentage labels, optional exploded slices, and a legend.")]
    async fn plot_pie_chart(
        &self,
        Parameters(params): Parameters<PieChartParams>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.render_chart(PieChart::from(params), &helpers::request_snapshot(&ctx))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_fields_take_chart_defaults() {
        let params: TimeseriesParams = serde_json::from_str(
            r#"{"timestamps": ["a", "b"], "series": {"z": [1, 2], "a": [3, 4]}}"#,
        )
        .expect("params");
        let chart = TimeseriesChart::from(params);
        let defaults = TimeseriesChart::default();
        assert_eq!(chart.xlabel, defaults.xlabel);
        assert_eq!(chart.legend_loc, defaults.legend_loc);
        assert_eq!(chart.grid, defaults.grid);
        assert_eq!(chart.xlabel_rotation, defaults.xlabel_rotation);
        assert_eq!(chart.value_format, defaults.value_format);
        assert_eq!(chart.series.keys().collect::<Vec<_>>(), ["z", "a"]);

        let pie: PieChartParams =
            serde_json::from_str(r#"{"labels": ["a"], "values": [1]}"#).expect("params");
        let pie = PieChart::from(pie);
        assert_eq!(pie.autopct, PieChart::default().autopct);
        assert_eq!(pie.startangle, 90.0);
    }

    #[test]
    fn null_legend_hides_it() {
        let params: StackedBarParams = serde_json::from_str(
            r#"{"categories": ["a"], "series": {"s": [1]}, "legend_loc": null, "grid": "y"}"#,
        )
        .expect("params");
        assert_eq!(params.legend_loc, None);
        assert_eq!(params.grid, GridParam::Axis("y".into()));
    }

    #[test]
    fn stackplot_accepts_labels_or_numbers() {
        let params: StackplotParams = serde_json::from_str(
            r#"{"x_data": ["Jan", "Feb"], "series": {"s": [1, 2]}}"#,
        )
        .expect("labels");
        assert_eq!(params.x_data, XValues::Labels(vec!["Jan".into(), "Feb".into()]));
        let params: StackplotParams =
            serde_json::from_str(r#"{"x_data": [0, 1], "series": {"s": [1, 2]}}"#).expect("numbers");
        assert_eq!(params.x_data, XValues::Numbers(vec![0.0, 1.0]));
    }
}
