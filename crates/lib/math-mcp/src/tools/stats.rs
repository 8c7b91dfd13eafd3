use math_core::stats;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::{MathMcp, helpers};

fn default_alternative() -> String {
    "two-sided".to_string()
}

fn default_correlation_method() -> String {
    "pearson".to_string()
}

const fn default_window() -> i64 {
    7
}

fn default_smoothing() -> String {
    "simple".to_string()
}

/// Parameters for summary statistics.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DescribeDataParams {
    /// Numeric values, e.g. response times `[120, 145, 167, 123]`.
    pub data: Vec<f64>,
}

/// Parameters for one- and two-sample t-tests.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TTestParams {
    pub sample1: Vec<f64>,
    /// Second group; without it `sample1` is tested against a mean of 0.
    pub sample2: Option<Vec<f64>>,
    /// `two-sided`, `greater`, or `less`.
    #[serde(default = "default_alternative")]
    pub alternative: String,
}

/// Parameters for correlation between two variables.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CorrelationParams {
    pub x_data: Vec<f64>,
    pub y_data: Vec<f64>,
    /// `pearson`, `spearman`, or `kendall`.
    #[serde(default = "default_correlation_method")]
    pub method: String,
}

/// Parameters for simple linear regression.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RegressionParams {
    pub x_data: Vec<f64>,
    pub y_data: Vec<f64>,
}

/// Parameters for smoothing a series.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MovingAverageParams {
    pub data: Vec<f64>,
    #[serde(default = "default_window")]
    pub window: i64,
    /// `simple` or `exponential`.
    #[serde(default = "default_smoothing")]
    pub method: String,
}

#[tool_router(router = tool_router_stats, vis = "pub")]
impl MathMcp {
    #[tool(description = "Descriptive statistics: count, mean, median, std, variance, min, max, range, and percentiles (p25, p50, p75, p95, p99).")]
    async fn describe_data(
        &self,
        Parameters(params): Parameters<DescribeDataParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = stats::describe_data(&params.data).and_then(|summary| helpers::to_json(&summary));
        Ok(helpers::text_result(result))
    }

    #[tool(description = "Student's t-test. One-sample against 0 when sample2 is omitted, pooled two-sample otherwise. Returns statistic, pvalue, degrees_of_freedom, significant (p < 0.05), test_type.")]
    async fn ttest(
        &self,
        Parameters(params): Parameters<TTestParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = stats::ttest(&params.sample1, params.sample2.as_deref(), &params.alternative)
            .and_then(|test| helpers::to_json(&test));
        Ok(helpers::text_result(result))
    }

    #[tool(description = "Correlation coefficient and p-value between two variables using pearson, spearman, or kendall.")]
    async fn correlation(
        &self,
        Parameters(params): Parameters<CorrelationParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = stats::correlation(&params.x_data, &params.y_data, &params.method)
            .and_then(|corr| helpers::to_json(&corr));
        Ok(helpers::text_result(result))
    }

    #[tool(description = "Least-squares line y = slope*x + intercept with r_squared, pvalue, and the equation text.")]
    async fn linear_regression(
        &self,
        Parameters(params): Parameters<RegressionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = stats::linear_regression(&params.x_data, &params.y_data)
            .and_then(|fit| helpers::to_json(&fit));
        Ok(helpers::text_result(result))
    }

    #[tool(description = "Smooth a series with a simple or exponential moving average. The output keeps the input length.")]
    async fn moving_average(
        &self,
        Parameters(params): Parameters<MovingAverageParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = stats::moving_average(&params.data, params.window, &params.method)
            .and_then(|smoothed| helpers::to_json(&smoothed));
        Ok(helpers::text_result(result))
    }
}
