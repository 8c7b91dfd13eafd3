//! MCP server implementation for math-mcp.
//!
//! This crate wires the math engine and chart renderer into rmcp tool
//! handlers and exposes the stdio and streamable HTTP runners.

mod helpers;
mod tools;
pub mod server;

use math_charts::ChartSpec;
use math_outputs::{PlotOutputs, RequestSnapshot};
use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{CallToolResult, Content, ErrorCode, ServerCapabilities, ServerInfo};

pub use tools::{numeric, plots, stats, symbolic, units};

const SERVER_INSTRUCTIONS: &str = r"math-mcp provides symbolic math, numerics, statistics, unit conversion, and charts.

Tools:
- Symbolic: `simplify`, `solve`, `derivative`, `integral`, `expand`, `factor`, `evaluate`, `latex`,
  `to_fraction`, `simplify_fraction`. Use `^` or `**` for powers; `pi`, `E`, `I` are constants.
- Numeric: `solve_ode` for systems like ['dx/dt = -x'], `find_root` for f(x) = 0.
- Statistics: `describe_data`, `ttest`, `correlation`, `linear_regression`, `moving_average`.
- Units: `convert_unit` for length, mass, time, temperature, volume, and speed.
- Charts: `plot_timeseries`, `plot_bar_chart`, `plot_histogram`, `plot_scatter`, `plot_heatmap`,
  `plot_stacked_bar`, `plot_stackplot`, `plot_ode_solution`, `plot_pie_chart`.

Notes:
- Computation failures come back as text starting with `Error:`.
- Structured results (ODE solutions, statistics) are JSON text. Pass `solve_ode` output straight to
  `plot_ode_solution`.
- Charts return a PNG or SVG image. Over HTTP the image is also saved and a `Plot URL:` line is added;
  `GET /plot-url/{session_id}` returns the latest one for a session.
- `health` returns `ok`.";

/// MCP server wrapper around the tool routers and plot output handling.
#[derive(Clone)]
pub struct MathMcp {
    tool_router: ToolRouter<Self>,
    outputs: PlotOutputs,
}

impl MathMcp {
    #[must_use]
    pub fn new(outputs: PlotOutputs) -> Self {
        let tool_router = Self::tool_router_core()
            + Self::tool_router_symbolic()
            + Self::tool_router_numeric()
            + Self::tool_router_stats()
            + Self::tool_router_units()
            + Self::tool_router_plots();
        Self {
            tool_router,
            outputs,
        }
    }

    #[must_use]
    pub const fn outputs(&self) -> &PlotOutputs {
        &self.outputs
    }

    /// Names of every registered tool.
    #[must_use]
    pub fn tool_names(&self) -> Vec<String> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect()
    }

    /// Renders `chart` on the blocking pool and returns the image, plus a
    /// `Plot URL:` line when the request revealed where the server lives.
    ///
    /// # Errors
    /// Only when the render task itself dies; chart validation failures are
    /// tool errors inside the returned result.
    pub async fn render_chart<C>(
        &self,
        chart: C,
        request: &RequestSnapshot,
    ) -> Result<CallToolResult, ErrorData>
    where
        C: ChartSpec + Send + 'static,
    {
        let rendered = tokio::task::spawn_blocking(move || chart.render())
            .await
            .map_err(|err| {
                helpers::mcp_err(ErrorCode::INTERNAL_ERROR, format!("chart render task failed: {err}"))
            })?;
        let rendered = match rendered {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::debug!(kind = %C::KIND, "chart rejected: {err}");
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Error: Error creating {}: {err}",
                    C::KIND
                ))]));
            }
        };
        let mut content = vec![Content::image(rendered.to_base64(), rendered.mime_type())];
        if let Some(url) = self.outputs.publish(&content, request).await {
            content.push(Content::text(format!("Plot URL: {url}")));
        }
        Ok(CallToolResult::success(content))
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl MathMcp {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }
}

#[tool_handler]
impl ServerHandler for MathMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
