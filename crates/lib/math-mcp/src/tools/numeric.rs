use std::collections::BTreeMap;

use math_core::MathResult;
use math_core::numeric::{find_root, solve_ode};
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

fn default_ode_method() -> String {
    "rk45".to_string()
}

fn default_root_method() -> String {
    "auto".to_string()
}

/// Parameters for integrating a system of ODEs.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SolveOdeParams {
    /// Equations of the form `dx/dt = expression`, e.g. `["dx/dt = -x + y", "dy/dt = x - y"]`.
    pub equations: Vec<String>,
    /// Value of every state variable at `t_start`, e.g. `{"x": 1.0, "y": 0.0}`.
    pub initial_conditions: BTreeMap<String, f64>,
    /// `[t_start, t_end]`.
    pub time_span: Vec<f64>,
    /// `rk45` (adaptive), `rk4`, or `euler`.
    #[serde(default = "default_ode_method")]
    pub method: String,
}

/// Parameters for numeric root finding.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FindRootParams {
    /// Expression in `x` whose zero is wanted, e.g. `x^2 - 4`.
    pub function: String,
    #[serde(default)]
    pub initial_guess: f64,
    /// `[a, b]` with a sign change of the function.
    pub bracket: Option<Vec<f64>>,
    /// `auto`, `newton`, `bisection` (or `bisect`), `brentq`, or `secant`.
    #[serde(default = "default_root_method")]
    pub method: String,
}

pub(crate) fn solve_ode_text(params: &SolveOdeParams) -> MathResult<String> {
    let solution = solve_ode(
        &params.equations,
        &params.initial_conditions,
        &params.time_span,
        &params.method,
    )?;
    tracing::debug!(points = solution.time.len(), method = %solution.method, "integrated ODE system");
    helpers::to_json(&solution)
}

pub(crate) fn find_root_text(params: &FindRootParams) -> MathResult<String> {
    let result = find_root(
        &params.function,
        params.initial_guess,
        params.bracket.as_deref(),
        &params.method,
    )?;
    helpers::to_json(&result)
}

#[tool_router(router = tool_router_numeric, vis = "pub")]
impl MathMcp {
    #[tool(description = "Solve a system of ordinary differential equations numerically. Returns JSON {time, state, method, success}. Example: equations=['dx/dt = -x'], initial_conditions={'x': 1.0}, time_span=[0, 5].")]
    async fn solve_ode(
        &self,
        Parameters(params): Parameters<SolveOdeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::blocking_text("ODE", move || solve_ode_text(&params)).await
    }

    #[tool(description = "Find a root of f(x) = 0. Returns JSON {root, function_value, iterations, method, success}. Brentq is used when a bracket is given, Newton otherwise.")]
    async fn find_root(
        &self,
        Parameters(params): Parameters<FindRootParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::blocking_text("root finding", move || find_root_text(&params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn ode_result_is_json() {
        let params: SolveOdeParams = serde_json::from_str(
            r#"{"equations": ["dx/dt = -x"], "initial_conditions": {"x": 1.0}, "time_span": [0, 1]}"#,
        )
        .expect("params");
        assert_eq!(params.method, "rk45");
        let text = solve_ode_text(&params).expect("solve");
        let value: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["success"], true);
        let last = value["state"]["x"]
            .as_array()
            .and_then(|values| values.last())
            .and_then(Value::as_f64)
            .expect("final state");
        assert!((last - (-1.0_f64).exp()).abs() < 1e-2);
    }

    #[test]
    fn ode_errors_surface_messages() {
        let params = SolveOdeParams {
            equations: vec!["dx/dt = -x".into()],
            initial_conditions: BTreeMap::new(),
            time_span: vec![0.0],
            method: "rk45".into(),
        };
        let err = solve_ode_text(&params).expect_err("bad span");
        assert_eq!(err.to_string(), "time_span must be a list of two numbers [t_start, t_end]");
    }

    #[test]
    fn root_of_a_parabola() {
        let params: FindRootParams =
            serde_json::from_str(r#"{"function": "x^2 - 4", "bracket": [0, 3]}"#).expect("params");
        let value: Value = serde_json::from_str(&find_root_text(&params).expect("root")).expect("json");
        assert!((value["root"].as_f64().expect("root") - 2.0).abs() < 1e-8);
        assert_eq!(value["method"], "brentq");
    }
}
