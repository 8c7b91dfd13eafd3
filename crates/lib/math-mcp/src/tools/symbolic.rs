use std::collections::BTreeMap;

use math_core::format::{compact_number, float_repr};
use math_core::symbolic::{self, parse};
use math_core::{MathError, MathResult};
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

fn default_variable() -> String {
    "x".to_string()
}

const fn default_order() -> i64 {
    1
}

/// A bound or decimal given either as a JSON number or as expression text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn to_text(&self) -> String {
        match self {
            Self::Number(value) => compact_number(*value),
            Self::Text(text) => text.clone(),
        }
    }
}

/// Parameters for tools that take a single expression.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExpressionParams {
    /// Expression such as `x^2 + 2*x + 1`.
    pub expression: String,
}

/// Parameters for solving an equation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SolveParams {
    /// Equation such as `x^2 - 4 = 0`; without `=` the expression is set to zero.
    pub equation: String,
    #[serde(default = "default_variable")]
    pub variable: String,
}

/// Parameters for differentiation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DerivativeParams {
    pub expression: String,
    #[serde(default = "default_variable")]
    pub variable: String,
    #[serde(default = "default_order")]
    pub order: i64,
}

/// Parameters for integration; both bounds make it definite.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct IntegralParams {
    pub expression: String,
    #[serde(default = "default_variable")]
    pub variable: String,
    pub lower_bound: Option<NumberOrText>,
    pub upper_bound: Option<NumberOrText>,
}

/// Parameters for numeric evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EvaluateParams {
    pub expression: String,
    /// Values for free symbols, e.g. `{"x": 2, "y": 3}`.
    pub substitutions: Option<BTreeMap<String, f64>>,
}

/// Parameters for converting a decimal to a fraction.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ToFractionParams {
    /// Decimal such as `0.75` or `"0.3333"`.
    pub decimal: NumberOrText,
    pub max_denominator: Option<i64>,
}

pub(crate) fn simplify_text(expression: &str) -> MathResult<String> {
    Ok(symbolic::simplify(&parse(expression)?).to_string())
}

pub(crate) fn solve_text(equation: &str, variable: &str) -> MathResult<String> {
    helpers::to_json(&symbolic::solve(equation, variable)?)
}

pub(crate) fn derivative_text(expression: &str, variable: &str, order: i64) -> MathResult<String> {
    let order = u32::try_from(order)
        .map_err(|_| MathError::InvalidInput("order must be a non-negative integer".to_string()))?;
    Ok(symbolic::differentiate_n(&parse(expression)?, variable, order)?.to_string())
}

pub(crate) fn expand_text(expression: &str) -> MathResult<String> {
    Ok(symbolic::expand(&parse(expression)?)?.to_string())
}

pub(crate) fn factor_text(expression: &str) -> MathResult<String> {
    Ok(symbolic::factor(&parse(expression)?)?.to_string())
}

pub(crate) fn simplify_fraction_text(expression: &str) -> MathResult<String> {
    Ok(symbolic::cancel_fraction(&parse(expression)?).to_string())
}

pub(crate) fn integral_text(
    expression: &str,
    variable: &str,
    lower: Option<&NumberOrText>,
    upper: Option<&NumberOrText>,
) -> MathResult<String> {
    let expr = parse(expression)?;
    match (lower, upper) {
        (None, None) => Ok(symbolic::integrate(&expr, variable)?.to_string()),
        (Some(lower), Some(upper)) => {
            let lower = parse(&lower.to_text())?;
            let upper = parse(&upper.to_text())?;
            Ok(symbolic::integrate_definite(&expr, variable, &lower, &upper)?.to_string())
        }
        _ => Err(MathError::InvalidInput(
            "Both lower_bound and upper_bound are required for a definite integral".to_string(),
        )),
    }
}

pub(crate) fn evaluate_text(
    expression: &str,
    substitutions: Option<&BTreeMap<String, f64>>,
) -> MathResult<String> {
    let empty = BTreeMap::new();
    symbolic::evaluate(expression, substitutions.unwrap_or(&empty)).map(float_repr)
}

#[tool_router(router = tool_router_symbolic, vis = "pub")]
impl MathMcp {
    #[tool(description = "Simplify a mathematical expression. Example: 'x^2 + 2*x + 1 - (x + 1)^2' -> '0'.")]
    async fn simplify(
        &self,
        Parameters(params): Parameters<ExpressionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::blocking_text("simplify", move || simplify_text(&params.expression)).await
    }

    #[tool(description = "Solve an equation for a variable. Returns a JSON array of solutions. Example: 'x^2 - 4 = 0' -> [\"-2\", \"2\"].")]
    async fn solve(
        &self,
        Parameters(params): Parameters<SolveParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::blocking_text("solve", move || solve_text(&params.equation, &params.variable)).await
    }

    #[tool(description = "Differentiate an expression with respect to a variable, optionally several times.")]
    async fn derivative(
        &self,
        Parameters(params): Parameters<DerivativeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::blocking_text("derivative", move || {
            derivative_text(&params.expression, &params.variable, params.order)
        })
        .await
    }

    #[tool(description = "Integrate an expression. Without bounds returns the antiderivative; with lower_bound and upper_bound returns the definite value.")]
    async fn integral(
        &self,
        Parameters(params): Parameters<IntegralParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::blocking_text("integral", move || {
            integral_text(
                &params.expression,
                &params.variable,
                params.lower_bound.as_ref(),
                params.upper_bound.as_ref(),
            )
        })
        .await
    }

    #[tool(description = "Expand products and powers of sums. Example: '(x + 1)^2' -> 'x**2 + 2*x + 1'.")]
    async fn expand(
        &self,
        Parameters(params): Parameters<ExpressionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::blocking_text("expand", move || expand_text(&params.expression)).await
    }

    #[tool(description = "Factor a polynomial. Example: 'x^2 - 4' -> '(x - 2)*(x + 2)'.")]
    async fn factor(
        &self,
        Parameters(params): Parameters<ExpressionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::blocking_text("factor", move || factor_text(&params.expression)).await
    }

    #[tool(description = "Evaluate an expression numerically, substituting values for symbols.")]
    async fn evaluate(
        &self,
        Parameters(params): Parameters<EvaluateParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::blocking_text("evaluate", move || {
            evaluate_text(&params.expression, params.substitutions.as_ref())
        })
        .await
    }

    #[tool(description = "Convert an expression to LaTeX. Example: 'x^2/2' -> '\\frac{x^{2}}{2}'.")]
    async fn latex(
        &self,
        Parameters(params): Parameters<ExpressionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = parse(&params.expression).map(|expr| symbolic::to_latex(&expr));
        Ok(helpers::text_result(result))
    }

    #[tool(description = "Convert a decimal to a fraction p/q, optionally limiting the denominator.")]
    async fn to_fraction(
        &self,
        Parameters(params): Parameters<ToFractionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(helpers::text_result(symbolic::to_fraction(
            &params.decimal.to_text(),
            params.max_denominator,
        )))
    }

    #[tool(description = "Reduce a rational expression by cancelling common factors. Example: '(x^2 - 4)/(x - 2)' -> 'x + 2'.")]
    async fn simplify_fraction(
        &self,
        Parameters(params): Parameters<ExpressionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        helpers::blocking_text("simplify_fraction", move || {
            simplify_fraction_text(&params.expression)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbolic_text_results() {
        assert_eq!(simplify_text("x^2 + 2*x + 1 - (x + 1)^2").expect("simplify"), "0");
        assert_eq!(solve_text("x**2 - 4 = 0", "x").expect("solve"), r#"["-2","2"]"#);
        assert_eq!(derivative_text("x**3", "x", 2).expect("derivative"), "6*x");
        assert_eq!(integral_text("x**2", "x", None, None).expect("integral"), "x**3/3");
        assert_eq!(
            integral_text(
                "x**2",
                "x",
                Some(&NumberOrText::Number(0.0)),
                Some(&NumberOrText::Text("3".into()))
            )
            .expect("definite"),
            "9"
        );
    }

    #[test]
    fn bad_arguments_are_errors() {
        assert!(derivative_text("x", "x", -1).is_err());
        let half = integral_text("x", "x", Some(&NumberOrText::Number(0.0)), None)
            .expect_err("one bound");
        assert!(half.to_string().contains("Both lower_bound and upper_bound"));
    }

    #[test]
    fn zero_denominators_report_errors() {
        for expression in ["1/0", "x/0", "0/0", "(x**2 - 4)/(x - x)"] {
            let err = simplify_text(expression).expect_err(expression);
            assert_eq!(err.to_string(), "Division by zero");
            assert!(simplify_fraction_text(expression).is_err());
            assert!(evaluate_text(expression, None).is_err());
        }
        assert_eq!(simplify_fraction_text("(x**2 - 4)/(x - 2)").expect("cancel"), "x + 2");
    }

    #[test]
    fn huge_derivative_orders_finish_or_refuse() {
        assert_eq!(derivative_text("sin(x)", "x", 1_000_001).expect("periodic"), "cos(x)");
        assert_eq!(derivative_text("x**3 + 2*x", "x", 1_000_000).expect("polynomial"), "0");
        let err = derivative_text("sqrt(x)", "x", 1_000_000).expect_err("never settles");
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn evaluate_substitutes_values() {
        let subs = BTreeMap::from([("x".to_string(), 3.0)]);
        assert_eq!(evaluate_text("x**2 + 1", Some(&subs)).expect("evaluate"), "10.0");
        assert!(evaluate_text("x + y", Some(&subs)).is_err());
    }

    #[test]
    fn number_or_text_accepts_both_shapes() {
        let parsed: ToFractionParams =
            serde_json::from_str(r#"{"decimal": 0.75}"#).expect("number");
        assert_eq!(parsed.decimal, NumberOrText::Number(0.75));
        let parsed: ToFractionParams =
            serde_json::from_str(r#"{"decimal": "0.5", "max_denominator": 10}"#).expect("text");
        assert_eq!(parsed.decimal.to_text(), "0.5");
    }
}
