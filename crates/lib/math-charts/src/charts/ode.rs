use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::lines::{Layer, LinePlot};
use super::{ChartKind, ChartSpec};
use crate::colors::series_colors;
use crate::error::{ChartError, ChartResult};
use crate::options::{
    DEFAULT_SIZE, Grid, GridSetting, LegendLoc, OutputFormat, axis_limits, figure_size,
    line_styles,
};
use crate::render::{RenderedChart, render};

/// Keys of a flat result that describe the solve rather than a variable.
const METADATA_KEYS: [&str; 5] = ["t", "success", "method", "n_points", "message"];

/// Plots the JSON produced by an ODE solve.
///
/// Both the nested `{"time": [...], "state": {"x": [...]}}` shape and the flat
/// `{"t": [...], "x": [...]}` shape are accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct OdeSolutionChart {
    pub ode_result: String,
    pub title: Option<String>,
    pub figsize: Option<Vec<u32>>,
    pub colors: Option<Vec<String>>,
    pub xlim: Option<Vec<f64>>,
    pub ylim: Option<Vec<f64>>,
    pub grid: GridSetting,
    pub legend_loc: Option<String>,
    pub linestyles: Option<Vec<String>>,
    pub secondary_y: Option<IndexMap<String, String>>,
    pub output_format: String,
}

impl Default for OdeSolutionChart {
    fn default() -> Self {
        Self {
            ode_result: String::new(),
            title: None,
            figsize: None,
            colors: None,
            xlim: None,
            ylim: None,
            grid: GridSetting::default(),
            legend_loc: Some("best".to_string()),
            linestyles: None,
            secondary_y: None,
            output_format: "png".to_string(),
        }
    }
}

/// Time axis and variable columns pulled out of a solve result.
struct Solution<'a> {
    time: &'a [Value],
    variables: Vec<(&'a str, &'a Value)>,
    method: Option<String>,
}

impl<'a> Solution<'a> {
    fn from_object(object: &'a Map<String, Value>) -> ChartResult<Self> {
        let method = object.get("method").map(|method| match method {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        });
        let nested = object.get("time").zip(object.get("state").and_then(Value::as_object));
        let (time, variables) = match nested {
            Some((time, state)) => (
                time,
                state.iter().map(|(name, values)| (name.as_str(), values)).collect::<Vec<_>>(),
            ),
            None => {
                let time = object
                    .get("t")
                    .ok_or_else(|| ChartError::invalid("ode_result must contain 't' (time) array"))?;
                let variables = object
                    .iter()
                    .filter(|(key, _)| !METADATA_KEYS.contains(&key.as_str()))
                    .map(|(name, values)| (name.as_str(), values))
                    .collect::<Vec<_>>();
                (time, variables)
            }
        };
        let time = time
            .as_array()
            .ok_or_else(|| ChartError::invalid("ode_result must contain 't' (time) array"))?;
        if time.is_empty() {
            return Err(ChartError::invalid("Time array 't' cannot be empty"));
        }
        if variables.is_empty() {
            return Err(ChartError::invalid("No solution variables found in ode_result"));
        }
        Ok(Self { time, variables, method })
    }
}

fn numbers(values: &[Value], what: impl FnOnce() -> String) -> ChartResult<Vec<f64>> {
    values
        .iter()
        .map(Value::as_f64)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| ChartError::invalid(format!("{} must contain only numbers", what())))
}

impl ChartSpec for OdeSolutionChart {
    const KIND: ChartKind = ChartKind::OdeSolution;

    fn render(&self) -> ChartResult<RenderedChart> {
        let format = OutputFormat::parse(&self.output_format)?;
        let parsed: Value = serde_json::from_str(&self.ode_result)
            .map_err(|err| ChartError::invalid(format!("Invalid JSON in ode_result: {err}")))?;
        let object = parsed
            .as_object()
            .ok_or_else(|| ChartError::invalid("ode_result must be a JSON object"))?;
        let solution = Solution::from_object(object)?;
        let count = solution.variables.len();

        let xlim = axis_limits("xlim", self.xlim.as_deref())?;
        let ylim = axis_limits("ylim", self.ylim.as_deref())?;
        let grid = Grid::parse(&self.grid)?;
        let styles = line_styles(self.linestyles.as_deref(), count, |given| {
            format!("linestyles list has {given} items but only {count} variables found")
        })?;
        let secondary = self.secondary_y.as_ref();
        if let Some(secondary) = secondary {
            let known = |name: &str| solution.variables.iter().any(|(var, _)| *var == name);
            if let Some(missing) = secondary.keys().find(|name| !known(name)) {
                return Err(ChartError::invalid(format!(
                    "secondary_y key '{missing}' not found in variable names"
                )));
            }
        }
        let colors = series_colors(self.colors.as_deref(), count, |given| {
            format!("colors list has {given} items but only {count} variables found")
        })?;
        let size = figure_size(self.figsize.as_deref(), DEFAULT_SIZE)?;
        let legend = LegendLoc::parse(self.legend_loc.as_deref())?;

        let time = numbers(solution.time, || "Time array 't'".to_string())?;
        let is_secondary = |name: &str| secondary.is_some_and(|map| map.contains_key(name));
        let mut layers = Vec::with_capacity(count);
        for ((name, values), (color, style)) in solution
            .variables
            .iter()
            .zip(colors.into_iter().zip(styles))
        {
            let values = values
                .as_array()
                .ok_or_else(|| ChartError::invalid(format!("Variable '{name}' must be an array of numbers")))?;
            if values.len() != time.len() {
                return Err(ChartError::invalid(format!(
                    "Variable '{name}' has {} values but time has {} points",
                    values.len(),
                    time.len()
                )));
            }
            layers.push(Layer {
                name: (*name).to_string(),
                values: numbers(values, || format!("Variable '{name}'"))?,
                color,
                style,
                secondary: is_secondary(name),
            });
        }
        let secondary_label = layers
            .iter()
            .find(|layer| layer.secondary)
            .and_then(|layer| secondary.and_then(|map| map.get(&layer.name)))
            .map(String::as_str);

        tracing::debug!(variables = count, points = time.len(), "rendering ODE solution");
        let plot = LinePlot {
            title: Some(self.title.as_deref().unwrap_or("ODE Solution")),
            xlabel: "Time (t)",
            ylabel: "Value",
            secondary_label,
            x: time,
            categories: None,
            rotate_x: false,
            xlim,
            ylim,
            grid,
            legend,
            layers,
            marker_radius: 3,
            value_format: None,
            note: solution.method.map(|method| format!("Method: {method}")),
        };
        render(size, format, |root| plot.draw(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(result: &str) -> OdeSolutionChart {
        OdeSolutionChart {
            ode_result: result.to_string(),
            output_format: "svg".into(),
            ..OdeSolutionChart::default()
        }
    }

    fn svg(chart: &OdeSolutionChart) -> String {
        let rendered = chart.render().expect("render");
        String::from_utf8(rendered.bytes().to_vec()).expect("utf8")
    }

    #[test]
    fn accepts_flat_results() {
        let text = svg(&chart(
            r#"{"t": [0, 1, 2], "x": [1, 0.5, 0.25], "success": true, "method": "RK45"}"#,
        ));
        assert!(text.contains("ODE Solution"));
        assert!(text.contains("Method: RK45"));
        assert!(!text.contains(">success<"));
    }

    #[test]
    fn accepts_solver_output() {
        let mut request = chart(
            r#"{"time": [0, 0.5, 1], "state": {"v": [0, 1, 2], "x": [1, 2, 3]}, "method": "RK4", "success": true}"#,
        );
        request.secondary_y = Some(IndexMap::from([("v".to_string(), "Velocity".to_string())]));
        request.title = Some("Motion".into());
        let text = svg(&request);
        assert!(text.contains("Velocity"));
        assert!(text.contains("Motion"));
    }

    #[test]
    fn rejects_malformed_results() {
        let error = |result: &str| chart(result).render().expect_err("invalid").to_string();
        assert!(error("{not json").starts_with("Invalid JSON in ode_result: "));
        assert_eq!(error("[1, 2]"), "ode_result must be a JSON object");
        assert_eq!(error(r#"{"x": [1]}"#), "ode_result must contain 't' (time) array");
        assert_eq!(error(r#"{"t": [], "x": []}"#), "Time array 't' cannot be empty");
        assert_eq!(
            error(r#"{"t": [0], "success": true}"#),
            "No solution variables found in ode_result"
        );
        assert_eq!(
            error(r#"{"t": [0, 1], "x": [1]}"#),
            "Variable 'x' has 1 values but time has 2 points"
        );
    }

    #[test]
    fn validates_secondary_and_colors() {
        let mut request = chart(r#"{"t": [0, 1], "x": [1, 2]}"#);
        request.secondary_y = Some(IndexMap::from([("y".to_string(), "Y".to_string())]));
        assert_eq!(
            request.render().expect_err("secondary").to_string(),
            "secondary_y key 'y' not found in variable names"
        );
        let mut request = chart(r#"{"t": [0, 1], "x": [1, 2]}"#);
        request.colors = Some(vec!["red".into(), "blue".into()]);
        assert_eq!(
            request.render().expect_err("colors").to_string(),
            "colors list has 2 items but only 1 variables found"
        );
    }
}
