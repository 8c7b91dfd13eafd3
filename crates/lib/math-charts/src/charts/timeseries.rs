use indexmap::IndexMap;

use super::lines::{Layer, LinePlot};
use super::{ChartKind, ChartSpec, rotates_labels};
use crate::colors::series_colors;
use crate::error::{ChartError, ChartResult};
use crate::format::ValueFormat;
use crate::options::{
    DEFAULT_SIZE, Grid, GridSetting, LegendLoc, OutputFormat, axis_limits, figure_size,
    line_styles,
};
use crate::render::{RenderedChart, render};

/// Named series over shared categorical timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesChart {
    pub timestamps: Vec<String>,
    pub series: IndexMap<String, Vec<f64>>,
    pub title: Option<String>,
    pub xlabel: String,
    pub ylabel: String,
    pub figsize: Option<Vec<u32>>,
    pub colors: Option<Vec<String>>,
    pub xlim: Option<Vec<f64>>,
    pub ylim: Option<Vec<f64>>,
    pub grid: GridSetting,
    pub legend_loc: Option<String>,
    pub linestyles: Option<Vec<String>>,
    /// Series name to secondary axis label.
    pub secondary_y: Option<IndexMap<String, String>>,
    pub xlabel_rotation: f64,
    pub show_values: bool,
    pub value_format: String,
    pub output_format: String,
}

impl Default for TimeseriesChart {
    fn default() -> Self {
        Self {
            timestamps: Vec::new(),
            series: IndexMap::new(),
            title: None,
            xlabel: "Time".to_string(),
            ylabel: "Value".to_string(),
            figsize: None,
            colors: None,
            xlim: None,
            ylim: None,
            grid: GridSetting::default(),
            legend_loc: Some("best".to_string()),
            linestyles: None,
            secondary_y: None,
            xlabel_rotation: 45.0,
            show_values: false,
            value_format: ".1f".to_string(),
            output_format: "png".to_string(),
        }
    }
}

impl ChartSpec for TimeseriesChart {
    const KIND: ChartKind = ChartKind::Timeseries;

    fn render(&self) -> ChartResult<RenderedChart> {
        let format = OutputFormat::parse(&self.output_format)?;
        if self.timestamps.is_empty() {
            return Err(ChartError::invalid("timestamps list cannot be empty"));
        }
        if self.series.is_empty() {
            return Err(ChartError::invalid("series dictionary cannot be empty"));
        }
        for (name, values) in &self.series {
            if values.len() != self.timestamps.len() {
                return Err(ChartError::invalid(format!(
                    "Series '{name}' has {} values but timestamps has {}",
                    values.len(),
                    self.timestamps.len()
                )));
            }
        }
        let xlim = axis_limits("xlim", self.xlim.as_deref())?;
        let ylim = axis_limits("ylim", self.ylim.as_deref())?;
        let grid = Grid::parse(&self.grid)?;
        let count = self.series.len();
        let styles = line_styles(self.linestyles.as_deref(), count, |given| {
            format!("linestyles list has {given} items but only {count} series provided")
        })?;
        let secondary = self.secondary_y.as_ref();
        if let Some(secondary) = secondary {
            if let Some(missing) = secondary.keys().find(|name| !self.series.contains_key(*name)) {
                return Err(ChartError::invalid(format!(
                    "secondary_y key '{missing}' not found in series dictionary"
                )));
            }
        }
        let value_format = if self.show_values {
            Some(ValueFormat::parse(&self.value_format)?)
        } else {
            None
        };
        let colors = series_colors(self.colors.as_deref(), count, |given| {
            format!("colors list has {given} items but only {count} series provided")
        })?;
        let size = figure_size(self.figsize.as_deref(), DEFAULT_SIZE)?;
        let legend = LegendLoc::parse(self.legend_loc.as_deref())?;

        let is_secondary = |name: &str| secondary.is_some_and(|map| map.contains_key(name));
        let secondary_label = self
            .series
            .keys()
            .find(|name| is_secondary(name))
            .and_then(|name| secondary.and_then(|map| map.get(name)))
            .map(String::as_str);
        let layers = self
            .series
            .iter()
            .zip(colors.into_iter().zip(styles))
            .map(|((name, values), (color, style))| Layer {
                name: name.clone(),
                values: values.clone(),
                color,
                style,
                secondary: is_secondary(name),
            })
            .collect();

        tracing::debug!(series = count, points = self.timestamps.len(), "rendering time series");
        let plot = LinePlot {
            title: self.title.as_deref(),
            xlabel: &self.xlabel,
            ylabel: &self.ylabel,
            secondary_label,
            x: (0..self.timestamps.len()).map(|idx| idx as f64).collect(),
            categories: Some(&self.timestamps),
            rotate_x: rotates_labels(self.xlabel_rotation),
            xlim,
            ylim,
            grid,
            legend,
            layers,
            marker_radius: 4,
            value_format: value_format.as_ref(),
            note: None,
        };
        render(size, format, |root| plot.draw(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> TimeseriesChart {
        TimeseriesChart {
            timestamps: vec!["Jan".into(), "Feb".into(), "Mar".into()],
            series: IndexMap::from([
                ("sales".to_string(), vec![1.0, 2.0, 3.0]),
                ("temp".to_string(), vec![20.0, 22.5, 19.0]),
            ]),
            output_format: "svg".into(),
            ..TimeseriesChart::default()
        }
    }

    fn error_of(chart: &TimeseriesChart) -> String {
        chart.render().expect_err("invalid").to_string()
    }

    #[test]
    fn renders_with_secondary_axis_and_labels() {
        let mut request = chart();
        request.secondary_y = Some(IndexMap::from([("temp".to_string(), "Temperature".to_string())]));
        request.show_values = true;
        request.title = Some("Quarter".into());
        let rendered = request.render().expect("render");
        let svg = String::from_utf8(rendered.bytes().to_vec()).expect("utf8");
        assert!(svg.contains("Temperature"));
        assert!(svg.contains("22.5"));
        assert!(svg.contains("Feb"));
        assert!(svg.contains("Quarter"));
    }

    #[test]
    fn validation_runs_in_order() {
        let mut request = chart();
        request.output_format = "gif".into();
        request.timestamps.clear();
        assert_eq!(error_of(&request), "output_format must be 'png' or 'svg'");

        let mut request = chart();
        request.series.insert("short".into(), vec![1.0]);
        assert_eq!(error_of(&request), "Series 'short' has 1 values but timestamps has 3");

        let mut request = chart();
        request.linestyles = Some(vec!["-".into(), "--".into(), ":".into()]);
        assert_eq!(
            error_of(&request),
            "linestyles list has 3 items but only 2 series provided"
        );

        let mut request = chart();
        request.secondary_y = Some(IndexMap::from([("rain".to_string(), "mm".to_string())]));
        assert_eq!(error_of(&request), "secondary_y key 'rain' not found in series dictionary");

        let mut request = chart();
        request.colors = Some(vec!["red".into(), "blue".into(), "green".into()]);
        assert_eq!(error_of(&request), "colors list has 3 items but only 2 series provided");
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let mut request = chart();
        request.timestamps.clear();
        assert_eq!(error_of(&request), "timestamps list cannot be empty");
        let mut request = chart();
        request.series.clear();
        assert_eq!(error_of(&request), "series dictionary cannot be empty");
    }
}
