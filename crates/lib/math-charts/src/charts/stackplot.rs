use indexmap::IndexMap;
use plotters::style::Color;
use serde::{Deserialize, Serialize};

use super::{ChartKind, ChartSpec, rotates_labels};
use crate::colors::series_colors;
use crate::error::{ChartError, ChartResult};
use crate::options::{
    DEFAULT_SIZE, Grid, GridSetting, LegendLoc, OutputFormat, axis_limits, figure_size,
};
use crate::render::{
    Axes, Frame, LegendKey, PlotRect, RenderedChart, build_chart, category_label, draw_area,
    draw_axes, draw_legend, padded_range, pixel, render,
};

/// X positions given either as numbers or as category labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValues {
    Numbers(Vec<f64>),
    Labels(Vec<String>),
}

impl AxisValues {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Numbers(values) => values.len(),
            Self::Labels(labels) => labels.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn positions(&self) -> Vec<f64> {
        match self {
            Self::Numbers(values) => values.clone(),
            Self::Labels(labels) => (0..labels.len()).map(|idx| idx as f64).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Baseline {
    Zero,
    Sym,
    Wiggle,
    WeightedWiggle,
}

impl Baseline {
    fn parse(value: &str) -> ChartResult<Self> {
        match value {
            "zero" => Ok(Self::Zero),
            "sym" => Ok(Self::Sym),
            "wiggle" => Ok(Self::Wiggle),
            "weighted_wiggle" => Ok(Self::WeightedWiggle),
            _ => Err(ChartError::invalid(
                "baseline must be one of: 'zero', 'sym', 'wiggle', 'weighted_wiggle'",
            )),
        }
    }

    /// Offset of the bottom layer at every x position.
    fn first_line(self, series: &[&[f64]], points: usize) -> Vec<f64> {
        let totals = (0..points)
            .map(|j| series.iter().map(|values| values[j]).sum::<f64>())
            .collect::<Vec<_>>();
        match self {
            Self::Zero => vec![0.0; points],
            Self::Sym => totals.iter().map(|total| -0.5 * total).collect(),
            Self::Wiggle => {
                let m = series.len() as f64;
                (0..points)
                    .map(|j| {
                        let weighted = series
                            .iter()
                            .enumerate()
                            .map(|(i, values)| values[j] * (m - 0.5 - i as f64))
                            .sum::<f64>();
                        -weighted / m
                    })
                    .collect()
            }
            Self::WeightedWiggle => {
                let mut center = 0.0;
                (0..points)
                    .map(|j| {
                        let total = totals[j];
                        let inv_total = if total > 0.0 { 1.0 / total } else { 0.0 };
                        let mut below = 0.0;
                        let mut step = 0.0;
                        for values in series {
                            below += values[j];
                            let increase = if j == 0 { values[0] } else { values[j] - values[j - 1] };
                            let move_up = if j == 0 {
                                0.5
                            } else {
                                0.5f64.mul_add(values[j], total - below) * inv_total
                            };
                            step += (move_up - 0.5) * increase;
                        }
                        center += step;
                        0.5f64.mul_add(-total, center)
                    })
                    .collect()
            }
        }
    }
}

/// Lower and upper boundary of each layer.
pub(crate) fn stack_layers(series: &[&[f64]], baseline: Baseline) -> Vec<(Vec<f64>, Vec<f64>)> {
    let points = series.first().map_or(0, |values| values.len());
    let mut lower = baseline.first_line(series, points);
    series
        .iter()
        .map(|values| {
            let upper = lower.iter().zip(values.iter()).map(|(lo, value)| lo + value).collect::<Vec<_>>();
            let layer = (lower.clone(), upper.clone());
            lower = upper;
            layer
        })
        .collect()
}

/// Layered areas stacked on a chosen baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct StackplotChart {
    pub x_data: AxisValues,
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
    pub baseline: String,
    pub alpha: f64,
    pub xlabel_rotation: f64,
    pub output_format: String,
}

impl Default for StackplotChart {
    fn default() -> Self {
        Self {
            x_data: AxisValues::Numbers(Vec::new()),
            series: IndexMap::new(),
            title: None,
            xlabel: "X".to_string(),
            ylabel: "Value".to_string(),
            figsize: None,
            colors: None,
            xlim: None,
            ylim: None,
            grid: GridSetting::default(),
            legend_loc: Some("best".to_string()),
            baseline: "zero".to_string(),
            alpha: 0.7,
            xlabel_rotation: 45.0,
            output_format: "png".to_string(),
        }
    }
}

impl ChartSpec for StackplotChart {
    const KIND: ChartKind = ChartKind::Stackplot;

    fn render(&self) -> ChartResult<RenderedChart> {
        let format = OutputFormat::parse(&self.output_format)?;
        if self.x_data.is_empty() {
            return Err(ChartError::invalid("x_data list cannot be empty"));
        }
        if self.series.is_empty() {
            return Err(ChartError::invalid("series dictionary cannot be empty"));
        }
        for (name, values) in &self.series {
            if values.len() != self.x_data.len() {
                return Err(ChartError::invalid(format!(
                    "Series '{name}' has {} values but x_data has {}",
                    values.len(),
                    self.x_data.len()
                )));
            }
        }
        let xlim = axis_limits("xlim", self.xlim.as_deref())?;
        let ylim = axis_limits("ylim", self.ylim.as_deref())?;
        let grid = Grid::parse(&self.grid)?;
        let baseline = Baseline::parse(&self.baseline)?;
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ChartError::invalid("alpha must be between 0.0 and 1.0"));
        }
        let count = self.series.len();
        let colors = series_colors(self.colors.as_deref(), count, |given| {
            format!("colors list has {given} items but only {count} series provided")
        })?;
        let size = figure_size(self.figsize.as_deref(), DEFAULT_SIZE)?;
        let legend = LegendLoc::parse(self.legend_loc.as_deref())?;

        let columns = self.series.values().map(Vec::as_slice).collect::<Vec<_>>();
        let layers = stack_layers(&columns, baseline);
        let x = self.x_data.positions();
        let labels = match &self.x_data {
            AxisValues::Labels(labels) => Some(labels.as_slice()),
            AxisValues::Numbers(_) => None,
        };
        let rotate = rotates_labels(self.xlabel_rotation);

        tracing::debug!(series = count, points = x.len(), baseline = %self.baseline, "rendering stackplot");
        render(size, format, |root| {
            let x_range = xlim.unwrap_or_else(|| padded_range(x.iter().copied(), 0.0));
            let y_range = ylim.unwrap_or_else(|| {
                padded_range(layers.iter().flat_map(|(lo, hi)| lo.iter().chain(hi).copied()), 0.05)
            });
            let mut frame = Frame::new(self.title.as_deref());
            if let Some(labels) = labels {
                frame = frame.with_x_labels(labels, rotate);
            }
            let mut chart = build_chart(root, frame, x_range, y_range)?;
            let x_text = |value: &f64| labels.map(|labels| category_label(labels, *value)).unwrap_or_default();
            let mut axes = Axes::new(&self.xlabel, &self.ylabel, grid);
            axes.rotate_x = rotate;
            if let Some(labels) = labels {
                axes.x_format = Some(&x_text);
                axes.x_ticks = labels.len().clamp(1, 30);
            }
            draw_axes(&mut chart, &axes)?;
            let rect = PlotRect::of(&chart);

            for ((lower, upper), color) in layers.iter().zip(&colors) {
                let outline = x
                    .iter()
                    .zip(upper)
                    .map(|(x, y)| (*x, *y))
                    .chain(x.iter().zip(lower).rev().map(|(x, y)| (*x, *y)))
                    .map(|point| pixel(chart.backend_coord(&point)))
                    .collect::<Vec<_>>();
                draw_area(root, rect, &outline, color.to_plotters().mix(self.alpha))?;
            }
            if let Some(loc) = legend {
                let entries = self
                    .series
                    .keys()
                    .zip(&colors)
                    .map(|(name, color)| (name.clone(), LegendKey::Patch(*color)))
                    .collect::<Vec<_>>();
                draw_legend(root, rect, loc, &entries)?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-12)
    }

    #[test]
    fn zero_and_symmetric_baselines() {
        let a = [1.0, 2.0];
        let b = [3.0, 2.0];
        let zero = stack_layers(&[&a, &b], Baseline::Zero);
        assert!(close(&zero[0].0, &[0.0, 0.0]) && close(&zero[0].1, &[1.0, 2.0]));
        assert!(close(&zero[1].0, &[1.0, 2.0]) && close(&zero[1].1, &[4.0, 4.0]));

        let sym = stack_layers(&[&a, &b], Baseline::Sym);
        assert!(close(&sym[0].0, &[-2.0, -2.0]));
        assert!(close(&sym[1].1, &[2.0, 2.0]));
    }

    #[test]
    fn wiggle_baselines() {
        let a = [1.0, 1.0];
        let b = [1.0, 1.0];
        let wiggle = stack_layers(&[&a, &b], Baseline::Wiggle);
        assert!(close(&wiggle[0].0, &[-1.0, -1.0]));

        // Constant layers never move the centre line, so this matches `sym`.
        let weighted = stack_layers(&[&a, &b], Baseline::WeightedWiggle);
        assert!(close(&weighted[0].0, &[-1.0, -1.0]));
        assert!(close(&weighted[1].1, &[1.0, 1.0]));
    }

    #[test]
    fn x_values_accept_numbers_or_labels() {
        let numbers: AxisValues = serde_json::from_str("[0, 1.5, 3]").expect("numbers");
        assert_eq!(numbers, AxisValues::Numbers(vec![0.0, 1.5, 3.0]));
        let labels: AxisValues = serde_json::from_str(r#"["Q1", "Q2"]"#).expect("labels");
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn renders_categorical_stack() {
        let chart = StackplotChart {
            x_data: AxisValues::Labels(vec!["Q1".into(), "Q2".into(), "Q3".into()]),
            series: IndexMap::from([
                ("product_x".to_string(), vec![100.0, 120.0, 110.0]),
                ("product_y".to_string(), vec![80.0, 90.0, 95.0]),
            ]),
            baseline: "wiggle".into(),
            output_format: "svg".into(),
            ..StackplotChart::default()
        };
        let svg = String::from_utf8(chart.render().expect("render").bytes().to_vec()).expect("utf8");
        assert!(svg.contains("product_y"));
        assert!(svg.contains("<polygon"));
    }

    #[test]
    fn validation_messages() {
        let base = StackplotChart {
            x_data: AxisValues::Numbers(vec![0.0, 1.0]),
            series: IndexMap::from([("a".to_string(), vec![1.0, 2.0])]),
            ..StackplotChart::default()
        };
        let error = |chart: StackplotChart| chart.render().expect_err("invalid").to_string();
        assert_eq!(
            error(StackplotChart { baseline: "flat".into(), ..base.clone() }),
            "baseline must be one of: 'zero', 'sym', 'wiggle', 'weighted_wiggle'"
        );
        assert_eq!(
            error(StackplotChart { alpha: 1.5, ..base.clone() }),
            "alpha must be between 0.0 and 1.0"
        );
        assert_eq!(
            error(StackplotChart { x_data: AxisValues::Numbers(vec![0.0]), ..base }),
            "Series 'a' has 2 values but x_data has 1"
        );
    }
}
