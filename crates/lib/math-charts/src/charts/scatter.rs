use plotters::style::text_anchor::{HPos, VPos};
use plotters::style::{BLACK, Color, RGBColor};

use super::{ChartKind, ChartSpec};
use crate::colors::single_color;
use crate::error::{ChartError, ChartResult};
use crate::options::{DEFAULT_SIZE, Grid, GridSetting, OutputFormat, axis_limits, figure_size};
use crate::render::{
    Axes, Frame, PlotRect, RenderedChart, VALUE_PX, anchored, build_chart, draw_axes,
    draw_label, draw_markers, draw_note, font, padded_range, pixel, render,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterChart {
    pub x_data: Vec<f64>,
    pub y_data: Vec<f64>,
    pub labels: Option<Vec<String>>,
    pub title: Option<String>,
    pub xlabel: String,
    pub ylabel: String,
    pub figsize: Option<Vec<u32>>,
    pub color: Option<String>,
    pub xlim: Option<Vec<f64>>,
    pub ylim: Option<Vec<f64>>,
    pub grid: GridSetting,
    pub output_format: String,
}

impl Default for ScatterChart {
    fn default() -> Self {
        Self {
            x_data: Vec::new(),
            y_data: Vec::new(),
            labels: None,
            title: None,
            xlabel: "X".to_string(),
            ylabel: "Y".to_string(),
            figsize: None,
            color: None,
            xlim: None,
            ylim: None,
            grid: GridSetting::default(),
            output_format: "png".to_string(),
        }
    }
}

/// Pearson correlation; NaN when either side has no variance.
pub(crate) fn correlation(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mean_x, b - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    sxy / (sxx * syy).sqrt()
}

impl ChartSpec for ScatterChart {
    const KIND: ChartKind = ChartKind::Scatter;

    fn render(&self) -> ChartResult<RenderedChart> {
        let format = OutputFormat::parse(&self.output_format)?;
        if self.x_data.is_empty() || self.y_data.is_empty() {
            return Err(ChartError::invalid("x_data and y_data cannot be empty"));
        }
        if self.x_data.len() != self.y_data.len() {
            return Err(ChartError::invalid(format!(
                "x_data has {} values but y_data has {}",
                self.x_data.len(),
                self.y_data.len()
            )));
        }
        if let Some(labels) = &self.labels {
            if labels.len() != self.x_data.len() {
                return Err(ChartError::invalid(format!(
                    "labels has {} values but data has {} points",
                    labels.len(),
                    self.x_data.len()
                )));
            }
        }
        let xlim = axis_limits("xlim", self.xlim.as_deref())?;
        let ylim = axis_limits("ylim", self.ylim.as_deref())?;
        let grid = Grid::parse(&self.grid)?;
        let color = single_color(self.color.as_deref())?;
        let size = figure_size(self.figsize.as_deref(), DEFAULT_SIZE)?;

        let note = (self.x_data.len() > 1).then(|| {
            match correlation(&self.x_data, &self.y_data) {
                r if r.is_nan() => "Correlation: nan".to_string(),
                r => format!("Correlation: {r:.3}"),
            }
        });
        tracing::debug!(points = self.x_data.len(), "rendering scatter plot");
        render(size, format, |root| {
            let x_range = xlim.unwrap_or_else(|| padded_range(self.x_data.iter().copied(), 0.05));
            let y_range = ylim.unwrap_or_else(|| padded_range(self.y_data.iter().copied(), 0.05));
            let mut chart = build_chart(root, Frame::new(self.title.as_deref()), x_range, y_range)?;
            draw_axes(&mut chart, &Axes::new(&self.xlabel, &self.ylabel, grid))?;
            let rect = PlotRect::of(&chart);
            let points = self
                .x_data
                .iter()
                .zip(&self.y_data)
                .map(|(x, y)| pixel(chart.backend_coord(&(*x, *y))))
                .collect::<Vec<_>>();
            draw_markers(root, rect, &points, 7, color.to_plotters().mix(0.6), Some(BLACK))?;
            if let Some(labels) = &self.labels {
                let style = anchored(font(VALUE_PX), RGBColor(51, 51, 51), HPos::Left, VPos::Bottom);
                for (label, at) in labels.iter().zip(&points) {
                    draw_label(root, rect, label, (at.0 + 5.0, at.1 - 5.0), &style)?;
                }
            }
            match &note {
                Some(note) => draw_note(root, rect, std::slice::from_ref(note), false),
                None => Ok(()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_matches_known_values() {
        assert!((correlation(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
        assert!((correlation(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
        assert!(correlation(&[1.0, 2.0], &[5.0, 5.0]).is_nan());
    }

    #[test]
    fn renders_labels_and_correlation() {
        let chart = ScatterChart {
            x_data: vec![5.0, 6.0, 7.0],
            y_data: vec![14.5, 12.0, 9.8],
            labels: Some(vec!["Point A".into(), "Point B".into(), "Point C".into()]),
            output_format: "svg".into(),
            ..ScatterChart::default()
        };
        let svg = String::from_utf8(chart.render().expect("render").bytes().to_vec()).expect("utf8");
        assert!(svg.contains("Point B"));
        assert!(svg.contains("Correlation: -0.99"));
    }

    #[test]
    fn validation_messages() {
        let error = |chart: ScatterChart| chart.render().expect_err("invalid").to_string();
        assert_eq!(error(ScatterChart::default()), "x_data and y_data cannot be empty");
        assert_eq!(
            error(ScatterChart { x_data: vec![1.0, 2.0], y_data: vec![1.0], ..ScatterChart::default() }),
            "x_data has 2 values but y_data has 1"
        );
        assert_eq!(
            error(ScatterChart {
                x_data: vec![1.0],
                y_data: vec![1.0],
                labels: Some(vec![]),
                ..ScatterChart::default()
            }),
            "labels has 0 values but data has 1 points"
        );
    }
}
