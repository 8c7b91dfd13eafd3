use plotters::style::{BLACK, Color};

use super::{ChartKind, ChartSpec};
use crate::colors::single_color;
use crate::error::{ChartError, ChartResult};
use crate::options::{DEFAULT_SIZE, Grid, GridSetting, OutputFormat, axis_limits, figure_size};
use crate::render::{
    Axes, Frame, PlotRect, RenderedChart, build_chart, draw_axes, draw_bar, draw_note,
    padded_range, pixel, render, value_range,
};

const MAX_BINS: i64 = 10_000;

/// Distribution of `data` over equal-width bins, annotated with summary
/// statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramChart {
    pub data: Vec<f64>,
    pub bins: i64,
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

impl Default for HistogramChart {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            bins: 30,
            title: None,
            xlabel: "Value".to_string(),
            ylabel: "Frequency".to_string(),
            figsize: None,
            color: None,
            xlim: None,
            ylim: None,
            grid: GridSetting::default(),
            output_format: "png".to_string(),
        }
    }
}

/// Bin edges and counts over the data range. A constant sample gets a unit
/// wide range centred on its value; the top edge is inclusive.
pub(crate) fn bin_counts(data: &[f64], bins: usize) -> (Vec<f64>, Vec<u64>) {
    let (mut lo, mut hi) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), value| (lo.min(*value), hi.max(*value)));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let edges = (0..=bins)
        .map(|idx| if idx == bins { hi } else { (idx as f64).mul_add(width, lo) })
        .collect::<Vec<_>>();
    let mut counts = vec![0_u64; bins];
    for value in data {
        let slot = (((value - lo) / width).floor() as usize).min(bins - 1);
        counts[slot] += 1;
    }
    (edges, counts)
}

/// Mean, median, and population standard deviation.
fn summary(data: &[f64]) -> (f64, f64, f64) {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    let variance = data.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / n;
    (mean, median, variance.sqrt())
}

impl ChartSpec for HistogramChart {
    const KIND: ChartKind = ChartKind::Histogram;

    fn render(&self) -> ChartResult<RenderedChart> {
        let format = OutputFormat::parse(&self.output_format)?;
        if self.data.is_empty() {
            return Err(ChartError::invalid("data list cannot be empty"));
        }
        if self.bins <= 0 {
            return Err(ChartError::invalid("bins must be positive"));
        }
        if self.bins > MAX_BINS {
            return Err(ChartError::invalid(format!("bins must be at most {MAX_BINS}")));
        }
        if self.data.iter().any(|value| !value.is_finite()) {
            return Err(ChartError::invalid("data must contain only finite values"));
        }
        let xlim = axis_limits("xlim", self.xlim.as_deref())?;
        let ylim = axis_limits("ylim", self.ylim.as_deref())?;
        let grid = Grid::parse(&self.grid)?.value_axis_only(false);
        let color = single_color(self.color.as_deref())?;
        let size = figure_size(self.figsize.as_deref(), DEFAULT_SIZE)?;

        let (edges, counts) = bin_counts(&self.data, self.bins as usize);
        let (mean, median, std) = summary(&self.data);
        let note = [
            format!("Mean: {mean:.2}"),
            format!("Median: {median:.2}"),
            format!("Std: {std:.2}"),
        ];
        tracing::debug!(points = self.data.len(), bins = self.bins, "rendering histogram");
        render(size, format, |root| {
            let x_range = xlim.unwrap_or_else(|| padded_range(edges.iter().copied(), 0.05));
            let y_range = ylim.unwrap_or_else(|| value_range(counts.iter().map(|count| *count as f64)));
            let mut chart = build_chart(root, Frame::new(self.title.as_deref()), x_range, y_range)?;
            draw_axes(&mut chart, &Axes::new(&self.xlabel, &self.ylabel, grid))?;
            let rect = PlotRect::of(&chart);
            let fill = color.to_plotters().mix(0.7);
            for (pair, count) in edges.windows(2).zip(&counts) {
                let a = pixel(chart.backend_coord(&(pair[0], 0.0)));
                let b = pixel(chart.backend_coord(&(pair[1], *count as f64)));
                draw_bar(root, rect, a, b, fill, Some(BLACK))?;
            }
            draw_note(root, rect, &note, true)
        })
    }
}
