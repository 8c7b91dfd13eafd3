use plotters::style::text_anchor::{HPos, VPos};
use plotters::style::{Color, WHITE};

use super::{ChartKind, ChartSpec, rotates_labels};
use crate::colormap::Colormap;
use crate::error::{ChartError, ChartResult};
use crate::options::{DEFAULT_SIZE_LARGE, Grid, GridSetting, OutputFormat, figure_size};
use crate::render::{
    Axes, Frame, PlotRect, RenderedChart, Root, TICK_PX, VALUE_PX, anchored, build_chart,
    category_label, draw_axes, draw_bar, draw_label, font, label_area_for, pixel, render,
};

const COLORBAR_PX: u32 = 120;
const CAPTION_PX: i32 = 30;
const ANNOTATE_MAX: usize = 20;
const COLORBAR_STEPS: usize = 64;

/// A matrix drawn as colored cells, first row at the top, with a colorbar.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapChart {
    pub data: Vec<Vec<f64>>,
    pub x_labels: Option<Vec<String>>,
    pub y_labels: Option<Vec<String>>,
    pub title: Option<String>,
    pub colormap: String,
    pub figsize: Option<Vec<u32>>,
    pub grid: GridSetting,
    pub xlabel_rotation: f64,
    pub output_format: String,
}

impl Default for HeatmapChart {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            x_labels: None,
            y_labels: None,
            title: None,
            colormap: "viridis".to_string(),
            figsize: None,
            grid: GridSetting::default(),
            xlabel_rotation: 45.0,
            output_format: "png".to_string(),
        }
    }
}

fn index_labels(count: usize) -> Vec<String> {
    (0..count).map(|idx| idx.to_string()).collect()
}

/// Finite extent of the matrix, widened when every cell is equal.
fn color_limits(data: &[Vec<f64>]) -> (f64, f64) {
    let (lo, hi) = data
        .iter()
        .flatten()
        .filter(|value| value.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), value| (lo.min(*value), hi.max(*value)));
    if !lo.is_finite() {
        (0.0, 1.0)
    } else if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

impl HeatmapChart {
    fn draw_colorbar(
        root: &Root<'_>,
        area: &Root<'_>,
        frame: Frame<'_>,
        colormap: Colormap,
        (lo, hi): (f64, f64),
    ) -> ChartResult<()> {
        let mut bar = build_chart(area, frame, (0.0, 1.0), (lo, hi))?;
        let rect = PlotRect::of(&bar);
        let step = (hi - lo) / COLORBAR_STEPS as f64;
        for idx in 0..COLORBAR_STEPS {
            let from = (idx as f64).mul_add(step, lo);
            let color = colormap.color_for(from + step / 2.0, lo, hi);
            let a = pixel(bar.backend_coord(&(0.0, from)));
            let b = pixel(bar.backend_coord(&(1.0, from + step)));
            draw_bar(root, rect, a, b, color.to_plotters().to_rgba(), None)?;
        }
        bar.configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .y_labels(6)
            .label_style(font(TICK_PX))
            .draw()?;
        Ok(())
    }
}

impl ChartSpec for HeatmapChart {
    const KIND: ChartKind = ChartKind::Heatmap;

    fn render(&self) -> ChartResult<RenderedChart> {
        let format = OutputFormat::parse(&self.output_format)?;
        if self.data.is_empty() {
            return Err(ChartError::invalid("data cannot be empty"));
        }
        let rows = self.data.len();
        let cols = self.data[0].len();
        if cols == 0 || self.data.iter().any(|row| row.len() != cols) {
            return Err(ChartError::invalid("data must be 2-dimensional"));
        }
        if let Some(labels) = self.x_labels.as_ref().filter(|labels| labels.len() != cols) {
            return Err(ChartError::invalid(format!(
                "x_labels has {} items but data has {cols} columns",
                labels.len()
            )));
        }
        if let Some(labels) = self.y_labels.as_ref().filter(|labels| labels.len() != rows) {
            return Err(ChartError::invalid(format!(
                "y_labels has {} items but data has {rows} rows",
                labels.len()
            )));
        }
        let colormap = Colormap::parse(&self.colormap)?;
        let grid = Grid::parse(&self.grid)?;
        let size = figure_size(self.figsize.as_deref(), DEFAULT_SIZE_LARGE)?;

        let x_names = self.x_labels.clone().unwrap_or_else(|| index_labels(cols));
        // Position 0 is the bottom row on screen, so labels run bottom-up.
        let y_positions = self
            .y_labels
            .clone()
            .unwrap_or_else(|| index_labels(rows))
            .into_iter()
            .rev()
            .collect::<Vec<_>>();
        let limits = color_limits(&self.data);
        let rotate = rotates_labels(self.xlabel_rotation);

        tracing::debug!(rows, cols, colormap = %self.colormap, "rendering heatmap");
        render(size, format, |root| {
            let (width, _) = root.dim_in_pixel();
            let (main, side) = root.split_horizontally(width.saturating_sub(COLORBAR_PX) as i32);
            let frame = Frame::new(self.title.as_deref())
                .with_x_labels(&x_names, rotate)
                .with_y_area(label_area_for(&y_positions));
            let mut chart = build_chart(&main, frame, (-0.5, cols as f64 - 0.5), (-0.5, rows as f64 - 0.5))?;
            let rect = PlotRect::of(&chart);
            let cell = |col: usize, row: usize| {
                let y = (rows - 1 - row) as f64;
                let x = col as f64;
                (
                    pixel(chart.backend_coord(&(x - 0.5, y - 0.5))),
                    pixel(chart.backend_coord(&(x + 0.5, y + 0.5))),
                    pixel(chart.backend_coord(&(x, y))),
                )
            };
            for (row, values) in self.data.iter().enumerate() {
                for (col, value) in values.iter().enumerate().filter(|(_, value)| value.is_finite()) {
                    let (a, b, _) = cell(col, row);
                    let color = colormap.color_for(*value, limits.0, limits.1);
                    draw_bar(root, rect, a, b, color.to_plotters().to_rgba(), None)?;
                }
            }
            if rows <= ANNOTATE_MAX && cols <= ANNOTATE_MAX {
                let style = anchored(font(VALUE_PX), WHITE, HPos::Center, VPos::Center);
                for (row, values) in self.data.iter().enumerate() {
                    for (col, value) in values.iter().enumerate().filter(|(_, value)| value.is_finite()) {
                        let (_, _, center) = cell(col, row);
                        draw_label(root, rect, &format!("{value:.1}"), center, &style)?;
                    }
                }
            }

            let x_text = |value: &f64| category_label(&x_names, *value);
            let y_text = |value: &f64| category_label(&y_positions, *value);
            let mut axes = Axes::new("", "", grid);
            axes.x_format = Some(&x_text);
            axes.y_format = Some(&y_text);
            axes.x_ticks = cols.clamp(1, 30);
            axes.y_ticks = rows.clamp(1, 30);
            axes.rotate_x = rotate;
            draw_axes(&mut chart, &axes)?;

            let top = if self.title.as_deref().is_some_and(|title| !title.is_empty()) {
                CAPTION_PX
            } else {
                0
            };
            let bar_frame = Frame::new(None)
                .with_x_labels(&x_names, rotate)
                .with_y_area(70)
                .with_top_area(top);
            Self::draw_colorbar(root, &side, bar_frame, colormap, limits)
        })
    }
}
