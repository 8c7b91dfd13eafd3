use indexmap::IndexMap;
use plotters::style::text_anchor::{HPos, VPos};
use plotters::style::{BLACK, Color, TextStyle, WHITE};

use super::{ChartKind, ChartSpec, rotates_labels};
use crate::colors::{series_colors, single_color};
use crate::error::{ChartError, ChartResult};
use crate::format::ValueFormat;
use crate::options::{
    DEFAULT_SIZE, Grid, GridSetting, LegendLoc, OutputFormat, axis_limits, figure_size,
};
use crate::render::{
    Axes, Frame, LegendKey, PlotRect, RenderedChart, Root, VALUE_PX, anchored, bold,
    build_chart, category_label, draw_axes, draw_bar, draw_label, draw_legend, label_area_for,
    pixel, render, value_range,
};

const BAR_WIDTH: f64 = 0.8;

/// Maps `(category position, value)` to absolute pixels.
type Project<'p> = &'p dyn Fn((f64, f64)) -> (f64, f64);

/// Axis layout shared by plain and stacked bars.
struct BarFrame<'a> {
    title: Option<&'a str>,
    xlabel: &'a str,
    ylabel: &'a str,
    categories: &'a [String],
    horizontal: bool,
    rotate: bool,
    xlim: Option<(f64, f64)>,
    ylim: Option<(f64, f64)>,
    grid: Grid,
    value_ticks: Option<&'a ValueFormat>,
}

impl BarFrame<'_> {
    fn draw(
        &self,
        root: &Root<'_>,
        extent: (f64, f64),
        paint: impl FnOnce(PlotRect, Project<'_>) -> ChartResult<()>,
    ) -> ChartResult<()> {
        let slots = (-0.6, self.categories.len() as f64 - 0.4);
        let (x_range, y_range) = if self.horizontal { (extent, slots) } else { (slots, extent) };
        let x_range = self.xlim.unwrap_or(x_range);
        let y_range = self.ylim.unwrap_or(y_range);

        let category_text = |value: &f64| category_label(self.categories, *value);
        let value_text = |value: &f64| self.value_ticks.map(|f| f.format(*value)).unwrap_or_default();
        let value_area = |range: (f64, f64)| label_area_for(&[value_text(&range.0), value_text(&range.1)]);

        let frame = if self.horizontal {
            Frame::new(self.title).with_y_area(label_area_for(self.categories))
        } else {
            let frame = Frame::new(self.title).with_x_labels(self.categories, self.rotate);
            if self.value_ticks.is_some() { frame.with_y_area(value_area(y_range)) } else { frame }
        };
        let mut chart = build_chart(root, frame, x_range, y_range)?;

        let (xlabel, ylabel) = if self.horizontal {
            (self.ylabel, self.xlabel)
        } else {
            (self.xlabel, self.ylabel)
        };
        let mut axes = Axes::new(xlabel, ylabel, self.grid.value_axis_only(self.horizontal));
        let ticks = self.categories.len().clamp(1, 30);
        let value_format = self.value_ticks.map(|_| &value_text as &dyn Fn(&f64) -> String);
        if self.horizontal {
            axes.y_format = Some(&category_text);
            axes.y_ticks = ticks;
            axes.x_format = value_format;
        } else {
            axes.x_format = Some(&category_text);
            axes.x_ticks = ticks;
            axes.rotate_x = self.rotate;
            axes.y_format = value_format;
        }
        draw_axes(&mut chart, &axes)?;

        let rect = PlotRect::of(&chart);
        let horizontal = self.horizontal;
        let project = |(slot, value): (f64, f64)| {
            let point = if horizontal { (value, slot) } else { (slot, value) };
            pixel(chart.backend_coord(&point))
        };
        paint(rect, &project)
    }

    /// Style and nudge for a label sitting at the end of a bar.
    fn end_label(&self, at: (f64, f64)) -> ((f64, f64), TextStyle<'static>) {
        if self.horizontal {
            ((at.0 + 3.0, at.1), anchored(bold(VALUE_PX), BLACK, HPos::Left, VPos::Center))
        } else {
            ((at.0, at.1 - 3.0), anchored(bold(VALUE_PX), BLACK, HPos::Center, VPos::Bottom))
        }
    }
}

/// One bar per category.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub categories: Vec<String>,
    pub values: Vec<f64>,
    pub title: Option<String>,
    pub xlabel: String,
    pub ylabel: String,
    pub horizontal: bool,
    pub figsize: Option<Vec<u32>>,
    pub color: Option<String>,
    pub xlim: Option<Vec<f64>>,
    pub ylim: Option<Vec<f64>>,
    pub grid: GridSetting,
    pub xlabel_rotation: f64,
    pub show_values: bool,
    pub value_format: String,
    pub output_format: String,
}

impl Default for BarChart {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            values: Vec::new(),
            title: None,
            xlabel: "Category".to_string(),
            ylabel: "Value".to_string(),
            horizontal: false,
            figsize: None,
            color: None,
            xlim: None,
            ylim: None,
            grid: GridSetting::default(),
            xlabel_rotation: 45.0,
            show_values: true,
            value_format: ".1f".to_string(),
            output_format: "png".to_string(),
        }
    }
}

impl ChartSpec for BarChart {
    const KIND: ChartKind = ChartKind::Bar;

    fn render(&self) -> ChartResult<RenderedChart> {
        let format = OutputFormat::parse(&self.output_format)?;
        if self.categories.is_empty() {
            return Err(ChartError::invalid("categories list cannot be empty"));
        }
        if self.categories.len() != self.values.len() {
            return Err(ChartError::invalid(format!(
                "categories has {} items but values has {}",
                self.categories.len(),
                self.values.len()
            )));
        }
        let xlim = axis_limits("xlim", self.xlim.as_deref())?;
        let ylim = axis_limits("ylim", self.ylim.as_deref())?;
        let grid = Grid::parse(&self.grid)?;
        // The value axis always uses the label format.
        let value_format = ValueFormat::parse(&self.value_format)?;
        let color = single_color(self.color.as_deref())?;
        let size = figure_size(self.figsize.as_deref(), DEFAULT_SIZE)?;

        let frame = BarFrame {
            title: self.title.as_deref(),
            xlabel: &self.xlabel,
            ylabel: &self.ylabel,
            categories: &self.categories,
            horizontal: self.horizontal,
            rotate: rotates_labels(self.xlabel_rotation),
            xlim,
            ylim,
            grid,
            value_ticks: Some(&value_format),
        };
        tracing::debug!(bars = self.values.len(), horizontal = self.horizontal, "rendering bar chart");
        render(size, format, |root| {
            frame.draw(root, value_range(self.values.iter().copied()), |rect, project| {
                for (idx, value) in self.values.iter().enumerate() {
                    let slot = idx as f64;
                    draw_bar(
                        root,
                        rect,
                        project((slot - BAR_WIDTH / 2.0, 0.0)),
                        project((slot + BAR_WIDTH / 2.0, *value)),
                        color.to_plotters().to_rgba(),
                        None,
                    )?;
                }
                if self.show_values {
                    for (idx, value) in self.values.iter().enumerate() {
                        let (at, style) = frame.end_label(project((idx as f64, *value)));
                        draw_label(root, rect, &value_format.format(*value), at, &style)?;
                    }
                }
                Ok(())
            })
        })
    }
}

/// Series stacked per category, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedBarChart {
    pub categories: Vec<String>,
    pub series: IndexMap<String, Vec<f64>>,
    pub title: Option<String>,
    pub xlabel: String,
    pub ylabel: String,
    pub horizontal: bool,
    pub figsize: Option<Vec<u32>>,
    pub colors: Option<Vec<String>>,
    pub xlim: Option<Vec<f64>>,
    pub ylim: Option<Vec<f64>>,
    pub grid: GridSetting,
    pub legend_loc: Option<String>,
    pub xlabel_rotation: f64,
    pub show_values: bool,
    pub show_segment_values: bool,
    pub show_total: bool,
    pub value_format: String,
    pub output_format: String,
}

impl Default for StackedBarChart {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            series: IndexMap::new(),
            title: None,
            xlabel: "Category".to_string(),
            ylabel: "Value".to_string(),
            horizontal: false,
            figsize: None,
            colors: None,
            xlim: None,
            ylim: None,
            grid: GridSetting::default(),
            legend_loc: Some("best".to_string()),
            xlabel_rotation: 45.0,
            show_values: true,
            show_segment_values: false,
            show_total: true,
            value_format: ".2f".to_string(),
            output_format: "png".to_string(),
        }
    }
}

/// Lower and upper edge of every segment, series by series. Each series
/// starts where the previous one ended, negative values included.
pub(crate) fn stack_segments(series: &[&[f64]], categories: usize) -> Vec<Vec<(f64, f64)>> {
    let mut base = vec![0.0; categories];
    series
        .iter()
        .map(|values| {
            values
                .iter()
                .zip(base.iter_mut())
                .map(|(value, bottom)| {
                    let segment = (*bottom, *bottom + value);
                    *bottom += value;
                    segment
                })
                .collect()
        })
        .collect()
}

impl ChartSpec for StackedBarChart {
    const KIND: ChartKind = ChartKind::StackedBar;

    fn render(&self) -> ChartResult<RenderedChart> {
        let format = OutputFormat::parse(&self.output_format)?;
        if self.categories.is_empty() {
            return Err(ChartError::invalid("categories list cannot be empty"));
        }
        if self.series.is_empty() {
            return Err(ChartError::invalid("series dictionary cannot be empty"));
        }
        for (name, values) in &self.series {
            if values.len() != self.categories.len() {
                return Err(ChartError::invalid(format!(
                    "Series '{name}' has {} values but categories has {}",
                    values.len(),
                    self.categories.len()
                )));
            }
        }
        let xlim = axis_limits("xlim", self.xlim.as_deref())?;
        let ylim = axis_limits("ylim", self.ylim.as_deref())?;
        let grid = Grid::parse(&self.grid)?;
        let value_format = if self.show_values {
            Some(ValueFormat::parse(&self.value_format)?)
        } else {
            None
        };
        let count = self.series.len();
        let colors = series_colors(self.colors.as_deref(), count, |given| {
            format!("colors list has {given} items but only {count} series provided")
        })?;
        let size = figure_size(self.figsize.as_deref(), DEFAULT_SIZE)?;
        let legend = LegendLoc::parse(self.legend_loc.as_deref())?;

        let columns = self.series.values().map(Vec::as_slice).collect::<Vec<_>>();
        let segments = stack_segments(&columns, self.categories.len());
        let extent = value_range(segments.iter().flatten().flat_map(|(lo, hi)| [*lo, *hi]));
        let totals = segments
            .last()
            .map(|top| top.iter().map(|(_, hi)| *hi).collect::<Vec<_>>())
            .unwrap_or_default();

        let frame = BarFrame {
            title: self.title.as_deref(),
            xlabel: &self.xlabel,
            ylabel: &self.ylabel,
            categories: &self.categories,
            horizontal: self.horizontal,
            rotate: rotates_labels(self.xlabel_rotation),
            xlim,
            ylim,
            grid,
            value_ticks: None,
        };
        tracing::debug!(series = count, categories = self.categories.len(), "rendering stacked bar chart");
        render(size, format, |root| {
            frame.draw(root, extent, |rect, project| {
                let half = BAR_WIDTH / 2.0;
                for (column, color) in segments.iter().zip(&colors) {
                    for (idx, (lo, hi)) in column.iter().enumerate() {
                        let slot = idx as f64;
                        draw_bar(
                            root,
                            rect,
                            project((slot - half, *lo)),
                            project((slot + half, *hi)),
                            color.to_plotters().to_rgba(),
                            None,
                        )?;
                    }
                }
                let Some(value_format) = value_format.as_ref() else {
                    return Ok(());
                };
                if self.show_segment_values {
                    let style = anchored(bold(VALUE_PX), WHITE, HPos::Center, VPos::Center);
                    for column in &segments {
                        for (idx, (lo, hi)) in column.iter().enumerate() {
                            let value = hi - lo;
                            if value > 0.0 {
                                let at = project((idx as f64, lo + value / 2.0));
                                draw_label(root, rect, &value_format.format(value), at, &style)?;
                            }
                        }
                    }
                }
                if self.show_total {
                    for (idx, total) in totals.iter().enumerate() {
                        let (at, style) = frame.end_label(project((idx as f64, *total)));
                        draw_label(root, rect, &value_format.format(*total), at, &style)?;
                    }
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
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svg(chart: &impl ChartSpec) -> String {
        let rendered = chart.render().expect("render");
        String::from_utf8(rendered.bytes().to_vec()).expect("utf8")
    }

    fn bars() -> BarChart {
        BarChart {
            categories: vec!["North".into(), "South".into(), "East".into()],
            values: vec![12.5, 30.25, 7.0],
            output_format: "svg".into(),
            ..BarChart::default()
        }
    }

    #[test]
    fn bar_values_use_the_value_format() {
        let text = svg(&bars());
        assert!(text.contains("30.2") || text.contains("30.3"));
        assert!(text.contains("South"));

        let mut horizontal = bars();
        horizontal.horizontal = true;
        horizontal.value_format = "$,.2f".into();
        let text = svg(&horizontal);
        assert!(text.contains("$12.50"));
    }

    #[test]
    fn bar_validation() {
        let error = |chart: &BarChart| chart.render().expect_err("invalid").to_string();
        let mut chart = bars();
        chart.categories.clear();
        assert_eq!(error(&chart), "categories list cannot be empty");
        let mut chart = bars();
        chart.values.pop();
        assert_eq!(error(&chart), "categories has 3 items but values has 2");
        let mut chart = bars();
        chart.value_format = ".2q".into();
        assert_eq!(
            error(&chart),
            "Invalid value_format '.2q': Unknown format code 'q' for object of type 'float'"
        );
        let mut chart = bars();
        chart.color = Some("notacolor".into());
        assert!(error(&chart).starts_with("Invalid color: 'notacolor'"));
    }

    #[test]
    fn segments_accumulate_per_category() {
        let a = [1.0, 2.0];
        let b = [3.0, -1.0];
        let segments = stack_segments(&[&a, &b], 2);
        assert_eq!(segments[0], vec![(0.0, 1.0), (0.0, 2.0)]);
        assert_eq!(segments[1], vec![(1.0, 4.0), (2.0, 1.0)]);
    }

    #[test]
    fn stacked_totals_and_legend() {
        let chart = StackedBarChart {
            categories: vec!["Q1".into(), "Q2".into()],
            series: IndexMap::from([
                ("Hardware".to_string(), vec![10.0, 20.0]),
                ("Software".to_string(), vec![5.5, 4.0]),
            ]),
            show_segment_values: true,
            output_format: "svg".into(),
            ..StackedBarChart::default()
        };
        let text = svg(&chart);
        assert!(text.contains("15.50"));
        assert!(text.contains("24.00"));
        assert!(text.contains("Software"));
        assert!(text.contains("5.50"));
    }

    #[test]
    fn stacked_validation() {
        let chart = StackedBarChart {
            categories: vec!["Q1".into(), "Q2".into()],
            series: IndexMap::from([("Hardware".to_string(), vec![10.0])]),
            ..StackedBarChart::default()
        };
        assert_eq!(
            chart.render().expect_err("length").to_string(),
            "Series 'Hardware' has 1 values but categories has 2"
        );
    }
}
