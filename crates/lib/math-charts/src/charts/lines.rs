use plotters::style::Color;

use crate::colors::Rgb;
use crate::error::ChartResult;
use crate::format::ValueFormat;
use crate::options::{Grid, LegendLoc, LineStyle};
use crate::render::{
    AXIS_PX, Axes, Frame, LegendKey, PlotRect, Root, TICK_PX, build_chart, category_label,
    draw_axes, draw_boxed_label, draw_legend, draw_line, draw_markers, draw_note, font,
    label_area_for, padded_range, pixel,
};

/// One plotted line.
pub(crate) struct Layer {
    pub name: String,
    pub values: Vec<f64>,
    pub color: Rgb,
    pub style: LineStyle,
    pub secondary: bool,
}

/// A validated line chart: shared x positions, one or more layers, and an
/// optional right-hand axis for layers flagged `secondary`.
pub(crate) struct LinePlot<'a> {
    pub title: Option<&'a str>,
    pub xlabel: &'a str,
    pub ylabel: &'a str,
    pub secondary_label: Option<&'a str>,
    pub x: Vec<f64>,
    pub categories: Option<&'a [String]>,
    pub rotate_x: bool,
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,
    pub grid: Grid,
    pub legend: Option<LegendLoc>,
    pub layers: Vec<Layer>,
    pub marker_radius: i32,
    pub value_format: Option<&'a ValueFormat>,
    pub note: Option<String>,
}

impl LinePlot<'_> {
    fn values(&self, secondary: bool) -> impl Iterator<Item = f64> + '_ {
        self.layers
            .iter()
            .filter(move |layer| layer.secondary == secondary)
            .flat_map(|layer| layer.values.iter().copied())
    }

    pub(crate) fn draw(&self, root: &Root<'_>) -> ChartResult<()> {
        let x_range = self
            .xlim
            .unwrap_or_else(|| padded_range(self.x.iter().copied(), 0.05));
        let y_range = self.ylim.unwrap_or_else(|| padded_range(self.values(false), 0.05));
        let y2_range = self
            .layers
            .iter()
            .any(|layer| layer.secondary)
            .then(|| padded_range(self.values(true), 0.05));

        let value_text = |value: &f64| self.value_format.map(|f| f.format(*value)).unwrap_or_default();
        let x_text = |value: &f64| {
            self.categories
                .map(|labels| category_label(labels, *value))
                .unwrap_or_default()
        };
        let tick_area = |range: (f64, f64)| {
            if self.value_format.is_some() {
                label_area_for(&[value_text(&range.0), value_text(&range.1)])
            } else {
                80
            }
        };

        let mut frame = Frame::new(self.title).with_y_area(tick_area(y_range));
        if let Some(labels) = self.categories {
            frame = frame.with_x_labels(labels, self.rotate_x);
        }
        if let Some(range) = y2_range {
            frame = frame.with_right_area(tick_area(range));
        }
        let mut chart = build_chart(root, frame, x_range, y_range)?;

        let mut axes = Axes::new(self.xlabel, self.ylabel, self.grid);
        axes.rotate_x = self.rotate_x;
        if let Some(labels) = self.categories {
            axes.x_format = Some(&x_text);
            axes.x_ticks = labels.len().clamp(1, 30);
        }
        if self.value_format.is_some() {
            axes.y_format = Some(&value_text);
        }
        draw_axes(&mut chart, &axes)?;
        let rect = PlotRect::of(&chart);

        match y2_range {
            Some(y2) => {
                let mut dual = chart.set_secondary_coord(x_range.0..x_range.1, y2.0..y2.1);
                {
                    let mut secondary = dual.configure_secondary_axes();
                    secondary
                        .y_desc(self.secondary_label.unwrap_or_default())
                        .axis_desc_style(font(AXIS_PX))
                        .label_style(font(TICK_PX))
                        .y_labels(8);
                    if self.value_format.is_some() {
                        secondary.y_label_formatter(&value_text);
                    }
                    secondary.draw()?;
                }
                self.draw_layers(root, rect, |secondary, point| {
                    if secondary {
                        pixel(dual.borrow_secondary().backend_coord(&point))
                    } else {
                        pixel(dual.backend_coord(&point))
                    }
                })
            }
            None => self.draw_layers(root, rect, |_, point| pixel(chart.backend_coord(&point))),
        }
    }

    fn draw_layers(
        &self,
        root: &Root<'_>,
        rect: PlotRect,
        project: impl Fn(bool, (f64, f64)) -> (f64, f64),
    ) -> ChartResult<()> {
        for layer in &self.layers {
            let placed = self
                .x
                .iter()
                .zip(&layer.values)
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .map(|(x, y)| (*y, project(layer.secondary, (*x, *y))))
                .collect::<Vec<_>>();
            let pixels = placed.iter().map(|(_, at)| *at).collect::<Vec<_>>();
            draw_line(root, rect, &pixels, layer.color, layer.style.pattern())?;
            draw_markers(
                root,
                rect,
                &pixels,
                self.marker_radius,
                layer.color.to_plotters().to_rgba(),
                None,
            )?;
            if let Some(format) = self.value_format {
                for (value, at) in &placed {
                    draw_boxed_label(root, rect, &format.format(*value), *at)?;
                }
            }
        }
        if let Some(loc) = self.legend {
            // Primary-axis entries come first, as with a merged twin-axis legend.
            let entries = self
                .layers
                .iter()
                .filter(|layer| !layer.secondary)
                .chain(self.layers.iter().filter(|layer| layer.secondary))
                .map(|layer| {
                    let key = LegendKey::Line { color: layer.color, pattern: layer.style.pattern() };
                    (layer.name.clone(), key)
                })
                .collect::<Vec<_>>();
            draw_legend(root, rect, loc, &entries)?;
        }
        if let Some(note) = &self.note {
            draw_note(root, rect, std::slice::from_ref(note), false)?;
        }
        Ok(())
    }
}
