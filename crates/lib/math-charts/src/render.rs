//! Canvas setup, rasterization, and the pixel-space drawing helpers shared by
//! every chart kind.
//!
//! Charts are always drawn to SVG first. PNG output rasterizes that SVG, so
//! both formats carry identical geometry.

use std::sync::{Arc, LazyLock};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use plotters::chart::{ChartBuilder, ChartContext};
use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::drawing::{DrawingArea, IntoDrawingArea};
use plotters::element::{Circle, PathElement, Polygon, Rectangle, Text};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{
    BLACK, Color, FontDesc, FontFamily, FontStyle, FontTransform, RGBAColor, RGBColor, TextStyle,
    WHITE,
};
use plotters::prelude::SVGBackend;
use resvg::{tiny_skia, usvg};

use crate::colors::Rgb;
use crate::error::{ChartError, ChartResult};
use crate::options::{Anchor, Grid, LegendLoc, OutputFormat};

pub(crate) type Root<'a> = DrawingArea<SVGBackend<'a>, Shift>;
pub(crate) type Cartesian = Cartesian2d<RangedCoordf64, RangedCoordf64>;
pub(crate) type Chart<'a, 'b> = ChartContext<'a, SVGBackend<'b>, Cartesian>;

pub(crate) const TITLE_PX: f64 = 20.0;
pub(crate) const AXIS_PX: f64 = 16.0;
pub(crate) const TICK_PX: f64 = 13.0;
pub(crate) const VALUE_PX: f64 = 11.0;
pub(crate) const NOTE_PX: f64 = 14.0;
pub(crate) const LINE_WIDTH: u32 = 2;

const SANS_FAMILIES: [&str; 5] = ["DejaVu Sans", "Liberation Sans", "Noto Sans", "Arial", "Helvetica"];

static FONTS: LazyLock<Arc<usvg::fontdb::Database>> = LazyLock::new(|| {
    let mut fonts = usvg::fontdb::Database::new();
    fonts.load_system_fonts();
    let sans = SANS_FAMILIES.into_iter().find(|family| {
        fonts
            .faces()
            .any(|face| face.families.iter().any(|(name, _)| name == family))
    });
    if let Some(family) = sans {
        fonts.set_sans_serif_family(family);
    }
    tracing::debug!(faces = fonts.len(), sans = ?sans, "loaded fonts for rasterization");
    Arc::new(fonts)
});

/// Encoded chart bytes plus the format they are in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    bytes: Vec<u8>,
    format: OutputFormat,
}

impl RenderedChart {
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        self.format
    }

    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Draws onto a white SVG canvas of `size` pixels and encodes the result.
pub(crate) fn render<F>(size: (u32, u32), format: OutputFormat, draw: F) -> ChartResult<RenderedChart>
where
    F: FnOnce(&Root<'_>) -> ChartResult<()>,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    let bytes = match format {
        OutputFormat::Svg => svg.into_bytes(),
        OutputFormat::Png => rasterize(&svg)?,
    };
    Ok(RenderedChart { bytes, format })
}

fn rasterize(svg: &str) -> ChartResult<Vec<u8>> {
    let options = usvg::Options {
        fontdb: Arc::clone(&FONTS),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|err| ChartError::render(format!("invalid SVG: {err}")))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| ChartError::render("could not allocate the image buffer"))?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    pixmap
        .encode_png()
        .map_err(|err| ChartError::render(format!("PNG encoding failed: {err}")))
}

pub(crate) fn font(size: f64) -> FontDesc<'static> {
    FontDesc::new(FontFamily::SansSerif, size, FontStyle::Normal)
}

pub(crate) fn bold(size: f64) -> FontDesc<'static> {
    FontDesc::new(FontFamily::SansSerif, size, FontStyle::Bold)
}

pub(crate) fn anchored(
    font: FontDesc<'static>,
    color: RGBColor,
    h: HPos,
    v: VPos,
) -> TextStyle<'static> {
    let mut style = TextStyle::from(font).pos(Pos::new(h, v));
    style.color = color.to_backend_color();
    style
}

fn grid_color() -> RGBAColor {
    RGBColor(176, 176, 176).mix(0.6)
}

/// Data range of `values` widened by `margin` of its span on each side.
/// Non-finite values are ignored; a degenerate range is widened to a unit.
pub(crate) fn padded_range(values: impl IntoIterator<Item = f64>, margin: f64) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|value| value.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), value| {
            (lo.min(value), hi.max(value))
        });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo <= f64::EPSILON * lo.abs().max(1.0) {
        let half = if lo == 0.0 { 0.5 } else { lo.abs() * 0.05 };
        return (lo - half, hi + half);
    }
    let pad = (hi - lo) * margin;
    (lo - pad, hi + pad)
}

/// Like [`padded_range`] but anchored at zero, padding only away from it.
pub(crate) fn value_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|value| value.is_finite())
        .fold((0.0_f64, 0.0_f64), |(lo, hi), value| (lo.min(value), hi.max(value)));
    if hi == lo {
        return (0.0, 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (if lo < 0.0 { lo - pad } else { lo }, if hi > 0.0 { hi + pad } else { hi })
}

/// Layout of the plotting frame around the data area.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame<'t> {
    pub title: Option<&'t str>,
    pub x_area: i32,
    pub y_area: i32,
    pub right_area: i32,
    pub top_area: i32,
}

impl<'t> Frame<'t> {
    pub(crate) const fn new(title: Option<&'t str>) -> Self {
        Self { title, x_area: 60, y_area: 80, right_area: 0, top_area: 0 }
    }

    /// Reserves room below the x axis for `labels`, rotated or not.
    pub(crate) fn with_x_labels(mut self, labels: &[String], rotated: bool) -> Self {
        if rotated {
            let longest = labels.iter().map(|label| label.chars().count()).max().unwrap_or(0);
            self.x_area = (longest as i32 * 8 + 40).clamp(60, 220);
        }
        self
    }

    pub(crate) const fn with_y_area(mut self, pixels: i32) -> Self {
        self.y_area = pixels;
        self
    }

    pub(crate) const fn with_right_area(mut self, pixels: i32) -> Self {
        self.right_area = pixels;
        self
    }

    /// Extra space above the plot, used to line up with a captioned neighbour.
    pub(crate) const fn with_top_area(mut self, pixels: i32) -> Self {
        self.top_area = pixels;
        self
    }
}

/// Width to reserve for y tick labels given the formatted extremes.
pub(crate) fn label_area_for(samples: &[String]) -> i32 {
    let longest = samples.iter().map(|label| label.chars().count()).max().unwrap_or(0);
    (longest as i32 * 8 + 50).clamp(70, 200)
}

pub(crate) fn build_chart<'a, 'b>(
    root: &'a Root<'b>,
    frame: Frame<'_>,
    x: (f64, f64),
    y: (f64, f64),
) -> ChartResult<Chart<'a, 'b>> {
    let mut builder = ChartBuilder::on(root);
    builder
        .margin(20)
        .margin_top(20 + frame.top_area)
        .x_label_area_size(frame.x_area)
        .y_label_area_size(frame.y_area)
        .right_y_label_area_size(frame.right_area);
    if let Some(title) = frame.title.filter(|title| !title.is_empty()) {
        builder.caption(title, bold(TITLE_PX));
    }
    Ok(builder.build_cartesian_2d(x.0..x.1, y.0..y.1)?)
}

/// Axis descriptions, tick formatting, and grid lines for one chart.
pub(crate) struct Axes<'f> {
    pub xlabel: &'f str,
    pub ylabel: &'f str,
    pub grid: Grid,
    pub x_ticks: usize,
    pub y_ticks: usize,
    pub rotate_x: bool,
    pub x_format: Option<&'f dyn Fn(&f64) -> String>,
    pub y_format: Option<&'f dyn Fn(&f64) -> String>,
}

impl<'f> Axes<'f> {
    pub(crate) const fn new(xlabel: &'f str, ylabel: &'f str, grid: Grid) -> Self {
        Self {
            xlabel,
            ylabel,
            grid,
            x_ticks: 10,
            y_ticks: 8,
            rotate_x: false,
            x_format: None,
            y_format: None,
        }
    }
}

pub(crate) fn draw_axes(chart: &mut Chart<'_, '_>, axes: &Axes<'_>) -> ChartResult<()> {
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(axes.xlabel)
        .y_desc(axes.ylabel)
        .axis_desc_style(font(AXIS_PX))
        .label_style(font(TICK_PX))
        .bold_line_style(grid_color())
        .max_light_lines(0)
        .x_labels(axes.x_ticks)
        .y_labels(axes.y_ticks);
    if axes.rotate_x {
        mesh.x_label_style(font(TICK_PX).transform(FontTransform::Rotate90));
    }
    if !axes.grid.x {
        mesh.disable_x_mesh();
    }
    if !axes.grid.y {
        mesh.disable_y_mesh();
    }
    if let Some(format) = axes.x_format {
        mesh.x_label_formatter(format);
    }
    if let Some(format) = axes.y_format {
        mesh.y_label_formatter(format);
    }
    mesh.draw()?;
    Ok(())
}

/// Labels integer positions of a categorical axis; other ticks stay blank.
pub(crate) fn category_label(labels: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// The plotting area in absolute pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PlotRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PlotRect {
    pub(crate) fn of(chart: &Chart<'_, '_>) -> Self {
        let (x, y) = chart.plotting_area().get_pixel_range();
        Self {
            left: f64::from(x.start),
            top: f64::from(y.start),
            right: f64::from(x.end),
            bottom: f64::from(y.end),
        }
    }

    pub(crate) fn contains(&self, (x, y): (f64, f64)) -> bool {
        (self.left..=self.right).contains(&x) && (self.top..=self.bottom).contains(&y)
    }

    /// Liang-Barsky clipping of the segment `a`-`b` to this rectangle.
    fn clip(&self, a: (f64, f64), b: (f64, f64)) -> Option<((f64, f64), (f64, f64))> {
        let dx = b.0 - a.0;
        let dy = b.1 - a.1;
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        for (p, q) in [
            (-dx, a.0 - self.left),
            (dx, self.right - a.0),
            (-dy, a.1 - self.top),
            (dy, self.bottom - a.1),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }
        Some((
            (dx.mul_add(t0, a.0), dy.mul_add(t0, a.1)),
            (dx.mul_add(t1, a.0), dy.mul_add(t1, a.1)),
        ))
    }

    /// Sutherland-Hodgman clipping of a closed polygon to this rectangle.
    fn clip_polygon(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let mut output = points.to_vec();
        for (horizontal, bound, keep_above) in [
            (true, self.left, true),
            (true, self.right, false),
            (false, self.top, true),
            (false, self.bottom, false),
        ] {
            let input = std::mem::take(&mut output);
            let Some(&last) = input.last() else {
                break;
            };
            let coord = |p: (f64, f64)| if horizontal { p.0 } else { p.1 };
            let inside = |p: (f64, f64)| {
                if keep_above { coord(p) >= bound } else { coord(p) <= bound }
            };
            let cross = |a: (f64, f64), b: (f64, f64)| {
                let t = (bound - coord(a)) / (coord(b) - coord(a));
                ((b.0 - a.0).mul_add(t, a.0), (b.1 - a.1).mul_add(t, a.1))
            };
            let mut prev = last;
            for &point in &input {
                match (inside(point), inside(prev)) {
                    (true, true) => output.push(point),
                    (true, false) => {
                        output.push(cross(prev, point));
                        output.push(point);
                    }
                    (false, true) => output.push(cross(prev, point)),
                    (false, false) => {}
                }
                prev = point;
            }
        }
        output
    }
}

pub(crate) fn pixel((x, y): (i32, i32)) -> (f64, f64) {
    (f64::from(x), f64::from(y))
}

fn to_coord((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

/// Splits a polyline into the "on" pieces of a dash pattern. The pattern
/// continues across vertices; an empty pattern keeps the line whole.
pub(crate) fn dash_path(points: &[(f64, f64)], pattern: &[f64]) -> Vec<Vec<(f64, f64)>> {
    if pattern.is_empty() || points.len() < 2 {
        return vec![points.to_vec()];
    }
    let mut pieces = Vec::new();
    let mut current = vec![points[0]];
    let mut slot = 0;
    let mut left = pattern[0];
    for pair in points.windows(2) {
        let (mut from, to) = (pair[0], pair[1]);
        let mut remaining = (to.0 - from.0).hypot(to.1 - from.1);
        while remaining > left {
            let t = left / remaining;
            let cut = ((to.0 - from.0).mul_add(t, from.0), (to.1 - from.1).mul_add(t, from.1));
            if slot % 2 == 0 {
                current.push(cut);
                pieces.push(std::mem::take(&mut current));
            } else {
                current = vec![cut];
            }
            remaining -= left;
            from = cut;
            slot = (slot + 1) % pattern.len();
            left = pattern[slot];
        }
        left -= remaining;
        if slot % 2 == 0 {
            current.push(to);
        }
    }
    if slot % 2 == 0 && current.len() > 1 {
        pieces.push(current);
    }
    pieces
}

/// Draws a polyline given in absolute pixels, dashed and clipped to `rect`.
pub(crate) fn draw_line(
    root: &Root<'_>,
    rect: PlotRect,
    points: &[(f64, f64)],
    color: Rgb,
    pattern: &[f64],
) -> ChartResult<()> {
    let style = color.to_plotters().stroke_width(LINE_WIDTH);
    let flush = |run: &mut Vec<(i32, i32)>| -> ChartResult<()> {
        if run.len() > 1 {
            root.draw(&PathElement::new(std::mem::take(run), style))?;
        }
        run.clear();
        Ok(())
    };
    for piece in dash_path(points, pattern) {
        let mut run: Vec<(i32, i32)> = Vec::new();
        for pair in piece.windows(2) {
            let Some((a, b)) = rect.clip(pair[0], pair[1]) else {
                flush(&mut run)?;
                continue;
            };
            let (a, b) = (to_coord(a), to_coord(b));
            if run.last() != Some(&a) {
                flush(&mut run)?;
                run.push(a);
            }
            run.push(b);
        }
        flush(&mut run)?;
    }
    Ok(())
}

/// Axis-aligned box between two pixel corners, clamped to `rect`.
pub(crate) fn draw_bar(
    root: &Root<'_>,
    rect: PlotRect,
    a: (f64, f64),
    b: (f64, f64),
    fill: RGBAColor,
    edge: Option<RGBColor>,
) -> ChartResult<()> {
    let clamp = |(x, y): (f64, f64)| (x.clamp(rect.left, rect.right), y.clamp(rect.top, rect.bottom));
    let (a, b) = (clamp(a), clamp(b));
    if (a.0 - b.0).abs() < 0.5 || (a.1 - b.1).abs() < 0.5 {
        return Ok(());
    }
    let corners = [to_coord(a), to_coord(b)];
    root.draw(&Rectangle::new(corners, fill.filled()))?;
    if let Some(edge) = edge {
        root.draw(&Rectangle::new(corners, edge.stroke_width(1)))?;
    }
    Ok(())
}

/// Filled polygon given in absolute pixels, clipped to `rect`.
pub(crate) fn draw_area(
    root: &Root<'_>,
    rect: PlotRect,
    points: &[(f64, f64)],
    fill: RGBAColor,
) -> ChartResult<()> {
    let clipped = rect.clip_polygon(points);
    if clipped.len() > 2 {
        let coords = clipped.into_iter().map(to_coord).collect::<Vec<_>>();
        root.draw(&Polygon::new(coords, fill.filled()))?;
    }
    Ok(())
}

/// Filled circles at each point inside `rect`.
pub(crate) fn draw_markers(
    root: &Root<'_>,
    rect: PlotRect,
    points: &[(f64, f64)],
    radius: i32,
    fill: RGBAColor,
    border: Option<RGBColor>,
) -> ChartResult<()> {
    for point in points.iter().copied().filter(|point| rect.contains(*point)) {
        let center = to_coord(point);
        root.draw(&Circle::new(center, radius, fill.filled()))?;
        if let Some(border) = border {
            root.draw(&Circle::new(center, radius, border.stroke_width(1)))?;
        }
    }
    Ok(())
}

/// Text at an absolute pixel position, skipped when outside `rect`.
pub(crate) fn draw_label(
    root: &Root<'_>,
    rect: PlotRect,
    text: &str,
    at: (f64, f64),
    style: &TextStyle<'_>,
) -> ChartResult<()> {
    if rect.contains(at) {
        root.draw(&Text::new(text.to_string(), to_coord(at), style.clone()))?;
    }
    Ok(())
}

/// Value label sitting on a translucent white box just above `at`.
pub(crate) fn draw_boxed_label(
    root: &Root<'_>,
    rect: PlotRect,
    text: &str,
    at: (f64, f64),
) -> ChartResult<()> {
    if !rect.contains(at) {
        return Ok(());
    }
    let style = anchored(bold(VALUE_PX), RGBColor(0, 0, 0), HPos::Center, VPos::Bottom);
    let (w, h) = root.estimate_text_size(text, &style)?;
    let (x, y) = to_coord((at.0, at.1 - 6.0));
    let half = w as i32 / 2 + 4;
    root.draw(&Rectangle::new(
        [(x - half, y - h as i32 - 4), (x + half, y + 2)],
        WHITE.mix(0.7).filled(),
    ))?;
    root.draw(&Text::new(text.to_string(), (x, y), style))?;
    Ok(())
}

/// Multi-line note in a wheat box at the top-left or top-right corner.
pub(crate) fn draw_note(
    root: &Root<'_>,
    rect: PlotRect,
    lines: &[String],
    right: bool,
) -> ChartResult<()> {
    let style = TextStyle::from(font(NOTE_PX)).color(&BLACK);
    let mut width = 0;
    let mut line_height = 0;
    for line in lines {
        let (w, h) = root.estimate_text_size(line, &style)?;
        width = width.max(w as i32);
        line_height = line_height.max(h as i32);
    }
    let line_height = line_height + 4;
    let height = line_height * lines.len() as i32 + 8;
    let left = if right {
        rect.right as i32 - width - 22
    } else {
        rect.left as i32 + 10
    };
    let top = rect.top as i32 + 10;
    root.draw(&Rectangle::new(
        [(left, top), (left + width + 12, top + height)],
        RGBColor(245, 222, 179).mix(0.5).filled(),
    ))?;
    for (idx, line) in lines.iter().enumerate() {
        root.draw(&Text::new(
            line.clone(),
            (left + 6, top + 6 + line_height * idx as i32),
            style.clone(),
        ))?;
    }
    Ok(())
}

/// What a legend entry shows next to its label.
#[derive(Debug, Clone, Copy)]
pub(crate) enum LegendKey {
    Line { color: Rgb, pattern: &'static [f64] },
    Patch(Rgb),
}

pub(crate) fn draw_legend(
    root: &Root<'_>,
    rect: PlotRect,
    loc: LegendLoc,
    entries: &[(String, LegendKey)],
) -> ChartResult<()> {
    if entries.is_empty() {
        return Ok(());
    }
    let style = TextStyle::from(font(TICK_PX)).color(&BLACK);
    let mut label_width = 0;
    for (label, _) in entries {
        label_width = label_width.max(root.estimate_text_size(label, &style)?.0 as i32);
    }
    let row = 20;
    let width = label_width + 50;
    let height = row * entries.len() as i32 + 10;
    let place = |anchor: Anchor, start: f64, end: f64, size: i32| match anchor {
        Anchor::Start => start as i32 + 10,
        Anchor::Middle => ((start + end) / 2.0) as i32 - size / 2,
        Anchor::End => end as i32 - size - 10,
    };
    let left = place(loc.horizontal, rect.left, rect.right, width);
    let top = place(loc.vertical, rect.top, rect.bottom, height);
    root.draw(&Rectangle::new(
        [(left, top), (left + width, top + height)],
        WHITE.mix(0.8).filled(),
    ))?;
    root.draw(&Rectangle::new(
        [(left, top), (left + width, top + height)],
        RGBColor(204, 204, 204).stroke_width(1),
    ))?;
    for (idx, (label, key)) in entries.iter().enumerate() {
        let y = top + 15 + row * idx as i32;
        match key {
            LegendKey::Line { color, pattern } => {
                let line = [(f64::from(left + 8), f64::from(y)), (f64::from(left + 36), f64::from(y))];
                for piece in dash_path(&line, pattern) {
                    let coords = piece.into_iter().map(to_coord).collect::<Vec<_>>();
                    root.draw(&PathElement::new(coords, color.to_plotters().stroke_width(LINE_WIDTH)))?;
                }
            }
            LegendKey::Patch(color) => {
                root.draw(&Rectangle::new(
                    [(left + 10, y - 6), (left + 34, y + 6)],
                    color.to_plotters().filled(),
                ))?;
            }
        }
        root.draw(&Text::new(
            label.clone(),
            (left + 42, y),
            anchored(font(TICK_PX), RGBColor(0, 0, 0), HPos::Left, VPos::Center),
        ))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_pad_and_anchor() {
        assert_eq!(padded_range([0.0, 10.0], 0.05), (-0.5, 10.5));
        let (lo, hi) = padded_range([2.0, 2.0], 0.05);
        assert!((lo - 1.9).abs() < 1e-12 && (hi - 2.1).abs() < 1e-12);
        assert_eq!(padded_range([f64::NAN], 0.05), (0.0, 1.0));
        assert_eq!(value_range([5.0, 10.0]), (0.0, 10.5));
        assert_eq!(value_range([-10.0, 0.0]), (-10.5, 0.0));
    }

    #[test]
    fn dashes_split_long_segments() {
        let pieces = dash_path(&[(0.0, 0.0), (20.0, 0.0)], &[5.0, 5.0]);
        assert_eq!(pieces.len(), 2);
        let starts: Vec<f64> = pieces.iter().map(|piece| piece[0].0).collect();
        let ends: Vec<f64> = pieces.iter().map(|piece| piece[piece.len() - 1].0).collect();
        assert!((starts[0] - 0.0).abs() < 1e-9 && (ends[0] - 5.0).abs() < 1e-9);
        assert!((starts[1] - 10.0).abs() < 1e-9 && (ends[1] - 15.0).abs() < 1e-9);
        let solid = dash_path(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)], &[]);
        assert_eq!(solid.len(), 1);
        assert_eq!(solid[0].len(), 3);
    }

    #[test]
    fn clipping_trims_to_the_frame() {
        let rect = PlotRect { left: 0.0, top: 0.0, right: 10.0, bottom: 10.0 };
        let (a, b) = rect.clip((-5.0, 5.0), (5.0, 5.0)).expect("crosses");
        assert_eq!(a, (0.0, 5.0));
        assert_eq!(b, (5.0, 5.0));
        assert!(rect.clip((-5.0, -5.0), (-1.0, -1.0)).is_none());
    }

    #[test]
    fn polygons_are_cut_at_the_frame() {
        let rect = PlotRect { left: 0.0, top: 0.0, right: 10.0, bottom: 10.0 };
        let square = [(5.0, 5.0), (15.0, 5.0), (15.0, 15.0), (5.0, 15.0)];
        let clipped = rect.clip_polygon(&square);
        assert_eq!(clipped.len(), 4);
        assert!(clipped.iter().all(|point| rect.contains(*point)));
        let outside = [(20.0, 20.0), (30.0, 20.0), (30.0, 30.0)];
        assert!(rect.clip_polygon(&outside).is_empty());
    }

    #[test]
    fn category_ticks_only_on_integers() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(category_label(&labels, 1.0), "b");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 7.0), "");
    }

    #[test]
    fn anchored_text_keeps_color_and_position() {
        let style = anchored(font(12.0), RGBColor(10, 20, 30), HPos::Left, VPos::Center);
        assert_eq!(style.color.rgb, (10, 20, 30));
        assert_eq!(style.pos, Pos::new(HPos::Left, VPos::Center));
    }

    #[test]
    fn svg_output_is_passed_through() {
        let chart = render((200, 100), OutputFormat::Svg, |_| Ok(())).expect("render");
        assert_eq!(chart.mime_type(), "image/svg+xml");
        let text = String::from_utf8(chart.bytes().to_vec()).expect("utf8");
        assert!(text.contains("<svg"));
    }
}
