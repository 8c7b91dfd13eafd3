use std::f64::consts::PI;

use plotters::style::text_anchor::{HPos, VPos};
use plotters::style::{BLACK, Color, WHITE};

use super::{ChartKind, ChartSpec};
use crate::colors::series_colors;
use crate::error::{ChartError, ChartResult};
use crate::format::Autopct;
use crate::options::{DEFAULT_SIZE_LARGE, LegendLoc, OutputFormat, figure_size};
use crate::render::{
    LegendKey, NOTE_PX, PlotRect, RenderedChart, TICK_PX, TITLE_PX, anchored, bold, draw_area,
    draw_label, draw_legend, font, render,
};

const LABEL_DISTANCE: f64 = 1.1;
const PCT_DISTANCE: f64 = 0.6;
const ARC_STEP_DEG: f64 = 1.0;

/// Slices drawn counterclockwise from `startangle`.
#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub title: Option<String>,
    pub figsize: Option<Vec<u32>>,
    pub colors: Option<Vec<String>>,
    pub autopct: Option<String>,
    pub startangle: f64,
    pub explode: Option<Vec<f64>>,
    pub legend_loc: Option<String>,
    pub shadow: bool,
    pub output_format: String,
}

impl Default for PieChart {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            values: Vec::new(),
            title: None,
            figsize: None,
            colors: None,
            autopct: Some("%1.1f%%".to_string()),
            startangle: 90.0,
            explode: None,
            legend_loc: Some("best".to_string()),
            shadow: false,
            output_format: "png".to_string(),
        }
    }
}

/// Start and end angle in degrees of each slice.
pub(crate) fn slice_angles(values: &[f64], start: f64) -> Vec<(f64, f64)> {
    let total = values.iter().sum::<f64>();
    let mut angle = start;
    values
        .iter()
        .map(|value| {
            let from = angle;
            angle += 360.0 * value / total;
            (from, angle)
        })
        .collect()
}

/// Point at `radius` along `degrees` from `center`, in screen space.
fn polar(center: (f64, f64), radius: f64, degrees: f64) -> (f64, f64) {
    let theta = degrees * PI / 180.0;
    (radius.mul_add(theta.cos(), center.0), radius.mul_add(-theta.sin(), center.1))
}

fn wedge(center: (f64, f64), radius: f64, (from, to): (f64, f64)) -> Vec<(f64, f64)> {
    let steps = (((to - from) / ARC_STEP_DEG).ceil() as usize).max(1);
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    points.extend((0..=steps).map(|idx| {
        let degrees = (to - from).mul_add(idx as f64 / steps as f64, from);
        polar(center, radius, degrees)
    }));
    points
}

impl ChartSpec for PieChart {
    const KIND: ChartKind = ChartKind::Pie;

    fn render(&self) -> ChartResult<RenderedChart> {
        let format = OutputFormat::parse(&self.output_format)?;
        if self.labels.is_empty() {
            return Err(ChartError::invalid("labels list cannot be empty"));
        }
        if self.labels.len() != self.values.len() {
            return Err(ChartError::invalid(format!(
                "labels has {} items but values has {}",
                self.labels.len(),
                self.values.len()
            )));
        }
        if self.values.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(ChartError::invalid("All values must be non-negative"));
        }
        if !self.values.iter().any(|value| *value > 0.0) {
            return Err(ChartError::invalid("At least one value must be greater than zero"));
        }
        if !(0.0..=360.0).contains(&self.startangle) {
            return Err(ChartError::invalid("startangle must be between 0 and 360 degrees"));
        }
        if let Some(explode) = &self.explode {
            if explode.len() != self.labels.len() {
                return Err(ChartError::invalid(format!(
                    "explode has {} items but labels has {}",
                    explode.len(),
                    self.labels.len()
                )));
            }
            if explode.iter().any(|offset| !(0.0..=1.0).contains(offset)) {
                return Err(ChartError::invalid("All explode values must be between 0 and 1"));
            }
        }
        let count = self.labels.len();
        let colors = series_colors(self.colors.as_deref(), count, |given| {
            format!("colors list has {given} items but only {count} labels provided")
        })?;
        let autopct = self.autopct.as_deref().map(Autopct::parse).transpose()?;
        let legend = LegendLoc::parse(self.legend_loc.as_deref())?;
        let size = figure_size(self.figsize.as_deref(), DEFAULT_SIZE_LARGE)?;

        let total = self.values.iter().sum::<f64>();
        let angles = slice_angles(&self.values, self.startangle);
        tracing::debug!(slices = count, "rendering pie chart");
        render(size, format, |root| {
            let area = match self.title.as_deref().filter(|title| !title.is_empty()) {
                Some(title) => root.titled(title, bold(TITLE_PX))?,
                None => root.clone(),
            };
            let (xs, ys) = area.get_pixel_range();
            let rect = PlotRect {
                left: f64::from(xs.start),
                top: f64::from(ys.start),
                right: f64::from(xs.end),
                bottom: f64::from(ys.end),
            };
            let center = ((rect.left + rect.right) / 2.0, (rect.top + rect.bottom) / 2.0);
            let radius = 0.36 * (rect.right - rect.left).min(rect.bottom - rect.top);
            let offsets = self.explode.clone().unwrap_or_else(|| vec![0.0; count]);
            let centers = angles
                .iter()
                .zip(&offsets)
                .map(|((from, to), offset)| polar(center, offset * radius, (from + to) / 2.0))
                .collect::<Vec<_>>();

            if self.shadow {
                for (span, at) in angles.iter().zip(&centers) {
                    let shifted = (radius.mul_add(-0.02, at.0), radius.mul_add(0.02, at.1));
                    draw_area(root, rect, &wedge(shifted, radius, *span), BLACK.mix(0.3))?;
                }
            }
            for ((span, at), color) in angles.iter().zip(&centers).zip(&colors) {
                if span.1 > span.0 {
                    draw_area(root, rect, &wedge(*at, radius, *span), color.to_plotters().to_rgba())?;
                }
            }
            for ((label, (from, to)), at) in self.labels.iter().zip(&angles).zip(&centers) {
                let mid = (from + to) / 2.0;
                let side = if mid.to_radians().cos() >= 0.0 { HPos::Left } else { HPos::Right };
                let style = anchored(font(TICK_PX), BLACK, side, VPos::Center);
                draw_label(root, rect, label, polar(*at, LABEL_DISTANCE * radius, mid), &style)?;
            }
            if let Some(autopct) = &autopct {
                let style = anchored(bold(NOTE_PX), WHITE, HPos::Center, VPos::Center);
                for ((value, (from, to)), at) in self.values.iter().zip(&angles).zip(&centers) {
                    let text = autopct.format(100.0 * value / total);
                    let place = polar(*at, PCT_DISTANCE * radius, (from + to) / 2.0);
                    draw_label(root, rect, &text, place, &style)?;
                }
            }
            if let Some(loc) = legend {
                let entries = self
                    .labels
                    .iter()
                    .zip(&colors)
                    .map(|(label, color)| (label.clone(), LegendKey::Patch(*color)))
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

    fn pie() -> PieChart {
        PieChart {
            labels: vec!["Group 1".into(), "Group 2".into()],
            values: vec![45.0, 135.0],
            output_format: "svg".into(),
            ..PieChart::default()
        }
    }

    #[test]
    fn angles_run_counterclockwise_from_start() {
        let angles = slice_angles(&[1.0, 3.0], 90.0);
        assert_eq!(angles, vec![(90.0, 180.0), (180.0, 450.0)]);
    }

    #[test]
    fn wedge_starts_at_centre() {
        let points = wedge((0.0, 0.0), 10.0, (0.0, 90.0));
        assert_eq!(points[0], (0.0, 0.0));
        let last = points[points.len() - 1];
        assert!(last.0.abs() < 1e-9 && (last.1 + 10.0).abs() < 1e-9);
    }

    #[test]
    fn renders_percentages() {
        let mut chart = pie();
        chart.explode = Some(vec![0.1, 0.0]);
        chart.shadow = true;
        chart.title = Some("Share".into());
        let svg = String::from_utf8(chart.render().expect("render").bytes().to_vec()).expect("utf8");
        assert!(svg.contains("25.0%"));
        assert!(svg.contains("75.0%"));
        assert!(svg.contains("Group 2"));
        assert!(svg.contains("Share"));
    }

    #[test]
    fn validation_messages() {
        let error = |chart: PieChart| chart.render().expect_err("invalid").to_string();
        assert_eq!(error(PieChart { values: vec![-1.0, 2.0], ..pie() }), "All values must be non-negative");
        assert_eq!(
            error(PieChart { values: vec![0.0, 0.0], ..pie() }),
            "At least one value must be greater than zero"
        );
        assert_eq!(
            error(PieChart { startangle: 400.0, ..pie() }),
            "startangle must be between 0 and 360 degrees"
        );
        assert_eq!(
            error(PieChart { explode: Some(vec![0.1]), ..pie() }),
            "explode has 1 items but labels has 2"
        );
        assert_eq!(
            error(PieChart { explode: Some(vec![0.1, 1.5]), ..pie() }),
            "All explode values must be between 0 and 1"
        );
        assert_eq!(
            error(PieChart { colors: Some(vec!["red".into(), "blue".into(), "green".into()]), ..pie() }),
            "colors list has 3 items but only 2 labels provided"
        );
    }
}
