//! Validation for the parameters shared by every chart kind.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Figure sizes are in pixels at 100 DPI.
pub const DEFAULT_SIZE: (u32, u32) = (1000, 600);
pub const DEFAULT_SIZE_LARGE: (u32, u32) = (1000, 800);
const MAX_SIDE: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    /// # Errors
    /// Returns [`ChartError::Invalid`] for anything but `png` or `svg`.
    pub fn parse(value: &str) -> ChartResult<Self> {
        match value {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            _ => Err(ChartError::invalid("output_format must be 'png' or 'svg'")),
        }
    }

    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Grid control as callers send it: a flag or one of `"true"`, `"false"`,
/// `"x"`, `"y"`, `"both"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridSetting {
    Flag(bool),
    Axis(String),
}

impl Default for GridSetting {
    fn default() -> Self {
        Self::Flag(true)
    }
}

/// Which axes draw grid lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub x: bool,
    pub y: bool,
}

impl Grid {
    pub const NONE: Self = Self { x: false, y: false };
    pub const BOTH: Self = Self { x: true, y: true };

    /// # Errors
    /// Returns [`ChartError::Invalid`] for unknown axis names.
    pub fn parse(setting: &GridSetting) -> ChartResult<Self> {
        match setting {
            GridSetting::Flag(true) => Ok(Self::BOTH),
            GridSetting::Flag(false) => Ok(Self::NONE),
            GridSetting::Axis(axis) => match axis.to_lowercase().as_str() {
                "true" | "both" => Ok(Self::BOTH),
                "false" => Ok(Self::NONE),
                "x" => Ok(Self { x: true, y: false }),
                "y" => Ok(Self { x: false, y: true }),
                _ => Err(ChartError::invalid(
                    "grid must be one of: true, false, 'x', 'y', 'both'",
                )),
            },
        }
    }

    /// Bar-like charts only grid the value axis when asked for both.
    #[must_use]
    pub const fn value_axis_only(self, horizontal: bool) -> Self {
        if self.x && self.y {
            Self { x: horizontal, y: !horizontal }
        } else {
            self
        }
    }
}

const LEGEND_LOCATIONS: [&str; 11] = [
    "best",
    "upper right",
    "upper left",
    "lower left",
    "lower right",
    "right",
    "center left",
    "center right",
    "lower center",
    "upper center",
    "center",
];

/// Placement along one axis of the plotting area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

/// Legend placement inside the plotting area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendLoc {
    pub horizontal: Anchor,
    pub vertical: Anchor,
}

impl LegendLoc {
    const fn new(horizontal: Anchor, vertical: Anchor) -> Self {
        Self { horizontal, vertical }
    }

    /// Resolves a legend location name such as `upper left`; `None` hides the legend. `best`
    /// resolves to the upper right corner.
    ///
    /// # Errors
    /// Returns [`ChartError::Invalid`] for unknown names.
    pub fn parse(loc: Option<&str>) -> ChartResult<Option<Self>> {
        let Some(loc) = loc else {
            return Ok(None);
        };
        let resolved = match loc.trim().to_lowercase().replace('_', " ").as_str() {
            "best" | "upper right" => Self::new(Anchor::End, Anchor::Start),
            "upper left" => Self::new(Anchor::Start, Anchor::Start),
            "lower left" => Self::new(Anchor::Start, Anchor::End),
            "lower right" => Self::new(Anchor::End, Anchor::End),
            "right" | "center right" => Self::new(Anchor::End, Anchor::Middle),
            "center left" => Self::new(Anchor::Start, Anchor::Middle),
            "lower center" => Self::new(Anchor::Middle, Anchor::End),
            "upper center" => Self::new(Anchor::Middle, Anchor::Start),
            "center" => Self::new(Anchor::Middle, Anchor::Middle),
            _ => {
                let names = LEGEND_LOCATIONS
                    .iter()
                    .map(|name| format!("'{name}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(ChartError::invalid(format!(
                    "Invalid legend_loc '{loc}'. Must be one of: {names}"
                )));
            }
        };
        Ok(Some(resolved))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    DashDot,
    Dotted,
}

impl LineStyle {
    /// # Errors
    /// Returns [`ChartError::Invalid`] for anything but `-`, `--`, `-.`, `:`.
    pub fn parse(value: &str) -> ChartResult<Self> {
        match value {
            "-" => Ok(Self::Solid),
            "--" => Ok(Self::Dashed),
            "-." => Ok(Self::DashDot),
            ":" => Ok(Self::Dotted),
            _ => Err(ChartError::invalid(format!(
                "Invalid linestyle '{value}'. Must be one of '-', '--', '-.', ':'"
            ))),
        }
    }

    /// On/off dash lengths in pixels for a 2px line; empty means solid.
    #[must_use]
    pub const fn pattern(self) -> &'static [f64] {
        match self {
            Self::Solid => &[],
            Self::Dashed => &[7.4, 3.2],
            Self::DashDot => &[12.8, 3.2, 2.0, 3.2],
            Self::Dotted => &[2.0, 3.3],
        }
    }
}

/// Resolves per-series line styles, cycling a shorter list.
///
/// # Errors
/// Returns [`ChartError::Invalid`] for too many or unknown styles.
pub fn line_styles(
    styles: Option<&[String]>,
    count: usize,
    too_many: impl FnOnce(usize) -> String,
) -> ChartResult<Vec<LineStyle>> {
    let Some(styles) = styles.filter(|styles| !styles.is_empty()) else {
        return Ok(vec![LineStyle::Solid; count]);
    };
    if styles.len() > count {
        return Err(ChartError::invalid(too_many(styles.len())));
    }
    let parsed = styles
        .iter()
        .map(|style| LineStyle::parse(style))
        .collect::<ChartResult<Vec<_>>>()?;
    Ok((0..count).map(|idx| parsed[idx % parsed.len()]).collect())
}

/// Validates an optional `[min, max]` axis limit.
///
/// # Errors
/// Returns [`ChartError::Invalid`] unless exactly two values with
/// `min < max` are given.
pub fn axis_limits(name: &str, value: Option<&[f64]>) -> ChartResult<Option<(f64, f64)>> {
    match value {
        None => Ok(None),
        Some([min, max]) if min < max => Ok(Some((*min, *max))),
        Some(_) => Err(ChartError::invalid(format!(
            "{name} must be a tuple (min, max) where min < max"
        ))),
    }
}

/// Validates an optional `[width, height]` pixel size.
///
/// # Errors
/// Returns [`ChartError::Invalid`] for the wrong arity or out-of-range sides.
pub fn figure_size(value: Option<&[u32]>, default: (u32, u32)) -> ChartResult<(u32, u32)> {
    match value {
        None => Ok(default),
        Some([width, height])
            if (1..=MAX_SIDE).contains(width) && (1..=MAX_SIDE).contains(height) =>
        {
            Ok((*width, *height))
        }
        Some(_) => Err(ChartError::invalid(format!(
            "figsize must be (width, height) in pixels, each between 1 and {MAX_SIDE}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_is_strict() {
        assert_eq!(OutputFormat::parse("svg").expect("svg"), OutputFormat::Svg);
        assert_eq!(OutputFormat::Png.mime_type(), "image/png");
        let err = OutputFormat::parse("jpg").expect_err("jpg");
        assert_eq!(err.to_string(), "output_format must be 'png' or 'svg'");
    }

    #[test]
    fn grid_accepts_flags_and_axis_names() {
        assert_eq!(Grid::parse(&GridSetting::Flag(false)).expect("flag"), Grid::NONE);
        assert_eq!(Grid::parse(&GridSetting::Axis("True".into())).expect("text"), Grid::BOTH);
        assert_eq!(
            Grid::parse(&GridSetting::Axis("y".into())).expect("axis"),
            Grid { x: false, y: true }
        );
        assert!(Grid::parse(&GridSetting::Axis("z".into())).is_err());
        let grid: GridSetting = serde_json::from_str("\"both\"").expect("json");
        assert_eq!(grid, GridSetting::Axis("both".into()));
        let grid: GridSetting = serde_json::from_str("false").expect("json");
        assert_eq!(grid, GridSetting::Flag(false));
    }

    #[test]
    fn legend_names_resolve_to_corners() {
        assert!(LegendLoc::parse(None).expect("hidden").is_none());
        assert_eq!(
            LegendLoc::parse(Some("lower left")).expect("known"),
            Some(LegendLoc::new(Anchor::Start, Anchor::End))
        );
        assert_eq!(
            LegendLoc::parse(Some("best")).expect("known"),
            LegendLoc::parse(Some("upper right")).expect("known")
        );
        let err = LegendLoc::parse(Some("top")).expect_err("unknown");
        assert!(err.to_string().starts_with("Invalid legend_loc 'top'"));
    }

    #[test]
    fn line_styles_cycle_and_validate() {
        let styles = vec!["--".to_string(), ":".to_string()];
        let resolved = line_styles(Some(&styles), 3, |n| format!("{n}")).expect("styles");
        assert_eq!(resolved, vec![LineStyle::Dashed, LineStyle::Dotted, LineStyle::Dashed]);
        let err = line_styles(Some(&styles), 1, |n| format!("too many: {n}")).expect_err("count");
        assert_eq!(err.to_string(), "too many: 2");
        let bad = vec!["~".to_string()];
        let err = line_styles(Some(&bad), 1, |n| format!("{n}")).expect_err("style");
        assert_eq!(err.to_string(), "Invalid linestyle '~'. Must be one of '-', '--', '-.', ':'");
    }

    #[test]
    fn limits_and_sizes() {
        assert_eq!(axis_limits("xlim", Some(&[0.0, 1.0])).expect("ok"), Some((0.0, 1.0)));
        let err = axis_limits("ylim", Some(&[1.0, 1.0])).expect_err("equal");
        assert_eq!(err.to_string(), "ylim must be a tuple (min, max) where min < max");
        assert!(axis_limits("xlim", Some(&[0.0])).is_err());
        assert_eq!(figure_size(None, DEFAULT_SIZE).expect("default"), (1000, 600));
        assert_eq!(figure_size(Some(&[640, 480]), DEFAULT_SIZE).expect("given"), (640, 480));
        assert!(figure_size(Some(&[0, 480]), DEFAULT_SIZE).is_err());
    }
}
