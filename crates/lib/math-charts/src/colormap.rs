//! Sequential and diverging colormaps for heatmaps, stored as anchor tables
//! and linearly interpolated between anchors.

use crate::colors::Rgb;
use crate::error::{ChartError, ChartResult};

type Anchors = &'static [(f64, u32)];

const VIRIDIS: Anchors = &[
    (0.0, 0x44_0154),
    (0.25, 0x3b_528b),
    (0.5, 0x21_918c),
    (0.75, 0x5e_c962),
    (1.0, 0xfd_e725),
];
const PLASMA: Anchors = &[
    (0.0, 0x0d_0887),
    (0.25, 0x7e_03a8),
    (0.5, 0xcc_4778),
    (0.75, 0xf8_9540),
    (1.0, 0xf0_f921),
];
const INFERNO: Anchors = &[
    (0.0, 0x00_0004),
    (0.25, 0x57_106e),
    (0.5, 0xbc_3754),
    (0.75, 0xf9_8e09),
    (1.0, 0xfc_ffa4),
];
const MAGMA: Anchors = &[
    (0.0, 0x00_0004),
    (0.25, 0x51_127c),
    (0.5, 0xb7_3779),
    (0.75, 0xfc_8961),
    (1.0, 0xfc_fdbf),
];
const CIVIDIS: Anchors = &[
    (0.0, 0x00_204c),
    (0.2, 0x31_446b),
    (0.4, 0x66_6870),
    (0.6, 0x95_8f78),
    (0.8, 0xcb_ba69),
    (1.0, 0xff_ea46),
];
const GRAY: Anchors = &[(0.0, 0x00_0000), (1.0, 0xff_ffff)];
const GREYS: Anchors = &[(0.0, 0xff_ffff), (1.0, 0x00_0000)];
const BLUES: Anchors = &[
    (0.0, 0xf7_fbff),
    (0.25, 0xc6_dbef),
    (0.5, 0x6b_aed6),
    (0.75, 0x21_71b5),
    (1.0, 0x08_306b),
];
const REDS: Anchors = &[
    (0.0, 0xff_f5f0),
    (0.25, 0xfc_bba1),
    (0.5, 0xfb_6a4a),
    (0.75, 0xcb_181d),
    (1.0, 0x67_000d),
];
const GREENS: Anchors = &[
    (0.0, 0xf7_fcf5),
    (0.25, 0xc7_e9c0),
    (0.5, 0x74_c476),
    (0.75, 0x23_8b45),
    (1.0, 0x00_441b),
];
const YLORRD: Anchors = &[
    (0.0, 0xff_ffcc),
    (0.25, 0xfe_b24c),
    (0.5, 0xfd_8d3c),
    (0.75, 0xe3_1a1c),
    (1.0, 0x80_0026),
];
const HOT: Anchors = &[
    (0.0, 0x0b_0000),
    (0.365, 0xff_0000),
    (0.746, 0xff_ff00),
    (1.0, 0xff_ffff),
];
const COOLWARM: Anchors = &[
    (0.0, 0x3b_4cc0),
    (0.25, 0x8d_b0fe),
    (0.5, 0xdd_dddd),
    (0.75, 0xf4_9a7b),
    (1.0, 0xb4_0426),
];
const RDBU: Anchors = &[
    (0.0, 0x67_001f),
    (0.25, 0xd6_604d),
    (0.5, 0xf7_f7f7),
    (0.75, 0x43_93c3),
    (1.0, 0x05_3061),
];

const NAMED: &[(&str, Anchors)] = &[
    ("viridis", VIRIDIS),
    ("plasma", PLASMA),
    ("inferno", INFERNO),
    ("magma", MAGMA),
    ("cividis", CIVIDIS),
    ("gray", GRAY),
    ("grey", GRAY),
    ("greys", GREYS),
    ("blues", BLUES),
    ("reds", REDS),
    ("greens", GREENS),
    ("ylorrd", YLORRD),
    ("hot", HOT),
    ("coolwarm", COOLWARM),
    ("rdbu", RDBU),
];

/// A resolved colormap, optionally reversed (`_r` suffix).
#[derive(Debug, Clone, Copy)]
pub struct Colormap {
    anchors: Anchors,
    reversed: bool,
}

impl Colormap {
    /// # Errors
    /// Returns [`ChartError::Invalid`] listing the supported names.
    pub fn parse(name: &str) -> ChartResult<Self> {
        let lower = name.trim().to_lowercase();
        let (base, reversed) = lower
            .strip_suffix("_r")
            .map_or((lower.as_str(), false), |base| (base, true));
        NAMED
            .iter()
            .find(|(entry, _)| *entry == base)
            .map(|(_, anchors)| Self { anchors, reversed })
            .ok_or_else(|| {
                let names = NAMED.iter().map(|(entry, _)| *entry).collect::<Vec<_>>();
                ChartError::invalid(format!(
                    "Invalid colormap '{name}'. Supported colormaps: {}",
                    names.join(", ")
                ))
            })
    }

    /// Color at `t` in `[0, 1]`; values outside are clamped.
    #[must_use]
    pub fn sample(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let t = if self.reversed { 1.0 - t } else { t };
        let upper = self
            .anchors
            .iter()
            .position(|(at, _)| *at >= t)
            .unwrap_or(self.anchors.len() - 1)
            .max(1);
        let (t0, c0) = self.anchors[upper - 1];
        let (t1, c1) = self.anchors[upper];
        let f = if t1 > t0 { ((t - t0) / (t1 - t0)).clamp(0.0, 1.0) } else { 0.0 };
        let channel = |shift: u32| {
            let a = f64::from((c0 >> shift) & 0xff);
            let b = f64::from((c1 >> shift) & 0xff);
            (b - a).mul_add(f, a).round() as u8
        };
        Rgb(channel(16), channel(8), channel(0))
    }

    /// Maps `value` within `[lo, hi]` onto the colormap.
    #[must_use]
    pub fn color_for(&self, value: f64, lo: f64, hi: f64) -> Rgb {
        let span = hi - lo;
        self.sample(if span > 0.0 { (value - lo) / span } else { 0.5 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_anchors() {
        let viridis = Colormap::parse("viridis").expect("known");
        assert_eq!(viridis.sample(0.0), Rgb(0x44, 0x01, 0x54));
        assert_eq!(viridis.sample(1.0), Rgb(0xfd, 0xe7, 0x25));
        assert_eq!(viridis.sample(0.5), Rgb(0x21, 0x91, 0x8c));
        let reversed = Colormap::parse("Viridis_r").expect("reversed");
        assert_eq!(reversed.sample(0.0), Rgb(0xfd, 0xe7, 0x25));
    }

    #[test]
    fn interpolates_between_anchors() {
        let gray = Colormap::parse("gray").expect("known");
        assert_eq!(gray.sample(0.5), Rgb(128, 128, 128));
        assert_eq!(gray.color_for(5.0, 0.0, 10.0), Rgb(128, 128, 128));
        assert_eq!(gray.color_for(3.0, 3.0, 3.0), Rgb(128, 128, 128));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = Colormap::parse("rainbowz").expect_err("unknown");
        assert!(err.to_string().starts_with("Invalid colormap 'rainbowz'. Supported colormaps: viridis"));
    }
}
