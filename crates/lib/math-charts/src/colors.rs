//! Color parsing and the default series palette.
//!
//! Colors are accepted as CSS4 names, single-letter base colors, `tab:` names,
//! grayscale intensities (`"0.5"`), or hex (`#rgb`, `#rgba`, `#rrggbb`,
//! `#rrggbbaa`). Alpha is accepted and dropped.

use plotters::style::RGBColor;

use crate::error::{ChartError, ChartResult};

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    const fn from_hex(value: u32) -> Self {
        Self((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    #[must_use]
    pub const fn to_plotters(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }

    /// Hue, saturation, and value, each in `[0, 1]`.
    #[must_use]
    pub fn to_hsv(self) -> (f64, f64, f64) {
        let r = f64::from(self.0) / 255.0;
        let g = f64::from(self.1) / 255.0;
        let b = f64::from(self.2) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        let saturation = if max > 0.0 { delta / max } else { 0.0 };
        if delta == 0.0 {
            return (0.0, saturation, max);
        }
        let sector = if max == r {
            (g - b) / delta
        } else if max == g {
            2.0 + (b - r) / delta
        } else {
            4.0 + (r - g) / delta
        };
        ((sector / 6.0).rem_euclid(1.0), saturation, max)
    }

    /// Relative luminance, used to pick readable text over a fill.
    #[must_use]
    pub fn luminance(self) -> f64 {
        0.2126f64.mul_add(
            f64::from(self.0),
            0.7152f64.mul_add(f64::from(self.1), 0.0722 * f64::from(self.2)),
        ) / 255.0
    }
}

/// The tab10 palette without its olive-yellow entry.
pub const PALETTE: [Rgb; 9] = [
    Rgb::from_hex(0x1f_77b4),
    Rgb::from_hex(0xff_7f0e),
    Rgb::from_hex(0x2c_a02c),
    Rgb::from_hex(0xd6_2728),
    Rgb::from_hex(0x94_67bd),
    Rgb::from_hex(0x8c_564b),
    Rgb::from_hex(0xe3_77c2),
    Rgb::from_hex(0x7f_7f7f),
    Rgb::from_hex(0x17_becf),
];

pub const STEELBLUE: Rgb = Rgb::from_hex(0x46_82b4);

const BASE_COLORS: &[(&str, u32)] = &[
    ("b", 0x00_00ff),
    ("g", 0x00_8000),
    ("r", 0xff_0000),
    ("c", 0x00_bfbf),
    ("m", 0xbf_00bf),
    ("y", 0xbf_bf00),
    ("k", 0x00_0000),
    ("w", 0xff_ffff),
];

const TABLEAU_COLORS: &[(&str, u32)] = &[
    ("tab:blue", 0x1f_77b4),
    ("tab:orange", 0xff_7f0e),
    ("tab:green", 0x2c_a02c),
    ("tab:red", 0xd6_2728),
    ("tab:purple", 0x94_67bd),
    ("tab:brown", 0x8c_564b),
    ("tab:pink", 0xe3_77c2),
    ("tab:gray", 0x7f_7f7f),
    ("tab:grey", 0x7f_7f7f),
    ("tab:olive", 0xbc_bd22),
    ("tab:cyan", 0x17_becf),
];

const CSS4_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xf0_f8ff),
    ("antiquewhite", 0xfa_ebd7),
    ("aqua", 0x00_ffff),
    ("aquamarine", 0x7f_ffd4),
    ("azure", 0xf0_ffff),
    ("beige", 0xf5_f5dc),
    ("bisque", 0xff_e4c4),
    ("black", 0x00_0000),
    ("blanchedalmond", 0xff_ebcd),
    ("blue", 0x00_00ff),
    ("blueviolet", 0x8a_2be2),
    ("brown", 0xa5_2a2a),
    ("burlywood", 0xde_b887),
    ("cadetblue", 0x5f_9ea0),
    ("chartreuse", 0x7f_ff00),
    ("chocolate", 0xd2_691e),
    ("coral", 0xff_7f50),
    ("cornflowerblue", 0x64_95ed),
    ("cornsilk", 0xff_f8dc),
    ("crimson", 0xdc_143c),
    ("cyan", 0x00_ffff),
    ("darkblue", 0x00_008b),
    ("darkcyan", 0x00_8b8b),
    ("darkgoldenrod", 0xb8_860b),
    ("darkgray", 0xa9_a9a9),
    ("darkgreen", 0x00_6400),
    ("darkgrey", 0xa9_a9a9),
    ("darkkhaki", 0xbd_b76b),
    ("darkmagenta", 0x8b_008b),
    ("darkolivegreen", 0x55_6b2f),
    ("darkorange", 0xff_8c00),
    ("darkorchid", 0x99_32cc),
    ("darkred", 0x8b_0000),
    ("darksalmon", 0xe9_967a),
    ("darkseagreen", 0x8f_bc8f),
    ("darkslateblue", 0x48_3d8b),
    ("darkslategray", 0x2f_4f4f),
    ("darkslategrey", 0x2f_4f4f),
    ("darkturquoise", 0x00_ced1),
    ("darkviolet", 0x94_00d3),
    ("deeppink", 0xff_1493),
    ("deepskyblue", 0x00_bfff),
    ("dimgray", 0x69_6969),
    ("dimgrey", 0x69_6969),
    ("dodgerblue", 0x1e_90ff),
    ("firebrick", 0xb2_2222),
    ("floralwhite", 0xff_faf0),
    ("forestgreen", 0x22_8b22),
    ("fuchsia", 0xff_00ff),
    ("gainsboro", 0xdc_dcdc),
    ("ghostwhite", 0xf8_f8ff),
    ("gold", 0xff_d700),
    ("goldenrod", 0xda_a520),
    ("gray", 0x80_8080),
    ("green", 0x00_8000),
    ("greenyellow", 0xad_ff2f),
    ("grey", 0x80_8080),
    ("honeydew", 0xf0_fff0),
    ("hotpink", 0xff_69b4),
    ("indianred", 0xcd_5c5c),
    ("indigo", 0x4b_0082),
    ("ivory", 0xff_fff0),
    ("khaki", 0xf0_e68c),
    ("lavender", 0xe6_e6fa),
    ("lavenderblush", 0xff_f0f5),
    ("lawngreen", 0x7c_fc00),
    ("lemonchiffon", 0xff_facd),
    ("lightblue", 0xad_d8e6),
    ("lightcoral", 0xf0_8080),
    ("lightcyan", 0xe0_ffff),
    ("lightgoldenrodyellow", 0xfa_fad2),
    ("lightgray", 0xd3_d3d3),
    ("lightgreen", 0x90_ee90),
    ("lightgrey", 0xd3_d3d3),
    ("lightpink", 0xff_b6c1),
    ("lightsalmon", 0xff_a07a),
    ("lightseagreen", 0x20_b2aa),
    ("lightskyblue", 0x87_cefa),
    ("lightslategray", 0x77_8899),
    ("lightslategrey", 0x77_8899),
    ("lightsteelblue", 0xb0_c4de),
    ("lightyellow", 0xff_ffe0),
    ("lime", 0x00_ff00),
    ("limegreen", 0x32_cd32),
    ("linen", 0xfa_f0e6),
    ("magenta", 0xff_00ff),
    ("maroon", 0x80_0000),
    ("mediumaquamarine", 0x66_cdaa),
    ("mediumblue", 0x00_00cd),
    ("mediumorchid", 0xba_55d3),
    ("mediumpurple", 0x93_70db),
    ("mediumseagreen", 0x3c_b371),
    ("mediumslateblue", 0x7b_68ee),
    ("mediumspringgreen", 0x00_fa9a),
    ("mediumturquoise", 0x48_d1cc),
    ("mediumvioletred", 0xc7_1585),
    ("midnightblue", 0x19_1970),
    ("mintcream", 0xf5_fffa),
    ("mistyrose", 0xff_e4e1),
    ("moccasin", 0xff_e4b5),
    ("navajowhite", 0xff_dead),
    ("navy", 0x00_0080),
    ("oldlace", 0xfd_f5e6),
    ("olive", 0x80_8000),
    ("olivedrab", 0x6b_8e23),
    ("orange", 0xff_a500),
    ("orangered", 0xff_4500),
    ("orchid", 0xda_70d6),
    ("palegoldenrod", 0xee_e8aa),
    ("palegreen", 0x98_fb98),
    ("paleturquoise", 0xaf_eeee),
    ("palevioletred", 0xdb_7093),
    ("papayawhip", 0xff_efd5),
    ("peachpuff", 0xff_dab9),
    ("peru", 0xcd_853f),
    ("pink", 0xff_c0cb),
    ("plum", 0xdd_a0dd),
    ("powderblue", 0xb0_e0e6),
    ("purple", 0x80_0080),
    ("rebeccapurple", 0x66_3399),
    ("red", 0xff_0000),
    ("rosybrown", 0xbc_8f8f),
    ("royalblue", 0x41_69e1),
    ("saddlebrown", 0x8b_4513),
    ("salmon", 0xfa_8072),
    ("sandybrown", 0xf4_a460),
    ("seagreen", 0x2e_8b57),
    ("seashell", 0xff_f5ee),
    ("sienna", 0xa0_522d),
    ("silver", 0xc0_c0c0),
    ("skyblue", 0x87_ceeb),
    ("slateblue", 0x6a_5acd),
    ("slategray", 0x70_8090),
    ("slategrey", 0x70_8090),
    ("snow", 0xff_fafa),
    ("springgreen", 0x00_ff7f),
    ("steelblue", 0x46_82b4),
    ("tan", 0xd2_b48c),
    ("teal", 0x00_8080),
    ("thistle", 0xd8_bfd8),
    ("tomato", 0xff_6347),
    ("turquoise", 0x40_e0d0),
    ("violet", 0xee_82ee),
    ("wheat", 0xf5_deb3),
    ("white", 0xff_ffff),
    ("whitesmoke", 0xf5_f5f5),
    ("yellow", 0xff_ff00),
    ("yellowgreen", 0x9a_cd32),
];

fn invalid_color(color: &str) -> ChartError {
    ChartError::invalid(format!(
        "Invalid color: '{color}'. Must be a named color (e.g., 'red', 'steelblue') or hex value (e.g., '#FF5733')"
    ))
}

fn parse_hex(digits: &str) -> Option<Rgb> {
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |text: &str| u8::from_str_radix(text, 16).ok();
    match digits.len() {
        3 | 4 => {
            let mut channels = digits.chars().take(3).map(|c| {
                let text = c.to_string();
                channel(&text.repeat(2))
            });
            Some(Rgb(channels.next()??, channels.next()??, channels.next()??))
        }
        6 | 8 => Some(Rgb(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        _ => None,
    }
}

fn parse_gray(text: &str) -> Option<Rgb> {
    let level: f64 = text.parse().ok()?;
    if !(0.0..=1.0).contains(&level) {
        return None;
    }
    let channel = (level * 255.0).round() as u8;
    Some(Rgb(channel, channel, channel))
}

fn lookup(table: &[(&str, u32)], name: &str) -> Option<Rgb> {
    table
        .iter()
        .find(|(entry, _)| *entry == name)
        .map(|(_, hex)| Rgb::from_hex(*hex))
}

/// Parses a color specification.
///
/// # Errors
/// Returns [`ChartError::Invalid`] when the text is not a recognized color.
pub fn parse_color(color: &str) -> ChartResult<Rgb> {
    let text = color.trim();
    let parsed = if let Some(digits) = text.strip_prefix('#') {
        parse_hex(digits)
    } else if text.len() == 1 {
        lookup(BASE_COLORS, text)
    } else {
        let lower = text.to_lowercase();
        lookup(CSS4_COLORS, &lower)
            .or_else(|| lookup(TABLEAU_COLORS, &lower))
            .or_else(|| parse_gray(text))
    };
    parsed.ok_or_else(|| invalid_color(color))
}

/// Palette colors for `count` series, cycling when there are more series
/// than palette entries.
#[must_use]
pub fn palette(count: usize) -> Vec<Rgb> {
    (0..count).map(|idx| PALETTE[idx % PALETTE.len()]).collect()
}

fn hsv_distance(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    let hue = (a.0 - b.0).abs();
    let hue = hue.min(1.0 - hue);
    let saturation = a.1 - b.1;
    let value = a.2 - b.2;
    value.mul_add(value, hue.mul_add(hue, saturation * saturation)).sqrt()
}

/// Extends `provided` to `needed` colors. Each added palette color is the
/// unused one farthest (by minimum HSV distance) from every color already
/// chosen.
#[must_use]
pub fn pad_colors(provided: &[Rgb], needed: usize) -> Vec<Rgb> {
    if provided.len() >= needed {
        return provided[..needed].to_vec();
    }
    let mut used = provided.to_vec();
    while used.len() < needed {
        let best = PALETTE
            .iter()
            .filter(|candidate| !used.contains(candidate))
            .map(|candidate| {
                let hsv = candidate.to_hsv();
                let nearest = used
                    .iter()
                    .map(|color| hsv_distance(hsv, color.to_hsv()))
                    .fold(f64::INFINITY, f64::min);
                (*candidate, nearest)
            })
            .fold(None::<(Rgb, f64)>, |best, (candidate, distance)| match best {
                Some((_, best_distance)) if best_distance >= distance => best,
                _ => Some((candidate, distance)),
            })
            .map_or_else(|| PALETTE[used.len() % PALETTE.len()], |(color, _)| color);
        used.push(best);
    }
    used
}

/// Resolves the per-series colors for a multi-series chart.
///
/// # Errors
/// Returns [`ChartError::Invalid`] when more colors than series are given or a
/// color does not parse; `too_many` builds the count message from the number
/// of colors given.
pub fn series_colors(
    colors: Option<&[String]>,
    count: usize,
    too_many: impl FnOnce(usize) -> String,
) -> ChartResult<Vec<Rgb>> {
    let Some(colors) = colors else {
        return Ok(palette(count));
    };
    if colors.len() > count {
        return Err(ChartError::invalid(too_many(colors.len())));
    }
    let parsed = colors
        .iter()
        .map(|color| parse_color(color))
        .collect::<ChartResult<Vec<_>>>()?;
    Ok(pad_colors(&parsed, count))
}

/// Resolves a single optional color, defaulting to steel blue.
///
/// # Errors
/// Returns [`ChartError::Invalid`] when the color does not parse.
pub fn single_color(color: Option<&str>) -> ChartResult<Rgb> {
    color.map_or(Ok(STEELBLUE), parse_color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_hex() {
        assert_eq!(parse_color("steelblue").expect("named"), STEELBLUE);
        assert_eq!(parse_color("SteelBlue").expect("named"), STEELBLUE);
        assert_eq!(parse_color("#FF5733").expect("hex"), Rgb(0xff, 0x57, 0x33));
        assert_eq!(parse_color("#f00").expect("short hex"), Rgb(255, 0, 0));
        assert_eq!(parse_color("#ff000080").expect("hex alpha"), Rgb(255, 0, 0));
        assert_eq!(parse_color("k").expect("base"), Rgb(0, 0, 0));
        assert_eq!(parse_color("tab:orange").expect("tableau"), PALETTE[1]);
        assert_eq!(parse_color("0.5").expect("gray"), Rgb(128, 128, 128));
    }

    #[test]
    fn rejects_unknown_colors() {
        let err = parse_color("not-a-color").expect_err("invalid");
        assert_eq!(
            err.to_string(),
            "Invalid color: 'not-a-color'. Must be a named color (e.g., 'red', 'steelblue') or hex value (e.g., '#FF5733')"
        );
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("1.5").is_err());
    }

    #[test]
    fn palette_has_no_yellow_and_cycles() {
        assert!(PALETTE.iter().all(|color| {
            let (hue, saturation, value) = color.to_hsv();
            !((0.1..=0.25).contains(&hue) && saturation > 0.5 && value > 0.5)
        }));
        let colors = palette(11);
        assert_eq!(colors[9], PALETTE[0]);
        assert_eq!(colors[10], PALETTE[1]);
    }

    #[test]
    fn padding_keeps_provided_and_avoids_duplicates() {
        let red = parse_color("red").expect("red");
        let colors = pad_colors(&[red], 4);
        assert_eq!(colors.len(), 4);
        assert_eq!(colors[0], red);
        for (idx, color) in colors.iter().enumerate() {
            assert!(!colors[idx + 1..].contains(color));
        }
        assert_ne!(colors[1], PALETTE[3]);
    }

    #[test]
    fn too_many_colors_is_reported_by_caller() {
        let colors = vec!["red".to_string(), "blue".to_string()];
        let err = series_colors(Some(&colors), 1, |given| {
            format!("colors list has {given} items but only 1 series provided")
        })
        .expect_err("too many");
        assert_eq!(err.to_string(), "colors list has 2 items but only 1 series provided");
    }
}
