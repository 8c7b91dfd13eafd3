//! Unit conversion over a fixed table of common units.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{MathError, MathResult};
use crate::format::{compact_number, float_repr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Length,
    Mass,
    Time,
    Volume,
    Speed,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Length => "length",
            Self::Mass => "mass",
            Self::Time => "time",
            Self::Volume => "volume",
            Self::Speed => "speed",
        })
    }
}

const MILE: f64 = 1609.344;

/// `(name, dimension, size in SI base units)`.
const UNITS: &[(&str, Dimension, f64)] = &[
    ("meter", Dimension::Length, 1.0),
    ("metre", Dimension::Length, 1.0),
    ("meters", Dimension::Length, 1.0),
    ("metres", Dimension::Length, 1.0),
    ("kilometer", Dimension::Length, 1000.0),
    ("kilometre", Dimension::Length, 1000.0),
    ("kilometers", Dimension::Length, 1000.0),
    ("kilometres", Dimension::Length, 1000.0),
    ("centimeter", Dimension::Length, 0.01),
    ("centimetre", Dimension::Length, 0.01),
    ("centimeters", Dimension::Length, 0.01),
    ("centimetres", Dimension::Length, 0.01),
    ("millimeter", Dimension::Length, 0.001),
    ("millimetre", Dimension::Length, 0.001),
    ("millimeters", Dimension::Length, 0.001),
    ("millimetres", Dimension::Length, 0.001),
    ("mile", Dimension::Length, MILE),
    ("miles", Dimension::Length, MILE),
    ("foot", Dimension::Length, 0.3048),
    ("feet", Dimension::Length, 0.3048),
    ("inch", Dimension::Length, 0.0254),
    ("inches", Dimension::Length, 0.0254),
    ("yard", Dimension::Length, 0.9144),
    ("yards", Dimension::Length, 0.9144),
    ("kilogram", Dimension::Mass, 1.0),
    ("kilograms", Dimension::Mass, 1.0),
    ("gram", Dimension::Mass, 0.001),
    ("grams", Dimension::Mass, 0.001),
    ("pound", Dimension::Mass, 0.453_592_37),
    ("pounds", Dimension::Mass, 0.453_592_37),
    ("second", Dimension::Time, 1.0),
    ("seconds", Dimension::Time, 1.0),
    ("minute", Dimension::Time, 60.0),
    ("minutes", Dimension::Time, 60.0),
    ("hour", Dimension::Time, 3600.0),
    ("hours", Dimension::Time, 3600.0),
    ("day", Dimension::Time, 86400.0),
    ("days", Dimension::Time, 86400.0),
    ("liter", Dimension::Volume, 0.001),
    ("litre", Dimension::Volume, 0.001),
    ("liters", Dimension::Volume, 0.001),
    ("litres", Dimension::Volume, 0.001),
    ("milliliter", Dimension::Volume, 1e-6),
    ("millilitre", Dimension::Volume, 1e-6),
    ("milliliters", Dimension::Volume, 1e-6),
    ("millilitres", Dimension::Volume, 1e-6),
    ("quart", Dimension::Volume, 0.000_946_352_946),
    ("quarts", Dimension::Volume, 0.000_946_352_946),
    ("meter_per_second", Dimension::Speed, 1.0),
    ("metre_per_second", Dimension::Speed, 1.0),
    ("meters_per_second", Dimension::Speed, 1.0),
    ("metres_per_second", Dimension::Speed, 1.0),
    ("kilometer_per_hour", Dimension::Speed, 1000.0 / 3600.0),
    ("kilometre_per_hour", Dimension::Speed, 1000.0 / 3600.0),
    ("kilometers_per_hour", Dimension::Speed, 1000.0 / 3600.0),
    ("kilometres_per_hour", Dimension::Speed, 1000.0 / 3600.0),
    ("mile_per_hour", Dimension::Speed, MILE / 3600.0),
    ("miles_per_hour", Dimension::Speed, MILE / 3600.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Temperature {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl Temperature {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "celsius" => Some(Self::Celsius),
            "fahrenheit" => Some(Self::Fahrenheit),
            "kelvin" => Some(Self::Kelvin),
            _ => None,
        }
    }

    const fn to_kelvin(self, value: f64) -> f64 {
        match self {
            Self::Celsius => value + 273.15,
            Self::Fahrenheit => (value - 32.0) * 5.0 / 9.0 + 273.15,
            Self::Kelvin => value,
        }
    }

    const fn from_kelvin(self, kelvin: f64) -> f64 {
        match self {
            Self::Celsius => kelvin - 273.15,
            Self::Fahrenheit => (kelvin - 273.15) * 9.0 / 5.0 + 32.0,
            Self::Kelvin => kelvin,
        }
    }
}

fn lookup(name: &str) -> Option<(Dimension, f64)> {
    UNITS
        .iter()
        .find(|(unit, _, _)| *unit == name)
        .map(|(_, dimension, factor)| (*dimension, *factor))
}

/// Unit names listed in error messages: every alias except plurals formed by
/// a trailing `s` on another listed name.
#[must_use]
pub fn supported_units() -> Vec<&'static str> {
    let names: BTreeSet<&'static str> = UNITS.iter().map(|(name, _, _)| *name).collect();
    names
        .iter()
        .copied()
        .filter(|name| {
            name.strip_suffix('s')
                .is_none_or(|singular| !names.contains(singular))
        })
        .collect()
}

fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    let rounded = (value * scale).round() / scale;
    if rounded.is_finite() { rounded } else { value }
}

fn convert_temperature(value: f64, from_unit: &str, to_unit: &str) -> MathResult<f64> {
    let invalid = |unit: &str| MathError::Conversion(format!("Invalid temperature unit '{unit}'"));
    let from = Temperature::lookup(&from_unit.to_lowercase()).ok_or_else(|| invalid(from_unit))?;
    let to = Temperature::lookup(&to_unit.to_lowercase()).ok_or_else(|| invalid(to_unit))?;
    Ok(round_to(to.from_kelvin(from.to_kelvin(value)), 10))
}

/// Converts `value` between two units of the same dimension, or between
/// temperature scales. Names are case-insensitive.
///
/// Temperature results are rounded to ten decimal places.
///
/// # Errors
/// Returns [`MathError::Conversion`] for unknown units and mismatched
/// dimensions.
pub fn convert(value: f64, from_unit: &str, to_unit: &str) -> MathResult<f64> {
    let from_lower = from_unit.to_lowercase();
    let to_lower = to_unit.to_lowercase();
    if Temperature::lookup(&from_lower).is_some() || Temperature::lookup(&to_lower).is_some() {
        return convert_temperature(value, from_unit, to_unit);
    }
    let unknown = |side: &str, unit: &str| {
        MathError::Conversion(format!(
            "Unknown {side} unit '{unit}'. Supported units: {}",
            supported_units().join(", ")
        ))
    };
    let (from_dim, from_factor) = lookup(&from_lower).ok_or_else(|| unknown("source", from_unit))?;
    let (to_dim, to_factor) = lookup(&to_lower).ok_or_else(|| unknown("target", to_unit))?;
    if from_dim != to_dim {
        return Err(MathError::Conversion(format!(
            "Could not convert {} {from_unit} to {to_unit}: incompatible dimensions ({from_dim} vs {to_dim})",
            float_repr(value)
        )));
    }
    Ok(value * from_factor / to_factor)
}

/// [`convert`], formatted without a fraction when the result is integral.
///
/// # Errors
/// See [`convert`].
pub fn convert_unit(value: f64, from_unit: &str, to_unit: &str) -> MathResult<String> {
    convert(value, from_unit, to_unit).map(compact_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(text: &str) -> f64 {
        text.parse().expect("numeric result")
    }

    #[test]
    fn scales_within_a_dimension() {
        assert!((number(&convert_unit(100.0, "meter", "kilometer").expect("convert")) - 0.1).abs() < 1e-10);
        assert!((number(&convert_unit(5.0, "kilometer", "mile").expect("convert")) - 3.106_855).abs() < 1e-6);
        assert_eq!(convert_unit(1.0, "hour", "minute").expect("convert"), "60");
        assert!((number(&convert_unit(1.0, "kilogram", "pound").expect("convert")) - 2.204_62).abs() < 1e-5);
        assert_eq!(convert_unit(36.0, "Kilometres_Per_Hour", "meters_per_second").expect("convert"), "10");
        assert_eq!(convert_unit(3.0, "feet", "yard").expect("convert"), "1");
    }

    #[test]
    fn temperatures_go_through_kelvin() {
        assert_eq!(convert_unit(32.0, "fahrenheit", "celsius").expect("convert"), "0");
        assert_eq!(convert_unit(100.0, "Celsius", "fahrenheit").expect("convert"), "212");
        assert_eq!(convert_unit(0.0, "kelvin", "celsius").expect("convert"), "-273.15");
        let err = convert_unit(1.0, "celsius", "meter").expect_err("mixed");
        assert_eq!(err.to_string(), "Invalid temperature unit 'meter'");
    }

    #[test]
    fn rejects_unknown_and_mismatched_units() {
        let err = convert_unit(1.0, "invalid_unit", "meter").expect_err("unknown");
        let text = err.to_string();
        assert!(text.starts_with("Unknown source unit 'invalid_unit'. Supported units: "));
        assert!(text.contains("kilometer_per_hour"));
        let err = convert_unit(1.0, "meter", "furlong").expect_err("unknown");
        assert!(err.to_string().starts_with("Unknown target unit 'furlong'"));
        let err = convert_unit(1.0, "meter", "second").expect_err("dimension");
        assert!(err.to_string().starts_with("Could not convert 1.0 meter to second"));
    }

    #[test]
    fn supported_list_drops_simple_plurals() {
        let units = supported_units();
        assert!(units.contains(&"meter"));
        assert!(!units.contains(&"meters"));
        assert!(units.contains(&"feet"));
        assert!(units.contains(&"inches"));
        assert!(units.windows(2).all(|w| w[0] < w[1]));
    }
}
