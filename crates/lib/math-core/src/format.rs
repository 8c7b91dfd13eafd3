//! Number formatting shared by result messages.

/// Formats a float in shortest round-trip form; integral values keep a
/// trailing `.0`.
#[must_use]
pub fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    format!("{value:?}")
}

/// Formats a float without a fraction when it is integral within `1e-10`.
#[must_use]
pub fn compact_number(value: f64) -> String {
    let rounded = value.round();
    if value.is_finite() && (value - rounded).abs() < 1e-10 && rounded.abs() < 1e15 {
        format!("{}", rounded as i64)
    } else {
        float_repr(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr_keeps_fraction_marker() {
        assert_eq!(float_repr(1.0), "1.0");
        assert_eq!(float_repr(-3.5), "-3.5");
        assert_eq!(float_repr(0.1), "0.1");
    }

    #[test]
    fn compact_drops_integral_fraction() {
        assert_eq!(compact_number(100.0), "100");
        assert_eq!(compact_number(0.1), "0.1");
        assert_eq!(compact_number(32.000_000_000_01), "32");
    }
}
