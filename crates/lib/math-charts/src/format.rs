//! Number formatting for value labels, axis ticks, and pie percentages.
//!
//! [`ValueFormat`] reads a format-spec subset,
//! `[$][sign][0][width][,|_][.precision][type]` with type one of
//! `f F d e E % g G` (or none). [`Autopct`] reads a printf-style template
//! such as `%1.1f%%`.

use crate::error::{ChartError, ChartResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Fixed,
    Integer,
    Exponent { upper: bool },
    Percent,
    General { upper: bool },
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Negative,
    Always,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NumberSpec {
    sign: Sign,
    zero_pad: bool,
    left_align: bool,
    width: usize,
    grouping: Option<char>,
    precision: Option<usize>,
    kind: Kind,
}

impl Default for NumberSpec {
    fn default() -> Self {
        Self {
            sign: Sign::Negative,
            zero_pad: false,
            left_align: false,
            width: 0,
            grouping: None,
            precision: None,
            kind: Kind::Plain,
        }
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

fn padded_exponent(formatted: &str, upper: bool) -> String {
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return formatted.to_string();
    };
    let (sign, digits) = exponent
        .strip_prefix('-')
        .map_or(('+', exponent), |digits| ('-', digits));
    let marker = if upper { 'E' } else { 'e' };
    format!("{mantissa}{marker}{sign}{digits:0>2}")
}

fn strip_fraction_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

fn general(magnitude: f64, precision: usize, upper: bool) -> String {
    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, magnitude);
    let exponent: i64 = scientific
        .split_once('e')
        .and_then(|(_, exp)| exp.parse().ok())
        .unwrap_or(0);
    if exponent < -4 || exponent >= precision as i64 {
        let (mantissa, _) = scientific.split_once('e').unwrap_or((&scientific, ""));
        let mantissa = strip_fraction_zeros(mantissa);
        padded_exponent(&format!("{mantissa}e{exponent}"), upper)
    } else {
        let decimals = (precision as i64 - 1 - exponent).max(0) as usize;
        strip_fraction_zeros(&format!("{magnitude:.decimals$}")).to_string()
    }
}

impl NumberSpec {
    fn digits(&self, magnitude: f64) -> String {
        if magnitude.is_nan() {
            return "nan".to_string();
        }
        if magnitude.is_infinite() {
            return "inf".to_string();
        }
        let body = match self.kind {
            Kind::Fixed => format!("{:.*}", self.precision.unwrap_or(6), magnitude),
            Kind::Integer => format!("{magnitude:.0}"),
            Kind::Exponent { upper } => padded_exponent(
                &format!("{:.*e}", self.precision.unwrap_or(6), magnitude),
                upper,
            ),
            Kind::Percent => format!("{:.*}", self.precision.unwrap_or(6), magnitude * 100.0),
            Kind::General { upper } => general(magnitude, self.precision.unwrap_or(6), upper),
            Kind::Plain => match self.precision {
                Some(precision) => general(magnitude, precision, false),
                None => format!("{magnitude:?}"),
            },
        };
        let grouped = match self.grouping {
            Some(separator) if !body.contains('e') && !body.contains('E') => {
                let split = body.find('.').unwrap_or(body.len());
                format!("{}{}", group_digits(&body[..split], separator), &body[split..])
            }
            _ => body,
        };
        if self.kind == Kind::Percent {
            format!("{grouped}%")
        } else {
            grouped
        }
    }

    fn apply(&self, value: f64) -> String {
        let negative = value.is_sign_negative() && value != 0.0 && !value.is_nan();
        let sign = match (negative, self.sign) {
            (true, _) => "-",
            (false, Sign::Always) => "+",
            (false, Sign::Space) => " ",
            (false, Sign::Negative) => "",
        };
        let digits = self.digits(value.abs());
        let len = sign.len() + digits.chars().count();
        if len >= self.width {
            return format!("{sign}{digits}");
        }
        let pad = self.width - len;
        if self.left_align {
            format!("{sign}{digits}{}", " ".repeat(pad))
        } else if self.zero_pad {
            format!("{sign}{}{digits}", "0".repeat(pad))
        } else {
            format!("{}{sign}{digits}", " ".repeat(pad))
        }
    }
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_any(&mut self, set: &str) -> Option<char> {
        let ch = self.peek().filter(|ch| set.contains(*ch))?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn number(&mut self) -> Option<usize> {
        let start = self.pos;
        while self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
            self.pos += 1;
        }
        self.text[start..self.pos].parse().ok()
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }
}

fn kind_for(code: char) -> Option<Kind> {
    match code {
        'f' | 'F' => Some(Kind::Fixed),
        'd' | 'i' => Some(Kind::Integer),
        'e' => Some(Kind::Exponent { upper: false }),
        'E' => Some(Kind::Exponent { upper: true }),
        '%' => Some(Kind::Percent),
        'g' => Some(Kind::General { upper: false }),
        'G' => Some(Kind::General { upper: true }),
        _ => None,
    }
}

/// Removes one pair of matching surrounding quotes, e.g. `"',.0f'"`.
#[must_use]
pub fn normalize_format(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

/// A parsed value-label format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueFormat {
    currency: bool,
    spec: NumberSpec,
}

impl ValueFormat {
    /// Parses a format spec after stripping surrounding quotes.
    ///
    /// # Errors
    /// Returns [`ChartError::Invalid`] naming the offending spec.
    pub fn parse(raw: &str) -> ChartResult<Self> {
        let text = normalize_format(raw);
        let invalid = |reason: String| {
            ChartError::invalid(format!("Invalid value_format '{text}': {reason}"))
        };
        let (currency, body) = text
            .strip_prefix('$')
            .map_or((false, text), |rest| (true, rest));
        let mut cursor = Cursor::new(body);
        let mut spec = NumberSpec::default();
        if let Some(align) = cursor.eat_any("<>") {
            spec.left_align = align == '<';
        }
        spec.sign = match cursor.eat_any("+- ") {
            Some('+') => Sign::Always,
            Some(' ') => Sign::Space,
            _ => Sign::Negative,
        };
        spec.zero_pad = cursor.eat('0');
        spec.width = cursor.number().unwrap_or(0);
        spec.grouping = cursor.eat_any(",_");
        if cursor.eat('.') {
            spec.precision = Some(cursor.number().ok_or_else(|| {
                invalid("Format specifier missing precision".to_string())
            })?);
        }
        if let Some(code) = cursor.peek() {
            spec.kind = kind_for(code).ok_or_else(|| {
                invalid(format!("Unknown format code '{code}' for object of type 'float'"))
            })?;
            cursor.eat(code);
        }
        if !cursor.rest().is_empty() {
            return Err(invalid(format!(
                "Invalid format specifier '{body}' for object of type 'float'"
            )));
        }
        if spec.kind == Kind::Integer && spec.precision.is_some() {
            return Err(invalid(
                "Precision not allowed in integer format specifier".to_string(),
            ));
        }
        Ok(Self { currency, spec })
    }

    #[must_use]
    pub fn format(&self, value: f64) -> String {
        let body = self.spec.apply(value);
        if self.currency {
            format!("${body}")
        } else {
            body
        }
    }
}

/// A printf-style percentage template, applied to slice percentages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autopct {
    pieces: Vec<Piece>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Value(NumberSpec),
}

impl Autopct {
    /// # Errors
    /// Returns [`ChartError::Invalid`] for unknown conversions or templates
    /// that consume more than one value.
    pub fn parse(raw: &str) -> ChartResult<Self> {
        let invalid = |reason: &str| ChartError::invalid(format!("Invalid autopct '{raw}': {reason}"));
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut cursor = Cursor::new(raw);
        let mut conversions = 0;
        while let Some(ch) = cursor.peek() {
            cursor.eat(ch);
            if ch != '%' {
                literal.push(ch);
                continue;
            }
            if cursor.eat('%') {
                literal.push('%');
                continue;
            }
            let mut spec = NumberSpec::default();
            while let Some(flag) = cursor.eat_any("-+ 0#") {
                match flag {
                    '-' => spec.left_align = true,
                    '+' => spec.sign = Sign::Always,
                    ' ' => spec.sign = Sign::Space,
                    '0' => spec.zero_pad = true,
                    _ => {}
                }
            }
            spec.width = cursor.number().unwrap_or(0);
            if cursor.eat('.') {
                spec.precision = Some(cursor.number().unwrap_or(0));
            }
            let code = cursor
                .peek()
                .ok_or_else(|| invalid("incomplete format"))?;
            cursor.eat(code);
            spec.kind = match code {
                '%' => return Err(invalid("unsupported format character '%'")),
                'd' | 'i' => Kind::Integer,
                's' => Kind::Plain,
                other => kind_for(other)
                    .ok_or_else(|| invalid(&format!("unsupported format character '{other}'")))?,
            };
            if spec.kind == Kind::Integer {
                spec.precision = None;
            }
            conversions += 1;
            if conversions > 1 {
                return Err(invalid("not enough arguments for format string"));
            }
            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            pieces.push(Piece::Value(spec));
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Ok(Self { pieces })
    }

    #[must_use]
    pub fn format(&self, percent: f64) -> String {
        self.pieces
            .iter()
            .map(|piece| match piece {
                Piece::Literal(text) => text.clone(),
                Piece::Value(spec) => {
                    let value = if spec.kind == Kind::Integer { percent.trunc() } else { percent };
                    spec.apply(value)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(spec: &str, value: f64) -> String {
        ValueFormat::parse(spec).expect("valid spec").format(value)
    }

    #[test]
    fn fixed_and_currency() {
        assert_eq!(fmt(".1f", 123.456), "123.5");
        assert_eq!(fmt(".2f", 2.0), "2.00");
        assert_eq!(fmt("$.2f", 1234.5), "$1234.50");
        assert_eq!(fmt("$,.2f", 1_234_567.891), "$1,234,567.89");
        assert_eq!(fmt(",.0f", -9876.4), "-9,876");
        assert_eq!(fmt("'.1f'", 3.14159), "3.1");
    }

    #[test]
    fn integer_percent_and_exponent() {
        assert_eq!(fmt("d", 41.6), "42");
        assert_eq!(fmt(",d", 1_234_567.0), "1,234,567");
        assert_eq!(fmt(".1%", 0.256), "25.6%");
        assert_eq!(fmt(".2e", 123.456), "1.23e+02");
        assert_eq!(fmt(".2e", 0.00123), "1.23e-03");
        assert_eq!(fmt("+.1f", 2.0), "+2.0");
        assert_eq!(fmt("08.2f", -3.5), "-0003.50");
    }

    #[test]
    fn general_format() {
        assert_eq!(fmt("g", 123.456), "123.456");
        assert_eq!(fmt(".3g", 123.456), "123");
        assert_eq!(fmt("g", 1_234_567.0), "1.23457e+06");
        assert_eq!(fmt("g", 0.000_012_5), "1.25e-05");
        assert_eq!(fmt("g", 100.0), "100");
    }

    #[test]
    fn rejects_bad_specs() {
        let err = ValueFormat::parse("xyz").expect_err("bad spec");
        assert_eq!(
            err.to_string(),
            "Invalid value_format 'xyz': Unknown format code 'x' for object of type 'float'"
        );
        assert!(ValueFormat::parse(".2d").is_err());
        assert!(ValueFormat::parse(".f").is_err());
        assert!(ValueFormat::parse(".2fq").is_err());
    }

    #[test]
    fn autopct_templates() {
        let autopct = Autopct::parse("%1.1f%%").expect("template");
        assert_eq!(autopct.format(33.333), "33.3%");
        let autopct = Autopct::parse("%0.0f%%").expect("template");
        assert_eq!(autopct.format(66.7), "67%");
        let autopct = Autopct::parse("%d pct").expect("template");
        assert_eq!(autopct.format(12.9), "12 pct");
        assert!(Autopct::parse("%q").is_err());
        assert!(Autopct::parse("%f %f").is_err());
    }
}
