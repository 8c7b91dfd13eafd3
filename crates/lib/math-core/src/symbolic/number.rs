use std::cmp::Ordering;
use std::fmt;

/// Reduced fraction with a positive denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    num: i128,
    den: i128,
}

const fn gcd(mut a: i128, mut b: i128) -> i128 {
    if a < 0 {
        a = -a;
    }
    if b < 0 {
        b = -b;
    }
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Rational {
    pub const ZERO: Self = Self { num: 0, den: 1 };
    pub const ONE: Self = Self { num: 1, den: 1 };

    /// Builds a reduced fraction; `None` when `den` is zero.
    #[must_use]
    pub fn new(num: i128, den: i128) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let g = gcd(num, den).max(1);
        let (mut num, mut den) = (num / g, den / g);
        if den < 0 {
            num = num.checked_neg()?;
            den = den.checked_neg()?;
        }
        Some(Self { num, den })
    }

    #[must_use]
    pub const fn integer(value: i128) -> Self {
        Self { num: value, den: 1 }
    }

    #[must_use]
    pub const fn numer(self) -> i128 {
        self.num
    }

    #[must_use]
    pub const fn denom(self) -> i128 {
        self.den
    }

    #[must_use]
    pub const fn is_integer(self) -> bool {
        self.den == 1
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.num == 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.num < 0
    }

    #[must_use]
    pub fn abs(self) -> Self {
        Self {
            num: self.num.abs(),
            den: self.den,
        }
    }

    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    #[must_use]
    pub fn checked_neg(self) -> Option<Self> {
        Some(Self {
            num: self.num.checked_neg()?,
            den: self.den,
        })
    }

    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        let g = gcd(self.den, other.den);
        let lhs = self.num.checked_mul(other.den / g)?;
        let rhs = other.num.checked_mul(self.den / g)?;
        let den = (self.den / g).checked_mul(other.den)?;
        Self::new(lhs.checked_add(rhs)?, den)
    }

    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.checked_add(other.checked_neg()?)
    }

    #[must_use]
    pub fn checked_mul(self, other: Self) -> Option<Self> {
        let g1 = gcd(self.num, other.den).max(1);
        let g2 = gcd(other.num, self.den).max(1);
        let num = (self.num / g1).checked_mul(other.num / g2)?;
        let den = (self.den / g2).checked_mul(other.den / g1)?;
        Self::new(num, den)
    }

    /// `None` on overflow or division by zero.
    #[must_use]
    pub fn checked_div(self, other: Self) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        self.checked_mul(Self::new(other.den, other.num)?)
    }

    #[must_use]
    pub fn checked_pow(self, exp: i64) -> Option<Self> {
        if exp < 0 {
            if self.is_zero() {
                return None;
            }
            let inverse = Self::new(self.den, self.num)?;
            return inverse.checked_pow(exp.checked_neg()?);
        }
        let exp = u32::try_from(exp).ok()?;
        Some(Self {
            num: self.num.checked_pow(exp)?,
            den: self.den.checked_pow(exp)?,
        })
    }

    /// Parses integer, fraction (`3/4`), decimal, and exponent notation
    /// exactly.
    #[must_use]
    pub fn parse_decimal(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some((num, den)) = text.split_once('/') {
            let num = Self::parse_decimal(num)?;
            let den = Self::parse_decimal(den)?;
            return num.checked_div(den);
        }
        let (mantissa, exponent) = match text.find(['e', 'E']) {
            Some(idx) => (&text[..idx], text[idx + 1..].parse::<i64>().ok()?),
            None => (text, 0),
        };
        let (negative, mantissa) = match mantissa.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return None;
        }
        let digits = format!("{int_part}{frac_part}");
        let mut num: i128 = if digits.is_empty() { 0 } else { digits.parse().ok()? };
        if negative {
            num = -num;
        }
        let scale = i64::try_from(frac_part.len()).ok()?;
        let ten = Self::integer(10);
        let factor = ten.checked_pow(exponent - scale)?;
        Self::integer(num).checked_mul(factor)
    }

    /// Closest fraction with denominator at most `max_den`, by continued
    /// fractions.
    #[must_use]
    pub fn limit_denominator(self, max_den: i128) -> Self {
        if max_den < 1 || self.den <= max_den {
            return self;
        }
        let (mut p0, mut q0, mut p1, mut q1) = (0_i128, 1_i128, 1_i128, 0_i128);
        let (mut n, mut d) = (self.num, self.den);
        loop {
            let a = n.div_euclid(d);
            let q2 = q0 + a * q1;
            if q2 > max_den {
                break;
            }
            (p0, q0, p1, q1) = (p1, q1, p0 + a * p1, q2);
            (n, d) = (d, n - a * d);
            if d == 0 {
                break;
            }
        }
        let k = (max_den - q0) / q1;
        let bound1 = Self::new(p0 + k * p1, q0 + k * q1).unwrap_or(self);
        let bound2 = Self::new(p1, q1).unwrap_or(self);
        let dist = |candidate: Self| {
            self.checked_sub(candidate)
                .map_or(f64::INFINITY, |diff| diff.abs().to_f64())
        };
        if dist(bound2) <= dist(bound1) {
            bound2
        } else {
            bound1
        }
    }

    /// Approximates a float with a bounded denominator.
    #[must_use]
    pub fn from_f64(value: f64, max_den: i128) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let repr = format!("{value:e}");
        Self::parse_decimal(&repr).map(|exact| exact.limit_denominator(max_den))
    }

    /// Integer square root when the fraction is a perfect square.
    #[must_use]
    pub fn exact_sqrt(self) -> Option<Self> {
        if self.is_negative() {
            return None;
        }
        let num = isqrt(self.num)?;
        let den = isqrt(self.den)?;
        Self::new(num, den)
    }
}

fn isqrt(value: i128) -> Option<i128> {
    if value < 0 {
        return None;
    }
    let mut root = (value as f64).sqrt() as i128;
    while root > 0 && root.checked_mul(root)? > value {
        root -= 1;
    }
    while (root + 1).checked_mul(root + 1)? <= value {
        root += 1;
    }
    (root * root == value).then_some(root)
}

/// Splits `n` into `(k, m)` with `n = k^2 * m` and `m` square-free over the
/// small primes.
pub(crate) fn extract_square(n: i128) -> (i128, i128) {
    let mut outside = 1_i128;
    let mut inside = n;
    let mut p = 2_i128;
    while p * p <= inside && p < 10_000 {
        while inside % (p * p) == 0 {
            inside /= p * p;
            outside *= p;
        }
        p += 1;
    }
    (outside, inside)
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        match (
            self.num.checked_mul(other.den),
            other.num.checked_mul(self.den),
        ) {
            (Some(lhs), Some(rhs)) => lhs.cmp(&rhs),
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// Numeric literal inside an expression: exact when possible, float when a
/// float literal appears or exact arithmetic overflows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Exact(Rational),
    Float(f64),
}

impl Number {
    pub const ZERO: Self = Self::Exact(Rational::ZERO);
    pub const ONE: Self = Self::Exact(Rational::ONE);
    pub const MINUS_ONE: Self = Self::Exact(Rational::integer(-1));

    #[must_use]
    pub const fn int(value: i128) -> Self {
        Self::Exact(Rational::integer(value))
    }

    #[must_use]
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Exact(r) => r.to_f64(),
            Self::Float(v) => v,
        }
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        match self {
            Self::Exact(r) => r.is_zero(),
            Self::Float(v) => v == 0.0,
        }
    }

    #[must_use]
    pub fn is_one(self) -> bool {
        match self {
            Self::Exact(r) => r == Rational::ONE,
            Self::Float(v) => v == 1.0,
        }
    }

    #[must_use]
    pub fn is_negative(self) -> bool {
        match self {
            Self::Exact(r) => r.is_negative(),
            Self::Float(v) => v < 0.0,
        }
    }

    #[must_use]
    pub const fn as_rational(self) -> Option<Rational> {
        match self {
            Self::Exact(r) => Some(r),
            Self::Float(_) => None,
        }
    }

    #[must_use]
    pub fn as_integer(self) -> Option<i128> {
        match self {
            Self::Exact(r) if r.is_integer() => Some(r.numer()),
            _ => None,
        }
    }

    #[must_use]
    pub fn add(self, other: Self) -> Self {
        if let (Self::Exact(a), Self::Exact(b)) = (self, other) {
            if let Some(sum) = a.checked_add(b) {
                return Self::Exact(sum);
            }
        }
        Self::Float(self.to_f64() + other.to_f64())
    }

    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        self.add(other.neg())
    }

    #[must_use]
    pub fn mul(self, other: Self) -> Self {
        if let (Self::Exact(a), Self::Exact(b)) = (self, other) {
            if let Some(product) = a.checked_mul(b) {
                return Self::Exact(product);
            }
        }
        Self::Float(self.to_f64() * other.to_f64())
    }

    /// `None` when dividing by zero.
    #[must_use]
    pub fn div(self, other: Self) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        if let (Self::Exact(a), Self::Exact(b)) = (self, other) {
            if let Some(quotient) = a.checked_div(b) {
                return Some(Self::Exact(quotient));
            }
        }
        Some(Self::Float(self.to_f64() / other.to_f64()))
    }

    #[must_use]
    pub fn neg(self) -> Self {
        match self {
            Self::Exact(r) => r
                .checked_neg()
                .map_or_else(|| Self::Float(-r.to_f64()), Self::Exact),
            Self::Float(v) => Self::Float(-v),
        }
    }

    #[must_use]
    pub fn abs(self) -> Self {
        if self.is_negative() { self.neg() } else { self }
    }

    /// Raises to a numeric power when the result stays real and rational
    /// (or float). `None` means the power must stay symbolic.
    #[must_use]
    pub fn pow(self, exp: Self) -> Option<Self> {
        match (self, exp) {
            (Self::Exact(base), Self::Exact(e)) if e.is_integer() => {
                let e = i64::try_from(e.numer()).ok()?;
                if base.is_zero() && e < 0 {
                    return None;
                }
                base.checked_pow(e)
                    .map(Self::Exact)
                    .or_else(|| Some(Self::Float(base.to_f64().powf(e as f64))))
            }
            (Self::Exact(_), Self::Exact(_)) => None,
            _ => {
                let (b, e) = (self.to_f64(), exp.to_f64());
                if b < 0.0 && e.fract() != 0.0 {
                    return None;
                }
                if b == 0.0 && e < 0.0 {
                    return None;
                }
                Some(Self::Float(b.powf(e)))
            }
        }
    }

    /// Total order for sorting; floats and exact values compare numerically.
    #[must_use]
    pub fn total_cmp(self, other: Self) -> Ordering {
        match (self, other) {
            (Self::Exact(a), Self::Exact(b)) => a.cmp(&b),
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl From<Rational> for Number {
    fn from(value: Rational) -> Self {
        Self::Exact(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(r) => write!(f, "{r}"),
            Self::Float(v) => write!(f, "{}", crate::format::float_repr(*v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(num: i128, den: i128) -> Rational {
        Rational::new(num, den).expect("valid fraction")
    }

    #[test]
    fn fractions_are_reduced_with_positive_denominator() {
        let r = q(6, -8);
        assert_eq!((r.numer(), r.denom()), (-3, 4));
        assert_eq!(r.to_string(), "-3/4");
        assert!(Rational::new(1, 0).is_none());
    }

    #[test]
    fn decimal_text_parses_exactly() {
        assert_eq!(Rational::parse_decimal("0.5"), Some(q(1, 2)));
        assert_eq!(Rational::parse_decimal("1.25"), Some(q(5, 4)));
        assert_eq!(Rational::parse_decimal("-0.125"), Some(q(-1, 8)));
        assert_eq!(Rational::parse_decimal("2.5e-1"), Some(q(1, 4)));
        assert_eq!(Rational::parse_decimal("3/4"), Some(q(3, 4)));
        assert_eq!(Rational::parse_decimal("abc"), None);
    }

    #[test]
    fn limit_denominator_matches_continued_fraction_bounds() {
        let third = Rational::parse_decimal("0.3333333333").expect("decimal");
        assert_eq!(third.limit_denominator(100), q(1, 3));
        let pi = Rational::parse_decimal("3.141592653589793").expect("decimal");
        assert_eq!(pi.limit_denominator(10), q(22, 7));
        assert_eq!(pi.limit_denominator(1000), q(355, 113));
    }

    #[test]
    fn exact_arithmetic_overflows_into_floats() {
        let big = Number::int(i128::MAX);
        assert!(matches!(big.add(Number::ONE), Number::Float(_)));
        assert_eq!(Number::int(2).pow(Number::int(-1)), Some(Number::Exact(q(1, 2))));
        assert_eq!(Number::int(0).pow(Number::int(-1)), None);
    }

    #[test]
    fn square_parts_are_extracted() {
        assert_eq!(extract_square(8), (2, 2));
        assert_eq!(extract_square(12), (2, 3));
        assert_eq!(extract_square(49), (7, 1));
        assert_eq!(q(9, 4).exact_sqrt(), Some(q(3, 2)));
        assert_eq!(q(2, 1).exact_sqrt(), None);
    }
}
