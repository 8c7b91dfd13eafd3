//! Sparse polynomials over [`Number`], with non-polynomial subexpressions
//! treated as opaque variables.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::expr::{Expr, fold_add, fold_mul, fold_pow};
use super::number::{Number, Rational};

const MAX_POWER: i128 = 64;

pub(crate) type Monomial = Vec<(String, u32)>;

fn mono_mul(a: &Monomial, b: &Monomial) -> Monomial {
    let mut out: BTreeMap<String, u32> = a.iter().cloned().collect();
    for (name, exp) in b {
        *out.entry(name.clone()).or_insert(0) += exp;
    }
    out.into_iter().collect()
}

fn mono_div(a: &Monomial, b: &Monomial) -> Option<Monomial> {
    let mut out: BTreeMap<String, u32> = a.iter().cloned().collect();
    for (name, exp) in b {
        let have = out.get_mut(name)?;
        *have = have.checked_sub(*exp)?;
    }
    Some(out.into_iter().filter(|(_, e)| *e > 0).collect())
}

fn mono_degree(m: &Monomial) -> u32 {
    m.iter().map(|(_, e)| e).sum()
}

fn exponent_of(m: &Monomial, name: &str) -> u32 {
    m.iter().find(|(n, _)| n == name).map_or(0, |(_, e)| *e)
}

/// Graded lexicographic order; variables compare by name.
pub(crate) fn grlex(a: &Monomial, b: &Monomial) -> Ordering {
    mono_degree(a).cmp(&mono_degree(b)).then_with(|| {
        let names: BTreeSet<&String> = a.iter().chain(b.iter()).map(|(n, _)| n).collect();
        for name in names {
            match exponent_of(a, name).cmp(&exponent_of(b, name)) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        Ordering::Equal
    })
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Poly {
    terms: BTreeMap<Monomial, Number>,
}

impl Poly {
    pub(crate) fn zero() -> Self {
        Self::default()
    }

    pub(crate) fn constant(value: Number) -> Self {
        let mut out = Self::zero();
        out.insert(Vec::new(), value);
        out
    }

    pub(crate) fn one() -> Self {
        Self::constant(Number::ONE)
    }

    pub(crate) fn variable(name: impl Into<String>) -> Self {
        let mut out = Self::zero();
        out.insert(vec![(name.into(), 1)], Number::ONE);
        out
    }

    fn monomial(m: Monomial, coeff: Number) -> Self {
        let mut out = Self::zero();
        out.insert(m, coeff);
        out
    }

    fn insert(&mut self, m: Monomial, coeff: Number) {
        let updated = self.terms.get(&m).map_or(coeff, |c| c.add(coeff));
        let negligible = match updated {
            Number::Exact(r) => r.is_zero(),
            Number::Float(v) => v.abs() < 1e-12,
        };
        if negligible {
            self.terms.remove(&m);
        } else {
            self.terms.insert(m, updated);
        }
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub(crate) fn as_constant(&self) -> Option<Number> {
        match self.terms.len() {
            0 => Some(Number::ZERO),
            1 => self.terms.get(&Vec::new()).copied(),
            _ => None,
        }
    }

    pub(crate) fn is_exact(&self) -> bool {
        self.terms.values().all(|c| matches!(c, Number::Exact(_)))
    }

    pub(crate) fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub(crate) fn terms(&self) -> impl Iterator<Item = (&Monomial, &Number)> {
        self.terms.iter()
    }

    pub(crate) fn add(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            out.insert(m.clone(), *c);
        }
        out
    }

    pub(crate) fn neg(&self) -> Self {
        self.scale(Number::MINUS_ONE)
    }

    pub(crate) fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    pub(crate) fn scale(&self, factor: Number) -> Self {
        let mut out = Self::zero();
        for (m, c) in &self.terms {
            out.insert(m.clone(), c.mul(factor));
        }
        out
    }

    pub(crate) fn mul(&self, other: &Self) -> Self {
        let mut out = Self::zero();
        for (ma, ca) in &self.terms {
            for (mb, cb) in &other.terms {
                out.insert(mono_mul(ma, mb), ca.mul(*cb));
            }
        }
        out
    }

    pub(crate) fn pow(&self, exp: u32) -> Self {
        let mut out = Self::one();
        for _ in 0..exp {
            out = out.mul(self);
        }
        out
    }

    pub(crate) fn vars(&self) -> BTreeSet<String> {
        self.terms
            .keys()
            .flat_map(|m| m.iter().map(|(n, _)| n.clone()))
            .collect()
    }

    pub(crate) fn degree_in(&self, var: &str) -> u32 {
        self.terms.keys().map(|m| exponent_of(m, var)).max().unwrap_or(0)
    }

    pub(crate) fn leading(&self) -> Option<(Monomial, Number)> {
        self.terms
            .iter()
            .max_by(|(a, _), (b, _)| grlex(a, b))
            .map(|(m, c)| (m.clone(), *c))
    }

    /// Quotient when `divisor` divides `self` with no remainder.
    pub(crate) fn div_exact(&self, divisor: &Self) -> Option<Self> {
        let (dm, dc) = divisor.leading()?;
        let mut remainder = self.clone();
        let mut quotient = Self::zero();
        for _ in 0..10_000 {
            if remainder.is_zero() {
                return Some(quotient);
            }
            let (rm, rc) = remainder.leading()?;
            let step = Self::monomial(mono_div(&rm, &dm)?, rc.div(dc)?);
            quotient = quotient.add(&step);
            remainder = remainder.sub(&step.mul(divisor));
        }
        None
    }

    /// Coefficients of `self` viewed as a polynomial in `var`, lowest power
    /// first.
    pub(crate) fn coefficients_in(&self, var: &str) -> Vec<Self> {
        let degree = self.degree_in(var) as usize;
        let mut out = vec![Self::zero(); degree + 1];
        for (m, c) in &self.terms {
            let power = exponent_of(m, var) as usize;
            let rest: Monomial = m.iter().filter(|(n, _)| n != var).cloned().collect();
            out[power].insert(rest, *c);
        }
        out
    }

    /// Largest monomial dividing every term.
    pub(crate) fn monomial_content(&self) -> Monomial {
        let mut iter = self.terms.keys();
        let Some(first) = iter.next() else {
            return Vec::new();
        };
        let mut common: BTreeMap<String, u32> = first.iter().cloned().collect();
        for m in iter {
            common = common
                .into_iter()
                .filter_map(|(name, exp)| {
                    let other = exponent_of(m, &name);
                    (other > 0).then(|| (name, exp.min(other)))
                })
                .collect();
        }
        common.into_iter().collect()
    }

    pub(crate) fn div_monomial(&self, m: &Monomial) -> Option<Self> {
        let mut out = Self::zero();
        for (mm, c) in &self.terms {
            out.insert(mono_div(mm, m)?, *c);
        }
        Some(out)
    }

    pub(crate) fn to_expr(&self, ctx: &PolyContext) -> Expr {
        let terms: Vec<Expr> = self
            .terms
            .iter()
            .map(|(m, c)| {
                let mut factors = vec![Expr::Num(*c)];
                factors.extend(m.iter().map(|(name, e)| {
                    fold_pow(ctx.expr_of(name), Expr::int(i128::from(*e)))
                }));
                fold_mul(factors)
            })
            .collect();
        fold_add(terms)
    }
}

/// Maps opaque subexpressions to variable names while converting.
#[derive(Debug, Default)]
pub(crate) struct PolyContext {
    atoms: BTreeMap<String, Expr>,
}

impl PolyContext {
    fn atom(&mut self, expr: &Expr) -> Poly {
        let name = expr.to_string();
        self.atoms.entry(name.clone()).or_insert_with(|| expr.clone());
        Poly::variable(name)
    }

    pub(crate) fn expr_of(&self, name: &str) -> Expr {
        self.atoms
            .get(name)
            .cloned()
            .unwrap_or_else(|| Expr::Sym(name.to_string()))
    }

    /// True when some opaque atom mentions `var`.
    pub(crate) fn var_hidden_in_atoms(&self, var: &str) -> bool {
        self.atoms.values().any(|atom| atom.contains_symbol(var))
    }

    /// Polynomial form; `None` when a negative power appears.
    pub(crate) fn to_poly(&mut self, expr: &Expr) -> Option<Poly> {
        match expr {
            Expr::Num(n) => Some(Poly::constant(*n)),
            Expr::Sym(name) => Some(Poly::variable(name.clone())),
            Expr::Add(terms) => {
                let mut out = Poly::zero();
                for term in terms {
                    out = out.add(&self.to_poly(term)?);
                }
                Some(out)
            }
            Expr::Mul(factors) => {
                let mut out = Poly::one();
                for factor in factors {
                    out = out.mul(&self.to_poly(factor)?);
                }
                Some(out)
            }
            Expr::Pow(base, exp) => match exp.as_number().and_then(Number::as_integer) {
                Some(n) if (0..=MAX_POWER).contains(&n) => {
                    Some(self.to_poly(base)?.pow(u32::try_from(n).ok()?))
                }
                Some(n) if n < 0 => None,
                _ => Some(self.atom(expr)),
            },
            Expr::Const(_) | Expr::Call(..) => Some(self.atom(expr)),
        }
    }

    /// Numerator and denominator polynomials, not yet reduced.
    pub(crate) fn to_fraction(&mut self, expr: &Expr) -> (Poly, Poly) {
        match expr {
            Expr::Num(n) => (Poly::constant(*n), Poly::one()),
            Expr::Sym(name) => (Poly::variable(name.clone()), Poly::one()),
            Expr::Add(terms) => {
                let mut acc = (Poly::zero(), Poly::one());
                for term in terms {
                    let (n, d) = self.to_fraction(term);
                    acc = if d == acc.1 {
                        (acc.0.add(&n), d)
                    } else if d == Poly::one() {
                        (acc.0.add(&n.mul(&acc.1)), acc.1)
                    } else {
                        (acc.0.mul(&d).add(&n.mul(&acc.1)), acc.1.mul(&d))
                    };
                }
                acc
            }
            Expr::Mul(factors) => {
                let mut acc = (Poly::one(), Poly::one());
                for factor in factors {
                    let (n, d) = self.to_fraction(factor);
                    acc = (acc.0.mul(&n), acc.1.mul(&d));
                }
                acc
            }
            Expr::Pow(base, exp) => match exp.as_number().and_then(Number::as_integer) {
                Some(n) if n.abs() <= MAX_POWER => {
                    let (bn, bd) = self.to_fraction(base);
                    let power = n.unsigned_abs() as u32;
                    if n >= 0 {
                        (bn.pow(power), bd.pow(power))
                    } else {
                        (bd.pow(power), bn.pow(power))
                    }
                }
                _ => (self.atom(expr), Poly::one()),
            },
            Expr::Const(_) | Expr::Call(..) => (self.atom(expr), Poly::one()),
        }
    }
}

/// Removes common factors from a fraction and makes the denominator's
/// leading coefficient one.
pub(crate) fn cancel(num: &Poly, den: &Poly) -> (Poly, Poly) {
    if num.is_zero() {
        return (Poly::zero(), Poly::one());
    }
    if let Some(c) = den.as_constant() {
        if let Some(inv) = Number::ONE.div(c) {
            return (num.scale(inv), Poly::one());
        }
    }
    if let Some(quotient) = num.div_exact(den) {
        return (quotient, Poly::one());
    }
    let mut num = num.clone();
    let mut den = den.clone();

    let shared: BTreeMap<String, u32> = num.monomial_content().into_iter().collect();
    let common: Monomial = den
        .monomial_content()
        .into_iter()
        .filter_map(|(name, e)| shared.get(&name).map(|s| (name, e.min(*s))))
        .collect();
    if !common.is_empty() {
        if let (Some(n), Some(d)) = (num.div_monomial(&common), den.div_monomial(&common)) {
            num = n;
            den = d;
        }
    }

    let vars: BTreeSet<String> = num.vars().union(&den.vars()).cloned().collect();
    if vars.len() == 1 && num.is_exact() && den.is_exact() {
        if let Some(var) = vars.iter().next() {
            if let (Some(un), Some(ud)) = (UniPoly::from_poly(&num, var), UniPoly::from_poly(&den, var)) {
                if let Some(g) = UniPoly::gcd(&un, &ud) {
                    if g.degree() > 0 {
                        if let (Some((qn, _)), Some((qd, _))) = (un.divrem(&g), ud.divrem(&g)) {
                            num = qn.to_poly(var);
                            den = qd.to_poly(var);
                        }
                    }
                }
            }
        }
    }
    if let Some(quotient) = num.div_exact(&den) {
        return (quotient, Poly::one());
    }
    if let Some((_, lead)) = den.leading() {
        if let Some(inv) = Number::ONE.div(lead) {
            num = num.scale(inv);
            den = den.scale(inv);
        }
    }
    (num, den)
}

/// Dense univariate polynomial with exact coefficients, lowest power first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniPoly {
    coeffs: Vec<Rational>,
}

impl UniPoly {
    pub(crate) fn new(mut coeffs: Vec<Rational>) -> Self {
        while coeffs.len() > 1 && coeffs.last().is_some_and(|c| c.is_zero()) {
            coeffs.pop();
        }
        if coeffs.is_empty() {
            coeffs.push(Rational::ZERO);
        }
        Self { coeffs }
    }

    pub(crate) fn from_ints(ints: &[i128]) -> Self {
        Self::new(ints.iter().copied().map(Rational::integer).collect())
    }

    pub(crate) fn from_poly(poly: &Poly, var: &str) -> Option<Self> {
        let mut coeffs = vec![Rational::ZERO; poly.degree_in(var) as usize + 1];
        for (m, c) in poly.terms() {
            if m.iter().any(|(name, _)| name != var) {
                return None;
            }
            coeffs[exponent_of(m, var) as usize] = c.as_rational()?;
        }
        Some(Self::new(coeffs))
    }

    pub(crate) fn to_poly(&self, var: &str) -> Poly {
        let mut out = Poly::zero();
        for (power, c) in self.coeffs.iter().enumerate() {
            let m = if power == 0 {
                Vec::new()
            } else {
                vec![(var.to_string(), power as u32)]
            };
            out.insert(m, Number::Exact(*c));
        }
        out
    }

    pub(crate) fn to_expr(&self, var: &Expr) -> Expr {
        let terms = self
            .coeffs
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(|(power, c)| {
                fold_mul(vec![
                    Expr::rational(*c),
                    fold_pow(var.clone(), Expr::int(power as i128)),
                ])
            })
            .collect();
        fold_add(terms)
    }

    pub(crate) fn coeffs(&self) -> &[Rational] {
        &self.coeffs
    }

    pub(crate) fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs[0].is_zero()
    }

    pub(crate) fn lead(&self) -> Rational {
        self.coeffs.last().copied().unwrap_or(Rational::ZERO)
    }

    pub(crate) fn eval(&self, x: Rational) -> Option<Rational> {
        let mut acc = Rational::ZERO;
        for c in self.coeffs.iter().rev() {
            acc = acc.checked_mul(x)?.checked_add(*c)?;
        }
        Some(acc)
    }

    pub(crate) fn divrem(&self, divisor: &Self) -> Option<(Self, Self)> {
        if divisor.is_zero() {
            return None;
        }
        let mut rem = self.coeffs.clone();
        let dd = divisor.degree();
        if self.degree() < dd {
            return Some((Self::new(vec![Rational::ZERO]), self.clone()));
        }
        let mut quot = vec![Rational::ZERO; self.degree() - dd + 1];
        let lead = divisor.lead();
        for shift in (0..quot.len()).rev() {
            let factor = rem[shift + dd].checked_div(lead)?;
            quot[shift] = factor;
            for (i, c) in divisor.coeffs.iter().enumerate() {
                rem[shift + i] = rem[shift + i].checked_sub(factor.checked_mul(*c)?)?;
            }
        }
        rem.truncate(dd.max(1));
        Some((Self::new(quot), Self::new(rem)))
    }

    fn monic(&self) -> Option<Self> {
        let lead = self.lead();
        let coeffs = self
            .coeffs
            .iter()
            .map(|c| c.checked_div(lead))
            .collect::<Option<Vec<_>>>()?;
        Some(Self::new(coeffs))
    }

    /// Monic greatest common divisor.
    pub(crate) fn gcd(a: &Self, b: &Self) -> Option<Self> {
        let (mut a, mut b) = (a.clone(), b.clone());
        while !b.is_zero() {
            let (_, r) = a.divrem(&b)?;
            a = b;
            b = if r.is_zero() { r } else { r.monic()? };
        }
        if a.is_zero() { Some(a) } else { a.monic() }
    }

    /// Splits into a rational content and an integer primitive part with a
    /// positive leading coefficient.
    pub(crate) fn primitive(&self) -> Option<(Rational, Vec<i128>)> {
        let mut lcm: i128 = 1;
        for c in &self.coeffs {
            let g = gcd_i128(lcm, c.denom());
            lcm = (lcm / g).checked_mul(c.denom())?;
        }
        let ints = self
            .coeffs
            .iter()
            .map(|c| c.numer().checked_mul(lcm / c.denom()))
            .collect::<Option<Vec<i128>>>()?;
        let mut g = ints.iter().fold(0, |acc, v| gcd_i128(acc, *v));
        if g == 0 {
            return Some((Rational::ZERO, ints));
        }
        if ints.last().is_some_and(|v| *v < 0) {
            g = -g;
        }
        let prim = ints.iter().map(|v| v / g).collect();
        Some((Rational::new(g, lcm)?, prim))
    }

    /// Distinct rational roots of an integer polynomial.
    pub(crate) fn rational_roots(&self) -> Vec<Rational> {
        let Some((_, ints)) = self.primitive() else {
            return Vec::new();
        };
        let Some(&lead) = ints.last() else {
            return Vec::new();
        };
        let Some(&constant) = ints.first() else {
            return Vec::new();
        };
        let mut roots = Vec::new();
        if constant == 0 {
            roots.push(Rational::ZERO);
            return roots;
        }
        let (Some(ps), Some(qs)) = (divisors(constant), divisors(lead)) else {
            return roots;
        };
        for p in &ps {
            for q in &qs {
                for sign in [-1, 1] {
                    let Some(candidate) = Rational::new(sign * p, *q) else {
                        continue;
                    };
                    if roots.contains(&candidate) {
                        continue;
                    }
                    if self.eval(candidate).is_some_and(Rational::is_zero) {
                        roots.push(candidate);
                    }
                }
            }
        }
        roots.sort();
        roots
    }
}

const fn gcd_i128(mut a: i128, mut b: i128) -> i128 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn divisors(value: i128) -> Option<Vec<i128>> {
    let value = value.abs();
    if value > 1_000_000_000_000 {
        return None;
    }
    let mut out = Vec::new();
    let mut d = 1;
    while d * d <= value {
        if value % d == 0 {
            out.push(d);
            if d != value / d {
                out.push(value / d);
            }
        }
        d += 1;
    }
    Some(out)
}

/// Irreducible-over-the-rationals decomposition of a univariate polynomial:
/// `content * prod(factor^multiplicity)`.
#[derive(Debug, Clone)]
pub(crate) struct UniFactorization {
    pub(crate) content: Rational,
    pub(crate) factors: Vec<(UniPoly, u32)>,
}

pub(crate) fn factor_univariate(poly: &UniPoly) -> Option<UniFactorization> {
    let (mut content, ints) = poly.primitive()?;
    let mut current = UniPoly::from_ints(&ints);
    let mut factors = Vec::new();

    let zeros = current.coeffs.iter().take_while(|c| c.is_zero()).count();
    if zeros > 0 && current.degree() > 0 {
        factors.push((UniPoly::from_ints(&[0, 1]), zeros as u32));
        current = UniPoly::new(current.coeffs[zeros..].to_vec());
    }

    while current.degree() >= 1 {
        let Some(root) = current.rational_roots().into_iter().next() else {
            break;
        };
        let linear = UniPoly::from_ints(&[-root.numer(), root.denom()]);
        let mut multiplicity = 0;
        while current.degree() >= 1 {
            let (quotient, rem) = current.divrem(&linear)?;
            if !rem.is_zero() {
                break;
            }
            current = quotient;
            multiplicity += 1;
        }
        if multiplicity == 0 {
            break;
        }
        factors.push((linear, multiplicity));
    }

    if current.degree() >= 1 {
        let (c, ints) = current.primitive()?;
        content = content.checked_mul(c)?;
        factors.push((UniPoly::from_ints(&ints), 1));
    } else {
        content = content.checked_mul(current.lead())?;
    }

    factors.sort_by(|(a, _), (b, _)| {
        let compound = |p: &UniPoly| p.coeffs.iter().filter(|c| !c.is_zero()).count() > 1;
        let offset = |p: &UniPoly| p.coeffs[0].checked_div(p.lead()).unwrap_or(Rational::ZERO);
        compound(a)
            .cmp(&compound(b))
            .then(a.degree().cmp(&b.degree()))
            .then_with(|| offset(a).cmp(&offset(b)))
    });
    Some(UniFactorization { content, factors })
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Complex {
    re: f64,
    im: f64,
}

impl Complex {
    const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    fn add(self, o: Self) -> Self {
        Self::new(self.re + o.re, self.im + o.im)
    }

    fn sub(self, o: Self) -> Self {
        Self::new(self.re - o.re, self.im - o.im)
    }

    fn mul(self, o: Self) -> Self {
        Self::new(self.re * o.re - self.im * o.im, self.re * o.im + self.im * o.re)
    }

    fn div(self, o: Self) -> Self {
        let d = o.re * o.re + o.im * o.im;
        Self::new(
            (self.re * o.re + self.im * o.im) / d,
            (self.im * o.re - self.re * o.im) / d,
        )
    }

    fn norm(self) -> f64 {
        self.re.hypot(self.im)
    }
}

/// All complex roots of a polynomial with float coefficients (lowest power
/// first), by Durand-Kerner iteration.
pub(crate) fn numeric_roots(coeffs: &[f64]) -> Vec<(f64, f64)> {
    let mut coeffs = coeffs.to_vec();
    while coeffs.len() > 1 && coeffs.last().is_some_and(|c| *c == 0.0) {
        coeffs.pop();
    }
    let degree = coeffs.len().saturating_sub(1);
    if degree == 0 {
        return Vec::new();
    }
    let lead = coeffs[degree];
    let monic: Vec<f64> = coeffs.iter().map(|c| c / lead).collect();
    let eval = |z: Complex| {
        monic
            .iter()
            .rev()
            .fold(Complex::new(0.0, 0.0), |acc, c| acc.mul(z).add(Complex::new(*c, 0.0)))
    };
    let seed = Complex::new(0.4, 0.9);
    let mut roots: Vec<Complex> = Vec::with_capacity(degree);
    let mut z = Complex::new(1.0, 0.0);
    for _ in 0..degree {
        roots.push(z);
        z = z.mul(seed);
    }
    for _ in 0..1000 {
        let mut delta: f64 = 0.0;
        for i in 0..degree {
            let mut denom = Complex::new(1.0, 0.0);
            for j in 0..degree {
                if i != j {
                    denom = denom.mul(roots[i].sub(roots[j]));
                }
            }
            let step = eval(roots[i]).div(denom);
            roots[i] = roots[i].sub(step);
            delta = delta.max(step.norm());
        }
        if delta < 1e-14 {
            break;
        }
    }
    roots
        .into_iter()
        .map(|r| {
            let im = if r.im.abs() < 1e-10 * (1.0 + r.re.abs()) { 0.0 } else { r.im };
            (r.re, im)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i128) -> Rational {
        Rational::integer(n)
    }

    #[test]
    fn exact_division_of_multivariate_polynomials() {
        let x = Poly::variable("x");
        let y = Poly::variable("y");
        let sum = x.add(&y);
        let product = sum.mul(&x.sub(&y));
        assert_eq!(product.div_exact(&sum), Some(x.sub(&y)));
        assert_eq!(product.div_exact(&x.add(&Poly::one())), None);
    }

    #[test]
    fn univariate_gcd_is_monic() {
        // (x - 1)(x + 2) and (x - 1)(x - 3)
        let a = UniPoly::new(vec![q(-2), q(1), q(1)]);
        let b = UniPoly::new(vec![q(3), q(-4), q(1)]);
        let g = UniPoly::gcd(&a, &b).expect("gcd");
        assert_eq!(g, UniPoly::new(vec![q(-1), q(1)]));
    }

    #[test]
    fn rational_roots_are_found_and_sorted() {
        // 2x^2 - 3x + 1 = (2x - 1)(x - 1)
        let p = UniPoly::new(vec![q(1), q(-3), q(2)]);
        let roots = p.rational_roots();
        assert_eq!(roots, vec![Rational::new(1, 2).expect("half"), q(1)]);
    }

    #[test]
    fn factorization_tracks_multiplicity_and_content() {
        // 2x^3 + 4x^2 + 2x = 2x(x + 1)^2
        let p = UniPoly::new(vec![q(0), q(2), q(4), q(2)]);
        let f = factor_univariate(&p).expect("factor");
        assert_eq!(f.content, q(2));
        assert_eq!(f.factors.len(), 2);
        assert_eq!(f.factors[0], (UniPoly::from_ints(&[0, 1]), 1));
        assert_eq!(f.factors[1], (UniPoly::from_ints(&[1, 1]), 2));
    }

    #[test]
    fn durand_kerner_finds_cubic_roots() {
        // (x - 1)(x - 2)(x - 3)
        let mut roots = numeric_roots(&[-6.0, 11.0, -6.0, 1.0]);
        roots.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (root, expected) in roots.iter().zip([1.0, 2.0, 3.0]) {
            assert!((root.0 - expected).abs() < 1e-9);
            assert_eq!(root.1, 0.0);
        }
    }
}
