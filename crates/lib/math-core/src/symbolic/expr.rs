use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::number::{Number, Rational, extract_square};
use crate::error::{MathError, MathResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constant {
    Pi,
    E,
    I,
}

/// Elementary functions of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Log,
    Abs,
}

impl Func {
    /// Resolves a source-level function name. `sqrt` is handled by the
    /// parser as a power.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "exp" => Self::Exp,
            "log" | "ln" => Self::Log,
            "abs" | "Abs" => Self::Abs,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Abs => "Abs",
        }
    }

    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Asin => x.asin(),
            Self::Acos => x.acos(),
            Self::Atan => x.atan(),
            Self::Sinh => x.sinh(),
            Self::Cosh => x.cosh(),
            Self::Tanh => x.tanh(),
            Self::Exp => x.exp(),
            Self::Log => x.ln(),
            Self::Abs => x.abs(),
        }
    }

    const fn is_odd(self) -> bool {
        matches!(
            self,
            Self::Sin | Self::Tan | Self::Asin | Self::Atan | Self::Sinh | Self::Tanh
        )
    }

    const fn is_even(self) -> bool {
        matches!(self, Self::Cos | Self::Cosh | Self::Abs)
    }
}

/// Expression tree.
///
/// Trees built by the parser or the raw constructors are not normalized;
/// [`Expr::canonical`] folds constants, collects like terms and powers, and
/// orders operands so that structurally equal values print identically.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(Number),
    Sym(String),
    Const(Constant),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    #[must_use]
    pub const fn int(value: i128) -> Self {
        Self::Num(Number::int(value))
    }

    #[must_use]
    pub const fn rational(value: Rational) -> Self {
        Self::Num(Number::Exact(value))
    }

    #[must_use]
    pub fn half() -> Self {
        Self::Num(Number::Exact(Rational::new(1, 2).unwrap_or(Rational::ONE)))
    }

    #[must_use]
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Sym(name.into())
    }

    #[must_use]
    pub fn pow(base: Self, exp: Self) -> Self {
        Self::Pow(Box::new(base), Box::new(exp))
    }

    #[must_use]
    pub fn call(func: Func, arg: Self) -> Self {
        Self::Call(func, Box::new(arg))
    }

    #[must_use]
    pub fn sqrt(arg: Self) -> Self {
        Self::pow(arg, Self::half())
    }

    #[must_use]
    pub fn neg(value: Self) -> Self {
        Self::Mul(vec![Self::Num(Number::MINUS_ONE), value])
    }

    #[must_use]
    pub fn sub(lhs: Self, rhs: Self) -> Self {
        Self::Add(vec![lhs, Self::neg(rhs)])
    }

    #[must_use]
    pub fn div(lhs: Self, rhs: Self) -> Self {
        Self::Mul(vec![lhs, Self::pow(rhs, Self::Num(Number::MINUS_ONE))])
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<Number> {
        match self {
            Self::Num(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.as_number().is_some_and(Number::is_zero)
    }

    #[must_use]
    pub fn is_one(&self) -> bool {
        self.as_number().is_some_and(Number::is_one)
    }

    #[must_use]
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Sym(name) => {
                out.insert(name.clone());
            }
            Self::Add(items) | Self::Mul(items) => {
                for item in items {
                    item.collect_symbols(out);
                }
            }
            Self::Pow(base, exp) => {
                base.collect_symbols(out);
                exp.collect_symbols(out);
            }
            Self::Call(_, arg) => arg.collect_symbols(out),
            Self::Num(_) | Self::Const(_) => {}
        }
    }

    #[must_use]
    pub fn contains_symbol(&self, name: &str) -> bool {
        match self {
            Self::Sym(s) => s == name,
            Self::Add(items) | Self::Mul(items) => items.iter().any(|i| i.contains_symbol(name)),
            Self::Pow(base, exp) => base.contains_symbol(name) || exp.contains_symbol(name),
            Self::Call(_, arg) => arg.contains_symbol(name),
            Self::Num(_) | Self::Const(_) => false,
        }
    }

    #[must_use]
    pub fn contains_imaginary(&self) -> bool {
        match self {
            Self::Const(Constant::I) => true,
            Self::Add(items) | Self::Mul(items) => items.iter().any(Self::contains_imaginary),
            Self::Pow(base, exp) => base.contains_imaginary() || exp.contains_imaginary(),
            Self::Call(_, arg) => arg.contains_imaginary(),
            _ => false,
        }
    }

    #[must_use]
    pub fn contains_float(&self) -> bool {
        match self {
            Self::Num(Number::Float(_)) => true,
            Self::Add(items) | Self::Mul(items) => items.iter().any(Self::contains_float),
            Self::Pow(base, exp) => base.contains_float() || exp.contains_float(),
            Self::Call(_, arg) => arg.contains_float(),
            _ => false,
        }
    }

    /// Replaces every occurrence of `name` and re-normalizes.
    #[must_use]
    pub fn substitute(&self, name: &str, value: &Self) -> Self {
        self.replace_symbol(name, value).canonical()
    }

    /// Like [`Expr::substitute`], but fails when the value zeroes a
    /// denominator.
    ///
    /// # Errors
    /// Returns [`MathError::Evaluation`] on division by zero.
    pub fn substitute_checked(&self, name: &str, value: &Self) -> MathResult<Self> {
        let replaced = self.replace_symbol(name, value);
        replaced.check_denominators()?;
        Ok(replaced.canonical())
    }

    /// Rejects zero raised to a negative power anywhere in the tree. Bases and
    /// exponents are normalized first, so `1/(x - x)` is caught too.
    ///
    /// # Errors
    /// Returns [`MathError::Evaluation`] on division by zero.
    pub fn check_denominators(&self) -> MathResult<()> {
        match self {
            Self::Num(_) | Self::Sym(_) | Self::Const(_) => Ok(()),
            Self::Add(items) | Self::Mul(items) => items.iter().try_for_each(Self::check_denominators),
            Self::Call(_, arg) => arg.check_denominators(),
            Self::Pow(base, exp) => {
                base.check_denominators()?;
                exp.check_denominators()?;
                let negative = exp.canonical().as_number().is_some_and(Number::is_negative);
                if negative && base.canonical().is_zero() {
                    return Err(MathError::evaluation("Division by zero"));
                }
                Ok(())
            }
        }
    }

    fn replace_symbol(&self, name: &str, value: &Self) -> Self {
        match self {
            Self::Sym(s) if s == name => value.clone(),
            Self::Add(items) => Self::Add(items.iter().map(|i| i.replace_symbol(name, value)).collect()),
            Self::Mul(items) => Self::Mul(items.iter().map(|i| i.replace_symbol(name, value)).collect()),
            Self::Pow(base, exp) => Self::pow(base.replace_symbol(name, value), exp.replace_symbol(name, value)),
            Self::Call(func, arg) => Self::call(*func, arg.replace_symbol(name, value)),
            other => other.clone(),
        }
    }

    /// Normal form used by every other operation.
    #[must_use]
    pub fn canonical(&self) -> Self {
        match self {
            Self::Num(_) | Self::Sym(_) | Self::Const(_) => self.clone(),
            Self::Add(items) => fold_add(items.iter().map(Self::canonical).collect()),
            Self::Mul(items) => fold_mul(items.iter().map(Self::canonical).collect()),
            Self::Pow(base, exp) => fold_pow(base.canonical(), exp.canonical()),
            Self::Call(func, arg) => fold_call(*func, arg.canonical()),
        }
    }

    /// Evaluates to a real number with the given bindings.
    ///
    /// # Errors
    /// Returns [`MathError::Evaluation`] for unbound symbols, imaginary
    /// values, and non-finite results.
    pub fn eval_f64(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> MathResult<f64> {
        let value = match self {
            Self::Num(n) => n.to_f64(),
            Self::Sym(name) => {
                lookup(name).ok_or_else(|| MathError::evaluation(format!("Unbound symbol '{name}'")))?
            }
            Self::Const(Constant::Pi) => std::f64::consts::PI,
            Self::Const(Constant::E) => std::f64::consts::E,
            Self::Const(Constant::I) => {
                return Err(MathError::evaluation("Expression has an imaginary value"));
            }
            Self::Add(items) => {
                let mut sum = 0.0;
                for item in items {
                    sum += item.eval_f64(lookup)?;
                }
                sum
            }
            Self::Mul(items) => {
                let mut product = 1.0;
                for item in items {
                    product *= item.eval_f64(lookup)?;
                }
                product
            }
            Self::Pow(base, exp) => {
                let (base, exp) = (base.eval_f64(lookup)?, exp.eval_f64(lookup)?);
                if base == 0.0 && exp < 0.0 {
                    return Err(MathError::evaluation("Division by zero"));
                }
                base.powf(exp)
            }
            Self::Call(func, arg) => func.apply(arg.eval_f64(lookup)?),
        };
        if value.is_nan() {
            return Err(MathError::evaluation(format!("Expression '{self}' is not a real number")));
        }
        Ok(value)
    }
}

/// Splits a canonical term into its numeric coefficient and the rest.
pub(crate) fn split_coefficient(term: &Expr) -> (Number, Expr) {
    if let Expr::Mul(factors) = term {
        if let Some(Expr::Num(n)) = factors.first() {
            let rest: Vec<Expr> = factors[1..].to_vec();
            let rest = if rest.len() == 1 {
                rest.into_iter().next().unwrap_or(Expr::int(1))
            } else {
                Expr::Mul(rest)
            };
            return (*n, rest);
        }
    }
    match term {
        Expr::Num(n) => (*n, Expr::int(1)),
        other => (Number::ONE, other.clone()),
    }
}

fn split_power(factor: Expr) -> (Expr, Expr) {
    match factor {
        Expr::Pow(base, exp) => (*base, *exp),
        other => (other, Expr::int(1)),
    }
}

fn key(expr: &Expr) -> String {
    expr.to_string()
}

pub(crate) fn fold_add(items: Vec<Expr>) -> Expr {
    let mut constant = Number::ZERO;
    let mut terms: Vec<(String, Expr, Number)> = Vec::new();
    let mut pending = items;
    while let Some(item) = pending.pop() {
        match item {
            Expr::Add(inner) => pending.extend(inner),
            Expr::Num(n) => constant = constant.add(n),
            other => {
                let (coeff, rest) = split_coefficient(&other);
                let k = key(&rest);
                match terms.iter_mut().find(|(existing, _, _)| *existing == k) {
                    Some(entry) => entry.2 = entry.2.add(coeff),
                    None => terms.push((k, rest, coeff)),
                }
            }
        }
    }

    // sin(u)**2 + cos(u)**2 with equal coefficients collapses to the coefficient.
    let mut idx = 0;
    while idx < terms.len() {
        if let Some(arg) = squared_call(&terms[idx].1, Func::Sin) {
            let coeff = terms[idx].2;
            let partner = terms.iter().position(|(_, rest, c)| {
                squared_call(rest, Func::Cos).is_some_and(|other| key(other) == key(arg))
                    && c.total_cmp(coeff) == Ordering::Equal
            });
            if let Some(partner) = partner {
                constant = constant.add(coeff);
                let (hi, lo) = if partner > idx { (partner, idx) } else { (idx, partner) };
                terms.remove(hi);
                terms.remove(lo);
                continue;
            }
        }
        idx += 1;
    }

    let mut out: Vec<Expr> = terms
        .into_iter()
        .filter(|(_, _, coeff)| !coeff.is_zero())
        .map(|(_, rest, coeff)| {
            if coeff.is_one() {
                rest
            } else {
                fold_mul(vec![Expr::Num(coeff), rest])
            }
        })
        .collect();
    let symbolic = out.iter().any(|t| !t.free_symbols().is_empty());
    out.sort_by(compare_terms);
    if !constant.is_zero() {
        if symbolic {
            out.push(Expr::Num(constant));
        } else {
            out.insert(0, Expr::Num(constant));
        }
    }
    match out.len() {
        0 => Expr::Num(constant),
        1 => out.pop().unwrap_or(Expr::int(0)),
        _ => Expr::Add(out),
    }
}

fn squared_call(expr: &Expr, func: Func) -> Option<&Expr> {
    if let Expr::Pow(base, exp) = expr {
        if let (Expr::Call(f, arg), Some(2)) = (base.as_ref(), exp.as_number().and_then(Number::as_integer)) {
            if *f == func {
                return Some(arg);
            }
        }
    }
    None
}

/// Per-symbol degrees of a term; non-polynomial parts contribute nothing.
pub(crate) fn monomial_degrees(term: &Expr) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    accumulate_degrees(term, 1.0, &mut out);
    out
}

fn accumulate_degrees(term: &Expr, scale: f64, out: &mut BTreeMap<String, f64>) {
    match term {
        Expr::Sym(name) => *out.entry(name.clone()).or_insert(0.0) += scale,
        Expr::Mul(items) => {
            for item in items {
                accumulate_degrees(item, scale, out);
            }
        }
        Expr::Pow(base, exp) => {
            if let Some(e) = exp.as_number() {
                accumulate_degrees(base, scale * e.to_f64(), out);
            }
        }
        Expr::Add(items) => {
            let mut best = BTreeMap::new();
            for item in items {
                let degrees = monomial_degrees(item);
                if degrees.values().sum::<f64>() > best.values().sum::<f64>() {
                    best = degrees;
                }
            }
            for (name, degree) in best {
                *out.entry(name).or_insert(0.0) += degree * scale;
            }
        }
        _ => {}
    }
}

/// Term order for sums: higher total degree first, then lexicographic by
/// symbol exponents, then by printed form.
pub(crate) fn compare_terms(a: &Expr, b: &Expr) -> Ordering {
    let (da, db) = (monomial_degrees(a), monomial_degrees(b));
    let (ta, tb) = (da.values().sum::<f64>(), db.values().sum::<f64>());
    tb.total_cmp(&ta)
        .then_with(|| {
            let names: BTreeSet<&String> = da.keys().chain(db.keys()).collect();
            for name in names {
                let ea = da.get(name).copied().unwrap_or(0.0);
                let eb = db.get(name).copied().unwrap_or(0.0);
                match eb.total_cmp(&ea) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            Ordering::Equal
        })
        .then_with(|| key(a).cmp(&key(b)))
}

fn factor_rank(factor: &Expr) -> u8 {
    match factor {
        Expr::Const(_) => 1,
        Expr::Sym(_) => 2,
        Expr::Pow(base, _) => match base.as_ref() {
            Expr::Num(_) => 0,
            Expr::Const(_) => 1,
            Expr::Sym(_) => 2,
            _ => 3,
        },
        _ => 3,
    }
}

pub(crate) fn fold_mul(items: Vec<Expr>) -> Expr {
    fold_mul_pass(items, 0)
}

fn fold_mul_pass(items: Vec<Expr>, depth: u8) -> Expr {
    let mut coeff = Number::ONE;
    let mut groups: Vec<(String, Expr, Vec<Expr>)> = Vec::new();
    let mut pending = items;
    pending.reverse();
    while let Some(item) = pending.pop() {
        match item {
            Expr::Mul(inner) => pending.extend(inner.into_iter().rev()),
            Expr::Num(n) => coeff = coeff.mul(n),
            other => {
                let (base, exp) = split_power(other);
                let k = key(&base);
                match groups.iter_mut().find(|(existing, _, _)| *existing == k) {
                    Some(entry) => entry.2.push(exp),
                    None => groups.push((k, base, vec![exp])),
                }
            }
        }
    }
    if coeff.is_zero() {
        return Expr::Num(coeff);
    }

    let mut others = Vec::new();
    let mut unsettled = false;
    for (_, base, exps) in groups {
        let exp = if exps.len() == 1 {
            exps.into_iter().next().unwrap_or(Expr::int(1))
        } else {
            fold_add(exps)
        };
        match fold_pow(base, exp) {
            Expr::Num(n) => coeff = coeff.mul(n),
            Expr::Mul(inner) => {
                for part in inner {
                    match part {
                        Expr::Num(n) => coeff = coeff.mul(n),
                        rest => {
                            unsettled = true;
                            others.push(rest);
                        }
                    }
                }
            }
            rest => others.push(rest),
        }
    }
    if unsettled && depth < 3 {
        let mut again = vec![Expr::Num(coeff)];
        again.extend(others);
        return fold_mul_pass(again, depth + 1);
    }
    if coeff.is_zero() {
        return Expr::Num(coeff);
    }

    others.sort_by(|a, b| factor_rank(a).cmp(&factor_rank(b)).then_with(|| key(a).cmp(&key(b))));
    if others.is_empty() {
        return Expr::Num(coeff);
    }
    if coeff.is_one() && others.len() == 1 {
        return others.pop().unwrap_or(Expr::Num(coeff));
    }
    if others.len() == 1 && !coeff.is_one() {
        if let Expr::Add(terms) = &others[0] {
            return fold_add(
                terms
                    .iter()
                    .map(|t| fold_mul(vec![Expr::Num(coeff), t.clone()]))
                    .collect(),
            );
        }
    }
    let mut out = Vec::with_capacity(others.len() + 1);
    if !coeff.is_one() {
        out.push(Expr::Num(coeff));
    }
    out.extend(others);
    Expr::Mul(out)
}

pub(crate) fn fold_pow(base: Expr, exp: Expr) -> Expr {
    if exp.is_zero() {
        return Expr::int(1);
    }
    if exp.is_one() {
        return base;
    }
    if matches!(base, Expr::Num(Number::Exact(r)) if r == Rational::ONE) {
        return Expr::int(1);
    }
    if base == Expr::Const(Constant::E) {
        return fold_call(Func::Exp, exp);
    }
    let int_exp = exp.as_number().and_then(Number::as_integer);
    match (base, exp) {
        (Expr::Num(b), Expr::Num(e)) => {
            if let Some(value) = b.pow(e) {
                return Expr::Num(value);
            }
            match (b, e) {
                (Number::Exact(rb), Number::Exact(re)) if re.denom() == 2 => {
                    let k = re.numer().div_euclid(2);
                    let whole = i64::try_from(k).ok().and_then(|k| rb.checked_pow(k));
                    match whole {
                        Some(whole) if k != 0 => fold_mul(vec![Expr::rational(whole), sqrt_rational(rb)]),
                        _ => sqrt_rational(rb),
                    }
                }
                (b, e) => Expr::pow(Expr::Num(b), Expr::Num(e)),
            }
        }
        (Expr::Const(Constant::I), exp) => match int_exp {
            Some(n) => match n.rem_euclid(4) {
                0 => Expr::int(1),
                1 => Expr::Const(Constant::I),
                2 => Expr::int(-1),
                _ => Expr::neg(Expr::Const(Constant::I)).canonical(),
            },
            None => Expr::pow(Expr::Const(Constant::I), exp),
        },
        (Expr::Pow(inner_base, inner_exp), exp) if int_exp.is_some() => {
            fold_pow(*inner_base, fold_mul(vec![*inner_exp, exp]))
        }
        (Expr::Mul(factors), exp) if int_exp.is_some() => {
            fold_mul(factors.into_iter().map(|f| fold_pow(f, exp.clone())).collect())
        }
        (base, exp) if base.is_zero() && exp.as_number().is_some_and(|e| !e.is_negative()) => Expr::int(0),
        (base, exp) => Expr::pow(base, exp),
    }
}

/// `sqrt(r)` with perfect-square parts pulled out and negative radicands
/// turned into `I`.
pub(crate) fn sqrt_rational(r: Rational) -> Expr {
    if r.is_negative() {
        let positive = r.abs();
        return fold_mul(vec![Expr::Const(Constant::I), sqrt_rational(positive)]);
    }
    if let Some(root) = r.exact_sqrt() {
        return Expr::rational(root);
    }
    let Some(radicand) = r.numer().checked_mul(r.denom()) else {
        return Expr::sqrt(Expr::rational(r));
    };
    let (outside, inside) = extract_square(radicand);
    let raw = Expr::sqrt(Expr::int(inside));
    if outside == 1 && r.denom() == 1 {
        return raw;
    }
    match Rational::new(outside, r.denom()) {
        Some(scale) => Expr::Mul(vec![Expr::rational(scale), raw]),
        None => raw,
    }
}

pub(crate) fn fold_call(func: Func, arg: Expr) -> Expr {
    if let Expr::Num(n) = arg {
        if let Some(value) = exact_call(func, n) {
            return value;
        }
        if let Number::Float(x) = n {
            let value = func.apply(x);
            if value.is_finite() {
                return Expr::Num(Number::Float(value));
            }
        }
    }
    match (func, &arg) {
        (Func::Exp, Expr::Call(Func::Log, inner)) => return inner.as_ref().clone(),
        (Func::Log, Expr::Const(Constant::E)) => return Expr::int(1),
        (Func::Log, Expr::Call(Func::Exp, inner)) if inner.free_symbols().is_empty() => {
            return inner.as_ref().clone();
        }
        _ => {}
    }
    if matches!(func, Func::Sin | Func::Cos | Func::Tan) {
        if let Some(value) = multiple_of_pi(func, &arg) {
            return value;
        }
    }
    let (coeff, _) = split_coefficient(&arg);
    if coeff.is_negative() && (func.is_odd() || func.is_even()) {
        let flipped = fold_mul(vec![Expr::int(-1), arg]);
        let inner = Expr::call(func, flipped);
        return if func.is_odd() {
            fold_mul(vec![Expr::int(-1), inner])
        } else {
            inner
        };
    }
    Expr::call(func, arg)
}

fn exact_call(func: Func, arg: Number) -> Option<Expr> {
    if arg.is_zero() {
        return match func {
            Func::Sin | Func::Tan | Func::Asin | Func::Atan | Func::Sinh | Func::Tanh | Func::Abs => {
                Some(Expr::int(0))
            }
            Func::Cos | Func::Cosh | Func::Exp => Some(Expr::int(1)),
            Func::Acos => Some(Expr::Mul(vec![Expr::half(), Expr::Const(Constant::Pi)])),
            Func::Log => None,
        };
    }
    match func {
        Func::Log if arg.is_one() => Some(Expr::int(0)),
        Func::Abs => Some(Expr::Num(arg.abs())),
        _ => None,
    }
}

fn multiple_of_pi(func: Func, arg: &Expr) -> Option<Expr> {
    let n = match arg {
        Expr::Const(Constant::Pi) => 1,
        Expr::Mul(factors) if factors.len() == 2 && factors[1] == Expr::Const(Constant::Pi) => {
            factors[0].as_number()?.as_integer()?
        }
        _ => return None,
    };
    Some(match func {
        Func::Sin | Func::Tan => Expr::int(0),
        _ => Expr::int(if n % 2 == 0 { 1 } else { -1 }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::parse;

    fn canon(text: &str) -> String {
        parse(text).expect("parse").canonical().to_string()
    }

    #[test]
    fn like_terms_and_powers_collect() {
        assert_eq!(canon("x + x"), "2*x");
        assert_eq!(canon("x*x*x"), "x**3");
        assert_eq!(canon("2*x - 2*x"), "0");
        assert_eq!(canon("3*y*x + x*y"), "4*x*y");
    }

    #[test]
    fn numeric_powers_fold_to_radicals() {
        assert_eq!(canon("sqrt(8)"), "2*sqrt(2)");
        assert_eq!(canon("sqrt(-1)"), "I");
        assert_eq!(canon("sqrt(2)*sqrt(2)"), "2");
        assert_eq!(canon("I**2"), "-1");
        assert_eq!(canon("2**-1"), "1/2");
    }

    #[test]
    fn pythagorean_identity_collapses() {
        assert_eq!(canon("sin(x)**2 + cos(x)**2"), "1");
        assert_eq!(canon("3*sin(t)**2 + 3*cos(t)**2 + t"), "t + 3");
    }

    #[test]
    fn function_parity_and_special_values() {
        assert_eq!(canon("sin(-x)"), "-sin(x)");
        assert_eq!(canon("cos(-x)"), "cos(x)");
        assert_eq!(canon("cos(pi)"), "-1");
        assert_eq!(canon("exp(0) + log(1)"), "1");
        assert_eq!(canon("E**x"), "exp(x)");
    }

    #[test]
    fn substitution_renormalizes() {
        let expr = parse("x**2 + y").expect("parse").canonical();
        let out = expr.substitute("x", &Expr::int(3));
        assert_eq!(out.to_string(), "y + 9");
    }

    #[test]
    fn numeric_evaluation_rejects_unbound_symbols() {
        let expr = parse("x + y").expect("parse");
        let err = expr
            .eval_f64(&|name| (name == "x").then_some(1.0))
            .expect_err("y is unbound");
        assert!(err.to_string().contains("'y'"));
    }
}
