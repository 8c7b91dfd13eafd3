use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::expr::{Constant, Expr, fold_add, fold_call, fold_mul, fold_pow, sqrt_rational};
use super::number::{Number, Rational};
use super::parser::{parse, parse_equation};
use super::poly::{Poly, PolyContext, UniPoly, cancel, factor_univariate, numeric_roots};
use crate::error::{MathError, MathResult};

const EXPANSION_LIMIT: usize = 20_000;
const DEFAULT_MAX_DENOMINATOR: i128 = 1_000_000;

fn sum_parts(expr: Expr) -> Vec<Expr> {
    match expr {
        Expr::Add(terms) => terms,
        other => vec![other],
    }
}

fn distribute(lhs: &Expr, rhs: &Expr) -> MathResult<Expr> {
    let (left, right) = (sum_parts(lhs.clone()), sum_parts(rhs.clone()));
    if left.len() * right.len() > EXPANSION_LIMIT {
        return Err(MathError::unsupported("Expansion produces too many terms"));
    }
    let mut products = Vec::with_capacity(left.len() * right.len());
    for a in &left {
        for b in &right {
            products.push(fold_mul(vec![a.clone(), b.clone()]));
        }
    }
    Ok(fold_add(products))
}

/// Multiplies out products and integer powers of sums.
///
/// # Errors
/// Fails when the expansion would exceed the term limit.
pub fn expand(expr: &Expr) -> MathResult<Expr> {
    expand_inner(&expr.canonical())
}

fn expand_inner(expr: &Expr) -> MathResult<Expr> {
    Ok(match expr {
        Expr::Add(terms) => fold_add(terms.iter().map(expand_inner).collect::<MathResult<_>>()?),
        Expr::Mul(factors) => {
            let mut acc = Expr::int(1);
            for factor in factors {
                acc = distribute(&acc, &expand_inner(factor)?)?;
            }
            acc
        }
        Expr::Pow(base, exp) => {
            let base = expand_inner(base)?;
            match exp.as_number().and_then(Number::as_integer) {
                Some(n) if matches!(base, Expr::Add(_)) && (2..=64).contains(&n.abs()) => {
                    let mut acc = base.clone();
                    for _ in 1..n.abs() {
                        acc = distribute(&acc, &base)?;
                    }
                    if n < 0 {
                        fold_pow(acc, Expr::int(-1))
                    } else {
                        acc
                    }
                }
                _ => fold_pow(base, expand_inner(exp)?),
            }
        }
        Expr::Call(func, arg) => fold_call(*func, expand_inner(arg)?),
        other => other.clone(),
    })
}

/// Reduces a rational function to lowest terms.
#[must_use]
pub fn cancel_fraction(expr: &Expr) -> Expr {
    let mut ctx = PolyContext::default();
    let (num, den) = ctx.to_fraction(&expr.canonical());
    let (num, den) = cancel(&num, &den);
    let numerator = num.to_expr(&ctx);
    if den == Poly::one() {
        return numerator;
    }
    fold_mul(vec![numerator, fold_pow(den.to_expr(&ctx), Expr::int(-1))])
}

/// Picks the shortest of the normalized, cancelled, expanded, and factored
/// forms.
#[must_use]
pub fn simplify(expr: &Expr) -> Expr {
    let base = expr.canonical();
    let mut best = base.clone();
    let mut best_len = best.to_string().len();
    let candidates = [
        Some(cancel_fraction(&base)),
        expand(&base).ok(),
        factor(&base).ok(),
    ];
    for candidate in candidates.into_iter().flatten() {
        let len = candidate.to_string().len();
        if len < best_len {
            best_len = len;
            best = candidate;
        }
    }
    best
}

fn raised(base: Expr, exp: i128) -> Expr {
    if exp == 1 {
        base
    } else {
        Expr::pow(base, Expr::int(exp))
    }
}

/// Factors over the rationals. Sums of several variables only get their
/// common content, monomial, and difference-of-squares factors pulled out.
///
/// # Errors
/// Fails when exact arithmetic overflows.
pub fn factor(expr: &Expr) -> MathResult<Expr> {
    let base = expr.canonical();
    let mut ctx = PolyContext::default();
    let (num, den) = ctx.to_fraction(&base);
    let (num, den) = cancel(&num, &den);
    if !num.is_exact() || !den.is_exact() {
        return Ok(base);
    }
    let mut coeff = Rational::ONE;
    let mut factors = Vec::new();
    factor_poly(&num, &ctx, &mut coeff, &mut factors, 1)?;
    factor_poly(&den, &ctx, &mut coeff, &mut factors, -1)?;
    if factors.is_empty() {
        return Ok(Expr::rational(coeff));
    }
    if coeff == Rational::ONE && factors.len() == 1 {
        return Ok(factors.remove(0));
    }
    let mut out = Vec::with_capacity(factors.len() + 1);
    if coeff != Rational::ONE {
        out.push(Expr::rational(coeff));
    }
    out.extend(factors);
    Ok(Expr::Mul(out))
}

fn overflow() -> MathError {
    MathError::unsupported("Coefficients are too large to factor exactly")
}

fn factor_poly(
    poly: &Poly,
    ctx: &PolyContext,
    coeff: &mut Rational,
    out: &mut Vec<Expr>,
    sign: i128,
) -> MathResult<()> {
    let absorb = |coeff: &mut Rational, value: Rational| -> MathResult<()> {
        *coeff = if sign > 0 {
            coeff.checked_mul(value)
        } else {
            coeff.checked_div(value)
        }
        .ok_or_else(overflow)?;
        Ok(())
    };
    if let Some(c) = poly.as_constant() {
        let value = c.as_rational().ok_or_else(overflow)?;
        if !value.is_zero() {
            absorb(coeff, value)?;
        }
        return Ok(());
    }

    let content = poly.monomial_content();
    for (name, exp) in &content {
        out.push(raised(ctx.expr_of(name), sign * i128::from(*exp)));
    }
    let rest = poly.div_monomial(&content).ok_or_else(overflow)?;
    let vars = rest.vars();

    if vars.len() <= 1 {
        let Some(var) = vars.into_iter().next() else {
            if let Some(c) = rest.as_constant().and_then(Number::as_rational) {
                absorb(coeff, c)?;
            }
            return Ok(());
        };
        let uni = UniPoly::from_poly(&rest, &var).ok_or_else(overflow)?;
        let factored = factor_univariate(&uni).ok_or_else(overflow)?;
        absorb(coeff, factored.content)?;
        let var_expr = ctx.expr_of(&var);
        for (factor, multiplicity) in factored.factors {
            out.push(raised(factor.to_expr(&var_expr), sign * i128::from(multiplicity)));
        }
        return Ok(());
    }

    let (content, primitive) = numeric_content(&rest).ok_or_else(overflow)?;
    absorb(coeff, content)?;
    if let Some((minus, plus)) = difference_of_squares(&primitive) {
        factor_poly(&minus, ctx, coeff, out, sign)?;
        factor_poly(&plus, ctx, coeff, out, sign)?;
    } else {
        out.push(raised(primitive.to_expr(ctx), sign));
    }
    Ok(())
}

/// Rational content and the primitive remainder with a positive leading
/// coefficient.
fn numeric_content(poly: &Poly) -> Option<(Rational, Poly)> {
    let mut num_gcd: i128 = 0;
    let mut den_lcm: i128 = 1;
    for (_, c) in poly.terms() {
        let r = c.as_rational()?;
        num_gcd = gcd(num_gcd, r.numer());
        den_lcm = (den_lcm / gcd(den_lcm, r.denom())).checked_mul(r.denom())?;
    }
    let mut content = Rational::new(num_gcd, den_lcm)?;
    if poly.leading().is_some_and(|(_, c)| c.is_negative()) {
        content = content.checked_neg()?;
    }
    let inverse = Rational::ONE.checked_div(content)?;
    Some((content, poly.scale(Number::Exact(inverse))))
}

const fn gcd(mut a: i128, mut b: i128) -> i128 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// `A^2 - B^2` with monomial `A`, `B` splits into `(A - B, A + B)`.
fn difference_of_squares(poly: &Poly) -> Option<(Poly, Poly)> {
    if poly.term_count() != 2 {
        return None;
    }
    let mut positive = None;
    let mut negative = None;
    for (m, c) in poly.terms() {
        let r = c.as_rational()?;
        let root = r.abs().exact_sqrt()?;
        let mut halved = Poly::constant(Number::Exact(root));
        for (name, exp) in m {
            if exp % 2 != 0 {
                return None;
            }
            halved = halved.mul(&Poly::variable(name.clone()).pow(exp / 2));
        }
        if r.is_negative() {
            negative = Some(halved);
        } else {
            positive = Some(halved);
        }
    }
    let (a, b) = (positive?, negative?);
    Some((a.sub(&b), a.add(&b)))
}

/// A solution with a numeric position used for ordering.
struct Root {
    expr: Expr,
    position: Option<(f64, f64)>,
}

impl Root {
    fn exact(value: Rational) -> Self {
        Self {
            expr: Expr::rational(value),
            position: Some((value.to_f64(), 0.0)),
        }
    }

    fn numeric(re: f64, im: f64) -> Self {
        let expr = if im == 0.0 {
            Expr::Num(Number::Float(re))
        } else {
            let imag = fold_mul(vec![Expr::Num(Number::Float(im)), Expr::Const(Constant::I)]);
            if re == 0.0 {
                imag
            } else {
                fold_add(vec![Expr::Num(Number::Float(re)), imag])
            }
        };
        Self {
            expr,
            position: Some((re, im)),
        }
    }

    fn symbolic(expr: Expr) -> Self {
        Self {
            expr: simplify(&expr),
            position: None,
        }
    }
}

fn exact_quadratic(a: Rational, b: Rational, c: Rational) -> Option<Vec<Root>> {
    let four_ac = Rational::integer(4).checked_mul(a)?.checked_mul(c)?;
    let disc = b.checked_mul(b)?.checked_sub(four_ac)?;
    let two_a = Rational::integer(2).checked_mul(a)?;
    let center = b.checked_neg()?.checked_div(two_a)?;
    let scale = Rational::ONE.checked_div(two_a)?;
    if disc.is_zero() {
        return Some(vec![Root::exact(center)]);
    }
    let radical = sqrt_rational(disc);
    let spread = disc.abs().to_f64().sqrt() * scale.to_f64();
    let mut roots = Vec::with_capacity(2);
    for sign in [-1, 1] {
        let signed = scale.checked_mul(Rational::integer(sign))?;
        let expr = fold_add(vec![
            Expr::rational(center),
            fold_mul(vec![Expr::rational(signed), radical.clone()]),
        ]);
        let offset = spread * sign as f64;
        let position = if disc.is_negative() {
            (center.to_f64(), offset)
        } else {
            (center.to_f64() + offset, 0.0)
        };
        roots.push(Root {
            expr,
            position: Some(position),
        });
    }
    Some(roots)
}

fn numeric_polynomial_roots(coeffs: &[f64]) -> Vec<Root> {
    numeric_roots(coeffs)
        .into_iter()
        .map(|(re, im)| Root::numeric(re, im))
        .collect()
}

fn exact_roots(uni: &UniPoly) -> MathResult<Vec<Root>> {
    let factored = factor_univariate(uni).ok_or_else(overflow)?;
    let mut roots = Vec::new();
    for (factor, _) in factored.factors {
        let c = factor.coeffs();
        match factor.degree() {
            1 => {
                let value = c[0].checked_neg().and_then(|n| n.checked_div(c[1])).ok_or_else(overflow)?;
                roots.push(Root::exact(value));
            }
            2 => match exact_quadratic(c[2], c[1], c[0]) {
                Some(found) => roots.extend(found),
                None => roots.extend(numeric_polynomial_roots(
                    &c.iter().map(|r| r.to_f64()).collect::<Vec<_>>(),
                )),
            },
            _ => roots.extend(numeric_polynomial_roots(
                &c.iter().map(|r| r.to_f64()).collect::<Vec<_>>(),
            )),
        }
    }
    Ok(roots)
}

fn symbolic_roots(coeffs: &[Poly], ctx: &PolyContext, expr: &Expr, var: &str) -> MathResult<Vec<Root>> {
    let as_expr = |p: &Poly| p.to_expr(ctx);
    match coeffs.len() - 1 {
        1 => {
            let value = fold_mul(vec![
                Expr::int(-1),
                as_expr(&coeffs[0]),
                fold_pow(as_expr(&coeffs[1]), Expr::int(-1)),
            ]);
            Ok(vec![Root::symbolic(value)])
        }
        2 => {
            let (c, b, a) = (as_expr(&coeffs[0]), as_expr(&coeffs[1]), as_expr(&coeffs[2]));
            let disc = fold_add(vec![
                fold_pow(b.clone(), Expr::int(2)),
                fold_mul(vec![Expr::int(-4), a.clone(), c]),
            ]);
            let radical = fold_pow(expand(&disc)?, Expr::half());
            let denom = fold_pow(fold_mul(vec![Expr::int(2), a]), Expr::int(-1));
            Ok([-1, 1]
                .into_iter()
                .map(|sign| {
                    let numer = fold_add(vec![
                        fold_mul(vec![Expr::int(-1), b.clone()]),
                        fold_mul(vec![Expr::int(sign), radical.clone()]),
                    ]);
                    Root::symbolic(fold_mul(vec![numer, denom.clone()]))
                })
                .collect())
        }
        degree => Err(MathError::unsupported(format!(
            "Could not solve '{expr}' for {var}: degree {degree} with symbolic coefficients"
        ))),
    }
}

/// Solves `equation` (with or without `=`) for `var`.
///
/// Polynomial and rational equations are supported. Exact roots print in
/// closed form; roots of irreducible factors above degree two are numeric.
///
/// # Errors
/// Fails on parse errors and on equations that are not polynomial in `var`.
pub fn solve(equation: &str, var: &str) -> MathResult<Vec<String>> {
    let expr = parse_equation(equation)?.canonical();
    if !expr.contains_symbol(var) {
        return Ok(Vec::new());
    }
    let mut ctx = PolyContext::default();
    let (num, den) = ctx.to_fraction(&expr);
    let (num, den) = cancel(&num, &den);
    if ctx.var_hidden_in_atoms(var) {
        return Err(MathError::unsupported(format!(
            "Could not solve '{expr}' for {var}: equation is not polynomial in {var}"
        )));
    }
    let coeffs = num.coefficients_in(var);
    if coeffs.len() < 2 {
        return Ok(Vec::new());
    }
    let symbolic = coeffs.iter().any(|c| !c.vars().is_empty());
    let mut roots = if symbolic {
        symbolic_roots(&coeffs, &ctx, &expr, var)?
    } else if num.is_exact() {
        let uni = UniPoly::from_poly(&num, var).ok_or_else(overflow)?;
        exact_roots(&uni)?
    } else {
        let floats: Vec<f64> = coeffs
            .iter()
            .map(|c| c.as_constant().map_or(0.0, Number::to_f64))
            .collect();
        numeric_polynomial_roots(&floats)
    };

    let den_expr = den.to_expr(&ctx);
    roots.retain(|root| !den_expr.substitute(var, &root.expr).is_zero());
    roots.sort_by(|a, b| match (a.position, b.position) {
        (Some((ar, ai)), Some((br, bi))) => ar.total_cmp(&br).then(ai.total_cmp(&bi)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.expr.to_string().cmp(&b.expr.to_string()),
    });
    let mut seen = BTreeSet::new();
    Ok(roots
        .into_iter()
        .map(|root| root.expr.to_string())
        .filter(|text| seen.insert(text.clone()))
        .collect())
}

/// Substitutes numeric values and evaluates to a decimal.
///
/// # Errors
/// Fails on parse errors, unbound symbols, and non-real results.
pub fn evaluate(expression: &str, substitutions: &BTreeMap<String, f64>) -> MathResult<f64> {
    let mut expr = parse(expression)?.canonical();
    for (name, value) in substitutions {
        expr = expr.substitute_checked(name, &Expr::Num(Number::Float(*value)))?;
    }
    let unbound: Vec<String> = expr.free_symbols().into_iter().collect();
    if !unbound.is_empty() {
        return Err(MathError::evaluation(format!(
            "Cannot evaluate '{expr}': no value for {}",
            unbound.join(", ")
        )));
    }
    let value = expr.eval_f64(&|_| None)?;
    if !value.is_finite() {
        return Err(MathError::evaluation(format!("Expression '{expr}' is not finite")));
    }
    Ok(value)
}

/// Converts a decimal (or fraction, or constant expression) to `p/q`.
///
/// # Errors
/// Fails on unparseable input, non-numeric expressions, and a
/// non-positive `max_denominator`.
pub fn to_fraction(decimal: &str, max_denominator: Option<i64>) -> MathResult<String> {
    if let Some(max) = max_denominator {
        if max < 1 {
            return Err(MathError::invalid("max_denominator must be at least 1"));
        }
    }
    let limit = max_denominator.map(i128::from);
    let exact = match Rational::parse_decimal(decimal) {
        Some(value) => value,
        None => {
            let expr = parse(decimal)?.canonical();
            match expr.as_number() {
                Some(Number::Exact(value)) => value,
                _ => {
                    let value = expr.eval_f64(&|_| None)?;
                    Rational::from_f64(value, limit.unwrap_or(DEFAULT_MAX_DENOMINATOR))
                        .ok_or_else(|| MathError::evaluation(format!("'{decimal}' is not a finite number")))?
                }
            }
        }
    };
    let value = limit.map_or(exact, |max| exact.limit_denominator(max));
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(result: MathResult<Expr>) -> String {
        result.expect("ok").to_string()
    }

    fn p(text: &str) -> Expr {
        parse(text).expect("parse")
    }

    #[test]
    fn simplify_collects_and_cancels() {
        assert_eq!(simplify(&p("x + x")).to_string(), "2*x");
        assert_eq!(simplify(&p("sin(x)**2 + cos(x)**2")).to_string(), "1");
        assert_eq!(simplify(&p("(x**2 - 1)/(x - 1)")).to_string(), "x + 1");
        assert_eq!(simplify(&p("(x + 1)**2")).to_string(), "(x + 1)**2");
    }

    #[test]
    fn expand_distributes_products_and_powers() {
        assert_eq!(show(expand(&p("(a + b)*(a - b)"))), "a**2 - b**2");
        assert_eq!(show(expand(&p("(x + 1)**2"))), "x**2 + 2*x + 1");
        assert_eq!(show(expand(&p("x*(x + 2) - x**2"))), "2*x");
    }

    #[test]
    fn factor_over_rationals() {
        assert_eq!(show(factor(&p("x**2 - 4"))), "(x - 2)*(x + 2)");
        assert_eq!(show(factor(&p("x**2 + 2*x + 1"))), "(x + 1)**2");
        assert_eq!(show(factor(&p("2*x + 4"))), "2*(x + 2)");
        assert_eq!(show(factor(&p("x**3 - 4*x"))), "x*(x - 2)*(x + 2)");
        assert_eq!(show(factor(&p("a**2 - b**2"))), "(a - b)*(a + b)");
        assert_eq!(show(factor(&p("4 - x**2"))), "-(x - 2)*(x + 2)");
    }

    #[test]
    fn solve_polynomials_exactly() {
        assert_eq!(solve("x - 5", "x").expect("linear"), vec!["5"]);
        assert_eq!(solve("x**2 - 4", "x").expect("quadratic"), vec!["-2", "2"]);
        assert_eq!(solve("x**2 + 1", "x").expect("complex"), vec!["-I", "I"]);
        assert_eq!(solve("x**2 = 2", "x").expect("irrational"), vec!["-sqrt(2)", "sqrt(2)"]);
        assert_eq!(solve("2*x + 1 = 0", "x").expect("fraction"), vec!["-1/2"]);
    }

    #[test]
    fn solve_excludes_poles_and_handles_symbols() {
        assert_eq!(solve("(x**2 - 1)/(x - 1)", "x").expect("rational"), vec!["-1"]);
        assert_eq!(solve("a*x - b", "x").expect("symbolic"), vec!["b/a"]);
        assert!(solve("5", "x").expect("constant").is_empty());
        assert!(solve("sin(x) - 1", "x").is_err());
    }

    #[test]
    fn cubic_without_rational_roots_goes_numeric() {
        let roots = solve("x**3 - 2", "x").expect("cubic");
        assert_eq!(roots.len(), 3);
        let real: f64 = roots
            .iter()
            .find(|r| !r.contains('I'))
            .and_then(|r| r.parse().ok())
            .expect("one real root");
        assert!((real - 2f64.cbrt()).abs() < 1e-9);
    }

    #[test]
    fn evaluate_with_substitutions() {
        let mut subs = BTreeMap::new();
        assert_eq!(evaluate("2 + 2", &subs).expect("constant"), 4.0);
        assert!((evaluate("pi", &subs).expect("pi") - std::f64::consts::PI).abs() < 1e-12);
        subs.insert("x".to_string(), 3.0);
        assert_eq!(evaluate("x**2 + 1", &subs).expect("sub"), 10.0);
        assert!(evaluate("x + y", &subs).is_err());
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let mut subs = BTreeMap::new();
        for text in ["1/0", "0/0", "x/0"] {
            let err = evaluate(text, &subs).expect_err(text);
            assert_eq!(err, MathError::Evaluation("Division by zero".to_string()));
        }
        subs.insert("x".to_string(), 0.0);
        assert!(evaluate("1/x", &subs).is_err());
        assert!(parse("(x**2 - 4)/(x - x)").is_err());
    }

    #[test]
    fn fractions_from_decimals() {
        assert_eq!(to_fraction("0.5", None).expect("half"), "1/2");
        assert_eq!(to_fraction("1.25", None).expect("mixed"), "5/4");
        assert_eq!(to_fraction("0.333", None).expect("approx"), "333/1000");
        assert_eq!(to_fraction("0.333", Some(10)).expect("limited"), "1/3");
        assert_eq!(to_fraction("3.14159", Some(1000)).expect("pi"), "355/113");
        assert!(to_fraction("x", None).is_err());
    }

    #[test]
    fn cancel_reduces_fractions() {
        assert_eq!(cancel_fraction(&p("6/8")).to_string(), "3/4");
        assert_eq!(cancel_fraction(&p("(x**2 - 4)/(x - 2)")).to_string(), "x + 2");
        assert_eq!(cancel_fraction(&p("(2*x + 4)/(x + 2)")).to_string(), "2");
        assert_eq!(cancel_fraction(&p("(x + 1)/(x - 1)")).to_string(), "(x + 1)/(x - 1)");
    }
}
