use super::expr::{Constant, Expr, Func, fold_add, fold_mul};
use super::number::{Number, Rational};
use super::poly::PolyContext;
use crate::error::{MathError, MathResult};

fn minus_one() -> Expr {
    Expr::Num(Number::MINUS_ONE)
}

/// Derivative with respect to `var`, normalized.
#[must_use]
pub fn differentiate(expr: &Expr, var: &str) -> Expr {
    raw_derivative(&expr.canonical(), var).canonical()
}

fn raw_derivative(expr: &Expr, var: &str) -> Expr {
    if !expr.contains_symbol(var) {
        return Expr::int(0);
    }
    match expr {
        Expr::Sym(_) => Expr::int(1),
        Expr::Num(_) | Expr::Const(_) => Expr::int(0),
        Expr::Add(terms) => Expr::Add(terms.iter().map(|t| raw_derivative(t, var)).collect()),
        Expr::Mul(factors) => {
            let mut terms = Vec::with_capacity(factors.len());
            for (idx, factor) in factors.iter().enumerate() {
                if !factor.contains_symbol(var) {
                    continue;
                }
                let mut product: Vec<Expr> = factors
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != idx)
                    .map(|(_, f)| f.clone())
                    .collect();
                product.push(raw_derivative(factor, var));
                terms.push(Expr::Mul(product));
            }
            Expr::Add(terms)
        }
        Expr::Pow(base, exp) => {
            if !exp.contains_symbol(var) {
                // d(u^n) = n u^(n-1) u'
                Expr::Mul(vec![
                    exp.as_ref().clone(),
                    Expr::pow(base.as_ref().clone(), Expr::Add(vec![exp.as_ref().clone(), minus_one()])),
                    raw_derivative(base, var),
                ])
            } else {
                // d(u^v) = u^v (v' log u + v u'/u)
                Expr::Mul(vec![
                    expr.clone(),
                    Expr::Add(vec![
                        Expr::Mul(vec![
                            raw_derivative(exp, var),
                            Expr::call(Func::Log, base.as_ref().clone()),
                        ]),
                        Expr::Mul(vec![
                            exp.as_ref().clone(),
                            raw_derivative(base, var),
                            Expr::pow(base.as_ref().clone(), minus_one()),
                        ]),
                    ]),
                ])
            }
        }
        Expr::Call(func, arg) => {
            let inner = raw_derivative(arg, var);
            let u = arg.as_ref().clone();
            let outer = match func {
                Func::Sin => Expr::call(Func::Cos, u),
                Func::Cos => Expr::neg(Expr::call(Func::Sin, u)),
                Func::Tan => Expr::Add(vec![
                    Expr::pow(Expr::call(Func::Tan, u), Expr::int(2)),
                    Expr::int(1),
                ]),
                Func::Asin => Expr::pow(one_minus_square(u), Expr::Num(Number::Exact(neg_half()))),
                Func::Acos => Expr::neg(Expr::pow(one_minus_square(u), Expr::Num(Number::Exact(neg_half())))),
                Func::Atan => Expr::pow(
                    Expr::Add(vec![Expr::pow(u, Expr::int(2)), Expr::int(1)]),
                    minus_one(),
                ),
                Func::Sinh => Expr::call(Func::Cosh, u),
                Func::Cosh => Expr::call(Func::Sinh, u),
                Func::Tanh => Expr::Add(vec![
                    Expr::int(1),
                    Expr::neg(Expr::pow(Expr::call(Func::Tanh, u), Expr::int(2))),
                ]),
                Func::Exp => Expr::call(Func::Exp, u),
                Func::Log => Expr::pow(u, minus_one()),
                Func::Abs => Expr::Mul(vec![
                    u.clone(),
                    Expr::pow(Expr::call(Func::Abs, u), minus_one()),
                ]),
            };
            Expr::Mul(vec![outer, inner])
        }
    }
}

fn neg_half() -> Rational {
    Rational::new(-1, 2).unwrap_or(Rational::ONE)
}

fn one_minus_square(u: Expr) -> Expr {
    Expr::Add(vec![Expr::int(1), Expr::neg(Expr::pow(u, Expr::int(2)))])
}

/// Distinct derivatives computed before an order is given up on.
const MAX_DERIVATIVE_STEPS: usize = 128;

/// `n`-th derivative. Stops as soon as the result is zero or repeats an
/// earlier derivative, so `sin(x)` and polynomials take any order.
///
/// # Errors
/// Returns [`MathError::Unsupported`] when the order needs more than
/// [`MAX_DERIVATIVE_STEPS`] distinct derivatives.
pub fn differentiate_n(expr: &Expr, var: &str, order: u32) -> MathResult<Expr> {
    let order = order as usize;
    let mut seen = vec![expr.canonical()];
    while seen.len() <= order {
        let last = &seen[seen.len() - 1];
        if last.is_zero() {
            return Ok(Expr::int(0));
        }
        let next = differentiate(last, var);
        if let Some(start) = seen.iter().position(|earlier| *earlier == next) {
            let period = seen.len() - start;
            return Ok(seen[start + (order - start) % period].clone());
        }
        if seen.len() >= MAX_DERIVATIVE_STEPS {
            return Err(MathError::unsupported(format!(
                "Derivative of order {order} is too large to compute"
            )));
        }
        seen.push(next);
    }
    Ok(seen.swap_remove(order))
}

/// Antiderivative without the constant of integration.
///
/// # Errors
/// Returns [`MathError::Unsupported`] when no rule applies.
pub fn integrate(expr: &Expr, var: &str) -> MathResult<Expr> {
    let expr = expr.canonical();
    antiderivative(&expr, var)
        .map(|e| e.canonical())
        .ok_or_else(|| {
            MathError::unsupported(format!(
                "Could not compute integral of '{expr}' with respect to {var}"
            ))
        })
}

fn antiderivative(expr: &Expr, var: &str) -> Option<Expr> {
    if !expr.contains_symbol(var) {
        return Some(fold_mul(vec![expr.clone(), Expr::symbol(var)]));
    }
    let x = Expr::symbol(var);
    match expr {
        Expr::Sym(_) => Some(fold_mul(vec![Expr::half(), Expr::pow(x, Expr::int(2))])),
        Expr::Add(terms) => {
            let parts = terms
                .iter()
                .map(|t| antiderivative(t, var))
                .collect::<Option<Vec<_>>>()?;
            Some(fold_add(parts))
        }
        Expr::Mul(factors) => {
            let (constant, dependent): (Vec<Expr>, Vec<Expr>) =
                factors.iter().cloned().partition(|f| !f.contains_symbol(var));
            if !constant.is_empty() {
                let inner = fold_mul(dependent);
                let integrated = antiderivative(&inner, var)?;
                let mut product = constant;
                product.push(integrated);
                return Some(fold_mul(product));
            }
            polynomial_antiderivative(expr, var)
        }
        Expr::Pow(base, exp) => {
            if let (Some((a, _)), false) = (linear_parts(base, var), exp.contains_symbol(var)) {
                if exp.as_number().is_some_and(|n| n.sub(Number::MINUS_ONE).is_zero()) {
                    return Some(fold_mul(vec![
                        Expr::call(Func::Log, base.as_ref().clone()),
                        Expr::pow(a, minus_one()),
                    ]));
                }
                let raised = fold_add(vec![exp.as_ref().clone(), Expr::int(1)]);
                return Some(fold_mul(vec![
                    Expr::pow(base.as_ref().clone(), raised.clone()),
                    Expr::pow(fold_mul(vec![raised, a]), minus_one()),
                ]));
            }
            if base.as_ref() == &Expr::Const(Constant::E) {
                let (a, _) = linear_parts(exp, var)?;
                return Some(fold_mul(vec![expr.clone(), Expr::pow(a, minus_one())]));
            }
            polynomial_antiderivative(expr, var)
        }
        Expr::Call(func, arg) => {
            let (a, _) = linear_parts(arg, var)?;
            let u = arg.as_ref().clone();
            let primitive = match func {
                Func::Sin => Expr::neg(Expr::call(Func::Cos, u)),
                Func::Cos => Expr::call(Func::Sin, u),
                Func::Exp => Expr::call(Func::Exp, u),
                Func::Sinh => Expr::call(Func::Cosh, u),
                Func::Cosh => Expr::call(Func::Sinh, u),
                Func::Tan => Expr::neg(Expr::call(Func::Log, Expr::call(Func::Cos, u))),
                Func::Log => Expr::Add(vec![
                    Expr::Mul(vec![u.clone(), Expr::call(Func::Log, u.clone())]),
                    Expr::neg(u),
                ]),
                _ => return None,
            };
            Some(fold_mul(vec![primitive, Expr::pow(a, minus_one())]))
        }
        Expr::Num(_) | Expr::Const(_) => None,
    }
}

/// `(a, b)` such that `expr == a*var + b` with `a` free of `var` and nonzero.
fn linear_parts(expr: &Expr, var: &str) -> Option<(Expr, Expr)> {
    let slope = differentiate(expr, var);
    if slope.contains_symbol(var) || slope.is_zero() {
        return None;
    }
    let offset = fold_add(vec![
        expr.clone(),
        fold_mul(vec![minus_one(), slope.clone(), Expr::symbol(var)]),
    ]);
    Some((slope, offset))
}

fn polynomial_antiderivative(expr: &Expr, var: &str) -> Option<Expr> {
    let mut ctx = PolyContext::default();
    let poly = ctx.to_poly(expr)?;
    if ctx.var_hidden_in_atoms(var) {
        return None;
    }
    let x = Expr::symbol(var);
    let terms = poly
        .coefficients_in(var)
        .into_iter()
        .enumerate()
        .map(|(power, coeff)| {
            let raised = power as i128 + 1;
            fold_mul(vec![
                coeff.to_expr(&ctx),
                Expr::rational(Rational::new(1, raised).unwrap_or(Rational::ONE)),
                Expr::pow(x.clone(), Expr::int(raised)),
            ])
        })
        .collect();
    Some(fold_add(terms))
}

/// Definite integral. Falls back to adaptive Simpson quadrature when no
/// antiderivative is found.
///
/// # Errors
/// Fails when the bounds or integrand cannot be evaluated.
pub fn integrate_definite(expr: &Expr, var: &str, lower: &Expr, upper: &Expr) -> MathResult<Expr> {
    if let Ok(primitive) = integrate(expr, var) {
        let at_upper = primitive.substitute(var, upper);
        let at_lower = primitive.substitute(var, lower);
        let value = Expr::sub(at_upper, at_lower).canonical();
        if !value.contains_imaginary() {
            return Ok(value);
        }
    }
    let lookup = |_: &str| None;
    let a = lower.canonical().eval_f64(&lookup)?;
    let b = upper.canonical().eval_f64(&lookup)?;
    let integrand = expr.canonical();
    let extra: Vec<String> = integrand
        .free_symbols()
        .into_iter()
        .filter(|s| s != var)
        .collect();
    if !extra.is_empty() {
        return Err(MathError::unsupported(format!(
            "Could not compute integral of '{integrand}' with respect to {var}"
        )));
    }
    let f = |t: f64| integrand.eval_f64(&|name| (name == var).then_some(t));
    let value = adaptive_simpson(&f, a, b, 1e-10, 40)?;
    Ok(Expr::Num(Number::Float(value)))
}

fn adaptive_simpson(f: &dyn Fn(f64) -> MathResult<f64>, a: f64, b: f64, tol: f64, depth: u32) -> MathResult<f64> {
    let m = (a + b) / 2.0;
    let (fa, fm, fb) = (f(a)?, f(m)?, f(b)?);
    let whole = (b - a) / 6.0 * (fa + 4.0 * fm + fb);
    simpson_step(f, a, b, fa, fm, fb, whole, tol, depth)
}

#[allow(clippy::too_many_arguments)]
fn simpson_step(
    f: &dyn Fn(f64) -> MathResult<f64>,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tol: f64,
    depth: u32,
) -> MathResult<f64> {
    let m = (a + b) / 2.0;
    let (lm, rm) = ((a + m) / 2.0, (m + b) / 2.0);
    let (flm, frm) = (f(lm)?, f(rm)?);
    let left = (m - a) / 6.0 * (fa + 4.0 * flm + fm);
    let right = (b - m) / 6.0 * (fm + 4.0 * frm + fb);
    let delta = left + right - whole;
    if depth == 0 || delta.abs() <= 15.0 * tol {
        return Ok(left + right + delta / 15.0);
    }
    Ok(simpson_step(f, a, m, fa, flm, fm, left, tol / 2.0, depth - 1)?
        + simpson_step(f, m, b, fm, frm, fb, right, tol / 2.0, depth - 1)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::parse;

    fn d(text: &str) -> String {
        differentiate(&parse(text).expect("parse"), "x").to_string()
    }

    fn int(text: &str) -> String {
        integrate(&parse(text).expect("parse"), "x").expect("integrable").to_string()
    }

    #[test]
    fn chain_rule_through_functions() {
        assert_eq!(d("sin(x**2)"), "2*x*cos(x**2)");
        assert_eq!(d("x**3"), "3*x**2");
        assert_eq!(d("exp(2*x)"), "2*exp(2*x)");
        assert_eq!(d("log(x)"), "1/x");
        assert_eq!(d("y*x"), "y");
    }

    #[test]
    fn higher_order_derivatives_repeat() {
        let expr = parse("x**4").expect("parse");
        let nth = |order| differentiate_n(&expr, "x", order).expect("derivative").to_string();
        assert_eq!(nth(0), "x**4");
        assert_eq!(nth(2), "12*x**2");
        assert_eq!(nth(5), "0");
        assert_eq!(nth(u32::MAX), "0");
    }

    #[test]
    fn periodic_derivatives_skip_ahead() {
        let sin = parse("sin(x)").expect("parse");
        let nth = |order| differentiate_n(&sin, "x", order).expect("derivative").to_string();
        assert_eq!(nth(4_000_000_000), "sin(x)");
        assert_eq!(nth(4_000_000_001), "cos(x)");
        assert_eq!(nth(6), "-sin(x)");
        let exp = parse("exp(2*x)").expect("parse");
        assert_eq!(differentiate_n(&exp, "x", 1).expect("first").to_string(), "2*exp(2*x)");
    }

    #[test]
    fn unbounded_orders_are_refused() {
        let root = parse("sqrt(x)").expect("parse");
        let err = differentiate_n(&root, "x", 1_000_000).expect_err("never settles");
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn power_and_elementary_antiderivatives() {
        assert_eq!(int("x**2"), "x**3/3");
        assert_eq!(int("cos(x)"), "sin(x)");
        assert_eq!(int("1/x"), "log(x)");
        assert_eq!(int("3"), "3*x");
        assert_eq!(int("exp(2*x)"), "exp(2*x)/2");
    }

    #[test]
    fn polynomial_products_integrate_after_expansion() {
        assert_eq!(int("x*(x + 1)"), "x**3/3 + x**2/2");
    }

    #[test]
    fn unsupported_integrands_report_error() {
        let err = integrate(&parse("exp(x**2)").expect("parse"), "x").expect_err("no closed form");
        assert!(err.to_string().starts_with("Could not compute integral"));
    }

    #[test]
    fn definite_integrals_substitute_bounds() {
        let expr = parse("x**2").expect("parse");
        let value = integrate_definite(&expr, "x", &Expr::int(0), &Expr::int(3)).expect("definite");
        assert_eq!(value.to_string(), "9");
    }

    #[test]
    fn definite_integrals_fall_back_to_quadrature() {
        let expr = parse("exp(-x**2)").expect("parse");
        let value = integrate_definite(&expr, "x", &Expr::int(0), &Expr::int(1)).expect("numeric");
        let Expr::Num(n) = value else {
            panic!("expected a number");
        };
        assert!((n.to_f64() - 0.746_824_132_812_427).abs() < 1e-8);
    }
}
