use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MathError, MathResult};
use crate::format::float_repr;
use crate::symbolic::{CompiledExpr, Expr, differentiate, parse};

const BRACKET_XTOL: f64 = 2e-12;
const BRACKET_RTOL: f64 = 4.0 * f64::EPSILON;
const BRACKET_MAXITER: usize = 100;
const OPEN_TOL: f64 = 1.48e-8;
const OPEN_MAXITER: usize = 50;
const SCAN_RADIUS: f64 = 10.0;
const SCAN_STEP: f64 = 0.1;

/// Root-finding algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootMethod {
    Bisect,
    Brentq,
    Newton,
    Secant,
}

impl RootMethod {
    /// Resolves a method name. `auto` picks Brent's method when a bracket is
    /// supplied and Newton's method otherwise.
    ///
    /// # Errors
    /// Returns [`MathError::InvalidInput`] for unknown names.
    pub fn resolve(name: &str, has_bracket: bool) -> MathResult<Self> {
        if name == "auto" {
            return Ok(if has_bracket { Self::Brentq } else { Self::Newton });
        }
        match name.to_ascii_lowercase().as_str() {
            "bisect" | "bisection" => Ok(Self::Bisect),
            "brentq" => Ok(Self::Brentq),
            "newton" => Ok(Self::Newton),
            "secant" => Ok(Self::Secant),
            _ => Err(MathError::invalid(format!(
                "Unknown method '{name}'. Supported methods: newton, bisection (or bisect), brentq, secant"
            ))),
        }
    }
}

/// Outcome of a successful root search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootResult {
    pub root: f64,
    pub function_value: f64,
    pub iterations: usize,
    pub method: String,
    pub success: bool,
}

struct Function {
    compiled: CompiledExpr,
}

impl Function {
    fn new(expr: &Expr) -> MathResult<Self> {
        let compiled = CompiledExpr::compile(expr)?;
        let others: Vec<&str> = compiled
            .variables()
            .iter()
            .map(String::as_str)
            .filter(|name| *name != "x")
            .collect();
        if !others.is_empty() {
            return Err(MathError::invalid(format!(
                "Function must depend only on x; found: {}",
                others.join(", ")
            )));
        }
        Ok(Self { compiled })
    }

    fn at(&self, x: f64) -> MathResult<f64> {
        if self.compiled.variables().is_empty() {
            self.compiled.eval(&[])
        } else {
            self.compiled.eval(&[x])
        }
    }
}

fn scan_bracket(f: &Function, guess: f64) -> Option<(f64, f64)> {
    let start = guess - SCAN_RADIUS;
    let stop = guess + SCAN_RADIUS;
    let points: Vec<(f64, Option<f64>)> = (0..)
        .map(|i| (i as f64).mul_add(SCAN_STEP, start))
        .take_while(|x| *x < stop)
        .map(|x| (x, f.at(x).ok()))
        .collect();
    for (i, (a, fa)) in points.iter().enumerate() {
        let Some(fa) = fa else { continue };
        for (b, fb) in &points[i + 1..] {
            if fb.is_some_and(|fb| fa * fb < 0.0) {
                return Some((*a, *b));
            }
        }
    }
    None
}

struct Converged {
    root: f64,
    iterations: usize,
}

fn bisect(f: &Function, a: f64, b: f64, fa: f64, fb: f64) -> MathResult<Converged> {
    if fa == 0.0 {
        return Ok(Converged { root: a, iterations: 0 });
    }
    if fb == 0.0 {
        return Ok(Converged { root: b, iterations: 0 });
    }
    let mut xa = a;
    let mut dm = b - a;
    for iteration in 1..=BRACKET_MAXITER {
        dm *= 0.5;
        let xm = xa + dm;
        let fm = f.at(xm)?;
        if fm * fa >= 0.0 {
            xa = xm;
        }
        if fm == 0.0 || dm.abs() < BRACKET_RTOL.mul_add(xm.abs(), BRACKET_XTOL) {
            return Ok(Converged { root: xm, iterations: iteration });
        }
    }
    Err(MathError::Convergence("Root finding did not converge: convergence error".to_string()))
}

#[allow(clippy::many_single_char_names)]
fn brentq(f: &Function, a: f64, b: f64, fa: f64, fb: f64) -> MathResult<Converged> {
    let (mut xpre, mut xcur) = (a, b);
    let (mut fpre, mut fcur) = (fa, fb);
    let (mut xblk, mut fblk) = (0.0, 0.0);
    let (mut spre, mut scur) = (0.0, 0.0);
    if fpre == 0.0 {
        return Ok(Converged { root: xpre, iterations: 0 });
    }
    if fcur == 0.0 {
        return Ok(Converged { root: xcur, iterations: 0 });
    }
    for iteration in 1..=BRACKET_MAXITER {
        if fpre != 0.0 && fcur != 0.0 && fpre.is_sign_negative() != fcur.is_sign_negative() {
            xblk = xpre;
            fblk = fpre;
            spre = xcur - xpre;
            scur = spre;
        }
        if fblk.abs() < fcur.abs() {
            xpre = xcur;
            xcur = xblk;
            xblk = xpre;
            fpre = fcur;
            fcur = fblk;
            fblk = fpre;
        }
        let delta = BRACKET_RTOL.mul_add(xcur.abs(), BRACKET_XTOL) / 2.0;
        let sbis = (xblk - xcur) / 2.0;
        if fcur == 0.0 || sbis.abs() < delta {
            return Ok(Converged { root: xcur, iterations: iteration });
        }
        if spre.abs() > delta && fcur.abs() < fpre.abs() {
            let stry = if xpre == xblk {
                -fcur * (xcur - xpre) / (fcur - fpre)
            } else {
                let dpre = (fpre - fcur) / (xpre - xcur);
                let dblk = (fblk - fcur) / (xblk - xcur);
                -fcur * (fblk * dblk - fpre * dpre) / (dblk * dpre * (fblk - fpre))
            };
            if 2.0 * stry.abs() < spre.abs().min(3.0f64.mul_add(sbis.abs(), -delta)) {
                spre = scur;
                scur = stry;
            } else {
                spre = sbis;
                scur = sbis;
            }
        } else {
            spre = sbis;
            scur = sbis;
        }
        xpre = xcur;
        fpre = fcur;
        if scur.abs() > delta {
            xcur += scur;
        } else {
            xcur += if sbis > 0.0 { delta } else { -delta };
        }
        fcur = f.at(xcur)?;
    }
    Err(MathError::Convergence("Root finding did not converge: convergence error".to_string()))
}

fn not_converged(iterations: usize, value: f64) -> String {
    format!(
        "Failed to converge after {iterations} iterations, value is {}.",
        float_repr(value)
    )
}

fn newton(f: &Function, fprime: &Function, x0: f64) -> Result<Converged, String> {
    let mut p0 = x0;
    let mut p = x0;
    for iteration in 0..OPEN_MAXITER {
        let fval = f.at(p0).map_err(|e| e.to_string())?;
        if fval == 0.0 {
            return Ok(Converged { root: p0, iterations: iteration });
        }
        let fder = fprime.at(p0).map_err(|e| e.to_string())?;
        if fder == 0.0 {
            return Err(format!("Derivative was zero. {}", not_converged(iteration + 1, p0)));
        }
        p = p0 - fval / fder;
        if (p - p0).abs() < OPEN_TOL {
            return Ok(Converged { root: p, iterations: iteration + 1 });
        }
        p0 = p;
    }
    Err(not_converged(OPEN_MAXITER, p))
}

fn secant(f: &Function, x0: f64, x1: f64) -> Result<Converged, String> {
    let eval = |x: f64| f.at(x).map_err(|e| e.to_string());
    let (mut p0, mut p1) = (x0, x1);
    let (mut q0, mut q1) = (eval(p0)?, eval(p1)?);
    if q1.abs() < q0.abs() {
        std::mem::swap(&mut p0, &mut p1);
        std::mem::swap(&mut q0, &mut q1);
    }
    let mut p = p1;
    for iteration in 0..OPEN_MAXITER {
        if q1 == q0 {
            if p1 != p0 {
                return Err(format!(
                    "Tolerance of {} reached. {}",
                    float_repr(p1 - p0),
                    not_converged(iteration + 1, p1)
                ));
            }
            return Ok(Converged { root: (p1 + p0) / 2.0, iterations: iteration + 1 });
        }
        p = if q1.abs() > q0.abs() {
            (-q0 / q1).mul_add(p1, p0) / (1.0 - q0 / q1)
        } else {
            (-q1 / q0).mul_add(p0, p1) / (1.0 - q1 / q0)
        };
        if (p - p1).abs() < OPEN_TOL {
            return Ok(Converged { root: p, iterations: iteration + 1 });
        }
        p0 = p1;
        q0 = q1;
        p1 = p;
        q1 = eval(p1)?;
    }
    Err(not_converged(OPEN_MAXITER, p))
}

fn bracket_pair(bracket: &[f64]) -> MathResult<(f64, f64)> {
    match bracket {
        &[a, b] => Ok((a, b)),
        _ => Err(MathError::invalid("bracket must be a list of two numbers [a, b]")),
    }
}

fn finish(f: &Function, found: Converged, method: &str) -> MathResult<RootResult> {
    let function_value = f.at(found.root)?;
    debug!(root = found.root, iterations = found.iterations, method, "root found");
    Ok(RootResult {
        root: found.root,
        function_value,
        iterations: found.iterations,
        method: method.to_string(),
        success: true,
    })
}

/// Finds a zero of `function` (an expression in `x`).
///
/// Bracketing methods without a `bracket` scan `[guess - 10, guess + 10)` in
/// steps of `0.1` for a sign change. Newton's method uses the symbolic
/// derivative; the secant method starts from `guess` and `guess + 0.1`
/// unless a bracket supplies both points.
///
/// # Errors
/// Parse failures, unknown methods, missing or invalid brackets, and
/// non-convergence are all reported as [`MathError`] values with
/// user-facing messages.
pub fn find_root(function: &str, initial_guess: f64, bracket: Option<&[f64]>, method: &str) -> MathResult<RootResult> {
    let expr = parse(function).map_err(|err| match err {
        MathError::Parse(message) => {
            MathError::invalid(format!("Could not parse function expression: {message}"))
        }
        other => other,
    })?;
    let f = Function::new(&expr)?;
    let resolved = RootMethod::resolve(method, bracket.is_some())?;
    let label = if method == "auto" {
        match resolved {
            RootMethod::Brentq => "brentq".to_string(),
            _ => "newton".to_string(),
        }
    } else {
        method.to_ascii_lowercase()
    };

    match resolved {
        RootMethod::Bisect | RootMethod::Brentq => {
            let (a, b) = match bracket {
                Some(bracket) => bracket_pair(bracket)?,
                None => scan_bracket(&f, initial_guess).ok_or_else(|| {
                    MathError::invalid(
                        "Could not find a bracket (interval where function changes sign). Please provide a bracket parameter.",
                    )
                })?,
            };
            let (fa, fb) = match (f.at(a), f.at(b)) {
                (Ok(fa), Ok(fb)) => (fa, fb),
                (Err(err), _) | (_, Err(err)) => {
                    return Err(MathError::evaluation(format!(
                        "Could not evaluate function at bracket endpoints: {err}"
                    )));
                }
            };
            if fa * fb > 0.0 {
                return Err(MathError::invalid(format!(
                    "Function must have opposite signs at bracket endpoints. f({})={}, f({})={}",
                    float_repr(a),
                    float_repr(fa),
                    float_repr(b),
                    float_repr(fb)
                )));
            }
            let outcome = if resolved == RootMethod::Bisect {
                bisect(&f, a, b, fa, fb)
            } else {
                brentq(&f, a, b, fa, fb)
            };
            let found = outcome.map_err(|err| match err {
                MathError::Convergence(_) => err,
                other => MathError::Convergence(format!("Root finding failed: {other}")),
            })?;
            finish(&f, found, &label)
        }
        RootMethod::Newton => {
            let fprime = Function::new(&differentiate(&expr, "x")).map_err(|err| {
                MathError::evaluation(format!(
                    "Could not compute derivative for Newton method: {err}"
                ))
            })?;
            let found = newton(&f, &fprime, initial_guess)
                .map_err(|msg| MathError::Convergence(format!("Newton method failed: {msg}")))?;
            finish(&f, found, "newton")
        }
        RootMethod::Secant => {
            let (x0, x1) = match bracket {
                Some(bracket) => bracket_pair(bracket)?,
                None => (initial_guess, initial_guess + 0.1),
            };
            let found = secant(&f, x0, x1)
                .map_err(|msg| MathError::Convergence(format!("Secant method failed: {msg}")))?;
            finish(&f, found, "secant")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brentq_with_bracket() {
        let result = find_root("x^2 - 4", 1.0, Some(&[0.0, 3.0]), "brentq").expect("root");
        assert!(result.success);
        assert!((result.root - 2.0).abs() < 1e-9);
        assert!(result.function_value.abs() < 1e-6);
        assert_eq!(result.method, "brentq");
        assert!(result.iterations > 0);
    }

    #[test]
    fn bisection_keeps_the_requested_label() {
        let result = find_root("sin(x) - 0.5", 0.5, Some(&[0.0, 2.0]), "bisection").expect("root");
        assert!((result.root - std::f64::consts::FRAC_PI_6).abs() < 1e-9);
        assert!(result.function_value.abs() < 1e-6);
        assert_eq!(result.method, "bisection");
    }

    #[test]
    fn newton_uses_the_symbolic_derivative() {
        let result = find_root("x^2 - 4", 1.5, None, "newton").expect("root");
        assert!((result.root - 2.0).abs() < 1e-9);
        assert_eq!(result.method, "newton");
        let exp = find_root("exp(x) - 2", 0.5, None, "auto").expect("root");
        assert!((exp.root - 2f64.ln()).abs() < 1e-9);
        assert_eq!(exp.method, "newton");
    }

    #[test]
    fn auto_prefers_brentq_with_a_bracket() {
        let result = find_root("x^3 - 8", 1.0, Some(&[0.0, 3.0]), "auto").expect("root");
        assert!((result.root - 2.0).abs() < 1e-9);
        assert_eq!(result.method, "brentq");
    }

    #[test]
    fn secant_and_scanned_brackets() {
        let secant = find_root("x^3 - 2*x - 5", 2.0, None, "secant").expect("root");
        assert!((secant.root - 2.094_551_481_542_327).abs() < 1e-8);
        let scanned = find_root("x - 3.05", 0.0, None, "brentq").expect("root");
        assert!((scanned.root - 3.05).abs() < 1e-9);
    }

    #[test]
    fn reports_bad_brackets_and_methods() {
        let err = find_root("x^2 - 4", 1.0, Some(&[1.0, 1.5]), "brentq").expect_err("same sign");
        assert_eq!(
            err.to_string(),
            "Function must have opposite signs at bracket endpoints. f(1.0)=-3.0, f(1.5)=-1.75"
        );
        let err = find_root("x", 0.0, None, "halley").expect_err("unknown");
        assert!(err.to_string().starts_with("Unknown method 'halley'"));
        let err = find_root("x^2 + 1", 0.0, None, "bisect").expect_err("no sign change");
        assert!(err.to_string().starts_with("Could not find a bracket"));
        let err = find_root("x + y", 0.0, Some(&[0.0, 1.0]), "brentq").expect_err("extra symbol");
        assert!(err.to_string().contains("only on x"));
        let err = find_root("x^2 + 1", 0.0, None, "newton").expect_err("zero derivative");
        assert!(err.to_string().starts_with("Newton method failed: Derivative was zero."));
    }
}
