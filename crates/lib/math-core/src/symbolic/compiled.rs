use std::fmt::{self, Write as _};

use exmex::{Express, FlatEx};

use super::expr::{Constant, Expr, Func};
use super::number::Number;
use crate::error::{MathError, MathResult};

/// An expression lowered to a flat `exmex` evaluator for repeated numeric
/// evaluation (ODE right-hand sides, root finding).
///
/// Free symbols are renamed to positional slots, so any symbol the parser
/// accepts can be bound regardless of what `exmex` would read as a name.
#[derive(Clone)]
pub struct CompiledExpr {
    flat: FlatEx<f64>,
    variables: Vec<String>,
    slots: Vec<usize>,
    source: String,
}

impl fmt::Debug for CompiledExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpr")
            .field("source", &self.source)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}

fn slot_name(idx: usize) -> String {
    format!("v{idx:04}")
}

fn literal(out: &mut String, value: f64) -> MathResult<()> {
    if !value.is_finite() {
        return Err(MathError::unsupported(format!("Cannot evaluate non-finite constant {value}")));
    }
    let text = format!("{:?}", value.abs());
    let body = match text.split_once('e') {
        Some((mantissa, exponent)) => format!("({mantissa}*10^({exponent}))"),
        None => text,
    };
    if value.is_sign_negative() && value != 0.0 {
        let _ = write!(out, "(-{body})");
    } else {
        out.push_str(&body);
    }
    Ok(())
}

fn number(out: &mut String, n: Number) -> MathResult<()> {
    match n {
        Number::Exact(r) if r.is_integer() => {
            if r.is_negative() {
                let _ = write!(out, "(-{})", r.numer().unsigned_abs());
            } else {
                let _ = write!(out, "{}", r.numer());
            }
            Ok(())
        }
        Number::Exact(r) => {
            let sign = if r.is_negative() { "-" } else { "" };
            let _ = write!(out, "({sign}{}/{})", r.numer().unsigned_abs(), r.denom());
            Ok(())
        }
        Number::Float(value) => literal(out, value),
    }
}

const fn function_name(func: Func) -> &'static str {
    match func {
        Func::Log => "ln",
        Func::Abs => "abs",
        other => other.name(),
    }
}

fn lower(out: &mut String, expr: &Expr, variables: &[String]) -> MathResult<()> {
    match expr {
        Expr::Num(n) => number(out, *n)?,
        Expr::Sym(name) => {
            let idx = variables
                .iter()
                .position(|v| v == name)
                .ok_or_else(|| MathError::evaluation(format!("Unbound symbol '{name}'")))?;
            out.push_str(&slot_name(idx));
        }
        Expr::Const(Constant::Pi) => literal(out, std::f64::consts::PI)?,
        Expr::Const(Constant::E) => literal(out, std::f64::consts::E)?,
        Expr::Const(Constant::I) => {
            return Err(MathError::evaluation("Expression has an imaginary value"));
        }
        Expr::Add(items) | Expr::Mul(items) => {
            let op = if matches!(expr, Expr::Add(_)) { "+" } else { "*" };
            out.push('(');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push_str(op);
                }
                lower(out, item, variables)?;
            }
            out.push(')');
        }
        Expr::Pow(base, exp) => {
            out.push('(');
            lower(out, base, variables)?;
            out.push_str(")^(");
            lower(out, exp, variables)?;
            out.push(')');
        }
        Expr::Call(func, arg) => {
            out.push_str(function_name(*func));
            out.push('(');
            lower(out, arg, variables)?;
            out.push(')');
        }
    }
    Ok(())
}

impl CompiledExpr {
    /// Lowers `expr` with its free symbols, sorted by name, as parameters.
    ///
    /// # Errors
    /// Fails for imaginary or non-finite constants, or if `exmex` rejects
    /// the lowered text.
    pub fn compile(expr: &Expr) -> MathResult<Self> {
        let canonical = expr.canonical();
        let variables: Vec<String> = canonical.free_symbols().into_iter().collect();
        let mut text = String::new();
        lower(&mut text, &canonical, &variables)?;
        let flat = exmex::parse::<f64>(&text)?;
        let slots = flat
            .var_names()
            .iter()
            .map(|name| {
                name.strip_prefix('v')
                    .and_then(|digits| digits.parse::<usize>().ok())
                    .filter(|idx| *idx < variables.len())
                    .ok_or_else(|| MathError::evaluation(format!("Unexpected parameter '{name}'")))
            })
            .collect::<MathResult<Vec<_>>>()?;
        Ok(Self {
            flat,
            variables,
            slots,
            source: canonical.to_string(),
        })
    }

    /// Free symbols in parameter order.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Evaluates with `args[i]` bound to `variables()[i]`.
    ///
    /// # Errors
    /// Returns [`MathError::InvalidInput`] on an arity mismatch and
    /// [`MathError::Evaluation`] when the result is not a real number.
    pub fn eval(&self, args: &[f64]) -> MathResult<f64> {
        if args.len() != self.variables.len() {
            return Err(MathError::invalid(format!(
                "Expected {} argument(s), got {}",
                self.variables.len(),
                args.len()
            )));
        }
        let ordered: Vec<f64> = self.slots.iter().map(|&idx| args[idx]).collect();
        let value = self.flat.eval(&ordered)?;
        if value.is_nan() {
            return Err(MathError::evaluation(format!(
                "Expression '{}' is not a real number",
                self.source
            )));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::parse;

    fn compile(text: &str) -> CompiledExpr {
        CompiledExpr::compile(&parse(text).expect("parse")).expect("compile")
    }

    #[test]
    fn evaluates_polynomials_with_sorted_parameters() {
        let f = compile("y**2 - 3*x + 1/2");
        assert_eq!(f.variables(), ["x", "y"]);
        let value = f.eval(&[1.0, 2.0]).expect("eval");
        assert!((value - 1.5).abs() < 1e-12);
    }

    #[test]
    fn evaluates_functions_and_constants() {
        let f = compile("sin(pi*t) + exp(0) + ln(E)");
        let value = f.eval(&[0.5]).expect("eval");
        assert!((value - 3.0).abs() < 1e-12);
    }

    #[test]
    fn small_float_literals_survive_lowering() {
        let f = compile("1e-7*x - 2.5e3");
        let value = f.eval(&[1e7]).expect("eval");
        assert!((value + 2499.0).abs() < 1e-9);
    }

    #[test]
    fn names_that_clash_with_builtins_still_bind() {
        let f = compile("E*e + PI");
        assert_eq!(f.variables(), ["PI", "e"]);
        let value = f.eval(&[1.0, 2.0]).expect("eval");
        assert!((value - (2.0 * std::f64::consts::E + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn rejects_imaginary_values_and_bad_arity() {
        assert!(CompiledExpr::compile(&parse("x + I").expect("parse")).is_err());
        assert!(compile("x").eval(&[]).is_err());
        assert!(compile("sqrt(x)").eval(&[-1.0]).is_err());
    }
}
