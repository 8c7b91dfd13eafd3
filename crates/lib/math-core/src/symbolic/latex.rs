use super::expr::{Constant, Expr, Func};
use super::number::Number;
use super::printer::{PREC_MUL, PREC_POW, is_half, precedence, term_parts};

const GREEK: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "rho", "sigma", "tau", "upsilon", "phi", "chi", "psi", "omega",
];

fn symbol(name: &str) -> String {
    if GREEK.contains(&name) {
        return format!("\\{name}");
    }
    match name.split_once('_') {
        Some((head, tail)) if !tail.is_empty() => format!("{}_{{{tail}}}", symbol(head)),
        _ => name.to_string(),
    }
}

fn number(n: Number) -> String {
    match n {
        Number::Exact(r) if r.is_integer() => r.numer().to_string(),
        Number::Exact(r) => {
            let body = format!("\\frac{{{}}}{{{}}}", r.numer().abs(), r.denom());
            if r.is_negative() { format!("- {body}") } else { body }
        }
        Number::Float(_) => n.to_string(),
    }
}

fn wrapped(expr: &Expr, level: u8) -> String {
    if precedence(expr) < level {
        format!("\\left({}\\right)", render(expr))
    } else {
        render(expr)
    }
}

fn call_body(arg: &Expr) -> String {
    format!("{{\\left({} \\right)}}", render(arg))
}

fn call_name(func: Func) -> String {
    match func {
        Func::Asin | Func::Acos | Func::Atan => format!("\\operatorname{{{}}}", func.name()),
        other => format!("\\{}", other.name()),
    }
}

fn render_call(func: Func, arg: &Expr) -> String {
    match func {
        Func::Exp => format!("e^{{{}}}", render(arg)),
        Func::Abs => format!("\\left|{{{}}}\\right|", render(arg)),
        other => format!("{}{}", call_name(other), call_body(arg)),
    }
}

fn render_power(base: &Expr, exp: &Expr) -> String {
    if let Some(e) = exp.as_number() {
        if is_half(e) {
            return format!("\\sqrt{{{}}}", render(base));
        }
        if let Some(r) = e.as_rational() {
            if r.numer() == 1 && r.denom() > 2 {
                return format!("\\sqrt[{}]{{{}}}", r.denom(), render(base));
            }
        }
        if e.is_negative() {
            return render_product(Number::ONE, &[Expr::pow(base.clone(), exp.clone())]);
        }
    }
    if let Expr::Call(func, arg) = base {
        if !matches!(func, Func::Exp | Func::Abs) {
            return format!("{}^{{{}}}{}", call_name(*func), render(exp), call_body(arg));
        }
    }
    let base_text = if precedence(base) <= PREC_POW {
        format!("\\left({}\\right)", render(base))
    } else {
        render(base)
    };
    format!("{base_text}^{{{}}}", render(exp))
}

fn render_product(coeff: Number, factors: &[Expr]) -> String {
    if factors.is_empty() {
        return number(coeff);
    }
    let negative = coeff.is_negative();
    let magnitude = coeff.abs();
    let mut numer = Vec::new();
    let mut denom = Vec::new();
    match magnitude {
        Number::Exact(r) => {
            if r.numer() != 1 {
                numer.push(r.numer().to_string());
            }
            if r.denom() != 1 {
                denom.push(r.denom().to_string());
            }
        }
        Number::Float(_) if !magnitude.is_one() => numer.push(magnitude.to_string()),
        Number::Float(_) => {}
    }
    for factor in factors {
        match factor {
            Expr::Pow(base, exp) if exp.as_number().is_some_and(Number::is_negative) => {
                let positive = exp.as_number().map_or(Number::ONE, Number::neg);
                if positive.is_one() {
                    denom.push(wrapped(base, PREC_MUL));
                } else {
                    denom.push(render(&Expr::pow(base.as_ref().clone(), Expr::Num(positive))));
                }
            }
            other => numer.push(wrapped(other, PREC_MUL)),
        }
    }
    let numerator = if numer.is_empty() {
        "1".to_string()
    } else {
        numer.join(" ")
    };
    let body = if denom.is_empty() {
        numerator
    } else {
        format!("\\frac{{{numerator}}}{{{}}}", denom.join(" "))
    };
    if negative { format!("- {body}") } else { body }
}

fn render(expr: &Expr) -> String {
    match expr {
        Expr::Num(n) => number(*n),
        Expr::Sym(name) => symbol(name),
        Expr::Const(Constant::Pi) => "\\pi".to_string(),
        Expr::Const(Constant::E) => "e".to_string(),
        Expr::Const(Constant::I) => "i".to_string(),
        Expr::Call(func, arg) => render_call(*func, arg),
        Expr::Pow(base, exp) => render_power(base, exp),
        Expr::Mul(_) => {
            let (coeff, rest) = term_parts(expr);
            render_product(coeff, &rest)
        }
        Expr::Add(terms) => {
            let mut out = String::new();
            for (idx, term) in terms.iter().enumerate() {
                let (coeff, rest) = term_parts(term);
                if idx == 0 {
                    out.push_str(&render_product(coeff, &rest));
                } else if coeff.is_negative() {
                    out.push_str(" - ");
                    out.push_str(&render_product(coeff.neg(), &rest));
                } else {
                    out.push_str(" + ");
                    out.push_str(&render_product(coeff, &rest));
                }
            }
            out
        }
    }
}

/// LaTeX for the normalized form of `expr`.
#[must_use]
pub fn to_latex(expr: &Expr) -> String {
    render(&expr.canonical())
}
