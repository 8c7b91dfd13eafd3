use std::fmt;

use super::expr::{Constant, Expr};
use super::number::Number;

const PREC_ADD: u8 = 10;
pub(crate) const PREC_MUL: u8 = 20;
pub(crate) const PREC_POW: u8 = 30;
const PREC_ATOM: u8 = 100;

pub(crate) fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Add(_) => PREC_ADD,
        Expr::Mul(factors) => match factors.first() {
            Some(Expr::Num(n)) if n.is_negative() => PREC_ADD,
            _ => PREC_MUL,
        },
        Expr::Pow(_, exp) => match exp.as_number() {
            Some(e) if is_half(e) => PREC_ATOM,
            Some(e) if e.is_negative() => PREC_MUL,
            _ => PREC_POW,
        },
        Expr::Num(n) if n.is_negative() => PREC_ADD,
        Expr::Num(Number::Exact(r)) if !r.is_integer() => PREC_MUL,
        Expr::Num(_) | Expr::Sym(_) | Expr::Const(_) | Expr::Call(..) => PREC_ATOM,
    }
}

pub(crate) fn is_half(n: Number) -> bool {
    n.as_rational().is_some_and(|r| r.numer() == 1 && r.denom() == 2)
}

/// Coefficient and remaining factors of a product term.
pub(crate) fn term_parts(term: &Expr) -> (Number, Vec<Expr>) {
    match term {
        Expr::Num(n) => (*n, Vec::new()),
        Expr::Mul(factors) => match factors.split_first() {
            Some((Expr::Num(n), rest)) => (*n, rest.to_vec()),
            _ => (Number::ONE, factors.clone()),
        },
        other => (Number::ONE, vec![other.clone()]),
    }
}

fn paren(expr: &Expr, level: u8) -> String {
    if precedence(expr) < level {
        format!("({expr})")
    } else {
        expr.to_string()
    }
}

fn print_product(coeff: Number, factors: &[Expr]) -> String {
    if factors.is_empty() {
        return coeff.to_string();
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
        Number::Float(_) => {
            if !magnitude.is_one() {
                numer.push(magnitude.to_string());
            }
        }
    }
    for factor in factors {
        match factor {
            Expr::Pow(base, exp) if exp.as_number().is_some_and(Number::is_negative) => {
                let positive = exp.as_number().map_or(Number::ONE, Number::neg);
                if positive.is_one() {
                    denom.push(paren(base, PREC_MUL));
                } else {
                    let flipped = Expr::pow(base.as_ref().clone(), Expr::Num(positive));
                    denom.push(paren(&flipped, PREC_MUL));
                }
            }
            other => numer.push(paren(other, PREC_MUL)),
        }
    }
    let numerator = if numer.is_empty() {
        "1".to_string()
    } else {
        numer.join("*")
    };
    let body = match denom.len() {
        0 => numerator,
        1 => format!("{numerator}/{}", denom[0]),
        _ => format!("{numerator}/({})", denom.join("*")),
    };
    if negative { format!("-{body}") } else { body }
}

fn print_power(base: &Expr, exp: &Expr) -> String {
    if let Some(e) = exp.as_number() {
        if is_half(e) {
            return format!("sqrt({base})");
        }
        if e.is_negative() {
            return print_product(Number::ONE, &[Expr::pow(base.clone(), exp.clone())]);
        }
    }
    let base_text = if precedence(base) <= PREC_POW {
        format!("({base})")
    } else {
        base.to_string()
    };
    let exp_text = if precedence(exp) < PREC_ATOM {
        format!("({exp})")
    } else {
        exp.to_string()
    };
    format!("{base_text}**{exp_text}")
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pi => "pi",
            Self::E => "E",
            Self::I => "I",
        })
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Sym(name) => f.write_str(name),
            Self::Const(c) => write!(f, "{c}"),
            Self::Call(func, arg) => write!(f, "{}({arg})", func.name()),
            Self::Pow(base, exp) => f.write_str(&print_power(base, exp)),
            Self::Mul(_) => {
                let (coeff, rest) = term_parts(self);
                f.write_str(&print_product(coeff, &rest))
            }
            Self::Add(terms) => {
                for (idx, term) in terms.iter().enumerate() {
                    let (coeff, rest) = term_parts(term);
                    let rest_is_add = rest.len() == 1 && matches!(rest[0], Self::Add(_));
                    if idx == 0 {
                        if rest_is_add && coeff.is_one() {
                            write!(f, "({})", rest[0])?;
                        } else {
                            f.write_str(&print_product(coeff, &rest))?;
                        }
                    } else if coeff.is_negative() {
                        write!(f, " - {}", print_product(coeff.neg(), &rest))?;
                    } else if rest_is_add && coeff.is_one() {
                        write!(f, " + ({})", rest[0])?;
                    } else {
                        write!(f, " + {}", print_product(coeff, &rest))?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::symbolic::parse;

    fn show(text: &str) -> String {
        parse(text).expect("parse").canonical().to_string()
    }

    #[test]
    fn products_print_with_denominators() {
        assert_eq!(show("x**3/3"), "x**3/3");
        assert_eq!(show("-x/2"), "-x/2");
        assert_eq!(show("1/(x + 1)"), "1/(x + 1)");
        assert_eq!(show("x/(2*y)"), "x/(2*y)");
        assert_eq!(show("x**-2"), "1/x**2");
    }

    #[test]
    fn sums_print_signed_terms() {
        assert_eq!(show("x**2 + 2*x + 1"), "x**2 + 2*x + 1");
        assert_eq!(show("a**2 - b**2"), "a**2 - b**2");
        assert_eq!(show("1 - sqrt(2)"), "1 - sqrt(2)");
        assert_eq!(show("y**2 + x**2 + 2*x*y"), "x**2 + 2*x*y + y**2");
    }

    #[test]
    fn powers_parenthesize_compound_operands() {
        assert_eq!(show("(x + 1)**2"), "(x + 1)**2");
        assert_eq!(show("x**(1/3)"), "x**(1/3)");
        assert_eq!(show("sqrt(x)"), "sqrt(x)");
        assert_eq!(show("2*x*cos(x**2)"), "2*x*cos(x**2)");
    }
}
