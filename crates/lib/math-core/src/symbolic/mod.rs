//! Expression engine.
//!
//! Expressions are parsed into an [`Expr`] tree and kept in a canonical form
//! (like terms collected, powers merged, constants folded). Printing follows
//! the usual computer-algebra text conventions: `2*x`, `x**2 + 2*x + 1`,
//! `(x - 2)*(x + 2)`, `sqrt(2)`, `I`.
//!
//! The engine covers polynomials and rational functions over the rationals
//! plus the elementary functions of one argument. Anything outside that
//! surfaces as [`crate::MathError::Unsupported`].

mod algebra;
mod calculus;
mod compiled;
mod expr;
mod latex;
mod number;
mod parser;
mod poly;
mod printer;

pub use algebra::{cancel_fraction, evaluate, expand, factor, simplify, solve, to_fraction};
pub use calculus::{differentiate, differentiate_n, integrate, integrate_definite};
pub use compiled::CompiledExpr;
pub use expr::{Constant, Expr, Func};
pub use latex::to_latex;
pub use number::{Number, Rational};
pub use parser::{parse, parse_equation};
