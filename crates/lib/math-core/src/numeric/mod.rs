//! Numeric routines over parsed expressions.

mod ode;
mod roots;

pub use ode::{OdeMethod, OdeSolution, OdeSystem, solve_ode};
pub use roots::{RootMethod, RootResult, find_root};
