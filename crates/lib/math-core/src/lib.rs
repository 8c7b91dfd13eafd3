//! Computation core for the math MCP server.
//!
//! - [`symbolic`] parses, prints, and manipulates expressions.
//! - [`numeric`] integrates ODE systems and finds roots.
//! - [`stats`] describes samples and runs the classical tests.
//! - [`units`] converts between physical units.

pub mod error;
pub mod format;
pub mod numeric;
pub mod stats;
pub mod symbolic;
pub mod units;

pub use error::{MathError, MathResult};
