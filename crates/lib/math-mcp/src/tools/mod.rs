//! MCP tool modules.
//!
//! Tools are grouped by domain: symbolic algebra, numerics, statistics, unit
//! conversion, and charts. Each module contributes one tool router.

pub mod numeric;
pub mod plots;
pub mod stats;
pub mod symbolic;
pub mod units;
