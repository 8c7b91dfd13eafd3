//! Plot output handling for math-mcp.
//!
//! Rendered charts are written under a date and session partitioned output
//! directory, published at a URL derived from the calling request, and
//! remembered per session so HTTP clients can poll for the latest one.

pub mod cache;
pub mod error;
pub mod locator;
pub mod request;
pub mod routes;

pub use cache::{PlotUrlCache, PlotUrlCacheConfig, PlotUrlEntry};
pub use error::{OutputError, OutputResult};
pub use locator::{DEFAULT_OUTPUT_DIR, PlotOutputs, SavedPlot, resolve_output_dir};
pub use request::RequestSnapshot;
pub use routes::router;
