//! Daemon entry point for the math MCP server.
//!
//! Loads configuration from CLI flags and the environment, then serves the
//! MCP protocol over stdio or streamable HTTP.

mod config;

use math_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};
use math_outputs::{PlotOutputs, PlotUrlCache, PlotUrlCacheConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{MathConfig, Transport};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_outputs(config: &MathConfig) -> PlotOutputs {
    let cache_config = PlotUrlCacheConfig::new()
        .with_ttl(config.plot_url_ttl)
        .with_max_entries(config.plot_url_max)
        .with_sweep_interval(config.sweep_interval);
    PlotOutputs::new(&config.output_dir, PlotUrlCache::new(cache_config))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();
    let config = MathConfig::from_args()?;
    let outputs = build_outputs(&config);

    match config.transport {
        Transport::Stdio => {
            info!("serving math-mcp over stdio");
            serve_stdio(outputs).await
        }
        Transport::StreamableHttp => {
            let _sweeper = outputs.cache().clone().spawn_sweeper();
            let http_config = McpHttpServerConfig::new(config.http_addr)
                .with_stateful_mode(config.stateful)
                .with_sse_keep_alive(config.sse_keep_alive);
            serve_streamable_http(outputs, http_config).await
        }
    }
}
