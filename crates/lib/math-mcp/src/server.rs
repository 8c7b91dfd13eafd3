//! MCP server runners for math-mcp.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use math_outputs::PlotOutputs;
use rmcp::serve_server;
use rmcp::transport::io::stdio;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig,
    StreamableHttpService,
    session::local::LocalSessionManager,
};
use tracing::info;

use crate::MathMcp;

/// Configuration for the MCP streamable HTTP server.
#[derive(Debug, Clone)]
pub struct McpHttpServerConfig {
    pub addr: SocketAddr,
    pub stateful_mode: bool,
    pub sse_keep_alive: Option<Duration>,
    pub sse_retry: Option<Duration>,
}

impl McpHttpServerConfig {
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            stateful_mode: true,
            sse_keep_alive: Some(Duration::from_secs(15)),
            sse_retry: Some(Duration::from_secs(3)),
        }
    }

    #[must_use]
    pub const fn with_stateful_mode(mut self, stateful_mode: bool) -> Self {
        self.stateful_mode = stateful_mode;
        self
    }

    #[must_use]
    pub const fn with_sse_keep_alive(mut self, sse_keep_alive: Option<Duration>) -> Self {
        self.sse_keep_alive = sse_keep_alive;
        self
    }

    #[must_use]
    pub const fn with_sse_retry(mut self, sse_retry: Option<Duration>) -> Self {
        self.sse_retry = sse_retry;
        self
    }
}

impl Default for McpHttpServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 8008)))
    }
}

/// Serves the MCP server over stdio.
///
/// # Errors
/// Returns any transport or server error.
pub async fn serve_stdio(
    outputs: PlotOutputs,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let service = MathMcp::new(outputs);
    let (stdin, stdout) = stdio();
    let running = serve_server(service, (stdin, stdout)).await?;
    let _ = running.waiting().await?;
    Ok(())
}

/// Builds the HTTP application: the MCP service under `/mcp`, saved plots
/// under `/outputs`, the plot URL lookup, and `/health`.
#[must_use]
pub fn http_app(outputs: &PlotOutputs, config: &McpHttpServerConfig) -> Router {
    let service_outputs = outputs.clone();
    let service: StreamableHttpService<MathMcp, LocalSessionManager> =
        StreamableHttpService::new(
            move || Ok(MathMcp::new(service_outputs.clone())),
            Arc::new(LocalSessionManager::default()),
            StreamableHttpServerConfig {
                sse_keep_alive: config.sse_keep_alive,
                sse_retry: config.sse_retry,
                stateful_mode: config.stateful_mode,
                ..Default::default()
            },
        );

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(math_outputs::router(outputs))
        .nest_service("/mcp", service)
}

/// Serves the MCP server using streamable HTTP transport.
///
/// # Errors
/// Returns any listener or server error.
pub async fn serve_streamable_http(
    outputs: PlotOutputs,
    config: McpHttpServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = http_app(&outputs, &config);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(
        output_dir = %outputs.output_dir().display(),
        "math-mcp listening on http://{}/mcp",
        config.addr
    );
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builders_override_defaults() {
        let config = McpHttpServerConfig::default()
            .with_stateful_mode(false)
            .with_sse_keep_alive(None);
        assert_eq!(config.addr.port(), 8008);
        assert!(!config.stateful_mode);
        assert!(config.sse_keep_alive.is_none());
        assert_eq!(config.sse_retry, Some(Duration::from_secs(3)));
    }
}
