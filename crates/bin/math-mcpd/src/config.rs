use clap::{Parser, builder::BoolishValueParser};
use math_outputs::resolve_output_dir;
use std::error::Error;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TRANSPORT: &str = "stdio";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8008;
const DEFAULT_OUTPUT_DIR: &str = math_outputs::DEFAULT_OUTPUT_DIR;
const DEFAULT_PLOT_URL_TTL_SECS: u64 = 3600;
const DEFAULT_PLOT_URL_MAX: usize = 1024;
const DEFAULT_SSE_KEEP_ALIVE_SECS: u64 = 15;
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "math-mcpd", version, about = "Math MCP daemon.")]
struct CliArgs {
    /// `stdio`, `http`, or `streamable-http`.
    #[arg(long, env = "MCP_TRANSPORT", default_value = DEFAULT_TRANSPORT)]
    transport: String,

    #[arg(long, env = "MCP_HOST", default_value = DEFAULT_HOST)]
    host: String,

    #[arg(long, env = "MCP_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(long, env = "MCP_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: String,

    #[arg(
        long,
        env = "MCP_PLOT_URL_TTL_SECS",
        default_value_t = DEFAULT_PLOT_URL_TTL_SECS
    )]
    plot_url_ttl_secs: u64,

    #[arg(long, env = "MCP_PLOT_URL_MAX", default_value_t = DEFAULT_PLOT_URL_MAX)]
    plot_url_max: usize,

    #[arg(
        long,
        env = "MCP_STATEFUL",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    stateful: bool,

    #[arg(
        long,
        env = "MCP_SSE_KEEP_ALIVE_SECS",
        default_value_t = DEFAULT_SSE_KEEP_ALIVE_SECS
    )]
    sse_keep_alive_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    StreamableHttp,
}

impl Transport {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stdio" => Some(Self::Stdio),
            "http" | "streamable-http" => Some(Self::StreamableHttp),
            _ => None,
        }
    }
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Debug, Clone)]
pub struct MathConfig {
    pub transport: Transport,
    pub http_addr: SocketAddr,
    pub output_dir: PathBuf,
    pub plot_url_ttl: Duration,
    pub plot_url_max: usize,
    pub sweep_interval: Duration,
    pub stateful: bool,
    pub sse_keep_alive: Option<Duration>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl MathConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }
}

fn resolve_addr(host: &str, port: u16) -> Option<SocketAddr> {
    (host, port).to_socket_addrs().ok()?.next()
}

impl TryFrom<CliArgs> for MathConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let transport = Transport::parse(&args.transport).ok_or_else(|| {
            ConfigError::InvalidSetting {
                name: "MCP_TRANSPORT",
                value: args.transport.clone(),
            }
        })?;

        let host = args.host.trim();
        if host.is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "MCP_HOST",
                value: args.host,
            });
        }
        let http_addr = resolve_addr(host, args.port).ok_or_else(|| ConfigError::InvalidSetting {
            name: "MCP_HOST",
            value: args.host.clone(),
        })?;

        if args.plot_url_ttl_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "MCP_PLOT_URL_TTL_SECS",
                value: args.plot_url_ttl_secs.to_string(),
            });
        }
        if args.plot_url_max == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "MCP_PLOT_URL_MAX",
                value: args.plot_url_max.to_string(),
            });
        }
        let plot_url_ttl = Duration::from_secs(args.plot_url_ttl_secs);

        let sse_keep_alive = if args.sse_keep_alive_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(args.sse_keep_alive_secs))
        };

        Ok(Self {
            transport,
            http_addr,
            output_dir: resolve_output_dir(&args.output_dir),
            plot_url_ttl,
            plot_url_max: args.plot_url_max,
            sweep_interval: plot_url_ttl.min(MAX_SWEEP_INTERVAL),
            stateful: args.stateful,
            sse_keep_alive,
        })
    }
}
