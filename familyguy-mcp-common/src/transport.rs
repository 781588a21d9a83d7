//! HTTP transport configuration.
//!
//! The converter is only reachable over rmcp's streamable HTTP transport.
//! The port comes from `Config` (the `PORT` env var) unless overridden on
//! the command line.
//!
//! # Example
//!
//! ```ignore
//! use familyguy_mcp_common::transport::TransportArgs;
//! use clap::Parser;
//!
//! #[derive(Parser)]
//! struct Args {
//!     #[command(flatten)]
//!     transport: TransportArgs,
//! }
//!
//! let args = Args::parse();
//! let transport = args.transport.into_transport(config.port);
//! ```

use clap::Args;
use std::fmt;

/// Default mount path of the MCP endpoint.
pub const DEFAULT_MCP_PATH: &str = "/mcp";

/// Where the streamable HTTP listener binds and mounts the MCP service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransport {
    /// Interface to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Path the MCP service is mounted under
    pub path: String,
}

impl HttpTransport {
    /// Listen on all interfaces at `port`, mounted at `/mcp`.
    pub fn new(port: u16) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port,
            path: DEFAULT_MCP_PATH.to_string(),
        }
    }

    /// The `host:port` string handed to the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PORT)
    }
}

impl fmt::Display for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http ({}:{}{})", self.host, self.port, self.path)
    }
}

/// Command-line arguments for transport configuration.
#[derive(Args, Debug, Clone)]
pub struct TransportArgs {
    /// Interface to bind the HTTP listener to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port override (defaults to the PORT env var, then 8080)
    #[arg(long)]
    pub port: Option<u16>,

    /// Path to mount the MCP endpoint under
    #[arg(long, default_value = DEFAULT_MCP_PATH, value_parser = parse_mount_path)]
    pub path: String,
}

pub(crate) fn parse_mount_path(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if !trimmed.starts_with('/') {
        return Err(format!("Invalid mount path '{}'. It must start with '/'", s));
    }
    match trimmed.trim_end_matches('/') {
        "" => Ok("/".to_string()),
        path => Ok(path.to_string()),
    }
}

impl TransportArgs {
    /// Resolve the transport, falling back to `config_port` when no
    /// `--port` was given.
    pub fn into_transport(self, config_port: u16) -> HttpTransport {
        HttpTransport {
            host: self.host,
            port: self.port.unwrap_or(config_port),
            path: self.path,
        }
    }
}

impl Default for TransportArgs {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: None,
            path: DEFAULT_MCP_PATH.to_string(),
        }
    }
}

