//! Family Guy MCP Common Library
//!
//! Configuration, error taxonomy, bearer authentication, HTTP transport and
//! tracing setup shared by the converter server.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod tracing;
pub mod transport;


pub use auth::BearerAuth;
pub use config::Config;
pub use error::{AuthError, ConfigError, Error, FieldError};
pub use server::{McpServerBuilder, ServerError, shutdown_channel};
pub use transport::{HttpTransport, TransportArgs};
