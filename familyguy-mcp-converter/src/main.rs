//! Family Guy MCP Converter Server
//!
//! MCP server that converts images to Family Guy style using Gemini.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use familyguy_mcp_common::{BearerAuth, Config, McpServerBuilder, TransportArgs};
use familyguy_mcp_converter::{ConvertHandler, FamilyGuyServer, GeminiClient};

/// Command-line arguments for the converter server.
#[derive(Parser, Debug)]
#[command(name = "familyguy-mcp-converter")]
#[command(about = "MCP server that converts images to Family Guy style using Gemini")]
struct Args {
    /// Transport configuration
    #[command(flatten)]
    transport: TransportArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    familyguy_mcp_common::tracing::init_tracing();

    tracing::info!("familyguy-mcp-converter server starting...");

    let args = Args::parse();

    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        gemini_base_url = %config.gemini_base_url,
        "Configuration loaded"
    );

    let auth = BearerAuth::new(config.secret_token.clone());
    let transport = args.transport.into_transport(config.port);

    let generator = Arc::new(GeminiClient::new(config));
    let server = FamilyGuyServer::new(ConvertHandler::new(generator));

    McpServerBuilder::new(server, auth)
        .with_transport(transport)
        .run()
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
