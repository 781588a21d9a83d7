//! MCP Server implementation for the converter.
//!
//! Exposes a single tool, `convertToFamilyGuy`.

use crate::handler::{ConvertHandler, ConvertParams};
use familyguy_mcp_common::error::Error;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::{CallToolResult, Content, JsonObject, ServerCapabilities, ServerInfo},
};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Name of the only tool this server exposes.
pub const TOOL_NAME: &str = "convertToFamilyGuy";

const TOOL_DESCRIPTION: &str = "Convert an image to Family Guy character style using AI image generation. \
     Takes a base64-encoded image and returns a Family Guy style version.";

/// MCP Server for Family Guy conversions.
#[derive(Clone)]
pub struct FamilyGuyServer {
    handler: ConvertHandler,
}

impl FamilyGuyServer {
    /// Create a new server around a conversion handler.
    pub fn new(handler: ConvertHandler) -> Self {
        Self { handler }
    }

    /// Run the tool against raw arguments and shape the MCP result.
    pub async fn convert(&self, arguments: Option<JsonObject>) -> Result<CallToolResult, McpError> {
        info!(tool = TOOL_NAME, "Converting image");

        match self.handler.convert_arguments(arguments.as_ref()).await {
            Ok(images) => {
                let content = images
                    .iter()
                    .map(|img| Content::image(img.to_base64(), img.mime_type.clone()))
                    .collect();
                Ok(CallToolResult::success(content))
            }
            Err(err) => Err(to_mcp_error(err)),
        }
    }

    /// The tool definition advertised by `list_tools`.
    pub fn tool() -> rmcp::model::Tool {
        use schemars::schema_for;

        let schema = schema_for!(ConvertParams);
        let schema_value = serde_json::to_value(&schema).unwrap_or_default();
        let input_schema = match schema_value {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::new()),
        };

        rmcp::model::Tool {
            name: Cow::Borrowed(TOOL_NAME),
            description: Some(Cow::Borrowed(TOOL_DESCRIPTION)),
            input_schema,
            annotations: None,
            icons: None,
            meta: None,
            output_schema: None,
            title: None,
        }
    }
}

/// Map each error kind to exactly one MCP error shape.
pub fn to_mcp_error(err: Error) -> McpError {
    match err {
        Error::InvalidInput(_) => {
            warn!(error = %err, "Rejected tool arguments");
            McpError::invalid_params(err.to_string(), None)
        }
        Error::Decode(_)
        | Error::NoImageGenerated(_)
        | Error::Upstream { .. }
        | Error::Config(_)
        | Error::Auth(_) => {
            error!(error = %err, "Error converting to Family Guy style");
            McpError::internal_error(format!("Failed to convert image: {}", err), None)
        }
    }
}

impl ServerHandler for FamilyGuyServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Family Guy image converter. Call convertToFamilyGuy with base64 image_data \
                 (optionally a data URI), an optional characterName, and numberOfImages (1-4)."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<rmcp::model::ListToolsResult, McpError>> + Send + '_ {
        async move {
            Ok(rmcp::model::ListToolsResult {
                tools: vec![Self::tool()],
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        params: rmcp::model::CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            match params.name.as_ref() {
                TOOL_NAME => self.convert(params.arguments).await,
                _ => Err(McpError::invalid_params(
                    format!("Unknown tool: {}", params.name),
                    None,
                )),
            }
        }
    }
}
