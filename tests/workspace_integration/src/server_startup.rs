//! Server startup integration tests.
//!
//! Tests that the converter server can be instantiated from configuration
//! and provides correct server info.

use std::sync::Arc;

use familyguy_mcp_common::Config;
use familyguy_mcp_converter::{ConvertHandler, FamilyGuyServer, GeminiClient};

/// Test configuration for integration tests.
pub fn test_config() -> Config {
    Config {
        gemini_api_key: "test-api-key".to_string(),
        secret_token: "s3cret".to_string(),
        port: 8080,
        gemini_base_url: "http://127.0.0.1:9/v1beta".to_string(),
    }
}

/// Build the server the binary would build for `config`.
pub fn server_for(config: Config) -> FamilyGuyServer {
    FamilyGuyServer::new(ConvertHandler::new(Arc::new(GeminiClient::new(config))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use familyguy_mcp_converter::gemini::IMAGE_MODEL;
    use rmcp::ServerHandler;

    #[test]
    fn test_converter_server_startup() {
        let server = server_for(test_config());
        let info = server.get_info();

        assert!(info.instructions.is_some());
        let instructions = info.instructions.as_ref().unwrap();
        assert!(
            instructions.contains("convertToFamilyGuy"),
            "Server instructions should name the tool"
        );
    }

    #[test]
    fn test_converter_server_has_tools_capability() {
        let info = server_for(test_config()).get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
    }

    #[test]
    fn test_handler_uses_image_model() {
        let handler = ConvertHandler::new(Arc::new(GeminiClient::new(test_config())));
        assert_eq!(handler.model(), IMAGE_MODEL);
    }

    #[test]
    fn test_config_debug_hides_secrets() {
        let rendered = format!("{:?}", test_config());
        assert!(!rendered.contains("test-api-key"));
        assert!(!rendered.contains("s3cret"));
    }
}
