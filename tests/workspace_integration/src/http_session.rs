//! End-to-end MCP session over authenticated streamable HTTP.
//!
//! Spins up the real router from `McpServerBuilder` with the real
//! `GeminiClient` pointed at a `wiremock` Gemini, then drives it with plain
//! JSON-RPC over `reqwest`.

use std::time::Duration;

use serde_json::{Value, json};

const ACCEPT: &str = "application/json, text/event-stream";
const SESSION_HEADER: &str = "mcp-session-id";

/// A minimal JSON-RPC client for the streamable HTTP transport.
pub struct McpSession {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    session_id: Option<String>,
    next_id: u64,
}

impl McpSession {
    /// Create a session that presents `token` as its bearer token.
    pub fn new(url: impl Into<String>, token: Option<&str>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            token: token.map(str::to_string),
            session_id: None,
            next_id: 1,
        }
    }

    /// Reuse an established session id with a different bearer token.
    pub fn with_token(&self, token: Option<&str>) -> Self {
        Self {
            client: self.client.clone(),
            url: self.url.clone(),
            token: token.map(str::to_string),
            session_id: self.session_id.clone(),
            next_id: self.next_id,
        }
    }

    async fn post(&self, body: &Value) -> reqwest::Response {
        let mut request = self
            .client
            .post(&self.url)
            .header("content-type", "application/json")
            .header("accept", ACCEPT)
            .json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(session_id) = &self.session_id {
            request = request.header(SESSION_HEADER, session_id);
        }
        request.send().await.expect("request should be sent")
    }

    /// Send a request and return the HTTP status with the JSON-RPC reply.
    pub async fn request(&mut self, method: &str, params: Value) -> (u16, Option<Value>) {
        let id = self.next_id;
        self.next_id += 1;

        let response = self
            .post(&json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await;
        let status = response.status().as_u16();
        if !response.status().is_success() {
            return (status, None);
        }

        if let Some(session_id) = response.headers().get(SESSION_HEADER) {
            self.session_id = session_id.to_str().ok().map(str::to_string);
        }

        (status, Some(read_reply(response, id).await))
    }

    /// Send a notification and return the HTTP status.
    pub async fn notify(&self, method: &str) -> u16 {
        self.post(&json!({ "jsonrpc": "2.0", "method": method }))
            .await
            .status()
            .as_u16()
    }

    /// Run the initialize handshake.
    pub async fn initialize(&mut self) -> Value {
        let (status, reply) = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": { "name": "workspace-integration", "version": "0.0.0" }
                }),
            )
            .await;
        assert_eq!(status, 200, "initialize should succeed");
        let status = self.notify("notifications/initialized").await;
        assert!((200..300).contains(&status), "initialized notification got {}", status);
        reply.expect("initialize should reply")
    }
}

/// Read a JSON-RPC reply with the given id from a JSON or SSE response.
async fn read_reply(mut response: reqwest::Response, id: u64) -> Value {
    let is_json = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return response.json().await.expect("reply should be JSON");
    }

    let read = async {
        let mut buffer = String::new();
        while let Some(chunk) = response.chunk().await.expect("stream should be readable") {
            buffer.push_str(&String::from_utf8_lossy(&chunk));
            let found = buffer
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .filter_map(|data| serde_json::from_str::<Value>(data.trim()).ok())
                .find(|message| message["id"] == json!(id));
            if let Some(message) = found {
                return message;
            }
        }
        panic!("event stream ended without a reply to request {}", id);
    };

    tokio::time::timeout(Duration::from_secs(10), read)
        .await
        .expect("reply should arrive in time")
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use familyguy_mcp_common::{BearerAuth, Config, HttpTransport, McpServerBuilder};
    use familyguy_mcp_converter::gemini::IMAGE_MODEL;
    use familyguy_mcp_converter::server::TOOL_NAME;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::server_startup::server_for;

    const SECRET: &str = "s3cret";
    const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
    const CARTOON_BYTES: &[u8] = b"\x89PNG\r\n\x1a\ncartoon";

    async fn mock_gemini() -> MockServer {
        let gemini = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{}:generateContent", IMAGE_MODEL)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [
                    { "inlineData": { "mimeType": "image/png", "data": BASE64.encode(CARTOON_BYTES) } }
                ]}}]
            })))
            .mount(&gemini)
            .await;
        gemini
    }

    /// Serve the full converter on an ephemeral port and return its MCP URL.
    async fn spawn_converter(gemini: &MockServer) -> String {
        let base_url = format!("{}/v1beta", gemini.uri());
        let config = Config::from_lookup(|name| match name {
            "GEMINI_API_KEY" => Some("test-api-key".to_string()),
            "MCP_SECRET_TOKEN" => Some(SECRET.to_string()),
            "GEMINI_API_BASE_URL" => Some(base_url.clone()),
            _ => None,
        })
        .unwrap();

        let auth = BearerAuth::new(config.secret_token.clone());
        let router = McpServerBuilder::new(server_for(config), auth)
            .with_transport(HttpTransport {
                host: "127.0.0.1".to_string(),
                port: 0,
                path: "/mcp".to_string(),
            })
            .router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/mcp", addr)
    }

    #[tokio::test]
    async fn test_full_session_converts_image() {
        let gemini = mock_gemini().await;
        let url = spawn_converter(&gemini).await;
        let mut session = McpSession::new(&url, Some(SECRET));

        let init = session.initialize().await;
        assert!(init["result"]["capabilities"]["tools"].is_object());

        let (_, reply) = session.request("tools/list", json!({})).await;
        let tools = reply.unwrap()["result"]["tools"].clone();
        assert_eq!(tools.as_array().map(Vec::len), Some(1));
        assert_eq!(tools[0]["name"], TOOL_NAME);

        let (_, reply) = session
            .request(
                "tools/call",
                json!({
                    "name": TOOL_NAME,
                    "arguments": {
                        "image_data": format!("data:image/png;base64,{}", PIXEL_PNG),
                        "characterName": "Peter Griffin"
                    }
                }),
            )
            .await;
        let content = reply.unwrap()["result"]["content"].clone();
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["mimeType"], "image/png");
        assert_eq!(
            BASE64.decode(content[0]["data"].as_str().unwrap()).unwrap(),
            CARTOON_BYTES
        );

        let requests = gemini.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("as Peter Griffin"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_reported_over_the_wire() {
        let gemini = mock_gemini().await;
        let url = spawn_converter(&gemini).await;
        let mut session = McpSession::new(&url, Some(SECRET));
        session.initialize().await;

        let (_, reply) = session
            .request(
                "tools/call",
                json!({ "name": TOOL_NAME, "arguments": { "numberOfImages": 2 } }),
            )
            .await;
        let error = reply.unwrap()["error"].clone();
        assert_eq!(error["code"], -32602);
        assert_eq!(error["message"], "Invalid input: image_data: Required");
        assert!(gemini.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_established_session_still_requires_token() {
        let gemini = mock_gemini().await;
        let url = spawn_converter(&gemini).await;
        let mut session = McpSession::new(&url, Some(SECRET));
        session.initialize().await;

        for token in [None, Some("wrong"), Some("S3CRET")] {
            let mut intruder = session.with_token(token);
            let (status, reply) = intruder
                .request(
                    "tools/call",
                    json!({ "name": TOOL_NAME, "arguments": { "image_data": PIXEL_PNG } }),
                )
                .await;
            assert_eq!(status, 401, "token {:?} should be rejected", token);
            assert!(reply.is_none());
        }

        assert!(gemini.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unauthenticated_initialize_is_rejected() {
        let gemini = mock_gemini().await;
        let url = spawn_converter(&gemini).await;
        let mut session = McpSession::new(&url, None);

        let (status, _) = session.request("initialize", json!({})).await;
        assert_eq!(status, 401);
    }
}
