//! Gemini `generateContent` client.
//!
//! The handler only depends on the [`ImageGenerator`] trait, so tests can
//! swap the HTTP client for a canned implementation.

use async_trait::async_trait;
use familyguy_mcp_common::config::Config;
use familyguy_mcp_common::error::Error;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::image::DecodedImage;

/// Model used for every conversion.
pub const IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

/// Response modalities requested from the model.
pub const RESPONSE_MODALITIES: &[&str] = &["TEXT", "IMAGE"];

/// Something that can run a `generateContent` call.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Send one request to `model` and return the parsed response.
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, Error>;
}

/// HTTP client for the Gemini REST API, authenticated with an API key.
#[derive(Clone)]
pub struct GeminiClient {
    config: Config,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Create a client with a fresh connection pool.
    pub fn new(config: Config) -> Self {
        Self::with_http(config, reqwest::Client::new())
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_http(config: Config, http: reqwest::Client) -> Self {
        Self { config, http }
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    #[instrument(level = "debug", name = "gemini_generate_content", skip(self, request))]
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, Error> {
        let endpoint = self.config.generate_content_endpoint(model);
        debug!(endpoint = %endpoint, "Calling Gemini API");

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", &self.config.gemini_api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::upstream(&endpoint, 0, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(&endpoint, status.as_u16(), error_message(&body)));
        }

        let body = response.text().await.map_err(|e| {
            Error::upstream(&endpoint, status.as_u16(), format!("Failed to read response: {}", e))
        })?;
        debug!(bytes = body.len(), "Received Gemini response");

        serde_json::from_str(&body).map_err(|e| {
            Error::upstream(
                &endpoint,
                status.as_u16(),
                format!("Failed to parse response: {}", e),
            )
        })
    }
}

/// Pull `error.message` out of a Google API error body, falling back to the
/// raw body.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: EnvelopeError,
    }

    #[derive(Deserialize)]
    struct EnvelopeError {
        message: String,
        #[serde(default)]
        status: Option<String>,
    }

    match serde_json::from_str::<Envelope>(body) {
        Ok(Envelope {
            error: EnvelopeError {
                message,
                status: Some(status),
            },
        }) => format!("{} ({})", message, status),
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "empty error response".to_string(),
        Err(_) => body.to_string(),
    }
}

// =============================================================================
// API Request/Response Types
// =============================================================================

/// Gemini `generateContent` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation turns (a single user turn here)
    pub contents: Vec<GeminiContent>,
    /// Generation configuration
    pub generation_config: GeminiGenerationConfig,
}

impl GenerateContentRequest {
    /// A single user turn carrying `prompt` followed by the source image,
    /// asking for text and image output.
    pub fn for_image(prompt: impl Into<String>, image: &DecodedImage) -> Self {
        Self {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![
                    GeminiPart::Text {
                        text: prompt.into(),
                    },
                    GeminiPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.to_base64(),
                        },
                    },
                ],
            }],
            generation_config: GeminiGenerationConfig {
                response_modalities: RESPONSE_MODALITIES.iter().map(|m| m.to_string()).collect(),
            },
        }
    }

    /// Text of the first text part, if any.
    pub fn prompt(&self) -> Option<&str> {
        self.contents
            .iter()
            .flat_map(|c| &c.parts)
            .find_map(|part| match part {
                GeminiPart::Text { text } => Some(text.as_str()),
                GeminiPart::InlineData { .. } => None,
            })
    }
}

/// Gemini content structure.
#[derive(Debug, Clone, Serialize)]
pub struct GeminiContent {
    /// Role (user or model)
    pub role: String,
    /// Content parts
    pub parts: Vec<GeminiPart>,
}

/// Gemini content part (request).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GeminiPart {
    /// Text content
    Text { text: String },
    /// Inline binary content
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

/// Base64 payload with its MIME type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiInlineData {
    /// MIME type
    pub mime_type: String,
    /// Base64-encoded data
    pub data: String,
}

/// Gemini generation config.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    /// Response modalities (TEXT, IMAGE)
    pub response_modalities: Vec<String>,
}

/// Gemini API response.
///
/// Every field is optional so that part kinds this crate does not know
/// about never fail parsing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Response candidates
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    /// Safety feedback on the prompt
    #[serde(default)]
    pub prompt_feedback: Option<GeminiPromptFeedback>,
}

/// Gemini response candidate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    /// Content
    #[serde(default)]
    pub content: Option<GeminiResponseContent>,
    /// Why generation stopped, e.g. `STOP` or `SAFETY`
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Gemini response content.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeminiResponseContent {
    /// Content parts
    #[serde(default)]
    pub parts: Vec<GeminiResponsePart>,
}

/// Gemini response part. At most one of the fields is normally set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponsePart {
    /// Text content
    #[serde(default)]
    pub text: Option<String>,
    /// Inline data (image)
    #[serde(default)]
    pub inline_data: Option<GeminiResponseInlineData>,
}

/// Inline data as returned by the API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponseInlineData {
    /// MIME type
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Base64-encoded data
    #[serde(default)]
    pub data: Option<String>,
}

/// Gemini prompt feedback.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPromptFeedback {
    /// Set when the prompt itself was blocked
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// An image part located in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePart<'a> {
    /// Declared MIME type, always `image/*`
    pub mime_type: &'a str,
    /// Base64-encoded bytes
    pub data: &'a str,
}

impl GenerateContentResponse {
    fn first_candidate_parts(&self) -> &[GeminiResponsePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// First part of the first candidate carrying non-empty data with an
    /// `image/*` MIME type. Text parts are skipped.
    pub fn first_image(&self) -> Option<ImagePart<'_>> {
        self.first_candidate_parts().iter().find_map(|part| {
            let inline = part.inline_data.as_ref()?;
            let data = inline.data.as_deref().filter(|d| !d.is_empty())?;
            let mime_type = inline
                .mime_type
                .as_deref()
                .filter(|m| m.starts_with("image/"))?;
            Some(ImagePart { mime_type, data })
        })
    }

    /// Best available explanation for a response without an image.
    pub fn missing_image_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return format!("prompt was blocked ({})", reason);
        }

        let Some(candidate) = self.candidates.first() else {
            return "response contained no candidates".to_string();
        };

        if let Some(reason) = candidate
            .finish_reason
            .as_deref()
            .filter(|r| *r != "STOP")
        {
            return format!("generation stopped with reason {}", reason);
        }

        let text: Vec<&str> = self
            .first_candidate_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            "response contained no image part".to_string()
        } else {
            let joined = text.join(" ");
            let snippet: String = joined.chars().take(200).collect();
            format!("model returned only text: {}", snippet)
        }
    }
}
