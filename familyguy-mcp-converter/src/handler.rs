//! Conversion handler for the `convertToFamilyGuy` tool.
//!
//! Validates the raw tool arguments, decodes the source image, asks Gemini to
//! redraw it, and returns the first image part of each response.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use familyguy_mcp_common::error::{Error, FieldError};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::gemini::{GenerateContentRequest, IMAGE_MODEL, ImageGenerator};
use crate::image::decode_image_data;

/// Minimum number of images that can be requested.
pub const MIN_NUMBER_OF_IMAGES: u8 = 1;

/// Maximum number of images that can be requested.
pub const MAX_NUMBER_OF_IMAGES: u8 = 4;

/// Tool arguments as advertised in the tool's input schema.
///
/// Incoming arguments are validated field by field with
/// [`ConvertParams::from_arguments`] so that every problem is reported at
/// once; this type exists to generate the schema and for direct callers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct ConvertParams {
    /// Base64-encoded image data to convert to Family Guy style.
    /// May be a data URI such as `data:image/jpeg;base64,...`.
    pub image_data: String,

    /// Render the subject as this Family Guy character, e.g. "Peter Griffin".
    #[serde(rename = "characterName", default)]
    pub character_name: Option<String>,

    /// Number of images to generate (1-4, default 1).
    #[serde(rename = "numberOfImages", default = "default_number_of_images")]
    #[schemars(range(min = 1, max = 4))]
    pub number_of_images: u8,
}

fn default_number_of_images() -> u8 {
    MIN_NUMBER_OF_IMAGES
}

/// JSON type name in the wording callers see in validation messages.
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl ConvertParams {
    /// Validate raw tool arguments.
    ///
    /// # Returns
    /// - `Ok(ConvertParams)` if every field is valid
    /// - `Err(Vec<FieldError>)` listing every failing field
    pub fn from_arguments(arguments: Option<&Map<String, Value>>) -> Result<Self, Vec<FieldError>> {
        let empty = Map::new();
        let args = arguments.unwrap_or(&empty);
        let mut errors = Vec::new();

        let image_data = match args.get("image_data") {
            None | Some(Value::Null) => {
                errors.push(FieldError::new("image_data", "Required"));
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                errors.push(FieldError::new(
                    "image_data",
                    format!("Expected string, received {}", type_name(other)),
                ));
                None
            }
        };

        let character_name = match args.get("characterName") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                errors.push(FieldError::new(
                    "characterName",
                    format!("Expected string, received {}", type_name(other)),
                ));
                None
            }
        };

        let number_of_images = match args.get("numberOfImages") {
            None | Some(Value::Null) => Some(default_number_of_images()),
            Some(Value::Number(n)) => match validate_count(n) {
                Ok(count) => Some(count),
                Err(message) => {
                    errors.push(FieldError::new("numberOfImages", message));
                    None
                }
            },
            Some(other) => {
                errors.push(FieldError::new(
                    "numberOfImages",
                    format!("Expected number, received {}", type_name(other)),
                ));
                None
            }
        };

        match (image_data, number_of_images) {
            (Some(image_data), Some(number_of_images)) if errors.is_empty() => Ok(Self {
                image_data,
                character_name,
                number_of_images,
            }),
            _ => Err(errors),
        }
    }

    /// Validate an already-typed parameter set.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        if (MIN_NUMBER_OF_IMAGES..=MAX_NUMBER_OF_IMAGES).contains(&self.number_of_images) {
            Ok(())
        } else {
            Err(vec![FieldError::new(
                "numberOfImages",
                count_range_message(self.number_of_images as f64),
            )])
        }
    }

    /// The character name to interpolate, ignoring blank values.
    pub fn character(&self) -> Option<&str> {
        self.character_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

fn count_range_message(value: f64) -> String {
    if value < MIN_NUMBER_OF_IMAGES as f64 {
        format!("Number must be greater than or equal to {}", MIN_NUMBER_OF_IMAGES)
    } else {
        format!("Number must be less than or equal to {}", MAX_NUMBER_OF_IMAGES)
    }
}

fn validate_count(n: &serde_json::Number) -> Result<u8, String> {
    if let Some(i) = n.as_i64() {
        return if (MIN_NUMBER_OF_IMAGES as i64..=MAX_NUMBER_OF_IMAGES as i64).contains(&i) {
            Ok(i as u8)
        } else {
            Err(count_range_message(i as f64))
        };
    }

    let f = n.as_f64().unwrap_or(f64::NAN);
    if f.is_finite() && f.fract() == 0.0 {
        // Whole floats such as 2.0 are accepted.
        return if f >= MIN_NUMBER_OF_IMAGES as f64 && f <= MAX_NUMBER_OF_IMAGES as f64 {
            Ok(f as u8)
        } else {
            Err(count_range_message(f))
        };
    }

    Err("Expected integer, received float".to_string())
}

/// Build the fixed style prompt, optionally naming a character.
pub fn build_prompt(character_name: Option<&str>) -> String {
    let as_character = character_name
        .map(|name| format!(" as {}", name))
        .unwrap_or_default();

    format!(
        "Convert this image to Family Guy animated character style{as_character}.

Family Guy style requirements:
- Simple, bold line art with thick black outlines
- Flat, solid colors with minimal shading
- Exaggerated facial features and proportions
- Large, round eyes with small pupils
- Simple geometric shapes for body parts
- The distinctive Family Guy cartoon aesthetic
- Should look like it belongs in the Family Guy TV show
- High quality, detailed, professional cartoon illustration
- Maintain the same pose and composition as the original image

Style: Family Guy animated character, cartoon illustration, thick outlines, flat colors, exaggerated features"
    )
}

/// A converted image ready to be returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedImage {
    /// Raw image bytes as produced by the model
    pub bytes: Vec<u8>,
    /// MIME type declared by the model
    pub mime_type: String,
}

impl ConvertedImage {
    /// Base64 form used in MCP image content.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

/// Conversion handler.
///
/// Holds the image generator behind an `Arc` so the server can be cloned
/// per session.
#[derive(Clone)]
pub struct ConvertHandler {
    generator: Arc<dyn ImageGenerator>,
    model: String,
}

impl ConvertHandler {
    /// Create a handler that calls `generator` with the default model.
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            generator,
            model: IMAGE_MODEL.to_string(),
        }
    }

    /// The model every request is sent to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Validate raw arguments, then convert.
    pub async fn convert_arguments(
        &self,
        arguments: Option<&Map<String, Value>>,
    ) -> Result<Vec<ConvertedImage>, Error> {
        let params = ConvertParams::from_arguments(arguments).map_err(Error::InvalidInput)?;
        self.convert(params).await
    }

    /// Redraw the supplied image in Family Guy style.
    ///
    /// Makes one generation call per requested image, in order. Any call
    /// that yields no image fails the whole conversion.
    ///
    /// # Returns
    /// * `Ok(Vec<ConvertedImage>)` - exactly `number_of_images` images
    /// * `Err(Error)` - if validation, decoding, or any upstream call fails
    #[instrument(
        level = "info",
        name = "convert_to_family_guy",
        skip(self, params),
        fields(number_of_images = params.number_of_images, has_character = params.character().is_some())
    )]
    pub async fn convert(&self, params: ConvertParams) -> Result<Vec<ConvertedImage>, Error> {
        params.validate().map_err(Error::InvalidInput)?;

        let source = decode_image_data(&params.image_data)?;
        debug!(bytes = source.bytes.len(), mime_type = %source.mime_type, "Decoded source image");

        let prompt = build_prompt(params.character());
        let request = GenerateContentRequest::for_image(prompt, &source);

        let mut images = Vec::with_capacity(params.number_of_images as usize);
        for index in 0..params.number_of_images {
            let image = self.generate_one(&request).await?;
            info!(
                index,
                bytes = image.bytes.len(),
                mime_type = %image.mime_type,
                "Received converted image"
            );
            images.push(image);
        }

        Ok(images)
    }

    async fn generate_one(&self, request: &GenerateContentRequest) -> Result<ConvertedImage, Error> {
        let response = self.generator.generate_content(&self.model, request).await?;

        let part = response
            .first_image()
            .ok_or_else(|| Error::no_image(response.missing_image_reason()))?;

        let bytes = BASE64.decode(part.data).map_err(|e| {
            Error::upstream(
                &self.model,
                200,
                format!("Model returned invalid base64 image data: {}", e),
            )
        })?;

        Ok(ConvertedImage {
            bytes,
            mime_type: part.mime_type.to_string(),
        })
    }
}
