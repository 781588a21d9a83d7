//! Decoding of caller-supplied image data.
//!
//! Accepts either a bare base64 string or a data URI of the form
//! `data:<mime>;base64,<payload>`. Bare base64 is assumed to be PNG.
//!
//! Decoding is lenient in the ways common clients are: `=` padding is
//! optional and the URL-safe characters `-` and `_` are accepted in place of
//! `+` and `/`.

use base64::{
    Engine as _, alphabet,
    engine::{
        DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig,
        general_purpose::STANDARD as BASE64,
    },
};
use familyguy_mcp_common::error::Error;

/// MIME type assumed when the input carries none.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// Standard alphabet, padding optional.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const DATA_URI_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Raw image bytes with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Decoded bytes
    pub bytes: Vec<u8>,
    /// MIME type, e.g. `image/jpeg`
    pub mime_type: String,
}

impl DecodedImage {
    /// Re-encode the bytes as standard padded base64.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

/// Split a data URI into `(mime_type, payload)`.
///
/// Returns `Ok(None)` when `input` is not a data URI at all.
pub fn split_data_uri(input: &str) -> Result<Option<(String, &str)>, Error> {
    let Some(rest) = input.strip_prefix(DATA_URI_SCHEME) else {
        return Ok(None);
    };

    let (mime, payload) = rest
        .split_once(BASE64_MARKER)
        .ok_or_else(|| Error::decode("data URI is not base64-encoded"))?;

    let mime = mime.trim();
    let mime = if mime.is_empty() {
        DEFAULT_MIME_TYPE.to_string()
    } else {
        mime.to_ascii_lowercase()
    };

    Ok(Some((mime, payload)))
}

/// Decode raw base64 or a base64 data URI into bytes and a MIME type.
///
/// ASCII whitespace inside the payload is ignored, padding is optional, and
/// URL-safe `-`/`_` are read as `+`/`/`.
///
/// # Errors
/// Returns `Error::Decode` if the payload is not valid base64 or decodes to
/// zero bytes.
pub fn decode_image_data(input: &str) -> Result<DecodedImage, Error> {
    let input = input.trim();
    let (mime_type, payload) = match split_data_uri(input)? {
        Some((mime, payload)) => (mime, payload),
        None => (DEFAULT_MIME_TYPE.to_string(), input),
    };

    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let bytes = LENIENT_BASE64
        .decode(compact.as_bytes())
        .map_err(|e| Error::decode(format!("invalid base64: {}", e)))?;

    if bytes.is_empty() {
        return Err(Error::decode("image data is empty"));
    }

    Ok(DecodedImage { bytes, mime_type })
}
