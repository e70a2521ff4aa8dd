//! Encoded image handling.
//!
//! Images move through the pipeline as base64 payloads, either as bare
//! base64 or as `data:image/<fmt>;base64,<payload>` URIs. Before a payload
//! reaches the provider it is normalized to raw base64 plus a recognized
//! raster mime type.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

const DEFAULT_MIME: &str = "image/png";

/// Raster formats the provider accepts as inline data.
const RECOGNIZED_MIMES: [&str; 4] = ["image/png", "image/jpeg", "image/jpg", "image/webp"];

/// A base64-encoded raster image with a normalized mime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    mime_type: String,
    data: String,
}

impl EncodedImage {
    /// Parse a data URI or bare base64 string.
    ///
    /// Bare base64 defaults to `image/png`. A data URI declaring anything
    /// other than a recognized raster format is rejected, as is a payload
    /// that does not decode as base64.
    pub fn parse(input: &str) -> Result<Self, GenerationError> {
        let trimmed = input.trim();
        let (mime_type, payload) = match trimmed.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(";base64,").ok_or_else(|| {
                    GenerationError::Configuration(
                        "image data URI is not base64-encoded".to_string(),
                    )
                })?;
                let mime = if header.is_empty() {
                    DEFAULT_MIME.to_string()
                } else {
                    header.to_ascii_lowercase()
                };
                if !RECOGNIZED_MIMES.contains(&mime.as_str()) {
                    return Err(GenerationError::Configuration(format!(
                        "unsupported image format: {mime}"
                    )));
                }
                (mime, payload)
            }
            None => (DEFAULT_MIME.to_string(), trimmed),
        };

        BASE64.decode(payload).map_err(|e| {
            GenerationError::Configuration(format!("image payload is not valid base64: {e}"))
        })?;

        Ok(Self {
            mime_type: normalize_mime(&mime_type),
            data: payload.to_string(),
        })
    }

    /// Wrap raw bytes, base64-encoding them under the given mime type.
    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Result<Self, GenerationError> {
        let mime = normalize_mime(&mime_type.to_ascii_lowercase());
        if !RECOGNIZED_MIMES.contains(&mime.as_str()) {
            return Err(GenerationError::Configuration(format!(
                "unsupported image format: {mime_type}"
            )));
        }
        Ok(Self {
            mime_type: mime,
            data: BASE64.encode(bytes),
        })
    }

    /// Wrap a base64 payload the provider returned. Undetected mime types
    /// default to `image/png`.
    pub fn from_provider_payload(data: String, mime_type: Option<&str>) -> Self {
        let mime = mime_type
            .map(|m| m.to_ascii_lowercase())
            .filter(|m| RECOGNIZED_MIMES.contains(&m.as_str()))
            .unwrap_or_else(|| DEFAULT_MIME.to_string());
        Self {
            mime_type: normalize_mime(&mime),
            data,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Raw base64 payload, without any data URI prefix.
    pub fn base64_data(&self) -> &str {
        &self.data
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decode the payload back to raw bytes.
    pub fn decode_bytes(&self) -> Result<Vec<u8>, GenerationError> {
        BASE64.decode(&self.data).map_err(|e| {
            GenerationError::Configuration(format!("image payload is not valid base64: {e}"))
        })
    }
}

/// `image/jpg` is a common alias; the provider expects `image/jpeg`.
fn normalize_mime(mime: &str) -> String {
    match mime {
        "image/jpg" => "image/jpeg".to_string(),
        other => other.to_string(),
    }
}
