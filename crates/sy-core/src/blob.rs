use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// A binary payload together with its MIME type.
///
/// Images and audio move through the system as blobs; the base64 form only
/// exists at the transport edges (upload body, serialized history).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub data: Vec<u8>,
    pub mime: String,
}

impl Blob {
    pub fn new(data: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            data,
            mime: mime.into(),
        }
    }

    /// Guess an image MIME type from a file extension, defaulting to JPEG.
    pub fn image_mime_for_extension(ext: &str) -> &'static str {
        match ext.to_ascii_lowercase().as_str() {
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "bmp" => "image/bmp",
            _ => "image/jpeg",
        }
    }
}

pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode a base64 payload. A `data:` URL prefix, if present, is stripped
/// first so callers can pass either form.
pub fn decode(payload: &str) -> Result<Vec<u8>, BlobError> {
    let payload = match payload.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => payload,
    };
    Ok(STANDARD.decode(payload.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip() {
        let data = vec![0u8, 1, 2, 254, 255];
        assert_eq!(decode(&encode(&data)).unwrap(), data);
    }

    #[test]
    fn test_decode_strips_data_url_prefix() {
        let encoded = format!("data:image/png;base64,{}", encode(b"pixels"));
        assert_eq!(decode(&encoded).unwrap(), b"pixels");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("not base64!!!").is_err());
    }
}
