use serde::{Deserialize, Serialize};

/// JSON-transportable projection of a history entry.
///
/// Binaries are base64 strings with their MIME types alongside, and the
/// timestamp is Unix milliseconds. This shape is used for export, import and
/// remote sync only; primary storage keeps raw bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerializedHistoryEntry {
    pub id: String,
    pub timestamp: i64,
    pub image: String,
    pub image_mime: String,
    pub thumbnail: String,
    pub thumbnail_mime: String,
    pub samples: Vec<SerializedSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerializedSample {
    pub filename: String,
    pub description: String,
    pub mime: String,
    pub audio: String,
}
