use serde::{Deserialize, Serialize};
use surrealdb_types::{RecordId, SurrealValue};
use sy_core::AudioSample;

pub use surrealdb::types::Datetime as SurrealDatetime;

/// Sample payload as persisted inside a history entry.
#[derive(Debug, Clone, Serialize, Deserialize, SurrealValue, PartialEq, Eq)]
pub struct StoredSample {
    pub filename: String,
    pub description: String,
    pub mime: String,
    pub data: Vec<u8>,
}

impl From<AudioSample> for StoredSample {
    fn from(sample: AudioSample) -> Self {
        Self {
            filename: sample.filename,
            description: sample.description,
            mime: "audio/wav".to_string(),
            data: sample.data,
        }
    }
}

/// Record content for one persisted result. Entries are immutable once
/// written; a correction is a delete followed by a fresh create.
#[derive(Debug, Clone, Serialize, Deserialize, SurrealValue)]
pub struct HistoryEntry {
    pub entry_id: String,
    pub created_at: SurrealDatetime,
    pub image: Vec<u8>,
    pub image_mime: String,
    pub thumbnail: Vec<u8>,
    pub thumbnail_mime: String,
    pub samples: Vec<StoredSample>,
}

/// A full entry as read back from the database.
#[derive(Debug, Clone, Deserialize, SurrealValue)]
pub struct HistoryRecord {
    pub id: RecordId,
    pub entry_id: String,
    pub created_at: SurrealDatetime,
    pub image: Vec<u8>,
    pub image_mime: String,
    pub thumbnail: Vec<u8>,
    pub thumbnail_mime: String,
    pub samples: Vec<StoredSample>,
}

/// Lightweight listing row; image and sample binaries stay on disk.
#[derive(Debug, Clone, Deserialize, SurrealValue)]
pub struct HistorySummary {
    pub entry_id: String,
    pub created_at: SurrealDatetime,
    pub thumbnail: Vec<u8>,
    pub thumbnail_mime: String,
}
