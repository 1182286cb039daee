pub mod display;
pub mod entry;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};
use tracing::{info, warn};
use uuid::Uuid;

use sy_core::{AudioSample, Blob};

use crate::error::AppError;
use crate::history::display::DisplayEntry;
use crate::history::entry::{
    HistoryEntry, HistoryRecord, HistorySummary, StoredSample, SurrealDatetime,
};

const HISTORY: &str = "history";
const THUMBNAIL_MAX_EDGE: u32 = 150;
const THUMBNAIL_JPEG_QUALITY: u8 = 80;

/// Durable local cache of past generation results, one record per entry.
///
/// Each write is a single record transaction, so an entry is either fully
/// persisted (image, samples and thumbnail) or absent.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    db: Surreal<Db>,
}

impl HistoryStore {
    /// Open the embedded database (RocksDB backed, file based).
    pub async fn open(path: PathBuf) -> Result<Self, AppError> {
        info!(path = %path.display(), "opening history store");

        std::fs::create_dir_all(&path)?;

        let db = Surreal::new::<RocksDb>(path).await?;
        db.use_ns("synesthesia").use_db("history").await?;

        Ok(Self { db })
    }

    /// Persist a new entry, deriving its thumbnail, and return the minted id.
    pub async fn create(
        &self,
        image: Blob,
        samples: Vec<AudioSample>,
    ) -> Result<String, AppError> {
        let thumbnail = derive_thumbnail(&image);
        let entry = HistoryEntry {
            entry_id: Uuid::new_v4().to_string(),
            created_at: SurrealDatetime::from(Utc::now()),
            image: image.data,
            image_mime: image.mime,
            thumbnail: thumbnail.data,
            thumbnail_mime: thumbnail.mime,
            samples: samples.into_iter().map(StoredSample::from).collect(),
        };

        let entry_id = entry.entry_id.clone();
        self.insert(entry).await?;
        Ok(entry_id)
    }

    pub(crate) async fn insert(&self, entry: HistoryEntry) -> Result<(), AppError> {
        let _: Option<HistoryRecord> = self
            .db
            .create((HISTORY, entry.entry_id.clone()))
            .content(entry)
            .await?;

        Ok(())
    }

    /// Insert-or-overwrite by entry id. Entries are immutable, so an
    /// overwrite is a delete followed by a fresh create.
    pub(crate) async fn upsert(&self, entry: HistoryEntry) -> Result<(), AppError> {
        let _: Option<HistoryRecord> = self.db.delete((HISTORY, entry.entry_id.clone())).await?;
        self.insert(entry).await
    }

    /// Listing rows ordered newest first. Full binaries are not loaded here;
    /// only the thumbnail travels with the summary.
    pub async fn list_all(&self) -> Result<Vec<HistorySummary>, AppError> {
        let mut response = self
            .db
            .query(
                "SELECT entry_id, created_at, thumbnail, thumbnail_mime \
                 FROM history ORDER BY created_at DESC",
            )
            .await?;

        let summaries: Vec<HistorySummary> = response.take(0)?;
        Ok(summaries)
    }

    pub async fn get(&self, entry_id: &str) -> Result<HistoryRecord, AppError> {
        let record: Option<HistoryRecord> = self.db.select((HISTORY, entry_id)).await?;
        record.ok_or_else(|| AppError::NotFound(entry_id.to_string()))
    }

    /// Remove one entry. Deleting an id that does not exist is a no-op.
    pub async fn delete(&self, entry_id: &str) -> Result<(), AppError> {
        let _: Option<HistoryRecord> = self.db.delete((HISTORY, entry_id)).await?;
        Ok(())
    }

    /// Remove every entry. Clearing an empty store is a no-op.
    pub async fn clear(&self) -> Result<(), AppError> {
        let _: Vec<HistoryRecord> = self.db.delete(HISTORY).await?;
        Ok(())
    }

    /// Every full record, newest first. Used by export and sync.
    pub(crate) async fn dump_all(&self) -> Result<Vec<HistoryRecord>, AppError> {
        let mut records: Vec<HistoryRecord> = match self.db.select(HISTORY).await {
            Ok(records) => records,
            // Table might not exist yet, treat as empty
            Err(_) => return Ok(Vec::new()),
        };

        records.sort_by(|a, b| {
            let time_a: DateTime<Utc> = a.created_at.clone().into();
            let time_b: DateTime<Utc> = b.created_at.clone().into();
            time_b.cmp(&time_a)
        });

        Ok(records)
    }

    /// Materialize an entry's binaries as session-scoped playable files.
    /// The caller owns releasing the returned handles.
    pub fn to_display_format(&self, record: &HistoryRecord) -> Result<DisplayEntry, AppError> {
        display::materialize(record)
    }
}

/// Shrink the image so its longer edge is at most 150, re-encoded as JPEG.
/// Derivation failure keeps the original image; it never fails a create.
fn derive_thumbnail(image: &Blob) -> Blob {
    match try_derive_thumbnail(&image.data) {
        Ok(thumbnail) => thumbnail,
        Err(err) => {
            warn!(error = %err, "thumbnail derivation failed, keeping original image");
            image.clone()
        }
    }
}

fn try_derive_thumbnail(data: &[u8]) -> Result<Blob, image::ImageError> {
    let original = image::load_from_memory(data)?;
    let scaled = original.thumbnail(THUMBNAIL_MAX_EDGE, THUMBNAIL_MAX_EDGE);
    // JPEG has no alpha channel
    let scaled = image::DynamicImage::ImageRgb8(scaled.to_rgb8());

    let mut buf = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buf);
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, THUMBNAIL_JPEG_QUALITY);
    scaled.write_with_encoder(encoder)?;

    Ok(Blob::new(buf, "image/jpeg"))
}
