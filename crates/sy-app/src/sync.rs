pub mod remote;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use sy_core::{AudioSample, Blob, SerializedHistoryEntry, SerializedSample, blob};

use crate::error::AppError;
use crate::history::HistoryStore;
use crate::history::entry::{HistoryEntry, HistoryRecord, StoredSample, SurrealDatetime};
use crate::sync::remote::RemoteHistory;

fn to_serialized(record: &HistoryRecord) -> SerializedHistoryEntry {
    let created: DateTime<Utc> = record.created_at.clone().into();
    SerializedHistoryEntry {
        id: record.entry_id.clone(),
        timestamp: created.timestamp_millis(),
        image: blob::encode(&record.image),
        image_mime: record.image_mime.clone(),
        thumbnail: blob::encode(&record.thumbnail),
        thumbnail_mime: record.thumbnail_mime.clone(),
        samples: record
            .samples
            .iter()
            .map(|sample| SerializedSample {
                filename: sample.filename.clone(),
                description: sample.description.clone(),
                mime: sample.mime.clone(),
                audio: blob::encode(&sample.data),
            })
            .collect(),
    }
}

fn to_entry(serialized: &SerializedHistoryEntry) -> Result<HistoryEntry, AppError> {
    let created = DateTime::from_timestamp_millis(serialized.timestamp)
        .ok_or_else(|| AppError::Sync(format!("invalid timestamp {}", serialized.timestamp)))?;

    let mut samples = Vec::with_capacity(serialized.samples.len());
    for sample in &serialized.samples {
        samples.push(StoredSample {
            filename: sample.filename.clone(),
            description: sample.description.clone(),
            mime: sample.mime.clone(),
            data: decode_field(&sample.audio, &sample.filename)?,
        });
    }

    Ok(HistoryEntry {
        entry_id: serialized.id.clone(),
        created_at: SurrealDatetime::from(created),
        image: decode_field(&serialized.image, "image")?,
        image_mime: serialized.image_mime.clone(),
        thumbnail: decode_field(&serialized.thumbnail, "thumbnail")?,
        thumbnail_mime: serialized.thumbnail_mime.clone(),
        samples,
    })
}

fn decode_field(payload: &str, field: &str) -> Result<Vec<u8>, AppError> {
    blob::decode(payload).map_err(|err| AppError::Sync(format!("{field}: {err}")))
}

/// Serialize every local entry, store order preserved.
pub async fn export_entries(store: &HistoryStore) -> Result<Vec<SerializedHistoryEntry>, AppError> {
    Ok(store.dump_all().await?.iter().map(to_serialized).collect())
}

/// The full history as one JSON document.
pub async fn export(store: &HistoryStore) -> Result<String, AppError> {
    let entries = export_entries(store).await?;
    serde_json::to_string(&entries).map_err(|err| AppError::Sync(err.to_string()))
}

/// Upsert a batch of serialized entries, optionally clearing first.
/// Re-running the same import is a no-op for the entry population.
///
/// The whole document is converted before the store is touched: one bad
/// base64 field or timestamp rejects the import and existing entries stay
/// intact.
pub async fn import_entries(
    store: &HistoryStore,
    entries: Vec<SerializedHistoryEntry>,
    replace: bool,
) -> Result<usize, AppError> {
    let mut converted = Vec::with_capacity(entries.len());
    for serialized in &entries {
        converted.push(to_entry(serialized)?);
    }

    if replace {
        store.clear().await?;
    }

    let count = converted.len();
    for entry in converted {
        store.upsert(entry).await?;
    }

    Ok(count)
}

/// Parse and import a JSON history document.
pub async fn import(
    store: &HistoryStore,
    document: &str,
    replace: bool,
) -> Result<usize, AppError> {
    let entries: Vec<SerializedHistoryEntry> = serde_json::from_str(document)
        .map_err(|err| AppError::Sync(format!("malformed history document: {err}")))?;
    import_entries(store, entries, replace).await
}

/// Bidirectional synchronization between the local store and the remote
/// document store.
///
/// The `*_with_sync` operations complete the local mutation before
/// returning; the remote push runs on a spawned task and its failure is
/// logged, never propagated. Local state stays authoritative.
#[derive(Clone)]
pub struct SyncBridge {
    store: HistoryStore,
    remote: Arc<dyn RemoteHistory>,
}

impl SyncBridge {
    pub fn new(store: HistoryStore, remote: Arc<dyn RemoteHistory>) -> Self {
        Self { store, remote }
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Overwrite the remote document with the full local population.
    pub async fn push_to_remote(&self) -> Result<(), AppError> {
        let entries = export_entries(&self.store).await?;
        self.remote.replace_all(&entries).await
    }

    /// Fetch the remote document and merge it in. A missing or empty
    /// document means zero entries, not an error.
    pub async fn pull_from_remote(&self, replace: bool) -> Result<usize, AppError> {
        let entries = self.remote.fetch().await?;
        import_entries(&self.store, entries, replace).await
    }

    pub async fn save_with_sync(
        &self,
        image: Blob,
        samples: Vec<AudioSample>,
    ) -> Result<String, AppError> {
        let entry_id = self.store.create(image, samples).await?;
        self.spawn_push();
        Ok(entry_id)
    }

    pub async fn delete_with_sync(&self, entry_id: &str) -> Result<(), AppError> {
        self.store.delete(entry_id).await?;
        self.spawn_push();
        Ok(())
    }

    pub async fn clear_with_sync(&self) -> Result<(), AppError> {
        self.store.clear().await?;

        let remote = Arc::clone(&self.remote);
        tokio::spawn(async move {
            if let Err(err) = remote.clear().await {
                warn!(error = %err, "background remote history clear failed");
            }
        });

        Ok(())
    }

    fn spawn_push(&self) {
        let bridge = self.clone();
        tokio::spawn(async move {
            if let Err(err) = bridge.push_to_remote().await {
                warn!(error = %err, "background history push failed");
            }
        });
    }
}
