use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::history::entry::HistoryRecord;

/// A session-scoped playable reference backed by a temp file.
///
/// Handles are never reclaimed automatically: whoever materialized one must
/// call `release` when the file is no longer displayed, or the temp
/// directory grows without bound.
#[derive(Debug)]
pub struct DisplayHandle {
    pub filename: String,
    pub description: Option<String>,
    pub mime: String,
    path: PathBuf,
}

impl DisplayHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(self) {
        if let Err(err) = fs::remove_file(&self.path) {
            debug!(path = %self.path.display(), error = %err, "failed to remove display file");
        }
    }
}

#[derive(Debug)]
pub struct DisplayEntry {
    pub image: DisplayHandle,
    pub samples: Vec<DisplayHandle>,
}

impl DisplayEntry {
    pub fn release(self) {
        self.image.release();
        for sample in self.samples {
            sample.release();
        }
    }
}

/// Write an entry's binaries out as playable files.
pub fn materialize(record: &HistoryRecord) -> Result<DisplayEntry, AppError> {
    let root = std::env::temp_dir()
        .join("synesthesia-display")
        .join(Uuid::new_v4().to_string());
    fs::create_dir_all(&root)?;

    let image_name = format!("image.{}", extension_for(&record.image_mime));
    let image = write_handle(&root, &image_name, None, &record.image_mime, &record.image)?;

    let mut samples = Vec::with_capacity(record.samples.len());
    for sample in &record.samples {
        samples.push(write_handle(
            &root,
            &sample.filename,
            Some(sample.description.clone()),
            &sample.mime,
            &sample.data,
        )?);
    }

    Ok(DisplayEntry { image, samples })
}

fn write_handle(
    root: &Path,
    filename: &str,
    description: Option<String>,
    mime: &str,
    data: &[u8],
) -> Result<DisplayHandle, AppError> {
    let path = root.join(filename);
    fs::write(&path, data)?;
    Ok(DisplayHandle {
        filename: filename.to_string(),
        description,
        mime: mime.to_string(),
        path,
    })
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/jpeg" => "jpg",
        "audio/wav" => "wav",
        "audio/mpeg" => "mp3",
        _ => "bin",
    }
}
