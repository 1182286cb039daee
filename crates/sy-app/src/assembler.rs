use std::io::{Cursor, Read};

use tracing::debug;
use zip::ZipArchive;

use sy_core::{AudioSample, Manifest};

use crate::error::AppError;

const MANIFEST_NAME: &str = "metadata.json";

/// Unpack a completed job's archive into its ordered sample list.
///
/// The manifest is required; individual binaries are not. A manifest row
/// with no matching archive entry is skipped, so a partially delivered pack
/// still yields the samples that did arrive, in manifest order.
pub fn assemble(archive: &[u8]) -> Result<Vec<AudioSample>, AppError> {
    let mut zip = ZipArchive::new(Cursor::new(archive))
        .map_err(|err| AppError::MalformedResult(format!("unreadable archive: {err}")))?;

    let manifest = read_manifest(&mut zip)?;

    let mut samples = Vec::with_capacity(manifest.samples.len());
    for entry in manifest.samples {
        let mut file = match zip.by_name(&entry.filename) {
            Ok(file) => file,
            Err(_) => {
                debug!(filename = %entry.filename, "manifest entry has no binary, skipping");
                continue;
            }
        };

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)
            .map_err(|err| AppError::MalformedResult(format!("{}: {err}", entry.filename)))?;

        samples.push(AudioSample {
            filename: entry.filename,
            description: entry.description,
            data,
        });
    }

    Ok(samples)
}

fn read_manifest(zip: &mut ZipArchive<Cursor<&[u8]>>) -> Result<Manifest, AppError> {
    let mut file = zip
        .by_name(MANIFEST_NAME)
        .map_err(|_| AppError::MalformedResult(format!("missing {MANIFEST_NAME}")))?;

    let mut raw = String::new();
    file.read_to_string(&mut raw)
        .map_err(|err| AppError::MalformedResult(format!("{MANIFEST_NAME}: {err}")))?;

    serde_json::from_str(&raw)
        .map_err(|err| AppError::MalformedResult(format!("{MANIFEST_NAME}: {err}")))
}
