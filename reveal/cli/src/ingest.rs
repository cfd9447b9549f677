//! Photo folder ingestion
//!
//! Picks up every image file directly inside a directory, sorted by file name.
//! Sub-directories and non-image files are skipped.

use std::path::Path;

use anyhow::{Context, Result};
use reveal_core::PhotoEntry;

/// Extensions treated as images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff", "heic", "heif", "avif",
];

/// Whether `path` names a file we treat as an image
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Load the photos in `dir`
pub fn scan_photo_dir(dir: &Path) -> Result<Vec<PhotoEntry>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read photo directory: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() || !is_image(&path) {
            tracing::trace!(path = %path.display(), "Skipping non-image entry");
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        files.push((name, path));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    tracing::debug!(dir = %dir.display(), count = files.len(), "Scanned photo directory");

    Ok(files
        .into_iter()
        .map(|(name, path)| PhotoEntry::ingest(path.to_string_lossy(), name))
        .collect())
}
