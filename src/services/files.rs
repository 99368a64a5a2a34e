//! Stored upload handling. Files are written under the configured public
//! uploads root by the upload layer before the services run; rows only keep
//! the relative path. Deletion failures are logged and swallowed so a missing
//! file never blocks a database operation that already succeeded.

use std::path::PathBuf;

use serde::Deserialize;

use crate::config::config;

/// Reference to a file already stored under the uploads root.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Path relative to the uploads root.
    pub file_path: String,
    pub mime_type: String,
}

fn absolute_path(relative: &str) -> PathBuf {
    PathBuf::from(&config().uploads.public_dir).join(relative)
}

/// Remove one stored file from disk.
pub fn delete_stored_file(relative: &str) {
    let path = absolute_path(relative);
    if let Err(err) = std::fs::remove_file(&path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("failed to delete stored file {}: {}", path.display(), err);
        }
    }
}

/// Remove every file in a rejected upload batch.
pub fn discard_files(files: &[UploadedFile]) {
    for file in files {
        delete_stored_file(&file.file_path);
    }
}
