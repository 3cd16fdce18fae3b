//! Filesystem storage for uploaded CSV files.
//!
//! Uploads land in `<media_root>/csv_files/`. A stored file is never
//! overwritten: when the sanitized name is taken, a short random suffix is
//! inserted before the extension. Nothing here deletes files.

use std::io::ErrorKind;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use super::form::UploadedFile;
use crate::error::StorageError;

/// Subdirectory of the media root that holds uploaded CSV files.
pub const UPLOAD_SUBDIR: &str = "csv_files";

/// Name used when the client-supplied name sanitizes to nothing.
pub const FALLBACK_FILE_NAME: &str = "upload.csv";

/// Length of the random suffix added to colliding names.
const SUFFIX_LENGTH: usize = 7;

/// Attempts at finding a free name before giving up.
const MAX_NAME_ATTEMPTS: usize = 100;

/// Metadata about a file written by [`UploadStore::save`].
#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// Full path of the stored file
    pub path: PathBuf,

    /// Name the file was stored under (may differ from the client name)
    pub file_name: String,

    /// Size in bytes
    pub size: u64,

    /// Hex-encoded SHA-256 digest of the contents
    pub sha256: String,
}

/// Writes uploads beneath a media root directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    media_root: PathBuf,
}

impl UploadStore {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    /// Directory uploads are written to.
    pub fn upload_dir(&self) -> PathBuf {
        self.media_root.join(UPLOAD_SUBDIR)
    }

    /// Persist an uploaded file and return where it went.
    pub async fn save(&self, file: &UploadedFile) -> Result<StoredUpload, StorageError> {
        let dir = self.upload_dir();
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: dir.clone(),
                source,
            })?;

        let base_name = sanitize_file_name(&file.file_name);
        let sha256 = hex::encode(Sha256::digest(&file.data));

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let file_name = if attempt == 0 {
                base_name.clone()
            } else {
                with_random_suffix(&base_name)
            };
            let path = dir.join(&file_name);

            let mut handle = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(handle) => handle,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Upload name taken, retrying");
                    continue;
                }
                Err(source) => return Err(StorageError::Write { path, source }),
            };

            let written = async {
                handle.write_all(&file.data).await?;
                handle.flush().await
            }
            .await;
            if let Err(source) = written {
                return Err(StorageError::Write { path, source });
            }

            info!(
                path = %path.display(),
                size = file.data.len(),
                content_type = file.content_type.as_deref().unwrap_or("unknown"),
                sha256 = %sha256,
                "Stored upload"
            );

            return Ok(StoredUpload {
                path,
                file_name,
                size: file.data.len() as u64,
                sha256,
            });
        }

        Err(StorageError::NameExhausted(base_name))
    }
}

/// Reduce a client-supplied file name to a safe basename.
///
/// Directory components are discarded, spaces become underscores and
/// anything outside `[A-Za-z0-9_.-]` is dropped.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("").trim();

    let cleaned: String = base
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned
    }
}

fn with_random_suffix(name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    let suffix = &token[..SUFFIX_LENGTH];
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", name, suffix),
    }
}
