//! Document photo storage on the local filesystem.
//!
//! Photos are written to the configured uploads directory and served back
//! statically under [`UPLOADS_ROUTE`].

use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;

/// Largest accepted photo, in bytes (5 MiB).
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// The only accepted photo MIME type.
pub const JPEG_MIME: &str = "image/jpeg";

/// URL prefix the uploads directory is served under.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// File left in place when the uploads directory is cleared.
const KEEP_FILE: &str = ".gitkeep";

/// Errors from the photo store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why an uploaded photo was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRejection {
    /// Not declared as `image/jpeg`.
    NotJpeg,
    /// Larger than [`MAX_PHOTO_BYTES`].
    TooLarge,
}

/// Check an upload's declared content type and size.
///
/// # Errors
///
/// Returns the first [`UploadRejection`] that applies; size is checked first.
pub fn check_upload(content_type: Option<&str>, size: usize) -> Result<(), UploadRejection> {
    if size > MAX_PHOTO_BYTES {
        return Err(UploadRejection::TooLarge);
    }
    if content_type != Some(JPEG_MIME) {
        return Err(UploadRejection::NotJpeg);
    }
    Ok(())
}

/// Generate a unique photo filename: `patient-<unix-millis>-<random>.jpg`.
#[must_use]
pub fn generate_filename() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    format!("patient-{millis}-{suffix}.jpg")
}

/// Filesystem-backed photo store.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory photos are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the uploads directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::Io {
                path: self.dir.clone(),
                source,
            })
    }

    /// Write a photo and return its public URL (`/uploads/<filename>`).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the file cannot be written.
    pub async fn store(&self, bytes: &[u8]) -> Result<String, StorageError> {
        self.ensure_dir().await?;

        let filename = generate_filename();
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StorageError::Io { path, source })?;

        tracing::debug!(filename = %filename, size = bytes.len(), "Stored document photo");
        Ok(format!("{UPLOADS_ROUTE}/{filename}"))
    }

    /// Resolve a public URL to a file inside the uploads directory.
    ///
    /// Returns `None` for URLs outside [`UPLOADS_ROUTE`] or with path separators
    /// in the filename.
    #[must_use]
    pub fn path_for(&self, url: &str) -> Option<PathBuf> {
        let filename = url.strip_prefix(UPLOADS_ROUTE)?.strip_prefix('/')?;
        if filename.is_empty()
            || filename.contains(['/', '\\'])
            || filename == ".."
            || filename == "."
        {
            return None;
        }
        Some(self.dir.join(filename))
    }

    /// Remove a stored photo. Failures are logged, never returned.
    pub async fn discard(&self, url: &str) {
        let Some(path) = self.path_for(url) else {
            return;
        };

        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove document photo");
        }
    }

    /// Delete every stored photo except `.gitkeep`. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be read or a file
    /// cannot be removed. A missing directory counts as already empty.
    pub async fn clear(&self) -> Result<usize, StorageError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StorageError::Io { path, source }
        };

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(io_err(&self.dir)(e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await.map_err(io_err(&self.dir))? {
            if entry.file_name() == KEEP_FILE {
                continue;
            }
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(io_err(&path))?;
            if file_type.is_file() {
                tokio::fs::remove_file(&path).await.map_err(io_err(&path))?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}
