//! Local filesystem storage implementation.
//!
//! Snapshots are written atomically (temp file, then rename) so an
//! interrupted save never leaves a truncated document behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::storage::{SnapshotFormat, SnapshotStore, decode_snapshot, encode_snapshot};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
    format: SnapshotFormat,
}

impl LocalStorage {
    /// Create a LocalStorage for the given file, inferring the encoding.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = SnapshotFormat::from_path(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SnapshotFormat {
        self.format
    }
}

/// Write bytes atomically (write to temp, then rename).
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await
}

#[async_trait]
impl SnapshotStore for LocalStorage {
    async fn load(&self) -> Result<Snapshot> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| AppError::storage(self.location(), e))?;

        let snapshot = decode_snapshot(self.format, &bytes)
            .map_err(|message| AppError::storage(self.location(), message))?;

        log::info!(
            "Loaded snapshot: {} entries, {} chapters from {}",
            snapshot.entries.len(),
            snapshot.chapter_count(),
            self.location()
        );
        Ok(snapshot)
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = encode_snapshot(self.format, snapshot)
            .map_err(|e| AppError::persist(self.location(), e))?;

        write_atomic(&self.path, &bytes)
            .await
            .map_err(|e| AppError::persist(self.location(), e))?;

        log::info!(
            "Saved snapshot: {} entries, {} chapters to {}",
            snapshot.entries.len(),
            snapshot.chapter_count(),
            self.location()
        );
        Ok(())
    }

    async fn exists(&self) -> Result<bool> {
        Ok(tokio::fs::try_exists(&self.path).await?)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
