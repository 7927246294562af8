//! Snapshot document encodings and schema versioning.
//!
//! ```text
//! version: 1
//! entries:
//!   - Title: One Piece
//!     Url: /mangas/5/one-piece
//!     Chapters:
//!       '1052.5': { Index: 1052.5, Title: ..., Images: [...] }
//! ```
//!
//! A bare top-level sequence of entries is the pre-versioned layout; it is
//! migrated on load. Any other `version` is rejected.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{CatalogEntry, Snapshot};

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Encoding of the snapshot document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
}

impl SnapshotFormat {
    /// Pick the encoding from a file extension (`.yml`/`.yaml` → YAML).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }

    fn to_vec<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>> {
        Ok(match self {
            Self::Json => serde_json::to_vec_pretty(value)?,
            Self::Yaml => serde_yaml::to_string(value)?.into_bytes(),
        })
    }

    fn from_slice<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T> {
        Ok(match self {
            Self::Json => serde_json::from_slice(bytes)?,
            Self::Yaml => serde_yaml::from_slice(bytes)?,
        })
    }
}

#[derive(Serialize)]
struct SnapshotDocumentRef<'a> {
    version: u32,
    entries: &'a [CatalogEntry],
}

#[derive(Deserialize)]
struct SnapshotDocument {
    #[allow(dead_code)]
    version: u32,
    #[serde(default)]
    entries: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSnapshot {
    Versioned(SnapshotDocument),
    Legacy(Vec<CatalogEntry>),
}

/// Encode a snapshot as a versioned document.
pub fn encode_snapshot(format: SnapshotFormat, snapshot: &Snapshot) -> Result<Vec<u8>> {
    format.to_vec(&SnapshotDocumentRef {
        version: SNAPSHOT_VERSION,
        entries: &snapshot.entries,
    })
}

/// Decode a snapshot document, migrating the legacy layout.
///
/// Errors are returned as plain messages; the caller attaches the location.
pub fn decode_snapshot(format: SnapshotFormat, bytes: &[u8]) -> std::result::Result<Snapshot, String> {
    if let Ok(probe) = format.from_slice::<VersionProbe>(bytes) {
        if probe.version != SNAPSHOT_VERSION {
            return Err(format!(
                "unsupported snapshot schema version {} (expected {})",
                probe.version, SNAPSHOT_VERSION
            ));
        }
        return format
            .from_slice::<SnapshotDocument>(bytes)
            .map(|doc| Snapshot::new(doc.entries))
            .map_err(|e| e.to_string());
    }

    match format.from_slice::<StoredSnapshot>(bytes) {
        Ok(StoredSnapshot::Versioned(doc)) => Ok(Snapshot::new(doc.entries)),
        Ok(StoredSnapshot::Legacy(entries)) => {
            log::warn!(
                "Migrating unversioned snapshot layout ({} entries) to version {}",
                entries.len(),
                SNAPSHOT_VERSION
            );
            Ok(Snapshot::new(entries))
        }
        Err(_) => {
            // The untagged error hides the cause; report the sequence layout's.
            let detail = format
                .from_slice::<Vec<CatalogEntry>>(bytes)
                .err()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unrecognised snapshot layout".to_string());
            Err(detail)
        }
    }
}
