//! Storage abstractions for snapshot persistence.
//!
//! The whole catalog is stored as a single document and replaced as a unit:
//!
//! ```text
//! {root}/
//! ├── projects.json         # Snapshot (or projects.yml)
//! ├── commit_msg            # Change report of the last run
//! └── data/                 # Publish documents, one per entry
//!     └── One_Piece.json
//! ```

pub mod format;
pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Snapshot;

// Re-export for convenience
pub use format::{SNAPSHOT_VERSION, SnapshotFormat, decode_snapshot, encode_snapshot};
pub use local::LocalStorage;

/// Trait for snapshot storage backends.
///
/// Single-document read/replace: no partial updates.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the stored snapshot.
    ///
    /// Fails with `AppError::Storage` if it is missing, unreadable or malformed.
    async fn load(&self) -> Result<Snapshot>;

    /// Replace the stored snapshot.
    ///
    /// Fails with `AppError::Persist`.
    async fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// Whether a snapshot has been stored yet.
    async fn exists(&self) -> Result<bool>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}
