//! Pipeline entry points for catalog synchronization.
//!
//! - `run_sync`: Sync the catalog, write publish documents and the change report
//! - `run_export`: Regenerate publish documents from the stored snapshot
//! - `lookup`: Read-only queries over a stored snapshot

pub mod index;
pub mod lookup;
pub mod report;
pub mod run;
pub mod sync;

pub use index::ExistingIndex;
pub use lookup::{Registry, find_chapter, find_entry, latest_chapter};
pub use report::{ChangeReport, EntryFailure};
pub use run::{run_export, run_sync};
pub use sync::{SyncEngine, SyncMode, SyncOptions, SyncOutcome};
