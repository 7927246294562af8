//! Service layer for the synchronizer.
//!
//! This module contains the remote-facing collaborators:
//! - Catalog, chapter and image listing (`CatalogSource`, `TcbScansSource`)
//! - Outbound request throttling (`RateLimiter`, `GovernorLimiter`)

mod limiter;
mod tcbscans;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChapterListing, EntryListing, ImageRef};

pub use limiter::{GovernorLimiter, RateLimiter};
pub use tcbscans::TcbScansSource;

/// Remote catalog as seen "right now".
///
/// Every call may fail with `AppError::Network` or `AppError::Parse`.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// List the catalog entries currently published.
    async fn fetch_catalog_entries(&self) -> Result<Vec<EntryListing>>;

    /// List the chapters of one entry.
    async fn fetch_chapter_list(&self, listing_url: &str) -> Result<Vec<ChapterListing>>;

    /// List the page images of one chapter, in reading order.
    async fn fetch_chapter_images(&self, source_url: &str) -> Result<Vec<ImageRef>>;
}
