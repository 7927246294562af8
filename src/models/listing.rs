//! Records produced by the remote catalog collaborators.

use serde::{Deserialize, Serialize};

/// A catalog entry as currently listed on the remote site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryListing {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub cover_url: String,
    /// Listing path, e.g. `/mangas/5/one-piece`
    pub listing_url: String,
}

/// A chapter row from an entry's listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterListing {
    /// Chapter permalink
    pub source_url: String,
    pub title: String,
    pub description: String,
}
