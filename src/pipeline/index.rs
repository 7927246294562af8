//! Index of chapters already present in the loaded snapshot.
//!
//! Built once per run from the prior snapshot and only read while entry
//! workers classify chapters, so no worker ever sees a partially updated view.

use std::collections::HashMap;

use crate::models::{ChapterRecord, Snapshot};

/// Read-only `permalink → record` view over a snapshot.
#[derive(Debug, Default)]
pub struct ExistingIndex<'a> {
    by_url: HashMap<&'a str, &'a ChapterRecord>,
}

impl<'a> ExistingIndex<'a> {
    /// Index every chapter of every entry.
    ///
    /// If the same permalink appears under two entries the first one wins.
    pub fn build(snapshot: &'a Snapshot) -> Self {
        let mut by_url = HashMap::with_capacity(snapshot.chapter_count());
        for chapter in snapshot.entries.iter().flat_map(|e| e.chapters.values()) {
            by_url.entry(chapter.url.as_str()).or_insert(chapter);
        }
        Self { by_url }
    }

    pub fn get(&self, source_url: &str) -> Option<&'a ChapterRecord> {
        self.by_url.get(source_url).copied()
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }
}
