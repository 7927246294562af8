//! Read-only queries over a stored snapshot.

use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::{CatalogEntry, ChapterRecord, Config, Ordinal, RegistryEntry, Snapshot};

/// Static project id → listing path mapping.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    paths: HashMap<u32, String>,
}

impl Registry {
    pub fn new(entries: &[RegistryEntry]) -> Self {
        Self {
            paths: entries
                .iter()
                .map(|e| (e.id, e.path.clone()))
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.registry)
    }

    /// Listing path registered for `id`.
    pub fn path(&self, id: u32) -> Result<&str> {
        self.paths
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| AppError::not_found(format!("project id {id} is not registered")))
    }
}

/// Entry whose url equals the registered path for `id`.
pub fn find_entry<'a>(snapshot: &'a Snapshot, registry: &Registry, id: u32) -> Result<&'a CatalogEntry> {
    let path = registry.path(id)?;
    snapshot
        .entry_by_url(path)
        .ok_or_else(|| AppError::not_found(format!("project {id} ({path}) has not been synced")))
}

pub fn find_chapter<'a>(
    snapshot: &'a Snapshot,
    registry: &Registry,
    id: u32,
    ordinal: Ordinal,
) -> Result<&'a ChapterRecord> {
    let entry = find_entry(snapshot, registry, id)?;
    entry.chapter(ordinal).ok_or_else(|| {
        AppError::not_found(format!("{} has no chapter {}", entry.title, ordinal))
    })
}

/// Chapter with the highest ordinal in the project.
pub fn latest_chapter<'a>(
    snapshot: &'a Snapshot,
    registry: &Registry,
    id: u32,
) -> Result<&'a ChapterRecord> {
    let entry = find_entry(snapshot, registry, id)?;
    entry
        .latest_chapter()
        .ok_or_else(|| AppError::not_found(format!("{} has no chapters", entry.title)))
}
