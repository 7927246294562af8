// src/models/mod.rs

//! Domain models for the synchronizer.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod catalog;
mod config;
mod listing;

// Re-export all public types
pub use catalog::{CatalogEntry, ChapterRecord, ImageRef, Ordinal, Snapshot, parse_ordinal};
pub use config::{
    Config, CrawlerConfig, FailurePolicy, PathsConfig, RegistryEntry, SiteSelectors, SyncConfig,
};
pub use listing::{ChapterListing, EntryListing};
