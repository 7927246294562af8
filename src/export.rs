// src/export.rs

//! Publish-document export.
//!
//! One document per catalog entry in the downstream reader format. Export is
//! pure; `write_documents` is the only part that touches the filesystem.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{CatalogEntry, ChapterRecord, Snapshot};
use crate::storage::local::write_atomic;
use crate::utils::file_stem;

const UNKNOWN_CREDIT: &str = "Unknown";

/// Export document for one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishDocument {
    pub title: String,
    pub description: String,
    pub artist: String,
    pub author: String,
    pub cover: String,
    /// Keyed by the canonical ordinal string ("5", "10.5")
    pub chapters: BTreeMap<String, PublishChapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishChapter {
    pub title: String,
    pub volume: String,
    /// Provider key → image urls in reading order
    pub groups: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// Convert every entry of the snapshot, in snapshot order.
pub fn export(snapshot: &Snapshot, provider: &str) -> Vec<PublishDocument> {
    snapshot
        .entries
        .iter()
        .map(|entry| export_entry(entry, provider))
        .collect()
}

fn export_entry(entry: &CatalogEntry, provider: &str) -> PublishDocument {
    PublishDocument {
        title: entry.title.clone(),
        description: entry.description.clone(),
        artist: UNKNOWN_CREDIT.to_string(),
        author: UNKNOWN_CREDIT.to_string(),
        cover: entry.image.clone(),
        chapters: entry
            .chapters
            .iter()
            .map(|(ordinal, chapter)| (ordinal.to_string(), export_chapter(chapter, provider)))
            .collect(),
    }
}

fn export_chapter(chapter: &ChapterRecord, provider: &str) -> PublishChapter {
    let images = chapter.images.iter().map(|i| i.src.clone()).collect();
    PublishChapter {
        title: chapter.title.clone(),
        volume: String::new(),
        groups: BTreeMap::from([(provider.to_string(), images)]),
        last_updated: chapter.fetched_at.map(|t| t.timestamp().to_string()),
    }
}

/// Write each document as pretty JSON to `<dir>/<Title>.json`.
///
/// Titles that reduce to an already used file name get a `_2`, `_3`, ...
/// suffix. Returns the written paths in document order.
pub async fn write_documents(dir: &Path, documents: &[PublishDocument]) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir).await?;

    let mut used = HashSet::with_capacity(documents.len());
    let mut written = Vec::with_capacity(documents.len());
    for doc in documents {
        let base = file_stem(&doc.title);
        if base.is_empty() {
            log::warn!("Skipping export of an entry without a usable title");
            continue;
        }
        let mut stem = base.clone();
        let mut n = 1;
        while !used.insert(stem.clone()) {
            n += 1;
            stem = format!("{base}_{n}");
        }
        if n > 1 {
            log::warn!("'{}' shares the file name {}.json; writing {}.json", doc.title, base, stem);
        }
        let path = dir.join(format!("{stem}.json"));
        let json = serde_json::to_string_pretty(doc)?;
        write_atomic(&path, json.as_bytes())
            .await
            .map_err(|e| AppError::persist(path.display().to_string(), e))?;
        written.push(path);
    }

    log::debug!("Wrote {} publish documents to {}", written.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;
    use crate::models::{ImageRef, Ordinal};

    fn snapshot() -> Snapshot {
        let chapter = ChapterRecord {
            index: 5.0,
            title: "Ch5".to_string(),
            url: "/chapters/5".to_string(),
            description: String::new(),
            images: vec![ImageRef::new("a", None), ImageRef::new("b", Some("two".into()))],
            fetched_at: None,
        };
        let special = ChapterRecord {
            index: 10.5,
            title: "Ch10.5".to_string(),
            url: "/chapters/10-5".to_string(),
            description: String::new(),
            images: Vec::new(),
            fetched_at: Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
        };
        Snapshot::new(vec![CatalogEntry {
            title: "X".to_string(),
            description: "about x".to_string(),
            url: "/mangas/1/x".to_string(),
            image: "cover.png".to_string(),
            chapters: [(Ordinal::new(5.0), chapter), (Ordinal::new(10.5), special)]
                .into_iter()
                .collect(),
            id: 1,
        }])
    }

    #[test]
    fn test_export_groups_images_under_provider() {
        let docs = export(&snapshot(), "tcbscans");
        assert_eq!(docs.len(), 1);

        let doc = &docs[0];
        assert_eq!(doc.title, "X");
        assert_eq!(doc.cover, "cover.png");
        assert_eq!(doc.artist, "Unknown");
        assert_eq!(doc.chapters["5"].groups["tcbscans"], vec!["a", "b"]);
        assert_eq!(doc.chapters["5"].volume, "");
        assert!(doc.chapters["5"].last_updated.is_none());
        assert_eq!(doc.chapters["10.5"].last_updated.as_deref(), Some("1672531200"));
    }

    #[test]
    fn test_export_is_deterministic() {
        let a = serde_json::to_string(&export(&snapshot(), "tcbscans")).unwrap();
        let b = serde_json::to_string(&export(&snapshot(), "tcbscans")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_export_empty_snapshot() {
        assert!(export(&Snapshot::default(), "tcbscans").is_empty());
    }

    #[tokio::test]
    async fn test_write_documents() {
        let tmp = TempDir::new().unwrap();
        let mut snapshot = snapshot();
        snapshot.entries[0].title = "One Piece".to_string();

        let paths = write_documents(tmp.path(), &export(&snapshot, "tcbscans"))
            .await
            .unwrap();

        assert_eq!(paths, vec![tmp.path().join("One_Piece.json")]);
        let content = tokio::fs::read_to_string(&paths[0]).await.unwrap();
        let doc: PublishDocument = serde_json::from_str(&content).unwrap();
        assert_eq!(doc.title, "One Piece");
        assert_eq!(doc.chapters["5"].groups["tcbscans"], vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_write_documents_keeps_titles_with_same_file_name() {
        let tmp = TempDir::new().unwrap();
        let mut first = export(&snapshot(), "tcbscans").remove(0);
        first.title = "AC/DC".to_string();
        let mut second = first.clone();
        second.title = "ACDC".to_string();

        let paths = write_documents(tmp.path(), &[first, second]).await.unwrap();

        assert_eq!(
            paths,
            vec![tmp.path().join("ACDC.json"), tmp.path().join("ACDC_2.json")]
        );
        let content = tokio::fs::read_to_string(&paths[0]).await.unwrap();
        let doc: PublishDocument = serde_json::from_str(&content).unwrap();
        assert_eq!(doc.title, "AC/DC");
    }
}
