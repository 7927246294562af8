// src/models/catalog.rs

//! Catalog entries, chapter records, image references and ordinals.
//!
//! Field names are PascalCase on disk (`Title`, `Chapters`, `Images`, ...) so
//! snapshots stay readable by older tooling that wrote the same layout.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AppError, Result};
use crate::models::ChapterListing;

static ORDINAL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9.]+").expect("ordinal pattern is valid"));

/// Numeric chapter position parsed from a chapter title.
///
/// Totally ordered (via `f64::total_cmp`) so it can key a `BTreeMap`.
/// Displays as the shortest decimal that round-trips: `5`, `10.5`, `1052.5`.
#[derive(Debug, Clone, Copy)]
pub struct Ordinal(f64);

impl Ordinal {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Ordinal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ordinal {}

impl PartialOrd for Ordinal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ordinal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for Ordinal {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Ordinal {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<f64>()
            .map(Self)
            .map_err(|e| AppError::parse(format!("ordinal '{s}'"), e))
    }
}

impl Serialize for Ordinal {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Ordinal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrdinalVisitor;

        impl Visitor<'_> for OrdinalVisitor {
            type Value = Ordinal;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a chapter ordinal as a number or decimal string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Ordinal, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Ordinal, E> {
                Ok(Ordinal(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Ordinal, E> {
                Ok(Ordinal(v as f64))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Ordinal, E> {
                Ok(Ordinal(v as f64))
            }
        }

        deserializer.deserialize_any(OrdinalVisitor)
    }
}

/// Extract the ordinal from a chapter title.
///
/// Takes the first run of digits and `.` characters, so
/// `"Chapter 1052.5 - Title"` yields `1052.5`.
pub fn parse_ordinal(title: &str) -> Result<Ordinal> {
    let token = ORDINAL_TOKEN
        .find(title)
        .ok_or_else(|| AppError::parse(format!("chapter '{title}'"), "no numeric ordinal"))?;

    token
        .as_str()
        .parse::<f64>()
        .map(Ordinal)
        .map_err(|e| AppError::parse(format!("chapter '{title}'"), e))
}

/// A single page image of a chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageRef {
    /// Image source URL
    pub src: String,

    /// Alternative text, when the page provides one
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub alt: Option<String>,
}

impl ImageRef {
    pub fn new(src: impl Into<String>, alt: Option<String>) -> Self {
        Self {
            src: src.into(),
            alt,
        }
    }
}

/// One installment of a catalog entry.
///
/// The permalink (`url`) identifies the chapter; the ordinal is derived
/// from title text and may collide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChapterRecord {
    pub index: f64,

    pub title: String,

    /// Chapter permalink
    pub url: String,

    #[serde(default)]
    pub description: String,

    /// Page images in reading order; empty until fetched
    #[serde(default)]
    pub images: Vec<ImageRef>,

    /// When the images were fetched
    #[serde(
        rename = "Date",
        default,
        skip_serializing_if = "Option::is_none",
        with = "fetched_at"
    )]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl ChapterRecord {
    /// Build a freshly fetched record from a chapter listing.
    pub fn fetched(
        listing: &ChapterListing,
        ordinal: Ordinal,
        images: Vec<ImageRef>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            index: ordinal.value(),
            title: listing.title.clone(),
            url: listing.source_url.clone(),
            description: listing.description.clone(),
            images,
            fetched_at: Some(fetched_at),
        }
    }

    pub fn ordinal(&self) -> Ordinal {
        Ordinal(self.index)
    }
}

/// One tracked series on the remote site.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogEntry {
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Listing path on the remote site; the entry's stable key
    pub url: String,

    /// Cover image URL
    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub chapters: BTreeMap<Ordinal, ChapterRecord>,

    #[serde(default)]
    pub id: u32,
}

impl CatalogEntry {
    /// Chapter with the highest ordinal.
    pub fn latest_chapter(&self) -> Option<&ChapterRecord> {
        self.chapters.values().next_back()
    }

    pub fn chapter(&self, ordinal: Ordinal) -> Option<&ChapterRecord> {
        self.chapters.get(&ordinal)
    }
}

/// Full local state of the catalog; the unit of load and save.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub entries: Vec<CatalogEntry>,
}

impl Snapshot {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry_by_url(&self, url: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.url == url)
    }

    pub fn chapter_count(&self) -> usize {
        self.entries.iter().map(|e| e.chapters.len()).sum()
    }

    pub fn image_count(&self) -> usize {
        self.entries
            .iter()
            .flat_map(|e| e.chapters.values())
            .map(|c| c.images.len())
            .sum()
    }
}

fn empty_as_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// RFC 3339 on write; also accepts `""` and epoch-millisecond strings on read.
mod fetched_at {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(None),
        };
        let raw = raw.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(dt.with_timezone(&Utc)));
        }
        raw.parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("unrecognised chapter date '{raw}'")))
    }
}
