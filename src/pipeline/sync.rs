// src/pipeline/sync.rs

//! Catalog synchronization engine.
//!
//! One run:
//! 1. load the prior snapshot,
//! 2. index its chapters by permalink (incremental runs only),
//! 3. fetch the catalog,
//! 4. fan out one worker per entry that lists its chapters, adopts known
//!    ones verbatim and fetches images for the rest,
//! 5. join, then merge every worker's result into a new snapshot,
//! 6. save it.
//!
//! Workers never share mutable state: each returns its entry's chapter map
//! and added titles tagged with its catalog slot, and only the orchestrator
//! assembles the snapshot after all of them have finished.

use std::collections::{BTreeMap, HashMap, HashSet, btree_map};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::error::{AppError, Result};
use crate::models::{
    CatalogEntry, ChapterListing, ChapterRecord, Config, EntryListing, FailurePolicy, Ordinal,
    Snapshot, parse_ordinal,
};
use crate::pipeline::{ChangeReport, EntryFailure, ExistingIndex};
use crate::services::{CatalogSource, RateLimiter};
use crate::storage::SnapshotStore;

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Deadline for each outbound fetch
    pub fetch_timeout: Duration,
    /// Entries processed at once, and chapter image fetches at once per entry
    pub max_concurrent: usize,
    pub failure_policy: FailurePolicy,
}

impl SyncOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fetch_timeout: config.crawler.timeout(),
            max_concurrent: config.crawler.max_concurrent.max(1),
            failure_policy: config.sync.failure_policy,
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Whether known chapters are adopted or refetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Fetch images only for chapters missing from the snapshot
    Incremental,
    /// Fetch images for every listed chapter
    Full,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// The snapshot that was saved
    pub snapshot: Snapshot,
    pub report: ChangeReport,
}

/// What one entry worker produced.
#[derive(Debug, Default)]
struct EntrySync {
    chapters: BTreeMap<Ordinal, ChapterRecord>,
    added: Vec<String>,
}

/// A listed chapter after classification.
enum Planned {
    Known(ChapterRecord),
    Unknown(ChapterListing),
}

impl Planned {
    fn url(&self) -> &str {
        match self {
            Self::Known(record) => &record.url,
            Self::Unknown(row) => &row.source_url,
        }
    }
}

/// Orchestrates a synchronization run over the injected collaborators.
pub struct SyncEngine {
    store: Arc<dyn SnapshotStore>,
    source: Arc<dyn CatalogSource>,
    limiter: Arc<dyn RateLimiter>,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        source: Arc<dyn CatalogSource>,
        limiter: Arc<dyn RateLimiter>,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            source,
            limiter,
            options,
        }
    }

    /// Fetch images only for chapters not already in the stored snapshot.
    ///
    /// Requires a readable snapshot; a missing or corrupt one fails before
    /// anything is fetched.
    pub async fn sync_incremental(&self) -> Result<SyncOutcome> {
        let prior = self.store.load().await?;
        self.run(prior, SyncMode::Incremental).await
    }

    /// Refetch images for every listed chapter.
    ///
    /// Starts from the stored snapshot if there is one (so unlisted entries
    /// survive) and from nothing otherwise.
    pub async fn sync_full(&self) -> Result<SyncOutcome> {
        let prior = if self.store.exists().await? {
            self.store.load().await?
        } else {
            log::info!(
                "No snapshot at {}, bootstrapping from the remote catalog",
                self.store.location()
            );
            Snapshot::default()
        };
        self.run(prior, SyncMode::Full).await
    }

    async fn run(&self, prior: Snapshot, mode: SyncMode) -> Result<SyncOutcome> {
        let index = match mode {
            SyncMode::Incremental => {
                let index = ExistingIndex::build(&prior);
                log::info!("{} chapters already known", index.len());
                Some(index)
            }
            SyncMode::Full => None,
        };

        // Listing the catalog spans several requests; the source bounds each one.
        self.limiter.acquire().await;
        let listings = self.source.fetch_catalog_entries().await?;
        let listings = dedupe_listings(listings);
        log::info!("Catalog lists {} entries", listings.len());

        let results = self.fan_out(&listings, index.as_ref()).await;
        let (snapshot, report) = merge(&prior, &listings, results, self.options.failure_policy)?;

        if let Err(e) = self.store.save(&snapshot).await {
            log::error!(
                "Fetched {} new chapters but could not save them: {}",
                report.added.len(),
                e
            );
            return Err(e);
        }

        Ok(SyncOutcome { snapshot, report })
    }

    /// Run one worker per entry; results come back sorted by catalog slot.
    async fn fan_out(
        &self,
        listings: &[EntryListing],
        index: Option<&ExistingIndex<'_>>,
    ) -> Vec<(usize, Result<EntrySync>)> {
        let mut results: Vec<(usize, Result<EntrySync>)> = stream::iter(listings.iter().enumerate())
            .map(|(slot, listing)| async move { (slot, self.sync_entry(listing, index).await) })
            .buffer_unordered(self.options.max_concurrent.max(1))
            .collect()
            .await;

        results.sort_by_key(|(slot, _)| *slot);
        results
    }

    async fn sync_entry(
        &self,
        listing: &EntryListing,
        index: Option<&ExistingIndex<'_>>,
    ) -> Result<EntrySync> {
        let rows = self
            .guarded(
                &listing.listing_url,
                self.source.fetch_chapter_list(&listing.listing_url),
            )
            .await?;

        let mut seen = HashSet::with_capacity(rows.len());
        let mut plan: BTreeMap<Ordinal, Planned> = BTreeMap::new();
        for row in rows {
            if !seen.insert(row.source_url.clone()) {
                log::warn!("{}: chapter {} listed twice", listing.title, row.source_url);
                continue;
            }
            let (ordinal, planned) = match index.and_then(|idx| idx.get(&row.source_url)) {
                Some(known) => (known.ordinal(), Planned::Known(known.clone())),
                None => (parse_ordinal(&row.title)?, Planned::Unknown(row)),
            };
            settle(&listing.title, &mut plan, ordinal, planned);
        }

        let unknown: Vec<(Ordinal, &ChapterListing)> = plan
            .iter()
            .filter_map(|(ordinal, p)| match p {
                Planned::Unknown(row) => Some((*ordinal, row)),
                Planned::Known(_) => None,
            })
            .collect();
        log::debug!(
            "{}: {} chapters listed, {} to fetch",
            listing.title,
            plan.len(),
            unknown.len()
        );

        let fetched: Vec<ChapterRecord> = stream::iter(unknown)
            .map(|(ordinal, row)| self.fetch_chapter(ordinal, row))
            .buffered(self.options.max_concurrent.max(1))
            .try_collect()
            .await?;

        let mut result = EntrySync::default();
        for record in fetched {
            result.added.push(record.title.clone());
            result.chapters.insert(record.ordinal(), record);
        }
        for (ordinal, planned) in plan {
            if let Planned::Known(record) = planned {
                result.chapters.insert(ordinal, record);
            }
        }
        Ok(result)
    }

    async fn fetch_chapter(&self, ordinal: Ordinal, row: &ChapterListing) -> Result<ChapterRecord> {
        let images = self
            .guarded(&row.source_url, self.source.fetch_chapter_images(&row.source_url))
            .await?;
        if images.is_empty() {
            log::warn!("{} has no images", row.title);
        }
        log::info!("new {}", row.title);
        Ok(ChapterRecord::fetched(row, ordinal, images, Utc::now()))
    }

    /// Take a limiter slot, then run the fetch under the deadline.
    async fn guarded<T>(
        &self,
        target: &str,
        fetch: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        self.limiter.acquire().await;
        let deadline = self.options.fetch_timeout;
        tokio::time::timeout(deadline, fetch)
            .await
            .map_err(|_| AppError::network(target, format!("no response within {deadline:?}")))?
    }
}

/// Add a listed chapter to the plan, resolving ordinal collisions.
///
/// A stored record beats a new row at the same ordinal; otherwise the later
/// row wins. Rows that lose are never fetched.
fn settle(entry: &str, plan: &mut BTreeMap<Ordinal, Planned>, ordinal: Ordinal, candidate: Planned) {
    match plan.entry(ordinal) {
        btree_map::Entry::Vacant(slot) => {
            slot.insert(candidate);
        }
        btree_map::Entry::Occupied(mut slot) => {
            if matches!(slot.get(), Planned::Known(_)) && matches!(candidate, Planned::Unknown(_)) {
                log::warn!(
                    "{}: ordinal {} already stored as {}; ignoring {}",
                    entry,
                    ordinal,
                    slot.get().url(),
                    candidate.url()
                );
            } else {
                log::warn!(
                    "{}: ordinal {} listed by {} and {}; keeping the later one",
                    entry,
                    ordinal,
                    slot.get().url(),
                    candidate.url()
                );
                slot.insert(candidate);
            }
        }
    }
}

/// Keep the first listing for each listing path.
fn dedupe_listings(listings: Vec<EntryListing>) -> Vec<EntryListing> {
    let mut seen = HashSet::with_capacity(listings.len());
    listings
        .into_iter()
        .filter(|l| {
            let first = seen.insert(l.listing_url.clone());
            if !first {
                log::warn!("Catalog lists {} twice", l.listing_url);
            }
            first
        })
        .collect()
}

fn entry_from(listing: &EntryListing, chapters: BTreeMap<Ordinal, ChapterRecord>) -> CatalogEntry {
    CatalogEntry {
        title: listing.title.clone(),
        description: listing.description.clone(),
        url: listing.listing_url.clone(),
        image: listing.cover_url.clone(),
        chapters,
        id: listing.id,
    }
}

/// Assemble the new snapshot from the prior one and the workers' results.
///
/// Prior entries keep their position; each listed entry that synced is
/// replaced wholesale, unlisted or failed ones stay as they were, and entries
/// seen for the first time are appended in catalog order.
fn merge(
    prior: &Snapshot,
    listings: &[EntryListing],
    results: Vec<(usize, Result<EntrySync>)>,
    policy: FailurePolicy,
) -> Result<(Snapshot, ChangeReport)> {
    let mut report = ChangeReport::default();
    let mut synced: HashMap<&str, CatalogEntry> = HashMap::with_capacity(results.len());

    for (slot, result) in results {
        let listing = &listings[slot];
        match result {
            Ok(entry_sync) => {
                report.added.extend(entry_sync.added);
                synced.insert(
                    listing.listing_url.as_str(),
                    entry_from(listing, entry_sync.chapters),
                );
            }
            Err(e) if policy == FailurePolicy::Abort => {
                log::error!("{} failed, aborting run: {}", listing.title, e);
                return Err(e);
            }
            Err(e) => {
                log::warn!("{} skipped: {}", listing.title, e);
                report.failures.push(EntryFailure {
                    url: listing.listing_url.clone(),
                    title: listing.title.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let mut entries = Vec::with_capacity(prior.entries.len() + synced.len());
    for entry in &prior.entries {
        entries.push(
            synced
                .remove(entry.url.as_str())
                .unwrap_or_else(|| entry.clone()),
        );
    }
    for listing in listings {
        if let Some(entry) = synced.remove(listing.listing_url.as_str()) {
            entries.push(entry);
        }
    }

    Ok((Snapshot::new(entries), report))
}
