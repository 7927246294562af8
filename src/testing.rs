//! Test doubles for the storage and remote collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::error::{AppError, Result};
use crate::models::{ChapterListing, EntryListing, ImageRef, Snapshot};
use crate::services::{CatalogSource, RateLimiter};
use crate::storage::SnapshotStore;

/// Catalog listing for a test entry.
pub fn listing(id: u32, title: &str) -> EntryListing {
    EntryListing {
        id,
        title: title.to_string(),
        description: format!("About {title}"),
        cover_url: format!("https://cdn.test/covers/{id}.png"),
        listing_url: format!("/mangas/{id}/{}", title.to_lowercase().replace(' ', "-")),
    }
}

/// Chapter row numbered `n` of entry `id`.
pub fn chapter(id: u32, n: f64) -> ChapterListing {
    ChapterListing {
        source_url: format!("/chapters/{id}/{n}"),
        title: format!("Chapter {n}"),
        description: format!("Part {n}"),
    }
}

/// Images served for a chapter permalink unless overridden.
pub fn default_images(source_url: &str) -> Vec<ImageRef> {
    vec![
        ImageRef::new(format!("https://cdn.test{source_url}/01.png"), Some("page 1".into())),
        ImageRef::new(format!("https://cdn.test{source_url}/02.png"), None),
    ]
}

/// In-memory snapshot store.
#[derive(Default)]
pub struct MemoryStorage {
    snapshot: Mutex<Option<Snapshot>>,
    corrupt: AtomicBool,
    fail_save: AtomicBool,
    pub saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let storage = Self::default();
        *storage.snapshot.lock().unwrap() = Some(snapshot);
        storage
    }

    pub fn stored(&self) -> Option<Snapshot> {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn set_corrupt(&self) {
        self.corrupt.store(true, Ordering::SeqCst);
    }

    pub fn set_fail_save(&self) {
        self.fail_save.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SnapshotStore for MemoryStorage {
    async fn load(&self) -> Result<Snapshot> {
        if self.corrupt.load(Ordering::SeqCst) {
            return Err(AppError::storage(self.location(), "corrupt document"));
        }
        self.stored()
            .ok_or_else(|| AppError::storage(self.location(), "no snapshot stored"))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(AppError::persist(self.location(), "disk full"));
        }
        *self.snapshot.lock().unwrap() = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn exists(&self) -> Result<bool> {
        Ok(self.snapshot.lock().unwrap().is_some() || self.corrupt.load(Ordering::SeqCst))
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Remote catalog whose contents tests script and change between runs.
#[derive(Default)]
pub struct ScriptedSource {
    catalog: Mutex<Vec<EntryListing>>,
    chapters: Mutex<HashMap<String, Vec<ChapterListing>>>,
    images: Mutex<HashMap<String, Vec<ImageRef>>>,
    failing: Mutex<HashSet<String>>,
    stalled: Mutex<HashSet<String>>,
    catalog_fails: AtomicBool,
    catalog_delay: Mutex<Duration>,
    pub catalog_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
}

impl ScriptedSource {
    /// Publish an entry with its chapter rows (replacing any previous listing).
    pub fn publish(&self, entry: EntryListing, chapters: Vec<ChapterListing>) {
        self.chapters
            .lock()
            .unwrap()
            .insert(entry.listing_url.clone(), chapters);
        let mut catalog = self.catalog.lock().unwrap();
        match catalog.iter_mut().find(|e| e.listing_url == entry.listing_url) {
            Some(existing) => *existing = entry,
            None => catalog.push(entry),
        }
    }

    /// Drop an entry from the catalog page.
    pub fn unpublish(&self, listing_url: &str) {
        self.catalog
            .lock()
            .unwrap()
            .retain(|e| e.listing_url != listing_url);
    }

    pub fn set_images(&self, source_url: &str, images: Vec<ImageRef>) {
        self.images
            .lock()
            .unwrap()
            .insert(source_url.to_string(), images);
    }

    /// Make every fetch of `url` fail with a network error.
    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    /// Make every fetch of `url` hang well past any test deadline.
    pub fn stall(&self, url: &str) {
        self.stalled.lock().unwrap().insert(url.to_string());
    }

    pub fn fail_catalog(&self) {
        self.catalog_fails.store(true, Ordering::SeqCst);
    }

    /// Make the catalog call take `delay` in total, as if it made many requests.
    pub fn set_catalog_delay(&self, delay: Duration) {
        *self.catalog_delay.lock().unwrap() = delay;
    }

    async fn gate(&self, url: &str) -> Result<()> {
        let stalled = self.stalled.lock().unwrap().contains(url);
        if stalled {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        let failing = self.failing.lock().unwrap().contains(url);
        if failing {
            return Err(AppError::network(url, "status code 503 Service Unavailable"));
        }
        // Let sibling workers interleave.
        tokio::task::yield_now().await;
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for ScriptedSource {
    async fn fetch_catalog_entries(&self) -> Result<Vec<EntryListing>> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.catalog_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.catalog_fails.load(Ordering::SeqCst) {
            return Err(AppError::network("/projects", "connection refused"));
        }
        Ok(self.catalog.lock().unwrap().clone())
    }

    async fn fetch_chapter_list(&self, listing_url: &str) -> Result<Vec<ChapterListing>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.gate(listing_url).await?;
        let chapters = self.chapters.lock().unwrap().get(listing_url).cloned();
        chapters.ok_or_else(|| AppError::network(listing_url, "status code 404 Not Found"))
    }

    async fn fetch_chapter_images(&self, source_url: &str) -> Result<Vec<ImageRef>> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.gate(source_url).await?;
        let images = self.images.lock().unwrap().get(source_url).cloned();
        Ok(images.unwrap_or_else(|| default_images(source_url)))
    }
}

/// Limiter that never waits and counts acquisitions.
#[derive(Default)]
pub struct CountingLimiter {
    pub acquired: AtomicUsize,
}

#[async_trait]
impl RateLimiter for CountingLimiter {
    async fn acquire(&self) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }
}

/// Serve fixed HTML pages over HTTP on a local port, each after its delay.
///
/// Returns the base url. Unknown paths answer 404.
pub async fn serve_pages(pages: Vec<(String, Duration, String)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let pages: Arc<HashMap<String, (Duration, String)>> = Arc::new(
        pages
            .into_iter()
            .map(|(path, delay, body)| (path, (delay, body)))
            .collect(),
    );

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let pages = Arc::clone(&pages);
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                let response = match pages.get(&path) {
                    Some((delay, body)) => {
                        tokio::time::sleep(*delay).await;
                        format!(
                            "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        )
                    }
                    None => {
                        "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                            .to_string()
                    }
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}
