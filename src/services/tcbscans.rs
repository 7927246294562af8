// src/services/tcbscans.rs

//! tcbscans catalog scraper.
//!
//! Reads the project catalog, each project's chapter list and each chapter's
//! page images using the configured CSS selectors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ChapterListing, Config, EntryListing, ImageRef, SiteSelectors};
use crate::services::{CatalogSource, RateLimiter};
use crate::utils::http::fetch_text;
use crate::utils::{extract_entry_id, resolve_url};

/// A project card from the catalog page, before its detail page is read.
#[derive(Debug, Clone, PartialEq)]
struct EntryCard {
    title: String,
    listing_url: String,
    cover_url: String,
}

/// Cover and description from a project's own page.
#[derive(Debug, Clone, Default, PartialEq)]
struct EntryDetail {
    cover_url: Option<String>,
    description: String,
}

/// `CatalogSource` for the tcbscans site layout.
pub struct TcbScansSource {
    client: Client,
    base_url: Url,
    selectors: SiteSelectors,
    limiter: Arc<dyn RateLimiter>,
    concurrency: usize,
    fetch_timeout: Duration,
}

impl TcbScansSource {
    /// Create a source from configuration.
    ///
    /// The limiter throttles the per-project detail requests this source
    /// issues internally while listing the catalog.
    pub fn new(config: &Config, client: Client, limiter: Arc<dyn RateLimiter>) -> Result<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(&config.crawler.base_url)?,
            selectors: config.selectors.clone(),
            limiter,
            concurrency: config.crawler.max_concurrent.max(1),
            fetch_timeout: config.crawler.timeout(),
        })
    }

    /// GET one page under its own deadline.
    async fn fetch_page(&self, path: &str) -> Result<String> {
        let url = resolve_url(&self.base_url, path);
        tokio::time::timeout(self.fetch_timeout, fetch_text(&self.client, &url))
            .await
            .map_err(|_| {
                AppError::network(&url, format!("no response within {:?}", self.fetch_timeout))
            })?
    }

    async fn fetch_entry(&self, card: EntryCard) -> Result<EntryListing> {
        let id = extract_entry_id(&card.listing_url).ok_or_else(|| {
            AppError::parse(
                format!("catalog card '{}'", card.title),
                format!("no project id in '{}'", card.listing_url),
            )
        })?;

        self.limiter.acquire().await;
        let html = self.fetch_page(&card.listing_url).await?;
        let detail = parse_entry_detail(&html, &self.selectors)?;

        Ok(EntryListing {
            id,
            title: card.title,
            description: detail.description,
            cover_url: detail
                .cover_url
                .filter(|c| !c.is_empty())
                .unwrap_or(card.cover_url),
            listing_url: card.listing_url,
        })
    }
}

#[async_trait]
impl CatalogSource for TcbScansSource {
    async fn fetch_catalog_entries(&self) -> Result<Vec<EntryListing>> {
        let html = self.fetch_page(&self.selectors.catalog_path).await?;
        let cards = parse_catalog_cards(&html, &self.selectors)?;
        log::debug!("Catalog lists {} projects", cards.len());

        stream::iter(cards)
            .map(|card| self.fetch_entry(card))
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    async fn fetch_chapter_list(&self, listing_url: &str) -> Result<Vec<ChapterListing>> {
        let html = self.fetch_page(listing_url).await?;
        parse_chapter_rows(&html, &self.selectors)
    }

    async fn fetch_chapter_images(&self, source_url: &str) -> Result<Vec<ImageRef>> {
        let html = self.fetch_page(source_url).await?;
        parse_chapter_images(&html, &self.selectors)
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope.select(selector).next().map(text_of).unwrap_or_default()
}

fn parse_catalog_cards(html: &str, selectors: &SiteSelectors) -> Result<Vec<EntryCard>> {
    let document = Html::parse_document(html);
    let card_sel = parse_selector(&selectors.entry_card)?;
    let title_sel = parse_selector(&selectors.entry_title)?;
    let link_sel = parse_selector("a")?;
    let img_sel = parse_selector("img")?;

    document
        .select(&card_sel)
        .map(|card| {
            let title = first_text(card, &title_sel);
            let listing_url = card
                .select(&link_sel)
                .find_map(|a| a.value().attr("href"))
                .ok_or_else(|| AppError::parse(format!("catalog card '{title}'"), "missing link"))?
                .to_string();
            let cover_url = card
                .select(&img_sel)
                .find_map(|img| img.value().attr("src"))
                .ok_or_else(|| AppError::parse(format!("catalog card '{title}'"), "missing image"))?
                .to_string();

            Ok(EntryCard {
                title,
                listing_url,
                cover_url,
            })
        })
        .collect()
}

fn parse_entry_detail(html: &str, selectors: &SiteSelectors) -> Result<EntryDetail> {
    let document = Html::parse_document(html);
    let detail_sel = parse_selector(&selectors.entry_detail)?;
    let img_sel = parse_selector("img")?;
    let p_sel = parse_selector("p")?;

    // Last matching block wins.
    let mut detail = EntryDetail::default();
    for block in document.select(&detail_sel) {
        detail.cover_url = block
            .select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string);
        detail.description = first_text(block, &p_sel);
    }
    Ok(detail)
}

fn parse_chapter_rows(html: &str, selectors: &SiteSelectors) -> Result<Vec<ChapterListing>> {
    let document = Html::parse_document(html);
    let row_sel = parse_selector(&selectors.chapter_row)?;
    let title_sel = parse_selector(&selectors.chapter_title)?;
    let desc_sel = parse_selector(&selectors.chapter_description)?;

    document
        .select(&row_sel)
        .map(|row| {
            let title = first_text(row, &title_sel);
            let source_url = row
                .value()
                .attr("href")
                .ok_or_else(|| AppError::parse(format!("chapter row '{title}'"), "missing href"))?
                .to_string();

            Ok(ChapterListing {
                source_url,
                title,
                description: first_text(row, &desc_sel),
            })
        })
        .collect()
}

fn parse_chapter_images(html: &str, selectors: &SiteSelectors) -> Result<Vec<ImageRef>> {
    let document = Html::parse_document(html);
    let img_sel = parse_selector(&selectors.chapter_image)?;

    document
        .select(&img_sel)
        .enumerate()
        .map(|(position, img)| {
            let src = img.value().attr("src").ok_or_else(|| {
                AppError::parse(format!("chapter image #{}", position + 1), "missing src")
            })?;
            let alt = img
                .value()
                .attr("alt")
                .filter(|a| !a.is_empty())
                .map(str::to_string);
            Ok(ImageRef::new(src, alt))
        })
        .collect()
}
