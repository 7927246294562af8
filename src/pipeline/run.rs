// src/pipeline/run.rs

//! End-to-end runs wired from configuration.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::export::{export, write_documents};
use crate::models::Config;
use crate::pipeline::{SyncEngine, SyncMode, SyncOptions, SyncOutcome};
use crate::services::{GovernorLimiter, RateLimiter, TcbScansSource};
use crate::storage::{LocalStorage, SnapshotStore};
use crate::utils::{http, log};

/// Sync the catalog, then write publish documents and the change report.
pub async fn run_sync(config: &Config, mode: SyncMode) -> Result<SyncOutcome> {
    let start_time = Utc::now();
    log::header(match mode {
        SyncMode::Incremental => "Incremental sync",
        SyncMode::Full => "Full sync",
    });

    let limiter: Arc<dyn RateLimiter> =
        Arc::new(GovernorLimiter::per_second(config.crawler.requests_per_second));
    let client = http::create_async_client(&config.crawler)?;
    let source = TcbScansSource::new(config, client, Arc::clone(&limiter))?;
    let store = LocalStorage::new(&config.paths.snapshot);

    let engine = SyncEngine::new(
        Arc::new(store),
        Arc::new(source),
        limiter,
        SyncOptions::from_config(config),
    );

    log::step(1, 3, "Fetching catalog and new chapters");
    let outcome = match mode {
        SyncMode::Incremental => engine.sync_incremental().await?,
        SyncMode::Full => engine.sync_full().await?,
    };
    log::success(&format!(
        "Snapshot saved to {}",
        config.paths.snapshot.display()
    ));

    log::step(2, 3, "Writing publish documents");
    let documents = export(&outcome.snapshot, &config.provider);
    let written = write_documents(&config.paths.export_dir, &documents).await?;

    log::step(3, 3, "Writing change report");
    outcome.report.write(&config.paths.change_report).await?;
    if !outcome.report.has_changes() {
        log::success("No new chapters");
    }

    for failure in &outcome.report.failures {
        log::warn(&format!("{} was not synced: {}", failure.title, failure.error));
    }

    let elapsed = Utc::now() - start_time;
    log::summary(
        "Sync",
        &[
            ("Entries", outcome.snapshot.entries.len().to_string()),
            ("Chapters", outcome.snapshot.chapter_count().to_string()),
            ("New chapters", outcome.report.added.len().to_string()),
            ("Failed entries", outcome.report.failures.len().to_string()),
            ("Documents", written.len().to_string()),
            ("Elapsed", format!("{}s", elapsed.num_seconds())),
        ],
    );

    Ok(outcome)
}

/// Regenerate publish documents from the stored snapshot.
pub async fn run_export(config: &Config) -> Result<usize> {
    let store = LocalStorage::new(&config.paths.snapshot);
    let snapshot = store.load().await?;

    let documents = export(&snapshot, &config.provider);
    let written = write_documents(&config.paths.export_dir, &documents).await?;

    log::success(&format!(
        "Exported {} documents to {}",
        written.len(),
        config.paths.export_dir.display()
    ));
    Ok(written.len())
}
