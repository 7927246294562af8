//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and fetching behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Snapshot, export and report locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Synchronization behavior
    #[serde(default)]
    pub sync: SyncConfig,

    /// CSS selectors for the remote page layout
    #[serde(default)]
    pub selectors: SiteSelectors,

    /// Provider key that groups image lists in exported documents
    #[serde(default = "defaults::provider")]
    pub provider: String,

    /// Static id → listing path registry
    #[serde(default = "defaults::registry")]
    pub registry: Vec<RegistryEntry>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.crawler.requests_per_second == 0 {
            return Err(AppError::validation(
                "crawler.requests_per_second must be > 0",
            ));
        }
        url::Url::parse(&self.crawler.base_url)
            .map_err(|e| AppError::validation(format!("crawler.base_url: {e}")))?;
        if self.provider.trim().is_empty() {
            return Err(AppError::validation("provider is empty"));
        }

        let mut seen = std::collections::HashSet::new();
        for entry in &self.registry {
            if !seen.insert(entry.id) {
                return Err(AppError::validation(format!(
                    "registry id {} is defined more than once",
                    entry.id
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            paths: PathsConfig::default(),
            sync: SyncConfig::default(),
            selectors: SiteSelectors::default(),
            provider: defaults::provider(),
            registry: defaults::registry(),
        }
    }
}

/// HTTP client and fetching behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Site root that listing and chapter paths are relative to
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Deadline for each outbound fetch in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Outbound request budget shared by all workers
    #[serde(default = "defaults::requests_per_second")]
    pub requests_per_second: u32,

    /// Maximum entries (and chapters per entry) processed at once
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            requests_per_second: defaults::requests_per_second(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Snapshot document; `.yml`/`.yaml` selects YAML, anything else JSON
    #[serde(default = "defaults::snapshot_path")]
    pub snapshot: PathBuf,

    /// Directory for exported publish documents
    #[serde(default = "defaults::export_dir")]
    pub export_dir: PathBuf,

    /// Plain-text summary of chapters added by the last run
    #[serde(default = "defaults::change_report_path")]
    pub change_report: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            snapshot: defaults::snapshot_path(),
            export_dir: defaults::export_dir(),
            change_report: defaults::change_report_path(),
        }
    }
}

/// What to do when one entry's worker fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep the entry's previous state, report the failure, continue
    #[default]
    Isolate,
    /// Fail the whole run without saving
    Abort,
}

/// Synchronization behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

/// CSS selectors for the catalog, chapter list and chapter pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSelectors {
    /// Path of the catalog page, relative to `base_url`
    #[serde(default = "defaults::catalog_path")]
    pub catalog_path: String,

    /// One card per catalog entry
    #[serde(default = "defaults::entry_card")]
    pub entry_card: String,

    #[serde(default = "defaults::entry_title")]
    pub entry_title: String,

    /// Detail block on the entry page holding cover and description
    #[serde(default = "defaults::entry_detail")]
    pub entry_detail: String,

    /// One link per chapter on the entry page
    #[serde(default = "defaults::chapter_row")]
    pub chapter_row: String,

    #[serde(default = "defaults::chapter_title")]
    pub chapter_title: String,

    #[serde(default = "defaults::chapter_description")]
    pub chapter_description: String,

    /// Page images on the chapter page
    #[serde(default = "defaults::chapter_image")]
    pub chapter_image: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            catalog_path: defaults::catalog_path(),
            entry_card: defaults::entry_card(),
            entry_title: defaults::entry_title(),
            entry_detail: defaults::entry_detail(),
            chapter_row: defaults::chapter_row(),
            chapter_title: defaults::chapter_title(),
            chapter_description: defaults::chapter_description(),
            chapter_image: defaults::chapter_image(),
        }
    }
}

/// A registry line mapping a numeric project id to its listing path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: u32,
    pub path: String,
}

mod defaults {
    use std::path::PathBuf;

    use super::RegistryEntry;

    pub fn base_url() -> String {
        "https://onepiecechapters.com".into()
    }
    pub fn user_agent() -> String {
        concat!("mangasync/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn requests_per_second() -> u32 {
        25
    }
    pub fn max_concurrent() -> usize {
        8
    }

    pub fn snapshot_path() -> PathBuf {
        PathBuf::from("projects.json")
    }
    pub fn export_dir() -> PathBuf {
        PathBuf::from("data")
    }
    pub fn change_report_path() -> PathBuf {
        PathBuf::from("commit_msg")
    }

    pub fn provider() -> String {
        "tcbscans".into()
    }

    pub fn catalog_path() -> String {
        "/projects".into()
    }
    pub fn entry_card() -> String {
        "div .bg-card".into()
    }
    pub fn entry_title() -> String {
        ".font-bold".into()
    }
    pub fn entry_detail() -> String {
        ".order-1".into()
    }
    pub fn chapter_row() -> String {
        "div .block.border.border-border.bg-card.mb-3.p-3".into()
    }
    pub fn chapter_title() -> String {
        "div .text-lg.font-bold".into()
    }
    pub fn chapter_description() -> String {
        "div .text-gray-500".into()
    }
    pub fn chapter_image() -> String {
        "img.fixed-ratio-content".into()
    }

    pub fn registry() -> Vec<RegistryEntry> {
        [
            (1, "/mangas/1/ace-novel-manga-adaptation"),
            (2, "/mangas/2/bleach"),
            (3, "/mangas/3/black-clover"),
            (4, "/mangas/4/jujutsu-kaisen"),
            (5, "/mangas/5/one-piece"),
            (6, "/mangas/6/my-hero-academia"),
            (8, "/mangas/8/attack-on-titan"),
            (9, "/mangas/9/build-king"),
            (10, "/mangas/10/one-punch-man"),
            (11, "/mangas/11/haikyu-special"),
            (12, "/mangas/12/one-piece-nami-vs-kalifa-by-boichi"),
            (13, "/mangas/13/chainsaw-man"),
            (15, "/mangas/15/hunter-x-hunter"),
        ]
        .into_iter()
        .map(|(id, path)| RegistryEntry {
            id,
            path: path.to_string(),
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_registry_ids() {
        let mut config = Config::default();
        config.registry.push(RegistryEntry {
            id: 5,
            path: "/mangas/5/other".to_string(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            requests_per_second = 5

            [sync]
            failure_policy = "abort"

            [[registry]]
            id = 42
            path = "/mangas/42/test"
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.requests_per_second, 5);
        assert_eq!(config.crawler.timeout_secs, 10);
        assert_eq!(config.sync.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.registry.len(), 1);
        assert_eq!(config.provider, "tcbscans");
        assert_eq!(config.paths.snapshot, PathBuf::from("projects.json"));
    }

    #[test]
    fn load_or_default_falls_back_on_missing_or_invalid_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = Config::load_or_default(tmp.path().join("missing.toml"));
        assert_eq!(missing.crawler.max_concurrent, 8);

        let invalid = tmp.path().join("invalid.toml");
        fs::write(&invalid, "[crawler\nmax_concurrent = ").unwrap();
        let config = Config::load_or_default(&invalid);
        assert_eq!(config.provider, "tcbscans");
        assert_eq!(config.registry.len(), 13);

        let valid = tmp.path().join("mangasync.toml");
        fs::write(&valid, "[crawler]\nmax_concurrent = 3\n").unwrap();
        assert_eq!(Config::load_or_default(&valid).crawler.max_concurrent, 3);
    }
}
