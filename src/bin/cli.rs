//! mangasync CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mangasync::{
    error::Result,
    models::{Config, Ordinal},
    pipeline::{self, Registry, SyncMode},
    storage::{LocalStorage, SnapshotStore},
};

/// mangasync - Incremental manga catalog mirror
#[derive(Parser, Debug)]
#[command(
    name = "mangasync",
    version,
    about = "Incremental tcbscans catalog mirror"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "mangasync.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sync the catalog, then write publish documents and the change report
    Sync {
        #[arg(value_enum, default_value_t = Scope::New)]
        scope: Scope,
    },

    /// Regenerate publish documents from the stored snapshot
    Export,

    /// Print a stored chapter and its image urls
    Chapter {
        /// Registered project id
        #[arg(long)]
        project: u32,

        /// Chapter ordinal, e.g. 1052 or 1052.5
        #[arg(long)]
        chapter: Ordinal,
    },

    /// Print the latest stored chapter of a project
    Latest {
        /// Registered project id
        #[arg(long)]
        project: u32,
    },

    /// Validate the configuration file
    Validate,

    /// Show stored snapshot info
    Info,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Scope {
    /// Fetch only chapters missing from the snapshot
    New,
    /// Refetch every listed chapter
    All,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    log::debug!("Configuration from {}", cli.config.display());

    match cli.command {
        Command::Sync { scope } => {
            config.validate()?;
            let mode = match scope {
                Scope::New => SyncMode::Incremental,
                Scope::All => SyncMode::Full,
            };
            let outcome = pipeline::run_sync(&config, mode).await?;
            print!("{}", outcome.report.render());
        }

        Command::Export => {
            pipeline::run_export(&config).await?;
        }

        Command::Chapter { project, chapter } => {
            let snapshot = LocalStorage::new(&config.paths.snapshot).load().await?;
            let registry = Registry::from_config(&config);
            let record = pipeline::find_chapter(&snapshot, &registry, project, chapter)?;

            println!("{}", record.title);
            if !record.description.is_empty() {
                println!("{}", record.description);
            }
            for image in &record.images {
                println!("{}", image.src);
            }
        }

        Command::Latest { project } => {
            let snapshot = LocalStorage::new(&config.paths.snapshot).load().await?;
            let registry = Registry::from_config(&config);
            let record = pipeline::latest_chapter(&snapshot, &registry, project)?;

            println!("{} ({})", record.title, record.ordinal());
            println!("{}", record.url);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} registered projects, provider '{}')",
                config.registry.len(),
                config.provider
            );
        }

        Command::Info => {
            let store = LocalStorage::new(&config.paths.snapshot);
            log::info!("Snapshot: {}", store.location());

            if !store.exists().await? {
                log::info!("No snapshot found yet.");
                return Ok(());
            }

            let snapshot = store.load().await?;
            log::info!("Entries: {}", snapshot.entries.len());
            log::info!("Chapters: {}", snapshot.chapter_count());
            log::info!("Images: {}", snapshot.image_count());
            for entry in &snapshot.entries {
                let latest = entry
                    .latest_chapter()
                    .map(|c| c.ordinal().to_string())
                    .unwrap_or_else(|| "-".to_string());
                log::info!(
                    "    [{}] {}: {} chapters, latest {}",
                    entry.id,
                    entry.title,
                    entry.chapters.len(),
                    latest
                );
            }
        }
    }

    Ok(())
}
