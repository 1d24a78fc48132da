use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelharvest_core::{
    load_config, validate_config, Config, EnrichmentPipeline, FileProgressStore, HarvestRunner,
    HttpFetcher, ListingSnapshot, MovieStore, PiaohuaExtractor, SqliteMovieStore,
};

#[derive(Parser)]
#[command(name = "reelharvest", version, about = "Two-stage movie catalog harvester")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Override the configured database path.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stage one: walk listing pages and write a snapshot file.
    Collect {
        /// Override the configured data directory.
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Cap on listing pages per category.
        #[arg(long)]
        max_pages: Option<u32>,
    },
    /// Stage two: enrich a snapshot into the database.
    Enrich {
        /// Snapshot file to enrich. Defaults to the newest one in the data directory.
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Override the configured data directory.
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Only enrich these category keys.
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
        /// Override the detail-page worker count.
        #[arg(long)]
        workers: Option<usize>,
        /// Enrich this many categories concurrently.
        #[arg(long)]
        category_workers: Option<usize>,
        /// Ignore checkpoints and start every category from the top.
        #[arg(long)]
        no_resume: bool,
    },
    /// Both stages back to back.
    Run {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        max_pages: Option<u32>,
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        no_resume: bool,
    },
    /// Print aggregate database statistics as JSON.
    Stats,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        info!("Loading configuration from {:?}", cli.config);
        load_config(&cli.config)
            .with_context(|| format!("Failed to load config from {:?}", cli.config))?
    } else {
        warn!("No config file at {:?}, using defaults", cli.config);
        Config::default()
    };
    if let Some(db) = cli.db {
        config.database.path = db;
    }

    match cli.command {
        Command::Collect {
            data_dir,
            max_pages,
        } => {
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if max_pages.is_some() {
                config.harvest.max_pages = max_pages;
            }
            validate_config(&config).context("Configuration validation failed")?;

            let runner = build_runner(&config)?;
            let path = runner.run_stage1(&config.data_dir).await?;
            info!("Snapshot written to {}", path.display());
        }
        Command::Enrich {
            snapshot,
            data_dir,
            categories,
            workers,
            category_workers,
            no_resume,
        } => {
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(n) = workers {
                config.enrich.worker_count = n;
            }
            if let Some(n) = category_workers {
                config.harvest.category_workers = n;
            }
            if no_resume {
                config.harvest.resume = false;
            }
            validate_config(&config).context("Configuration validation failed")?;

            let path = match snapshot {
                Some(path) => path,
                None => latest_snapshot(&config.data_dir)?,
            };
            info!("Enriching snapshot {}", path.display());
            let snapshot = ListingSnapshot::load(&path)
                .with_context(|| format!("Failed to load snapshot from {}", path.display()))?;

            let runner = build_runner(&config)?;
            let filter = (!categories.is_empty()).then_some(categories);
            let report = runner.run_stage2(&snapshot, filter.as_deref()).await;
            print_stats(&config)?;
            if !report.failed_categories().is_empty() {
                bail!(
                    "enrichment failed for categories: {}",
                    report.failed_categories().join(", ")
                );
            }
        }
        Command::Run {
            data_dir,
            max_pages,
            categories,
            workers,
            no_resume,
        } => {
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if max_pages.is_some() {
                config.harvest.max_pages = max_pages;
            }
            if let Some(n) = workers {
                config.enrich.worker_count = n;
            }
            if no_resume {
                config.harvest.resume = false;
            }
            validate_config(&config).context("Configuration validation failed")?;

            let runner = build_runner(&config)?;
            let filter = (!categories.is_empty()).then_some(categories);
            let report = runner.run_full(&config.data_dir, filter.as_deref()).await?;
            print_stats(&config)?;
            if !report.failed_categories().is_empty() {
                bail!(
                    "enrichment failed for categories: {}",
                    report.failed_categories().join(", ")
                );
            }
        }
        Command::Stats => {
            print_stats(&config)?;
        }
    }

    Ok(())
}

fn print_stats(config: &Config) -> Result<()> {
    let store =
        SqliteMovieStore::new(&config.database.path).context("Failed to open database")?;
    let stats = store.stats().context("Failed to read stats")?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn build_runner(config: &Config) -> Result<HarvestRunner> {
    let fetcher = Arc::new(HttpFetcher::new(&config.fetcher));
    let store = Arc::new(
        SqliteMovieStore::new(&config.database.path).context("Failed to open database")?,
    );
    let progress = Arc::new(FileProgressStore::new(&config.data_dir));

    let pipeline = Arc::new(EnrichmentPipeline::new(
        fetcher.clone(),
        Arc::new(PiaohuaExtractor::new()),
        config.enrich.clone(),
        config.site.base_url.clone(),
    ));

    Ok(HarvestRunner::new(
        fetcher,
        Arc::new(PiaohuaExtractor::new()),
        pipeline,
        store,
        progress,
        config.site.clone(),
        config.harvest.clone(),
    ))
}

/// Newest snapshot in the data directory; the timestamped names sort.
fn latest_snapshot(data_dir: &Path) -> Result<PathBuf> {
    let mut newest: Option<PathBuf> = None;
    let entries = std::fs::read_dir(data_dir)
        .with_context(|| format!("Failed to read data directory {}", data_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        if name.starts_with("movie_lists_") && name.ends_with(".json") {
            if newest.as_ref().map_or(true, |n| path > *n) {
                newest = Some(path);
            }
        }
    }
    newest.with_context(|| format!("No snapshot files in {}", data_dir.display()))
}
