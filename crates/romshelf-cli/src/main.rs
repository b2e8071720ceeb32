//! romshelf command line
//!
//! # Commands
//!
//! - `romshelf scan <launcher>` - Bring a launcher's collection up to date
//! - `romshelf list <launcher>` - Print the stored collection
//! - `romshelf launchers` - Print configured launchers
//!
//! Configuration is read from `--config`, or from
//! `~/.config/romshelf/config.toml` / `/etc/romshelf/config.toml`.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use romshelf_config::RomshelfConfig;
use romshelf_library::scraper::{HttpAssetFetcher, ScraperRegistry};
use romshelf_library::{
    CollectionStore, LocalFileSystem, ScanOutcome, ScanServices, ScanSession, SqliteCollectionStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Keep ROM launcher collections in sync with their sources
#[derive(Parser)]
#[command(name = "romshelf")]
#[command(about = "Keep ROM launcher collections in sync with their sources")]
#[command(version)]
struct Cli {
    /// Configuration file (environment overrides still apply)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a launcher's source and update its collection
    Scan(ScanArgs),

    /// Print a launcher's stored collection
    List {
        /// Launcher id
        launcher: String,
    },

    /// Print configured launchers
    Launchers,
}

#[derive(Args)]
struct ScanArgs {
    /// Launcher id
    launcher: String,

    /// Report what would change without saving
    #[arg(long)]
    dry_run: bool,

    /// Stop at the first ROM that cannot be scraped
    #[arg(long)]
    abort_on_failure: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<RomshelfConfig> {
    let config = match path {
        Some(path) => RomshelfConfig::load_layered(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RomshelfConfig::load_default()?,
    };
    Ok(config)
}

fn open_store(config: &RomshelfConfig) -> Result<SqliteCollectionStore> {
    let database = &config.library.database;
    SqliteCollectionStore::open(database)
        .with_context(|| format!("opening collection database {}", database.display()))
}

async fn scan(config: RomshelfConfig, args: ScanArgs) -> Result<()> {
    let Some(launcher) = config.launcher(&args.launcher).cloned() else {
        bail!("unknown launcher '{}'", args.launcher);
    };

    let mut scan_settings = config.scan.clone();
    if args.abort_on_failure {
        scan_settings.skip_on_failure = false;
    }

    let mut store = open_store(&config)?;
    let existing = store.load_collection(&launcher.id)?;

    let services = ScanServices::from_registry(
        &ScraperRegistry::offline(),
        &config.scraper,
        Arc::new(LocalFileSystem::new()),
        Arc::new(HttpAssetFetcher::new()?),
    )?;
    let session = ScanSession::for_launcher(launcher.clone(), config.scraper.clone(), &scan_settings, services)?;

    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current ROM");
            cancel.cancel();
        }
    });

    let outcome = session.run(&existing).await?;
    print_summary(&launcher.id, &outcome);

    if outcome.report.needs_attention() {
        warn!(
            "Launcher {} has no ROMs; check rom_path {}",
            launcher.id,
            launcher.rom_path.display()
        );
    }

    if args.dry_run {
        info!("Dry run, collection not saved");
    } else if outcome.is_cancelled() {
        info!("Scan cancelled, collection not saved");
    } else {
        store.save_collection(&launcher.id, &outcome.collection)?;
    }

    Ok(())
}

fn print_summary(launcher_id: &str, outcome: &ScanOutcome) {
    let report = &outcome.report;
    println!(
        "{}: {} removed, {} checked, {} added ({} ROMs)",
        launcher_id, report.removed, report.checked, report.added, report.finished_with
    );
    for failure in &report.failures {
        println!("  skipped {} [{}]", failure, failure.reason.code());
    }
}

fn list(config: RomshelfConfig, launcher_id: &str) -> Result<()> {
    if config.launcher(launcher_id).is_none() {
        bail!("unknown launcher '{}'", launcher_id);
    }

    let store = open_store(&config)?;
    let collection = store.load_collection(launcher_id)?;
    for rom in collection.sorted_by_title() {
        let marker = if rom.extra { " (extra)" } else { "" };
        println!("{}\t{}{}\t{}", rom.id, rom.title, marker, rom.file.path.display());
    }
    Ok(())
}

fn launchers(config: &RomshelfConfig) {
    for launcher in &config.launchers {
        println!(
            "{}\t{}\t{}\t{}",
            launcher.id,
            launcher.source.kind(),
            launcher.name,
            launcher.rom_path.display()
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Scan(args) => scan(config, args).await,
        Commands::List { launcher } => list(config, &launcher),
        Commands::Launchers => {
            launchers(&config);
            Ok(())
        }
    }
}
