//! ROM collection engine for romshelf
//!
//! Keeps a launcher's ROM collection in sync with its source (a ROM folder,
//! a Steam account or a GameStream host) and enriches new ROMs through
//! pluggable metadata and asset scrapers.
//!
//! A [`ScanSession`] runs the whole pipeline: discover candidates, fold
//! multi-disc sets, reconcile against the existing [`Collection`], then
//! scrape every new candidate into a [`Rom`].

mod candidate;
mod enrich;
mod fs;
mod metadata;
mod multidisc;
mod naming;
mod progress;
mod reconcile;
mod rom;
pub mod scraper;
mod session;
pub mod source;
mod store;
mod xml;

pub use candidate::{Candidate, CandidateKind, retain_extensions, retain_roms};
pub use enrich::{LauncherContext, ScrapeOrchestrator};
pub use fs::{FileSystem, LocalFileSystem};
pub use metadata::{MetadataFields, parse_nfo};
pub use multidisc::{DiscInfo, Grouped, MultiDiscSet, group, group_sets, match_disc};
pub use naming::{clean_title, sanitize_file_name, search_term};
pub use progress::{
    CancelHandle, ProgressController, ProgressReporter, ScanPhase, ScanState, TracingProgress,
};
pub use reconcile::{Reconciliation, reconcile};
pub use rom::{
    ATTR_GAMESTREAM_APP_ID, ATTR_STEAM_APP_ID, BackingRef, Collection, Rom, RomFile, RomId,
    RomMetadata, UNKNOWN_RATING,
};
pub use scraper::{FailureReason, ScrapeFailure, ScraperError};
pub use session::{ScanOutcome, ScanReport, ScanServices, ScanSession};
pub use store::{CollectionStore, SqliteCollectionStore};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Source unavailable ({source_kind}): {reason}")]
    SourceUnavailable {
        source_kind: &'static str,
        reason: String,
    },

    #[error("Scrape failed: {0}")]
    Scrape(#[from] ScrapeFailure),

    #[error("Unknown scraper: {0}")]
    UnknownScraper(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LibraryError {
    pub(crate) fn unavailable(source_kind: &'static str, reason: impl ToString) -> Self {
        LibraryError::SourceUnavailable {
            source_kind,
            reason: reason.to_string(),
        }
    }
}
