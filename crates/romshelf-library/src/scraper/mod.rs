//! Scraper contracts and selection rules
//!
//! Concrete site backends live outside this crate. They plug in through
//! [`MetadataScraper`] and [`AssetScraper`] and are looked up by the ids in
//! [`ScraperSettings`](romshelf_config::ScraperSettings).

mod http;
mod offline;

pub use http::HttpAssetFetcher;
pub use offline::{CleanTitleScraper, NullAssetScraper};

use crate::LibraryError;
use crate::metadata::MetadataFields;
use async_trait::async_trait;
use romshelf_config::AssetKind;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// One game a metadata scraper found for a search term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    /// Backend-specific id used to fetch the details
    pub id: String,
    pub title: String,
    pub platform: Option<String>,
}

/// One image an asset scraper offers for a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub id: String,
    pub name: String,
    /// Backend-specific locator, resolved by `resolve_image_url`
    pub locator: String,
}

/// Downloadable location of a selected image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: String,
    /// File extension without the dot (`png`, `jpg`)
    pub extension: String,
}

/// Errors reported by scraper backends
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl From<reqwest::Error> for ScraperError {
    fn from(e: reqwest::Error) -> Self {
        ScraperError::Network(e.to_string())
    }
}

impl From<std::io::Error> for ScraperError {
    fn from(e: std::io::Error) -> Self {
        ScraperError::Network(e.to_string())
    }
}

/// Why a single candidate could not be enriched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Network(String),
    NoResults(String),
    Parse(String),
    Download(String),
    /// Nothing usable was left after cleaning the candidate's name
    MalformedCandidate,
}

impl FailureReason {
    /// Short reason code for reports
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::Network(_) => "network",
            FailureReason::NoResults(_) => "no-results",
            FailureReason::Parse(_) => "parse",
            FailureReason::Download(_) => "download",
            FailureReason::MalformedCandidate => "malformed-candidate",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Network(msg) => write!(f, "network error: {}", msg),
            FailureReason::NoResults(what) => write!(f, "no results for {}", what),
            FailureReason::Parse(msg) => write!(f, "parse error: {}", msg),
            FailureReason::Download(msg) => write!(f, "download failed: {}", msg),
            FailureReason::MalformedCandidate => f.write_str("name is empty after cleaning"),
        }
    }
}

impl From<ScraperError> for FailureReason {
    fn from(e: ScraperError) -> Self {
        match e {
            ScraperError::Network(msg) => FailureReason::Network(msg),
            ScraperError::Parse(msg) => FailureReason::Parse(msg),
            ScraperError::Unsupported(msg) => FailureReason::Parse(msg),
        }
    }
}

/// Enrichment failure tied to one candidate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{candidate}: {reason}")]
pub struct ScrapeFailure {
    /// Candidate's source name (file name or remote title)
    pub candidate: String,
    pub reason: FailureReason,
}

#[async_trait]
pub trait MetadataScraper: Send + Sync {
    fn id(&self) -> &str;

    async fn search(&self, term: &str, platform: &str) -> Result<Vec<SearchMatch>, ScraperError>;

    async fn fetch_metadata(&self, selected: &SearchMatch) -> Result<MetadataFields, ScraperError>;
}

#[async_trait]
pub trait AssetScraper: Send + Sync {
    fn id(&self) -> &str;

    /// Whether this backend can provide `kind` at all
    fn supports(&self, _kind: AssetKind) -> bool {
        true
    }

    async fn search(
        &self,
        term: &str,
        kind: AssetKind,
        platform: &str,
    ) -> Result<Vec<ImageCandidate>, ScraperError>;

    async fn resolve_image_url(&self, image: &ImageCandidate) -> Result<ResolvedImage, ScraperError>;
}

/// Stores a resolved image at its final location
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), ScraperError>;
}

/// Manual selection, usually backed by a dialog in the host application.
///
/// Returning `None` cancels the selection.
pub trait SelectionPrompt: Send + Sync {
    fn select_game(&self, term: &str, matches: &[SearchMatch]) -> Option<usize>;

    fn select_asset(&self, term: &str, kind: AssetKind, images: &[ImageCandidate]) -> Option<usize>;
}

/// Score a match title against the search term.
///
/// Exact case-insensitive match scores 2, substring either way 1, else 0.
pub fn match_score(term: &str, title: &str) -> u8 {
    let term = term.trim().to_lowercase();
    let title = title.trim().to_lowercase();

    if title.is_empty() || term.is_empty() {
        0
    } else if title == term {
        2
    } else if title.contains(&term) || term.contains(&title) {
        1
    } else {
        0
    }
}

/// Pick the best-scoring match; ties go to the earliest result
pub fn best_match(term: &str, matches: &[SearchMatch]) -> Option<usize> {
    let scores: Vec<u8> = matches.iter().map(|m| match_score(term, &m.title)).collect();
    let best = *scores.iter().max()?;
    let index = scores.iter().position(|&s| s == best)?;

    let tied = scores.iter().filter(|&&s| s == best).count();
    if tied > 1 {
        tracing::debug!(
            "Ambiguous selection for '{}': {} matches score {}, taking '{}'",
            term,
            tied,
            best,
            matches[index].title
        );
    }

    Some(index)
}

/// Scraper backends available to scan sessions, keyed by id
#[derive(Clone, Default)]
pub struct ScraperRegistry {
    metadata: HashMap<String, Arc<dyn MetadataScraper>>,
    assets: HashMap<String, Arc<dyn AssetScraper>>,
}

impl ScraperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the offline backends
    pub fn offline() -> Self {
        let mut registry = Self::new();
        registry.register_metadata(Arc::new(CleanTitleScraper));
        registry.register_assets(Arc::new(NullAssetScraper));
        registry
    }

    pub fn register_metadata(&mut self, scraper: Arc<dyn MetadataScraper>) {
        self.metadata.insert(scraper.id().to_string(), scraper);
    }

    pub fn register_assets(&mut self, scraper: Arc<dyn AssetScraper>) {
        self.assets.insert(scraper.id().to_string(), scraper);
    }

    pub fn metadata(&self, id: &str) -> Result<Arc<dyn MetadataScraper>, LibraryError> {
        self.metadata
            .get(id)
            .cloned()
            .ok_or_else(|| LibraryError::UnknownScraper(id.to_string()))
    }

    pub fn assets(&self, id: &str) -> Result<Arc<dyn AssetScraper>, LibraryError> {
        self.assets
            .get(id)
            .cloned()
            .ok_or_else(|| LibraryError::UnknownScraper(id.to_string()))
    }
}
