//! Scraper settings
//!
//! Decides, per scan session, where ROM metadata and artwork come from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Where the scan session takes metadata or assets from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScanPolicy {
    /// Ask the scraper for the title only, everything else stays default
    TitleOnly,
    /// Read the local sidecar (NFO) and never scrape
    NfoPreferred,
    /// Use local files only
    LocalOnly,
    /// Read the local sidecar first, then scrape the gaps
    #[default]
    NfoAndScrape,
    /// Use local files first, then scrape the gaps
    LocalAndScrape,
    /// Always scrape, ignore local data
    ScrapeOnly,
}

impl ScanPolicy {
    /// Whether local data (NFO sidecars, local asset files) is consulted
    pub fn uses_local(&self) -> bool {
        matches!(
            self,
            ScanPolicy::NfoPreferred
                | ScanPolicy::LocalOnly
                | ScanPolicy::NfoAndScrape
                | ScanPolicy::LocalAndScrape
        )
    }

    /// Whether the remote scraper is consulted
    pub fn uses_remote(&self) -> bool {
        matches!(
            self,
            ScanPolicy::TitleOnly
                | ScanPolicy::NfoAndScrape
                | ScanPolicy::LocalAndScrape
                | ScanPolicy::ScrapeOnly
        )
    }

    /// Get policy as a config string
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanPolicy::TitleOnly => "title-only",
            ScanPolicy::NfoPreferred => "nfo-preferred",
            ScanPolicy::LocalOnly => "local-only",
            ScanPolicy::NfoAndScrape => "nfo-and-scrape",
            ScanPolicy::LocalAndScrape => "local-and-scrape",
            ScanPolicy::ScrapeOnly => "scrape-only",
        }
    }
}

/// How one result is picked out of several scraper matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    Automatic,
    Manual,
}

/// Kinds of artwork and media attached to a ROM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Title,
    Snap,
    BoxFront,
    BoxBack,
    Cartridge,
    Fanart,
    Banner,
    Clearlogo,
    Flyer,
    Map,
    Manual,
    Trailer,
}

impl AssetKind {
    /// Every asset kind, in display order
    pub const ALL: [AssetKind; 12] = [
        AssetKind::Title,
        AssetKind::Snap,
        AssetKind::BoxFront,
        AssetKind::BoxBack,
        AssetKind::Cartridge,
        AssetKind::Fanart,
        AssetKind::Banner,
        AssetKind::Clearlogo,
        AssetKind::Flyer,
        AssetKind::Map,
        AssetKind::Manual,
        AssetKind::Trailer,
    ];

    /// Get the config key for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Title => "title",
            AssetKind::Snap => "snap",
            AssetKind::BoxFront => "box_front",
            AssetKind::BoxBack => "box_back",
            AssetKind::Cartridge => "cartridge",
            AssetKind::Fanart => "fanart",
            AssetKind::Banner => "banner",
            AssetKind::Clearlogo => "clearlogo",
            AssetKind::Flyer => "flyer",
            AssetKind::Map => "map",
            AssetKind::Manual => "manual",
            AssetKind::Trailer => "trailer",
        }
    }

    /// Parse a config key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == key)
    }

    /// File extensions a local asset of this kind may have
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            AssetKind::Manual => &["pdf", "cbz", "cbr"],
            AssetKind::Trailer => &["mp4", "mpeg", "webm", "mkv"],
            _ => &["png", "jpg", "jpeg", "gif", "bmp"],
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scraper policy for one scan session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScraperSettings {
    /// Metadata scraper id
    #[serde(default = "default_metadata_scraper")]
    pub metadata_scraper: String,

    /// Asset scraper id
    #[serde(default = "default_asset_scraper")]
    pub asset_scraper: String,

    #[serde(default)]
    pub metadata_policy: ScanPolicy,

    #[serde(default = "default_asset_policy")]
    pub asset_policy: ScanPolicy,

    #[serde(default)]
    pub game_selection: SelectionMode,

    #[serde(default)]
    pub asset_selection: SelectionMode,

    /// Asset kinds to look up for new ROMs
    #[serde(default = "default_asset_kinds")]
    pub asset_kinds: BTreeSet<AssetKind>,

    /// Let scraped data replace local data
    #[serde(default)]
    pub overwrite_existing: bool,
}

fn default_metadata_scraper() -> String {
    "clean-title".to_string()
}

fn default_asset_scraper() -> String {
    "null".to_string()
}

fn default_asset_policy() -> ScanPolicy {
    ScanPolicy::LocalAndScrape
}

fn default_asset_kinds() -> BTreeSet<AssetKind> {
    [AssetKind::Title, AssetKind::Snap, AssetKind::BoxFront]
        .into_iter()
        .collect()
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            metadata_scraper: default_metadata_scraper(),
            asset_scraper: default_asset_scraper(),
            metadata_policy: ScanPolicy::default(),
            asset_policy: default_asset_policy(),
            game_selection: SelectionMode::default(),
            asset_selection: SelectionMode::default(),
            asset_kinds: default_asset_kinds(),
            overwrite_existing: false,
        }
    }
}
