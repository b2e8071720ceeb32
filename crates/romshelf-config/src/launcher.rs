//! Launcher configuration
//!
//! A launcher is one ROM collection fed by exactly one source.

use crate::AssetKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Where a launcher discovers its candidates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Local ROM directory
    Folder {
        /// Accepted file extensions (empty accepts every file)
        #[serde(default)]
        extensions: Vec<String>,

        /// Scan subdirectories
        #[serde(default = "default_true")]
        recursive: bool,

        /// Fold `(Disc N)` siblings into one ROM
        #[serde(default)]
        multidisc: bool,

        /// Optional list of verified file names, one per line
        #[serde(default)]
        catalog: Option<PathBuf>,
    },

    /// Steam account library
    Steam { api_key: String, steam_id: String },

    /// NVIDIA GameStream host (client must already be paired)
    Gamestream {
        host: String,
        client_id: String,
        /// Paired client certificate (PEM)
        cert: PathBuf,
        /// Paired client private key (PEM)
        key: PathBuf,
    },
}

fn default_true() -> bool {
    true
}

impl SourceConfig {
    /// Get source type name
    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::Folder { .. } => "folder",
            SourceConfig::Steam { .. } => "steam",
            SourceConfig::Gamestream { .. } => "gamestream",
        }
    }

    /// Whether multi-disc grouping applies to this source
    pub fn multidisc(&self) -> bool {
        matches!(self, SourceConfig::Folder { multidisc: true, .. })
    }

    /// Lowercased extension whitelist (folder sources only)
    pub fn extension_filter(&self) -> Option<BTreeSet<String>> {
        match self {
            SourceConfig::Folder { extensions, .. } if !extensions.is_empty() => Some(
                extensions
                    .iter()
                    .map(|ext| ext.trim_start_matches('.').to_lowercase())
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// One launcher and its collection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Stable launcher id (collection key in the store)
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Platform name handed to scrapers (e.g., "Nintendo SNES")
    #[serde(default)]
    pub platform: String,

    /// ROM directory; for remote sources the directory synthetic paths live in
    pub rom_path: PathBuf,

    pub source: SourceConfig,

    /// Asset directories keyed by asset kind (`box_front`, `snap`, ...)
    #[serde(default)]
    pub asset_dirs: BTreeMap<String, PathBuf>,
}

impl LauncherConfig {
    /// Create a folder launcher with default settings
    pub fn folder(id: impl Into<String>, rom_path: impl Into<PathBuf>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            platform: String::new(),
            rom_path: rom_path.into(),
            source: SourceConfig::Folder {
                extensions: Vec::new(),
                recursive: true,
                multidisc: false,
                catalog: None,
            },
            asset_dirs: BTreeMap::new(),
        }
    }

    /// Builder-style asset directory
    pub fn with_asset_dir(mut self, kind: AssetKind, dir: impl Into<PathBuf>) -> Self {
        self.asset_dirs.insert(kind.as_str().to_string(), dir.into());
        self
    }

    /// Directory assets of `kind` are stored in, if configured
    pub fn asset_dir(&self, kind: AssetKind) -> Option<&Path> {
        self.asset_dirs.get(kind.as_str()).map(PathBuf::as_path)
    }
}
