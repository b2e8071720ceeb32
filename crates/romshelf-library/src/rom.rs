//! ROM records and the collection they live in

use crate::LibraryError;
use romshelf_config::AssetKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Attribute key holding the Steam app id of a Steam-backed ROM
pub const ATTR_STEAM_APP_ID: &str = "steam_app_id";

/// Attribute key holding the remote app id of a GameStream-backed ROM
pub const ATTR_GAMESTREAM_APP_ID: &str = "gamestream_app_id";

/// Content rating used until a source provides one
pub const UNKNOWN_RATING: &str = "unknown";

const ROM_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6b1d_4c2e_9f3a_4e57_a0d8_52c1_3e7f_9b04);

/// Opaque, stable ROM identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RomId(String);

impl RomId {
    /// Wrap an identifier loaded from storage
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the identifier for a backing reference.
    ///
    /// The same file path or app id always yields the same id.
    pub fn for_backing(backing: &BackingRef) -> Self {
        let uuid = Uuid::new_v5(&ROM_ID_NAMESPACE, backing.key().as_bytes());
        Self(uuid.simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What keeps a ROM alive: a file on disk or an id in a remote catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackingRef {
    File(PathBuf),
    SteamApp(u64),
    GameStreamApp(String),
}

impl BackingRef {
    fn key(&self) -> String {
        match self {
            BackingRef::File(path) => format!("file:{}", path.display()),
            BackingRef::SteamApp(id) => format!("steam:{}", id),
            BackingRef::GameStreamApp(id) => format!("gamestream:{}", id),
        }
    }
}

/// Descriptive metadata. Unresolved fields stay empty, never missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomMetadata {
    pub year: String,
    pub genre: String,
    pub developer: String,
    pub players: String,
    pub content_rating: String,
    pub plot: String,
}

impl Default for RomMetadata {
    fn default() -> Self {
        Self {
            year: String::new(),
            genre: String::new(),
            developer: String::new(),
            players: String::new(),
            content_rating: UNKNOWN_RATING.to_string(),
            plot: String::new(),
        }
    }
}

/// Backing file of a ROM
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RomFile {
    /// File path, or the `{dir}/{set name}` marker of a multi-disc set
    pub path: PathBuf,

    /// Disc file names (same directory as `path`), in scan order
    #[serde(default)]
    pub discs: Vec<String>,
}

impl RomFile {
    pub fn is_multidisc(&self) -> bool {
        !self.discs.is_empty()
    }

    /// Full paths of every disc in the set
    pub fn disc_paths(&self) -> Vec<PathBuf> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        self.discs.iter().map(|disc| dir.join(disc)).collect()
    }
}

/// A ROM in a launcher's collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rom {
    pub id: RomId,
    pub title: String,
    pub metadata: RomMetadata,
    pub file: RomFile,

    /// Resolved asset paths
    #[serde(default)]
    pub assets: BTreeMap<AssetKind, PathBuf>,

    /// Present locally but missing from the verification catalog
    #[serde(default)]
    pub extra: bool,

    /// Source-specific values (`steam_app_id`, `gamestream_app_id`)
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Rom {
    /// Resolve what this ROM's existence depends on
    pub fn backing_ref(&self) -> Result<BackingRef, LibraryError> {
        if let Some(app_id) = self.attributes.get(ATTR_STEAM_APP_ID) {
            let app_id = app_id.parse().map_err(|_| {
                LibraryError::Invariant(format!(
                    "ROM {} has non-numeric steam app id '{}'",
                    self.id, app_id
                ))
            })?;
            return Ok(BackingRef::SteamApp(app_id));
        }

        if let Some(app_id) = self.attributes.get(ATTR_GAMESTREAM_APP_ID) {
            return Ok(BackingRef::GameStreamApp(app_id.clone()));
        }

        if self.file.path.as_os_str().is_empty() {
            return Err(LibraryError::Invariant(format!(
                "ROM {} has no backing reference",
                self.id
            )));
        }

        Ok(BackingRef::File(self.file.path.clone()))
    }
}

/// A launcher's ROMs keyed by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    roms: HashMap<RomId, Rom>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.roms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roms.is_empty()
    }

    pub fn get(&self, id: &RomId) -> Option<&Rom> {
        self.roms.get(id)
    }

    pub fn contains(&self, id: &RomId) -> bool {
        self.roms.contains_key(id)
    }

    /// Insert a ROM, returning the record it replaced
    pub fn insert(&mut self, rom: Rom) -> Option<Rom> {
        self.roms.insert(rom.id.clone(), rom)
    }

    pub fn remove(&mut self, id: &RomId) -> Option<Rom> {
        self.roms.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rom> {
        self.roms.values()
    }

    /// ROMs sorted by title, for display
    pub fn sorted_by_title(&self) -> Vec<&Rom> {
        let mut roms: Vec<&Rom> = self.roms.values().collect();
        roms.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        roms
    }
}

impl FromIterator<Rom> for Collection {
    fn from_iter<I: IntoIterator<Item = Rom>>(iter: I) -> Self {
        let mut collection = Collection::new();
        for rom in iter {
            collection.insert(rom);
        }
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_rom(path: &str) -> Rom {
        let backing = BackingRef::File(PathBuf::from(path));
        Rom {
            id: RomId::for_backing(&backing),
            title: "Test".to_string(),
            metadata: RomMetadata::default(),
            file: RomFile {
                path: PathBuf::from(path),
                discs: Vec::new(),
            },
            assets: BTreeMap::new(),
            extra: false,
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_rom_id_is_stable_and_opaque() {
        let backing = BackingRef::File(PathBuf::from("/roms/mario.zip"));
        let a = RomId::for_backing(&backing);
        let b = RomId::for_backing(&backing);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(!a.as_str().contains("mario"));

        let other = RomId::for_backing(&BackingRef::SteamApp(400));
        assert_ne!(a, other);
    }

    #[test]
    fn test_default_metadata_uses_rating_sentinel() {
        let metadata = RomMetadata::default();
        assert_eq!(metadata.content_rating, UNKNOWN_RATING);
        assert!(metadata.plot.is_empty());
    }

    #[test]
    fn test_backing_ref_variants() {
        let mut rom = file_rom("/roms/mario.zip");
        assert_eq!(
            rom.backing_ref().unwrap(),
            BackingRef::File(PathBuf::from("/roms/mario.zip"))
        );

        rom.attributes
            .insert(ATTR_STEAM_APP_ID.to_string(), "440".to_string());
        assert_eq!(rom.backing_ref().unwrap(), BackingRef::SteamApp(440));

        rom.attributes
            .insert(ATTR_STEAM_APP_ID.to_string(), "abc".to_string());
        assert!(matches!(
            rom.backing_ref(),
            Err(LibraryError::Invariant(_))
        ));
    }

    #[test]
    fn test_missing_backing_is_invariant_error() {
        let rom = file_rom("");
        assert!(matches!(
            rom.backing_ref(),
            Err(LibraryError::Invariant(_))
        ));
    }

    #[test]
    fn test_disc_paths() {
        let mut rom = file_rom("/roms/psx/Game");
        rom.file.discs = vec!["Game (Disc 1).cue".into(), "Game (Disc 2).cue".into()];
        assert!(rom.file.is_multidisc());
        assert_eq!(
            rom.file.disc_paths(),
            vec![
                PathBuf::from("/roms/psx/Game (Disc 1).cue"),
                PathBuf::from("/roms/psx/Game (Disc 2).cue"),
            ]
        );
    }

    #[test]
    fn test_collection_insert_remove() {
        let rom = file_rom("/roms/a.zip");
        let id = rom.id.clone();
        let mut collection: Collection = vec![rom, file_rom("/roms/b.zip")].into_iter().collect();
        assert_eq!(collection.len(), 2);
        assert!(collection.contains(&id));

        assert!(collection.remove(&id).is_some());
        assert_eq!(collection.len(), 1);
        assert!(collection.get(&id).is_none());
    }
}
