//! Candidate sources
//!
//! A source lists every item a launcher could hold right now. Sources never
//! return an empty list for an unreachable backend: that would read as
//! "everything was deleted" and wipe the collection.

mod filesystem;
mod gamestream;
mod steam;

pub use filesystem::FolderSource;
pub use gamestream::GameStreamCatalog;
pub use steam::SteamCatalog;

use crate::LibraryError;
use crate::candidate::Candidate;
use crate::fs::FileSystem;
use async_trait::async_trait;
use romshelf_config::{LauncherConfig, SourceConfig};
use std::sync::Arc;

/// Kind of backend a source reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Folder,
    Steam,
    GameStream,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Folder => "folder",
            SourceKind::Steam => "steam",
            SourceKind::GameStream => "gamestream",
        }
    }
}

#[async_trait]
pub trait CandidateSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// List candidates in a deterministic order
    async fn discover(&self) -> Result<Vec<Candidate>, LibraryError>;
}

/// One item owned on a remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub id: String,
    pub title: String,
}

/// Remote service listing the items an account owns
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn list_owned_items(&self) -> Result<Vec<RemoteItem>, LibraryError>;
}

/// Turns a remote catalog into candidates
pub struct RemoteSource<C> {
    catalog: C,
}

impl<C: RemoteCatalog> RemoteSource<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    fn to_candidate(&self, item: RemoteItem) -> Result<Candidate, LibraryError> {
        match self.catalog.kind() {
            SourceKind::Steam => {
                let app_id = item.id.parse().map_err(|_| {
                    LibraryError::unavailable("steam", format!("invalid app id '{}'", item.id))
                })?;
                Ok(Candidate::steam(app_id, item.title))
            }
            SourceKind::GameStream => Ok(Candidate::gamestream(item.id, item.title)),
            SourceKind::Folder => Err(LibraryError::Invariant(
                "folder sources are not remote catalogs".into(),
            )),
        }
    }
}

#[async_trait]
impl<C: RemoteCatalog> CandidateSource for RemoteSource<C> {
    fn kind(&self) -> SourceKind {
        self.catalog.kind()
    }

    async fn discover(&self) -> Result<Vec<Candidate>, LibraryError> {
        let mut items = self.catalog.list_owned_items().await?;
        items.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));

        tracing::info!(
            "{} catalog lists {} items",
            self.catalog.kind().as_str(),
            items.len()
        );

        items
            .into_iter()
            .map(|item| self.to_candidate(item))
            .collect()
    }
}

/// Build the source a launcher is configured with
pub fn for_launcher(
    launcher: &LauncherConfig,
    fs: Arc<dyn FileSystem>,
) -> Result<Box<dyn CandidateSource>, LibraryError> {
    let source: Box<dyn CandidateSource> = match &launcher.source {
        SourceConfig::Folder {
            recursive, catalog, ..
        } => {
            let mut folder = FolderSource::new(launcher.rom_path.clone(), *recursive, fs.clone());
            if let Some(catalog) = catalog {
                folder = folder.with_catalog(FolderSource::load_catalog(fs.as_ref(), catalog)?);
            }
            Box::new(folder)
        }
        SourceConfig::Steam { api_key, steam_id } => Box::new(RemoteSource::new(SteamCatalog::new(
            api_key.clone(),
            steam_id.clone(),
        )?)),
        SourceConfig::Gamestream {
            host,
            client_id,
            cert,
            key,
        } => Box::new(RemoteSource::new(GameStreamCatalog::from_pem_files(
            host.clone(),
            client_id.clone(),
            cert,
            key,
        )?)),
    };

    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCatalog {
        kind: SourceKind,
        items: Vec<RemoteItem>,
    }

    #[async_trait]
    impl RemoteCatalog for FixedCatalog {
        fn kind(&self) -> SourceKind {
            self.kind
        }

        async fn list_owned_items(&self) -> Result<Vec<RemoteItem>, LibraryError> {
            Ok(self.items.clone())
        }
    }

    struct DownCatalog;

    #[async_trait]
    impl RemoteCatalog for DownCatalog {
        fn kind(&self) -> SourceKind {
            SourceKind::GameStream
        }

        async fn list_owned_items(&self) -> Result<Vec<RemoteItem>, LibraryError> {
            Err(LibraryError::unavailable("gamestream", "host unreachable"))
        }
    }

    fn item(id: &str, title: &str) -> RemoteItem {
        RemoteItem {
            id: id.into(),
            title: title.into(),
        }
    }

    #[tokio::test]
    async fn test_remote_candidates_are_sorted() {
        let source = RemoteSource::new(FixedCatalog {
            kind: SourceKind::Steam,
            items: vec![item("620", "Portal 2"), item("440", "Team Fortress 2"), item("400", "Portal")],
        });

        let candidates = source.discover().await.unwrap();
        let names: Vec<String> = candidates.iter().map(Candidate::source_name).collect();
        assert_eq!(names, vec!["Portal", "Portal 2", "Team Fortress 2"]);
        assert_eq!(candidates[0], Candidate::steam(400, "Portal"));
    }

    #[tokio::test]
    async fn test_invalid_steam_id_fails() {
        let source = RemoteSource::new(FixedCatalog {
            kind: SourceKind::Steam,
            items: vec![item("abc", "Broken")],
        });

        assert!(matches!(
            source.discover().await,
            Err(LibraryError::SourceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_catalog_is_not_empty_list() {
        let source = RemoteSource::new(DownCatalog);
        assert!(matches!(
            source.discover().await,
            Err(LibraryError::SourceUnavailable {
                source_kind: "gamestream",
                ..
            })
        ));
    }
}
