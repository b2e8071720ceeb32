//! ROM folder source

use super::{CandidateSource, SourceKind};
use crate::LibraryError;
use crate::candidate::Candidate;
use crate::fs::FileSystem;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lists every file under a launcher's ROM directory
pub struct FolderSource {
    root: PathBuf,
    recursive: bool,
    fs: Arc<dyn FileSystem>,
    /// Verified file names; files outside it are flagged `extra`
    catalog: Option<HashSet<String>>,
}

impl FolderSource {
    pub fn new(root: PathBuf, recursive: bool, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root,
            recursive,
            fs,
            catalog: None,
        }
    }

    pub fn with_catalog(mut self, catalog: HashSet<String>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Read a verification catalog: one file name per line, `#` comments
    pub fn load_catalog(fs: &dyn FileSystem, path: &Path) -> Result<HashSet<String>, LibraryError> {
        let contents = fs.read_to_string(path)?;
        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect())
    }

    fn is_extra(&self, path: &Path) -> bool {
        let Some(catalog) = &self.catalog else {
            return false;
        };
        path.file_name()
            .map(|name| !catalog.contains(name.to_string_lossy().as_ref()))
            .unwrap_or(true)
    }
}

#[async_trait]
impl CandidateSource for FolderSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Folder
    }

    async fn discover(&self) -> Result<Vec<Candidate>, LibraryError> {
        let fs = self.fs.clone();
        let root = self.root.clone();
        let recursive = self.recursive;

        let listing = tokio::task::spawn_blocking(move || {
            if recursive {
                fs.list_recursive(&root)
            } else {
                fs.list_shallow(&root)
            }
        })
        .await
        .map_err(|e| LibraryError::Invariant(format!("folder listing task failed: {}", e)))?;

        let mut files = listing.map_err(|e| {
            LibraryError::unavailable("folder", format!("{}: {}", self.root.display(), e))
        })?;
        files.sort();

        tracing::info!("Found {} files under {}", files.len(), self.root.display());

        Ok(files
            .into_iter()
            .map(|path| {
                let extra = self.is_extra(&path);
                Candidate {
                    extra,
                    ..Candidate::file(path)
                }
            })
            .collect())
    }
}
