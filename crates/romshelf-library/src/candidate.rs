//! Transient scan candidates

use crate::rom::BackingRef;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Where a candidate came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateKind {
    /// A file on disk, or a folded multi-disc set when `discs` is non-empty
    File { path: PathBuf, discs: Vec<String> },
    Steam { app_id: u64, name: String },
    GameStream { app_id: String, title: String },
}

/// One potential ROM found by a source during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub kind: CandidateKind,
    /// Missing from the verification catalog
    pub extra: bool,
}

impl Candidate {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: CandidateKind::File {
                path: path.into(),
                discs: Vec::new(),
            },
            extra: false,
        }
    }

    pub fn steam(app_id: u64, name: impl Into<String>) -> Self {
        Self {
            kind: CandidateKind::Steam {
                app_id,
                name: name.into(),
            },
            extra: false,
        }
    }

    pub fn gamestream(app_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind: CandidateKind::GameStream {
                app_id: app_id.into(),
                title: title.into(),
            },
            extra: false,
        }
    }

    /// File path for filesystem candidates
    pub fn path(&self) -> Option<&Path> {
        match &self.kind {
            CandidateKind::File { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Name the search term is derived from: the file name, or the remote title
    pub fn source_name(&self) -> String {
        match &self.kind {
            CandidateKind::File { path, .. } => path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default(),
            CandidateKind::Steam { name, .. } => name.clone(),
            CandidateKind::GameStream { title, .. } => title.clone(),
        }
    }

    pub fn backing_ref(&self) -> BackingRef {
        match &self.kind {
            CandidateKind::File { path, .. } => BackingRef::File(path.clone()),
            CandidateKind::Steam { app_id, .. } => BackingRef::SteamApp(*app_id),
            CandidateKind::GameStream { app_id, .. } => BackingRef::GameStreamApp(app_id.clone()),
        }
    }
}

/// Keep file candidates whose extension is whitelisted.
///
/// Remote candidates always pass.
pub fn retain_extensions(candidates: Vec<Candidate>, extensions: &BTreeSet<String>) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|candidate| match candidate.path() {
            Some(path) => path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.contains(&ext.to_lowercase())),
            None => true,
        })
        .collect()
}

/// Extensions of files romshelf writes next to ROMs itself
const SIDECAR_EXTENSIONS: [&str; 2] = ["nfo", "partial"];

/// Drop files that are not ROMs: sidecars and anything under an asset
/// directory. Remote candidates always pass.
pub fn retain_roms<'a>(
    candidates: Vec<Candidate>,
    asset_dirs: impl IntoIterator<Item = &'a Path>,
) -> Vec<Candidate> {
    let asset_dirs: Vec<&Path> = asset_dirs.into_iter().collect();

    candidates
        .into_iter()
        .filter(|candidate| {
            let Some(path) = candidate.path() else {
                return true;
            };
            let sidecar = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SIDECAR_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
            let asset = asset_dirs.iter().any(|dir| path.starts_with(dir));
            if sidecar || asset {
                tracing::trace!("Ignoring non-ROM file {}", path.display());
            }
            !sidecar && !asset
        })
        .collect()
}
