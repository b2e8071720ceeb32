//! Multi-disc set detection
//!
//! Files named like `Title (Disc 1).cue`, `Title (Disk 2 of 3).chd` or
//! `Title [CD1].iso` are folded into one logical candidate whose path is
//! `{dir}/{set name}` and whose disc list holds the file names in scan order.

use crate::candidate::{Candidate, CandidateKind};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static DISC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<title>.*?)\s*[\(\[](?P<label>(?:dis[ck]|cd)\s*(?P<order>\d+)(?:\s*of\s*\d+)?)[\)\]](?P<rest>.*)$",
    )
    .expect("disc pattern is valid")
});

/// What the disc matcher extracted from one file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscInfo {
    /// Title with the disc token removed, other tags kept
    pub set_name: String,
    /// Disc token as written (`Disc 1`, `CD2`)
    pub label: String,
    /// Disc number parsed from the label
    pub order: u32,
    pub extension: String,
}

/// A group of sibling discs forming one title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiDiscSet {
    pub dir: PathBuf,
    pub name: String,
    /// Disc file names in encounter order
    pub discs: Vec<String>,
    pub extension: String,
    pub extra: bool,
}

impl MultiDiscSet {
    /// Extension-less marker path standing for the whole set
    pub fn marker_path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    pub fn into_candidate(self) -> Candidate {
        Candidate {
            kind: CandidateKind::File {
                path: self.marker_path(),
                discs: self.discs,
            },
            extra: self.extra,
        }
    }
}

/// Output of grouping before sets are folded into candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grouped {
    Single(Candidate),
    Set(MultiDiscSet),
}

/// Match a file path against the disc naming convention
pub fn match_disc(path: &Path) -> Option<DiscInfo> {
    let stem = path.file_stem()?.to_str()?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_string();

    let caps = DISC_PATTERN.captures(stem)?;
    let title = caps.name("title")?.as_str().trim();
    if title.is_empty() {
        return None;
    }

    let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or_default();
    let set_name = format!("{} {}", title, rest)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    Some(DiscInfo {
        set_name,
        label: caps.name("label")?.as_str().to_string(),
        order: caps.name("order")?.as_str().parse().ok()?,
        extension,
    })
}

/// Group sibling discs, keeping every other candidate as-is
pub fn group_sets(candidates: Vec<Candidate>) -> Vec<Grouped> {
    let mut grouped: Vec<Grouped> = Vec::with_capacity(candidates.len());
    let mut sets: HashMap<PathBuf, usize> = HashMap::new();

    for candidate in candidates {
        let Some(path) = candidate.path() else {
            grouped.push(Grouped::Single(candidate));
            continue;
        };
        let Some(disc) = match_disc(path) else {
            grouped.push(Grouped::Single(candidate));
            continue;
        };

        let dir = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let marker = dir.join(&disc.set_name);

        if let Some(&index) = sets.get(&marker)
            && let Grouped::Set(set) = &mut grouped[index]
        {
            tracing::debug!("Adding {} ({}) to set '{}'", file_name, disc.label, set.name);
            set.discs.push(file_name);
            set.extra |= candidate.extra;
            continue;
        }

        tracing::debug!("New multi-disc set '{}' from {}", disc.set_name, file_name);
        sets.insert(marker, grouped.len());
        grouped.push(Grouped::Set(MultiDiscSet {
            dir,
            name: disc.set_name,
            discs: vec![file_name],
            extension: disc.extension,
            extra: candidate.extra,
        }));
    }

    grouped
}

/// Fold multi-disc siblings into one candidate each.
///
/// With `enabled` false every candidate passes through untouched.
pub fn group(candidates: Vec<Candidate>, enabled: bool) -> Vec<Candidate> {
    if !enabled {
        return candidates;
    }

    group_sets(candidates)
        .into_iter()
        .map(|grouped| match grouped {
            Grouped::Single(candidate) => candidate,
            Grouped::Set(set) => set.into_candidate(),
        })
        .collect()
}
