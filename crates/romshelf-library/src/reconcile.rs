//! Collection reconciliation
//!
//! Compares the stored collection with what a source currently offers:
//! records whose backing file or remote id vanished are dead, candidates no
//! record references yet are new.

use crate::LibraryError;
use crate::candidate::Candidate;
use crate::fs::FileSystem;
use crate::rom::{BackingRef, Collection, Rom, RomId};
use std::collections::{BTreeSet, HashSet};

/// Result of comparing a collection with fresh candidates
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Records to drop; applied by the session together with additions
    pub dead_ids: BTreeSet<RomId>,
    /// Candidates not represented yet, in candidate order
    pub new_candidates: Vec<Candidate>,
}

fn is_alive(
    rom: &Rom,
    backing: &BackingRef,
    discovered: &HashSet<BackingRef>,
    fs: &dyn FileSystem,
) -> bool {
    match backing {
        BackingRef::File(_) if rom.file.is_multidisc() => {
            rom.file.disc_paths().iter().all(|disc| fs.exists(disc))
        }
        BackingRef::File(path) => fs.exists(path),
        remote => discovered.contains(remote),
    }
}

/// Compute dead records and new candidates
pub fn reconcile(
    existing: &Collection,
    candidates: &[Candidate],
    fs: &dyn FileSystem,
) -> Result<Reconciliation, LibraryError> {
    let discovered: HashSet<BackingRef> = candidates.iter().map(Candidate::backing_ref).collect();

    let mut dead_ids = BTreeSet::new();
    let mut known = HashSet::with_capacity(existing.len());
    for rom in existing.iter() {
        let backing = rom.backing_ref()?;
        if is_alive(rom, &backing, &discovered, fs) {
            known.insert(backing);
        } else {
            // A dead set whose marker is still discovered comes back as new
            tracing::debug!("Dead ROM {} ({:?})", rom.id, backing);
            dead_ids.insert(rom.id.clone());
        }
    }

    let mut new_candidates = Vec::new();
    for candidate in candidates {
        // `insert` also drops duplicate candidates within one scan
        if known.insert(candidate.backing_ref()) {
            new_candidates.push(candidate.clone());
        }
    }

    tracing::info!(
        "Reconciled {} ROMs against {} candidates: {} dead, {} new",
        existing.len(),
        candidates.len(),
        dead_ids.len(),
        new_candidates.len()
    );

    Ok(Reconciliation {
        dead_ids,
        new_candidates,
    })
}
