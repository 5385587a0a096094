use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

use super::digest::{digest_file, ContentDigest};

/// Result of checking one file against the run's digest cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateCheck {
    Original,
    Duplicate { original: PathBuf },
}

impl DuplicateCheck {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DuplicateCheck::Duplicate { .. })
    }

    pub fn original_path(&self) -> Option<&Path> {
        match self {
            DuplicateCheck::Duplicate { original } => Some(original),
            DuplicateCheck::Original => None,
        }
    }
}

/// Content digest → first path seen with that content, scoped to one sort run.
///
/// Insertion is first-writer-wins, so the cache stays correct if digests are
/// checked from several threads.
#[derive(Debug, Default)]
pub struct DuplicateCache {
    seen: DashMap<ContentDigest, PathBuf>,
}

impl DuplicateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `path` and check it.
    pub fn check(&self, path: &Path) -> io::Result<DuplicateCheck> {
        let digest = digest_file(path)?;
        Ok(self.check_digest(path, digest))
    }

    /// Check an already computed digest. A hit never replaces the stored path.
    pub fn check_digest(&self, path: &Path, digest: ContentDigest) -> DuplicateCheck {
        match self.seen.entry(digest) {
            Entry::Occupied(entry) => {
                trace!("{} duplicates {}", path.display(), entry.get().display());
                DuplicateCheck::Duplicate {
                    original: entry.get().clone(),
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(path.to_path_buf());
                DuplicateCheck::Original
            }
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
