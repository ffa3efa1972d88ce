use std::path::{Path, PathBuf};

use crate::fs::entry::DirectoryEntry;

/// Where the entries of a listing came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingSource {
    /// The children of one directory.
    Directory(PathBuf),
    /// Results of a recursive name search under `root`.
    Search { query: String, root: PathBuf },
}

impl ListingSource {
    /// Directory the listing is anchored at.
    pub fn dir(&self) -> &Path {
        match self {
            ListingSource::Directory(dir) => dir,
            ListingSource::Search { root, .. } => root,
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, ListingSource::Search { .. })
    }
}

/// Ordered entries plus the cursor over them.
///
/// The cursor is always `0` for an empty listing and `< len()` otherwise.
#[derive(Debug, Clone)]
pub struct Listing {
    source: ListingSource,
    entries: Vec<DirectoryEntry>,
    cursor: usize,
}

impl Listing {
    pub fn new(source: ListingSource, entries: Vec<DirectoryEntry>) -> Self {
        Self {
            source,
            entries,
            cursor: 0,
        }
    }

    pub fn source(&self) -> &ListingSource {
        &self.source
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub(super) fn set_cursor(&mut self, cursor: usize) {
        self.cursor = if self.entries.is_empty() {
            0
        } else {
            cursor.min(self.entries.len() - 1)
        };
    }

    /// Entry under the cursor, `None` when the listing is empty.
    pub fn selected(&self) -> Option<&DirectoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    /// Backfill a computed size. Ignored unless the entry at `index` is still `path`.
    pub fn apply_size(&mut self, index: usize, path: &Path, size: u64) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) if entry.path == path => {
                entry.size = Some(size);
                true
            }
            _ => false,
        }
    }
}
