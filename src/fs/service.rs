use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::entry::DirectoryEntry;
use crate::fs::operations;

/// Filesystem collaborator used by the browser.
///
/// Every call is synchronous, single-shot and independent of the others; paths
/// are always passed explicitly, the process working directory is never used.
pub trait DirectoryService: Send + Sync {
    /// Children of `dir` in enumeration order, dotfiles dropped unless `show_hidden`.
    fn list(&self, dir: &Path, show_hidden: bool) -> Result<Vec<DirectoryEntry>>;
    /// Rename `from` to `to`. Fails if `to` already exists.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    /// Copy `src` into `dest_dir`, removing the source afterwards when `remove_source` is set.
    /// Returns the path of the new entry.
    fn move_or_copy(&self, src: &Path, dest_dir: &Path, remove_source: bool) -> Result<PathBuf>;
    /// Delete a file, or a directory and everything under it.
    fn delete(&self, path: &Path) -> Result<()>;
    /// Create an empty file. Fails if `path` exists.
    fn create_file(&self, path: &Path) -> Result<()>;
    /// Create one directory. Fails if `path` exists.
    fn create_directory(&self, path: &Path) -> Result<()>;
    /// Archive `path` as a sibling `.zip`; returns the archive path.
    fn zip(&self, path: &Path) -> Result<PathBuf>;
    /// Extract an archive into a sibling directory; returns that directory.
    fn unzip(&self, path: &Path) -> Result<PathBuf>;
    /// Total bytes of a file or directory tree.
    fn size_of(&self, path: &Path) -> Result<u64>;
    /// Entries under `root` whose names match `query`, named relative to `root`.
    fn find_by_name(&self, query: &str, root: &Path, show_hidden: bool)
        -> Result<Vec<DirectoryEntry>>;
}

/// Default number of entries a name search returns.
pub const DEFAULT_MAX_FIND_RESULTS: usize = 500;

/// [`DirectoryService`] backed by the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalDirectoryService {
    max_find_results: usize,
}

impl LocalDirectoryService {
    pub fn new(max_find_results: usize) -> Self {
        Self {
            max_find_results: max_find_results.max(1),
        }
    }
}

impl Default for LocalDirectoryService {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FIND_RESULTS)
    }
}

impl DirectoryService for LocalDirectoryService {
    fn list(&self, dir: &Path, show_hidden: bool) -> Result<Vec<DirectoryEntry>> {
        operations::list_dir(dir, show_hidden)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        operations::rename(from, to)
    }

    fn move_or_copy(&self, src: &Path, dest_dir: &Path, remove_source: bool) -> Result<PathBuf> {
        if remove_source {
            operations::move_item(src, dest_dir)
        } else {
            operations::copy_recursive(src, dest_dir)
        }
    }

    fn delete(&self, path: &Path) -> Result<()> {
        operations::delete(path)
    }

    fn create_file(&self, path: &Path) -> Result<()> {
        operations::create_file(path)
    }

    fn create_directory(&self, path: &Path) -> Result<()> {
        operations::create_dir(path)
    }

    fn zip(&self, path: &Path) -> Result<PathBuf> {
        operations::zip_path(path)
    }

    fn unzip(&self, path: &Path) -> Result<PathBuf> {
        operations::unzip_archive(path)
    }

    fn size_of(&self, path: &Path) -> Result<u64> {
        operations::size_of(path)
    }

    fn find_by_name(
        &self,
        query: &str,
        root: &Path,
        show_hidden: bool,
    ) -> Result<Vec<DirectoryEntry>> {
        operations::find_by_name(query, root, show_hidden, self.max_find_results)
    }
}
