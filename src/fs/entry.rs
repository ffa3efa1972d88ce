use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::error::Result;

/// One file or directory record in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Display name. For search results this is the path relative to the search root.
    pub name: String,
    pub path: PathBuf,
    /// Lowercased extension without the dot, empty when there is none.
    pub extension: String,
    pub is_dir: bool,
    /// Raw permission bits (0 on platforms without unix modes).
    pub mode: u32,
    /// Size in bytes. `None` until known; directories are filled in by a size walk.
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

impl DirectoryEntry {
    /// Build an entry from a filesystem path.
    ///
    /// Symlinks are followed; a dangling link is described by its own metadata.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(_) => fs::symlink_metadata(path)?,
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        let is_dir = metadata.is_dir();

        Ok(Self {
            extension: extension_of(path),
            name,
            path: path.to_path_buf(),
            is_dir,
            mode: mode_bits(&metadata),
            size: if is_dir { None } else { Some(metadata.len()) },
            modified: metadata.modified().ok(),
        })
    }

    /// Replace the display name, keeping the path.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Dot-prefixed file name.
    pub fn is_hidden(&self) -> bool {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(false)
    }

    /// Human-readable size, `…` while unknown.
    pub fn size_label(&self) -> String {
        match self.size {
            Some(bytes) => format_size(bytes),
            None => "…".to_string(),
        }
    }

    /// `drwxr-xr-x` style permission string.
    pub fn mode_label(&self) -> String {
        const PERMS: [&str; 8] = ["---", "--x", "-w-", "-wx", "r--", "r-x", "rw-", "rwx"];
        let kind = if self.is_dir { 'd' } else { '-' };
        format!(
            "{}{}{}{}",
            kind,
            PERMS[((self.mode >> 6) & 7) as usize],
            PERMS[((self.mode >> 3) & 7) as usize],
            PERMS[(self.mode & 7) as usize]
        )
    }

    /// Local modification time, or `-` when the platform didn't report one.
    pub fn modified_label(&self) -> String {
        match self.modified {
            Some(t) => DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string(),
            None => "-".to_string(),
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(unix)]
fn mode_bits(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn mode_bits(_metadata: &fs::Metadata) -> u32 {
    0
}

/// Format a byte count in human-readable form.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    }
}

/// In-memory entry for state-machine tests.
#[cfg(test)]
pub fn fake_entry(dir: &Path, name: &str, is_dir: bool) -> DirectoryEntry {
    let path = dir.join(name);
    DirectoryEntry {
        extension: extension_of(&path),
        name: name.to_string(),
        path,
        is_dir,
        mode: if is_dir { 0o755 } else { 0o644 },
        size: if is_dir { None } else { Some(10) },
        modified: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn from_path_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Notes.MD");
        fs::write(&path, "hello").unwrap();

        let entry = DirectoryEntry::from_path(&path).unwrap();
        assert_eq!(entry.name, "Notes.MD");
        assert_eq!(entry.extension, "md");
        assert!(!entry.is_dir);
        assert_eq!(entry.size, Some(5));
        assert!(entry.modified.is_some());
    }

    #[test]
    fn from_path_directory_has_unknown_size() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sub");
        fs::create_dir(&path).unwrap();

        let entry = DirectoryEntry::from_path(&path).unwrap();
        assert!(entry.is_dir);
        assert_eq!(entry.size, None);
        assert_eq!(entry.size_label(), "…");
        assert!(entry.mode_label().starts_with('d'));
    }

    #[test]
    fn from_path_missing_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(DirectoryEntry::from_path(&tmp.path().join("nope")).is_err());
    }

    #[test]
    fn hidden_detection_uses_file_name() {
        let entry = fake_entry(Path::new("/tmp"), ".env", false);
        assert!(entry.is_hidden());
        let renamed = entry.with_name("sub/.env");
        assert!(renamed.is_hidden());
        assert!(!fake_entry(Path::new("/tmp"), "env", false).is_hidden());
    }

    #[test]
    fn mode_label_formats_bits() {
        let mut entry = fake_entry(Path::new("/tmp"), "run.sh", false);
        entry.mode = 0o100755;
        assert_eq!(entry.mode_label(), "-rwxr-xr-x");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn modified_label_without_time() {
        let entry = fake_entry(Path::new("/tmp"), "a", false);
        assert_eq!(entry.modified_label(), "-");
    }
}
