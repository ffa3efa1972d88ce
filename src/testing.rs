//! In-memory collaborators for state-machine tests.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ratatui::text::Text;

use crate::error::{AppError, Result};
use crate::fs::entry::{fake_entry, DirectoryEntry};
use crate::fs::service::DirectoryService;
use crate::render::ContentRenderer;

fn io_err(kind: io::ErrorKind, msg: &str) -> AppError {
    AppError::Io(io::Error::new(kind, msg.to_string()))
}

/// Directory tree kept in a map of directory path to children.
///
/// Mutating calls are recorded so tests can assert what was (or was not) invoked.
#[derive(Default)]
pub struct FakeDirectoryService {
    dirs: Mutex<BTreeMap<PathBuf, Vec<DirectoryEntry>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeDirectoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `dir` with the given `(name, is_dir)` children. Child directories are created empty.
    pub fn with_dir(self, dir: &str, children: &[(&str, bool)]) -> Self {
        let dir = PathBuf::from(dir);
        {
            let mut dirs = self.dirs.lock().unwrap();
            dirs.entry(dir.clone()).or_default();
        }
        for (name, is_dir) in children {
            self.add(&dir, name, *is_dir);
        }
        self
    }

    pub fn add(&self, dir: &Path, name: &str, is_dir: bool) {
        let entry = fake_entry(dir, name, is_dir);
        let mut dirs = self.dirs.lock().unwrap();
        if is_dir {
            dirs.entry(entry.path.clone()).or_default();
        }
        dirs.entry(dir.to_path_buf()).or_default().push(entry);
    }

    /// Remove an entry behind the browser's back.
    pub fn remove(&self, path: &Path) {
        let mut dirs = self.dirs.lock().unwrap();
        if let Some(parent) = path.parent() {
            if let Some(children) = dirs.get_mut(parent) {
                children.retain(|e| e.path != path);
            }
        }
        dirs.retain(|k, _| !k.starts_with(path));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn find_entry(&self, path: &Path) -> Option<DirectoryEntry> {
        let dirs = self.dirs.lock().unwrap();
        dirs.get(path.parent()?)?
            .iter()
            .find(|e| e.path == path)
            .cloned()
    }

    fn exists(&self, path: &Path) -> bool {
        self.find_entry(path).is_some()
    }
}

impl DirectoryService for FakeDirectoryService {
    fn list(&self, dir: &Path, show_hidden: bool) -> Result<Vec<DirectoryEntry>> {
        let dirs = self.dirs.lock().unwrap();
        let children = dirs
            .get(dir)
            .ok_or_else(|| io_err(io::ErrorKind::NotFound, "no such directory"))?;
        Ok(children
            .iter()
            .filter(|e| show_hidden || !e.is_hidden())
            .cloned()
            .collect())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.record(format!("rename {} -> {}", from.display(), to.display()));
        let entry = self
            .find_entry(from)
            .ok_or_else(|| io_err(io::ErrorKind::NotFound, "source missing"))?;
        if self.exists(to) {
            return Err(io_err(io::ErrorKind::AlreadyExists, "destination exists"));
        }
        self.remove(from);
        let parent = to.parent().unwrap_or(Path::new("/"));
        let name = to
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.add(parent, &name, entry.is_dir);
        Ok(())
    }

    fn move_or_copy(&self, src: &Path, dest_dir: &Path, remove_source: bool) -> Result<PathBuf> {
        let verb = if remove_source { "move" } else { "copy" };
        self.record(format!("{} {} -> {}", verb, src.display(), dest_dir.display()));
        let entry = self
            .find_entry(src)
            .ok_or_else(|| io_err(io::ErrorKind::NotFound, "source missing"))?;
        if !self.dirs.lock().unwrap().contains_key(dest_dir) {
            return Err(io_err(io::ErrorKind::NotFound, "destination missing"));
        }
        let mut name = entry.name.clone();
        if !remove_source && src.parent() == Some(dest_dir) {
            name = format!("{}_copy", name);
        }
        if remove_source {
            self.remove(src);
        }
        self.add(dest_dir, &name, entry.is_dir);
        Ok(dest_dir.join(name))
    }

    fn delete(&self, path: &Path) -> Result<()> {
        self.record(format!("delete {}", path.display()));
        if !self.exists(path) {
            return Err(io_err(io::ErrorKind::NotFound, "missing"));
        }
        self.remove(path);
        Ok(())
    }

    fn create_file(&self, path: &Path) -> Result<()> {
        self.record(format!("create_file {}", path.display()));
        self.create(path, false)
    }

    fn create_directory(&self, path: &Path) -> Result<()> {
        self.record(format!("create_directory {}", path.display()));
        self.create(path, true)
    }

    fn zip(&self, path: &Path) -> Result<PathBuf> {
        self.record(format!("zip {}", path.display()));
        let archive = path.with_extension("zip");
        self.create(&archive, false)?;
        Ok(archive)
    }

    fn unzip(&self, path: &Path) -> Result<PathBuf> {
        self.record(format!("unzip {}", path.display()));
        let dest = path.with_extension("");
        self.create(&dest, true)?;
        Ok(dest)
    }

    fn size_of(&self, _path: &Path) -> Result<u64> {
        Ok(4096)
    }

    fn find_by_name(
        &self,
        query: &str,
        root: &Path,
        show_hidden: bool,
    ) -> Result<Vec<DirectoryEntry>> {
        self.record(format!("find {} in {}", query, root.display()));
        let dirs = self.dirs.lock().unwrap();
        if !dirs.contains_key(root) {
            return Err(io_err(io::ErrorKind::NotFound, "no such directory"));
        }
        Ok(dirs
            .iter()
            .filter(|(dir, _)| dir.starts_with(root))
            .flat_map(|(_, children)| children.iter())
            .filter(|e| show_hidden || !e.is_hidden())
            .filter(|e| e.name.contains(query))
            .map(|e| {
                let relative = e.path.strip_prefix(root).unwrap_or(&e.path);
                e.clone().with_name(relative.to_string_lossy())
            })
            .collect())
    }
}

impl FakeDirectoryService {
    fn create(&self, path: &Path, is_dir: bool) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| io_err(io::ErrorKind::InvalidInput, "no parent"))?;
        if !self.dirs.lock().unwrap().contains_key(parent) {
            return Err(io_err(io::ErrorKind::NotFound, "parent missing"));
        }
        if self.exists(path) {
            return Err(io_err(io::ErrorKind::AlreadyExists, "exists"));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.add(parent, &name, is_dir);
        Ok(())
    }
}

/// Renderer that echoes what it was asked to render.
pub struct FakeRenderer;

impl ContentRenderer for FakeRenderer {
    fn highlight_code(&self, content: &str, extension: &str) -> Result<Text<'static>> {
        Ok(Text::raw(format!("{}:{}", extension, content)))
    }

    fn render_markdown(&self, content: &str, _width: u16) -> Result<Text<'static>> {
        Ok(Text::raw(format!("md:{}", content)))
    }

    fn image_to_string(&self, _path: &Path, _width: u16) -> Result<Text<'static>> {
        Ok(Text::raw("image"))
    }

    fn extract_pdf_text(&self, _path: &Path) -> Result<Text<'static>> {
        Ok(Text::raw("pdf"))
    }
}
