use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::Result;
use crate::fs::entry::DirectoryEntry;

/// Read a directory's entries in enumeration order.
///
/// Unreadable children (permission denied, vanished mid-read) are skipped.
pub fn list_dir(dir: &Path, show_hidden: bool) -> Result<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        match DirectoryEntry::from_path(&entry.path()) {
            Ok(e) if show_hidden || !e.is_hidden() => entries.push(e),
            _ => continue,
        }
    }
    Ok(entries)
}

/// Create an empty file. Fails if something already exists at `path`.
pub fn create_file(path: &Path) -> Result<()> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    Ok(())
}

/// Create a new directory at the given path.
pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir(path)?;
    Ok(())
}

/// Rename a file or directory. Refuses to clobber an existing destination.
pub fn rename(from: &Path, to: &Path) -> Result<()> {
    if to.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", to.display()),
        )
        .into());
    }
    fs::rename(from, to)?;
    Ok(())
}

/// Delete a file or directory. Directories are removed recursively.
pub fn delete(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Resolve a name collision by appending `_copy`, `_copy2`, etc.
///
/// Returns a path that does not exist yet in the destination directory.
pub fn resolve_collision(dest: &Path) -> PathBuf {
    if !dest.exists() {
        return dest.to_path_buf();
    }

    let parent = dest.parent().unwrap_or(Path::new("."));
    let stem = dest
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = dest.extension().map(|e| e.to_string_lossy().to_string());

    for i in 1..=1000 {
        let suffix = if i == 1 {
            "_copy".to_string()
        } else {
            format!("_copy{}", i)
        };
        let new_name = match &ext {
            Some(e) => format!("{}{}.{}", stem, suffix, e),
            None => format!("{}{}", stem, suffix),
        };
        let candidate = parent.join(&new_name);
        if !candidate.exists() {
            return candidate;
        }
    }

    dest.to_path_buf()
}

fn file_name_of(path: &Path) -> Result<&std::ffi::OsStr> {
    Ok(path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no filename"))?)
}

/// Recursively copy a file or directory from `src` into `dest_dir`.
///
/// Returns the final path of the copy (with collision resolution).
pub fn copy_recursive(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let dest = resolve_collision(&dest_dir.join(file_name_of(src)?));
    if dest.starts_with(src) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "cannot copy a directory into itself",
        )
        .into());
    }

    if src.is_dir() {
        copy_dir_recursive(src, &dest)?;
    } else {
        fs::copy(src, &dest)?;
    }
    Ok(dest)
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dest_path)?;
        } else {
            fs::copy(&src_path, &dest_path)?;
        }
    }
    Ok(())
}

/// Move a file or directory from `src` into `dest_dir`.
///
/// Uses `fs::rename` first (same device). Falls back to copy then delete
/// across devices; if the copy lands but the source can't be removed, the
/// error says so and both copies are left in place.
pub fn move_item(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let dest = resolve_collision(&dest_dir.join(file_name_of(src)?));
    if dest.starts_with(src) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "cannot move a directory into itself",
        )
        .into());
    }

    match fs::rename(src, &dest) {
        Ok(()) => Ok(dest),
        Err(_) => {
            if src.is_dir() {
                copy_dir_recursive(src, &dest)?;
            } else {
                fs::copy(src, &dest)?;
            }
            delete(src).map_err(|e| {
                io::Error::other(format!(
                    "copied to {} but could not remove source: {}",
                    dest.display(),
                    e
                ))
            })?;
            Ok(dest)
        }
    }
}

/// Total size in bytes of a file, or of everything under a directory.
///
/// Symlinks are not followed; unreadable subdirectories count as zero.
pub fn size_of(path: &Path) -> Result<u64> {
    let metadata = fs::symlink_metadata(path)?;
    if !metadata.is_dir() {
        return Ok(metadata.len());
    }

    let mut total = 0;
    let mut stack = vec![path.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let meta = match entry.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            };
            if meta.is_dir() {
                stack.push(entry.path());
            } else {
                total += meta.len();
            }
        }
    }
    Ok(total)
}

/// Zip a file or directory into `<name>.zip` next to it.
pub fn zip_path(path: &Path) -> Result<PathBuf> {
    let name = file_name_of(path)?.to_string_lossy().to_string();
    let parent = path.parent().unwrap_or(Path::new("."));
    let dest = resolve_collision(&parent.join(format!("{}.zip", name)));

    let file = fs::File::create(&dest)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    if path.is_dir() {
        let mut stack = vec![path.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let rel = archive_name(path, &dir, &name);
            writer.add_directory(rel, options)?;
            for entry in fs::read_dir(&dir)? {
                let entry_path = entry?.path();
                if entry_path.is_dir() {
                    stack.push(entry_path);
                } else {
                    writer.start_file(archive_name(path, &entry_path, &name), options)?;
                    let mut src = fs::File::open(&entry_path)?;
                    io::copy(&mut src, &mut writer)?;
                }
            }
        }
    } else {
        writer.start_file(name, options)?;
        let mut src = fs::File::open(path)?;
        io::copy(&mut src, &mut writer)?;
    }

    writer.finish()?;
    Ok(dest)
}

/// Archive member name for `item` under the zipped `root`, using `/` separators.
fn archive_name(root: &Path, item: &Path, root_name: &str) -> String {
    let rel = item.strip_prefix(root).unwrap_or(item);
    let mut parts = vec![root_name.to_string()];
    parts.extend(rel.components().map(|c| c.as_os_str().to_string_lossy().to_string()));
    parts.join("/")
}

/// Extract a zip archive into a sibling directory named after the archive stem.
pub fn unzip_archive(path: &Path) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no filename"))?;
    let parent = path.parent().unwrap_or(Path::new("."));
    let dest = resolve_collision(&parent.join(stem));

    let file = fs::File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    fs::create_dir_all(&dest)?;
    archive.extract(&dest)?;
    Ok(dest)
}

/// Recursive name search under `root`, shallowest matches first.
///
/// Names are fuzzy-matched against `query`. Returned entries are named by their
/// path relative to `root`. Stops after `max_results` matches.
pub fn find_by_name(
    query: &str,
    root: &Path,
    show_hidden: bool,
    max_results: usize,
) -> Result<Vec<DirectoryEntry>> {
    let matcher = SkimMatcherV2::default();
    let mut results = Vec::new();
    let mut queue = VecDeque::from([root.to_path_buf()]);
    let mut first = true;

    while let Some(dir) = queue.pop_front() {
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            // The root itself must be readable; deeper failures are skipped.
            Err(e) if first => return Err(e.into()),
            Err(_) => continue,
        };
        first = false;

        for entry in entries.flatten() {
            let entry_path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if !show_hidden && name.starts_with('.') {
                continue;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                queue.push_back(entry_path.clone());
            }
            if matcher.fuzzy_match(&name, query).is_none() {
                continue;
            }
            if let Ok(found) = DirectoryEntry::from_path(&entry_path) {
                let rel = entry_path
                    .strip_prefix(root)
                    .unwrap_or(&entry_path)
                    .to_string_lossy()
                    .to_string();
                results.push(found.with_name(rel));
                if results.len() >= max_results {
                    return Ok(results);
                }
            }
        }
    }
    Ok(results)
}
