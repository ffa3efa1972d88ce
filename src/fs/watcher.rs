use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tokio::sync::mpsc;

use crate::event::Event;

/// Default debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Watches the directory currently being browsed and reports changes in it.
///
/// Only one directory is watched at a time, non-recursively; call
/// [`FsWatcher::watch_dir`] whenever the browsed directory changes.
pub struct FsWatcher {
    watched: Option<PathBuf>,
    debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
}

impl FsWatcher {
    /// Create a watcher that sends debounced [`Event::FsChange`] events via `event_tx`.
    pub fn new(
        debounce_duration: Duration,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> notify::Result<Self> {
        let debouncer = new_debouncer(
            debounce_duration,
            move |result: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                match result {
                    Ok(events) => {
                        let paths: Vec<PathBuf> = events
                            .iter()
                            .filter(|e| e.kind == DebouncedEventKind::Any)
                            .map(|e| e.path.clone())
                            .collect();
                        if !paths.is_empty() {
                            let _ = event_tx.send(Event::FsChange(paths));
                        }
                    }
                    Err(e) => tracing::warn!("watch error: {}", e),
                }
            },
        )?;

        Ok(Self {
            watched: None,
            debouncer,
        })
    }

    /// Switch the watch to `dir`. No-op when `dir` is already watched.
    pub fn watch_dir(&mut self, dir: &Path) -> notify::Result<()> {
        if self.watched.as_deref() == Some(dir) {
            return Ok(());
        }
        if let Some(old) = self.watched.take() {
            // The old directory may already be gone.
            let _ = self.debouncer.watcher().unwatch(&old);
        }
        // Recorded before watching so a failing directory is not retried every frame.
        self.watched = Some(dir.to_path_buf());
        self.debouncer
            .watcher()
            .watch(dir, RecursiveMode::NonRecursive)?;
        tracing::debug!("watching {}", dir.display());
        Ok(())
    }
}

/// Whether any of the changed `paths` is `dir` itself or a direct child of it.
pub fn affects_dir(paths: &[PathBuf], dir: &Path) -> bool {
    paths
        .iter()
        .any(|p| p == dir || p.parent() == Some(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_change_affects_dir() {
        let paths = vec![PathBuf::from("/home/user/project/README.md")];
        assert!(affects_dir(&paths, Path::new("/home/user/project")));
    }

    #[test]
    fn dir_itself_affects_dir() {
        let paths = vec![PathBuf::from("/home/user/project")];
        assert!(affects_dir(&paths, Path::new("/home/user/project")));
    }

    #[test]
    fn nested_change_does_not_affect_dir() {
        let paths = vec![PathBuf::from("/home/user/project/src/main.rs")];
        assert!(!affects_dir(&paths, Path::new("/home/user/project")));
    }

    #[test]
    fn sibling_prefix_does_not_match() {
        let paths = vec![PathBuf::from("/home/user/project2/file.txt")];
        assert!(!affects_dir(&paths, Path::new("/home/user/project")));
    }

    #[test]
    fn empty_paths_affect_nothing() {
        assert!(!affects_dir(&[], Path::new("/tmp")));
    }
}
