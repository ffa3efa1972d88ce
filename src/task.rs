//! One-shot background work and the messages it reports back.
//!
//! A [`Task`] performs exactly one collaborator call and always produces
//! exactly one [`TaskMessage`]. Tasks never touch application state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use tokio::sync::mpsc;

use crate::browser::listing::ListingSource;
use crate::event::Event;
use crate::fs::entry::DirectoryEntry;
use crate::fs::service::DirectoryService;
use crate::render::{self, ContentRenderer};

/// Unit of work queued by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// List `dir`; the result also makes `dir` the working directory.
    List {
        generation: u64,
        dir: PathBuf,
        show_hidden: bool,
    },
    Find {
        generation: u64,
        query: String,
        root: PathBuf,
        show_hidden: bool,
    },
    SizeOf {
        generation: u64,
        index: usize,
        path: PathBuf,
    },
    Rename {
        from: PathBuf,
        to: PathBuf,
    },
    Move {
        source: PathBuf,
        dest_dir: PathBuf,
    },
    Copy {
        source: PathBuf,
        dest_dir: PathBuf,
    },
    Delete {
        path: PathBuf,
    },
    CreateFile {
        path: PathBuf,
    },
    CreateDirectory {
        path: PathBuf,
    },
    Zip {
        path: PathBuf,
    },
    Unzip {
        path: PathBuf,
    },
    ReadContent {
        path: PathBuf,
        is_dir: bool,
        width: u16,
        max_bytes: u64,
        show_hidden: bool,
    },
}

/// Outcome of a [`Task`].
#[derive(Debug)]
pub enum TaskMessage {
    ListingLoaded {
        generation: u64,
        source: ListingSource,
        entries: Vec<DirectoryEntry>,
    },
    ListingFailed {
        generation: u64,
        error: String,
    },
    SizeComputed {
        generation: u64,
        index: usize,
        path: PathBuf,
        result: Result<u64, String>,
    },
    /// A structural operation finished; `Ok` holds the success message.
    OperationFinished { result: Result<String, String> },
    ContentLoaded {
        path: PathBuf,
        result: Result<Text<'static>, String>,
    },
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

impl Task {
    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Task::List { .. } => "list",
            Task::Find { .. } => "find",
            Task::SizeOf { .. } => "size",
            Task::Rename { .. } => "rename",
            Task::Move { .. } => "move",
            Task::Copy { .. } => "copy",
            Task::Delete { .. } => "delete",
            Task::CreateFile { .. } => "create-file",
            Task::CreateDirectory { .. } => "create-dir",
            Task::Zip { .. } => "zip",
            Task::Unzip { .. } => "unzip",
            Task::ReadContent { .. } => "read",
        }
    }

    /// Perform the call. Blocking; run off the event loop.
    pub fn run(self, service: &dyn DirectoryService, renderer: &dyn ContentRenderer) -> TaskMessage {
        match self {
            Task::List {
                generation,
                dir,
                show_hidden,
            } => match service.list(&dir, show_hidden) {
                Ok(entries) => TaskMessage::ListingLoaded {
                    generation,
                    source: ListingSource::Directory(dir),
                    entries,
                },
                Err(e) => TaskMessage::ListingFailed {
                    generation,
                    error: format!("Cannot open {}: {}", dir.display(), e),
                },
            },
            Task::Find {
                generation,
                query,
                root,
                show_hidden,
            } => match service.find_by_name(&query, &root, show_hidden) {
                Ok(entries) => TaskMessage::ListingLoaded {
                    generation,
                    source: ListingSource::Search { query, root },
                    entries,
                },
                Err(e) => TaskMessage::ListingFailed {
                    generation,
                    error: format!("Find failed: {}", e),
                },
            },
            Task::SizeOf {
                generation,
                index,
                path,
            } => {
                let result = service.size_of(&path).map_err(|e| e.to_string());
                TaskMessage::SizeComputed {
                    generation,
                    index,
                    path,
                    result,
                }
            }
            Task::Rename { from, to } => TaskMessage::OperationFinished {
                result: service
                    .rename(&from, &to)
                    .map(|()| format!("Renamed {} to {}", name_of(&from), name_of(&to)))
                    .map_err(|e| format!("Rename failed: {}", e)),
            },
            Task::Move { source, dest_dir } => TaskMessage::OperationFinished {
                result: service
                    .move_or_copy(&source, &dest_dir, true)
                    .map(|dest| format!("Moved {} to {}", name_of(&source), dest.display()))
                    .map_err(|e| format!("Move failed: {}", e)),
            },
            Task::Copy { source, dest_dir } => TaskMessage::OperationFinished {
                result: service
                    .move_or_copy(&source, &dest_dir, false)
                    .map(|dest| format!("Copied {} to {}", name_of(&source), dest.display()))
                    .map_err(|e| format!("Copy failed: {}", e)),
            },
            Task::Delete { path } => TaskMessage::OperationFinished {
                result: service
                    .delete(&path)
                    .map(|()| format!("Deleted {}", name_of(&path)))
                    .map_err(|e| format!("Delete failed: {}", e)),
            },
            Task::CreateFile { path } => TaskMessage::OperationFinished {
                result: service
                    .create_file(&path)
                    .map(|()| format!("Created file {}", name_of(&path)))
                    .map_err(|e| format!("Create failed: {}", e)),
            },
            Task::CreateDirectory { path } => TaskMessage::OperationFinished {
                result: service
                    .create_directory(&path)
                    .map(|()| format!("Created directory {}", name_of(&path)))
                    .map_err(|e| format!("Create failed: {}", e)),
            },
            Task::Zip { path } => TaskMessage::OperationFinished {
                result: service
                    .zip(&path)
                    .map(|dest| format!("Archived {} as {}", name_of(&path), name_of(&dest)))
                    .map_err(|e| format!("Zip failed: {}", e)),
            },
            Task::Unzip { path } => TaskMessage::OperationFinished {
                result: service
                    .unzip(&path)
                    .map(|dest| format!("Extracted {} into {}", name_of(&path), name_of(&dest)))
                    .map_err(|e| format!("Unzip failed: {}", e)),
            },
            Task::ReadContent {
                path,
                is_dir,
                width,
                max_bytes,
                show_hidden,
            } => {
                let result = if is_dir {
                    service
                        .list(&path, show_hidden)
                        .map(|entries| directory_preview(&entries))
                } else {
                    render::render_file(renderer, &path, width, max_bytes)
                };
                TaskMessage::ContentLoaded {
                    path,
                    result: result.map_err(|e| e.to_string()),
                }
            }
        }
    }
}

fn directory_preview(entries: &[DirectoryEntry]) -> Text<'static> {
    if entries.is_empty() {
        return Text::from(Line::from(Span::styled(
            "(empty directory)",
            Style::default().fg(Color::DarkGray),
        )));
    }
    let lines: Vec<Line<'static>> = entries
        .iter()
        .map(|e| {
            if e.is_dir {
                Line::from(Span::styled(
                    format!("{}/", e.name),
                    Style::default().fg(Color::Blue),
                ))
            } else {
                Line::from(e.name.clone())
            }
        })
        .collect();
    Text::from(lines)
}

/// Runs tasks on tokio's blocking pool and posts their messages to the event loop.
pub struct Dispatcher {
    service: Arc<dyn DirectoryService>,
    renderer: Arc<dyn ContentRenderer>,
    tx: mpsc::UnboundedSender<Event>,
}

impl Dispatcher {
    pub fn new(
        service: Arc<dyn DirectoryService>,
        renderer: Arc<dyn ContentRenderer>,
        tx: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            service,
            renderer,
            tx,
        }
    }

    /// Start `task` without waiting for it.
    pub fn dispatch(&self, task: Task) {
        tracing::debug!(task = task.label(), "dispatching task");
        let service = Arc::clone(&self.service);
        let renderer = Arc::clone(&self.renderer);
        let tx = self.tx.clone();
        tokio::task::spawn_blocking(move || {
            let message = task.run(service.as_ref(), renderer.as_ref());
            if tx.send(Event::Task(message)).is_err() {
                tracing::trace!("event loop gone, dropping task result");
            }
        });
    }
}
