use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use ratatui::text::Text;

use crate::browser::command::{self, Command};
use crate::browser::listing::ListingSource;
use crate::browser::mode::{is_affirmative, Mode, PendingText, Target};
use crate::browser::status::{self, StatusInput, StatusLine, StatusMessage};
use crate::browser::Browser;
use crate::fs::watcher;
use crate::render::DEFAULT_MAX_PREVIEW_BYTES;
use crate::task::{Task, TaskMessage};

/// Startup settings resolved from config and CLI.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub show_hidden: bool,
    pub preview_enabled: bool,
    pub max_preview_bytes: u64,
    /// Target of `~`. `None` disables jumping home.
    pub home: Option<PathBuf>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            show_hidden: false,
            preview_enabled: true,
            max_preview_bytes: DEFAULT_MAX_PREVIEW_BYTES,
            home: dirs::home_dir(),
        }
    }
}

/// What the preview pane currently shows.
#[derive(Debug, Clone, Default)]
pub enum PreviewContent {
    #[default]
    Empty,
    Loading,
    Ready(Text<'static>),
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct Preview {
    /// Entry the content was requested for.
    pub path: Option<PathBuf>,
    pub content: PreviewContent,
    pub scroll: u16,
}

/// Main application state.
///
/// Owned by the event loop. Input handlers mutate it directly; anything that
/// touches the filesystem is queued as a [`Task`] and comes back through
/// [`App::apply`].
pub struct App {
    pub browser: Browser,
    pub mode: Mode,
    pub pending: PendingText,
    pub message: Option<StatusMessage>,
    pub preview: Preview,
    pub should_quit: bool,
    cwd: PathBuf,
    show_hidden: bool,
    options: AppOptions,
    /// Generation of the latest listing or find request.
    requested_generation: u64,
    /// Generation of the listing currently displayed.
    listing_generation: u64,
    /// What the latest listing or find request will show once applied.
    requested_source: ListingSource,
    requested_sizes: HashSet<usize>,
    preview_width: u16,
    tasks: Vec<Task>,
}

impl App {
    /// Create the app and queue the listing of `start`.
    pub fn new(start: &Path, options: AppOptions) -> Self {
        let mut app = Self {
            browser: Browser::new(start, 1),
            mode: Mode::Idle,
            pending: PendingText::default(),
            message: None,
            preview: Preview::default(),
            should_quit: false,
            cwd: start.to_path_buf(),
            show_hidden: options.show_hidden,
            options,
            requested_generation: 0,
            listing_generation: 0,
            requested_source: ListingSource::Directory(start.to_path_buf()),
            requested_sizes: HashSet::new(),
            preview_width: 40,
            tasks: Vec::new(),
        };
        app.request_listing(start.to_path_buf());
        app
    }

    /// Directory every relative operation is resolved against.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    pub fn preview_enabled(&self) -> bool {
        self.options.preview_enabled
    }

    /// Drain the tasks queued since the last call.
    pub fn take_tasks(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.tasks)
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn status_line(&self) -> StatusLine {
        status::derive(&StatusInput {
            mode: &self.mode,
            pending: &self.pending,
            selected: self.browser.selected(),
            cursor: self.browser.cursor(),
            len: self.browser.len(),
            message: self.message.as_ref(),
        })
    }

    /// New listing height and preview width after a terminal resize.
    pub fn resize(&mut self, listing_height: usize, preview_width: u16) {
        self.browser.resize(listing_height);
        self.preview_width = preview_width.max(1);
        self.request_visible_sizes();
    }

    // Navigation

    pub fn move_down(&mut self) {
        if self.mode.allows_navigation() {
            self.browser.move_down();
            self.after_cursor_change();
        }
    }

    pub fn move_up(&mut self) {
        if self.mode.allows_navigation() {
            self.browser.move_up();
            self.after_cursor_change();
        }
    }

    pub fn goto_top(&mut self) {
        if self.mode.allows_navigation() {
            self.browser.goto_top();
            self.after_cursor_change();
        }
    }

    pub fn goto_bottom(&mut self) {
        if self.mode.allows_navigation() {
            self.browser.goto_bottom();
            self.after_cursor_change();
        }
    }

    /// Enter the selected directory. Files are left to the preview pane.
    pub fn open_selected(&mut self) {
        if !self.mode.allows_navigation() {
            return;
        }
        if let Some(entry) = self.browser.selected() {
            if entry.is_dir {
                let dir = entry.path.clone();
                self.request_listing(dir);
            }
        }
    }

    pub fn go_parent(&mut self) {
        if !self.mode.allows_navigation() {
            return;
        }
        if let Some(parent) = self.cwd.parent() {
            let parent = parent.to_path_buf();
            self.request_listing(parent);
        }
    }

    pub fn go_home(&mut self) {
        if !self.mode.allows_navigation() {
            return;
        }
        match self.options.home.clone() {
            Some(home) => self.request_listing(home),
            None => self.message = Some(StatusMessage::error("Home directory is unknown")),
        }
    }

    /// Reload the latest requested listing. A navigation still in flight is
    /// re-requested rather than overtaken by the directory it is leaving.
    pub fn refresh(&mut self) {
        match self.requested_source.clone() {
            ListingSource::Search { query, root } => self.request_find(query, root),
            ListingSource::Directory(dir) => self.request_listing(dir),
        }
    }

    pub fn toggle_hidden(&mut self) {
        if !self.mode.allows_navigation() {
            return;
        }
        self.show_hidden = !self.show_hidden;
        let state = if self.show_hidden { "shown" } else { "hidden" };
        self.message = Some(StatusMessage::info(format!("Hidden files {}", state)));
        self.refresh();
    }

    pub fn scroll_preview_down(&mut self) {
        let max = match &self.preview.content {
            PreviewContent::Ready(text) => text.lines.len().saturating_sub(1),
            _ => 0,
        };
        let max = u16::try_from(max).unwrap_or(u16::MAX);
        self.preview.scroll = self.preview.scroll.saturating_add(1).min(max);
    }

    pub fn scroll_preview_up(&mut self) {
        self.preview.scroll = self.preview.scroll.saturating_sub(1);
    }

    // Mode transitions

    fn selected_target(&self) -> Option<Target> {
        self.browser.selected().map(Target::of)
    }

    pub fn begin_rename(&mut self) {
        if self.mode != Mode::Idle {
            return;
        }
        if let Some(target) = self.selected_target() {
            self.pending = PendingText::with_text(&target.name);
            self.mode = Mode::Renaming { target };
        }
    }

    pub fn begin_move(&mut self) {
        if self.mode != Mode::Idle {
            return;
        }
        if let Some(target) = self.selected_target() {
            self.pending.clear();
            self.mode = Mode::Moving {
                target,
                origin: self.cwd.clone(),
            };
        }
    }

    pub fn begin_delete(&mut self) {
        if self.mode != Mode::Idle {
            return;
        }
        if let Some(target) = self.selected_target() {
            self.pending.clear();
            self.mode = Mode::DeleteConfirm { target };
        }
    }

    pub fn begin_create_file(&mut self) {
        self.begin_text_mode(Mode::CreatingFile);
    }

    pub fn begin_create_directory(&mut self) {
        self.begin_text_mode(Mode::CreatingDirectory);
    }

    pub fn begin_find(&mut self) {
        self.begin_text_mode(Mode::Finding);
    }

    pub fn begin_command(&mut self) {
        self.begin_text_mode(Mode::CommandBar);
    }

    fn begin_text_mode(&mut self, mode: Mode) {
        if self.mode == Mode::Idle {
            self.pending.clear();
            self.mode = mode;
        }
    }

    /// Escape: leave any pending mode; in Idle, leave a search listing.
    pub fn cancel(&mut self) {
        if self.mode != Mode::Idle {
            self.mode = Mode::Idle;
            self.pending.clear();
            return;
        }
        if self.browser.listing().source().is_search() {
            self.request_listing(self.cwd.clone());
        } else {
            self.message = None;
        }
    }

    // Pending text editing

    pub fn input_char(&mut self, c: char) {
        if self.mode.captures_text() {
            self.pending.insert(c);
        }
    }

    pub fn input_backspace(&mut self) {
        if self.mode.captures_text() {
            self.pending.backspace();
        }
    }

    pub fn input_left(&mut self) {
        if self.mode.captures_text() {
            self.pending.move_left();
        }
    }

    pub fn input_right(&mut self) {
        if self.mode.captures_text() {
            self.pending.move_right();
        }
    }

    pub fn input_home(&mut self) {
        if self.mode.captures_text() {
            self.pending.home();
        }
    }

    pub fn input_end(&mut self) {
        if self.mode.captures_text() {
            self.pending.end();
        }
    }

    /// Enter: complete the pending mode. The mode is Idle afterwards.
    pub fn submit(&mut self) {
        let mode = std::mem::take(&mut self.mode);
        let text = std::mem::take(&mut self.pending).text;

        match mode {
            Mode::Idle => {}
            Mode::Renaming { target } => self.rename_target(&target, text.trim()),
            Mode::Moving { target, .. } => {
                if target.path.parent() == Some(self.cwd.as_path()) {
                    self.message = Some(StatusMessage::info(format!(
                        "{} is already in {}",
                        target.name,
                        self.cwd.display()
                    )));
                    return;
                }
                self.tasks.push(Task::Move {
                    source: target.path,
                    dest_dir: self.cwd.clone(),
                });
            }
            Mode::DeleteConfirm { target } => {
                if is_affirmative(&text) {
                    self.tasks.push(Task::Delete { path: target.path });
                }
            }
            Mode::CreatingFile => {
                let name = text.trim();
                if !name.is_empty() {
                    let path = self.resolve(name);
                    self.tasks.push(Task::CreateFile { path });
                }
            }
            Mode::CreatingDirectory => {
                let name = text.trim();
                if !name.is_empty() {
                    let path = self.resolve(name);
                    self.tasks.push(Task::CreateDirectory { path });
                }
            }
            Mode::Finding => {
                let query = text.trim();
                if !query.is_empty() {
                    self.request_find(query.to_string(), self.cwd.clone());
                }
            }
            Mode::CommandBar => {
                if let Some(cmd) = command::parse(&text) {
                    self.execute(cmd);
                }
            }
        }
    }

    fn rename_target(&mut self, target: &Target, new_name: &str) {
        if new_name.is_empty() || new_name == target.name {
            return;
        }
        if !is_plain_name(new_name) {
            self.message = Some(StatusMessage::error(format!(
                "Invalid name: {}",
                new_name
            )));
            return;
        }
        self.tasks.push(Task::Rename {
            from: target.path.clone(),
            to: target.path.with_file_name(new_name),
        });
    }

    /// Run a parsed command-bar command.
    pub fn execute(&mut self, cmd: Command) {
        let selected = self.selected_target();
        if cmd.needs_selection() && selected.is_none() {
            return;
        }
        tracing::debug!(?cmd, "executing command");

        match cmd {
            Command::MakeDir(name) => {
                let path = self.resolve(&name);
                self.tasks.push(Task::CreateDirectory { path });
            }
            Command::Touch(name) => {
                let path = self.resolve(&name);
                self.tasks.push(Task::CreateFile { path });
            }
            Command::Rename(name) => {
                if let Some(target) = selected {
                    self.rename_target(&target, &name);
                }
            }
            Command::Remove => {
                if let Some(target) = selected {
                    self.tasks.push(Task::Delete { path: target.path });
                }
            }
            Command::Copy(dest) => {
                if let Some(target) = selected {
                    let dest_dir = match dest {
                        Some(dest) => self.resolve(&dest),
                        None => self.cwd.clone(),
                    };
                    self.tasks.push(Task::Copy {
                        source: target.path,
                        dest_dir,
                    });
                }
            }
            Command::Zip => self.zip_selected(),
            Command::Unzip => self.unzip_selected(),
            Command::ChangeDir(dir) => {
                let dir = self.resolve(&dir);
                self.request_listing(dir);
            }
            Command::Find(query) => self.request_find(query, self.cwd.clone()),
            Command::ToggleHidden => self.toggle_hidden(),
        }
    }

    // Single-key operations on the selected entry

    /// Duplicate the selected entry next to itself.
    pub fn copy_selected(&mut self) {
        if self.mode != Mode::Idle {
            return;
        }
        if let Some(entry) = self.browser.selected() {
            let dest_dir = entry
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.cwd.clone());
            self.tasks.push(Task::Copy {
                source: entry.path.clone(),
                dest_dir,
            });
        }
    }

    pub fn zip_selected(&mut self) {
        if self.mode != Mode::Idle {
            return;
        }
        if let Some(entry) = self.browser.selected() {
            self.tasks.push(Task::Zip {
                path: entry.path.clone(),
            });
        }
    }

    pub fn unzip_selected(&mut self) {
        if self.mode != Mode::Idle {
            return;
        }
        let Some(entry) = self.browser.selected() else {
            return;
        };
        if entry.is_dir || entry.extension != "zip" {
            self.message = Some(StatusMessage::error(format!(
                "{} is not a zip archive",
                entry.name
            )));
            return;
        }
        self.tasks.push(Task::Unzip {
            path: entry.path.clone(),
        });
    }

    // Task plumbing

    fn request_listing(&mut self, dir: PathBuf) {
        self.requested_generation += 1;
        self.requested_source = ListingSource::Directory(dir.clone());
        self.tasks.push(Task::List {
            generation: self.requested_generation,
            dir,
            show_hidden: self.show_hidden,
        });
    }

    fn request_find(&mut self, query: String, root: PathBuf) {
        self.requested_generation += 1;
        self.requested_source = ListingSource::Search {
            query: query.clone(),
            root: root.clone(),
        };
        self.tasks.push(Task::Find {
            generation: self.requested_generation,
            query,
            root,
            show_hidden: self.show_hidden,
        });
    }

    fn after_cursor_change(&mut self) {
        self.request_visible_sizes();
        self.request_preview();
    }

    /// Queue a size walk for each visible entry whose size is unknown and not yet requested.
    fn request_visible_sizes(&mut self) {
        let generation = self.listing_generation;
        let entries = self.browser.listing().entries();
        for index in self.browser.visible_range() {
            let Some(entry) = entries.get(index) else {
                continue;
            };
            if entry.size.is_some() || !self.requested_sizes.insert(index) {
                continue;
            }
            self.tasks.push(Task::SizeOf {
                generation,
                index,
                path: entry.path.clone(),
            });
        }
    }

    fn request_preview(&mut self) {
        if !self.options.preview_enabled {
            return;
        }
        let Some(entry) = self.browser.selected() else {
            self.preview = Preview::default();
            return;
        };
        if self.preview.path.as_ref() == Some(&entry.path) {
            return;
        }
        self.tasks.push(Task::ReadContent {
            path: entry.path.clone(),
            is_dir: entry.is_dir,
            width: self.preview_width,
            max_bytes: self.options.max_preview_bytes,
            show_hidden: self.show_hidden,
        });
        self.preview = Preview {
            path: Some(entry.path.clone()),
            content: PreviewContent::Loading,
            scroll: 0,
        };
    }

    /// Apply the result of a finished task.
    pub fn apply(&mut self, message: TaskMessage) {
        match message {
            TaskMessage::ListingLoaded {
                generation,
                source,
                entries,
            } => {
                if generation != self.requested_generation {
                    tracing::trace!(
                        generation,
                        latest = self.requested_generation,
                        "dropping stale listing"
                    );
                    return;
                }
                if let ListingSource::Directory(dir) = &source {
                    self.cwd = dir.clone();
                }
                self.listing_generation = generation;
                self.requested_sizes.clear();
                self.browser.set_listing(source, entries);
                self.drop_vanished_target();
                self.after_cursor_change();
            }
            TaskMessage::ListingFailed { generation, error } => {
                if generation != self.requested_generation {
                    tracing::trace!(generation, "dropping stale listing failure");
                    return;
                }
                tracing::warn!("{}", error);
                // Later refreshes go back to what is on screen.
                self.requested_source = self.browser.listing().source().clone();
                self.fail(error);
            }
            TaskMessage::SizeComputed {
                generation,
                index,
                path,
                result,
            } => {
                if generation != self.listing_generation {
                    tracing::trace!(generation, index, "dropping stale size");
                    return;
                }
                match result {
                    Ok(size) => {
                        if !self.browser.apply_size(index, &path, size) {
                            tracing::trace!(index, path = %path.display(), "size target moved");
                        }
                    }
                    Err(e) => tracing::debug!(path = %path.display(), "size walk failed: {}", e),
                }
            }
            TaskMessage::OperationFinished { result } => {
                match result {
                    Ok(text) => {
                        tracing::info!("{}", text);
                        self.message = Some(StatusMessage::info(text));
                    }
                    Err(error) => {
                        tracing::warn!("{}", error);
                        self.fail(error);
                    }
                }
                self.refresh();
            }
            TaskMessage::ContentLoaded { path, result } => {
                let current = self.browser.selected().map(|e| e.path.as_path());
                if self.preview.path.as_deref() != Some(path.as_path()) || current != Some(&path) {
                    tracing::trace!(path = %path.display(), "dropping stale preview");
                    return;
                }
                self.preview.content = match result {
                    Ok(text) => PreviewContent::Ready(text),
                    Err(e) => PreviewContent::Failed(e),
                };
            }
        }
    }

    fn fail(&mut self, error: String) {
        self.mode = Mode::Idle;
        self.pending.clear();
        self.message = Some(StatusMessage::error(error));
    }

    /// Leave a mode whose target disappeared from the refreshed listing it belongs to.
    ///
    /// Directory listings vouch for their direct children; search listings for
    /// everything under their root. A Moving target is only checked in its origin.
    fn drop_vanished_target(&mut self) {
        let vanished = {
            let listing = self.browser.listing();
            let Some(target) = self.mode.target() else {
                return;
            };
            let relevant = match (listing.source(), &self.mode) {
                (ListingSource::Directory(dir), Mode::Moving { origin, .. }) => {
                    origin == dir && target.path.parent() == Some(dir.as_path())
                }
                (ListingSource::Directory(dir), _) => target.path.parent() == Some(dir.as_path()),
                (ListingSource::Search { .. }, Mode::Moving { .. }) => false,
                (ListingSource::Search { root, .. }, _) => target.path.starts_with(root),
            };
            if relevant && !listing.contains_path(&target.path) {
                Some(target.name.clone())
            } else {
                None
            }
        };
        if let Some(name) = vanished {
            tracing::info!("{} vanished, leaving {:?}", name, self.mode);
            self.mode = Mode::Idle;
            self.pending.clear();
            self.message = Some(StatusMessage::info(format!("{} no longer exists", name)));
        }
    }

    /// Watcher notification: reload the working directory if it was touched.
    ///
    /// Ignored while a search is shown or requested, and while a listing of
    /// another directory is in flight; that listing reads fresh state anyway.
    pub fn handle_fs_change(&mut self, paths: &[PathBuf]) {
        if self.browser.listing().source().is_search() {
            return;
        }
        match &self.requested_source {
            ListingSource::Directory(dir) if *dir == self.cwd => {}
            _ => return,
        }
        if !watcher::affects_dir(paths, &self.cwd) {
            return;
        }
        if let Some(previewed) = &self.preview.path {
            if paths.contains(previewed) {
                self.preview.path = None;
            }
        }
        self.request_listing(self.cwd.clone());
    }

    /// Resolve user input against the working directory. `~` is the home directory.
    fn resolve(&self, input: &str) -> PathBuf {
        let raw = match (input, &self.options.home) {
            ("~", Some(home)) => home.clone(),
            (_, Some(home)) if input.starts_with("~/") => home.join(&input[2..]),
            _ => PathBuf::from(input),
        };
        if raw.is_absolute() {
            normalize(&raw)
        } else {
            normalize(&self.cwd.join(raw))
        }
    }
}

/// A single path component: no separators, not `.` or `..`.
fn is_plain_name(name: &str) -> bool {
    name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains(std::path::MAIN_SEPARATOR)
}

/// Collapse `.` and `..` without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::entry::fake_entry;
    use crate::testing::{FakeDirectoryService, FakeRenderer};

    fn service() -> FakeDirectoryService {
        FakeDirectoryService::new()
            .with_dir(
                "/w",
                &[("a.txt", false), ("b.txt", false), ("sub", true), (".env", false)],
            )
            .with_dir("/w/sub", &[("inner.txt", false)])
            .with_dir("/home/me", &[("notes.md", false)])
    }

    fn options() -> AppOptions {
        AppOptions {
            show_hidden: false,
            preview_enabled: false,
            max_preview_bytes: 1024,
            home: Some(PathBuf::from("/home/me")),
        }
    }

    /// Run queued tasks against `svc` until the app stops queueing.
    fn drive(app: &mut App, svc: &FakeDirectoryService) {
        loop {
            let tasks = app.take_tasks();
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                let msg = task.run(svc, &FakeRenderer);
                app.apply(msg);
            }
        }
    }

    fn setup() -> (FakeDirectoryService, App) {
        let svc = service();
        let mut app = App::new(Path::new("/w"), options());
        app.resize(10, 40);
        drive(&mut app, &svc);
        (svc, app)
    }

    fn names(app: &App) -> Vec<String> {
        app.browser
            .listing()
            .entries()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    fn select(app: &mut App, name: &str) {
        app.goto_top();
        for _ in 0..app.browser.len() {
            if app.browser.selected().map(|e| e.name.as_str()) == Some(name) {
                return;
            }
            app.move_down();
        }
        panic!("{} not in listing", name);
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.input_char(c);
        }
    }

    #[test]
    fn initial_listing_loads_start_dir() {
        let (_svc, app) = setup();
        assert_eq!(app.cwd(), Path::new("/w"));
        assert_eq!(names(&app), vec!["a.txt", "b.txt", "sub"]);
        assert_eq!(app.browser.cursor(), 0);
    }

    #[test]
    fn stale_listing_never_overwrites_newer() {
        let svc = service();
        let mut app = App::new(Path::new("/w"), options());
        let first = app.take_tasks();
        app.execute(Command::ChangeDir("/w/sub".into()));
        let second = app.take_tasks();

        // Newer result lands first, then the older one.
        for task in second.into_iter().chain(first) {
            let msg = task.run(&svc, &FakeRenderer);
            app.apply(msg);
        }
        assert_eq!(app.cwd(), Path::new("/w/sub"));
        assert_eq!(names(&app), vec!["inner.txt"]);
    }

    #[test]
    fn stale_listing_failure_is_ignored() {
        let (_svc, mut app) = setup();
        app.apply(TaskMessage::ListingFailed {
            generation: 0,
            error: "boom".into(),
        });
        assert!(app.message.is_none());
    }

    #[test]
    fn delete_only_on_yes() {
        for (answer, deletes) in [
            ("y", true),
            ("YES", true),
            ("  yes ", true),
            ("Y", true),
            ("n", false),
            ("", false),
            ("yep", false),
            ("no", false),
        ] {
            let (svc, mut app) = setup();
            select(&mut app, "b.txt");
            app.begin_delete();
            type_text(&mut app, answer);
            app.submit();
            assert_eq!(app.mode, Mode::Idle);
            drive(&mut app, &svc);
            let deleted = svc.calls().contains(&"delete /w/b.txt".to_string());
            assert_eq!(deleted, deletes, "answer {:?}", answer);
            assert_eq!(names(&app).contains(&"b.txt".to_string()), !deletes);
        }
    }

    #[test]
    fn escape_clears_every_mode() {
        let (_svc, mut app) = setup();
        let enter: [fn(&mut App); 7] = [
            App::begin_rename,
            App::begin_move,
            App::begin_delete,
            App::begin_create_file,
            App::begin_create_directory,
            App::begin_find,
            App::begin_command,
        ];
        for begin in enter {
            begin(&mut app);
            assert_ne!(app.mode, Mode::Idle);
            type_text(&mut app, "xyz");
            app.cancel();
            assert_eq!(app.mode, Mode::Idle);
            assert_eq!(app.pending, PendingText::default());
            assert!(app.take_tasks().is_empty());
        }
    }

    #[test]
    fn navigation_suppressed_while_typing() {
        let (_svc, mut app) = setup();
        app.begin_create_file();
        app.move_down();
        app.goto_bottom();
        app.open_selected();
        app.go_parent();
        app.go_home();
        assert_eq!(app.browser.cursor(), 0);
        assert!(app.take_tasks().is_empty());
    }

    #[test]
    fn navigation_live_while_moving() {
        let (svc, mut app) = setup();
        select(&mut app, "a.txt");
        app.begin_move();
        select(&mut app, "sub");
        app.open_selected();
        drive(&mut app, &svc);
        assert_eq!(app.cwd(), Path::new("/w/sub"));
        assert!(matches!(app.mode, Mode::Moving { .. }));

        app.submit();
        drive(&mut app, &svc);
        assert_eq!(app.mode, Mode::Idle);
        assert!(svc.calls().contains(&"move /w/a.txt -> /w/sub".to_string()));
        assert_eq!(names(&app), vec!["inner.txt", "a.txt"]);
    }

    #[test]
    fn moving_into_origin_is_noop() {
        let (svc, mut app) = setup();
        select(&mut app, "a.txt");
        app.begin_move();
        app.submit();
        assert!(app.take_tasks().is_empty());
        assert_eq!(app.mode, Mode::Idle);
        assert!(app.message.as_ref().unwrap().text.contains("already in"));
        assert!(svc.calls().is_empty());
    }

    #[test]
    fn rename_prefills_and_dispatches() {
        let (svc, mut app) = setup();
        select(&mut app, "a.txt");
        app.begin_rename();
        assert_eq!(app.pending.text, "a.txt");
        assert_eq!(app.pending.cursor_position, 5);
        for _ in 0..3 {
            app.input_backspace();
        }
        type_text(&mut app, "md");
        app.submit();
        drive(&mut app, &svc);
        assert_eq!(svc.calls(), vec!["rename /w/a.txt -> /w/a.md".to_string()]);
        assert!(names(&app).contains(&"a.md".to_string()));
    }

    #[test]
    fn rename_empty_or_unchanged_is_noop() {
        let (svc, mut app) = setup();
        app.begin_rename();
        app.submit();
        assert!(app.take_tasks().is_empty());

        app.begin_rename();
        app.pending.clear();
        type_text(&mut app, "   ");
        app.submit();
        assert!(app.take_tasks().is_empty());
        assert_eq!(app.mode, Mode::Idle);
        assert!(svc.calls().is_empty());
    }

    #[test]
    fn entry_modes_need_a_selection() {
        let svc = FakeDirectoryService::new().with_dir("/empty", &[]);
        let mut app = App::new(Path::new("/empty"), options());
        drive(&mut app, &svc);
        assert!(app.browser.is_empty());

        app.begin_rename();
        app.begin_move();
        app.begin_delete();
        assert_eq!(app.mode, Mode::Idle);

        for line in ["rm", "mv x", "cp", "zip", "unzip"] {
            app.begin_command();
            type_text(&mut app, line);
            app.submit();
        }
        assert!(app.take_tasks().is_empty());

        app.begin_create_file();
        type_text(&mut app, "first.txt");
        app.submit();
        drive(&mut app, &svc);
        assert_eq!(names(&app), vec!["first.txt"]);
    }

    #[test]
    fn create_with_empty_name_is_noop() {
        let (_svc, mut app) = setup();
        app.begin_create_directory();
        type_text(&mut app, "  ");
        app.submit();
        assert!(app.take_tasks().is_empty());
    }

    #[test]
    fn vanished_target_drops_mode() {
        let (svc, mut app) = setup();
        select(&mut app, "b.txt");
        app.begin_delete();
        type_text(&mut app, "y");

        svc.remove(Path::new("/w/b.txt"));
        app.handle_fs_change(&[PathBuf::from("/w/b.txt")]);
        drive(&mut app, &svc);

        assert_eq!(app.mode, Mode::Idle);
        assert!(app.pending.text.is_empty());
        let msg = app.message.clone().unwrap();
        assert_eq!(msg, StatusMessage::info("b.txt no longer exists"));
        assert!(!svc.calls().iter().any(|c| c.starts_with("delete")));
    }

    #[test]
    fn moving_target_checked_only_in_origin() {
        let (svc, mut app) = setup();
        select(&mut app, "a.txt");
        app.begin_move();
        select(&mut app, "sub");
        app.open_selected();
        drive(&mut app, &svc);
        assert!(matches!(app.mode, Mode::Moving { .. }));

        svc.remove(Path::new("/w/a.txt"));
        app.refresh();
        drive(&mut app, &svc);
        assert!(matches!(app.mode, Mode::Moving { .. }));

        app.go_parent();
        drive(&mut app, &svc);
        assert_eq!(app.mode, Mode::Idle);
    }

    #[test]
    fn stale_size_results_dropped() {
        let (svc, mut app) = setup();
        let sub_index = 2;
        assert_eq!(app.browser.selected().map(|e| e.name.clone()), Some("a.txt".into()));
        assert_eq!(app.browser.listing().entries()[sub_index].size, Some(4096));

        // Entry paths no longer line up: ignored.
        app.apply(TaskMessage::SizeComputed {
            generation: app.listing_generation,
            index: sub_index,
            path: PathBuf::from("/w/other"),
            result: Ok(1),
        });
        assert_eq!(app.browser.listing().entries()[sub_index].size, Some(4096));

        // Older generation: ignored.
        let old = app.listing_generation;
        app.refresh();
        drive(&mut app, &svc);
        app.apply(TaskMessage::SizeComputed {
            generation: old,
            index: sub_index,
            path: PathBuf::from("/w/sub"),
            result: Ok(1),
        });
        assert_eq!(app.browser.listing().entries()[sub_index].size, Some(4096));
    }

    #[test]
    fn sizes_requested_for_rows_scrolled_into_view() {
        let children: Vec<(String, bool)> = (0..6).map(|i| (format!("d{}", i), true)).collect();
        let refs: Vec<(&str, bool)> = children.iter().map(|(n, d)| (n.as_str(), *d)).collect();
        let svc = FakeDirectoryService::new().with_dir("/many", &refs);
        let mut app = App::new(Path::new("/many"), options());
        app.resize(2, 40);
        let list = app.take_tasks();
        for task in list {
            let msg = task.run(&svc, &FakeRenderer);
            app.apply(msg);
        }
        let sizes: Vec<usize> = app
            .take_tasks()
            .into_iter()
            .filter_map(|t| match t {
                Task::SizeOf { index, .. } => Some(index),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, vec![0, 1]);

        app.move_down();
        assert!(app.take_tasks().is_empty());
        app.move_down();
        let next: Vec<Task> = app.take_tasks();
        assert_eq!(next.len(), 1);
        assert!(matches!(next[0], Task::SizeOf { index: 2, .. }));
    }

    #[test]
    fn stale_preview_dropped() {
        let svc = service();
        let mut opts = options();
        opts.preview_enabled = true;
        let mut app = App::new(Path::new("/w"), opts);
        app.resize(10, 40);
        drive(&mut app, &svc);
        assert_eq!(app.preview.path.as_deref(), Some(Path::new("/w/a.txt")));

        app.move_down();
        app.take_tasks();
        app.apply(TaskMessage::ContentLoaded {
            path: PathBuf::from("/w/a.txt"),
            result: Ok(Text::raw("old")),
        });
        assert!(matches!(app.preview.content, PreviewContent::Loading));

        app.apply(TaskMessage::ContentLoaded {
            path: PathBuf::from("/w/b.txt"),
            result: Ok(Text::raw("fresh")),
        });
        match &app.preview.content {
            PreviewContent::Ready(text) => assert_eq!(text.lines.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn command_bar_verbs() {
        let (svc, mut app) = setup();
        for line in ["mkdir made", "touch t.txt", "frobnicate x", ""] {
            app.begin_command();
            type_text(&mut app, line);
            app.submit();
            assert_eq!(app.mode, Mode::Idle);
        }
        drive(&mut app, &svc);
        assert_eq!(
            svc.calls(),
            vec![
                "create_directory /w/made".to_string(),
                "create_file /w/t.txt".to_string()
            ]
        );

        app.begin_command();
        type_text(&mut app, "cd sub/../sub");
        app.submit();
        drive(&mut app, &svc);
        assert_eq!(app.cwd(), Path::new("/w/sub"));

        app.begin_command();
        type_text(&mut app, "cd ~");
        app.submit();
        drive(&mut app, &svc);
        assert_eq!(app.cwd(), Path::new("/home/me"));
    }

    #[test]
    fn command_cp_and_mv() {
        let (svc, mut app) = setup();
        select(&mut app, "a.txt");
        app.execute(command::parse("cp sub extra").unwrap());
        drive(&mut app, &svc);
        assert!(svc.calls().contains(&"copy /w/a.txt -> /w/sub".to_string()));

        select(&mut app, "b.txt");
        app.execute(command::parse("mv c.txt").unwrap());
        drive(&mut app, &svc);
        assert!(svc.calls().contains(&"rename /w/b.txt -> /w/c.txt".to_string()));
    }

    #[test]
    fn copy_in_place_key() {
        let (svc, mut app) = setup();
        app.copy_selected();
        drive(&mut app, &svc);
        assert!(names(&app).contains(&"a.txt_copy".to_string()));
        assert_eq!(
            app.message,
            Some(StatusMessage::info("Copied a.txt to /w/a.txt_copy"))
        );
    }

    #[test]
    fn unzip_requires_zip_archive() {
        let (svc, mut app) = setup();
        app.unzip_selected();
        assert!(app.take_tasks().is_empty());
        assert_eq!(app.message.as_ref().map(|m| m.kind), Some(crate::browser::status::MessageKind::Error));

        app.zip_selected();
        drive(&mut app, &svc);
        select(&mut app, "a.zip");
        app.unzip_selected();
        drive(&mut app, &svc);
        assert!(names(&app).contains(&"a".to_string()));
    }

    #[test]
    fn find_replaces_listing_and_escape_returns() {
        let (svc, mut app) = setup();
        app.begin_find();
        type_text(&mut app, "inner");
        app.submit();
        drive(&mut app, &svc);
        assert!(app.browser.listing().source().is_search());
        assert_eq!(names(&app), vec!["sub/inner.txt"]);
        assert_eq!(app.cwd(), Path::new("/w"));

        app.cancel();
        drive(&mut app, &svc);
        assert!(!app.browser.listing().source().is_search());
        assert_eq!(names(&app), vec!["a.txt", "b.txt", "sub"]);
    }

    #[test]
    fn empty_find_is_noop() {
        let (_svc, mut app) = setup();
        app.begin_find();
        app.submit();
        assert!(app.take_tasks().is_empty());
    }

    #[test]
    fn listing_failure_reports_error_and_idles() {
        let (svc, mut app) = setup();
        select(&mut app, "a.txt");
        app.begin_move();
        app.execute(Command::ChangeDir("/nowhere".into()));
        drive(&mut app, &svc);
        assert_eq!(app.mode, Mode::Idle);
        assert_eq!(app.cwd(), Path::new("/w"));
        let msg = app.message.clone().unwrap();
        assert!(msg.text.starts_with("Cannot open /nowhere"));

        // The failed directory is not retried; refresh reloads what is shown.
        app.refresh();
        let tasks = app.take_tasks();
        assert!(
            matches!(&tasks[..], [Task::List { dir, .. }] if dir.as_path() == Path::new("/w")),
            "{:?}",
            tasks
        );
    }

    #[test]
    fn operation_failure_reports_error() {
        let (svc, mut app) = setup();
        app.begin_create_file();
        type_text(&mut app, "a.txt");
        app.submit();
        drive(&mut app, &svc);
        let msg = app.message.clone().unwrap();
        assert_eq!(msg.kind, crate::browser::status::MessageKind::Error);
        assert!(msg.text.starts_with("Create failed"));
    }

    #[test]
    fn toggle_hidden_relists() {
        let (svc, mut app) = setup();
        app.toggle_hidden();
        drive(&mut app, &svc);
        assert!(app.show_hidden());
        assert!(names(&app).contains(&".env".to_string()));
    }

    #[test]
    fn parent_and_home() {
        let (svc, mut app) = setup();
        app.go_parent();
        drive(&mut app, &svc);
        assert_eq!(app.cwd(), Path::new("/w"));

        app.go_home();
        drive(&mut app, &svc);
        assert_eq!(app.cwd(), Path::new("/home/me"));
    }

    #[test]
    fn resize_keeps_selection() {
        let (_svc, mut app) = setup();
        app.goto_bottom();
        let selected = app.browser.selected().cloned();
        app.resize(1, 20);
        assert_eq!(app.browser.selected().cloned(), selected);
        assert_eq!(app.browser.viewport().offset(), 2);
    }

    #[test]
    fn status_line_reflects_mode() {
        let (_svc, mut app) = setup();
        assert_eq!(app.status_line().right, "1/3");
        app.begin_delete();
        assert_eq!(app.status_line().left, "Delete a.txt? [y/N]: ");
    }

    #[test]
    fn fs_change_outside_cwd_ignored() {
        let (_svc, mut app) = setup();
        app.handle_fs_change(&[PathBuf::from("/elsewhere/x")]);
        assert!(app.take_tasks().is_empty());
        app.handle_fs_change(&[PathBuf::from("/w/new")]);
        assert_eq!(app.take_tasks().len(), 1);
    }

    #[test]
    fn preview_scroll_is_bounded() {
        let (_svc, mut app) = setup();
        app.preview.content = PreviewContent::Ready(Text::raw("a\nb\nc"));
        for _ in 0..5 {
            app.scroll_preview_down();
        }
        assert_eq!(app.preview.scroll, 2);
        for _ in 0..5 {
            app.scroll_preview_up();
        }
        assert_eq!(app.preview.scroll, 0);
    }

    #[test]
    fn operation_result_keeps_pending_navigation() {
        let (svc, mut app) = setup();
        app.begin_create_file();
        type_text(&mut app, "new.txt");
        app.submit();
        let create = app.take_tasks();

        select(&mut app, "sub");
        app.open_selected();
        let navigate = app.take_tasks();

        // The create finishes first and queues its refresh; then the
        // navigation lands, then the refresh.
        for task in create {
            app.apply(task.run(&svc, &FakeRenderer));
        }
        let refresh = app.take_tasks();
        for task in navigate.into_iter().chain(refresh) {
            app.apply(task.run(&svc, &FakeRenderer));
        }
        drive(&mut app, &svc);

        assert_eq!(app.cwd(), Path::new("/w/sub"));
        assert_eq!(names(&app), vec!["inner.txt"]);
        assert!(svc.calls().contains(&"create_file /w/new.txt".to_string()));
    }

    #[test]
    fn fs_change_during_navigation_is_deferred() {
        let (svc, mut app) = setup();
        select(&mut app, "sub");
        app.open_selected();
        let navigate = app.take_tasks();

        app.handle_fs_change(&[PathBuf::from("/w/new")]);
        assert!(app.take_tasks().is_empty());

        for task in navigate {
            app.apply(task.run(&svc, &FakeRenderer));
        }
        assert_eq!(app.cwd(), Path::new("/w/sub"));
    }

    #[test]
    fn vanished_search_target_drops_mode() {
        let (svc, mut app) = setup();
        app.execute(Command::Find("b.txt".into()));
        drive(&mut app, &svc);
        assert_eq!(names(&app), vec!["b.txt"]);

        app.begin_rename();
        assert!(matches!(app.mode, Mode::Renaming { .. }));
        svc.remove(Path::new("/w/b.txt"));
        app.refresh();
        drive(&mut app, &svc);

        assert!(app.browser.listing().source().is_search());
        assert_eq!(app.mode, Mode::Idle);
        assert_eq!(
            app.message,
            Some(StatusMessage::info("b.txt no longer exists"))
        );
        assert!(!svc.calls().iter().any(|c| c.starts_with("rename")));
    }

    #[test]
    fn rename_rejects_path_like_names() {
        let (svc, mut app) = setup();
        select(&mut app, "a.txt");
        for bad in ["../x", "sub/x", "..", "."] {
            app.begin_rename();
            app.pending.clear();
            type_text(&mut app, bad);
            app.submit();
            assert!(app.take_tasks().is_empty(), "{}", bad);
            assert_eq!(
                app.message,
                Some(StatusMessage::error(format!("Invalid name: {}", bad)))
            );
        }

        app.execute(Command::Rename("../x".into()));
        assert!(app.take_tasks().is_empty());
        assert!(svc.calls().is_empty());
    }

    #[test]
    fn caret_keys_only_move_in_text_modes() {
        let (_svc, mut app) = setup();
        app.pending = PendingText::with_text("abc");
        app.input_home();
        app.input_left();
        assert_eq!(app.pending.cursor_position, 3);

        app.begin_create_file();
        type_text(&mut app, "ab");
        app.input_home();
        assert_eq!(app.pending.cursor_position, 0);
        app.input_right();
        assert_eq!(app.pending.cursor_position, 1);
        app.input_end();
        assert_eq!(app.pending.cursor_position, 2);
        app.input_left();
        assert_eq!(app.pending.cursor_position, 1);
    }

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../x")), PathBuf::from("/x"));
    }

    #[test]
    fn fake_entry_target_identity() {
        let entry = fake_entry(Path::new("/w"), "a.txt", false);
        assert_eq!(Target::of(&entry).path, PathBuf::from("/w/a.txt"));
    }
}
