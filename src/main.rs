mod app;
mod browser;
mod components;
mod config;
mod error;
mod event;
mod fs;
mod handler;
mod render;
mod task;
#[cfg(test)]
mod testing;
mod theme;
mod tui;
mod ui;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;

use crate::app::{App, AppOptions};
use crate::browser::status::StatusMessage;
use crate::config::{AppConfig, GeneralConfig, LogConfig, PreviewConfig, ThemeConfig, WatcherConfig};
use crate::error::AppError;
use crate::event::{Event, EventHandler};
use crate::fs::service::{DirectoryService, LocalDirectoryService};
use crate::fs::watcher::FsWatcher;
use crate::render::{ContentRenderer, SyntectRenderer};
use crate::task::Dispatcher;
use crate::theme::ThemeColors;
use crate::tui::{install_panic_hook, Tui};

/// A keyboard-driven terminal file browser.
#[derive(Parser, Debug)]
#[command(name = "fb", version, about)]
struct Cli {
    /// Directory to open (defaults to the configured default_path, then the current directory)
    path: Option<PathBuf>,

    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show hidden files
    #[arg(long)]
    show_hidden: bool,

    /// Disable the preview pane
    #[arg(long)]
    no_preview: bool,

    /// Disable filesystem watcher (auto-refresh)
    #[arg(long)]
    no_watcher: bool,

    /// Color scheme: dark, light or custom
    #[arg(long)]
    theme: Option<String>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// CLI flags as a partial config; unset flags leave the file values alone.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                show_hidden: self.show_hidden.then_some(true),
                ..Default::default()
            },
            preview: PreviewConfig {
                enabled: self.no_preview.then_some(false),
                ..Default::default()
            },
            watcher: WatcherConfig {
                enabled: self.no_watcher.then_some(false),
                ..Default::default()
            },
            theme: ThemeConfig {
                scheme: self.theme.clone(),
                custom: None,
            },
            log: LogConfig {
                level: self.log_level.clone(),
                file: None,
            },
            ..Default::default()
        }
    }
}

/// Log to a file; the terminal is in raw mode. Logging stays off if the file can't be opened.
fn init_logging(config: &AppConfig) {
    let Some(path) = config.log_file() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let level = config
        .log_level()
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    init_logging(&config);

    let start = cli
        .path
        .clone()
        .or_else(|| config.general.default_path.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let start = start
        .canonicalize()
        .map_err(|_| AppError::InvalidPath(format!("{} does not exist", start.display())))?;
    if !start.is_dir() {
        return Err(AppError::InvalidPath(format!(
            "{} is not a directory",
            start.display()
        )));
    }

    let theme = theme::resolve_theme(&config.theme);
    let service: Arc<dyn DirectoryService> =
        Arc::new(LocalDirectoryService::new(config.max_find_results()));
    let renderer: Arc<dyn ContentRenderer> =
        Arc::new(SyntectRenderer::new(config.syntax_theme_name()));

    install_panic_hook();

    let mut tui = Tui::new(config.mouse_enabled())?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    let dispatcher = Dispatcher::new(service, renderer, events.sender());

    let mut app = App::new(
        &start,
        AppOptions {
            show_hidden: config.show_hidden(),
            preview_enabled: config.preview_enabled(),
            max_preview_bytes: config.max_preview_bytes(),
            home: dirs::home_dir(),
        },
    );

    let watcher = if config.watcher_enabled() {
        match FsWatcher::new(Duration::from_millis(config.debounce_ms()), events.sender()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!("watcher unavailable: {}", e);
                app.message = Some(StatusMessage::error(format!("Watcher unavailable: {}", e)));
                None
            }
        }
    } else {
        None
    };

    tracing::info!(path = %start.display(), theme = config.theme_scheme(), "starting");
    let result = run(&mut tui, &mut events, &mut app, &dispatcher, watcher, &theme).await;
    tui.restore()?;
    result
}

async fn run(
    tui: &mut Tui,
    events: &mut EventHandler,
    app: &mut App,
    dispatcher: &Dispatcher,
    mut watcher: Option<FsWatcher>,
    theme: &ThemeColors,
) -> error::Result<()> {
    let size = tui.size()?;
    let (rows, cols) = ui::content_size(size.width, size.height, app.preview_enabled());
    app.resize(rows, cols);

    loop {
        for task in app.take_tasks() {
            dispatcher.dispatch(task);
        }

        if let Some(watcher) = watcher.as_mut() {
            if let Err(e) = watcher.watch_dir(app.cwd()) {
                tracing::warn!("cannot watch {}: {}", app.cwd().display(), e);
            }
        }

        tui.draw(|frame| ui::render(app, theme, frame))?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(app, mouse),
            Event::Tick => {}
            Event::Resize(width, height) => {
                let (rows, cols) = ui::content_size(width, height, app.preview_enabled());
                app.resize(rows, cols);
            }
            Event::Task(message) => app.apply(message),
            Event::FsChange(paths) => app.handle_fs_change(&paths),
        }

        if app.should_quit {
            tracing::info!("quitting");
            return Ok(());
        }
    }
}
