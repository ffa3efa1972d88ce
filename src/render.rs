//! Content renderers used by the preview pane.
//!
//! Every renderer turns a file (or its text) into styled ratatui [`Text`].

use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

use image::{GenericImageView, Pixel};
use pdfium_render::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

use crate::error::{AppError, Result};

/// Default max bytes read for a text preview (1 MiB).
pub const DEFAULT_MAX_PREVIEW_BYTES: u64 = 1_048_576;
/// Fallback syntect theme.
pub const DEFAULT_SYNTAX_THEME: &str = "base16-ocean.dark";
/// PDF pages read for a preview.
const MAX_PDF_PAGES: u16 = 5;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "ico", "tiff"];
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];
const BINARY_EXTENSIONS: &[&str] = &[
    "zip", "tar", "gz", "bz2", "xz", "7z", "so", "dylib", "dll", "exe", "bin", "img", "iso", "o",
    "a", "class", "pyc",
];

/// Renders file content for display.
pub trait ContentRenderer: Send + Sync {
    fn highlight_code(&self, content: &str, extension: &str) -> Result<Text<'static>>;
    fn render_markdown(&self, content: &str, width: u16) -> Result<Text<'static>>;
    fn image_to_string(&self, path: &Path, width: u16) -> Result<Text<'static>>;
    fn extract_pdf_text(&self, path: &Path) -> Result<Text<'static>>;
}

/// Renderer backed by syntect, `image` and pdfium.
pub struct SyntectRenderer {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl SyntectRenderer {
    /// Build a renderer using the named syntect theme, falling back to the default theme.
    pub fn new(theme_name: &str) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = match themes.remove(theme_name) {
            Some(t) => t,
            None => {
                tracing::warn!("unknown syntax theme {:?}, using default", theme_name);
                themes.remove(DEFAULT_SYNTAX_THEME).unwrap_or_default()
            }
        };
        Self {
            syntax_set: SyntaxSet::load_defaults_nonewlines(),
            theme,
        }
    }

    fn highlight_lines(&self, content: &str, extension: &str, numbered: bool) -> Vec<Line<'static>> {
        let syntax = self
            .syntax_set
            .find_syntax_by_extension(extension)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());
        let mut highlighter = HighlightLines::new(syntax, &self.theme);

        let total = content.lines().count().max(1);
        let line_num_width = total.to_string().len();

        let mut result = Vec::with_capacity(total);
        for (i, line_str) in content.lines().enumerate() {
            let mut spans: Vec<Span<'static>> = Vec::new();
            if numbered {
                spans.push(Span::styled(
                    format!("{:>width$} │ ", i + 1, width = line_num_width),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            match highlighter.highlight_line(line_str, &self.syntax_set) {
                Ok(ranges) => {
                    for (style, text) in ranges {
                        let fg = style.foreground;
                        spans.push(Span::styled(
                            text.to_string(),
                            Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)),
                        ));
                    }
                }
                Err(_) => spans.push(Span::raw(line_str.to_string())),
            }
            result.push(Line::from(spans));
        }
        result
    }
}

impl ContentRenderer for SyntectRenderer {
    fn highlight_code(&self, content: &str, extension: &str) -> Result<Text<'static>> {
        let lines = self.highlight_lines(content, extension, true);
        if lines.is_empty() {
            return Ok(Text::from(Line::from(Span::styled(
                "(empty file)",
                Style::default().fg(Color::DarkGray),
            ))));
        }
        Ok(Text::from(lines))
    }

    fn render_markdown(&self, content: &str, width: u16) -> Result<Text<'static>> {
        let width = usize::from(width.max(10));
        let heading = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let quote = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC);

        let mut lines: Vec<Line<'static>> = Vec::new();
        let mut fence: Option<(String, String)> = None;

        for raw in content.lines() {
            let trimmed = raw.trim_start();
            if let Some(lang) = trimmed.strip_prefix("```") {
                match fence.take() {
                    Some((lang, code)) => lines.extend(self.highlight_lines(&code, &lang, false)),
                    None => fence = Some((lang.trim().to_string(), String::new())),
                }
                continue;
            }
            if let Some((_, code)) = fence.as_mut() {
                code.push_str(raw);
                code.push('\n');
                continue;
            }

            if trimmed.starts_with('#') {
                let title = trimmed.trim_start_matches('#').trim().to_string();
                lines.push(Line::from(Span::styled(title, heading)));
            } else if let Some(rest) = trimmed.strip_prefix("> ") {
                for wrapped in textwrap::wrap(rest, width.saturating_sub(2).max(1)) {
                    lines.push(Line::from(Span::styled(format!("│ {}", wrapped), quote)));
                }
            } else if let Some(item) = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                let options = textwrap::Options::new(width)
                    .initial_indent("• ")
                    .subsequent_indent("  ");
                for wrapped in textwrap::wrap(item, options) {
                    lines.push(Line::from(wrapped.into_owned()));
                }
            } else if trimmed.is_empty() {
                lines.push(Line::from(""));
            } else {
                for wrapped in textwrap::wrap(raw, width) {
                    lines.push(Line::from(wrapped.into_owned()));
                }
            }
        }
        // Unterminated fence: show what we have.
        if let Some((lang, code)) = fence {
            lines.extend(self.highlight_lines(&code, &lang, false));
        }

        Ok(Text::from(lines))
    }

    fn image_to_string(&self, path: &Path, width: u16) -> Result<Text<'static>> {
        let img = image::open(path).map_err(|e| AppError::Render(e.to_string()))?;
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            return Err(AppError::Render("image has no pixels".into()));
        }

        // Two pixel rows per terminal row, never upscaled.
        let cols = u32::from(width.max(1)).min(w);
        let mut rows = ((h as f64 * cols as f64 / w as f64).round() as u32).max(2);
        if rows % 2 == 1 {
            rows += 1;
        }
        let img = img
            .resize_exact(cols, rows, image::imageops::FilterType::Triangle)
            .to_rgb8();

        let mut lines = Vec::with_capacity((rows / 2) as usize);
        for y in (0..rows).step_by(2) {
            let spans: Vec<Span<'static>> = (0..cols)
                .map(|x| {
                    let upper = img.get_pixel(x, y).to_rgb();
                    let lower = img.get_pixel(x, y + 1).to_rgb();
                    Span::styled(
                        "▀",
                        Style::default()
                            .fg(Color::Rgb(upper[0], upper[1], upper[2]))
                            .bg(Color::Rgb(lower[0], lower[1], lower[2])),
                    )
                })
                .collect();
            lines.push(Line::from(spans));
        }
        Ok(Text::from(lines))
    }

    fn extract_pdf_text(&self, path: &Path) -> Result<Text<'static>> {
        let pdfium = try_create_pdfium().ok_or_else(|| {
            AppError::Render("Pdfium library not available; install libpdfium for PDF previews".into())
        })?;
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| AppError::Render(format!("PDF loading error: {}", e)))?;

        let mut lines: Vec<Line<'static>> = Vec::new();
        let page_count = document.pages().len();
        for page_index in 0..page_count.min(MAX_PDF_PAGES) {
            let Ok(page) = document.pages().get(page_index) else {
                continue;
            };
            let Ok(text_page) = page.text() else {
                continue;
            };
            if page_index > 0 {
                lines.push(Line::from(Span::styled(
                    format!("--- Page {} ---", page_index + 1),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines.extend(text_page.all().lines().map(|l| Line::from(l.to_string())));
        }
        Ok(Text::from(lines))
    }
}

/// Bind pdfium from the system, `$PDFIUM_DYNAMIC_LIB_PATH`, or the working directory.
fn try_create_pdfium() -> Option<Pdfium> {
    if let Ok(bindings) = Pdfium::bind_to_system_library() {
        return Some(Pdfium::new(bindings));
    }
    if let Ok(lib_path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        if let Ok(bindings) =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&lib_path))
        {
            return Some(Pdfium::new(bindings));
        }
    }
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .ok()
        .map(Pdfium::new)
}

/// Check if a file is binary by extension or a null byte in the first 8KB.
pub fn is_binary_file(path: &Path) -> bool {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if BINARY_EXTENSIONS.iter().any(|b| b.eq_ignore_ascii_case(ext)) {
            return true;
        }
    }

    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };
    let mut reader = BufReader::new(file);
    let mut buf = [0u8; 8192];
    let n = match reader.read(&mut buf) {
        Ok(n) => n,
        Err(_) => return false,
    };
    buf[..n].contains(&0)
}

/// Render a file for the preview pane, choosing the renderer by extension.
///
/// Text files are read up to `max_bytes`.
pub fn render_file(
    renderer: &dyn ContentRenderer,
    path: &Path,
    width: u16,
    max_bytes: u64,
) -> Result<Text<'static>> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return renderer.image_to_string(path, width);
    }
    if ext == "pdf" {
        return renderer.extract_pdf_text(path);
    }
    if is_binary_file(path) {
        let size = fs::metadata(path)?.len();
        return Ok(Text::from(Line::from(Span::styled(
            format!("Binary file ({})", crate::fs::entry::format_size(size)),
            Style::default().fg(Color::DarkGray),
        ))));
    }

    let mut bytes = Vec::new();
    fs::File::open(path)?
        .take(max_bytes)
        .read_to_end(&mut bytes)?;
    let content = String::from_utf8_lossy(&bytes);

    if MARKDOWN_EXTENSIONS.contains(&ext.as_str()) {
        renderer.render_markdown(&content, width)
    } else {
        renderer.highlight_code(&content, &ext)
    }
}
