use std::path::Path;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::browser::Browser;
use crate::fs::entry::DirectoryEntry;
use crate::theme::ThemeColors;

/// Directory listing widget. Draws only the rows inside the browser's viewport.
pub struct ListingWidget<'a> {
    browser: &'a Browser,
    theme: &'a ThemeColors,
    marked: Option<&'a Path>,
    block: Option<Block<'a>>,
}

impl<'a> ListingWidget<'a> {
    pub fn new(browser: &'a Browser, theme: &'a ThemeColors) -> Self {
        Self {
            browser,
            theme,
            marked: None,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Highlight the entry being moved.
    pub fn marked(mut self, path: Option<&'a Path>) -> Self {
        self.marked = path;
        self
    }

    fn entry_style(&self, entry: &DirectoryEntry, is_selected: bool) -> Style {
        if is_selected {
            Style::default()
                .bg(self.theme.list_selected_bg)
                .fg(self.theme.list_selected_fg)
                .add_modifier(Modifier::BOLD)
        } else if self.marked == Some(entry.path.as_path()) {
            Style::default()
                .fg(self.theme.accent_fg)
                .add_modifier(Modifier::ITALIC)
        } else if entry.is_hidden() {
            Style::default().fg(self.theme.list_hidden_fg)
        } else if entry.is_dir {
            Style::default()
                .fg(self.theme.list_dir_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.list_file_fg)
        }
    }
}

/// Fit `name` and a right-aligned `size` into `width` columns.
fn format_row(name: &str, size: &str, width: usize) -> String {
    let size_len = size.chars().count();
    if width <= size_len + 1 {
        return name.chars().take(width).collect();
    }
    let name_budget = width - size_len - 1;
    let name_len = name.chars().count();
    let shown: String = if name_len > name_budget {
        let mut s: String = name.chars().take(name_budget.saturating_sub(1)).collect();
        s.push('…');
        s
    } else {
        name.to_string()
    };
    let pad = width - shown.chars().count() - size_len;
    format!("{}{}{}", shown, " ".repeat(pad), size)
}

impl<'a> Widget for ListingWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        if inner_area.width == 0 || inner_area.height == 0 {
            return;
        }
        buf.set_style(
            inner_area,
            Style::default().bg(self.theme.list_bg).fg(self.theme.list_fg),
        );

        let entries = self.browser.listing().entries();
        if entries.is_empty() {
            let line = Line::from(Span::styled(
                "(empty)",
                Style::default().fg(self.theme.dim_fg),
            ));
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
            return;
        }

        let selected = self.browser.cursor();
        let width = inner_area.width as usize;
        for (row, idx) in self.browser.visible_range().enumerate() {
            if row >= inner_area.height as usize {
                break;
            }
            let entry = &entries[idx];
            let name = if entry.is_dir {
                format!("{}/", entry.name)
            } else {
                entry.name.clone()
            };
            let style = self.entry_style(entry, idx == selected);
            let text = format_row(&name, &entry.size_label(), width);
            let line = Line::from(Span::styled(text, style));
            buf.set_line(inner_area.x, inner_area.y + row as u16, &line, inner_area.width);
        }
    }
}
