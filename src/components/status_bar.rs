use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::browser::status::{StatusKind, StatusLine};
use crate::theme::ThemeColors;

/// Status bar widget: a derived [`StatusLine`] plus the working directory.
pub struct StatusBarWidget<'a> {
    line: &'a StatusLine,
    path_str: &'a str,
    theme: &'a ThemeColors,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(line: &'a StatusLine, path_str: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            line,
            path_str,
            theme,
        }
    }

    /// Terminal position of the text cursor while a prompt is active.
    pub fn caret_position(&self, area: Rect) -> Option<Position> {
        let caret = u16::try_from(self.line.caret?).ok()?;
        if area.width == 0 || area.height == 0 {
            return None;
        }
        Some(Position::new(
            area.x + caret.min(area.width - 1),
            area.y,
        ))
    }

    fn left_style(&self) -> Style {
        let base = Style::default().bg(self.theme.status_bg);
        match self.line.kind {
            StatusKind::Normal => base.fg(self.theme.status_fg),
            StatusKind::Prompt => base.fg(self.theme.prompt_fg),
            StatusKind::Info => base.fg(self.theme.success_fg),
            StatusKind::Error => Style::default()
                .bg(self.theme.error_fg)
                .fg(self.theme.status_bg)
                .add_modifier(Modifier::BOLD),
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let width = area.width as usize;
        buf.set_style(
            Rect::new(area.x, area.y, area.width, 1),
            Style::default().bg(self.theme.status_bg),
        );

        // Prompts get the whole row.
        if self.line.kind == StatusKind::Prompt && self.line.right.is_empty() {
            let line = Line::from(Span::styled(
                truncate(&self.line.left, width),
                self.left_style(),
            ));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        // [left] ... [path] [position]
        let right = format!(" {} ", self.line.right);
        let right_len = right.chars().count();
        let left = truncate(&self.line.left, width.saturating_sub(right_len));
        let left_len = left.chars().count();

        let path_budget = width
            .saturating_sub(left_len)
            .saturating_sub(right_len)
            .saturating_sub(2);
        let path_len = self.path_str.chars().count();
        let path_display = if path_len > path_budget {
            if path_budget > 3 {
                let tail: String = self
                    .path_str
                    .chars()
                    .skip(path_len - (path_budget - 3))
                    .collect();
                format!("...{}", tail)
            } else {
                String::new()
            }
        } else {
            self.path_str.to_string()
        };

        let gap = width
            .saturating_sub(left_len)
            .saturating_sub(path_display.chars().count())
            .saturating_sub(right_len);

        let spans = vec![
            Span::styled(left, self.left_style()),
            Span::raw(" ".repeat(gap)),
            Span::styled(
                path_display,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .bg(self.theme.status_bg),
            ),
            Span::styled(
                right,
                Style::default()
                    .fg(self.theme.accent_fg)
                    .bg(self.theme.status_bg)
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
