use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::app::{Preview, PreviewContent};
use crate::theme::ThemeColors;

/// Preview widget that renders the selected entry's content.
pub struct PreviewWidget<'a> {
    preview: &'a Preview,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> PreviewWidget<'a> {
    pub fn new(preview: &'a Preview, theme: &'a ThemeColors) -> Self {
        Self {
            preview,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }
}

impl<'a> Widget for PreviewWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let placeholder = |msg: &str, style: Style, buf: &mut Buffer| {
            let line = Line::from(Span::styled(msg.to_string(), style));
            buf.set_line(inner.x, inner.y, &line, inner.width);
        };

        match &self.preview.content {
            PreviewContent::Empty => {
                placeholder("No preview", Style::default().fg(self.theme.dim_fg), buf)
            }
            PreviewContent::Loading => {
                placeholder("Loading…", Style::default().fg(self.theme.dim_fg), buf)
            }
            PreviewContent::Failed(error) => {
                placeholder(error.as_str(), Style::default().fg(self.theme.error_fg), buf)
            }
            PreviewContent::Ready(text) => {
                let base = Style::default().fg(self.theme.preview_fg);
                let start = self.preview.scroll as usize;
                for (i, line) in text
                    .lines
                    .iter()
                    .skip(start)
                    .take(inner.height as usize)
                    .enumerate()
                {
                    let y = inner.y + i as u16;
                    buf.set_style(Rect::new(inner.x, y, inner.width, 1), base);
                    buf.set_line(inner.x, y, line, inner.width);
                }
            }
        }
    }
}
