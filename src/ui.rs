use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;
use crate::browser::listing::ListingSource;
use crate::browser::mode::Mode;
use crate::components::listing::ListingWidget;
use crate::components::preview::PreviewWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::theme::ThemeColors;

/// Screen regions: listing, optional preview, one-row status bar.
pub struct Regions {
    pub listing: Rect,
    pub preview: Option<Rect>,
    pub status: Rect,
}

/// Split `area` into the main regions.
pub fn layout(area: Rect, show_preview: bool) -> Regions {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    if show_preview {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);
        Regions {
            listing: cols[0],
            preview: Some(cols[1]),
            status: rows[1],
        }
    } else {
        Regions {
            listing: rows[0],
            preview: None,
            status: rows[1],
        }
    }
}

/// Listing rows and preview columns available inside the borders for a terminal size.
pub fn content_size(width: u16, height: u16, show_preview: bool) -> (usize, u16) {
    let regions = layout(Rect::new(0, 0, width, height), show_preview);
    let rows = regions.listing.height.saturating_sub(2) as usize;
    let preview_cols = regions
        .preview
        .map(|r| r.width.saturating_sub(2))
        .unwrap_or(0);
    (rows.max(1), preview_cols)
}

/// Render the application UI.
pub fn render(app: &App, theme: &ThemeColors, frame: &mut Frame) {
    let regions = layout(frame.area(), app.preview_enabled());

    let cwd = app.cwd().display().to_string();
    let source = app.browser.listing().source();
    let title = match source {
        ListingSource::Search { query, .. } => {
            format!(" find: {} in {} ", query, source.dir().display())
        }
        _ => format!(" {} ", cwd),
    };
    let listing_block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused_fg));
    let marked = match &app.mode {
        Mode::Moving { target, .. } => Some(target.path.as_path()),
        _ => None,
    };
    frame.render_widget(
        ListingWidget::new(&app.browser, theme)
            .marked(marked)
            .block(listing_block),
        regions.listing,
    );

    if let Some(area) = regions.preview {
        let block = Block::default()
            .title(" Preview ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border_fg));
        frame.render_widget(PreviewWidget::new(&app.preview, theme).block(block), area);
    }

    let status = app.status_line();
    let bar = StatusBarWidget::new(&status, &cwd, theme);
    if let Some(position) = bar.caret_position(regions.status) {
        frame.set_cursor_position(position);
    }
    frame.render_widget(bar, regions.status);
}
