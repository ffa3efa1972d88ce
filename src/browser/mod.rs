//! Navigation core: the listing, the cursor over it and the viewport window.
//!
//! Cursor moves are one row at a time and wrap around at both ends; the
//! viewport follows the cursor so `offset <= cursor <= bottom` always holds.

pub mod command;
pub mod listing;
pub mod mode;
pub mod status;
pub mod viewport;

use std::ops::Range;
use std::path::Path;

use crate::fs::entry::DirectoryEntry;
use listing::{Listing, ListingSource};
use viewport::Viewport;

/// A listing together with the viewport used to display it.
#[derive(Debug, Clone)]
pub struct Browser {
    listing: Listing,
    viewport: Viewport,
}

impl Browser {
    /// Empty browser anchored at `dir`.
    pub fn new(dir: &Path, height: usize) -> Self {
        Self {
            listing: Listing::new(ListingSource::Directory(dir.to_path_buf()), Vec::new()),
            viewport: Viewport::new(height),
        }
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn cursor(&self) -> usize {
        self.listing.cursor()
    }

    pub fn len(&self) -> usize {
        self.listing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listing.is_empty()
    }

    pub fn selected(&self) -> Option<&DirectoryEntry> {
        self.listing.selected()
    }

    /// Replace the listing wholesale. Cursor and viewport go back to the top.
    pub fn set_listing(&mut self, source: ListingSource, entries: Vec<DirectoryEntry>) {
        self.listing = Listing::new(source, entries);
        self.viewport.to_top();
    }

    /// Move down one row; past the last row wraps to the top.
    pub fn move_down(&mut self) {
        let len = self.listing.len();
        if len == 0 {
            return;
        }
        if self.cursor() + 1 >= len {
            self.goto_top();
            return;
        }
        self.listing.set_cursor(self.cursor() + 1);
        self.viewport.reconcile(self.cursor(), len);
    }

    /// Move up one row; before the first row wraps to the bottom.
    pub fn move_up(&mut self) {
        let len = self.listing.len();
        if len == 0 {
            return;
        }
        if self.cursor() == 0 {
            self.goto_bottom();
            return;
        }
        self.listing.set_cursor(self.cursor() - 1);
        self.viewport.reconcile(self.cursor(), len);
    }

    pub fn goto_top(&mut self) {
        self.listing.set_cursor(0);
        self.viewport.to_top();
    }

    pub fn goto_bottom(&mut self) {
        let len = self.listing.len();
        self.listing.set_cursor(len.saturating_sub(1));
        self.viewport.to_bottom(len);
    }

    /// New display height; the selected entry does not change.
    pub fn resize(&mut self, height: usize) {
        self.viewport
            .set_height(height, self.cursor(), self.listing.len());
    }

    /// Indices of the rows currently on screen.
    pub fn visible_range(&self) -> Range<usize> {
        self.viewport.visible_range(self.listing.len())
    }

    pub fn apply_size(&mut self, index: usize, path: &Path, size: u64) -> bool {
        self.listing.apply_size(index, path, size)
    }
}
