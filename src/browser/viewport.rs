use std::ops::Range;

/// A scrollable window of `height` rows over a list of `len` rows.
///
/// `offset` is the index of the first visible row; `bottom()` the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    height: usize,
    offset: usize,
}

impl Viewport {
    /// A viewport at the top of the list. Height is at least one row.
    pub fn new(height: usize) -> Self {
        Self {
            height: height.max(1),
            offset: 0,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Index of the last visible row.
    pub fn bottom(&self) -> usize {
        self.offset + self.height - 1
    }

    fn max_offset(&self, len: usize) -> usize {
        len.saturating_sub(self.height)
    }

    /// Scroll up by `n` rows, stopping at the top.
    pub fn line_up(&mut self, n: usize) {
        self.offset = self.offset.saturating_sub(n);
    }

    /// Scroll down by `n` rows, stopping once the last row is at the bottom.
    pub fn line_down(&mut self, n: usize, len: usize) {
        self.offset = (self.offset + n).min(self.max_offset(len));
    }

    pub fn to_top(&mut self) {
        self.offset = 0;
    }

    pub fn to_bottom(&mut self, len: usize) {
        self.offset = self.max_offset(len);
    }

    /// Scroll the minimum amount needed to bring `cursor` back into view.
    pub fn reconcile(&mut self, cursor: usize, len: usize) {
        if cursor < self.offset {
            self.line_up(self.offset - cursor);
        } else if cursor > self.bottom() {
            let deficit = cursor - self.bottom();
            self.line_down(deficit, len);
        }
    }

    /// Change the height, then re-clamp so `cursor` stays visible.
    pub fn set_height(&mut self, height: usize, cursor: usize, len: usize) {
        self.height = height.max(1);
        self.offset = self.offset.min(self.max_offset(len));
        self.reconcile(cursor, len);
    }

    /// Row indices currently on screen.
    pub fn visible_range(&self, len: usize) -> Range<usize> {
        self.offset.min(len)..(self.offset + self.height).min(len)
    }
}
