//! Scroll state for the note pane.

use std::ops::Range;

/// The visible window onto a list of rendered lines.
///
/// ```
/// use snapnote::ui::viewport::Viewport;
///
/// let mut vp = Viewport::new(80, 24, 100);
/// assert_eq!(vp.visible_range(), 0..24);
///
/// vp.scroll_down(10);
/// assert_eq!(vp.visible_range(), 10..34);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    width: u16,
    height: u16,
    offset: usize,
    total_lines: usize,
}

impl Viewport {
    /// Create a viewport of `width` x `height` over `total_lines` rendered lines.
    pub const fn new(width: u16, height: u16, total_lines: usize) -> Self {
        Self {
            width,
            height,
            offset: 0,
            total_lines,
        }
    }

    /// First visible line.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Width in columns.
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Rows available to the note body.
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Number of rendered lines in the note.
    pub const fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// Visible line indices, clamped to the line count.
    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.offset + self.height as usize).min(self.total_lines);
        self.offset.min(end)..end
    }

    /// 0-100. A note that fits on screen counts as fully scrolled.
    pub fn scroll_percent(&self) -> u8 {
        let max_offset = self.max_offset();
        if max_offset == 0 {
            return 100;
        }
        u8::try_from(self.offset * 100 / max_offset).unwrap_or(100)
    }

    /// Whether lines remain below the window.
    pub const fn can_scroll_down(&self) -> bool {
        self.offset < self.max_offset()
    }

    /// Scroll up by `n` lines.
    pub const fn scroll_up(&mut self, n: usize) {
        self.offset = self.offset.saturating_sub(n);
    }

    /// Scroll down by `n` lines.
    pub fn scroll_down(&mut self, n: usize) {
        self.offset = (self.offset + n).min(self.max_offset());
    }

    /// Scroll up one page.
    pub const fn page_up(&mut self) {
        self.scroll_up(self.height as usize);
    }

    /// Scroll down one page.
    pub fn page_down(&mut self) {
        self.scroll_down(self.height as usize);
    }

    /// Scroll up half a page.
    pub const fn half_page_up(&mut self) {
        self.scroll_up(self.height as usize / 2);
    }

    /// Scroll down half a page.
    pub fn half_page_down(&mut self) {
        self.scroll_down(self.height as usize / 2);
    }

    /// Jump to the start of the note.
    pub const fn go_to_top(&mut self) {
        self.offset = 0;
    }

    /// Jump to the end of the note.
    pub const fn go_to_bottom(&mut self) {
        self.offset = self.max_offset();
    }

    /// Adopt new terminal dimensions.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.offset = self.offset.min(self.max_offset());
    }

    /// Update the line count after a relayout, keeping the offset valid.
    pub fn set_total_lines(&mut self, total: usize) {
        self.total_lines = total;
        self.offset = self.offset.min(self.max_offset());
    }

    const fn max_offset(&self) -> usize {
        self.total_lines.saturating_sub(self.height as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_note_is_fully_visible() {
        let vp = Viewport::new(80, 24, 10);
        assert_eq!(vp.visible_range(), 0..10);
        assert_eq!(vp.scroll_percent(), 100);
        assert!(!vp.can_scroll_down());
    }

    #[test]
    fn test_scroll_clamps_both_ends() {
        let mut vp = Viewport::new(80, 10, 100);
        vp.scroll_up(5);
        assert_eq!(vp.offset(), 0);
        vp.scroll_down(500);
        assert_eq!(vp.offset(), 90);
        assert_eq!(vp.visible_range(), 90..100);
        assert_eq!(vp.scroll_percent(), 100);
    }

    #[test]
    fn test_paging() {
        let mut vp = Viewport::new(80, 10, 100);
        vp.page_down();
        assert_eq!(vp.offset(), 10);
        vp.half_page_down();
        assert_eq!(vp.offset(), 15);
        vp.half_page_up();
        vp.page_up();
        assert_eq!(vp.offset(), 0);
    }

    #[test]
    fn test_top_and_bottom() {
        let mut vp = Viewport::new(80, 10, 35);
        vp.go_to_bottom();
        assert_eq!(vp.offset(), 25);
        vp.go_to_top();
        assert_eq!(vp.offset(), 0);
        assert_eq!(vp.scroll_percent(), 0);
    }

    #[test]
    fn test_shrinking_note_pulls_offset_back() {
        let mut vp = Viewport::new(80, 10, 100);
        vp.go_to_bottom();
        vp.set_total_lines(4);
        assert_eq!(vp.offset(), 0);
        assert_eq!(vp.visible_range(), 0..4);
    }

    #[test]
    fn test_resize_keeps_offset_valid() {
        let mut vp = Viewport::new(80, 10, 30);
        vp.go_to_bottom();
        vp.resize(100, 25);
        assert_eq!(vp.offset(), 5);
        assert_eq!(vp.width(), 100);
    }
}
