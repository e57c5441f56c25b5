//! Scrollable viewport over wrapped text content.

use crate::core::text::wrap::wrap_text_with_ansi;

/// Fixed-size window onto content that is wrapped to the viewport width.
///
/// Content is re-wrapped whenever it or the width changes; the scroll offset
/// is always clamped so the window never runs past the last line.
#[derive(Debug, Clone)]
pub struct Viewport {
    width: usize,
    height: usize,
    content: String,
    lines: Vec<String>,
    y_offset: usize,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            content: String::new(),
            lines: Vec::new(),
            y_offset: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set_width(&mut self, width: usize) {
        if self.width == width {
            return;
        }
        self.width = width;
        self.rewrap();
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height;
        self.clamp_offset();
    }

    /// Replaces the content, keeping the current offset where possible.
    pub fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
        self.rewrap();
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn y_offset(&self) -> usize {
        self.y_offset
    }

    pub fn at_top(&self) -> bool {
        self.y_offset == 0
    }

    pub fn at_bottom(&self) -> bool {
        self.y_offset >= self.max_offset()
    }

    pub fn goto_bottom(&mut self) {
        self.y_offset = self.max_offset();
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.y_offset = self.y_offset.saturating_sub(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.y_offset = self.y_offset.saturating_add(n);
        self.clamp_offset();
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up((self.height / 2).max(1));
    }

    pub fn half_page_down(&mut self) {
        self.scroll_down((self.height / 2).max(1));
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.height.max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.height.max(1));
    }

    /// Visible lines, always exactly `height` entries.
    pub fn view(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .lines
            .iter()
            .skip(self.y_offset)
            .take(self.height)
            .cloned()
            .collect();
        out.resize(self.height, String::new());
        out
    }

    fn rewrap(&mut self) {
        self.lines = if self.content.is_empty() {
            Vec::new()
        } else {
            wrap_text_with_ansi(&self.content, self.width)
        };
        self.clamp_offset();
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }

    fn clamp_offset(&mut self) {
        self.y_offset = self.y_offset.min(self.max_offset());
    }
}
