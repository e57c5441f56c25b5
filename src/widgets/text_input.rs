//! Single-line prompt input.

use unicode_segmentation::UnicodeSegmentation;

use crate::core::input_event::InputEvent;
use crate::core::text::width::{grapheme_width, visible_width};

const DEFAULT_PROMPT: &str = "┃ ";
const DEFAULT_PLACEHOLDER: &str = "prompt..";

/// Prompt input line with horizontal scrolling.
///
/// The value is always a single line: pasted newlines are dropped, and
/// history navigation (`up`/`down`) is not bound. `enter` is left to the
/// owner, which reads `value()` and calls `reset()`.
#[derive(Debug, Clone)]
pub struct TextInput {
    value: String,
    cursor: usize,
    width: usize,
    height: usize,
    prompt: String,
    placeholder: String,
}

impl TextInput {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            width,
            height,
            prompt: DEFAULT_PROMPT.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Clears the value and moves the cursor home.
    pub fn reset(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set_width(&mut self, width: usize) {
        self.width = width;
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
    }

    /// Applies an input event. Returns whether the event was consumed.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Text { text, .. } => {
                self.insert_text(text);
                true
            }
            InputEvent::Paste { text, .. } => {
                self.insert_text(&text.replace(['\r', '\n'], ""));
                true
            }
            InputEvent::Key { key_id, .. } => self.handle_key(key_id),
            _ => false,
        }
    }

    fn handle_key(&mut self, key_id: &str) -> bool {
        match key_id {
            "space" => self.insert_text(" "),
            "backspace" | "ctrl+h" => self.delete_backward(),
            "delete" => self.delete_forward(),
            "ctrl+w" | "alt+backspace" => self.delete_word_backward(),
            "ctrl+k" => self.value.truncate(self.cursor),
            "left" | "ctrl+b" => self.cursor = self.prev_boundary(),
            "right" | "ctrl+f" => self.cursor = self.next_boundary(),
            "home" | "ctrl+a" => self.cursor = 0,
            "end" | "ctrl+e" => self.cursor = self.value.len(),
            "alt+left" | "ctrl+left" => self.move_word_backward(),
            "alt+right" | "ctrl+right" => self.move_word_forward(),
            _ => return false,
        }
        true
    }

    fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.value.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    fn prev_boundary(&self) -> usize {
        self.value[..self.cursor]
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(idx, _)| idx)
    }

    fn next_boundary(&self) -> usize {
        self.value[self.cursor..]
            .graphemes(true)
            .next()
            .map_or(self.cursor, |g| self.cursor + g.len())
    }

    fn delete_backward(&mut self) {
        let start = self.prev_boundary();
        self.value.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    fn delete_forward(&mut self) {
        let end = self.next_boundary();
        self.value.replace_range(self.cursor..end, "");
    }

    fn word_start_before(&self, from: usize) -> usize {
        let before = &self.value[..from];
        let trimmed = before.trim_end();
        trimmed
            .char_indices()
            .rev()
            .find(|(_, ch)| ch.is_whitespace())
            .map_or(0, |(idx, ch)| idx + ch.len_utf8())
    }

    fn delete_word_backward(&mut self) {
        let start = self.word_start_before(self.cursor);
        self.value.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    fn move_word_backward(&mut self) {
        self.cursor = self.word_start_before(self.cursor);
    }

    fn move_word_forward(&mut self) {
        let after = &self.value[self.cursor..];
        let skip_space = after.len() - after.trim_start().len();
        let word_len = after[skip_space..]
            .find(char::is_whitespace)
            .unwrap_or(after.len() - skip_space);
        self.cursor += skip_space + word_len;
    }

    /// Rendered lines, exactly `height` entries.
    ///
    /// The first line holds the prompt, the visible slice of the value, and a
    /// reverse-video cursor cell; the remaining lines carry only the prompt.
    pub fn view(&self) -> Vec<String> {
        let available = self.width.saturating_sub(visible_width(&self.prompt));
        let mut first = self.prompt.clone();

        if available > 0 {
            if self.value.is_empty() {
                first.push_str(&self.render_placeholder(available));
            } else {
                first.push_str(&self.render_value(available));
            }
        }

        let mut lines = vec![first];
        lines.resize(self.height.max(1), self.prompt.clone());
        lines
    }

    fn render_placeholder(&self, available: usize) -> String {
        let mut graphemes = self.placeholder.graphemes(true);
        let head = graphemes.next().unwrap_or(" ");
        let mut rest = String::new();
        let mut used = grapheme_width(head);
        for g in graphemes {
            let w = grapheme_width(g);
            if used + w > available {
                break;
            }
            used += w;
            rest.push_str(g);
        }
        format!("\x1b[7m{head}\x1b[27m\x1b[2m{rest}\x1b[22m")
    }

    fn render_value(&self, available: usize) -> String {
        let graphemes: Vec<(usize, &str)> = self.value.grapheme_indices(true).collect();
        let cursor_idx = graphemes
            .iter()
            .position(|(idx, _)| *idx >= self.cursor)
            .unwrap_or(graphemes.len());

        // Scroll so the cursor cell stays inside the window.
        let mut start = 0;
        let cells_between = |from: usize, to: usize| -> usize {
            graphemes[from..to]
                .iter()
                .map(|(_, g)| grapheme_width(g))
                .sum()
        };
        let cursor_cell = graphemes
            .get(cursor_idx)
            .map_or(1, |(_, g)| grapheme_width(g).max(1));
        while start < cursor_idx && cells_between(start, cursor_idx) + cursor_cell > available {
            start += 1;
        }

        let mut out = String::new();
        let mut used = 0;
        for (pos, (_, g)) in graphemes.iter().enumerate().skip(start) {
            let w = grapheme_width(g);
            if used + w > available {
                break;
            }
            if pos == cursor_idx {
                out.push_str(&format!("\x1b[7m{g}\x1b[27m"));
            } else {
                out.push_str(g);
            }
            used += w;
        }
        if cursor_idx == graphemes.len() && used < available {
            out.push_str("\x1b[7m \x1b[27m");
        }
        out
    }
}
