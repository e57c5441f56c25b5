//! ANSI-aware word wrapping.
//!
//! Escape sequences are zero-width. SGR styling active at a line break is
//! closed at the end of the line and reopened on the continuation line, so a
//! wrapped styled span never bleeds into surrounding frame content.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::ansi_sequence_len;
use super::width::{grapheme_width, visible_width};

const SGR_RESET: &str = "\x1b[0m";

/// Wraps `text` to at most `width` cells per line.
///
/// Explicit newlines always break. Words move to the next line when they do
/// not fit; words wider than `width` are broken at grapheme boundaries.
pub fn wrap_text_with_ansi(text: &str, width: usize) -> Vec<String> {
    let mut wrapper = Wrapper::new(width.max(1));
    for logical in text.split('\n') {
        wrapper.start_line();
        for (segment, is_space) in segments(logical) {
            if is_space {
                wrapper.push_space(segment);
            } else {
                wrapper.push_word(segment);
            }
        }
        wrapper.finish_line();
    }
    wrapper.lines
}

struct Wrapper {
    width: usize,
    lines: Vec<String>,
    current: String,
    current_width: usize,
    active_sgr: Vec<String>,
}

impl Wrapper {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: String::new(),
            current_width: 0,
            active_sgr: Vec::new(),
        }
    }

    fn start_line(&mut self) {
        self.current = self.active_sgr.concat();
        self.current_width = 0;
    }

    fn finish_line(&mut self) {
        let mut line = std::mem::take(&mut self.current);
        if !self.active_sgr.is_empty() {
            line.push_str(SGR_RESET);
        }
        self.lines.push(line);
        self.current_width = 0;
    }

    fn break_line(&mut self) {
        let trimmed = self.current.trim_end_matches(' ').len();
        self.current.truncate(trimmed);
        self.finish_line();
        self.start_line();
    }

    fn push_space(&mut self, segment: &str) {
        let width = visible_width(segment);
        if self.current_width + width <= self.width {
            self.push_units(segment);
        } else {
            // Spaces at a wrap point are dropped.
            self.break_line();
        }
    }

    fn push_word(&mut self, segment: &str) {
        let width = visible_width(segment);
        if self.current_width + width > self.width && width <= self.width && self.current_width > 0
        {
            self.break_line();
        }
        self.push_units(segment);
    }

    fn push_units(&mut self, segment: &str) {
        for (unit, is_ansi) in units(segment) {
            if is_ansi {
                self.track_sgr(unit);
                self.current.push_str(unit);
                continue;
            }

            let width = grapheme_width(unit);
            if self.current_width > 0 && self.current_width + width > self.width {
                self.break_line();
            }
            self.current.push_str(unit);
            self.current_width += width;
        }
    }

    fn track_sgr(&mut self, code: &str) {
        if !(code.starts_with("\x1b[") && code.ends_with('m')) {
            return;
        }
        if code == SGR_RESET || code == "\x1b[m" {
            self.active_sgr.clear();
        } else {
            self.active_sgr.push(code.to_string());
        }
    }
}

/// Splits a logical line into alternating word and space runs.
fn segments(line: &str) -> Vec<(&str, bool)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    let mut idx = 0;

    while idx < line.len() {
        if let Some(len) = ansi_sequence_len(line, idx) {
            if in_space == Some(true) {
                out.push((&line[start..idx], true));
                start = idx;
            }
            in_space = Some(false);
            idx += len;
            continue;
        }

        let Some(ch) = line[idx..].chars().next() else {
            break;
        };
        let is_space = ch == ' ';
        match in_space {
            Some(current) if current != is_space => {
                out.push((&line[start..idx], current));
                start = idx;
            }
            _ => {}
        }
        in_space = Some(is_space);
        idx += ch.len_utf8();
    }

    if let Some(current) = in_space {
        out.push((&line[start..], current));
    }
    out
}

/// Splits text into escape sequences and graphemes.
fn units(text: &str) -> Vec<(&str, bool)> {
    let mut out = Vec::new();
    let mut plain_start = 0;
    let mut idx = 0;

    while idx < text.len() {
        if let Some(len) = ansi_sequence_len(text, idx) {
            out.extend(text[plain_start..idx].graphemes(true).map(|g| (g, false)));
            out.push((&text[idx..idx + len], true));
            idx += len;
            plain_start = idx;
            continue;
        }
        idx += text[idx..].chars().next().map_or(1, char::len_utf8);
    }

    out.extend(text[plain_start..].graphemes(true).map(|g| (g, false)));
    out
}
