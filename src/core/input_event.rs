//! Structured input events decoded from raw terminal reads.

use crate::core::input::{parse_key, parse_text};

/// Input event delivered to the application.
///
/// `raw` is the exact sequence received from the terminal. Text and paste
/// events carry decoded text so handlers don't have to parse escapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key { raw: String, key_id: String },
    Text { raw: String, text: String },
    Paste { raw: String, text: String },
    Resize { columns: u16, rows: u16 },
    UnknownRaw { raw: String },
}

const PASTE_START: &str = "\x1b[200~";
const PASTE_END: &str = "\x1b[201~";

/// Decodes one raw read into events.
///
/// A single read may carry several keys (typing ahead over a slow link), so
/// the data is split into escape sequences, control bytes, and printable
/// runs before each piece is classified. Bracketed paste is kept whole.
pub fn parse_input_events(data: &str) -> Vec<InputEvent> {
    let mut events = Vec::new();
    let mut remaining = data;

    while !remaining.is_empty() {
        let Some(start) = remaining.find(PASTE_START) else {
            events.extend(split_sequences(remaining).into_iter().map(classify));
            break;
        };

        events.extend(split_sequences(&remaining[..start]).into_iter().map(classify));

        let after_start = &remaining[start + PASTE_START.len()..];
        let Some(end_rel) = after_start.find(PASTE_END) else {
            events.push(InputEvent::UnknownRaw {
                raw: remaining[start..].to_string(),
            });
            break;
        };

        let raw_end = start + PASTE_START.len() + end_rel + PASTE_END.len();
        events.push(InputEvent::Paste {
            raw: remaining[start..raw_end].to_string(),
            text: after_start[..end_rel].to_string(),
        });
        remaining = &remaining[raw_end..];
    }

    events
}

fn classify(raw: &str) -> InputEvent {
    if let Some(text) = parse_text(raw) {
        return InputEvent::Text {
            raw: raw.to_string(),
            text,
        };
    }
    if let Some(key_id) = parse_key(raw) {
        return InputEvent::Key {
            raw: raw.to_string(),
            key_id,
        };
    }
    InputEvent::UnknownRaw {
        raw: raw.to_string(),
    }
}

fn split_sequences(data: &str) -> Vec<&str> {
    let bytes = data.as_bytes();
    let mut out = Vec::new();
    let mut idx = 0;
    let mut text_start: Option<usize> = None;

    while idx < bytes.len() {
        let byte = bytes[idx];
        let is_control = byte < 0x20 || byte == 0x7f;
        if !is_control {
            text_start.get_or_insert(idx);
            idx += 1;
            continue;
        }

        if let Some(start) = text_start.take() {
            out.push(&data[start..idx]);
        }

        let len = if byte == 0x1b {
            escape_len(bytes, idx)
        } else {
            1
        };
        out.push(&data[idx..idx + len]);
        idx += len;
    }

    if let Some(start) = text_start {
        out.push(&data[start..]);
    }
    out
}

fn escape_len(bytes: &[u8], start: usize) -> usize {
    let Some(&next) = bytes.get(start + 1) else {
        return 1;
    };
    match next {
        b'[' => {
            let mut idx = start + 2;
            // Linux console function keys use a doubled bracket.
            if bytes.get(idx) == Some(&b'[') {
                idx += 1;
            }
            while let Some(&b) = bytes.get(idx) {
                // A non-ASCII byte cannot be part of the sequence.
                if !b.is_ascii() {
                    return idx - start;
                }
                idx += 1;
                if (0x40..=0x7e).contains(&b) {
                    return idx - start;
                }
            }
            bytes.len() - start
        }
        b'O' if bytes.get(start + 2).is_some_and(u8::is_ascii) => 3,
        0x1b => 1,
        b if b.is_ascii() => 2,
        _ => 1,
    }
}
