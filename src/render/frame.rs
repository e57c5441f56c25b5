//! Full-screen frame composition.
//!
//! Every frame repaints all rows from the top-left corner, so there is no
//! diff state to go stale across resizes.

use crate::core::output::TerminalCmd;
use crate::core::text::width::visible_width;

/// A complete screen of rendered rows.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Frame {
    lines: Vec<String>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn extend<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Widest row in cells, ignoring escape sequences.
    pub fn max_width(&self) -> usize {
        self.lines
            .iter()
            .map(|line| visible_width(line))
            .max()
            .unwrap_or(0)
    }

    /// Commands that paint this frame over a terminal of `rows` rows.
    ///
    /// Rows beyond the terminal height are dropped. Each painted row clears
    /// to end of line and resets styling, and rows below the frame are
    /// cleared.
    pub fn into_commands(self, rows: u16) -> Vec<TerminalCmd> {
        let rows = usize::from(rows);
        let mut out = String::new();
        let painted = self.lines.len().min(rows);

        for (idx, line) in self.lines.into_iter().take(rows).enumerate() {
            out.push_str(&format!("\x1b[{};1H", idx + 1));
            out.push_str(&line);
            out.push_str("\x1b[0m\x1b[K");
        }
        if painted < rows {
            out.push_str(&format!("\x1b[{};1H\x1b[J", painted + 1));
        }

        vec![
            TerminalCmd::HideCursor,
            TerminalCmd::Bytes(out),
            TerminalCmd::CursorHome,
        ]
    }
}

impl From<Vec<String>> for Frame {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}
