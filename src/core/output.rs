//! Typed terminal output commands and a single output gate.
//!
//! Invariant: all terminal writes flow through `OutputGate::flush(..)`.

use std::io;

use crate::core::terminal::Terminal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCmd {
    /// Raw bytes/control sequences (UTF-8 string) to be written to the terminal.
    Bytes(String),
    BytesStatic(&'static str),

    HideCursor,
    ShowCursor,

    /// Alternate screen buffer.
    EnterAltScreen,
    LeaveAltScreen,

    /// Clear the screen and home the cursor.
    ClearScreen,
    CursorHome,
    /// Move the cursor to a 1-based row and column.
    MoveTo { row: u16, col: u16 },

    BracketedPasteEnable,
    BracketedPasteDisable,
}

impl TerminalCmd {
    pub fn bytes(data: impl Into<String>) -> Self {
        Self::Bytes(data.into())
    }

    /// Escape sequence written for this command.
    pub fn encode(&self) -> std::borrow::Cow<'_, str> {
        use std::borrow::Cow;

        match self {
            TerminalCmd::Bytes(data) => Cow::Borrowed(data.as_str()),
            TerminalCmd::BytesStatic(data) => Cow::Borrowed(data),
            TerminalCmd::HideCursor => Cow::Borrowed("\x1b[?25l"),
            TerminalCmd::ShowCursor => Cow::Borrowed("\x1b[?25h"),
            TerminalCmd::EnterAltScreen => Cow::Borrowed("\x1b[?1049h"),
            TerminalCmd::LeaveAltScreen => Cow::Borrowed("\x1b[?1049l"),
            TerminalCmd::ClearScreen => Cow::Borrowed("\x1b[2J\x1b[H"),
            TerminalCmd::CursorHome => Cow::Borrowed("\x1b[H"),
            TerminalCmd::MoveTo { row, col } => Cow::Owned(format!("\x1b[{row};{col}H")),
            TerminalCmd::BracketedPasteEnable => Cow::Borrowed("\x1b[?2004h"),
            TerminalCmd::BracketedPasteDisable => Cow::Borrowed("\x1b[?2004l"),
        }
    }
}

/// Sequence that returns a terminal to its normal state after the chat UI.
pub const RESTORE_SEQUENCE: &str = "\x1b[?2004l\x1b[?25h\x1b[?1049l";

#[derive(Debug, Default)]
pub struct OutputGate {
    cmds: Vec<TerminalCmd>,
}

impl OutputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: TerminalCmd) {
        self.cmds.push(cmd);
    }

    pub fn extend<I>(&mut self, cmds: I)
    where
        I: IntoIterator<Item = TerminalCmd>,
    {
        self.cmds.extend(cmds);
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    /// Flush buffered commands to the terminal as one write.
    ///
    /// This is the single write gate: `Terminal::write(..)` must not be called
    /// from anywhere else.
    pub fn flush<T: Terminal + ?Sized>(&mut self, term: &mut T) -> io::Result<()> {
        if self.cmds.is_empty() {
            return Ok(());
        }
        let mut out = String::new();
        for cmd in self.cmds.drain(..) {
            out.push_str(&cmd.encode());
        }
        term.write(&out)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{OutputGate, TerminalCmd};
    use crate::core::terminal::Terminal;

    #[derive(Default)]
    struct Capture {
        writes: Vec<String>,
    }

    impl Terminal for Capture {
        fn start(
            &mut self,
            _on_input: Box<dyn FnMut(String) + Send>,
            _on_resize: Box<dyn FnMut() + Send>,
        ) -> io::Result<()> {
            Ok(())
        }

        fn stop(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn drain_input(&mut self, _max_ms: u64, _idle_ms: u64) {}

        fn write(&mut self, data: &str) -> io::Result<()> {
            self.writes.push(data.to_string());
            Ok(())
        }

        fn columns(&self) -> u16 {
            80
        }

        fn rows(&self) -> u16 {
            24
        }
    }

    #[test]
    fn flush_batches_commands_into_one_write() {
        let mut term = Capture::default();
        let mut gate = OutputGate::new();
        gate.extend([
            TerminalCmd::HideCursor,
            TerminalCmd::MoveTo { row: 3, col: 5 },
            TerminalCmd::bytes("hi"),
        ]);
        gate.flush(&mut term).expect("flush");

        assert!(gate.is_empty());
        assert_eq!(term.writes, vec!["\x1b[?25l\x1b[3;5Hhi".to_string()]);
    }

    #[test]
    fn empty_flush_does_not_write() {
        let mut term = Capture::default();
        OutputGate::new().flush(&mut term).expect("flush");
        assert!(term.writes.is_empty());
    }
}
