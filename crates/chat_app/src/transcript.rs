//! Locally rendered conversation history.
//!
//! Entries are only ever appended. Indices stay valid for the life of the
//! transcript, and only an entry still marked [`EntryStatus::Streaming`] accepts
//! more text.

use std::fmt;

const USER_MARKER: &str = "? ";
const REPLY_MARKER: &str = "> ";

const GREEN: &str = "\x1b[32m";
const BLUE: &str = "\x1b[34m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Fixed text: a prompt or a reply that finished normally.
    Complete,
    /// A reply still receiving fragments.
    Streaming,
    /// A reply cut short by a newer prompt.
    Interrupted,
    /// A reply whose stream failed part way.
    Failed,
    /// An inline error marker.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub role: Role,
    pub text: String,
    pub status: EntryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    OutOfBounds { index: usize, len: usize },
    Sealed { index: usize },
}

impl fmt::Display for TranscriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { index, len } => {
                write!(f, "entry {index} is out of bounds (len {len})")
            }
            Self::Sealed { index } => write!(f, "entry {index} no longer accepts text"),
        }
    }
}

impl std::error::Error for TranscriptError {}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<ConversationEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ConversationEntry> {
        self.entries.get(index)
    }

    /// Appends a finished entry and returns its index.
    pub fn append_entry(&mut self, role: Role, text: impl Into<String>) -> usize {
        self.push(role, text.into(), EntryStatus::Complete)
    }

    /// Appends an inline error marker.
    pub fn push_error(&mut self, message: &str) -> usize {
        self.push(
            Role::Assistant,
            format!("error: {message}"),
            EntryStatus::Error,
        )
    }

    /// Appends `fragment` to the reply at `index`.
    ///
    /// `index == len()` starts a new streaming reply seeded with `fragment`.
    pub fn extend_entry(&mut self, index: usize, fragment: &str) -> Result<(), TranscriptError> {
        let len = self.entries.len();
        if index == len {
            self.push(Role::Assistant, fragment.to_string(), EntryStatus::Streaming);
            return Ok(());
        }

        let entry = self
            .entries
            .get_mut(index)
            .ok_or(TranscriptError::OutOfBounds { index, len })?;
        if entry.status != EntryStatus::Streaming {
            return Err(TranscriptError::Sealed { index });
        }
        entry.text.push_str(fragment);
        Ok(())
    }

    /// Fixes the final status of a streaming reply. Returns its text when the
    /// entry existed and was still streaming.
    pub fn seal_entry(&mut self, index: usize, status: EntryStatus) -> Option<&str> {
        let entry = self.entries.get_mut(index)?;
        if entry.status != EntryStatus::Streaming {
            return None;
        }
        entry.status = status;
        Some(&entry.text)
    }

    /// One unstyled line group per entry, in order.
    pub fn plain_entries(&self) -> Vec<String> {
        self.entries.iter().map(render_plain).collect()
    }

    pub fn render_plain(&self) -> String {
        self.plain_entries().join("\n")
    }

    /// Full transcript with ANSI styling, one entry after another.
    pub fn render_styled(&self) -> String {
        self.entries
            .iter()
            .map(render_styled)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&mut self, role: Role, text: String, status: EntryStatus) -> usize {
        self.entries.push(ConversationEntry { role, text, status });
        self.entries.len() - 1
    }
}

fn status_suffix(status: EntryStatus) -> &'static str {
    match status {
        EntryStatus::Interrupted => " [interrupted]",
        EntryStatus::Failed => " [incomplete]",
        _ => "",
    }
}

fn render_plain(entry: &ConversationEntry) -> String {
    let marker = match entry.role {
        Role::User => USER_MARKER,
        Role::Assistant => REPLY_MARKER,
    };
    format!("{marker}{}{}", entry.text, status_suffix(entry.status))
}

fn render_styled(entry: &ConversationEntry) -> String {
    let suffix = status_suffix(entry.status);
    let suffix = if suffix.is_empty() {
        String::new()
    } else {
        format!("{DIM}{suffix}{RESET}")
    };

    match (entry.role, entry.status) {
        (_, EntryStatus::Error) => format!("{RED}{REPLY_MARKER}{}{RESET}", entry.text),
        (Role::User, _) => format!("{GREEN}{USER_MARKER}{RESET}{BLUE}{}{RESET}", entry.text),
        (Role::Assistant, _) => format!("{GREEN}{REPLY_MARKER}{RESET}{}{suffix}", entry.text),
    }
}
