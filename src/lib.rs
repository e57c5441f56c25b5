//! Terminal boundary for the streaming chat client.
//!
//! Invariant: single output gate. Only `core::output::OutputGate::flush(..)` writes to the
//! terminal.
//!
//! # Public API Overview
//! - [`Terminal`] and the raw-mode [`ProcessTerminal`].
//! - Input decoding via [`parse_input_events`] into [`InputEvent`]s.
//! - [`Viewport`] and [`TextInput`] widgets composed into a full-screen [`Frame`].
//! - ANSI-safe width and wrapping helpers.

pub mod core;
pub mod platform;
pub mod render;
pub mod widgets;

/// Keyboard input parsing helpers.
pub use crate::core::input::{matches_key, parse_key};
pub use crate::core::input_event::{parse_input_events, InputEvent};

/// Terminal interfaces, output gate, and process-backed implementation.
pub use crate::core::output::{OutputGate, TerminalCmd, RESTORE_SEQUENCE};
pub use crate::core::terminal::{Terminal, TerminalGuard};
pub use crate::platform::process_terminal::{install_panic_hook, PanicHookGuard, ProcessTerminal};

/// Render-layer frame type.
pub use crate::render::Frame;

/// Built-in widgets.
pub use crate::widgets::{TextInput, Viewport};

/// Strips ANSI control sequences.
pub use crate::core::text::ansi::strip_ansi;
/// ANSI-aware wrapping helper.
pub use crate::core::text::wrap::wrap_text_with_ansi;
/// Visible width helper that ignores ANSI control sequences.
pub use crate::core::text::width::visible_width;
