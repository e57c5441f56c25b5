//! Platform-specific terminal integrations.

pub mod process_terminal;

pub use process_terminal::{install_panic_hook, PanicHookGuard, ProcessTerminal};
