//! Widgets used by the chat screen.

pub mod text_input;
pub mod viewport;

pub use text_input::TextInput;
pub use viewport::Viewport;
