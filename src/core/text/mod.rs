//! Text measurement and wrapping helpers.

pub mod ansi;
pub mod width;
pub mod wrap;
