//! Frame composition.

pub mod frame;

pub use frame::Frame;
