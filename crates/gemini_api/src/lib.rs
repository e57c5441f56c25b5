//! Transport-only client for the Gemini `streamGenerateContent` endpoint.
//!
//! This crate owns request building, SSE parsing, chunk normalization, retry,
//! and cancellation for one streamed generation. It contains no conversation
//! state and no UI coupling.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod payload;
pub mod retry;
pub mod sse;
pub mod url;

pub use client::{CancellationSignal, GeminiApiClient, StreamResult};
pub use config::GeminiApiConfig;
pub use error::GeminiApiError;
pub use events::GeminiStreamEvent;
pub use payload::{GeminiRequest, Role};
pub use sse::SseStreamParser;
pub use url::stream_endpoint;
