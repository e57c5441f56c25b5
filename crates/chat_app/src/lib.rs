//! Streaming terminal chat client.
//!
//! ## Configuration
//!
//! Everything is read once from the environment at startup:
//!
//! - `GOOGLE_CLI`: API key, required when the `gemini` provider is selected.
//! - `CHAT_PROVIDER`: `gemini` (default) or `mock`.
//! - `CHAT_MODEL`, `CHAT_BASE_URL`, `CHAT_TIMEOUT_SEC`: transport settings.
//! - `CHAT_SYSTEM_INSTRUCTIONS`: system instruction sent with every request.
//! - `CHAT_LOG_PATH`: diagnostic log file, truncated on start (`debug.log`).
//!
//! ## Streaming contract
//!
//! At most one reply streams at a time. Fragments travel from a worker thread
//! to the event loop one at a time through [`hub::EventHub`]; the worker
//! cannot produce the next fragment until the loop has applied the previous
//! one and asked for more. A new prompt cancels the in-flight reply before any
//! state for the new prompt exists.

pub mod app;
pub mod config;
pub mod error;
pub mod hub;
pub mod logging;
pub mod providers;
pub mod runtime;
pub mod session;
pub mod stream;
pub mod supervisor;
pub mod transcript;

use std::sync::{Mutex, MutexGuard};

pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
