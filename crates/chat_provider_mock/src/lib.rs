//! Deterministic mock implementation of the shared `chat_provider` contract.
//!
//! This crate contains no transport/protocol logic and is intended for offline
//! runs and contract-level integration testing.

use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use chat_provider::{CancelSignal, ChatMessage, ChatProvider, ProviderProfile, RunEvent, RunRequest};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

const DEFAULT_RUN_DELAY: Duration = Duration::from_millis(200);
const DEFAULT_TOKEN_DELAY: Duration = Duration::from_millis(50);

/// Reply source for a mock run.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Script {
    /// Streams `echo: <prompt>` word by word.
    Echo,
    /// Streams exactly these chunks, empty ones included.
    Chunks(Vec<String>),
}

/// Deterministic mock provider.
#[derive(Debug, Clone)]
pub struct MockProvider {
    script: Script,
    failure: Option<String>,
    run_delay: Duration,
    token_delay: Duration,
}

impl MockProvider {
    /// Creates a mock provider that streams the given chunks verbatim.
    #[must_use]
    pub fn new(chunks: Vec<String>) -> Self {
        Self {
            script: Script::Chunks(chunks),
            failure: None,
            run_delay: DEFAULT_RUN_DELAY,
            token_delay: DEFAULT_TOKEN_DELAY,
        }
    }

    /// Creates a mock provider that echoes the prompt back.
    #[must_use]
    pub fn echo() -> Self {
        Self {
            script: Script::Echo,
            ..Self::new(Vec::new())
        }
    }

    /// Ends every run with `Failed` after the scripted chunks.
    #[must_use]
    pub fn with_failure(mut self, error: impl Into<String>) -> Self {
        self.failure = Some(error.into());
        self
    }

    /// Overrides the delay before the first chunk and between chunks.
    #[must_use]
    pub fn with_delays(mut self, run_delay: Duration, token_delay: Duration) -> Self {
        self.run_delay = run_delay;
        self.token_delay = token_delay;
        self
    }

    fn chunks_for(&self, req: &RunRequest) -> Vec<String> {
        match &self.script {
            Script::Chunks(chunks) => chunks.clone(),
            Script::Echo => {
                let prompt = req
                    .messages
                    .iter()
                    .rev()
                    .find(|message| message.is_user())
                    .map(ChatMessage::text)
                    .unwrap_or_default();
                split_tokens(&format!("echo: {prompt}"))
            }
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::echo()
    }
}

impl ChatProvider for MockProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: "mock".to_string(),
        }
    }

    fn run(
        &self,
        req: RunRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(), String> {
        let run_id = req.run_id;
        let chunks = self.chunks_for(&req);

        emit(RunEvent::Started { run_id });
        thread::sleep(self.run_delay);

        for (idx, text) in chunks.into_iter().enumerate() {
            if cancel.load(Ordering::SeqCst) {
                emit(RunEvent::Cancelled { run_id });
                return Ok(());
            }
            if idx > 0 {
                thread::sleep(self.token_delay);
            }
            emit(RunEvent::Chunk { run_id, text });
        }

        if cancel.load(Ordering::SeqCst) {
            emit(RunEvent::Cancelled { run_id });
        } else if let Some(error) = self.failure.clone() {
            emit(RunEvent::Failed { run_id, error });
        } else {
            emit(RunEvent::Finished { run_id });
        }

        Ok(())
    }
}

/// Splits text into word tokens that keep their trailing separator.
fn split_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut pending = String::new();
    for ch in text.chars() {
        pending.push(ch);
        if matches!(ch, ' ' | '\n') {
            tokens.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        tokens.push(pending);
    }
    tokens
}
