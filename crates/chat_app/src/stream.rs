//! Per-reply worker that turns provider events into loop deliveries.

use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chat_provider::{CancelSignal, ChatProvider, RunEvent, RunId, RunRequest};
use tracing::{debug, warn};

use crate::hub::Disengaged;

/// What the loop receives from a streaming reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    Fragment(String),
    Closed,
    Failed(String),
}

impl StreamItem {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Fragment(_))
    }
}

/// Receiver side of a stream. `deliver` blocks until the item is accepted.
pub trait FragmentSink: Send + Sync {
    fn deliver(&self, run_id: RunId, item: StreamItem) -> Result<(), Disengaged>;
}

/// Runs `request` against `provider` on a thread named `chat-stream-{run_id}`.
pub fn spawn_stream(
    provider: Arc<dyn ChatProvider>,
    request: RunRequest,
    cancel: CancelSignal,
    sink: Arc<dyn FragmentSink>,
) -> io::Result<JoinHandle<()>> {
    let run_id = request.run_id;
    thread::Builder::new()
        .name(format!("chat-stream-{run_id}"))
        .spawn(move || run_stream(provider.as_ref(), request, cancel, sink.as_ref()))
}

/// Drives one provider run to completion on the calling thread.
pub fn run_stream(
    provider: &dyn ChatProvider,
    request: RunRequest,
    cancel: CancelSignal,
    sink: &dyn FragmentSink,
) {
    let run_id = request.run_id;
    let mut forwarder = Forwarder {
        run_id,
        sink,
        cancel: Arc::clone(&cancel),
        terminal: false,
        disengaged: false,
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        provider.run(request, Arc::clone(&cancel), &mut |event| {
            forwarder.forward(event)
        })
    }));

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(error)) => forwarder.fail(error),
        Err(_) => forwarder.fail("provider panicked".to_string()),
    }

    if !forwarder.terminal && !forwarder.disengaged {
        forwarder.fail("provider exited without terminal event".to_string());
    }
    debug!(run_id, disengaged = forwarder.disengaged, "stream worker exiting");
}

struct Forwarder<'a> {
    run_id: RunId,
    sink: &'a dyn FragmentSink,
    cancel: CancelSignal,
    terminal: bool,
    disengaged: bool,
}

impl Forwarder<'_> {
    fn forward(&mut self, event: RunEvent) {
        if self.terminal || self.disengaged {
            return;
        }
        if event.run_id() != self.run_id {
            warn!(
                run_id = self.run_id,
                event_run_id = event.run_id(),
                "provider emitted event for another run"
            );
            return;
        }
        if event.is_terminal() {
            self.terminal = true;
        }

        let item = match event {
            RunEvent::Started { .. } => {
                debug!(run_id = self.run_id, "stream started");
                None
            }
            RunEvent::Chunk { text, .. } if text.is_empty() => None,
            RunEvent::Chunk { text, .. } => Some(StreamItem::Fragment(text)),
            RunEvent::Finished { .. } => Some(StreamItem::Closed),
            RunEvent::Failed { error, .. } => Some(StreamItem::Failed(error)),
            RunEvent::Cancelled { .. } => {
                debug!(run_id = self.run_id, "stream cancelled");
                None
            }
        };

        if let Some(item) = item {
            self.send(item);
        }
    }

    fn fail(&mut self, error: String) {
        if self.terminal || self.disengaged {
            return;
        }
        self.terminal = true;
        self.send(StreamItem::Failed(error));
    }

    fn send(&mut self, item: StreamItem) {
        if self.sink.deliver(self.run_id, item).is_err() {
            self.disengaged = true;
            self.cancel.store(true, Ordering::Release);
        }
    }
}
