//! One-reply-at-a-time streaming state machine.
//!
//! The supervisor owns the transcript and the model-facing session and is the
//! only code that mutates either. Side effects outside that state (starting a
//! worker, asking for the next fragment, repainting) go through [`HostOps`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chat_provider::{CancelSignal, RunId, RunRequest};
use tracing::{debug, info, warn};

use crate::session::ChatSession;
use crate::stream::StreamItem;
use crate::transcript::{EntryStatus, Role, Transcript};

/// Effects the supervisor asks of its environment.
pub trait HostOps {
    /// Engage the reader for `request.run_id` and start its worker.
    fn start_stream(&mut self, request: RunRequest, cancel: CancelSignal) -> Result<(), String>;
    /// Allow the engaged run to deliver one more item.
    fn request_read(&mut self, run_id: RunId);
    /// Stop reading from `run_id`; pending and later deliveries are dropped.
    fn disengage_stream(&mut self, run_id: RunId);
    fn request_render(&mut self);
    fn request_stop(&mut self);
}

/// The reply currently being streamed.
#[derive(Debug, Clone)]
pub struct StreamHandle {
    pub run_id: RunId,
    /// Transcript index the reply's fragments are appended to.
    pub target_index: usize,
    pub cancel: CancelSignal,
}

#[derive(Debug, Clone)]
pub enum SupervisorState {
    Idle,
    Streaming(StreamHandle),
}

#[derive(Debug)]
pub struct Supervisor {
    state: SupervisorState,
    next_run_id: RunId,
    transcript: Transcript,
    session: ChatSession,
}

impl Supervisor {
    pub fn new(session: ChatSession) -> Self {
        Self {
            state: SupervisorState::Idle,
            next_run_id: 1,
            transcript: Transcript::new(),
            session,
        }
    }

    pub fn state(&self) -> &SupervisorState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, SupervisorState::Idle)
    }

    pub fn active(&self) -> Option<&StreamHandle> {
        match &self.state {
            SupervisorState::Streaming(handle) => Some(handle),
            SupervisorState::Idle => None,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Submits a prompt, superseding any reply still streaming.
    ///
    /// Returns the new run id, or `None` when the prompt was blank or the
    /// worker could not be started.
    pub fn submit(&mut self, prompt: &str, host: &mut dyn HostOps) -> Option<RunId> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return None;
        }

        self.supersede(host);

        self.transcript.append_entry(Role::User, prompt);
        self.session.push_user(prompt);

        let run_id = self.next_run_id;
        self.next_run_id += 1;
        let handle = StreamHandle {
            run_id,
            target_index: self.transcript.len(),
            cancel: Arc::new(AtomicBool::new(false)),
        };
        info!(run_id, chars = prompt.chars().count(), "prompt submitted");

        let request = self.session.request(run_id);
        match host.start_stream(request, Arc::clone(&handle.cancel)) {
            Ok(()) => {
                self.state = SupervisorState::Streaming(handle);
                host.request_read(run_id);
                host.request_render();
                Some(run_id)
            }
            Err(error) => {
                warn!(run_id, %error, "failed to start stream");
                host.disengage_stream(run_id);
                self.transcript.push_error(&error);
                host.request_render();
                None
            }
        }
    }

    /// Applies one delivered item. Items for any run other than the active one
    /// are dropped.
    pub fn on_item(&mut self, run_id: RunId, item: StreamItem, host: &mut dyn HostOps) {
        let handle = match &self.state {
            SupervisorState::Streaming(handle) if handle.run_id == run_id => handle.clone(),
            _ => {
                debug!(run_id, "dropping stale stream item");
                return;
            }
        };

        match item {
            StreamItem::Fragment(text) => {
                if let Err(error) = self.transcript.extend_entry(handle.target_index, &text) {
                    warn!(run_id, %error, "fragment could not be applied");
                }
                host.request_read(run_id);
            }
            StreamItem::Closed => {
                let reply = self
                    .transcript
                    .seal_entry(handle.target_index, EntryStatus::Complete)
                    .map(str::to_string)
                    .unwrap_or_default();
                let chars = reply.chars().count();
                self.session.commit_reply(reply);
                info!(run_id, chars, "stream finished");
                self.finish(run_id, host);
            }
            StreamItem::Failed(error) => {
                self.transcript
                    .seal_entry(handle.target_index, EntryStatus::Failed);
                self.transcript.push_error(&error);
                warn!(run_id, %error, "stream failed");
                self.finish(run_id, host);
            }
        }
        host.request_render();
    }

    /// Cancels the active reply, if any, ahead of shutdown.
    pub fn shutdown(&mut self, host: &mut dyn HostOps) {
        if let SupervisorState::Streaming(handle) =
            std::mem::replace(&mut self.state, SupervisorState::Idle)
        {
            handle.cancel.store(true, Ordering::Release);
            host.disengage_stream(handle.run_id);
            debug!(run_id = handle.run_id, "stream abandoned at shutdown");
        }
    }

    fn supersede(&mut self, host: &mut dyn HostOps) {
        let SupervisorState::Streaming(handle) =
            std::mem::replace(&mut self.state, SupervisorState::Idle)
        else {
            return;
        };

        handle.cancel.store(true, Ordering::Release);
        host.disengage_stream(handle.run_id);

        let partial = self
            .transcript
            .seal_entry(handle.target_index, EntryStatus::Interrupted)
            .map(str::to_string)
            .unwrap_or_default();
        let chars = partial.chars().count();
        self.session.commit_reply(partial);
        info!(run_id = handle.run_id, chars, "stream superseded");
    }

    fn finish(&mut self, run_id: RunId, host: &mut dyn HostOps) {
        self.state = SupervisorState::Idle;
        host.disengage_stream(run_id);
    }
}
