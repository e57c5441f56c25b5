//! Wake-up point for the event loop.
//!
//! Terminal threads push input and resize notices, stream workers hand over
//! fragments, and the loop blocks in [`EventHub::wait_next`] until one of them
//! is ready. Stream delivery is a rendezvous: a worker's `deliver` returns only
//! after the loop asked for a read, and at most one item is ever buffered.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use chat_provider::RunId;

use crate::lock_unpoisoned;
use crate::stream::{FragmentSink, StreamItem};

/// One unit of work for the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    Resize,
    Input(String),
    Stream { run_id: RunId, item: StreamItem },
}

/// The loop no longer reads from this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disengaged;

impl fmt::Display for Disengaged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("stream reader disengaged")
    }
}

impl std::error::Error for Disengaged {}

#[derive(Debug, Default)]
struct HubState {
    input: VecDeque<String>,
    resize_pending: bool,
    engaged: Option<RunId>,
    read_requested: bool,
    slot: Option<(RunId, StreamItem)>,
    stopping: bool,
}

impl HubState {
    fn engaged_with(&self, run_id: RunId) -> bool {
        self.engaged == Some(run_id)
    }

    fn take_ready(&mut self) -> Option<LoopEvent> {
        if self.resize_pending {
            self.resize_pending = false;
            return Some(LoopEvent::Resize);
        }
        if let Some(data) = self.input.pop_front() {
            return Some(LoopEvent::Input(data));
        }
        match self.slot.take() {
            Some((run_id, item)) if self.engaged_with(run_id) => {
                Some(LoopEvent::Stream { run_id, item })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct EventHub {
    state: Mutex<HubState>,
    changed: Condvar,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_input(&self, data: String) {
        lock_unpoisoned(&self.state).input.push_back(data);
        self.changed.notify_all();
    }

    /// Coalesces with any resize not yet picked up by the loop.
    pub fn signal_resize(&self) {
        lock_unpoisoned(&self.state).resize_pending = true;
        self.changed.notify_all();
    }

    /// Makes `run_id` the only run whose deliveries are accepted.
    pub fn engage(&self, run_id: RunId) {
        let mut state = lock_unpoisoned(&self.state);
        state.engaged = Some(run_id);
        state.read_requested = false;
        state.slot = None;
        drop(state);
        self.changed.notify_all();
    }

    /// Stops reading from `run_id` if it is the engaged run. Any buffered item
    /// is dropped and a worker blocked in `deliver` is released.
    pub fn disengage(&self, run_id: RunId) {
        let mut state = lock_unpoisoned(&self.state);
        if !state.engaged_with(run_id) {
            return;
        }
        state.engaged = None;
        state.read_requested = false;
        state.slot = None;
        drop(state);
        self.changed.notify_all();
    }

    /// Allows the engaged run to hand over exactly one more item.
    pub fn request_read(&self, run_id: RunId) {
        let mut state = lock_unpoisoned(&self.state);
        if !state.engaged_with(run_id) {
            return;
        }
        state.read_requested = true;
        drop(state);
        self.changed.notify_all();
    }

    pub fn engaged(&self) -> Option<RunId> {
        lock_unpoisoned(&self.state).engaged
    }

    /// Hands one item to the loop, blocking until a read is requested.
    pub fn deliver(&self, run_id: RunId, item: StreamItem) -> Result<(), Disengaged> {
        let mut state = lock_unpoisoned(&self.state);
        loop {
            if state.stopping || !state.engaged_with(run_id) {
                return Err(Disengaged);
            }
            if state.read_requested && state.slot.is_none() {
                state.read_requested = false;
                state.slot = Some((run_id, item));
                drop(state);
                self.changed.notify_all();
                return Ok(());
            }
            state = match self.changed.wait(state) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Ends the loop: `wait_next` returns `None` and every pending or future
    /// delivery fails.
    pub fn request_stop(&self) {
        lock_unpoisoned(&self.state).stopping = true;
        self.changed.notify_all();
    }

    pub fn is_stopping(&self) -> bool {
        lock_unpoisoned(&self.state).stopping
    }

    /// Blocks until an event is ready. Ready sources are taken in the order
    /// resize, input, stream.
    pub fn wait_next(&self) -> Option<LoopEvent> {
        self.wait_until(None)
    }

    pub fn wait_next_timeout(&self, timeout: Duration) -> Option<LoopEvent> {
        self.wait_until(Some(Instant::now() + timeout))
    }

    /// Returns a ready event without blocking.
    pub fn try_next(&self) -> Option<LoopEvent> {
        let mut state = lock_unpoisoned(&self.state);
        if state.stopping {
            return None;
        }
        state.take_ready()
    }

    fn wait_until(&self, deadline: Option<Instant>) -> Option<LoopEvent> {
        let mut state = lock_unpoisoned(&self.state);
        loop {
            if state.stopping {
                return None;
            }
            if let Some(event) = state.take_ready() {
                return Some(event);
            }
            state = match deadline {
                None => match self.changed.wait(state) {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                },
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return None;
                    }
                    match self.changed.wait_timeout(state, remaining) {
                        Ok((guard, _)) => guard,
                        Err(poisoned) => poisoned.into_inner().0,
                    }
                }
            };
        }
    }
}

impl FragmentSink for EventHub {
    fn deliver(&self, run_id: RunId, item: StreamItem) -> Result<(), Disengaged> {
        EventHub::deliver(self, run_id, item)
    }
}
