#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chat_app::hub::{EventHub, LoopEvent};
use chat_app::runtime::RuntimeController;
use chat_app::supervisor::Supervisor;
use chat_tui::Terminal;

type InputHandler = Box<dyn FnMut(String) + Send>;
type ResizeHandler = Box<dyn FnMut() + Send>;

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
pub struct TerminalTrace {
    pub writes: Vec<String>,
    pub start_calls: usize,
    pub stop_calls: usize,
    pub drain_calls: Vec<(u64, u64)>,
    pub on_input: Option<InputHandler>,
    pub on_resize: Option<ResizeHandler>,
}

pub struct SharedTerminal {
    state: Arc<Mutex<TerminalTrace>>,
    columns: u16,
    rows: u16,
}

impl SharedTerminal {
    pub fn new(columns: u16, rows: u16) -> (Self, Arc<Mutex<TerminalTrace>>) {
        let state = Arc::new(Mutex::new(TerminalTrace::default()));
        (
            Self {
                state: Arc::clone(&state),
                columns,
                rows,
            },
            state,
        )
    }
}

impl Terminal for SharedTerminal {
    fn start(
        &mut self,
        on_input: Box<dyn FnMut(String) + Send>,
        on_resize: Box<dyn FnMut() + Send>,
    ) -> std::io::Result<()> {
        let mut state = lock_unpoisoned(&self.state);
        state.start_calls += 1;
        state.on_input = Some(on_input);
        state.on_resize = Some(on_resize);
        Ok(())
    }

    fn stop(&mut self) -> std::io::Result<()> {
        let mut state = lock_unpoisoned(&self.state);
        state.stop_calls += 1;
        state.on_input = None;
        state.on_resize = None;
        Ok(())
    }

    fn drain_input(&mut self, max_ms: u64, idle_ms: u64) {
        let mut state = lock_unpoisoned(&self.state);
        state.drain_calls.push((max_ms, idle_ms));
    }

    fn write(&mut self, data: &str) -> std::io::Result<()> {
        let mut state = lock_unpoisoned(&self.state);
        state.writes.push(data.to_string());
        Ok(())
    }

    fn columns(&self) -> u16 {
        self.columns
    }

    fn rows(&self) -> u16 {
        self.rows
    }
}

pub fn inject_input(state: &Arc<Mutex<TerminalTrace>>, data: &str) {
    let mut state = lock_unpoisoned(state);
    let Some(on_input) = state.on_input.as_mut() else {
        panic!("terminal input handler is not registered");
    };

    on_input(data.to_string());
}

pub fn rendered_output(state: &Arc<Mutex<TerminalTrace>>) -> String {
    lock_unpoisoned(state).writes.join("")
}

/// Last frame written, with escape sequences removed.
pub fn last_write_plain(state: &Arc<Mutex<TerminalTrace>>) -> String {
    lock_unpoisoned(state)
        .writes
        .last()
        .map(|write| chat_tui::strip_ansi(write))
        .unwrap_or_default()
}

/// Applies hub deliveries to `supervisor` until it returns to idle.
pub fn drive_until_idle(
    supervisor: &mut Supervisor,
    controller: &mut RuntimeController,
    hub: &EventHub,
) {
    while !supervisor.is_idle() {
        match hub.wait_next_timeout(EVENT_TIMEOUT) {
            Some(LoopEvent::Stream { run_id, item }) => supervisor.on_item(run_id, item, controller),
            Some(other) => panic!("unexpected loop event: {other:?}"),
            None => panic!("stream did not reach idle in time"),
        }
    }
}

/// Waits for the next stream delivery and applies it.
pub fn apply_next(supervisor: &mut Supervisor, controller: &mut RuntimeController, hub: &EventHub) {
    match hub.wait_next_timeout(EVENT_TIMEOUT) {
        Some(LoopEvent::Stream { run_id, item }) => supervisor.on_item(run_id, item, controller),
        other => panic!("expected a stream delivery, got {other:?}"),
    }
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
