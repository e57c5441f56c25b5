//! Event loop and the host side of the supervisor.

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use chat_provider::{CancelSignal, ChatProvider, RunId, RunRequest};
use chat_tui::{parse_input_events, OutputGate, Terminal, TerminalCmd, TerminalGuard};
use tracing::{debug, info, warn};

use crate::app::App;
use crate::hub::{EventHub, LoopEvent};
use crate::stream::{spawn_stream, FragmentSink};
use crate::supervisor::HostOps;

/// Carries out supervisor effects against the hub and worker threads.
pub struct RuntimeController {
    hub: Arc<EventHub>,
    provider: Arc<dyn ChatProvider>,
    workers: Vec<(RunId, JoinHandle<()>)>,
    render_requested: bool,
}

impl RuntimeController {
    pub fn new(hub: Arc<EventHub>, provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            hub,
            provider,
            workers: Vec::new(),
            render_requested: true,
        }
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    /// Returns whether a render was requested since the last call.
    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.render_requested)
    }

    /// Number of worker threads not yet joined.
    pub fn live_workers(&mut self) -> usize {
        self.reap_finished();
        self.workers.len()
    }

    fn reap_finished(&mut self) {
        let (finished, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.workers)
            .into_iter()
            .partition(|(_, handle)| handle.is_finished());
        self.workers = live;
        for (run_id, handle) in finished {
            if handle.join().is_err() {
                warn!(run_id, "stream worker panicked outside provider");
            }
        }
    }
}

impl HostOps for RuntimeController {
    fn start_stream(&mut self, request: RunRequest, cancel: CancelSignal) -> Result<(), String> {
        self.reap_finished();
        let run_id = request.run_id;
        self.hub.engage(run_id);

        let sink: Arc<dyn FragmentSink> = Arc::clone(&self.hub) as Arc<dyn FragmentSink>;
        let handle = spawn_stream(Arc::clone(&self.provider), request, cancel, sink)
            .map_err(|error| format!("failed to start stream worker: {error}"))?;
        self.workers.push((run_id, handle));
        debug!(run_id, live = self.workers.len(), "stream worker started");
        Ok(())
    }

    fn request_read(&mut self, run_id: RunId) {
        self.hub.request_read(run_id);
    }

    fn disengage_stream(&mut self, run_id: RunId) {
        self.hub.disengage(run_id);
    }

    fn request_render(&mut self) {
        self.render_requested = true;
    }

    fn request_stop(&mut self) {
        self.hub.request_stop();
    }
}

/// Owns the terminal and drives the single-threaded loop.
pub struct ChatRuntime<T: Terminal> {
    terminal: TerminalGuard<T>,
    app: App,
    controller: RuntimeController,
    gate: OutputGate,
}

impl<T: Terminal> ChatRuntime<T> {
    pub fn new(terminal: T, app: App, provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            terminal: TerminalGuard::new(terminal),
            app,
            controller: RuntimeController::new(Arc::new(EventHub::new()), provider),
            gate: OutputGate::new(),
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn hub(&self) -> Arc<EventHub> {
        Arc::clone(self.controller.hub())
    }

    pub fn terminal(&self) -> &T {
        self.terminal.terminal()
    }

    /// Puts the terminal in raw mode on the alternate screen and paints the
    /// first frame.
    pub fn start(&mut self) -> io::Result<()> {
        let input_hub = self.hub();
        let resize_hub = self.hub();
        self.terminal.terminal_mut().start(
            Box::new(move |data| input_hub.enqueue_input(data)),
            Box::new(move || resize_hub.signal_resize()),
        )?;

        self.gate.extend([
            TerminalCmd::EnterAltScreen,
            TerminalCmd::BracketedPasteEnable,
            TerminalCmd::ClearScreen,
        ]);
        self.apply_terminal_size();
        self.render()?;
        info!("terminal started");
        Ok(())
    }

    /// Processes events until quit. Stream and input errors are absorbed by
    /// the app; only a failed terminal write ends the loop early.
    pub fn run(&mut self) -> io::Result<()> {
        let hub = self.hub();
        while let Some(event) = hub.wait_next() {
            self.apply(event);
            while !self.app.should_exit() {
                match hub.try_next() {
                    Some(event) => self.apply(event),
                    None => break,
                }
            }
            if self.app.should_exit() {
                break;
            }
            if self.controller.take_render_request() {
                self.render()?;
            }
        }
        Ok(())
    }

    /// Runs the loop and always restores the terminal afterwards.
    pub fn run_to_completion(mut self) -> io::Result<()> {
        let result = self.run();
        let stopped = self.stop();
        result.and(stopped)
    }

    /// Cancels any stream and restores the terminal.
    pub fn stop(mut self) -> io::Result<()> {
        self.app.shutdown(&mut self.controller);
        self.controller.hub().request_stop();

        self.gate.extend([
            TerminalCmd::BracketedPasteDisable,
            TerminalCmd::ShowCursor,
            TerminalCmd::LeaveAltScreen,
        ]);
        let flushed = self.gate.flush(self.terminal.terminal_mut());
        let finished = self.terminal.finish();
        info!(live_workers = self.controller.live_workers(), "terminal stopped");
        flushed.and(finished)
    }

    fn apply(&mut self, event: LoopEvent) {
        match event {
            LoopEvent::Resize => {
                self.apply_terminal_size();
                self.controller.request_render();
            }
            LoopEvent::Input(data) => {
                for event in parse_input_events(&data) {
                    self.app.handle_event(&event, &mut self.controller);
                    if self.app.should_exit() {
                        break;
                    }
                }
            }
            LoopEvent::Stream { run_id, item } => {
                self.app.on_stream_item(run_id, item, &mut self.controller);
            }
        }
    }

    fn apply_terminal_size(&mut self) {
        let terminal = self.terminal.terminal();
        let (columns, rows) = (terminal.columns(), terminal.rows());
        self.app.on_resize(usize::from(columns), usize::from(rows));
    }

    fn render(&mut self) -> io::Result<()> {
        let rows = self.terminal.terminal().rows();
        self.gate.extend(self.app.render().into_commands(rows));
        self.gate.flush(self.terminal.terminal_mut())
    }
}
