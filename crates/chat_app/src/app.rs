//! Chat screen state: transcript viewport, prompt input, and key handling.

use chat_provider::RunId;
use chat_tui::{Frame, InputEvent, TextInput, Viewport};
use tracing::debug;

use crate::session::ChatSession;
use crate::stream::StreamItem;
use crate::supervisor::{HostOps, Supervisor};

pub const INPUT_HEIGHT: usize = 2;
/// Blank rows between the viewport and the input.
pub const GAP_HEIGHT: usize = 1;
pub const INITIAL_WIDTH: usize = 40;
pub const INITIAL_VIEWPORT_HEIGHT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Submit,
    Quit,
    HalfPageUp,
    HalfPageDown,
    PageUp,
    PageDown,
}

fn action_for_key(key_id: &str) -> Option<Action> {
    match key_id {
        "enter" => Some(Action::Submit),
        "escape" | "ctrl+c" => Some(Action::Quit),
        "ctrl+u" => Some(Action::HalfPageUp),
        "ctrl+d" => Some(Action::HalfPageDown),
        "pageUp" => Some(Action::PageUp),
        "pageDown" => Some(Action::PageDown),
        _ => None,
    }
}

pub struct App {
    supervisor: Supervisor,
    viewport: Viewport,
    input: TextInput,
    should_exit: bool,
}

impl App {
    pub fn new(session: ChatSession) -> Self {
        Self {
            supervisor: Supervisor::new(session),
            viewport: Viewport::new(INITIAL_WIDTH, INITIAL_VIEWPORT_HEIGHT),
            input: TextInput::new(INITIAL_WIDTH, INPUT_HEIGHT),
            should_exit: false,
        }
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    pub fn handle_event(&mut self, event: &InputEvent, host: &mut dyn HostOps) {
        let action = match event {
            InputEvent::Key { key_id, .. } => action_for_key(key_id),
            InputEvent::Resize { columns, rows } => {
                self.on_resize(usize::from(*columns), usize::from(*rows));
                host.request_render();
                return;
            }
            _ => None,
        };

        match action {
            Some(Action::Submit) => self.submit(host),
            Some(Action::Quit) => {
                self.should_exit = true;
                self.supervisor.shutdown(host);
                host.request_stop();
            }
            Some(Action::HalfPageUp) => self.viewport.half_page_up(),
            Some(Action::HalfPageDown) => self.viewport.half_page_down(),
            Some(Action::PageUp) => self.viewport.page_up(),
            Some(Action::PageDown) => self.viewport.page_down(),
            None => {
                if !self.input.handle_event(event) {
                    debug!(?event, "unhandled input");
                }
            }
        }
        host.request_render();
    }

    /// Lays the screen out for a terminal of `columns` x `rows`.
    pub fn on_resize(&mut self, columns: usize, rows: usize) {
        let columns = columns.max(1);
        self.viewport.set_width(columns);
        self.viewport
            .set_height(rows.saturating_sub(INPUT_HEIGHT + GAP_HEIGHT).max(1));
        self.input.set_width(columns);
        self.input.set_height(INPUT_HEIGHT);

        if !self.supervisor.transcript().is_empty() {
            self.refresh_viewport();
        }
        debug!(columns, rows, "resized");
    }

    pub fn on_stream_item(&mut self, run_id: RunId, item: StreamItem, host: &mut dyn HostOps) {
        self.supervisor.on_item(run_id, item, host);
        self.refresh_viewport();
    }

    pub fn shutdown(&mut self, host: &mut dyn HostOps) {
        self.supervisor.shutdown(host);
    }

    /// Viewport rows, a blank gap row, then the input rows.
    pub fn render(&self) -> Frame {
        let mut frame = Frame::new();
        frame.extend(self.viewport.view());
        for _ in 0..GAP_HEIGHT {
            frame.push_line("");
        }
        frame.extend(self.input.view());
        frame
    }

    fn submit(&mut self, host: &mut dyn HostOps) {
        let prompt = self.input.value().to_string();
        self.input.reset();
        self.supervisor.submit(&prompt, host);
        if !self.supervisor.transcript().is_empty() {
            self.refresh_viewport();
        }
    }

    fn refresh_viewport(&mut self) {
        self.viewport
            .set_content(&self.supervisor.transcript().render_styled());
        self.viewport.goto_bottom();
    }
}
