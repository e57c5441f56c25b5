mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chat_app::hub::EventHub;
use chat_app::runtime::RuntimeController;
use chat_app::session::ChatSession;
use chat_app::stream::StreamItem;
use chat_app::supervisor::{HostOps, Supervisor};
use chat_provider::{CancelSignal, ChatMessage, ChatProvider, RunId, RunRequest};
use chat_provider_mock::MockProvider;
use pretty_assertions::assert_eq;

use support::{apply_next, drive_until_idle};

#[derive(Default)]
struct HostSpy {
    ops: Vec<String>,
    cancels: Vec<(RunId, CancelSignal)>,
}

impl HostOps for HostSpy {
    fn start_stream(&mut self, request: RunRequest, cancel: CancelSignal) -> Result<(), String> {
        self.ops.push(format!("start {}", request.run_id));
        self.cancels.push((request.run_id, cancel));
        Ok(())
    }

    fn request_read(&mut self, run_id: RunId) {
        self.ops.push(format!("read {run_id}"));
    }

    fn disengage_stream(&mut self, run_id: RunId) {
        self.ops.push(format!("disengage {run_id}"));
    }

    fn request_render(&mut self) {}

    fn request_stop(&mut self) {}
}

fn fragment(text: &str) -> StreamItem {
    StreamItem::Fragment(text.to_string())
}

fn plain(supervisor: &Supervisor) -> Vec<String> {
    supervisor.transcript().plain_entries()
}

fn quick(provider: MockProvider) -> Arc<dyn ChatProvider> {
    Arc::new(provider.with_delays(Duration::ZERO, Duration::ZERO))
}

fn chunks(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn idle_scenario_single_fragment_reply() {
    let mut supervisor = Supervisor::new(ChatSession::new("answer concisely."));
    let mut host = HostSpy::default();

    let run_id = supervisor.submit("2+2?", &mut host).expect("started");
    supervisor.on_item(run_id, fragment("4"), &mut host);
    supervisor.on_item(run_id, StreamItem::Closed, &mut host);

    assert!(supervisor.is_idle());
    assert_eq!(plain(&supervisor), vec!["? 2+2?", "> 4"]);
    assert_eq!(
        supervisor.session().messages(),
        &[ChatMessage::user("2+2?"), ChatMessage::assistant("4")]
    );
}

#[test]
fn reply_is_concatenation_of_fragments_in_delivery_order() {
    for count in [0usize, 1, 2, 7] {
        let mut supervisor = Supervisor::new(ChatSession::new(""));
        let mut host = HostSpy::default();
        let run_id = supervisor.submit("q", &mut host).expect("started");

        let pieces: Vec<String> = (0..count).map(|idx| format!("<{idx}>")).collect();
        for piece in &pieces {
            supervisor.on_item(run_id, StreamItem::Fragment(piece.clone()), &mut host);
        }
        supervisor.on_item(run_id, StreamItem::Closed, &mut host);

        let expected = pieces.concat();
        let reply = supervisor
            .transcript()
            .get(1)
            .map(|entry| entry.text.clone())
            .unwrap_or_default();
        assert_eq!(reply, expected, "fragment count {count}");
        let reads = host.ops.iter().filter(|op| op.starts_with("read")).count();
        assert_eq!(reads, count + 1);
    }
}

#[test]
fn superseded_stream_never_reaches_new_entry() {
    let mut supervisor = Supervisor::new(ChatSession::new(""));
    let mut host = HostSpy::default();

    let first = supervisor.submit("A", &mut host).expect("first");
    supervisor.on_item(first, fragment("F1"), &mut host);

    let second = supervisor.submit("B", &mut host).expect("second");
    supervisor.on_item(first, fragment("F2"), &mut host);
    supervisor.on_item(first, StreamItem::Closed, &mut host);

    assert_eq!(supervisor.active().map(|h| h.target_index), Some(3));
    assert!(supervisor.transcript().get(3).is_none());

    supervisor.on_item(second, fragment("b"), &mut host);
    supervisor.on_item(second, StreamItem::Closed, &mut host);

    assert_eq!(
        plain(&supervisor),
        vec!["? A", "> F1 [interrupted]", "? B", "> b"]
    );
    assert_eq!(
        supervisor.session().messages(),
        &[
            ChatMessage::user("A"),
            ChatMessage::assistant("F1"),
            ChatMessage::user("B"),
            ChatMessage::assistant("b"),
        ]
    );

    let (cancelled_run, cancel) = &host.cancels[0];
    assert_eq!(*cancelled_run, first);
    assert!(cancel.load(Ordering::Acquire));

    let disengage = host.ops.iter().position(|op| op == "disengage 1");
    let start_second = host.ops.iter().position(|op| op == "start 2");
    assert!(disengage.expect("old run disengaged") < start_second.expect("new run started"));
}

#[test]
fn supersession_before_any_fragment_leaves_no_reply_entry() {
    let mut supervisor = Supervisor::new(ChatSession::new(""));
    let mut host = HostSpy::default();

    supervisor.submit("A", &mut host).expect("first");
    supervisor.submit("B", &mut host).expect("second");

    assert_eq!(plain(&supervisor), vec!["? A", "? B"]);
    assert_eq!(
        supervisor.session().messages(),
        &[ChatMessage::user("A"), ChatMessage::user("B")]
    );
}

#[test]
fn failure_marks_partial_reply_and_appends_error_entry() {
    let mut supervisor = Supervisor::new(ChatSession::new(""));
    let mut host = HostSpy::default();

    let run_id = supervisor.submit("q", &mut host).expect("started");
    supervisor.on_item(run_id, fragment("par"), &mut host);
    supervisor.on_item(run_id, StreamItem::Failed("quota".to_string()), &mut host);

    assert!(supervisor.is_idle());
    assert_eq!(
        plain(&supervisor),
        vec!["? q", "> par [incomplete]", "> error: quota"]
    );
    assert_eq!(supervisor.session().messages(), &[ChatMessage::user("q")]);

    let next = supervisor.submit("again", &mut host);
    assert!(next.is_some());
}

#[test]
fn mock_stream_through_hub_reaches_idle() {
    let hub = Arc::new(EventHub::new());
    let mut controller = RuntimeController::new(
        Arc::clone(&hub),
        quick(MockProvider::new(chunks(&["4"]))),
    );
    let mut supervisor = Supervisor::new(ChatSession::new(""));

    supervisor.submit("2+2?", &mut controller).expect("started");
    drive_until_idle(&mut supervisor, &mut controller, &hub);

    assert_eq!(plain(&supervisor), vec!["? 2+2?", "> 4"]);
    assert_eq!(hub.engaged(), None);
}

#[test]
fn empty_chunks_are_skipped_without_ending_stream() {
    let hub = Arc::new(EventHub::new());
    let mut controller = RuntimeController::new(
        Arc::clone(&hub),
        quick(MockProvider::new(chunks(&["Hi", "", " there"]))),
    );
    let mut supervisor = Supervisor::new(ChatSession::new(""));

    supervisor.submit("hello", &mut controller).expect("started");
    drive_until_idle(&mut supervisor, &mut controller, &hub);

    assert_eq!(plain(&supervisor), vec!["? hello", "> Hi there"]);
}

#[test]
fn provider_failure_through_hub_surfaces_error() {
    let hub = Arc::new(EventHub::new());
    let mut controller = RuntimeController::new(
        Arc::clone(&hub),
        quick(MockProvider::new(chunks(&["par"])).with_failure("RESOURCE_EXHAUSTED: quota")),
    );
    let mut supervisor = Supervisor::new(ChatSession::new(""));

    supervisor.submit("q", &mut controller).expect("started");
    drive_until_idle(&mut supervisor, &mut controller, &hub);

    assert_eq!(
        plain(&supervisor),
        vec![
            "? q",
            "> par [incomplete]",
            "> error: RESOURCE_EXHAUSTED: quota"
        ]
    );
}

#[test]
fn live_supersession_keeps_replies_apart() {
    let hub = Arc::new(EventHub::new());
    let provider: Arc<dyn ChatProvider> = Arc::new(
        MockProvider::echo().with_delays(Duration::ZERO, Duration::from_millis(5)),
    );
    let mut controller = RuntimeController::new(Arc::clone(&hub), provider);
    let mut supervisor = Supervisor::new(ChatSession::new(""));

    supervisor
        .submit("one two three four five six", &mut controller)
        .expect("first");
    apply_next(&mut supervisor, &mut controller, &hub);

    supervisor.submit("second prompt", &mut controller).expect("second");
    drive_until_idle(&mut supervisor, &mut controller, &hub);

    let entries = plain(&supervisor);
    assert_eq!(entries[0], "? one two three four five six");
    assert_eq!(entries[1], "> echo:  [interrupted]");
    assert_eq!(entries[2], "? second prompt");
    assert_eq!(entries[3], "> echo: second prompt");
    assert_eq!(entries.len(), 4);
}
