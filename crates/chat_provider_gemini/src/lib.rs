//! Gemini-backed implementation of the shared `chat_provider` contract.
//!
//! This adapter translates `gemini_api` stream events into the `RunEvent`
//! lifecycle expected by `chat_app`, forwarding each text fragment as soon as
//! the transport yields it.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chat_provider::{
    CancelSignal, ChatProvider, ProviderInitError, ProviderProfile, RunEvent, RunRequest,
};
use gemini_api::config::DEFAULT_GEMINI_MODEL;
use gemini_api::{
    GeminiApiClient, GeminiApiConfig, GeminiApiError, GeminiRequest, GeminiStreamEvent, Role,
};

/// Stable provider identifier used by `chat_app` startup selection.
pub const GEMINI_PROVIDER_ID: &str = "gemini";

/// Runtime configuration for the Gemini provider.
#[derive(Clone, PartialEq, Eq)]
pub struct GeminiProviderConfig {
    pub api_key: String,
    pub model_id: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for GeminiProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProviderConfig")
            .field("api_key", &"<redacted>")
            .field("model_id", &self.model_id)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiProviderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_id: model_id.into(),
            base_url: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_api_config(self, model_id: &str) -> GeminiApiConfig {
        let mut config = GeminiApiConfig::new(self.api_key).with_model(model_id);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait StreamClient: Send + Sync {
    fn stream(
        &self,
        request: &GeminiRequest,
        cancel: &CancelSignal,
        on_event: &mut dyn FnMut(GeminiStreamEvent),
    ) -> Result<Option<String>, GeminiApiError>;
}

#[derive(Debug)]
struct DefaultStreamClient {
    client: GeminiApiClient,
}

impl StreamClient for DefaultStreamClient {
    fn stream(
        &self,
        request: &GeminiRequest,
        cancel: &CancelSignal,
        on_event: &mut dyn FnMut(GeminiStreamEvent),
    ) -> Result<Option<String>, GeminiApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                GeminiApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(
            self.client
                .stream_with_handler(request, Some(cancel), |event| on_event(event)),
        )
    }
}

/// `ChatProvider` adapter backed by `gemini_api` transport primitives.
pub struct GeminiProvider {
    model_id: String,
    stream_client: Arc<dyn StreamClient>,
}

impl GeminiProvider {
    /// Creates a provider using real Gemini transport.
    pub fn new(config: GeminiProviderConfig) -> Result<Self, ProviderInitError> {
        let model_id = sanitize_model_id(&config.model_id);
        let api_config = config.into_api_config(&model_id);
        let stream_client = Arc::new(DefaultStreamClient {
            client: GeminiApiClient::new(api_config).map_err(map_init_error)?,
        });

        Ok(Self {
            model_id,
            stream_client,
        })
    }

    #[cfg(test)]
    fn with_stream_client_for_tests(model_id: &str, stream_client: Arc<dyn StreamClient>) -> Self {
        Self {
            model_id: sanitize_model_id(model_id),
            stream_client,
        }
    }
}

impl ChatProvider for GeminiProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: GEMINI_PROVIDER_ID.to_string(),
            model_id: self.model_id.clone(),
        }
    }

    fn run(
        &self,
        req: RunRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(), String> {
        let run_id = req.run_id;

        emit(RunEvent::Started { run_id });

        if cancel.load(Ordering::Acquire) {
            emit(RunEvent::Cancelled { run_id });
            return Ok(());
        }

        let request = build_request(&req);
        if request.is_empty() {
            emit(RunEvent::Failed {
                run_id,
                error: "nothing to send: conversation is empty".to_string(),
            });
            return Ok(());
        }

        let result = self.stream_client.stream(&request, &cancel, &mut |event| {
            if let GeminiStreamEvent::Text { text } = event {
                if !text.is_empty() {
                    emit(RunEvent::Chunk { run_id, text });
                }
            }
        });

        match result {
            Ok(_) if cancel.load(Ordering::Acquire) => emit(RunEvent::Cancelled { run_id }),
            Ok(_) => emit(RunEvent::Finished { run_id }),
            Err(GeminiApiError::Cancelled) => emit(RunEvent::Cancelled { run_id }),
            Err(error) => emit(RunEvent::Failed {
                run_id,
                error: error.to_string(),
            }),
        }

        Ok(())
    }
}

fn build_request(req: &RunRequest) -> GeminiRequest {
    let mut request = GeminiRequest::new().with_system_instruction(req.instructions.clone());
    for message in &req.messages {
        let role = if message.is_user() {
            Role::User
        } else {
            Role::Model
        };
        request.push_turn(role, message.text());
    }
    request
}

fn sanitize_model_id(model_id: &str) -> String {
    let trimmed = model_id.trim();
    if trimmed.is_empty() {
        DEFAULT_GEMINI_MODEL.to_string()
    } else {
        trimmed.to_string()
    }
}

fn map_init_error(error: GeminiApiError) -> ProviderInitError {
    ProviderInitError::new(format!("failed to initialize gemini provider: {error}"))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::{Mutex, MutexGuard};

    use chat_provider::ChatMessage;

    use super::*;

    fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    enum FakeStreamOutcome {
        Success(Vec<GeminiStreamEvent>),
        Error(Vec<GeminiStreamEvent>, GeminiApiError),
    }

    struct FakeStreamClient {
        observed_request: Mutex<Option<GeminiRequest>>,
        outcome: Mutex<Option<FakeStreamOutcome>>,
        cancel_after_events: bool,
    }

    impl FakeStreamClient {
        fn success(events: Vec<GeminiStreamEvent>) -> Arc<Self> {
            Arc::new(Self {
                observed_request: Mutex::new(None),
                outcome: Mutex::new(Some(FakeStreamOutcome::Success(events))),
                cancel_after_events: false,
            })
        }

        fn failure(events: Vec<GeminiStreamEvent>, error: GeminiApiError) -> Arc<Self> {
            Arc::new(Self {
                observed_request: Mutex::new(None),
                outcome: Mutex::new(Some(FakeStreamOutcome::Error(events, error))),
                cancel_after_events: false,
            })
        }

        fn cancelling(events: Vec<GeminiStreamEvent>) -> Arc<Self> {
            Arc::new(Self {
                observed_request: Mutex::new(None),
                outcome: Mutex::new(Some(FakeStreamOutcome::Success(events))),
                cancel_after_events: true,
            })
        }

        fn observed_request(&self) -> Option<GeminiRequest> {
            lock_unpoisoned(&self.observed_request).clone()
        }
    }

    impl StreamClient for FakeStreamClient {
        fn stream(
            &self,
            request: &GeminiRequest,
            cancel: &CancelSignal,
            on_event: &mut dyn FnMut(GeminiStreamEvent),
        ) -> Result<Option<String>, GeminiApiError> {
            *lock_unpoisoned(&self.observed_request) = Some(request.clone());

            let outcome = lock_unpoisoned(&self.outcome).take();
            let (events, error) = match outcome {
                Some(FakeStreamOutcome::Success(events)) => (events, None),
                Some(FakeStreamOutcome::Error(events, error)) => (events, Some(error)),
                None => panic!("fake stream outcome should be consumed exactly once"),
            };
            for event in events {
                on_event(event);
            }
            if self.cancel_after_events {
                cancel.store(true, Ordering::Release);
            }
            match error {
                Some(error) => Err(error),
                None => Ok(Some("STOP".to_string())),
            }
        }
    }

    fn text(value: &str) -> GeminiStreamEvent {
        GeminiStreamEvent::Text {
            text: value.to_string(),
        }
    }

    fn run_events(provider: &GeminiProvider, messages: Vec<ChatMessage>) -> Vec<RunEvent> {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut events = Vec::new();

        provider
            .run(
                RunRequest {
                    run_id: 9,
                    messages,
                    instructions: "answer concisely.".to_string(),
                },
                cancel,
                &mut |event| events.push(event),
            )
            .expect("run should not return provider-level failure");

        events
    }

    #[test]
    fn profile_reports_gemini_provider_id_and_model() {
        let provider = GeminiProvider::with_stream_client_for_tests(
            " gemini-2.5-pro ",
            FakeStreamClient::success(Vec::new()),
        );

        let profile = provider.profile();
        assert_eq!(profile.provider_id, GEMINI_PROVIDER_ID);
        assert_eq!(profile.model_id, "gemini-2.5-pro");
    }

    #[test]
    fn blank_model_defaults_to_flash() {
        let provider =
            GeminiProvider::with_stream_client_for_tests("", FakeStreamClient::success(Vec::new()));
        assert_eq!(provider.profile().model_id, DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn run_maps_text_events_to_chunks_in_order_and_finishes() {
        let stream = FakeStreamClient::success(vec![
            text("Hi"),
            text(""),
            text(" there"),
            GeminiStreamEvent::Finished {
                reason: "STOP".to_string(),
            },
        ]);
        let provider = GeminiProvider::with_stream_client_for_tests(
            "gemini-2.5-flash",
            Arc::clone(&stream) as Arc<dyn StreamClient>,
        );

        let events = run_events(&provider, vec![ChatMessage::user("hello")]);

        assert_eq!(
            events,
            vec![
                RunEvent::Started { run_id: 9 },
                RunEvent::Chunk {
                    run_id: 9,
                    text: "Hi".to_string()
                },
                RunEvent::Chunk {
                    run_id: 9,
                    text: " there".to_string()
                },
                RunEvent::Finished { run_id: 9 },
            ]
        );
    }

    #[test]
    fn run_sends_full_history_with_alternating_roles() {
        let stream = FakeStreamClient::success(Vec::new());
        let provider = GeminiProvider::with_stream_client_for_tests(
            "gemini-2.5-flash",
            Arc::clone(&stream) as Arc<dyn StreamClient>,
        );

        run_events(
            &provider,
            vec![
                ChatMessage::user("2+2?"),
                ChatMessage::assistant("4"),
                ChatMessage::user("abandoned"),
                ChatMessage::user("3+3?"),
            ],
        );

        let request = stream.observed_request().expect("request observed");
        let roles: Vec<_> = request
            .contents
            .iter()
            .map(|content| content.role)
            .collect();
        assert_eq!(
            roles,
            vec![Some(Role::User), Some(Role::Model), Some(Role::User)]
        );
        assert_eq!(request.contents[2].parts.len(), 2);
        assert!(request.system_instruction.is_some());
    }

    #[test]
    fn run_maps_cancelled_transport_to_cancelled_terminal_event() {
        let stream = FakeStreamClient::failure(vec![text("part")], GeminiApiError::Cancelled);
        let provider = GeminiProvider::with_stream_client_for_tests("m", stream);

        let events = run_events(&provider, vec![ChatMessage::user("hi")]);

        assert!(matches!(events.first(), Some(RunEvent::Started { run_id: 9 })));
        assert!(matches!(events.last(), Some(RunEvent::Cancelled { run_id: 9 })));
    }

    #[test]
    fn run_reports_cancelled_when_flag_set_before_clean_end() {
        let stream = FakeStreamClient::cancelling(vec![text("part")]);
        let provider = GeminiProvider::with_stream_client_for_tests("m", stream);

        let events = run_events(&provider, vec![ChatMessage::user("hi")]);

        assert!(matches!(events.last(), Some(RunEvent::Cancelled { run_id: 9 })));
    }

    #[test]
    fn run_maps_transport_error_to_failed_terminal_event() {
        let stream = FakeStreamClient::failure(
            Vec::new(),
            GeminiApiError::Blocked {
                reason: "SAFETY".to_string(),
            },
        );
        let provider = GeminiProvider::with_stream_client_for_tests("m", stream);

        let events = run_events(&provider, vec![ChatMessage::user("hi")]);

        assert!(matches!(
            events.last(),
            Some(RunEvent::Failed { run_id: 9, error }) if error.contains("SAFETY")
        ));
    }

    #[test]
    fn empty_history_fails_without_calling_transport() {
        let stream = FakeStreamClient::success(Vec::new());
        let provider = GeminiProvider::with_stream_client_for_tests(
            "m",
            Arc::clone(&stream) as Arc<dyn StreamClient>,
        );

        let events = run_events(&provider, Vec::new());

        assert!(stream.observed_request().is_none());
        assert!(matches!(events.last(), Some(RunEvent::Failed { run_id: 9, .. })));
    }

    #[test]
    fn pre_cancelled_run_skips_transport() {
        let stream = FakeStreamClient::success(vec![text("never")]);
        let provider = GeminiProvider::with_stream_client_for_tests(
            "m",
            Arc::clone(&stream) as Arc<dyn StreamClient>,
        );
        let cancel = Arc::new(AtomicBool::new(true));
        let mut events = Vec::new();

        provider
            .run(
                RunRequest {
                    run_id: 3,
                    messages: vec![ChatMessage::user("hi")],
                    instructions: String::new(),
                },
                cancel,
                &mut |event| events.push(event),
            )
            .expect("run");

        assert!(stream.observed_request().is_none());
        assert_eq!(
            events,
            vec![
                RunEvent::Started { run_id: 3 },
                RunEvent::Cancelled { run_id: 3 }
            ]
        );
    }

    #[test]
    fn new_rejects_blank_api_key() {
        let error = match GeminiProvider::new(GeminiProviderConfig::new("  ", "m")) {
            Ok(_) => panic!("blank key must be rejected"),
            Err(error) => error,
        };
        assert!(error.message().contains("API key is required"));
    }
}
