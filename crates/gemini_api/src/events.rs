use serde::Deserialize;

/// Normalized event produced from one streamed response chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiStreamEvent {
    /// A text fragment of the candidate answer.
    Text { text: String },
    /// The candidate finished normally.
    Finished { reason: String },
    /// The prompt or the candidate was blocked by the service.
    Blocked { reason: String },
    /// An error object delivered inside the stream.
    Error {
        code: Option<i64>,
        status: Option<String>,
        message: String,
    },
}

impl GeminiStreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Text { .. })
    }
}

const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResponseChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    code: Option<i64>,
    status: Option<String>,
    message: Option<String>,
}

/// Map one decoded JSON chunk into zero or more events.
///
/// Only the first candidate is read. Its parts are joined into one text
/// event, an empty join is dropped, and an unspecified finish reason produces
/// no event.
pub(crate) fn events_from_chunk(chunk: ResponseChunk) -> Vec<GeminiStreamEvent> {
    let mut events = Vec::new();

    if let Some(error) = chunk.error {
        events.push(GeminiStreamEvent::Error {
            code: error.code,
            status: error.status,
            message: error
                .message
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| "unknown error".to_owned()),
        });
        return events;
    }

    if let Some(reason) = chunk
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
        .filter(|reason| !reason.is_empty())
    {
        events.push(GeminiStreamEvent::Blocked { reason });
        return events;
    }

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return events;
    };

    let text: String = candidate
        .content
        .into_iter()
        .flat_map(|content| content.parts)
        .filter_map(|part| part.text)
        .collect();
    if !text.is_empty() {
        events.push(GeminiStreamEvent::Text { text });
    }

    match candidate.finish_reason.as_deref() {
        None | Some("") | Some("FINISH_REASON_UNSPECIFIED") => {}
        Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason) => {
            events.push(GeminiStreamEvent::Blocked {
                reason: reason.to_owned(),
            });
        }
        Some(reason) => events.push(GeminiStreamEvent::Finished {
            reason: reason.to_owned(),
        }),
    }

    events
}
