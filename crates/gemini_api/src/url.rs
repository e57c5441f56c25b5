/// Default base URL for Gemini requests.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Build the SSE streaming endpoint for `model`.
///
/// A blank base falls back to the default, trailing slashes are dropped, and
/// a `models/` prefix on the model id is not doubled.
pub fn stream_endpoint(base_url: &str, model: &str) -> String {
    let base = if base_url.trim().is_empty() {
        DEFAULT_GEMINI_BASE_URL
    } else {
        base_url.trim()
    };
    let base = base.trim_end_matches('/');
    let model = model.trim();
    let model = model.strip_prefix("models/").unwrap_or(model);

    format!("{base}/models/{model}:streamGenerateContent?alt=sse")
}
