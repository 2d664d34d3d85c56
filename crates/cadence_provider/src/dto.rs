use serde::Serialize;
use serde_json::Value;

pub(crate) const FALLBACK_CONTENT: &str = "I need more data to respond.";

// Checked in order; the first non-blank string wins.
const CONTENT_FIELDS: [&str; 2] = ["response", "text"];

/// Body of `POST /api/generate`.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

/// Extracts the reply text from a generation response body.
///
/// Missing, blank or non-string fields fall through to the next candidate and
/// finally to [`FALLBACK_CONTENT`]. The result is always trimmed and non-empty.
pub(crate) fn reply_content(body: &Value) -> String {
    CONTENT_FIELDS
        .iter()
        .filter_map(|field| body.get(field).and_then(Value::as_str))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .unwrap_or(FALLBACK_CONTENT)
        .to_string()
}
