//! Recovers the JSON object from raw oracle completions.
//!
//! Completions routinely arrive wrapped in Markdown fences (optionally tagged
//! with a language) or surrounded by a sentence of prose. Extraction peels
//! those layers off and accepts only a JSON object.

use grantline_core::{AppError, AppResult};
use serde_json::Value;

const FENCE: &str = "```";
const PREVIEW_LIMIT: usize = 160;

/// Extracts the JSON object carried by a raw oracle completion.
///
/// The trimmed text is tried as-is first, so a fence marker quoted inside a
/// bare object or in trailing prose never damages a valid payload.
pub fn extract_intent_payload(raw: &str) -> AppResult<Value> {
    let trimmed = raw.trim();
    let fenced = fenced_body(trimmed);

    parse_object(trimmed)
        .or_else(|| fenced.and_then(parse_object))
        .or_else(|| fenced.and_then(outermost_braces).and_then(parse_object))
        .or_else(|| outermost_braces(trimmed).and_then(parse_object))
        .ok_or_else(|| {
            AppError::OracleResponseUnparseable(
                "no JSON object found in oracle response".to_owned(),
            )
        })
}

/// Returns a log-safe preview of oracle text.
///
/// Control characters are replaced and the text is truncated, so the result
/// can be written to logs without carrying terminal escapes or whole payloads.
#[must_use]
pub fn redacted_preview(raw: &str) -> String {
    let mut preview: String = raw
        .chars()
        .take(PREVIEW_LIMIT)
        .map(|character| {
            if character.is_control() {
                ' '
            } else {
                character
            }
        })
        .collect();

    if raw.chars().count() > PREVIEW_LIMIT {
        preview.push_str("...");
    }

    preview
}

fn fenced_body(trimmed: &str) -> Option<&str> {
    let start = trimmed.find(FENCE)?;

    let after_fence = &trimmed[start + FENCE.len()..];
    let body = strip_language_tag(after_fence);
    let body = match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    };

    Some(body.trim())
}

fn strip_language_tag(body: &str) -> &str {
    let tag_length = body
        .char_indices()
        .find(|(_, character)| !(character.is_ascii_alphanumeric() || *character == '-'))
        .map_or(body.len(), |(index, _)| index);

    &body[tag_length..]
}

fn outermost_braces(candidate: &str) -> Option<&str> {
    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    (start < end).then(|| &candidate[start..=end])
}

fn parse_object(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(Value::is_object)
}
