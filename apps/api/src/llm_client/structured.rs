//! Structured-output helpers: strip code fences, strict-parse, fall back.
//!
//! Models are told to return bare JSON but regularly wrap it in a Markdown
//! fence anyway. Both grading and chart generation go through here.

use serde::de::DeserializeOwned;
use tracing::warn;

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
///
/// Only a fence that opens a line counts, so backticks quoted inside a JSON
/// string are left alone. Text before the opening fence is dropped, the last
/// fence closes the block, and an unclosed fence keeps everything after it.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(open) = opening_fence(text) else {
        return text;
    };

    let after = &text[open + 3..];
    let after = match after.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &after[4..],
        _ => after,
    };

    match after.rfind("```") {
        Some(close) => after[..close].trim(),
        None => after.trim(),
    }
}

fn opening_fence(text: &str) -> Option<usize> {
    text.match_indices("```").map(|(i, _)| i).find(|&i| {
        let line = text[..i].trim_end_matches(|c: char| c == ' ' || c == '\t');
        line.is_empty() || line.ends_with('\n')
    })
}

/// Strict parse. Bare JSON is tried as-is first; fences are only stripped
/// when that fails. Unknown fields are tolerated, missing ones are not.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    match serde_json::from_str(raw.trim()) {
        Ok(value) => Ok(value),
        Err(_) => serde_json::from_str(strip_json_fences(raw)),
    }
}

/// Parses `raw` into `T`, or returns `fallback()` if it is not valid JSON of
/// the expected shape. Never fails.
pub fn parse_or_fallback<T, F>(raw: &str, fallback: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match parse_structured(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Structured output did not parse, using fallback: {e}");
            fallback()
        }
    }
}
