//! Lenient JSON extraction and strict decoding of model output.

use crate::{Error, Result};
use serde::de::DeserializeOwned;

/// Locate the first balanced span in `text` that parses as a JSON object or
/// array.
///
/// Handles Markdown code fences and chatter before or after the payload,
/// including bracketed prose such as `[v1]` or `[draft]`.
pub fn extract_json(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find(['{', '[']) {
        let start = search_from + offset;
        if let Some(end) = balanced_end(bytes, start) {
            let candidate = &text[start..=end];
            if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
                return Some(candidate);
            }
        }
        search_from = start + 1;
    }
    None
}

/// Index of the bracket closing the one at `start`, skipping string literals.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.pop() != Some(b) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract and decode a model payload into `T`.
///
/// Anything that does not match the schema is a validation failure.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    let payload = extract_json(text)
        .ok_or_else(|| Error::Validation(format!("no JSON payload in response: {}", preview(text))))?;
    Ok(serde_json::from_str(payload)?)
}

/// First 200 characters of `text`, for log and error messages.
pub fn preview(text: &str) -> String {
    crate::record::truncate_chars(text, 200).0
}
