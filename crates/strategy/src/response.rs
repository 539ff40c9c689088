use serde_json::{Map, Value};
use sift_core::{non_empty, ExtractionResult};

use crate::error::DelegateError;

const MAX_ERROR_EXCERPT: usize = 120;

/// Turns a raw completion into a result. Prose around the JSON object is
/// ignored and missing keys are absent.
pub fn parse_delegate_output(content: &str) -> Result<ExtractionResult, DelegateError> {
    let object = first_json_object(content)
        .ok_or_else(|| DelegateError::MalformedOutput(excerpt(content)))?;

    Ok(ExtractionResult {
        postal_code: coerce_field(object.get("zip")),
        brand: coerce_field(object.get("brand")),
        category: coerce_field(object.get("category")),
        time_preference: coerce_field(object.get("time_pref")),
    })
}

/// First `{` at which a complete JSON object can be decoded.
pub fn first_json_object(content: &str) -> Option<Map<String, Value>> {
    content.match_indices('{').find_map(|(offset, _)| {
        let mut stream =
            serde_json::Deserializer::from_str(&content[offset..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => Some(map),
            _ => None,
        }
    })
}

fn coerce_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => non_empty(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn excerpt(content: &str) -> String {
    let trimmed = content.trim();
    match trimmed.char_indices().nth(MAX_ERROR_EXCERPT) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
