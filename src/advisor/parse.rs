use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    // greedy: first '{' through the last '}'
    static ref OBJECT_RE: Regex = Regex::new(r"\{[\s\S]*\}").unwrap();
}

/// Pulls a JSON object out of free-form model output.
///
/// The whole text is tried first; if that is not valid JSON, the span from the
/// first `{` to the last `}` is tried. Anything else yields `None`.
pub fn parse_json_object(text: &str) -> Option<Map<String, Value>> {
    if text.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return match value {
            Value::Object(map) => Some(map),
            _ => None,
        };
    }
    let candidate = OBJECT_RE.find(text)?;
    match serde_json::from_str::<Value>(candidate.as_str()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
