//! Completion envelope extraction
//!
//! Providers answer with `{"choices":[{"message":{"content":"..."}}]}`. The
//! envelope is checked against an explicit schema here so a wrong shape turns
//! into [`ItineraryError::ExtractionError`] instead of a surprise further down.

use crate::ItineraryError;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<Value>,
}

/// Pull `choices[0].message.content` out of a provider response.
pub fn extract_content(envelope: &Value) -> Result<String, ItineraryError> {
    if !envelope.is_object() {
        warn!("Completion response is not a JSON object");
        return Err(ItineraryError::ExtractionError(
            "expected a JSON object at the top level".to_string(),
        ));
    }

    let response = CompletionResponse::deserialize(envelope)
        .map_err(|e| ItineraryError::ExtractionError(format!("malformed envelope: {}", e)))?;

    let choices = response
        .choices
        .ok_or_else(|| missing("choices"))?;
    let first = choices
        .into_iter()
        .next()
        .ok_or_else(|| missing("choices[0]"))?;
    let message = first.message.ok_or_else(|| missing("choices[0].message"))?;

    match message.content {
        Some(Value::String(content)) => {
            debug!(content_length = content.len(), "Extracted completion content");
            Ok(content)
        }
        Some(Value::Null) | None => Err(missing("choices[0].message.content")),
        Some(other) => Err(ItineraryError::ExtractionError(format!(
            "choices[0].message.content is not a string: {}",
            other
        ))),
    }
}

/// Same as [`extract_content`] for a response body that has not been decoded yet.
pub fn extract_content_from_str(body: &str) -> Result<String, ItineraryError> {
    let envelope: Value = serde_json::from_str(body)
        .map_err(|e| ItineraryError::ExtractionError(format!("response body is not JSON: {}", e)))?;
    extract_content(&envelope)
}

fn missing(path: &str) -> ItineraryError {
    warn!(path = path, "Completion response is missing an expected field");
    ItineraryError::ExtractionError(format!("missing {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_first_choice() {
        let envelope = json!({
            "choices": [
                {"message": {"role": "assistant", "content": "Day 1 | 9 AM | Fort visit"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        });
        assert_eq!(extract_content(&envelope).unwrap(), "Day 1 | 9 AM | Fort visit");
    }

    #[test]
    fn test_missing_choices() {
        let err = extract_content(&json!({"id": "abc"})).unwrap_err();
        assert!(matches!(err, ItineraryError::ExtractionError(ref m) if m == "missing choices"));
    }

    #[test]
    fn test_empty_choices() {
        let err = extract_content(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, ItineraryError::ExtractionError(ref m) if m == "missing choices[0]"));
    }

    #[test]
    fn test_null_content() {
        let err = extract_content(&json!({"choices": [{"message": {"content": null}}]})).unwrap_err();
        assert!(matches!(err, ItineraryError::ExtractionError(ref m) if m.ends_with("message.content")));
    }

    #[test]
    fn test_wrong_shapes() {
        assert!(extract_content(&json!([1, 2, 3])).is_err());
        assert!(extract_content(&json!({"choices": "nope"})).is_err());
        assert!(extract_content(&json!({"choices": [{"message": {"content": 42}}]})).is_err());
    }

    #[test]
    fn test_extract_from_str() {
        let body = r#"{"choices":[{"message":{"content":"[]"}}]}"#;
        assert_eq!(extract_content_from_str(body).unwrap(), "[]");
        assert!(matches!(
            extract_content_from_str("<html>502</html>"),
            Err(ItineraryError::ExtractionError(_))
        ));
    }
}
