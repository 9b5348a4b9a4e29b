//! Format detection for completion text
//!
//! Models answer in whatever shape they like: a clean JSON array, a JSON array
//! wrapped in prose or code fences, or plain `Day | Time | Activity` lines. The
//! parser runs an ordered list of strategies and keeps the first one that
//! yields structured data.
//!
//! Structured trip plans are a single JSON object instead of an array; they
//! go through [`ResponseParser::parse_object`].

use crate::ItineraryError;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Lines containing any of these are model artifacts, not records.
pub const DEFAULT_ARTIFACT_MARKERS: &[&str] = &["\\boxed", "undefined", "{", "}"];

/// Object keys that may wrap the record array in a direct JSON answer.
pub const DEFAULT_ARRAY_KEYS: &[&str] = &[
    "itinerary",
    "places",
    "recommendations",
    "cities",
    "destinations",
    "items",
    "data",
    "results",
];

/// A single way of reading structure out of completion text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    DirectJson,
    BracketSubstring,
    PipeLines,
    /// First `{` through the last `}`; only used for single-object answers.
    BraceObject,
}

impl ParseStrategy {
    /// Order in which strategies are attempted.
    pub const ORDER: [ParseStrategy; 3] = [
        ParseStrategy::DirectJson,
        ParseStrategy::BracketSubstring,
        ParseStrategy::PipeLines,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ParseStrategy::DirectJson => "direct_json",
            ParseStrategy::BracketSubstring => "bracket_substring",
            ParseStrategy::PipeLines => "pipe_lines",
            ParseStrategy::BraceObject => "brace_object",
        }
    }
}

/// Loosely typed rows produced by a strategy
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Vec<Value>),
    Lines(Vec<Vec<String>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPayload {
    pub strategy: ParseStrategy,
    pub payload: Payload,
}

impl ParsedPayload {
    pub fn len(&self) -> usize {
        match &self.payload {
            Payload::Json(items) => items.len(),
            Payload::Lines(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cascading parser for completion text
pub struct ResponseParser {
    bracket_regex: Regex,
    brace_regex: Regex,
    artifact_markers: Vec<String>,
    array_keys: Vec<String>,
}

impl ResponseParser {
    pub fn new() -> Result<Self, ItineraryError> {
        Ok(Self {
            // first '[' through the last ']', across newlines
            bracket_regex: Regex::new(r"\[[\s\S]*\]")
                .map_err(|e| ItineraryError::ValidationError(format!("Invalid bracket pattern: {}", e)))?,
            brace_regex: Regex::new(r"\{[\s\S]*\}")
                .map_err(|e| ItineraryError::ValidationError(format!("Invalid brace pattern: {}", e)))?,
            artifact_markers: DEFAULT_ARTIFACT_MARKERS.iter().map(|m| m.to_string()).collect(),
            array_keys: DEFAULT_ARRAY_KEYS.iter().map(|k| k.to_string()).collect(),
        })
    }

    pub fn with_artifact_markers(mut self, markers: Vec<String>) -> Self {
        self.artifact_markers = markers;
        self
    }

    pub fn with_array_keys(mut self, keys: Vec<String>) -> Self {
        self.array_keys = keys;
        self
    }

    /// Run the strategies in order; the first that produces rows wins.
    pub fn parse(&self, text: &str) -> Result<ParsedPayload, ItineraryError> {
        for strategy in ParseStrategy::ORDER {
            match self.attempt(strategy, text) {
                Some(payload) => {
                    let parsed = ParsedPayload { strategy, payload };
                    debug!(
                        strategy = strategy.name(),
                        rows = parsed.len(),
                        "Parse strategy matched"
                    );
                    return Ok(parsed);
                }
                None => debug!(strategy = strategy.name(), "Parse strategy did not match"),
            }
        }

        warn!(text_length = text.len(), "No parse strategy produced structured data");
        Err(ItineraryError::ParseError { raw: text.to_string() })
    }

    /// Read a single JSON object answer, either the whole text or the span
    /// from the first `{` to the last `}`. The payload holds one element.
    pub fn parse_object(&self, text: &str) -> Result<ParsedPayload, ItineraryError> {
        let direct = serde_json::from_str::<Value>(text.trim())
            .ok()
            .filter(Value::is_object)
            .map(|object| (ParseStrategy::DirectJson, object));

        let found = direct.or_else(|| {
            self.parse_brace_object(text)
                .map(|object| (ParseStrategy::BraceObject, object))
        });

        match found {
            Some((strategy, object)) => {
                debug!(strategy = strategy.name(), "Object answer matched");
                Ok(ParsedPayload { strategy, payload: Payload::Json(vec![object]) })
            }
            None => {
                warn!(text_length = text.len(), "No JSON object found in response");
                Err(ItineraryError::ParseError { raw: text.to_string() })
            }
        }
    }

    /// Try a single strategy.
    pub fn attempt(&self, strategy: ParseStrategy, text: &str) -> Option<Payload> {
        match strategy {
            ParseStrategy::DirectJson => self.parse_direct_json(text),
            ParseStrategy::BracketSubstring => self.parse_bracket_substring(text),
            ParseStrategy::PipeLines => self.parse_pipe_lines(text),
            ParseStrategy::BraceObject => self.parse_brace_object(text).map(|object| Payload::Json(vec![object])),
        }
    }

    fn parse_direct_json(&self, text: &str) -> Option<Payload> {
        let value: Value = serde_json::from_str(text.trim()).ok()?;
        self.array_from_value(value).map(Payload::Json)
    }

    fn parse_bracket_substring(&self, text: &str) -> Option<Payload> {
        let candidate = self.bracket_regex.find(text)?;
        let value: Value = serde_json::from_str(candidate.as_str()).ok()?;
        self.array_from_value(value).map(Payload::Json)
    }

    fn parse_brace_object(&self, text: &str) -> Option<Value> {
        let candidate = self.brace_regex.find(text)?;
        serde_json::from_str::<Value>(candidate.as_str())
            .ok()
            .filter(Value::is_object)
    }

    fn parse_pipe_lines(&self, text: &str) -> Option<Payload> {
        let rows: Vec<Vec<String>> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter(|line| !self.is_artifact(line))
            .filter(|line| line.contains('|'))
            .map(|line| line.split('|').map(|field| field.trim().to_string()).collect())
            .collect();

        // rows with blank fields still go to the normalizer so drops are counted,
        // but at least one line has to look like a record
        let has_record = rows
            .iter()
            .any(|fields| fields.len() >= 3 && fields[..3].iter().all(|f| !f.is_empty()));

        if has_record {
            Some(Payload::Lines(rows))
        } else {
            None
        }
    }

    fn is_artifact(&self, line: &str) -> bool {
        self.artifact_markers.iter().any(|marker| line.contains(marker.as_str()))
    }

    fn array_from_value(&self, value: Value) -> Option<Vec<Value>> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => self.array_keys.iter().find_map(|key| match map.remove(key.as_str()) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })?,
            _ => return None,
        };

        // a bare `[1]` footnote is not record data; let later strategies try
        if items.is_empty() || items.iter().any(Value::is_object) {
            Some(items)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parser() -> ResponseParser {
        ResponseParser::new().unwrap()
    }

    #[test]
    fn test_direct_json_array() {
        let parsed = parser().parse(r#"[{"name":"Hawa Mahal"}]"#).unwrap();
        assert_eq!(parsed.strategy, ParseStrategy::DirectJson);
        assert_eq!(parsed.payload, Payload::Json(vec![json!({"name": "Hawa Mahal"})]));
    }

    #[test]
    fn test_direct_json_object_with_known_key() {
        let parsed = parser()
            .parse(r#"{"places": [{"name": "Amber Fort"}, {"name": "City Palace"}]}"#)
            .unwrap();
        assert_eq!(parsed.strategy, ParseStrategy::DirectJson);
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_object_without_known_key_is_not_direct() {
        assert!(parser()
            .attempt(ParseStrategy::DirectJson, r#"{"answer": "Paris"}"#)
            .is_none());
    }

    #[test]
    fn test_bracket_substring_in_code_fence() {
        let text = "Sure!\n```json\n[{\"name\": \"Gateway of India\"}]\n```\nHave fun.";
        let parsed = parser().parse(text).unwrap();
        assert_eq!(parsed.strategy, ParseStrategy::BracketSubstring);
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_bracket_is_greedy_to_last_bracket() {
        let text = "Plan: [{\"tags\": [\"a\", \"b\"]}] and that is all";
        let parsed = parser().parse(text).unwrap();
        assert_eq!(parsed.payload, Payload::Json(vec![json!({"tags": ["a", "b"]})]));
    }

    #[test]
    fn test_pipe_lines_skip_artifacts_and_prose() {
        let text = "Here is your plan\n\nDay 1 | 9 AM | Visit Fort\n\\boxed{Day 1 | 1 PM | Lunch}\nDay 2 | undefined | x\nDay 2 | 10 AM | Beach Swimming | Relaxation\n";
        let parsed = parser().parse(text).unwrap();
        assert_eq!(parsed.strategy, ParseStrategy::PipeLines);
        assert_eq!(
            parsed.payload,
            Payload::Lines(vec![
                vec!["Day 1".to_string(), "9 AM".to_string(), "Visit Fort".to_string()],
                vec![
                    "Day 2".to_string(),
                    "10 AM".to_string(),
                    "Beach Swimming".to_string(),
                    "Relaxation".to_string()
                ],
            ])
        );
    }

    #[test]
    fn test_pipe_lines_need_one_complete_row() {
        assert!(parser().attempt(ParseStrategy::PipeLines, "a | b\n | | \n").is_none());
    }

    #[test]
    fn test_unparseable_text_keeps_raw() {
        let raw = "I cannot help with that request.";
        match parser().parse(raw) {
            Err(ItineraryError::ParseError { raw: kept }) => assert_eq!(kept, raw),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_broken_json_falls_through_to_parse_error() {
        assert!(parser().parse("[{\"name\": \"unterminated\"").is_err());
    }

    #[test]
    fn test_scalar_array_is_not_record_data() {
        assert!(parser().attempt(ParseStrategy::DirectJson, "[1, 2, 3]").is_none());
        assert!(parser()
            .attempt(ParseStrategy::BracketSubstring, "See note [2] for details")
            .is_none());
        assert_eq!(
            parser().attempt(ParseStrategy::DirectJson, "[]"),
            Some(Payload::Json(vec![]))
        );
    }

    #[test]
    fn test_footnote_falls_through_to_pipe_lines() {
        let text = "Based on local guides [1]\nDay 1 | 9 AM | Amber Fort\nDay 1 | 2 PM | Bazaar walk";
        let parsed = parser().parse(text).unwrap();
        assert_eq!(parsed.strategy, ParseStrategy::PipeLines);
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_object_answer_in_prose() {
        let text = "Here is the plan you asked for:\n{\"plan\": [], \"hotels\": [{\"name\": \"Taj\"}]}\nEnjoy!";
        let parsed = parser().parse_object(text).unwrap();
        assert_eq!(parsed.strategy, ParseStrategy::BraceObject);
        assert_eq!(
            parsed.payload,
            Payload::Json(vec![json!({"plan": [], "hotels": [{"name": "Taj"}]})])
        );

        let direct = parser().parse_object(r#"{"plan": []}"#).unwrap();
        assert_eq!(direct.strategy, ParseStrategy::DirectJson);
    }

    #[test]
    fn test_object_answer_required() {
        assert!(matches!(
            parser().parse_object("Sorry, no plan for those dates."),
            Err(ItineraryError::ParseError { .. })
        ));
        assert!(parser().parse_object("{ not json }").is_err());
        // never part of the array cascade
        assert!(!ParseStrategy::ORDER.contains(&ParseStrategy::BraceObject));
    }

    #[test]
    fn test_custom_markers() {
        let parser = parser().with_artifact_markers(vec!["SKIP".to_string()]);
        let parsed = parser.parse("Day 1 | 9 AM | Museum {free}\nSKIP | 1 PM | Lunch").unwrap();
        assert_eq!(parsed.len(), 1);
    }
}
