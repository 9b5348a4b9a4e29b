//! Record normalization
//!
//! Maps the loosely typed rows coming out of the parser onto fixed-shape
//! records. Strings are trimmed, missing categories get the record type's
//! default, and rows missing a required field are dropped.

use crate::parser::{ParseStrategy, ParsedPayload, Payload};
use crate::{
    CityPlace, CityRecommendation, ItineraryEntry, ItineraryError, PlaceRecommendation,
    DEFAULT_ITINERARY_CATEGORY, DEFAULT_PLACE_CATEGORY,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::{debug, warn};

/// A record type the normalizer can build
pub trait Record: Sized {
    /// Human readable kind used in logs and error messages.
    const KIND: &'static str;

    /// Build from one element of a JSON array.
    fn from_json(value: &Value) -> Result<Self, String>;

    /// Build from the trimmed fields of one pipe-delimited line.
    fn from_fields(fields: &[String]) -> Result<Self, String>;
}

/// What to do with a row that fails validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPolicy {
    /// Drop without a trace in the logs.
    Silent,
    /// Drop and log a warning per row.
    #[default]
    Warn,
    /// Fail the whole response on the first bad row.
    Strict,
}

impl FromStr for DropPolicy {
    type Err = ItineraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" => Ok(DropPolicy::Silent),
            "warn" => Ok(DropPolicy::Warn),
            "strict" => Ok(DropPolicy::Strict),
            _ => Err(ItineraryError::ConfigError(format!("Invalid drop policy: {}", s))),
        }
    }
}

/// A row that was left out of the output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedRecord {
    pub index: usize, // position in the parsed payload
    pub reason: String,
}

/// Normalized records plus what had to be dropped on the way
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Normalized<R> {
    pub records: Vec<R>,
    pub dropped: Vec<DroppedRecord>,
    pub strategy: ParseStrategy,
}

impl<R> Normalized<R> {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    pub fn is_complete(&self) -> bool {
        self.dropped.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    policy: DropPolicy,
}

impl Normalizer {
    pub fn new(policy: DropPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DropPolicy {
        self.policy
    }

    /// Normalize every row of a parsed payload, preserving source order.
    pub fn normalize<R: Record>(&self, parsed: ParsedPayload) -> Result<Normalized<R>, ItineraryError> {
        let attempts: Vec<Result<R, String>> = match &parsed.payload {
            Payload::Json(items) => items.iter().map(R::from_json).collect(),
            Payload::Lines(rows) => rows.iter().map(|fields| R::from_fields(fields)).collect(),
        };

        let mut records = Vec::with_capacity(attempts.len());
        let mut dropped = Vec::new();

        for (index, attempt) in attempts.into_iter().enumerate() {
            match attempt {
                Ok(record) => records.push(record),
                Err(reason) => {
                    match self.policy {
                        DropPolicy::Strict => {
                            return Err(ItineraryError::ValidationError(format!(
                                "{} #{}: {}",
                                R::KIND,
                                index,
                                reason
                            )));
                        }
                        DropPolicy::Warn => {
                            warn!(kind = R::KIND, index, reason = %reason, "Dropping invalid record");
                        }
                        DropPolicy::Silent => {}
                    }
                    dropped.push(DroppedRecord { index, reason });
                }
            }
        }

        debug!(
            kind = R::KIND,
            strategy = parsed.strategy.name(),
            kept = records.len(),
            dropped = dropped.len(),
            "Normalization completed"
        );

        Ok(Normalized {
            records,
            dropped,
            strategy: parsed.strategy,
        })
    }
}

impl Record for ItineraryEntry {
    const KIND: &'static str = "itinerary entry";

    fn from_json(value: &Value) -> Result<Self, String> {
        let object = as_object(value)?;
        Ok(ItineraryEntry {
            day: required(object, &["day"])?,
            time: required(object, &["time"])?,
            activity: required(object, &["activity", "description"])?,
            category: optional(object, &["category"])
                .unwrap_or_else(|| DEFAULT_ITINERARY_CATEGORY.to_string()),
        })
    }

    fn from_fields(fields: &[String]) -> Result<Self, String> {
        let field = |i: usize, name: &str| -> Result<String, String> {
            fields
                .get(i)
                .map(|f| f.trim())
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .ok_or_else(|| format!("missing {}", name))
        };

        Ok(ItineraryEntry {
            day: field(0, "day")?,
            time: field(1, "time")?,
            activity: field(2, "activity")?,
            category: field(3, "category").unwrap_or_else(|_| DEFAULT_ITINERARY_CATEGORY.to_string()),
        })
    }
}

impl Record for PlaceRecommendation {
    const KIND: &'static str = "place recommendation";

    fn from_json(value: &Value) -> Result<Self, String> {
        let object = as_object(value)?;
        Ok(PlaceRecommendation {
            name: required(object, &["name"])?,
            description: required(object, &["description"])?,
            best_time_to_visit: optional(object, &["bestTimeToVisit", "best_time_to_visit"]),
            category: optional(object, &["category"]).unwrap_or_else(|| DEFAULT_PLACE_CATEGORY.to_string()),
        })
    }

    fn from_fields(_fields: &[String]) -> Result<Self, String> {
        Err("line records carry no place fields".to_string())
    }
}

impl Record for CityRecommendation {
    const KIND: &'static str = "city recommendation";

    fn from_json(value: &Value) -> Result<Self, String> {
        let object = as_object(value)?;
        let city = required(object, &["city", "name"])?;

        let places = match object.get("places") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match city_place(item) {
                    Ok(place) => Some(place),
                    Err(reason) => {
                        debug!(city = %city, reason = %reason, "Dropping nested place");
                        None
                    }
                })
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err("places is not an array".to_string()),
        };

        Ok(CityRecommendation { city, places })
    }

    fn from_fields(_fields: &[String]) -> Result<Self, String> {
        Err("line records carry no city fields".to_string())
    }
}

fn city_place(value: &Value) -> Result<CityPlace, String> {
    let object = as_object(value)?;
    Ok(CityPlace {
        name: required(object, &["name"])?,
        description: required(object, &["description"])?,
    })
}

pub(crate) fn as_object(value: &Value) -> Result<&Map<String, Value>, String> {
    value
        .as_object()
        .ok_or_else(|| format!("expected an object, found {}", json_kind(value)))
}

/// First of `keys` holding a non-empty string (or number), trimmed.
pub(crate) fn optional(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.get(*key) {
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

pub(crate) fn required(object: &Map<String, Value>, keys: &[&str]) -> Result<String, String> {
    optional(object, keys).ok_or_else(|| format!("missing {}", keys[0]))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn json_payload(items: Vec<Value>) -> ParsedPayload {
        ParsedPayload {
            strategy: ParseStrategy::DirectJson,
            payload: Payload::Json(items),
        }
    }

    fn line_payload(rows: &[&[&str]]) -> ParsedPayload {
        ParsedPayload {
            strategy: ParseStrategy::PipeLines,
            payload: Payload::Lines(
                rows.iter()
                    .map(|row| row.iter().map(|f| f.to_string()).collect())
                    .collect(),
            ),
        }
    }

    #[test]
    fn test_itinerary_from_lines_defaults_category() {
        let normalized: Normalized<ItineraryEntry> = Normalizer::default()
            .normalize(line_payload(&[
                &["Day 1", "9 AM", "Visit Fort"],
                &["Day 1", "1 PM", "Thali lunch", " Food "],
            ]))
            .unwrap();

        assert_eq!(normalized.records[0].category, "Sightseeing");
        assert_eq!(normalized.records[1].category, "Food");
        assert!(normalized.is_complete());
    }

    #[test]
    fn test_incomplete_line_is_dropped_not_defaulted() {
        let normalized: Normalized<ItineraryEntry> = Normalizer::new(DropPolicy::Silent)
            .normalize(line_payload(&[
                &["Day 1", "", "Visit Fort"],
                &["Day 2", "10 AM", "Beach"],
            ]))
            .unwrap();

        assert_eq!(normalized.records.len(), 1);
        assert_eq!(normalized.records[0].day, "Day 2");
        assert_eq!(
            normalized.dropped,
            vec![DroppedRecord { index: 0, reason: "missing time".to_string() }]
        );
    }

    #[test]
    fn test_strict_policy_fails_on_first_bad_record() {
        let result: Result<Normalized<PlaceRecommendation>, _> = Normalizer::new(DropPolicy::Strict)
            .normalize(json_payload(vec![
                json!({"name": "Qutub Minar", "description": "Minaret"}),
                json!({"name": "   ", "description": "Nameless"}),
            ]));

        match result {
            Err(ItineraryError::ValidationError(message)) => {
                assert_eq!(message, "place recommendation #1: missing name");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_place_fields_trimmed_and_defaulted() {
        let normalized: Normalized<PlaceRecommendation> = Normalizer::default()
            .normalize(json_payload(vec![json!({
                "name": "  Lotus Temple ",
                "description": " Bahai house of worship",
                "best_time_to_visit": "  ",
            })]))
            .unwrap();

        let place = &normalized.records[0];
        assert_eq!(place.name, "Lotus Temple");
        assert_eq!(place.description, "Bahai house of worship");
        assert_eq!(place.best_time_to_visit, None);
        assert_eq!(place.category, "General");
    }

    #[test]
    fn test_unknown_place_category_preserved() {
        let normalized: Normalized<PlaceRecommendation> = Normalizer::default()
            .normalize(json_payload(vec![json!({
                "name": "Golden Temple",
                "description": "Sikh shrine",
                "category": "Spiritual"
            })]))
            .unwrap();
        assert_eq!(normalized.records[0].category, "Spiritual");
        assert_eq!(normalized.records[0].known_category(), None);
    }

    #[test]
    fn test_numeric_day_becomes_label() {
        let normalized: Normalized<ItineraryEntry> = Normalizer::default()
            .normalize(json_payload(vec![json!({"day": 3, "time": "8 AM", "activity": "Sunrise hike", "category": "Nature"})]))
            .unwrap();
        assert_eq!(normalized.records[0].day, "3");
    }

    #[test]
    fn test_city_with_nested_places() {
        let normalized: Normalized<CityRecommendation> = Normalizer::default()
            .normalize(json_payload(vec![json!({
                "city": "Udaipur",
                "places": [
                    {"name": "City Palace", "description": "Lakeside palace"},
                    {"name": "", "description": "dropped"}
                ]
            })]))
            .unwrap();

        let city = &normalized.records[0];
        assert_eq!(city.city, "Udaipur");
        assert_eq!(city.places.len(), 1);
        assert_eq!(city.places[0].name, "City Palace");
    }

    #[test]
    fn test_line_payload_cannot_become_places() {
        let normalized: Normalized<PlaceRecommendation> = Normalizer::new(DropPolicy::Silent)
            .normalize(line_payload(&[&["Day 1", "9 AM", "Fort"]]))
            .unwrap();
        assert!(normalized.records.is_empty());
        assert_eq!(normalized.dropped_count(), 1);
    }

    #[test]
    fn test_non_object_items_dropped() {
        let normalized: Normalized<ItineraryEntry> = Normalizer::new(DropPolicy::Warn)
            .normalize(json_payload(vec![json!("Day 1 9 AM"), json!(null)]))
            .unwrap();
        assert!(normalized.records.is_empty());
        assert_eq!(normalized.dropped[0].reason, "expected an object, found a string");
        assert_eq!(normalized.dropped[1].reason, "expected an object, found null");
    }

    #[test]
    fn test_drop_policy_parsing() {
        assert_eq!("STRICT".parse::<DropPolicy>().unwrap(), DropPolicy::Strict);
        assert_eq!(DropPolicy::default(), DropPolicy::Warn);
        assert!("loud".parse::<DropPolicy>().is_err());
    }
}
