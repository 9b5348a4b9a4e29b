//! # Rust Itinerary Library
//!
//! Turns the loosely formatted text an LLM completion endpoint returns for travel
//! prompts into validated, strongly typed records: day-by-day itinerary entries,
//! place recommendations, city recommendations and structured trip plans.
//!
//! The pipeline is split into small stages that can be used on their own:
//! envelope extraction ([`extract`]), format detection ([`parser`]), record
//! normalization ([`normalize`]) and display decoration ([`decorate`]).
//! [`TravelPlanner`] wires them to an OpenAI-compatible completion provider.

pub mod client;
pub mod config;
pub mod decorate;
pub mod extract;
pub mod normalize;
pub mod parser;
pub mod planner;
pub mod prompts;
pub mod seats;
pub mod session;
pub mod trip_plan;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Re-export main types for convenience
pub use client::CompletionClient;
pub use config::PlannerConfig;
pub use decorate::{category_style, decorate, CategoryStyle, Decorated};
pub use extract::{extract_content, extract_content_from_str};
pub use normalize::{DropPolicy, DroppedRecord, Normalized, Normalizer, Record};
pub use parser::{ParseStrategy, ParsedPayload, Payload, ResponseParser};
pub use planner::{Itinerary, TravelPlanner, TripRequest};
pub use seats::{SeatCell, SeatLayout, SeatMap, SeatSelection};
pub use session::{NoSession, Session, SessionAccessor, StaticSession};
pub use trip_plan::{
    Activity, BudgetEstimate, BudgetTier, DayPlan, Hotel, TransportOption, TravellerType, TripPlan,
};

/// Error types for the itinerary library
#[derive(Error, Debug)]
pub enum ItineraryError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Completion provider error: {0}")]
    ApiError(String),

    #[error("Unexpected response envelope: {0}")]
    ExtractionError(String),

    #[error("Could not parse response ({} bytes of text)", .raw.len())]
    ParseError { raw: String },

    #[error("Invalid record: {0}")]
    ValidationError(String),

    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid trip dates: {0}")]
    DateError(String),

    #[error("Invalid seat layout: {0}")]
    LayoutError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ItineraryError {
    /// Whether the caller may offer a manual "Try Again" for this failure.
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ItineraryError::HttpError(_)
                | ItineraryError::ApiError(_)
                | ItineraryError::ExtractionError(_)
                | ItineraryError::ParseError { .. }
        )
    }
}

pub const DEFAULT_ITINERARY_CATEGORY: &str = "Sightseeing";
pub const DEFAULT_PLACE_CATEGORY: &str = "General";

/// One timed activity of a day-by-day plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryEntry {
    pub day: String,      // free label, e.g. "Day 1"
    pub time: String,     // free form, e.g. "9 AM"
    pub activity: String,
    pub category: String, // defaults to "Sightseeing"
}

impl ItineraryEntry {
    /// Recognised category, if the label is one of the known ones.
    pub fn known_category(&self) -> Option<ItineraryCategory> {
        self.category.parse().ok()
    }
}

/// A must-visit place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecommendation {
    pub name: String,
    pub description: String,
    pub best_time_to_visit: Option<String>,
    pub category: String,
}

impl PlaceRecommendation {
    pub fn known_category(&self) -> Option<PlaceCategory> {
        self.category.parse().ok()
    }
}

/// A recommended city together with its must-visit places
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRecommendation {
    pub city: String,
    pub places: Vec<CityPlace>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityPlace {
    pub name: String,
    pub description: String,
}

/// Known itinerary activity categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItineraryCategory {
    Food,
    Sightseeing,
    Nature,
    Culture,
    Adventure,
    Shopping,
    Relaxation,
}

impl ItineraryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItineraryCategory::Food => "Food",
            ItineraryCategory::Sightseeing => "Sightseeing",
            ItineraryCategory::Nature => "Nature",
            ItineraryCategory::Culture => "Culture",
            ItineraryCategory::Adventure => "Adventure",
            ItineraryCategory::Shopping => "Shopping",
            ItineraryCategory::Relaxation => "Relaxation",
        }
    }
}

impl fmt::Display for ItineraryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItineraryCategory {
    type Err = ItineraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "food" => Ok(ItineraryCategory::Food),
            "sightseeing" => Ok(ItineraryCategory::Sightseeing),
            "nature" => Ok(ItineraryCategory::Nature),
            "culture" => Ok(ItineraryCategory::Culture),
            "adventure" => Ok(ItineraryCategory::Adventure),
            "shopping" => Ok(ItineraryCategory::Shopping),
            "relaxation" => Ok(ItineraryCategory::Relaxation),
            _ => Err(ItineraryError::ValidationError(format!("Unknown itinerary category: {}", s))),
        }
    }
}

/// Known place categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceCategory {
    Historical,
    Natural,
    Cultural,
    Entertainment,
    Culinary,
}

impl PlaceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceCategory::Historical => "Historical",
            PlaceCategory::Natural => "Natural",
            PlaceCategory::Cultural => "Cultural",
            PlaceCategory::Entertainment => "Entertainment",
            PlaceCategory::Culinary => "Culinary",
        }
    }
}

impl fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaceCategory {
    type Err = ItineraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "historical" => Ok(PlaceCategory::Historical),
            "natural" => Ok(PlaceCategory::Natural),
            "cultural" => Ok(PlaceCategory::Cultural),
            "entertainment" => Ok(PlaceCategory::Entertainment),
            "culinary" => Ok(PlaceCategory::Culinary),
            _ => Err(ItineraryError::ValidationError(format!("Unknown place category: {}", s))),
        }
    }
}

/// Parse and normalize raw completion text without any network access.
///
/// # Example
/// ```rust
/// use rust_itinerary::{normalize_response, DropPolicy, ItineraryEntry};
///
/// let text = "Day 1 | 9 AM | Visit Central Park\nDay 1 | 2 PM | Shopping at Mall";
/// let result = normalize_response::<ItineraryEntry>(text, DropPolicy::Warn).unwrap();
/// assert_eq!(result.records.len(), 2);
/// assert_eq!(result.records[0].category, "Sightseeing");
/// ```
pub fn normalize_response<R: Record>(text: &str, policy: DropPolicy) -> Result<Normalized<R>, ItineraryError> {
    let parser = ResponseParser::new()?;
    let parsed = parser.parse(text)?;
    Normalizer::new(policy).normalize(parsed)
}

/// Same as [`normalize_response`], starting from a full provider envelope
/// (`{"choices":[{"message":{"content": ...}}]}`).
pub fn normalize_envelope<R: Record>(envelope: &Value, policy: DropPolicy) -> Result<Normalized<R>, ItineraryError> {
    let content = extract_content(envelope)?;
    normalize_response(&content, policy)
}

/// Read a structured trip plan (`plan`, `hotels`, `transport`) out of a
/// single JSON object answer, which may be wrapped in prose.
///
/// # Example
/// ```rust
/// use rust_itinerary::{normalize_trip_plan, DropPolicy};
///
/// let text = r#"Your plan: {"plan": [{"title": "Day 1", "morning": [{"time": "9 AM", "place": "Baga Beach"}]}], "hotels": "n/a"}"#;
/// let result = normalize_trip_plan(text, DropPolicy::Warn).unwrap();
/// assert_eq!(result.records[0].plan[0].morning[0].place, "Baga Beach");
/// assert!(result.records[0].hotels.is_empty());
/// ```
pub fn normalize_trip_plan(text: &str, policy: DropPolicy) -> Result<Normalized<TripPlan>, ItineraryError> {
    let parser = ResponseParser::new()?;
    let parsed = parser.parse_object(text)?;
    Normalizer::new(policy).normalize(parsed)
}

/// Generate a trip itinerary with configuration taken from the environment.
///
/// # Example
/// ```rust,no_run
/// use rust_itinerary::{plan_itinerary, TripRequest};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let trip = TripRequest::new("Jaipur", "2025-11-02", "2025-11-04")?;
/// let itinerary = plan_itinerary(&trip).await?;
/// println!("{}", itinerary.to_text());
/// # Ok(())
/// # }
/// ```
pub async fn plan_itinerary(trip: &TripRequest) -> Result<Itinerary, ItineraryError> {
    let config = PlannerConfig::default().with_env_overrides();
    let planner = TravelPlanner::from_config(&config)?;
    planner.plan_itinerary(trip).await
}

/// Recommend must-visit places for a query, configuration from the environment.
pub async fn recommend_places(query: &str) -> Result<Normalized<PlaceRecommendation>, ItineraryError> {
    let config = PlannerConfig::default().with_env_overrides();
    let planner = TravelPlanner::from_config(&config)?;
    planner.recommend_places(query).await
}
