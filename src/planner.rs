//! Planner facade: prompt, request, extract, parse, normalize

use crate::client::CompletionClient;
use crate::config::PlannerConfig;
use crate::extract::extract_content;
use crate::normalize::{DroppedRecord, Normalized, Normalizer, Record};
use crate::parser::{ParseStrategy, ResponseParser};
use crate::prompts::{cities_prompt, itinerary_prompt, places_prompt, trip_plan_prompt};
use crate::session::{NoSession, SessionAccessor};
use crate::trip_plan::TripPlan;
use crate::{CityRecommendation, ItineraryEntry, ItineraryError, PlaceRecommendation};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Destination and travel dates for an itinerary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripRequest {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl TripRequest {
    /// Dates are `YYYY-MM-DD`; the end may not precede the start.
    pub fn new(destination: &str, start_date: &str, end_date: &str) -> Result<Self, ItineraryError> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(ItineraryError::ValidationError("destination must not be empty".to_string()));
        }

        let start_date = parse_date(start_date)?;
        let end_date = parse_date(end_date)?;
        if end_date < start_date {
            return Err(ItineraryError::DateError("End date cannot be before start date".to_string()));
        }

        Ok(Self {
            destination: destination.to_string(),
            start_date,
            end_date,
        })
    }

    /// Number of calendar days covered, both ends included.
    pub fn num_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

fn parse_date(date: &str) -> Result<NaiveDate, ItineraryError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| ItineraryError::DateError(format!("{} is not a YYYY-MM-DD date: {}", date, e)))
}

/// A generated itinerary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub trip: TripRequest,
    pub entries: Vec<ItineraryEntry>,
    pub dropped: Vec<DroppedRecord>,
    pub strategy: ParseStrategy,
}

impl Itinerary {
    pub fn from_normalized(trip: TripRequest, normalized: Normalized<ItineraryEntry>) -> Self {
        Self {
            trip,
            entries: normalized.records,
            dropped: normalized.dropped,
            strategy: normalized.strategy,
        }
    }

    /// Distinct day labels in first-seen order.
    pub fn days(&self) -> Vec<&str> {
        let mut days: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !days.contains(&entry.day.as_str()) {
                days.push(&entry.day);
            }
        }
        days
    }

    pub fn filter_day<'a>(&'a self, day: &'a str) -> impl Iterator<Item = &'a ItineraryEntry> + 'a {
        self.entries.iter().filter(move |entry| entry.day == day)
    }

    /// Plain-text copy of the plan, one `day | time | activity` line per entry.
    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("{} | {} | {}", entry.day, entry.time, entry.activity))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Completion client plus the parsing pipeline
pub struct TravelPlanner {
    client: CompletionClient,
    parser: ResponseParser,
    normalizer: Normalizer,
    session: Arc<dyn SessionAccessor>,
}

impl TravelPlanner {
    pub fn new(config: &PlannerConfig, session: Arc<dyn SessionAccessor>) -> Result<Self, ItineraryError> {
        Ok(Self {
            client: CompletionClient::new(config)?,
            parser: config.parser()?,
            normalizer: Normalizer::new(config.drop_policy),
            session,
        })
    }

    /// Planner with nobody signed in.
    pub fn from_config(config: &PlannerConfig) -> Result<Self, ItineraryError> {
        Self::new(config, Arc::new(NoSession))
    }

    #[instrument(level = "info", skip(self, trip), fields(destination = %trip.destination))]
    pub async fn plan_itinerary(&self, trip: &TripRequest) -> Result<Itinerary, ItineraryError> {
        let normalized = self.request::<ItineraryEntry>(&itinerary_prompt(trip)).await?;
        Ok(Itinerary::from_normalized(trip.clone(), normalized))
    }

    #[instrument(level = "info", skip(self))]
    pub async fn recommend_places(&self, query: &str) -> Result<Normalized<PlaceRecommendation>, ItineraryError> {
        self.request(&places_prompt(query)).await
    }

    #[instrument(level = "info", skip(self))]
    pub async fn recommend_cities(&self, query: &str) -> Result<Normalized<CityRecommendation>, ItineraryError> {
        self.request(&cities_prompt(query)).await
    }

    /// Days with morning/afternoon/evening slots plus hotels and transport.
    #[instrument(level = "info", skip(self, trip, preferences), fields(destination = %trip.destination))]
    pub async fn plan_trip(
        &self,
        trip: &TripRequest,
        preferences: Option<&str>,
    ) -> Result<Normalized<TripPlan>, ItineraryError> {
        let content = self.fetch_content(&trip_plan_prompt(trip, preferences)).await?;
        let parsed = self.parser.parse_object(&content)?;
        let normalized = self.normalizer.normalize::<TripPlan>(parsed)?;

        info!(
            days = normalized.records.first().map(|plan| plan.plan.len()).unwrap_or(0),
            dropped = normalized.dropped_count(),
            strategy = normalized.strategy.name(),
            "Trip plan normalized"
        );
        Ok(normalized)
    }

    async fn fetch_content(&self, prompt: &str) -> Result<String, ItineraryError> {
        let user = self.session.current().map(|session| session.uid);
        let data = self.client.complete(prompt, user.as_deref()).await?;
        extract_content(&data)
    }

    async fn request<R: Record>(&self, prompt: &str) -> Result<Normalized<R>, ItineraryError> {
        let content = self.fetch_content(prompt).await?;
        let parsed = self.parser.parse(&content)?;
        let normalized = self.normalizer.normalize::<R>(parsed)?;

        info!(
            kind = R::KIND,
            records = normalized.records.len(),
            dropped = normalized.dropped_count(),
            strategy = normalized.strategy.name(),
            "Response normalized"
        );
        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(day: &str, time: &str, activity: &str) -> ItineraryEntry {
        ItineraryEntry {
            day: day.to_string(),
            time: time.to_string(),
            activity: activity.to_string(),
            category: "Sightseeing".to_string(),
        }
    }

    fn itinerary() -> Itinerary {
        Itinerary {
            trip: TripRequest::new("Jaipur", "2025-11-02", "2025-11-03").unwrap(),
            entries: vec![
                entry("Day 1", "9 AM", "Amber Fort"),
                entry("Day 2", "10 AM", "City Palace"),
                entry("Day 1", "4 PM", "Bazaar walk"),
            ],
            dropped: Vec::new(),
            strategy: ParseStrategy::PipeLines,
        }
    }

    #[test]
    fn test_trip_request_validation() {
        let trip = TripRequest::new(" Jaipur ", "2025-11-02", "2025-11-04").unwrap();
        assert_eq!(trip.destination, "Jaipur");
        assert_eq!(trip.num_days(), 3);

        assert!(TripRequest::new("Jaipur", "2025-11-02", "2025-11-02").is_ok());
        assert!(matches!(
            TripRequest::new("Jaipur", "2025-11-05", "2025-11-02"),
            Err(ItineraryError::DateError(_))
        ));
        assert!(matches!(
            TripRequest::new("Jaipur", "02/11/2025", "2025-11-02"),
            Err(ItineraryError::DateError(_))
        ));
        assert!(TripRequest::new("  ", "2025-11-02", "2025-11-02").is_err());
    }

    #[test]
    fn test_days_in_first_seen_order() {
        assert_eq!(itinerary().days(), vec!["Day 1", "Day 2"]);
    }

    #[test]
    fn test_filter_day() {
        let plan = itinerary();
        let day_one: Vec<&str> = plan.filter_day("Day 1").map(|e| e.activity.as_str()).collect();
        assert_eq!(day_one, vec!["Amber Fort", "Bazaar walk"]);
    }

    #[test]
    fn test_to_text() {
        assert_eq!(
            itinerary().to_text(),
            "Day 1 | 9 AM | Amber Fort\nDay 2 | 10 AM | City Palace\nDay 1 | 4 PM | Bazaar walk"
        );
    }

    #[test]
    fn test_planner_needs_api_key() {
        assert!(matches!(
            TravelPlanner::from_config(&PlannerConfig::default()),
            Err(ItineraryError::ConfigError(_))
        ));
    }
}
