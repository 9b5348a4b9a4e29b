// src/mcp_server.rs

use rmcp::{
    ServerHandler, ServiceExt,
    model::{ServerCapabilities, ServerInfo},
    schemars, tool,
    transport::stdio,
};
use rust_itinerary::{
    decorate, extract_content_from_str, BudgetEstimate, BudgetTier, CityRecommendation, DropPolicy,
    ItineraryEntry, ItineraryError, Normalizer, PlaceRecommendation, PlannerConfig, TravelPlanner,
    TravellerType, TripPlan, TripRequest,
};
use serde::{Deserialize, Serialize};
use anyhow::Result;
use tracing::{info, warn, error, debug};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Travel planning MCP server
#[derive(Clone)]
pub struct ItineraryServer {
    config: Arc<PlannerConfig>,
}

impl ItineraryServer {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config: Arc::new(config) }
    }

    /// Initialize logging to file; stdout carries the MCP transport
    fn init_logging() -> Result<()> {
        let log_dir = PathBuf::from("logs");
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = tracing_appender::rolling::daily(&log_dir, "rust-itinerary-mcp.log");

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"))
            .add_directive("rust_itinerary=debug".parse()?);

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json()
            )
            .init();

        info!("Logging initialized - logs will be written to logs/rust-itinerary-mcp.log.*");
        Ok(())
    }

    fn planner(&self, drop_policy: Option<&str>) -> Result<TravelPlanner, ItineraryError> {
        let mut config = (*self.config).clone();
        if let Some(policy) = drop_policy {
            config.drop_policy = policy.parse::<DropPolicy>()?;
        }
        TravelPlanner::from_config(&config)
    }
}

/// Itinerary request parameters
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct PlanParams {
    #[schemars(description = "Destination city or region (e.g., Jaipur, Kerala)")]
    pub destination: String,
    #[schemars(description = "Start date in YYYY-MM-DD format")]
    pub start_date: String,
    #[schemars(description = "End date in YYYY-MM-DD format, not before the start date")]
    pub end_date: String,
    #[schemars(description = "Only return entries for this day label (e.g., 'Day 2')")]
    pub day: Option<String>,
    #[schemars(description = "Invalid record handling: silent, warn or strict (default: warn)")]
    pub drop_policy: Option<String>,
}

/// Structured trip plan parameters
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct TripPlanParams {
    #[schemars(description = "Destination city or region (e.g., Goa)")]
    pub destination: String,
    #[schemars(description = "Start date in YYYY-MM-DD format")]
    pub start_date: String,
    #[schemars(description = "End date in YYYY-MM-DD format, not before the start date")]
    pub end_date: String,
    #[schemars(description = "Free-text preferences (e.g., 'vegetarian food, prefer beach spots')")]
    pub preferences: Option<String>,
    #[schemars(description = "Who is travelling: solo, couple, family or friends (needed for the budget estimate)")]
    pub travellers: Option<String>,
    #[schemars(description = "Budget tier: budget, moderate or luxury (needed for the budget estimate)")]
    pub budget: Option<String>,
    #[schemars(description = "Invalid record handling: silent, warn or strict (default: warn)")]
    pub drop_policy: Option<String>,
}

/// Recommendation request parameters
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct RecommendParams {
    #[schemars(description = "Region or city to get recommendations for")]
    pub query: String,
    #[schemars(description = "Attach display-only rating, review count and image placeholder (places only)")]
    pub decorate: Option<bool>,
    #[schemars(description = "Invalid record handling: silent, warn or strict (default: warn)")]
    pub drop_policy: Option<String>,
}

/// City recommendation parameters
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct CityParams {
    #[schemars(description = "Region to get city recommendations for")]
    pub query: String,
    #[schemars(description = "Invalid record handling: silent, warn or strict (default: warn)")]
    pub drop_policy: Option<String>,
}

/// Offline normalization parameters
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct NormalizeParams {
    #[schemars(description = "Raw completion text, or a full provider response when envelope is true")]
    pub text: String,
    #[schemars(description = "Record kind: itinerary, places, cities or trip_plan (default: itinerary)")]
    pub kind: Option<String>,
    #[schemars(description = "Whether text is a full {choices:[{message:{content}}]} response")]
    pub envelope: Option<bool>,
    #[schemars(description = "Invalid record handling: silent, warn or strict (default: warn)")]
    pub drop_policy: Option<String>,
}

#[derive(Debug, Serialize)]
struct ToolResult<T: Serialize> {
    total: usize,
    dropped: usize,
    strategy: &'static str,
    records: T,
}

fn error_json(context: &str, e: &dyn std::fmt::Display) -> String {
    serde_json::json!({ "error": format!("{}: {}", context, e) }).to_string()
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| error_json("Failed to serialize results", &e))
}

/// Budget estimate when both options are given; neither means no estimate.
fn budget_estimate(
    trip: &TripRequest,
    travellers: Option<&str>,
    budget: Option<&str>,
) -> Result<Option<BudgetEstimate>, ItineraryError> {
    match (travellers, budget) {
        (Some(travellers), Some(budget)) => Ok(Some(BudgetEstimate::new(
            trip.num_days(),
            travellers.parse::<TravellerType>()?,
            budget.parse::<BudgetTier>()?,
        )?)),
        (None, None) => Ok(None),
        _ => Err(ItineraryError::ValidationError(
            "travellers and budget must be given together".to_string(),
        )),
    }
}

#[tool(tool_box)]
impl ItineraryServer {
    /// Day-by-day itinerary for a destination and date range
    #[tool(description = "Create a brief day-by-day travel itinerary (at most 3 activities per day) for a destination between two dates. Returns entries with day, time, activity and category.")]
    async fn plan_itinerary(
        &self,
        #[tool(aggr)] params: PlanParams,
    ) -> String {
        info!(
            destination = params.destination,
            start_date = params.start_date,
            end_date = params.end_date,
            day = params.day.as_deref(),
            "Itinerary request received"
        );

        let trip = match TripRequest::new(&params.destination, &params.start_date, &params.end_date) {
            Ok(trip) => trip,
            Err(e) => {
                warn!("Invalid trip request: {}", e);
                return error_json("Invalid trip request", &e);
            }
        };

        let planner = match self.planner(params.drop_policy.as_deref()) {
            Ok(planner) => planner,
            Err(e) => {
                error!("Error creating planner: {}", e);
                return error_json("Error creating planner", &e);
            }
        };

        match planner.plan_itinerary(&trip).await {
            Ok(itinerary) => {
                info!(
                    entries = itinerary.entries.len(),
                    dropped = itinerary.dropped.len(),
                    "Itinerary generated successfully"
                );
                let entries: Vec<&ItineraryEntry> = match params.day.as_deref() {
                    Some(day) => itinerary.filter_day(day).collect(),
                    None => itinerary.entries.iter().collect(),
                };
                to_json(&serde_json::json!({
                    "destination": &itinerary.trip.destination,
                    "days": itinerary.days(),
                    "dropped": itinerary.dropped.len(),
                    "entries": entries,
                    "text": itinerary.to_text(),
                }))
            }
            Err(e) => {
                error!("Itinerary generation failed: {}", e);
                error_json("Itinerary generation failed", &e)
            }
        }
    }

    /// Days split into morning/afternoon/evening, with hotels and transport
    #[tool(description = "Create a structured trip plan: days with morning, afternoon and evening activities (time, place, description), 3 hotels and 3 local transport options, prices in rupees. Optionally estimates the budget from traveller type and budget tier.")]
    async fn plan_trip(
        &self,
        #[tool(aggr)] params: TripPlanParams,
    ) -> String {
        info!(
            destination = params.destination,
            start_date = params.start_date,
            end_date = params.end_date,
            "Trip plan request received"
        );

        let trip = match TripRequest::new(&params.destination, &params.start_date, &params.end_date) {
            Ok(trip) => trip,
            Err(e) => {
                warn!("Invalid trip request: {}", e);
                return error_json("Invalid trip request", &e);
            }
        };

        let budget = match budget_estimate(&trip, params.travellers.as_deref(), params.budget.as_deref()) {
            Ok(budget) => budget,
            Err(e) => {
                warn!("Invalid budget options: {}", e);
                return error_json("Invalid budget options", &e);
            }
        };

        let planner = match self.planner(params.drop_policy.as_deref()) {
            Ok(planner) => planner,
            Err(e) => {
                error!("Error creating planner: {}", e);
                return error_json("Error creating planner", &e);
            }
        };

        match planner.plan_trip(&trip, params.preferences.as_deref()).await {
            Ok(plan) => {
                info!(dropped = plan.dropped_count(), "Trip plan generated successfully");
                to_json(&serde_json::json!({
                    "destination": &trip.destination,
                    "days": trip.num_days(),
                    "budget": budget.map(|b| serde_json::json!({ "estimate": b, "display": b.to_string() })),
                    "dropped": plan.dropped_count(),
                    "plan": plan.records.first(),
                }))
            }
            Err(e) => {
                error!("Trip plan generation failed: {}", e);
                error_json("Trip plan generation failed", &e)
            }
        }
    }

    /// Must-visit places for a region
    #[tool(description = "Recommend 5 must-visit places for a region with description, best time to visit and category (Historical, Natural, Cultural, Entertainment, Culinary).")]
    async fn recommend_places(
        &self,
        #[tool(aggr)] params: RecommendParams,
    ) -> String {
        info!(query = params.query, "Place recommendation request received");

        let planner = match self.planner(params.drop_policy.as_deref()) {
            Ok(planner) => planner,
            Err(e) => {
                error!("Error creating planner: {}", e);
                return error_json("Error creating planner", &e);
            }
        };

        match planner.recommend_places(&params.query).await {
            Ok(places) => {
                info!(places = places.records.len(), "Place recommendations completed");
                let total = places.records.len();
                let dropped = places.dropped_count();
                let strategy = places.strategy.name();
                if params.decorate.unwrap_or(false) {
                    let records = decorate(places.records, &mut rand::thread_rng());
                    to_json(&ToolResult { total, dropped, strategy, records })
                } else {
                    to_json(&ToolResult { total, dropped, strategy, records: places.records })
                }
            }
            Err(e) => {
                error!("Place recommendation failed: {}", e);
                error_json("Place recommendation failed", &e)
            }
        }
    }

    /// Cities with their must-visit places
    #[tool(description = "Recommend 3 cities to visit in or near a region, each with 3 must-visit places and short descriptions.")]
    async fn recommend_cities(
        &self,
        #[tool(aggr)] params: CityParams,
    ) -> String {
        info!(query = params.query, "City recommendation request received");

        let planner = match self.planner(params.drop_policy.as_deref()) {
            Ok(planner) => planner,
            Err(e) => {
                error!("Error creating planner: {}", e);
                return error_json("Error creating planner", &e);
            }
        };

        match planner.recommend_cities(&params.query).await {
            Ok(cities) => {
                info!(cities = cities.records.len(), "City recommendations completed");
                to_json(&ToolResult {
                    total: cities.records.len(),
                    dropped: cities.dropped_count(),
                    strategy: cities.strategy.name(),
                    records: cities.records,
                })
            }
            Err(e) => {
                error!("City recommendation failed: {}", e);
                error_json("City recommendation failed", &e)
            }
        }
    }

    /// Normalize text that was already obtained from a model
    #[tool(description = "Parse and normalize an LLM travel answer (JSON array, JSON wrapped in prose, or 'Day | Time | Activity' lines) into structured records without calling any provider.")]
    async fn normalize_response(
        &self,
        #[tool(aggr)] params: NormalizeParams,
    ) -> String {
        debug!(
            text_length = params.text.len(),
            kind = params.kind.as_deref().unwrap_or("itinerary"),
            envelope = params.envelope.unwrap_or(false),
            "Normalize request received"
        );

        let text = if params.envelope.unwrap_or(false) {
            match extract_content_from_str(&params.text) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Envelope extraction failed: {}", e);
                    return error_json("Envelope extraction failed", &e);
                }
            }
        } else {
            params.text.clone()
        };

        let mut config = (*self.config).clone();
        if let Some(policy) = params.drop_policy.as_deref() {
            match policy.parse::<DropPolicy>() {
                Ok(policy) => config.drop_policy = policy,
                Err(e) => return error_json("Invalid drop policy", &e),
            }
        }

        let kind = params.kind.as_deref().unwrap_or("itinerary");
        let parsed = match config.parser().and_then(|parser| {
            if kind == "trip_plan" {
                parser.parse_object(&text)
            } else {
                parser.parse(&text)
            }
        }) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Could not parse response: {}", e);
                return error_json("Could not parse response", &e);
            }
        };
        let normalizer = Normalizer::new(config.drop_policy);

        let result = match kind {
            "itinerary" => normalizer.normalize::<ItineraryEntry>(parsed).map(|n| to_json(&n)),
            "places" => normalizer.normalize::<PlaceRecommendation>(parsed).map(|n| to_json(&n)),
            "cities" => normalizer.normalize::<CityRecommendation>(parsed).map(|n| to_json(&n)),
            "trip_plan" => normalizer.normalize::<TripPlan>(parsed).map(|n| to_json(&n)),
            other => {
                warn!(kind = other, "Unknown record kind");
                return serde_json::json!({
                    "error": format!("Unknown record kind '{}': use itinerary, places, cities or trip_plan", other)
                }).to_string();
            }
        };

        result.unwrap_or_else(|e| {
            error!("Normalization failed: {}", e);
            error_json("Normalization failed", &e)
        })
    }
}

#[tool(tool_box)]
impl ServerHandler for ItineraryServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("A travel planning server. Generates day-by-day itineraries, structured trip plans with hotels and transport, place and city recommendations through an LLM completion provider, and normalizes raw LLM travel answers into structured JSON records.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging before anything else
    if let Err(e) = ItineraryServer::init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let config_path = std::env::var("ITINERARY_CONFIG").unwrap_or_else(|_| "planner.json".to_string());
    let config = PlannerConfig::load(Path::new(&config_path))?.with_env_overrides();
    if config.require_api_key().is_err() {
        warn!("No API key configured; only normalize_response will work");
    }

    info!(model = %config.model, "Starting MCP Itinerary Server");

    let server = ItineraryServer::new(config);
    let transport = stdio();

    // SDK handles initialization, tool discovery, and message routing
    let service = server.serve(transport).await?;

    info!("MCP service started, waiting for requests");

    service.waiting().await?;

    info!("MCP service shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(schema: schemars::schema::RootSchema) -> serde_json::Value {
        serde_json::to_value(schema).unwrap()["properties"].clone()
    }

    #[test]
    fn test_city_tool_does_not_advertise_decorate() {
        let cities = properties(schemars::schema_for!(CityParams));
        assert!(cities.get("query").is_some());
        assert!(cities.get("decorate").is_none());

        let places = properties(schemars::schema_for!(RecommendParams));
        assert!(places.get("decorate").is_some());
    }

    #[test]
    fn test_budget_estimate_options() {
        let trip = TripRequest::new("Goa", "2025-12-20", "2025-12-22").unwrap();

        let estimate = budget_estimate(&trip, Some("friends"), Some("budget")).unwrap().unwrap();
        assert_eq!(estimate.total, 1000 * 3 * 3);
        assert_eq!(budget_estimate(&trip, None, None).unwrap(), None);
        assert!(budget_estimate(&trip, Some("solo"), None).is_err());
        assert!(budget_estimate(&trip, Some("crowd"), Some("luxury")).is_err());
    }

    #[test]
    fn test_planner_rejects_unknown_drop_policy() {
        let server = ItineraryServer::new(PlannerConfig {
            api_key: "sk-test".to_string(),
            ..PlannerConfig::default()
        });
        assert!(server.planner(Some("strict")).is_ok());
        assert!(matches!(server.planner(Some("loud")), Err(ItineraryError::ConfigError(_))));
    }
}
