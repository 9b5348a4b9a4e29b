//! Structured trip plans
//!
//! A richer answer than the line itinerary: one JSON object with a `plan`
//! array of days split into morning, afternoon and evening slots, plus
//! `hotels` and `transport` suggestions. Sections that are missing or not
//! arrays read as empty; entries inside a section are dropped one by one.

use crate::normalize::{as_object, optional, required, Record};
use crate::ItineraryError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const SECTIONS: [&str; 3] = ["plan", "hotels", "transport"];

/// One activity inside a day slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub time: Option<String>,
    pub place: String,
    pub description: Option<String>,
}

/// A day of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub title: String, // e.g. "Day 1"
    pub morning: Vec<Activity>,
    pub afternoon: Vec<Activity>,
    pub evening: Vec<Activity>,
}

impl DayPlan {
    /// Slots in the order a day is read.
    pub fn slots(&self) -> [(&'static str, &[Activity]); 3] {
        [
            ("morning", &self.morning),
            ("afternoon", &self.afternoon),
            ("evening", &self.evening),
        ]
    }

    pub fn activity_count(&self) -> usize {
        self.morning.len() + self.afternoon.len() + self.evening.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub name: String,
    pub address: Option<String>,
    pub price_range: Option<String>,
    pub rating: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Local transport suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportOption {
    #[serde(rename = "type")]
    pub kind: String, // e.g. "Taxi", "Scooter rental"
    pub provider: Option<String>,
    pub price_per_day: Option<String>,
    pub contact: Option<String>,
}

/// Days, hotels and transport read out of one object answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripPlan {
    pub plan: Vec<DayPlan>,
    pub hotels: Vec<Hotel>,
    pub transport: Vec<TransportOption>,
}

impl TripPlan {
    pub fn is_empty(&self) -> bool {
        self.plan.is_empty() && self.hotels.is_empty() && self.transport.is_empty()
    }

    pub fn activity_count(&self) -> usize {
        self.plan.iter().map(DayPlan::activity_count).sum()
    }
}

impl Record for TripPlan {
    const KIND: &'static str = "trip plan";

    fn from_json(value: &Value) -> Result<Self, String> {
        let object = as_object(value)?;
        if !SECTIONS.iter().any(|key| object.contains_key(*key)) {
            return Err("no plan, hotels or transport section".to_string());
        }

        Ok(TripPlan {
            plan: section(object, "plan", day_plan),
            hotels: section(object, "hotels", hotel),
            transport: section(object, "transport", transport_option),
        })
    }

    fn from_fields(_fields: &[String]) -> Result<Self, String> {
        Err("line records carry no trip plan fields".to_string())
    }
}

/// Entries of an array section; anything else reads as empty.
fn section<T>(
    object: &Map<String, Value>,
    key: &str,
    read: fn(&Value) -> Result<T, String>,
) -> Vec<T> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match read(item) {
                Ok(entry) => Some(entry),
                Err(reason) => {
                    debug!(section = key, index, reason = %reason, "Dropping trip plan entry");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn day_plan(value: &Value) -> Result<DayPlan, String> {
    let object = as_object(value)?;
    Ok(DayPlan {
        title: required(object, &["title", "day"])?,
        morning: section(object, "morning", activity),
        afternoon: section(object, "afternoon", activity),
        evening: section(object, "evening", activity),
    })
}

fn activity(value: &Value) -> Result<Activity, String> {
    let object = as_object(value)?;
    Ok(Activity {
        time: optional(object, &["time"]),
        place: required(object, &["place", "name"])?,
        description: optional(object, &["description"]),
    })
}

fn hotel(value: &Value) -> Result<Hotel, String> {
    let object = as_object(value)?;
    Ok(Hotel {
        name: required(object, &["name"])?,
        address: optional(object, &["address"]),
        price_range: optional(object, &["priceRange", "price_range", "price"]),
        rating: optional(object, &["rating"]),
        kind: optional(object, &["type"]),
    })
}

fn transport_option(value: &Value) -> Result<TransportOption, String> {
    let object = as_object(value)?;
    Ok(TransportOption {
        kind: required(object, &["type"])?,
        provider: optional(object, &["provider"]),
        price_per_day: optional(object, &["pricePerDay", "price_per_day"]),
        contact: optional(object, &["contact"]),
    })
}

/// Who is travelling; fixes the head count used for budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravellerType {
    Solo,
    Couple,
    Family,
    Friends,
}

impl TravellerType {
    pub fn members(&self) -> u32 {
        match self {
            TravellerType::Solo => 1,
            TravellerType::Couple => 2,
            TravellerType::Family => 4,
            TravellerType::Friends => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TravellerType::Solo => "Solo",
            TravellerType::Couple => "Couple",
            TravellerType::Family => "Family",
            TravellerType::Friends => "Friends",
        }
    }
}

impl FromStr for TravellerType {
    type Err = ItineraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "solo" => Ok(TravellerType::Solo),
            "couple" => Ok(TravellerType::Couple),
            "family" => Ok(TravellerType::Family),
            "friends" => Ok(TravellerType::Friends),
            _ => Err(ItineraryError::ValidationError(format!("Unknown traveller type: {}", s))),
        }
    }
}

/// Spending level, as rupees per person per day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Budget,
    Moderate,
    Luxury,
}

impl BudgetTier {
    pub fn multiplier(&self) -> u64 {
        match self {
            BudgetTier::Budget => 1000,
            BudgetTier::Moderate => 2500,
            BudgetTier::Luxury => 5000,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BudgetTier::Budget => "Budget-friendly",
            BudgetTier::Moderate => "Moderate",
            BudgetTier::Luxury => "Luxury",
        }
    }
}

impl FromStr for BudgetTier {
    type Err = ItineraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "budget" => Ok(BudgetTier::Budget),
            "moderate" => Ok(BudgetTier::Moderate),
            "luxury" => Ok(BudgetTier::Luxury),
            _ => Err(ItineraryError::ValidationError(format!("Unknown budget tier: {}", s))),
        }
    }
}

/// Rough trip cost: tier multiplier x days x head count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetEstimate {
    pub days: u32,
    pub travellers: TravellerType,
    pub tier: BudgetTier,
    pub members: u32,
    pub total: u64, // rupees
}

impl BudgetEstimate {
    pub fn new(days: i64, travellers: TravellerType, tier: BudgetTier) -> Result<Self, ItineraryError> {
        let days = u32::try_from(days)
            .ok()
            .filter(|days| *days > 0)
            .ok_or_else(|| ItineraryError::ValidationError("Please enter a valid number of days".to_string()))?;
        let members = travellers.members();

        Ok(Self {
            days,
            travellers,
            tier,
            members,
            total: tier.multiplier() * u64::from(days) * u64::from(members),
        })
    }
}

impl fmt::Display for BudgetEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (₹{})", self.tier.label(), self.total)
    }
}
