//! Prompt text sent to the completion provider

use crate::planner::TripRequest;

/// Day-by-day plan as `Day | Time | Activity` lines.
pub fn itinerary_prompt(trip: &TripRequest) -> String {
    format!(
        r#"Create a brief travel itinerary for {destination} from {start} to {end}.
Requirements:
- Maximum 3 activities per day
- Each activity description should be 3-4 words maximum
- Format as simple text with each line as: Day number | Time | Activity | Category
- Category is one of: Food, Sightseeing, Nature, Culture, Adventure, Shopping, Relaxation
- Times should be in format like "9 AM" or "2 PM"
- Do not include any special characters or formatting
Example format:
Day 1 | 9 AM | Visit Central Park | Nature
Day 1 | 2 PM | Shopping at Mall | Shopping
Day 2 | 10 AM | Beach Swimming | Relaxation"#,
        destination = trip.destination,
        start = trip.start_date.format("%Y-%m-%d"),
        end = trip.end_date.format("%Y-%m-%d"),
    )
}

/// Five must-visit places as a JSON array.
pub fn places_prompt(query: &str) -> String {
    format!(
        r#"Recommend 5 must-visit places in {query} with name, a brief description, best time to visit, and a category (like Historical, Natural, Cultural, Entertainment, or Culinary). Format the response as a JSON array like this:

[
    {{
        "name": "Place Name",
        "description": "Brief description about what makes this place special...",
        "bestTimeToVisit": "Season or month range",
        "category": "Category of the place"
    }},
    ...
]"#,
        query = query.trim(),
    )
}

/// Three cities with three places each, as a JSON array.
pub fn cities_prompt(query: &str) -> String {
    format!(
        r#"Recommend 3 cities to visit in or near {query} and for each, list 3 must-visit places with a brief description. Format the response as a JSON array like this:

[
    {{
        "city": "City Name",
        "places": [
            {{ "name": "Place Name", "description": "Brief description" }},
            ...
        ]
    }},
    ...
]"#,
        query = query.trim(),
    )
}

/// One JSON object with `plan`, `hotels` and `transport`, prices in rupees.
pub fn trip_plan_prompt(trip: &TripRequest, preferences: Option<&str>) -> String {
    let preferences = preferences.map(str::trim).filter(|p| !p.is_empty()).unwrap_or("None");
    format!(
        r#"Create a detailed structured JSON travel plan for a {days}-day trip to {destination} from {start} to {end}.
User preferences: {preferences}.
Include an array named 'plan' where each element represents a day, containing:
- "title": string (e.g., "Day 1"),
- "morning", "afternoon", "evening": arrays of activities where each activity has "time", "place", and "description".
Also include:
- "hotels": array of 3 hotels with name, address, priceRange, rating, and type
- "transport": array of 3 transport options with type, provider, pricePerDay, and contact
Make sure all prices are clearly mentioned in Indian rupees (₹), not USD or any other currency.
Return ONLY valid JSON. Do NOT include any markdown, commentary, or explanation."#,
        days = trip.num_days(),
        destination = trip.destination,
        start = trip.start_date.format("%Y-%m-%d"),
        end = trip.end_date.format("%Y-%m-%d"),
        preferences = preferences,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_itinerary_prompt_mentions_trip() {
        let trip = TripRequest::new("Goa", "2025-12-20", "2025-12-23").unwrap();
        let prompt = itinerary_prompt(&trip);
        assert!(prompt.contains("itinerary for Goa from 2025-12-20 to 2025-12-23"));
        assert!(prompt.contains("Day number | Time | Activity"));
    }

    #[test]
    fn test_json_prompts_render_braces() {
        let prompt = places_prompt("  Kerala ");
        assert!(prompt.starts_with("Recommend 5 must-visit places in Kerala with"));
        assert!(prompt.contains(r#""bestTimeToVisit": "Season or month range""#));

        let prompt = cities_prompt("Rajasthan");
        assert!(prompt.contains(r#"{ "name": "Place Name", "description": "Brief description" }"#));
    }

    #[test]
    fn test_trip_plan_prompt() {
        let trip = TripRequest::new("Goa", "2025-12-20", "2025-12-22").unwrap();
        let prompt = trip_plan_prompt(&trip, Some(" vegetarian food, no trekking "));
        assert!(prompt.contains("3-day trip to Goa from 2025-12-20 to 2025-12-22"));
        assert!(prompt.contains("User preferences: vegetarian food, no trekking."));
        assert!(prompt.contains("Indian rupees"));

        assert!(trip_plan_prompt(&trip, Some("  ")).contains("User preferences: None."));
    }
}
