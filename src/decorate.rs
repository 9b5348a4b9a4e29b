//! Display-only decoration
//!
//! Ratings, review counts and image placeholders are synthesized here for
//! presentation. They are not travel data and nothing in the parsing path
//! reads them.

use crate::PlaceCategory;
use rand::Rng;
use serde::Serialize;

/// A record with presentation fields attached
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decorated<R> {
    #[serde(flatten)]
    pub record: R,
    pub id: String,
    pub image_url: String,
    pub rating: f32,   // 4.0..=5.0, one decimal
    pub reviews: u32,  // 50..550
    pub favorite: bool,
}

impl<R> Decorated<R> {
    /// The only mutation a record ever sees after parsing.
    pub fn toggle_favorite(&mut self) -> bool {
        self.favorite = !self.favorite;
        self.favorite
    }
}

/// Attach presentation fields to each record, keeping order.
pub fn decorate<R, G: Rng>(records: Vec<R>, rng: &mut G) -> Vec<Decorated<R>> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let rating = ((4.0 + rng.gen::<f32>()) * 10.0).round() / 10.0;
            Decorated {
                record,
                id: format!("place-{}", index),
                image_url: format!("/api/placeholder/{}/{}", 400 + index, 300 + index),
                rating,
                reviews: rng.gen_range(50..550),
                favorite: false,
            }
        })
        .collect()
}

/// Icon and colour classes for a category badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryStyle {
    pub icon: &'static str,
    pub color: &'static str,
}

const DEFAULT_STYLE: CategoryStyle = CategoryStyle {
    icon: "map-marker-alt",
    color: "bg-gray-100 text-gray-800",
};

impl PlaceCategory {
    pub fn style(&self) -> CategoryStyle {
        match self {
            PlaceCategory::Historical => CategoryStyle { icon: "monument", color: "bg-amber-100 text-amber-800" },
            PlaceCategory::Natural => CategoryStyle { icon: "leaf", color: "bg-emerald-100 text-emerald-800" },
            PlaceCategory::Cultural => CategoryStyle { icon: "palette", color: "bg-purple-100 text-purple-800" },
            PlaceCategory::Entertainment => CategoryStyle { icon: "ticket", color: "bg-pink-100 text-pink-800" },
            PlaceCategory::Culinary => CategoryStyle { icon: "utensils", color: "bg-red-100 text-red-800" },
        }
    }
}

/// Style for a free-form category label; unknown labels get the default look.
pub fn category_style(label: &str) -> CategoryStyle {
    label
        .parse::<PlaceCategory>()
        .map(|category| category.style())
        .unwrap_or(DEFAULT_STYLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlaceRecommendation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn place(name: &str) -> PlaceRecommendation {
        PlaceRecommendation {
            name: name.to_string(),
            description: "desc".to_string(),
            best_time_to_visit: None,
            category: "Natural".to_string(),
        }
    }

    #[test]
    fn test_decoration_ranges_and_ids() {
        let mut rng = StdRng::seed_from_u64(7);
        let decorated = decorate(vec![place("Munnar"), place("Coorg")], &mut rng);

        assert_eq!(decorated[0].id, "place-0");
        assert_eq!(decorated[1].image_url, "/api/placeholder/401/301");
        for item in &decorated {
            assert!((4.0..=5.0).contains(&item.rating));
            assert!((50..550).contains(&item.reviews));
            assert!(!item.favorite);
        }
        assert_eq!(decorated[0].record, place("Munnar"));
    }

    #[test]
    fn test_toggle_favorite() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut decorated = decorate(vec![place("Ooty")], &mut rng);
        assert!(decorated[0].toggle_favorite());
        assert!(!decorated[0].toggle_favorite());
    }

    #[test]
    fn test_serialized_shape_is_flat() {
        let mut rng = StdRng::seed_from_u64(3);
        let decorated = decorate(vec![place("Hampi")], &mut rng);
        let json = serde_json::to_value(&decorated[0]).unwrap();
        assert_eq!(json["name"], "Hampi");
        assert_eq!(json["imageUrl"], "/api/placeholder/400/300");
    }

    #[test]
    fn test_category_styles() {
        assert_eq!(category_style("historical").icon, "monument");
        assert_eq!(category_style("Culinary").color, "bg-red-100 text-red-800");
        assert_eq!(category_style("Spiritual"), DEFAULT_STYLE);
    }
}
