// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog recommendation engine.
//!
//! Pure functions over activities and reviews; callers load them from
//! storage.

use crate::geo_utils::haversine_distance;
use crate::models::{Activity, LatLng, Review};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Rating at or above which a review counts as "liked".
pub const LIKED_RATING: f64 = 4.0;

const BASE_SCORE: f64 = 50.0;
const MAX_SCORE: f64 = 100.0;

/// Named duration ranges, in minutes (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationBucket {
    Quick,
    HalfDay,
    FullDay,
    MultiDay,
}

impl DurationBucket {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "quick" => Some(DurationBucket::Quick),
            "half-day" => Some(DurationBucket::HalfDay),
            "full-day" => Some(DurationBucket::FullDay),
            "multi-day" => Some(DurationBucket::MultiDay),
            _ => None,
        }
    }

    pub fn range(self) -> (u32, u32) {
        match self {
            DurationBucket::Quick => (0, 120),
            DurationBucket::HalfDay => (120, 240),
            DurationBucket::FullDay => (240, 480),
            DurationBucket::MultiDay => (480, 100_000),
        }
    }

    pub fn contains(self, minutes: u32) -> bool {
        let (min, max) = self.range();
        (min..=max).contains(&minutes)
    }
}

/// Catalog filter; every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// One of `quick`, `half-day`, `full-day`, `multi-day`; others are ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ActivityFilter {
    pub fn matches(&self, activity: &Activity) -> bool {
        if self.min_price.is_some_and(|min| activity.cost < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| activity.cost > max) {
            return false;
        }
        if let Some(category) = non_empty(&self.category) {
            if !contains_ignore_case(&activity.category, category) {
                return false;
            }
        }
        if let Some(bucket) = self.duration.as_deref().and_then(DurationBucket::from_name) {
            if !bucket.contains(activity.duration_minutes) {
                return false;
            }
        }
        if let Some(min_rating) = self.min_rating {
            if !activity.rating.is_some_and(|r| r >= min_rating) {
                return false;
            }
        }
        if let Some(location) = non_empty(&self.location) {
            if !contains_ignore_case(&activity.location, location) {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Rating descending, unrated last.
fn compare_rating_desc(a: &Activity, b: &Activity) -> Ordering {
    match (a.rating, b.rating) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Activities matching `filter`, best rated first, then cheapest.
pub fn filter_activities(activities: &[Activity], filter: &ActivityFilter) -> Vec<Activity> {
    let mut matched: Vec<Activity> = activities
        .iter()
        .filter(|a| filter.matches(a))
        .cloned()
        .collect();
    matched.sort_by(|a, b| compare_rating_desc(a, b).then(a.cost.total_cmp(&b.cost)));
    matched
}

/// Categories of activities the user rated [`LIKED_RATING`] or higher.
pub fn liked_categories(user_reviews: &[Review], activities: &[Activity]) -> HashSet<String> {
    let liked_ids: HashSet<u64> = user_reviews
        .iter()
        .filter(|r| r.rating >= LIKED_RATING)
        .map(|r| r.activity_id)
        .collect();

    activities
        .iter()
        .filter(|a| liked_ids.contains(&a.activity_id))
        .map(|a| a.category.clone())
        .collect()
}

/// Unreviewed activities in categories the user liked, best rated first.
pub fn generate_recommendations(
    user_id: u64,
    reviews: &[Review],
    activities: &[Activity],
    limit: usize,
) -> Vec<Activity> {
    let user_reviews: Vec<Review> = reviews
        .iter()
        .filter(|r| r.user_id == user_id)
        .cloned()
        .collect();
    let liked = liked_categories(&user_reviews, activities);
    let reviewed: HashSet<u64> = user_reviews.iter().map(|r| r.activity_id).collect();

    let mut recommended: Vec<Activity> = activities
        .iter()
        .filter(|a| liked.contains(&a.category) && !reviewed.contains(&a.activity_id))
        .cloned()
        .collect();
    recommended.sort_by(compare_rating_desc);
    recommended.truncate(limit);

    tracing::debug!(
        user_id,
        liked = liked.len(),
        count = recommended.len(),
        "Generated recommendations"
    );
    recommended
}

/// Recommendation score between 0 and 100.
pub fn calculate_recommendation_score(
    liked: &HashSet<String>,
    activity: &Activity,
    review_count: usize,
) -> f64 {
    let mut score = BASE_SCORE;

    if liked.contains(&activity.category) {
        score += 20.0;
    }

    score += activity.rating.unwrap_or(0.0) * 5.0;

    if review_count > 10 {
        score += 10.0;
    } else if review_count > 5 {
        score += 5.0;
    }

    score.min(MAX_SCORE)
}

/// A candidate activity scored for a trip.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredActivity {
    pub activity: Activity,
    pub score: f64,
    /// Distance from the trip center, rounded to 0.1 km
    pub distance_km: f64,
}

/// Score catalog activities as additions to a trip.
///
/// Weights: preference match 40, proximity to the trip center up to 30,
/// rating up to 20, new category 10.
pub fn generate_trip_recommendations(
    trip_activities: &[Activity],
    all_activities: &[Activity],
    user_preferences: &[String],
    limit: usize,
) -> Vec<ScoredActivity> {
    let center = trip_center(trip_activities);
    let in_trip: HashSet<u64> = trip_activities.iter().map(|a| a.activity_id).collect();
    let trip_categories: HashSet<&str> =
        trip_activities.iter().map(|a| a.category.as_str()).collect();
    let preferences: Vec<String> = user_preferences.iter().map(|p| p.to_lowercase()).collect();

    let mut scored: Vec<ScoredActivity> = all_activities
        .iter()
        .filter(|a| !in_trip.contains(&a.activity_id))
        .filter_map(|a| a.coordinates().map(|coords| (a, coords)))
        .map(|(activity, coords)| {
            let category = activity.category.to_lowercase();
            let distance_km = haversine_distance(&center, &coords) / 1000.0;

            let preference_score = if preferences.iter().any(|p| category.contains(p.as_str())) {
                40.0
            } else {
                0.0
            };
            let proximity_score = if distance_km < 5.0 {
                30.0
            } else if distance_km < 15.0 {
                20.0
            } else if distance_km < 30.0 {
                10.0
            } else {
                0.0
            };
            let rating_score = activity.rating.unwrap_or(0.0) / 5.0 * 20.0;
            let diversity_score = if trip_categories.contains(activity.category.as_str()) {
                0.0
            } else {
                10.0
            };

            ScoredActivity {
                activity: activity.clone(),
                score: preference_score + proximity_score + rating_score + diversity_score,
                distance_km: round_tenth(distance_km),
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}

/// Mean position of the trip's activities; (0, 0) if none have coordinates.
fn trip_center(trip_activities: &[Activity]) -> LatLng {
    let coords: Vec<LatLng> = trip_activities
        .iter()
        .filter_map(Activity::coordinates)
        .collect();
    if coords.is_empty() {
        return LatLng::new(0.0, 0.0);
    }
    let n = coords.len() as f64;
    LatLng::new(
        coords.iter().map(|c| c.lat).sum::<f64>() / n,
        coords.iter().map(|c| c.lng).sum::<f64>() / n,
    )
}

/// Review count and average rating rounded to 0.1.
pub fn summarize_reviews(reviews: &[Review]) -> (usize, Option<f64>) {
    if reviews.is_empty() {
        return (0, None);
    }
    let total: f64 = reviews.iter().map(|r| r.rating).sum();
    (reviews.len(), Some(round_tenth(total / reviews.len() as f64)))
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::fixtures::{activity, review};

    fn ids(activities: &[Activity]) -> Vec<u64> {
        activities.iter().map(|a| a.activity_id).collect()
    }

    fn located(id: u64, category: &str, rating: Option<f64>, lat: f64, lng: f64) -> Activity {
        let mut a = activity(id, category, 10.0, rating);
        a.latitude = Some(lat);
        a.longitude = Some(lng);
        a
    }

    #[test]
    fn test_duration_buckets_inclusive() {
        assert!(DurationBucket::Quick.contains(120));
        assert!(DurationBucket::HalfDay.contains(120));
        assert!(!DurationBucket::HalfDay.contains(241));
        assert!(DurationBucket::MultiDay.contains(100_000));
        assert_eq!(DurationBucket::from_name("weekend"), None);
    }

    #[test]
    fn test_filter_by_price_and_category() {
        let activities = vec![
            activity(1, "Museum", 20.0, Some(4.0)),
            activity(2, "Food Tour", 50.0, Some(4.5)),
            activity(3, "Art Museum", 5.0, Some(4.0)),
            activity(4, "Museum", 100.0, Some(5.0)),
        ];
        let filter = ActivityFilter {
            max_price: Some(50.0),
            category: Some("museum".to_string()),
            ..Default::default()
        };

        let result = filter_activities(&activities, &filter);

        // Equal ratings fall back to cost ascending.
        assert_eq!(ids(&result), vec![3, 1]);
    }

    #[test]
    fn test_filter_min_rating_excludes_unrated() {
        let activities = vec![
            activity(1, "Park", 0.0, None),
            activity(2, "Park", 0.0, Some(3.0)),
            activity(3, "Park", 0.0, Some(4.2)),
        ];
        let filter = ActivityFilter {
            min_rating: Some(3.5),
            ..Default::default()
        };

        assert_eq!(ids(&filter_activities(&activities, &filter)), vec![3]);
    }

    #[test]
    fn test_filter_duration_and_unknown_duration() {
        let mut long = activity(1, "Hike", 0.0, Some(4.0));
        long.duration_minutes = 300;
        let short = activity(2, "Hike", 0.0, Some(3.0));
        let activities = vec![long, short];

        let full_day = ActivityFilter {
            duration: Some("full-day".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_activities(&activities, &full_day)), vec![1]);

        let unknown = ActivityFilter {
            duration: Some("weekend".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_activities(&activities, &unknown)), vec![1, 2]);
    }

    #[test]
    fn test_filter_orders_unrated_last() {
        let activities = vec![
            activity(1, "Tour", 5.0, None),
            activity(2, "Tour", 9.0, Some(3.0)),
            activity(3, "Tour", 1.0, Some(4.0)),
        ];

        let result = filter_activities(&activities, &ActivityFilter::default());

        assert_eq!(ids(&result), vec![3, 2, 1]);
    }

    #[test]
    fn test_generate_recommendations() {
        let activities = vec![
            activity(1, "Museum", 10.0, Some(4.0)),
            activity(2, "Museum", 10.0, Some(4.8)),
            activity(3, "Museum", 10.0, Some(3.5)),
            activity(4, "Beach", 10.0, Some(5.0)),
            activity(5, "Nightlife", 10.0, Some(5.0)),
        ];
        let reviews = vec![
            review(7, 1, 5.0),
            review(7, 5, 2.0),
            review(8, 4, 5.0), // another user
        ];

        let result = generate_recommendations(7, &reviews, &activities, 10);

        // Museums liked; reviewed activity 1 excluded; Nightlife was disliked.
        assert_eq!(ids(&result), vec![2, 3]);
        assert_eq!(ids(&generate_recommendations(7, &reviews, &activities, 1)), vec![2]);
    }

    #[test]
    fn test_recommendation_score() {
        let liked = HashSet::from(["Museum".to_string()]);

        let museum = activity(1, "Museum", 0.0, Some(4.0));
        assert_eq!(calculate_recommendation_score(&liked, &museum, 0), 90.0);
        assert_eq!(calculate_recommendation_score(&liked, &museum, 6), 95.0);

        let beach = activity(2, "Beach", 0.0, None);
        assert_eq!(calculate_recommendation_score(&liked, &beach, 11), 60.0);

        // 50 + 20 + 25 + 10 caps at 100.
        let top = activity(3, "Museum", 0.0, Some(5.0));
        assert_eq!(calculate_recommendation_score(&liked, &top, 20), 100.0);
    }

    #[test]
    fn test_trip_recommendations_weights() {
        let trip = vec![located(1, "Museum", Some(4.0), 38.72, -9.14)];
        let all = vec![
            trip[0].clone(),
            // Nearby food: preference 40 + proximity 30 + rating 20 + diversity 10
            located(2, "Street Food", Some(5.0), 38.721, -9.141),
            // Nearby museum: proximity 30 + rating 16, no diversity
            located(3, "Museum", Some(4.0), 38.72, -9.15),
            // Far away food: preference 40 + rating 20 + diversity 10
            located(4, "Food Market", Some(5.0), 41.15, -8.61),
            // No coordinates, never a candidate
            activity(5, "Food", 0.0, Some(5.0)),
        ];

        let result = generate_trip_recommendations(&trip, &all, &["food".to_string()], 10);

        let got: Vec<(u64, f64)> = result
            .iter()
            .map(|s| (s.activity.activity_id, s.score))
            .collect();
        assert_eq!(got, vec![(2, 100.0), (4, 70.0), (3, 46.0)]);
        assert!(result[0].distance_km < 1.0);
        assert!(result[1].distance_km > 250.0);
    }

    #[test]
    fn test_trip_recommendations_empty_trip_centers_at_origin() {
        let all = vec![
            located(1, "Beach", None, 0.01, 0.01),
            located(2, "Beach", None, 10.0, 10.0),
        ];

        let result = generate_trip_recommendations(&[], &all, &[], 1);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].activity.activity_id, 1);
        assert_eq!(result[0].score, 40.0);
    }

    #[test]
    fn test_summarize_reviews() {
        assert_eq!(summarize_reviews(&[]), (0, None));

        let reviews = vec![review(1, 1, 4.0), review(2, 1, 5.0), review(3, 1, 4.0)];
        assert_eq!(summarize_reviews(&reviews), (3, Some(4.3)));
    }
}
