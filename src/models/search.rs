// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Aggregated search results from the recommendation pipeline.

use crate::models::place::{LatLng, Place};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Sort order for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum SortBy {
    /// Rating, then review count, descending
    #[default]
    Rating,
    /// Distance from the search origin, nearest first
    Distance,
    /// Review count, descending
    Reviews,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Rating => "rating",
            SortBy::Distance => "distance",
            SortBy::Reviews => "reviews",
        }
    }

    /// Stable in-place sort of places by this order.
    pub fn sort(&self, places: &mut [Place]) {
        match self {
            SortBy::Rating => places.sort_by(compare_by_rating),
            SortBy::Distance => places.sort_by(|a, b| {
                let da = a.distance.unwrap_or(f64::INFINITY);
                let db = b.distance.unwrap_or(f64::INFINITY);
                da.total_cmp(&db)
            }),
            SortBy::Reviews => places.sort_by(|a, b| {
                b.user_ratings_total
                    .unwrap_or(0)
                    .cmp(&a.user_ratings_total.unwrap_or(0))
            }),
        }
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rating" => Ok(SortBy::Rating),
            "distance" => Ok(SortBy::Distance),
            "reviews" => Ok(SortBy::Reviews),
            other => Err(format!(
                "unknown sort order '{}' (expected rating, distance or reviews)",
                other
            )),
        }
    }
}

/// Descending by (rating, review count), missing values count as zero.
fn compare_by_rating(a: &Place, b: &Place) -> Ordering {
    let ra = a.rating.unwrap_or(0.0);
    let rb = b.rating.unwrap_or(0.0);
    rb.total_cmp(&ra).then_with(|| {
        b.user_ratings_total
            .unwrap_or(0)
            .cmp(&a.user_ratings_total.unwrap_or(0))
    })
}

/// Metadata describing how a recommendation was produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct QueryInfo {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a full recommendation search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TravelRecommendation {
    pub activities: Vec<Place>,
    pub total_count: usize,
    /// Geocoded search center; `None` if the location was not found
    pub search_location: Option<LatLng>,
    /// RFC3339 timestamp of the search
    pub timestamp: String,
    pub query_info: QueryInfo,
}

impl TravelRecommendation {
    /// Top `n` activities by rating and review count.
    pub fn top_rated(&self, n: usize) -> Vec<Place> {
        let mut sorted = self.activities.clone();
        sorted.sort_by(compare_by_rating);
        sorted.truncate(n);
        sorted
    }

    /// Activities whose types include `activity_type`.
    pub fn filter_by_type(&self, activity_type: &str) -> Vec<&Place> {
        self.activities
            .iter()
            .filter(|a| a.types.iter().any(|t| t == activity_type))
            .collect()
    }
}
