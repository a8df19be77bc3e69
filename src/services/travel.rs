// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Travel activity recommendation pipeline.
//!
//! Handles the core workflow:
//! 1. Geocode the requested location
//! 2. Search nearby places for each activity type
//! 3. Compute distances from the search center
//! 4. Deduplicate and sort
//!
//! Also plans visiting routes, ranks places against user preferences and
//! renders map pages.

use crate::config::SearchDefaults;
use crate::geo_utils::{haversine_distance, validate_location};
use crate::models::{LatLng, Place, QueryInfo, SortBy, TravelRecommendation};
use crate::services::places::{PlacesClient, PlacesError};
use crate::time_utils::now_rfc3339;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Maximum nearby searches in flight for one recommendation.
const MAX_CONCURRENT_SEARCHES: usize = 4;

/// Activity type searched when none is given.
pub const DEFAULT_ACTIVITY_TYPE: &str = "tourist_attraction";

const DEFAULT_MAX_PER_TYPE: usize = 10;
const MAP_ZOOM: u32 = 13;

/// Parameters for a recommendation search.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Free-form place name to geocode
    pub location_query: String,
    pub activity_types: Vec<String>,
    /// Search radius in meters; configured default if `None`
    pub radius: Option<u32>,
    pub max_per_type: usize,
    pub sort_by: SortBy,
}

impl SearchQuery {
    pub fn new(location_query: impl Into<String>) -> Self {
        Self {
            location_query: location_query.into(),
            activity_types: vec![DEFAULT_ACTIVITY_TYPE.to_string()],
            radius: None,
            max_per_type: DEFAULT_MAX_PER_TYPE,
            sort_by: SortBy::default(),
        }
    }
}

/// Recommendation service built on the Places client.
#[derive(Clone)]
pub struct TravelActivityService {
    places: PlacesClient,
    defaults: SearchDefaults,
}

impl TravelActivityService {
    pub fn new(places: PlacesClient, defaults: SearchDefaults) -> Self {
        Self { places, defaults }
    }

    pub fn places(&self) -> &PlacesClient {
        &self.places
    }

    /// Run the full search pipeline for a location.
    pub async fn recommend_activities(
        &self,
        query: &SearchQuery,
    ) -> Result<TravelRecommendation, PlacesError> {
        let radius = query.radius.unwrap_or(self.defaults.radius);
        let max_per_type = query.max_per_type.min(self.defaults.max_results);

        tracing::info!(
            query = %query.location_query,
            types = ?query.activity_types,
            radius,
            "Searching activities"
        );

        let Some(location) = self.places.geocode(&query.location_query).await? else {
            return Ok(TravelRecommendation {
                activities: Vec::new(),
                total_count: 0,
                search_location: None,
                timestamp: now_rfc3339(),
                query_info: QueryInfo {
                    query: query.location_query.clone(),
                    error: Some("Location not found".to_string()),
                    ..Default::default()
                },
            });
        };

        let places = &self.places;
        let per_type: Vec<Vec<Place>> = stream::iter(query.activity_types.clone())
            .map(|place_type: String| async move {
                match places
                    .nearby_search(location, &place_type, radius, max_per_type)
                    .await
                {
                    Ok(found) => found,
                    Err(e) => {
                        tracing::warn!(place_type = %place_type, error = %e, "Nearby search failed");
                        Vec::new()
                    }
                }
            })
            .buffered(MAX_CONCURRENT_SEARCHES)
            .collect()
            .await;

        let mut activities = dedupe_by_place_id(per_type.into_iter().flatten());
        self.places.distance_matrix(location, &mut activities).await;
        query.sort_by.sort(&mut activities);

        tracing::info!(
            count = activities.len(),
            query = %query.location_query,
            "Recommendation complete"
        );

        Ok(TravelRecommendation {
            total_count: activities.len(),
            activities,
            search_location: Some(location),
            timestamp: now_rfc3339(),
            query_info: QueryInfo {
                query: query.location_query.clone(),
                activity_types: Some(query.activity_types.clone()),
                radius: Some(radius),
                sort_by: Some(query.sort_by),
                error: None,
            },
        })
    }

    /// Full details for a single place.
    pub async fn place_details(&self, place_id: &str) -> Result<Option<Place>, PlacesError> {
        self.places.place_details(place_id).await
    }

    /// Map page showing `places` in list order.
    pub fn generate_map_html(&self, places: &[Place], center: LatLng) -> String {
        render_map_html(MapKind::Activities, places, center, self.places.api_key())
    }

    /// Map page showing a planned route in visiting order.
    pub fn generate_route_map_html(&self, route: &[Place], center: LatLng) -> String {
        render_map_html(MapKind::Route, route, center, self.places.api_key())
    }
}

/// Keep the first occurrence of each place ID.
fn dedupe_by_place_id(places: impl IntoIterator<Item = Place>) -> Vec<Place> {
    let mut seen = HashSet::new();
    places
        .into_iter()
        .filter(|p| seen.insert(p.place_id.clone()))
        .collect()
}

/// Order places by greedy nearest neighbour starting from `start`.
///
/// Empty input or an invalid start is returned unchanged.
pub fn plan_route(places: &[Place], start: LatLng) -> Vec<Place> {
    if places.is_empty() || !validate_location(&start) {
        return places.to_vec();
    }

    let mut remaining = places.to_vec();
    let mut route = Vec::with_capacity(remaining.len());
    let mut current = start;

    while !remaining.is_empty() {
        let mut nearest = 0;
        let mut nearest_distance = f64::INFINITY;
        for (i, place) in remaining.iter().enumerate() {
            let d = haversine_distance(&current, &place.location);
            // Strict comparison keeps the earliest candidate on ties.
            if d < nearest_distance {
                nearest = i;
                nearest_distance = d;
            }
        }

        let next = remaining.remove(nearest);
        current = next.location;
        route.push(next);
    }

    tracing::info!(stops = route.len(), "Planned route");
    route
}

/// Rank places by preference weights for their types plus rating.
pub fn personalized_recommend(preferences: &HashMap<String, f64>, places: &[Place]) -> Vec<Place> {
    let mut scored: Vec<(f64, &Place)> = places
        .iter()
        .map(|p| (preference_score(preferences, p), p))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    tracing::info!(count = places.len(), "Personalized sorting complete");
    scored.into_iter().map(|(_, p)| p.clone()).collect()
}

fn preference_score(preferences: &HashMap<String, f64>, place: &Place) -> f64 {
    let type_score: f64 = place
        .types
        .iter()
        .filter_map(|t| preferences.get(t))
        .sum();
    type_score + place.rating.unwrap_or(0.0) * 0.2
}

// ─────────────────────────────────────────────────────────────────────────────
// Map pages
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum MapKind {
    Activities,
    Route,
}

impl MapKind {
    fn title(self) -> &'static str {
        match self {
            MapKind::Activities => "Travel Activities Map",
            MapKind::Route => "Route Planning Map",
        }
    }

    fn legend(self) -> (&'static str, &'static str) {
        match self {
            MapKind::Activities => (
                "Activity Map",
                "Numbered markers indicate the activity list order.",
            ),
            MapKind::Route => ("Route Map", "Numbered markers indicate the visiting order."),
        }
    }
}

#[derive(Serialize)]
struct MapMarker {
    label: usize,
    name: String,
    lat: f64,
    lng: f64,
}

/// JSON for embedding inside a `<script>` element.
fn script_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

fn render_map_html(kind: MapKind, places: &[Place], center: LatLng, api_key: &str) -> String {
    let markers: Vec<MapMarker> = places
        .iter()
        .enumerate()
        .map(|(i, p)| MapMarker {
            label: i + 1,
            name: p.name.replace('"', "'"),
            lat: p.location.lat,
            lng: p.location.lng,
        })
        .collect();

    let (legend_title, legend_text) = kind.legend();

    format!(
        r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>
    html, body, #map {{
        height: 100%;
        margin: 0;
        padding: 0;
    }}
    .legend {{
        position: absolute;
        top: 10px;
        left: 10px;
        background: rgba(255, 255, 255, 0.9);
        padding: 8px 12px;
        border-radius: 4px;
        font-family: Arial, sans-serif;
        font-size: 12px;
        box-shadow: 0 1px 4px rgba(0,0,0,0.3);
    }}
    </style>
    <script>
    function initMap() {{
        const center = {center};
        const map = new google.maps.Map(document.getElementById("map"), {{
            zoom: {zoom},
            center: center
        }});

        const markers = {markers};
        const path = [];

        markers.forEach(m => {{
            const pos = {{ lat: m.lat, lng: m.lng }};
            path.push(pos);
            new google.maps.Marker({{
                position: pos,
                map: map,
                label: String(m.label),
                title: m.name
            }});
        }});

        if (path.length > 1) {{
            new google.maps.Polyline({{
                map: map,
                path: path,
                strokeColor: "#FF0000",
                strokeOpacity: 1.0,
                strokeWeight: 3
            }});
        }}
    }}
    </script>
    <script async defer
        src="https://maps.googleapis.com/maps/api/js?key={key}&callback=initMap">
    </script>
</head>
<body>
    <div id="map"></div>
    <div class="legend">
        <strong>{legend_title}</strong><br/>
        {legend_text}
    </div>
</body>
</html>
"##,
        title = kind.title(),
        center = script_json(&center),
        zoom = MAP_ZOOM,
        markers = script_json(&markers),
        key = urlencoding::encode(api_key),
        legend_title = legend_title,
        legend_text = legend_text,
    )
}
