// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Places-backed search routes: activity search, details, route planning,
//! personalized ranking and map pages.

use crate::error::{AppError, Result};
use crate::geo_utils::{format_distance, haversine_distance};
use crate::models::{LatLng, Place, SortBy, TravelRecommendation};
use crate::routes::query_params;
use crate::services::travel::{personalized_recommend, plan_route, SearchQuery};
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Activity types searched when the request names none.
pub const SEARCH_PAGE_TYPES: [&str; 10] = [
    "tourist_attraction",
    "restaurant",
    "museum",
    "park",
    "shopping_mall",
    "night_club",
    "art_gallery",
    "cafe",
    "bar",
    "movie_theater",
];

const DEFAULT_MAX_PER_TYPE: usize = 5;

/// Most activity types one search may request, each costing a Places call.
const MAX_SEARCH_TYPES: usize = SEARCH_PAGE_TYPES.len();

/// Largest radius the Places API accepts, in meters.
const MAX_RADIUS: u32 = 50_000;

/// Content-Security-Policy for map pages, which load the Maps JavaScript API.
const MAP_CSP: &str = "default-src 'none'; \
    script-src 'unsafe-inline' https://maps.googleapis.com https://maps.gstatic.com; \
    style-src 'unsafe-inline' https://fonts.googleapis.com; \
    img-src data: https://maps.gstatic.com https://*.googleapis.com https://*.ggpht.com; \
    font-src https://fonts.gstatic.com; \
    connect-src https://maps.googleapis.com; \
    frame-ancestors 'none'";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/search", get(search))
        .route("/api/places/{place_id}", get(place_details))
        .route("/api/route", post(route))
        .route("/api/personalize", post(personalize))
        .route("/api/maps/activities", post(activities_map))
        .route("/api/maps/route", post(route_map))
}

// ─── Search ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Location to search around
    q: Option<String>,
    /// Comma-separated activity types
    types: Option<String>,
    radius: Option<u32>,
    max_per_type: Option<usize>,
    sort_by: Option<String>,
}

impl SearchParams {
    fn into_query(self) -> Result<SearchQuery> {
        let location = self
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing search location (q)".to_string()))?;

        let mut query = SearchQuery::new(location);

        query.activity_types = match self.types.as_deref() {
            Some(types) => types
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };
        if query.activity_types.len() > MAX_SEARCH_TYPES {
            return Err(AppError::BadRequest(format!(
                "At most {} activity types per search",
                MAX_SEARCH_TYPES
            )));
        }
        if query.activity_types.is_empty() {
            query.activity_types = SEARCH_PAGE_TYPES.iter().map(|t| t.to_string()).collect();
        }

        if let Some(radius) = self.radius {
            if radius == 0 || radius > MAX_RADIUS {
                return Err(AppError::BadRequest(format!(
                    "radius must be between 1 and {}",
                    MAX_RADIUS
                )));
            }
            query.radius = Some(radius);
        }

        query.max_per_type = self.max_per_type.unwrap_or(DEFAULT_MAX_PER_TYPE).max(1);

        if let Some(sort_by) = self.sort_by.as_deref() {
            query.sort_by = sort_by.parse::<SortBy>().map_err(AppError::BadRequest)?;
        }

        Ok(query)
    }
}

/// Search activities around a location.
async fn search(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<TravelRecommendation>> {
    let query = query_params(params)?.into_query()?;
    let recommendation = state.travel.recommend_activities(&query).await?;
    Ok(Json(recommendation))
}

/// Full details for one place.
async fn place_details(
    State(state): State<Arc<AppState>>,
    Path(place_id): Path<String>,
) -> Result<Json<Place>> {
    state
        .travel
        .place_details(&place_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Place {} not found", place_id)))
}

// ─── Route planning and ranking ──────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub activities: Vec<Place>,
    pub start: LatLng,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RouteResponse {
    pub route: Vec<Place>,
    pub stops: usize,
    /// Straight-line length from the start through every stop, in meters
    pub total_distance: f64,
    pub total_distance_text: String,
}

/// Order activities into a visiting route.
async fn route(Json(payload): Json<RouteRequest>) -> Json<RouteResponse> {
    let route = plan_route(&payload.activities, payload.start);

    let mut total_distance = 0.0;
    let mut current = payload.start;
    for stop in &route {
        total_distance += haversine_distance(&current, &stop.location);
        current = stop.location;
    }

    Json(RouteResponse {
        stops: route.len(),
        route,
        total_distance,
        total_distance_text: format_distance(total_distance),
    })
}

#[derive(Debug, Deserialize)]
pub struct PersonalizeRequest {
    /// Weight per activity type
    pub preferences: HashMap<String, f64>,
    pub activities: Vec<Place>,
}

/// Rank activities against preference weights.
async fn personalize(Json(payload): Json<PersonalizeRequest>) -> Json<Vec<Place>> {
    Json(personalized_recommend(
        &payload.preferences,
        &payload.activities,
    ))
}

// ─── Map pages ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MapRequest {
    pub activities: Vec<Place>,
    pub center: LatLng,
}

fn map_page(html: String) -> Response {
    ([(header::CONTENT_SECURITY_POLICY, MAP_CSP)], Html(html)).into_response()
}

/// Map page with activities in list order.
async fn activities_map(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MapRequest>,
) -> Response {
    map_page(
        state
            .travel
            .generate_map_html(&payload.activities, payload.center),
    )
}

/// Map page with activities in visiting order.
async fn route_map(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MapRequest>,
) -> Response {
    map_page(
        state
            .travel
            .generate_route_map_html(&payload.activities, payload.center),
    )
}
