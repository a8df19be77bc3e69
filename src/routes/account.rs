// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes for the signed-in user: profile, saved activities and trips.

use crate::db::new_id;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::trip::partition_trips;
use crate::models::user::{invalid_preferences, normalize_email, PREFERENCE_OPTIONS};
use crate::models::{Activity, Trip, TripActivity, User};
use crate::routes::catalog::{load_saved_activities, require_activity, SavedActivityView};
use crate::routes::query_params;
use crate::services::recommendation::{generate_trip_recommendations, ScoredActivity};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Trips shown in each profile list.
const PROFILE_TRIP_LIMIT: usize = 3;
const DEFAULT_TRIP_RECOMMENDATIONS: usize = 10;
const MAX_TRIP_RECOMMENDATIONS: usize = 50;

/// Account routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me/profile", get(get_profile).put(update_profile))
        .route("/api/me/saved", get(my_saved_activities))
        .route("/api/trips", get(list_trips).post(create_trip))
        .route(
            "/api/trips/{trip_id}",
            get(get_trip).put(update_trip).delete(delete_trip),
        )
        .route("/api/trips/{trip_id}/activities", post(add_trip_activity))
        .route(
            "/api/trips/{trip_id}/recommendations",
            get(trip_recommendations),
        )
}

async fn require_user(state: &AppState, user_id: u64) -> Result<User> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

/// Load a trip owned by `user_id`; other users' trips look missing.
async fn require_own_trip(state: &AppState, user_id: u64, trip_id: u64) -> Result<Trip> {
    match state.db.get_trip(trip_id).await? {
        Some(trip) if trip.user_id == user_id => Ok(trip),
        _ => Err(AppError::NotFound(format!("Trip {} not found", trip_id))),
    }
}

async fn load_trip_activities(state: &AppState, trip_id: u64) -> Result<Vec<Activity>> {
    let mut links = state.db.get_trip_activities(trip_id).await?;
    links.sort_by(|a, b| a.added_at.cmp(&b.added_at));
    let ids: Vec<u64> = links.iter().map(|l| l.activity_id).collect();
    state.db.get_activities_by_ids(&ids).await
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub upcoming_trips: Vec<Trip>,
    pub past_trips: Vec<Trip>,
    pub prefs_list: Vec<&'static str>,
}

/// Profile with recent and upcoming trips.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let user = require_user(&state, auth.user_id).await?;
    let trips = state.db.get_trips_for_user(auth.user_id).await?;

    let today = chrono::Utc::now().date_naive();
    let (upcoming_trips, past_trips) = partition_trips(&trips, today, PROFILE_TRIP_LIMIT);

    Ok(Json(ProfileResponse {
        user,
        upcoming_trips,
        past_trips,
        prefs_list: PREFERENCE_OPTIONS.to_vec(),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(max = 50))]
    pub first_name: Option<String>,
    #[validate(length(max = 50))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub preferences: Option<Vec<String>>,
}

/// Update profile fields; absent fields are left alone.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    payload.validate()?;

    if let Some(preferences) = &payload.preferences {
        let invalid = invalid_preferences(preferences);
        if !invalid.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Unknown preferences: {}",
                invalid.join(", ")
            )));
        }
    }

    let mut user = require_user(&state, auth.user_id).await?;
    let old_email = user.email.clone();

    if let Some(first_name) = payload.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = payload.last_name {
        user.last_name = last_name;
    }
    if let Some(bio) = payload.bio {
        user.bio = bio;
    }
    if let Some(phone) = payload.phone {
        user.phone = phone;
    }
    if let Some(preferences) = payload.preferences {
        user.preferences = preferences;
    }
    if let Some(email) = payload.email {
        user.email = normalize_email(&email);
    }

    if user.email != old_email {
        state.db.change_user_email(&user, &old_email).await?;
    } else {
        state.db.upsert_user(&user).await?;
    }

    tracing::info!(user_id = auth.user_id, "Profile updated");
    Ok(Json(user))
}

/// The current user's saved activities, newest first.
async fn my_saved_activities(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<SavedActivityView>>> {
    Ok(Json(load_saved_activities(&state, auth.user_id).await?))
}

// ─── Trips ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct TripInput {
    #[validate(length(min = 1, max = 50))]
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl TripInput {
    /// Trim the destination, then validate it and the date order.
    fn check(&mut self) -> Result<()> {
        self.destination = self.destination.trim().to_string();
        self.validate()?;
        if self.end_date < self.start_date {
            return Err(AppError::BadRequest(
                "end_date must not be before start_date".to_string(),
            ));
        }
        Ok(())
    }
}

/// The current user's trips, soonest first.
async fn list_trips(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<Trip>>> {
    let mut trips = state.db.get_trips_for_user(auth.user_id).await?;
    trips.sort_by_key(|t| t.start_date);
    Ok(Json(trips))
}

/// Draft a new trip.
async fn create_trip(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(mut payload): Json<TripInput>,
) -> Result<(StatusCode, Json<Trip>)> {
    payload.check()?;

    let trip = Trip {
        trip_id: new_id()?,
        user_id: auth.user_id,
        destination: payload.destination,
        start_date: payload.start_date,
        end_date: payload.end_date,
        created_at: now_rfc3339(),
    };
    state.db.upsert_trip(&trip).await?;

    tracing::info!(user_id = auth.user_id, trip_id = trip.trip_id, "Trip created");
    Ok((StatusCode::CREATED, Json(trip)))
}

#[derive(Serialize)]
pub struct TripDetail {
    #[serde(flatten)]
    pub trip: Trip,
    pub activities: Vec<Activity>,
}

/// One trip with its activities.
async fn get_trip(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(trip_id): Path<u64>,
) -> Result<Json<TripDetail>> {
    let trip = require_own_trip(&state, auth.user_id, trip_id).await?;
    let activities = load_trip_activities(&state, trip_id).await?;
    Ok(Json(TripDetail { trip, activities }))
}

/// Change a trip's destination or dates.
async fn update_trip(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(trip_id): Path<u64>,
    Json(mut payload): Json<TripInput>,
) -> Result<Json<Trip>> {
    payload.check()?;

    let mut trip = require_own_trip(&state, auth.user_id, trip_id).await?;
    trip.destination = payload.destination;
    trip.start_date = payload.start_date;
    trip.end_date = payload.end_date;
    state.db.upsert_trip(&trip).await?;

    Ok(Json(trip))
}

/// Delete a trip and its activity links.
async fn delete_trip(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(trip_id): Path<u64>,
) -> Result<StatusCode> {
    require_own_trip(&state, auth.user_id, trip_id).await?;
    state.db.delete_trip(trip_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AddTripActivityRequest {
    pub activity_id: u64,
}

#[derive(Serialize)]
pub struct AddTripActivityResponse {
    pub status: &'static str,
    pub trip_id: u64,
    pub activity: Activity,
}

/// Link a catalog activity to a trip.
async fn add_trip_activity(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(trip_id): Path<u64>,
    Json(payload): Json<AddTripActivityRequest>,
) -> Result<(StatusCode, Json<AddTripActivityResponse>)> {
    let trip = require_own_trip(&state, auth.user_id, trip_id).await?;
    let activity = require_activity(&state, payload.activity_id).await?;

    state
        .db
        .add_trip_activity(&TripActivity {
            trip_id,
            user_id: trip.user_id,
            activity_id: activity.activity_id,
            added_at: now_rfc3339(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AddTripActivityResponse {
            status: "added",
            trip_id,
            activity,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct TripRecommendationParams {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct TripRecommendationsResponse {
    pub trip_id: u64,
    pub recommendations: Vec<ScoredActivity>,
}

/// Catalog activities that would fit the trip.
async fn trip_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(trip_id): Path<u64>,
    params: std::result::Result<Query<TripRecommendationParams>, QueryRejection>,
) -> Result<Json<TripRecommendationsResponse>> {
    let limit = query_params(params)?
        .limit
        .unwrap_or(DEFAULT_TRIP_RECOMMENDATIONS)
        .clamp(1, MAX_TRIP_RECOMMENDATIONS);

    require_own_trip(&state, auth.user_id, trip_id).await?;
    let user = require_user(&state, auth.user_id).await?;
    let trip_activities = load_trip_activities(&state, trip_id).await?;
    let all_activities = state.db.list_activities().await?;

    let recommendations =
        generate_trip_recommendations(&trip_activities, &all_activities, &user.preferences, limit);

    Ok(Json(TripRecommendationsResponse {
        trip_id,
        recommendations,
    }))
}
