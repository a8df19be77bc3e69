// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity catalog routes: browsing, filtering, recommendations, saves and
//! reviews.

use crate::db::new_id;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Activity, Recommendation, Review, SavedActivity, User};
use crate::routes::query_params;
use crate::services::recommendation::{
    calculate_recommendation_score, filter_activities, generate_recommendations,
    liked_categories, summarize_reviews, ActivityFilter,
};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;
const MAX_RECOMMENDATION_LIMIT: usize = 50;

/// Public catalog routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities", get(list_activities))
        .route("/api/activities/filter", get(filter))
        .route("/api/activities/{activity_id}", get(get_activity))
        .route("/api/recommendations/generate", post(generate))
        .route("/api/users/{user_id}/saved", get(user_saved_activities))
}

/// Catalog routes that require authentication.
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities", post(create_activity))
        .route(
            "/api/activities/{activity_id}",
            put(update_activity).delete(delete_activity),
        )
        .route("/api/activities/{activity_id}/save", post(save_activity))
        .route("/api/activities/{activity_id}/reviews", post(add_review))
}

// ─── Shared response types ───────────────────────────────────

/// Public view of a user.
#[derive(Serialize)]
pub struct UserSummary {
    pub user_id: u64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// An activity with its review statistics.
#[derive(Serialize)]
pub struct ActivitySummary {
    #[serde(flatten)]
    pub activity: Activity,
    pub review_count: usize,
    pub average_rating: Option<f64>,
}

/// A saved activity with the time it was saved.
#[derive(Serialize)]
pub struct SavedActivityView {
    pub activity: Activity,
    pub saved_at: String,
}

pub(crate) async fn require_activity(state: &AppState, activity_id: u64) -> Result<Activity> {
    state
        .db
        .get_activity(activity_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", activity_id)))
}

/// Saved activities for a user, newest first.
pub(crate) async fn load_saved_activities(
    state: &AppState,
    user_id: u64,
) -> Result<Vec<SavedActivityView>> {
    let mut saved = state.db.get_saved_for_user(user_id).await?;
    saved.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));

    let ids: Vec<u64> = saved.iter().map(|s| s.activity_id).collect();
    let activities = state.db.get_activities_by_ids(&ids).await?;

    // Saves whose activity has since disappeared are dropped.
    Ok(saved
        .into_iter()
        .filter_map(|s| {
            activities
                .iter()
                .find(|a| a.activity_id == s.activity_id)
                .map(|a| SavedActivityView {
                    activity: a.clone(),
                    saved_at: s.saved_at,
                })
        })
        .collect())
}

// ─── Browsing ────────────────────────────────────────────────

/// The catalog with review counts and average ratings.
async fn list_activities(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ActivitySummary>>> {
    let activities = state.db.list_activities().await?;
    let ids: Vec<u64> = activities.iter().map(|a| a.activity_id).collect();
    let mut reviews = state.db.get_reviews_by_activity(&ids).await?;

    let summaries = activities
        .into_iter()
        .map(|activity| {
            let (review_count, average_rating) = reviews
                .remove(&activity.activity_id)
                .map(|r| summarize_reviews(&r))
                .unwrap_or((0, None));
            ActivitySummary {
                activity,
                review_count,
                average_rating,
            }
        })
        .collect();

    Ok(Json(summaries))
}

#[derive(Serialize)]
pub struct FilterResponse {
    pub count: usize,
    pub filters_applied: ActivityFilter,
    pub results: Vec<Activity>,
}

/// Filter the catalog.
async fn filter(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<ActivityFilter>, QueryRejection>,
) -> Result<Json<FilterResponse>> {
    let filter = query_params(params)?;
    let activities = state.db.list_activities().await?;
    let results = filter_activities(&activities, &filter);

    Ok(Json(FilterResponse {
        count: results.len(),
        filters_applied: filter,
        results,
    }))
}

#[derive(Serialize)]
pub struct ActivityDetail {
    #[serde(flatten)]
    pub activity: Activity,
    pub review_count: usize,
    pub average_rating: Option<f64>,
    pub reviews: Vec<Review>,
}

/// One activity with its reviews.
async fn get_activity(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<u64>,
) -> Result<Json<ActivityDetail>> {
    let activity = require_activity(&state, activity_id).await?;
    let mut reviews = state.db.get_reviews_for_activity(activity_id).await?;
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let (review_count, average_rating) = summarize_reviews(&reviews);

    Ok(Json(ActivityDetail {
        activity,
        review_count,
        average_rating,
        reviews,
    }))
}

// ─── Recommendations ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub user_id: Option<u64>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct RecommendationView {
    pub activity: Activity,
    pub score: f64,
    pub reason: String,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub user: UserSummary,
    pub recommendation_count: usize,
    pub recommendations: Vec<RecommendationView>,
}

/// Generate and store recommendations for a user.
async fn generate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>> {
    let user_id = payload
        .user_id
        .ok_or_else(|| AppError::BadRequest("user_id is required".to_string()))?;
    let limit = payload
        .limit
        .unwrap_or(DEFAULT_RECOMMENDATION_LIMIT)
        .clamp(1, MAX_RECOMMENDATION_LIMIT);

    let user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    let user_reviews = state.db.get_reviews_for_user(user_id).await?;
    let activities = state.db.list_activities().await?;

    let recommended = generate_recommendations(user_id, &user_reviews, &activities, limit);
    let liked = liked_categories(&user_reviews, &activities);

    let ids: Vec<u64> = recommended.iter().map(|a| a.activity_id).collect();
    let review_counts = state.db.get_reviews_by_activity(&ids).await?;

    let now = now_rfc3339();
    let views: Vec<RecommendationView> = recommended
        .into_iter()
        .map(|activity| {
            let count = review_counts
                .get(&activity.activity_id)
                .map_or(0, Vec::len);
            RecommendationView {
                score: calculate_recommendation_score(&liked, &activity, count),
                reason: format!("Based on your interest in {}", activity.category),
                activity,
            }
        })
        .collect();

    let records: Vec<Recommendation> = views
        .iter()
        .map(|v| Recommendation {
            user_id,
            activity_id: v.activity.activity_id,
            score: v.score,
            reason: v.reason.clone(),
            created_at: now.clone(),
        })
        .collect();
    state.db.batch_set_recommendations(&records).await?;

    tracing::info!(user_id, count = views.len(), "Recommendations generated");

    Ok(Json(GenerateResponse {
        user: UserSummary::from(&user),
        recommendation_count: views.len(),
        recommendations: views,
    }))
}

// ─── Saved activities ────────────────────────────────────────

#[derive(Serialize)]
pub struct UserSavedResponse {
    pub user: UserSummary,
    pub saved_count: usize,
    pub saved_activities: Vec<SavedActivityView>,
}

/// A user's saved activities.
async fn user_saved_activities(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<u64>,
) -> Result<Json<UserSavedResponse>> {
    let user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    let saved = load_saved_activities(&state, user_id).await?;

    Ok(Json(UserSavedResponse {
        user: UserSummary::from(&user),
        saved_count: saved.len(),
        saved_activities: saved,
    }))
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub status: &'static str,
    pub activity: Activity,
}

/// Bookmark an activity for the current user.
async fn save_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<u64>,
) -> Result<(StatusCode, Json<SaveResponse>)> {
    let activity = require_activity(&state, activity_id).await?;

    let created = state
        .db
        .save_activity(&SavedActivity {
            user_id: user.user_id,
            activity_id,
            saved_at: now_rfc3339(),
        })
        .await?;

    if !created {
        return Ok((
            StatusCode::OK,
            Json(SaveResponse {
                status: "already_saved",
                activity,
            }),
        ));
    }

    tracing::info!(user_id = user.user_id, activity_id, "Activity saved");

    Ok((
        StatusCode::CREATED,
        Json(SaveResponse {
            status: "saved",
            activity,
        }),
    ))
}

// ─── Reviews ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewInput {
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f64,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: String,
}

/// Review an activity as the current user.
async fn add_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<u64>,
    Json(payload): Json<ReviewInput>,
) -> Result<(StatusCode, Json<Review>)> {
    payload.validate()?;
    require_activity(&state, activity_id).await?;

    let review = Review {
        review_id: new_id()?,
        user_id: user.user_id,
        activity_id,
        rating: payload.rating,
        comment: payload.comment,
        created_at: now_rfc3339(),
    };
    state.db.add_review(&review).await?;

    tracing::info!(user_id = user.user_id, activity_id, "Review added");

    Ok((StatusCode::CREATED, Json(review)))
}

// ─── Catalog maintenance ─────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct ActivityInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[validate(range(min = 0.0))]
    pub cost: f64,
    #[validate(range(min = 1, max = 100000))]
    pub duration_minutes: u32,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub place_id: Option<String>,
}

impl ActivityInput {
    /// Trim the required text fields, then validate.
    fn check(&mut self) -> Result<()> {
        self.title = self.title.trim().to_string();
        self.category = self.category.trim().to_string();
        self.location = self.location.trim().to_string();
        self.validate()?;
        Ok(())
    }

    fn into_activity(self, activity_id: u64, created_at: String) -> Activity {
        Activity {
            activity_id,
            title: self.title,
            description: self.description,
            category: self.category,
            cost: self.cost,
            duration_minutes: self.duration_minutes,
            rating: self.rating,
            location: self.location,
            latitude: self.latitude,
            longitude: self.longitude,
            place_id: self.place_id,
            created_at,
        }
    }
}

/// Add an activity to the catalog.
async fn create_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(mut payload): Json<ActivityInput>,
) -> Result<(StatusCode, Json<Activity>)> {
    payload.check()?;

    let activity = payload.into_activity(new_id()?, now_rfc3339());
    state.db.upsert_activity(&activity).await?;

    tracing::info!(
        user_id = user.user_id,
        activity_id = activity.activity_id,
        "Activity created"
    );

    Ok((StatusCode::CREATED, Json(activity)))
}

/// Replace an activity's fields.
async fn update_activity(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<u64>,
    Json(mut payload): Json<ActivityInput>,
) -> Result<Json<Activity>> {
    payload.check()?;

    let existing = require_activity(&state, activity_id).await?;
    let activity = payload.into_activity(activity_id, existing.created_at);
    state.db.upsert_activity(&activity).await?;

    Ok(Json(activity))
}

/// Remove an activity with everything attached to it.
async fn delete_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<u64>,
) -> Result<StatusCode> {
    require_activity(&state, activity_id).await?;
    let deleted = state.db.delete_activity(activity_id).await?;

    tracing::info!(
        user_id = user.user_id,
        activity_id,
        deleted,
        "Activity removed from catalog"
    );

    Ok(StatusCode::NO_CONTENT)
}
