// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration and session routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::new_id;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_DAYS};
use crate::models::user::normalize_email;
use crate::models::{Credentials, User};
use crate::services::password::{hash_password, verify_password};
use crate::time_utils::now_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

// ─── Registration ────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub last_name: String,
}

impl RegisterRequest {
    /// Trim the username, then validate fields and the password confirmation.
    fn check(&mut self) -> Result<()> {
        self.username = self.username.trim().to_string();
        self.validate()?;

        if self.password != self.password_confirm {
            return Err(AppError::BadRequest("Passwords do not match".to_string()));
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RegisterResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub user_id: u64,
    pub username: String,
}

/// Create a user account.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    payload.check()?;

    let email = normalize_email(&payload.email);
    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing task failed: {}", e)))??;

    let user_id = new_id()?;
    let user = User {
        user_id,
        username: payload.username,
        email: email.clone(),
        first_name: payload.first_name,
        last_name: payload.last_name,
        bio: String::new(),
        phone: String::new(),
        preferences: Vec::new(),
        created_at: now_rfc3339(),
        last_login: None,
    };
    let credentials = Credentials {
        user_id,
        email,
        password_hash,
    };

    state.db.create_user(&user, &credentials).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id,
            username: user.username,
        }),
    ))
}

// ─── Login / Logout ──────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub user_id: u64,
    pub token: String,
}

/// Check credentials and start a session.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    payload.validate()?;

    let email = normalize_email(&payload.email);
    let Some(credentials) = state.db.get_credentials(&email).await? else {
        tracing::info!("Login for unknown email");
        return Err(AppError::Unauthorized);
    };

    let password = payload.password;
    let hash = credentials.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password check task failed: {}", e)))?;

    if !valid {
        tracing::info!(user_id = credentials.user_id, "Login with wrong password");
        return Err(AppError::Unauthorized);
    }

    if let Some(mut user) = state.db.get_user(credentials.user_id).await? {
        user.last_login = Some(now_rfc3339());
        state.db.upsert_user(&user).await?;
    }

    let token = create_jwt(credentials.user_id, &state.config.jwt_signing_key)?;
    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::days(SESSION_DAYS))
        .secure(state.config.secure_cookies())
        .build();

    tracing::info!(user_id = credentials.user_id, "User logged in");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            user_id: credentials.user_id,
            token,
        }),
    ))
}

/// End the session by expiring the cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::ZERO)
        .secure(state.config.secure_cookies())
        .build();

    (jar.add(cookie), StatusCode::NO_CONTENT)
}
