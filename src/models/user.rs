// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// Travel preference options offered on the profile page.
pub const PREFERENCE_OPTIONS: [&str; 9] = [
    "Adventure",
    "Beach",
    "City",
    "Culture",
    "Food",
    "History",
    "Nature",
    "Shopping",
    "Sports",
];

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID (also used as document ID)
    pub user_id: u64,
    /// Display name
    pub username: String,
    /// Email address (unique, lowercased)
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub phone: String,
    /// Selected travel preferences (subset of `PREFERENCE_OPTIONS`)
    #[serde(default)]
    pub preferences: Vec<String>,
    /// When the user registered
    pub created_at: String,
    /// Most recent login
    #[serde(default)]
    pub last_login: Option<String>,
}

/// Login credentials, keyed by normalized email.
///
/// Stored apart from the profile so that profile reads never carry the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: u64,
    pub email: String,
    /// PBKDF2 hash in `pbkdf2_sha256$iterations$salt$hash` form
    pub password_hash: String,
}

/// Normalize an email for lookups and uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check that every preference is one of the offered options.
pub fn invalid_preferences(preferences: &[String]) -> Vec<&str> {
    preferences
        .iter()
        .map(String::as_str)
        .filter(|p| !PREFERENCE_OPTIONS.contains(p))
        .collect()
}
