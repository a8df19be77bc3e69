// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog activity model and the records users attach to activities.

use crate::models::place::LatLng;
use serde::{Deserialize, Serialize};

/// Curated activity stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity ID (also used as document ID)
    pub activity_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Free-form category (e.g. "Museum", "Food Tour")
    pub category: String,
    /// Cost per person
    pub cost: f64,
    /// Typical duration in minutes
    pub duration_minutes: u32,
    /// Average rating (0-5)
    #[serde(default)]
    pub rating: Option<f64>,
    /// Human-readable location (city, neighbourhood)
    pub location: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Google place this activity was imported from, if any
    #[serde(default)]
    pub place_id: Option<String>,
    pub created_at: String,
}

impl Activity {
    /// Coordinates, if both latitude and longitude are known.
    pub fn coordinates(&self) -> Option<LatLng> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
            _ => None,
        }
    }
}

/// A user's review of a catalog activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub review_id: u64,
    pub user_id: u64,
    pub activity_id: u64,
    /// Rating between 0 and 5
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
    pub created_at: String,
}

/// An activity bookmarked by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedActivity {
    pub user_id: u64,
    pub activity_id: u64,
    pub saved_at: String,
}

impl SavedActivity {
    pub fn document_id(user_id: u64, activity_id: u64) -> String {
        format!("{}_{}", user_id, activity_id)
    }
}

/// A generated recommendation, kept for later display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub user_id: u64,
    pub activity_id: u64,
    pub score: f64,
    pub reason: String,
    pub created_at: String,
}

impl Recommendation {
    pub fn document_id(&self) -> String {
        format!("{}_{}", self.user_id, self.activity_id)
    }
}
