// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip drafts and the activities linked to them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A trip planned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Trip ID (also used as document ID)
    pub trip_id: u64,
    /// Owner
    pub user_id: u64,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: String,
}

/// Join record linking a catalog activity to a trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripActivity {
    pub trip_id: u64,
    /// Trip owner, kept for cascade deletes
    pub user_id: u64,
    pub activity_id: u64,
    pub added_at: String,
}

impl TripActivity {
    pub fn document_id(trip_id: u64, activity_id: u64) -> String {
        format!("{}_{}", trip_id, activity_id)
    }
}

/// Split trips into the next few upcoming and the most recent past ones.
///
/// Upcoming trips start today or later, earliest first. Past trips ended
/// before today, latest first. Both lists hold at most `limit` trips.
pub fn partition_trips(trips: &[Trip], today: NaiveDate, limit: usize) -> (Vec<Trip>, Vec<Trip>) {
    let mut upcoming: Vec<Trip> = trips
        .iter()
        .filter(|t| t.start_date >= today)
        .cloned()
        .collect();
    upcoming.sort_by_key(|t| t.start_date);
    upcoming.truncate(limit);

    let mut past: Vec<Trip> = trips
        .iter()
        .filter(|t| t.end_date < today)
        .cloned()
        .collect();
    past.sort_by(|a, b| b.end_date.cmp(&a.end_date));
    past.truncate(limit);

    (upcoming, past)
}
