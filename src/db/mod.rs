// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

use crate::error::AppError;
use ring::rand::{SecureRandom, SystemRandom};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Login credentials (keyed by normalized email)
    pub const CREDENTIALS: &str = "credentials";
    pub const TRIPS: &str = "trips";
    /// Trip-activity links (keyed by `{trip_id}_{activity_id}`)
    pub const TRIP_ACTIVITIES: &str = "trip_activities";
    pub const ACTIVITIES: &str = "activities";
    pub const REVIEWS: &str = "reviews";
    /// Bookmarks (keyed by `{user_id}_{activity_id}`)
    pub const SAVED_ACTIVITIES: &str = "saved_activities";
    pub const RECOMMENDATIONS: &str = "recommendations";
}

/// Largest integer a JavaScript number represents exactly.
const MAX_SAFE_ID: u64 = (1 << 53) - 1;

/// Generate a random document ID in `1..=2^53-1`.
pub fn new_id() -> Result<u64, AppError> {
    let mut bytes = [0u8; 8];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate random ID")))?;
    Ok((u64::from_le_bytes(bytes) & MAX_SAFE_ID).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_in_safe_range() {
        for _ in 0..100 {
            let id = new_id().unwrap();
            assert!(id >= 1 && id <= MAX_SAFE_ID);
        }
        assert_ne!(new_id().unwrap(), new_id().unwrap());
    }
}
