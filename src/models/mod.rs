// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod activity;
pub mod place;
pub mod search;
pub mod trip;
pub mod user;

pub use activity::{Activity, Recommendation, Review, SavedActivity};
pub use place::{LatLng, OpeningHours, Place, PlaceReview};
pub use search::{QueryInfo, SortBy, TravelRecommendation};
pub use trip::{Trip, TripActivity};
pub use user::{Credentials, User};
