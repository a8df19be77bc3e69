// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod password;
pub mod places;
pub mod recommendation;
pub mod travel;

pub use places::{PlacesClient, PlacesError};
pub use travel::{SearchQuery, TravelActivityService};
