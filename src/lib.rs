// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Travel Buddy: trip planning and activity discovery.
//!
//! This crate provides the backend API for finding things to do around a
//! destination through Google Maps, drafting trips from a curated activity
//! catalog, and recommending activities from user reviews and preferences.

pub mod config;
pub mod db;
pub mod error;
pub mod geo_utils;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::TravelActivityService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub travel: TravelActivityService,
}
