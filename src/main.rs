// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Travel Buddy API Server
//!
//! Serves activity search backed by Google Maps, trip drafting and
//! catalog recommendations.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use travel_buddy::{
    config::Config,
    db::FirestoreDb,
    services::{PlacesClient, TravelActivityService},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Travel Buddy API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    // Google Maps client and recommendation pipeline
    let places = PlacesClient::new(&config.google_api)?;
    let travel = TravelActivityService::new(places, config.search.clone());
    tracing::info!(
        base_url = %config.google_api.base_url,
        rate_limit = config.google_api.rate_limit_per_sec,
        "Places client initialized"
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        travel,
    });

    // Build router
    let app = travel_buddy::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("travel_buddy=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
