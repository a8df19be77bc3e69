// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::Router;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use travel_buddy::config::Config;
use travel_buddy::db::FirestoreDb;
use travel_buddy::routes::create_router;
use travel_buddy::services::{PlacesClient, TravelActivityService};
use travel_buddy::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Config pointing the Places client at `base_url`, without rate limiting
/// getting in the way of tests.
#[allow(dead_code)]
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.google_api.base_url = base_url.to_string();
    config.google_api.rate_limit_per_sec = 1000;
    config.google_api.timeout_secs = 5;
    config
}

/// Places client for a fake server, retrying without delay.
#[allow(dead_code)]
pub fn test_places_client(config: &Config) -> PlacesClient {
    PlacesClient::new(&config.google_api)
        .expect("Failed to build Places client")
        .with_retry_delay(Duration::ZERO)
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with_config(Config::default())
}

/// Create a test app using `config` with an offline database.
#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    create_test_app_with_db(config, test_db_offline())
}

/// Create a test app backed by `db`.
#[allow(dead_code)]
pub fn create_test_app_with_db(config: Config, db: FirestoreDb) -> (Router, Arc<AppState>) {
    let places = test_places_client(&config);
    let travel = TravelActivityService::new(places, config.search.clone());

    let state = Arc::new(AppState { config, db, travel });

    (create_router(state.clone()), state)
}

/// Create a test JWT token.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: u64, signing_key: &[u8]) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + 86400,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

/// Serve `router` on an ephemeral local port, returning its base URL.
#[allow(dead_code)]
pub async fn spawn_fake_google(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake server");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}
