// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default Google Maps web service base URL.
pub const DEFAULT_MAPS_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL (CORS origin, cookie `Secure` flag)
    pub frontend_url: String,
    /// GCP project ID for Firestore
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Google Maps web service settings
    pub google_api: GoogleApiConfig,
    /// Defaults applied to activity searches
    pub search: SearchDefaults,
}

/// Google Maps web service settings.
#[derive(Debug, Clone)]
pub struct GoogleApiConfig {
    pub api_key: String,
    /// Base URL for all web service endpoints (overridable for tests)
    pub base_url: String,
    pub timeout_secs: u64,
    /// Maximum calls per second for search endpoints
    pub rate_limit_per_sec: u32,
    /// Destinations per Distance Matrix request
    pub batch_size: usize,
}

impl GoogleApiConfig {
    /// Load Google Maps settings from environment variables.
    ///
    /// Only `GOOGLE_API_KEY` is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env::var("GOOGLE_API_KEY")
                .map(|v| v.trim().to_string())
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing("GOOGLE_API_KEY"))?,
            base_url: env::var("GOOGLE_MAPS_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_MAPS_BASE_URL.to_string()),
            timeout_secs: parse_var("GOOGLE_API_TIMEOUT_SECS", 10)?,
            rate_limit_per_sec: parse_var("GOOGLE_API_RATE_LIMIT", 10)?,
            batch_size: parse_var("GOOGLE_API_BATCH_SIZE", 25)?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Search defaults.
#[derive(Debug, Clone)]
pub struct SearchDefaults {
    /// Search radius in meters
    pub radius: u32,
    /// Cap on nearby search results per type
    pub max_results: usize,
}

impl SearchDefaults {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            radius: parse_var("SEARCH_DEFAULT_RADIUS", 5000)?,
            max_results: parse_var("SEARCH_MAX_RESULTS", 20)?,
        })
    }
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8000,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            google_api: GoogleApiConfig {
                api_key: "test_api_key".to_string(),
                base_url: DEFAULT_MAPS_BASE_URL.to_string(),
                timeout_secs: 10,
                rate_limit_per_sec: 10,
                batch_size: 25,
            },
            search: SearchDefaults {
                radius: 5000,
                max_results: 20,
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_var("PORT", 8000)?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            google_api: GoogleApiConfig::from_env()?,
            search: SearchDefaults::from_env()?,
        })
    }

    /// Whether session cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Read an optional numeric variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
