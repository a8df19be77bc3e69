// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Maps web service client.
//!
//! Handles:
//! - Geocoding place names (with a small LRU cache)
//! - Nearby search and place details
//! - Distance Matrix lookups in batches
//! - Client-side rate limiting and retry of transient failures

use crate::config::GoogleApiConfig;
use crate::error::AppError;
use crate::geo_utils::validate_location;
use crate::models::{LatLng, OpeningHours, Place, PlaceReview};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const GEOCODE_CACHE_CAPACITY: usize = 100;
const GEOCODE_ATTEMPTS: u32 = 3;
const SEARCH_ATTEMPTS: u32 = 2;
const NEARBY_PHOTO_LIMIT: usize = 3;
const DETAILS_PHOTO_LIMIT: usize = 5;
const DETAILS_REVIEW_LIMIT: usize = 5;
const PHOTO_MAX_WIDTH: u32 = 400;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
const DETAILS_FIELDS: &str = "name,rating,formatted_address,geometry,opening_hours,price_level,reviews,photos,types,user_ratings_total";

/// Errors from Google Maps web service calls.
#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("{endpoint} returned status {status}: {message}")]
    Status {
        endpoint: &'static str,
        status: String,
        message: String,
    },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("invalid location: ({lat}, {lng})")]
    InvalidLocation { lat: f64, lng: f64 },
}

impl PlacesError {
    /// Whether the failure is transient and worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            PlacesError::Transport(_) | PlacesError::Timeout => true,
            PlacesError::Http { status, .. } => *status == 429 || *status >= 500,
            PlacesError::Status { status, .. } => status == "UNKNOWN_ERROR",
            PlacesError::Parse(_) | PlacesError::InvalidLocation { .. } => false,
        }
    }

    fn from_status(endpoint: &'static str, status: String, message: Option<String>) -> Self {
        PlacesError::Status {
            endpoint,
            status,
            message: message.unwrap_or_else(|| "no details".to_string()),
        }
    }
}

impl From<PlacesError> for AppError {
    fn from(err: PlacesError) -> Self {
        match err {
            PlacesError::InvalidLocation { .. } => AppError::BadRequest(err.to_string()),
            other => AppError::PlacesApi(other.to_string()),
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> PlacesError {
    if err.is_timeout() {
        PlacesError::Timeout
    } else {
        // Request URLs carry the API key; keep them out of errors and logs.
        PlacesError::Transport(err.without_url().to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate limiting and caching
// ─────────────────────────────────────────────────────────────────────────────

/// Spaces calls at least `1 / calls_per_second` apart.
///
/// Callers queue on the mutex, so waits are served in order.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn per_second(calls_per_second: u32) -> Self {
        Self {
            min_interval: Duration::from_secs(1) / calls_per_second.max(1),
            last_call: Mutex::new(None),
        }
    }

    /// Wait until another call is allowed.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(prev) = *last_call {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::debug!(wait_ms = wait.as_millis() as u64, "Rate limiting Places request");
                tokio::time::sleep(wait).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

struct CachedLocation {
    location: Option<LatLng>,
    last_used: u64,
}

/// Bounded geocode cache with least-recently-used eviction.
struct GeocodeCache {
    entries: DashMap<String, CachedLocation>,
    clock: AtomicU64,
    capacity: usize,
}

impl GeocodeCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            clock: AtomicU64::new(0),
            capacity,
        }
    }

    /// Outer `None` is a miss; inner `None` is a cached "not found".
    fn get(&self, query: &str) -> Option<Option<LatLng>> {
        let tick = self.clock.fetch_add(1, Ordering::Relaxed);
        self.entries.get_mut(query).map(|mut entry| {
            entry.last_used = tick;
            entry.location
        })
    }

    fn insert(&self, query: String, location: Option<LatLng>) {
        let tick = self.clock.fetch_add(1, Ordering::Relaxed);

        if self.entries.len() >= self.capacity && !self.entries.contains_key(&query) {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().last_used)
                .map(|entry| entry.key().clone());
            if let Some(key) = oldest {
                self.entries.remove(&key);
            }
        }

        self.entries.insert(
            query,
            CachedLocation {
                location,
                last_used: tick,
            },
        );
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    /// Parsed one by one so a malformed entry does not sink the page.
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    result: Option<RawPlace>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    #[serde(default)]
    place_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    vicinity: Option<String>,
    #[serde(default)]
    formatted_address: Option<String>,
    geometry: Geometry,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    user_ratings_total: Option<u32>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    opening_hours: Option<OpeningHours>,
    #[serde(default)]
    price_level: Option<u8>,
    #[serde(default)]
    photos: Vec<RawPhoto>,
    #[serde(default)]
    reviews: Vec<RawReview>,
}

#[derive(Debug, Deserialize)]
struct RawPhoto {
    photo_reference: String,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<DistanceMatrixRow>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixRow {
    #[serde(default)]
    elements: Vec<DistanceMatrixElement>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixElement {
    status: String,
    #[serde(default)]
    distance: Option<DistanceValue>,
}

#[derive(Debug, Deserialize)]
struct DistanceValue {
    /// Meters
    value: f64,
}

/// Which address field a response fills.
#[derive(Clone, Copy)]
enum AddressSource {
    Vicinity,
    Formatted,
}

// ─────────────────────────────────────────────────────────────────────────────
// PlacesClient
// ─────────────────────────────────────────────────────────────────────────────

/// Google Maps web service client.
#[derive(Clone)]
pub struct PlacesClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    batch_size: usize,
    retry_delay: Duration,
    search_limiter: Arc<RateLimiter>,
    details_limiter: Arc<RateLimiter>,
    geocode_cache: Arc<GeocodeCache>,
}

impl PlacesClient {
    /// Create a client from configuration.
    pub fn new(config: &GoogleApiConfig) -> Result<Self, PlacesError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(map_reqwest_error)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            batch_size: config.batch_size.max(1),
            retry_delay: DEFAULT_RETRY_DELAY,
            search_limiter: Arc::new(RateLimiter::per_second(config.rate_limit_per_sec)),
            details_limiter: Arc::new(RateLimiter::per_second(
                (config.rate_limit_per_sec / 2).max(1),
            )),
            geocode_cache: Arc::new(GeocodeCache::new(GEOCODE_CACHE_CAPACITY)),
        })
    }

    /// Override the base delay between retries (attempt `n` waits `n × delay`).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// API key, needed by pages that load the Maps JavaScript API.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Number of cached geocode results.
    pub fn cached_geocodes(&self) -> usize {
        self.geocode_cache.len()
    }

    /// Build a photo URL from a photo reference.
    pub fn photo_url(&self, photo_reference: &str) -> String {
        format!(
            "{}/place/photo?maxwidth={}&photoreference={}&key={}",
            self.base_url,
            PHOTO_MAX_WIDTH,
            urlencoding::encode(photo_reference),
            urlencoding::encode(&self.api_key)
        )
    }

    // ─── Geocoding ───────────────────────────────────────────────────────────

    /// Translate a place name into coordinates.
    ///
    /// Returns `Ok(None)` when Google finds nothing. Both outcomes are cached.
    pub async fn geocode(&self, query: &str) -> Result<Option<LatLng>, PlacesError> {
        if let Some(cached) = self.geocode_cache.get(query) {
            tracing::debug!(query, "Geocode cache hit");
            return Ok(cached);
        }

        let location = self
            .with_retry("geocode", GEOCODE_ATTEMPTS, || self.fetch_geocode(query))
            .await?;

        self.geocode_cache.insert(query.to_string(), location);
        Ok(location)
    }

    async fn fetch_geocode(&self, query: &str) -> Result<Option<LatLng>, PlacesError> {
        self.search_limiter.acquire().await;

        let url = format!("{}/geocode/json", self.base_url);
        let data: GeocodeResponse = self
            .get_json(&url, &[("address", query.to_string())])
            .await?;

        match data.status.as_str() {
            "OK" => {
                let location = data.results.into_iter().next().map(|r| r.geometry.location);
                if let Some(loc) = location {
                    tracing::info!(query, lat = loc.lat, lng = loc.lng, "Geocoded location");
                }
                Ok(location)
            }
            "ZERO_RESULTS" => {
                tracing::warn!(query, "Location not found");
                Ok(None)
            }
            _ => {
                if data.status == AppError::PLACES_REQUEST_DENIED {
                    tracing::error!("Geocoding request denied - check the API key");
                }
                Err(PlacesError::from_status(
                    "geocode",
                    data.status,
                    data.error_message,
                ))
            }
        }
    }

    // ─── Nearby Search ───────────────────────────────────────────────────────

    /// Search for places of one type around a location.
    pub async fn nearby_search(
        &self,
        location: LatLng,
        place_type: &str,
        radius: u32,
        max_results: usize,
    ) -> Result<Vec<Place>, PlacesError> {
        if !validate_location(&location) {
            return Err(PlacesError::InvalidLocation {
                lat: location.lat,
                lng: location.lng,
            });
        }

        self.with_retry("nearby_search", SEARCH_ATTEMPTS, || {
            self.fetch_nearby(location, place_type, radius, max_results)
        })
        .await
    }

    async fn fetch_nearby(
        &self,
        location: LatLng,
        place_type: &str,
        radius: u32,
        max_results: usize,
    ) -> Result<Vec<Place>, PlacesError> {
        self.search_limiter.acquire().await;

        let url = format!("{}/place/nearbysearch/json", self.base_url);
        let data: NearbySearchResponse = self
            .get_json(
                &url,
                &[
                    ("location", format!("{},{}", location.lat, location.lng)),
                    ("radius", radius.to_string()),
                    ("type", place_type.to_string()),
                ],
            )
            .await?;

        match data.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => return Ok(Vec::new()),
            _ => {
                return Err(PlacesError::from_status(
                    "nearby_search",
                    data.status,
                    data.error_message,
                ))
            }
        }

        let places: Vec<Place> = data
            .results
            .into_iter()
            .take(max_results)
            .filter_map(|value| match serde_json::from_value::<RawPlace>(value) {
                Ok(raw) => Some(self.build_place(
                    raw,
                    None,
                    AddressSource::Vicinity,
                    NEARBY_PHOTO_LIMIT,
                    0,
                )),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unparseable place");
                    None
                }
            })
            .collect();

        tracing::info!(count = places.len(), place_type, "Found nearby places");
        Ok(places)
    }

    // ─── Place Details ───────────────────────────────────────────────────────

    /// Fetch full details, including reviews, for a place.
    ///
    /// Returns `Ok(None)` for unknown or malformed place IDs.
    pub async fn place_details(&self, place_id: &str) -> Result<Option<Place>, PlacesError> {
        self.with_retry("place_details", SEARCH_ATTEMPTS, || {
            self.fetch_details(place_id)
        })
        .await
    }

    async fn fetch_details(&self, place_id: &str) -> Result<Option<Place>, PlacesError> {
        self.details_limiter.acquire().await;

        let url = format!("{}/place/details/json", self.base_url);
        let data: DetailsResponse = self
            .get_json(
                &url,
                &[
                    ("place_id", place_id.to_string()),
                    ("fields", DETAILS_FIELDS.to_string()),
                ],
            )
            .await?;

        match data.status.as_str() {
            "OK" => {}
            "NOT_FOUND" | "ZERO_RESULTS" | "INVALID_REQUEST" => {
                tracing::warn!(place_id, status = %data.status, "Place details not found");
                return Ok(None);
            }
            _ => {
                return Err(PlacesError::from_status(
                    "place_details",
                    data.status,
                    data.error_message,
                ))
            }
        }

        let raw = data
            .result
            .ok_or_else(|| PlacesError::Parse("details response without result".to_string()))?;

        let place = self.build_place(
            raw,
            Some(place_id),
            AddressSource::Formatted,
            DETAILS_PHOTO_LIMIT,
            DETAILS_REVIEW_LIMIT,
        );
        tracing::info!(place_id, name = %place.name, "Retrieved place details");
        Ok(Some(place))
    }

    // ─── Distance Matrix ─────────────────────────────────────────────────────

    /// Fill `distance` (meters from `origin`) for each place.
    ///
    /// Failed batches are logged and skipped. Returns how many distances
    /// were set.
    pub async fn distance_matrix(&self, origin: LatLng, places: &mut [Place]) -> usize {
        if places.is_empty() || !validate_location(&origin) {
            return 0;
        }

        let mut updated = 0;
        for (batch_index, batch) in places.chunks_mut(self.batch_size).enumerate() {
            let destinations: Vec<String> = batch
                .iter()
                .map(|p| format!("{},{}", p.location.lat, p.location.lng))
                .collect();
            let destinations = destinations.join("|");

            let result = self
                .with_retry("distance_matrix", SEARCH_ATTEMPTS, || {
                    self.fetch_distances(origin, &destinations)
                })
                .await;

            match result {
                Ok(distances) => {
                    for (place, distance) in batch.iter_mut().zip(distances) {
                        if let Some(meters) = distance {
                            place.distance = Some(meters);
                            updated += 1;
                        }
                    }
                    tracing::debug!(batch = batch_index + 1, "Calculated distances for batch");
                }
                Err(e) => {
                    tracing::error!(
                        batch = batch_index + 1,
                        error = %e,
                        "Distance calculation failed for batch"
                    );
                }
            }
        }

        updated
    }

    async fn fetch_distances(
        &self,
        origin: LatLng,
        destinations: &str,
    ) -> Result<Vec<Option<f64>>, PlacesError> {
        self.search_limiter.acquire().await;

        let url = format!("{}/distancematrix/json", self.base_url);
        let data: DistanceMatrixResponse = self
            .get_json(
                &url,
                &[
                    ("origins", format!("{},{}", origin.lat, origin.lng)),
                    ("destinations", destinations.to_string()),
                ],
            )
            .await?;

        if data.status != "OK" {
            return Err(PlacesError::from_status(
                "distance_matrix",
                data.status,
                data.error_message,
            ));
        }

        let row = data
            .rows
            .into_iter()
            .next()
            .ok_or_else(|| PlacesError::Parse("distance matrix without rows".to_string()))?;

        Ok(row
            .elements
            .into_iter()
            .map(|e| match (e.status.as_str(), e.distance) {
                ("OK", Some(d)) => Some(d.value),
                _ => None,
            })
            .collect())
    }

    // ─── Helpers ─────────────────────────────────────────────────────────────

    fn build_place(
        &self,
        raw: RawPlace,
        place_id: Option<&str>,
        address_source: AddressSource,
        photo_limit: usize,
        review_limit: usize,
    ) -> Place {
        let address = match address_source {
            AddressSource::Vicinity => raw.vicinity.or(raw.formatted_address),
            AddressSource::Formatted => raw.formatted_address.or(raw.vicinity),
        };

        Place {
            place_id: place_id
                .map(str::to_string)
                .or(raw.place_id)
                .unwrap_or_default(),
            name: raw.name.unwrap_or_else(|| "Unknown".to_string()),
            address: address.unwrap_or_default(),
            location: raw.geometry.location,
            rating: raw.rating,
            user_ratings_total: raw.user_ratings_total,
            types: raw.types,
            opening_hours: raw.opening_hours,
            price_level: raw.price_level,
            photos: raw
                .photos
                .iter()
                .take(photo_limit)
                .map(|p| self.photo_url(&p.photo_reference))
                .collect(),
            reviews: raw
                .reviews
                .into_iter()
                .take(review_limit)
                .map(|r| PlaceReview {
                    author: r.author_name.unwrap_or_else(|| "Anonymous".to_string()),
                    rating: r.rating,
                    text: r.text.unwrap_or_default(),
                    time: r.time,
                })
                .collect(),
            distance: None,
        }
    }

    /// GET a JSON endpoint with the API key appended.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, PlacesError> {
        let response = self
            .http
            .get(url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                tracing::warn!("Google Maps rate limit hit (429)");
            }
            return Err(PlacesError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PlacesError::Parse(e.without_url().to_string()))
    }

    /// Run `op` up to `max_attempts` times, retrying transient failures.
    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        max_attempts: u32,
        mut op: F,
    ) -> Result<T, PlacesError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PlacesError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(operation, attempt, error = %e, "Places request failed, retrying");
                    tokio::time::sleep(self.retry_delay * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    if attempt > 1 {
                        tracing::error!(operation, attempts = attempt, error = %e, "Places request failed after retries");
                    }
                    return Err(e);
                }
            }
        }
    }
}
