// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use travel_buddy::error::AppError;
use travel_buddy::services::PlacesError;

#[test]
fn test_is_places_quota_error_matches() {
    let err = AppError::PlacesApi(format!(
        "nearby_search returned status {}: You have exceeded your daily request quota",
        AppError::PLACES_QUOTA_EXCEEDED
    ));
    assert!(err.is_places_quota_error());

    let err = AppError::from(PlacesError::Http {
        status: 429,
        body: "Too Many Requests".to_string(),
    });
    assert!(err.is_places_quota_error());
}

#[test]
fn test_is_places_quota_error_no_match() {
    let err = AppError::PlacesApi(AppError::PLACES_REQUEST_DENIED.to_string());
    assert!(!err.is_places_quota_error());

    let err = AppError::PlacesApi("request timed out".to_string());
    assert!(!err.is_places_quota_error());

    let err = AppError::BadRequest(AppError::PLACES_QUOTA_EXCEEDED.to_string());
    assert!(!err.is_places_quota_error());
}

#[test]
fn test_places_errors_map_to_status_codes() {
    let upstream = AppError::from(PlacesError::Timeout).into_response();
    assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);

    let invalid = AppError::from(PlacesError::InvalidLocation {
        lat: 91.0,
        lng: 0.0,
    })
    .into_response();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_database_errors_hide_details() {
    let response = AppError::Database("connection refused".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(
        AppError::Conflict("email taken".to_string())
            .into_response()
            .status(),
        StatusCode::CONFLICT
    );
}
