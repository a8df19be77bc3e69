// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Search, route planning and map endpoint tests.
//!
//! These tests verify that:
//! 1. The search pipeline merges, deduplicates and sorts per-type results
//! 2. Unknown locations and places are reported without failing the server
//! 3. Route, ranking and map endpoints work without any Google calls

use axum::{
    body::Body,
    extract::Query,
    http::{header, Request, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use tower::ServiceExt;

mod common;

type Params = Query<HashMap<String, String>>;

fn nearby_place(id: &str, lat: f64, lng: f64, rating: f64, total: u32, types: &[&str]) -> Value {
    json!({
        "place_id": id,
        "name": format!("Place {}", id),
        "vicinity": "Somewhere",
        "geometry": {"location": {"lat": lat, "lng": lng}},
        "rating": rating,
        "user_ratings_total": total,
        "types": types
    })
}

fn place_body(id: &str, lat: f64, lng: f64, rating: f64, types: &[&str]) -> Value {
    json!({
        "place_id": id,
        "name": format!("Place {}", id),
        "address": "",
        "location": {"lat": lat, "lng": lng},
        "rating": rating,
        "types": types
    })
}

/// Fake Google Maps API knowing only "Tokyo" with a museum and a park
/// sharing one place.
fn fake_google() -> Router {
    Router::new()
        .route(
            "/geocode/json",
            get(|Query(q): Params| async move {
                match q.get("address").map(String::as_str) {
                    Some("Tokyo") => Json(json!({
                        "status": "OK",
                        "results": [{"geometry": {"location": {"lat": 35.68, "lng": 139.76}}}]
                    })),
                    Some("Denied") => Json(json!({"status": "REQUEST_DENIED"})),
                    _ => Json(json!({"status": "ZERO_RESULTS", "results": []})),
                }
            }),
        )
        .route(
            "/place/nearbysearch/json",
            get(|Query(q): Params| async move {
                let results = match q.get("type").map(String::as_str) {
                    Some("museum") => vec![
                        nearby_place("a", 35.69, 139.70, 4.2, 300, &["museum"]),
                        nearby_place("shared", 35.70, 139.77, 4.8, 900, &["museum", "park"]),
                    ],
                    Some("park") => vec![
                        nearby_place("shared", 35.70, 139.77, 4.8, 900, &["museum", "park"]),
                        nearby_place("b", 35.66, 139.75, 4.9, 10, &["park"]),
                    ],
                    _ => vec![],
                };
                let status = if results.is_empty() { "ZERO_RESULTS" } else { "OK" };
                Json(json!({"status": status, "results": results}))
            }),
        )
        .route(
            "/distancematrix/json",
            get(|Query(q): Params| async move {
                let elements: Vec<Value> = q["destinations"]
                    .split('|')
                    .enumerate()
                    .map(|(i, _)| json!({"status": "OK", "distance": {"value": 500.0 * (i + 1) as f64}}))
                    .collect();
                Json(json!({"status": "OK", "rows": [{"elements": elements}]}))
            }),
        )
        .route(
            "/place/details/json",
            get(|Query(q): Params| async move {
                if q.get("place_id").map(String::as_str) == Some("shared") {
                    Json(json!({
                        "status": "OK",
                        "result": {
                            "name": "Shared Place",
                            "formatted_address": "1 Shared Street",
                            "geometry": {"location": {"lat": 35.70, "lng": 139.77}},
                            "rating": 4.8
                        }
                    }))
                } else {
                    Json(json!({"status": "NOT_FOUND"}))
                }
            }),
        )
}

async fn app_with_fake_google() -> Router {
    let base_url = common::spawn_fake_google(fake_google()).await;
    let (app, _) = common::create_test_app_with_config(common::test_config(&base_url));
    app
}

async fn get_request(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn body_text(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

fn ids(places: &Value) -> Vec<&str> {
    places
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["place_id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_search_merges_and_sorts_by_rating() {
    let app = app_with_fake_google().await;

    let response = get_request(app, "/api/search?q=Tokyo&types=museum,park").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(ids(&json["activities"]), vec!["b", "shared", "a"]);
    assert_eq!(json["total_count"], 3);
    assert_eq!(json["search_location"]["lat"], 35.68);
    assert_eq!(json["query_info"]["query"], "Tokyo");
    assert_eq!(json["query_info"]["sort_by"], "rating");
    assert_eq!(json["query_info"]["activity_types"], json!(["museum", "park"]));
    assert!(json["query_info"].get("error").is_none());
    for activity in json["activities"].as_array().unwrap() {
        assert!(activity["distance"].as_f64().unwrap() > 0.0);
    }
}

#[tokio::test]
async fn test_search_sort_by_reviews() {
    let app = app_with_fake_google().await;

    let response = get_request(app, "/api/search?q=Tokyo&types=museum,park&sort_by=reviews").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(ids(&json["activities"]), vec!["shared", "a", "b"]);
}

#[tokio::test]
async fn test_search_location_not_found() {
    let app = app_with_fake_google().await;

    let response = get_request(app, "/api/search?q=Atlantis").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["activities"], json!([]));
    assert_eq!(json["total_count"], 0);
    assert!(json["search_location"].is_null());
    assert_eq!(json["query_info"]["error"], "Location not found");
}

#[tokio::test]
async fn test_search_denied_key_is_bad_gateway() {
    let app = app_with_fake_google().await;

    let response = get_request(app, "/api/search?q=Denied").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "places_error");
}

#[tokio::test]
async fn test_place_details_found_and_missing() {
    let app = app_with_fake_google().await;

    let found = get_request(app.clone(), "/api/places/shared").await;
    assert_eq!(found.status(), StatusCode::OK);
    let json = body_json(found).await;
    assert_eq!(json["place_id"], "shared");
    assert_eq!(json["name"], "Shared Place");
    assert_eq!(json["address"], "1 Shared Street");

    let missing = get_request(app, "/api/places/nowhere").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_route_orders_by_nearest_stop() {
    let (app, _) = common::create_test_app();

    let response = post_json(
        app,
        "/api/route",
        json!({
            "start": {"lat": 0.0, "lng": 0.0},
            "activities": [
                place_body("far", 0.0, 0.3, 4.0, &[]),
                place_body("near", 0.0, 0.1, 4.0, &[]),
                place_body("mid", 0.0, 0.2, 4.0, &[])
            ]
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(ids(&json["route"]), vec!["near", "mid", "far"]);
    assert_eq!(json["stops"], 3);
    // 0.3 degrees of longitude at the equator is about 33 km.
    let total = json["total_distance"].as_f64().unwrap();
    assert!((total - 33_358.0).abs() < 100.0, "total {total}");
    assert!(json["total_distance_text"].as_str().unwrap().ends_with("km"));
}

#[tokio::test]
async fn test_personalize_ranks_by_preference() {
    let (app, _) = common::create_test_app();

    let response = post_json(
        app,
        "/api/personalize",
        json!({
            "preferences": {"museum": 0.9, "park": 0.3},
            "activities": [
                place_body("park", 0.0, 0.0, 5.0, &["park"]),
                place_body("museum", 0.0, 0.0, 3.0, &["museum"]),
                place_body("other", 0.0, 0.0, 4.5, &["bar"])
            ]
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    // museum 0.9 + 0.6, park 0.3 + 1.0, other 0.9
    assert_eq!(ids(&json), vec!["museum", "park", "other"]);
}

#[tokio::test]
async fn test_maps_return_html_with_map_csp() {
    let (app, _) = common::create_test_app();
    let payload = json!({
        "center": {"lat": 48.8566, "lng": 2.3522},
        "activities": [place_body("louvre", 48.8606, 2.3376, 4.7, &["museum"])]
    });

    let activities = post_json(app.clone(), "/api/maps/activities", payload.clone()).await;
    assert_eq!(activities.status(), StatusCode::OK);
    assert!(activities
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let csp = activities
        .headers()
        .get(header::CONTENT_SECURITY_POLICY)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(csp.contains("https://maps.googleapis.com"));
    let html = body_text(activities).await;
    assert!(html.contains("Activity Map"));
    assert!(html.contains("Place louvre"));
    assert!(html.contains("test_api_key"));

    let route = post_json(app, "/api/maps/route", payload).await;
    assert_eq!(route.status(), StatusCode::OK);
    assert!(body_text(route).await.contains("Route Map"));
}
