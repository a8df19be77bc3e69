// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Command-line walk-through of the activity search pipeline.
//!
//! Searches a destination (default "Tokyo, Japan", or the first argument),
//! then shows place details, a planned route, a personalized ranking and a
//! map page. Results are written to `results.json` and `dynamic_map.html`.

use anyhow::Context;
use std::collections::HashMap;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use travel_buddy::{
    config::{ConfigError, GoogleApiConfig, SearchDefaults},
    geo_utils::format_distance,
    models::{Place, SortBy, TravelRecommendation},
    services::{
        travel::{personalized_recommend, plan_route},
        PlacesClient, SearchQuery, TravelActivityService,
    },
};

const DEFAULT_LOCATION: &str = "Tokyo, Japan";
const MAP_FILE: &str = "dynamic_map.html";
const RESULTS_FILE: &str = "results.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let google_api = match GoogleApiConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::Missing(var)) => {
            eprintln!("ERROR: {} not set.", var);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };
    let places = PlacesClient::new(&google_api).context("Failed to build Places client")?;
    let service = TravelActivityService::new(places, SearchDefaults::from_env()?);

    let location = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

    println!("\nReal-Time Travel Activity System\n");

    let recommendation = basic_search(&service, &location).await?;
    if recommendation.activities.is_empty() {
        if let Some(error) = &recommendation.query_info.error {
            println!("{}: {}", error, location);
        }
    } else {
        detailed_info(&service, &recommendation).await?;
        route_planning(&recommendation);
        personalized(&recommendation);
        map_generation(&service, &recommendation)?;
    }

    let json = serde_json::to_string_pretty(&recommendation)?;
    std::fs::write(RESULTS_FILE, json)
        .with_context(|| format!("Failed to write {}", RESULTS_FILE))?;
    println!("Results saved to {}", RESULTS_FILE);

    println!("\nAll scenarios completed successfully.\n");
    Ok(())
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("travel_buddy=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn banner(title: &str) {
    println!("{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}

fn print_activity(place: &Place, index: usize) {
    println!("{}. {}", index, place.name);
    match place.rating {
        Some(rating) => println!(
            "   Rating: {} ({} reviews)",
            rating,
            place.user_ratings_total.unwrap_or(0)
        ),
        None => println!(
            "   Rating: N/A ({} reviews)",
            place.user_ratings_total.unwrap_or(0)
        ),
    }
    println!("   Address: {}", place.address);
    if let Some(distance) = place.distance {
        println!("   Distance: {}", format_distance(distance));
    }
    println!("   Price: {}", place.price_symbol());
    let types: Vec<&str> = place.types.iter().take(3).map(String::as_str).collect();
    println!("   Types: {}", types.join(", "));
    if place.is_open_now() {
        println!("   Status: Open now");
    }
    println!();
}

async fn basic_search(
    service: &TravelActivityService,
    location: &str,
) -> anyhow::Result<TravelRecommendation> {
    banner(&format!("Scenario 1: Basic Search - {}", location));

    let mut query = SearchQuery::new(location);
    query.activity_types = vec![
        "tourist_attraction".to_string(),
        "restaurant".to_string(),
        "museum".to_string(),
    ];
    query.radius = Some(5000);
    query.max_per_type = 3;
    query.sort_by = SortBy::Rating;

    let recommendation = service.recommend_activities(&query).await?;

    match recommendation.search_location {
        Some(loc) => println!("\nSearch Location: ({}, {})", loc.lat, loc.lng),
        None => println!("\nSearch Location: not found"),
    }
    println!("Timestamp: {}", recommendation.timestamp);
    println!("Total Activities Found: {}\n", recommendation.total_count);

    for (i, place) in recommendation.activities.iter().take(5).enumerate() {
        print_activity(place, i + 1);
    }

    Ok(recommendation)
}

async fn detailed_info(
    service: &TravelActivityService,
    recommendation: &TravelRecommendation,
) -> anyhow::Result<()> {
    let Some(first) = recommendation.activities.first() else {
        return Ok(());
    };

    banner("Scenario 2: Detailed Activity Information");

    let Some(detailed) = service.place_details(&first.place_id).await? else {
        println!("\nNo details available for {}\n", first.name);
        return Ok(());
    };

    println!("\n{}", detailed.name);
    println!(
        "Rating: {} ({} reviews)",
        detailed
            .rating
            .map_or_else(|| "N/A".to_string(), |r| r.to_string()),
        detailed.user_ratings_total.unwrap_or(0)
    );
    println!("Photos: {}", detailed.photos.len());

    if !detailed.reviews.is_empty() {
        println!("\nTop Reviews:");
        for review in detailed.reviews.iter().take(3) {
            let rating = review
                .rating
                .map_or_else(|| "?".to_string(), |r| r.to_string());
            let excerpt: String = review.text.chars().take(100).collect();
            println!(" - {} ({}★)", review.author, rating);
            println!("   {}...", excerpt);
        }
        println!();
    }

    Ok(())
}

fn route_planning(recommendation: &TravelRecommendation) {
    let Some(start) = recommendation.search_location else {
        return;
    };
    let top: Vec<Place> = recommendation.activities.iter().take(5).cloned().collect();

    banner("Scenario 3: Route Planning");

    let route = plan_route(&top, start);
    println!("\nOptimized Route ({} stops):\n", route.len());
    for (i, place) in route.iter().enumerate() {
        println!("{}. {}", i + 1, place.name);
        if let Some(distance) = place.distance {
            println!("   Dist. from start: {}", format_distance(distance));
        }
        println!();
    }

    println!("Route Overview:\n");
    for (i, place) in route.iter().enumerate() {
        if i == 0 {
            println!("START → {}", place.name);
        } else {
            println!("  ↓");
            println!("{}", place.name);
        }
    }
    println!("\nRoute planning complete.\n");
}

fn personalized(recommendation: &TravelRecommendation) {
    banner("Scenario 4: Personalized Recommendations");

    let preferences: HashMap<String, f64> = [
        ("museum", 0.9),
        ("tourist_attraction", 0.7),
        ("restaurant", 0.5),
        ("park", 0.3),
    ]
    .into_iter()
    .map(|(t, w)| (t.to_string(), w))
    .collect();

    let ranked = personalized_recommend(&preferences, &recommendation.activities);

    println!("Top Personalized Results:\n");
    for (i, place) in ranked.iter().take(5).enumerate() {
        print_activity(place, i + 1);
    }
}

fn map_generation(
    service: &TravelActivityService,
    recommendation: &TravelRecommendation,
) -> anyhow::Result<()> {
    let Some(center) = recommendation.search_location else {
        return Ok(());
    };
    let top: Vec<Place> = recommendation.activities.iter().take(10).cloned().collect();

    banner("Scenario 5: Generating Dynamic Map");

    let html = service.generate_map_html(&top, center);
    std::fs::write(MAP_FILE, html).with_context(|| format!("Failed to write {}", MAP_FILE))?;

    let path = Path::new(MAP_FILE)
        .canonicalize()
        .unwrap_or_else(|_| Path::new(MAP_FILE).to_path_buf());
    println!("\nDynamic map saved to: {}", path.display());
    println!("Open this file in a browser to view the interactive map.\n");

    Ok(())
}
