// =====================================================================================
// PRODUCT STATS CELL INTEGRATION TESTS - /stats CONTRACT
// =====================================================================================

mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use common::{coordinator, sample_products, FakeCatalog};
use product_stats_cell::{create_stats_router, PriceRanges, StatsResponse};
use shared_config::StalePolicy;
use shared_models::Product;

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };

    (status, json)
}

fn countdown(json: &Value) -> (u64, u64) {
    (
        json["cache_info"]["ttl_seconds"].as_u64().unwrap(),
        json["cache_info"]["next_update_in"].as_u64().unwrap(),
    )
}

fn stats_app(catalog: std::sync::Arc<FakeCatalog>) -> Router {
    create_stats_router(coordinator(catalog, StalePolicy::ServeStale))
}

#[tokio::test(start_paused = true)]
async fn test_stats_endpoint_structure() {
    let app = stats_app(FakeCatalog::new(sample_products()));

    let (status, json) = get_json(&app, "/stats").await;
    assert_eq!(status, StatusCode::OK);

    for field in [
        "total_products",
        "average_price",
        "price_ranges",
        "top_brands",
        "categories",
        "last_updated",
        "cache_info",
    ] {
        assert!(json.get(field).is_some(), "missing field {}", field);
    }

    assert!(json["total_products"].is_u64());
    assert!(json["average_price"].is_number());
    assert!(json["top_brands"].is_array());
    assert!(json["last_updated"].is_string());

    let ranges = json["price_ranges"].as_object().unwrap();
    let labels: Vec<&str> = ranges.keys().map(String::as_str).collect();
    for label in PriceRanges::LABELS {
        assert!(labels.contains(&label), "missing bucket {}", label);
    }
}

#[tokio::test(start_paused = true)]
async fn test_price_ranges_sum_to_total_products() {
    let app = stats_app(FakeCatalog::new(sample_products()));

    let (_, json) = get_json(&app, "/stats").await;
    let stats: StatsResponse = serde_json::from_value(json).unwrap();

    assert_eq!(stats.stats.price_ranges.total(), stats.stats.total_products);
    assert_eq!(stats.stats.total_products, 4);
    assert_eq!(stats.stats.price_ranges.counts(), [1, 1, 1, 0, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_top_brands_sorted_and_bounded() {
    let products: Vec<Product> = (0..25)
        .flat_map(|i| {
            let brand = format!("brand-{:02}", i);
            (0..=(i % 4)).map(move |_| Product::new(42.0, brand.clone()))
        })
        .collect();
    let app = stats_app(FakeCatalog::new(products));

    let (_, json) = get_json(&app, "/stats").await;
    let stats: StatsResponse = serde_json::from_value(json).unwrap();
    let counts: Vec<u64> = stats.stats.top_brands.iter().map(|b| b.count).collect();

    assert!(stats.stats.top_brands.len() <= 10);
    assert!(counts.iter().all(|c| *c > 0));
    let mut sorted = counts.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(counts, sorted);
}

#[tokio::test(start_paused = true)]
async fn test_cache_info_bounds() {
    let app = stats_app(FakeCatalog::new(sample_products()));

    let (_, json) = get_json(&app, "/stats").await;
    let (ttl, next_update_in) = countdown(&json);

    assert!(ttl > 0);
    assert!(ttl <= 3600);
    assert!(next_update_in < ttl);
}

#[tokio::test(start_paused = true)]
async fn test_consistent_data_and_countdown_between_requests() {
    let catalog = FakeCatalog::new(sample_products());
    let app = stats_app(catalog.clone());

    let (_, first) = get_json(&app, "/stats").await;
    tokio::time::advance(Duration::from_secs(1)).await;
    let (_, second) = get_json(&app, "/stats").await;

    assert_eq!(first["total_products"], second["total_products"]);
    assert_eq!(first["average_price"], second["average_price"]);
    assert_eq!(
        first["top_brands"].as_array().unwrap().len(),
        second["top_brands"].as_array().unwrap().len()
    );
    let (first_ttl, first_next_update_in) = countdown(&first);
    let (second_ttl, second_next_update_in) = countdown(&second);
    assert!(second_ttl < first_ttl);
    assert!(second_next_update_in < first_next_update_in);
    assert_eq!(catalog.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_catalog_returns_zeroed_stats() {
    let app = stats_app(FakeCatalog::new(Vec::new()));

    let (status, json) = get_json(&app, "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_products"], 0);
    assert_eq!(json["average_price"], 0.0);
    assert!(json["top_brands"].as_array().unwrap().is_empty());
    for (_, count) in json["price_ranges"].as_object().unwrap() {
        assert_eq!(count, 0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_cold_start_failure_returns_service_unavailable() {
    let catalog = FakeCatalog::new(sample_products());
    catalog.set_failing(true);
    let app = stats_app(catalog);

    let (status, json) = get_json(&app, "/stats").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].is_string());
}

#[tokio::test(start_paused = true)]
async fn test_previous_snapshot_served_when_refresh_fails() {
    let catalog = FakeCatalog::new(sample_products());
    let app = stats_app(catalog.clone());

    let (_, before) = get_json(&app, "/stats").await;

    catalog.set_failing(true);
    catalog.set_products(Vec::new());
    tokio::time::advance(Duration::from_secs(61)).await;

    let (status, after) = get_json(&app, "/stats").await;
    tokio::time::advance(Duration::from_secs(2)).await;
    let (_, later) = get_json(&app, "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["total_products"], before["total_products"]);
    assert_eq!(after["last_updated"], before["last_updated"]);
    assert_eq!(later["last_updated"], before["last_updated"]);
    assert_eq!(catalog.calls(), 2);

    let (ttl, next_update_in) = countdown(&after);
    let (later_ttl, later_next_update_in) = countdown(&later);
    assert!(ttl > 0 && next_update_in < ttl);
    assert!(later_ttl > 0 && later_next_update_in < later_ttl);
    assert!(later_next_update_in < next_update_in);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_bounds_hold_just_before_expiry() {
    let catalog = FakeCatalog::new(sample_products());
    let app = stats_app(catalog.clone());

    get_json(&app, "/stats").await;
    tokio::time::advance(Duration::from_millis(59_500)).await;
    let (status, json) = get_json(&app, "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(catalog.calls(), 1);
    let (ttl, next_update_in) = countdown(&json);
    assert_eq!(ttl, 1);
    assert_eq!(next_update_in, 0);
}

#[tokio::test(start_paused = true)]
async fn test_recomputation_resets_countdown() {
    let catalog = FakeCatalog::new(sample_products());
    let app = stats_app(catalog.clone());

    get_json(&app, "/stats").await;
    catalog.set_products(vec![Product::new(5.0, "Solo")]);
    tokio::time::advance(Duration::from_secs(61)).await;

    let (_, json) = get_json(&app, "/stats").await;

    assert_eq!(json["total_products"], 1);
    assert_eq!(json["cache_info"]["ttl_seconds"], 60);
    assert_eq!(json["cache_info"]["next_update_in"], 30);
}

#[tokio::test]
async fn test_unknown_route_returns_not_found() {
    let app = stats_app(FakeCatalog::new(sample_products()));

    let (status, _) = get_json(&app, "/nonexistent").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
