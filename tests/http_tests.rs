mod support;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use buylist_optimizer::adapter::inbound::http::{build_router, AppState};
use buylist_optimizer::domain::{JobId, ParseMethod};
use buylist_optimizer::error::ScanError;
use buylist_optimizer::testkit::config::{test_config, test_state};
use buylist_optimizer::testkit::fetch::{Script, ScriptedFetcher};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use support::scenario::{cheap_listings, lightning_bolt_sites, pricey_listings};

fn app_with(fetcher: ScriptedFetcher) -> (Router, AppState) {
    let config = test_config(lightning_bolt_sites());
    let state = test_state(&config, Arc::new(fetcher));
    (build_router(state.clone(), &config.server), state)
}

fn app() -> (Router, AppState) {
    app_with(
        ScriptedFetcher::new(ParseMethod::Shopify)
            .site("cheap", Script::Listings(cheap_listings()))
            .site("pricey", Script::Listings(pricey_listings())),
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

#[tokio::test]
async fn health_reports_sites() {
    let (app, _) = app();
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sites"], 2);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let (app, _) = app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn scan_then_optimize_from_the_scan() {
    let (app, state) = app();

    let (status, started) = send(
        &app,
        post(
            "/scan",
            &json!({"card_list": [{"name": "Lightning Bolt", "quantity": 4}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(started["sites"], 2);
    let job_id: JobId = serde_json::from_value(started["job_id"].clone()).unwrap();

    state.scans.wait_for_completion(job_id).await.unwrap();
    let (status, job) = send(&app, get(&format!("/scan/{job_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["status"], "completed");
    assert_eq!(job["completed_sites"], 2);
    assert_eq!(job["subtasks"].as_array().unwrap().len(), 2);

    let (status, result) = send(
        &app,
        post(
            "/optimize",
            &json!({
                "scan_job_id": job_id,
                "optimization_config": {"algorithm": "milp", "time_limit": 60}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{result}");
    assert_eq!(result["algorithm_used"], "milp");
    let best = &result["solutions"][0];
    assert_eq!(decimal(&best["total_cost"]), dec!(4.00));
    assert_eq!(best["num_stores"], 1);
    assert!(!result["pareto_front"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn failed_site_is_reported_inline() {
    let (app, state) = app_with(
        ScriptedFetcher::new(ParseMethod::Shopify)
            .site("cheap", Script::Listings(cheap_listings()))
            .site("pricey", Script::Fail(ScanError::ParseError("bad json".into()))),
    );

    let (_, started) = send(
        &app,
        post(
            "/scan",
            &json!({"card_list": [{"name": "Lightning Bolt", "quantity": 4}], "site_ids": ["cheap", "pricey"]}),
        ),
    )
    .await;
    let job_id: JobId = serde_json::from_value(started["job_id"].clone()).unwrap();
    state.scans.wait_for_completion(job_id).await.unwrap();

    let (_, job) = send(&app, get(&format!("/scan/{job_id}"))).await;
    assert_eq!(job["failed_sites"], 1);
    let failed = job["subtasks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["status"] == "failed")
        .unwrap();
    assert_eq!(failed["site_id"], "pricey");
    assert!(failed["error"].as_str().unwrap().contains("bad json"));
}

#[tokio::test]
async fn optimize_with_inline_listings() {
    let (app, _) = app();
    let (status, result) = send(
        &app,
        post(
            "/optimize",
            &json!({
                "card_list": [{"name": "Lightning Bolt", "quantity": 4}],
                "listings": [
                    {"site_id": "cheap", "card_name": "Lightning Bolt", "quality": "NM", "quantity": 4, "price": "1.00"},
                    {"site_id": "pricey", "card_name": "Lightning Bolt", "quality": "NM", "quantity": 4, "price": "1.50"}
                ],
                "optimization_config": {"algorithm": "nsga2", "population_size": 50, "time_limit": 60},
                "seed": 9
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{result}");
    assert_eq!(result["algorithm_used"], "nsga2");
    assert_eq!(decimal(&result["solutions"][0]["total_cost"]), dec!(4.00));
}

#[tokio::test]
async fn invalid_population_size_is_a_validation_error() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        post(
            "/optimize",
            &json!({
                "card_list": [{"name": "Lightning Bolt", "quantity": 4}],
                "optimization_config": {"population_size": 10}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].as_str().unwrap().contains("population_size"));
}

#[tokio::test]
async fn oversized_quantity_is_a_validation_error() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        post(
            "/optimize",
            &json!({
                "card_list": [{"name": "Lightning Bolt", "quantity": 4_000_000_000u64}],
                "listings": [
                    {"site_id": "cheap", "card_name": "Lightning Bolt", "quality": "NM", "quantity": 4, "price": "1.00"}
                ],
                "optimization_config": {"algorithm": "nsga2"}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].as_str().unwrap().contains("quantity"));
}

#[tokio::test]
async fn optimize_without_cards_or_scan_is_rejected() {
    let (app, _) = app();
    let (status, body) = send(&app, post("/optimize", &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unknown_scan_job_is_not_found() {
    let (app, _) = app();
    let (status, body) = send(&app, get(&format!("/scan/{}", JobId::generate()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn probe_recommends_an_algorithm() {
    let (app, _) = app();
    let (status, report) = send(
        &app,
        post(
            "/test_optimization_config",
            &json!({"config": {"algorithm": "auto", "time_limit": 60}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["valid"], true);
    assert_eq!(report["recommended_algorithm"], "milp");
    assert_eq!(report["test_result"]["success"], true);
}

#[tokio::test]
async fn probe_flags_invalid_configs() {
    let (app, _) = app();
    let (status, report) = send(
        &app,
        post(
            "/test_optimization_config",
            &json!({"config": {"population_size": 10}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["valid"], false);
    assert!(!report["errors"].as_array().unwrap().is_empty());
    assert!(report.get("test_result").is_none());
}
