//! Codes API Tests
//!
//! Drives the full router (health, codes, stubs, trace and CORS layers) with
//! in-process requests against a seeded in-memory store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use stocklab::http_server::{HttpServer, HttpServerConfig};
use stocklab::rest_api::CodeService;
use stocklab::store::StoreHandler;

// =============================================================================
// Test Utilities
// =============================================================================

async fn app() -> Router {
    let store = Arc::new(StoreHandler::in_memory());
    store
        .insert_many(
            "stocklab",
            "code_info",
            &json!([
                {
                    "단축코드": "005930",
                    "확장코드": "KR7005930003",
                    "종목명": "삼성전자",
                    "시장구분": "1",
                    "ETF구분": "0",
                    "주문수량단위": 1,
                    "기업인수목적회사여부": "N"
                },
                {
                    "단축코드": "069500",
                    "종목명": "KODEX 200",
                    "시장구분": "1",
                    "ETF구분": "1"
                },
                {
                    "단축코드": "035720",
                    "종목명": "카카오",
                    "시장구분": "2",
                    "ETF구분": "0",
                    "주문수량단위": "10"
                }
            ]),
        )
        .await
        .expect("seed insert");

    let service = Arc::new(CodeService::new(store));
    HttpServer::new(HttpServerConfig::default(), service).router()
}

async fn get(uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app().await.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn listed_codes(body: &Value) -> Vec<String> {
    let mut codes: Vec<String> = body["code_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["code"].as_str().unwrap().to_string())
        .collect();
    codes.sort();
    codes
}

// =============================================================================
// GET /codes/{code}
// =============================================================================

#[tokio::test]
async fn code_record_uses_public_field_names() {
    let (status, body) = get_json("/codes/005930").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "code": "005930",
            "extend_code": "KR7005930003",
            "name": "삼성전자",
            "memedan": 1,
            "market": "1",
            "is_etf": "0",
            "is_spac": "N",
            "uri": "/codes/005930"
        })
    );
}

#[tokio::test]
async fn numeric_text_order_unit_is_an_integer() {
    let (_, body) = get_json("/codes/035720").await;
    assert_eq!(body["memedan"], json!(10));
}

#[tokio::test]
async fn missing_order_unit_renders_zero() {
    let (status, body) = get_json("/codes/069500").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["memedan"], json!(0));
    assert_eq!(body["extend_code"], Value::Null);
}

#[tokio::test]
async fn unknown_code_is_404_with_empty_body() {
    let (status, body) = get("/codes/999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
}

// =============================================================================
// GET /codes
// =============================================================================

#[tokio::test]
async fn listing_defaults_to_all_markets() {
    let (status, body) = get_json("/codes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(3));
    assert_eq!(body["uri"], json!("/codes"));

    let (_, all) = get_json("/codes?market=0").await;
    assert_eq!(listed_codes(&all), listed_codes(&body));
}

#[tokio::test]
async fn listing_filters_by_market() {
    let (_, kospi) = get_json("/codes?market=1").await;
    assert_eq!(kospi["count"], json!(2));
    assert_eq!(listed_codes(&kospi), vec!["005930", "069500"]);

    let (_, kosdaq) = get_json("/codes?market=2").await;
    assert_eq!(listed_codes(&kosdaq), vec!["035720"]);
    assert_eq!(kosdaq["code_list"][0]["uri"], json!("/codes/035720"));
}

#[tokio::test]
async fn unknown_market_is_rejected() {
    let (status, body) = get_json("/codes?market=3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("market"));
}

// =============================================================================
// Stubs and health
// =============================================================================

#[tokio::test]
async fn price_and_orders_are_not_implemented() {
    assert_eq!(get("/codes/005930/price").await.0, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(get("/orders").await.0, StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
}

#[tokio::test]
async fn cors_allows_any_origin_by_default() {
    let request = Request::builder()
        .uri("/codes")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}
