//! HTTP-level tests: each test boots the real server on a free local port and
//! drives it with `reqwest`.
//!
//!   cargo test --test api_test

use coupon_service::{build_server, new_state};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

fn free_port() -> u16 {
    // Bind to port 0 to let the OS assign a free port, then release it.
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind failed")
        .local_addr()
        .expect("addr failed")
        .port()
}

/// Start the service and wait until it answers. Returns its base URL.
async fn spawn_app() -> String {
    let port = free_port();
    let server = build_server(new_state(), "127.0.0.1", port).expect("Failed to bind the service");
    tokio::spawn(server);

    let base = format!("http://127.0.0.1:{}", port);
    let client = Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .unwrap();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if tokio::time::Instant::now() > deadline {
            panic!("service did not become ready at {}", base);
        }
        if client.get(format!("{}/coupons", base)).send().await.is_ok() {
            return base;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

async fn create(http: &Client, base: &str, body: Value) -> (StatusCode, Value) {
    let resp = http
        .post(format!("{}/coupons", base))
        .json(&body)
        .send()
        .await
        .expect("Failed to POST /coupons");
    let status = resp.status();
    (status, resp.json().await.unwrap_or(json!({})))
}

async fn best(http: &Client, base: &str, body: Value) -> (StatusCode, Value) {
    let resp = http
        .post(format!("{}/best-coupon", base))
        .json(&body)
        .send()
        .await
        .expect("Failed to POST /best-coupon");
    let status = resp.status();
    (status, resp.json().await.unwrap_or(json!({})))
}

fn cart(unit_price: &str) -> Value {
    json!({ "cart": { "items": [
        { "item_id": "sku-1", "category": "general", "unit_price": unit_price, "quantity": 1 }
    ] } })
}

#[tokio::test]
async fn percentage_coupon_wins_over_smaller_flat() {
    let base = spawn_app().await;
    let http = Client::new();

    let (status, _) = create(
        &http,
        &base,
        json!({ "code": "A", "discount_type": "PERCENT", "discount_value": "10" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = create(
        &http,
        &base,
        json!({ "code": "B", "discount_type": "FLAT", "discount_value": "40", "min_cart_value": "100" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = best(&http, &base, cart("500")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["eligible"], true);
    assert_eq!(body["code"], "A");
    assert_eq!(body["discount"], "50.00");
    assert_eq!(body["payable"], "450.00");
    assert_eq!(body["subtotal"], "500.00");
}

#[tokio::test]
async fn threshold_leaves_only_flat_coupon() {
    let base = spawn_app().await;
    let http = Client::new();

    create(
        &http,
        &base,
        json!({ "code": "A", "discount_type": "PERCENT", "discount_value": "50", "min_cart_value": "100" }),
    )
    .await;
    create(
        &http,
        &base,
        json!({ "code": "B", "discount_type": "FLAT", "discount_value": "10" }),
    )
    .await;

    let (_, body) = best(&http, &base, cart("50")).await;
    assert_eq!(body["code"], "B");
    assert_eq!(body["discount"], "10.00");
    assert_eq!(body["payable"], "40.00");
}

#[tokio::test]
async fn no_eligible_coupon_is_not_an_error() {
    let base = spawn_app().await;
    let http = Client::new();

    create(
        &http,
        &base,
        json!({ "code": "BIG", "discount_type": "FLAT", "discount_value": "5", "min_cart_value": "1000" }),
    )
    .await;

    let (status, body) = best(&http, &base, cart("20")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["eligible"], false);
    assert!(body["code"].is_null());
    assert_eq!(body["payable"], "20.00");
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let base = spawn_app().await;
    let http = Client::new();

    let (status, body) = best(&http, &base, json!({ "cart": { "items": [] } })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("Invalid cart"));
}

#[tokio::test]
async fn duplicate_code_conflicts_and_keeps_first() {
    let base = spawn_app().await;
    let http = Client::new();

    let (status, _) = create(
        &http,
        &base,
        json!({ "code": "ONCE", "discount_type": "FLAT", "discount_value": "5" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = create(
        &http,
        &base,
        json!({ "code": "ONCE", "discount_type": "FLAT", "discount_value": "50" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Coupon 'ONCE' already exists");

    let listed: Value = http
        .get(format!("{}/coupons", base))
        .send()
        .await
        .expect("Failed to GET /coupons")
        .json()
        .await
        .expect("Failed to parse GET /coupons");
    let coupons = listed.as_array().expect("list should be an array");
    assert_eq!(coupons.len(), 1);
    assert_eq!(coupons[0]["discount_value"], "5");
}

#[tokio::test]
async fn invalid_coupon_is_unprocessable() {
    let base = spawn_app().await;
    let http = Client::new();

    let (status, body) = create(
        &http,
        &base,
        json!({ "code": "TOO_MUCH", "discount_type": "PERCENT", "discount_value": "120" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap_or_default().contains("exceed 100"));

    let resp = http
        .get(format!("{}/coupons/TOO_MUCH", base))
        .send()
        .await
        .expect("Failed to GET coupon");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generated_code_can_be_fetched() {
    let base = spawn_app().await;
    let http = Client::new();

    let (status, body) = create(
        &http,
        &base,
        json!({ "discount_type": "FLAT", "discount_value": "3.50", "description": "Autumn promo" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let code = body["code"].as_str().expect("code should be generated").to_string();

    let fetched: Value = http
        .get(format!("{}/coupons/{}", base, code))
        .send()
        .await
        .expect("Failed to GET coupon")
        .json()
        .await
        .expect("Failed to parse coupon");
    assert_eq!(fetched["code"], code.as_str());
    assert_eq!(fetched["description"], "Autumn promo");
}

#[tokio::test]
async fn customer_rules_use_request_customer() {
    let base = spawn_app().await;
    let http = Client::new();

    create(
        &http,
        &base,
        json!({
            "code": "GOLD",
            "discount_type": "PERCENT",
            "discount_value": "25",
            "customer": { "allowed_tiers": ["gold"] }
        }),
    )
    .await;

    let (_, anonymous) = best(&http, &base, cart("40")).await;
    assert_eq!(anonymous["eligible"], false);

    let mut request = cart("40");
    request["customer"] = json!({ "tier": "gold", "orders_placed": 4 });
    let (_, gold) = best(&http, &base, request).await;
    assert_eq!(gold["code"], "GOLD");
    assert_eq!(gold["discount"], "10.00");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let base = spawn_app().await;

    let doc: Value = Client::new()
        .get(format!("{}/api-docs/openapi.json", base))
        .send()
        .await
        .expect("Failed to GET openapi.json")
        .json()
        .await
        .expect("Failed to parse openapi.json");
    assert!(doc["paths"]["/best-coupon"]["post"].is_object());
    assert!(doc["paths"]["/coupons/{code}"]["get"].is_object());
}
