//! HTTP API tests driving the router in-process.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use chrono::{TimeZone, Utc};
use dogspa::server::{AppState, build_router};
use dogspa::{CatalogSeed, EngineConfig, SpaEngine};
use dogspa_testing::MockClock;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const COLLAR: &str = "7c2d8e1f-4a5b-4c6d-8e9f-0a1b2c3d4e04";
const SNACKS: &str = "7c2d8e1f-4a5b-4c6d-8e9f-0a1b2c3d4e02";
const BATH: &str = "0b9f6a3e-6c41-4c8e-9f0a-1d2b3c4d5e01";

struct TestApp {
    router: Router,
    user: String,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl TestApp {
    fn new() -> Self {
        let clock = MockClock::new(Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap());
        let engine = SpaEngine::new(
            CatalogSeed::demo().unwrap(),
            Arc::new(clock),
            &EngineConfig::default(),
        );
        Self {
            router: build_router(AppState::new(Arc::new(engine))),
            user: Uuid::new_v4().to_string(),
        }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .header("X-User-Id", &self.user)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn call(&self, method: Method, uri: &str, body: &Value) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("X-User-Id", &self.user)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn post(&self, uri: &str, body: &Value) -> TestResponse {
        self.call(Method::POST, uri, body).await
    }

    async fn create_pet(&self) -> String {
        let response = self
            .post("/api/pets", &json!({"name": "Luna", "species": "perro", "age": 3}))
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_is_public_and_tagged_with_request_id() {
    let app = TestApp::new();
    let response = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn incoming_request_id_is_echoed() {
    let app = TestApp::new();
    let request = Request::get("/ready")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["ready"], true);
    assert_eq!(response.body["services"], 5);
    assert_eq!(response.headers["x-request-id"], "req-42");
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let app = TestApp::new();
    let response = app
        .send(Request::get("/api/pets").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn catalog_prices_are_decimal_strings() {
    let app = TestApp::new();
    let response = app.get(&format!("/api/products/{COLLAR}")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["price"], "6990.00");
    assert_eq!(response.body["stock"], 3);

    let services = app.get("/api/services").await;
    assert_eq!(services.body.as_array().unwrap().len(), 5);

    let unknown = app.get(&format!("/api/services/{}", Uuid::new_v4())).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn booking_flow() {
    let app = TestApp::new();
    let pet_id = app.create_pet().await;

    let created = app
        .post(
            "/api/bookings",
            &json!({
                "petId": pet_id,
                "serviceId": BATH,
                "date": "2025-07-02T14:00:00Z",
                "notes": "Piel sensible"
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["status"], "PENDING");
    assert_eq!(created.body["totalPrice"], "15000.00");
    assert_eq!(created.body["display"]["label"], "Pendiente");
    let booking_id = created.body["id"].as_str().unwrap().to_string();

    let overlap = app
        .post(
            "/api/bookings",
            &json!({"petId": pet_id, "serviceId": BATH, "date": "2025-07-02T14:30:00Z"}),
        )
        .await;
    assert_eq!(overlap.status, StatusCode::CONFLICT);
    assert_eq!(overlap.body["code"], "CONFLICT");

    let confirmed = app
        .post(&format!("/api/bookings/{booking_id}/confirm"), &json!({}))
        .await;
    assert_eq!(confirmed.status, StatusCode::OK);
    assert_eq!(confirmed.body["display"]["label"], "Confirmada");

    let too_early = app
        .post(&format!("/api/bookings/{booking_id}/complete"), &json!({}))
        .await;
    assert_eq!(too_early.status, StatusCode::CONFLICT);
    assert_eq!(too_early.body["code"], "TOO_EARLY");

    let cancelled = app
        .call(Method::DELETE, &format!("/api/bookings/{booking_id}"), &json!({}))
        .await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.body["status"], "CANCELLED");
    assert_eq!(cancelled.body["display"]["variant"], "destructive");

    let listed = app.get("/api/bookings").await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn out_of_hours_and_foreign_bookings_are_rejected() {
    let app = TestApp::new();
    let pet_id = app.create_pet().await;

    // 20:00 in Santiago
    let late = app
        .post(
            "/api/bookings",
            &json!({"petId": pet_id, "serviceId": BATH, "date": "2025-07-03T00:00:00Z"}),
        )
        .await;
    assert_eq!(late.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(late.body["code"], "OUT_OF_HOURS");

    let stranger = TestApp {
        router: app.router.clone(),
        user: Uuid::new_v4().to_string(),
    };
    let foreign = stranger
        .post(
            "/api/bookings",
            &json!({"petId": pet_id, "serviceId": BATH, "date": "2025-07-02T14:00:00Z"}),
        )
        .await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);
    assert_eq!(foreign.body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn availability_probe() {
    let app = TestApp::new();
    let pet_id = app.create_pet().await;

    let response = app
        .get(&format!(
            "/api/availability?petId={pet_id}&serviceId={BATH}&start=2025-07-02T14:00:00Z"
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["available"], true);
    assert_eq!(response.body["withinBusinessHours"], true);

    let bad = app.get("/api/availability?petId=nope").await;
    assert_eq!(bad.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(bad.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn checkout_rejects_short_stock() {
    let app = TestApp::new();
    let response = app
        .post(
            "/api/sales",
            &json!({"items": [
                {"productId": SNACKS, "quantity": 1},
                {"productId": COLLAR, "quantity": 4}
            ]}),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["code"], "INSUFFICIENT_STOCK");
    assert!(response.body["message"].as_str().unwrap().contains(COLLAR));

    let snacks = app.get(&format!("/api/products/{SNACKS}")).await;
    assert_eq!(snacks.body["stock"], 40);
}

#[tokio::test]
async fn checkout_and_cancel_restock() {
    let app = TestApp::new();
    let created = app
        .post(
            "/api/sales",
            &json!({"items": [{"productId": COLLAR, "quantity": 2}]}),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["status"], "CONFIRMED");
    assert_eq!(created.body["totalAmount"], "13980.00");
    let sale_id = created.body["id"].as_str().unwrap().to_string();

    let cancelled = app
        .post(&format!("/api/sales/{sale_id}/cancel"), &json!({}))
        .await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.body["display"]["label"], "Cancelada");

    let collar = app.get(&format!("/api/products/{COLLAR}")).await;
    assert_eq!(collar.body["stock"], 3);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::new();
    let request = Request::post("/api/pets")
        .header("X-User-Id", &app.user)
        .header("Content-Type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["code"], "VALIDATION_ERROR");

    let blank = app
        .post("/api/pets", &json!({"name": "   ", "species": "perro"}))
        .await;
    assert_eq!(blank.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn cart_preview_clamps_quantities() {
    let app = TestApp::new();
    let response = app
        .post(
            "/api/cart/preview",
            &json!({"events": [
                {"type": "add", "productId": COLLAR, "quantity": 2},
                {"type": "add", "productId": COLLAR, "quantity": 9},
                {"type": "add", "productId": SNACKS, "quantity": 1},
                {"type": "remove", "productId": SNACKS}
            ]}),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["totalItems"], 3);
    assert_eq!(response.body["totalAmount"], "20970.00");
    assert_eq!(response.body["lines"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn pet_removal_returns_no_content() {
    let app = TestApp::new();
    let pet_id = app.create_pet().await;

    let removed = app
        .call(Method::DELETE, &format!("/api/pets/{pet_id}"), &json!({}))
        .await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);

    let pets = app.get("/api/pets").await;
    assert!(pets.body.as_array().unwrap().is_empty());
}
