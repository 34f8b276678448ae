//! HTTP tests for the booking API running on in-memory stores.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use cinema_booking::config::{BookingConfig, Config};
use cinema_booking::models::{PriceTable, ScreenGeometry, Show};
use cinema_booking::services::booking::BookingEngine;
use cinema_booking::store::{InMemoryBookingStore, InMemoryCatalog, InMemoryIdentity};
use cinema_booking::{app, AppState};

const ALICE: (&str, &str) = ("alice@example.com", "alice-pw");
const BOB: (&str, &str) = ("bob@example.com", "bob-pw");

async fn setup() -> Router {
    let catalog = InMemoryCatalog::new();
    catalog
        .insert(Show {
            id: 1,
            title: "Late show".into(),
            geometry: ScreenGeometry::new(10, 10).unwrap(),
            prices: PriceTable::flat(150),
            starts_at: (Utc::now() + Duration::days(3)).naive_utc(),
            is_active: true,
        })
        .await;

    let identity = InMemoryIdentity::new();
    identity.add_user(ALICE.0, ALICE.1, 1).await;
    identity.add_user(BOB.0, BOB.1, 2).await;

    let engine = Arc::new(BookingEngine::new(
        Arc::new(catalog),
        Arc::new(InMemoryBookingStore::new()),
        BookingConfig::default(),
    ));
    app(AppState::from_parts(engine, Arc::new(identity), None, Config::default()))
}

fn basic(user: (&str, &str)) -> String {
    format!("Basic {}", general_purpose::STANDARD.encode(format!("{}:{}", user.0, user.1)))
}

fn request(method: Method, uri: &str, user: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, basic(user));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn booking_body(seats: &[(&str, u32)]) -> Value {
    let seats: Vec<Value> = seats.iter().map(|(row, n)| json!({ "row": row, "seat_number": n })).collect();
    json!({ "show_id": 1, "seats": seats })
}

#[tokio::test]
async fn health_endpoints() {
    let app = setup().await;
    let response = app.clone().oneshot(request(Method::GET, "/health", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn booking_requires_credentials() {
    let app = setup().await;

    let (status, _) = send(&app, request(Method::POST, "/api/bookings", None, Some(booking_body(&[("A", 1)])))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        request(Method::GET, "/api/bookings", Some((ALICE.0, "wrong")), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_list_and_cancel() {
    let app = setup().await;

    let (status, booking) = send(
        &app,
        request(Method::POST, "/api/bookings", Some(ALICE), Some(booking_body(&[("a", 1), ("A", 2)]))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["total_amount"], 450);
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["payment_status"], "completed");
    assert_eq!(booking["seats"][0]["row"], "A");
    assert_eq!(booking["seats"][0]["tier"], "premium");
    assert!(booking["reference"].as_str().unwrap().starts_with("MB"));
    let id = booking["id"].as_str().unwrap().to_string();

    let (status, seats) = send(&app, request(Method::GET, "/api/shows/1/seats", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seats["total_seats"], 100);
    assert_eq!(seats["available_seats"], 98);
    assert_eq!(seats["prices"]["recliner"], 300);
    assert_eq!(seats["seat_layout"][0]["seats"][0]["is_booked"], true);
    assert_eq!(seats["seat_layout"][0]["seats"][2]["is_booked"], false);

    let (status, conflict) = send(
        &app,
        request(Method::POST, "/api/bookings", Some(BOB), Some(booking_body(&[("A", 2), ("A", 3)]))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["code"], "SEAT_CONFLICT");
    assert_eq!(conflict["seats"], json!(["A2"]));

    let (status, list) = send(&app, request(Method::GET, "/api/bookings", Some(ALICE), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, request(Method::GET, &format!("/api/bookings/{id}"), Some(BOB), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        request(Method::PATCH, &format!("/api/bookings/{id}/cancel"), Some(BOB), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, cancelled) = send(
        &app,
        request(Method::PATCH, &format!("/api/bookings/{id}/cancel"), Some(ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["payment_status"], "refunded");

    let (status, _) = send(
        &app,
        request(Method::PATCH, &format!("/api/bookings/{id}/cancel"), Some(ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, seats) = send(&app, request(Method::GET, "/api/shows/1/seats", None, None)).await;
    assert_eq!(seats["available_seats"], 100);
}

#[tokio::test]
async fn rejects_bad_requests() {
    let app = setup().await;

    let (status, body) = send(&app, request(Method::POST, "/api/bookings", Some(ALICE), Some(booking_body(&[])))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let seven: Vec<(&str, u32)> = (1..=7).map(|n| ("E", n)).collect();
    let (status, body) = send(&app, request(Method::POST, "/api/bookings", Some(ALICE), Some(booking_body(&seven)))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "a booking may hold at most 6 seats, got 7");

    let (status, _) = send(&app, request(Method::POST, "/api/bookings", Some(ALICE), Some(booking_body(&[("Z", 1)])))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing_show = json!({ "show_id": 42, "seats": [{ "row": "A", "seat_number": 1 }] });
    let (status, body) = send(&app, request(Method::POST, "/api/bookings", Some(ALICE), Some(missing_show))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send(&app, request(Method::GET, "/api/shows/42/seats", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn show_details_include_layout() {
    let app = setup().await;
    let (status, body) = send(&app, request(Method::GET, "/api/shows/1", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["show"]["title"], "Late show");
    assert_eq!(body["seat_layout"].as_array().unwrap().len(), 10);
    assert_eq!(body["seat_layout"][9]["seats"][0]["tier"], "recliner");
}
