use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post, put};
use axum::Router;
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use tower::ServiceExt;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::db::queries;
use salonbook::handlers;
use salonbook::models::{Service, StaffMember, WeeklyHours};
use salonbook::state::AppState;

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        slot_granularity_minutes: 30,
        min_lead_minutes: 60,
    }
}

fn test_state() -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
    })
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/availability",
            get(handlers::availability::get_availability),
        )
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings", get(handlers::bookings::list_bookings))
        .route(
            "/api/bookings/:id/status",
            post(handlers::bookings::update_status),
        )
        .route("/api/admin/services", post(handlers::admin::create_service))
        .route("/api/admin/services", get(handlers::admin::list_services))
        .route("/api/admin/staff", post(handlers::admin::create_staff))
        .route("/api/admin/staff", get(handlers::admin::list_staff))
        .route(
            "/api/admin/staff/:id/hours",
            put(handlers::admin::set_staff_hours),
        )
        .route(
            "/api/admin/staff/:id/overrides",
            put(handlers::admin::set_staff_override),
        )
        .with_state(state)
}

/// A Monday at least a week out, so the same-day lead cutoff never
/// interferes with the fixed expectations.
fn future_monday() -> NaiveDate {
    let mut d = Utc::now().date_naive() + Duration::days(7);
    while d.weekday() != Weekday::Mon {
        d += Duration::days(1);
    }
    d
}

/// Seed one service and one staff member working Mon 09:00-17:00 with a
/// 12:00-13:00 break.
fn seed_catalog(state: &AppState) {
    let db = state.db.lock().unwrap();
    queries::create_service(
        &db,
        &Service {
            id: "svc-1".to_string(),
            name: "Haircut".to_string(),
            duration_minutes: 30,
            price_cents: 4500,
            upfront_fee_cents: 1000,
            category: Some("hair".to_string()),
            active: true,
        },
    )
    .unwrap();

    let hours = WeeklyHours::from_json(
        r#"{"mon":{"start":540,"end":1020,"break_start":720,"break_end":780}}"#,
    )
    .unwrap();
    queries::create_staff(
        &db,
        &StaffMember {
            id: "st-1".to_string(),
            name: "Dana".to_string(),
            email: Some("dana@example.com".to_string()),
            phone: None,
            specialties: vec!["cut".to_string()],
            weekly_hours: Some(hours),
            active: true,
            is_owner: false,
        },
    )
    .unwrap();
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", "Bearer test-token")
        .body(Body::empty())
        .unwrap()
}

fn json_req(method: &str, uri: &str, body: &str, admin: bool) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if admin {
        builder = builder.header("Authorization", "Bearer test-token");
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn booking_body(date: NaiveDate, time: &str) -> String {
    serde_json::json!({
        "client_name": "Alice",
        "client_email": "alice@example.com",
        "client_phone": "+15551110000",
        "service_id": "svc-1",
        "staff_id": "st-1",
        "booking_date": date.format("%Y-%m-%d").to_string(),
        "booking_time": time,
    })
    .to_string()
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let app = test_app(test_state());
    let res = app.oneshot(get_req("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Admin auth ──

#[tokio::test]
async fn test_admin_requires_auth() {
    let state = test_state();

    let app = test_app(state.clone());
    let res = app.oneshot(get_req("/api/admin/services")).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let app = test_app(state);
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/bookings")
                .header("Authorization", "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

// ── Catalog admin ──

#[tokio::test]
async fn test_service_and_staff_setup_via_api() {
    let state = test_state();

    // Create a service
    let app = test_app(state.clone());
    let res = app
        .oneshot(json_req(
            "POST",
            "/api/admin/services",
            r#"{"name":"Coloring","duration_minutes":90,"price_cents":12000,"upfront_fee_cents":3000,"category":"hair"}"#,
            true,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert!(json["id"].is_string());

    // Create a staff member
    let app = test_app(state.clone());
    let res = app
        .oneshot(json_req(
            "POST",
            "/api/admin/staff",
            r#"{"name":"Maya","specialties":["color"],"is_owner":true}"#,
            true,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let staff_id = body_json(res).await["id"].as_str().unwrap().to_string();

    // Configure weekly hours
    let app = test_app(state.clone());
    let res = app
        .oneshot(json_req(
            "PUT",
            &format!("/api/admin/staff/{staff_id}/hours"),
            r#"{"tue":{"start":600,"end":960}}"#,
            true,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Both show up in the listings
    let app = test_app(state.clone());
    let json = body_json(app.oneshot(admin_get("/api/admin/services")).await.unwrap()).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "Coloring");

    let app = test_app(state);
    let json = body_json(app.oneshot(admin_get("/api/admin/staff")).await.unwrap()).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["weekly_hours"]["tue"]["start"], 600);
}

#[tokio::test]
async fn test_invalid_service_rejected() {
    let app = test_app(test_state());
    // upfront fee above price
    let res = app
        .oneshot(json_req(
            "POST",
            "/api/admin/services",
            r#"{"name":"Bad","duration_minutes":30,"price_cents":1000,"upfront_fee_cents":2000}"#,
            true,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_weekly_hours_rejected() {
    let state = test_state();
    seed_catalog(&state);

    // start after end
    let app = test_app(state);
    let res = app
        .oneshot(json_req(
            "PUT",
            "/api/admin/staff/st-1/hours",
            r#"{"mon":{"start":1020,"end":540}}"#,
            true,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_hours_for_unknown_staff_404() {
    let app = test_app(test_state());
    let res = app
        .oneshot(json_req(
            "PUT",
            "/api/admin/staff/missing/hours",
            r#"{"mon":{"start":540,"end":1020}}"#,
            true,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// ── Availability ──

#[tokio::test]
async fn test_availability_full_day() {
    let state = test_state();
    seed_catalog(&state);
    let monday = future_monday();

    let app = test_app(state);
    let res = app
        .oneshot(get_req(&format!(
            "/api/availability?staff_id=st-1&date={monday}&duration=30"
        )))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    let slots: Vec<&str> = json["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();

    assert_eq!(slots.first(), Some(&"09:00"));
    assert!(slots.contains(&"11:30"));
    assert!(!slots.contains(&"12:00"), "break must be excluded");
    assert!(!slots.contains(&"12:30"));
    assert!(slots.contains(&"13:00"));
    assert_eq!(slots.last(), Some(&"16:30"));
}

#[tokio::test]
async fn test_availability_excludes_booked_slot() {
    let state = test_state();
    seed_catalog(&state);
    let monday = future_monday();

    let app = test_app(state.clone());
    let res = app
        .oneshot(json_req(
            "POST",
            "/api/bookings",
            &booking_body(monday, "10:00"),
            false,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let app = test_app(state);
    let json = body_json(
        app.oneshot(get_req(&format!(
            "/api/availability?staff_id=st-1&date={monday}&duration=30"
        )))
        .await
        .unwrap(),
    )
    .await;
    let slots: Vec<&str> = json["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(!slots.contains(&"10:00"));
    assert!(slots.contains(&"09:30"));
    assert!(slots.contains(&"10:30"));
}

#[tokio::test]
async fn test_availability_closed_day_empty() {
    let state = test_state();
    seed_catalog(&state);
    let monday = future_monday();

    // Close the day with an override
    let app = test_app(state.clone());
    let res = app
        .oneshot(json_req(
            "PUT",
            "/api/admin/staff/st-1/overrides",
            &format!(r#"{{"date":"{monday}","closed":true}}"#),
            true,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let app = test_app(state);
    let json = body_json(
        app.oneshot(get_req(&format!(
            "/api/availability?staff_id=st-1&date={monday}&duration=30"
        )))
        .await
        .unwrap(),
    )
    .await;
    assert_eq!(json["slots"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_availability_unknown_staff_404() {
    let state = test_state();
    seed_catalog(&state);
    let monday = future_monday();

    let app = test_app(state);
    let res = app
        .oneshot(get_req(&format!(
            "/api/availability?staff_id=missing&date={monday}&duration=30"
        )))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_availability_bad_date_400() {
    let state = test_state();
    seed_catalog(&state);

    let app = test_app(state);
    let res = app
        .oneshot(get_req(
            "/api/availability?staff_id=st-1&date=June-1st&duration=30",
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Booking admission ──

#[tokio::test]
async fn test_booking_lifecycle() {
    let state = test_state();
    seed_catalog(&state);
    let monday = future_monday();

    // Admit
    let app = test_app(state.clone());
    let res = app
        .oneshot(json_req(
            "POST",
            "/api/bookings",
            &booking_body(monday, "10:00"),
            false,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    let booking_id = json["booking_id"].as_str().unwrap().to_string();
    assert_eq!(json["upfront_fee_cents"], 1000);

    // Payment collaborator confirms
    let app = test_app(state.clone());
    let res = app
        .oneshot(json_req(
            "POST",
            &format!("/api/bookings/{booking_id}/status"),
            r#"{"status":"confirmed","payment_status":"paid","payment_reference":"pay_42"}"#,
            true,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Listing reflects the confirmed, paid booking
    let app = test_app(state);
    let json = body_json(
        app.oneshot(admin_get("/api/bookings?staff_id=st-1&status=confirmed"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["booking_time"], "10:00");
    assert_eq!(json[0]["payment_status"], "paid");
    assert_eq!(json[0]["payment_reference"], "pay_42");
    assert_eq!(json[0]["total_cents"], 4500);
}

#[tokio::test]
async fn test_double_booking_second_fails() {
    let state = test_state();
    seed_catalog(&state);
    let monday = future_monday();

    let app = test_app(state.clone());
    let res = app
        .oneshot(json_req(
            "POST",
            "/api/bookings",
            &booking_body(monday, "10:00"),
            false,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let app = test_app(state);
    let res = app
        .oneshot(json_req(
            "POST",
            "/api/bookings",
            &booking_body(monday, "10:00"),
            false,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let json = body_json(res).await;
    assert_eq!(json["error"], "slot_unavailable");
}

#[tokio::test]
async fn test_booking_unknown_service_422() {
    let state = test_state();
    seed_catalog(&state);
    let monday = future_monday();

    let body = serde_json::json!({
        "client_name": "Alice",
        "client_email": "alice@example.com",
        "service_id": "missing",
        "staff_id": "st-1",
        "booking_date": monday.format("%Y-%m-%d").to_string(),
        "booking_time": "10:00",
    })
    .to_string();

    let app = test_app(state);
    let res = app
        .oneshot(json_req("POST", "/api/bookings", &body, false))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(res).await["error"], "invalid_service");
}

#[tokio::test]
async fn test_booking_missing_client_name_400() {
    let state = test_state();
    seed_catalog(&state);
    let monday = future_monday();

    let body = serde_json::json!({
        "client_name": "  ",
        "client_email": "alice@example.com",
        "service_id": "svc-1",
        "staff_id": "st-1",
        "booking_date": monday.format("%Y-%m-%d").to_string(),
        "booking_time": "10:00",
    })
    .to_string();

    let app = test_app(state);
    let res = app
        .oneshot(json_req("POST", "/api/bookings", &body, false))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_transition_errors() {
    let state = test_state();
    seed_catalog(&state);
    let monday = future_monday();

    let app = test_app(state.clone());
    let res = app
        .oneshot(json_req(
            "POST",
            "/api/bookings",
            &booking_body(monday, "09:00"),
            false,
        ))
        .await
        .unwrap();
    let booking_id = body_json(res).await["booking_id"]
        .as_str()
        .unwrap()
        .to_string();

    // pending → completed is illegal
    let app = test_app(state.clone());
    let res = app
        .oneshot(json_req(
            "POST",
            &format!("/api/bookings/{booking_id}/status"),
            r#"{"status":"completed"}"#,
            true,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["error"], "invalid_transition");

    // unknown id
    let app = test_app(state.clone());
    let res = app
        .oneshot(json_req(
            "POST",
            "/api/bookings/missing/status",
            r#"{"status":"confirmed"}"#,
            true,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // unknown status string
    let app = test_app(state);
    let res = app
        .oneshot(json_req(
            "POST",
            &format!("/api/bookings/{booking_id}/status"),
            r#"{"status":"archived"}"#,
            true,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancelled_booking_frees_the_slot() {
    let state = test_state();
    seed_catalog(&state);
    let monday = future_monday();

    let app = test_app(state.clone());
    let res = app
        .oneshot(json_req(
            "POST",
            "/api/bookings",
            &booking_body(monday, "10:00"),
            false,
        ))
        .await
        .unwrap();
    let booking_id = body_json(res).await["booking_id"]
        .as_str()
        .unwrap()
        .to_string();

    let app = test_app(state.clone());
    let res = app
        .oneshot(json_req(
            "POST",
            &format!("/api/bookings/{booking_id}/status"),
            r#"{"status":"cancelled"}"#,
            true,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let app = test_app(state);
    let res = app
        .oneshot(json_req(
            "POST",
            "/api/bookings",
            &booking_body(monday, "10:00"),
            false,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_service_edit_does_not_rewrite_booking() {
    let state = test_state();
    seed_catalog(&state);
    let monday = future_monday();

    let app = test_app(state.clone());
    let res = app
        .oneshot(json_req(
            "POST",
            "/api/bookings",
            &booking_body(monday, "10:00"),
            false,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Reprice the service after the booking exists
    {
        let db = state.db.lock().unwrap();
        queries::update_service(
            &db,
            &Service {
                id: "svc-1".to_string(),
                name: "Haircut".to_string(),
                duration_minutes: 60,
                price_cents: 9900,
                upfront_fee_cents: 5000,
                category: None,
                active: true,
            },
        )
        .unwrap();
    }

    let app = test_app(state);
    let json = body_json(app.oneshot(admin_get("/api/bookings")).await.unwrap()).await;
    assert_eq!(json[0]["total_cents"], 4500);
    assert_eq!(json[0]["upfront_fee_cents"], 1000);
    assert_eq!(json[0]["duration_minutes"], 30);
}
