use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::hours::{format_hhmm, parse_hhmm};
use crate::models::{Booking, BookingStatus, PaymentStatus};
use crate::services::admission::{self, BookingRequest};
use crate::services::availability::SlotOptions;
use crate::state::AppState;

use super::check_auth;

fn slot_options(state: &AppState) -> SlotOptions {
    SlotOptions {
        granularity_minutes: state.config.slot_granularity_minutes,
        min_lead_minutes: state.config.min_lead_minutes,
    }
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingBody {
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub service_id: String,
    pub staff_id: String,
    pub booking_date: String,
    pub booking_time: String,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct CreateBookingResponse {
    booking_id: String,
    upfront_fee_cents: i64,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingBody>,
) -> Result<Json<CreateBookingResponse>, AppError> {
    if body.client_name.trim().is_empty() || body.client_email.trim().is_empty() {
        return Err(AppError::BadRequest(
            "client_name and client_email are required".to_string(),
        ));
    }

    let booking_date = NaiveDate::parse_from_str(&body.booking_date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date: {}", body.booking_date)))?;
    let booking_time = parse_hhmm(&body.booking_time)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let req = BookingRequest {
        client_name: body.client_name.trim().to_string(),
        client_email: body.client_email.trim().to_string(),
        client_phone: body.client_phone,
        service_id: body.service_id,
        staff_id: body.staff_id,
        booking_date,
        booking_time,
        notes: body.notes,
    };

    let outcome = {
        let db = state.db.lock().unwrap();
        admission::create_booking(&db, &req, Utc::now().naive_utc(), &slot_options(&state))?
    };

    Ok(Json(CreateBookingResponse {
        booking_id: outcome.booking_id,
        upfront_fee_cents: outcome.upfront_fee_cents,
    }))
}

// POST /api/bookings/:id/status
#[derive(Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
    pub payment_status: Option<String>,
    pub payment_reference: Option<String>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status = BookingStatus::parse(&body.status)
        .ok_or_else(|| AppError::BadRequest(format!("invalid status: {}", body.status)))?;
    let payment_status = match &body.payment_status {
        Some(s) => Some(
            PaymentStatus::parse(s)
                .ok_or_else(|| AppError::BadRequest(format!("invalid payment status: {s}")))?,
        ),
        None => None,
    };

    {
        let db = state.db.lock().unwrap();
        admission::set_status(
            &db,
            &id,
            status,
            payment_status,
            body.payment_reference.as_deref(),
        )?;
    }

    Ok(Json(serde_json::json!({"ok": true})))
}

// GET /api/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub staff_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct BookingView {
    id: String,
    client_name: String,
    client_email: String,
    client_phone: Option<String>,
    service_id: String,
    staff_id: String,
    booking_date: String,
    booking_time: String,
    duration_minutes: u16,
    total_cents: i64,
    upfront_fee_cents: i64,
    status: String,
    payment_status: String,
    payment_reference: Option<String>,
    notes: Option<String>,
    created_at: String,
}

impl From<Booking> for BookingView {
    fn from(b: Booking) -> Self {
        BookingView {
            id: b.id,
            client_name: b.client_name,
            client_email: b.client_email,
            client_phone: b.client_phone,
            service_id: b.service_id,
            staff_id: b.staff_id,
            booking_date: b.booking_date.format("%Y-%m-%d").to_string(),
            booking_time: format_hhmm(b.booking_time),
            duration_minutes: b.duration_minutes,
            total_cents: b.total_cents,
            upfront_fee_cents: b.upfront_fee_cents,
            status: b.status.as_str().to_string(),
            payment_status: b.payment_status.as_str().to_string(),
            payment_reference: b.payment_reference,
            notes: b.notes,
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

fn parse_date_param(value: &Option<String>) -> Result<Option<NaiveDate>, AppError> {
    match value {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("invalid date: {s}"))),
        None => Ok(None),
    }
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingView>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let from = parse_date_param(&query.from)?;
    let to = parse_date_param(&query.to)?;
    let status = match &query.status {
        Some(s) => Some(
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::BadRequest(format!("invalid status: {s}")))?,
        ),
        None => None,
    };

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::bookings_in_range(&db, query.staff_id.as_deref(), from, to, status)?
    };

    Ok(Json(bookings.into_iter().map(BookingView::from).collect()))
}
