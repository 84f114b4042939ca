use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{DateOverride, DayHours, Service, StaffMember, WeeklyHours};
use crate::state::AppState;

use super::check_auth;

// POST /api/admin/services
#[derive(Deserialize)]
pub struct CreateServiceBody {
    pub name: String,
    pub duration_minutes: u16,
    pub price_cents: i64,
    #[serde(default)]
    pub upfront_fee_cents: i64,
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateServiceBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let service = Service {
        id: Uuid::new_v4().to_string(),
        name: body.name,
        duration_minutes: body.duration_minutes,
        price_cents: body.price_cents,
        upfront_fee_cents: body.upfront_fee_cents,
        category: body.category,
        active: body.active,
    };
    service
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    {
        let db = state.db.lock().unwrap();
        queries::create_service(&db, &service)?;
    }

    Ok(Json(serde_json::json!({"id": service.id})))
}

// GET /api/admin/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Service>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let services = {
        let db = state.db.lock().unwrap();
        queries::list_services(&db)?
    };
    Ok(Json(services))
}

// POST /api/admin/staff
#[derive(Deserialize)]
pub struct CreateStaffBody {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub is_owner: bool,
}

pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateStaffBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    let staff = StaffMember {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        email: body.email,
        phone: body.phone,
        specialties: body.specialties,
        weekly_hours: None,
        active: true,
        is_owner: body.is_owner,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_staff(&db, &staff)?;
    }

    Ok(Json(serde_json::json!({"id": staff.id})))
}

// GET /api/admin/staff
#[derive(Serialize)]
pub struct StaffView {
    id: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    specialties: Vec<String>,
    weekly_hours: Option<WeeklyHours>,
    active: bool,
    is_owner: bool,
}

pub async fn list_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<StaffView>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let staff = {
        let db = state.db.lock().unwrap();
        queries::list_staff(&db)?
    };

    let views = staff
        .into_iter()
        .map(|s| StaffView {
            id: s.id,
            name: s.name,
            email: s.email,
            phone: s.phone,
            specialties: s.specialties,
            weekly_hours: s.weekly_hours,
            active: s.active,
            is_owner: s.is_owner,
        })
        .collect();
    Ok(Json(views))
}

// PUT /api/admin/staff/:id/hours
pub async fn set_staff_hours(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(staff_id): Path<String>,
    Json(hours): Json<WeeklyHours>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    hours
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::set_weekly_hours(&db, &staff_id, &hours)?
    };
    if !updated {
        return Err(AppError::NotFound(format!("staff {staff_id}")));
    }

    Ok(Json(serde_json::json!({"ok": true})))
}

// PUT /api/admin/staff/:id/overrides
#[derive(Deserialize)]
pub struct SetOverrideBody {
    pub date: String,
    #[serde(default)]
    pub closed: bool,
    pub hours: Option<DayHours>,
}

pub async fn set_staff_override(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(staff_id): Path<String>,
    Json(body): Json<SetOverrideBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let date = NaiveDate::parse_from_str(&body.date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date: {}", body.date)))?;
    if let Some(hours) = &body.hours {
        hours
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
    }

    {
        let db = state.db.lock().unwrap();
        if queries::get_staff(&db, &staff_id)?.is_none() {
            return Err(AppError::NotFound(format!("staff {staff_id}")));
        }
        queries::set_override(
            &db,
            &staff_id,
            date,
            &DateOverride {
                closed: body.closed,
                hours: body.hours,
            },
        )?;
    }

    Ok(Json(serde_json::json!({"ok": true})))
}
