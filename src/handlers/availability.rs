use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::hours::format_hhmm;
use crate::services::availability::{compute_slots, SlotOptions};
use crate::state::AppState;

// GET /api/availability
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub staff_id: String,
    pub date: String,
    pub duration: u16,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    slots: Vec<String>,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date: {}", query.date)))?;

    let opts = SlotOptions {
        granularity_minutes: state.config.slot_granularity_minutes,
        min_lead_minutes: state.config.min_lead_minutes,
    };

    let slots = {
        let db = state.db.lock().unwrap();
        let staff = queries::get_staff(&db, &query.staff_id)?
            .ok_or_else(|| AppError::NotFound(format!("staff {}", query.staff_id)))?;

        if staff.active {
            compute_slots(
                &db,
                &staff,
                date,
                query.duration,
                Utc::now().naive_utc(),
                &opts,
            )?
        } else {
            // Inactive staff take no bookings; report as no availability
            vec![]
        }
    };

    Ok(Json(AvailabilityResponse {
        slots: slots.into_iter().map(format_hhmm).collect(),
    }))
}
