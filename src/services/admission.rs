use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::models::{Booking, BookingStatus, PaymentStatus};
use crate::services::availability::{self, SlotOptions};

#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("unknown or inactive service")]
    InvalidService,

    #[error("unknown or inactive staff member")]
    InvalidStaff,

    #[error("that time slot is no longer available")]
    SlotUnavailable,

    #[error("booking cannot move from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("booking not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub service_id: String,
    pub staff_id: String,
    pub booking_date: NaiveDate,
    pub booking_time: u16,
    pub notes: Option<String>,
}

#[derive(Debug)]
pub struct AdmissionOutcome {
    pub booking_id: String,
    pub upfront_fee_cents: i64,
}

/// Admit a booking request: validate service and staff, re-check the
/// requested slot against current availability, then commit through the
/// store's atomic check-then-insert. Duration and prices are snapshotted
/// from the service row so later catalog edits never touch the booking.
///
/// The availability re-check runs at admission time even though the
/// client already fetched slots; a concurrent booking may have landed in
/// between, and the transactional insert closes the remaining window
/// between re-check and commit.
pub fn create_booking(
    conn: &Connection,
    req: &BookingRequest,
    now: NaiveDateTime,
    opts: &SlotOptions,
) -> Result<AdmissionOutcome, AdmissionError> {
    let service = queries::get_service(conn, &req.service_id)?
        .filter(|s| s.active)
        .ok_or(AdmissionError::InvalidService)?;

    let staff = queries::get_staff(conn, &req.staff_id)?
        .filter(|s| s.active)
        .ok_or(AdmissionError::InvalidStaff)?;

    let slots = availability::compute_slots(
        conn,
        &staff,
        req.booking_date,
        service.duration_minutes,
        now,
        opts,
    )?;
    if !slots.contains(&req.booking_time) {
        return Err(AdmissionError::SlotUnavailable);
    }

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        client_name: req.client_name.clone(),
        client_email: req.client_email.clone(),
        client_phone: req.client_phone.clone(),
        service_id: service.id.clone(),
        staff_id: staff.id.clone(),
        booking_date: req.booking_date,
        booking_time: req.booking_time,
        duration_minutes: service.duration_minutes,
        total_cents: service.price_cents,
        upfront_fee_cents: service.upfront_fee_cents,
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::Unpaid,
        payment_reference: None,
        notes: req.notes.clone(),
        created_at: now,
        updated_at: now,
    };

    if !queries::insert_booking_if_free(conn, &booking)? {
        // Lost the race to a concurrent admission.
        return Err(AdmissionError::SlotUnavailable);
    }

    tracing::info!(
        booking_id = %booking.id,
        staff_id = %booking.staff_id,
        date = %booking.booking_date,
        "booking admitted"
    );

    Ok(AdmissionOutcome {
        booking_id: booking.id,
        upfront_fee_cents: booking.upfront_fee_cents,
    })
}

/// Move a booking through its lifecycle. The external payment
/// collaborator reports capture results here via `payment_status` and
/// `payment_reference` alongside the confirm transition.
pub fn set_status(
    conn: &Connection,
    booking_id: &str,
    new_status: BookingStatus,
    payment_status: Option<PaymentStatus>,
    payment_reference: Option<&str>,
) -> Result<(), AdmissionError> {
    let booking = queries::get_booking(conn, booking_id)?.ok_or(AdmissionError::NotFound)?;

    if !booking.status.can_transition(new_status) {
        return Err(AdmissionError::InvalidTransition {
            from: booking.status.as_str(),
            to: new_status.as_str(),
        });
    }

    let updated = queries::update_booking_status(
        conn,
        booking_id,
        new_status,
        payment_status,
        payment_reference,
    )?;
    if !updated {
        return Err(AdmissionError::NotFound);
    }
    Ok(())
}
