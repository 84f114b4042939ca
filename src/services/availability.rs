use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::hours::MINUTES_PER_DAY;
use crate::models::{DayHours, StaffMember};

#[derive(Debug, Clone, Copy)]
pub struct SlotOptions {
    pub granularity_minutes: u16,
    pub min_lead_minutes: u16,
}

/// Remove `[busy_start, busy_end)` from a set of open intervals. A busy
/// interval that lands mid-window splits it in two; one that covers a
/// window removes it.
pub fn subtract_interval(windows: Vec<(u16, u16)>, busy_start: u16, busy_end: u16) -> Vec<(u16, u16)> {
    let mut out = Vec::with_capacity(windows.len() + 1);
    for (start, end) in windows {
        if busy_end <= start || busy_start >= end {
            out.push((start, end));
            continue;
        }
        if start < busy_start {
            out.push((start, busy_start));
        }
        if busy_end < end {
            out.push((busy_end, end));
        }
    }
    out
}

/// Valid booking start times (minute-of-day, ascending) for one staff
/// member on one date, for a service of the given duration.
///
/// Working windows come from the date override if one exists, otherwise
/// the weekly template; existing slot-holding bookings are subtracted as
/// exact intervals before quantizing, so a non-aligned booking cannot
/// suppress an adjacent aligned slot. An empty result means no
/// availability, which callers must not treat as an error.
pub fn compute_slots(
    conn: &Connection,
    staff: &StaffMember,
    date: NaiveDate,
    duration_minutes: u16,
    now: NaiveDateTime,
    opts: &SlotOptions,
) -> anyhow::Result<Vec<u16>> {
    if duration_minutes == 0 || duration_minutes > MINUTES_PER_DAY || date < now.date() {
        return Ok(vec![]);
    }

    let day = match resolve_day_hours(conn, staff, date)? {
        Some(day) => day,
        None => return Ok(vec![]),
    };

    let mut windows = day.windows();
    for booking in queries::slot_holding_bookings(conn, &staff.id, date)? {
        windows = subtract_interval(windows, booking.booking_time, booking.end_time());
    }

    // Earliest admissible start: only constrains today.
    let cutoff: i64 = if date == now.date() {
        i64::from(now.time().hour() * 60 + now.time().minute()) + i64::from(opts.min_lead_minutes)
    } else {
        0
    };

    let step = opts.granularity_minutes.max(1);
    let mut slots = vec![];
    for (start, end) in windows {
        let mut t = start;
        while t + duration_minutes <= end {
            if i64::from(t) >= cutoff {
                slots.push(t);
            }
            t += step;
        }
    }
    Ok(slots)
}

/// Override first, weekly template second; a closed override or a
/// disabled weekday yields None.
fn resolve_day_hours(
    conn: &Connection,
    staff: &StaffMember,
    date: NaiveDate,
) -> anyhow::Result<Option<DayHours>> {
    if let Some(override_) = queries::get_override(conn, &staff.id, date)? {
        if override_.closed {
            return Ok(None);
        }
        if let Some(hours) = override_.hours {
            return Ok(Some(hours));
        }
    }

    Ok(staff
        .weekly_hours
        .as_ref()
        .and_then(|w| w.for_weekday(date.weekday()))
        .copied())
}
