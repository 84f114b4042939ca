use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Booking, BookingStatus, DateOverride, PaymentStatus, Service, StaffMember, WeeklyHours,
};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ── Services ──

pub fn create_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, name, duration_minutes, price_cents, upfront_fee_cents, category, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            service.id,
            service.name,
            service.duration_minutes,
            service.price_cents,
            service.upfront_fee_cents,
            service.category,
            service.active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        "SELECT id, name, duration_minutes, price_cents, upfront_fee_cents, category, active
         FROM services WHERE id = ?1",
        params![id],
        parse_service_row,
    );

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, duration_minutes, price_cents, upfront_fee_cents, category, active
         FROM services ORDER BY name ASC",
    )?;
    let rows = stmt.query_map([], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

pub fn update_service(conn: &Connection, service: &Service) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET name = ?1, duration_minutes = ?2, price_cents = ?3,
                upfront_fee_cents = ?4, category = ?5, active = ?6,
                updated_at = datetime('now')
         WHERE id = ?7",
        params![
            service.name,
            service.duration_minutes,
            service.price_cents,
            service.upfront_fee_cents,
            service.category,
            service.active as i32,
            service.id,
        ],
    )?;
    Ok(count > 0)
}

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        duration_minutes: row.get(2)?,
        price_cents: row.get(3)?,
        upfront_fee_cents: row.get(4)?,
        category: row.get(5)?,
        active: row.get::<_, i32>(6)? != 0,
    })
}

// ── Staff ──

pub fn create_staff(conn: &Connection, staff: &StaffMember) -> anyhow::Result<()> {
    let specialties = serde_json::to_string(&staff.specialties)?;
    let weekly_hours = match &staff.weekly_hours {
        Some(h) => Some(h.to_json()?),
        None => None,
    };

    conn.execute(
        "INSERT INTO staff (id, name, email, phone, specialties, weekly_hours, active, is_owner)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            staff.id,
            staff.name,
            staff.email,
            staff.phone,
            specialties,
            weekly_hours,
            staff.active as i32,
            staff.is_owner as i32,
        ],
    )?;
    Ok(())
}

pub fn get_staff(conn: &Connection, id: &str) -> anyhow::Result<Option<StaffMember>> {
    let result = conn.query_row(
        "SELECT id, name, email, phone, specialties, weekly_hours, active, is_owner
         FROM staff WHERE id = ?1",
        params![id],
        |row| Ok(parse_staff_row(row)),
    );

    match result {
        Ok(staff) => Ok(Some(staff?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_staff(conn: &Connection) -> anyhow::Result<Vec<StaffMember>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, phone, specialties, weekly_hours, active, is_owner
         FROM staff ORDER BY name ASC",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_staff_row(row)))?;

    let mut staff = vec![];
    for row in rows {
        staff.push(row??);
    }
    Ok(staff)
}

pub fn set_weekly_hours(
    conn: &Connection,
    staff_id: &str,
    hours: &WeeklyHours,
) -> anyhow::Result<bool> {
    let json = hours.to_json()?;
    let count = conn.execute(
        "UPDATE staff SET weekly_hours = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![json, staff_id],
    )?;
    Ok(count > 0)
}

fn parse_staff_row(row: &rusqlite::Row) -> anyhow::Result<StaffMember> {
    let specialties_json: String = row.get(4)?;
    let weekly_hours_json: Option<String> = row.get(5)?;

    let specialties: Vec<String> = serde_json::from_str(&specialties_json).unwrap_or_default();
    let weekly_hours = match weekly_hours_json {
        Some(json) => Some(WeeklyHours::from_json(&json)?),
        None => None,
    };

    Ok(StaffMember {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        specialties,
        weekly_hours,
        active: row.get::<_, i32>(6)? != 0,
        is_owner: row.get::<_, i32>(7)? != 0,
    })
}

// ── Schedule overrides ──

pub fn set_override(
    conn: &Connection,
    staff_id: &str,
    date: NaiveDate,
    override_: &DateOverride,
) -> anyhow::Result<()> {
    let hours = match &override_.hours {
        Some(h) => Some(serde_json::to_string(h)?),
        None => None,
    };
    conn.execute(
        "INSERT INTO schedule_overrides (staff_id, override_date, closed, hours)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(staff_id, override_date) DO UPDATE SET
           closed = excluded.closed,
           hours = excluded.hours",
        params![
            staff_id,
            date.format(DATE_FMT).to_string(),
            override_.closed as i32,
            hours,
        ],
    )?;
    Ok(())
}

pub fn get_override(
    conn: &Connection,
    staff_id: &str,
    date: NaiveDate,
) -> anyhow::Result<Option<DateOverride>> {
    let result = conn.query_row(
        "SELECT closed, hours FROM schedule_overrides
         WHERE staff_id = ?1 AND override_date = ?2",
        params![staff_id, date.format(DATE_FMT).to_string()],
        |row| {
            let closed: i32 = row.get(0)?;
            let hours: Option<String> = row.get(1)?;
            Ok((closed != 0, hours))
        },
    );

    match result {
        Ok((closed, hours_json)) => {
            let hours = match hours_json {
                Some(json) => Some(serde_json::from_str(&json)?),
                None => None,
            };
            Ok(Some(DateOverride { closed, hours }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, client_name, client_email, client_phone, service_id, staff_id, \
     booking_date, booking_time, duration_minutes, total_cents, upfront_fee_cents, \
     status, payment_status, payment_reference, notes, created_at, updated_at";

/// Atomic check-then-insert: re-counts overlapping slot-holding bookings
/// for (staff, date) and inserts inside one transaction. Returns false
/// when the slot was taken, in which case nothing is written.
pub fn insert_booking_if_free(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let tx = conn.unchecked_transaction()?;

    let date_str = booking.booking_date.format(DATE_FMT).to_string();
    let overlapping: i64 = tx.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE staff_id = ?1 AND booking_date = ?2
           AND status IN ('pending', 'confirmed')
           AND booking_time < ?3
           AND booking_time + duration_minutes > ?4",
        params![
            booking.staff_id,
            date_str,
            booking.end_time(),
            booking.booking_time,
        ],
        |row| row.get(0),
    )?;

    if overlapping > 0 {
        return Ok(false);
    }

    tx.execute(
        &format!("INSERT INTO bookings ({BOOKING_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"),
        params![
            booking.id,
            booking.client_name,
            booking.client_email,
            booking.client_phone,
            booking.service_id,
            booking.staff_id,
            date_str,
            booking.booking_time,
            booking.duration_minutes,
            booking.total_cents,
            booking.upfront_fee_cents,
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.payment_reference,
            booking.notes,
            booking.created_at.format(DATETIME_FMT).to_string(),
            booking.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;

    tx.commit()?;
    Ok(true)
}

/// Bookings still holding their slot on the given day, ordered by start
/// time. Feeds the availability computation.
pub fn slot_holding_bookings(
    conn: &Connection,
    staff_id: &str,
    date: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE staff_id = ?1 AND booking_date = ?2
           AND status IN ('pending', 'confirmed')
         ORDER BY booking_time ASC"
    ))?;

    let date_str = date.format(DATE_FMT).to_string();
    let rows = stmt.query_map(params![staff_id, date_str], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Range listing for calendar and dashboard consumers; every filter is
/// optional. Ordered by date then start time.
pub fn bookings_in_range(
    conn: &Connection,
    staff_id: Option<&str>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    status: Option<BookingStatus>,
) -> anyhow::Result<Vec<Booking>> {
    let mut sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE 1=1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(staff_id) = staff_id {
        params_vec.push(Box::new(staff_id.to_string()));
        sql.push_str(&format!(" AND staff_id = ?{}", params_vec.len()));
    }
    if let Some(from) = from {
        params_vec.push(Box::new(from.format(DATE_FMT).to_string()));
        sql.push_str(&format!(" AND booking_date >= ?{}", params_vec.len()));
    }
    if let Some(to) = to {
        params_vec.push(Box::new(to.format(DATE_FMT).to_string()));
        sql.push_str(&format!(" AND booking_date <= ?{}", params_vec.len()));
    }
    if let Some(status) = status {
        params_vec.push(Box::new(status.as_str().to_string()));
        sql.push_str(&format!(" AND status = ?{}", params_vec.len()));
    }
    sql.push_str(" ORDER BY booking_date ASC, booking_time ASC");

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
    payment_status: Option<PaymentStatus>,
    payment_reference: Option<&str>,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let count = match payment_status {
        Some(ps) => conn.execute(
            "UPDATE bookings SET status = ?1, payment_status = ?2,
                    payment_reference = COALESCE(?3, payment_reference), updated_at = ?4
             WHERE id = ?5",
            params![status.as_str(), ps.as_str(), payment_reference, now, id],
        )?,
        None => conn.execute(
            "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), now, id],
        )?,
    };
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let date_str: String = row.get(6)?;
    let status_str: String = row.get(11)?;
    let payment_str: String = row.get(12)?;
    let created_at_str: String = row.get(15)?;
    let updated_at_str: String = row.get(16)?;

    let booking_date = NaiveDate::parse_from_str(&date_str, DATE_FMT)?;
    let status = BookingStatus::parse(&status_str)
        .ok_or_else(|| anyhow::anyhow!("unknown booking status: {status_str}"))?;
    let payment_status = PaymentStatus::parse(&payment_str)
        .ok_or_else(|| anyhow::anyhow!("unknown payment status: {payment_str}"))?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Booking {
        id: row.get(0)?,
        client_name: row.get(1)?,
        client_email: row.get(2)?,
        client_phone: row.get(3)?,
        service_id: row.get(4)?,
        staff_id: row.get(5)?,
        booking_date,
        booking_time: row.get(7)?,
        duration_minutes: row.get(8)?,
        total_cents: row.get(9)?,
        upfront_fee_cents: row.get(10)?,
        status,
        payment_status,
        payment_reference: row.get(13)?,
        notes: row.get(14)?,
        created_at,
        updated_at,
    })
}
