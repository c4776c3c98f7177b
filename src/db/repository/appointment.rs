use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{enum_col, format_timestamp, instant_col, instant_to_secs, timestamp_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str =
    "a.id, a.patient_id, a.doctor_id, a.start_at, a.end_at, a.reason, a.status, a.created_at";

fn appointment_from_row(row: &Row) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: uuid_col(row, 0)?,
        patient_id: uuid_col(row, 1)?,
        doctor_id: uuid_col(row, 2)?,
        start: instant_col(row, 3)?,
        end: instant_col(row, 4)?,
        reason: row.get(5)?,
        status: enum_col(row, 6)?,
        created_at: timestamp_col(row, 7)?,
    })
}

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_id, doctor_id, start_at, end_at, reason, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            appt.id.to_string(),
            appt.patient_id.to_string(),
            appt.doctor_id.to_string(),
            instant_to_secs(&appt.start),
            instant_to_secs(&appt.end),
            appt.reason,
            appt.status.as_str(),
            format_timestamp(&appt.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let appt = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.id = ?1"),
            params![id.to_string()],
            appointment_from_row,
        )
        .optional()?;
    Ok(appt)
}

/// First booked appointment of `doctor_id` overlapping `[start, end)`.
///
/// Existing `[a, b)` and requested `[c, d)` overlap iff `a < d AND c < b`;
/// slots that only touch at an endpoint do not.
pub fn find_conflicting_appointment(
    conn: &Connection,
    doctor_id: &Uuid,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> Result<Option<Appointment>, DatabaseError> {
    let appt = conn
        .query_row(
            &format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments a
                 WHERE a.doctor_id = ?1
                   AND a.status = ?2
                   AND a.start_at < ?4
                   AND ?3 < a.end_at
                 ORDER BY a.start_at
                 LIMIT 1"
            ),
            params![
                doctor_id.to_string(),
                AppointmentStatus::Booked.as_str(),
                instant_to_secs(start),
                instant_to_secs(end),
            ],
            appointment_from_row,
        )
        .optional()?;
    Ok(appt)
}

/// Move a booked appointment to completed. Returns false when the row was
/// not in the booked state (already completed or missing).
pub fn mark_appointment_completed(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?2 WHERE id = ?1 AND status = ?3",
        params![
            id.to_string(),
            AppointmentStatus::Completed.as_str(),
            AppointmentStatus::Booked.as_str(),
        ],
    )?;
    Ok(changed == 1)
}

/// Appointments with both parties' display names.
pub fn list_appointment_details(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> Result<Vec<AppointmentDetail>, DatabaseError> {
    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(doctor_id) = filter.doctor_id {
        values.push(Value::Text(doctor_id.to_string()));
        clauses.push(format!("a.doctor_id = ?{}", values.len()));
    }
    if let Some(patient_id) = filter.patient_id {
        values.push(Value::Text(patient_id.to_string()));
        clauses.push(format!("a.patient_id = ?{}", values.len()));
    }
    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let direction = if filter.newest_first { "DESC" } else { "ASC" };

    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS},
                CASE WHEN du.full_name = '' THEN du.username ELSE du.full_name END,
                CASE WHEN pu.full_name = '' THEN pu.username ELSE pu.full_name END
         FROM appointments a
         JOIN doctors d ON d.id = a.doctor_id
         JOIN users du ON du.id = d.user_id
         JOIN patients p ON p.id = a.patient_id
         JOIN users pu ON pu.id = p.user_id
         {where_clause}
         ORDER BY a.start_at {direction}, a.created_at {direction}"
    ))?;

    let rows = stmt.query_map(params_from_iter(values), |row| {
        Ok(AppointmentDetail {
            appointment: appointment_from_row(row)?,
            doctor_name: row.get(8)?,
            patient_name: row.get(9)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
