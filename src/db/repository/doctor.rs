use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{opt_uuid_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const DOCTOR_COLUMNS: &str =
    "d.id, d.user_id, d.department_id, d.specialization, d.contact, d.is_active, d.is_approved";

fn doctor_from_row(row: &Row) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        department_id: opt_uuid_col(row, 2)?,
        specialization: row.get(3)?,
        contact: row.get(4)?,
        is_active: row.get(5)?,
        is_approved: row.get(6)?,
    })
}

pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (id, user_id, department_id, specialization, contact, is_active, is_approved)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            doctor.id.to_string(),
            doctor.user_id.to_string(),
            doctor.department_id.map(|id| id.to_string()),
            doctor.specialization,
            doctor.contact,
            doctor.is_active,
            doctor.is_approved,
        ],
    )?;
    Ok(())
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Option<Doctor>, DatabaseError> {
    let doctor = conn
        .query_row(
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors d WHERE d.id = ?1"),
            params![id.to_string()],
            doctor_from_row,
        )
        .optional()?;
    Ok(doctor)
}

pub fn get_doctor_by_user(conn: &Connection, user_id: &Uuid) -> Result<Option<Doctor>, DatabaseError> {
    let doctor = conn
        .query_row(
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors d WHERE d.user_id = ?1"),
            params![user_id.to_string()],
            doctor_from_row,
        )
        .optional()?;
    Ok(doctor)
}

/// Set the login-gating flags of a doctor profile.
pub fn update_doctor_status(
    conn: &Connection,
    id: &Uuid,
    is_active: bool,
    is_approved: bool,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET is_active = ?2, is_approved = ?3 WHERE id = ?1",
        params![id.to_string(), is_active, is_approved],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Doctor".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn doctor_summary_from_row(row: &Row) -> rusqlite::Result<DoctorSummary> {
    Ok(DoctorSummary {
        doctor: doctor_from_row(row)?,
        username: row.get(7)?,
        full_name: row.get(8)?,
        email: row.get(9)?,
        department: row.get(10)?,
    })
}

/// Doctors joined with identity and department, ordered by display name.
///
/// With `available_only`, only active and approved doctors are returned.
pub fn list_doctor_summaries(
    conn: &Connection,
    available_only: bool,
) -> Result<Vec<DoctorSummary>, DatabaseError> {
    let filter = if available_only {
        "WHERE d.is_active = 1 AND d.is_approved = 1"
    } else {
        ""
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCTOR_COLUMNS}, u.username, u.full_name, u.email, dep.name
         FROM doctors d
         JOIN users u ON u.id = d.user_id
         LEFT JOIN departments dep ON dep.id = d.department_id
         {filter}
         ORDER BY u.full_name, u.username"
    ))?;
    let rows = stmt.query_map([], doctor_summary_from_row)?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn get_doctor_summary(conn: &Connection, id: &Uuid) -> Result<Option<DoctorSummary>, DatabaseError> {
    let summary = conn
        .query_row(
            &format!(
                "SELECT {DOCTOR_COLUMNS}, u.username, u.full_name, u.email, dep.name
                 FROM doctors d
                 JOIN users u ON u.id = d.user_id
                 LEFT JOIN departments dep ON dep.id = d.department_id
                 WHERE d.id = ?1"
            ),
            params![id.to_string()],
            doctor_summary_from_row,
        )
        .optional()?;
    Ok(summary)
}
