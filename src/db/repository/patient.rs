use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::uuid_col;
use crate::db::DatabaseError;
use crate::models::*;

fn patient_from_row(row: &Row) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        dob: row.get(2)?,
        gender: row.get(3)?,
        contact: row.get(4)?,
    })
}

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, user_id, dob, gender, contact) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            patient.id.to_string(),
            patient.user_id.to_string(),
            patient.dob,
            patient.gender,
            patient.contact,
        ],
    )?;
    Ok(())
}

pub fn get_patient_by_user(conn: &Connection, user_id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let patient = conn
        .query_row(
            "SELECT id, user_id, dob, gender, contact FROM patients WHERE user_id = ?1",
            params![user_id.to_string()],
            patient_from_row,
        )
        .optional()?;
    Ok(patient)
}

pub fn list_patient_summaries(conn: &Connection) -> Result<Vec<PatientSummary>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.user_id, p.dob, p.gender, p.contact, u.username, u.full_name, u.email
         FROM patients p
         JOIN users u ON u.id = p.user_id
         ORDER BY u.full_name, u.username",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(PatientSummary {
            patient: patient_from_row(row)?,
            username: row.get(5)?,
            full_name: row.get(6)?,
            email: row.get(7)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
