use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_timestamp, timestamp_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_treatment(conn: &Connection, treatment: &Treatment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO treatments (id, appointment_id, diagnosis, prescription, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            treatment.id.to_string(),
            treatment.appointment_id.to_string(),
            treatment.diagnosis,
            treatment.prescription,
            format_timestamp(&treatment.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_treatments_for_appointment(
    conn: &Connection,
    appointment_id: &Uuid,
) -> Result<Vec<Treatment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, appointment_id, diagnosis, prescription, created_at
         FROM treatments WHERE appointment_id = ?1
         ORDER BY created_at",
    )?;
    let rows = stmt.query_map(params![appointment_id.to_string()], |row| {
        Ok(Treatment {
            id: uuid_col(row, 0)?,
            appointment_id: uuid_col(row, 1)?,
            diagnosis: row.get(2)?,
            prescription: row.get(3)?,
            created_at: timestamp_col(row, 4)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
