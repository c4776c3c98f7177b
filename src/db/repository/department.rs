use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::uuid_col;
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_department(conn: &Connection, dept: &Department) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO departments (id, name) VALUES (?1, ?2)",
        params![dept.id.to_string(), dept.name],
    )?;
    Ok(())
}

pub fn find_department_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<Department>, DatabaseError> {
    let dept = conn
        .query_row(
            "SELECT id, name FROM departments WHERE name = ?1",
            params![name],
            |row| {
                Ok(Department {
                    id: uuid_col(row, 0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(dept)
}

/// Look a department up by exact name, creating it when absent.
///
/// Returns the department and whether it was created by this call.
pub fn find_or_create_department(
    conn: &Connection,
    name: &str,
) -> Result<(Department, bool), DatabaseError> {
    if let Some(dept) = find_department_by_name(conn, name)? {
        return Ok((dept, false));
    }
    let dept = Department {
        id: Uuid::new_v4(),
        name: name.to_string(),
    };
    insert_department(conn, &dept)?;
    Ok((dept, true))
}

pub fn list_departments(conn: &Connection) -> Result<Vec<Department>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name FROM departments ORDER BY name")?;
    let rows = stmt.query_map([], |row| {
        Ok(Department {
            id: uuid_col(row, 0)?,
            name: row.get(1)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
