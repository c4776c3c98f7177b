use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{enum_col, format_timestamp, timestamp_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, role, created_at";

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_col(row, 0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        full_name: row.get(4)?,
        role: enum_col(row, 5)?,
        created_at: timestamp_col(row, 6)?,
    })
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, username, email, password_hash, full_name, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id.to_string(),
            user.username,
            user.email,
            user.password_hash,
            user.full_name,
            user.role.as_str(),
            format_timestamp(&user.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.to_string()],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

/// Find the identity a login identifier refers to: a username or an email.
///
/// A username match wins over an email match so the result is at most one row
/// even when one account's email equals another's handle.
pub fn find_user_by_login(
    conn: &Connection,
    identifier: &str,
) -> Result<Option<User>, DatabaseError> {
    let user = conn
        .query_row(
            &format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE username = ?1 OR email = ?1
                 ORDER BY (username = ?1) DESC
                 LIMIT 1"
            ),
            params![identifier],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

/// Whether either the handle or the email is already taken.
pub fn user_exists(conn: &Connection, username: &str, email: &str) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2",
        params![username, email],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn count_users_with_role(conn: &Connection, role: Role) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = ?1",
        params![role.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}
