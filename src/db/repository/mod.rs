//! Repository layer: entity-scoped database operations.
//!
//! Each sub-module owns the SQL for one table. Functions take a borrowed
//! `Connection` (or a `Transaction`, which derefs to one) so callers decide
//! the transaction boundary.

mod appointment;
mod department;
mod doctor;
mod patient;
mod treatment;
mod user;

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

use super::DatabaseError;

pub use appointment::*;
pub use department::*;
pub use doctor::*;
pub use patient::*;
pub use treatment::*;
pub use user::*;

/// Text format of audit timestamps (`created_at` columns).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Naive timestamp as integer seconds, the ordered form slots are stored in.
pub(crate) fn instant_to_secs(ts: &NaiveDateTime) -> i64 {
    ts.and_utc().timestamp()
}

pub(crate) fn uuid_col(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn opt_uuid_col(row: &Row, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        Uuid::parse_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub(crate) fn enum_col<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = DatabaseError>,
{
    let raw: String = row.get(idx)?;
    T::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn timestamp_col(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn instant_col(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let secs: i64 = row.get(idx)?;
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.naive_utc())
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs))
}
