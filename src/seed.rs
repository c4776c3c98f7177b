//! Reference data written by the database utility.

use rusqlite::Connection;

use crate::db::repository::find_or_create_department;
use crate::db::{immediate_transaction, DatabaseError};

pub const DEFAULT_DEPARTMENTS: [&str; 7] = [
    "General",
    "Cardiology",
    "Orthopedics",
    "ENT",
    "Dermatology",
    "Neurology",
    "Pediatrics",
];

/// Create whichever default departments are missing. Returns how many were added.
pub fn seed_default_departments(conn: &Connection) -> Result<usize, DatabaseError> {
    let tx = immediate_transaction(conn)?;
    let mut created = 0;
    for name in DEFAULT_DEPARTMENTS {
        let (_, was_created) = find_or_create_department(&tx, name)?;
        if was_created {
            created += 1;
        }
    }
    tx.commit()?;
    tracing::info!(created, "Default departments seeded");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{insert_department, list_departments};
    use crate::db::sqlite::open_memory_database;
    use crate::models::Department;
    use uuid::Uuid;

    #[test]
    fn seeds_all_on_empty_database() {
        let conn = open_memory_database().unwrap();
        assert_eq!(seed_default_departments(&conn).unwrap(), DEFAULT_DEPARTMENTS.len());
        assert_eq!(list_departments(&conn).unwrap().len(), DEFAULT_DEPARTMENTS.len());
    }

    #[test]
    fn seeding_is_idempotent_and_fills_gaps() {
        let conn = open_memory_database().unwrap();
        insert_department(
            &conn,
            &Department {
                id: Uuid::new_v4(),
                name: "Cardiology".into(),
            },
        )
        .unwrap();

        assert_eq!(seed_default_departments(&conn).unwrap(), DEFAULT_DEPARTMENTS.len() - 1);
        assert_eq!(seed_default_departments(&conn).unwrap(), 0);
        assert_eq!(list_departments(&conn).unwrap().len(), DEFAULT_DEPARTMENTS.len());
    }
}
