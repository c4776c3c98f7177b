//! Scheduling ledger: slot booking and appointment completion.
//!
//! Slots are half-open `[start, end)`. For any doctor, no two booked
//! appointments overlap. The conflict check and the insert share one
//! `BEGIN IMMEDIATE` transaction, so concurrent bookers serialize on the
//! database write lock and only one of two overlapping requests commits.

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::optional;
use crate::authorization::{authorize, Area, AuthorizationError, Principal};
use crate::db::repository::{self as repo};
use crate::db::{immediate_transaction, DatabaseError};
use crate::models::*;

/// Accepted naive layouts, tried in order after RFC 3339.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

// ═══════════════════════════════════════════════════════════
// Time slots
// ═══════════════════════════════════════════════════════════

/// Parse a user-supplied instant.
///
/// RFC 3339 values keep their local wall-clock part; no zone conversion
/// happens. Sub-second precision is dropped to match storage.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        })?;
    parsed.with_nanosecond(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSlot {
    /// A slot must end strictly after it starts.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, SchedulingError> {
        if end <= start {
            return Err(SchedulingError::InvalidTimeRange);
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, SchedulingError> {
        let start = parse_datetime(start).ok_or(SchedulingError::InvalidTimeRange)?;
        let end = parse_datetime(end).ok_or(SchedulingError::InvalidTimeRange)?;
        Self::new(start, end)
    }

    /// `[a, b)` and `[c, d)` overlap iff `a < d && c < b`.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

// ═══════════════════════════════════════════════════════════
// Requests
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingRequest {
    pub start: String,
    pub end: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionRequest {
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
}

// ═══════════════════════════════════════════════════════════
// Error type
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error(transparent)]
    Forbidden(#[from] AuthorizationError),
    #[error("Your profile was not found. Contact admin.")]
    ProfileMissing,
    #[error("Your account is inactive or pending approval. Contact admin.")]
    Inactive,
    #[error("Doctor not found.")]
    DoctorNotFound,
    #[error("Appointment not found.")]
    AppointmentNotFound,
    #[error("Invalid time range.")]
    InvalidTimeRange,
    #[error("That slot is already booked.")]
    SlotTaken { conflicting: Uuid },
    #[error("You are not authorized to modify this appointment.")]
    NotOwner,
    #[error("This appointment is already completed.")]
    AlreadyCompleted,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for SchedulingError {
    fn from(err: rusqlite::Error) -> Self {
        SchedulingError::Database(DatabaseError::Sqlite(err))
    }
}

fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

// ═══════════════════════════════════════════════════════════
// Booking
// ═══════════════════════════════════════════════════════════

/// A doctor the patient may book: exists, active and approved.
pub fn bookable_doctor(
    conn: &Connection,
    caller: &Principal,
    doctor_id: &Uuid,
) -> Result<DoctorSummary, SchedulingError> {
    authorize(caller, Area::PatientPortal)?;
    repo::get_doctor_summary(conn, doctor_id)?
        .filter(|summary| summary.doctor.is_available())
        .ok_or(SchedulingError::DoctorNotFound)
}

/// Book `[start, end)` with a doctor for the calling patient.
pub fn book_appointment(
    conn: &Connection,
    caller: &Principal,
    doctor_id: &Uuid,
    request: &BookingRequest,
) -> Result<Appointment, SchedulingError> {
    authorize(caller, Area::PatientPortal)?;
    let patient =
        repo::get_patient_by_user(conn, &caller.user_id)?.ok_or(SchedulingError::ProfileMissing)?;
    let slot = TimeSlot::parse(&request.start, &request.end)?;

    let tx = immediate_transaction(conn)?;
    let doctor = repo::get_doctor(&tx, doctor_id)?
        .filter(Doctor::is_available)
        .ok_or(SchedulingError::DoctorNotFound)?;

    if let Some(existing) = repo::find_conflicting_appointment(&tx, &doctor.id, &slot.start, &slot.end)? {
        tracing::info!(
            doctor_id = %doctor.id,
            conflicting = %existing.id,
            "Booking rejected: slot taken"
        );
        return Err(SchedulingError::SlotTaken {
            conflicting: existing.id,
        });
    }

    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        doctor_id: doctor.id,
        start: slot.start,
        end: slot.end,
        reason: optional(request.reason.as_deref()),
        status: AppointmentStatus::Booked,
        created_at: now(),
    };
    repo::insert_appointment(&tx, &appointment)?;
    tx.commit()?;

    tracing::info!(
        appointment_id = %appointment.id,
        doctor_id = %doctor.id,
        patient_id = %patient.id,
        "Appointment booked"
    );
    Ok(appointment)
}

// ═══════════════════════════════════════════════════════════
// Completion
// ═══════════════════════════════════════════════════════════

/// Resolve the calling doctor's profile and an appointment they own.
fn owned_appointment(
    conn: &Connection,
    caller: &Principal,
    appointment_id: &Uuid,
) -> Result<(Doctor, Appointment), SchedulingError> {
    authorize(caller, Area::Clinic)?;
    let doctor =
        repo::get_doctor_by_user(conn, &caller.user_id)?.ok_or(SchedulingError::ProfileMissing)?;
    // Status may change after login.
    if !doctor.is_available() {
        tracing::warn!(doctor_id = %doctor.id, "Completion denied: doctor unavailable");
        return Err(SchedulingError::Inactive);
    }
    let appointment =
        repo::get_appointment(conn, appointment_id)?.ok_or(SchedulingError::AppointmentNotFound)?;
    if appointment.doctor_id != doctor.id {
        tracing::warn!(
            doctor_id = %doctor.id,
            appointment_id = %appointment.id,
            "Completion denied: not the owning doctor"
        );
        return Err(SchedulingError::NotOwner);
    }
    Ok((doctor, appointment))
}

/// Data for the completion form, under the same ownership rule as completion.
pub fn appointment_for_completion(
    conn: &Connection,
    caller: &Principal,
    appointment_id: &Uuid,
) -> Result<AppointmentDetail, SchedulingError> {
    let (doctor, appointment) = owned_appointment(conn, caller, appointment_id)?;
    repo::list_appointment_details(conn, &AppointmentFilter::for_doctor(doctor.id))?
        .into_iter()
        .find(|detail| detail.appointment.id == appointment.id)
        .ok_or(SchedulingError::AppointmentNotFound)
}

/// Mark an owned booked appointment completed and record its treatment.
///
/// The status change and the treatment commit together. A completed
/// appointment cannot be completed again.
pub fn complete_appointment(
    conn: &Connection,
    caller: &Principal,
    appointment_id: &Uuid,
    request: &CompletionRequest,
) -> Result<(Appointment, Treatment), SchedulingError> {
    let tx = immediate_transaction(conn)?;
    let (doctor, mut appointment) = owned_appointment(&tx, caller, appointment_id)?;

    if !repo::mark_appointment_completed(&tx, &appointment.id)? {
        return Err(SchedulingError::AlreadyCompleted);
    }
    appointment.status = AppointmentStatus::Completed;

    let treatment = Treatment {
        id: Uuid::new_v4(),
        appointment_id: appointment.id,
        diagnosis: optional(request.diagnosis.as_deref()),
        prescription: optional(request.prescription.as_deref()),
        created_at: now(),
    };
    repo::insert_treatment(&tx, &treatment)?;
    tx.commit()?;

    tracing::info!(
        appointment_id = %appointment.id,
        doctor_id = %doctor.id,
        treatment_id = %treatment.id,
        "Appointment completed"
    );
    Ok((appointment, treatment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{self, DoctorStatus, NewAdmin, NewDoctor, Registration};
    use crate::db::sqlite::{open_database, open_memory_database};
    use chrono::NaiveDate;
    use std::path::Path;

    struct Clinic {
        admin: Principal,
        doctor: Principal,
        doctor_id: Uuid,
        patient: Principal,
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn request(start: &str, end: &str) -> BookingRequest {
        BookingRequest {
            start: start.into(),
            end: end.into(),
            reason: Some("checkup".into()),
        }
    }

    fn add_doctor(conn: &Connection, admin: &Principal, username: &str) -> (Principal, Uuid) {
        let (user, doctor) = accounts::provision_doctor(
            conn,
            admin,
            &NewDoctor {
                username: username.into(),
                email: format!("{username}@hospital.test"),
                full_name: format!("Dr {username}"),
                password: "doctorpass".into(),
                department: Some("General".into()),
                specialization: None,
            },
        )
        .unwrap();
        (Principal::from(&user), doctor.id)
    }

    fn add_patient(conn: &Connection, username: &str) -> Principal {
        let (user, _) = accounts::register_patient(
            conn,
            &Registration {
                username: username.into(),
                email: format!("{username}@mail.test"),
                full_name: format!("Patient {username}"),
                password: "patientpass".into(),
            },
        )
        .unwrap();
        Principal::from(&user)
    }

    fn setup(conn: &Connection) -> Clinic {
        let admin_user = accounts::create_admin(
            conn,
            &NewAdmin {
                username: "admin".into(),
                email: "admin@example.com".into(),
                full_name: "Admin".into(),
                password: "adminpass".into(),
            },
        )
        .unwrap();
        let admin = Principal::from(&admin_user);
        let (doctor, doctor_id) = add_doctor(conn, &admin, "grey");
        let patient = add_patient(conn, "ann");
        Clinic {
            admin,
            doctor,
            doctor_id,
            patient,
        }
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    // ── Parsing and slots ───────────────────────────────

    #[test]
    fn parses_accepted_layouts() {
        let expected = at(9, 30);
        for raw in [
            "2025-01-01T09:30",
            "2025-01-01T09:30:00",
            "2025-01-01T09:30:00.750",
            "2025-01-01 09:30",
            "2025-01-01 09:30:00",
            " 2025-01-01T09:30 ",
            "2025-01-01T09:30:00+02:00",
            "2025-01-01T09:30:00Z",
        ] {
            assert_eq!(parse_datetime(raw), Some(expected), "{raw}");
        }
    }

    #[test]
    fn rejects_unparsable() {
        for raw in ["", "tomorrow", "2025-13-01T09:00", "09:00", "2025-01-01"] {
            assert_eq!(parse_datetime(raw), None, "{raw}");
        }
    }

    #[test]
    fn slot_requires_end_after_start() {
        assert!(matches!(
            TimeSlot::new(at(9, 0), at(9, 0)),
            Err(SchedulingError::InvalidTimeRange)
        ));
        assert!(matches!(
            TimeSlot::new(at(9, 30), at(9, 0)),
            Err(SchedulingError::InvalidTimeRange)
        ));
        // Sub-second differences vanish before comparison.
        assert!(TimeSlot::parse("2025-01-01T09:00:00.1", "2025-01-01T09:00:00.9").is_err());
    }

    #[test]
    fn overlap_is_half_open() {
        let base = TimeSlot::new(at(9, 0), at(9, 30)).unwrap();
        let cases = [
            ((9, 30), (10, 0), false),
            ((8, 30), (9, 0), false),
            ((9, 15), (9, 45), true),
            ((8, 0), (9, 1), true),
            ((9, 29), (10, 0), true),
            ((8, 0), (10, 0), true),
            ((9, 5), (9, 10), true),
            ((9, 0), (9, 30), true),
        ];
        for ((sh, sm), (eh, em), expected) in cases {
            let other = TimeSlot::new(at(sh, sm), at(eh, em)).unwrap();
            assert_eq!(base.overlaps(&other), expected, "{other:?}");
            assert_eq!(other.overlaps(&base), expected, "{other:?} reversed");
        }
    }

    // ── Booking ─────────────────────────────────────────

    #[test]
    fn booking_accepts_and_rejects_per_overlap() {
        let conn = open_memory_database().unwrap();
        let clinic = setup(&conn);

        let first = book_appointment(
            &conn,
            &clinic.patient,
            &clinic.doctor_id,
            &request("2025-01-01T09:00", "2025-01-01T09:30"),
        )
        .unwrap();
        assert_eq!(first.status, AppointmentStatus::Booked);
        assert_eq!(first.reason.as_deref(), Some("checkup"));

        let touching_after = request("2025-01-01T09:30", "2025-01-01T10:00");
        let touching_before = request("2025-01-01T08:30", "2025-01-01T09:00");
        assert!(book_appointment(&conn, &clinic.patient, &clinic.doctor_id, &touching_after).is_ok());
        assert!(book_appointment(&conn, &clinic.patient, &clinic.doctor_id, &touching_before).is_ok());

        for (start, end) in [
            ("2025-01-01T09:15", "2025-01-01T09:45"),
            ("2025-01-01T08:00", "2025-01-01T09:01"),
            ("2025-01-01T08:00", "2025-01-01T11:00"),
        ] {
            let err = book_appointment(&conn, &clinic.patient, &clinic.doctor_id, &request(start, end))
                .unwrap_err();
            assert!(matches!(err, SchedulingError::SlotTaken { .. }), "{start}-{end}");
        }
        assert_eq!(count(&conn, "appointments"), 3);
    }

    #[test]
    fn slot_taken_reports_the_conflicting_appointment() {
        let conn = open_memory_database().unwrap();
        let clinic = setup(&conn);
        let existing = book_appointment(
            &conn,
            &clinic.patient,
            &clinic.doctor_id,
            &request("2025-01-01T09:00", "2025-01-01T09:30"),
        )
        .unwrap();

        let err = book_appointment(
            &conn,
            &clinic.patient,
            &clinic.doctor_id,
            &request("2025-01-01T09:10", "2025-01-01T09:20"),
        )
        .unwrap_err();
        match err {
            SchedulingError::SlotTaken { conflicting } => assert_eq!(conflicting, existing.id),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_range_writes_nothing() {
        let conn = open_memory_database().unwrap();
        let clinic = setup(&conn);
        for (start, end) in [
            ("2025-01-01T09:00", "2025-01-01T09:00"),
            ("2025-01-01T10:00", "2025-01-01T09:00"),
            ("not a date", "2025-01-01T09:00"),
            ("2025-01-01T09:00", ""),
        ] {
            let err = book_appointment(&conn, &clinic.patient, &clinic.doctor_id, &request(start, end))
                .unwrap_err();
            assert!(matches!(err, SchedulingError::InvalidTimeRange), "{start}-{end}");
        }
        assert_eq!(count(&conn, "appointments"), 0);
    }

    #[test]
    fn other_doctors_and_completed_slots_do_not_conflict() {
        let conn = open_memory_database().unwrap();
        let clinic = setup(&conn);
        let (_, other_doctor) = add_doctor(&conn, &clinic.admin, "other");
        let slot = request("2025-01-01T09:00", "2025-01-01T09:30");

        let first = book_appointment(&conn, &clinic.patient, &clinic.doctor_id, &slot).unwrap();
        assert!(book_appointment(&conn, &clinic.patient, &other_doctor, &slot).is_ok());

        complete_appointment(&conn, &clinic.doctor, &first.id, &CompletionRequest::default()).unwrap();
        assert!(book_appointment(&conn, &clinic.patient, &clinic.doctor_id, &slot).is_ok());
    }

    #[test]
    fn only_patients_book_available_doctors() {
        let conn = open_memory_database().unwrap();
        let clinic = setup(&conn);
        let slot = request("2025-01-01T09:00", "2025-01-01T09:30");

        let err = book_appointment(&conn, &clinic.doctor, &clinic.doctor_id, &slot).unwrap_err();
        assert!(matches!(err, SchedulingError::Forbidden(_)));

        let err = book_appointment(&conn, &clinic.patient, &Uuid::new_v4(), &slot).unwrap_err();
        assert!(matches!(err, SchedulingError::DoctorNotFound));

        accounts::set_doctor_status(
            &conn,
            &clinic.admin,
            &clinic.doctor_id,
            accounts::DoctorStatus { is_active: false, is_approved: true },
        )
        .unwrap();
        let err = book_appointment(&conn, &clinic.patient, &clinic.doctor_id, &slot).unwrap_err();
        assert!(matches!(err, SchedulingError::DoctorNotFound));
        assert!(matches!(
            bookable_doctor(&conn, &clinic.patient, &clinic.doctor_id).unwrap_err(),
            SchedulingError::DoctorNotFound
        ));
        assert_eq!(count(&conn, "appointments"), 0);
    }

    #[test]
    fn bookable_doctor_summary() {
        let conn = open_memory_database().unwrap();
        let clinic = setup(&conn);
        let summary = bookable_doctor(&conn, &clinic.patient, &clinic.doctor_id).unwrap();
        assert_eq!(summary.full_name, "Dr grey");
        assert_eq!(summary.department.as_deref(), Some("General"));
    }

    fn booking_thread(path: &Path, patient: Principal, doctor_id: Uuid) -> std::thread::JoinHandle<bool> {
        let path = path.to_path_buf();
        std::thread::spawn(move || {
            let conn = open_database(&path).unwrap();
            book_appointment(
                &conn,
                &patient,
                &doctor_id,
                &request("2025-01-01T09:00", "2025-01-01T09:30"),
            )
            .is_ok()
        })
    }

    #[test]
    fn concurrent_bookings_of_one_slot_commit_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hospital.db");
        let clinic = {
            let conn = open_database(&path).unwrap();
            setup(&conn)
        };

        let handles: Vec<_> = (0..8)
            .map(|_| booking_thread(&path, clinic.patient, clinic.doctor_id))
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
        let conn = open_database(&path).unwrap();
        assert_eq!(count(&conn, "appointments"), 1);
    }

    // ── Completion ──────────────────────────────────────

    fn booked(conn: &Connection, clinic: &Clinic) -> Appointment {
        book_appointment(
            conn,
            &clinic.patient,
            &clinic.doctor_id,
            &request("2025-01-01T09:00", "2025-01-01T09:30"),
        )
        .unwrap()
    }

    fn treatment_request() -> CompletionRequest {
        CompletionRequest {
            diagnosis: Some("Flu".into()),
            prescription: Some("Rest".into()),
        }
    }

    #[test]
    fn completion_flips_status_and_records_one_treatment() {
        let conn = open_memory_database().unwrap();
        let clinic = setup(&conn);
        let appt = booked(&conn, &clinic);

        let (done, treatment) =
            complete_appointment(&conn, &clinic.doctor, &appt.id, &treatment_request()).unwrap();
        assert_eq!(done.status, AppointmentStatus::Completed);
        assert_eq!(treatment.diagnosis.as_deref(), Some("Flu"));

        let stored = repo::get_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Completed);
        assert_eq!(repo::get_treatments_for_appointment(&conn, &appt.id).unwrap().len(), 1);
    }

    #[test]
    fn recompletion_rejected() {
        let conn = open_memory_database().unwrap();
        let clinic = setup(&conn);
        let appt = booked(&conn, &clinic);
        complete_appointment(&conn, &clinic.doctor, &appt.id, &treatment_request()).unwrap();

        let err = complete_appointment(&conn, &clinic.doctor, &appt.id, &treatment_request())
            .unwrap_err();
        assert!(matches!(err, SchedulingError::AlreadyCompleted));
        assert_eq!(count(&conn, "treatments"), 1);
    }

    #[test]
    fn failed_treatment_insert_leaves_appointment_booked() {
        let conn = open_memory_database().unwrap();
        let clinic = setup(&conn);
        let appt = booked(&conn, &clinic);
        conn.execute_batch(
            "CREATE TRIGGER fail_treatment BEFORE INSERT ON treatments
             BEGIN SELECT RAISE(ABORT, 'forced failure'); END;",
        )
        .unwrap();

        let err = complete_appointment(&conn, &clinic.doctor, &appt.id, &treatment_request())
            .unwrap_err();
        assert!(matches!(err, SchedulingError::Database(_)));

        let stored = repo::get_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Booked);
        assert_eq!(count(&conn, "treatments"), 0);
    }

    #[test]
    fn another_doctor_cannot_complete() {
        let conn = open_memory_database().unwrap();
        let clinic = setup(&conn);
        let appt = booked(&conn, &clinic);
        let (intruder, _) = add_doctor(&conn, &clinic.admin, "intruder");

        let err = complete_appointment(&conn, &intruder, &appt.id, &treatment_request()).unwrap_err();
        assert!(matches!(err, SchedulingError::NotOwner));
        assert!(matches!(
            appointment_for_completion(&conn, &intruder, &appt.id).unwrap_err(),
            SchedulingError::NotOwner
        ));

        let stored = repo::get_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Booked);
    }

    #[test]
    fn deactivated_doctor_cannot_complete() {
        let conn = open_memory_database().unwrap();
        let clinic = setup(&conn);
        let appt = booked(&conn, &clinic);

        for (is_active, is_approved) in [(false, true), (true, false)] {
            accounts::set_doctor_status(
                &conn,
                &clinic.admin,
                &clinic.doctor_id,
                DoctorStatus {
                    is_active,
                    is_approved,
                },
            )
            .unwrap();

            let err = complete_appointment(&conn, &clinic.doctor, &appt.id, &treatment_request())
                .unwrap_err();
            assert!(matches!(err, SchedulingError::Inactive));
            assert!(matches!(
                appointment_for_completion(&conn, &clinic.doctor, &appt.id).unwrap_err(),
                SchedulingError::Inactive
            ));
        }
        let stored = repo::get_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Booked);
        assert_eq!(count(&conn, "treatments"), 0);

        let restored = DoctorStatus {
            is_active: true,
            is_approved: true,
        };
        accounts::set_doctor_status(&conn, &clinic.admin, &clinic.doctor_id, restored).unwrap();
        complete_appointment(&conn, &clinic.doctor, &appt.id, &treatment_request()).unwrap();
    }

    #[test]
    fn completion_checks_role_and_existence() {
        let conn = open_memory_database().unwrap();
        let clinic = setup(&conn);
        let appt = booked(&conn, &clinic);

        let err = complete_appointment(&conn, &clinic.patient, &appt.id, &treatment_request())
            .unwrap_err();
        assert!(matches!(err, SchedulingError::Forbidden(_)));

        let err = complete_appointment(&conn, &clinic.doctor, &Uuid::new_v4(), &treatment_request())
            .unwrap_err();
        assert!(matches!(err, SchedulingError::AppointmentNotFound));
    }

    #[test]
    fn completion_form_shows_names() {
        let conn = open_memory_database().unwrap();
        let clinic = setup(&conn);
        let appt = booked(&conn, &clinic);

        let detail = appointment_for_completion(&conn, &clinic.doctor, &appt.id).unwrap();
        assert_eq!(detail.patient_name, "Patient ann");
        assert_eq!(detail.doctor_name, "Dr grey");
    }

    #[test]
    fn blank_treatment_fields_stored_as_none() {
        let conn = open_memory_database().unwrap();
        let clinic = setup(&conn);
        let appt = booked(&conn, &clinic);
        let (_, treatment) = complete_appointment(
            &conn,
            &clinic.doctor,
            &appt.id,
            &CompletionRequest {
                diagnosis: Some("   ".into()),
                prescription: None,
            },
        )
        .unwrap();
        assert!(treatment.diagnosis.is_none());
        assert!(treatment.prescription.is_none());
    }
}
