//! Read-side views for the three role dashboards.

use rusqlite::Connection;
use serde::Serialize;

use crate::authorization::{authorize, Area, AuthorizationError, Principal};
use crate::db::repository as repo;
use crate::db::DatabaseError;
use crate::models::*;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Forbidden(#[from] AuthorizationError),
    #[error("Your profile was not found. Contact admin.")]
    ProfileMissing,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminOverview {
    pub doctors: Vec<DoctorSummary>,
    pub patients: Vec<PatientSummary>,
    /// Newest start first.
    pub appointments: Vec<AppointmentDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientOverview {
    pub user: User,
    pub patient: Patient,
    /// Earliest start first.
    pub appointments: Vec<AppointmentDetail>,
    pub doctors: Vec<DoctorSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorOverview {
    pub user: User,
    pub doctor: Doctor,
    /// Earliest start first.
    pub appointments: Vec<AppointmentDetail>,
}

fn identity(conn: &Connection, caller: &Principal) -> Result<User, DashboardError> {
    repo::get_user(conn, &caller.user_id)?.ok_or(DashboardError::ProfileMissing)
}

pub fn admin_overview(
    conn: &Connection,
    caller: &Principal,
) -> Result<AdminOverview, DashboardError> {
    authorize(caller, Area::Administration)?;
    Ok(AdminOverview {
        doctors: repo::list_doctor_summaries(conn, false)?,
        patients: repo::list_patient_summaries(conn)?,
        appointments: repo::list_appointment_details(
            conn,
            &AppointmentFilter::everything_newest_first(),
        )?,
    })
}

pub fn patient_overview(
    conn: &Connection,
    caller: &Principal,
) -> Result<PatientOverview, DashboardError> {
    authorize(caller, Area::PatientPortal)?;
    let user = identity(conn, caller)?;
    let patient = repo::get_patient_by_user(conn, &user.id)?.ok_or(DashboardError::ProfileMissing)?;
    let appointments =
        repo::list_appointment_details(conn, &AppointmentFilter::for_patient(patient.id))?;
    let doctors = repo::list_doctor_summaries(conn, true)?;
    Ok(PatientOverview {
        user,
        patient,
        appointments,
        doctors,
    })
}

pub fn doctor_overview(
    conn: &Connection,
    caller: &Principal,
) -> Result<DoctorOverview, DashboardError> {
    authorize(caller, Area::Clinic)?;
    let user = identity(conn, caller)?;
    let doctor = repo::get_doctor_by_user(conn, &user.id)?.ok_or(DashboardError::ProfileMissing)?;
    let appointments =
        repo::list_appointment_details(conn, &AppointmentFilter::for_doctor(doctor.id))?;
    Ok(DoctorOverview {
        user,
        doctor,
        appointments,
    })
}
