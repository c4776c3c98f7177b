use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    /// Inclusive start of the half-open slot.
    pub start: NaiveDateTime,
    /// Exclusive end of the half-open slot.
    pub end: NaiveDateTime,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
}

/// Appointment with both parties' display names, for dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetail {
    pub appointment: Appointment,
    pub doctor_name: String,
    pub patient_name: String,
}
