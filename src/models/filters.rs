use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Selection and ordering for appointment listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentFilter {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    /// Order by start descending instead of ascending.
    pub newest_first: bool,
}

impl AppointmentFilter {
    pub fn for_doctor(doctor_id: Uuid) -> Self {
        Self {
            doctor_id: Some(doctor_id),
            ..Self::default()
        }
    }

    pub fn for_patient(patient_id: Uuid) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Self::default()
        }
    }

    pub fn everything_newest_first() -> Self {
        Self {
            newest_first: true,
            ..Self::default()
        }
    }
}
