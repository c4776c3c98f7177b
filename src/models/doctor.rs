use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub department_id: Option<Uuid>,
    pub specialization: Option<String>,
    pub contact: Option<String>,
    pub is_active: bool,
    pub is_approved: bool,
}

impl Doctor {
    /// Whether the doctor may log in and be offered to patients.
    pub fn is_available(&self) -> bool {
        self.is_active && self.is_approved
    }
}

/// Doctor joined with its identity and department, for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub doctor: Doctor,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub department: Option<String>,
}
