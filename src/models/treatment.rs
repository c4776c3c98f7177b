use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub created_at: NaiveDateTime,
}
