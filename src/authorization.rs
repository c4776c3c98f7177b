//! Role-based authorization.
//!
//! Every protected action names the role it needs; the check dispatches on
//! the caller's closed `Role` rather than comparing strings. Ownership checks
//! (a doctor acting on their own appointment) live next to the resource in
//! `scheduling`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, User};

/// The authenticated caller of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
        }
    }
}

/// Areas of the application, each reserved to one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    /// Doctor provisioning and the global overview.
    Administration,
    /// Own appointments and treatment recording.
    Clinic,
    /// Own profile and slot booking.
    PatientPortal,
}

impl Area {
    pub fn required_role(self) -> Role {
        match self {
            Area::Administration => Role::Admin,
            Area::Clinic => Role::Doctor,
            Area::PatientPortal => Role::Patient,
        }
    }
}

impl Role {
    pub fn may_enter(&self, area: Area) -> bool {
        *self == area.required_role()
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("Access denied: {area:?} requires the {required} role, caller is {actual}")]
    WrongRole {
        area: Area,
        required: Role,
        actual: Role,
    },
}

/// Allow the caller into `area` or explain why not.
pub fn authorize(principal: &Principal, area: Area) -> Result<(), AuthorizationError> {
    if principal.role.may_enter(area) {
        Ok(())
    } else {
        Err(AuthorizationError::WrongRole {
            area,
            required: area.required_role(),
            actual: principal.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> Principal {
        Principal::new(Uuid::new_v4(), role)
    }

    #[test]
    fn each_role_enters_only_its_area() {
        let cases = [
            (Role::Admin, Area::Administration),
            (Role::Doctor, Area::Clinic),
            (Role::Patient, Area::PatientPortal),
        ];
        for (role, own_area) in cases {
            for (_, area) in cases {
                let allowed = authorize(&caller(role), area).is_ok();
                assert_eq!(allowed, area == own_area, "{role} -> {area:?}");
            }
        }
    }

    #[test]
    fn denial_reports_roles() {
        let err = authorize(&caller(Role::Patient), Area::Administration).unwrap_err();
        assert_eq!(
            err,
            AuthorizationError::WrongRole {
                area: Area::Administration,
                required: Role::Admin,
                actual: Role::Patient,
            }
        );
        assert!(err.to_string().contains("admin"));
    }

    #[test]
    fn principal_from_user_copies_identity() {
        let user = User {
            id: Uuid::new_v4(),
            username: "root".into(),
            email: "root@hospital.test".into(),
            password_hash: String::new(),
            full_name: String::new(),
            role: Role::Admin,
            created_at: chrono::NaiveDateTime::default(),
        };
        let principal = Principal::from(&user);
        assert_eq!(principal.user_id, user.id);
        assert_eq!(principal.role, Role::Admin);
    }
}
