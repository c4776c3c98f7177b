//! Accounts: login gate, patient self-registration, doctor provisioning,
//! doctor status changes and the administrator bootstrap.
//!
//! Every creation writes the identity and its profile in one transaction,
//! so a reader never sees an identity without its profile.

use std::sync::LazyLock;

use chrono::{Local, NaiveDateTime, Timelike};
use regex::Regex;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authorization::{authorize, Area, AuthorizationError, Principal};
use crate::crypto::{self, CryptoError};
use crate::db::repository::{self as repo};
use crate::db::{immediate_transaction, DatabaseError};
use crate::models::*;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Hash compared against when no identity matches, so unknown handles cost
/// the same as wrong passwords.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| crypto::hash_password("no-such-account-placeholder"));

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewDoctor {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub department: Option<String>,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewAdmin {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorStatus {
    pub is_active: bool,
    pub is_approved: bool,
}

// ═══════════════════════════════════════════════════════════
// Error type
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0} is required.")]
    MissingField(&'static str),
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Password must be at least {0} characters.")]
    WeakPassword(usize),
    #[error("Username or email already exists.")]
    AlreadyExists,
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("Doctor profile not found. Contact admin.")]
    DoctorProfileMissing,
    #[error("Your account is pending admin approval.")]
    DoctorPendingApproval,
    #[error("Your account has been deactivated. Contact admin.")]
    DoctorDeactivated,
    #[error("Doctor not found.")]
    DoctorNotFound,
    #[error(transparent)]
    Forbidden(#[from] AuthorizationError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<CryptoError> for AccountError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::WeakPassword(min) => AccountError::WeakPassword(min),
            CryptoError::MalformedHash => AccountError::InvalidCredentials,
        }
    }
}

impl From<rusqlite::Error> for AccountError {
    fn from(err: rusqlite::Error) -> Self {
        AccountError::Database(DatabaseError::Sqlite(err))
    }
}

// ═══════════════════════════════════════════════════════════
// Validation helpers
// ═══════════════════════════════════════════════════════════

/// Validated, trimmed identity fields shared by every creation path.
struct IdentityInput {
    username: String,
    email: String,
    full_name: String,
}

fn required(value: &str, field: &'static str) -> Result<String, AccountError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AccountError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Blank optional text becomes `None`.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn validate_identity(
    username: &str,
    email: &str,
    full_name: &str,
    password: &str,
) -> Result<IdentityInput, AccountError> {
    let full_name = required(full_name, "Full name")?;
    let username = required(username, "Username")?;
    let email = required(email, "Email")?;
    if password.is_empty() {
        return Err(AccountError::MissingField("Password"));
    }
    if !EMAIL_PATTERN.is_match(&email) {
        return Err(AccountError::InvalidEmail);
    }
    crypto::check_password_policy(password)?;
    Ok(IdentityInput {
        username,
        email,
        full_name,
    })
}

fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Map a uniqueness violation that slipped past the pre-check.
fn on_insert_conflict(err: DatabaseError) -> AccountError {
    if err.is_constraint() {
        AccountError::AlreadyExists
    } else {
        AccountError::Database(err)
    }
}

fn build_user(input: IdentityInput, password_hash: String, role: Role) -> User {
    User {
        id: Uuid::new_v4(),
        username: input.username,
        email: input.email,
        password_hash,
        full_name: input.full_name,
        role,
        created_at: now(),
    }
}

// ═══════════════════════════════════════════════════════════
// Authentication gate
// ═══════════════════════════════════════════════════════════

/// Authenticate by username or email.
///
/// Unknown identities and wrong passwords fail identically. Doctors must
/// additionally have a profile that is approved and active.
pub fn authenticate(
    conn: &Connection,
    identifier: &str,
    password: &str,
) -> Result<User, AccountError> {
    let identifier = identifier.trim();
    if identifier.is_empty() || password.is_empty() {
        return Err(AccountError::InvalidCredentials);
    }

    let Some(user) = repo::find_user_by_login(conn, identifier)? else {
        let _ = crypto::verify_password(password, &DUMMY_HASH);
        tracing::info!("Login rejected: unknown identity");
        return Err(AccountError::InvalidCredentials);
    };

    if !crypto::verify_password(password, &user.password_hash) {
        tracing::info!(user_id = %user.id, "Login rejected: bad credential");
        return Err(AccountError::InvalidCredentials);
    }

    if user.role == Role::Doctor {
        let doctor = repo::get_doctor_by_user(conn, &user.id)?
            .ok_or(AccountError::DoctorProfileMissing)?;
        if !doctor.is_approved {
            return Err(AccountError::DoctorPendingApproval);
        }
        if !doctor.is_active {
            return Err(AccountError::DoctorDeactivated);
        }
    }

    tracing::info!(user_id = %user.id, role = %user.role, "Login succeeded");
    Ok(user)
}

// ═══════════════════════════════════════════════════════════
// Creation paths
// ═══════════════════════════════════════════════════════════

/// Self-registration. Creates a patient identity and its profile atomically.
pub fn register_patient(
    conn: &Connection,
    form: &Registration,
) -> Result<(User, Patient), AccountError> {
    let input = validate_identity(&form.username, &form.email, &form.full_name, &form.password)?;
    let password_hash = crypto::hash_password(&form.password);

    let tx = immediate_transaction(conn)?;
    if repo::user_exists(&tx, &input.username, &input.email)? {
        return Err(AccountError::AlreadyExists);
    }

    let user = build_user(input, password_hash, Role::Patient);
    repo::insert_user(&tx, &user).map_err(on_insert_conflict)?;

    let patient = Patient {
        id: Uuid::new_v4(),
        user_id: user.id,
        dob: None,
        gender: None,
        contact: None,
    };
    repo::insert_patient(&tx, &patient)?;
    tx.commit()?;

    tracing::info!(user_id = %user.id, patient_id = %patient.id, "Patient registered");
    Ok((user, patient))
}

/// Administrator creates a pre-approved, active doctor.
///
/// The identity, a department created on demand, and the doctor profile
/// commit together or not at all.
pub fn provision_doctor(
    conn: &Connection,
    caller: &Principal,
    form: &NewDoctor,
) -> Result<(User, Doctor), AccountError> {
    authorize(caller, Area::Administration)?;

    let input = validate_identity(&form.username, &form.email, &form.full_name, &form.password)?;
    let department_name = optional(form.department.as_deref());
    let specialization = optional(form.specialization.as_deref());
    let password_hash = crypto::hash_password(&form.password);

    let tx = immediate_transaction(conn)?;
    if repo::user_exists(&tx, &input.username, &input.email)? {
        return Err(AccountError::AlreadyExists);
    }

    let user = build_user(input, password_hash, Role::Doctor);
    repo::insert_user(&tx, &user).map_err(on_insert_conflict)?;

    let department_id = match department_name {
        Some(name) => {
            let (dept, created) = repo::find_or_create_department(&tx, &name)?;
            if created {
                tracing::info!(department = %dept.name, "Department created");
            }
            Some(dept.id)
        }
        None => None,
    };

    let doctor = Doctor {
        id: Uuid::new_v4(),
        user_id: user.id,
        department_id,
        specialization,
        contact: None,
        is_active: true,
        is_approved: true,
    };
    repo::insert_doctor(&tx, &doctor)?;
    tx.commit()?;

    tracing::info!(
        admin_id = %caller.user_id,
        doctor_id = %doctor.id,
        "Doctor provisioned"
    );
    Ok((user, doctor))
}

/// Administrator changes a doctor's login-gating flags.
pub fn set_doctor_status(
    conn: &Connection,
    caller: &Principal,
    doctor_id: &Uuid,
    status: DoctorStatus,
) -> Result<Doctor, AccountError> {
    authorize(caller, Area::Administration)?;

    let tx = immediate_transaction(conn)?;
    match repo::update_doctor_status(&tx, doctor_id, status.is_active, status.is_approved) {
        Ok(()) => {}
        Err(DatabaseError::NotFound { .. }) => return Err(AccountError::DoctorNotFound),
        Err(e) => return Err(e.into()),
    }
    let doctor = repo::get_doctor(&tx, doctor_id)?.ok_or(AccountError::DoctorNotFound)?;
    tx.commit()?;

    tracing::info!(
        admin_id = %caller.user_id,
        doctor_id = %doctor_id,
        is_active = status.is_active,
        is_approved = status.is_approved,
        "Doctor status changed"
    );
    Ok(doctor)
}

/// Privileged bootstrap: the only way an admin identity comes into being.
/// Not reachable over HTTP.
pub fn create_admin(conn: &Connection, form: &NewAdmin) -> Result<User, AccountError> {
    let input = validate_identity(&form.username, &form.email, &form.full_name, &form.password)?;
    let password_hash = crypto::hash_password(&form.password);

    let tx = immediate_transaction(conn)?;
    if repo::user_exists(&tx, &input.username, &input.email)? {
        return Err(AccountError::AlreadyExists);
    }
    let user = build_user(input, password_hash, Role::Admin);
    repo::insert_user(&tx, &user).map_err(on_insert_conflict)?;
    tx.commit()?;

    tracing::info!(user_id = %user.id, "Administrator created");
    Ok(user)
}

pub fn admin_exists(conn: &Connection) -> Result<bool, AccountError> {
    Ok(repo::count_users_with_role(conn, Role::Admin)? > 0)
}
