//! Web error taxonomy and its mapping onto browser responses.
//!
//! Validation and conflict failures become a flash plus a redirect back to
//! the form. Authorization failures flash "Access denied." and go home.
//! Anonymous callers are sent to the login page without a flash, so hitting
//! protected paths never allocates a session.
//! Store failures are logged with their cause and shown generically.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::accounts::AccountError;
use crate::api::types::redirect;
use crate::api::views::{render, Page, View, ViewError};
use crate::core_state::CoreError;
use crate::dashboard::DashboardError;
use crate::db::DatabaseError;
use crate::scheduling::SchedulingError;
use crate::session_cache::Flash;

pub const ACCESS_DENIED: &str = "Access denied.";
pub const UNEXPECTED: &str = "An unexpected error occurred. Please try again.";
pub const BUSY: &str = "The system is busy. Please try again in a moment.";

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Bad input or a conflict: tell the user and send them back.
    #[error("{message}")]
    Rejected { message: String, back: String },
    #[error("Access denied")]
    Denied,
    #[error("Login required")]
    LoginRequired,
    #[error("Not found: {0}")]
    NotFound(String),
    /// The write lock stayed held past the busy timeout.
    #[error("Database busy")]
    Busy,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebError {
    pub fn rejected(message: impl Into<String>, back: impl Into<String>) -> Self {
        WebError::Rejected {
            message: message.into(),
            back: back.into(),
        }
    }

    /// Map an account failure; user-facing rejections return to `back`.
    pub fn from_account(err: AccountError, back: &str) -> Self {
        match err {
            AccountError::Forbidden(denied) => {
                tracing::warn!(%denied, "Account action denied");
                WebError::Denied
            }
            AccountError::DoctorNotFound => WebError::NotFound(err.to_string()),
            AccountError::Database(e) => e.into(),
            other => WebError::rejected(other.to_string(), back),
        }
    }

    /// Map a scheduling failure; user-facing rejections return to `back`.
    pub fn from_scheduling(err: SchedulingError, back: &str) -> Self {
        match err {
            SchedulingError::Forbidden(denied) => {
                tracing::warn!(%denied, "Scheduling action denied");
                WebError::Denied
            }
            SchedulingError::DoctorNotFound | SchedulingError::AppointmentNotFound => {
                WebError::NotFound(err.to_string())
            }
            SchedulingError::ProfileMissing | SchedulingError::Inactive => {
                WebError::rejected(err.to_string(), "/")
            }
            SchedulingError::Database(e) => e.into(),
            other => WebError::rejected(other.to_string(), back),
        }
    }
}

impl From<DashboardError> for WebError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Forbidden(denied) => {
                tracing::warn!(%denied, "Dashboard denied");
                WebError::Denied
            }
            DashboardError::ProfileMissing => WebError::rejected(err.to_string(), "/"),
            DashboardError::Database(e) => e.into(),
        }
    }
}

impl From<DatabaseError> for WebError {
    fn from(err: DatabaseError) -> Self {
        if err.is_busy() {
            WebError::Busy
        } else {
            WebError::Internal(err.to_string())
        }
    }
}

impl From<CoreError> for WebError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::LockPoisoned => WebError::Internal("lock poisoned".into()),
            CoreError::Database(e) => e.into(),
        }
    }
}

impl From<ViewError> for WebError {
    fn from(err: ViewError) -> Self {
        WebError::Internal(err.to_string())
    }
}

/// A standalone message page; plain text if the templates are unusable.
fn message_page(status: StatusCode, view: View<'_>, fallback: &str) -> Response {
    match render(view, &Page::default()) {
        Ok(html) => (status, html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Error page could not be rendered");
            (status, Html(fallback.to_string())).into_response()
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::Rejected { message, back } => redirect(&back, Some(Flash::danger(message))),
            WebError::Denied => redirect("/", Some(Flash::danger(ACCESS_DENIED))),
            WebError::LoginRequired => Redirect::to("/login").into_response(),
            WebError::NotFound(detail) => {
                message_page(StatusCode::NOT_FOUND, View::NotFound(&detail), "Not found.")
            }
            WebError::Busy => {
                tracing::warn!("Database busy past timeout");
                message_page(StatusCode::SERVICE_UNAVAILABLE, View::Error(BUSY), BUSY)
            }
            WebError::Internal(detail) => {
                tracing::error!(detail, "Request failed");
                message_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    View::Error(UNEXPECTED),
                    UNEXPECTED,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::PendingFlash;
    use crate::authorization::{authorize, Area, Principal};
    use crate::models::Role;
    use axum::body::to_bytes;
    use axum::http::header::LOCATION;
    use uuid::Uuid;

    fn location(response: &Response) -> &str {
        response.headers().get(LOCATION).unwrap().to_str().unwrap()
    }

    fn flash(response: &Response) -> &Flash {
        &response.extensions().get::<PendingFlash>().unwrap().0
    }

    #[test]
    fn rejection_redirects_back_with_message() {
        let response = WebError::from_scheduling(SchedulingError::InvalidTimeRange, "/patient/book/x")
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/patient/book/x");
        assert_eq!(flash(&response).message, "Invalid time range.");
    }

    #[test]
    fn duplicate_account_message_is_the_user_facing_one() {
        let response = WebError::from_account(AccountError::AlreadyExists, "/register").into_response();
        assert_eq!(location(&response), "/register");
        assert_eq!(flash(&response).message, "Username or email already exists.");
    }

    #[test]
    fn denial_goes_home() {
        let denied = authorize(&Principal::new(Uuid::new_v4(), Role::Patient), Area::Administration)
            .unwrap_err();
        let response = WebError::from_account(AccountError::Forbidden(denied), "/admin/add_doctor")
            .into_response();
        assert_eq!(location(&response), "/");
        assert_eq!(flash(&response).message, ACCESS_DENIED);
    }

    #[test]
    fn not_owner_is_not_a_not_found() {
        let response = WebError::from_scheduling(SchedulingError::NotOwner, "/doctor").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            flash(&response).message,
            "You are not authorized to modify this appointment."
        );
    }

    #[tokio::test]
    async fn missing_appointment_is_404() {
        let response =
            WebError::from_scheduling(SchedulingError::AppointmentNotFound, "/doctor").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let response = WebError::Internal("disk I/O error at page 7".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains(UNEXPECTED));
        assert!(!html.contains("page 7"));
    }

    #[test]
    fn login_required_redirects_to_login_without_flash() {
        let response = WebError::LoginRequired.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        assert!(response.extensions().get::<PendingFlash>().is_none());
    }

    #[test]
    fn inactive_doctor_sent_home_with_reason() {
        let response = WebError::from_scheduling(SchedulingError::Inactive, "/doctor").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        let flash = response.extensions().get::<PendingFlash>().unwrap();
        assert!(flash.0.message.contains("inactive"));
    }

    #[tokio::test]
    async fn not_found_page_shows_detail() {
        let response = WebError::NotFound("Doctor not found.".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        assert!(String::from_utf8(body.to_vec()).unwrap().contains("Doctor not found."));
    }
}
