//! Doctor endpoints.
//!
//! - `GET /doctor`: own appointments
//! - `GET|POST /doctor/complete/:appointment_id`: record treatment

use axum::extract::{Path, State};
use axum::response::{Html, Response};
use axum::{Extension, Form};

use crate::api::endpoints::{page, parse_id};
use crate::api::error::WebError;
use crate::api::types::{redirect, ApiContext, CurrentUser, SessionContext};
use crate::api::views::{render, View};
use crate::dashboard;
use crate::models::AppointmentStatus;
use crate::scheduling::{self, CompletionRequest, SchedulingError};
use crate::session_cache::Flash;

const DASHBOARD_PATH: &str = "/doctor";

/// `GET /doctor`
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Html<String>, WebError> {
    let caller = current.principal();
    let overview = ctx
        .with_db(move |conn| Ok(dashboard::doctor_overview(conn, &caller)?))
        .await?;
    Ok(render(View::DoctorDashboard(&overview), &page(&ctx, &session)?)?)
}

/// `GET /doctor/complete/:appointment_id`
pub async fn complete_form(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Extension(current): Extension<CurrentUser>,
    Path(appointment_id): Path<String>,
) -> Result<Html<String>, WebError> {
    let caller = current.principal();
    let appointment_id = parse_id(&appointment_id, "Appointment")?;
    let detail = ctx
        .with_db(move |conn| {
            scheduling::appointment_for_completion(conn, &caller, &appointment_id)
                .map_err(|e| WebError::from_scheduling(e, DASHBOARD_PATH))
        })
        .await?;

    if detail.appointment.status == AppointmentStatus::Completed {
        return Err(WebError::from_scheduling(
            SchedulingError::AlreadyCompleted,
            DASHBOARD_PATH,
        ));
    }
    Ok(render(View::CompleteAppointment(&detail), &page(&ctx, &session)?)?)
}

/// `POST /doctor/complete/:appointment_id`
pub async fn complete(
    State(ctx): State<ApiContext>,
    Extension(current): Extension<CurrentUser>,
    Path(appointment_id): Path<String>,
    Form(request): Form<CompletionRequest>,
) -> Result<Response, WebError> {
    let caller = current.principal();
    let appointment_id = parse_id(&appointment_id, "Appointment")?;
    ctx.with_db(move |conn| {
        scheduling::complete_appointment(conn, &caller, &appointment_id, &request)
            .map_err(|e| WebError::from_scheduling(e, DASHBOARD_PATH))
    })
    .await?;

    Ok(redirect(
        DASHBOARD_PATH,
        Some(Flash::success("Appointment marked as completed.")),
    ))
}
