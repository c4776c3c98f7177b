//! Patient endpoints.
//!
//! - `GET /patient`: own profile, appointments, bookable doctors
//! - `GET|POST /patient/book/:doctor_id`: slot booking

use axum::extract::{Path, State};
use axum::response::{Html, Response};
use axum::{Extension, Form};

use crate::api::endpoints::{page, parse_id};
use crate::api::error::WebError;
use crate::api::types::{redirect, ApiContext, CurrentUser, SessionContext};
use crate::api::views::{render, View};
use crate::dashboard;
use crate::scheduling::{self, BookingRequest};
use crate::session_cache::Flash;

/// `GET /patient`
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Html<String>, WebError> {
    let caller = current.principal();
    let overview = ctx
        .with_db(move |conn| Ok(dashboard::patient_overview(conn, &caller)?))
        .await?;
    Ok(render(View::PatientDashboard(&overview), &page(&ctx, &session)?)?)
}

/// `GET /patient/book/:doctor_id`
pub async fn book_form(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Extension(current): Extension<CurrentUser>,
    Path(doctor_id): Path<String>,
) -> Result<Html<String>, WebError> {
    let caller = current.principal();
    let doctor_id = parse_id(&doctor_id, "Doctor")?;
    let doctor = ctx
        .with_db(move |conn| {
            scheduling::bookable_doctor(conn, &caller, &doctor_id)
                .map_err(|e| WebError::from_scheduling(e, "/patient"))
        })
        .await?;
    Ok(render(View::BookAppointment(&doctor), &page(&ctx, &session)?)?)
}

/// `POST /patient/book/:doctor_id`: failures go back to the booking form.
pub async fn book(
    State(ctx): State<ApiContext>,
    Extension(current): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
    Form(request): Form<BookingRequest>,
) -> Result<Response, WebError> {
    let caller = current.principal();
    let doctor_id = parse_id(&raw_id, "Doctor")?;
    let back = format!("/patient/book/{doctor_id}");
    ctx.with_db(move |conn| {
        scheduling::book_appointment(conn, &caller, &doctor_id, &request)
            .map_err(|e| WebError::from_scheduling(e, &back))
    })
    .await?;

    Ok(redirect("/patient", Some(Flash::success("Appointment booked."))))
}
