//! Administrator endpoints.
//!
//! - `GET /admin`: global overview
//! - `GET|POST /admin/add_doctor`: doctor provisioning
//! - `POST /admin/doctors/:doctor_id/status`: approve / activate

use axum::extract::{Path, State};
use axum::response::{Html, Response};
use axum::{Extension, Form};

use crate::accounts::{self, DoctorStatus, NewDoctor};
use crate::api::endpoints::{page, parse_id};
use crate::api::error::WebError;
use crate::api::types::{redirect, ApiContext, CurrentUser, SessionContext};
use crate::api::views::{render, View};
use crate::authorization::{authorize, Area};
use crate::dashboard;
use crate::db::repository as repo;
use crate::session_cache::Flash;

const ADD_DOCTOR_PATH: &str = "/admin/add_doctor";

/// `GET /admin`
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Html<String>, WebError> {
    let caller = current.principal();
    let overview = ctx
        .with_db(move |conn| Ok(dashboard::admin_overview(conn, &caller)?))
        .await?;
    Ok(render(View::AdminDashboard(&overview), &page(&ctx, &session)?)?)
}

/// `GET /admin/add_doctor`
pub async fn add_doctor_form(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Html<String>, WebError> {
    authorize(&current.principal(), Area::Administration).map_err(|denied| {
        tracing::warn!(%denied, "Add doctor form denied");
        WebError::Denied
    })?;
    let departments = ctx
        .with_db(|conn| Ok(repo::list_departments(conn)?))
        .await?;
    Ok(render(View::AddDoctor(&departments), &page(&ctx, &session)?)?)
}

/// `POST /admin/add_doctor`
pub async fn add_doctor(
    State(ctx): State<ApiContext>,
    Extension(current): Extension<CurrentUser>,
    Form(form): Form<NewDoctor>,
) -> Result<Response, WebError> {
    let caller = current.principal();
    let (user, _) = ctx
        .with_db(move |conn| {
            accounts::provision_doctor(conn, &caller, &form)
                .map_err(|e| WebError::from_account(e, ADD_DOCTOR_PATH))
        })
        .await?;

    Ok(redirect(
        "/admin",
        Some(Flash::success(format!(
            "Doctor {} created successfully.",
            user.display_name()
        ))),
    ))
}

/// `POST /admin/doctors/:doctor_id/status`
pub async fn set_doctor_status(
    State(ctx): State<ApiContext>,
    Extension(current): Extension<CurrentUser>,
    Path(doctor_id): Path<String>,
    Form(status): Form<DoctorStatus>,
) -> Result<Response, WebError> {
    let caller = current.principal();
    let doctor_id = parse_id(&doctor_id, "Doctor")?;
    let doctor = ctx
        .with_db(move |conn| {
            accounts::set_doctor_status(conn, &caller, &doctor_id, status)
                .map_err(|e| WebError::from_account(e, "/admin"))
        })
        .await?;

    if !doctor.is_available() {
        let ended = ctx.core.sessions()?.end_user_sessions(&doctor.user_id);
        tracing::info!(doctor_id = %doctor.id, ended, "Doctor sessions ended");
    }
    Ok(redirect("/admin", Some(Flash::success("Doctor status updated."))))
}
