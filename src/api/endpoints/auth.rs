//! Login, logout and patient self-registration.
//!
//! `GET|POST /login`, `GET /logout`, `GET|POST /register`

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form};
use serde::Deserialize;

use crate::accounts::{self, Registration};
use crate::api::endpoints::page;
use crate::api::error::WebError;
use crate::api::types::{redirect, ApiContext, CurrentUser, SessionChange, SessionContext};
use crate::api::views::{render, View};
use crate::session_cache::Flash;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    /// Username or email.
    pub username: String,
    pub password: String,
}

/// Logged-in visitors skip the public forms.
fn already_logged_in(session: &SessionContext) -> Option<Response> {
    session
        .user
        .as_ref()
        .map(|user| redirect(user.role.landing_path(), None))
}

/// `GET /login`
pub async fn login_form(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Response, WebError> {
    if let Some(response) = already_logged_in(&session) {
        return Ok(response);
    }
    Ok(render(View::Login, &page(&ctx, &session)?)?.into_response())
}

/// `POST /login`: authenticate, rotate the session, go to the role's dashboard.
pub async fn login(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let user = ctx
        .with_db(move |conn| {
            accounts::authenticate(conn, &form.username, &form.password)
                .map_err(|e| WebError::from_account(e, "/login"))
        })
        .await?;

    let token = ctx
        .core
        .sessions()?
        .establish(session.token.as_deref(), user.id);

    let mut response = redirect(
        user.role.landing_path(),
        Some(Flash::success(format!("Welcome, {}!", user.display_name()))),
    );
    response
        .extensions_mut()
        .insert(SessionChange::Established(token));
    Ok(response)
}

/// `GET /logout`
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, WebError> {
    if let Some(token) = &session.token {
        ctx.core.sessions()?.destroy(token);
    }
    tracing::info!(user_id = %current.0.id, "Logged out");

    let mut response = redirect("/login", Some(Flash::info("You have been logged out.")));
    response.extensions_mut().insert(SessionChange::Ended);
    Ok(response)
}

/// `GET /register`
pub async fn register_form(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Response, WebError> {
    if let Some(response) = already_logged_in(&session) {
        return Ok(response);
    }
    Ok(render(View::Register, &page(&ctx, &session)?)?.into_response())
}

/// `POST /register`: create a patient identity and profile.
pub async fn register(
    State(ctx): State<ApiContext>,
    Form(form): Form<Registration>,
) -> Result<Response, WebError> {
    ctx.with_db(move |conn| {
        accounts::register_patient(conn, &form).map_err(|e| WebError::from_account(e, "/register"))
    })
    .await?;

    Ok(redirect(
        "/login",
        Some(Flash::success("Registration successful. Please log in.")),
    ))
}
