//! Web router.
//!
//! Middleware stack (outermost → innermost):
//! 1. Extension(ApiContext) → 2. Session loader → 3. Audit logger →
//! 4. Login gate (protected routes only)

use std::sync::Arc;

use axum::http::header::{HeaderValue, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};
use axum::routing::{get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the application router over shared state.
pub fn web_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    // Protected routes: a logged-in session is required; role checks
    // happen in the domain operations the handlers call.
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/logout", get(endpoints::auth::logout))
        .route("/admin", get(endpoints::admin::dashboard))
        .route(
            "/admin/add_doctor",
            get(endpoints::admin::add_doctor_form).post(endpoints::admin::add_doctor),
        )
        .route(
            "/admin/doctors/:doctor_id/status",
            post(endpoints::admin::set_doctor_status),
        )
        .route("/patient", get(endpoints::patient::dashboard))
        .route(
            "/patient/book/:doctor_id",
            get(endpoints::patient::book_form).post(endpoints::patient::book),
        )
        .route("/doctor", get(endpoints::doctor::dashboard))
        .route(
            "/doctor/complete/:appointment_id",
            get(endpoints::doctor::complete_form).post(endpoints::doctor::complete),
        )
        .with_state(ctx.clone())
        // route_layer: unmatched paths fall through to the 404 fallback
        .route_layer(axum::middleware::from_fn(middleware::session::require_login));

    let public = Router::new()
        .route("/", get(endpoints::home::index))
        .route(
            "/login",
            get(endpoints::auth::login_form).post(endpoints::auth::login),
        )
        .route(
            "/register",
            get(endpoints::auth::register_form).post(endpoints::auth::register),
        )
        .with_state(ctx.clone());

    let health = Router::new().route("/health", get(endpoints::health::check));

    Router::new()
        .merge(protected)
        .merge(public)
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::session::load_session))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx))
        .merge(health)
        .layer(SetResponseHeaderLayer::if_not_present(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            REFERRER_POLICY,
            HeaderValue::from_static("same-origin"),
        ))
}
