//! Landing page.

use axum::extract::State;
use axum::response::Html;
use axum::Extension;

use crate::api::endpoints::page;
use crate::api::error::WebError;
use crate::api::types::{ApiContext, SessionContext};
use crate::api::views::{render, View};

/// `GET /`
pub async fn index(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Html<String>, WebError> {
    Ok(render(View::Index, &page(&ctx, &session)?)?)
}
