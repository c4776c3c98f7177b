//! Route handlers, grouped by area.

pub mod admin;
pub mod auth;
pub mod doctor;
pub mod health;
pub mod home;
pub mod patient;

use uuid::Uuid;

use crate::api::error::WebError;
use crate::api::types::{ApiContext, SessionContext};
use crate::api::views::{Page, Viewer};

/// Page frame for the caller, draining their pending flashes.
pub(crate) fn page(ctx: &ApiContext, session: &SessionContext) -> Result<Page, WebError> {
    let flashes = match &session.token {
        Some(token) => ctx.core.sessions()?.take_flashes(token),
        None => Vec::new(),
    };
    Ok(Page {
        viewer: session.user.as_ref().map(Viewer::from),
        flashes,
    })
}

/// Path ids that are not UUIDs name nothing.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, WebError> {
    Uuid::parse_str(raw).map_err(|_| WebError::NotFound(format!("{what} not found.")))
}
