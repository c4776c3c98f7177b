//! Cookie session middleware.
//!
//! `load_session` resolves the `hms_session` cookie into a
//! `SessionContext` for every request. On the way out it applies whatever
//! the handler asked for through response extensions: a rotated or ended
//! session, and a pending flash. It is the only place cookies are written.
//!
//! `require_login` guards protected routes and injects `CurrentUser`.

use axum::http::header::{CACHE_CONTROL, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::WebError;
use crate::api::types::{ApiContext, CurrentUser, PendingFlash, SessionChange, SessionContext};
use crate::db::repository as repo;
use crate::session_cache::SESSION_COOKIE;

/// Read the session token from the request's cookies.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

fn expired_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

pub async fn load_session(req: Request<axum::body::Body>, next: Next) -> Response {
    match load_session_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn load_session_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, WebError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(WebError::Internal("missing API context".into()))?;

    // 1. Resolve cookie → user id (guard dropped before any .await)
    let token = session_token(req.headers());
    let user_id = match &token {
        Some(token) => ctx.core.sessions()?.current(token),
        None => None,
    };

    // 2. Load the identity; a vanished identity counts as logged out
    let user = match user_id {
        Some(id) => {
            ctx.with_db(move |conn| Ok(repo::get_user(conn, &id)?))
                .await?
        }
        None => None,
    };

    req.extensions_mut().insert(SessionContext {
        token: token.clone(),
        user,
    });

    // 3. Process request
    let mut response = next.run(req).await;

    // 4. Apply session changes and flashes requested by the handler
    finish_session(&ctx, token, &mut response)?;
    Ok(response)
}

fn finish_session(
    ctx: &ApiContext,
    request_token: Option<String>,
    response: &mut Response,
) -> Result<(), WebError> {
    let change = response.extensions_mut().remove::<SessionChange>();
    let flash = response.extensions_mut().remove::<PendingFlash>();

    let (mut token, mut set_cookie) = match &change {
        Some(SessionChange::Established(token)) => (Some(token.clone()), true),
        Some(SessionChange::Ended) => (None, false),
        None => (request_token, false),
    };

    if let Some(PendingFlash(flash)) = flash {
        if let Some(fresh) = ctx.core.sessions()?.push_flash(token.as_deref(), flash) {
            token = Some(fresh);
            set_cookie = true;
        }
    }

    let cookie = match (&token, set_cookie, &change) {
        (Some(token), true, _) => Some(session_cookie(token)),
        (_, _, Some(SessionChange::Ended)) => Some(expired_cookie()),
        _ => None,
    };
    if let Some(cookie) = cookie {
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| WebError::Internal(format!("invalid cookie header: {e}")))?;
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(())
}

/// Reject anonymous callers with a redirect to the login page.
pub async fn require_login(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let user = req
        .extensions()
        .get::<SessionContext>()
        .and_then(|session| session.user.clone());

    let Some(user) = user else {
        return WebError::LoginRequired.into_response();
    };
    req.extensions_mut().insert(CurrentUser(user));

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
