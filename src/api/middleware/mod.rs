//! Request middleware.
//!
//! Execution order (outermost → innermost):
//! 1. Session loader: resolves the cookie, applies session changes and
//!    flashes requested by the response
//! 2. Audit logger: logs after the session is known, has user_id
//! 3. Login gate: protected routes only

pub mod audit;
pub mod session;
