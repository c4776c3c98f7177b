//! Web surface: server-rendered pages over axum.
//!
//! Routes are public (landing, login, registration, health) or protected
//! by a login gate; role checks live in the domain operations. The stack
//! is: Session → Audit → Login gate → Handler.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;
pub mod views;

pub use router::web_router;
pub use server::{start_server, WebServer};
pub use types::ApiContext;
