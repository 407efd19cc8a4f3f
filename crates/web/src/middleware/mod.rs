//! HTTP middleware stack for the catalog.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (`http_request` span)
//! 3. Request ID (recorded on the span, echoed in the response)
//! 4. Session layer (tower-sessions with SQLite store)
//!
//! Guards run per handler as extractors (`RequireUser`, `RequireAdmin`).

pub mod auth;
pub mod flash;
pub mod request_id;
pub mod session;

pub use auth::{
    GateRejection, OptionalUser, RequireAdmin, RequireUser, clear_current_user, require_role,
    require_session, set_current_user,
};
pub use flash::{set_flash, take_flash};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
