//! Authentication gate: session and role guards.
//!
//! The pure checks [`require_session`] and [`require_role`] decide; the
//! extractors [`RequireUser`] and [`RequireAdmin`] apply them to a request,
//! leave a flash notice and reject with a redirect.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use catalog_core::Role;

use super::flash::set_flash;
use crate::models::session::{CurrentUser, FlashLevel, keys};

/// Why a request was turned away by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// No session is bound to the request.
    Unauthorized,
    /// The session's role is insufficient.
    Forbidden,
}

impl GateRejection {
    /// Where the rejected request is sent.
    #[must_use]
    pub const fn redirect_target(self) -> &'static str {
        match self {
            Self::Unauthorized => "/login",
            Self::Forbidden => "/products",
        }
    }

    /// The notice shown after the redirect.
    #[must_use]
    pub const fn notice(self) -> (FlashLevel, &'static str) {
        match self {
            Self::Unauthorized => (FlashLevel::Warning, "Please log in to continue."),
            Self::Forbidden => (FlashLevel::Danger, "Admin access required."),
        }
    }

    async fn flash(self, session: &Session) -> Self {
        let (level, message) = self.notice();
        if let Err(e) = set_flash(session, level, message).await {
            tracing::warn!("Failed to store gate notice: {e}");
        }
        self
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        Redirect::to(self.redirect_target()).into_response()
    }
}

/// Require that a session is present.
///
/// # Errors
///
/// Returns `GateRejection::Unauthorized` if `current` is `None`.
pub fn require_session(current: Option<CurrentUser>) -> Result<CurrentUser, GateRejection> {
    current.ok_or(GateRejection::Unauthorized)
}

/// Require that the session holds exactly `role`.
///
/// # Errors
///
/// Returns `GateRejection::Forbidden` if the roles differ.
pub fn require_role(session: &CurrentUser, role: Role) -> Result<(), GateRejection> {
    if session.role == role {
        Ok(())
    } else {
        Err(GateRejection::Forbidden)
    }
}

async fn load_current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Extractor that optionally gets the current user.
///
/// Never rejects.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => load_current_user(session).await,
            None => None,
        };

        Ok(Self(user))
    }
}

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn products(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(GateRejection::Unauthorized);
        };

        match require_session(load_current_user(session).await) {
            Ok(user) => Ok(Self(user)),
            Err(rejection) => Err(rejection.flash(session).await),
        }
    }
}

/// Extractor that requires a logged-in administrator.
///
/// Anonymous requests go to `/login`; logged-in non-admins go to `/products`.
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(GateRejection::Unauthorized);
        };

        let checked = require_session(load_current_user(session).await)
            .and_then(|user| require_role(&user, Role::Admin).map(|()| user));

        match checked {
            Ok(user) => Ok(Self(user)),
            Err(rejection) => Err(rejection.flash(session).await),
        }
    }
}

/// Bind a user to the session (login).
///
/// The session ID is rotated first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Destroy the session binding (logout). Idempotent.
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
