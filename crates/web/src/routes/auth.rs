//! Authentication route handlers.
//!
//! Handles registration, login, and logout against the local credential store.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalUser, clear_current_user, set_current_user, take_flash};
use crate::models::{CurrentUser, Flash, FlashLevel};
use crate::routes::redirect_with_flash;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login and registration form data.
///
/// Missing fields deserialize as empty strings so validation can report them.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Option<Flash>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Option<Flash>,
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(OptionalUser(user): OptionalUser, session: Session) -> Response {
    if user.is_some() {
        return Redirect::to("/products").into_response();
    }

    RegisterTemplate {
        user: None,
        flash: take_flash(&session).await,
    }
    .into_response()
}

/// Handle registration form submission.
#[instrument(skip(state, user, session, form))]
pub async fn register(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/products").into_response());
    }

    match AuthService::new(state.pool())
        .register(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User registered");
            redirect_with_flash(
                &session,
                FlashLevel::Success,
                "Registration successful. Please log in.",
                "/login",
            )
            .await
        }
        Err(AuthError::Validation(_)) => {
            redirect_with_flash(
                &session,
                FlashLevel::Warning,
                "Please provide both email and password.",
                "/register",
            )
            .await
        }
        Err(AuthError::DuplicateEmail) => {
            redirect_with_flash(
                &session,
                FlashLevel::Danger,
                "Email already registered. Please login.",
                "/login",
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(OptionalUser(user): OptionalUser, session: Session) -> Response {
    if user.is_some() {
        return Redirect::to("/products").into_response();
    }

    LoginTemplate {
        user: None,
        flash: take_flash(&session).await,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, user, session, form))]
pub async fn login(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/products").into_response());
    }

    match AuthService::new(state.pool())
        .authenticate(&form.email, &form.password)
        .await
    {
        Ok(current) => {
            set_current_user(&session, &current).await?;
            set_sentry_user(&current.id, Some(current.email.as_str()));
            tracing::info!(user_id = %current.id, role = %current.role, "User logged in");

            redirect_with_flash(
                &session,
                FlashLevel::Success,
                format!("Welcome back, {}!", current.email),
                "/products",
            )
            .await
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::debug!("Login rejected");
            redirect_with_flash(
                &session,
                FlashLevel::Danger,
                "Invalid email or password.",
                "/login",
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle logout.
///
/// Works with or without a session.
pub async fn logout(session: Session) -> Result<Response, AppError> {
    clear_current_user(&session).await?;
    clear_sentry_user();

    redirect_with_flash(
        &session,
        FlashLevel::Info,
        "You have been logged out.",
        "/login",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_template_renders_flash() {
        let html = LoginTemplate {
            user: None,
            flash: Some(Flash::new(FlashLevel::Danger, "Invalid email or password.")),
        }
        .render()
        .unwrap_or_default();

        assert!(html.contains("Invalid email or password."));
        assert!(html.contains("flash-danger"));
        assert!(html.contains("action=\"/login\""));
    }

    #[test]
    fn test_register_template_links_to_login() {
        let html = RegisterTemplate {
            user: None,
            flash: None,
        }
        .render()
        .unwrap_or_default();

        assert!(html.contains("action=\"/register\""));
        assert!(html.contains("href=\"/login\""));
    }
}
