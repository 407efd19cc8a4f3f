//! HTTP route handlers for the catalog.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to /products or /login
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (database ping)
//!
//! # Auth
//! GET  /register               - Register page
//! POST /register               - Register action
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /logout                 - Logout action
//!
//! # Products (requires session)
//! GET  /products               - Product listing
//! GET  /products/{id}          - Product detail
//!
//! # Products (requires admin)
//! GET  /products/add           - Add form
//! POST /products/add           - Create action
//! GET  /products/edit/{id}     - Edit form
//! POST /products/edit/{id}     - Update action
//! POST /products/delete/{id}   - Delete action
//! ```

pub mod auth;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::{OptionalUser, set_flash};
use crate::models::FlashLevel;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
}

/// Create the product routes router.
///
/// The static `/add` segment takes priority over `/{id}`.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/add", get(products::new_page).post(products::create))
        .route("/edit/{id}", get(products::edit_page).post(products::update))
        .route("/delete/{id}", post(products::delete))
        .route("/{id}", get(products::show))
}

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/ready", get(readiness))
}

/// Landing page: send the visitor to the catalog or the login form.
pub async fn home(OptionalUser(user): OptionalUser) -> Redirect {
    if user.is_some() {
        Redirect::to("/products")
    } else {
        Redirect::to("/login")
    }
}

/// Liveness check.
async fn health() -> &'static str {
    "ok"
}

/// Readiness check: verifies the database answers.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!("Readiness check failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}

/// Store a flash notice and redirect (303).
///
/// # Errors
///
/// Returns `AppError::Session` if the notice cannot be stored.
pub(crate) async fn redirect_with_flash(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
    to: &str,
) -> Result<Response, AppError> {
    set_flash(session, level, message).await?;
    Ok(Redirect::to(to).into_response())
}
