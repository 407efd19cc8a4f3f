//! End-to-end tests for the product catalog.
//!
//! Each test spawns the real router on an ephemeral port, backed by a fresh
//! in-memory SQLite database with migrations applied and the administrator
//! seeded, and drives it over HTTP with `reqwest`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p catalog-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::net::SocketAddr;

use reqwest::{Client, Response, StatusCode, header};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use catalog_web::services::AuthService;
use catalog_web::state::AppState;
use catalog_web::{build_app, db, middleware};

/// Seeded administrator email.
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Seeded administrator password.
pub const ADMIN_PASSWORD: &str = "admin123";

/// A running catalog server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: SqlitePool,
}

impl TestApp {
    /// Start a server on `127.0.0.1:0` with a fresh database.
    pub async fn spawn() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        db::migrate(&pool).await.expect("migrations apply");

        AuthService::new(&pool)
            .seed_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .expect("admin seeded");

        let session_layer = middleware::create_session_layer(&pool, false)
            .await
            .expect("session store");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");

        let app = build_app(AppState::new(pool.clone()), session_layer);

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server runs");
        });

        Self { addr, pool }
    }

    /// Absolute URL for a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// A fresh browser-like client: own cookie jar, redirects not followed.
    #[must_use]
    pub fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    /// GET a path.
    pub async fn get(&self, client: &Client, path: &str) -> Response {
        client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request")
    }

    /// POST a form to a path.
    pub async fn post_form(&self, client: &Client, path: &str, form: &[(&str, &str)]) -> Response {
        client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request")
    }

    /// Register an account through the form.
    pub async fn register(&self, client: &Client, email: &str, password: &str) -> Response {
        self.post_form(client, "/register", &[("email", email), ("password", password)])
            .await
    }

    /// Log in through the form.
    pub async fn login(&self, client: &Client, email: &str, password: &str) -> Response {
        self.post_form(client, "/login", &[("email", email), ("password", password)])
            .await
    }

    /// A client logged in as the seeded administrator.
    pub async fn admin_client(&self) -> Client {
        let client = Self::client();
        let response = self.login(&client, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(location(&response), "/products");
        client
    }

    /// A client logged in as a freshly registered regular user.
    pub async fn user_client(&self, email: &str) -> Client {
        let client = Self::client();
        self.register(&client, email, "password1").await;
        let response = self.login(&client, email, "password1").await;
        assert_eq!(location(&response), "/products");
        client
    }

    /// Follow a redirect and return the body of the target page.
    pub async fn follow(&self, client: &Client, response: Response) -> String {
        let target = location(&response).to_string();
        self.get(client, &target)
            .await
            .text()
            .await
            .expect("response body")
    }

    /// Number of stored products.
    pub async fn product_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .expect("count products")
    }

    /// ID of the most recently inserted product.
    pub async fn last_product_id(&self) -> i64 {
        sqlx::query_scalar("SELECT MAX(id) FROM products")
            .fetch_one(&self.pool)
            .await
            .expect("max product id")
    }
}

/// The redirect target of a `303 See Other` response.
#[must_use]
pub fn location(response: &Response) -> &str {
    assert_eq!(response.status(), StatusCode::SEE_OTHER, "expected a redirect");
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Location header")
}
