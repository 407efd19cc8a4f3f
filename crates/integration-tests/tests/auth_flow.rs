//! Registration, login, logout and the session gate.

#![allow(clippy::unwrap_used)]

use catalog_integration_tests::{ADMIN_EMAIL, ADMIN_PASSWORD, TestApp, location};
use reqwest::StatusCode;

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let response = app.get(&client, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "ok");

    let response = app.get(&client, "/health/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = TestApp::spawn().await;

    let response = TestApp::client()
        .get(app.url("/health"))
        .header("x-request-id", "trace-me-123")
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "trace-me-123");
}

#[tokio::test]
async fn test_anonymous_visitor_is_sent_to_login() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let response = app.get(&client, "/").await;
    assert_eq!(location(&response), "/login");

    let response = app.get(&client, "/products").await;
    assert_eq!(location(&response), "/login");
    let page = app.follow(&client, response).await;
    assert!(page.contains("Please log in to continue."));

    let response = app.get(&client, "/products/1").await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_register_then_login() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let response = app.register(&client, "Alice@Example.com", "wonderland").await;
    assert_eq!(location(&response), "/login");
    let page = app.follow(&client, response).await;
    assert!(page.contains("Registration successful. Please log in."));

    let response = app.login(&client, "alice@example.com", "wonderland").await;
    assert_eq!(location(&response), "/products");
    let page = app.follow(&client, response).await;
    assert!(page.contains("Welcome back, alice@example.com!"));
    assert!(!page.contains("href=\"/products/add\""));

    // The notice is shown once
    let page = app.get(&client, "/products").await.text().await.unwrap();
    assert!(!page.contains("Welcome back"));

    // Logged-in visitors skip the auth pages
    let response = app.get(&client, "/login").await;
    assert_eq!(location(&response), "/products");
    let response = app.get(&client, "/register").await;
    assert_eq!(location(&response), "/products");
    let response = app.get(&client, "/").await;
    assert_eq!(location(&response), "/products");
}

#[tokio::test]
async fn test_register_blank_fields() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let response = app.register(&client, "  ", "secret").await;
    assert_eq!(location(&response), "/register");
    let page = app.follow(&client, response).await;
    assert!(page.contains("Please provide both email and password."));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    app.register(&client, "bob@example.com", "first").await;
    let response = app.register(&client, "BOB@example.com", "second").await;

    assert_eq!(location(&response), "/login");
    let page = app.follow(&client, response).await;
    assert!(page.contains("Email already registered. Please login."));

    // The original password still works
    let response = app.login(&client, "bob@example.com", "first").await;
    assert_eq!(location(&response), "/products");
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let response = app.login(&client, ADMIN_EMAIL, "not-the-password").await;
    assert_eq!(location(&response), "/login");
    let page = app.follow(&client, response).await;
    assert!(page.contains("Invalid email or password."));

    let response = app.login(&client, "nobody@example.com", ADMIN_PASSWORD).await;
    assert_eq!(location(&response), "/login");

    let response = app.get(&client, "/products").await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_logout_destroys_session() {
    let app = TestApp::spawn().await;
    let client = app.admin_client().await;

    let response = app.get(&client, "/products").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get(&client, "/logout").await;
    assert_eq!(location(&response), "/login");
    let page = app.follow(&client, response).await;
    assert!(page.contains("You have been logged out."));

    let response = app.get(&client, "/products").await;
    assert_eq!(location(&response), "/login");

    // Logging out again is harmless
    let response = app.get(&client, "/logout").await;
    assert_eq!(location(&response), "/login");
}
