mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{make_app, send};

#[tokio::test]
async fn register_then_login() {
    let app = make_app().await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/auth/register",
        Some(json!({"username": "ada", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["username"], "ada");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());

    let (status, body) = send(
        &app.router,
        "POST",
        "/auth/login",
        Some(json!({"username": "ada", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["username"], "ada");
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let app = make_app().await;
    let payload = json!({"username": "ada", "password": "one"});

    let (status, _) = send(&app.router, "POST", "/auth/register", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app.router, "POST", "/auth/register", Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("ada"));
}

#[tokio::test]
async fn failed_logins_report_which_check_failed() {
    let app = make_app().await;
    send(
        &app.router,
        "POST",
        "/auth/register",
        Some(json!({"username": "ada", "password": "s3cret"})),
    )
    .await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/auth/login",
        Some(json!({"username": "nobody", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User not found");
    assert_eq!(body["user"], json!(null));

    let (status, body) = send(
        &app.router,
        "POST",
        "/auth/login",
        Some(json!({"username": "ada", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid password");
}

#[tokio::test]
async fn empty_credentials_are_rejected() {
    let app = make_app().await;
    let (status, _) = send(
        &app.router,
        "POST",
        "/auth/register",
        Some(json!({"username": "  ", "password": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
