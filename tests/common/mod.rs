#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use httpmock::MockServer;
use serde_json::Value;
use tempfile::NamedTempFile;
use tower::ServiceExt;

use object_design::server::{build_router, AppState};
use object_design::services::ai::AiService;
use object_design::store::Store;

pub struct TestApp {
    pub router: Router,
    _db: NamedTempFile,
}

pub async fn make_app() -> TestApp {
    let db = NamedTempFile::new().unwrap();
    let store = Store::new(db.path().to_str().unwrap()).await.unwrap();
    let router = build_router(AppState { store, ai: None });
    TestApp { router, _db: db }
}

pub async fn make_app_with_ai(server: &MockServer) -> TestApp {
    let db = NamedTempFile::new().unwrap();
    let store = Store::new(db.path().to_str().unwrap()).await.unwrap();
    let ai = AiService::new(
        "key".to_string(),
        Some("gpt-4o-mini".to_string()),
        Some(server.base_url()),
    );
    let router = build_router(AppState {
        store,
        ai: Some(Arc::new(ai)),
    });
    TestApp { router, _db: db }
}

pub async fn send(
    router: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(router, method, path, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn send_full(
    router: &Router,
    method: &str,
    path: &str,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec();
    (status, headers, bytes)
}

pub async fn send_raw(
    router: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            builder.body(Body::from(value.to_string())).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec();
    (status, bytes)
}

pub async fn create_object(router: &Router, name: &str, kind: &str) -> Value {
    let (status, body) = send(
        router,
        "POST",
        "/objects",
        Some(serde_json::json!({
            "name": name,
            "description": format!("{} description", name),
            "type": kind,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}
