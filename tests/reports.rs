mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{create_object, make_app, send, send_full, send_raw};

#[tokio::test]
async fn each_report_type_downloads_a_pdf() {
    let app = make_app().await;
    let engine = create_object(&app.router, "Engine", "Item").await;
    let piston = create_object(&app.router, "Piston", "Item").await;

    send(
        &app.router,
        "POST",
        "/relations",
        Some(json!({
            "primary_object_id": engine["id"],
            "relation_type": "consists_of",
            "secondary_object_ids": [piston["id"]],
        })),
    )
    .await;
    send(
        &app.router,
        "POST",
        "/hierarchies",
        Some(json!({
            "parent_object_id": engine["id"],
            "child_object_ids": [piston["id"]],
            "level": 1,
        })),
    )
    .await;

    for report_type in ["objects", "relations", "hierarchies", "full"] {
        let (status, bytes) = send_raw(
            &app.router,
            "GET",
            &format!("/reports/{report_type}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "report {report_type}");
        assert!(bytes.starts_with(b"%PDF"), "report {report_type}");
    }
}

#[tokio::test]
async fn empty_store_still_renders_reports() {
    let app = make_app().await;
    let (status, bytes) = send_raw(&app.router, "GET", "/reports/full", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn downloads_carry_a_dated_pdf_filename() {
    let app = make_app().await;
    let (status, headers, bytes) = send_full(&app.router, "GET", "/reports/objects").await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(
        headers.get("content-type").unwrap().to_str().unwrap(),
        "application/pdf"
    );

    let today = time::OffsetDateTime::now_utc()
        .format(&time::macros::format_description!("[year]-[month]-[day]"))
        .unwrap();
    let disposition = headers
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(
        disposition,
        format!("attachment; filename=\"object-design-objects-report-{today}.pdf\"")
    );
}

#[tokio::test]
async fn unknown_report_type_is_rejected() {
    let app = make_app().await;
    let (status, body) = send(&app.router, "GET", "/reports/everything", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("everything"));
}
