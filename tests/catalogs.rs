mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{create_object, make_app, send};

#[tokio::test]
async fn object_type_crud_round_trip() {
    let app = make_app().await;

    let (status, created) = send(
        &app.router,
        "POST",
        "/object-types",
        Some(json!({
            "object_type": "Item",
            "description": "physical part",
            "attributes": {"weight": "number"},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["object_type"], "Item");

    let (status, fetched) = send(&app.router, "GET", &format!("/object-types/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["attributes"]["weight"], "number");

    let (status, updated) = send(
        &app.router,
        "PUT",
        &format!("/object-types/{id}"),
        Some(json!({"description": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], json!(null));
    assert_eq!(updated["object_type"], "Item");

    let (status, _) = send(&app.router, "DELETE", &format!("/object-types/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app.router, "GET", &format!("/object-types/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_ids_are_sequential_small_ints() {
    let app = make_app().await;
    let (_, first) = send(
        &app.router,
        "POST",
        "/object-types",
        Some(json!({"object_type": "Item"})),
    )
    .await;
    let (_, second) = send(
        &app.router,
        "POST",
        "/object-types",
        Some(json!({"object_type": "Document"})),
    )
    .await;
    assert_eq!(second["id"].as_i64().unwrap(), first["id"].as_i64().unwrap() + 1);
}

#[tokio::test]
async fn relation_type_crud_round_trip() {
    let app = make_app().await;
    let (status, created) = send(
        &app.router,
        "POST",
        "/relation-types",
        Some(json!({"name": "consists_of", "primary_type": 1, "secondary_type": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();

    let (_, updated) = send(
        &app.router,
        "PUT",
        &format!("/relation-types/{id}"),
        Some(json!({"secondary_type": 2})),
    )
    .await;
    assert_eq!(updated["name"], "consists_of");
    assert_eq!(updated["secondary_type"], 2);

    let (status, listed) = send(&app.router, "GET", "/relation-types", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn hierarchy_type_defaults_to_empty_lists() {
    let app = make_app().await;
    let (status, created) = send(
        &app.router,
        "POST",
        "/hierarchy-types",
        Some(json!({"object_type": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["inventory"], json!([]));
    assert_eq!(created["purchase"], json!([]));

    let id = created["id"].as_i64().unwrap();
    let (_, updated) = send(
        &app.router,
        "PUT",
        &format!("/hierarchy-types/{id}"),
        Some(json!({"inventory": ["warehouse", "bin"]})),
    )
    .await;
    assert_eq!(updated["inventory"], json!(["warehouse", "bin"]));
    assert_eq!(updated["purchase"], json!([]));
}

#[tokio::test]
async fn deleting_a_type_leaves_tagged_objects_alone() {
    let app = make_app().await;
    let (_, created_type) = send(
        &app.router,
        "POST",
        "/object-types",
        Some(json!({"object_type": "Item"})),
    )
    .await;
    let object = create_object(&app.router, "Gearbox", "Item").await;

    let type_id = created_type["id"].as_i64().unwrap();
    let (status, _) = send(
        &app.router,
        "DELETE",
        &format!("/object-types/{type_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let object_id = object["id"].as_str().unwrap();
    let (status, fetched) = send(&app.router, "GET", &format!("/objects/{object_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["type"], "Item");
}

#[tokio::test]
async fn non_integer_catalog_id_gets_the_json_error_envelope() {
    let app = make_app().await;
    for path in [
        "/object-types/abc",
        "/relation-types/abc",
        "/hierarchy-types/abc",
    ] {
        let (status, body) = send(&app.router, "GET", path, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert!(
            body["error"].as_str().unwrap().contains("abc"),
            "{path}: {body}"
        );
    }

    let (status, body) = send(
        &app.router,
        "PUT",
        "/object-types/abc",
        Some(json!({"object_type": "Item"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());

    let (status, body) = send(&app.router, "DELETE", "/object-types/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
}
