mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{create_object, make_app, send};

#[tokio::test]
async fn create_drops_unresolved_secondary_ids() {
    let app = make_app().await;
    let primary = create_object(&app.router, "Engine", "Item").await;
    let existing = create_object(&app.router, "Piston", "Item").await;
    let missing = Uuid::new_v4().to_string();

    let (status, relation) = send(
        &app.router,
        "POST",
        "/relations",
        Some(json!({
            "primary_object_id": primary["id"],
            "relation_type": "consists_of",
            "secondary_object_ids": [existing["id"], missing],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        relation["secondary_object_ids"],
        json!([existing["id"].as_str().unwrap()])
    );

    let id = relation["id"].as_str().unwrap();
    let (_, fetched) = send(&app.router, "GET", &format!("/relations/{id}"), None).await;
    assert_eq!(fetched["secondary_object_ids"], relation["secondary_object_ids"]);
}

#[tokio::test]
async fn secondary_order_is_preserved() {
    let app = make_app().await;
    let primary = create_object(&app.router, "Assembly", "Item").await;
    let a = create_object(&app.router, "A", "Item").await;
    let b = create_object(&app.router, "B", "Item").await;
    let c = create_object(&app.router, "C", "Item").await;

    let (_, relation) = send(
        &app.router,
        "POST",
        "/relations",
        Some(json!({
            "primary_object_id": primary["id"],
            "relation_type": "consists_of",
            "secondary_object_ids": [c["id"], a["id"], b["id"]],
        })),
    )
    .await;
    assert_eq!(
        relation["secondary_object_ids"],
        json!([c["id"], a["id"], b["id"]])
    );
}

#[tokio::test]
async fn update_with_secondary_list_is_a_full_replace() {
    let app = make_app().await;
    let primary = create_object(&app.router, "Engine", "Item").await;
    let old = create_object(&app.router, "Old", "Item").await;
    let new = create_object(&app.router, "New", "Item").await;

    let (_, relation) = send(
        &app.router,
        "POST",
        "/relations",
        Some(json!({
            "primary_object_id": primary["id"],
            "relation_type": "consists_of",
            "secondary_object_ids": [old["id"]],
        })),
    )
    .await;
    let id = relation["id"].as_str().unwrap();

    let (status, updated) = send(
        &app.router,
        "PUT",
        &format!("/relations/{id}"),
        Some(json!({"secondary_object_ids": [new["id"]]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["secondary_object_ids"], json!([new["id"]]));

    let (_, fetched) = send(&app.router, "GET", &format!("/relations/{id}"), None).await;
    assert_eq!(fetched["secondary_object_ids"], json!([new["id"]]));
}

#[tokio::test]
async fn omitted_secondary_list_leaves_links_untouched() {
    let app = make_app().await;
    let primary = create_object(&app.router, "Engine", "Item").await;
    let part = create_object(&app.router, "Part", "Item").await;

    let (_, relation) = send(
        &app.router,
        "POST",
        "/relations",
        Some(json!({
            "primary_object_id": primary["id"],
            "relation_type": "consists_of",
            "description": "original",
            "secondary_object_ids": [part["id"]],
        })),
    )
    .await;
    let id = relation["id"].as_str().unwrap();

    let (_, updated) = send(
        &app.router,
        "PUT",
        &format!("/relations/{id}"),
        Some(json!({"description": "revised"})),
    )
    .await;
    assert_eq!(updated["description"], "revised");
    assert_eq!(updated["secondary_object_ids"], json!([part["id"]]));

    // explicit null clears the nullable description without touching links
    let (_, cleared) = send(
        &app.router,
        "PUT",
        &format!("/relations/{id}"),
        Some(json!({"description": null})),
    )
    .await;
    assert_eq!(cleared["description"], json!(null));
    assert_eq!(cleared["secondary_object_ids"], json!([part["id"]]));
}

#[tokio::test]
async fn object_relations_lists_primary_side_only() {
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

    let engine_id = engine["id"].as_str().unwrap();
    let (status, body) = send(
        &app.router,
        "GET",
        &format!("/objects/{engine_id}/relations"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["primary_object_id"], engine["id"]);
    assert_eq!(body[0]["secondary_object_ids"], json!([piston["id"]]));

    let piston_id = piston["id"].as_str().unwrap();
    let (_, body) = send(
        &app.router,
        "GET",
        &format!("/objects/{piston_id}/relations"),
        None,
    )
    .await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_object_cascades_links_but_not_relations() {
    let app = make_app().await;
    let engine = create_object(&app.router, "Engine", "Item").await;
    let piston = create_object(&app.router, "Piston", "Item").await;
    let manual = create_object(&app.router, "Manual", "Document").await;

    let (_, relation) = send(
        &app.router,
        "POST",
        "/relations",
        Some(json!({
            "primary_object_id": engine["id"],
            "relation_type": "documented_by",
            "secondary_object_ids": [piston["id"], manual["id"]],
        })),
    )
    .await;
    let relation_id = relation["id"].as_str().unwrap();

    let piston_id = piston["id"].as_str().unwrap();
    let (status, _) = send(&app.router, "DELETE", &format!("/objects/{piston_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, fetched) = send(
        &app.router,
        "GET",
        &format!("/relations/{relation_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["secondary_object_ids"], json!([manual["id"]]));
    assert_eq!(fetched["primary_object_id"], engine["id"]);
}

#[tokio::test]
async fn object_delete_clears_its_links_in_every_relation() {
    let app = make_app().await;
    let engine = create_object(&app.router, "Engine", "Item").await;
    let chassis = create_object(&app.router, "Chassis", "Item").await;
    let bolt = create_object(&app.router, "Bolt", "Item").await;

    let mut relation_ids = Vec::new();
    for primary in [&engine, &chassis] {
        let (_, relation) = send(
            &app.router,
            "POST",
            "/relations",
            Some(json!({
                "primary_object_id": primary["id"],
                "relation_type": "consists_of",
                "secondary_object_ids": [bolt["id"]],
            })),
        )
        .await;
        relation_ids.push(relation["id"].as_str().unwrap().to_string());
    }

    let bolt_id = bolt["id"].as_str().unwrap();
    let (status, _) = send(&app.router, "DELETE", &format!("/objects/{bolt_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // no relation still advertises the deleted object
    for id in relation_ids {
        let (status, fetched) = send(&app.router, "GET", &format!("/relations/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["secondary_object_ids"], json!([]));
    }
}

#[tokio::test]
async fn relation_delete_removes_its_links() {
    let app = make_app().await;
    let primary = create_object(&app.router, "Engine", "Item").await;
    let part = create_object(&app.router, "Part", "Item").await;

    let (_, relation) = send(
        &app.router,
        "POST",
        "/relations",
        Some(json!({
            "primary_object_id": primary["id"],
            "relation_type": "consists_of",
            "secondary_object_ids": [part["id"]],
        })),
    )
    .await;
    let id = relation["id"].as_str().unwrap();

    let (status, _) = send(&app.router, "DELETE", &format!("/relations/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app.router, "GET", &format!("/relations/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // the secondary object itself is untouched
    let part_id = part["id"].as_str().unwrap();
    let (status, _) = send(&app.router, "GET", &format!("/objects/{part_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}
