//! Album read, edit and ordering integration tests.
//!
//! Run with: `cargo test -p albums-api --test albums_test`

mod helpers;

use helpers::setup_test_app;
use serde_json::{json, Value};

#[tokio::test]
async fn test_health() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);

    let ready = app.client().get("/health/ready").await;
    assert_eq!(ready.status_code(), 200);
    let body: Value = ready.json();
    assert_eq!(body["storage"], "healthy");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["paths"]
        .get("/api/v0/albums/{owner_type}/{owner_id}/order")
        .is_some());
}

#[tokio::test]
async fn test_show_album_lists_images_in_order() {
    let app = setup_test_app().await;
    let second = app.store.seed(&app.owner, 7);
    let first = app.store.seed(&app.owner, 2);

    let response = app.client().get(&app.path("")).await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["image_count"], 2);
    assert_eq!(body["images"][0]["id"], first.id.to_string());
    assert_eq!(body["images"][1]["id"], second.id.to_string());
    assert!(body["primary_image"].is_null());
}

#[tokio::test]
async fn test_show_album_for_unknown_owner_type_is_not_found() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get(&format!("/api/v0/albums/widget/{}", app.owner.owner_id))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_show_image_reports_neighbours() {
    let app = setup_test_app().await;
    let a = app.store.seed(&app.owner, 1);
    let b = app.store.seed(&app.owner, 2);
    let c = app.store.seed(&app.owner, 3);

    let response = app
        .client()
        .get(&app.path(&format!("/images/{}", b.id)))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["image"]["id"], b.id.to_string());
    assert_eq!(body["prev"], a.id.to_string());
    assert_eq!(body["next"], c.id.to_string());

    let edge: Value = app
        .client()
        .get(&app.path(&format!("/images/{}", a.id)))
        .await
        .json();
    assert!(edge["prev"].is_null());
    assert_eq!(edge["next"], b.id.to_string());
}

#[tokio::test]
async fn test_image_of_another_owner_is_not_found() {
    let app = setup_test_app().await;
    let other = albums_core::OwnerRef::new("user", uuid::Uuid::new_v4());
    let foreign = app.store.seed(&other, 1);

    let response = app
        .client()
        .get(&app.path(&format!("/images/{}", foreign.id)))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_reorder_swaps_ordering_values() {
    let app = setup_test_app().await;
    let a = app.store.seed(&app.owner, 1);
    let b = app.store.seed(&app.owner, 2);

    let response = app
        .client()
        .post(&app.path("/order"))
        .add_header("X-User-Id", app.user_header())
        .json(&json!({
            "items": [
                { "id": a.id, "order": 2 },
                { "id": b.id, "order": "1" }
            ]
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>(), json!({ "done": true }));

    let rows = app.store.snapshot(&app.owner);
    assert_eq!(rows[0].id, b.id);
    assert_eq!(rows[1].id, a.id);
}

#[tokio::test]
async fn test_reorder_accepts_form_encoded_items() {
    let app = setup_test_app().await;
    let a = app.store.seed(&app.owner, 1);
    let b = app.store.seed(&app.owner, 2);

    let items = json!([{ "id": a.id, "order": 5 }, { "id": b.id, "order": 4 }]).to_string();
    let response = app
        .client()
        .post(&app.path("/order"))
        .add_header("X-User-Id", app.user_header())
        .form(&[("items", items)])
        .await;

    assert_eq!(response.json::<Value>(), json!({ "done": true }));
    let rows = app.store.snapshot(&app.owner);
    assert_eq!((rows[0].id, rows[0].sort_order), (b.id, 4));
    assert_eq!((rows[1].id, rows[1].sort_order), (a.id, 5));
}

#[tokio::test]
async fn test_reorder_with_foreign_id_changes_nothing() {
    let app = setup_test_app().await;
    let a = app.store.seed(&app.owner, 1);
    let other = albums_core::OwnerRef::new("user", uuid::Uuid::new_v4());
    let foreign = app.store.seed(&other, 9);

    let response = app
        .client()
        .post(&app.path("/order"))
        .add_header("X-User-Id", app.user_header())
        .json(&json!({
            "items": [
                { "id": a.id, "order": 3 },
                { "id": foreign.id, "order": 4 }
            ]
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.json::<Value>(),
        json!({ "done": false, "reason": "Invalid data." })
    );
    assert_eq!(app.store.snapshot(&app.owner)[0].sort_order, 1);
    assert_eq!(app.store.snapshot(&other)[0].sort_order, 9);
}

#[tokio::test]
async fn test_reorder_with_malformed_items_is_invalid() {
    let app = setup_test_app().await;
    app.store.seed(&app.owner, 1);

    let response = app
        .client()
        .post(&app.path("/order"))
        .add_header("X-User-Id", app.user_header())
        .form(&[("items", "not json")])
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.json::<Value>(),
        json!({ "done": false, "reason": "Invalid data." })
    );
}

#[tokio::test]
async fn test_set_and_clear_primary() {
    let app = setup_test_app().await;
    let a = app.store.seed(&app.owner, 1);
    let b = app.store.seed(&app.owner, 2);

    for id in [a.id, b.id] {
        let response = app
            .client()
            .post(&app.path(&format!("/images/{}/primary", id)))
            .add_header("X-User-Id", app.user_header())
            .await;
        assert_eq!(response.status_code(), 200);
    }

    let album: Value = app.client().get(&app.path("")).await.json();
    assert_eq!(album["primary_image"], b.id.to_string());
    assert_eq!(album["images"][0]["is_primary"], false);

    let response = app
        .client()
        .delete(&app.path("/primary"))
        .add_header("X-User-Id", app.user_header())
        .await;
    assert_eq!(response.status_code(), 204);
    assert!(app
        .store
        .snapshot(&app.owner)
        .iter()
        .all(|image| !image.is_primary));
}

#[tokio::test]
async fn test_set_primary_requires_user_header() {
    let app = setup_test_app().await;
    let a = app.store.seed(&app.owner, 1);

    let response = app
        .client()
        .post(&app.path(&format!("/images/{}/primary", a.id)))
        .await;

    assert_eq!(response.status_code(), 400);
    assert!(!app.store.snapshot(&app.owner)[0].is_primary);
}

#[tokio::test]
async fn test_update_caption() {
    let app = setup_test_app().await;
    let a = app.store.seed(&app.owner, 1);

    let response = app
        .client()
        .put(&app.path(&format!("/images/{}", a.id)))
        .add_header("X-User-Id", app.user_header())
        .json(&json!({ "caption": "Sunset" }))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["caption"], "Sunset");

    let too_long = app
        .client()
        .put(&app.path(&format!("/images/{}", a.id)))
        .add_header("X-User-Id", app.user_header())
        .json(&json!({ "caption": "x".repeat(256) }))
        .await;
    assert_eq!(too_long.status_code(), 400);
    assert_eq!(app.store.snapshot(&app.owner)[0].caption, "Sunset");
}

#[tokio::test]
async fn test_delete_image_recalculates_stats() {
    let app = setup_test_app().await;
    let a = app.store.seed(&app.owner, 1);
    app.store.seed(&app.owner, 2);

    let response = app
        .client()
        .delete(&app.path(&format!("/images/{}", a.id)))
        .add_header("X-User-Id", app.user_header())
        .await;
    assert_eq!(response.status_code(), 204);

    assert_eq!(app.store.snapshot(&app.owner).len(), 1);
    assert_eq!(app.store.recalculation_count(), 1);

    let album: Value = app.client().get(&app.path("")).await.json();
    assert_eq!(album["image_count"], 1);

    let again = app
        .client()
        .delete(&app.path(&format!("/images/{}", a.id)))
        .add_header("X-User-Id", app.user_header())
        .await;
    assert_eq!(again.status_code(), 404);
}
