//! Tests for document assembly.

use serde_json::json;

use crate::db::DbError;
use crate::db::sqlite::{SqliteDatabase, Synchronizer};
use crate::document;
use crate::models;

async fn setup() -> SqliteDatabase {
    let db = SqliteDatabase::in_memory().await.unwrap();
    db.migrate().await.unwrap();
    db
}

#[tokio::test]
async fn fetching_a_missing_document_is_not_found() {
    let db = setup().await;
    let registry = models::registry();
    let err = document::fetch_document(db.pool(), &registry, "apd", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { id: 1, .. }));
}

#[tokio::test]
async fn childless_collections_come_back_as_empty_arrays() {
    let db = setup().await;
    let registry = models::registry();
    let id = Synchronizer::new(&registry)
        .create_document(
            "apd",
            &json!({ "status": "draft", "activities": [{ "name": "Administration" }] }),
            db.pool(),
        )
        .await
        .unwrap();

    let doc = document::fetch_document(db.pool(), &registry, "apd", id)
        .await
        .unwrap();
    let activity = &doc["activities"][0];
    for property in [
        "goals",
        "milestones",
        "state_personnel",
        "contractor_resources",
        "expenses",
    ] {
        assert_eq!(
            activity[property],
            json!([]),
            "{} should be present and empty",
            property
        );
    }
}

#[tokio::test]
async fn listing_returns_roots_without_children() {
    let db = setup().await;
    let registry = models::registry();
    let syn = Synchronizer::new(&registry);
    for period in ["2018-2019", "2019-2020"] {
        syn.create_document(
            "apd",
            &json!({ "period": period, "activities": [{ "name": "Administration" }] }),
            db.pool(),
        )
        .await
        .unwrap();
    }

    let docs = document::list_documents(db.pool(), &registry, "apd")
        .await
        .unwrap();
    assert_eq!(docs.len(), 2);
    assert!(docs.windows(2).all(|pair| pair[0].id < pair[1].id));
    for doc in &docs {
        assert!(doc.fields.get("period").is_some());
        assert!(
            !doc.fields.contains_key("activities"),
            "listing does not descend into children"
        );
    }
}
