//! Tests for the validation gate.

use serde_json::{Value, json};

use crate::db::sqlite::{Fields, SqliteDatabase, rows, validate};
use crate::db::{ParentLink, Registry};
use crate::models;

async fn setup() -> (SqliteDatabase, Registry) {
    let db = SqliteDatabase::in_memory().await.unwrap();
    db.migrate().await.unwrap();
    (db, models::registry())
}

fn fields(value: Value) -> Fields {
    value.as_object().unwrap().clone()
}

async fn seed_apd(db: &SqliteDatabase, registry: &Registry) -> i64 {
    let mut tx = db.pool().begin().await.unwrap();
    let id = rows::insert(&mut tx, registry.get("apd").unwrap(), &Fields::new(), None)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    id
}

#[tokio::test]
async fn required_fields_must_be_present_on_insert() {
    let (db, registry) = setup().await;
    let activity = registry.get("activity").unwrap();
    let mut tx = db.pool().begin().await.unwrap();

    let err = validate::check(&mut tx, activity, &Fields::new(), None, None)
        .await
        .unwrap_err();
    assert!(err.is_client_error());
    assert!(err.to_string().contains("name"));

    let err = validate::check(&mut tx, activity, &fields(json!({ "name": "   " })), None, None)
        .await
        .unwrap_err();
    assert!(err.is_client_error(), "blank counts as missing");

    validate::check(
        &mut tx,
        activity,
        &fields(json!({ "name": "Administration" })),
        None,
        None,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn required_fields_may_be_absent_on_update() {
    let (db, registry) = setup().await;
    let activity = registry.get("activity").unwrap();
    let mut tx = db.pool().begin().await.unwrap();

    // Absent means "not being changed" when a row already exists.
    validate::check(
        &mut tx,
        activity,
        &fields(json!({ "summary": "Updated" })),
        None,
        Some(7),
    )
    .await
    .unwrap();

    // Blanking it out is still rejected.
    let err = validate::check(&mut tx, activity, &fields(json!({ "name": "" })), None, Some(7))
        .await
        .unwrap_err();
    assert!(err.is_client_error());
}

#[tokio::test]
async fn uniqueness_is_scoped_to_the_parent() {
    let (db, registry) = setup().await;
    let activity = registry.get("activity").unwrap();
    let first_apd = seed_apd(&db, &registry).await;
    let second_apd = seed_apd(&db, &registry).await;

    let mut tx = db.pool().begin().await.unwrap();
    let first_link = ParentLink {
        column: "apd_id",
        id: first_apd,
    };
    let bob = rows::insert(
        &mut tx,
        activity,
        &fields(json!({ "name": "Bob" })),
        Some(&first_link),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.pool().begin().await.unwrap();

    // Same name under a different APD is fine.
    let second_link = ParentLink {
        column: "apd_id",
        id: second_apd,
    };
    validate::check(
        &mut tx,
        activity,
        &fields(json!({ "name": "Bob" })),
        Some(&second_link),
        None,
    )
    .await
    .unwrap();

    // Same name under the same APD is not.
    let err = validate::check(
        &mut tx,
        activity,
        &fields(json!({ "name": "Bob" })),
        Some(&first_link),
        None,
    )
    .await
    .unwrap_err();
    assert!(err.is_client_error());
    assert!(err.to_string().contains("Bob"));

    // A row may keep its own value.
    validate::check(
        &mut tx,
        activity,
        &fields(json!({ "name": "Bob" })),
        Some(&first_link),
        Some(bob),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn uniqueness_sees_uncommitted_siblings() {
    let (db, registry) = setup().await;
    let activity = registry.get("activity").unwrap();
    let apd_id = seed_apd(&db, &registry).await;
    let link = ParentLink {
        column: "apd_id",
        id: apd_id,
    };

    let mut tx = db.pool().begin().await.unwrap();
    rows::insert(
        &mut tx,
        activity,
        &fields(json!({ "name": "Bob" })),
        Some(&link),
    )
    .await
    .unwrap();

    // The probe runs in the same transaction, so the row inserted a moment
    // ago is already visible.
    let err = validate::check(
        &mut tx,
        activity,
        &fields(json!({ "name": "Bob" })),
        Some(&link),
        None,
    )
    .await
    .unwrap_err();
    assert!(err.is_client_error());
}

#[tokio::test]
async fn negative_amounts_are_rejected() {
    let (db, registry) = setup().await;
    let activity = registry.get("activity").unwrap();
    let mut tx = db.pool().begin().await.unwrap();

    let err = validate::check(
        &mut tx,
        activity,
        &fields(json!({ "name": "Outreach", "other_funding_amount": -250.0 })),
        None,
        None,
    )
    .await
    .unwrap_err();
    assert!(err.is_client_error());
    assert!(err.to_string().contains("negative"));

    validate::check(
        &mut tx,
        activity,
        &fields(json!({ "name": "Outreach", "other_funding_amount": 250.0 })),
        None,
        None,
    )
    .await
    .unwrap();
}
