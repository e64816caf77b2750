//! Tests for the schema registry.

use crate::db::{DbError, FieldKind, FieldSpec, ModelDescriptor, Registry};

const WIDGET: ModelDescriptor = ModelDescriptor {
    name: "widget",
    table: "widget",
    foreign_key: "widget_id",
    updateable: &[
        FieldSpec {
            name: "label",
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "weight",
            kind: FieldKind::Real,
        },
    ],
    owns: &[],
    rules: &[],
};

#[test]
fn registry_resolves_by_name() {
    let registry = Registry::new([WIDGET]);
    let desc = registry.get("widget").unwrap();
    assert_eq!(desc.table, "widget");
}

#[test]
fn unknown_models_fail_loudly() {
    let registry = Registry::new([WIDGET]);
    let err = registry.get("gizmo").unwrap_err();
    assert!(matches!(err, DbError::UnknownModel { name } if name == "gizmo"));
}

#[test]
fn field_lookup_covers_declared_fields_only() {
    assert!(WIDGET.field("label").is_some());
    assert!(WIDGET.field("weight").is_some());
    assert!(WIDGET.field("id").is_none());
    assert!(WIDGET.field("bogus").is_none());
}

#[test]
#[should_panic(expected = "duplicate model descriptor")]
fn duplicate_descriptors_panic() {
    let _ = Registry::new([WIDGET, WIDGET]);
}
